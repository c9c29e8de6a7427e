//! Rebuilds the running interview from the history store.
//!
//! The conversation is replayed to the model as alternating turns: the cover
//! letter prompt first, then each asked question (assistant) followed by the
//! candidate's answer (user). Any number of turns is supported.

use crate::errors::AppError;
use crate::interview::history::{HistoryField, HistoryStore};
use crate::llm_client::ChatMessage;

pub const ANSWER_PREFIX: &str = "대답: ";
/// Highest question number an interview may reach.
pub const MAX_QUESTIONS: u32 = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub coverletter: String,
    pub turns: Vec<Turn>,
}

impl Conversation {
    /// Loads the cover letter and the first `answered` question/answer pairs.
    /// Every one of them must be present.
    pub async fn load(
        store: &dyn HistoryStore,
        itv_no: &str,
        answered: u32,
    ) -> Result<Self, AppError> {
        let coverletter = require(store, itv_no, HistoryField::Coverletter).await?;

        let mut turns = Vec::new();
        for n in 1..=answered {
            let question = require(store, itv_no, HistoryField::Question(n)).await?;
            let answer = require(store, itv_no, HistoryField::Answer(n)).await?;
            turns.push(Turn { question, answer });
        }

        Ok(Self { coverletter, turns })
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(1 + self.turns.len() * 2);
        messages.push(ChatMessage::user(self.coverletter.as_str()));
        for turn in &self.turns {
            messages.push(ChatMessage::assistant(turn.question.as_str()));
            messages.push(ChatMessage::user(format!("{ANSWER_PREFIX}{}", turn.answer)));
        }
        messages
    }
}

async fn require(
    store: &dyn HistoryStore,
    itv_no: &str,
    field: HistoryField,
) -> Result<String, AppError> {
    store
        .get(itv_no, field)
        .await?
        .ok_or_else(|| AppError::Conflict(format!("interview {itv_no} has no {field} yet")))
}

/// Question/answer pairs for the report, read in one round trip. Only the
/// questions present in the hash up to `question_count` are visited, and
/// unanswered ones render with an empty answer.
pub async fn load_transcript(
    store: &dyn HistoryStore,
    itv_no: &str,
    question_count: u32,
) -> Result<Vec<(String, String)>, AppError> {
    let mut fields = store.get_all(itv_no).await?;

    let mut asked: Vec<u32> = fields
        .keys()
        .filter_map(|name| match HistoryField::parse(name) {
            Some(HistoryField::Question(n)) if n <= question_count => Some(n),
            _ => None,
        })
        .collect();
    asked.sort_unstable();

    let mut pairs = Vec::with_capacity(asked.len());
    for n in asked {
        let question = fields
            .remove(&HistoryField::Question(n).to_string())
            .unwrap_or_default();
        let answer = fields
            .remove(&HistoryField::Answer(n).to_string())
            .unwrap_or_default();
        pairs.push((question, answer));
    }
    Ok(pairs)
}

/// Renders the transcript as one `Question: .., Answer: ..` line per pair.
pub fn render_transcript(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(q, a)| format!("Question: {q}, Answer: {a}\n"))
        .collect()
}
