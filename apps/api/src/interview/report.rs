//! Final evaluation report: four competency criteria, STAR feedback, score.

use serde::{de, Deserialize, Deserializer, Serialize};

use crate::llm_client::{parse_json, LlmError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewReport {
    pub relevant_experience: String,
    pub problem_solving: String,
    pub communication_skills: String,
    pub initiative: String,
    pub situation: String,
    pub task: String,
    pub action: String,
    pub result: String,
    #[serde(deserialize_with = "score_from_number_or_string")]
    pub overall_score: u32,
    pub encouragement: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error(transparent)]
    Parse(#[from] LlmError),

    #[error("report field '{0}' is empty")]
    EmptyField(&'static str),

    #[error("overall_score {0} is outside 0..=100")]
    ScoreOutOfRange(u32),
}

impl InterviewReport {
    /// Parses and validates the model's reply.
    pub fn from_llm_reply(text: &str) -> Result<Self, ReportError> {
        let report: InterviewReport = parse_json(text)?;
        report.validate()?;
        Ok(report)
    }

    fn validate(&self) -> Result<(), ReportError> {
        let fields = [
            ("relevant_experience", &self.relevant_experience),
            ("problem_solving", &self.problem_solving),
            ("communication_skills", &self.communication_skills),
            ("initiative", &self.initiative),
            ("situation", &self.situation),
            ("task", &self.task),
            ("action", &self.action),
            ("result", &self.result),
            ("encouragement", &self.encouragement),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(ReportError::EmptyField(name));
        }
        if self.overall_score > 100 {
            return Err(ReportError::ScoreOutOfRange(self.overall_score));
        }
        Ok(())
    }
}

/// Models sometimes quote the score ("85") or emit a float (85.0).
fn score_from_number_or_string<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u64),
        Float(f64),
        Text(String),
    }

    let value = match Raw::deserialize(deserializer)? {
        Raw::Int(n) => n as f64,
        Raw::Float(f) => f,
        Raw::Text(s) => s
            .trim()
            .trim_end_matches('점')
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("overall_score '{s}' is not a number")))?,
    };
    if !(0.0..=u32::MAX as f64).contains(&value) {
        return Err(de::Error::custom(format!("overall_score {value} is not valid")));
    }
    Ok(value.round() as u32)
}
