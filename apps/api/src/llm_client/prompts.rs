// Shared prompt fragments.
// Each module that needs LLM calls defines its own prompts.rs alongside it;
// the fragments here are reused across those prompts.

/// Appended to every system prompt whose reply is parsed as JSON.
pub const JSON_ONLY_INSTRUCTION: &str = "\
- 출력은 반드시 유효한 JSON 객체 하나만 포함합니다.
- JSON 바깥에 설명, 인사말, 마크다운 코드 블록을 넣지 않습니다.";

/// The four criteria every question and report is judged against.
pub const EVALUATION_CRITERIA: &str = "\
①관련 경험, ②문제 해결 능력, ③의사소통 능력, ④주도성";

/// Korean-only reply constraint shared by every interviewer prompt.
pub const KOREAN_ONLY: &str = "- 모든 질문과 답변은 한국어로 작성합니다.";
