use serde::{Deserialize, Serialize};

/// Output of one successful block run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum ExecutionResult {
    /// The service reported a `final_result`
    Final(String),
    /// The service reported an intermediate `result`
    Intermediate(String),
    /// A bare value with neither field
    Raw(String),
}

impl ExecutionResult {
    /// Normalize a `complete` payload.
    ///
    /// `final_result` wins over `result`; anything else is kept as raw text.
    pub fn from_payload(payload: serde_json::Value) -> Self {
        match payload {
            serde_json::Value::String(text) => ExecutionResult::Raw(text),
            serde_json::Value::Object(ref map) => {
                if let Some(text) = map.get("final_result").and_then(text_of) {
                    ExecutionResult::Final(text)
                } else if let Some(text) = map.get("result").and_then(text_of) {
                    ExecutionResult::Intermediate(text)
                } else {
                    ExecutionResult::Raw(payload.to_string())
                }
            }
            serde_json::Value::Null => ExecutionResult::Raw(String::new()),
            other => ExecutionResult::Raw(other.to_string()),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            ExecutionResult::Final(text)
            | ExecutionResult::Intermediate(text)
            | ExecutionResult::Raw(text) => text,
        }
    }
}

fn text_of(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

impl From<String> for ExecutionResult {
    fn from(s: String) -> Self {
        ExecutionResult::Raw(s)
    }
}

impl From<&str> for ExecutionResult {
    fn from(s: &str) -> Self {
        ExecutionResult::Raw(s.to_string())
    }
}
