use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One event of a block's streamed response.
///
/// Payload fields are kept as raw JSON so an event with an unexpected
/// payload shape still decodes with its type intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    /// Progress report for an agent; `data == "completed"` closes its message
    Status {
        #[serde(default)]
        agent: Option<String>,
        #[serde(default)]
        data: Option<Value>,
    },
    /// A piece of an agent's output
    Chunk {
        #[serde(default)]
        agent: Option<String>,
        #[serde(default)]
        data: Option<Value>,
    },
    /// The block finished; `data` carries its result
    Complete {
        #[serde(default)]
        data: Option<Value>,
    },
    /// The service gave up on the block
    Error {
        #[serde(default)]
        error: Option<Value>,
    },
    #[serde(other)]
    Unknown,
}

impl StreamEvent {
    /// Text form of a payload: strings as-is, other values as JSON
    pub fn payload_text(data: &Option<Value>) -> Option<String> {
        match data {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        }
    }

    /// Message of an error payload, looking inside `{"message": ..}` objects
    pub fn error_text(error: &Option<Value>) -> Option<String> {
        if let Some(Value::Object(fields)) = error {
            for key in ["message", "detail", "error"] {
                if let Some(Value::String(message)) = fields.get(key) {
                    return Some(message.clone());
                }
            }
        }
        Self::payload_text(error)
    }
}
