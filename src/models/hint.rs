use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Remediation content shown after a difficult attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hint {
    pub id: Uuid,
    pub hint_text: String,
    pub hint_image: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHintInput {
    pub hint_text: String,
    pub hint_image: Option<String>,
    pub category: Option<String>,
}
