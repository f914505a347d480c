use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One recorded, scored attempt at reading a sentence. Append-only:
/// no update path exists anywhere in the crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechAttempt {
    pub id: Uuid,
    pub progress_id: Uuid,
    pub sentence_id: Uuid,
    pub audio_path: Option<String>,
    pub ai_score: Option<f64>,
    pub blocks_count: i64,
    pub repetitions_count: i64,
    pub pauses_count: i64,
    pub hint_id: Option<Uuid>,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordAttemptInput {
    pub sentence_id: Uuid,
    pub audio_path: Option<String>,
    pub ai_score: Option<f64>,
    #[serde(default)]
    pub blocks_count: i64,
    #[serde(default)]
    pub repetitions_count: i64,
    #[serde(default)]
    pub pauses_count: i64,
    pub hint_id: Option<Uuid>,
    pub success: bool,
}
