use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A kid's advancement through one story. One row per (kid, story),
/// created lazily on first interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progress {
    pub id: Uuid,
    pub kid_id: Uuid,
    pub story_id: Uuid,
    pub current_sentence: i64,
    pub total_blocks: i64,
    pub total_repetitions: i64,
    pub completed: bool,
    pub updated_at: DateTime<Utc>,
}
