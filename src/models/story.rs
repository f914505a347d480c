use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A narrated content unit. Shared reference data, not owned by any account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One sentence within a story. `order_index` is stable per story.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorySentence {
    pub id: Uuid,
    pub story_id: Uuid,
    pub sentence: String,
    pub order_index: i64,
    pub audio_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStoryInput {
    pub title: String,
    pub description: Option<String>,
    pub cover_image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddSentenceInput {
    pub sentence: String,
    pub audio_file: Option<String>,
}
