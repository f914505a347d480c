//! SQLite persistence layer.
//!
//! [`Database`] is a cheap clone-handle over a single connection. Every
//! method locks, runs its statements, and releases; multi-statement writes
//! go through an explicit transaction that rolls back on drop.

mod schema;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::models::*;

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .with_context(|| format!("failed to open database at {}", path.as_ref().display()))?;
        Self::from_connection(conn)
    }

    /// Open the database at the platform default location.
    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_path()?)
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn default_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("com", "fluently", "fluently")
            .ok_or_else(|| anyhow!("could not determine data directory"))?;
        let dir = dirs.data_dir();
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        Ok(dir.join("fluently.db"))
    }

    /// Apply the schema. Idempotent.
    pub fn migrate(&self) -> Result<()> {
        let conn = self.lock();
        conn.execute_batch(schema::SCHEMA)?;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        // A poisoned lock means a panic mid-statement; nothing to recover.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ------------------------------------------------------------------
    // Accounts
    // ------------------------------------------------------------------

    /// Insert a new parent account. The caller hashes the password;
    /// this layer never sees plaintext.
    pub fn create_account(&self, name: &str, email: &str, password_hash: &str) -> Result<Account> {
        let account = Account {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            created_at: Utc::now(),
        };
        let conn = self.lock();
        conn.execute(
            "INSERT INTO users (id, name, email, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                account.id.to_string(),
                account.name,
                account.email,
                password_hash,
                account.created_at.to_rfc3339(),
            ],
        )?;
        Ok(account)
    }

    pub fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
        let conn = self.lock();
        let account = conn
            .query_row(
                "SELECT id, name, email, created_at FROM users WHERE id = ?1",
                params![id.to_string()],
                account_from_row,
            )
            .optional()?;
        Ok(account)
    }

    pub fn get_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let conn = self.lock();
        let account = conn
            .query_row(
                "SELECT id, name, email, created_at FROM users WHERE email = ?1",
                params![email],
                account_from_row,
            )
            .optional()?;
        Ok(account)
    }

    /// Account plus stored password hash, for login verification only.
    pub fn credentials_for_email(&self, email: &str) -> Result<Option<(Account, String)>> {
        let conn = self.lock();
        let found = conn
            .query_row(
                "SELECT id, name, email, created_at, password_hash FROM users WHERE email = ?1",
                params![email],
                |row| Ok((account_from_row(row)?, row.get::<_, String>(4)?)),
            )
            .optional()?;
        Ok(found)
    }

    // ------------------------------------------------------------------
    // Kids
    // ------------------------------------------------------------------

    pub fn create_kid(&self, parent_id: Uuid, input: &KidSignupInput) -> Result<Kid> {
        let kid = Kid {
            id: Uuid::new_v4(),
            parent_id,
            name: input.name.clone(),
            age_group: input.age_group,
            gender: input.gender,
            created_at: Utc::now(),
        };
        let conn = self.lock();
        conn.execute(
            "INSERT INTO kids (id, parent_id, name, age_group, gender, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                kid.id.to_string(),
                kid.parent_id.to_string(),
                kid.name,
                kid.age_group.as_str(),
                kid.gender.as_str(),
                kid.created_at.to_rfc3339(),
            ],
        )?;
        Ok(kid)
    }

    pub fn get_kid_by_name(&self, parent_id: Uuid, name: &str) -> Result<Option<Kid>> {
        let conn = self.lock();
        let kid = conn
            .query_row(
                "SELECT id, parent_id, name, age_group, gender, created_at
                 FROM kids WHERE parent_id = ?1 AND name = ?2",
                params![parent_id.to_string(), name],
                kid_from_row,
            )
            .optional()?;
        Ok(kid)
    }

    pub fn kids_for_parent(&self, parent_id: Uuid) -> Result<Vec<Kid>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, parent_id, name, age_group, gender, created_at
             FROM kids WHERE parent_id = ?1",
        )?;
        let kids = stmt
            .query_map(params![parent_id.to_string()], kid_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(kids)
    }

    // ------------------------------------------------------------------
    // Hard letters
    // ------------------------------------------------------------------

    /// Flag `letter` as difficult for a kid. Idempotent in both the letter
    /// table and the join table.
    pub fn flag_hard_letter(&self, kid_id: Uuid, letter: char) -> Result<HardLetter> {
        let text = letter.to_string();
        let conn = self.lock();
        conn.execute(
            "INSERT OR IGNORE INTO hard_letters (id, letter) VALUES (?1, ?2)",
            params![Uuid::new_v4().to_string(), text],
        )?;
        let hard = conn.query_row(
            "SELECT id, letter FROM hard_letters WHERE letter = ?1",
            params![text],
            hard_letter_from_row,
        )?;
        conn.execute(
            "INSERT OR IGNORE INTO kid_hard_letters (kid_id, letter_id) VALUES (?1, ?2)",
            params![kid_id.to_string(), hard.id.to_string()],
        )?;
        Ok(hard)
    }

    pub fn hard_letters_for_kid(&self, kid_id: Uuid) -> Result<Vec<HardLetter>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT h.id, h.letter FROM hard_letters h
             JOIN kid_hard_letters k ON k.letter_id = h.id
             WHERE k.kid_id = ?1
             ORDER BY h.letter",
        )?;
        let letters = stmt
            .query_map(params![kid_id.to_string()], hard_letter_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(letters)
    }

    // ------------------------------------------------------------------
    // Stories (shared reference data)
    // ------------------------------------------------------------------

    pub fn create_story(&self, input: &CreateStoryInput) -> Result<Story> {
        let story = Story {
            id: Uuid::new_v4(),
            title: input.title.clone(),
            description: input.description.clone(),
            cover_image: input.cover_image.clone(),
            created_at: Utc::now(),
        };
        let conn = self.lock();
        conn.execute(
            "INSERT INTO stories (id, title, description, cover_image, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                story.id.to_string(),
                story.title,
                story.description,
                story.cover_image,
                story.created_at.to_rfc3339(),
            ],
        )?;
        Ok(story)
    }

    pub fn get_story(&self, id: Uuid) -> Result<Option<Story>> {
        let conn = self.lock();
        let story = conn
            .query_row(
                "SELECT id, title, description, cover_image, created_at
                 FROM stories WHERE id = ?1",
                params![id.to_string()],
                story_from_row,
            )
            .optional()?;
        Ok(story)
    }

    pub fn list_stories(&self) -> Result<Vec<Story>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, title, description, cover_image, created_at
             FROM stories ORDER BY created_at",
        )?;
        let stories = stmt
            .query_map([], story_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(stories)
    }

    /// Append a sentence at the next order index for the story.
    pub fn add_sentence(&self, story_id: Uuid, input: &AddSentenceInput) -> Result<StorySentence> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let order_index: i64 = tx.query_row(
            "SELECT COALESCE(MAX(order_index) + 1, 0) FROM story_sentences WHERE story_id = ?1",
            params![story_id.to_string()],
            |row| row.get(0),
        )?;
        let sentence = StorySentence {
            id: Uuid::new_v4(),
            story_id,
            sentence: input.sentence.clone(),
            order_index,
            audio_file: input.audio_file.clone(),
        };
        tx.execute(
            "INSERT INTO story_sentences (id, story_id, sentence, order_index, audio_file)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                sentence.id.to_string(),
                sentence.story_id.to_string(),
                sentence.sentence,
                sentence.order_index,
                sentence.audio_file,
            ],
        )?;
        tx.commit()?;
        Ok(sentence)
    }

    pub fn sentences_for_story(&self, story_id: Uuid) -> Result<Vec<StorySentence>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, story_id, sentence, order_index, audio_file
             FROM story_sentences WHERE story_id = ?1 ORDER BY order_index",
        )?;
        let sentences = stmt
            .query_map(params![story_id.to_string()], sentence_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sentences)
    }

    // ------------------------------------------------------------------
    // Hints (shared reference data)
    // ------------------------------------------------------------------

    pub fn create_hint(&self, input: &CreateHintInput) -> Result<Hint> {
        let hint = Hint {
            id: Uuid::new_v4(),
            hint_text: input.hint_text.clone(),
            hint_image: input.hint_image.clone(),
            category: input.category.clone(),
        };
        let conn = self.lock();
        conn.execute(
            "INSERT INTO hints (id, hint_text, hint_image, category) VALUES (?1, ?2, ?3, ?4)",
            params![
                hint.id.to_string(),
                hint.hint_text,
                hint.hint_image,
                hint.category,
            ],
        )?;
        Ok(hint)
    }

    pub fn get_hint(&self, id: Uuid) -> Result<Option<Hint>> {
        let conn = self.lock();
        let hint = conn
            .query_row(
                "SELECT id, hint_text, hint_image, category FROM hints WHERE id = ?1",
                params![id.to_string()],
                hint_from_row,
            )
            .optional()?;
        Ok(hint)
    }

    pub fn list_hints(&self) -> Result<Vec<Hint>> {
        let conn = self.lock();
        let mut stmt =
            conn.prepare("SELECT id, hint_text, hint_image, category FROM hints")?;
        let hints = stmt
            .query_map([], hint_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(hints)
    }

    // ------------------------------------------------------------------
    // Progress & attempts
    // ------------------------------------------------------------------

    /// Fetch the (kid, story) progress row, creating it on first use.
    pub fn get_or_create_progress(&self, kid_id: Uuid, story_id: Uuid) -> Result<Progress> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let existing = tx
            .query_row(
                "SELECT id, kid_id, story_id, current_sentence, total_blocks,
                        total_repetitions, completed, updated_at
                 FROM kid_story_progress WHERE kid_id = ?1 AND story_id = ?2",
                params![kid_id.to_string(), story_id.to_string()],
                progress_from_row,
            )
            .optional()?;
        if let Some(progress) = existing {
            return Ok(progress);
        }
        let progress = Progress {
            id: Uuid::new_v4(),
            kid_id,
            story_id,
            current_sentence: 0,
            total_blocks: 0,
            total_repetitions: 0,
            completed: false,
            updated_at: Utc::now(),
        };
        tx.execute(
            "INSERT INTO kid_story_progress
                 (id, kid_id, story_id, current_sentence, total_blocks,
                  total_repetitions, completed, updated_at)
             VALUES (?1, ?2, ?3, 0, 0, 0, 0, ?4)",
            params![
                progress.id.to_string(),
                progress.kid_id.to_string(),
                progress.story_id.to_string(),
                progress.updated_at.to_rfc3339(),
            ],
        )?;
        tx.commit()?;
        Ok(progress)
    }

    pub fn get_progress(&self, id: Uuid) -> Result<Option<Progress>> {
        let conn = self.lock();
        let progress = conn
            .query_row(
                "SELECT id, kid_id, story_id, current_sentence, total_blocks,
                        total_repetitions, completed, updated_at
                 FROM kid_story_progress WHERE id = ?1",
                params![id.to_string()],
                progress_from_row,
            )
            .optional()?;
        Ok(progress)
    }

    pub fn progress_for_kid(&self, kid_id: Uuid) -> Result<Vec<Progress>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, kid_id, story_id, current_sentence, total_blocks,
                    total_repetitions, completed, updated_at
             FROM kid_story_progress WHERE kid_id = ?1",
        )?;
        let rows = stmt
            .query_map(params![kid_id.to_string()], progress_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Append one speech attempt and fold its counters into the progress
    /// row, all in one transaction. The sentence index only ever moves
    /// forward: a successful attempt advances it past the attempted
    /// sentence, a failed one leaves it where it was.
    pub fn record_attempt(
        &self,
        progress_id: Uuid,
        input: &RecordAttemptInput,
    ) -> Result<SpeechAttempt> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        let progress = tx
            .query_row(
                "SELECT id, kid_id, story_id, current_sentence, total_blocks,
                        total_repetitions, completed, updated_at
                 FROM kid_story_progress WHERE id = ?1",
                params![progress_id.to_string()],
                progress_from_row,
            )
            .optional()?
            .ok_or_else(|| anyhow!("progress {progress_id} not found"))?;

        let order_index: i64 = tx.query_row(
            "SELECT order_index FROM story_sentences WHERE id = ?1 AND story_id = ?2",
            params![input.sentence_id.to_string(), progress.story_id.to_string()],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| {
            anyhow!(
                "sentence {} does not belong to story {}",
                input.sentence_id,
                progress.story_id
            )
        })?;

        let attempt = SpeechAttempt {
            id: Uuid::new_v4(),
            progress_id,
            sentence_id: input.sentence_id,
            audio_path: input.audio_path.clone(),
            ai_score: input.ai_score,
            blocks_count: input.blocks_count,
            repetitions_count: input.repetitions_count,
            pauses_count: input.pauses_count,
            hint_id: input.hint_id,
            success: input.success,
            timestamp: Utc::now(),
        };
        tx.execute(
            "INSERT INTO speech_attempts
                 (id, progress_id, sentence_id, audio_path, ai_score, blocks_count,
                  repetitions_count, pauses_count, hint_id, success, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                attempt.id.to_string(),
                attempt.progress_id.to_string(),
                attempt.sentence_id.to_string(),
                attempt.audio_path,
                attempt.ai_score,
                attempt.blocks_count,
                attempt.repetitions_count,
                attempt.pauses_count,
                attempt.hint_id.map(|id| id.to_string()),
                attempt.success,
                attempt.timestamp.to_rfc3339(),
            ],
        )?;

        let next_sentence = if input.success {
            progress.current_sentence.max(order_index + 1)
        } else {
            progress.current_sentence
        };
        tx.execute(
            "UPDATE kid_story_progress
             SET current_sentence = ?2,
                 total_blocks = total_blocks + ?3,
                 total_repetitions = total_repetitions + ?4,
                 updated_at = ?5
             WHERE id = ?1",
            params![
                progress_id.to_string(),
                next_sentence,
                input.blocks_count,
                input.repetitions_count,
                Utc::now().to_rfc3339(),
            ],
        )?;

        tx.commit()?;
        Ok(attempt)
    }

    /// Mark a story as finished for the kid. Returns false if no such row.
    pub fn complete_progress(&self, progress_id: Uuid) -> Result<bool> {
        let conn = self.lock();
        let updated = conn.execute(
            "UPDATE kid_story_progress SET completed = 1, updated_at = ?2 WHERE id = ?1",
            params![progress_id.to_string(), Utc::now().to_rfc3339()],
        )?;
        Ok(updated > 0)
    }

    pub fn attempts_for_progress(&self, progress_id: Uuid) -> Result<Vec<SpeechAttempt>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, progress_id, sentence_id, audio_path, ai_score, blocks_count,
                    repetitions_count, pauses_count, hint_id, success, timestamp
             FROM speech_attempts WHERE progress_id = ?1 ORDER BY timestamp",
        )?;
        let attempts = stmt
            .query_map(params![progress_id.to_string()], attempt_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(attempts)
    }
}

/// True when `err` wraps a SQLite uniqueness/constraint violation. Used by
/// handlers to map race-y duplicate inserts to the same 400 as the pre-query.
pub fn is_constraint_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<rusqlite::Error>(),
        Some(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

// ----------------------------------------------------------------------
// Row mapping
// ----------------------------------------------------------------------

fn uuid_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let text: String = row.get(idx)?;
    Uuid::parse_str(&text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn opt_uuid_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Uuid>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|t| {
        Uuid::parse_str(&t).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
    })
    .transpose()
}

fn time_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn enum_col<T>(row: &Row<'_>, idx: usize, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    parse(&text).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("unexpected value: {text}").into(),
        )
    })
}

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: uuid_col(row, 0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        created_at: time_col(row, 3)?,
    })
}

fn kid_from_row(row: &Row<'_>) -> rusqlite::Result<Kid> {
    Ok(Kid {
        id: uuid_col(row, 0)?,
        parent_id: uuid_col(row, 1)?,
        name: row.get(2)?,
        age_group: enum_col(row, 3, AgeGroup::from_str)?,
        gender: enum_col(row, 4, Gender::from_str)?,
        created_at: time_col(row, 5)?,
    })
}

fn hard_letter_from_row(row: &Row<'_>) -> rusqlite::Result<HardLetter> {
    Ok(HardLetter {
        id: uuid_col(row, 0)?,
        letter: row.get(1)?,
    })
}

fn story_from_row(row: &Row<'_>) -> rusqlite::Result<Story> {
    Ok(Story {
        id: uuid_col(row, 0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        cover_image: row.get(3)?,
        created_at: time_col(row, 4)?,
    })
}

fn sentence_from_row(row: &Row<'_>) -> rusqlite::Result<StorySentence> {
    Ok(StorySentence {
        id: uuid_col(row, 0)?,
        story_id: uuid_col(row, 1)?,
        sentence: row.get(2)?,
        order_index: row.get(3)?,
        audio_file: row.get(4)?,
    })
}

fn progress_from_row(row: &Row<'_>) -> rusqlite::Result<Progress> {
    Ok(Progress {
        id: uuid_col(row, 0)?,
        kid_id: uuid_col(row, 1)?,
        story_id: uuid_col(row, 2)?,
        current_sentence: row.get(3)?,
        total_blocks: row.get(4)?,
        total_repetitions: row.get(5)?,
        completed: row.get(6)?,
        updated_at: time_col(row, 7)?,
    })
}

fn hint_from_row(row: &Row<'_>) -> rusqlite::Result<Hint> {
    Ok(Hint {
        id: uuid_col(row, 0)?,
        hint_text: row.get(1)?,
        hint_image: row.get(2)?,
        category: row.get(3)?,
    })
}

fn attempt_from_row(row: &Row<'_>) -> rusqlite::Result<SpeechAttempt> {
    Ok(SpeechAttempt {
        id: uuid_col(row, 0)?,
        progress_id: uuid_col(row, 1)?,
        sentence_id: uuid_col(row, 2)?,
        audio_path: row.get(3)?,
        ai_score: row.get(4)?,
        blocks_count: row.get(5)?,
        repetitions_count: row.get(6)?,
        pauses_count: row.get(7)?,
        hint_id: opt_uuid_col(row, 8)?,
        success: row.get(9)?,
        timestamp: time_col(row, 10)?,
    })
}
