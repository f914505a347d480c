pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS kids (
    id TEXT PRIMARY KEY,
    parent_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    age_group TEXT NOT NULL CHECK (age_group IN ('5-8', '9-12')),
    gender TEXT NOT NULL CHECK (gender IN ('M', 'F')),
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS hard_letters (
    id TEXT PRIMARY KEY,
    letter TEXT NOT NULL UNIQUE CHECK (length(letter) = 1)
);

CREATE TABLE IF NOT EXISTS kid_hard_letters (
    kid_id TEXT NOT NULL REFERENCES kids(id) ON DELETE CASCADE,
    letter_id TEXT NOT NULL REFERENCES hard_letters(id) ON DELETE CASCADE,
    PRIMARY KEY (kid_id, letter_id)
);

CREATE TABLE IF NOT EXISTS stories (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT,
    cover_image TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS story_sentences (
    id TEXT PRIMARY KEY,
    story_id TEXT NOT NULL REFERENCES stories(id) ON DELETE CASCADE,
    sentence TEXT NOT NULL,
    order_index INTEGER NOT NULL,
    audio_file TEXT
);

CREATE TABLE IF NOT EXISTS kid_story_progress (
    id TEXT PRIMARY KEY,
    kid_id TEXT NOT NULL REFERENCES kids(id) ON DELETE CASCADE,
    story_id TEXT NOT NULL REFERENCES stories(id) ON DELETE CASCADE,
    current_sentence INTEGER NOT NULL DEFAULT 0,
    total_blocks INTEGER NOT NULL DEFAULT 0,
    total_repetitions INTEGER NOT NULL DEFAULT 0,
    completed INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS hints (
    id TEXT PRIMARY KEY,
    hint_text TEXT NOT NULL,
    hint_image TEXT,
    category TEXT
);

CREATE TABLE IF NOT EXISTS speech_attempts (
    id TEXT PRIMARY KEY,
    progress_id TEXT NOT NULL REFERENCES kid_story_progress(id) ON DELETE CASCADE,
    sentence_id TEXT NOT NULL REFERENCES story_sentences(id) ON DELETE CASCADE,
    audio_path TEXT,
    ai_score REAL,
    blocks_count INTEGER NOT NULL DEFAULT 0,
    repetitions_count INTEGER NOT NULL DEFAULT 0,
    pauses_count INTEGER NOT NULL DEFAULT 0,
    hint_id TEXT REFERENCES hints(id) ON DELETE SET NULL,
    success INTEGER NOT NULL,
    timestamp TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_kids_parent ON kids(parent_id);
CREATE INDEX IF NOT EXISTS idx_sentences_story ON story_sentences(story_id);
CREATE INDEX IF NOT EXISTS idx_progress_kid ON kid_story_progress(kid_id);
CREATE INDEX IF NOT EXISTS idx_attempts_progress ON speech_attempts(progress_id);

-- Profile names are unique per parent, not globally
CREATE UNIQUE INDEX IF NOT EXISTS idx_kids_parent_name ON kids(parent_id, name);

-- Sentence ordering is significant and must be stable per story
CREATE UNIQUE INDEX IF NOT EXISTS idx_sentences_story_order
    ON story_sentences(story_id, order_index);

-- One progress row per (kid, story) pair
CREATE UNIQUE INDEX IF NOT EXISTS idx_progress_kid_story
    ON kid_story_progress(kid_id, story_id);
"#;
