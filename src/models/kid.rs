use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A child profile owned by exactly one parent account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kid {
    pub id: Uuid,
    pub parent_id: Uuid,
    pub name: String,
    pub age_group: AgeGroup,
    pub gender: Gender,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AgeGroup {
    #[serde(rename = "5-8")]
    FiveToEight,
    #[serde(rename = "9-12")]
    NineToTwelve,
}

impl AgeGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FiveToEight => "5-8",
            Self::NineToTwelve => "9-12",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "5-8" => Some(Self::FiveToEight),
            "9-12" => Some(Self::NineToTwelve),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Gender {
    M,
    F,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::M => "M",
            Self::F => "F",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "M" => Some(Self::M),
            "F" => Some(Self::F),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KidSignupInput {
    pub name: String,
    pub age_group: AgeGroup,
    pub gender: Gender,
}

/// A phoneme/letter flagged as difficult. Shared across kids through a
/// join table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HardLetter {
    pub id: Uuid,
    pub letter: String,
}
