//! Record types owned by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user identity.
///
/// The credential hash never leaves the crate: the field is crate-private and
/// skipped on serialization, so an embedding layer cannot leak it.
#[derive(Serialize, Clone, Debug)]
pub struct Account {
    pub id: Uuid,
    /// Stored case/whitespace-normalized; unique across accounts.
    pub email: String,
    #[serde(skip_serializing)]
    pub(crate) credential_hash: String,
    pub created_at: DateTime<Utc>,
}

/// An owned script record. Content is immutable once created.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Script {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub symptoms: Vec<String>,
    pub tone: Tone,
    pub duration_minutes: u16,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input record for `RecordStore::create_script`. The store assigns id and
/// timestamps.
#[derive(Clone, Debug)]
pub struct ScriptDraft {
    pub owner_id: Uuid,
    pub title: String,
    pub symptoms: Vec<String>,
    pub tone: Tone,
    pub duration_minutes: u16,
    pub body: String,
}

/// Delivery tone for generated scripts.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Calm,
    Authoritative,
    Compassionate,
    Energising,
}

impl Default for Tone {
    fn default() -> Self {
        Tone::Calm
    }
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tone::Calm => write!(f, "calm"),
            Tone::Authoritative => write!(f, "authoritative"),
            Tone::Compassionate => write!(f, "compassionate"),
            Tone::Energising => write!(f, "energising"),
        }
    }
}

impl std::str::FromStr for Tone {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "calm" => Ok(Tone::Calm),
            "authoritative" => Ok(Tone::Authoritative),
            "compassionate" => Ok(Tone::Compassionate),
            "energising" => Ok(Tone::Energising),
            _ => Err(format!(
                "Invalid tone: {}. Allowed: calm, authoritative, compassionate, energising",
                s
            )),
        }
    }
}
