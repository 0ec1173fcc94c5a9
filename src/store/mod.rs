//! Account and script persistence.
//!
//! One contract, two interchangeable backings: `MemoryStore` (volatile) and
//! `RocksStore` (durable). The backing is selected once at process start via
//! [`open`] and the two must be observably identical for every operation;
//! the shared test suite below runs each behavior against both.
//!
//! The store owns the canonical copies of all records. Callers always get
//! value copies, and every mutation goes through the operation set here.

pub mod memory;
pub mod rocks;
pub mod types;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::error::MesmerError;

pub use memory::MemoryStore;
pub use rocks::RocksStore;
pub use types::{Account, Script, ScriptDraft, Tone};

/// Storage medium, selected at process start and never mixed at runtime.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backing {
    Memory,
    Durable,
}

impl Default for Backing {
    fn default() -> Self {
        Backing::Memory
    }
}

/// The record-store contract.
///
/// Each operation is atomic with respect to other operations on the same
/// record. "Not found" is a normal `None`/`false` result; errors mean the
/// medium itself failed.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fails with `Conflict` when the normalized email already exists. Id and
    /// creation timestamp are assigned atomically with the write.
    async fn create_account(
        &self,
        email: &str,
        credential_hash: &str,
    ) -> Result<Account, MesmerError>;

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, MesmerError>;

    async fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>, MesmerError>;

    /// Delete an account and every script it owns as one atomic operation.
    /// `false` when the account does not exist.
    async fn delete_account(&self, id: Uuid) -> Result<bool, MesmerError>;

    async fn create_script(&self, draft: ScriptDraft) -> Result<Script, MesmerError>;

    /// Most recent first; empty for an unknown owner, never an error.
    async fn list_scripts(&self, owner_id: Uuid) -> Result<Vec<Script>, MesmerError>;

    /// `None` both for a missing id and for another owner's script; the two
    /// are indistinguishable to the caller.
    async fn get_script(
        &self,
        owner_id: Uuid,
        script_id: Uuid,
    ) -> Result<Option<Script>, MesmerError>;

    /// `true` iff a record matching both id and owner was removed.
    async fn delete_script(&self, owner_id: Uuid, script_id: Uuid) -> Result<bool, MesmerError>;
}

/// Canonical email form used for uniqueness and lookups.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Open the backing selected by configuration.
pub fn open(config: &StorageConfig) -> Result<Arc<dyn RecordStore>, MesmerError> {
    match config.backing {
        Backing::Memory => {
            info!("record store: volatile in-memory backing");
            Ok(Arc::new(MemoryStore::new()))
        }
        Backing::Durable => {
            info!("record store: durable backing at {}", config.db_path);
            Ok(Arc::new(RocksStore::open(&config.db_path)?))
        }
    }
}
