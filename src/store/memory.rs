//! Volatile in-memory backing.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::types::{Account, Script, ScriptDraft};
use super::{normalize_email, RecordStore};
use crate::error::MesmerError;

#[derive(Default)]
struct Inner {
    accounts: HashMap<Uuid, Account>,
    email_index: HashMap<String, Uuid>,
    // owner id -> scripts, newest first
    scripts: HashMap<Uuid, Vec<Script>>,
}

/// Coarse-lock in-memory store. Every operation takes the lock once and
/// callers only ever receive value copies.
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_poisoned<T>(_: std::sync::PoisonError<T>) -> MesmerError {
    MesmerError::Internal("store lock poisoned".to_string())
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn create_account(
        &self,
        email: &str,
        credential_hash: &str,
    ) -> Result<Account, MesmerError> {
        let email = normalize_email(email);
        let mut inner = self.inner.write().map_err(lock_poisoned)?;

        if inner.email_index.contains_key(&email) {
            return Err(MesmerError::Conflict);
        }

        let account = Account {
            id: Uuid::new_v4(),
            email: email.clone(),
            credential_hash: credential_hash.to_string(),
            created_at: Utc::now(),
        };
        inner.email_index.insert(email, account.id);
        inner.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, MesmerError> {
        let email = normalize_email(email);
        let inner = self.inner.read().map_err(lock_poisoned)?;
        Ok(inner
            .email_index
            .get(&email)
            .and_then(|id| inner.accounts.get(id))
            .cloned())
    }

    async fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>, MesmerError> {
        let inner = self.inner.read().map_err(lock_poisoned)?;
        Ok(inner.accounts.get(&id).cloned())
    }

    async fn delete_account(&self, id: Uuid) -> Result<bool, MesmerError> {
        let mut inner = self.inner.write().map_err(lock_poisoned)?;
        match inner.accounts.remove(&id) {
            Some(account) => {
                inner.email_index.remove(&account.email);
                inner.scripts.remove(&id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn create_script(&self, draft: ScriptDraft) -> Result<Script, MesmerError> {
        let now = Utc::now();
        let script = Script {
            id: Uuid::new_v4(),
            owner_id: draft.owner_id,
            title: draft.title,
            symptoms: draft.symptoms,
            tone: draft.tone,
            duration_minutes: draft.duration_minutes,
            body: draft.body,
            created_at: now,
            updated_at: now,
        };

        let mut inner = self.inner.write().map_err(lock_poisoned)?;
        inner
            .scripts
            .entry(script.owner_id)
            .or_default()
            .insert(0, script.clone());
        Ok(script)
    }

    async fn list_scripts(&self, owner_id: Uuid) -> Result<Vec<Script>, MesmerError> {
        let inner = self.inner.read().map_err(lock_poisoned)?;
        Ok(inner.scripts.get(&owner_id).cloned().unwrap_or_default())
    }

    async fn get_script(
        &self,
        owner_id: Uuid,
        script_id: Uuid,
    ) -> Result<Option<Script>, MesmerError> {
        let inner = self.inner.read().map_err(lock_poisoned)?;
        Ok(inner
            .scripts
            .get(&owner_id)
            .and_then(|list| list.iter().find(|s| s.id == script_id))
            .cloned())
    }

    async fn delete_script(&self, owner_id: Uuid, script_id: Uuid) -> Result<bool, MesmerError> {
        let mut inner = self.inner.write().map_err(lock_poisoned)?;
        let list = match inner.scripts.get_mut(&owner_id) {
            Some(list) => list,
            None => return Ok(false),
        };
        match list.iter().position(|s| s.id == script_id) {
            Some(idx) => {
                list.remove(idx);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
