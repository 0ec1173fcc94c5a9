//! Durable RocksDB backing.
//!
//! Keyspace:
//!   account:{id}                      -> AccountRecord
//!   email:{normalized}                -> account id
//!   script:{owner}:{ms}{seq}:{id}     -> Script
//!   scriptidx:{id}                    -> primary script key
//!
//! Script keys sort by creation time with an insertion sequence as the
//! tie-break, so a reversed prefix scan over `script:{owner}:` is the
//! most-recent-first listing. Writers serialize through a single lock and
//! every multi-key mutation goes into one WriteBatch, so readers (which take
//! no lock) never observe partial state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocksdb::{Direction, IteratorMode, Options, WriteBatch, DB};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::types::{Account, Script, ScriptDraft};
use super::{normalize_email, RecordStore};
use crate::error::MesmerError;

const ACCOUNT_PREFIX: &str = "account:";
const EMAIL_PREFIX: &str = "email:";
const SCRIPT_PREFIX: &str = "script:";
const SCRIPT_INDEX_PREFIX: &str = "scriptidx:";

/// Account row as persisted. Separate from the public `Account` so the
/// credential hash round-trips through storage while `Account` itself stays
/// non-deserializable and skips the hash outward.
#[derive(Serialize, Deserialize)]
struct AccountRecord {
    id: Uuid,
    email: String,
    credential_hash: String,
    created_at: DateTime<Utc>,
}

impl From<AccountRecord> for Account {
    fn from(record: AccountRecord) -> Self {
        Account {
            id: record.id,
            email: record.email,
            credential_hash: record.credential_hash,
            created_at: record.created_at,
        }
    }
}

pub struct RocksStore {
    db: DB,
    // Single-writer discipline; readers stay concurrent.
    write_lock: Mutex<()>,
    // Tie-break for scripts created within the same millisecond.
    seq: AtomicU64,
}

impl RocksStore {
    pub fn open(path: &str) -> Result<Self, MesmerError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path).map_err(storage_err)?;
        Ok(Self {
            db,
            write_lock: Mutex::new(()),
            seq: AtomicU64::new(0),
        })
    }

    fn put_batch<T: Serialize>(
        &self,
        batch: &mut WriteBatch,
        key: &str,
        value: &T,
    ) -> Result<(), MesmerError> {
        let bytes = bincode::serialize(value)
            .map_err(|e| MesmerError::Internal(format!("encode {}: {}", key, e)))?;
        batch.put(key.as_bytes(), bytes);
        Ok(())
    }

    fn get<T: for<'a> Deserialize<'a>>(&self, key: &str) -> Result<Option<T>, MesmerError> {
        match self.db.get(key.as_bytes()) {
            Ok(Some(data)) => bincode::deserialize(&data)
                .map(Some)
                .map_err(|e| MesmerError::Internal(format!("decode {}: {}", key, e))),
            Ok(None) => Ok(None),
            Err(e) => Err(storage_err(e)),
        }
    }
}

fn storage_err(e: rocksdb::Error) -> MesmerError {
    MesmerError::Internal(format!("rocksdb: {}", e))
}

fn writer_poisoned<T>(_: std::sync::PoisonError<T>) -> MesmerError {
    MesmerError::Internal("writer lock poisoned".to_string())
}

fn account_key(id: Uuid) -> String {
    format!("{}{}", ACCOUNT_PREFIX, id)
}

fn email_key(normalized: &str) -> String {
    format!("{}{}", EMAIL_PREFIX, normalized)
}

fn script_owner_prefix(owner_id: Uuid) -> String {
    format!("{}{}:", SCRIPT_PREFIX, owner_id)
}

fn script_key(owner_id: Uuid, created_ms: u64, seq: u64, id: Uuid) -> String {
    format!(
        "{}{:016x}{:08x}:{}",
        script_owner_prefix(owner_id),
        created_ms,
        seq,
        id
    )
}

fn script_index_key(id: Uuid) -> String {
    format!("{}{}", SCRIPT_INDEX_PREFIX, id)
}

#[async_trait]
impl RecordStore for RocksStore {
    async fn create_account(
        &self,
        email: &str,
        credential_hash: &str,
    ) -> Result<Account, MesmerError> {
        let email = normalize_email(email);
        let _guard = self.write_lock.lock().map_err(writer_poisoned)?;

        let email_key = email_key(&email);
        if self.db.get(email_key.as_bytes()).map_err(storage_err)?.is_some() {
            return Err(MesmerError::Conflict);
        }

        let record = AccountRecord {
            id: Uuid::new_v4(),
            email,
            credential_hash: credential_hash.to_string(),
            created_at: Utc::now(),
        };

        let mut batch = WriteBatch::default();
        self.put_batch(&mut batch, &account_key(record.id), &record)?;
        self.put_batch(&mut batch, &email_key, &record.id)?;
        self.db.write(batch).map_err(storage_err)?;

        Ok(record.into())
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, MesmerError> {
        let email = normalize_email(email);
        match self.get::<Uuid>(&email_key(&email))? {
            Some(id) => self.find_account_by_id(id).await,
            None => Ok(None),
        }
    }

    async fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>, MesmerError> {
        Ok(self
            .get::<AccountRecord>(&account_key(id))?
            .map(Account::from))
    }

    async fn delete_account(&self, id: Uuid) -> Result<bool, MesmerError> {
        let _guard = self.write_lock.lock().map_err(writer_poisoned)?;

        let record: AccountRecord = match self.get(&account_key(id))? {
            Some(record) => record,
            None => return Ok(false),
        };

        // Account row, email index, and the script cascade land in one batch.
        let mut batch = WriteBatch::default();
        batch.delete(account_key(id).as_bytes());
        batch.delete(email_key(&record.email).as_bytes());

        let prefix = script_owner_prefix(id);
        for entry in self
            .db
            .iterator(IteratorMode::From(prefix.as_bytes(), Direction::Forward))
        {
            let (key, value) = entry.map_err(storage_err)?;
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            let script: Script = bincode::deserialize(&value)
                .map_err(|e| MesmerError::Internal(format!("decode script row: {}", e)))?;
            batch.delete(&key);
            batch.delete(script_index_key(script.id).as_bytes());
        }

        self.db.write(batch).map_err(storage_err)?;
        Ok(true)
    }

    async fn create_script(&self, draft: ScriptDraft) -> Result<Script, MesmerError> {
        let _guard = self.write_lock.lock().map_err(writer_poisoned)?;

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

        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let primary = script_key(
            script.owner_id,
            script.created_at.timestamp_millis() as u64,
            seq,
            script.id,
        );

        let mut batch = WriteBatch::default();
        self.put_batch(&mut batch, &primary, &script)?;
        self.put_batch(&mut batch, &script_index_key(script.id), &primary)?;
        self.db.write(batch).map_err(storage_err)?;

        Ok(script)
    }

    async fn list_scripts(&self, owner_id: Uuid) -> Result<Vec<Script>, MesmerError> {
        let prefix = script_owner_prefix(owner_id);
        let mut scripts: Vec<Script> = Vec::new();

        for entry in self
            .db
            .iterator(IteratorMode::From(prefix.as_bytes(), Direction::Forward))
        {
            let (key, value) = entry.map_err(storage_err)?;
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            scripts.push(
                bincode::deserialize(&value)
                    .map_err(|e| MesmerError::Internal(format!("decode script row: {}", e)))?,
            );
        }

        // Keys sort oldest first; the listing is most recent first.
        scripts.reverse();
        Ok(scripts)
    }

    async fn get_script(
        &self,
        owner_id: Uuid,
        script_id: Uuid,
    ) -> Result<Option<Script>, MesmerError> {
        let primary = match self.get::<String>(&script_index_key(script_id))? {
            Some(primary) => primary,
            None => return Ok(None),
        };
        let script: Option<Script> = self.get(&primary)?;
        Ok(script.filter(|s| s.owner_id == owner_id))
    }

    async fn delete_script(&self, owner_id: Uuid, script_id: Uuid) -> Result<bool, MesmerError> {
        let _guard = self.write_lock.lock().map_err(writer_poisoned)?;

        let primary = match self.get::<String>(&script_index_key(script_id))? {
            Some(primary) => primary,
            None => return Ok(false),
        };
        let script: Script = match self.get(&primary)? {
            Some(script) => script,
            None => return Ok(false),
        };
        if script.owner_id != owner_id {
            return Ok(false);
        }

        let mut batch = WriteBatch::default();
        batch.delete(primary.as_bytes());
        batch.delete(script_index_key(script_id).as_bytes());
        self.db.write(batch).map_err(storage_err)?;
        Ok(true)
    }
}
