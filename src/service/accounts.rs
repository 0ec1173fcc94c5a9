//! Registration, login, and token-based identity.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::auth::{hash_password, verify_password, TokenSigner};
use crate::error::MesmerError;
use crate::store::{Account, RecordStore};

/// A session token plus the account it identifies.
#[derive(Serialize, Clone, Debug)]
pub struct AuthSession {
    pub token: String,
    pub account: Account,
}

pub struct AccountService {
    store: Arc<dyn RecordStore>,
    signer: Arc<TokenSigner>,
}

impl AccountService {
    pub fn new(store: Arc<dyn RecordStore>, signer: Arc<TokenSigner>) -> Self {
        Self { store, signer }
    }

    /// Create an account and open a session for it.
    ///
    /// All-or-nothing: the token is minted only after the account persisted.
    pub async fn register(&self, email: &str, password: &str) -> Result<AuthSession, MesmerError> {
        if self.store.find_account_by_email(email).await?.is_some() {
            return Err(MesmerError::Conflict);
        }

        let credential_hash = hash_password(password)?;
        let account = self.store.create_account(email, &credential_hash).await?;
        let token = self.signer.issue(account.id, &account.email);

        info!("registered account {}", account.id);
        Ok(AuthSession { token, account })
    }

    /// Authenticate with email and password.
    ///
    /// Unknown email and wrong password return the same error; callers learn
    /// nothing about which accounts exist.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, MesmerError> {
        let account = match self.store.find_account_by_email(email).await? {
            Some(account) => account,
            None => return Err(MesmerError::Unauthorized),
        };

        if !verify_password(password, &account.credential_hash) {
            return Err(MesmerError::Unauthorized);
        }

        let token = self.signer.issue(account.id, &account.email);
        debug!("login for account {}", account.id);
        Ok(AuthSession { token, account })
    }

    /// Resolve a session token to the current account record.
    ///
    /// The embedded email is not trusted as current truth; the account is
    /// re-read by id, and a vanished account fails like a bad token.
    pub async fn identify(&self, token: &str) -> Result<Account, MesmerError> {
        let identity = match self.signer.verify(token) {
            Some(identity) => identity,
            None => return Err(MesmerError::Unauthorized),
        };

        match self.store.find_account_by_id(identity.account_id).await? {
            Some(account) => Ok(account),
            None => Err(MesmerError::Unauthorized),
        }
    }
}
