//! Service layer: composes the auth primitives, the record store, and the
//! generation collaborator. All durable state flows through the store; the
//! services themselves hold none.

pub mod accounts;
pub mod scripts;

use std::sync::Arc;

use chrono::Duration;
use tracing::info;

use crate::auth::TokenSigner;
use crate::config::MesmerConfig;
use crate::error::MesmerError;
use crate::generator::{ScriptGenerator, StubGenerator};
use crate::store;

pub use accounts::{AccountService, AuthSession};
pub use scripts::{GenerateRequest, ScriptService};

/// The wired-up core: both services over one store and one signer.
///
/// The embedding process builds this once at startup from its configuration
/// and keeps it for the process lifetime; the backing and the signing secret
/// are fixed from then on.
pub struct Mesmer {
    pub accounts: AccountService,
    pub scripts: ScriptService,
}

impl Mesmer {
    /// Wire the core from process configuration with the built-in
    /// generation provider.
    pub fn from_config(config: &MesmerConfig) -> Result<Self, MesmerError> {
        Self::with_generator(config, Arc::new(StubGenerator))
    }

    /// Same wiring with a caller-supplied generation provider.
    pub fn with_generator(
        config: &MesmerConfig,
        generator: Arc<dyn ScriptGenerator>,
    ) -> Result<Self, MesmerError> {
        let store = store::open(&config.storage)?;
        let signer = Arc::new(TokenSigner::new(
            config.auth.token_secret.clone().into_bytes(),
            Duration::days(config.auth.token_ttl_days),
        ));

        info!(
            "core ready: {:?} backing, {}-day sessions",
            config.storage.backing, config.auth.token_ttl_days
        );
        Ok(Self {
            accounts: AccountService::new(store.clone(), signer),
            scripts: ScriptService::new(store, generator),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthConfig, StorageConfig};
    use crate::store::Backing;
    use tempfile::TempDir;

    fn config(backing: Backing, db_path: &str) -> MesmerConfig {
        MesmerConfig {
            auth: AuthConfig {
                token_secret: "wiring-test-secret".to_string(),
                token_ttl_days: 7,
            },
            storage: StorageConfig {
                backing,
                db_path: db_path.to_string(),
            },
        }
    }

    #[tokio::test]
    async fn register_generate_and_read_back_through_one_core() {
        let core = Mesmer::from_config(&config(Backing::Memory, "unused")).unwrap();

        let session = core
            .accounts
            .register("ana@example.com", "password1")
            .await
            .unwrap();
        let me = core.accounts.identify(&session.token).await.unwrap();
        assert_eq!(me.id, session.account.id);

        let script = core
            .scripts
            .generate(
                me.id,
                GenerateRequest {
                    symptoms: vec!["insomnia".to_string()],
                    ..GenerateRequest::default()
                },
            )
            .await
            .unwrap();

        let listed = core.scripts.list(me.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, script.id);
    }

    #[tokio::test]
    async fn durable_core_keeps_accounts_across_restart() {
        let dir = TempDir::new().unwrap();
        let config = config(Backing::Durable, dir.path().to_str().unwrap());

        let token = {
            let core = Mesmer::from_config(&config).unwrap();
            core.accounts
                .register("ana@example.com", "password1")
                .await
                .unwrap()
                .token
        };

        // A fresh core over the same path and secret accepts the old session.
        let core = Mesmer::from_config(&config).unwrap();
        let me = core.accounts.identify(&token).await.unwrap();
        assert_eq!(me.email, "ana@example.com");

        let login = core.accounts.login("ana@example.com", "password1").await.unwrap();
        assert_eq!(login.account.id, me.id);
    }
}
