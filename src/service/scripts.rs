//! Owner-scoped script operations.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::MesmerError;
use crate::generator::ScriptGenerator;
use crate::store::{RecordStore, Script, ScriptDraft, Tone};

pub const MIN_DURATION_MINUTES: u16 = 5;
pub const MAX_DURATION_MINUTES: u16 = 60;
const DEFAULT_DURATION_MINUTES: u16 = 20;

/// Caller input for `generate`. Absent fields take the documented defaults:
/// tone `calm`, duration 20 minutes, a dated session title.
#[derive(Clone, Debug, Default)]
pub struct GenerateRequest {
    pub symptoms: Vec<String>,
    pub tone: Option<Tone>,
    pub duration_minutes: Option<u16>,
    pub title: Option<String>,
}

pub struct ScriptService {
    store: Arc<dyn RecordStore>,
    generator: Arc<dyn ScriptGenerator>,
}

impl ScriptService {
    pub fn new(store: Arc<dyn RecordStore>, generator: Arc<dyn ScriptGenerator>) -> Self {
        Self { store, generator }
    }

    /// Validate, invoke the generator, persist.
    ///
    /// Generation and persistence are sequential, not transactional: if the
    /// store write fails the error surfaces and no partial script exists.
    /// Validation failures never reach the generator or the store.
    pub async fn generate(
        &self,
        owner_id: Uuid,
        request: GenerateRequest,
    ) -> Result<Script, MesmerError> {
        let symptoms = validate_symptoms(&request.symptoms)?;

        let tone = request.tone.unwrap_or_default();
        let duration_minutes = request
            .duration_minutes
            .unwrap_or(DEFAULT_DURATION_MINUTES);
        if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&duration_minutes) {
            return Err(MesmerError::Validation(format!(
                "duration must be {}-{} minutes",
                MIN_DURATION_MINUTES, MAX_DURATION_MINUTES
            )));
        }

        let title = match request.title {
            Some(title) if !title.trim().is_empty() => title.trim().to_string(),
            _ => format!("Session — {}", Utc::now().format("%Y-%m-%d")),
        };

        let body = self
            .generator
            .generate(&symptoms, tone, duration_minutes)
            .await?;

        let script = self
            .store
            .create_script(ScriptDraft {
                owner_id,
                title,
                symptoms,
                tone,
                duration_minutes,
                body,
            })
            .await?;

        info!("generated script {} for account {}", script.id, owner_id);
        Ok(script)
    }

    pub async fn list(&self, owner_id: Uuid) -> Result<Vec<Script>, MesmerError> {
        self.store.list_scripts(owner_id).await
    }

    /// `NotFound` covers both a missing id and another owner's script.
    pub async fn get(&self, owner_id: Uuid, script_id: Uuid) -> Result<Script, MesmerError> {
        match self.store.get_script(owner_id, script_id).await? {
            Some(script) => Ok(script),
            None => Err(MesmerError::NotFound),
        }
    }

    pub async fn delete(&self, owner_id: Uuid, script_id: Uuid) -> Result<(), MesmerError> {
        if self.store.delete_script(owner_id, script_id).await? {
            debug!("deleted script {} for account {}", script_id, owner_id);
            Ok(())
        } else {
            Err(MesmerError::NotFound)
        }
    }
}

fn validate_symptoms(symptoms: &[String]) -> Result<Vec<String>, MesmerError> {
    if symptoms.is_empty() {
        return Err(MesmerError::Validation(
            "symptoms must be a non-empty list".to_string(),
        ));
    }

    let mut trimmed = Vec::with_capacity(symptoms.len());
    for symptom in symptoms {
        let symptom = symptom.trim();
        if symptom.is_empty() {
            return Err(MesmerError::Validation(
                "each symptom must be a non-empty string".to_string(),
            ));
        }
        trimmed.push(symptom.to_string());
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::StubGenerator;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts generator invocations so tests can assert rejected requests
    /// never reach the collaborator.
    struct CountingGenerator {
        calls: AtomicUsize,
    }

    impl CountingGenerator {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ScriptGenerator for CountingGenerator {
        async fn generate(
            &self,
            symptoms: &[String],
            tone: Tone,
            duration_minutes: u16,
        ) -> Result<String, MesmerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            StubGenerator.generate(symptoms, tone, duration_minutes).await
        }
    }

    fn fixture() -> (ScriptService, Arc<MemoryStore>, Arc<CountingGenerator>) {
        let store = Arc::new(MemoryStore::new());
        let generator = Arc::new(CountingGenerator::new());
        let service = ScriptService::new(store.clone(), generator.clone());
        (service, store, generator)
    }

    fn request(symptoms: &[&str]) -> GenerateRequest {
        GenerateRequest {
            symptoms: symptoms.iter().map(|s| s.to_string()).collect(),
            ..GenerateRequest::default()
        }
    }

    #[tokio::test]
    async fn generate_applies_defaults_and_persists() {
        let (service, store, _) = fixture();
        let owner = Uuid::new_v4();

        let script = service
            .generate(owner, request(&["insomnia"]))
            .await
            .unwrap();

        assert_eq!(script.tone, Tone::Calm);
        assert_eq!(script.duration_minutes, 20);
        assert!(!script.body.is_empty());
        assert!(script.title.starts_with("Session — "));

        let listed = store.list_scripts(owner).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0], script);
    }

    #[tokio::test]
    async fn generate_honors_explicit_fields() {
        let (service, _, _) = fixture();

        let script = service
            .generate(
                Uuid::new_v4(),
                GenerateRequest {
                    symptoms: vec![" stress ".to_string(), "tension".to_string()],
                    tone: Some(Tone::Authoritative),
                    duration_minutes: Some(45),
                    title: Some("  Evening reset  ".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(script.tone, Tone::Authoritative);
        assert_eq!(script.duration_minutes, 45);
        assert_eq!(script.title, "Evening reset");
        // Symptoms are stored trimmed, in order.
        assert_eq!(script.symptoms, vec!["stress", "tension"]);
    }

    #[tokio::test]
    async fn out_of_range_durations_never_reach_generator_or_store() {
        let (service, store, generator) = fixture();
        let owner = Uuid::new_v4();

        for duration in [0, 4, 61, 90] {
            let result = service
                .generate(
                    owner,
                    GenerateRequest {
                        duration_minutes: Some(duration),
                        ..request(&["insomnia"])
                    },
                )
                .await;
            assert!(matches!(result, Err(MesmerError::Validation(_))));
        }

        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert!(store.list_scripts(owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn boundary_durations_are_accepted() {
        let (service, _, _) = fixture();

        for duration in [5, 60] {
            let script = service
                .generate(
                    Uuid::new_v4(),
                    GenerateRequest {
                        duration_minutes: Some(duration),
                        ..request(&["insomnia"])
                    },
                )
                .await
                .unwrap();
            assert_eq!(script.duration_minutes, duration);
        }
    }

    #[tokio::test]
    async fn empty_or_blank_symptoms_are_rejected() {
        let (service, _, generator) = fixture();

        let empty = service.generate(Uuid::new_v4(), request(&[])).await;
        assert!(matches!(empty, Err(MesmerError::Validation(_))));

        let blank = service
            .generate(Uuid::new_v4(), request(&["insomnia", "   "]))
            .await;
        assert!(matches!(blank, Err(MesmerError::Validation(_))));

        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn get_and_delete_miss_as_not_found() {
        let (service, _, _) = fixture();
        let ana = Uuid::new_v4();
        let bo = Uuid::new_v4();

        let script = service.generate(ana, request(&["insomnia"])).await.unwrap();

        // Bo supplying Ana's exact id gets NotFound, same as a missing id.
        assert!(matches!(
            service.get(bo, script.id).await,
            Err(MesmerError::NotFound)
        ));
        assert!(matches!(
            service.delete(bo, script.id).await,
            Err(MesmerError::NotFound)
        ));
        assert!(matches!(
            service.get(ana, Uuid::new_v4()).await,
            Err(MesmerError::NotFound)
        ));

        // The owner still succeeds afterwards.
        assert_eq!(service.get(ana, script.id).await.unwrap().id, script.id);
        service.delete(ana, script.id).await.unwrap();
        assert!(service.list(ana).await.unwrap().is_empty());
    }
}
