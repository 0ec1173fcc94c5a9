//! Text-generation collaborator.
//!
//! The services only know the trait; a provider can be swapped (stub, hosted
//! model, anything) without touching the core. Implementations must be pure
//! with respect to the record store.

use async_trait::async_trait;

use crate::error::MesmerError;
use crate::store::Tone;

#[async_trait]
pub trait ScriptGenerator: Send + Sync {
    async fn generate(
        &self,
        symptoms: &[String],
        tone: Tone,
        duration_minutes: u16,
    ) -> Result<String, MesmerError>;
}

/// Built-in template provider: renders a complete markdown session
/// (induction, deepening, suggestions, awakening) from the request.
pub struct StubGenerator;

#[async_trait]
impl ScriptGenerator for StubGenerator {
    async fn generate(
        &self,
        symptoms: &[String],
        tone: Tone,
        duration_minutes: u16,
    ) -> Result<String, MesmerError> {
        let symptom_list = symptoms.join(", ");
        let focus = symptoms
            .first()
            .map(String::as_str)
            .unwrap_or("the challenges you face");
        // ~130 wpm reading pace
        let word_count = u32::from(duration_minutes) * 130;

        Ok(format!(
            "# Hypnotherapy Script — {tone} Approach\n\
             *Approx. {duration_minutes} minutes | Generated for: {symptom_list}*\n\
             \n\
             ---\n\
             \n\
             ## Induction\n\
             \n\
             Close your eyes and take a slow, deep breath in… and out.\n\
             With every breath, you feel your body becoming more relaxed, more at ease.\n\
             Let go of any tension you may be holding in your shoulders… your jaw… your hands.\n\
             \n\
             You are safe here. There is nothing you need to do except breathe and listen.\n\
             \n\
             ---\n\
             \n\
             ## Deepening\n\
             \n\
             As I count from 10 to 1, you will drift deeper into a state of calm, focused relaxation.\n\
             \n\
             10… 9… each number takes you deeper…\n\
             8… 7… your thoughts slow, like leaves floating on a gentle stream…\n\
             6… 5… halfway there — feeling wonderfully heavy and peaceful…\n\
             4… 3… almost there now…\n\
             2… 1… completely relaxed, completely at ease.\n\
             \n\
             ---\n\
             \n\
             ## Therapeutic Suggestions ({symptom_list})\n\
             \n\
             Your mind is remarkably capable of healing itself.\n\
             Every session strengthens your ability to manage {focus}.\n\
             You are calm, in control, and growing stronger each day.\n\
             \n\
             ---\n\
             \n\
             ## Awakening\n\
             \n\
             In a moment, I will count from 1 to 5 and you will return — fully alert, refreshed, and positive.\n\
             \n\
             1… beginning to return…\n\
             2… aware of the room around you…\n\
             3… feeling energised…\n\
             4… almost there…\n\
             5… eyes open, fully awake and feeling wonderful.\n\
             \n\
             ---\n\
             \n\
             *Script length: ~{word_count} words | Tone: {tone}*"
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stub_renders_every_section() {
        let body = StubGenerator
            .generate(&["insomnia".to_string()], Tone::Calm, 20)
            .await
            .unwrap();

        assert!(body.contains("## Induction"));
        assert!(body.contains("## Deepening"));
        assert!(body.contains("## Therapeutic Suggestions (insomnia)"));
        assert!(body.contains("## Awakening"));
        assert!(body.contains("Tone: calm"));
        // 20 minutes at ~130 wpm
        assert!(body.contains("~2600 words"));
    }

    #[tokio::test]
    async fn stub_lists_all_symptoms() {
        let body = StubGenerator
            .generate(
                &["stress".to_string(), "tension".to_string()],
                Tone::Energising,
                5,
            )
            .await
            .unwrap();

        assert!(body.contains("stress, tension"));
        assert!(body.contains("manage stress"));
        assert!(body.contains("energising Approach"));
    }
}
