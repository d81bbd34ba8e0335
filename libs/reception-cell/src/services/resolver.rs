// libs/reception-cell/src/services/resolver.rs
use std::sync::Arc;

use ehr_cell::client::EhrClient;
use ehr_cell::models::{EhrError, PatientQuery, PatientRecord};
use tracing::{debug, info, warn};

use crate::models::{IdentityClaim, PatientResolution, UncertainReason};
use crate::services::complexity::{soundex, NameComplexityScorer};
use crate::services::compose::{personalize, Tone};
use crate::services::normalize::{normalize_phone, split_patient_name};

/// Gate below which no EHR search is attempted; the transcription is too
/// unreliable for the query to be worth the round trip.
const SEARCH_GATE: i32 = 50;
/// Below this, a clean miss asks for spelling instead of offering
/// registration.
const REGISTRATION_GATE: i32 = 80;

/// Resolves a caller's spoken identity to an EHR patient record. Total over
/// every `IdentityClaim`: collaborator failures become a
/// `manual_verification` outcome, never an error to the webhook boundary.
pub struct PatientResolver {
    ehr: Arc<dyn EhrClient>,
    scorer: Arc<dyn NameComplexityScorer>,
}

impl PatientResolver {
    pub fn new(ehr: Arc<dyn EhrClient>, scorer: Arc<dyn NameComplexityScorer>) -> Self {
        Self { ehr, scorer }
    }

    pub async fn resolve(&self, claim: &IdentityClaim) -> PatientResolution {
        let Some(name) = claim.raw_name.as_deref().map(str::trim).filter(|n| !n.is_empty())
        else {
            return PatientResolution::Uncertain {
                reason: UncertainReason::GetPatientName,
                message: "I'll need your full name to check our records.".to_string(),
                spelling_prompt: None,
                cultural_context: Vec::new(),
                confidence: 0,
                phonetic_key: None,
            };
        };

        let assessment = self.scorer.assess(name);
        debug!(
            "Name complexity for caller: confidence {} indicators {:?}",
            assessment.confidence, assessment.cultural_indicators
        );

        // Very low confidence: ask for spelling before spending an EHR query
        // on a transcription that is probably wrong.
        if assessment.confidence < SEARCH_GATE {
            return PatientResolution::Uncertain {
                reason: UncertainReason::SpellNameFirst,
                message: assessment.suggestion.clone(),
                spelling_prompt: Some(
                    "Please spell your name letter by letter so I can find you in our system."
                        .to_string(),
                ),
                cultural_context: assessment.cultural_indicators,
                confidence: assessment.confidence,
                phonetic_key: None,
            };
        }

        let (first_name, last_name) = split_patient_name(name);
        if first_name.is_empty() || last_name.is_empty() {
            return PatientResolution::Uncertain {
                reason: UncertainReason::GetFullName,
                message: format!(
                    "I need your full name to check our records. I have '{}' - could you provide your first and last name?",
                    name
                ),
                spelling_prompt: None,
                cultural_context: assessment.cultural_indicators,
                confidence: assessment.confidence,
                phonetic_key: None,
            };
        }

        match self.search(claim, &first_name, &last_name).await {
            Ok(Some(record)) => {
                let patient_id = record.patientid.clone().unwrap_or_default();
                info!("Resolved caller to patient {} (exact match)", patient_id);
                PatientResolution::Found {
                    patient_id,
                    record,
                    message: personalize(
                        Some(name),
                        "I found your record in our system. Let me check what appointments are available for you.",
                        Tone::Success,
                    ),
                }
            }
            Ok(None) if assessment.confidence < REGISTRATION_GATE => {
                // No exact match and a moderately risky name: ask for spelling
                // rather than concluding the caller is new. The phonetic key
                // is advisory only; no fuzzy lookup is performed yet.
                PatientResolution::Uncertain {
                    reason: UncertainReason::SpellNameForSearch,
                    message: assessment.suggestion.clone(),
                    spelling_prompt: Some(
                        "I want to make sure I find you in our system. Could you spell your name for me?"
                            .to_string(),
                    ),
                    cultural_context: assessment.cultural_indicators,
                    confidence: assessment.confidence,
                    phonetic_key: Some(soundex(name)),
                }
            }
            Ok(None) => PatientResolution::NotFound {
                message: personalize(
                    Some(name),
                    "I don't see you in our system yet. Would you like me to register you as a new patient? I'll just need a few details.",
                    Tone::Clarification,
                ),
                registration_prompt: Some(format!(
                    "Hi {}! To get you registered, I'll need your phone number, email address, and date of birth. Let's start with your phone number.",
                    first_name
                )),
                search_method: "not_found",
                error: None,
            },
            Err(error) => {
                warn!("EHR search failed during resolution: {}", error);
                PatientResolution::NotFound {
                    message: personalize(
                        Some(name),
                        "I'm having trouble accessing our patient records right now. Let me try a different approach.",
                        Tone::Clarification,
                    ),
                    registration_prompt: None,
                    search_method: "manual_verification",
                    error: Some(error.to_string()),
                }
            }
        }
    }

    /// Phone-augmented search first when the caller gave at least ten usable
    /// digits, then the name-only fallback. Sequential by design: the
    /// fallback is conditional on the first query's outcome. First matching
    /// record wins; ranking is the collaborator's job.
    async fn search(
        &self,
        claim: &IdentityClaim,
        first_name: &str,
        last_name: &str,
    ) -> Result<Option<PatientRecord>, EhrError> {
        let phone_digits = claim
            .raw_phone
            .as_deref()
            .map(normalize_phone)
            .unwrap_or_default();

        if phone_digits.len() >= 10 {
            let matches = self
                .ehr
                .search_patients(PatientQuery {
                    first_name: Some(first_name.to_string()),
                    last_name: Some(last_name.to_string()),
                    phone: Some(phone_digits),
                    ..Default::default()
                })
                .await?;
            if let Some(record) = matches.into_iter().next() {
                return Ok(Some(record));
            }
            debug!("Phone-augmented search empty, falling back to name only");
        }

        let matches = self
            .ehr
            .search_patients(PatientQuery {
                first_name: Some(first_name.to_string()),
                last_name: Some(last_name.to_string()),
                ..Default::default()
            })
            .await?;
        Ok(matches.into_iter().next())
    }
}
