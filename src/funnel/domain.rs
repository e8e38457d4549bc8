use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque applicant profile captured by the intake form.
///
/// The funnel never inspects individual fields; the profile is forwarded
/// unmodified to both upstream endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile(pub Map<String, Value>);

impl Profile {
    pub fn as_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

/// One scholarship match returned by the calculation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScholarshipResult {
    pub name: String,
    pub amount: String,
    pub deadline: String,
    pub match_score: u8,
    pub one_liner_reason: String,
}

/// Ordered match list plus the aggregate probability estimate.
///
/// Ordering is meaningful: the first entry is the fully visible top pick and
/// the remainder are rendered locked until lead capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsPayload {
    pub scholarships: Vec<ScholarshipResult>,
    pub summary_probability: u8,
}

impl ResultsPayload {
    pub fn is_empty(&self) -> bool {
        self.scholarships.is_empty()
    }
}

/// Contact details collected by the lead-capture form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadContact {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl LeadContact {
    /// Every field must be present before a submission leaves the process.
    pub fn validate(&self) -> Result<(), LeadValidationError> {
        for (field, value) in [
            ("name", &self.name),
            ("email", &self.email),
            ("phone", &self.phone),
        ] {
            if value.trim().is_empty() {
                return Err(LeadValidationError::MissingField(field));
            }
        }
        Ok(())
    }
}

/// Raised locally when a lead form field is blank; no request is issued.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LeadValidationError {
    #[error("Please fill all fields: {0} is required")]
    MissingField(&'static str),
}

/// Wire payload for `POST /api/submit-lead`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadSubmission {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub user_profile: Value,
    pub scholarship_results: ResultsPayload,
}

impl LeadSubmission {
    pub fn new(contact: &LeadContact, profile: &Profile, results: &ResultsPayload) -> Self {
        Self {
            name: contact.name.clone(),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
            user_profile: profile.as_value(),
            scholarship_results: results.clone(),
        }
    }
}
