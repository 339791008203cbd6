use serde::{Serialize, Deserialize};
use serde_with::skip_serializing_none;
use chrono::{DateTime, NaiveDate, Utc};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EscalationLevel {
    Initial,
    #[default]
    Professional,
    Formal,
    Legal,
}

impl EscalationLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Professional => "professional",
            Self::Formal => "formal",
            Self::Legal => "legal",
        }
    }

    /// Tone instruction handed to the model.
    pub fn tone(self) -> &'static str {
        match self {
            Self::Initial => "polite and cooperative; this is a first contact and should assume good faith",
            Self::Professional => "firm but courteous; cite the recipient's obligations and request a clear timeline",
            Self::Formal => "formal and documented; list the violations and demand corrective action by a specific date",
            Self::Legal => "a pre-legal notice; state the legal basis, the deadline, and the consequences of inaction without threatening language",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum UrgencyLevel {
    Low,
    #[default]
    Medium,
    High,
    Emergency,
}

impl UrgencyLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Emergency => "emergency",
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TimelineEvent {
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    #[serde(default)]
    pub description: String,
}

/// Everything the resident typed into the advocacy form.
#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FormInput {
    pub issue_type: String,
    pub recipient: String,
    pub location: String,
    pub city: String,
    pub state: String,
    pub evidence: String,
    pub measurements: String,
    pub previous_contact: String,
    pub health_impact: String,
    pub regulations: String,
    pub desired_outcome: String,
    pub escalation_level: EscalationLevel,
    pub affected_residents: String,
    pub property_age: String,
    pub urgency_level: UrgencyLevel,
    pub sender_name: String,
    pub sender_email: String,
    pub sender_phone: String,
    pub sender_address: String,
    pub timeline: Vec<TimelineEvent>,
    pub estimated_damages: Option<f64>,
}

impl FormInput {
    pub const REQUIRED_FIELDS: [&'static str; 9] = [
        "issueType",
        "recipient",
        "location",
        "city",
        "state",
        "evidence",
        "desiredOutcome",
        "senderName",
        "senderEmail",
    ];

    /// Text field lookup by its wire name.
    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "issueType" => &self.issue_type,
            "recipient" => &self.recipient,
            "location" => &self.location,
            "city" => &self.city,
            "state" => &self.state,
            "evidence" => &self.evidence,
            "measurements" => &self.measurements,
            "previousContact" => &self.previous_contact,
            "healthImpact" => &self.health_impact,
            "regulations" => &self.regulations,
            "desiredOutcome" => &self.desired_outcome,
            "affectedResidents" => &self.affected_residents,
            "propertyAge" => &self.property_age,
            "senderName" => &self.sender_name,
            "senderEmail" => &self.sender_email,
            "senderPhone" => &self.sender_phone,
            "senderAddress" => &self.sender_address,
            _ => return None,
        };
        Some(value.as_str())
    }
}

/// A user-selected file, already read and base64-encoded.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AttachedDocument {
    pub name: String,
    pub mime_type: String,
    /// `data:<mime>;base64,<payload>`
    pub data: String,
    pub size_bytes: u64,
}

impl AttachedDocument {
    pub fn to_payload(&self) -> DocumentPayload {
        DocumentPayload { mime_type: self.mime_type.clone(), data: self.data.clone() }
    }
}

/// Document entry as it travels in the proxy request body.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DocumentPayload {
    #[serde(rename = "type")]
    pub mime_type: String,
    pub data: String,
}

/// Body of `POST /api/analyze-document`.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default)]
    pub user_prompt: String,
    #[serde(default)]
    pub documents: Vec<DocumentPayload>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub email: String,
    #[serde(default)]
    pub usage: Usage,
}

impl AnalyzeResponse {
    pub fn success(email: String, usage: Usage) -> Self {
        Self { success: true, email, usage }
    }
}

#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    pub details: Option<serde_json::Value>,
}

/// Independent action slots; each has its own Idle/InFlight/Success/Failed state.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase", tag = "action", content = "document")]
pub enum ActionSlot {
    GenerateEmail,
    Analyze(DocumentKind),
    VerifyRegulations,
    LookupCodes,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Water,
    Warranty,
    Lease,
    Inspection,
    Insurance,
    Utility,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 6] = [
        Self::Water,
        Self::Warranty,
        Self::Lease,
        Self::Inspection,
        Self::Insurance,
        Self::Utility,
    ];
}

/// A generated email saved for later.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub id: String,
    pub email: String,
    pub form_data: FormInput,
    pub saved_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}
