//! Per-action state machine tying the prompt builder, encoder, proxy client
//! and parser together, plus the persisted client state.
//!
//! Each [`ActionSlot`] moves `Idle -> InFlight -> Success | Failed`.
//! Validation runs first and a rejected trigger leaves the slot untouched.
//! A failure never clears earlier results.

use chrono::Utc;
use serde::Serialize;
use std::{collections::HashMap, path::PathBuf};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    client::{ClientError, Generation, GenerationBackend, GenerationRequest},
    encoder::encode_all,
    export,
    models::{ActionSlot, AttachedDocument, DocumentKind, Draft, FormInput, Theme, Usage},
    parser::{parse_analysis, ParseOutcome},
    prompt::{
        analysis_prompt, codes_lookup_prompt, cross_check_prompt, email_prompt, subject_line, system_prompt,
        TaskKind,
    },
    regulations::{issue_category, relevant_regulations},
    retry::RetryPolicy,
    store::{LocalStore, StoreError, API_KEY_KEY, DRAFTS_KEY, LANGUAGE_KEY, THEME_KEY},
    urgency::{assess_urgency, UrgencyAlert},
    validation::{validate_api_key, FieldError, ValidationError},
};

pub const DEFAULT_LANGUAGE: &str = "en";
pub const CODES_HEADER: &str = "=== AUTO-LOOKED UP CODES ===";
pub const ANALYSIS_HEADER: &str = "=== FROM DOCUMENT ANALYSIS ===";

/// Settings and drafts that outlive a session.
pub struct ClientState<S> {
    store: S,
    api_key: String,
    language: String,
    theme: Theme,
}

impl<S: LocalStore> ClientState<S> {
    pub fn hydrate(store: S) -> Result<Self, StoreError> {
        let api_key = store.get(API_KEY_KEY)?.unwrap_or_default();
        let language = store
            .get(LANGUAGE_KEY)?
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
        let theme = store.get(THEME_KEY)?.as_deref().and_then(Theme::parse).unwrap_or_default();
        info!("🔑 Client state hydrated: has_api_key={} language={} theme={}", !api_key.is_empty(), language, theme.as_str());
        Ok(Self { store, api_key, language, theme })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// An empty key clears the persisted one.
    pub fn set_api_key(&mut self, api_key: &str) -> Result<(), StoreError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            self.store.remove(API_KEY_KEY)?;
        } else {
            self.store.set(API_KEY_KEY, api_key)?;
        }
        self.api_key = api_key.to_string();
        Ok(())
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn set_language(&mut self, language: &str) -> Result<(), StoreError> {
        self.store.set(LANGUAGE_KEY, language)?;
        self.language = language.to_string();
        Ok(())
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<(), StoreError> {
        self.store.set(THEME_KEY, theme.as_str())?;
        self.theme = theme;
        Ok(())
    }

    pub fn toggle_theme(&mut self) -> Result<Theme, StoreError> {
        let next = self.theme.toggled();
        self.set_theme(next)?;
        Ok(next)
    }

    fn read_drafts(&self) -> Result<Vec<Draft>, StoreError> {
        let Some(raw) = self.store.get(DRAFTS_KEY)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(drafts) => Ok(drafts),
            Err(e) => {
                warn!("Ignoring unreadable drafts: {}", e);
                Ok(Vec::new())
            }
        }
    }

    /// Newest first.
    pub fn drafts(&self) -> Result<Vec<Draft>, StoreError> {
        let mut drafts = self.read_drafts()?;
        drafts.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        Ok(drafts)
    }

    pub fn draft(&self, id: &str) -> Result<Option<Draft>, StoreError> {
        Ok(self.read_drafts()?.into_iter().find(|d| d.id == id))
    }

    /// Inserts, or replaces the draft with the same id.
    pub fn save_draft(&mut self, draft: Draft) -> Result<(), StoreError> {
        let mut drafts = self.read_drafts()?;
        match drafts.iter_mut().find(|d| d.id == draft.id) {
            Some(existing) => *existing = draft,
            None => drafts.push(draft),
        }
        self.store.set(DRAFTS_KEY, &serde_json::to_string(&drafts)?)
    }

    /// Returns whether a draft was removed.
    pub fn delete_draft(&mut self, id: &str) -> Result<bool, StoreError> {
        let mut drafts = self.read_drafts()?;
        let before = drafts.len();
        drafts.retain(|d| d.id != id);
        if drafts.len() == before {
            return Ok(false);
        }
        self.store.set(DRAFTS_KEY, &serde_json::to_string(&drafts)?)?;
        Ok(true)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum ActionState {
    #[default]
    Idle,
    InFlight,
    Success,
    Failed { message: String, status: Option<u16> },
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Action already in progress")]
    Busy(ActionSlot),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentAnalysis {
    pub kind: DocumentKind,
    pub document_name: String,
    pub text: String,
    /// Present only for kinds with labelled output.
    pub parsed: Option<ParseOutcome>,
}

static IDLE: ActionState = ActionState::Idle;

pub struct Orchestrator<B, S> {
    backend: B,
    state: ClientState<S>,
    retry: RetryPolicy,
    pub form: FormInput,
    attachments: Vec<AttachedDocument>,
    slots: HashMap<ActionSlot, ActionState>,
    generated_email: Option<String>,
    subject: Option<String>,
    analyses: HashMap<DocumentKind, DocumentAnalysis>,
    verification: Option<String>,
    notice: Option<String>,
    field_errors: Vec<FieldError>,
    current_draft_id: Option<String>,
    last_usage: Option<Usage>,
}

impl<B: GenerationBackend, S: LocalStore> Orchestrator<B, S> {
    pub fn new(backend: B, state: ClientState<S>) -> Self {
        Self {
            backend,
            state,
            retry: RetryPolicy::none(),
            form: FormInput::default(),
            attachments: Vec::new(),
            slots: HashMap::new(),
            generated_email: None,
            subject: None,
            analyses: HashMap::new(),
            verification: None,
            notice: None,
            field_errors: Vec::new(),
            current_draft_id: None,
            last_usage: None,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn state(&self) -> &ClientState<S> {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ClientState<S> {
        &mut self.state
    }

    pub fn slot(&self, slot: ActionSlot) -> &ActionState {
        self.slots.get(&slot).unwrap_or(&IDLE)
    }

    pub fn generated_email(&self) -> Option<&str> {
        self.generated_email.as_deref()
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn analysis(&self, kind: DocumentKind) -> Option<&DocumentAnalysis> {
        self.analyses.get(&kind)
    }

    pub fn verification(&self) -> Option<&str> {
        self.verification.as_deref()
    }

    /// Banner message from the last rejected or failed action.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn field_errors(&self) -> &[FieldError] {
        &self.field_errors
    }

    pub fn attachments(&self) -> &[AttachedDocument] {
        &self.attachments
    }

    pub fn last_usage(&self) -> Option<Usage> {
        self.last_usage
    }

    pub fn urgency(&self) -> Option<UrgencyAlert> {
        assess_urgency(&self.form.issue_type, &self.form.measurements, &self.form.health_impact)
    }

    /// `Subject:` line plus body, ready to copy or download.
    pub fn full_email(&self) -> Option<String> {
        let body = self.generated_email.as_deref()?;
        Some(export::full_email(self.subject.as_deref().unwrap_or_default(), body))
    }

    /// Encodes files concurrently; one bad file rejects the whole batch.
    pub async fn attach_files(&mut self, paths: &[PathBuf]) -> Result<usize, ActionError> {
        match encode_all(paths).await {
            Ok(docs) => {
                let added = docs.len();
                self.attachments.extend(docs);
                info!("📎 Attached {} file(s), {} total", added, self.attachments.len());
                Ok(added)
            }
            Err(e) => Err(self.reject(ValidationError::Document(e))),
        }
    }

    pub fn attach(&mut self, document: AttachedDocument) {
        self.attachments.push(document);
    }

    pub fn remove_attachment(&mut self, index: usize) -> Option<AttachedDocument> {
        (index < self.attachments.len()).then(|| self.attachments.remove(index))
    }

    pub async fn generate_email(&mut self) -> Result<(), ActionError> {
        let slot = ActionSlot::GenerateEmail;
        self.ensure_idle(slot)?;
        if let Err(e) = self.form.validate() {
            return Err(self.reject(e));
        }
        let api_key = self.checked_api_key()?;

        let regulations =
            relevant_regulations(issue_category(&self.form.issue_type), &self.form.state, &self.form.recipient);
        let request = GenerationRequest {
            api_key,
            system_prompt: system_prompt(TaskKind::EmailGeneration).to_string(),
            user_prompt: email_prompt(&self.form, &regulations, &self.attachments),
            documents: self.attachments.iter().map(AttachedDocument::to_payload).collect(),
        };

        let generation = self.dispatch(slot, request).await?;
        self.subject = Some(subject_line(&self.form.issue_type, self.form.escalation_level, &self.form.location));
        self.generated_email = Some(generation.text);
        Ok(())
    }

    pub async fn analyze_document(&mut self, kind: DocumentKind, document: &AttachedDocument) -> Result<(), ActionError> {
        let slot = kind.descriptor().slot;
        self.ensure_idle(slot)?;
        let api_key = self.checked_api_key()?;

        let request = GenerationRequest {
            api_key,
            system_prompt: system_prompt(TaskKind::DocumentAnalysis(kind)).to_string(),
            user_prompt: analysis_prompt(kind, &document.mime_type),
            documents: vec![document.to_payload()],
        };

        let generation = self.dispatch(slot, request).await?;
        let parsed = kind.has_structured_output().then(|| parse_analysis(&generation.text));
        self.analyses.insert(
            kind,
            DocumentAnalysis { kind, document_name: document.name.clone(), text: generation.text, parsed },
        );
        Ok(())
    }

    /// Cross-checks the generated email against current regulations.
    pub async fn verify_regulations(&mut self) -> Result<(), ActionError> {
        let slot = ActionSlot::VerifyRegulations;
        self.ensure_idle(slot)?;
        if !self.has_jurisdiction() {
            return Err(self.reject(ValidationError::MissingContext("Please select issue type, state, and city first")));
        }
        let Some(email) = self.generated_email.clone() else {
            return Err(self.reject(ValidationError::MissingContext("Please generate an email first before verifying")));
        };
        let api_key = self.checked_api_key()?;

        let request = GenerationRequest {
            api_key,
            system_prompt: system_prompt(TaskKind::RegulationVerification).to_string(),
            user_prompt: cross_check_prompt(&email, &self.form.issue_type, &self.form.state, &self.form.city),
            documents: Vec::new(),
        };

        let generation = self.dispatch(slot, request).await?;
        self.verification = Some(generation.text);
        Ok(())
    }

    /// Appends looked-up building and health codes to the form's regulations.
    pub async fn lookup_codes(&mut self) -> Result<(), ActionError> {
        let slot = ActionSlot::LookupCodes;
        self.ensure_idle(slot)?;
        if !self.has_jurisdiction() {
            return Err(self.reject(ValidationError::MissingContext("Please select issue type, city, and state first")));
        }
        let api_key = self.checked_api_key()?;

        let request = GenerationRequest {
            api_key,
            system_prompt: system_prompt(TaskKind::CodeLookup).to_string(),
            user_prompt: codes_lookup_prompt(&self.form.city, &self.form.state, &self.form.issue_type),
            documents: Vec::new(),
        };

        let generation = self.dispatch(slot, request).await?;
        append_block(&mut self.form.regulations, CODES_HEADER, &generation.text);
        Ok(())
    }

    pub fn use_analysis_in_email(&mut self, kind: DocumentKind) -> Result<(), ActionError> {
        let text = self.analyses.get(&kind).map(|a| a.text.clone());
        let Some(text) = text else {
            return Err(self.reject(ValidationError::MissingContext("Please analyze a document first")));
        };
        append_block(&mut self.form.evidence, ANALYSIS_HEADER, &text);
        Ok(())
    }

    /// Saves the current email and form. Saving again after a save or load
    /// overwrites the same draft.
    pub fn save_current_draft(&mut self) -> Result<String, ActionError> {
        let Some(email) = self.generated_email.clone() else {
            return Err(self.reject(ValidationError::MissingContext("Please generate an email first")));
        };
        let id = self.current_draft_id.clone().unwrap_or_else(|| format!("draft_{}", Uuid::new_v4()));
        self.state.save_draft(Draft { id: id.clone(), email, form_data: self.form.clone(), saved_at: Utc::now() })?;
        info!("💾 Saved draft {}", id);
        self.current_draft_id = Some(id.clone());
        Ok(id)
    }

    pub fn load_draft(&mut self, id: &str) -> Result<(), ActionError> {
        let Some(draft) = self.state.draft(id)? else {
            return Err(self.reject(ValidationError::MissingContext("Draft not found")));
        };
        self.subject = Some(subject_line(
            &draft.form_data.issue_type,
            draft.form_data.escalation_level,
            &draft.form_data.location,
        ));
        self.form = draft.form_data;
        self.generated_email = Some(draft.email);
        self.current_draft_id = Some(draft.id);
        Ok(())
    }

    pub fn delete_draft(&mut self, id: &str) -> Result<bool, ActionError> {
        let removed = self.state.delete_draft(id)?;
        if self.current_draft_id.as_deref() == Some(id) {
            self.current_draft_id = None;
        }
        Ok(removed)
    }

    /// Starts a fresh draft; the next save gets a new id.
    pub fn new_draft(&mut self) {
        self.current_draft_id = None;
    }

    fn has_jurisdiction(&self) -> bool {
        [&self.form.issue_type, &self.form.state, &self.form.city]
            .iter()
            .all(|v| !v.trim().is_empty())
    }

    fn ensure_idle(&self, slot: ActionSlot) -> Result<(), ActionError> {
        match self.slot(slot) {
            ActionState::InFlight => Err(ActionError::Busy(slot)),
            _ => Ok(()),
        }
    }

    fn checked_api_key(&mut self) -> Result<String, ActionError> {
        let api_key = self.state.api_key().trim().to_string();
        match validate_api_key(&api_key) {
            Ok(()) => Ok(api_key),
            Err(e) => Err(self.reject(e)),
        }
    }

    fn reject(&mut self, err: ValidationError) -> ActionError {
        warn!("⚠️ Rejected before sending: {}", err);
        self.notice = Some(err.to_string());
        self.field_errors = err.field_errors().to_vec();
        ActionError::Validation(err)
    }

    async fn dispatch(&mut self, slot: ActionSlot, request: GenerationRequest) -> Result<Generation, ActionError> {
        self.notice = None;
        self.field_errors.clear();
        info!("🚀 {:?} started", slot);

        let retry = self.retry;
        let backend = &self.backend;
        let request = &request;
        let in_flight = InFlightMark::enter(&mut self.slots, slot);
        let result = retry.run(move || backend.generate(request), ClientError::is_retryable).await;

        match result {
            Ok(generation) => {
                info!(
                    "✅ {:?} succeeded (input_tokens={} output_tokens={})",
                    slot, generation.usage.input_tokens, generation.usage.output_tokens
                );
                in_flight.settle(ActionState::Success);
                self.last_usage = Some(generation.usage);
                Ok(generation)
            }
            Err(err) => {
                let message = err.to_string();
                error!("❌ {:?} failed: {}", slot, message);
                in_flight.settle(ActionState::Failed { message: message.clone(), status: err.status() });
                self.notice = Some(message);
                Err(ActionError::Client(err))
            }
        }
    }
}

/// Marks a slot `InFlight` for as long as it lives. Dropped without
/// [`InFlightMark::settle`] (the action future was cancelled), it puts the slot
/// back to what it was before.
struct InFlightMark<'a> {
    slots: &'a mut HashMap<ActionSlot, ActionState>,
    slot: ActionSlot,
    previous: Option<ActionState>,
}

impl<'a> InFlightMark<'a> {
    fn enter(slots: &'a mut HashMap<ActionSlot, ActionState>, slot: ActionSlot) -> Self {
        let previous = slots.insert(slot, ActionState::InFlight).unwrap_or_default();
        Self { slots, slot, previous: Some(previous) }
    }

    fn settle(mut self, outcome: ActionState) {
        self.previous = None;
        self.slots.insert(self.slot, outcome);
    }
}

impl Drop for InFlightMark<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            warn!("⏹️ {:?} cancelled before finishing", self.slot);
            self.slots.insert(self.slot, previous);
        }
    }
}

fn append_block(target: &mut String, header: &str, body: &str) {
    if !target.is_empty() {
        target.push_str("\n\n");
    }
    target.push_str(header);
    target.push('\n');
    target.push_str(body);
}
