//! Contact form and the third-party form relay it posts to.
//!
//! The relay accepts a multipart form body and answers with a JSON object
//! whose boolean `success` field decides the outcome. Submissions are never
//! retried; a failure is shown inline and the user may send again.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::listeners::{KeyListeners, Layer, ListenerGuard};

pub const DEFAULT_ENDPOINT: &str = "https://api.web3forms.com/submit";

/// How long a success notice stays on screen.
pub const SENT_NOTICE_SECS: i64 = 5;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("no relay access key configured (set --access-key or FOLIO_ACCESS_KEY)")]
    MissingAccessKey,
    #[error("{field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: &'static str,
    },
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("unexpected relay response: {0}")]
    BadResponse(String),
    #[error("relay rejected the message: {0}")]
    Rejected(String),
}

// ---------------------------------------------------------------------------
// ContactForm
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FormField {
    #[default]
    Name,
    Email,
    Message,
}

impl FormField {
    pub fn next(self) -> Self {
        match self {
            FormField::Name => FormField::Email,
            FormField::Email => FormField::Message,
            FormField::Message => FormField::Name,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            FormField::Name => FormField::Message,
            FormField::Email => FormField::Name,
            FormField::Message => FormField::Email,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FormField::Name => "Name",
            FormField::Email => "Email",
            FormField::Message => "Message",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactForm {
    pub fn field(&self, field: FormField) -> &str {
        match field {
            FormField::Name => &self.name,
            FormField::Email => &self.email,
            FormField::Message => &self.message,
        }
    }

    pub fn field_mut(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::Name => &mut self.name,
            FormField::Email => &mut self.email,
            FormField::Message => &mut self.message,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn validate(&self) -> Result<(), RelayError> {
        if self.name.trim().is_empty() {
            return Err(RelayError::InvalidField {
                field: "name",
                reason: "required",
            });
        }
        if self.email.trim().is_empty() {
            return Err(RelayError::InvalidField {
                field: "email",
                reason: "required",
            });
        }
        if !looks_like_email(self.email.trim()) {
            return Err(RelayError::InvalidField {
                field: "email",
                reason: "not a valid address",
            });
        }
        if self.message.trim().is_empty() {
            return Err(RelayError::InvalidField {
                field: "message",
                reason: "required",
            });
        }
        Ok(())
    }

    /// The form fields in the order the relay receives them.
    pub fn payload(&self, access_key: &str) -> Vec<(&'static str, String)> {
        let name = self.name.trim();
        vec![
            ("access_key", access_key.to_string()),
            ("name", name.to_string()),
            ("email", self.email.trim().to_string()),
            ("message", self.message.trim().to_string()),
            ("subject", format!("Portfolio Contact from {}", name)),
            ("redirect", "false".to_string()),
        ]
    }
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !email.contains(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}

// ---------------------------------------------------------------------------
// Relay response
// ---------------------------------------------------------------------------

#[derive(Deserialize, Debug, PartialEq, Eq)]
pub struct RelayResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl RelayResponse {
    /// Interpret a response body.
    pub fn interpret(body: &str) -> Result<(), RelayError> {
        let response: RelayResponse = serde_json::from_str(body)
            .map_err(|e| RelayError::BadResponse(format!("{} in {:?}", e, truncate(body, 80))))?;
        if response.success {
            Ok(())
        } else {
            Err(RelayError::Rejected(
                response
                    .message
                    .unwrap_or_else(|| "no reason given".to_string()),
            ))
        }
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// ---------------------------------------------------------------------------
// ContactRelay
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct ContactRelay {
    endpoint: String,
    access_key: Option<String>,
    client: reqwest::blocking::Client,
}

impl ContactRelay {
    pub fn new(endpoint: impl Into<String>, access_key: Option<String>) -> Result<Self, RelayError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            access_key: access_key.filter(|k| !k.trim().is_empty()),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Validate and POST the form once.
    pub fn submit(&self, form: &ContactForm) -> Result<(), RelayError> {
        let access_key = self
            .access_key
            .as_deref()
            .ok_or(RelayError::MissingAccessKey)?;
        form.validate()?;

        let body = form
            .payload(access_key)
            .into_iter()
            .fold(reqwest::blocking::multipart::Form::new(), |body, (k, v)| {
                body.text(k, v)
            });

        info!(endpoint = %self.endpoint, "submitting contact form");
        let text = self
            .client
            .post(&self.endpoint)
            .multipart(body)
            .send()?
            .text()?;

        let outcome = RelayResponse::interpret(&text);
        match &outcome {
            Ok(()) => info!("contact form accepted"),
            Err(e) => warn!(error = %e, "contact form submission failed"),
        }
        outcome
    }

    /// Run [`submit`](Self::submit) on a worker thread; the outcome arrives on
    /// the returned channel.
    pub fn submit_in_background(&self, form: ContactForm) -> mpsc::Receiver<Result<(), RelayError>> {
        let (tx, rx) = mpsc::channel();
        let relay = self.clone();
        thread::spawn(move || {
            let _ = tx.send(relay.submit(&form));
        });
        rx
    }
}

// ---------------------------------------------------------------------------
// ContactPanel (form editing state)
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum ContactStatus {
    #[default]
    Idle,
    Sending,
    Sent {
        at: DateTime<Local>,
    },
    Failed(String),
}

/// What the panel wants the app to do after a key press.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelEvent {
    None,
    Submit,
    Closed,
}

#[derive(Default)]
pub struct ContactPanel {
    pub form: ContactForm,
    pub field: FormField,
    pub status: ContactStatus,
    editing: Option<ListenerGuard>,
}

impl ContactPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn begin_editing(&mut self, listeners: &KeyListeners) {
        if self.editing.is_none() {
            self.editing = Some(listeners.attach(Layer::ContactForm));
        }
    }

    pub fn stop_editing(&mut self) {
        self.editing = None;
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> PanelEvent {
        match key.code {
            KeyCode::Esc => {
                self.stop_editing();
                PanelEvent::Closed
            }
            KeyCode::Tab | KeyCode::Down => {
                self.field = self.field.next();
                PanelEvent::None
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.field = self.field.prev();
                PanelEvent::None
            }
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                PanelEvent::Submit
            }
            KeyCode::Enter if self.field == FormField::Message => {
                self.form.message.push('\n');
                PanelEvent::None
            }
            KeyCode::Enter => {
                self.field = self.field.next();
                PanelEvent::None
            }
            KeyCode::Backspace => {
                self.form.field_mut(self.field).pop();
                PanelEvent::None
            }
            KeyCode::Char(c) => {
                self.form.field_mut(self.field).push(c);
                PanelEvent::None
            }
            _ => PanelEvent::None,
        }
    }

    /// Record the outcome of a submission.
    pub fn finish(&mut self, outcome: Result<(), RelayError>, now: DateTime<Local>) {
        match outcome {
            Ok(()) => {
                self.form.clear();
                self.field = FormField::Name;
                self.status = ContactStatus::Sent { at: now };
            }
            Err(e) => self.status = ContactStatus::Failed(e.to_string()),
        }
    }

    /// Hide the success notice once it has been up long enough.
    pub fn tick(&mut self, now: DateTime<Local>) {
        if let ContactStatus::Sent { at } = self.status {
            if (now - at).num_seconds() >= SENT_NOTICE_SECS {
                self.status = ContactStatus::Idle;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
