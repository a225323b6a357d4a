//! Mail seam: trait plus an in-memory implementation for tests.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while handing mail to the transport.
#[derive(Debug, Error)]
pub enum MailError {
    /// The transport rejected or failed to deliver the message.
    #[error("mail transport error: {0}")]
    Transport(String),
}

/// An email ready for the transport.
///
/// The recipient is the configured operator address; the transport fills
/// in the from/to envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMail {
    pub subject: String,
    pub html_body: String,
    /// Address the operator can reply to (the contact-form sender).
    pub reply_to: Option<String>,
}

/// Trait for sending operator mail.
///
/// Callers treat delivery as best-effort: a placement must never fail
/// because the notification could not be sent.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Delivers a mail to the operator address.
    async fn send(&self, mail: OutboundMail) -> Result<(), MailError>;
}

#[derive(Debug, Default)]
struct InMemoryMailerState {
    sent: Vec<OutboundMail>,
    fail_on_send: bool,
}

/// In-memory mailer for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMailer {
    state: Arc<RwLock<InMemoryMailerState>>,
}

impl InMemoryMailer {
    /// Creates a new in-memory mailer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the mailer to fail on subsequent send calls.
    pub fn set_fail_on_send(&self, fail: bool) {
        self.state.write().unwrap().fail_on_send = fail;
    }

    /// Returns the number of mails sent.
    pub fn sent_count(&self) -> usize {
        self.state.read().unwrap().sent.len()
    }

    /// Returns a copy of every mail sent so far.
    pub fn sent(&self) -> Vec<OutboundMail> {
        self.state.read().unwrap().sent.clone()
    }
}

#[async_trait]
impl Mailer for InMemoryMailer {
    async fn send(&self, mail: OutboundMail) -> Result<(), MailError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_send {
            return Err(MailError::Transport("simulated send failure".to_string()));
        }
        state.sent.push(mail);
        Ok(())
    }
}
