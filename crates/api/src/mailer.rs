//! SMTP mailer backed by lettre.

use async_trait::async_trait;
use domain::{MailError, Mailer, OutboundMail};
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::Config;

/// Operator mailer over SMTP.
///
/// When no relay is configured the mailer runs in log-only mode: every
/// send succeeds and the subject is logged, which keeps development and
/// store-less runs working without a mail server.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpMailer {
    /// Builds the mailer from configuration.
    pub fn from_config(config: &Config) -> Result<Self, MailError> {
        let to: Mailbox = config
            .operator_email
            .parse()
            .map_err(|e| MailError::Transport(format!("invalid OPERATOR_EMAIL: {e}")))?;
        let from: Mailbox = config
            .mail_from
            .as_deref()
            .unwrap_or(&config.operator_email)
            .parse()
            .map_err(|e| MailError::Transport(format!("invalid MAIL_FROM: {e}")))?;

        let transport = match config.smtp_relay.as_deref() {
            Some(relay) => {
                let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(relay)
                    .map_err(|e| MailError::Transport(format!("invalid SMTP_RELAY: {e}")))?;
                if let (Some(username), Some(password)) =
                    (&config.smtp_username, &config.smtp_password)
                {
                    builder =
                        builder.credentials(Credentials::new(username.clone(), password.clone()));
                }
                Some(builder.build())
            }
            None => None,
        };

        Ok(Self {
            transport,
            from,
            to,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutboundMail) -> Result<(), MailError> {
        let Some(transport) = &self.transport else {
            tracing::info!(subject = %mail.subject, "no SMTP relay configured; mail logged only");
            return Ok(());
        };

        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(mail.subject.clone());
        if let Some(reply_to) = mail.reply_to.as_deref() {
            if let Ok(mailbox) = reply_to.parse::<Mailbox>() {
                builder = builder.reply_to(mailbox);
            }
        }
        let message = builder
            .header(ContentType::TEXT_HTML)
            .body(mail.html_body)
            .map_err(|e| MailError::Transport(e.to_string()))?;

        transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;
        tracing::info!(subject = %mail.subject, "mail sent");
        Ok(())
    }
}
