//! Run notification by e-mail.

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::info;

use crate::error::ReportError;
use crate::export::ExportSet;

pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 465;

/// Delivers the run summary and its exports.
pub trait Notifier {
    fn notify(&self, subject: &str, body: &str, exports: &ExportSet) -> Result<(), ReportError>;
}

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

/// Sends over implicit TLS, authenticating as the sender.
#[derive(Debug, Clone)]
pub struct SmtpNotifier {
    settings: SmtpSettings,
    recipients: Vec<String>,
}

impl SmtpNotifier {
    pub fn new(settings: SmtpSettings, recipients: Vec<String>) -> Self {
        Self {
            settings,
            recipients,
        }
    }

    /// Assemble the message: plain-text body plus one CSV per export.
    pub fn compose(
        &self,
        subject: &str,
        body: &str,
        exports: &ExportSet,
    ) -> Result<Message, ReportError> {
        let mut builder = Message::builder()
            .from(mailbox(&self.settings.user)?)
            .subject(subject);
        for recipient in &self.recipients {
            builder = builder.to(mailbox(recipient)?);
        }

        let csv = ContentType::parse("text/csv")?;
        let mut parts = MultiPart::mixed().singlepart(SinglePart::plain(body.to_string()));
        for file in &exports.files {
            parts = parts.singlepart(
                Attachment::new(file.kind.attachment_name()).body(file.content.clone(), csv.clone()),
            );
        }
        Ok(builder.multipart(parts)?)
    }
}

impl Notifier for SmtpNotifier {
    fn notify(&self, subject: &str, body: &str, exports: &ExportSet) -> Result<(), ReportError> {
        let message = self.compose(subject, body, exports)?;
        let transport = SmtpTransport::relay(&self.settings.host)?
            .port(self.settings.port)
            .credentials(Credentials::new(
                self.settings.user.clone(),
                self.settings.password.clone(),
            ))
            .build();
        transport.send(&message)?;
        info!(
            recipients = self.recipients.len(),
            attachments = exports.files.len(),
            %subject,
            "notification sent"
        );
        Ok(())
    }
}

fn mailbox(address: &str) -> Result<Mailbox, ReportError> {
    address.parse().map_err(|source| ReportError::Address {
        address: address.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use roster_model::AuditLog;

    use super::*;

    fn notifier(recipients: &[&str]) -> SmtpNotifier {
        SmtpNotifier::new(
            SmtpSettings {
                host: DEFAULT_SMTP_HOST.to_string(),
                port: DEFAULT_SMTP_PORT,
                user: "sync@school.org".to_string(),
                password: "secret".to_string(),
            },
            recipients.iter().map(ToString::to_string).collect(),
        )
    }

    #[test]
    fn message_carries_every_export() {
        let exports = ExportSet::build(&AuditLog::new(), &[]).unwrap();
        let message = notifier(&["office@school.org", "it@school.org"])
            .compose("Sync Output", "Executed successfully.", &exports)
            .unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: Sync Output"));
        assert!(raw.contains("sync_output.csv"));
        assert!(raw.contains("missing_classes.csv"));
        assert_eq!(message.envelope().to().len(), 2);
    }

    #[test]
    fn malformed_recipient_is_rejected() {
        let exports = ExportSet::default();
        let err = notifier(&["not an address"])
            .compose("Sync Output", "", &exports)
            .unwrap_err();
        assert!(matches!(err, ReportError::Address { ref address, .. } if address == "not an address"));
    }
}
