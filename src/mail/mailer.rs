use std::time::Duration;

use anyhow::{Context, Result};
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::MailConfig;

const SPAM_FILTER_DISPLAY: &str = "Spam-Filter";

/// Outbound notification mail. The authenticated account is always the
/// envelope sender; the submitter only ever appears as display name and
/// Reply-To.
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    config: MailConfig,
}

impl Mailer {
    pub fn new(config: MailConfig) -> Result<Self> {
        let builder = if config.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        }
        .with_context(|| format!("failed to configure SMTP transport for {}", config.host))?;

        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(config.user.clone(), config.pass.clone()))
            .timeout(Some(Duration::from_secs(30)))
            .build();

        Ok(Self { transport, config })
    }

    /// Relays a (possibly previously held) submission to the notification
    /// recipient.
    pub async fn send_submission(
        &self,
        from_display: &str,
        reply_to: &str,
        subject: &str,
        text: &str,
    ) -> Result<()> {
        let sender = self.sender_mailbox(Some(from_display))?;
        let reply_to = Mailbox::new(
            Some(from_display.to_string()),
            reply_to
                .parse::<Address>()
                .with_context(|| format!("invalid reply-to address {reply_to}"))?,
        );
        let to = self
            .config
            .to_submission
            .parse::<Mailbox>()
            .context("invalid MAIL_TO_FORM_SUBMISSION address")?;

        let message = Message::builder()
            .from(sender)
            .reply_to(reply_to)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(text.to_string())
            .context("failed to build submission mail")?;

        self.transport
            .send(message)
            .await
            .context("failed to relay submission mail")?;
        tracing::info!(target: "mail", subject = %subject, "submission relayed");
        Ok(())
    }

    /// Sends the held-for-review report to the spam recipient.
    pub async fn send_spam_report(&self, subject: &str, text: &str) -> Result<()> {
        let to = self
            .config
            .to_spam
            .parse::<Mailbox>()
            .context("invalid MAIL_TO_FORM_SPAM address")?;

        let message = Message::builder()
            .from(self.sender_mailbox(Some(SPAM_FILTER_DISPLAY))?)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(text.to_string())
            .context("failed to build spam report mail")?;

        self.transport
            .send(message)
            .await
            .context("failed to send spam report mail")?;
        tracing::info!(target: "mail", subject = %subject, "spam report sent");
        Ok(())
    }

    fn sender_mailbox(&self, display: Option<&str>) -> Result<Mailbox> {
        let address = self
            .config
            .user
            .parse::<Address>()
            .context("invalid MAIL_USER address")?;
        Ok(Mailbox::new(display.map(str::to_string), address))
    }
}
