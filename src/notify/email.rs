// src/notify/email.rs
use anyhow::{Context, Result};
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::{compose, Notifier};
use crate::store::Match;

const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// First non-empty of `key` and its older alias.
fn required_env(key: &str, legacy: Option<&str>) -> Result<String> {
    non_empty_env(key)
        .or_else(|| legacy.and_then(non_empty_env))
        .with_context(|| match legacy {
            Some(old) => format!("{key} (or {old}) missing"),
            None => format!("{key} missing"),
        })
}

pub struct EmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailNotifier {
    /// Reads SMTP_HOST (optional), SMTP_USER, SMTP_PASS, NOTIFY_EMAIL_FROM
    /// (defaults to SMTP_USER) and NOTIFY_EMAIL_TO. EMAIL_ADDRESS and
    /// EMAIL_PASSWORD are accepted in place of SMTP_USER and SMTP_PASS.
    pub fn from_env() -> Result<Self> {
        let host = std::env::var("SMTP_HOST").unwrap_or_else(|_| DEFAULT_SMTP_HOST.to_string());
        let user = required_env("SMTP_USER", Some("EMAIL_ADDRESS"))?;
        let pass = required_env("SMTP_PASS", Some("EMAIL_PASSWORD"))?;
        let from_addr = std::env::var("NOTIFY_EMAIL_FROM").unwrap_or_else(|_| user.clone());
        let to_addr = required_env("NOTIFY_EMAIL_TO", None)?;

        let from: Mailbox = from_addr.parse().context("invalid NOTIFY_EMAIL_FROM")?;
        let to: Mailbox = to_addr.parse().context("invalid NOTIFY_EMAIL_TO")?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&host)
            .context("invalid SMTP_HOST")?
            .credentials(Credentials::new(user, pass))
            .build();

        tracing::debug!(%host, "email notifier configured");
        Ok(Self { mailer, from, to })
    }

    fn build_message(&self, matches: &[Match]) -> Result<Message> {
        let msg = compose(matches);
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(msg.subject)
            .header(header::ContentType::TEXT_PLAIN)
            .body(msg.body)
            .context("build email")
    }
}

#[async_trait::async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, matches: &[Match]) -> Result<()> {
        let msg = self.build_message(matches)?;
        self.mailer.send(msg).await.context("send email")?;
        tracing::info!(count = matches.len(), "email sent");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "email"
    }
}
