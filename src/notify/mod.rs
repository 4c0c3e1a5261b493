// src/notify/mod.rs
pub mod email;
pub mod log;

pub use email::EmailNotifier;
pub use log::LogNotifier;

use anyhow::Result;

use crate::store::Match;

pub const SUBJECT: &str = "Neue Ausschreibungen verfügbar!!";

/// Delivers one summary of new matches per run. Best-effort: the run logs
/// a failure and carries on.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, matches: &[Match]) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Composed notification text (subject, plain-text body).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composed {
    pub subject: String,
    pub body: String,
}

pub fn compose(matches: &[Match]) -> Composed {
    let mut body = String::from("Die folgenden neuen Übereinstimmungen wurden gefunden:\n\n");
    for m in matches {
        body.push_str(&format!("Title: {}\nDate: {}\n\n", m.title, m.date));
    }
    Composed {
        subject: SUBJECT.to_string(),
        body,
    }
}

/// Pick the email channel when SMTP credentials are present, otherwise log only.
pub fn from_env() -> Box<dyn Notifier> {
    match EmailNotifier::from_env() {
        Ok(n) => Box::new(n),
        Err(e) => {
            tracing::warn!("email disabled: {e:#}");
            Box::new(LogNotifier)
        }
    }
}
