// src/notify/log.rs
use anyhow::Result;

use super::{compose, Notifier};
use crate::store::Match;

/// Fallback channel when no SMTP credentials are configured: writes the
/// summary to the log instead of sending it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, matches: &[Match]) -> Result<()> {
        let msg = compose(matches);
        tracing::warn!(
            count = matches.len(),
            subject = %msg.subject,
            "email disabled; notification logged only\n{}",
            msg.body
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
