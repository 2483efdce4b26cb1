//! Delivery of verification links.

use std::fmt;

/// Sends the verification link of a freshly registered login.
///
/// Delivery is fire-and-forget: registration succeeds whatever happens here,
/// so implementations report their own failures.
pub trait Mailer: fmt::Debug + Send + Sync {
    fn send_verification(&self, email: &str, link: &str);
}

/// Writes the link to the log instead of sending mail.
#[derive(Clone, Debug, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send_verification(&self, email: &str, link: &str) {
        tracing::info!(%email, %link, "verification link issued");
    }
}
