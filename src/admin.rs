//! Admin page gate. A shared-secret comparison that decides whether the admin
//! UI is shown; the secret ships with the client, so this is not a security
//! boundary.

use tracing::warn;

pub struct AdminGate {
    secret: String,
}

impl AdminGate {
    pub fn new(secret: impl Into<String>) -> Self {
        AdminGate {
            secret: secret.into(),
        }
    }

    /// Whether `attempt` unlocks the admin page. An empty secret never does.
    pub fn unlock(&self, attempt: &str) -> bool {
        let ok = !self.secret.is_empty() && attempt == self.secret;
        if !ok {
            warn!("admin unlock rejected");
        }
        ok
    }
}
