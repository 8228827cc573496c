//! Simulated emergency alert
//!
//! Nothing is transmitted. The alert is a formatted log for display that shows
//! what a real SMS integration would send to the guardian.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Fixed demo location until real geolocation exists
pub const PLACEHOLDER_LOCATION: &str = "22.7196° N, 75.8577° E";

/// Sender name shown in the alert log
pub const ALERT_SENDER: &str = "Third Eye App";

/// What raised the alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertTrigger {
    /// The manual alert control
    Manual,
    /// A spoken "help" or "sos"
    Voice,
}

/// Display-only record of a simulated alert
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertLog {
    pub to: String,
    pub from: &'static str,
    pub message: String,
    pub location: &'static str,
    pub status: &'static str,
    pub trigger: AlertTrigger,
    pub sent_at: DateTime<Utc>,
}

/// Build the alert log for a guardian contact
#[must_use]
pub fn simulate_alert(guardian_contact: &str, trigger: AlertTrigger) -> AlertLog {
    AlertLog {
        to: guardian_contact.to_string(),
        from: ALERT_SENDER,
        message: format!(
            "URGENT! {guardian_contact}, the user has triggered SOS. \
             GPS Location: {PLACEHOLDER_LOCATION}. Snapshot uploaded to Cloud."
        ),
        location: PLACEHOLDER_LOCATION,
        status: "200 OK (Delivered)",
        trigger,
        sent_at: Utc::now(),
    }
}

impl fmt::Display for AlertLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[LOG] Sending SMS (simulated, nothing transmitted)...")?;
        writeln!(f, "-----------------------------------")?;
        writeln!(f, "TO:      {}", self.to)?;
        writeln!(f, "FROM:    {}", self.from)?;
        writeln!(f, "MESSAGE: \"{}\"", self.message)?;
        writeln!(f, "TIME:    {}", self.sent_at.to_rfc3339())?;
        write!(f, "STATUS:  {}", self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_addresses_guardian() {
        let log = simulate_alert("+1 555 0142", AlertTrigger::Manual);

        assert_eq!(log.to, "+1 555 0142");
        assert!(log.message.starts_with("URGENT! +1 555 0142"));
        assert!(log.message.contains(PLACEHOLDER_LOCATION));
        assert_eq!(log.trigger, AlertTrigger::Manual);
    }

    #[test]
    fn test_unvalidated_contact_passes_through() {
        let log = simulate_alert("call mum", AlertTrigger::Voice);
        assert_eq!(log.to, "call mum");
    }

    #[test]
    fn test_log_rendering() {
        let rendered = simulate_alert("+1 555 0142", AlertTrigger::Voice).to_string();

        assert!(rendered.contains("TO:      +1 555 0142"));
        assert!(rendered.contains("FROM:    Third Eye App"));
        assert!(rendered.contains("simulated"));
        assert!(rendered.ends_with("STATUS:  200 OK (Delivered)"));
    }
}
