//! Timestamp helpers for TASKBOARD.
//!
//! Every stored timestamp is milliseconds since the Unix epoch (UTC).

use chrono::Utc;

/// Current time in milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_millis_is_recent() {
        let before = Utc::now().timestamp_millis();
        let now = now_millis();
        assert!(now >= before);
        assert!(now - before < 5_000);
    }
}
