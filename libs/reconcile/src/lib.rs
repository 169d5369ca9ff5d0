//! Reconciliation loop primitives.
//!
//! This library provides the timing plumbing shared by the framework's
//! periodic activities:
//!
//! - **Ticker**: run one unit of work, then wait for the next interval or
//!   for shutdown, whichever comes first.
//! - **Retry**: bounded attempts with a fixed delay that also yields to
//!   shutdown.
//! - **Fingerprint**: a stable hash of a JSON document, used to identify
//!   which descriptor was submitted.
//!
//! # Invariants
//!
//! - A raised shutdown signal is observed at the next wait point
//! - Retry never exceeds its attempt bound and never sleeps after the last attempt
//! - Fingerprints are independent of object key order

mod retry;
mod ticker;

pub use retry::{retry_fixed, RetryOutcome, RetryPolicy};
pub use ticker::{sleep_or_shutdown, wait_for_shutdown, PeriodicTask, Ticker};

use std::time::Duration;

use sha2::{Digest, Sha256};

/// Identifies a submitted descriptor in logs.
///
/// `sha256:` followed by the first 16 bytes of the digest, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn from_json(json: &serde_json::Value) -> Self {
        let digest = Sha256::digest(sorted(json).to_string().as_bytes());
        Self(format!("sha256:{}", hex::encode(&digest[..16])))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rebuild `value` with every object's keys in ascending order.
///
/// With serde_json's `preserve_order` feature enabled anywhere in the build,
/// objects serialize in insertion order.
fn sorted(value: &serde_json::Value) -> serde_json::Value {
    use serde_json::Value;

    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k.clone(), sorted(v))).collect())
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        scalar => scalar.clone(),
    }
}

/// Default interval between reconciliation and supervision ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(10);

/// Default attempt bound for task discovery.
pub const DEFAULT_DISCOVERY_ATTEMPTS: u32 = 300;

/// Default delay between discovery attempts.
pub const DEFAULT_DISCOVERY_DELAY: Duration = Duration::from_secs(1);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_ignores_key_order() {
        let json1 = serde_json::json!({"b": 2, "a": {"y": [1, 2], "x": "s"}});
        let json2 = serde_json::json!({"a": {"x": "s", "y": [1, 2]}, "b": 2});

        assert_eq!(Fingerprint::from_json(&json1), Fingerprint::from_json(&json2));
    }

    #[test]
    fn test_fingerprint_sees_value_changes() {
        let json1 = serde_json::json!({"instances": 2});
        let json2 = serde_json::json!({"instances": 3});

        assert_ne!(Fingerprint::from_json(&json1), Fingerprint::from_json(&json2));
    }

    #[test]
    fn test_fingerprint_format() {
        let fp = Fingerprint::from_json(&serde_json::json!({}));
        assert!(fp.as_str().starts_with("sha256:"));
        assert_eq!(fp.as_str().len(), "sha256:".len() + 32);
    }

    #[test]
    fn test_sorted_orders_nested_keys() {
        let json = serde_json::json!({"k\"ey": [{"z": 1, "a": "line\nbreak"}], "b": null});
        assert_eq!(
            sorted(&json).to_string(),
            r#"{"b":null,"k\"ey":[{"a":"line\nbreak","z":1}]}"#
        );
    }
}
