//! JSON reports printed by the runner.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::RunnerResult;

/// One command's result, stamped with where and when it ran.
#[derive(Debug, Clone, Serialize)]
pub struct Report<T> {
    pub timestamp: DateTime<Utc>,
    pub host: String,
    pub operation: &'static str,
    pub result: T,
}

impl<T: Serialize> Report<T> {
    pub fn new(host: impl Into<String>, operation: &'static str, result: T) -> Self {
        Report {
            timestamp: Utc::now(),
            host: host.into(),
            operation,
            result,
        }
    }

    pub fn to_json(&self, compact: bool) -> RunnerResult<String> {
        let text = if compact {
            serde_json::to_string(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_json() {
        let report = Report::new("10.0.0.5", "hangup", serde_json::json!({ "ok": true }));
        let json: serde_json::Value = serde_json::from_str(&report.to_json(true).unwrap()).unwrap();

        assert_eq!(json["host"], "10.0.0.5");
        assert_eq!(json["operation"], "hangup");
        assert_eq!(json["result"]["ok"], true);
        assert!(json["timestamp"].as_str().unwrap().contains('T'));
        assert!(!report.to_json(true).unwrap().contains('\n'));
    }
}
