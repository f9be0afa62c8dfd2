//! Response framing by terminal pattern.
//!
//! The device never says how long a response is. A response is complete when
//! the accumulated text matches one of a fixed list of patterns, and the list
//! that matched says whether the command succeeded or failed. Two pattern
//! families exist: one for steady-state commands and one for the login
//! handshake.
//!
//! A pattern without `*` matches when the response ends with it. A pattern
//! with `*` is split on the wildcard: the last segment must end the response
//! and every other segment must occur somewhere in it. Segment order is not
//! checked, so `"a*b*\r\r\n"` also matches `"b a\r\r\n"`.

use std::fmt;
use std::sync::Arc;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

/// Wildcard character inside a pattern.
pub const WILDCARD: char = '*';

/// Default success terminators for steady-state commands, in match order.
pub const DEFAULT_COMMAND_SUCCESS: &[&str] = &[
    "cs: call[2] inactive\r\r\n",
    "mute near*\r\r\n",
    "ccaps:*\r\r\n",
    "callinfo end\r\r\n",
    "Hz\r\r\n",
    "rcp:*\r\r\n",
    "system is not in a call\r\r\n",
    "dialing manual\r\r\n",
    "hanging up all\r\r\n",
    "mute near on\r\r\n",
    "mute near off\r\r\n",
    "systemsetting sipregistrarserver *\r\r\n",
    "gatekeeperip *\r\r\n",
    "status end\r\r\n",
    "hanging up video\r\r\n",
    "connection * is not active\r\r\n",
    "volume *\r\r\n",
    "videomute near *\r\r\n",
    "camerainvert near *\r\r\n",
    "cameratracking near *\r\r\n",
    "camera near *\r\r\n",
    "only supported *\r\r\n",
    "SNMP Enabled:*\r\r\n",
];

/// Default failure terminators for steady-state commands, in match order.
pub const DEFAULT_COMMAND_ERROR: &[&str] = &[
    "error:command not found\r\r\n",
    "error: command not found\r\r\n",
    "error: command needs more parameters to execute successfully\r\r\n",
];

/// Default terminators that end a successful login.
pub const DEFAULT_LOGIN_SUCCESS: &[&str] = &["SNMP Enabled:*\r\r\n"];

/// Default terminators that signal a rejected login.
pub const DEFAULT_LOGIN_ERROR: &[&str] = &["password:"];

/// Returns true when `response` satisfies `pattern`.
pub fn matches(response: &str, pattern: &str) -> bool {
    match pattern.rsplit_once(WILDCARD) {
        None => response.ends_with(pattern),
        Some((head, tail)) => {
            if response.is_empty() {
                return false;
            }
            response.ends_with(tail)
                && head
                    .split(WILDCARD)
                    .all(|segment| response.contains(segment))
        }
    }
}

/// What a matching pattern says about the command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Success,
    Error,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Success => f.write_str("success"),
            Verdict::Error => f.write_str("error"),
        }
    }
}

/// Session phase a pattern applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Steady-state command/response exchange.
    Command,
    /// Text received right after connecting, before the first command.
    Handshake,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Command => "command",
            Phase::Handshake => "handshake",
        }
    }
}

/// A single entry of the framing vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternEntry {
    text: String,
    verdict: Verdict,
    phase: Phase,
}

impl PatternEntry {
    /// Build an entry, rejecting empty patterns (they would match everything).
    pub fn new(text: impl Into<String>, verdict: Verdict, phase: Phase) -> CliResult<Self> {
        let text = text.into();
        if text.is_empty() {
            return Err(CliError::InvalidPattern {
                phase: phase.as_str(),
                reason: format!("empty {} pattern", verdict),
            });
        }
        Ok(PatternEntry {
            text,
            verdict,
            phase,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_wildcard(&self) -> bool {
        self.text.contains(WILDCARD)
    }

    pub fn matches(&self, response: &str) -> bool {
        matches(response, &self.text)
    }
}

/// Result of checking an accumulated response against a pattern set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Keep reading.
    Incomplete,
    /// Complete, and the command succeeded.
    Success,
    /// Complete, and the device reported a failure.
    Error {
        /// The error pattern that matched.
        pattern: String,
    },
}

impl FrameOutcome {
    pub fn is_complete(&self) -> bool {
        !matches!(self, FrameOutcome::Incomplete)
    }
}

/// Ordered error and success patterns for one phase.
///
/// Error patterns are always tried first; within a list the first match wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternSet {
    phase: Phase,
    errors: Vec<PatternEntry>,
    successes: Vec<PatternEntry>,
}

impl PatternSet {
    /// Compile a pattern set from raw strings.
    pub fn build<E, S>(phase: Phase, errors: E, successes: S) -> CliResult<Self>
    where
        E: IntoIterator,
        E::Item: Into<String>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        let errors = errors
            .into_iter()
            .map(|text| PatternEntry::new(text, Verdict::Error, phase))
            .collect::<CliResult<Vec<_>>>()?;
        let successes = successes
            .into_iter()
            .map(|text| PatternEntry::new(text, Verdict::Success, phase))
            .collect::<CliResult<Vec<_>>>()?;
        if successes.is_empty() {
            return Err(CliError::InvalidPattern {
                phase: phase.as_str(),
                reason: "no success patterns".to_string(),
            });
        }
        Ok(PatternSet {
            phase,
            errors,
            successes,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Error patterns first, then success patterns, in match order.
    pub fn entries(&self) -> impl Iterator<Item = &PatternEntry> {
        self.errors.iter().chain(self.successes.iter())
    }

    /// Decide whether `response` is complete.
    pub fn evaluate(&self, response: &str) -> FrameOutcome {
        match self.entries().find(|entry| entry.matches(response)) {
            None => FrameOutcome::Incomplete,
            Some(entry) => match entry.verdict {
                Verdict::Success => FrameOutcome::Success,
                Verdict::Error => FrameOutcome::Error {
                    pattern: entry.text.clone(),
                },
            },
        }
    }
}

/// The framing vocabulary as configuration.
///
/// Defaults reproduce the device's documented grammar; any list can be
/// replaced from a config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    pub command_success: Vec<String>,
    pub command_error: Vec<String>,
    pub login_success: Vec<String>,
    pub login_error: Vec<String>,
}

fn owned(patterns: &[&str]) -> Vec<String> {
    patterns.iter().map(|p| p.to_string()).collect()
}

impl Default for Vocabulary {
    fn default() -> Self {
        Vocabulary {
            command_success: owned(DEFAULT_COMMAND_SUCCESS),
            command_error: owned(DEFAULT_COMMAND_ERROR),
            login_success: owned(DEFAULT_LOGIN_SUCCESS),
            login_error: owned(DEFAULT_LOGIN_ERROR),
        }
    }
}

impl Vocabulary {
    pub fn response_framer(&self) -> CliResult<ResponseFramer> {
        let set = PatternSet::build(
            Phase::Command,
            self.command_error.iter().cloned(),
            self.command_success.iter().cloned(),
        )?;
        Ok(ResponseFramer {
            patterns: Arc::new(set),
        })
    }

    pub fn handshake_framer(&self) -> CliResult<HandshakeFramer> {
        let set = PatternSet::build(
            Phase::Handshake,
            self.login_error.iter().cloned(),
            self.login_success.iter().cloned(),
        )?;
        Ok(HandshakeFramer {
            patterns: Arc::new(set),
        })
    }
}

/// Decides when a steady-state command's response is complete.
#[derive(Debug, Clone)]
pub struct ResponseFramer {
    patterns: Arc<PatternSet>,
}

impl ResponseFramer {
    pub fn new(patterns: Arc<PatternSet>) -> Self {
        ResponseFramer { patterns }
    }

    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    /// Check the response accumulated so far for `command`.
    pub fn is_done(&self, command: &str, response: &str) -> FrameOutcome {
        let outcome = self.patterns.evaluate(response);
        if outcome.is_complete() {
            trace!("response to '{}' complete: {:?}", command, outcome);
        }
        outcome
    }
}

/// Decides when the login handshake is complete.
#[derive(Debug, Clone)]
pub struct HandshakeFramer {
    patterns: Arc<PatternSet>,
}

impl HandshakeFramer {
    pub fn new(patterns: Arc<PatternSet>) -> Self {
        HandshakeFramer { patterns }
    }

    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    /// Check the text received since connecting.
    pub fn is_done(&self, response: &str) -> FrameOutcome {
        let outcome = self.patterns.evaluate(response);
        if outcome.is_complete() {
            trace!("handshake complete: {:?}", outcome);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn framer() -> ResponseFramer {
        Vocabulary::default().response_framer().unwrap()
    }

    #[test]
    fn test_plain_pattern_is_suffix_match() {
        assert!(matches("callinfo begin\r\r\ncallinfo end\r\r\n", "callinfo end\r\r\n"));
        assert!(!matches("callinfo end\r\r\nmore", "callinfo end\r\r\n"));
        assert!(matches("status end", "status end"));
        assert!(!matches("status en", "status end"));
    }

    #[test]
    fn test_wildcard_head_and_tail() {
        assert!(matches("xx A yy B", "A*B"));
        assert!(!matches("xx A yy B!", "A*B"));
        assert!(!matches("xx yy B", "A*B"));
    }

    #[test]
    fn test_wildcard_segment_order_is_not_checked() {
        assert!(matches("connection 2 is not active\r\r\n", "connection * is not active\r\r\n"));
        assert!(matches("b a\r\r\n", "a*b*\r\r\n"));
    }

    #[test]
    fn test_lone_wildcard_needs_some_text() {
        assert!(matches("anything", "*"));
        assert!(!matches("", "*"));
        assert!(!matches("", "**"));
    }

    #[test]
    fn test_trailing_wildcard_only_needs_head() {
        assert!(matches("rcp: H.264 more", "rcp:*"));
        assert!(!matches("nothing", "rcp:*"));
    }

    #[test]
    fn test_incomplete_responses() {
        let framer = framer();
        assert_eq!(framer.is_done("callinfo all", "System is not in a c"), FrameOutcome::Incomplete);
        assert_eq!(framer.is_done("mute near get", "mute near"), FrameOutcome::Incomplete);
        assert_eq!(framer.is_done("advnetstats", "ccaps:*\r"), FrameOutcome::Incomplete);
        assert_eq!(framer.is_done("netstats", "rcp:*\r"), FrameOutcome::Incomplete);
    }

    #[test]
    fn test_complete_responses() {
        let framer = framer();
        assert_eq!(
            framer.is_done("callinfo all", "system is not in a call\r\r\n"),
            FrameOutcome::Success
        );
        assert_eq!(framer.is_done("mute near get", "mute near*\r\r\n"), FrameOutcome::Success);
        assert_eq!(framer.is_done("advnetstats", "ccaps:*\r\r\n"), FrameOutcome::Success);
        assert_eq!(framer.is_done("netstats", "rcp:*\r\r\n"), FrameOutcome::Success);
    }

    #[test]
    fn test_error_patterns_take_priority() {
        let framer = framer();
        let outcome = framer.is_done("bogus", "bogus\r\nerror: command not found\r\r\n");
        assert_eq!(
            outcome,
            FrameOutcome::Error {
                pattern: "error: command not found\r\r\n".to_string()
            }
        );
    }

    #[test]
    fn test_handshake_framer() {
        let framer = Vocabulary::default().handshake_framer().unwrap();
        assert_eq!(framer.is_done("Password:"), FrameOutcome::Incomplete);
        assert_eq!(
            framer.is_done("Model: GROUP500\r\r\nSNMP Enabled: True\r\r\n"),
            FrameOutcome::Success
        );
        assert!(matches!(
            framer.is_done("Invalid login\r\nEnter password:"),
            FrameOutcome::Error { .. }
        ));
    }

    #[test]
    fn test_empty_pattern_is_rejected() {
        let err = PatternSet::build(Phase::Command, Vec::<String>::new(), vec![""]).unwrap_err();
        assert!(matches!(err, CliError::InvalidPattern { phase: "command", .. }));
    }

    #[test]
    fn test_missing_success_patterns_is_rejected() {
        let vocabulary = Vocabulary {
            login_success: Vec::new(),
            ..Vocabulary::default()
        };
        assert!(vocabulary.handshake_framer().is_err());
        assert!(vocabulary.response_framer().is_ok());
    }

    #[test]
    fn test_entries_are_errors_first() {
        let set = PatternSet::build(Phase::Command, vec!["bad"], vec!["good"]).unwrap();
        let verdicts: Vec<Verdict> = set.entries().map(|e| e.verdict()).collect();
        assert_eq!(verdicts, vec![Verdict::Error, Verdict::Success]);
        assert!(set.entries().all(|e| e.phase() == Phase::Command));
    }

    #[test]
    fn test_vocabulary_from_yaml_overrides_one_list() {
        let yaml = "command_error:\n  - \"error: nope\\r\\r\\n\"\n";
        let vocabulary: Vocabulary = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(vocabulary.command_error, vec!["error: nope\r\r\n".to_string()]);
        assert_eq!(vocabulary.command_success.len(), DEFAULT_COMMAND_SUCCESS.len());
        assert_eq!(vocabulary.login_error, vec!["password:".to_string()]);
    }
}
