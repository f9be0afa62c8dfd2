//! Metrics for the Group Series driver.
//!
//! Every metric the driver records is declared here as a const [`Metric`]
//! so names, units and label keys live in one place. The crate re-exports
//! `metrics`; installing a recorder is left to the embedding application.
//!
//! # Example
//!
//! ```rust,ignore
//! use groupseries_metrics::{describe_metrics, metric_defs, MetricLabels};
//!
//! describe_metrics();
//!
//! let labels = MetricLabels::new("10.0.0.5");
//! metrics::counter!(
//!     metric_defs::SESSION_COMMANDS_SENT.name,
//!     &labels.with(&[("command", "callinfo".to_string())])
//! )
//! .increment(1);
//! ```

pub use metrics;

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};

/// The kind of metric (counter, gauge, or histogram).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// A monotonically increasing counter.
    Counter,
    /// A gauge that can go up and down.
    Gauge,
    /// A histogram for recording distributions.
    Histogram,
}

impl MetricKind {
    /// Returns the kind as a lowercase string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric declaration with its metadata.
///
/// ```rust
/// use groupseries_metrics::{Metric, MetricKind};
/// use metrics::Unit;
///
/// const POLLS: Metric = Metric::counter("groupseries.stats.polls")
///     .with_description("Statistics polls")
///     .with_unit(Unit::Count)
///     .with_labels(&["host"]);
///
/// assert_eq!(POLLS.name, "groupseries.stats.polls");
/// assert_eq!(POLLS.kind, MetricKind::Counter);
/// ```
#[derive(Debug, Clone)]
pub struct Metric {
    /// The metric name (e.g., "groupseries.session.commands_sent").
    pub name: &'static str,
    pub kind: MetricKind,
    /// Human-readable description of the metric.
    pub description: &'static str,
    pub unit: Option<Unit>,
    /// Expected label keys for this metric.
    pub labels: &'static [&'static str],
}

impl Metric {
    const fn new(name: &'static str, kind: MetricKind) -> Self {
        Self {
            name,
            kind,
            description: "",
            unit: None,
            labels: &[],
        }
    }

    /// Creates a new counter metric with the given name.
    pub const fn counter(name: &'static str) -> Self {
        Self::new(name, MetricKind::Counter)
    }

    /// Creates a new gauge metric with the given name.
    pub const fn gauge(name: &'static str) -> Self {
        Self::new(name, MetricKind::Gauge)
    }

    /// Creates a new histogram metric with the given name.
    pub const fn histogram(name: &'static str) -> Self {
        Self::new(name, MetricKind::Histogram)
    }

    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub const fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    pub const fn with_labels(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    /// Registers this metric's description with the installed recorder.
    pub fn describe(&self) {
        match (self.kind, self.unit) {
            (MetricKind::Counter, Some(unit)) => {
                describe_counter!(self.name, unit, self.description);
            }
            (MetricKind::Counter, None) => {
                describe_counter!(self.name, self.description);
            }
            (MetricKind::Gauge, Some(unit)) => {
                describe_gauge!(self.name, unit, self.description);
            }
            (MetricKind::Gauge, None) => {
                describe_gauge!(self.name, self.description);
            }
            (MetricKind::Histogram, Some(unit)) => {
                describe_histogram!(self.name, unit, self.description);
            }
            (MetricKind::Histogram, None) => {
                describe_histogram!(self.name, self.description);
            }
        }
    }
}

/// All metric definitions for the driver.
pub mod metric_defs {
    use super::{Metric, Unit};

    /// Label present on every metric.
    pub const HOST_LABELS: &[&str] = &["host"];

    /// Labels for per-command metrics.
    pub const COMMAND_LABELS: &[&str] = &["host", "command"];

    // ========================================================================
    // Session
    // ========================================================================

    /// Commands written to the endpoint.
    ///
    /// Labels: host, command (first word of the command line)
    pub const SESSION_COMMANDS_SENT: Metric = Metric::counter("groupseries.session.commands_sent")
        .with_description("Commands written to the endpoint")
        .with_unit(Unit::Count)
        .with_labels(COMMAND_LABELS);

    /// Commands whose response matched an error pattern or never completed.
    ///
    /// Labels: host, command
    pub const SESSION_COMMAND_FAILURES: Metric = Metric::counter("groupseries.session.command_failures")
        .with_description("Commands that failed or timed out")
        .with_unit(Unit::Count)
        .with_labels(COMMAND_LABELS);

    /// Size of each complete response.
    ///
    /// Labels: host, command
    pub const SESSION_RESPONSE_SIZE: Metric = Metric::histogram("groupseries.session.response_size_bytes")
        .with_description("Size of complete responses in bytes")
        .with_unit(Unit::Bytes)
        .with_labels(COMMAND_LABELS);

    /// Time between writing a command and framing its response.
    ///
    /// Labels: host, command
    pub const SESSION_RESPONSE_TIME: Metric = Metric::histogram("groupseries.session.response_time_ms")
        .with_description("Command round trip time in milliseconds")
        .with_unit(Unit::Milliseconds)
        .with_labels(COMMAND_LABELS);

    /// Logins rejected by the endpoint.
    pub const SESSION_HANDSHAKE_FAILURES: Metric = Metric::counter("groupseries.session.handshake_failures")
        .with_description("Logins rejected by the endpoint")
        .with_unit(Unit::Count)
        .with_labels(HOST_LABELS);

    /// Probes that the firmware did not support.
    ///
    /// Labels: host, command
    pub const PROBE_UNSUPPORTED: Metric = Metric::counter("groupseries.probe.unsupported")
        .with_description("Optional probes the firmware rejected")
        .with_unit(Unit::Count)
        .with_labels(COMMAND_LABELS);

    // ========================================================================
    // Statistics
    // ========================================================================

    /// Statistics polls performed.
    pub const STATS_POLLS: Metric = Metric::counter("groupseries.stats.polls")
        .with_description("Statistics polls performed")
        .with_unit(Unit::Count)
        .with_labels(HOST_LABELS);

    /// 1 while the endpoint reports an active call.
    pub const STATS_IN_CALL: Metric = Metric::gauge("groupseries.stats.in_call")
        .with_description("Whether the endpoint is in a call")
        .with_labels(HOST_LABELS);

    // ========================================================================
    // Call control
    // ========================================================================

    /// Status queries needed before a dial was confirmed or given up on.
    pub const DIAL_POLL_ATTEMPTS: Metric = Metric::histogram("groupseries.call.dial_poll_attempts")
        .with_description("Call status queries issued per dial")
        .with_unit(Unit::Count)
        .with_labels(HOST_LABELS);

    // ========================================================================
    // Controls
    // ========================================================================

    /// Controllable properties applied.
    ///
    /// Labels: host, property
    pub const PROPERTIES_APPLIED: Metric = Metric::counter("groupseries.control.applied")
        .with_description("Controllable properties applied")
        .with_unit(Unit::Count)
        .with_labels(&["host", "property"]);

    /// Property changes ignored because the name is unknown.
    ///
    /// Labels: host, property
    pub const PROPERTIES_IGNORED: Metric = Metric::counter("groupseries.control.ignored")
        .with_description("Property changes with no binding")
        .with_unit(Unit::Count)
        .with_labels(&["host", "property"]);

    /// Returns a slice of all defined metrics.
    pub const ALL: &[&Metric] = &[
        // Session
        &SESSION_COMMANDS_SENT,
        &SESSION_COMMAND_FAILURES,
        &SESSION_RESPONSE_SIZE,
        &SESSION_RESPONSE_TIME,
        &SESSION_HANDSHAKE_FAILURES,
        &PROBE_UNSUPPORTED,
        // Statistics
        &STATS_POLLS,
        &STATS_IN_CALL,
        // Call control
        &DIAL_POLL_ATTEMPTS,
        // Controls
        &PROPERTIES_APPLIED,
        &PROPERTIES_IGNORED,
    ];
}

/// Labels identifying one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricLabels {
    /// Endpoint host name or address.
    pub host: String,
}

impl MetricLabels {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    /// Converts the labels to the vector form the `metrics` macros accept.
    pub fn to_labels(&self) -> Vec<(&'static str, String)> {
        vec![("host", self.host.clone())]
    }

    /// Host labels plus `extra`.
    ///
    /// ```rust
    /// use groupseries_metrics::MetricLabels;
    ///
    /// let labels = MetricLabels::new("10.0.0.5");
    /// let extended = labels.with(&[("command", "netstats".to_string())]);
    ///
    /// assert!(extended.iter().any(|(k, v)| *k == "command" && v == "netstats"));
    /// ```
    pub fn with(&self, extra: &[(&'static str, String)]) -> Vec<(&'static str, String)> {
        let mut labels = self.to_labels();
        labels.extend_from_slice(extra);
        labels
    }
}

/// Describes all driver metrics. Call once after installing a recorder.
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}
