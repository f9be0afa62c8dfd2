//! Controllable properties.
//!
//! Each property name (`Group#Name`) maps to a binding: what kind of control
//! it is, how to read its current value, and which command applies a new
//! one. Values arrive as strings from the caller and are normalized per
//! control kind before a command is built.

use std::collections::HashMap;

use groupseries_cli_protocol::{
    last_word, parse_switch, to_float, to_int, CameraPosition, Command, TrackingSetting,
};
use groupseries_metrics::metric_defs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{AgentError, AgentResult};
use crate::session::{Probe, Session};
use crate::stats::ExtendedStatistics;
use crate::transport::Transport;

/// Control widget kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlKind {
    Switch,
    Slider,
    Dropdown,
    Button,
}

/// Camera axis adjusted by a slider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Pan,
    Tilt,
    Zoom,
}

impl Axis {
    fn get(&self, position: &CameraPosition) -> i32 {
        match self {
            Axis::Pan => position.pan,
            Axis::Tilt => position.tilt,
            Axis::Zoom => position.zoom,
        }
    }

    fn set(&self, position: &mut CameraPosition, value: i32) {
        match self {
            Axis::Pan => position.pan = value,
            Axis::Tilt => position.tilt = value,
            Axis::Zoom => position.zoom = value,
        }
    }
}

/// How a normalized value becomes a command.
#[derive(Debug, Clone, Copy)]
pub enum Action {
    Switch(fn(bool) -> Command),
    Level(fn(i32) -> Command),
    /// Read the camera position, replace one axis, write it back.
    CameraAxis(Axis),
    Choice(fn(String) -> Command),
    Trigger(fn() -> Command),
}

/// One controllable property.
#[derive(Debug, Clone, Copy)]
pub struct PropertyBinding {
    pub name: &'static str,
    /// Query for the current value; triggers have none.
    pub query: Option<fn() -> Command>,
    pub action: Action,
}

impl PropertyBinding {
    pub fn kind(&self) -> ControlKind {
        match self.action {
            Action::Switch(_) => ControlKind::Switch,
            Action::Level(_) | Action::CameraAxis(_) => ControlKind::Slider,
            Action::Choice(_) => ControlKind::Dropdown,
            Action::Trigger(_) => ControlKind::Button,
        }
    }

    /// Current value from a query response, in the form a caller sends:
    /// `1`/`0` for switches, integers for sliders, the raw word otherwise.
    pub fn current_value(&self, response: &str, query: &str) -> Option<String> {
        match self.action {
            Action::Switch(_) => last_word(response, query)
                .and_then(parse_switch)
                .map(|on| if on { "1" } else { "0" }.to_string()),
            Action::Level(_) => last_word(response, query)
                .and_then(to_int)
                .map(|v| v.to_string()),
            Action::CameraAxis(axis) => CameraPosition::parse(response)
                .ok()
                .map(|position| axis.get(&position).to_string()),
            Action::Choice(_) => last_word(response, query).map(str::to_string),
            Action::Trigger(_) => None,
        }
    }
}

fn tracking(setting: TrackingSetting, on: bool) -> Command {
    Command::CameraTracking {
        setting,
        value: Some(if on { "on" } else { "off" }.to_string()),
    }
}

fn tracking_choice(setting: TrackingSetting, value: String) -> Command {
    Command::CameraTracking {
        setting,
        value: Some(value),
    }
}

pub static BINDINGS: &[PropertyBinding] = &[
    PropertyBinding {
        name: "Audio#Volume",
        query: Some(|| Command::VolumeGet),
        action: Action::Level(|level| Command::VolumeSet { level }),
    },
    PropertyBinding {
        name: "Audio#Mute",
        query: Some(|| Command::MuteNearGet),
        action: Action::Switch(|muted| Command::MuteNear { muted }),
    },
    PropertyBinding {
        name: "Video#Mute",
        query: Some(|| Command::VideoMuteNearGet),
        action: Action::Switch(|muted| Command::VideoMuteNear { muted }),
    },
    PropertyBinding {
        name: "Camera#Invert",
        query: Some(|| Command::CameraInvertNearGet),
        action: Action::Switch(|inverted| Command::CameraInvertNear { inverted }),
    },
    PropertyBinding {
        name: "Camera#Pan",
        query: Some(|| Command::CameraGetPosition),
        action: Action::CameraAxis(Axis::Pan),
    },
    PropertyBinding {
        name: "Camera#Tilt",
        query: Some(|| Command::CameraGetPosition),
        action: Action::CameraAxis(Axis::Tilt),
    },
    PropertyBinding {
        name: "Camera#Zoom",
        query: Some(|| Command::CameraGetPosition),
        action: Action::CameraAxis(Axis::Zoom),
    },
    PropertyBinding {
        name: "CameraTracking#Tracking",
        query: Some(|| Command::CameraTrackingGet { setting: TrackingSetting::Tracking }),
        action: Action::Switch(|on| tracking(TrackingSetting::Tracking, on)),
    },
    PropertyBinding {
        name: "CameraTracking#PIP",
        query: Some(|| Command::CameraTrackingGet { setting: TrackingSetting::Pip }),
        action: Action::Switch(|on| tracking(TrackingSetting::Pip, on)),
    },
    PropertyBinding {
        name: "CameraTracking#Mode",
        query: Some(|| Command::CameraTrackingGet { setting: TrackingSetting::Mode }),
        action: Action::Choice(|v| tracking_choice(TrackingSetting::Mode, v)),
    },
    PropertyBinding {
        name: "CameraTracking#Framing",
        query: Some(|| Command::CameraTrackingGet { setting: TrackingSetting::Framing }),
        action: Action::Choice(|v| tracking_choice(TrackingSetting::Framing, v)),
    },
    PropertyBinding {
        name: "CameraTracking#Speed",
        query: Some(|| Command::CameraTrackingGet { setting: TrackingSetting::Speed }),
        action: Action::Choice(|v| tracking_choice(TrackingSetting::Speed, v)),
    },
    PropertyBinding {
        name: "CameraTracking#Participant",
        query: Some(|| Command::CameraTrackingGet { setting: TrackingSetting::Participant }),
        action: Action::Choice(|v| tracking_choice(TrackingSetting::Participant, v)),
    },
    PropertyBinding {
        name: "CameraTracking#Calibrate",
        query: None,
        action: Action::Trigger(|| Command::CameraTracking {
            setting: TrackingSetting::Calibrate,
            value: None,
        }),
    },
    PropertyBinding {
        name: "CameraTracking#Wake",
        query: None,
        action: Action::Trigger(|| Command::CameraTracking {
            setting: TrackingSetting::Wake,
            value: None,
        }),
    },
];

pub fn binding(name: &str) -> Option<&'static PropertyBinding> {
    BINDINGS.iter().find(|b| b.name == name)
}

/// A property change requested by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllableProperty {
    pub property: String,
    pub value: String,
}

impl ControllableProperty {
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        ControllableProperty {
            property: property.into(),
            value: value.into(),
        }
    }
}

fn invalid(property: &str, reason: impl Into<String>) -> AgentError {
    AgentError::InvalidPropertyValue {
        property: property.to_string(),
        reason: reason.into(),
    }
}

/// `1`/`0` and the usual on/off words.
pub fn normalize_switch(property: &str, value: &str) -> AgentResult<bool> {
    let value = value.trim();
    parse_switch(value)
        .or_else(|| to_float(value).map(|v| v != 0.0))
        .ok_or_else(|| invalid(property, format!("'{}' is not a switch value", value)))
}

/// Slider values arrive as floats and are truncated.
pub fn normalize_slider(property: &str, value: &str) -> AgentResult<i32> {
    let value = value.trim();
    if value.is_empty() {
        return Err(invalid(property, "slider value is empty"));
    }
    value
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v.trunc() as i32)
        .ok_or_else(|| invalid(property, format!("'{}' is not a number", value)))
}

fn normalize_choice(property: &str, value: &str) -> AgentResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(invalid(property, "no option selected"));
    }
    Ok(value.to_string())
}

/// Apply one property change.
///
/// Unknown property names are logged and skipped.
pub fn apply_property<T: Transport>(
    session: &mut Session<T>,
    property: &str,
    value: &str,
) -> AgentResult<()> {
    let Some(binding) = binding(property) else {
        warn!("Session[{}]: ignoring unknown property {}", session.host(), property);
        let labels = session.labels().with(&[("property", property.to_string())]);
        metrics::counter!(metric_defs::PROPERTIES_IGNORED.name, &labels).increment(1);
        return Ok(());
    };

    let command = match binding.action {
        Action::Switch(build) => build(normalize_switch(property, value)?),
        Action::Level(build) => build(normalize_slider(property, value)?),
        Action::Choice(build) => build(normalize_choice(property, value)?),
        Action::Trigger(build) => build(),
        Action::CameraAxis(axis) => {
            let target = normalize_slider(property, value)?;
            let response = session.execute(&Command::CameraGetPosition)?;
            let mut position = CameraPosition::parse(&response)?;
            axis.set(&mut position, target);
            Command::CameraSetPosition(position)
        }
    };

    info!("Session[{}]: {} -> {}", session.host(), property, command);
    session.execute(&command)?;
    let labels = session.labels().with(&[("property", property.to_string())]);
    metrics::counter!(metric_defs::PROPERTIES_APPLIED.name, &labels).increment(1);
    Ok(())
}

/// Apply a batch in order, stopping at the first failure.
pub fn apply_properties<T: Transport>(
    session: &mut Session<T>,
    properties: &[ControllableProperty],
) -> AgentResult<()> {
    if properties.is_empty() {
        return Err(AgentError::EmptyPropertyBatch);
    }
    for p in properties {
        apply_property(session, &p.property, &p.value)?;
    }
    Ok(())
}

/// Read every queryable property into `extended`.
///
/// Properties sharing a query (the camera axes) send it once.
pub fn read_properties<T: Transport>(session: &mut Session<T>, extended: &mut ExtendedStatistics) {
    let mut responses: HashMap<String, Probe<String>> = HashMap::new();
    for binding in BINDINGS {
        let Some(query) = binding.query else {
            continue;
        };
        let command = query();
        let line = command.to_command_string();
        let probe = responses
            .entry(line.clone())
            .or_insert_with(|| session.probe(&command));
        match probe {
            Probe::Ok(response) => match binding.current_value(response, &line) {
                Some(value) => extended.insert(binding.name, value),
                None => debug!("Session[{}]: no value for {} in {:?}", session.host(), binding.name, response),
            },
            Probe::Unsupported | Probe::Failed(_) => {}
        }
    }
}
