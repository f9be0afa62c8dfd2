//! Controllable properties through the device facade

use groupseries_agent::{
    binding, AgentError, ControlKind, ControllableProperty, GroupSeries, ScriptedTransport,
    BINDINGS,
};

const POSITION: &str = "camera near getposition\r\r\ncamera near getposition -1200 300 4500\r\r\n";

#[test]
fn test_every_binding_has_a_group() {
    for b in BINDINGS {
        let (group, name) = b.name.split_once('#').expect("Group#Name");
        assert!(!group.is_empty() && !name.is_empty(), "{}", b.name);
        assert_eq!(b.query.is_none(), b.kind() == ControlKind::Button, "{}", b.name);
    }
}

#[test]
fn test_camera_pan_and_tilt() {
    let transport = ScriptedTransport::new()
        .respond("camera near getposition", POSITION)
        .respond("camera near setposition 0 300 4500", "camera near setposition 0 300 4500\r\r\n")
        .respond("camera near setposition -1200 -100 4500", "camera near setposition -1200 -100 4500\r\r\n");
    let mut device = GroupSeries::new("10.0.0.5", transport);

    device.control_property("Camera#Pan", "0").unwrap();
    device.control_property("Camera#Tilt", "-100.8").unwrap();

    let sent = device.session().transport().sent();
    assert_eq!(
        sent,
        &[
            "camera near getposition",
            "camera near setposition 0 300 4500",
            "camera near getposition",
            "camera near setposition -1200 -100 4500",
        ]
    );
}

#[test]
fn test_batch_stops_at_first_failure() {
    let transport = ScriptedTransport::new()
        .respond("volume 30", "volume 30\r\r\n")
        .respond("camerainvert near on", "camerainvert near on\r\r\n");
    let mut device = GroupSeries::new("10.0.0.5", transport);

    let batch = vec![
        ControllableProperty::new("Audio#Volume", "30"),
        ControllableProperty::new("Audio#Treble", "5"),
        ControllableProperty::new("Camera#Invert", "1"),
        ControllableProperty::new("Video#Mute", "1"),
        ControllableProperty::new("Audio#Volume", "31"),
    ];
    let err = device.control_properties(&batch).unwrap_err();

    // The unknown property is skipped; videomute is not scripted and fails.
    assert!(err.is_command_failure());
    let transport = device.session().transport();
    assert_eq!(transport.count("camerainvert near on"), 1);
    assert_eq!(transport.count("volume 31"), 0);
}

#[test]
fn test_empty_batch() {
    let mut device = GroupSeries::new("10.0.0.5", ScriptedTransport::new());
    assert!(matches!(
        device.control_properties(&[]),
        Err(AgentError::EmptyPropertyBatch)
    ));
}

#[test]
fn test_invalid_slider_sends_nothing() {
    let mut device = GroupSeries::new("10.0.0.5", ScriptedTransport::new());
    let err = device.control_property("Camera#Zoom", "").unwrap_err();
    assert!(matches!(err, AgentError::InvalidPropertyValue { ref property, .. } if property == "Camera#Zoom"));
    assert!(device.session().transport().sent().is_empty());
}

#[test]
fn test_tracking_controls() {
    let transport = ScriptedTransport::new()
        .respond("cameratracking near tracking on", "cameratracking near tracking on\r\r\n")
        .respond("cameratracking near framing wide", "cameratracking near framing wide\r\r\n")
        .respond("cameratracking near wake", "cameratracking near wake\r\r\n");
    let mut device = GroupSeries::new("10.0.0.5", transport);

    device.control_property("CameraTracking#Tracking", "1").unwrap();
    device.control_property("CameraTracking#Framing", "wide").unwrap();
    device.control_property("CameraTracking#Wake", "1").unwrap();

    assert_eq!(binding("CameraTracking#Framing").unwrap().kind(), ControlKind::Dropdown);
    assert_eq!(device.session().transport().sent().len(), 3);
}
