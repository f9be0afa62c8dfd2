//! End-to-end tests over a loopback TCP socket
//!
//! A thread plays the endpoint: it checks the password, prints the login
//! banner and answers each command line from a table. Commands missing from
//! the table get the firmware's unknown-command error; commands mapped to
//! `None` are swallowed so the client times out.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

use groupseries_agent::AgentError;
use groupseries_runner::{connect, execute, Commands, DeviceConfig, RunnerError};

const BANNER: &str = "Hi, my name is : Room 101\r\r\nModel: GROUP500\r\r\nSNMP Enabled: True\r\r\n";
const UNKNOWN: &str = "error: command not found\r\r\n";

type Script = Vec<(&'static str, Option<&'static str>)>;

fn spawn_endpoint(password: &'static str, script: Script) -> (u16, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = thread::spawn(move || {
        let table: HashMap<&str, Option<&str>> = script.into_iter().collect();
        let (stream, _) = listener.accept().unwrap();
        let mut writer = stream.try_clone().unwrap();
        let mut reader = BufReader::new(stream);
        let mut received = Vec::new();

        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        if line.trim_end() != password {
            writer.write_all(b"\r\nInvalid password\r\npassword:").unwrap();
            return received;
        }
        writer.write_all(BANNER.as_bytes()).unwrap();

        loop {
            line.clear();
            match reader.read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let command = line.trim_end().to_string();
            let reply = match table.get(command.as_str()) {
                Some(Some(text)) => format!("{}\r\r\n{}", command, text),
                Some(None) => {
                    received.push(command);
                    continue;
                }
                None => format!("{}\r\r\n{}", command, UNKNOWN),
            };
            received.push(command);
            if writer.write_all(reply.as_bytes()).is_err() {
                break;
            }
        }
        received
    });
    (port, handle)
}

fn config(port: u16, password: &str) -> DeviceConfig {
    let mut config = DeviceConfig::new("127.0.0.1");
    config.port = port;
    config.password = Some(password.to_string());
    config.read_timeout_ms = 500;
    config
}

#[test]
fn test_idle_stats_over_tcp() {
    let (port, endpoint) = spawn_endpoint(
        "secret",
        vec![
            ("status", Some("gatekeeper offline\r\r\nsipserver online\r\r\nstatus end\r\r\n")),
            ("callinfo all", Some("system is not in a call\r\r\n")),
            ("systemsetting get sipregistrarserver", Some("systemsetting sipregistrarserver sip.example.com\r\r\n")),
            ("mute near get", Some("mute near off\r\r\n")),
            ("volume get", Some("volume 30\r\r\n")),
        ],
    );

    let mut device = connect(&config(port, "secret")).unwrap();
    let report = execute(&mut device, &Commands::Stats).unwrap();
    drop(device);

    let result = &report.result;
    assert_eq!(report.operation, "stats");
    assert_eq!(result["endpoint"]["in_call"], false);
    let registration = &result["endpoint"]["registration_status"];
    assert_eq!(registration["sip_registrar"], "sip.example.com");
    assert_eq!(registration["sip_registered"], true);
    assert_eq!(registration["h323_registered"], false);
    assert_eq!(result["extended"]["statistics"]["Audio#Volume"], "30");
    assert_eq!(result["extended"]["statistics"]["Audio#Mute"], "0");

    let received = endpoint.join().unwrap();
    assert_eq!(received.iter().filter(|c| *c == "status").count(), 1);
    assert!(received.contains(&"gatekeeperip get".to_string()));
}

#[test]
fn test_raw_send_over_tcp() {
    let (port, endpoint) = spawn_endpoint(
        "secret",
        vec![("camera near getposition", Some("camera near getposition 10 20 30\r\r\n"))],
    );

    let mut device = connect(&config(port, "secret")).unwrap();
    let command = Commands::Send {
        command: vec!["camera".into(), "near".into(), "getposition".into()],
    };
    let report = execute(&mut device, &command).unwrap();
    drop(device);

    assert!(report.result["response"].as_str().unwrap().contains("10 20 30"));
    assert_eq!(endpoint.join().unwrap(), vec!["camera near getposition".to_string()]);
}

#[test]
fn test_wrong_password() {
    let (port, endpoint) = spawn_endpoint("secret", Vec::new());

    let err = connect(&config(port, "guess")).err().unwrap();
    assert!(matches!(
        err,
        RunnerError::Agent(AgentError::AuthenticationFailed { .. })
    ));
    endpoint.join().unwrap();
}

#[test]
fn test_silent_endpoint_times_out() {
    let (port, endpoint) = spawn_endpoint("secret", vec![("advnetstats", None)]);

    let mut device = connect(&config(port, "secret")).unwrap();
    let command = Commands::Send {
        command: vec!["advnetstats".into()],
    };
    let err = execute(&mut device, &command).unwrap_err();
    drop(device);

    assert!(matches!(err, RunnerError::Agent(AgentError::Timeout { .. })));
    endpoint.join().unwrap();
}

#[test]
fn test_unknown_command_fails() {
    let (port, endpoint) = spawn_endpoint("secret", Vec::new());

    let mut device = connect(&config(port, "secret")).unwrap();
    let err = execute(&mut device, &Commands::Hangup { call_id: Some("2".into()) }).unwrap_err();
    drop(device);

    match err {
        RunnerError::Agent(e) => assert!(e.is_command_failure()),
        other => panic!("unexpected error: {}", other),
    }
    endpoint.join().unwrap();
}
