//! Opening an API session over TCP.

use std::net::{TcpStream, ToSocketAddrs};

use groupseries_agent::{GroupSeries, LineTransport};
use groupseries_metrics::{metric_defs, MetricLabels};
use tracing::{debug, info};

use crate::config::DeviceConfig;
use crate::error::{RunnerError, RunnerResult};

/// A connected, logged-in endpoint.
pub type TcpDevice = GroupSeries<LineTransport<TcpStream>>;

fn connect_error(config: &DeviceConfig, source: std::io::Error) -> RunnerError {
    RunnerError::Connect {
        host: format!("{}:{}", config.host, config.port),
        source,
    }
}

/// Connect, run the login handshake, and wrap the session.
pub fn connect(config: &DeviceConfig) -> RunnerResult<TcpDevice> {
    let addrs = (config.host.as_str(), config.port)
        .to_socket_addrs()
        .map_err(|e| connect_error(config, e))?;

    let mut last_error = None;
    let mut stream = None;
    for addr in addrs {
        debug!("connecting to {}", addr);
        match TcpStream::connect_timeout(&addr, config.connect_timeout()) {
            Ok(s) => {
                stream = Some(s);
                break;
            }
            Err(e) => last_error = Some(e),
        }
    }
    let stream = match (stream, last_error) {
        (Some(s), _) => s,
        (None, Some(e)) => return Err(connect_error(config, e)),
        (None, None) => {
            return Err(connect_error(
                config,
                std::io::Error::new(std::io::ErrorKind::NotFound, "no address resolved"),
            ))
        }
    };
    stream
        .set_read_timeout(Some(config.read_timeout()))
        .map_err(|e| connect_error(config, e))?;
    stream
        .set_write_timeout(Some(config.read_timeout()))
        .map_err(|e| connect_error(config, e))?;
    stream.set_nodelay(true).map_err(|e| connect_error(config, e))?;

    let framer = config.vocabulary.response_framer()?;
    let handshake = config.vocabulary.handshake_framer()?;
    let mut transport = LineTransport::new(stream, config.host.clone(), framer);
    let banner = match transport.handshake(&handshake, config.password.as_deref()) {
        Ok(banner) => banner,
        Err(e) => {
            let labels = MetricLabels::new(config.host.clone()).to_labels();
            metrics::counter!(metric_defs::SESSION_HANDSHAKE_FAILURES.name, &labels).increment(1);
            return Err(e.into());
        }
    };
    info!("connected to {}:{} ({} byte banner)", config.host, config.port, banner.len());

    Ok(GroupSeries::new(config.host.clone(), transport).with_config(config.agent.clone()))
}
