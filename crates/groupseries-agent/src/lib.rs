//! Group Series endpoint driver
//!
//! Sessions, statistics collection, call control and controllable
//! properties for Polycom Group Series room systems, built on the
//! line-oriented API from `groupseries-cli-protocol`.
//!
//! # Layers
//!
//! - [`Transport`]: send one command, get its complete response.
//!   [`LineTransport`] frames responses over any blocking stream;
//!   [`ScriptedTransport`] answers from canned output.
//! - [`Session`]: logging, metrics and optional-query probing.
//! - [`assemble`]: pure conversion of `netstats`/`advnetstats` output into
//!   [`EndpointStatistics`].
//! - [`GroupSeries`]: the device facade tying it all together.
//!
//! # Example
//!
//! ```rust,ignore
//! use groupseries_agent::{DialTarget, GroupSeries, LineTransport};
//!
//! let transport = LineTransport::new(stream, "10.0.0.5", framer);
//! let mut device = GroupSeries::new("10.0.0.5", transport);
//!
//! let stats = device.statistics()?;
//! if !stats.endpoint.in_call {
//!     device.dial(&DialTarget::new("room2@example.com"))?;
//! }
//! ```

mod assembler;
mod call;
mod device;
mod error;
mod poll;
mod properties;
mod registration;
mod scripted;
mod session;
mod stats;
mod transport;

pub use assembler::{assemble, RawTelemetry};
pub use call::*;
pub use device::*;
pub use error::*;
pub use poll::*;
pub use properties::*;
pub use registration::retrieve as retrieve_registration;
pub use scripted::*;
pub use session::*;
pub use stats::*;
pub use transport::*;
