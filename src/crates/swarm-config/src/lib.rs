//! Environment-driven configuration and external-capability probing.
//!
//! Everything here is read from `std::env` once at process startup; there is
//! no config file, no layering, no hot reload. [`SwarmConfig::from_env`] fails
//! only on a missing required variable; [`SwarmConfig::validate_at_startup`]
//! surfaces everything else (a weak secret, a malformed URL) as a warning
//! rather than refusing to start.

mod capability;
mod config;
mod error;

pub use capability::{CapabilityProbe, ProbeOutcome};
pub use config::SwarmConfig;
pub use error::ConfigError;
