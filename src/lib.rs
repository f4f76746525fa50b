//! Campus Admin - Main Library
//!
//! Hosts the real-time channel used by every dashboard module (students,
//! fees, attendance, library, transport) plus the helpers its binaries share.
//!
//! ## Architecture
//!
//! - **realtime_channel**: WebSocket channel client (re-exported from workspace)
//! - **bin_common**: Common utilities for binary executables (CLI, logging, settings)
//!
//! ## Usage in Binaries
//!
//! ```rust,ignore
//! use campus_admin::bin_common::{load_config_from_env, ChannelSettings, ConfigType};
//!
//! let settings = ChannelSettings::load(load_config_from_env(ConfigType::Realtime))?;
//! let client = settings.build_client()?;
//! ```

// Re-export workspace libraries for convenience
pub use realtime_channel;

// Binary common utilities
pub mod bin_common {
    //! Common utilities for binary executables

    pub mod cli;
    pub mod logging;
    pub mod settings;

    pub use cli::{load_config_from_env, parse_args, ConfigType};
    pub use logging::init_tracing;
    pub use settings::{ChannelSettings, ConfigError};
}
