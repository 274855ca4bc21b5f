//! Shared constants for the bridge.

/// Canonical service name (used for logging).
pub const SERVICE_NAME: &str = "dxl_bridge";

/// Maximum number of actuators on one bridge instance.
pub const MAX_ACTUATORS: usize = 64;

/// Default control period in seconds (200 Hz).
pub const DEFAULT_PERIOD_S: f64 = 0.005;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/dxl/bridge.toml";

/// Group name used for joints without an explicit `CommunicationGroupName`.
pub const DEFAULT_GROUP_NAME: &str = "default";
