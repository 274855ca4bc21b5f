//! Bridge configuration types.
//!
//! The configuration is one TOML document:
//! - `[hardware]` - serial port, baud rate, control period
//! - `[interchange]` - shared-memory key, layout hash, channel list
//! - `[[joint]]` - one entry per actuator, keyed by its bus `ID`, with an
//!   optional `CommunicationGroupName` and an ordered `DynamixelSettings`
//!   table of register values written at bring-up

use crate::consts::{DEFAULT_GROUP_NAME, DEFAULT_PERIOD_S, MAX_ACTUATORS};
use crate::error::BridgeError;
use bitflags::bitflags;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// Default function for period_s
fn default_period_s() -> f64 {
    DEFAULT_PERIOD_S
}

/// Default function for the communication group name
fn default_group_name() -> String {
    DEFAULT_GROUP_NAME.to_string()
}

/// Main configuration loaded from `bridge.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Bus port and timing settings.
    pub hardware: HardwareConfig,

    /// Shared-memory interchange settings.
    pub interchange: InterchangeConfig,

    /// One entry per actuator, in slot order.
    #[serde(default, rename = "joint")]
    pub joints: Vec<JointConfig>,
}

/// `[hardware]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HardwareConfig {
    /// Device path (e.g. "/dev/ttyUSB0")
    pub port_name: String,

    /// Bus speed (e.g. 1000000)
    pub baud_rate: u32,

    /// Control period in seconds.
    /// Defaults to DEFAULT_PERIOD_S (5 ms) if omitted.
    #[serde(default = "default_period_s")]
    pub period_s: f64,
}

/// `[interchange]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterchangeConfig {
    /// Key identifying the shared-memory segment.
    pub shm_key: i32,

    /// Layout hash the reader side checks against.
    #[serde(default)]
    pub hash: i32,

    /// Channel names carried by the interchange layer
    /// (e.g. ["PositionCommand", "MotorCurrent"]).
    #[serde(default)]
    pub channels: Vec<String>,
}

/// One `[[joint]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JointConfig {
    /// Bus ID, assigned by the physical chain.
    #[serde(rename = "ID")]
    pub id: u8,

    /// Communication group this joint is batched with.
    #[serde(rename = "CommunicationGroupName", default = "default_group_name")]
    pub group: String,

    /// Register settings written during bring-up, in document order.
    #[serde(rename = "DynamixelSettings", default)]
    pub settings: RegisterSettings,
}

/// Ordered register settings.
///
/// Written to the actuator in document order, which matters for registers
/// like `Operating_Mode` that gate the meaning of later writes. A plain
/// `HashMap` would lose that order; map entries are collected through
/// `MapAccess`, which yields them in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegisterSettings(pub Vec<(String, i32)>);

impl<'de> Deserialize<'de> for RegisterSettings {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SettingsVisitor;

        impl<'de> Visitor<'de> for SettingsVisitor {
            type Value = RegisterSettings;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of register names to integer values")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, value)) = map.next_entry::<String, i32>()? {
                    entries.push((name, value));
                }
                Ok(RegisterSettings(entries))
            }
        }

        deserializer.deserialize_map(SettingsVisitor)
    }
}

impl Serialize for RegisterSettings {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

bitflags! {
    /// Channels exposed through the interchange layer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ChannelSet: u32 {
        /// Position command slot (control process → bridge)
        const POSITION_COMMAND = 1 << 0;
        /// Position gain slots
        const POSITION_GAINS = 1 << 1;
        /// Velocity command slot (control process → bridge)
        const VELOCITY_COMMAND = 1 << 2;
        /// Velocity gain slots
        const VELOCITY_GAINS = 1 << 3;
        /// Torque command slot
        const TORQUE_COMMAND = 1 << 4;
        /// Torque gain slots
        const TORQUE_GAINS = 1 << 5;
        /// Motor temperature telemetry
        const MOTOR_TEMPERATURE = 1 << 6;
        /// Motor current telemetry
        const MOTOR_CURRENT = 1 << 7;
    }
}

impl ChannelSet {
    /// Look up a single channel by its configuration name.
    fn from_channel_name(name: &str) -> Option<Self> {
        match name {
            "PositionCommand" => Some(Self::POSITION_COMMAND),
            "PositionGains" => Some(Self::POSITION_GAINS),
            "VelocityCommand" => Some(Self::VELOCITY_COMMAND),
            "VelocityGains" => Some(Self::VELOCITY_GAINS),
            "TorqueCommand" => Some(Self::TORQUE_COMMAND),
            "TorqueGains" => Some(Self::TORQUE_GAINS),
            "MotorTemperature" => Some(Self::MOTOR_TEMPERATURE),
            "MotorCurrent" => Some(Self::MOTOR_CURRENT),
            _ => None,
        }
    }

    /// Build the channel set from the configured name list.
    pub fn from_names(names: &[String]) -> Result<Self, BridgeError> {
        let mut set = Self::empty();
        for name in names {
            let flag = Self::from_channel_name(name).ok_or_else(|| {
                BridgeError::Config(format!("Unknown interchange channel '{name}'"))
            })?;
            set |= flag;
        }
        Ok(set)
    }

    /// The command mode implied by this channel set.
    ///
    /// Exactly one of PositionCommand / VelocityCommand must be present;
    /// the mode is fixed for the process lifetime.
    pub fn command_mode(&self) -> Result<CommandMode, BridgeError> {
        let pos = self.contains(Self::POSITION_COMMAND);
        let vel = self.contains(Self::VELOCITY_COMMAND);
        match (pos, vel) {
            (true, false) => Ok(CommandMode::Position),
            (false, true) => Ok(CommandMode::Velocity),
            (true, true) => Err(BridgeError::Config(
                "PositionCommand and VelocityCommand are mutually exclusive".to_string(),
            )),
            (false, false) => Err(BridgeError::Config(
                "One of PositionCommand or VelocityCommand must be configured".to_string(),
            )),
        }
    }
}

/// Which command channel the control loop relays, selected once from
/// configuration and never switched at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandMode {
    /// Relay position commands (rad)
    Position,
    /// Relay velocity commands (rad/s)
    Velocity,
}

impl BridgeConfig {
    /// Validate the configuration.
    ///
    /// # Validation Rules
    /// 1. `port_name` not empty, `baud_rate` > 0, `period_s` > 0
    /// 2. At least one joint, at most MAX_ACTUATORS
    /// 3. Joint IDs unique
    /// 4. All channel names known; exactly one command channel
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.hardware.port_name.is_empty() {
            return Err(BridgeError::Config("port_name must not be empty".to_string()));
        }
        if self.hardware.baud_rate == 0 {
            return Err(BridgeError::Config("baud_rate must be greater than 0".to_string()));
        }
        if self.hardware.period_s <= 0.0 {
            return Err(BridgeError::Config("period_s must be greater than 0".to_string()));
        }

        if self.joints.is_empty() {
            return Err(BridgeError::Config("at least one joint must be configured".to_string()));
        }
        if self.joints.len() > MAX_ACTUATORS {
            return Err(BridgeError::Config(format!(
                "Too many joints: {} (max {})",
                self.joints.len(),
                MAX_ACTUATORS
            )));
        }

        // Check for duplicate IDs
        let mut ids = HashSet::new();
        for joint in &self.joints {
            if !ids.insert(joint.id) {
                return Err(BridgeError::DuplicateId { id: joint.id });
            }
        }

        // Channel list must parse and pin down the command mode.
        let channels = ChannelSet::from_names(&self.interchange.channels)?;
        channels.command_mode()?;

        Ok(())
    }

    /// The parsed channel set. Call after `validate()`.
    pub fn channels(&self) -> Result<ChannelSet, BridgeError> {
        ChannelSet::from_names(&self.interchange.channels)
    }
}

/// Load and validate a bridge configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<BridgeConfig, BridgeError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        BridgeError::Config(format!("Failed to read config file {path:?}: {e}"))
    })?;

    let config: BridgeConfig = toml::from_str(&content).map_err(|e| {
        BridgeError::Config(format!("Failed to parse config file {path:?}: {e}"))
    })?;

    config.validate()?;
    Ok(config)
}
