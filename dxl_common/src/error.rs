//! Error types for the bridge.
//!
//! `BusError` is the error surface of the external bus SDK; everything the
//! bridge itself can fail with is a `BridgeError`. Initialization-stage
//! errors are fatal and carry the offending entity; steady-state errors are
//! handled per cycle by the control loop.

use thiserror::Error;

/// Error reported by a `ServoBus` backend for a single transaction.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BusError {
    /// Port-level I/O failure
    #[error("bus I/O failed: {0}")]
    Io(String),

    /// An addressed actuator did not answer
    #[error("no response from actuator ID {0}")]
    NoResponse(u8),

    /// A register name the model does not have
    #[error("unknown register '{0}'")]
    UnknownRegister(String),

    /// A sync handler index that was never registered
    #[error("sync handler {0} is not registered")]
    UnknownHandler(u8),
}

/// Error types for bridge operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Malformed or missing configuration fields
    #[error("Configuration error: {0}")]
    Config(String),

    /// Opening the physical bus connection failed
    #[error("Failed to open bus port {port} at {baud} baud: {cause}")]
    BusConnect {
        /// Device path from configuration
        port: String,
        /// Baud rate from configuration
        baud: u32,
        /// Underlying bus error
        cause: BusError,
    },

    /// A registered actuator did not answer its discovery ping
    #[error("Actuator ID {id} did not respond to ping")]
    ActuatorNotFound {
        /// The unanswered ID
        id: u8,
    },

    /// Writing a configured register setting failed
    #[error("Failed to write {value} to register '{register}' on actuator {id}: {cause}")]
    SettingWrite {
        /// Actuator the write was addressed to
        id: u8,
        /// Register name from configuration
        register: String,
        /// Raw value from configuration
        value: i32,
        /// Underlying bus error
        cause: BusError,
    },

    /// A logical control channel could not be resolved on the representative actuator
    #[error("Control item '{channel}' could not be resolved")]
    ControlItemMissing {
        /// The unresolved channel name
        channel: String,
    },

    /// Registering a sync read/write handler with the bus SDK failed
    #[error("Failed to register sync handler for {channel}: {cause}")]
    HandlerRegistration {
        /// The channel the handler was meant to serve
        channel: String,
        /// Underlying bus error
        cause: BusError,
    },

    /// A grouped write transaction failed
    #[error("Sync write to group '{group}' failed: {cause}")]
    Communication {
        /// Name of the failing communication group
        group: String,
        /// Underlying bus error
        cause: BusError,
    },

    /// An actuator ID registered twice
    #[error("Duplicate actuator ID {id}")]
    DuplicateId {
        /// The offending ID
        id: u8,
    },

    /// An actuator ID absent from the registry
    #[error("Unknown actuator ID {id}")]
    UnknownId {
        /// The offending ID
        id: u8,
    },

    /// A slot-ordered vector whose length does not match the actuator count
    #[error("Vector length {got} does not match actuator count {expected}")]
    LengthMismatch {
        /// Registered actuator count
        expected: usize,
        /// Length actually supplied
        got: usize,
    },

    /// Shared interchange layer failure
    #[error("Interchange error: {0}")]
    Interchange(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_error_display() {
        let err = BridgeError::ActuatorNotFound { id: 7 };
        assert!(err.to_string().contains('7'));

        let err = BridgeError::SettingWrite {
            id: 3,
            register: "Operating_Mode".to_string(),
            value: 1,
            cause: BusError::NoResponse(3),
        };
        let msg = err.to_string();
        assert!(msg.contains("Operating_Mode"));
        assert!(msg.contains("actuator 3"));
    }

    #[test]
    fn test_communication_error_names_group() {
        let err = BridgeError::Communication {
            group: "left_arm".to_string(),
            cause: BusError::Io("timeout".to_string()),
        };
        assert!(err.to_string().contains("left_arm"));
        assert!(err.to_string().contains("timeout"));
    }
}
