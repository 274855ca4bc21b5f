//! Bus backend factory.
//!
//! Real SDK bindings are external crates implementing
//! [`ServoBus`](dxl_common::bus::ServoBus); the bridge itself ships only
//! the software simulation backend, selected with `--bus sim`.

pub mod sim;

use dxl_common::bus::ServoBus;
use dxl_common::error::BridgeError;

/// Create a bus backend by name.
pub fn create_bus(name: &str) -> Result<Box<dyn ServoBus>, BridgeError> {
    match name {
        "sim" => Ok(Box::new(sim::SimBus::new())),
        other => Err(BridgeError::Config(format!(
            "Unknown bus backend '{other}' (available: sim)"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_sim_backend() {
        let bus = create_bus("sim").unwrap();
        assert_eq!(bus.protocol_version(), 2.0);
    }

    #[test]
    fn test_unknown_backend_rejected() {
        assert!(create_bus("ethercat").is_err());
    }
}
