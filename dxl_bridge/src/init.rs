//! Staged bring-up sequencer.
//!
//! Bring-up is strictly ordered and never retried: a mis-registered
//! actuator or bad wiring needs an operator, not a retry loop. The first
//! failure aborts the whole sequence with an error naming the offending
//! entity, and the stage reached is kept for diagnostics.
//!
//! `Unconnected → BusConnected → ActuatorsDiscovered → SettingsWritten →
//! ControlItemsResolved → HandlersRegistered → Ready`

use crate::registry::ActuatorRegistry;
use dxl_common::bus::{ControlItem, ControlTable, ServoBus};
use dxl_common::error::BridgeError;
use tracing::{debug, info};

/// Extra bytes appended to the combined read window. Some models leave a
/// two-byte gap between Present_Velocity and Present_Current; the window
/// has to span it.
const SYNC_READ_PAD: u16 = 2;

/// Bring-up stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BridgeStage {
    /// Nothing done yet
    Unconnected,
    /// Physical port open
    BusConnected,
    /// Every registered ID answered its ping
    ActuatorsDiscovered,
    /// Configured register settings written, torque re-enabled
    SettingsWritten,
    /// Control-item metadata resolved from the representative actuator
    ControlItemsResolved,
    /// Sync read/write handlers registered with the SDK
    HandlersRegistered,
    /// Bring-up complete
    Ready,
}

/// One-shot bring-up state machine.
pub struct InitSequencer<'a> {
    registry: &'a ActuatorRegistry,
    port: String,
    baud_rate: u32,
    stage: BridgeStage,
}

impl<'a> InitSequencer<'a> {
    /// Create a sequencer for the given registry and port settings.
    pub fn new(registry: &'a ActuatorRegistry, port: &str, baud_rate: u32) -> Self {
        Self {
            registry,
            port: port.to_string(),
            baud_rate,
            stage: BridgeStage::Unconnected,
        }
    }

    /// The stage reached so far.
    pub fn stage(&self) -> BridgeStage {
        self.stage
    }

    /// Run the full sequence, yielding the resolved control table.
    pub fn run(&mut self, bus: &mut dyn ServoBus) -> Result<ControlTable, BridgeError> {
        self.connect(bus)?;
        self.discover(bus)?;
        self.write_settings(bus)?;
        let table = self.resolve_control_items(bus)?;
        self.register_handlers(bus, &table)?;
        self.stage = BridgeStage::Ready;
        info!("Bring-up complete, {} actuators ready", self.registry.len());
        Ok(table)
    }

    fn connect(&mut self, bus: &mut dyn ServoBus) -> Result<(), BridgeError> {
        bus.connect(&self.port, self.baud_rate)
            .map_err(|cause| BridgeError::BusConnect {
                port: self.port.clone(),
                baud: self.baud_rate,
                cause,
            })?;
        self.stage = BridgeStage::BusConnected;
        info!("Bus open on {} at {} baud", self.port, self.baud_rate);
        Ok(())
    }

    /// Ping every registered ID once, in registry order. Partial discovery
    /// is not tolerated: later stages assume every actuator is reachable.
    fn discover(&mut self, bus: &mut dyn ServoBus) -> Result<(), BridgeError> {
        for record in self.registry.records() {
            let model = bus
                .ping(record.id)
                .map_err(|_| BridgeError::ActuatorNotFound { id: record.id })?;
            info!("Found actuator ID {} (model {})", record.id, model);
        }
        self.stage = BridgeStage::ActuatorsDiscovered;
        Ok(())
    }

    /// Per actuator: torque off, write each configured setting in
    /// configuration order, torque back on.
    fn write_settings(&mut self, bus: &mut dyn ServoBus) -> Result<(), BridgeError> {
        for record in self.registry.records() {
            bus.torque_off(record.id)
                .map_err(|cause| BridgeError::SettingWrite {
                    id: record.id,
                    register: "Torque_Enable".to_string(),
                    value: 0,
                    cause,
                })?;

            for (register, value) in &record.settings {
                debug!("ID {}: {} = {}", record.id, register, value);
                bus.item_write(record.id, register, *value).map_err(|cause| {
                    BridgeError::SettingWrite {
                        id: record.id,
                        register: register.clone(),
                        value: *value,
                        cause,
                    }
                })?;
            }

            bus.torque_on(record.id)
                .map_err(|cause| BridgeError::SettingWrite {
                    id: record.id,
                    register: "Torque_Enable".to_string(),
                    value: 1,
                    cause,
                })?;
        }
        self.stage = BridgeStage::SettingsWritten;
        Ok(())
    }

    /// Resolve the five logical channels from the first registered
    /// actuator; the chain is assumed model-homogeneous for these
    /// registers. Legacy models lack some of the primary names and are
    /// served through fallbacks.
    fn resolve_control_items(
        &mut self,
        bus: &mut dyn ServoBus,
    ) -> Result<ControlTable, BridgeError> {
        let representative = self
            .registry
            .representative()
            .ok_or_else(|| BridgeError::Config("no actuators registered".to_string()))?;
        let id = representative.id;

        let resolve = |channel: &str, fallback: Option<&str>| -> Result<ControlItem, BridgeError> {
            bus.item_info(id, channel)
                .or_else(|| fallback.and_then(|name| bus.item_info(id, name)))
                .ok_or_else(|| BridgeError::ControlItemMissing {
                    channel: channel.to_string(),
                })
        };

        let table = ControlTable {
            goal_position: resolve("Goal_Position", None)?,
            goal_velocity: resolve("Goal_Velocity", Some("Moving_Speed"))?,
            present_position: resolve("Present_Position", None)?,
            present_velocity: resolve("Present_Velocity", Some("Present_Speed"))?,
            present_current: resolve("Present_Current", Some("Present_Load"))?,
        };

        self.stage = BridgeStage::ControlItemsResolved;
        debug!(
            "Control items resolved from ID {}: goal_pos @{}, present window @{}..",
            id,
            table.goal_position.address,
            table
                .present_position
                .address
                .min(table.present_current.address)
        );
        Ok(table)
    }

    /// Register the two write handlers and, on protocol 2.0, the combined
    /// present-state read handler.
    fn register_handlers(
        &mut self,
        bus: &mut dyn ServoBus,
        table: &ControlTable,
    ) -> Result<(), BridgeError> {
        bus.add_sync_write_handler(table.goal_position.address, table.goal_position.width)
            .map_err(|cause| BridgeError::HandlerRegistration {
                channel: "Goal_Position".to_string(),
                cause,
            })?;

        bus.add_sync_write_handler(table.goal_velocity.address, table.goal_velocity.width)
            .map_err(|cause| BridgeError::HandlerRegistration {
                channel: "Goal_Velocity".to_string(),
                cause,
            })?;

        if bus.protocol_version() >= 2.0 {
            let start = table
                .present_position
                .address
                .min(table.present_current.address);
            let width = table.present_position.width
                + table.present_velocity.width
                + table.present_current.width
                + SYNC_READ_PAD;

            bus.add_sync_read_handler(start, width).map_err(|cause| {
                BridgeError::HandlerRegistration {
                    channel: "Present_Position/Velocity/Current".to_string(),
                    cause,
                }
            })?;
        }

        self.stage = BridgeStage::HandlersRegistered;
        Ok(())
    }
}
