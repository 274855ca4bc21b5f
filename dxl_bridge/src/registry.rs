//! Actuator registry: identity, settings, and the id→slot map.
//!
//! The registry is write-once: records are appended during configuration
//! parsing and never removed. The append order defines the slot index,
//! which is the coordinate every caller-visible vector (positions,
//! velocities, currents, commands) is indexed by.

use dxl_common::config::BridgeConfig;
use dxl_common::error::BridgeError;
use std::collections::HashMap;

/// One actuator's identity and bring-up settings.
#[derive(Debug, Clone)]
pub struct ActuatorRecord {
    /// Bus ID (assigned by the physical chain)
    pub id: u8,
    /// Communication group name
    pub group: String,
    /// Register settings written at bring-up, in configuration order
    pub settings: Vec<(String, i32)>,
}

/// Insertion-ordered actuator records plus the id→slot map.
#[derive(Debug, Default)]
pub struct ActuatorRegistry {
    records: Vec<ActuatorRecord>,
    slots: HashMap<u8, usize>,
}

impl ActuatorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a validated configuration, in joint order.
    pub fn from_config(config: &BridgeConfig) -> Result<Self, BridgeError> {
        let mut registry = Self::new();
        for joint in &config.joints {
            registry.register(ActuatorRecord {
                id: joint.id,
                group: joint.group.clone(),
                settings: joint.settings.0.clone(),
            })?;
        }
        Ok(registry)
    }

    /// Append a record, returning its slot index.
    pub fn register(&mut self, record: ActuatorRecord) -> Result<usize, BridgeError> {
        if self.slots.contains_key(&record.id) {
            return Err(BridgeError::DuplicateId { id: record.id });
        }
        let slot = self.records.len();
        self.slots.insert(record.id, slot);
        self.records.push(record);
        Ok(slot)
    }

    /// Slot index of one actuator.
    pub fn slot_of(&self, id: u8) -> Result<usize, BridgeError> {
        self.slots
            .get(&id)
            .copied()
            .ok_or(BridgeError::UnknownId { id })
    }

    /// Number of registered actuators.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records, in slot order.
    pub fn records(&self) -> &[ActuatorRecord] {
        &self.records
    }

    /// All IDs, in slot order.
    pub fn ids(&self) -> Vec<u8> {
        self.records.iter().map(|r| r.id).collect()
    }

    /// The representative actuator used for control-item resolution
    /// (the first registered record).
    pub fn representative(&self) -> Option<&ActuatorRecord> {
        self.records.first()
    }
}
