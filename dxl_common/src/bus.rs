//! Actuator bus SDK boundary.
//!
//! The bridge talks to the servo chain exclusively through the [`ServoBus`]
//! trait. Backends own the wire protocol, checksums, and per-transaction
//! retries; the bridge owns grouping, slot mapping, and sequencing. A
//! software backend ships with the bridge for development and tests; real
//! SDK bindings live in external crates implementing this trait.

use crate::error::BusError;

/// A resolved control item: the bus address and byte width of one logical
/// register (e.g. "Present_Position") on the configured actuator model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlItem {
    /// Register start address
    pub address: u16,
    /// Register width in bytes
    pub width: u16,
}

/// The five control items the bridge resolves once at bring-up, from a
/// single representative actuator (the chain is assumed model-homogeneous
/// for these channels).
#[derive(Debug, Clone, Copy)]
pub struct ControlTable {
    /// Goal position register
    pub goal_position: ControlItem,
    /// Goal velocity register
    pub goal_velocity: ControlItem,
    /// Present position register
    pub present_position: ControlItem,
    /// Present velocity register
    pub present_velocity: ControlItem,
    /// Present current register
    pub present_current: ControlItem,
}

/// Interface to the external actuator bus SDK.
///
/// All calls block until the transaction completes or fails; transaction
/// timeouts are the backend's responsibility and surface as [`BusError`].
/// Handlers are addressed by the small index implied by registration order,
/// matching the SDK convention (first registered write handler is 0, etc.).
pub trait ServoBus: Send {
    /// Open the physical connection.
    fn connect(&mut self, port: &str, baud_rate: u32) -> Result<(), BusError>;

    /// Ping one actuator, returning its model number.
    fn ping(&mut self, id: u8) -> Result<u16, BusError>;

    /// Disable torque on one actuator.
    fn torque_off(&mut self, id: u8) -> Result<(), BusError>;

    /// Enable torque on one actuator.
    fn torque_on(&mut self, id: u8) -> Result<(), BusError>;

    /// Write one named register on one actuator.
    fn item_write(&mut self, id: u8, register: &str, value: i32) -> Result<(), BusError>;

    /// Address/width metadata for a named register, or `None` if the model
    /// lacks it.
    fn item_info(&self, id: u8, register: &str) -> Option<ControlItem>;

    /// Wire protocol version (grouped reads need 2.0).
    fn protocol_version(&self) -> f32;

    /// Register a sync-write handler for one register window.
    fn add_sync_write_handler(&mut self, address: u16, width: u16) -> Result<(), BusError>;

    /// Register a sync-read handler for one register window.
    fn add_sync_read_handler(&mut self, address: u16, width: u16) -> Result<(), BusError>;

    /// One grouped write: `values[i]` goes to `ids[i]`.
    fn sync_write(&mut self, handler: u8, ids: &[u8], values: &[i32]) -> Result<(), BusError>;

    /// One grouped read over the handler's register window.
    fn sync_read(&mut self, handler: u8, ids: &[u8]) -> Result<(), BusError>;

    /// Extract one register's values for `ids` from the last grouped read.
    /// `out.len()` must equal `ids.len()`.
    fn sync_read_data(
        &mut self,
        handler: u8,
        ids: &[u8],
        address: u16,
        width: u16,
        out: &mut [i32],
    ) -> Result<(), BusError>;

    /// Raw position ticks → radians, model-specific per actuator.
    fn value_to_radian(&self, id: u8, value: i32) -> f64;

    /// Radians → raw position ticks.
    fn radian_to_value(&self, id: u8, radian: f64) -> i32;

    /// Raw velocity ticks → rad/s.
    fn value_to_velocity(&self, id: u8, value: i32) -> f64;

    /// rad/s → raw velocity ticks.
    fn velocity_to_value(&self, id: u8, velocity: f64) -> i32;

    /// Raw current ticks → amperes.
    fn value_to_current(&self, id: u8, value: i32) -> f64;
}
