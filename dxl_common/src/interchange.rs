//! Shared-memory interchange boundary.
//!
//! The periodic control process on the other side of the bridge exchanges
//! slot-ordered command and telemetry vectors through this trait. The
//! transport itself (POSIX shared memory, locking, header layout) belongs to
//! the implementing crate; the bridge calls each primitive at most once per
//! cycle and never holds state across the boundary.

use crate::error::BridgeError;

/// Interface to the inter-process interchange layer.
///
/// All vectors are length-N and slot-ordered. The frame counter is a
/// monotonically increasing sequence number readers use for staleness
/// detection.
pub trait Interchange {
    /// Open (or create) the shared segment.
    fn open(&mut self, create: bool) -> Result<(), BridgeError>;

    /// Write the segment header (layout hash, joint count).
    fn write_header(&mut self) -> Result<(), BridgeError>;

    /// Whether the segment is open and usable.
    fn is_open(&self) -> bool;

    /// Publish present positions (rad).
    fn write_position_current(&mut self, values: &[f64]) -> Result<(), BridgeError>;

    /// Publish present velocities (rad/s).
    fn write_velocity_current(&mut self, values: &[f64]) -> Result<(), BridgeError>;

    /// Publish present torques (same scale as current; see the converter).
    fn write_torque_current(&mut self, values: &[f64]) -> Result<(), BridgeError>;

    /// Read the active position command (rad) into `out`.
    fn read_position_command(&mut self, out: &mut [f64]) -> Result<(), BridgeError>;

    /// Read the active velocity command (rad/s) into `out`.
    fn read_velocity_command(&mut self, out: &mut [f64]) -> Result<(), BridgeError>;

    /// Seed the position command slots (used once before the loop starts).
    fn write_position_command(&mut self, values: &[f64]) -> Result<(), BridgeError>;

    /// Seed the velocity command slots.
    fn write_velocity_command(&mut self, values: &[f64]) -> Result<(), BridgeError>;

    /// Reset the frame counter to zero.
    fn reset_frame(&mut self);

    /// Advance the frame counter by one.
    fn increment_frame(&mut self);

    /// Current frame counter value.
    fn frame(&self) -> u64;
}
