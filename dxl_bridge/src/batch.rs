//! Grouped register I/O with slot scatter/gather.
//!
//! The engine translates a globally-ordered request ("write these goal
//! positions for all N actuators") into one bus transaction per
//! communication group, and grouped responses back into globally-ordered
//! vectors. Callers never see the grouping: every vector that crosses this
//! boundary is indexed by slot.
//!
//! Write and read paths fail differently on purpose. Command delivery is
//! all-or-nothing per cycle: the first failing group aborts the batch
//! (groups already written stay written, later groups are not attempted).
//! Telemetry is best-effort per cycle: a failing group is logged and
//! skipped, leaving its slots stale, and the remaining groups still update
//! theirs.

use crate::groups::GroupPlan;
use crate::registry::ActuatorRegistry;
use dxl_common::bus::{ControlItem, ControlTable, ServoBus};
use dxl_common::consts::MAX_ACTUATORS;
use dxl_common::error::BridgeError;
use tracing::warn;

/// Sync-write handler identifiers, in SDK registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WriteChannel {
    /// Goal position handler (registered first)
    GoalPosition = 0,
    /// Goal velocity handler (registered second)
    GoalVelocity = 1,
}

impl WriteChannel {
    /// The SDK handler index.
    pub fn handler(self) -> u8 {
        self as u8
    }
}

/// The combined present position/velocity/current sync-read handler
/// (the only read handler the bridge registers).
pub const READ_HANDLER_PRESENT_STATE: u8 = 0;

/// Grouped batch read/write engine.
pub struct BatchEngine {
    plan: GroupPlan,
    /// Per group, the slot index of each member (same order as member_ids).
    group_slots: Vec<Vec<usize>>,
    table: ControlTable,
    n: usize,
    /// Gather buffer for grouped writes. Fixed capacity keeps the
    /// steady-state loop allocation-free.
    scratch: heapless::Vec<i32, MAX_ACTUATORS>,
    /// Extraction buffer for grouped reads.
    window: heapless::Vec<i32, MAX_ACTUATORS>,
    read_faults: u64,
}

impl BatchEngine {
    /// Build the engine over a frozen partition and resolved control table.
    pub fn new(
        registry: &ActuatorRegistry,
        plan: GroupPlan,
        table: ControlTable,
    ) -> Result<Self, BridgeError> {
        let mut group_slots = Vec::with_capacity(plan.groups().len());
        for group in plan.groups() {
            let mut slots = Vec::with_capacity(group.member_ids.len());
            for &id in &group.member_ids {
                slots.push(registry.slot_of(id)?);
            }
            group_slots.push(slots);
        }

        Ok(Self {
            plan,
            group_slots,
            table,
            n: registry.len(),
            scratch: heapless::Vec::new(),
            window: heapless::Vec::new(),
            read_faults: 0,
        })
    }

    /// Registered actuator count (the required vector length).
    pub fn len(&self) -> usize {
        self.n
    }

    /// Whether the engine spans no actuators.
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Read-path faults observed so far (failed group reads/extractions).
    pub fn read_faults(&self) -> u64 {
        self.read_faults
    }

    fn check_len(&self, got: usize) -> Result<(), BridgeError> {
        if got != self.n {
            return Err(BridgeError::LengthMismatch { expected: self.n, got });
        }
        Ok(())
    }

    /// Write one slot-ordered raw vector, one sync-write per group.
    ///
    /// Aborts on the first failing group with
    /// [`BridgeError::Communication`]; success means every group's
    /// transaction succeeded.
    pub fn write_batch(
        &mut self,
        bus: &mut dyn ServoBus,
        channel: WriteChannel,
        values: &[i32],
    ) -> Result<(), BridgeError> {
        self.check_len(values.len())?;

        for (gi, group) in self.plan.groups().iter().enumerate() {
            self.scratch.clear();
            for &slot in &self.group_slots[gi] {
                // Capacity is MAX_ACTUATORS; config validation caps N at
                // the same bound, so the push cannot overflow.
                let _ = self.scratch.push(values[slot]);
            }

            bus.sync_write(channel.handler(), &group.member_ids, &self.scratch)
                .map_err(|cause| BridgeError::Communication {
                    group: group.name.clone(),
                    cause,
                })?;
        }

        Ok(())
    }

    /// Read present position/velocity/current for all actuators into the
    /// caller's slot-ordered vectors.
    ///
    /// The vectors must be length N. Slots of a failing group keep
    /// whatever value they held before the call; failures are logged as
    /// warnings and counted, never propagated.
    pub fn read_batch(
        &mut self,
        bus: &mut dyn ServoBus,
        positions: &mut [i32],
        velocities: &mut [i32],
        currents: &mut [i32],
    ) -> Result<(), BridgeError> {
        self.check_len(positions.len())?;
        self.check_len(velocities.len())?;
        self.check_len(currents.len())?;

        for (gi, group) in self.plan.groups().iter().enumerate() {
            if let Err(cause) = bus.sync_read(READ_HANDLER_PRESENT_STATE, &group.member_ids) {
                warn!("sync read failed for group {}: {}", group.name, cause);
                self.read_faults += 1;
                continue;
            }

            let channels: [(ControlItem, &mut [i32], &str); 3] = [
                (self.table.present_position, &mut *positions, "position"),
                (self.table.present_velocity, &mut *velocities, "velocity"),
                (self.table.present_current, &mut *currents, "current"),
            ];

            for (item, out, label) in channels {
                self.window.clear();
                for _ in 0..group.member_ids.len() {
                    // Capacity is MAX_ACTUATORS; config validation caps N
                    // at the same bound, so the push cannot overflow.
                    let _ = self.window.push(0);
                }

                match bus.sync_read_data(
                    READ_HANDLER_PRESENT_STATE,
                    &group.member_ids,
                    item.address,
                    item.width,
                    &mut self.window,
                ) {
                    Ok(()) => {
                        for (k, &slot) in self.group_slots[gi].iter().enumerate() {
                            out[slot] = self.window[k];
                        }
                    }
                    Err(cause) => {
                        warn!(
                            "{} extraction failed for group {}: {}",
                            label, group.name, cause
                        );
                        self.read_faults += 1;
                    }
                }
            }
        }

        Ok(())
    }
}
