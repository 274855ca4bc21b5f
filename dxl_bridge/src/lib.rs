//! # Dynamixel Bus Synchronization Bridge
//!
//! Bridges a chain of Dynamixel-class servo actuators with a periodic
//! control process behind a shared-memory interchange. The bridge owns
//! the hard part: keeping a strict ID↔slot correspondence while batching
//! register I/O per communication group, converting between raw register
//! units and engineering units, and running the fixed-period relay cycle.
//!
//! # Module Structure
//!
//! - [`registry`] - actuator records and the id→slot map
//! - [`groups`] - communication-group partition
//! - [`convert`] - raw ↔ engineering unit fan-out
//! - [`batch`] - grouped sync read/write with slot scatter/gather
//! - [`init`] - staged bring-up sequencer
//! - [`timing`] - absolute-deadline interval timer
//! - [`cycle`] - the control-loop driver
//! - [`bus_backends`] - bus backend factory + software simulation backend
//! - [`interchange_mem`] - in-process interchange implementation
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          dxl_bridge                              │
//! │  ┌──────────────┐    ┌──────────────┐    ┌───────────────────┐   │
//! │  │  Interchange │◄──►│  ControlLoop │◄──►│   BatchEngine     │   │
//! │  │  (trait)     │    │  (RT cycle)  │    │  (group gather/   │   │
//! │  └──────────────┘    └──────┬───────┘    │   slot scatter)   │   │
//! │                             │            └─────────┬─────────┘   │
//! │                             ▼                      ▼             │
//! │                      ┌──────────────┐      ┌──────────────┐      │
//! │                      │ UnitConverter│      │   ServoBus   │      │
//! │                      └──────────────┘      │   (trait)    │      │
//! │                                            └──────────────┘      │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

pub mod batch;
pub mod bus_backends;
pub mod convert;
pub mod cycle;
pub mod groups;
pub mod init;
pub mod interchange_mem;
pub mod registry;
pub mod timing;

pub use crate::batch::{BatchEngine, WriteChannel};
pub use crate::convert::UnitConverter;
pub use crate::cycle::ControlLoop;
pub use crate::groups::{CommGroup, GroupPlan};
pub use crate::init::{BridgeStage, InitSequencer};
pub use crate::interchange_mem::MemoryInterchange;
pub use crate::registry::{ActuatorRecord, ActuatorRegistry};
pub use crate::timing::IntervalTimer;
