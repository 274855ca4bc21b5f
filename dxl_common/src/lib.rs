//! DXL Common Library
//!
//! This crate provides the shared types for the Dynamixel bus
//! synchronization bridge: configuration loading, the error taxonomy,
//! and the traits at the boundary to the two external collaborators
//! (the actuator bus SDK and the shared-memory interchange layer).
//!
//! # Module Structure
//!
//! - [`bus`] - `ServoBus` trait and control-item metadata
//! - [`config`] - Configuration types and TOML loading
//! - [`consts`] - Shared constants
//! - [`error`] - `BridgeError` / `BusError` types
//! - [`interchange`] - `Interchange` trait (shared-memory boundary)

pub mod bus;
pub mod config;
pub mod consts;
pub mod error;
pub mod interchange;

pub use crate::bus::{ControlItem, ControlTable, ServoBus};
pub use crate::config::{BridgeConfig, ChannelSet, CommandMode, JointConfig, load_config};
pub use crate::error::{BridgeError, BusError};
pub use crate::interchange::Interchange;
