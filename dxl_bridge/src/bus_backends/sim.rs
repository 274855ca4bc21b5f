//! Software bus backend.
//!
//! Emulates an XM430-class actuator chain for development and testing
//! without hardware: the five control items at their real addresses, the
//! documented unit scales, protocol 2.0 sync handlers, and a goal→present
//! echo instead of physics. Every addressed ID answers, the way a fully
//! wired chain would.

use dxl_common::bus::{ControlItem, ServoBus};
use dxl_common::error::BusError;
use std::collections::HashMap;
use std::f64::consts::TAU;
use tracing::debug;

const MODEL_NUMBER: u16 = 1020;

const ADDR_GOAL_VELOCITY: u16 = 104;
const ADDR_GOAL_POSITION: u16 = 116;
const ADDR_PRESENT_CURRENT: u16 = 126;
const ADDR_PRESENT_VELOCITY: u16 = 128;
const ADDR_PRESENT_POSITION: u16 = 132;

/// Position encoding: 4096 ticks per revolution, zero radians at 2048.
const RAD_PER_TICK: f64 = TAU / 4096.0;
const CENTER_TICKS: i32 = 2048;

/// Velocity encoding: 0.229 rpm per tick.
const RAD_S_PER_TICK: f64 = 0.229 * TAU / 60.0;

/// Current encoding: 2.69 mA per tick.
const AMP_PER_TICK: f64 = 0.00269;

#[derive(Debug)]
struct SimServo {
    torque: bool,
    registers: HashMap<String, i32>,
    goal_position: i32,
    goal_velocity: i32,
    present_position: i32,
    present_velocity: i32,
    present_current: i32,
}

impl SimServo {
    fn new() -> Self {
        Self {
            torque: false,
            registers: HashMap::new(),
            goal_position: CENTER_TICKS,
            goal_velocity: 0,
            present_position: CENTER_TICKS,
            present_velocity: 0,
            present_current: 0,
        }
    }
}

/// Simulated servo chain.
#[derive(Debug, Default)]
pub struct SimBus {
    connected: bool,
    port: String,
    servos: HashMap<u8, SimServo>,
    write_handlers: Vec<(u16, u16)>,
    read_handlers: Vec<(u16, u16)>,
}

impl SimBus {
    /// Create an empty chain; servos materialize when first addressed.
    pub fn new() -> Self {
        Self::default()
    }

    fn servo_mut(&mut self, id: u8) -> &mut SimServo {
        self.servos.entry(id).or_insert_with(SimServo::new)
    }

    /// Override one servo's present position (raw ticks).
    pub fn set_present_position(&mut self, id: u8, value: i32) {
        self.servo_mut(id).present_position = value;
    }

    /// Override one servo's present velocity (raw ticks).
    pub fn set_present_velocity(&mut self, id: u8, value: i32) {
        self.servo_mut(id).present_velocity = value;
    }

    /// Override one servo's present current (raw ticks).
    pub fn set_present_current(&mut self, id: u8, value: i32) {
        self.servo_mut(id).present_current = value;
    }

    /// Last goal position written to one servo, if it exists.
    pub fn goal_position(&self, id: u8) -> Option<i32> {
        self.servos.get(&id).map(|s| s.goal_position)
    }

    /// Last goal velocity written to one servo, if it exists.
    pub fn goal_velocity(&self, id: u8) -> Option<i32> {
        self.servos.get(&id).map(|s| s.goal_velocity)
    }

    /// A named register previously written with `item_write`.
    pub fn register_value(&self, id: u8, register: &str) -> Option<i32> {
        self.servos
            .get(&id)
            .and_then(|s| s.registers.get(register).copied())
    }

    /// Whether one servo's torque is enabled, if it exists.
    pub fn torque_enabled(&self, id: u8) -> Option<bool> {
        self.servos.get(&id).map(|s| s.torque)
    }

    /// The port the bus was opened on.
    pub fn port(&self) -> &str {
        &self.port
    }

    fn check_connected(&self) -> Result<(), BusError> {
        if !self.connected {
            return Err(BusError::Io("bus not connected".to_string()));
        }
        Ok(())
    }
}

impl ServoBus for SimBus {
    fn connect(&mut self, port: &str, baud_rate: u32) -> Result<(), BusError> {
        if baud_rate == 0 {
            return Err(BusError::Io("baud rate 0".to_string()));
        }
        self.port = port.to_string();
        self.connected = true;
        debug!("sim bus open on {port} at {baud_rate} baud");
        Ok(())
    }

    fn ping(&mut self, id: u8) -> Result<u16, BusError> {
        self.check_connected()?;
        self.servo_mut(id);
        Ok(MODEL_NUMBER)
    }

    fn torque_off(&mut self, id: u8) -> Result<(), BusError> {
        self.check_connected()?;
        self.servo_mut(id).torque = false;
        Ok(())
    }

    fn torque_on(&mut self, id: u8) -> Result<(), BusError> {
        self.check_connected()?;
        self.servo_mut(id).torque = true;
        Ok(())
    }

    fn item_write(&mut self, id: u8, register: &str, value: i32) -> Result<(), BusError> {
        self.check_connected()?;
        self.servo_mut(id)
            .registers
            .insert(register.to_string(), value);
        Ok(())
    }

    fn item_info(&self, _id: u8, register: &str) -> Option<ControlItem> {
        match register {
            "Goal_Velocity" => Some(ControlItem { address: ADDR_GOAL_VELOCITY, width: 4 }),
            "Goal_Position" => Some(ControlItem { address: ADDR_GOAL_POSITION, width: 4 }),
            "Present_Current" => Some(ControlItem { address: ADDR_PRESENT_CURRENT, width: 2 }),
            "Present_Velocity" => Some(ControlItem { address: ADDR_PRESENT_VELOCITY, width: 4 }),
            "Present_Position" => Some(ControlItem { address: ADDR_PRESENT_POSITION, width: 4 }),
            _ => None,
        }
    }

    fn protocol_version(&self) -> f32 {
        2.0
    }

    fn add_sync_write_handler(&mut self, address: u16, width: u16) -> Result<(), BusError> {
        self.write_handlers.push((address, width));
        Ok(())
    }

    fn add_sync_read_handler(&mut self, address: u16, width: u16) -> Result<(), BusError> {
        self.read_handlers.push((address, width));
        Ok(())
    }

    fn sync_write(&mut self, handler: u8, ids: &[u8], values: &[i32]) -> Result<(), BusError> {
        self.check_connected()?;
        if ids.len() != values.len() {
            return Err(BusError::Io(format!(
                "id/value count mismatch: {} vs {}",
                ids.len(),
                values.len()
            )));
        }
        let &(address, _width) = self
            .write_handlers
            .get(handler as usize)
            .ok_or(BusError::UnknownHandler(handler))?;

        for (&id, &value) in ids.iter().zip(values.iter()) {
            let servo = self.servo_mut(id);
            match address {
                ADDR_GOAL_POSITION => {
                    servo.goal_position = value;
                    // No physics: the chain settles instantly.
                    servo.present_position = value;
                }
                ADDR_GOAL_VELOCITY => {
                    servo.goal_velocity = value;
                    servo.present_velocity = value;
                }
                other => return Err(BusError::Io(format!("unwritable address {other}"))),
            }
        }
        Ok(())
    }

    fn sync_read(&mut self, handler: u8, ids: &[u8]) -> Result<(), BusError> {
        self.check_connected()?;
        self.read_handlers
            .get(handler as usize)
            .ok_or(BusError::UnknownHandler(handler))?;
        for &id in ids {
            self.servo_mut(id);
        }
        Ok(())
    }

    fn sync_read_data(
        &mut self,
        handler: u8,
        ids: &[u8],
        address: u16,
        _width: u16,
        out: &mut [i32],
    ) -> Result<(), BusError> {
        self.check_connected()?;
        self.read_handlers
            .get(handler as usize)
            .ok_or(BusError::UnknownHandler(handler))?;
        if out.len() != ids.len() {
            return Err(BusError::Io(format!(
                "output length {} does not match id count {}",
                out.len(),
                ids.len()
            )));
        }

        for (i, &id) in ids.iter().enumerate() {
            let servo = self.servo_mut(id);
            out[i] = match address {
                ADDR_PRESENT_POSITION => servo.present_position,
                ADDR_PRESENT_VELOCITY => servo.present_velocity,
                ADDR_PRESENT_CURRENT => servo.present_current,
                other => return Err(BusError::Io(format!("unreadable address {other}"))),
            };
        }
        Ok(())
    }

    fn value_to_radian(&self, _id: u8, value: i32) -> f64 {
        (value - CENTER_TICKS) as f64 * RAD_PER_TICK
    }

    fn radian_to_value(&self, _id: u8, radian: f64) -> i32 {
        (radian / RAD_PER_TICK).round() as i32 + CENTER_TICKS
    }

    fn value_to_velocity(&self, _id: u8, value: i32) -> f64 {
        value as f64 * RAD_S_PER_TICK
    }

    fn velocity_to_value(&self, _id: u8, velocity: f64) -> i32 {
        (velocity / RAD_S_PER_TICK).round() as i32
    }

    fn value_to_current(&self, _id: u8, value: i32) -> f64 {
        value as f64 * AMP_PER_TICK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected() -> SimBus {
        let mut bus = SimBus::new();
        bus.connect("/dev/null", 1_000_000).unwrap();
        bus
    }

    #[test]
    fn test_requires_connect() {
        let mut bus = SimBus::new();
        assert!(bus.ping(1).is_err());
        bus.connect("/dev/null", 57600).unwrap();
        assert_eq!(bus.port(), "/dev/null");
        assert_eq!(bus.ping(1).unwrap(), MODEL_NUMBER);
    }

    #[test]
    fn test_item_write_persists() {
        let mut bus = connected();
        bus.item_write(3, "Operating_Mode", 3).unwrap();
        assert_eq!(bus.register_value(3, "Operating_Mode"), Some(3));
    }

    #[test]
    fn test_sync_write_echoes_goal_into_present() {
        let mut bus = connected();
        bus.add_sync_write_handler(ADDR_GOAL_POSITION, 4).unwrap();
        bus.add_sync_read_handler(ADDR_PRESENT_CURRENT, 12).unwrap();

        bus.sync_write(0, &[1, 2], &[3000, 1000]).unwrap();
        assert_eq!(bus.goal_position(1), Some(3000));

        let mut out = [0; 2];
        bus.sync_read(0, &[1, 2]).unwrap();
        bus.sync_read_data(0, &[1, 2], ADDR_PRESENT_POSITION, 4, &mut out)
            .unwrap();
        assert_eq!(out, [3000, 1000]);
    }

    #[test]
    fn test_unknown_handler() {
        let mut bus = connected();
        let err = bus.sync_write(0, &[1], &[0]).unwrap_err();
        assert_eq!(err, BusError::UnknownHandler(0));
    }

    #[test]
    fn test_center_is_zero_radians() {
        let bus = SimBus::new();
        assert_eq!(bus.value_to_radian(1, CENTER_TICKS), 0.0);
        assert_eq!(bus.radian_to_value(1, 0.0), CENTER_TICKS);
    }

    #[test]
    fn test_velocity_scale_sign() {
        let bus = SimBus::new();
        assert!(bus.value_to_velocity(1, 100) > 0.0);
        assert!(bus.value_to_velocity(1, -100) < 0.0);
        assert_eq!(bus.velocity_to_value(1, 0.0), 0);
    }
}
