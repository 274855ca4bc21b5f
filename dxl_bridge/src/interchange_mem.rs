//! In-process interchange implementation.
//!
//! Backs the [`Interchange`] trait with plain vectors and a frame counter.
//! Used by the simulation path and by tests; a real deployment plugs in an
//! external crate that puts the same surface over POSIX shared memory.

use dxl_common::config::ChannelSet;
use dxl_common::error::BridgeError;
use dxl_common::interchange::Interchange;

/// Vector-backed interchange for one process.
#[derive(Debug)]
pub struct MemoryInterchange {
    n: usize,
    channels: ChannelSet,
    open: bool,
    header_written: bool,
    frame: u64,
    position_current: Vec<f64>,
    velocity_current: Vec<f64>,
    torque_current: Vec<f64>,
    position_command: Vec<f64>,
    velocity_command: Vec<f64>,
}

impl MemoryInterchange {
    /// Create an interchange for `n` slots carrying the given channels.
    pub fn new(n: usize, channels: ChannelSet) -> Self {
        Self {
            n,
            channels,
            open: false,
            header_written: false,
            frame: 0,
            position_current: vec![0.0; n],
            velocity_current: vec![0.0; n],
            torque_current: vec![0.0; n],
            position_command: vec![0.0; n],
            velocity_command: vec![0.0; n],
        }
    }

    /// Published present positions (rad).
    pub fn position_current(&self) -> &[f64] {
        &self.position_current
    }

    /// Published present velocities (rad/s).
    pub fn velocity_current(&self) -> &[f64] {
        &self.velocity_current
    }

    /// Published present torques.
    pub fn torque_current(&self) -> &[f64] {
        &self.torque_current
    }

    /// Current position command slots.
    pub fn position_command(&self) -> &[f64] {
        &self.position_command
    }

    /// Current velocity command slots.
    pub fn velocity_command(&self) -> &[f64] {
        &self.velocity_command
    }

    /// Whether the header has been written since opening.
    pub fn header_written(&self) -> bool {
        self.header_written
    }

    fn check_open(&self) -> Result<(), BridgeError> {
        if !self.open {
            return Err(BridgeError::Interchange("segment not open".to_string()));
        }
        Ok(())
    }

    fn check_len(&self, got: usize) -> Result<(), BridgeError> {
        if got != self.n {
            return Err(BridgeError::LengthMismatch { expected: self.n, got });
        }
        Ok(())
    }

    fn check_channel(&self, channel: ChannelSet, name: &str) -> Result<(), BridgeError> {
        if !self.channels.contains(channel) {
            return Err(BridgeError::Interchange(format!(
                "channel {name} is not configured"
            )));
        }
        Ok(())
    }
}

impl Interchange for MemoryInterchange {
    fn open(&mut self, _create: bool) -> Result<(), BridgeError> {
        self.open = true;
        Ok(())
    }

    fn write_header(&mut self) -> Result<(), BridgeError> {
        self.check_open()?;
        self.header_written = true;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn write_position_current(&mut self, values: &[f64]) -> Result<(), BridgeError> {
        self.check_open()?;
        self.check_len(values.len())?;
        self.position_current.copy_from_slice(values);
        Ok(())
    }

    fn write_velocity_current(&mut self, values: &[f64]) -> Result<(), BridgeError> {
        self.check_open()?;
        self.check_len(values.len())?;
        self.velocity_current.copy_from_slice(values);
        Ok(())
    }

    fn write_torque_current(&mut self, values: &[f64]) -> Result<(), BridgeError> {
        self.check_open()?;
        self.check_len(values.len())?;
        self.torque_current.copy_from_slice(values);
        Ok(())
    }

    fn read_position_command(&mut self, out: &mut [f64]) -> Result<(), BridgeError> {
        self.check_open()?;
        self.check_len(out.len())?;
        self.check_channel(ChannelSet::POSITION_COMMAND, "PositionCommand")?;
        out.copy_from_slice(&self.position_command);
        Ok(())
    }

    fn read_velocity_command(&mut self, out: &mut [f64]) -> Result<(), BridgeError> {
        self.check_open()?;
        self.check_len(out.len())?;
        self.check_channel(ChannelSet::VELOCITY_COMMAND, "VelocityCommand")?;
        out.copy_from_slice(&self.velocity_command);
        Ok(())
    }

    fn write_position_command(&mut self, values: &[f64]) -> Result<(), BridgeError> {
        self.check_open()?;
        self.check_len(values.len())?;
        self.check_channel(ChannelSet::POSITION_COMMAND, "PositionCommand")?;
        self.position_command.copy_from_slice(values);
        Ok(())
    }

    fn write_velocity_command(&mut self, values: &[f64]) -> Result<(), BridgeError> {
        self.check_open()?;
        self.check_len(values.len())?;
        self.check_channel(ChannelSet::VELOCITY_COMMAND, "VelocityCommand")?;
        self.velocity_command.copy_from_slice(values);
        Ok(())
    }

    fn reset_frame(&mut self) {
        self.frame = 0;
    }

    fn increment_frame(&mut self) {
        self.frame += 1;
    }

    fn frame(&self) -> u64 {
        self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_open() {
        let mut shm = MemoryInterchange::new(2, ChannelSet::POSITION_COMMAND);
        assert!(!shm.is_open());
        assert!(shm.write_position_current(&[0.0, 0.0]).is_err());

        shm.open(true).unwrap();
        shm.write_header().unwrap();
        assert!(shm.is_open());
        assert!(shm.header_written());
        assert!(shm.write_position_current(&[0.1, 0.2]).is_ok());
        assert_eq!(shm.position_current(), &[0.1, 0.2]);
    }

    #[test]
    fn test_length_enforced() {
        let mut shm = MemoryInterchange::new(3, ChannelSet::POSITION_COMMAND);
        shm.open(true).unwrap();
        assert!(matches!(
            shm.write_position_current(&[0.0; 2]).unwrap_err(),
            BridgeError::LengthMismatch { expected: 3, got: 2 }
        ));
    }

    #[test]
    fn test_unconfigured_channel_rejected() {
        let mut shm = MemoryInterchange::new(1, ChannelSet::POSITION_COMMAND);
        shm.open(true).unwrap();
        let mut out = [0.0];
        assert!(shm.read_velocity_command(&mut out).is_err());
        assert!(shm.read_position_command(&mut out).is_ok());
    }

    #[test]
    fn test_command_round_trip() {
        let mut shm = MemoryInterchange::new(2, ChannelSet::VELOCITY_COMMAND);
        shm.open(true).unwrap();
        shm.write_velocity_command(&[1.5, -2.5]).unwrap();
        let mut out = [0.0; 2];
        shm.read_velocity_command(&mut out).unwrap();
        assert_eq!(out, [1.5, -2.5]);
    }

    #[test]
    fn test_frame_counter() {
        let mut shm = MemoryInterchange::new(1, ChannelSet::POSITION_COMMAND);
        shm.open(true).unwrap();
        assert_eq!(shm.frame(), 0);
        shm.increment_frame();
        shm.increment_frame();
        assert_eq!(shm.frame(), 2);
        shm.reset_frame();
        assert_eq!(shm.frame(), 0);
    }
}
