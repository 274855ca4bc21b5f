//! The control-loop driver.
//!
//! One cycle relays state outward and commands inward: read the chain,
//! convert to engineering units, publish telemetry, read the active
//! command, convert to raw, write the chain, advance the frame counter.
//! No control law runs here; the loop is a synchronization relay.
//!
//! Failure policy at steady state: a failed batched write drops that
//! cycle's command (logged, counted) and the loop continues; read
//! failures leave slots stale for the cycle (handled inside the batch
//! engine). There is no reconnection; a persistent fault degrades to
//! per-cycle warnings until the process is restarted.

use crate::batch::{BatchEngine, WriteChannel};
use crate::convert::UnitConverter;
use crate::timing::IntervalTimer;
use dxl_common::bus::ServoBus;
use dxl_common::config::CommandMode;
use dxl_common::error::BridgeError;
use dxl_common::interchange::Interchange;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Cycles between interval-statistics log lines (and stat resets).
const STATS_EVERY: u64 = 100;

/// Fixed-period bus↔interchange relay.
pub struct ControlLoop {
    engine: BatchEngine,
    converter: UnitConverter,
    timer: IntervalTimer,
    mode: CommandMode,

    // Persistent cycle buffers; raw vectors keep their previous values so
    // a failed group read leaves its slots stale rather than zeroed.
    raw_pos: Vec<i32>,
    raw_vel: Vec<i32>,
    raw_cur: Vec<i32>,
    pos_f: Vec<f64>,
    vel_f: Vec<f64>,
    torque_f: Vec<f64>,
    cmd_f: Vec<f64>,
    cmd_raw: Vec<i32>,

    cycles: u64,
    dropped_commands: u64,
}

impl ControlLoop {
    /// Build the loop over an initialized engine.
    pub fn new(
        engine: BatchEngine,
        converter: UnitConverter,
        timer: IntervalTimer,
        mode: CommandMode,
    ) -> Self {
        let n = engine.len();
        Self {
            engine,
            converter,
            timer,
            mode,
            raw_pos: vec![0; n],
            raw_vel: vec![0; n],
            raw_cur: vec![0; n],
            pos_f: vec![0.0; n],
            vel_f: vec![0.0; n],
            torque_f: vec![0.0; n],
            cmd_f: vec![0.0; n],
            cmd_raw: vec![0; n],
            cycles: 0,
            dropped_commands: 0,
        }
    }

    /// Cycles executed so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Commands dropped by failed batched writes.
    pub fn dropped_commands(&self) -> u64 {
        self.dropped_commands
    }

    /// One-time pass before the loop: read the chain, publish telemetry,
    /// and seed the active command channel with the present state so the
    /// first cycle commands the current posture instead of zeros.
    pub fn seed(
        &mut self,
        bus: &mut dyn ServoBus,
        shm: &mut dyn Interchange,
    ) -> Result<(), BridgeError> {
        self.read_and_publish(bus, shm)?;

        match self.mode {
            CommandMode::Position => shm.write_position_command(&self.pos_f)?,
            CommandMode::Velocity => shm.write_velocity_command(&self.vel_f)?,
        }
        shm.reset_frame();
        info!("Command channel seeded from present state");
        Ok(())
    }

    /// Run until `running` is cleared.
    pub fn run(
        &mut self,
        bus: &mut dyn ServoBus,
        shm: &mut dyn Interchange,
        running: &AtomicBool,
    ) -> Result<(), BridgeError> {
        info!(
            "Control loop starting (period {:?}, {} actuators)",
            self.timer.period(),
            self.engine.len()
        );
        self.timer.start();

        while running.load(Ordering::SeqCst) {
            self.step(bus, shm)?;
        }

        info!(
            "Control loop stopped after {} cycles ({} commands dropped)",
            self.cycles, self.dropped_commands
        );
        Ok(())
    }

    /// One full cycle: sleep to the next period boundary, then relay.
    pub fn step(
        &mut self,
        bus: &mut dyn ServoBus,
        shm: &mut dyn Interchange,
    ) -> Result<(), BridgeError> {
        self.timer.sleep_until_next();
        self.timer.sync();

        // Telemetry out. Read always happens before the new command goes
        // out, so the published state never reflects this cycle's write.
        self.read_and_publish(bus, shm)?;

        // Command in.
        match self.mode {
            CommandMode::Position => {
                shm.read_position_command(&mut self.cmd_f)?;
                self.converter
                    .radians_to_raw(&*bus, &self.cmd_f, &mut self.cmd_raw)?;
                if let Err(e) =
                    self.engine
                        .write_batch(bus, WriteChannel::GoalPosition, &self.cmd_raw)
                {
                    warn!("Position command dropped this cycle: {e}");
                    self.dropped_commands += 1;
                }
            }
            CommandMode::Velocity => {
                shm.read_velocity_command(&mut self.cmd_f)?;
                self.converter
                    .velocities_to_raw(&*bus, &self.cmd_f, &mut self.cmd_raw)?;
                if let Err(e) =
                    self.engine
                        .write_batch(bus, WriteChannel::GoalVelocity, &self.cmd_raw)
                {
                    warn!("Velocity command dropped this cycle: {e}");
                    self.dropped_commands += 1;
                }
            }
        }

        shm.increment_frame();
        self.cycles += 1;

        if self.cycles % STATS_EVERY == 0 {
            debug!(
                "cycle {}: max interval {:?}, read faults {}",
                self.cycles,
                self.timer.max_interval(),
                self.engine.read_faults()
            );
            self.timer.reset();
        }

        Ok(())
    }

    fn read_and_publish(
        &mut self,
        bus: &mut dyn ServoBus,
        shm: &mut dyn Interchange,
    ) -> Result<(), BridgeError> {
        self.engine.read_batch(
            bus,
            &mut self.raw_pos,
            &mut self.raw_vel,
            &mut self.raw_cur,
        )?;

        self.converter
            .raw_to_radians(&*bus, &self.raw_pos, &mut self.pos_f)?;
        self.converter
            .raw_to_velocities(&*bus, &self.raw_vel, &mut self.vel_f)?;
        self.converter
            .raw_to_torques(&*bus, &self.raw_cur, &mut self.torque_f)?;

        shm.write_position_current(&self.pos_f)?;
        shm.write_velocity_current(&self.vel_f)?;
        shm.write_torque_current(&self.torque_f)?;
        Ok(())
    }
}
