//! End-to-end bridge tests over the software bus backend.
//!
//! Exercises the whole path a deployment uses: TOML config → registry →
//! group plan → bring-up → batch engine → control loop → interchange.

use dxl_bridge::batch::BatchEngine;
use dxl_bridge::bus_backends::sim::SimBus;
use dxl_bridge::convert::UnitConverter;
use dxl_bridge::cycle::ControlLoop;
use dxl_bridge::groups::GroupPlan;
use dxl_bridge::init::{BridgeStage, InitSequencer};
use dxl_bridge::interchange_mem::MemoryInterchange;
use dxl_bridge::registry::ActuatorRegistry;
use dxl_bridge::timing::IntervalTimer;
use dxl_common::bus::ServoBus;
use dxl_common::config::BridgeConfig;
use dxl_common::interchange::Interchange;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

const CONFIG: &str = r#"
    [hardware]
    port_name = "/dev/ttyUSB0"
    baud_rate = 1000000
    period_s = 0.0005

    [interchange]
    shm_key = 8888
    hash = 255
    channels = ["PositionCommand", "MotorCurrent"]

    [[joint]]
    ID = 1
    CommunicationGroupName = "upper"

    [joint.DynamixelSettings]
    Return_Delay_Time = 0
    Operating_Mode = 3

    [[joint]]
    ID = 2
    CommunicationGroupName = "lower"

    [[joint]]
    ID = 3
    CommunicationGroupName = "upper"
"#;

struct Harness {
    control_loop: ControlLoop,
    bus: SimBus,
    shm: MemoryInterchange,
}

fn bring_up() -> Harness {
    let config: BridgeConfig = toml::from_str(CONFIG).unwrap();
    config.validate().unwrap();

    let registry = ActuatorRegistry::from_config(&config).unwrap();
    let plan = GroupPlan::build(&registry);

    let mut bus = SimBus::new();
    let mut sequencer = InitSequencer::new(
        &registry,
        &config.hardware.port_name,
        config.hardware.baud_rate,
    );
    let table = sequencer.run(&mut bus).unwrap();
    assert_eq!(sequencer.stage(), BridgeStage::Ready);

    let engine = BatchEngine::new(&registry, plan, table).unwrap();
    let converter = UnitConverter::new(&registry);
    let timer = IntervalTimer::new(Duration::from_secs_f64(config.hardware.period_s));

    let channels = config.channels().unwrap();
    let mode = channels.command_mode().unwrap();
    let mut shm = MemoryInterchange::new(registry.len(), channels);
    shm.open(true).unwrap();
    shm.write_header().unwrap();
    shm.reset_frame();

    Harness {
        control_loop: ControlLoop::new(engine, converter, timer, mode),
        bus,
        shm,
    }
}

#[test]
fn test_config_drives_partition() {
    let config: BridgeConfig = toml::from_str(CONFIG).unwrap();
    let registry = ActuatorRegistry::from_config(&config).unwrap();
    let plan = GroupPlan::build(&registry);

    assert_eq!(plan.len(), 2);
    assert_eq!(plan.groups()[0].name, "upper");
    assert_eq!(plan.groups()[0].member_ids, vec![1, 3]);
    assert_eq!(plan.groups()[1].name, "lower");
    assert_eq!(plan.groups()[1].member_ids, vec![2]);
    assert_eq!(plan.group_of(2), Some("lower"));
}

#[test]
fn test_bring_up_writes_settings() {
    let h = bring_up();
    assert_eq!(h.bus.register_value(1, "Return_Delay_Time"), Some(0));
    assert_eq!(h.bus.register_value(1, "Operating_Mode"), Some(3));
    assert_eq!(h.bus.register_value(2, "Operating_Mode"), None);

    // Torque re-enabled after the settings pass.
    assert_eq!(h.bus.torque_enabled(1), Some(true));
    assert_eq!(h.bus.torque_enabled(3), Some(true));
}

#[test]
fn test_command_relay_end_to_end() {
    let mut h = bring_up();
    h.bus.set_present_position(1, 2148);
    h.bus.set_present_position(2, 1948);

    h.control_loop.seed(&mut h.bus, &mut h.shm).unwrap();

    // Seeded command equals the published posture.
    assert_eq!(h.shm.position_command(), h.shm.position_current());

    // The control process moves slot 1 (ID 2) to +1 rad.
    let mut cmd = h.shm.position_command().to_vec();
    cmd[1] = 1.0;
    h.shm.write_position_command(&cmd).unwrap();

    for _ in 0..3 {
        h.control_loop.step(&mut h.bus, &mut h.shm).unwrap();
    }

    let expected = h.bus.radian_to_value(2, 1.0);
    assert_eq!(h.bus.goal_position(2), Some(expected));
    assert_eq!(h.shm.frame(), 3);
    assert_eq!(h.control_loop.dropped_commands(), 0);

    // Telemetry converged on the commanded posture.
    let step = std::f64::consts::TAU / 4096.0;
    assert!((h.shm.position_current()[1] - 1.0).abs() <= step);
}

#[test]
fn test_run_stops_on_flag() {
    let mut h = bring_up();
    h.control_loop.seed(&mut h.bus, &mut h.shm).unwrap();

    let running = Arc::new(AtomicBool::new(true));
    let stopper = Arc::clone(&running);
    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        stopper.store(false, Ordering::SeqCst);
    });

    h.control_loop
        .run(&mut h.bus, &mut h.shm, &running)
        .unwrap();
    handle.join().unwrap();

    assert!(h.control_loop.cycles() > 0);
    assert_eq!(h.shm.frame(), h.control_loop.cycles());
}

#[test]
fn test_load_config_entry_path() {
    use std::io::Write;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();

    let config = dxl_common::config::load_config(file.path()).unwrap();
    assert_eq!(config.joints.len(), 3);
    assert_eq!(config.channels().unwrap().command_mode().unwrap(),
        dxl_common::config::CommandMode::Position);
}

#[test]
fn test_torque_telemetry_uses_current_scale() {
    let mut h = bring_up();
    h.bus.set_present_current(3, 100);

    h.control_loop.seed(&mut h.bus, &mut h.shm).unwrap();

    let torque = h.shm.torque_current()[2];
    let current = h.bus.value_to_current(3, 100);
    assert_eq!(torque, current);
}
