//! Batch engine scatter/gather benchmark over the software backend.

use criterion::{Criterion, criterion_group, criterion_main};
use dxl_bridge::batch::{BatchEngine, WriteChannel};
use dxl_bridge::bus_backends::sim::SimBus;
use dxl_bridge::groups::GroupPlan;
use dxl_bridge::init::InitSequencer;
use dxl_bridge::registry::{ActuatorRecord, ActuatorRegistry};
use std::hint::black_box;

fn setup(n: u8, groups: u8) -> (BatchEngine, SimBus) {
    let mut registry = ActuatorRegistry::new();
    for id in 1..=n {
        registry
            .register(ActuatorRecord {
                id,
                group: format!("seg{}", id % groups),
                settings: Vec::new(),
            })
            .unwrap();
    }

    let mut bus = SimBus::new();
    let mut sequencer = InitSequencer::new(&registry, "bench", 1_000_000);
    let table = sequencer.run(&mut bus).unwrap();

    let plan = GroupPlan::build(&registry);
    let engine = BatchEngine::new(&registry, plan, table).unwrap();
    (engine, bus)
}

fn bench_write_batch(c: &mut Criterion) {
    let (mut engine, mut bus) = setup(24, 3);
    let values = vec![2048; 24];

    c.bench_function("write_batch_24_actuators_3_groups", |b| {
        b.iter(|| {
            engine
                .write_batch(&mut bus, WriteChannel::GoalPosition, black_box(&values))
                .unwrap()
        })
    });
}

fn bench_read_batch(c: &mut Criterion) {
    let (mut engine, mut bus) = setup(24, 3);
    let mut pos = vec![0; 24];
    let mut vel = vec![0; 24];
    let mut cur = vec![0; 24];

    c.bench_function("read_batch_24_actuators_3_groups", |b| {
        b.iter(|| {
            engine
                .read_batch(&mut bus, &mut pos, &mut vel, &mut cur)
                .unwrap();
            black_box(&pos);
        })
    });
}

criterion_group!(benches, bench_write_batch, bench_read_batch);
criterion_main!(benches);
