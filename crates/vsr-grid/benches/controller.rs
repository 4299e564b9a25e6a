use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vsr_core::{Agent, Engine, EngineConfig, Material, Point};
use vsr_grid::{
    DistributedController, FnFunction, GridBody, GridShape, NumGridVsr, Sensor, TimedRealFunction,
};
use vsr_kinematic::KinematicSubstrate;

const N_SIGNALS: usize = 2;

fn make_vsr(side: usize) -> NumGridVsr<DistributedController> {
    let shape = GridShape::parse(&format!("box-{side}x{side}")).unwrap_or_else(|e| panic!("{e}"));
    let sensors = [Sensor::AreaRatio, Sensor::Velocity { direction: 0.0 }];
    let body = GridBody::uniform(&shape, Material::default(), &sensors);
    let functions = body.cells().map(|_, c| {
        let n_inputs = c.sensors.len() + 4 * N_SIGNALS;
        Some(Box::new(FnFunction::new(n_inputs, 1 + N_SIGNALS, |t, input, out| {
            let sum: f64 = input.iter().sum();
            out.fill((sum + t).sin());
        })) as Box<dyn TimedRealFunction>)
    });
    let controller = DistributedController::new(&body, functions, N_SIGNALS, false)
        .unwrap_or_else(|e| panic!("{e}"));
    NumGridVsr::new(body, controller).unwrap_or_else(|e| panic!("{e}"))
}

fn bench_controller(c: &mut Criterion) {
    let mut group = c.benchmark_group("vsr-grid/distributed_act");
    for &side in &[4usize, 16, 32] {
        let mut vsr = make_vsr(side);
        let mut t = 0.0;
        group.bench_with_input(BenchmarkId::from_parameter(side), &side, |b, &_side| {
            b.iter(|| {
                t += 1.0 / 60.0;
                black_box(vsr.act(t, &[]).len());
            })
        });
    }
    group.finish();
}

fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("vsr-grid/engine_tick");
    for &side in &[4usize, 8] {
        let mut engine = Engine::new(KinematicSubstrate::default(), EngineConfig::default());
        engine
            .add_embodied_agent(make_vsr(side), Some(Point::new(0.0, 1.0)))
            .unwrap_or_else(|e| panic!("{e}"));
        group.bench_with_input(BenchmarkId::from_parameter(side), &side, |b, &_side| {
            b.iter(|| {
                let snapshot = engine.tick().unwrap_or_else(|e| panic!("{e}"));
                black_box(snapshot.outcomes.len());
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_controller, bench_engine);
criterion_main!(benches);
