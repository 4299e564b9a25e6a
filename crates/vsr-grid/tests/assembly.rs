use vsr_core::{ActionKind, ActionPerformer, BoundingBox, Engine, EngineConfig, Material, Point};
use vsr_grid::{
    ConstantFunction, DistributedController, GridBody, GridShape, NumGridVsr, Sensor, SinusoidalFunction,
    TimedRealFunction,
};
use vsr_kinematic::{KinematicConfig, KinematicSubstrate};

fn engine() -> Engine<KinematicSubstrate> {
    let config = KinematicConfig {
        gravity: 0.0,
        ground_level: None,
        ..KinematicConfig::default()
    };
    Engine::new(KinematicSubstrate::new(config), EngineConfig::default())
}

#[test]
fn single_constant_voxel_actuates_after_one_tick() {
    let body = GridBody::uniform(&GridShape::parse("box-1x1").unwrap(), Material::default(), &[Sensor::AreaRatio]);
    let functions = body
        .cells()
        .map(|_, _| Some(Box::new(ConstantFunction::new(1, vec![0.5])) as Box<dyn TimedRealFunction>));
    let controller = DistributedController::new(&body, functions, 0, false).unwrap();
    assert!(controller.signals().values().all(Vec::is_empty));

    let mut engine = engine();
    let agent = engine.add_embodied_agent(NumGridVsr::new(body, controller).unwrap(), None).unwrap();
    let snapshot = engine.tick().unwrap();

    let parts = &snapshot.agents[0].body_parts;
    assert_eq!(snapshot.agents[0].id, agent);
    assert_eq!(parts.len(), 1);
    let voxel = snapshot.body(parts[0]).unwrap();
    assert_eq!(voxel.voxel_state().unwrap().actuation, 0.5);

    // Assembly outcomes carry no agent; the tick's own are the robot's.
    let own = snapshot.for_agent(agent).unwrap();
    let kinds: Vec<ActionKind> = own.outcomes.iter().map(|o| o.kind()).collect();
    assert_eq!(kinds, vec![ActionKind::SenseAreaRatio, ActionKind::ActuateVoxel]);
    assert!(snapshot.failures.is_empty());
    assert!(snapshot.nfc_messages.is_empty());
}

#[test]
fn grid_body_is_welded_and_placed() {
    let body = GridBody::uniform(&GridShape::parse("box-2x2").unwrap(), Material::default(), &[]);
    let functions = body
        .cells()
        .map(|_, _| Some(Box::new(ConstantFunction::new(0, vec![0.0])) as Box<dyn TimedRealFunction>));
    let controller = DistributedController::new(&body, functions, 0, false).unwrap();

    let mut engine = engine();
    engine
        .add_embodied_agent(NumGridVsr::new(body, controller).unwrap(), Some(Point::new(5.0, 1.0)))
        .unwrap();

    let bodies = engine.bodies();
    assert_eq!(bodies.len(), 4);
    // Two horizontal and two vertical seams, two links each.
    assert_eq!(bodies.links().len(), 8);
    let enclosing = BoundingBox::enclosing(bodies.iter().map(|b| b.bounding_box())).unwrap();
    assert_eq!(enclosing.min, Point::new(5.0, 1.0));
    assert_eq!(enclosing.max, Point::new(7.0, 3.0));
}

#[test]
fn sensed_values_flow_back_in_order() {
    let sensors = [Sensor::AreaRatio, Sensor::Velocity { direction: 0.0 }, Sensor::Angle];
    let shape = GridShape::parse("biped-3x2").unwrap();
    let body = GridBody::uniform(&shape, Material::default(), &sensors);
    let functions = body.cells().map(|k, c| {
        Some(Box::new(SinusoidalFunction {
            n_inputs: c.sensors.len(),
            n_outputs: 1,
            amplitude: 1.0,
            frequency: 1.0,
            phase: k.x as f64,
        }) as Box<dyn TimedRealFunction>)
    });
    let controller = DistributedController::new(&body, functions, 0, false).unwrap();

    let mut engine = engine();
    engine
        .add_embodied_agent(NumGridVsr::new(body, controller).unwrap(), Some(Point::ZERO))
        .unwrap();
    for _ in 0..5 {
        let snapshot = engine.tick().unwrap();
        assert!(snapshot.failures.is_empty());
        let senses = snapshot
            .outcomes
            .iter()
            .filter(|o| o.action.sense().is_some())
            .count();
        assert_eq!(senses, shape.cells().count() * sensors.len());
        assert!(snapshot
            .outcomes
            .iter()
            .filter(|o| o.kind() == ActionKind::SenseAreaRatio)
            .all(|o| o.scalar().is_some()));
    }
}
