use vsr_core::{Action, ActionOutcome, ActionValue, Agent, BodyId, Material};
use vsr_grid::{
    ActuationController, CentralizedController, ConstantFunction, DistributedController, FnFunction,
    Grid, GridBody, GridError, GridShape, Key, NumGridVsr, Sensor, TimedRealFunction,
};

fn body(shape: &str, sensors: &[Sensor]) -> GridBody {
    GridBody::uniform(&GridShape::parse(shape).unwrap(), Material::default(), sensors)
}

fn brains(body: &GridBody, f: impl Fn(Key) -> Box<dyn TimedRealFunction>) -> Grid<Box<dyn TimedRealFunction>> {
    body.cells().map(|k, _| Some(f(k)))
}

#[test]
fn arity_is_checked_at_construction() {
    let body = body("box-1x1", &[Sensor::AreaRatio]);

    let wrong_inputs = brains(&body, |_| Box::new(ConstantFunction::new(2, vec![0.0, 0.0])));
    let err = DistributedController::new(&body, wrong_inputs, 1, false).err();
    assert_eq!(
        err,
        Some(GridError::DimensionMismatch {
            cell: Some(Key::new(0, 0)),
            expected_inputs: 5,
            expected_outputs: 2,
            found_inputs: 2,
            found_outputs: 2,
        })
    );

    let wrong_outputs = brains(&body, |_| Box::new(ConstantFunction::new(5, vec![0.0; 5])));
    assert!(matches!(
        DistributedController::new(&body, wrong_outputs, 1, false),
        Err(GridError::DimensionMismatch { .. })
    ));

    let directional = brains(&body, |_| Box::new(ConstantFunction::new(5, vec![0.0; 5])));
    assert!(DistributedController::new(&body, directional, 1, true).is_ok());
}

#[test]
fn every_occupied_cell_needs_a_brain() {
    let body = body("box-2x1", &[]);
    let mut functions = brains(&body, |_| Box::new(ConstantFunction::new(0, vec![0.0])));
    functions.set(Key::new(1, 0), None);
    assert_eq!(
        DistributedController::new(&body, functions, 0, false).err(),
        Some(GridError::MissingFunction { cell: Key::new(1, 0) })
    );

    let small: Grid<Box<dyn TimedRealFunction>> = Grid::new(1, 1);
    assert!(matches!(
        DistributedController::new(&body, small, 0, false),
        Err(GridError::ShapeMismatch { .. })
    ));
}

#[test]
fn robot_rejects_a_body_its_controller_was_not_built_for() {
    let bare = body("box-2x1", &[]);
    let functions = brains(&bare, |_| Box::new(ConstantFunction::new(0, vec![0.5])));
    let controller = DistributedController::new(&bare, functions, 0, false).unwrap();

    let sensed = body("box-2x1", &[Sensor::AreaRatio, Sensor::Angle]);
    assert_eq!(
        NumGridVsr::new(sensed, controller).err(),
        Some(GridError::DimensionMismatch {
            cell: Some(Key::new(0, 0)),
            expected_inputs: 2,
            expected_outputs: 1,
            found_inputs: 0,
            found_outputs: 1,
        })
    );

    let functions = brains(&bare, |_| Box::new(ConstantFunction::new(0, vec![0.5])));
    let controller = DistributedController::new(&bare, functions, 0, false).unwrap();
    assert!(matches!(
        NumGridVsr::new(body("box-3x1", &[]), controller).err(),
        Some(GridError::ShapeMismatch { .. })
    ));

    let central = CentralizedController::new(&bare, Box::new(ConstantFunction::new(0, vec![0.0; 2]))).unwrap();
    assert!(matches!(
        NumGridVsr::new(body("box-2x1", &[Sensor::AreaRatio]), central).err(),
        Some(GridError::DimensionMismatch { cell: None, .. })
    ));
}

#[test]
fn signals_arrive_exactly_one_tick_later() {
    let body = body("box-2x1", &[]);
    let functions = brains(&body, |k| {
        if k == Key::new(0, 0) {
            // Starts talking at t = 1.
            Box::new(FnFunction::new(4, 2, |t, _, out| {
                out[0] = 0.0;
                out[1] = if t >= 1.0 { 0.7 } else { 0.0 };
            }))
        } else {
            Box::new(ConstantFunction::new(4, vec![0.0, 0.0]))
        }
    });
    let controller = DistributedController::new(&body, functions, 1, false).unwrap();
    let mut vsr = NumGridVsr::new(body, controller).unwrap();

    // West block of cell (1,0) sits at index 3.
    let west_of_right = |vsr: &NumGridVsr<DistributedController>| vsr.brain_ios()[1].inputs.values[3];

    vsr.act(0.0, &[]);
    assert_eq!(west_of_right(&vsr), 0.0);
    vsr.act(1.0, &[]);
    assert_eq!(west_of_right(&vsr), 0.0);
    vsr.act(2.0, &[]);
    assert_eq!(west_of_right(&vsr), 0.7);
    // The sender's own east block only ever sees the silent right cell.
    assert_eq!(vsr.brain_ios()[0].inputs.values[1], 0.0);
}

#[test]
fn directional_signals_are_sliced_per_side() {
    let body = body("box-2x1", &[]);
    let functions = brains(&body, |k| {
        let out = if k == Key::new(0, 0) {
            vec![0.0, 0.1, 0.2, 0.3, 0.4]
        } else {
            vec![0.0, -0.1, -0.2, -0.3, -0.4]
        };
        Box::new(ConstantFunction::new(4, out))
    });
    let controller = DistributedController::new(&body, functions, 1, true).unwrap();
    let mut vsr = NumGridVsr::new(body, controller).unwrap();
    vsr.act(0.0, &[]);
    vsr.act(1.0, &[]);
    let ios = vsr.brain_ios();
    // Left cell: N, E, S, W blocks; only E (the right cell, slice 1) is present.
    assert_eq!(ios[0].inputs.values, vec![0.0, -0.2, 0.0, 0.0]);
    // Right cell: only W (the left cell, slice 3) is present.
    assert_eq!(ios[1].inputs.values, vec![0.0, 0.0, 0.0, 0.4]);
}

#[test]
fn readings_are_normalized_and_outputs_clipped() {
    let body = body("box-1x1", &[Sensor::Velocity { direction: 0.0 }]);
    let functions = brains(&body, |_| Box::new(ConstantFunction::new(1, vec![3.0])));
    let controller = DistributedController::new(&body, functions, 0, false).unwrap();
    let mut vsr = NumGridVsr::new(body, controller).unwrap();
    let voxel = BodyId {
        index: 0,
        generation: 0,
    };
    let reading = |value: Option<f64>| {
        vec![ActionOutcome::new(
            None,
            Action::sense_velocity(voxel, 0.0),
            value.map(ActionValue::Scalar),
        )]
    };

    let cell = Key::new(0, 0);
    for (raw, expected) in [(Some(10.0), 1.0), (Some(-10.0), -1.0), (Some(25.0), 1.0), (Some(5.0), 0.5), (None, 0.0)] {
        vsr.act(0.0, &reading(raw));
        assert_eq!(vsr.inputs().get(cell), Some(&vec![expected]), "raw {raw:?}");
    }
    assert_eq!(vsr.outputs().get(cell), Some(&1.0));
}

#[test]
fn non_sense_outcomes_do_not_consume_slots() {
    let body = body("box-2x1", &[Sensor::AreaRatio]);
    let functions = brains(&body, |_| Box::new(ConstantFunction::new(1, vec![0.0])));
    let controller = DistributedController::new(&body, functions, 0, false).unwrap();
    let mut vsr = NumGridVsr::new(body, controller).unwrap();
    let voxel = BodyId {
        index: 0,
        generation: 0,
    };
    let previous = vec![
        ActionOutcome::new(None, Action::sense_area_ratio(voxel), Some(ActionValue::Scalar(1.5))),
        ActionOutcome::new(
            None,
            Action::ActuateVoxel { voxel, value: 0.0 },
            Some(ActionValue::Scalar(0.0)),
        ),
        ActionOutcome::new(None, Action::sense_area_ratio(voxel), Some(ActionValue::Scalar(0.5))),
    ];
    vsr.act(0.0, &previous);
    assert_eq!(vsr.inputs().get(Key::new(0, 0)), Some(&vec![1.0]));
    assert_eq!(vsr.inputs().get(Key::new(1, 0)), Some(&vec![-1.0]));
}

#[test]
fn centralized_brain_sees_every_cell() {
    let body = body("box-2x1", &[Sensor::AreaRatio]);
    let swap = FnFunction::new(2, 2, |_, input, out| {
        out[0] = input[1];
        out[1] = input[0];
    });
    assert!(CentralizedController::new(&body, Box::new(ConstantFunction::new(1, vec![0.0; 2]))).is_err());
    let mut controller = CentralizedController::new(&body, Box::new(swap)).unwrap();

    let inputs = Grid::from_fn(2, 1, |k| Some(vec![if k.x == 0 { 0.25 } else { -0.5 }]));
    let mut outputs = Grid::from_fn(2, 1, |_| Some(0.0));
    controller.compute(0.0, &inputs, &mut outputs);
    assert_eq!(outputs.get(Key::new(0, 0)), Some(&-0.5));
    assert_eq!(outputs.get(Key::new(1, 0)), Some(&0.25));
    assert_eq!(controller.brain_ios()[0].inputs.values, vec![0.25, -0.5]);
}
