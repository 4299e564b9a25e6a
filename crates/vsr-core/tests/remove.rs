use vsr_core::{
    Action, ActionError, ActionKind, ActionPerformer, AnchorId, BodyRegistry, Engine,
    EngineConfig, LinkType, Material, Point, Substrate,
};

struct TestSubstrate;

impl Substrate for TestSubstrate {
    fn step(&mut self, _bodies: &mut BodyRegistry, _dt: f64) {}
}

fn voxel_at(engine: &mut Engine<TestSubstrate>, x: f64) -> vsr_core::BodyId {
    engine
        .perform(
            Action::CreateAndTranslateVoxel {
                side_length: 1.0,
                mass: 1.0,
                material: Material::default(),
                position: Point::new(x, 0.0),
            },
            None,
        )
        .unwrap()
        .body()
        .unwrap()
}

#[test]
fn removal_detaches_first_and_fails_the_second_time() {
    let mut engine = Engine::new(TestSubstrate, EngineConfig::default());
    let left = voxel_at(&mut engine, 0.0);
    let middle = voxel_at(&mut engine, 1.0);
    let right = voxel_at(&mut engine, 2.0);
    for (anchor, target) in [(AnchorId::new(left, 1), middle), (AnchorId::new(right, 0), middle)] {
        engine
            .perform(
                Action::AttachAnchor {
                    anchor,
                    anchorable: target,
                    link_type: LinkType::Rigid,
                },
                None,
            )
            .unwrap()
            .link()
            .unwrap();
    }
    let performed_before = engine.snapshot().outcomes.len();

    let removed = engine.perform(Action::RemoveBody { body: middle }, None).unwrap();
    assert_eq!(removed.body(), Some(middle));
    assert!(!engine.bodies().contains(middle));
    assert!(engine.bodies().links().is_empty());

    let snapshot = engine.snapshot();
    let during: Vec<_> = snapshot.outcomes[performed_before..].iter().collect();
    let detaches: Vec<_> = during
        .iter()
        .filter(|o| o.kind() == ActionKind::DetachAnchorFromAnchorable)
        .collect();
    assert_eq!(detaches.len(), 2);
    assert!(detaches.iter().all(|o| o.links().len() == 1));
    assert_eq!(during.last().map(|o| o.kind()), Some(ActionKind::RemoveBody));

    let err = engine.perform(Action::RemoveBody { body: middle }, None).unwrap_err();
    assert_eq!(
        err,
        ActionError::UnknownBody {
            kind: ActionKind::RemoveBody,
            body: middle
        }
    );
}

#[test]
fn freed_slot_is_reused_with_a_new_generation() {
    let mut engine = Engine::new(TestSubstrate, EngineConfig::default());
    let first = voxel_at(&mut engine, 0.0);
    engine.perform(Action::RemoveBody { body: first }, None).unwrap();
    let second = voxel_at(&mut engine, 0.0);
    assert_eq!(first.index, second.index);
    assert_ne!(first, second);
    assert!(engine
        .perform(
            Action::ActuateVoxel {
                voxel: first,
                value: 0.5
            },
            None
        )
        .is_err());
}
