use vsr_core::{
    Action, ActionPerformer, AnchorId, BodyId, BodyRegistry, Engine, EngineConfig, LinkType,
    Point, Poly, Substrate,
};

struct TestSubstrate;

impl Substrate for TestSubstrate {
    fn step(&mut self, _bodies: &mut BodyRegistry, _dt: f64) {}
}

/// Two unit squares side by side with a half-unit gap.
fn world() -> (Engine<TestSubstrate>, BodyId, BodyId) {
    let mut engine = Engine::new(TestSubstrate, EngineConfig::default());
    let mut square = |x: f64| {
        engine
            .perform(
                Action::CreateAndTranslateRigidBody {
                    poly: Poly::square(1.0),
                    mass: 1.0,
                    position: Point::new(x, 0.0),
                },
                None,
            )
            .unwrap()
            .body()
            .unwrap()
    };
    let a = square(0.0);
    let b = square(1.5);
    (engine, a, b)
}

fn attract_all(engine: &mut Engine<TestSubstrate>, anchors: Vec<AnchorId>, target: BodyId) -> Vec<vsr_core::LinkOutcome> {
    engine
        .perform(
            Action::AttractAndLinkAnchorable {
                anchors,
                anchorable: target,
                magnitude: 1.0,
                link_type: LinkType::Soft,
            },
            None,
        )
        .unwrap()
        .link_outcomes()
        .to_vec()
}

#[test]
fn attach_then_detach_is_symmetric() {
    let (mut engine, a, b) = world();
    let src = AnchorId::new(a, 1);
    let link = engine
        .perform(
            Action::AttachAnchor {
                anchor: src,
                anchorable: b,
                link_type: LinkType::Rigid,
            },
            None,
        )
        .unwrap()
        .link()
        .unwrap();
    assert_eq!(link.destination, AnchorId::new(b, 0));
    assert!(engine.bodies().is_anchored_to(src, link.destination));
    assert!(engine.bodies().is_anchored_to(link.destination, src));

    let detached = engine
        .perform(
            Action::DetachAnchor {
                source: link.destination,
                destination: src,
            },
            None,
        )
        .unwrap();
    assert!(!detached.is_empty());
    assert!(!engine.bodies().is_anchored_to(src, link.destination));
    assert!(!engine.bodies().is_anchored_to(link.destination, src));
}

#[test]
fn detaching_a_missing_link_is_a_silent_no_op() {
    let (mut engine, a, b) = world();
    let outcome = engine
        .perform(
            Action::DetachAnchor {
                source: AnchorId::new(a, 0),
                destination: AnchorId::new(b, 0),
            },
            None,
        )
        .unwrap();
    assert!(outcome.is_empty());
}

#[test]
fn attach_without_eligible_target_is_empty() {
    let (mut engine, a, b) = world();
    let src = AnchorId::new(a, 1);
    let attach = Action::AttachAnchor {
        anchor: src,
        anchorable: b,
        link_type: LinkType::Rigid,
    };
    for _ in 0..4 {
        assert!(engine.perform(attach.clone(), None).unwrap().link().is_some());
    }
    assert!(engine.perform(attach, None).unwrap().is_empty());
    assert_eq!(engine.bodies().attached_bodies(src), vec![b]);
}

#[test]
fn attract_and_link_matches_without_replacement() {
    let (mut engine, a, b) = world();
    let sources = engine.bodies().anchor_ids(a);
    let outcomes = attract_all(&mut engine, sources, b);
    assert_eq!(outcomes.len(), 4);
    let mut destinations: Vec<AnchorId> = outcomes.iter().map(|o| o.destination).collect();
    destinations.sort();
    destinations.dedup();
    assert_eq!(destinations.len(), 4);
    assert!(outcomes.iter().all(|o| o.link.is_some()));
    assert!((outcomes[0].distance - 1.5).abs() < 1e-9);
    assert_eq!(engine.bodies().links().len(), 4);
}

#[test]
fn attract_and_link_is_idempotent() {
    let (mut engine, a, b) = world();
    let sources = engine.bodies().anchor_ids(a);
    attract_all(&mut engine, sources.clone(), b);
    let before = engine.bodies().links();
    let again = attract_all(&mut engine, sources, b);
    assert!(again.is_empty());
    assert_eq!(engine.bodies().links(), before);
}

#[test]
fn attract_and_link_depends_only_on_order_and_geometry() {
    let pairs = |reverse: bool| {
        let (mut engine, a, b) = world();
        let mut sources = engine.bodies().anchor_ids(a);
        if reverse {
            sources.reverse();
        }
        let mut pairs: Vec<(u16, u16)> = attract_all(&mut engine, sources, b)
            .iter()
            .map(|o| (o.source.index, o.destination.index))
            .collect();
        pairs.sort();
        pairs
    };
    assert_eq!(pairs(false), pairs(false));
    assert_eq!(pairs(false)[0], (0, 0));
    assert_ne!(pairs(true)[0], (0, 0));
}

#[test]
fn detach_anchors_from_anchorable_collects_each_detach() {
    let (mut engine, a, b) = world();
    let sources = engine.bodies().anchor_ids(a);
    attract_all(&mut engine, sources, b);
    let outcome = engine
        .perform(Action::DetachAnchorsFromAnchorable { source: a, target: b }, None)
        .unwrap();
    assert_eq!(outcome.links().len(), 4);
    assert!(engine.bodies().links().is_empty());
}
