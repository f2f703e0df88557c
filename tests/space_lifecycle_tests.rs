use particle_accelerator_2d::{
    Body, CollisionFilter, Constraint, IndexStrategy, Shape, Space, SpaceConfig, Vect, BB,
};

fn make_space() -> Space {
    let mut space = Space::new();
    space.set_gravity(Vect::new(0.0, -100.0));
    space
}

#[test]
fn test_body_lifecycle() {
    let mut space = make_space();
    let id = space.add_body(Body::new(1.0, 1.0));
    assert!(space.contains_body(id));
    assert_eq!(space.body(id).and_then(Body::space), Some(space.id()));

    space.remove_body(id);
    assert!(!space.contains_body(id));
    assert!(space.body(id).is_some_and(Body::is_rogue));

    let body = space.free_body(id);
    assert!(body.id().is_none());
    assert!(space.body(id).is_none(), "stale handles no longer resolve");
}

#[test]
fn test_rogue_body_is_not_simulated() {
    let mut space = make_space();
    let rogue = space.insert_rogue_body(Body::new(1.0, 1.0));
    for _ in 0..10 {
        space.step(1.0 / 60.0);
    }
    assert_eq!(space.body(rogue).map(|b| b.p), Some(Vect::ZERO));

    space.simulate_body(rogue);
    space.step(1.0 / 60.0);
    assert!(space.body(rogue).is_some_and(|b| b.p.y < 0.0));
}

#[test]
fn test_shape_lifecycle() {
    let mut space = make_space();
    let body = space.add_body(Body::new(1.0, 1.0));
    let shape = space.add_shape(Shape::circle(body, 1.0, Vect::ZERO));
    assert!(space.contains_shape(shape));
    assert_eq!(space.point_query(Vect::ZERO, CollisionFilter::ALL), vec![shape]);
    let (from, to) = (Vect::new(-5.0, 0.0), Vect::new(5.0, 0.0));
    let around = BB::new(-2.0, -2.0, 2.0, 2.0);
    assert_eq!(space.segment_query(from, to, CollisionFilter::ALL).len(), 1);
    assert_eq!(space.bb_query(around, CollisionFilter::ALL), vec![shape]);

    let removed = space.remove_shape(shape);
    assert!(removed.id().is_none());
    assert!(removed.space().is_none());
    assert!(!space.contains_shape(shape));
    assert!(space.point_query(Vect::ZERO, CollisionFilter::ALL).is_empty());
    assert!(space.segment_query(from, to, CollisionFilter::ALL).is_empty());
    assert!(space.bb_query(around, CollisionFilter::ALL).is_empty());

    // A removed shape can be added again under a fresh id.
    let again = space.add_shape(removed);
    assert_ne!(again, shape);
}

#[test]
fn test_static_shapes_use_the_static_index() {
    let mut space = make_space();
    let ground = space.static_body();
    let segment = space.add_shape(Shape::segment(ground, Vect::new(-5.0, 0.0), Vect::new(5.0, 0.0), 0.5));
    assert_eq!(space.point_query(Vect::new(4.0, 0.2), CollisionFilter::ALL), vec![segment]);
    space.remove_static_shape(segment);
    assert!(space.shape_ids().is_empty());
}

#[test]
fn test_constraint_lifecycle() {
    let mut space = make_space();
    let a = space.add_body(Body::new(1.0, 1.0));
    let b = space.add_body(Body::new(1.0, 1.0));
    let joint = Constraint::pin(
        space.body(a).expect("registered"),
        space.body(b).expect("registered"),
        Vect::ZERO,
        Vect::ZERO,
    );
    let id = space.add_constraint(joint);
    assert!(space.contains_constraint(id));

    let mut count = 0;
    space.body_each_constraint(a, |_| count += 1);
    assert_eq!(count, 1);

    let removed = space.remove_constraint(id);
    assert!(removed.id().is_none());
    assert!(space.constraint_ids().is_empty());
    space.body_each_constraint(b, |_| panic!("constraint should be gone"));
}

#[test]
#[should_panic(expected = "is not in this space")]
fn test_removing_an_unknown_shape_panics() {
    let mut space = make_space();
    let body = space.add_body(Body::new(1.0, 1.0));
    let shape = space.add_shape(Shape::circle(body, 1.0, Vect::ZERO));
    space.remove_shape(shape);
    space.remove_shape(shape);
}

#[test]
fn test_convert_body_between_static_and_dynamic() {
    let mut space = make_space();
    let id = space.insert_rogue_body(Body::new(1.0, 1.0));
    space.add_shape(Shape::circle(id, 1.0, Vect::ZERO));

    space.convert_body_to_static(id);
    assert!(space.body(id).is_some_and(Body::is_static));

    space.convert_body_to_dynamic(id, 2.0, 3.0);
    space.simulate_body(id);
    space.step(1.0 / 60.0);
    let body = space.body(id).expect("registered");
    assert!(!body.is_static());
    assert_eq!(body.mass(), 2.0);
    assert!(body.p.y < 0.0);
}

#[test]
fn test_switching_index_keeps_shapes() {
    let mut space = make_space();
    let body = space.add_body(Body::new(1.0, 1.0));
    let shape = space.add_shape(Shape::circle(body, 1.0, Vect::ZERO));

    space.use_spatial_hash(2.0, 100);
    assert!(matches!(space.config().index, IndexStrategy::SpatialHash { .. }));
    assert_eq!(space.point_query(Vect::ZERO, CollisionFilter::ALL), vec![shape]);

    space.set_config(SpaceConfig::default());
    assert_eq!(space.config().index, IndexStrategy::BBTree);
    assert_eq!(space.gravity(), Vect::ZERO);
    assert_eq!(space.point_query(Vect::ZERO, CollisionFilter::ALL), vec![shape]);
}
