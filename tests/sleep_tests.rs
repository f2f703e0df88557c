use particle_accelerator_2d::{
    moment_for_box, moment_for_circle, Body, BodyId, Constraint, Shape, Space, Vect,
};

const DT: f64 = 1.0 / 60.0;

fn make_space() -> Space {
    let mut space = Space::new();
    space.set_gravity(Vect::new(0.0, -100.0));
    space.set_sleep_time_threshold(0.5);
    let ground = space.static_body();
    space.add_shape(Shape::segment(ground, Vect::new(-20.0, 0.0), Vect::new(20.0, 0.0), 0.0));
    space
}

fn drop_ball(space: &mut Space, p: Vect) -> BodyId {
    let mut body = Body::new(1.0, moment_for_circle(1.0, 0.0, 1.0, Vect::ZERO));
    body.p = p;
    let id = space.add_body(body);
    space.add_shape(Shape::circle(id, 1.0, Vect::ZERO));
    id
}

fn is_sleeping(space: &Space, id: BodyId) -> bool {
    space.body(id).is_some_and(Body::is_sleeping)
}

#[test]
fn test_resting_ball_falls_asleep() {
    let mut space = make_space();
    let ball = drop_ball(&mut space, Vect::new(0.0, 1.5));

    for _ in 0..300 {
        space.step(DT);
    }
    assert!(is_sleeping(&space, ball));
    assert_eq!(space.sleeping_components(), &[ball]);
    assert_eq!(space.last_step_profile().active_body_count, 0);

    // Sleeping bodies keep their place and remain visible to iteration.
    let y = space.body(ball).expect("registered").p.y;
    space.step(DT);
    assert_eq!(space.body(ball).expect("registered").p.y, y);
    assert_eq!(space.body_ids(), vec![ball]);
}

#[test]
fn test_sleeping_disabled_keeps_bodies_awake() {
    let mut space = make_space();
    space.set_sleep_time_threshold(f64::INFINITY);
    let ball = drop_ball(&mut space, Vect::new(0.0, 1.5));
    for _ in 0..300 {
        space.step(DT);
    }
    assert!(!is_sleeping(&space, ball));
}

#[test]
fn test_touching_a_sleeping_body_wakes_it() {
    let mut space = make_space();
    let bottom = drop_ball(&mut space, Vect::new(0.0, 1.0));
    for _ in 0..300 {
        space.step(DT);
    }
    assert!(is_sleeping(&space, bottom));

    let top = drop_ball(&mut space, Vect::new(0.0, 3.5));
    let mut woke = false;
    for _ in 0..20 {
        space.step(DT);
        woke |= !is_sleeping(&space, bottom);
    }
    assert!(woke, "falling ball should wake the one below");
    assert!(space.body(top).expect("registered").p.y < 3.5);
}

#[test]
fn test_mutating_a_body_wakes_it() {
    let mut space = make_space();
    let ball = drop_ball(&mut space, Vect::new(0.0, 1.0));
    for _ in 0..300 {
        space.step(DT);
    }
    assert!(is_sleeping(&space, ball));

    space.body_mut(ball).expect("registered").v = Vect::new(5.0, 0.0);
    assert!(!is_sleeping(&space, ball));
    assert!(space.sleeping_components().is_empty());
    space.step(DT);
    assert!(space.body(ball).expect("registered").p.x > 0.0);
}

#[test]
fn test_removing_ground_wakes_resting_bodies() {
    let mut space = Space::new();
    space.set_gravity(Vect::new(0.0, -100.0));
    space.set_sleep_time_threshold(0.5);
    let ground = space.static_body();
    let floor = space.add_shape(Shape::segment(ground, Vect::new(-20.0, 0.0), Vect::new(20.0, 0.0), 0.0));
    let ball = drop_ball(&mut space, Vect::new(0.0, 1.0));
    for _ in 0..300 {
        space.step(DT);
    }
    assert!(is_sleeping(&space, ball));

    space.remove_shape(floor);
    assert!(!is_sleeping(&space, ball));
    let y = space.body(ball).expect("registered").p.y;
    for _ in 0..10 {
        space.step(DT);
    }
    assert!(space.body(ball).expect("registered").p.y < y);
}

#[test]
fn test_jointed_bodies_sleep_as_one_component() {
    let mut space = make_space();
    let a = drop_ball(&mut space, Vect::new(-2.0, 1.0));
    let b = drop_ball(&mut space, Vect::new(2.0, 1.0));
    let joint = Constraint::pin(
        space.body(a).expect("registered"),
        space.body(b).expect("registered"),
        Vect::ZERO,
        Vect::ZERO,
    );
    space.add_constraint(joint);

    for _ in 0..300 {
        space.step(DT);
    }
    assert!(is_sleeping(&space, a) && is_sleeping(&space, b));
    assert_eq!(space.sleeping_components().len(), 1);

    space.activate_body(b);
    assert!(!is_sleeping(&space, a) && !is_sleeping(&space, b));
}

#[test]
fn test_activating_shapes_touching_a_shape() {
    let mut space = make_space();
    let left = drop_ball(&mut space, Vect::new(0.0, 5.0));
    let right = drop_ball(&mut space, Vect::new(10.0, 5.0));
    space.sleep_body(left);
    space.sleep_body(right);

    let mut body = Body::new(1.0, 1.0);
    body.p = Vect::new(1.0, 5.0);
    let body = space.add_body(body);
    let nudge = space.add_shape(Shape::circle(body, 1.0, Vect::ZERO));
    assert!(is_sleeping(&space, left), "adding a dynamic shape wakes nothing by itself");

    space.activate_shapes_touching_shape(nudge);
    assert!(!is_sleeping(&space, left));
    assert!(is_sleeping(&space, right));
}

#[test]
fn test_box_stack_settles_without_drifting() {
    let mut space = Space::new();
    space.set_gravity(Vect::new(0.0, -100.0));
    space.set_sleep_time_threshold(0.5);
    let ground = space.static_body();
    let mut floor = Shape::segment(ground, Vect::new(-20.0, 0.0), Vect::new(20.0, 0.0), 0.0);
    floor.set_friction(1.0);
    space.add_shape(floor);

    let boxes: Vec<BodyId> = (0..4)
        .map(|i| {
            let mut body = Body::new(1.0, moment_for_box(1.0, 1.0, 1.0));
            body.p = Vect::new(0.0, 0.5 + i as f64);
            let id = space.add_body(body);
            let mut shape = Shape::boxed(id, 1.0, 1.0);
            shape.set_friction(0.8);
            space.add_shape(shape);
            id
        })
        .collect();

    for _ in 0..600 {
        space.step(DT);
    }

    assert!(boxes.iter().all(|&id| is_sleeping(&space, id)));
    assert_eq!(space.sleeping_components().len(), 1);
    for (i, &id) in boxes.iter().enumerate() {
        let body = space.body(id).expect("registered");
        assert!(body.p.x.abs() < 0.025, "box {i} drifted to x = {}", body.p.x);
        assert!(body.angle().abs() < 0.01, "box {i} tilted to {}", body.angle());
        assert!((body.p.y - (0.5 + i as f64)).abs() < 0.5);
    }
}
