use std::{cell::RefCell, rc::Rc};

use particle_accelerator_2d::{
    Body, CollisionHandler, PostStepKey, Shape, Space, SpaceError, Vect,
};

const DT: f64 = 1.0 / 60.0;

#[test]
fn test_removal_during_traversal_is_deferred() {
    let mut space = Space::new();
    let ids: Vec<_> = (0..3).map(|_| space.add_body(Body::new(1.0, 1.0))).collect();

    let mut visited = 0;
    space.each_body(|space, id| {
        assert!(space.is_locked());
        visited += 1;
        space
            .add_post_step_callback(PostStepKey::Body(id), move |space| space.remove_body(id))
            .expect("first registration for this key");
        assert!(space.contains_body(id), "removal must wait for the traversal to end");
    });

    assert_eq!(visited, 3);
    assert!(!space.is_locked());
    assert!(ids.iter().all(|&id| !space.contains_body(id)));
}

#[test]
fn test_duplicate_keys_are_rejected() {
    let mut space = Space::new();
    let body = space.add_body(Body::new(1.0, 1.0));
    let runs = Rc::new(RefCell::new(0));

    let counter = runs.clone();
    space.each_body(move |space, id| {
        let (first, second) = (counter.clone(), counter.clone());
        assert!(space
            .add_post_step_callback(PostStepKey::Body(id), move |_| *first.borrow_mut() += 1)
            .is_ok());
        let duplicate =
            space.add_post_step_callback(PostStepKey::Body(id), move |_| *second.borrow_mut() += 10);
        assert_eq!(duplicate, Err(SpaceError::PostStepKeyInUse(PostStepKey::Body(body))));
    });
    assert_eq!(*runs.borrow(), 1);
}

#[test]
fn test_callbacks_from_collision_handlers_run_after_the_step() {
    let mut space = Space::new();
    let a = space.add_body(Body::new(1.0, 1.0));
    let mut right = Body::new(1.0, 1.0);
    right.p = Vect::new(1.5, 0.0);
    let b = space.add_body(right);
    space.add_shape(Shape::circle(a, 1.0, Vect::ZERO));
    space.add_shape(Shape::circle(b, 1.0, Vect::ZERO));

    space.set_default_collision_handler(CollisionHandler::default().begin(move |arb, space| {
        let (_, shape) = arb.shapes();
        let result = space.add_post_step_callback(PostStepKey::Shape(shape), move |space| {
            space.remove_shape(shape);
        });
        assert!(result.is_ok());
        true
    }));

    space.step(DT);
    assert_eq!(space.shape_ids().len(), 1);
}

#[test]
fn test_callback_added_while_unlocked_waits_for_next_step() {
    let mut space = Space::new();
    let ran = Rc::new(RefCell::new(false));
    let flag = ran.clone();
    space
        .add_post_step_callback(PostStepKey::User(1), move |_| *flag.borrow_mut() = true)
        .expect("queue is empty");
    assert!(!*ran.borrow());

    space.step(DT);
    assert!(*ran.borrow());
}

#[test]
fn test_zero_timestep_runs_nothing() {
    let mut space = Space::new();
    space.set_gravity(Vect::new(0.0, -10.0));
    let body = space.add_body(Body::new(1.0, 1.0));
    let ran = Rc::new(RefCell::new(false));
    let flag = ran.clone();
    space
        .add_post_step_callback(PostStepKey::User(7), move |_| *flag.borrow_mut() = true)
        .expect("queue is empty");

    space.step(0.0);
    assert!(!*ran.borrow());
    assert_eq!(space.body(body).map(|b| b.v), Some(Vect::ZERO));
}

#[test]
#[should_panic(expected = "locked")]
fn test_structural_change_while_locked_panics() {
    let mut space = Space::new();
    space.add_body(Body::new(1.0, 1.0));
    space.each_body(|space, id| space.remove_body(id));
}
