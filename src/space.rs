//! The simulation container.
//!
//! A [`Space`] owns every body, shape and constraint registered with it and
//! advances them with [`Space::step`]. Structural changes are rejected while the
//! space is locked (during a step or an `each_*` traversal); defer them with
//! [`Space::add_post_step_callback`] instead.

mod handlers;
mod post_step;
mod query;
mod sleep;
mod step;

pub use handlers::{BeginFunc, CollisionHandler, PostSolveFunc, PreSolveFunc, SeparateFunc};
pub use post_step::{PostStepFunc, PostStepKey};

use std::{collections::BTreeMap, fmt};

use crate::{
    collision::{
        arbiter::{Arbiter, ShapePair},
        broadphase::{BroadPhase, SpatialIndex},
    },
    config::{IndexStrategy, SpaceConfig},
    core::{body::Body, constraints::Constraint, shape::Shape, types::SpaceId},
    error::SpaceError,
    utils::{
        allocator::{Arena, BodyId, ConstraintId, ShapeId},
        math::Vect,
        profiling::StepProfile,
    },
};

use handlers::HandlerRegistry;
use post_step::PostStepQueue;

pub struct Space {
    id: SpaceId,
    config: SpaceConfig,

    stamp: u64,
    curr_dt: f64,

    bodies: Arena<BodyId, Body>,
    /// Simulated bodies that are awake, in insertion order.
    active_bodies: Vec<BodyId>,
    /// Root body of every sleeping component.
    sleeping_components: Vec<BodyId>,
    /// Bodies woken while the space was locked.
    roused_bodies: Vec<BodyId>,
    static_body: BodyId,

    shapes: Arena<ShapeId, Shape>,
    active_shapes: BroadPhase,
    static_shapes: BroadPhase,

    constraints: Arena<ConstraintId, Constraint>,

    cached_arbiters: BTreeMap<ShapePair, Arbiter>,
    /// Arbiters solved during the current (or last) step.
    arbiters: Vec<ShapePair>,

    handlers: HandlerRegistry,
    post_step: PostStepQueue,
    locked: u32,

    profile: StepProfile,
}

impl Default for Space {
    fn default() -> Self {
        Self::new()
    }
}

impl Space {
    pub fn new() -> Self {
        Self::with_config(SpaceConfig::default())
    }

    pub fn with_config(config: SpaceConfig) -> Self {
        let id = SpaceId::next();
        let mut bodies = Arena::new();
        let static_body = bodies.insert_with(|body_id| {
            let mut body = Body::new_static();
            body.id = Some(body_id);
            body
        });

        log::debug!("Created space {id:?} using {:?}", config.index);
        Self {
            id,
            config,
            stamp: 0,
            curr_dt: 0.0,
            bodies,
            active_bodies: Vec::new(),
            sleeping_components: Vec::new(),
            roused_bodies: Vec::new(),
            static_body,
            shapes: Arena::new(),
            active_shapes: BroadPhase::new(config.index),
            static_shapes: BroadPhase::new(IndexStrategy::BBTree),
            constraints: Arena::new(),
            cached_arbiters: BTreeMap::new(),
            arbiters: Vec::new(),
            handlers: HandlerRegistry::default(),
            post_step: PostStepQueue::default(),
            locked: 0,
            profile: StepProfile::default(),
        }
    }

    pub fn id(&self) -> SpaceId {
        self.id
    }

    pub fn config(&self) -> &SpaceConfig {
        &self.config
    }

    /// Replaces every parameter, rebuilding the dynamic index if its strategy changed.
    pub fn set_config(&mut self, config: SpaceConfig) {
        let strategy = config.index;
        let current = self.config.index;
        self.config = SpaceConfig { index: current, ..config };
        self.rebuild_active_index(strategy);
    }

    /// Rogue static body owned by the space, for attaching level geometry.
    pub fn static_body(&self) -> BodyId {
        self.static_body
    }

    /// Timestep of the step in progress, or of the last completed one.
    pub fn current_time_step(&self) -> f64 {
        self.curr_dt
    }

    /// True during a step, a traversal, or a callback run from either.
    pub fn is_locked(&self) -> bool {
        self.locked > 0
    }

    /// Timings and counts of the last step.
    pub fn last_step_profile(&self) -> &StepProfile {
        &self.profile
    }

    pub fn gravity(&self) -> Vect {
        self.config.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vect) {
        self.config.gravity = gravity;
    }

    /// Fraction of velocity bodies keep after one second.
    pub fn damping(&self) -> f64 {
        self.config.damping
    }

    pub fn set_damping(&mut self, damping: f64) {
        self.config.damping = damping;
    }

    pub fn iterations(&self) -> usize {
        self.config.iterations
    }

    pub fn set_iterations(&mut self, iterations: usize) {
        self.config.iterations = iterations;
    }

    pub fn collision_slop(&self) -> f64 {
        self.config.collision_slop
    }

    pub fn set_collision_slop(&mut self, slop: f64) {
        self.config.collision_slop = slop;
    }

    pub fn collision_bias(&self) -> f64 {
        self.config.collision_bias
    }

    pub fn set_collision_bias(&mut self, bias: f64) {
        self.config.collision_bias = bias;
    }

    pub fn collision_persistence(&self) -> u32 {
        self.config.collision_persistence
    }

    pub fn set_collision_persistence(&mut self, persistence: u32) {
        self.config.collision_persistence = persistence;
    }

    pub fn idle_speed_threshold(&self) -> f64 {
        self.config.idle_speed_threshold
    }

    pub fn set_idle_speed_threshold(&mut self, threshold: f64) {
        self.config.idle_speed_threshold = threshold;
    }

    pub fn sleep_time_threshold(&self) -> f64 {
        self.config.sleep_time_threshold
    }

    pub fn set_sleep_time_threshold(&mut self, threshold: f64) {
        self.config.sleep_time_threshold = threshold;
    }

    pub fn enable_contact_graph(&self) -> bool {
        self.config.enable_contact_graph
    }

    /// Keeps arbiter lists on bodies up to date even when sleeping is disabled.
    pub fn set_enable_contact_graph(&mut self, enabled: bool) {
        self.config.enable_contact_graph = enabled;
    }

    /// Switches the dynamic shape index to a spatial hash with cells of size `dim`.
    pub fn use_spatial_hash(&mut self, dim: f64, count: usize) {
        self.rebuild_active_index(IndexStrategy::SpatialHash { dim, count });
    }

    pub fn use_bb_tree(&mut self) {
        self.rebuild_active_index(IndexStrategy::BBTree);
    }

    fn rebuild_active_index(&mut self, strategy: IndexStrategy) {
        self.assert_unlocked("switch the spatial index");
        if self.config.index == strategy {
            return;
        }
        self.config.index = strategy;

        let shapes = &self.shapes;
        self.active_shapes
            .rebuild(strategy, |id| shapes.get(id).map(Shape::bb).unwrap_or_default());
        log::debug!("Space {:?} now indexes dynamic shapes with {strategy:?}", self.id);
    }

    pub(crate) fn lock(&mut self) {
        self.locked += 1;
    }

    /// Releases one lock level. The outermost unlock wakes bodies roused while locked
    /// and, when `run_post_step` is set, runs the pending post-step callbacks.
    pub(crate) fn unlock(&mut self, run_post_step: bool) {
        assert!(self.locked > 0, "Space unlocked more times than it was locked");
        self.locked -= 1;
        if self.locked > 0 {
            return;
        }

        for id in std::mem::take(&mut self.roused_bodies) {
            self.activate_body_now(id);
        }

        if run_post_step && !self.post_step.draining {
            self.post_step.draining = true;
            while let Some((key, callback)) = self.post_step.pop() {
                log::trace!("Running post-step callback {key:?}");
                callback(self);
            }
            self.post_step.draining = false;
        }
    }

    #[track_caller]
    fn assert_unlocked(&self, action: &str) {
        assert!(
            self.locked == 0,
            "Cannot {action} while the space is locked; use a post-step callback instead"
        );
    }

    /// Schedules `callback` to run once the current step (or traversal) finishes.
    ///
    /// Registering while the space is not locked is allowed, but the callback will not
    /// run until the end of the next step or traversal.
    pub fn add_post_step_callback(
        &mut self,
        key: PostStepKey,
        callback: impl FnOnce(&mut Space) + 'static,
    ) -> Result<(), SpaceError> {
        if self.post_step.contains(key) {
            log::warn!("Rejected post-step callback: key {key:?} is already pending");
            return Err(SpaceError::PostStepKeyInUse(key));
        }
        if self.locked == 0 && !self.post_step.draining {
            log::warn!(
                "Post-step callback {key:?} added while the space is not locked; it runs after the next step"
            );
        }
        self.post_step.push(key, Box::new(callback));
        Ok(())
    }

    pub fn add_collision_handler(&mut self, handler: CollisionHandler) {
        self.assert_unlocked("add a collision handler");
        self.handlers.remove(handler.a, handler.b);
        self.handlers.insert(handler);
    }

    pub fn remove_collision_handler(
        &mut self,
        a: crate::core::types::CollisionType,
        b: crate::core::types::CollisionType,
    ) -> Option<CollisionHandler> {
        self.assert_unlocked("remove a collision handler");
        self.handlers.remove(a, b)
    }

    /// Handler used for pairs without a registered handler.
    pub fn set_default_collision_handler(&mut self, handler: CollisionHandler) {
        self.assert_unlocked("replace the default collision handler");
        self.handlers.set_default(handler);
    }

    fn body_ref(&self, id: BodyId) -> &Body {
        match self.bodies.get(id) {
            Some(body) => body,
            None => panic!("Body {id:?} is not registered with this space"),
        }
    }

    fn body_ref_mut(&mut self, id: BodyId) -> &mut Body {
        match self.bodies.get_mut(id) {
            Some(body) => body,
            None => panic!("Body {id:?} is not registered with this space"),
        }
    }

    fn shape_ref(&self, id: ShapeId) -> &Shape {
        match self.shapes.get(id) {
            Some(shape) => shape,
            None => panic!("Shape {id:?} is not in this space"),
        }
    }

    /// Registers and starts simulating `body`.
    pub fn add_body(&mut self, body: Body) -> BodyId {
        assert!(
            !body.is_static(),
            "Static bodies are not simulated; register them with insert_rogue_body"
        );
        let id = self.insert_rogue_body(body);
        self.simulate_body(id);
        id
    }

    /// Registers `body` without simulating it. Rogue bodies can carry shapes and
    /// constraints but are moved only by the caller.
    pub fn insert_rogue_body(&mut self, mut body: Body) -> BodyId {
        assert!(body.id.is_none(), "Body is already registered with a space");
        self.assert_unlocked("add a body");
        body.space = None;
        let id = self.bodies.insert_with(|id| {
            body.id = Some(id);
            body
        });
        log::debug!("Registered rogue body {id:?}");
        id
    }

    /// Starts simulating a registered rogue body.
    pub fn simulate_body(&mut self, id: BodyId) {
        self.assert_unlocked("add a body");
        let space_id = self.id;
        let body = self.body_ref_mut(id);
        assert!(body.space.is_none(), "Body {id:?} is already simulated");
        assert!(!body.is_static(), "Static bodies cannot be simulated");
        body.space = Some(space_id);
        body.node = Default::default();
        self.active_bodies.push(id);
        log::debug!("Added body {id:?} to space {space_id:?}");
    }

    /// Stops simulating the body. It stays registered as a rogue body.
    pub fn remove_body(&mut self, id: BodyId) {
        assert!(self.contains_body(id), "Body {id:?} is not simulated by this space");
        self.assert_unlocked("remove a body");

        self.activate_body(id);
        self.filter_arbiters(id, None);
        self.active_bodies.retain(|&b| b != id);
        self.body_ref_mut(id).space = None;
        log::debug!("Removed body {id:?} from space {:?}", self.id);
    }

    /// Unregisters a rogue body that no shape or constraint refers to anymore.
    pub fn free_body(&mut self, id: BodyId) -> Body {
        self.assert_unlocked("free a body");
        assert!(id != self.static_body, "The space's static body cannot be freed");
        let body = self.body_ref(id);
        assert!(body.is_rogue(), "Body {id:?} must be removed from the space before it is freed");
        assert!(
            body.shapes.is_empty() && body.constraints.is_empty(),
            "Body {id:?} still has shapes or constraints attached"
        );

        let mut body = match self.bodies.remove(id) {
            Some(body) => body,
            None => panic!("Body {id:?} is not registered with this space"),
        };
        body.id = None;
        body
    }

    /// True when `id` is simulated by this space.
    pub fn contains_body(&self, id: BodyId) -> bool {
        self.bodies
            .get(id)
            .is_some_and(|body| body.space == Some(self.id))
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id)
    }

    /// Mutable access to a body. Wakes it, since the caller is about to change it.
    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        if self.bodies.get(id).is_some_and(|body| !body.is_rogue()) {
            self.activate_body(id);
        }
        self.bodies.get_mut(id)
    }

    /// Adds a shape. Shapes on static bodies go to the static index.
    pub fn add_shape(&mut self, shape: Shape) -> ShapeId {
        if self.body_ref(shape.body()).is_static() {
            return self.add_static_shape(shape);
        }
        assert!(shape.id.is_none(), "Shape is already added to a space");
        self.assert_unlocked("add a shape");

        let body_id = shape.body();
        self.activate_body(body_id);
        let id = self.insert_shape(shape);
        let bb = self.shape_ref(id).bb();
        self.active_shapes.insert(id, bb);
        id
    }

    /// Adds a shape to the static index. It is only moved by an explicit reindex.
    pub fn add_static_shape(&mut self, shape: Shape) -> ShapeId {
        assert!(shape.id.is_none(), "Shape is already added to a space");
        self.assert_unlocked("add a static shape");

        let id = self.insert_shape(shape);
        let bb = self.shape_ref(id).bb();
        self.static_shapes.insert(id, bb);
        self.activate_shapes_touching_shape(id);
        id
    }

    fn insert_shape(&mut self, mut shape: Shape) -> ShapeId {
        let body_id = shape.body();
        shape.cache_bb(self.body_ref(body_id));
        shape.space = Some(self.id);
        let id = self.shapes.insert_with(|id| {
            shape.id = Some(id);
            shape
        });
        self.body_ref_mut(body_id).shapes.push(id);
        log::debug!("Added shape {id:?} on body {body_id:?}");
        id
    }

    /// Removes a shape, calling `separate` for every pair it was touching.
    pub fn remove_shape(&mut self, id: ShapeId) -> Shape {
        self.assert_unlocked("remove a shape");
        let body_id = self.shape_ref(id).body();

        if self.body_ref(body_id).is_static() {
            self.activate_static_body(body_id, Some(id));
        } else {
            self.activate_body(body_id);
        }

        self.body_ref_mut(body_id).shapes.retain(|&s| s != id);
        self.filter_arbiters(body_id, Some(id));
        if !self.active_shapes.remove(id) {
            self.static_shapes.remove(id);
        }

        let mut shape = match self.shapes.remove(id) {
            Some(shape) => shape,
            None => panic!("Shape {id:?} is not in this space"),
        };
        shape.id = None;
        shape.space = None;
        log::debug!("Removed shape {id:?} from body {body_id:?}");
        shape
    }

    /// Same as [`Space::remove_shape`], asserting the shape is in the static index.
    pub fn remove_static_shape(&mut self, id: ShapeId) -> Shape {
        assert!(self.static_shapes.contains(id), "Shape {id:?} is not a static shape of this space");
        self.remove_shape(id)
    }

    pub fn contains_shape(&self, id: ShapeId) -> bool {
        self.shapes.contains(id)
    }

    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(id)
    }

    /// Mutable access to a shape. Wakes its body. Geometry changes on static shapes
    /// take effect in queries after [`Space::reindex_shape`].
    pub fn shape_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        let body_id = self.shapes.get(id)?.body();
        if !self.body_ref(body_id).is_rogue() {
            self.activate_body(body_id);
        }
        self.shapes.get_mut(id)
    }

    pub fn add_constraint(&mut self, mut constraint: Constraint) -> ConstraintId {
        assert!(constraint.id.is_none(), "Constraint is already added to a space");
        self.assert_unlocked("add a constraint");
        let (a, b) = (constraint.a(), constraint.b());
        self.body_ref(a);
        self.body_ref(b);

        constraint.space = Some(self.id);
        let id = self.constraints.insert_with(|id| {
            constraint.id = Some(id);
            constraint
        });
        self.activate_body(a);
        self.activate_body(b);
        self.body_ref_mut(a).constraints.push(id);
        if a != b {
            self.body_ref_mut(b).constraints.push(id);
        }
        log::debug!("Added constraint {id:?} between {a:?} and {b:?}");
        id
    }

    pub fn remove_constraint(&mut self, id: ConstraintId) -> Constraint {
        self.assert_unlocked("remove a constraint");
        let mut constraint = match self.constraints.remove(id) {
            Some(constraint) => constraint,
            None => panic!("Constraint {id:?} is not in this space"),
        };

        for body_id in [constraint.a(), constraint.b()] {
            self.activate_body(body_id);
            self.body_ref_mut(body_id).constraints.retain(|&c| c != id);
        }
        constraint.id = None;
        constraint.space = None;
        log::debug!("Removed constraint {id:?}");
        constraint
    }

    pub fn contains_constraint(&self, id: ConstraintId) -> bool {
        self.constraints.contains(id)
    }

    pub fn constraint(&self, id: ConstraintId) -> Option<&Constraint> {
        self.constraints.get(id)
    }

    /// Mutable access to a constraint. Wakes both of its bodies.
    pub fn constraint_mut(&mut self, id: ConstraintId) -> Option<&mut Constraint> {
        if self.constraints.contains(id) {
            self.activate_constraint_bodies(id);
        }
        self.constraints.get_mut(id)
    }

    pub fn activate_constraint_bodies(&mut self, id: ConstraintId) {
        let Some(constraint) = self.constraints.get(id) else {
            panic!("Constraint {id:?} is not in this space");
        };
        let (a, b) = (constraint.a(), constraint.b());
        self.activate_body(a);
        self.activate_body(b);
    }

    /// Turns a rogue body into a static one and moves its shapes to the static index.
    pub fn convert_body_to_static(&mut self, id: BodyId) {
        self.assert_unlocked("convert a body");
        let body = self.body_ref_mut(id);
        assert!(!body.is_static(), "Body {id:?} is already static");
        assert!(body.is_rogue(), "Remove body {id:?} from the space before converting it");

        body.set_mass(f64::INFINITY);
        body.set_moment(f64::INFINITY);
        body.v = Vect::ZERO;
        body.w = 0.0;
        body.set_static(true);

        for shape in body.shapes.clone() {
            if self.active_shapes.remove(shape) {
                let bb = self.shape_ref(shape).bb();
                self.static_shapes.insert(shape, bb);
            }
        }
    }

    /// Turns a static body into a rogue dynamic one. Use [`Space::simulate_body`] to
    /// start simulating it.
    pub fn convert_body_to_dynamic(&mut self, id: BodyId, mass: f64, moment: f64) {
        self.assert_unlocked("convert a body");
        assert!(self.body_ref(id).is_static(), "Body {id:?} is already dynamic");

        self.activate_static_body(id, None);
        let body = self.body_ref_mut(id);
        body.set_mass(mass);
        body.set_moment(moment);
        body.set_static(false);

        for shape in body.shapes.clone() {
            if self.static_shapes.remove(shape) {
                let bb = self.shape_ref(shape).bb();
                self.active_shapes.insert(shape, bb);
            }
        }
    }

    /// Updates a shape from its body and refreshes its place in the index.
    pub fn reindex_shape(&mut self, id: ShapeId) {
        self.assert_unlocked("reindex a shape");
        let body_id = self.shape_ref(id).body();
        let Space {
            bodies,
            shapes,
            active_shapes,
            static_shapes,
            ..
        } = self;
        let (Some(body), Some(shape)) = (bodies.get(body_id), shapes.get_mut(id)) else {
            return;
        };
        let bb = shape.cache_bb(body);
        if active_shapes.contains(id) {
            active_shapes.update(id, bb);
        } else if static_shapes.contains(id) {
            static_shapes.update(id, bb);
        }
    }

    pub fn reindex_shapes_for_body(&mut self, id: BodyId) {
        for shape in self.body_ref(id).shapes.clone() {
            self.reindex_shape(shape);
        }
    }

    /// Refreshes every shape in the static index.
    pub fn reindex_static(&mut self) {
        for id in self.static_shapes.ids() {
            self.reindex_shape(id);
        }
    }

    /// Removes every arbiter on `body` (restricted to `shape` if given), calling
    /// `separate` for shape removals.
    fn filter_arbiters(&mut self, body: BodyId, shape: Option<ShapeId>) {
        self.lock();
        let matching: Vec<ShapePair> = self
            .cached_arbiters
            .iter()
            .filter(|(_, arb)| {
                (arb.body_a == body && shape.map_or(true, |s| s == arb.shape_a))
                    || (arb.body_b == body && shape.map_or(true, |s| s == arb.shape_b))
            })
            .map(|(pair, _)| *pair)
            .collect();

        for pair in matching {
            let cached = self
                .cached_arbiters
                .get(&pair)
                .is_some_and(|arb| arb.state == crate::collision::arbiter::ArbiterState::Cached);
            if shape.is_some() && !cached {
                self.call_separate(pair);
            }
            self.unthread_arbiter(pair);
            self.cached_arbiters.remove(&pair);
            self.arbiters.retain(|&p| p != pair);
        }
        self.unlock(true);
    }

    fn unthread_arbiter(&mut self, pair: ShapePair) {
        let Some(arb) = self.cached_arbiters.get(&pair) else {
            return;
        };
        for id in [arb.body_a, arb.body_b] {
            if let Some(body) = self.bodies.get_mut(id) {
                body.arbiters.retain(|&p| p != pair);
            }
        }
    }

    /// Every simulated body, awake bodies first, then sleeping ones.
    pub fn body_ids(&self) -> Vec<BodyId> {
        let mut ids = self.active_bodies.clone();
        for &root in &self.sleeping_components {
            ids.extend(crate::dynamics::island::component_members(&self.bodies, root));
        }
        ids
    }

    pub fn shape_ids(&self) -> Vec<ShapeId> {
        self.shapes.ids()
    }

    pub fn constraint_ids(&self) -> Vec<ConstraintId> {
        self.constraints.ids()
    }

    /// Calls `f` for every simulated body with the space locked. Structural changes
    /// must be deferred with a post-step callback; they run when the traversal ends.
    pub fn each_body(&mut self, mut f: impl FnMut(&mut Space, BodyId)) {
        self.lock();
        for id in self.body_ids() {
            f(self, id);
        }
        self.unlock(true);
    }

    pub fn each_shape(&mut self, mut f: impl FnMut(&mut Space, ShapeId)) {
        self.lock();
        for id in self.shape_ids() {
            f(self, id);
        }
        self.unlock(true);
    }

    pub fn each_constraint(&mut self, mut f: impl FnMut(&mut Space, ConstraintId)) {
        self.lock();
        for id in self.constraint_ids() {
            f(self, id);
        }
        self.unlock(true);
    }

    pub fn body_each_shape(&self, body: BodyId, mut f: impl FnMut(&Shape)) {
        for &id in &self.body_ref(body).shapes {
            if let Some(shape) = self.shapes.get(id) {
                f(shape);
            }
        }
    }

    pub fn body_each_constraint(&self, body: BodyId, mut f: impl FnMut(&Constraint)) {
        for &id in &self.body_ref(body).constraints {
            if let Some(constraint) = self.constraints.get(id) {
                f(constraint);
            }
        }
    }

    /// Arbiters touching `body` during the last step. Requires sleeping or the
    /// contact graph to be enabled; otherwise the list is empty.
    pub fn body_each_arbiter(&self, body: BodyId, mut f: impl FnMut(&Arbiter)) {
        for pair in &self.body_ref(body).arbiters {
            if let Some(arb) = self.cached_arbiters.get(pair) {
                f(arb);
            }
        }
    }
}

impl fmt::Debug for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Space")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("stamp", &self.stamp)
            .field("bodies", &self.bodies.len())
            .field("active_bodies", &self.active_bodies.len())
            .field("sleeping_components", &self.sleeping_components.len())
            .field("shapes", &self.shapes.len())
            .field("constraints", &self.constraints.len())
            .field("arbiters", &self.cached_arbiters.len())
            .field("pending_post_step", &self.post_step.len())
            .field("locked", &self.locked)
            .finish()
    }
}
