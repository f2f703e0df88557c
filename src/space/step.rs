use super::{CollisionHandler, Space};
use crate::{
    collision::{
        arbiter::{Arbiter, ArbiterPairInfo, ArbiterState, ShapePair},
        broadphase::SpatialIndex,
        narrowphase,
    },
    core::{
        body::Body,
        shape::Shape,
        types::{CollisionType, Material},
    },
    dynamics::{integrator::Integrator, solver::ContactSolver},
    utils::{
        allocator::{ConstraintId, ShapeId},
        logging::{Phase, PhaseTimer},
    },
};

impl Space {
    /// Advances the simulation by `dt` seconds.
    ///
    /// A zero timestep does nothing. Collision callbacks run during the step with
    /// the space locked; post-step callbacks run once it returns to unlocked.
    pub fn step(&mut self, dt: f64) {
        if dt == 0.0 {
            return;
        }
        assert!(dt > 0.0 && dt.is_finite(), "Timestep must be positive and finite, got {dt}");
        self.assert_unlocked("step the space");

        self.profile.reset();
        self.stamp += 1;
        let step_timer = PhaseTimer::start(Phase::Step, self.stamp);
        let prev_dt = self.curr_dt;
        self.curr_dt = dt;

        // Arbiters between awake bodies are rethreaded by the contact graph pass.
        for pair in std::mem::take(&mut self.arbiters) {
            let Some(arb) = self.cached_arbiters.get_mut(&pair) else {
                continue;
            };
            arb.state = ArbiterState::Normal;
            let (a, b) = (arb.body_a, arb.body_b);
            let sleeping = |id| self.bodies.get(id).is_some_and(Body::is_sleeping);
            if !sleeping(a) && !sleeping(b) {
                self.unthread_arbiter(pair);
            }
        }

        self.lock();
        {
            let timer = PhaseTimer::start(Phase::Integrate, self.stamp);
            Integrator::new(dt).integrate_positions(&mut self.bodies, &self.active_bodies);
            self.profile.integrator_time += timer.finish();

            let timer = PhaseTimer::start(Phase::BroadPhase, self.stamp);
            let pairs = self.candidate_pairs();
            self.profile.broad_phase_time = timer.finish();
            self.profile.candidate_pair_count = pairs.len();

            let timer = PhaseTimer::start(Phase::NarrowPhase, self.stamp);
            for (a, b) in pairs {
                self.collide_shapes(a, b);
            }
            self.profile.narrow_phase_time = timer.finish();
        }
        self.unlock(false);

        if self.config.sleep_time_threshold != f64::INFINITY || self.config.enable_contact_graph {
            let timer = PhaseTimer::start(Phase::Components, self.stamp);
            self.process_components(dt);
            self.profile.components_time = timer.finish();
        }

        self.lock();
        {
            self.filter_cached_arbiters();

            let timer = PhaseTimer::start(Phase::Solve, self.stamp);
            self.solve(dt, prev_dt);
            self.profile.solver_time = timer.finish();

            for pair in self.arbiters.clone() {
                let handler = self.handler_for(pair);
                self.with_arbiter(pair, |arb, space| handler.call_post_solve(arb, space));
            }
        }
        self.unlock(true);

        self.profile.active_body_count = self.active_bodies.len();
        self.profile.sleeping_component_count = self.sleeping_components.len();
        self.profile.arbiter_count = self.arbiters.len();
        self.profile.contact_count = self
            .arbiters
            .iter()
            .filter_map(|pair| self.cached_arbiters.get(pair))
            .map(Arbiter::count)
            .sum();
        self.profile.total_time = step_timer.finish();
    }

    /// Refreshes dynamic shape bounds and returns every overlapping pair, dynamic
    /// pairs first, then dynamic against static.
    fn candidate_pairs(&mut self) -> Vec<(ShapeId, ShapeId)> {
        let Space {
            bodies,
            shapes,
            active_shapes,
            static_shapes,
            ..
        } = self;

        let active_ids = active_shapes.ids();
        for &id in &active_ids {
            let Some(shape) = shapes.get_mut(id) else {
                continue;
            };
            let Some(body) = bodies.get(shape.body()) else {
                continue;
            };
            let bb = shape.cache_bb(body);
            active_shapes.update(id, bb);
        }

        let mut pairs = active_shapes.pairs();
        for id in active_ids {
            let Some(shape) = shapes.get(id) else {
                continue;
            };
            pairs.extend(static_shapes.query(shape.bb()).into_iter().map(|other| (id, other)));
        }
        pairs
    }

    /// Cheap checks ruling a pair out before the narrow phase.
    fn query_reject(a: &Shape, b: &Shape, a_body: &Body, b_body: &Body) -> bool {
        !a.bb().intersects(&b.bb())
            || a.body() == b.body()
            || a.filter.rejects(&b.filter)
            || (a_body.mass() == f64::INFINITY && b_body.mass() == f64::INFINITY)
    }

    fn collide_shapes(&mut self, a_id: ShapeId, b_id: ShapeId) {
        let (Some(a), Some(b)) = (self.shapes.get(a_id), self.shapes.get(b_id)) else {
            return;
        };
        let (Some(a_body), Some(b_body)) = (self.bodies.get(a.body()), self.bodies.get(b.body())) else {
            return;
        };
        if Self::query_reject(a, b, a_body, b_body) {
            return;
        }

        let sensor = a.sensor || b.sensor;
        let (handler, swapped) = match self.handlers.find(a.collision_type, b.collision_type) {
            Some((handler, swapped)) => (handler.clone(), swapped),
            None => {
                let default = self.handlers.default_handler();
                // Sensors only exist to report overlaps; nothing would observe this one.
                if sensor && default.is_empty() {
                    return;
                }
                (default.clone(), false)
            }
        };

        let (first, second) = if swapped { (b, a) } else { (a, b) };
        let contacts = narrowphase::collide(first, second);
        if contacts.is_empty() {
            return;
        }

        let materials = Material::combine_pair(&first.material, &second.material);
        let info = ArbiterPairInfo {
            shape_a: if swapped { b_id } else { a_id },
            shape_b: if swapped { a_id } else { b_id },
            body_a: first.body(),
            body_b: second.body(),
            elasticity: materials.elasticity,
            friction: materials.friction,
            surface_vr: first.material.surface_velocity - second.material.surface_velocity,
        };

        let pair = ShapePair::new(a_id, b_id);
        let arb = self
            .cached_arbiters
            .entry(pair)
            .or_insert_with(|| Arbiter::new(info.shape_a, info.body_a, info.shape_b, info.body_b));
        arb.update(contacts, &info);
        if arb.state == ArbiterState::Sleeping {
            arb.state = ArbiterState::Normal;
        }

        if arb.state == ArbiterState::FirstCollision {
            self.with_arbiter(pair, |arb, space| {
                if !handler.call_begin(arb, space) {
                    arb.ignore();
                }
            });
        }

        let ignored = self
            .cached_arbiters
            .get(&pair)
            .map_or(true, |arb| arb.state == ArbiterState::Ignore);
        let accepted = !ignored
            && self.with_arbiter(pair, |arb, space| handler.call_pre_solve(arb, space))
            && !sensor;

        let stamp = self.stamp;
        if let Some(arb) = self.cached_arbiters.get_mut(&pair) {
            if accepted {
                self.arbiters.push(pair);
            } else {
                // Post-solve never runs for this pair, so settle its state here.
                arb.contacts.clear();
                if arb.state != ArbiterState::Ignore {
                    arb.state = ArbiterState::Normal;
                }
            }
            arb.stamp = stamp;
        }
    }

    /// Marks arbiters that stopped touching as cached, calling `separate` once, and
    /// drops the ones that outlived the collision persistence.
    fn filter_cached_arbiters(&mut self) {
        let persistence = u64::from(self.config.collision_persistence);
        let pairs: Vec<ShapePair> = self.cached_arbiters.keys().copied().collect();

        for pair in pairs {
            let Some(arb) = self.cached_arbiters.get_mut(&pair) else {
                continue;
            };
            let resting = |id| {
                self.bodies
                    .get(id)
                    .map_or(true, |body| body.is_static() || body.is_sleeping())
            };
            if resting(arb.body_a) && resting(arb.body_b) {
                continue;
            }

            let ticks = self.stamp - arb.stamp;
            if ticks >= 1 && arb.state != ArbiterState::Cached {
                arb.state = ArbiterState::Cached;
                self.call_separate(pair);
            }
            if ticks >= persistence {
                self.unthread_arbiter(pair);
                self.cached_arbiters.remove(&pair);
                log::trace!("Dropped stale arbiter {pair:?}");
            }
        }
    }

    fn solve(&mut self, dt: f64, prev_dt: f64) {
        let solver = ContactSolver::new(dt, self.config.collision_slop, self.config.collision_bias);
        let Space {
            bodies,
            active_bodies,
            cached_arbiters,
            arbiters,
            constraints,
            config,
            profile,
            stamp,
            ..
        } = self;

        for pair in arbiters.iter() {
            let Some(arb) = cached_arbiters.get_mut(pair) else {
                continue;
            };
            if let (Some(a), Some(b)) = (bodies.get(arb.body_a), bodies.get(arb.body_b)) {
                solver.pre_step(arb, a, b);
            }
        }

        // Constraints touching a sleeping body sleep with it.
        let awake_constraints: Vec<ConstraintId> = constraints
            .iter()
            .filter(|(_, c)| {
                [c.a(), c.b()]
                    .into_iter()
                    .all(|id| bodies.get(id).is_some_and(|body| !body.is_sleeping()))
            })
            .map(|(id, _)| id)
            .collect();

        for &id in &awake_constraints {
            let Some(constraint) = constraints.get_mut(id) else {
                continue;
            };
            if let Some((a, b)) = bodies.get2_mut(constraint.a(), constraint.b()) {
                constraint.pre_step(a, b, dt);
            }
        }

        let timer = PhaseTimer::start(Phase::Integrate, *stamp);
        Integrator::new(dt).integrate_velocities(bodies, active_bodies, config.gravity, config.damping);
        profile.integrator_time += timer.finish();

        let dt_coef = if prev_dt == 0.0 { 0.0 } else { dt / prev_dt };
        for pair in arbiters.iter() {
            let Some(arb) = cached_arbiters.get(pair) else {
                continue;
            };
            if let Some((a, b)) = bodies.get2_mut(arb.body_a, arb.body_b) {
                ContactSolver::apply_cached_impulse(arb, a, b, dt_coef);
            }
        }
        for &id in &awake_constraints {
            let Some(constraint) = constraints.get_mut(id) else {
                continue;
            };
            if let Some((a, b)) = bodies.get2_mut(constraint.a(), constraint.b()) {
                constraint.apply_cached_impulse(a, b, dt_coef);
            }
        }

        for _ in 0..config.iterations {
            for pair in arbiters.iter() {
                let Some(arb) = cached_arbiters.get_mut(pair) else {
                    continue;
                };
                if let Some((a, b)) = bodies.get2_mut(arb.body_a, arb.body_b) {
                    ContactSolver::apply_impulse(arb, a, b);
                }
            }
            for &id in &awake_constraints {
                let Some(constraint) = constraints.get_mut(id) else {
                    continue;
                };
                if let Some((a, b)) = bodies.get2_mut(constraint.a(), constraint.b()) {
                    constraint.apply_impulse(a, b, dt);
                }
            }
        }
    }

    fn collision_type_of(&self, id: ShapeId) -> CollisionType {
        self.shapes
            .get(id)
            .map(|shape| shape.collision_type)
            .unwrap_or_default()
    }

    /// Handler that processes an existing arbiter. Arbiters store their shapes in
    /// handler order, so no swap is needed.
    pub(super) fn handler_for(&self, pair: ShapePair) -> CollisionHandler {
        let Some(arb) = self.cached_arbiters.get(&pair) else {
            return CollisionHandler::default();
        };
        let a = self.collision_type_of(arb.shape_a);
        let b = self.collision_type_of(arb.shape_b);
        self.handlers.lookup(a, b).0.clone()
    }

    pub(super) fn call_separate(&mut self, pair: ShapePair) {
        let handler = self.handler_for(pair);
        self.with_arbiter(pair, |arb, space| handler.call_separate(arb, space));
    }

    /// Runs `f` with the arbiter taken out of the cache so the callback can borrow
    /// the space mutably. Missing arbiters yield the default value.
    pub(super) fn with_arbiter<R: Default>(
        &mut self,
        pair: ShapePair,
        f: impl FnOnce(&mut Arbiter, &mut Space) -> R,
    ) -> R {
        let Some(mut arb) = self.cached_arbiters.remove(&pair) else {
            return R::default();
        };
        let result = f(&mut arb, self);
        self.cached_arbiters.insert(pair, arb);
        result
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        core::{body::Body, shape::Shape},
        utils::math::Vect,
        Space,
    };
    use approx::assert_relative_eq;

    #[test]
    fn zero_timestep_is_a_no_op() {
        let mut space = Space::new();
        space.set_gravity(Vect::new(0.0, -10.0));
        let body = space.add_body(Body::new(1.0, 1.0));
        space.step(0.0);
        assert_eq!(space.body(body).map(|b| b.v), Some(Vect::ZERO));
        assert_relative_eq!(space.current_time_step(), 0.0);
    }

    #[test]
    fn overlapping_circles_create_one_arbiter() {
        let mut space = Space::new();
        let a = space.add_body(Body::new(1.0, 1.0));
        let mut far = Body::new(1.0, 1.0);
        far.p = Vect::new(1.5, 0.0);
        let b = space.add_body(far);
        space.add_shape(Shape::circle(a, 1.0, Vect::ZERO));
        space.add_shape(Shape::circle(b, 1.0, Vect::ZERO));

        space.step(1.0 / 60.0);
        assert_eq!(space.arbiters.len(), 1);
        let arb = &space.cached_arbiters[&space.arbiters[0]];
        assert_eq!(arb.count(), 1);
        assert_relative_eq!(arb.depth(0), 0.5, epsilon = 1e-9);
        assert_eq!(space.last_step_profile().contact_count, 1);
    }

    #[test]
    fn arbiters_expire_after_persistence() {
        let mut space = Space::new();
        let a = space.add_body(Body::new(1.0, 1.0));
        let mut other = Body::new(1.0, 1.0);
        other.p = Vect::new(1.5, 0.0);
        let b = space.add_body(other);
        space.add_shape(Shape::circle(a, 1.0, Vect::ZERO));
        space.add_shape(Shape::circle(b, 1.0, Vect::ZERO));
        space.step(1.0 / 60.0);

        if let Some(body) = space.body_mut(b) {
            body.p = Vect::new(50.0, 0.0);
            body.v = Vect::ZERO;
        }
        space.step(1.0 / 60.0);
        assert!(space.arbiters.is_empty());
        assert_eq!(space.cached_arbiters.len(), 1, "kept while persisting");

        for _ in 0..3 {
            space.step(1.0 / 60.0);
        }
        assert!(space.cached_arbiters.is_empty());
    }
}
