//! Waking and sleeping of bodies.
//!
//! A sleeping body keeps its arbiters and constraints, but its shapes live in the
//! static index and it is skipped by the integrator and the solver. Sleeping
//! components are linked lists of bodies rooted at the body stored in
//! `Space::sleeping_components`.

use super::Space;
use crate::{
    collision::{arbiter::ArbiterState, broadphase::SpatialIndex},
    core::{body::Body, shape::Shape},
    dynamics::island,
    utils::allocator::{BodyId, ShapeId},
};

impl Space {
    pub(super) fn sleep_enabled(&self) -> bool {
        self.config.sleep_time_threshold != f64::INFINITY
    }

    fn is_rogue_dynamic(&self, id: BodyId) -> bool {
        self.bodies
            .get(id)
            .is_some_and(|body| body.is_rogue() && !body.is_static())
    }

    fn is_sleeping(&self, id: BodyId) -> bool {
        self.bodies.get(id).is_some_and(Body::is_sleeping)
    }

    /// Threads the contact graph and puts idle components to sleep.
    pub(super) fn process_components(&mut self, dt: f64) {
        let sleep = self.sleep_enabled();

        if sleep {
            let dv = self.config.idle_speed_threshold;
            let dvsq = if dv != 0.0 {
                dv * dv
            } else {
                self.config.gravity.length_squared() * dt * dt
            };
            island::update_idle_times(&mut self.bodies, &self.active_bodies, dvsq, dt);
        }

        for pair in self.arbiters.clone() {
            let Some(arb) = self.cached_arbiters.get(&pair) else {
                continue;
            };
            let (a, b) = (arb.body_a, arb.body_b);

            if sleep {
                // Rogue bodies are moved by the caller, so anything they touch stays awake.
                if self.is_rogue_dynamic(b) || self.is_sleeping(a) {
                    self.activate_body(a);
                }
                if self.is_rogue_dynamic(a) || self.is_sleeping(b) {
                    self.activate_body(b);
                }
            }

            for id in [a, b] {
                if let Some(body) = self.bodies.get_mut(id) {
                    if !body.arbiters.contains(&pair) {
                        body.arbiters.push(pair);
                    }
                }
            }
        }

        if !sleep {
            return;
        }

        for id in self.constraints.ids() {
            let Some(constraint) = self.constraints.get(id) else {
                continue;
            };
            let (a, b) = (constraint.a(), constraint.b());
            if self.is_rogue_dynamic(b) {
                self.activate_body(a);
            }
            if self.is_rogue_dynamic(a) {
                self.activate_body(b);
            }
        }

        let threshold = self.config.sleep_time_threshold;
        let mut i = 0;
        while i < self.active_bodies.len() {
            let id = self.active_bodies[i];
            if !self.is_sleeping(id) {
                island::flood_fill(&mut self.bodies, &self.cached_arbiters, &self.constraints, id);

                if !island::component_active(&self.bodies, id, threshold) {
                    self.sleeping_components.push(id);
                    let members = island::component_members(&self.bodies, id);
                    log::debug!("Component rooted at {id:?} fell asleep ({} bodies)", members.len());
                    for member in members {
                        self.deactivate_body(member);
                    }
                    // The root left the active list; index `i` now holds the next body.
                    continue;
                }
            }

            i += 1;
            if let Some(body) = self.bodies.get_mut(id) {
                body.node.root = None;
                body.node.next = None;
            }
        }
    }

    /// Removes a body from the simulation without unregistering it.
    fn deactivate_body(&mut self, id: BodyId) {
        self.active_bodies.retain(|&b| b != id);
        let Some(body) = self.bodies.get(id) else {
            return;
        };
        let shapes = body.shapes.clone();
        let arbiters = body.arbiters.clone();

        for shape in shapes {
            if self.active_shapes.remove(shape) {
                let bb = self.shape_ref(shape).bb();
                self.static_shapes.insert(shape, bb);
            }
        }

        for pair in arbiters {
            if let Some(arb) = self.cached_arbiters.get_mut(&pair) {
                arb.state = ArbiterState::Sleeping;
                self.arbiters.retain(|&p| p != pair);
            }
        }
    }

    /// Wakes `id` and the rest of its sleeping component. Does nothing for rogue bodies.
    ///
    /// # Panics
    ///
    /// Panics if the body is not registered with this space.
    pub fn activate_body(&mut self, id: BodyId) {
        let body = self.body_ref_mut(id);
        if body.is_rogue() {
            return;
        }
        body.node.idle_time = 0.0;

        if let Some(root) = body.node.root {
            if self.sleeping_components.contains(&root) {
                self.activate_component(root);
            }
        }

        // Keep resting neighbours awake as well so nothing is left hanging.
        let arbiters = self.body_ref(id).arbiters.clone();
        for pair in arbiters {
            let Some(other) = self.cached_arbiters.get(&pair).map(|arb| arb.other_body(id)) else {
                continue;
            };
            if let Some(other) = self.bodies.get_mut(other) {
                if !other.is_static() {
                    other.node.idle_time = 0.0;
                }
            }
        }
    }

    fn activate_component(&mut self, root: BodyId) {
        let members = island::component_members(&self.bodies, root);
        log::debug!("Waking component rooted at {root:?} ({} bodies)", members.len());
        for member in members {
            if let Some(body) = self.bodies.get_mut(member) {
                body.node = Default::default();
            }
            self.activate_body_now(member);
        }
        self.sleeping_components.retain(|&r| r != root);
    }

    /// Puts a body back into the simulation, deferring it while the space is locked.
    pub(super) fn activate_body_now(&mut self, id: BodyId) {
        if self.locked > 0 {
            if !self.roused_bodies.contains(&id) {
                self.roused_bodies.push(id);
            }
            return;
        }
        let Some(body) = self.bodies.get(id) else {
            return;
        };
        if body.is_rogue() || self.active_bodies.contains(&id) {
            return;
        }
        let shapes = body.shapes.clone();
        let arbiters = body.arbiters.clone();
        self.active_bodies.push(id);

        for shape in shapes {
            if self.static_shapes.remove(shape) {
                let bb = self.shape_ref(shape).bb();
                self.active_shapes.insert(shape, bb);
            }
        }

        let stamp = self.stamp;
        for pair in arbiters {
            let Some(arb) = self.cached_arbiters.get_mut(&pair) else {
                continue;
            };
            if arb.state == ArbiterState::Sleeping {
                arb.state = ArbiterState::Normal;
            }
            if arb.state != ArbiterState::Ignore && !self.arbiters.contains(&pair) {
                arb.stamp = stamp;
                self.arbiters.push(pair);
            }
        }
    }

    /// Wakes every body touching the static body `id`, or only those touching
    /// `filter` when given.
    pub fn activate_static_body(&mut self, id: BodyId, filter: Option<ShapeId>) {
        assert!(self.body_ref(id).is_static(), "Body {id:?} is not static");
        let arbiters = self.body_ref(id).arbiters.clone();
        for pair in arbiters {
            if filter.is_some_and(|shape| !pair.contains(shape)) {
                continue;
            }
            let Some(other) = self.cached_arbiters.get(&pair).map(|arb| arb.other_body(id)) else {
                continue;
            };
            self.activate_body(other);
        }
    }

    /// Wakes the bodies whose shapes overlap the shape `id`. Useful after moving a
    /// shape by hand, since sleeping bodies never look for new contacts themselves.
    /// Does nothing when sleeping is disabled.
    ///
    /// # Panics
    ///
    /// Panics if the shape is not in this space.
    pub fn activate_shapes_touching_shape(&mut self, id: ShapeId) {
        if !self.sleep_enabled() {
            return;
        }
        let shape: Shape = self.shape_ref(id).clone();
        for hit in self.shape_query(&shape) {
            let body = self.shape_ref(hit.shape).body();
            self.activate_body(body);
        }
    }

    /// Forces a body to sleep immediately in a component of its own.
    pub fn sleep_body(&mut self, id: BodyId) {
        self.sleep_body_with_group(id, None);
    }

    /// Forces a body to sleep immediately. With a `group`, it joins the sleeping
    /// component of that body and wakes together with it.
    ///
    /// # Panics
    ///
    /// Panics for static or rogue bodies, while the space is locked, or if `group`
    /// is not asleep.
    pub fn sleep_body_with_group(&mut self, id: BodyId, group: Option<BodyId>) {
        let body = self.body_ref(id);
        assert!(
            !body.is_static() && !body.is_rogue(),
            "Rogue and static bodies cannot be put to sleep"
        );
        self.assert_unlocked("put a body to sleep");
        let group_root = group.map(|group| match self.body_ref(group).node.root {
            Some(root) => root,
            None => panic!("Body {group:?} is not asleep and cannot be used as a sleeping group"),
        });

        if let Some(root) = body.node.root {
            assert!(
                group_root.map_or(true, |group_root| group_root == root),
                "Body {id:?} is already asleep in another group"
            );
            return;
        }

        self.reindex_shapes_for_body(id);
        self.deactivate_body(id);

        match group_root {
            Some(root) => {
                let root_next = self.body_ref(root).node.next;
                let body = self.body_ref_mut(id);
                body.node.root = Some(root);
                body.node.next = root_next;
                body.node.idle_time = 0.0;
                self.body_ref_mut(root).node.next = Some(id);
            }
            None => {
                let body = self.body_ref_mut(id);
                body.node.root = Some(id);
                body.node.next = None;
                body.node.idle_time = 0.0;
                self.sleeping_components.push(id);
            }
        }
        log::debug!("Body {id:?} put to sleep");
    }

    /// Root bodies of the sleeping components.
    pub fn sleeping_components(&self) -> &[BodyId] {
        &self.sleeping_components
    }
}

#[cfg(test)]
mod tests {
    use crate::collision::broadphase::SpatialIndex;
    use crate::{
        core::{body::Body, shape::Shape},
        utils::math::Vect,
        Space,
    };

    #[test]
    fn manual_sleep_and_wake() {
        let mut space = Space::new();
        space.set_sleep_time_threshold(0.5);
        let id = space.add_body(Body::new(1.0, 1.0));
        space.add_shape(Shape::circle(id, 1.0, Vect::ZERO));

        space.sleep_body(id);
        assert!(space.body(id).is_some_and(Body::is_sleeping));
        assert!(space.active_bodies.is_empty());
        assert_eq!(space.sleeping_components(), &[id]);
        assert_eq!(space.static_shapes.len(), 1);

        space.activate_body(id);
        assert!(!space.body(id).is_some_and(Body::is_sleeping));
        assert_eq!(space.active_bodies, vec![id]);
        assert!(space.sleeping_components().is_empty());
        assert_eq!(space.active_shapes.len(), 1);
    }

    #[test]
    fn grouped_bodies_wake_together() {
        let mut space = Space::new();
        space.set_sleep_time_threshold(0.5);
        let a = space.add_body(Body::new(1.0, 1.0));
        let b = space.add_body(Body::new(1.0, 1.0));

        space.sleep_body(a);
        space.sleep_body_with_group(b, Some(a));
        assert_eq!(space.sleeping_components().len(), 1);

        space.activate_body(b);
        assert_eq!(space.active_bodies.len(), 2);
        assert!(space.sleeping_components().is_empty());
    }

    #[test]
    #[should_panic(expected = "not asleep")]
    fn awake_group_is_rejected() {
        let mut space = Space::new();
        let a = space.add_body(Body::new(1.0, 1.0));
        let b = space.add_body(Body::new(1.0, 1.0));
        space.sleep_body_with_group(b, Some(a));
    }
}
