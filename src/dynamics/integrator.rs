use crate::{
    core::body::Body,
    utils::{
        allocator::{Arena, BodyId},
        math::Vect,
    },
};

/// Drives the per-body integration hooks over the awake bodies of a space.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Integrator {
    pub dt: f64,
}

impl Integrator {
    pub fn new(dt: f64) -> Self {
        Self { dt }
    }

    pub fn integrate_positions(&self, bodies: &mut Arena<BodyId, Body>, active: &[BodyId]) {
        for &id in active {
            if let Some(body) = bodies.get_mut(id) {
                (body.position_func)(body, self.dt);
            }
        }
    }

    /// `damping` is the fraction of velocity kept per second.
    pub fn integrate_velocities(
        &self,
        bodies: &mut Arena<BodyId, Body>,
        active: &[BodyId],
        gravity: Vect,
        damping: f64,
    ) {
        let damping = damping.powf(self.dt);
        for &id in active {
            if let Some(body) = bodies.get_mut(id) {
                (body.velocity_func)(body, gravity, damping, self.dt);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn only_listed_bodies_move() {
        let mut bodies = Arena::new();
        let awake = bodies.insert(Body::new(1.0, 1.0));
        let asleep = bodies.insert(Body::new(1.0, 1.0));

        let integrator = Integrator::new(0.5);
        integrator.integrate_velocities(&mut bodies, &[awake], Vect::new(0.0, -10.0), 1.0);
        integrator.integrate_positions(&mut bodies, &[awake]);

        let body = bodies.get(awake).expect("awake body");
        assert_relative_eq!(body.v.y, -5.0);
        assert_relative_eq!(body.p.y, -2.5);
        assert_eq!(bodies.get(asleep).map(|b| b.v), Some(Vect::ZERO));
    }

    #[test]
    fn damping_is_applied_per_second() {
        let mut bodies = Arena::new();
        let id = bodies.insert(Body::new(1.0, 1.0));
        if let Some(body) = bodies.get_mut(id) {
            body.v = Vect::new(8.0, 0.0);
        }

        Integrator::new(0.5).integrate_velocities(&mut bodies, &[id], Vect::ZERO, 0.25);
        assert_relative_eq!(bodies.get(id).map_or(0.0, |b| b.v.x), 4.0);
    }

    #[test]
    fn custom_hooks_replace_default_integration() {
        fn frozen(_: &mut Body, _: f64) {}

        let mut bodies = Arena::new();
        let id = bodies.insert(Body::new(1.0, 1.0));
        if let Some(body) = bodies.get_mut(id) {
            body.v = Vect::new(1.0, 0.0);
            body.position_func = frozen;
        }
        Integrator::new(1.0).integrate_positions(&mut bodies, &[id]);
        assert_eq!(bodies.get(id).map(|b| b.p), Some(Vect::ZERO));
    }
}
