//! Contact graph components used to put groups of bodies to sleep.
//!
//! A component is a set of non-rogue bodies connected through arbiters and
//! constraints. Its members form a singly linked list through
//! `ComponentNode::next`, starting at the root body. Rogue bodies (static ones
//! included) are never part of a component, so a pile resting on the ground
//! splits into one component per independent stack.

use std::collections::BTreeMap;

use crate::{
    collision::arbiter::{Arbiter, ShapePair},
    core::{body::Body, constraints::Constraint},
    utils::allocator::{Arena, BodyId, ConstraintId},
};

/// Accumulates idle time for bodies whose kinetic energy stays under `m * dvsq`.
pub(crate) fn update_idle_times(bodies: &mut Arena<BodyId, Body>, active: &[BodyId], dvsq: f64, dt: f64) {
    for &id in active {
        let Some(body) = bodies.get_mut(id) else {
            continue;
        };
        // Infinite mass bodies only idle while perfectly still.
        let ke_threshold = if dvsq != 0.0 { body.mass() * dvsq } else { 0.0 };
        body.node.idle_time = if body.kinetic_energy() > ke_threshold {
            0.0
        } else {
            body.node.idle_time + dt
        };
    }
}

fn add_to_component(bodies: &mut Arena<BodyId, Body>, root: BodyId, id: BodyId) {
    let root_next = bodies.get(root).and_then(|r| r.node.next);
    let Some(body) = bodies.get_mut(id) else {
        return;
    };
    body.node.root = Some(root);
    if id != root {
        body.node.next = root_next;
        if let Some(r) = bodies.get_mut(root) {
            r.node.next = Some(id);
        }
    }
}

/// Marks every body reachable from `root` as a member of its component.
pub(crate) fn flood_fill(
    bodies: &mut Arena<BodyId, Body>,
    arbiters: &BTreeMap<ShapePair, Arbiter>,
    constraints: &Arena<ConstraintId, Constraint>,
    root: BodyId,
) {
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let Some(body) = bodies.get(id) else {
            continue;
        };
        if body.is_rogue() {
            continue;
        }
        if let Some(other_root) = body.node.root {
            debug_assert_eq!(other_root, root, "Inconsistent contact graph");
            continue;
        }

        stack.extend(
            body.arbiters
                .iter()
                .filter_map(|pair| arbiters.get(pair))
                .map(|arb| arb.other_body(id)),
        );
        stack.extend(
            body.constraints
                .iter()
                .filter_map(|&c| constraints.get(c))
                .map(|c| c.other_body(id)),
        );
        add_to_component(bodies, root, id);
    }
}

/// Members of the component starting at `root`, root first.
pub(crate) fn component_members(bodies: &Arena<BodyId, Body>, root: BodyId) -> Vec<BodyId> {
    let mut members = Vec::new();
    let mut next = Some(root);
    while let Some(id) = next {
        members.push(id);
        next = bodies.get(id).and_then(|body| body.node.next);
    }
    members
}

/// True while any member has been idle for less than `threshold`.
pub(crate) fn component_active(bodies: &Arena<BodyId, Body>, root: BodyId, threshold: f64) -> bool {
    component_members(bodies, root)
        .into_iter()
        .filter_map(|id| bodies.get(id))
        .any(|body| body.node.idle_time < threshold)
}
