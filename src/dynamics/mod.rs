//! Simulation dynamics: integration, the contact solver and sleeping components.

pub(crate) mod integrator;
pub(crate) mod island;
pub(crate) mod solver;
