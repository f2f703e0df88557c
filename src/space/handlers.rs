//! Collision handler registry.

use std::{cell::RefCell, collections::HashMap, fmt, rc::Rc};

use crate::{collision::arbiter::Arbiter, core::types::CollisionType, space::Space};

/// Called when two shapes first touch. Returning `false` ignores the pair until they separate.
pub type BeginFunc = dyn FnMut(&mut Arbiter, &mut Space) -> bool;
/// Called every step while touching, before solving. Returning `false` skips the pair this step.
pub type PreSolveFunc = dyn FnMut(&mut Arbiter, &mut Space) -> bool;
/// Called after the solver, with the applied impulses available on the arbiter.
pub type PostSolveFunc = dyn FnMut(&mut Arbiter, &mut Space);
/// Called once the shapes stop touching, or when one of them is removed while touching.
pub type SeparateFunc = dyn FnMut(&mut Arbiter, &mut Space);

type Shared<F> = Rc<RefCell<Box<F>>>;

fn shared<F: ?Sized>(f: Box<F>) -> Shared<F> {
    Rc::new(RefCell::new(f))
}

/// Callbacks for collisions between shapes of types `a` and `b`.
///
/// Missing callbacks behave like the defaults: accept in `begin` and `pre_solve`,
/// do nothing in `post_solve` and `separate`. Arbiters passed to the callbacks
/// always list the shape of type `a` first.
#[derive(Clone, Default)]
pub struct CollisionHandler {
    pub a: CollisionType,
    pub b: CollisionType,
    begin: Option<Shared<BeginFunc>>,
    pre_solve: Option<Shared<PreSolveFunc>>,
    post_solve: Option<Shared<PostSolveFunc>>,
    separate: Option<Shared<SeparateFunc>>,
}

impl CollisionHandler {
    pub fn new(a: CollisionType, b: CollisionType) -> Self {
        Self {
            a,
            b,
            ..Self::default()
        }
    }

    pub fn begin(mut self, f: impl FnMut(&mut Arbiter, &mut Space) -> bool + 'static) -> Self {
        self.begin = Some(shared(Box::new(f)));
        self
    }

    pub fn pre_solve(mut self, f: impl FnMut(&mut Arbiter, &mut Space) -> bool + 'static) -> Self {
        self.pre_solve = Some(shared(Box::new(f)));
        self
    }

    pub fn post_solve(mut self, f: impl FnMut(&mut Arbiter, &mut Space) + 'static) -> Self {
        self.post_solve = Some(shared(Box::new(f)));
        self
    }

    pub fn separate(mut self, f: impl FnMut(&mut Arbiter, &mut Space) + 'static) -> Self {
        self.separate = Some(shared(Box::new(f)));
        self
    }

    /// True when no callback is set.
    pub fn is_empty(&self) -> bool {
        self.begin.is_none()
            && self.pre_solve.is_none()
            && self.post_solve.is_none()
            && self.separate.is_none()
    }

    pub(crate) fn call_begin(&self, arb: &mut Arbiter, space: &mut Space) -> bool {
        match &self.begin {
            Some(f) => (*f.borrow_mut())(arb, space),
            None => true,
        }
    }

    pub(crate) fn call_pre_solve(&self, arb: &mut Arbiter, space: &mut Space) -> bool {
        match &self.pre_solve {
            Some(f) => (*f.borrow_mut())(arb, space),
            None => true,
        }
    }

    pub(crate) fn call_post_solve(&self, arb: &mut Arbiter, space: &mut Space) {
        if let Some(f) = &self.post_solve {
            (*f.borrow_mut())(arb, space);
        }
    }

    pub(crate) fn call_separate(&self, arb: &mut Arbiter, space: &mut Space) {
        if let Some(f) = &self.separate {
            (*f.borrow_mut())(arb, space);
        }
    }
}

impl fmt::Debug for CollisionHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollisionHandler")
            .field("a", &self.a)
            .field("b", &self.b)
            .field("begin", &self.begin.is_some())
            .field("pre_solve", &self.pre_solve.is_some())
            .field("post_solve", &self.post_solve.is_some())
            .field("separate", &self.separate.is_some())
            .finish()
    }
}

/// Handlers keyed by collision type pair, plus the fallback for unregistered pairs.
#[derive(Debug, Clone, Default)]
pub(crate) struct HandlerRegistry {
    handlers: HashMap<(CollisionType, CollisionType), CollisionHandler>,
    default: CollisionHandler,
}

impl HandlerRegistry {
    pub fn insert(&mut self, handler: CollisionHandler) {
        self.handlers.insert((handler.a, handler.b), handler);
    }

    pub fn remove(&mut self, a: CollisionType, b: CollisionType) -> Option<CollisionHandler> {
        self.handlers
            .remove(&(a, b))
            .or_else(|| self.handlers.remove(&(b, a)))
    }

    pub fn set_default(&mut self, handler: CollisionHandler) {
        self.default = handler;
    }

    pub fn default_handler(&self) -> &CollisionHandler {
        &self.default
    }

    /// Registered handler for the pair and whether `(a, b)` must be swapped to
    /// match its order.
    pub fn find(&self, a: CollisionType, b: CollisionType) -> Option<(&CollisionHandler, bool)> {
        if let Some(handler) = self.handlers.get(&(a, b)) {
            return Some((handler, false));
        }
        self.handlers.get(&(b, a)).map(|handler| (handler, true))
    }

    /// Handler that processes the pair, falling back to the default.
    pub fn lookup(&self, a: CollisionType, b: CollisionType) -> (&CollisionHandler, bool) {
        self.find(a, b).unwrap_or((&self.default, false))
    }
}
