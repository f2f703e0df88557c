//! Callbacks deferred until the end of a step.

use std::{collections::VecDeque, fmt};

use crate::{
    space::Space,
    utils::allocator::{BodyId, ConstraintId, ShapeId},
};

/// Identifies a pending post-step callback. At most one callback per key may be
/// pending at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostStepKey {
    Body(BodyId),
    Shape(ShapeId),
    Constraint(ConstraintId),
    /// Free-form key for callbacks that are not tied to an object.
    User(u64),
}

pub type PostStepFunc = Box<dyn FnOnce(&mut Space)>;

#[derive(Default)]
pub(crate) struct PostStepQueue {
    pending: VecDeque<(PostStepKey, PostStepFunc)>,
    pub draining: bool,
}

impl PostStepQueue {
    pub fn contains(&self, key: PostStepKey) -> bool {
        self.pending.iter().any(|(pending, _)| *pending == key)
    }

    pub fn push(&mut self, key: PostStepKey, func: PostStepFunc) {
        self.pending.push_back((key, func));
    }

    pub fn pop(&mut self) -> Option<(PostStepKey, PostStepFunc)> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

impl fmt::Debug for PostStepQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostStepQueue")
            .field("pending", &self.pending.iter().map(|(key, _)| key).collect::<Vec<_>>())
            .field("draining", &self.draining)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_tracked_until_popped() {
        let mut queue = PostStepQueue::default();
        queue.push(PostStepKey::User(1), Box::new(|_| {}));
        queue.push(PostStepKey::Body(BodyId::new(0, 0)), Box::new(|_| {}));

        assert!(queue.contains(PostStepKey::User(1)));
        assert!(!queue.contains(PostStepKey::User(2)));
        assert_eq!(queue.len(), 2);

        let (key, _) = queue.pop().expect("first callback");
        assert_eq!(key, PostStepKey::User(1));
        assert!(!queue.contains(PostStepKey::User(1)));
    }
}
