//! Bounded history of recent positions.
use std::collections::VecDeque;

use glam::Vec2;

/// Fixed-capacity position history; pushing onto a full trail evicts the oldest point.
#[derive(Debug, Clone, Default)]
pub struct Trail {
    positions: VecDeque<Vec2>,
    capacity: usize,
}

impl Trail {
    /// Creates an empty trail. Storage grows on demand up to `capacity`.
    pub fn new(capacity: usize) -> Self {
        Self {
            positions: VecDeque::new(),
            capacity,
        }
    }

    pub fn push(&mut self, position: Vec2) {
        if self.capacity == 0 {
            return;
        }
        if self.positions.len() == self.capacity {
            self.positions.pop_front();
        }
        self.positions.push_back(position);
    }

    /// Positions from oldest to newest.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = Vec2> + '_ {
        self.positions.iter().copied()
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
