//! Binary min-heap of [`GridPoint`]s used as the A* open set.
use bevy::log;

use crate::point::GridPoint;

/// A 1-based binary min-heap keyed on [`GridPoint::priority`].
///
/// Each queued point records its own slot in `queue_index`. Points read back from the
/// heap through [`MinPriorityQueue::first`] or [`MinPriorityQueue::iter`] carry their
/// current slot, so `contains`, `update_priority` and `remove` find them in O(1) before
/// an O(log n) sift. Any other copy, including the value handed to `enqueue` or one
/// taken before later sifts moved the point, is stale: lookups verify the slot and fall
/// back to an O(n) scan.
///
/// The heap is sized up front and reused between searches. Enqueueing past the declared
/// capacity still succeeds but logs a warning the first time it happens.
#[derive(Debug, Clone)]
pub struct MinPriorityQueue {
    // Slot 0 is never read.
    nodes: Vec<GridPoint>,
    capacity: usize,
    overflowed: bool,
}

impl MinPriorityQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        let mut nodes = Vec::with_capacity(capacity + 1);
        nodes.push(GridPoint::default());
        MinPriorityQueue {
            nodes,
            capacity,
            overflowed: false,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Empties the heap without releasing its storage.
    pub fn clear(&mut self) {
        self.nodes.truncate(1);
    }

    /// The point with the lowest priority, if any.
    pub fn first(&self) -> Option<&GridPoint> {
        self.nodes.get(1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GridPoint> {
        self.nodes[1..].iter()
    }

    pub fn enqueue(&mut self, mut point: GridPoint, priority: f32) {
        if self.len() >= self.capacity {
            if !self.overflowed {
                log::warn!(
                    "Priority queue exceeded its capacity of {}, growing",
                    self.capacity
                );
                self.overflowed = true;
            }
            self.capacity = (self.capacity * 2).max(1);
        }

        point.priority = priority;
        point.queue_index = self.nodes.len();
        self.nodes.push(point);

        let index = point.queue_index;
        self.cascade_up(index);
    }

    /// Removes and returns the point with the lowest priority.
    pub fn dequeue(&mut self) -> Option<GridPoint> {
        if self.is_empty() {
            return None;
        }

        let mut root = self.nodes.swap_remove(1);
        root.queue_index = 0;

        if !self.is_empty() {
            self.nodes[1].queue_index = 1;
            self.cascade_down(1);
        }

        Some(root)
    }

    /// O(1) for a point read back from the heap, O(n) for a stale copy.
    pub fn contains(&self, point: &GridPoint) -> bool {
        self.locate(point).is_some()
    }

    /// Changes the priority of a queued point. Returns false if the point isn't queued.
    pub fn update_priority(&mut self, point: &GridPoint, priority: f32) -> bool {
        let Some(index) = self.locate(point) else {
            return false;
        };

        self.nodes[index].priority = priority;
        self.on_node_updated(index);
        true
    }

    /// Removes an arbitrary point from the heap.
    pub fn remove(&mut self, point: &GridPoint) -> Option<GridPoint> {
        let index = self.locate(point)?;

        let mut removed = self.nodes.swap_remove(index);
        removed.queue_index = 0;

        if index <= self.len() {
            self.nodes[index].queue_index = index;
            self.on_node_updated(index);
        }

        Some(removed)
    }

    fn locate(&self, point: &GridPoint) -> Option<usize> {
        let hint = point.queue_index;
        if hint >= 1 && hint <= self.len() && self.nodes[hint] == *point {
            return Some(hint);
        }

        self.nodes[1..]
            .iter()
            .position(|n| n == point)
            .map(|i| i + 1)
    }

    fn on_node_updated(&mut self, index: usize) {
        let parent = index / 2;
        if parent >= 1 && self.nodes[index].priority < self.nodes[parent].priority {
            self.cascade_up(index);
        } else {
            self.cascade_down(index);
        }
    }

    fn cascade_up(&mut self, mut index: usize) {
        while index > 1 {
            let parent = index / 2;
            if self.nodes[parent].priority <= self.nodes[index].priority {
                break;
            }
            self.swap(index, parent);
            index = parent;
        }
    }

    fn cascade_down(&mut self, mut index: usize) {
        let len = self.len();
        loop {
            let left = index * 2;
            if left > len {
                break;
            }

            let mut smallest = index;
            if self.nodes[left].priority < self.nodes[smallest].priority {
                smallest = left;
            }

            let right = left + 1;
            if right <= len && self.nodes[right].priority < self.nodes[smallest].priority {
                smallest = right;
            }

            if smallest == index {
                break;
            }

            self.swap(index, smallest);
            index = smallest;
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.nodes.swap(a, b);
        self.nodes[a].queue_index = a;
        self.nodes[b].queue_index = b;
    }
}
