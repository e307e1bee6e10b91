//! LRU Tracker Module
//!
//! Implements Least Recently Used tracking for cache eviction.
//!
//! Keys live in a slot vector and are linked into a doubly linked list by
//! slot index, so touching, removing and evicting are all O(1):
//!
//! ```text
//!   front (least recent)                      back (most recent)
//!   [slot 2] <──> [slot 0] <──> [slot 3] <──> [slot 1]
//! ```
//!
//! Freed slots are recycled through a free list.

/// Index of a key's node inside the tracker.
pub type SlotId = usize;

#[derive(Debug)]
struct Node<K> {
    key: K,
    prev: Option<SlotId>,
    next: Option<SlotId>,
}

// == LRU Tracker ==
/// Tracks access order for LRU eviction strategy.
///
/// - Front = Least recently used
/// - Back = Most recently used
#[derive(Debug)]
pub struct LruTracker<K> {
    slots: Vec<Option<Node<K>>>,
    free: Vec<SlotId>,
    head: Option<SlotId>,
    tail: Option<SlotId>,
    len: usize,
}

impl<K> Default for LruTracker<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> LruTracker<K> {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Creates a tracker with room for `capacity` keys before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            ..Self::new()
        }
    }

    // == Push Back ==
    /// Adds a key as the most recently used and returns its slot.
    pub fn push_back(&mut self, key: K) -> SlotId {
        let node = Node {
            key,
            prev: None,
            next: None,
        };
        let id = match self.free.pop() {
            Some(id) => {
                self.slots[id] = Some(node);
                id
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };
        self.attach_back(id);
        self.len += 1;
        id
    }

    // == Touch ==
    /// Marks a slot as recently used (moves it to the back).
    ///
    /// Returns false if the slot is not live.
    pub fn touch(&mut self, id: SlotId) -> bool {
        if !self.is_live(id) {
            return false;
        }
        if self.tail != Some(id) {
            self.detach(id);
            self.attach_back(id);
        }
        true
    }

    // == Remove ==
    /// Removes a slot from the tracker, returning its key.
    pub fn remove(&mut self, id: SlotId) -> Option<K> {
        if !self.is_live(id) {
            return None;
        }
        self.detach(id);
        let node = self.slots[id].take()?;
        self.free.push(id);
        self.len -= 1;
        Some(node.key)
    }

    // == Pop Front ==
    /// Returns and removes the least recently used key.
    ///
    /// Returns None if tracker is empty.
    pub fn pop_front(&mut self) -> Option<K> {
        let id = self.head?;
        self.remove(id)
    }

    // == Peek Front ==
    /// Returns the least recently used key without removing it.
    pub fn peek_front(&self) -> Option<&K> {
        self.head.and_then(|id| self.node(id)).map(|node| &node.key)
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.len
    }

    // == Is Empty ==
    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drops every key, keeping the allocated slot storage.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    /// Iterates keys from least to most recently used.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            tracker: self,
            cursor: self.head,
        }
    }

    fn is_live(&self, id: SlotId) -> bool {
        matches!(self.slots.get(id), Some(Some(_)))
    }

    fn node(&self, id: SlotId) -> Option<&Node<K>> {
        self.slots.get(id).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: SlotId) -> Option<&mut Node<K>> {
        self.slots.get_mut(id).and_then(Option::as_mut)
    }

    fn detach(&mut self, id: SlotId) {
        let (prev, next) = match self.node_mut(id) {
            Some(node) => (node.prev.take(), node.next.take()),
            None => return,
        };

        match prev {
            Some(p) => {
                if let Some(node) = self.node_mut(p) {
                    node.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(node) = self.node_mut(n) {
                    node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }

    fn attach_back(&mut self, id: SlotId) {
        let old_tail = self.tail;
        if let Some(node) = self.node_mut(id) {
            node.prev = old_tail;
            node.next = None;
        }
        match old_tail {
            Some(t) => {
                if let Some(node) = self.node_mut(t) {
                    node.next = Some(id);
                }
            }
            None => self.head = Some(id),
        }
        self.tail = Some(id);
    }
}

/// Iterator over tracked keys, least recently used first.
pub struct Iter<'a, K> {
    tracker: &'a LruTracker<K>,
    cursor: Option<SlotId>,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.tracker.node(self.cursor?)?;
        self.cursor = node.next;
        Some(&node.key)
    }
}
