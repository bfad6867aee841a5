use std::collections::HashSet;

use rand::Rng;

use crate::counterexample::CounterExample;

/// Bounded, deduplicated circular buffer of counterexamples.
///
/// Once full, new witnesses overwrite the oldest slot. Duplicate keys are
/// strict no-ops: they neither move the cursor nor refresh the duplicate.
/// `count` is the high-water mark of occupied slots and always equals
/// `slots.len()` after the first wrap.
#[derive(Debug, Clone)]
pub struct ReplayMemory {
    capacity: usize,
    slots: Vec<CounterExample>,
    keys: HashSet<String>,
    cursor: usize,
    count: usize,
}

impl ReplayMemory {
    /// Create a memory holding at most `capacity` witnesses.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "replay memory capacity must be positive");
        Self {
            capacity,
            slots: Vec::new(),
            keys: HashSet::new(),
            cursor: 0,
            count: 0,
        }
    }

    /// Insert a witness. Returns `false` when its key is already resident.
    pub fn insert(&mut self, ce: CounterExample) -> bool {
        let key = ce.key();
        if self.keys.contains(&key) {
            return false;
        }
        if self.slots.len() <= self.cursor {
            self.slots.push(ce);
        } else {
            let evicted = std::mem::replace(&mut self.slots[self.cursor], ce);
            self.keys.remove(&evicted.key());
        }
        self.keys.insert(key);
        self.count = self.count.max(self.cursor + 1);
        self.cursor = (self.cursor + 1) % self.capacity;
        true
    }

    /// Draw a batch for replay.
    ///
    /// With `n >= count` every resident witness is returned once; otherwise
    /// `n` uniform draws with replacement.
    ///
    /// # Panics
    /// Panics on an empty memory; callers must check occupancy first.
    pub fn sample<R: Rng>(&self, n: usize, rng: &mut R) -> Vec<&CounterExample> {
        assert!(
            !self.slots.is_empty(),
            "sample called on an empty replay memory"
        );
        if n >= self.count {
            self.slots.iter().collect()
        } else {
            (0..n)
                .map(|_| &self.slots[rng.gen_range(0..self.count)])
                .collect()
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CounterExample> {
        self.slots.iter()
    }
}
