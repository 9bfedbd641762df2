//! The territory collection.
//!
//! A fixed-capacity, ordered registry of territories. Entries are appended in
//! registration order and never removed; only registered entries are ever
//! visible through this type.

use serde::Serialize;

use super::territory::{Territory, TerritoryError};

/// Ordered collection of registered territories with a fixed capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerritoryMap {
    capacity: usize,
    territories: Vec<Territory>,
}

impl TerritoryMap {
    /// Creates an empty map that accepts at most `capacity` territories.
    pub fn with_capacity(capacity: usize) -> Self {
        TerritoryMap {
            capacity,
            territories: Vec::with_capacity(capacity),
        }
    }

    /// Appends a territory and returns its zero-based index.
    pub fn register(&mut self, territory: Territory) -> Result<usize, TerritoryError> {
        if self.territories.len() >= self.capacity {
            return Err(TerritoryError::MapFull(self.capacity));
        }
        self.territories.push(territory);
        Ok(self.territories.len() - 1)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.territories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.territories.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.territories.len() >= self.capacity
    }

    pub fn get(&self, index: usize) -> Option<&Territory> {
        self.territories.get(index)
    }

    /// All registered territories, in registration order.
    pub fn as_slice(&self) -> &[Territory] {
        &self.territories
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Territory> {
        self.territories.iter()
    }

    /// Borrows two distinct territories mutably at once.
    ///
    /// Returns `None` if the indices are equal or either is out of range.
    pub fn pair_mut(&mut self, a: usize, b: usize) -> Option<(&mut Territory, &mut Territory)> {
        let len = self.territories.len();
        if a == b || a >= len || b >= len {
            return None;
        }
        if a < b {
            let (left, right) = self.territories.split_at_mut(b);
            Some((&mut left[a], &mut right[0]))
        } else {
            let (left, right) = self.territories.split_at_mut(a);
            Some((&mut right[0], &mut left[b]))
        }
    }
}
