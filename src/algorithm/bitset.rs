use bitvec::prelude::*;
use std::fmt;

/// Fixed-size bitset over catalog indices
///
/// Serves both as a cell's domain (prototypes still possible there) and as a
/// prototype's compiled compatibility list for one direction. Indices are
/// 0-based catalog positions. Provides O(1) membership testing and
/// word-wise set operations for the propagation loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DomainSet {
    bits: BitVec,
    capacity: usize,
}

impl DomainSet {
    /// Create a set with no prototypes present
    pub fn new(capacity: usize) -> Self {
        Self {
            bits: bitvec![0; capacity],
            capacity,
        }
    }

    /// Create a set containing every prototype in the catalog
    pub fn all(capacity: usize) -> Self {
        Self {
            bits: bitvec![1; capacity],
            capacity,
        }
    }

    /// Create a set holding exactly one prototype
    pub fn single(capacity: usize, index: usize) -> Self {
        let mut set = Self::new(capacity);
        set.insert(index);
        set
    }

    /// Build a set from catalog indices, ignoring any past the capacity
    pub fn from_indices<I>(capacity: usize, indices: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let mut set = Self::new(capacity);
        for index in indices {
            set.insert(index);
        }
        set
    }

    /// Number of catalog slots this set spans
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Insert a prototype index
    pub fn insert(&mut self, index: usize) {
        if index < self.capacity {
            self.bits.set(index, true);
        }
    }

    /// Remove a prototype index, returning whether it was present
    pub fn remove(&mut self, index: usize) -> bool {
        let present = self.contains(index);
        if present {
            self.bits.set(index, false);
        }
        present
    }

    /// Test prototype membership
    pub fn contains(&self, index: usize) -> bool {
        self.bits.get(index).as_deref() == Some(&true)
    }

    /// Intersect this set with another in-place
    pub fn intersect_with(&mut self, other: &Self) {
        self.bits &= &other.bits;
    }

    /// Union this set with another in-place
    pub fn union_with(&mut self, other: &Self) {
        self.bits |= &other.bits;
    }

    /// Create a new set containing the intersection
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.intersect_with(other);
        result
    }

    /// Remove every index also present in `other`
    pub fn subtract(&mut self, other: &Self) {
        for index in other.iter() {
            self.remove(index);
        }
    }

    /// Test whether every member is also in `other`
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.iter().all(|index| other.contains(index))
    }

    /// Test if no prototypes are present
    pub fn is_empty(&self) -> bool {
        self.bits.not_any()
    }

    /// Count prototypes in the set
    pub fn count(&self) -> usize {
        self.bits.count_ones()
    }

    /// The sole member, if the set holds exactly one prototype
    pub fn only(&self) -> Option<usize> {
        let mut ones = self.bits.iter_ones();
        match (ones.next(), ones.next()) {
            (Some(index), None) => Some(index),
            _ => None,
        }
    }

    /// Iterate member indices in ascending order
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter_ones()
    }

    /// Extract all member indices as a vector
    pub fn to_vec(&self) -> Vec<usize> {
        self.bits.iter_ones().collect()
    }
}

impl fmt::Display for DomainSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DomainSet({} prototypes: {:?})",
            self.count(),
            self.to_vec()
        )
    }
}
