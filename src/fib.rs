// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present facemgr Contributors

//! Forwarding Information Base (FIB)
//!
//! Maps name prefixes to the faces (next hops) interests under that prefix
//! may be forwarded to. The face table relies on
//! [`Fib::remove_next_hop_from_all_entries`] so that no entry keeps
//! pointing at a face once it has been removed.

use crate::face::FaceId;
use crate::packet::Name;
use std::collections::HashMap;

/// One candidate output face with its routing cost
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextHop {
    pub face: FaceId,
    pub cost: u64,
}

/// FIB entry for one name prefix
#[derive(Debug, Clone)]
pub struct FibEntry {
    prefix: Name,
    /// Kept sorted by ascending cost
    next_hops: Vec<NextHop>,
}

impl FibEntry {
    fn new(prefix: Name) -> Self {
        Self {
            prefix,
            next_hops: Vec::new(),
        }
    }

    pub fn prefix(&self) -> &Name {
        &self.prefix
    }

    pub fn next_hops(&self) -> &[NextHop] {
        &self.next_hops
    }

    pub fn has_next_hop(&self, face: FaceId) -> bool {
        self.next_hops.iter().any(|nh| nh.face == face)
    }

    fn add_or_update(&mut self, face: FaceId, cost: u64) {
        match self.next_hops.iter_mut().find(|nh| nh.face == face) {
            Some(nh) => nh.cost = cost,
            None => self.next_hops.push(NextHop { face, cost }),
        }
        self.next_hops.sort_by_key(|nh| nh.cost);
    }

    fn remove(&mut self, face: FaceId) -> bool {
        let before = self.next_hops.len();
        self.next_hops.retain(|nh| nh.face != face);
        self.next_hops.len() != before
    }
}

/// Forwarding Information Base
#[derive(Debug, Default)]
pub struct Fib {
    entries: HashMap<Name, FibEntry>,
}

impl Fib {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `face` as a next hop for `prefix`, or updates its cost
    pub fn add_or_update_next_hop(&mut self, prefix: Name, face: FaceId, cost: u64) {
        self.entries
            .entry(prefix.clone())
            .or_insert_with(|| FibEntry::new(prefix))
            .add_or_update(face, cost);
    }

    /// Removes `face` from the entry for `prefix`, erasing the entry if it
    /// has no next hop left
    pub fn remove_next_hop(&mut self, prefix: &Name, face: FaceId) -> bool {
        let Some(entry) = self.entries.get_mut(prefix) else {
            return false;
        };
        let removed = entry.remove(face);
        if entry.next_hops.is_empty() {
            self.entries.remove(prefix);
        }
        removed
    }

    /// Removes `face` from every entry; entries left empty are erased
    ///
    /// Returns the number of entries that referenced the face.
    pub fn remove_next_hop_from_all_entries(&mut self, face: FaceId) -> usize {
        let mut touched = 0;
        self.entries.retain(|_, entry| {
            if entry.remove(face) {
                touched += 1;
            }
            !entry.next_hops.is_empty()
        });
        touched
    }

    pub fn find_exact(&self, prefix: &Name) -> Option<&FibEntry> {
        self.entries.get(prefix)
    }

    /// Longest-prefix match for `name`
    pub fn find_longest_prefix_match(&self, name: &Name) -> Option<&FibEntry> {
        (0..=name.len())
            .rev()
            .find_map(|n| self.entries.get(&name.prefix(n)))
    }

    /// True if any entry lists `face` as a next hop
    pub fn references(&self, face: FaceId) -> bool {
        self.entries.values().any(|e| e.has_next_hop(face))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FibEntry> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FACE_A: FaceId = FaceId::new(1);
    const FACE_B: FaceId = FaceId::new(2);

    #[test]
    fn test_add_next_hop_sorted_by_cost() {
        let mut fib = Fib::new();
        fib.add_or_update_next_hop(Name::from("/a"), FACE_A, 10);
        fib.add_or_update_next_hop(Name::from("/a"), FACE_B, 5);

        let entry = fib.find_exact(&Name::from("/a")).unwrap();
        assert_eq!(entry.next_hops()[0].face, FACE_B);
        assert_eq!(entry.next_hops().len(), 2);

        fib.add_or_update_next_hop(Name::from("/a"), FACE_A, 1);
        let entry = fib.find_exact(&Name::from("/a")).unwrap();
        assert_eq!(entry.next_hops()[0], NextHop { face: FACE_A, cost: 1 });
        assert_eq!(entry.next_hops().len(), 2);
    }

    #[test]
    fn test_longest_prefix_match() {
        let mut fib = Fib::new();
        fib.add_or_update_next_hop(Name::root(), FACE_A, 0);
        fib.add_or_update_next_hop(Name::from("/a/b"), FACE_B, 0);

        let lpm = fib.find_longest_prefix_match(&Name::from("/a/b/c")).unwrap();
        assert_eq!(lpm.prefix(), &Name::from("/a/b"));

        let lpm = fib.find_longest_prefix_match(&Name::from("/x")).unwrap();
        assert_eq!(lpm.prefix(), &Name::root());
    }

    #[test]
    fn test_remove_next_hop_erases_empty_entry() {
        let mut fib = Fib::new();
        fib.add_or_update_next_hop(Name::from("/a"), FACE_A, 0);

        assert!(fib.remove_next_hop(&Name::from("/a"), FACE_A));
        assert!(fib.is_empty());
        assert!(!fib.remove_next_hop(&Name::from("/a"), FACE_A));
    }

    #[test]
    fn test_remove_next_hop_from_all_entries() {
        let mut fib = Fib::new();
        fib.add_or_update_next_hop(Name::from("/a"), FACE_A, 0);
        fib.add_or_update_next_hop(Name::from("/b"), FACE_A, 0);
        fib.add_or_update_next_hop(Name::from("/b"), FACE_B, 0);
        fib.add_or_update_next_hop(Name::from("/c"), FACE_B, 0);

        assert_eq!(fib.remove_next_hop_from_all_entries(FACE_A), 2);
        assert!(!fib.references(FACE_A));
        assert_eq!(fib.len(), 2);
        assert!(fib.find_exact(&Name::from("/a")).is_none());
        assert!(fib.references(FACE_B));
    }
}
