//! Per-color piece roster kept sorted by coordinates.
//!
//! Lets the control map and move generator visit one side's pieces without
//! scanning all 64 squares.

use crate::engine::types::{Coords, PieceId};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PieceList {
    entries: Vec<(Coords, PieceId)>,
}

impl PieceList {
    pub fn new() -> Self {
        PieceList {
            entries: Vec::with_capacity(16),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, c: Coords) -> Result<usize, usize> {
        self.entries.binary_search_by(|(ec, _)| ec.cmp(&c))
    }

    pub fn contains(&self, c: Coords) -> bool {
        self.position(c).is_ok()
    }

    /// Panics if `c` is already listed.
    pub fn insert(&mut self, c: Coords, id: PieceId) {
        match self.position(c) {
            Ok(_) => panic!("piece list already holds {c}"),
            Err(i) => self.entries.insert(i, (c, id)),
        }
    }

    /// Panics if `c` is not listed.
    pub fn remove(&mut self, c: Coords) -> PieceId {
        match self.position(c) {
            Ok(i) => self.entries.remove(i).1,
            Err(_) => panic!("piece list has no entry at {c}"),
        }
    }

    pub fn relocate(&mut self, from: Coords, to: Coords) {
        let id = self.remove(from);
        self.insert(to, id);
    }

    /// Where the piece with `id` stands.
    pub fn coords_of(&self, id: PieceId) -> Option<Coords> {
        self.entries
            .iter()
            .find(|(_, eid)| *eid == id)
            .map(|(c, _)| *c)
    }

    pub fn iter(&self) -> PieceListIter<'_> {
        PieceListIter {
            list: self,
            next: 0,
        }
    }
}

/// Iterator over `(coords, id)` in `(rank, file)` order that can be rewound.
#[derive(Clone, Debug)]
pub struct PieceListIter<'a> {
    list: &'a PieceList,
    next: usize,
}

impl PieceListIter<'_> {
    /// Rewind to the first entry.
    pub fn restart(&mut self) {
        self.next = 0;
    }
}

impl Iterator for PieceListIter<'_> {
    type Item = (Coords, PieceId);

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.list.entries.get(self.next).copied();
        if item.is_some() {
            self.next += 1;
        }
        item
    }
}
