//! Fixed-capacity bitset over entity ids.
//!
//! An [`EntitySet`] is the selection state behind every query. Bits are
//! stored in `u64` words; bits at or beyond `capacity` are always zero, so
//! word-wise comparisons and popcounts never see stray tail bits.

use std::fmt;

use crate::{error::SiftError, SiftResult};

/// Handle of an entity in a pool.
pub type EntityId = usize;

const WORD_BITS: usize = u64::BITS as usize;

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct EntitySet {
    words: Vec<u64>,
    capacity: usize,
}

impl EntitySet {
    /// Creates an empty set able to hold ids in `0..capacity`.
    pub fn new(capacity: usize) -> Self {
        Self {
            words: vec![0; capacity.div_ceil(WORD_BITS)],
            capacity,
        }
    }

    /// Creates a set holding every id in `0..capacity`.
    pub fn full(capacity: usize) -> Self {
        let mut set = Self::new(capacity);
        set.set_all();
        set
    }

    pub fn from_ids<I>(capacity: usize, ids: I) -> SiftResult<Self>
    where
        I: IntoIterator<Item = EntityId>,
    {
        let mut set = Self::new(capacity);
        for id in ids {
            set.add(id)?;
        }
        Ok(set)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of ids in the set.
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    fn check(&self, id: EntityId) -> SiftResult<()> {
        if id >= self.capacity {
            return Err(SiftError::OutOfRange {
                id,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    pub fn add(&mut self, id: EntityId) -> SiftResult<()> {
        self.check(id)?;
        self.set(id);
        Ok(())
    }

    pub fn remove(&mut self, id: EntityId) -> SiftResult<()> {
        self.check(id)?;
        self.words[id / WORD_BITS] &= !(1 << (id % WORD_BITS));
        Ok(())
    }

    /// Sets a bit the caller already knows to be in range.
    pub(crate) fn set(&mut self, id: EntityId) {
        debug_assert!(id < self.capacity);
        self.words[id / WORD_BITS] |= 1 << (id % WORD_BITS);
    }

    /// Returns whether `id` is in the set. Out-of-range ids are never contained.
    pub fn contains(&self, id: EntityId) -> bool {
        id < self.capacity && self.words[id / WORD_BITS] & (1 << (id % WORD_BITS)) != 0
    }

    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    pub fn set_all(&mut self) {
        self.words.fill(u64::MAX);
        self.mask_tail();
    }

    fn mask_tail(&mut self) {
        let used = self.capacity % WORD_BITS;
        if used != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1 << used) - 1;
            }
        }
    }

    /// Adds every id of `other`. Ids beyond this set's capacity are dropped.
    pub fn union_with(&mut self, other: &EntitySet) {
        for (word, theirs) in self.words.iter_mut().zip(&other.words) {
            *word |= theirs;
        }
        self.mask_tail();
    }

    /// Keeps only ids also present in `other`.
    pub fn intersect_with(&mut self, other: &EntitySet) {
        for (i, word) in self.words.iter_mut().enumerate() {
            *word &= other.words.get(i).copied().unwrap_or(0);
        }
    }

    /// Removes every id present in `other`.
    pub fn difference_with(&mut self, other: &EntitySet) {
        for (word, theirs) in self.words.iter_mut().zip(&other.words) {
            *word &= !theirs;
        }
    }

    pub fn union(&self, other: &EntitySet) -> EntitySet {
        let mut out = self.clone();
        out.union_with(other);
        out
    }

    pub fn intersection(&self, other: &EntitySet) -> EntitySet {
        let mut out = self.clone();
        out.intersect_with(other);
        out
    }

    pub fn difference(&self, other: &EntitySet) -> EntitySet {
        let mut out = self.clone();
        out.difference_with(other);
        out
    }

    /// True if no id is in both sets. Stops at the first shared word.
    pub fn is_intersection_empty(&self, other: &EntitySet) -> bool {
        !self
            .words
            .iter()
            .zip(&other.words)
            .any(|(a, b)| a & b != 0)
    }

    pub fn is_subset_of(&self, other: &EntitySet) -> bool {
        self.words
            .iter()
            .enumerate()
            .all(|(i, w)| w & !other.words.get(i).copied().unwrap_or(0) == 0)
    }

    /// Smallest set id `>= from`, skipping zero words.
    fn next_set_bit(&self, from: usize) -> Option<EntityId> {
        if from >= self.capacity {
            return None;
        }

        let mut index = from / WORD_BITS;
        let mut word = self.words[index] & (u64::MAX << (from % WORD_BITS));
        loop {
            if word != 0 {
                return Some(index * WORD_BITS + word.trailing_zeros() as usize);
            }
            index += 1;
            word = *self.words.get(index)?;
        }
    }

    /// Cursor positioned at the smallest id, or at the end for an empty set.
    pub fn cursor(&self) -> Cursor<'_> {
        let mut cursor = self.cursor_end();
        cursor.rewind();
        cursor
    }

    pub fn cursor_end(&self) -> Cursor<'_> {
        Cursor {
            set: self,
            pos: self.capacity,
        }
    }

    /// Ids in ascending order.
    pub fn iter(&self) -> Cursor<'_> {
        self.cursor()
    }
}

impl fmt::Debug for EntitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<'a> IntoIterator for &'a EntitySet {
    type Item = EntityId;
    type IntoIter = Cursor<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Forward cursor over the ids of an [`EntitySet`].
///
/// The end position is `capacity`, so every end cursor of a set compares
/// equal. As an [`Iterator`] it yields the current id and then advances.
#[derive(Clone)]
pub struct Cursor<'a> {
    set: &'a EntitySet,
    pos: usize,
}

impl Cursor<'_> {
    /// Current id, or `None` at the end.
    pub fn current(&self) -> Option<EntityId> {
        (self.pos < self.set.capacity).then_some(self.pos)
    }

    pub fn is_end(&self) -> bool {
        self.pos >= self.set.capacity
    }

    /// Moves to the next id, or to the end. Does nothing at the end.
    pub fn advance(&mut self) {
        if !self.is_end() {
            self.pos = self
                .set
                .next_set_bit(self.pos + 1)
                .unwrap_or(self.set.capacity);
        }
    }

    /// Moves to the smallest id `>= target`.
    ///
    /// A negative target rewinds to the first id; a target at or past the
    /// capacity lands on the end.
    pub fn seek(&mut self, target: isize) {
        match usize::try_from(target) {
            Ok(target) => {
                self.pos = self
                    .set
                    .next_set_bit(target)
                    .unwrap_or(self.set.capacity);
            }
            Err(_) => self.rewind(),
        }
    }

    pub fn rewind(&mut self) {
        self.pos = self.set.next_set_bit(0).unwrap_or(self.set.capacity);
    }
}

impl PartialEq for Cursor<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.set, other.set) && self.pos == other.pos
    }
}

impl Eq for Cursor<'_> {}

impl fmt::Debug for Cursor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor").field("pos", &self.current()).finish()
    }
}

impl Iterator for Cursor<'_> {
    type Item = EntityId;

    fn next(&mut self) -> Option<EntityId> {
        let current = self.current()?;
        self.advance();
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_of(capacity: usize, ids: &[EntityId]) -> EntitySet {
        EntitySet::from_ids(capacity, ids.iter().copied()).unwrap()
    }

    #[test]
    fn test_add_contains_remove() {
        let mut set = EntitySet::new(130);
        for id in 0..130 {
            set.add(id).unwrap();
            assert!(set.contains(id));
            set.remove(id).unwrap();
            assert!(!set.contains(id));
        }
        assert!(set.is_empty());
    }

    #[test]
    fn test_out_of_range() {
        let mut set = EntitySet::new(32);
        assert!(!set.contains(32));
        assert!(!set.contains(usize::MAX));
        assert!(matches!(
            set.add(32),
            Err(SiftError::OutOfRange {
                id: 32,
                capacity: 32
            })
        ));
        assert!(matches!(set.remove(100), Err(SiftError::OutOfRange { .. })));
    }

    #[test]
    fn test_basic_scenario() {
        let mut set = set_of(32, &[0, 2, 28, 30]);
        assert!(set.contains(0));
        assert!(!set.contains(1));
        assert!(set.contains(28));

        set.union_with(&set_of(32, &[0, 1]));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![0, 1, 2, 28, 30]);
        assert!(!set.contains(3));
        assert_eq!(set.len(), 5);
    }

    #[test]
    fn test_set_algebra_laws() {
        let a = set_of(200, &[1, 5, 64, 65, 127, 199]);
        let b = set_of(200, &[0, 5, 65, 128, 199]);

        assert_eq!(a.union(&b), b.union(&a));
        assert!(a.intersection(&b).is_subset_of(&a));
        assert!(a.intersection(&b).is_subset_of(&b));
        assert!(a.difference(&a).is_empty());
        assert_eq!(a.intersection(&b).iter().collect::<Vec<_>>(), vec![5, 65, 199]);
        assert_eq!(a.difference(&b).iter().collect::<Vec<_>>(), vec![1, 64, 127]);

        assert!(!a.is_intersection_empty(&b));
        let c = set_of(200, &[2, 66]);
        assert!(a.is_intersection_empty(&c));
        assert!(a.intersection(&c).is_empty());
    }

    #[test]
    fn test_mixed_capacities() {
        let small = set_of(10, &[1, 9]);
        let large = set_of(300, &[1, 2, 250]);

        let mut grown = large.clone();
        grown.union_with(&small);
        assert_eq!(grown.iter().collect::<Vec<_>>(), vec![1, 2, 9, 250]);

        let mut trimmed = small.clone();
        trimmed.union_with(&large);
        assert_eq!(trimmed.iter().collect::<Vec<_>>(), vec![1, 2, 9]);
        assert_eq!(trimmed.capacity(), 10);

        let mut cut = large.clone();
        cut.intersect_with(&small);
        assert_eq!(cut.iter().collect::<Vec<_>>(), vec![1]);

        let mut rest = large.clone();
        rest.difference_with(&small);
        assert_eq!(rest.iter().collect::<Vec<_>>(), vec![2, 250]);

        assert!(!large.is_subset_of(&small));
        assert!(set_of(300, &[1]).is_subset_of(&small));
    }

    #[test]
    fn test_full_and_clear() {
        let mut set = EntitySet::full(70);
        assert_eq!(set.len(), 70);
        assert!(set.contains(69));
        assert!(!set.contains(70));
        assert_eq!(set.iter().last(), Some(69));

        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.capacity(), 70);
    }

    #[test]
    fn test_iteration_matches_contains() {
        let ids = [3, 63, 64, 500, 1023, 1024, 4095];
        let set = set_of(4096, &ids);
        let iterated: Vec<_> = set.iter().collect();
        assert_eq!(iterated, ids.to_vec());

        let looked_up: Vec<_> = (0..4096).filter(|&id| set.contains(id)).collect();
        assert_eq!(iterated, looked_up);
    }

    #[test]
    fn test_cursor_begin_end() {
        let empty = EntitySet::new(64);
        assert_eq!(empty.cursor(), empty.cursor_end());
        assert!(empty.cursor().is_end());

        let zero = EntitySet::new(0);
        assert_eq!(zero.cursor(), zero.cursor_end());

        let set = set_of(64, &[10, 20]);
        let mut cursor = set.cursor();
        assert_eq!(cursor.current(), Some(10));
        cursor.advance();
        assert_eq!(cursor.current(), Some(20));
        cursor.advance();
        assert_eq!(cursor, set.cursor_end());
        cursor.advance();
        assert_eq!(cursor, set.cursor_end());
    }

    #[test]
    fn test_cursor_seek() {
        let set = set_of(1000, &[5, 70, 640, 999]);
        let mut cursor = set.cursor();

        cursor.seek(6);
        assert_eq!(cursor.current(), Some(70));
        cursor.seek(70);
        assert_eq!(cursor.current(), Some(70));
        cursor.seek(641);
        assert_eq!(cursor.current(), Some(999));
        cursor.seek(-4);
        assert_eq!(cursor, set.cursor());
        cursor.seek(1000);
        assert!(cursor.is_end());
        cursor.seek(isize::MAX);
        assert_eq!(cursor, set.cursor_end());

        let mut cursor = set.cursor();
        cursor.seek(0);
        assert_eq!(cursor.current(), Some(5));
        assert_eq!(cursor.collect::<Vec<_>>(), vec![5, 70, 640, 999]);
    }

    #[test]
    fn test_sparse_million_bit_set() {
        let set = set_of(1_000_000, &[0, 999_999]);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![0, 999_999]);

        let mut cursor = set.cursor();
        cursor.seek(1);
        assert_eq!(cursor.current(), Some(999_999));
    }

    #[test]
    fn test_debug_lists_ids() {
        assert_eq!(format!("{:?}", set_of(16, &[1, 3])), "{1, 3}");
    }
}
