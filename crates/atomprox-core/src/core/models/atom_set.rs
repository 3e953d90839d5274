use std::ops::Range;

const WORD_BITS: usize = u64::BITS as usize;

/// A growable set of atom indices with bitset semantics.
///
/// Membership tests are O(1) and iteration always yields indices in ascending
/// order. The set is used both to restrict proximity queries to a selection and
/// to accumulate query results.
#[derive(Debug, Clone, Default)]
pub struct AtomBitSet {
    words: Vec<u64>,
}

impl AtomBitSet {
    /// Creates a new, empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty set with room for indices below `bits` without reallocating.
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            words: Vec::with_capacity(bits.div_ceil(WORD_BITS)),
        }
    }

    /// Creates a set containing every index in `range`.
    pub fn from_range(range: Range<usize>) -> Self {
        let mut set = Self::with_capacity(range.end);
        for index in range {
            set.insert(index);
        }
        set
    }

    /// Adds `index` to the set.
    ///
    /// # Return
    ///
    /// Returns `true` if the index was not already present.
    pub fn insert(&mut self, index: usize) -> bool {
        let (word, bit) = Self::locate(index);
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        let was_set = self.words[word] & bit != 0;
        self.words[word] |= bit;
        !was_set
    }

    /// Removes `index` from the set.
    ///
    /// # Return
    ///
    /// Returns `true` if the index was present.
    pub fn remove(&mut self, index: usize) -> bool {
        let (word, bit) = Self::locate(index);
        match self.words.get_mut(word) {
            Some(w) if *w & bit != 0 => {
                *w &= !bit;
                true
            }
            _ => false,
        }
    }

    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        let (word, bit) = Self::locate(index);
        self.words.get(word).is_some_and(|w| w & bit != 0)
    }

    /// Returns the number of indices in the set.
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    pub fn clear(&mut self) {
        self.words.clear();
    }

    /// Finds the smallest index in the set that is greater than or equal to `from`.
    pub fn next_set_bit(&self, from: usize) -> Option<usize> {
        let mut word_idx = from / WORD_BITS;
        let mut word = *self.words.get(word_idx)? & (u64::MAX << (from % WORD_BITS));
        loop {
            if word != 0 {
                return Some(word_idx * WORD_BITS + word.trailing_zeros() as usize);
            }
            word_idx += 1;
            word = *self.words.get(word_idx)?;
        }
    }

    /// Returns an iterator over the indices in ascending order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            set: self,
            cursor: 0,
        }
    }

    /// Adds every index of `other` to this set.
    pub fn union_with(&mut self, other: &AtomBitSet) {
        if other.words.len() > self.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        for (dst, src) in self.words.iter_mut().zip(&other.words) {
            *dst |= *src;
        }
    }

    /// Keeps only the indices that are also present in `other`.
    pub fn intersect_with(&mut self, other: &AtomBitSet) {
        for (i, dst) in self.words.iter_mut().enumerate() {
            *dst &= other.words.get(i).copied().unwrap_or(0);
        }
    }

    /// Removes every index of `other` from this set.
    pub fn difference_with(&mut self, other: &AtomBitSet) {
        for (dst, src) in self.words.iter_mut().zip(&other.words) {
            *dst &= !*src;
        }
    }

    #[inline]
    fn locate(index: usize) -> (usize, u64) {
        (index / WORD_BITS, 1u64 << (index % WORD_BITS))
    }
}

impl PartialEq for AtomBitSet {
    fn eq(&self, other: &Self) -> bool {
        let longest = self.words.len().max(other.words.len());
        (0..longest).all(|i| {
            self.words.get(i).copied().unwrap_or(0) == other.words.get(i).copied().unwrap_or(0)
        })
    }
}

impl Eq for AtomBitSet {}

impl FromIterator<usize> for AtomBitSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl Extend<usize> for AtomBitSet {
    fn extend<I: IntoIterator<Item = usize>>(&mut self, iter: I) {
        for index in iter {
            self.insert(index);
        }
    }
}

impl<'a> IntoIterator for &'a AtomBitSet {
    type Item = usize;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Ascending iterator over the indices of an [`AtomBitSet`].
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    set: &'a AtomBitSet,
    cursor: usize,
}

impl Iterator for Iter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let found = self.set.next_set_bit(self.cursor)?;
        self.cursor = found + 1;
        Some(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_contains_track_membership() {
        let mut set = AtomBitSet::new();
        assert!(set.insert(3));
        assert!(set.insert(130));
        assert!(!set.insert(3));

        assert!(set.contains(3));
        assert!(set.contains(130));
        assert!(!set.contains(4));
        assert!(!set.contains(10_000));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn remove_reports_previous_membership() {
        let mut set: AtomBitSet = [1, 2, 70].into_iter().collect();
        assert!(set.remove(70));
        assert!(!set.remove(70));
        assert!(!set.remove(9_999));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn iteration_is_ascending_across_word_boundaries() {
        let set: AtomBitSet = [200, 0, 63, 64, 65, 127].into_iter().collect();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![0, 63, 64, 65, 127, 200]);
    }

    #[test]
    fn next_set_bit_starts_at_given_index() {
        let set: AtomBitSet = [5, 64, 190].into_iter().collect();
        assert_eq!(set.next_set_bit(0), Some(5));
        assert_eq!(set.next_set_bit(5), Some(5));
        assert_eq!(set.next_set_bit(6), Some(64));
        assert_eq!(set.next_set_bit(65), Some(190));
        assert_eq!(set.next_set_bit(191), None);
        assert_eq!(set.next_set_bit(100_000), None);
    }

    #[test]
    fn empty_set_reports_empty_after_removals() {
        let mut set = AtomBitSet::from_range(10..12);
        assert!(!set.is_empty());
        set.remove(10);
        set.remove(11);
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        assert_eq!(set.iter().next(), None);
    }

    #[test]
    fn set_operations_combine_membership() {
        let mut a: AtomBitSet = [1, 2, 3, 100].into_iter().collect();
        let b: AtomBitSet = [3, 4, 100, 300].into_iter().collect();

        let mut union = a.clone();
        union.union_with(&b);
        assert_eq!(union.iter().collect::<Vec<_>>(), vec![1, 2, 3, 4, 100, 300]);

        let mut intersection = a.clone();
        intersection.intersect_with(&b);
        assert_eq!(intersection.iter().collect::<Vec<_>>(), vec![3, 100]);

        a.difference_with(&b);
        assert_eq!(a.iter().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn equality_ignores_trailing_capacity() {
        let mut a: AtomBitSet = [1].into_iter().collect();
        a.insert(500);
        a.remove(500);
        let b: AtomBitSet = [1].into_iter().collect();
        assert_eq!(a, b);
    }
}
