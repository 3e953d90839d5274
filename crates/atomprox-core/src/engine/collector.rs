use super::cursor::AtomIndexCursor;
use crate::core::models::atom_set::AtomBitSet;

/// Drains a cursor into an atom set, applying the bound radius rule to every candidate.
///
/// Implemented for every [`AtomIndexCursor`].
pub trait BulkCollector: AtomIndexCursor {
    /// Adds every remaining candidate whose squared distance does not exceed its
    /// acceptance threshold. Returns the number of atoms newly inserted.
    fn add_atoms(&mut self, result: &mut AtomBitSet) -> usize {
        let mut added = 0;
        while self.has_next() {
            let Some(index) = self.next_index() else {
                continue;
            };
            let (Some(distance_squared), Some(limit)) = (
                self.found_distance_squared(),
                self.acceptance_threshold_squared(),
            ) else {
                continue;
            };
            if distance_squared <= limit && result.insert(index) {
                added += 1;
            }
        }
        added
    }

    fn collect_atoms(&mut self) -> AtomBitSet {
        let mut result = AtomBitSet::new();
        self.add_atoms(&mut result);
        result
    }
}

impl<T: AtomIndexCursor + ?Sized> BulkCollector for T {}
