// Lookup tables are the only non-linear primitive the execution engine
// evaluates, so every circuit decision ultimately reduces to one of these.
// Tables are immutable and shared; cloning one copies a pointer, not entries.

use std::sync::{Arc, LazyLock};

/// An immutable mapping from a small integer domain to nibble outputs,
/// evaluated by the execution engine without revealing which entry was
/// selected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LookupTable {
    entries: Arc<[u8]>,
}

impl LookupTable {
    /// Creates a table from its entries, indexed from zero.
    ///
    /// ## Panics
    ///
    /// This function will panic if `entries` is empty or if any entry does
    /// not fit in a nibble.
    pub fn new(entries: impl Into<Arc<[u8]>>) -> Self {
        let entries = entries.into();
        assert!(!entries.is_empty(), "A lookup table must not be empty");
        assert!(
            entries.iter().all(|&entry| entry <= 0xF),
            "Lookup table entries must fit in a nibble"
        );
        Self { entries }
    }

    /// The table extracting the most significant bit of a `domain_bits`-wide
    /// value.
    ///
    /// One such table exists per bit position: they share the same 2-entry
    /// truth-table shape at different input scalings, which is how a shift
    /// is expressed when the shifted value only exists behind the engine.
    #[must_use]
    pub fn high_bit(domain_bits: u32) -> Self {
        assert!(
            (1..=8).contains(&domain_bits),
            "Bit extraction domain must span 1 to 8 bits"
        );
        let entries: Vec<u8> = (0..1u16 << domain_bits)
            .map(|x| (x >> (domain_bits - 1)) as u8)
            .collect();
        Self::new(entries)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<u8> {
        self.entries.get(index).copied()
    }
}

/// One-bit equality over the sum of two bits: `EQUAL[l + r]` is 1 exactly
/// when the bits agree.
///
/// The table is indexed by the 2-bit sum domain, so it carries four entries
/// even though a sum of two bits never reaches index 3.
pub static EQUAL: LazyLock<LookupTable> = LazyLock::new(|| LookupTable::new([1, 0, 1, 1]));

/// The AND-reduction over four accumulated per-bit flags: 1 only when every
/// flag was set, i.e. when the input is 15.
pub static ALL_ONE: LazyLock<LookupTable> = LazyLock::new(|| {
    let mut entries = [0u8; 16];
    entries[15] = 1;
    LookupTable::new(entries)
});

/// One-bit AND over the sum of two bits: `AND2[p + v]` is 1 only when both
/// bits are set (index 2 when summing two bits; index 3 completes the 2-bit
/// index domain).
pub static AND2: LazyLock<LookupTable> = LazyLock::new(|| LookupTable::new([0, 0, 1, 1]));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_table() {
        // Sums 0 and 2 mean the bits agree.
        assert_eq!(EQUAL.get(0), Some(1));
        assert_eq!(EQUAL.get(1), Some(0));
        assert_eq!(EQUAL.get(2), Some(1));
        assert_eq!(EQUAL.len(), 4);
    }

    #[test]
    fn test_all_one_table() {
        assert_eq!(ALL_ONE.len(), 16);
        for index in 0..15 {
            assert_eq!(ALL_ONE.get(index), Some(0));
        }
        assert_eq!(ALL_ONE.get(15), Some(1));
    }

    #[test]
    fn test_and2_table() {
        assert_eq!(AND2.get(0), Some(0));
        assert_eq!(AND2.get(1), Some(0));
        assert_eq!(AND2.get(2), Some(1));
    }

    #[test]
    fn test_high_bit() {
        let table = LookupTable::high_bit(4);
        assert_eq!(table.len(), 16);
        for x in 0..16usize {
            assert_eq!(table.get(x), Some((x >> 3) as u8));
        }

        let table = LookupTable::high_bit(1);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0), Some(0));
        assert_eq!(table.get(1), Some(1));
    }

    #[test]
    fn test_get_out_of_range() {
        assert_eq!(EQUAL.get(4), None);
    }

    #[test]
    #[should_panic = "A lookup table must not be empty"]
    fn test_empty_panics() {
        let _ = LookupTable::new([]);
    }

    #[test]
    #[should_panic = "Lookup table entries must fit in a nibble"]
    fn test_wide_entry_panics() {
        let _ = LookupTable::new([0, 16]);
    }

    #[test]
    fn test_shared_entries() {
        let table = LookupTable::high_bit(2);
        let clone = table.clone();
        assert_eq!(table, clone);
    }
}
