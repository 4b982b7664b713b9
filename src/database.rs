//! The record store and the database operations built over it.
//!
//! Every operation scans the whole store and evaluates one compiled circuit
//! per record, whatever the query matches. The match predicate only ever
//! exists behind the engine, so skipping a record, or touching the matched
//! one differently, would reveal which record matched; the scan shape is
//! therefore identical on every call.

use core::fmt;

use crate::circuits::CircuitBoard;
use crate::error::Error;
use crate::WORD_BITS;

/// A 4-bit unsigned value, the unit of storage for keys and values.
///
/// The domain invariant is enforced at construction: a [`Nibble`] always
/// holds a value in `[0, 15]`, so circuit inputs built from nibbles never
/// trip the domain check downstream.
///
/// ## Examples
///
/// ```
/// use nibbledb::Nibble;
///
/// let nine = Nibble::new(9).unwrap();
/// assert_eq!(nine.get(), 9);
/// assert!(Nibble::new(16).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Nibble(u8);

impl Nibble {
    /// The largest representable nibble.
    pub const MAX: Self = Self((1 << WORD_BITS) - 1);

    /// Creates a nibble, rejecting values outside `[0, 15]`.
    pub fn new(value: u8) -> Result<Self, Error> {
        if value > Self::MAX.0 {
            return Err(Error::DomainViolation(value.into()));
        }
        Ok(Self(value))
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Nibble {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Error> {
        Self::new(value)
    }
}

impl fmt::Display for Nibble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One stored entry: an ordered `(key, value)` pair of nibbles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Record {
    pub key: Nibble,
    pub value: Nibble,
}

impl Record {
    #[must_use]
    pub const fn new(key: Nibble, value: Nibble) -> Self {
        Self { key, value }
    }
}

/// An ordered, plaintext-indexed sequence of records.
///
/// Positions matter only to delete's compaction; duplicate keys are legal
/// and every matching record participates in a retrieval's sum.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordStore(Vec<Record>);

impl RecordStore {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Appends a record at the end of the sequence.
    pub fn push(&mut self, record: Record) {
        self.0.push(record);
    }

    /// Removes and returns the last record, if any.
    pub fn pop(&mut self) -> Option<Record> {
        self.0.pop()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Record> {
        self.0.get(index)
    }

    /// The stored records, for direct inspection.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.0
    }

    pub(crate) fn set(&mut self, index: usize, record: Record) {
        self.0[index] = record;
    }
}

/// A key/value store whose records are only ever combined through the
/// compiled circuits, never through a native comparison.
///
/// Reads take `&self` and writes take `&mut self`, so a store can serve any
/// number of concurrent retrievals but only a single writer, and never both
/// at once.
///
/// ## Examples
///
/// ```
/// use nibbledb::{Database, Nibble};
///
/// let mut db = Database::new().unwrap();
/// db.insert(Nibble::new(5).unwrap(), Nibble::new(6).unwrap());
/// db.insert(Nibble::new(8).unwrap(), Nibble::new(9).unwrap());
///
/// assert_eq!(db.retrieve(Nibble::new(8).unwrap()).unwrap(), 9);
/// assert_eq!(db.retrieve(Nibble::new(14).unwrap()).unwrap(), 0);
/// ```
#[derive(Clone, Debug)]
pub struct Database {
    store: RecordStore,
    board: CircuitBoard,
}

impl Database {
    /// Creates an empty database, compiling the three operation circuits.
    pub fn new() -> Result<Self, Error> {
        Ok(Self {
            store: RecordStore::new(),
            board: CircuitBoard::new()?,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// The underlying store, for direct inspection.
    #[must_use]
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Appends a record. Insertion is a plaintext append and evaluates no
    /// circuit.
    pub fn insert(&mut self, key: Nibble, value: Nibble) {
        self.store.push(Record::new(key, value));
    }

    /// Sums the values stored under `query`.
    ///
    /// Every record contributes one circuit evaluation; a record whose key
    /// differs contributes 0. The sum of the deciphered contributions is
    /// folded in the plaintext domain, since the engine cannot carry one
    /// evaluation's output into the next. An empty store, or a query no key
    /// matches, yields the accumulator identity 0; duplicate keys yield the
    /// sum of all their values.
    pub fn retrieve(&self, query: Nibble) -> Result<u32, Error> {
        let circuit = self.board.retrieve();
        let mut total = 0u32;
        for record in self.store.records() {
            let args = [record.key.get(), record.value.get(), query.get()];
            let ciphered = circuit.cipher(&args)?;
            let result = circuit.run(&ciphered)?;
            total += u32::from(circuit.decipher(&result)[0]);
        }
        tracing::debug!(records = self.store.len(), query = %query, total, "retrieve scan");
        Ok(total)
    }

    /// Rewrites the value of every record whose key equals `key` to
    /// `new_value`, leaving keys untouched.
    ///
    /// Every record is rewritten exactly once per call, match or not: the
    /// circuit blends the record's own value back in when the key differs.
    /// The engine call for a record completes before that record's write,
    /// so a failure surfaces with no partial write for that record.
    pub fn update(&mut self, key: Nibble, new_value: Nibble) -> Result<(), Error> {
        let circuit = self.board.update();
        for index in 0..self.store.len() {
            let record = self.store.records()[index];
            let args = [
                record.key.get(),
                record.value.get(),
                key.get(),
                new_value.get(),
            ];
            let ciphered = circuit.cipher(&args)?;
            let result = circuit.run(&ciphered)?;
            let merged = circuit.decipher(&result)[0];
            let value = Nibble::new(merged as u8)?;
            self.store.set(index, Record::new(record.key, value));
        }
        tracing::debug!(records = self.store.len(), key = %key, "update scan");
        Ok(())
    }

    /// Removes one slot, compacting the store by shift-and-overwrite.
    ///
    /// The last record is popped as a carry pair; every remaining slot then
    /// keeps either itself or the carry, blended by whether its key matches
    /// `query`. The carry is never re-injected, so the store shrinks by
    /// exactly one whether or not the query matched anything. Callers who
    /// need to know whether a match occurred must check lengths and contents
    /// themselves; asking the scan would reveal the matched position.
    ///
    /// Fails with [`Error::EmptyStoreUnderflow`] when the store is empty.
    pub fn delete(&mut self, query: Nibble) -> Result<(), Error> {
        let carry = self.store.pop().ok_or(Error::EmptyStoreUnderflow)?;
        let circuit = self.board.delete();
        for index in 0..self.store.len() {
            let entry = self.store.records()[index];
            let args = [
                carry.key.get(),
                carry.value.get(),
                entry.key.get(),
                entry.value.get(),
                query.get(),
            ];
            let ciphered = circuit.cipher(&args)?;
            let result = circuit.run(&ciphered)?;
            let words = circuit.decipher(&result);
            let record = Record::new(Nibble::new(words[0] as u8)?, Nibble::new(words[1] as u8)?);
            self.store.set(index, record);
        }
        tracing::debug!(records = self.store.len(), query = %query, "delete scan");
        Ok(())
    }
}
