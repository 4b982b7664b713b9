//! An oblivious four-bit key/value store evaluated through homomorphic
//! lookup tables.
//!
//! Keys and values are nibbles, and every database operation is built out of
//! encrypted 1-bit lookups: a 4-bit equality test, a 4-bit conditional
//! select, and an arithmetic blend between two candidates weighted by a 0/1
//! mask. The execution engine evaluating those lookups cannot branch on the
//! words it holds, so no control-flow decision anywhere depends on a
//! processed value: each operation scans the whole store and evaluates a
//! fixed-shape circuit once per record, whatever the query matches.
//!
//! # Usage
//!
//! A [`Database`] compiles its three circuits once at construction and runs
//! them through the engine's strict `cipher`, `run`, `decipher` sequence on
//! every scan.
//!
//! ```
//! use nibbledb::{Database, Nibble};
//!
//! let mut db = Database::new().unwrap();
//!
//! db.insert(Nibble::new(1).unwrap(), Nibble::new(1).unwrap());
//! assert_eq!(db.retrieve(Nibble::new(1).unwrap()).unwrap(), 1);
//!
//! db.update(Nibble::new(1).unwrap(), Nibble::new(13).unwrap()).unwrap();
//! assert_eq!(db.retrieve(Nibble::new(1).unwrap()).unwrap(), 13);
//!
//! db.delete(Nibble::new(1).unwrap()).unwrap();
//! assert_eq!(db.retrieve(Nibble::new(1).unwrap()).unwrap(), 0);
//! ```
//!
//! Retrieval sums the values of every matching record, so duplicate keys
//! accumulate rather than shadow each other, and deletion always removes
//! exactly one slot whether or not the query matched: the last record is
//! carried leftward into the matched position. Both follow from the
//! single-scan shape above.
//!
//! # Building circuits
//!
//! The circuit layer is public: custom circuits are assembled on a
//! [`CircuitBuilder`] from the same pieces the database uses, then compiled
//! against a representative input sample that bounds each node's encoding
//! precision.
//!
//! ```
//! use nibbledb::{equal, sample_grid, CircuitBuilder};
//!
//! let mut builder = CircuitBuilder::new(2);
//! let left = builder.input(0);
//! let right = builder.input(1);
//! let matched = equal(&mut builder, left, right);
//! let circuit = builder.finish(&[matched]).compile(&sample_grid(2, 100)).unwrap();
//!
//! let args = circuit.cipher(&[7, 7]).unwrap();
//! let result = circuit.run(&args).unwrap();
//! assert_eq!(circuit.decipher(&result), vec![1]);
//! ```
//!
//! # The engine seam
//!
//! Encryption, ciphertext representation, and key management live behind the
//! engine boundary in [`CompiledCircuit`]. The bundled engine is a reference
//! backend that encodes words directly; a cryptographic backend slots in
//! behind the same compile/cipher/run/decipher contract without touching the
//! circuit or database layers.

mod circuits;
mod database;
mod engine;
mod error;
mod graph;
pub mod prelude;
mod table;

pub use circuits::{blend, equal, select, slice_bit, CircuitBoard};
pub use database::{Database, Nibble, Record, RecordStore};
pub use engine::{sample_grid, Ciphered, CipheredArgs, CipheredResult, CompiledCircuit};
pub use error::{EngineError, Error};
pub use graph::{CircuitBuilder, CircuitGraph, Wire};
pub use table::{LookupTable, ALL_ONE, AND2, EQUAL};

/// The word width every circuit is built for.
pub(crate) const WORD_BITS: u32 = 4;
