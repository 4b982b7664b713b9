//! The execution-engine boundary.
//!
//! A circuit graph is compiled against a representative input sample, which
//! bounds the encoding precision of every node, and the compiled circuit is
//! then driven through the strict `cipher`, `run`, `decipher` sequence, once
//! per record per database call. [`Ciphered`] words are opaque outside this
//! module.
//!
//! This engine is a reference backend: it honors the exact compilation and
//! evaluation contract, but encodes words directly instead of encrypting
//! them, the way homomorphic toolchains exercise circuit logic through
//! trivial encodings. A cryptographic backend replaces this module only; the
//! circuit and database layers never inspect an encoded word either way.

use crate::error::{EngineError, Error};
use crate::graph::{CircuitGraph, Op};
use crate::WORD_BITS;

/// The largest value a circuit input may carry.
pub(crate) const MAX_WORD: u16 = (1 << WORD_BITS) - 1;

/// A representative sample spanning the full input hypercube.
///
/// The sample starts with every corner tuple (each coordinate 0 or 15) and
/// fills the remaining budget with an even sweep of the enumerated
/// hypercube. Corners pin the extreme value every circuit node can reach;
/// the sweep adds interior density. A thinner sample narrows the compiled
/// widths and the circuit wraps at runtime, so callers size `points`
/// generously (around 100).
///
/// ## Panics
///
/// This function will panic if `arity` is zero or above 8.
#[must_use]
pub fn sample_grid(arity: usize, points: usize) -> Vec<Vec<u8>> {
    assert!(
        (1..=8).contains(&arity),
        "Sample grids span 1 to 8 arguments"
    );
    let corners = 1usize << arity;
    let mut grid: Vec<Vec<u8>> = Vec::with_capacity(points.max(corners));
    for corner in 0..corners {
        grid.push(
            (0..arity)
                .map(|i| if corner >> i & 1 == 1 { MAX_WORD as u8 } else { 0 })
                .collect(),
        );
    }

    let sweep = points.saturating_sub(corners);
    let span = (1u64 << (u64::from(WORD_BITS) * arity as u64)) - 1;
    for i in 0..sweep {
        let x = if sweep > 1 {
            i as u64 * span / (sweep as u64 - 1)
        } else {
            span / 2
        };
        let mut tuple = vec![0u8; arity];
        let mut rest = x;
        for slot in tuple.iter_mut().rev() {
            *slot = (rest & u64::from(MAX_WORD)) as u8;
            rest >>= WORD_BITS;
        }
        grid.push(tuple);
    }
    grid
}

impl CircuitGraph {
    /// Compiles the graph against a representative input sample.
    ///
    /// Every sample tuple is evaluated in the plaintext domain, recording
    /// the maximum each node reaches; the node's encoding width is sized
    /// from that maximum. A lookup whose observed index escapes its table
    /// fails compilation.
    ///
    /// ## Arguments
    ///
    /// * `sample` - Input tuples spanning the domain, e.g. [`sample_grid`].
    pub fn compile(self, sample: &[Vec<u8>]) -> Result<CompiledCircuit, Error> {
        if sample.is_empty() {
            return Err(EngineError::EmptySample.into());
        }

        let mut maxes = vec![0u16; self.node_count()];
        let mut values = vec![0u16; self.node_count()];
        for tuple in sample {
            if tuple.len() != self.arity() {
                return Err(EngineError::SampleArity {
                    expected: self.arity(),
                    got: tuple.len(),
                }
                .into());
            }
            if let Some(&wide) = tuple.iter().find(|&&value| u16::from(value) > MAX_WORD) {
                return Err(EngineError::SampleOutOfDomain(wide.into()).into());
            }

            for (slot, op) in self.ops.iter().enumerate() {
                let value = match op {
                    Op::Input(index) => u16::from(tuple[*index]),
                    Op::Const(value) => u16::from(*value),
                    Op::Add(a, b) => values[a.0].wrapping_add(values[b.0]),
                    Op::Sub(a, b) => values[a.0].wrapping_sub(values[b.0]),
                    Op::Shl(a, bits) => values[a.0] << bits,
                    Op::Lookup(table, index) => {
                        let index = values[index.0];
                        match table.get(usize::from(index)) {
                            Some(entry) => u16::from(entry),
                            None => {
                                return Err(EngineError::LookupOutOfRange {
                                    index,
                                    len: table.len(),
                                }
                                .into())
                            }
                        }
                    }
                };
                values[slot] = value;
                maxes[slot] = maxes[slot].max(value);
            }
        }

        let widths: Vec<u32> = maxes.iter().map(|max| 16 - max.leading_zeros()).collect();
        tracing::debug!(
            nodes = self.node_count(),
            outputs = self.output_count(),
            samples = sample.len(),
            "compiled circuit"
        );
        Ok(CompiledCircuit {
            graph: self,
            widths,
        })
    }
}

/// A single word encoded for the execution engine.
///
/// The contents are private to the engine; the rest of the crate hands
/// these around without ever reading them.
#[derive(Clone, Copy, Debug)]
pub struct Ciphered(u16);

/// The encoded arguments for one circuit evaluation.
#[derive(Clone, Debug)]
pub struct CipheredArgs {
    words: Vec<Ciphered>,
}

/// The encoded outputs of one circuit evaluation.
#[derive(Clone, Debug)]
pub struct CipheredResult {
    words: Vec<Ciphered>,
}

/// A circuit compiled for the execution engine, with every node's encoding
/// width fixed by the representative sample it was compiled against.
#[derive(Clone, Debug)]
pub struct CompiledCircuit {
    graph: CircuitGraph,
    widths: Vec<u32>,
}

impl CompiledCircuit {
    #[must_use]
    pub fn arity(&self) -> usize {
        self.graph.arity()
    }

    /// Encodes plaintext arguments for evaluation.
    ///
    /// Arguments are checked against the nibble domain before anything is
    /// encoded, so an out-of-domain value never reaches a circuit.
    pub fn cipher(&self, args: &[u8]) -> Result<CipheredArgs, Error> {
        if args.len() != self.graph.arity() {
            return Err(EngineError::ArityMismatch {
                expected: self.graph.arity(),
                got: args.len(),
            }
            .into());
        }
        if let Some(&wide) = args.iter().find(|&&value| u16::from(value) > MAX_WORD) {
            return Err(Error::DomainViolation(wide.into()));
        }
        Ok(CipheredArgs {
            words: args.iter().map(|&value| Ciphered(u16::from(value))).collect(),
        })
    }

    /// Evaluates the circuit over encoded arguments.
    ///
    /// Every node wraps to its compiled width, like any fixed-precision
    /// encoding. A lookup index escaping its table surfaces as an engine
    /// failure.
    pub fn run(&self, args: &CipheredArgs) -> Result<CipheredResult, Error> {
        if args.words.len() != self.graph.arity() {
            return Err(EngineError::ArityMismatch {
                expected: self.graph.arity(),
                got: args.words.len(),
            }
            .into());
        }

        let mut values = vec![0u16; self.graph.node_count()];
        for (slot, op) in self.graph.ops.iter().enumerate() {
            let raw = match op {
                Op::Input(index) => args.words[*index].0,
                Op::Const(value) => u16::from(*value),
                Op::Add(a, b) => values[a.0].wrapping_add(values[b.0]),
                Op::Sub(a, b) => values[a.0].wrapping_sub(values[b.0]),
                Op::Shl(a, bits) => values[a.0] << bits,
                Op::Lookup(table, index) => {
                    let index = values[index.0];
                    u16::from(table.get(usize::from(index)).ok_or(
                        EngineError::LookupOutOfRange {
                            index,
                            len: table.len(),
                        },
                    )?)
                }
            };
            values[slot] = raw & mask(self.widths[slot]);
        }

        Ok(CipheredResult {
            words: self
                .graph
                .outputs
                .iter()
                .map(|wire| Ciphered(values[wire.0]))
                .collect(),
        })
    }

    /// Decodes the outputs of an evaluation, in output order.
    #[must_use]
    pub fn decipher(&self, result: &CipheredResult) -> Vec<u16> {
        result.words.iter().map(|word| word.0).collect()
    }
}

fn mask(width: u32) -> u16 {
    if width >= 16 {
        u16::MAX
    } else {
        (1u16 << width) - 1
    }
}
