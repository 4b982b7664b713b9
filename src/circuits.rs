//! The circuit layer: bit slicing, equality, conditional select, and the
//! oblivious blend, composed into the three database circuits.
//!
//! Everything here is built from lookup evaluations alone. A value that may
//! only exist behind the engine cannot be shifted, masked, or compared
//! natively, so each bit is extracted by a per-position lookup against the
//! current residual, and every decision point becomes an arithmetic blend
//! weighted by a 0/1 mask. No branch anywhere depends on a processed value.

use crate::engine::{sample_grid, CompiledCircuit};
use crate::error::Error;
use crate::graph::{CircuitBuilder, CircuitGraph, Wire};
use crate::table::{LookupTable, ALL_ONE, AND2, EQUAL};
use crate::WORD_BITS;

/// How many tuples each database circuit is compiled against.
pub(crate) const SAMPLE_POINTS: usize = 100;

/// Extracts bit `position` of `value` and clears it, returning
/// `(bit, residual)`.
///
/// The extraction is a [`LookupTable::high_bit`] evaluation against the
/// current residual, which must already have every bit above `position`
/// cleared. Iterating from the most significant position down and feeding
/// each residual into the next call walks a whole word in exactly one step
/// per bit; recomposition is the mirror image, an accumulation of bits
/// scaled back to their positions.
pub fn slice_bit(builder: &mut CircuitBuilder, value: Wire, position: u32) -> (Wire, Wire) {
    let table = LookupTable::high_bit(position + 1);
    let bit = builder.lookup(&table, value);
    let cleared = builder.shl(bit, position);
    let residual = builder.sub(value, cleared);
    (bit, residual)
}

/// Equality over two words: a single 0/1 wire that is 1 exactly when all
/// bits of `left` and `right` agree.
///
/// Each bit pair is tested through [`EQUAL`] and the per-bit flags are
/// accumulated at their bit positions; [`ALL_ONE`] then reduces the flag
/// word to a single bit, since no native AND-reduction exists over values
/// the engine holds.
pub fn equal(builder: &mut CircuitBuilder, left: Wire, right: Wire) -> Wire {
    let mut flags = builder.constant(0);
    let mut left = left;
    let mut right = right;
    for position in (0..WORD_BITS).rev() {
        let (left_bit, left_rest) = slice_bit(builder, left, position);
        let (right_bit, right_rest) = slice_bit(builder, right, position);
        let pair = builder.add(left_bit, right_bit);
        let agree = builder.lookup(&EQUAL, pair);
        let placed = builder.shl(agree, position);
        flags = builder.add(flags, placed);
        left = left_rest;
        right = right_rest;
    }
    builder.lookup(&ALL_ONE, flags)
}

/// Conditional select without a branch: `value` when `predicate` is 1,
/// 0 when it is 0.
///
/// Each bit of `value` is ANDed with the predicate through [`AND2`] and
/// accumulated back at its position, so the cost is identical whichever
/// way the predicate falls.
pub fn select(builder: &mut CircuitBuilder, predicate: Wire, value: Wire) -> Wire {
    let mut result = builder.constant(0);
    let mut value = value;
    for position in (0..WORD_BITS).rev() {
        let (bit, rest) = slice_bit(builder, value, position);
        let pair = builder.add(predicate, bit);
        let both = builder.lookup(&AND2, pair);
        let placed = builder.shl(both, position);
        result = builder.add(result, placed);
        value = rest;
    }
    result
}

/// Arithmetic blend between two words, weighted by a 0/1 predicate:
/// `on_match` when the predicate is 1, `otherwise` when it is 0.
pub fn blend(builder: &mut CircuitBuilder, predicate: Wire, on_match: Wire, otherwise: Wire) -> Wire {
    let kept = select(builder, predicate, on_match);
    let one = builder.constant(1);
    let inverted = builder.sub(one, predicate);
    let dropped = select(builder, inverted, otherwise);
    builder.add(kept, dropped)
}

// (key, value, query) -> value when the key matches, 0 otherwise.
fn retrieve_graph() -> CircuitGraph {
    let mut builder = CircuitBuilder::new(3);
    let key = builder.input(0);
    let value = builder.input(1);
    let query = builder.input(2);
    let matched = equal(&mut builder, key, query);
    let contribution = select(&mut builder, matched, value);
    builder.finish(&[contribution])
}

// (old_key, old_value, new_key, new_value) -> the value the record keeps.
fn update_graph() -> CircuitGraph {
    let mut builder = CircuitBuilder::new(4);
    let old_key = builder.input(0);
    let old_value = builder.input(1);
    let new_key = builder.input(2);
    let new_value = builder.input(3);
    let matched = equal(&mut builder, old_key, new_key);
    let merged = blend(&mut builder, matched, new_value, old_value);
    builder.finish(&[merged])
}

// (carry_key, carry_value, entry_key, entry_value, query) -> the pair the
// slot keeps: the carry when the entry matches the query, the entry itself
// otherwise.
fn delete_graph() -> CircuitGraph {
    let mut builder = CircuitBuilder::new(5);
    let carry_key = builder.input(0);
    let carry_value = builder.input(1);
    let entry_key = builder.input(2);
    let entry_value = builder.input(3);
    let query = builder.input(4);
    let matched = equal(&mut builder, entry_key, query);
    let kept_key = blend(&mut builder, matched, carry_key, entry_key);
    let kept_value = blend(&mut builder, matched, carry_value, entry_value);
    builder.finish(&[kept_key, kept_value])
}

/// The three database circuits, compiled once and shared by every
/// subsequent call.
#[derive(Clone, Debug)]
pub struct CircuitBoard {
    retrieve: CompiledCircuit,
    update: CompiledCircuit,
    delete: CompiledCircuit,
}

impl CircuitBoard {
    /// Compiles the retrieve, update, and delete circuits, each against a
    /// representative sample of its own arity.
    pub fn new() -> Result<Self, Error> {
        let retrieve = retrieve_graph().compile(&sample_grid(3, SAMPLE_POINTS))?;
        let update = update_graph().compile(&sample_grid(4, SAMPLE_POINTS))?;
        let delete = delete_graph().compile(&sample_grid(5, SAMPLE_POINTS))?;
        Ok(Self {
            retrieve,
            update,
            delete,
        })
    }

    #[must_use]
    pub fn retrieve(&self) -> &CompiledCircuit {
        &self.retrieve
    }

    #[must_use]
    pub fn update(&self) -> &CompiledCircuit {
        &self.update
    }

    #[must_use]
    pub fn delete(&self) -> &CompiledCircuit {
        &self.delete
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::iproduct;

    fn eval(circuit: &CompiledCircuit, args: &[u8]) -> u16 {
        let ciphered = circuit.cipher(args).unwrap();
        let result = circuit.run(&ciphered).unwrap();
        circuit.decipher(&result)[0]
    }

    fn compiled_equal() -> CompiledCircuit {
        let mut builder = CircuitBuilder::new(2);
        let left = builder.input(0);
        let right = builder.input(1);
        let matched = equal(&mut builder, left, right);
        builder
            .finish(&[matched])
            .compile(&sample_grid(2, SAMPLE_POINTS))
            .unwrap()
    }

    #[test]
    fn test_slice_bits() {
        let mut builder = CircuitBuilder::new(1);
        let mut value = builder.input(0);
        let mut bits = Vec::new();
        for position in (0..WORD_BITS).rev() {
            let (bit, rest) = slice_bit(&mut builder, value, position);
            bits.push(bit);
            value = rest;
        }
        let circuit = builder
            .finish(&bits)
            .compile(&sample_grid(1, SAMPLE_POINTS))
            .unwrap();

        for v in 0..16u8 {
            let ciphered = circuit.cipher(&[v]).unwrap();
            let result = circuit.run(&ciphered).unwrap();
            let expected: Vec<u16> = (0..WORD_BITS)
                .rev()
                .map(|k| u16::from(v >> k & 1))
                .collect();
            assert_eq!(circuit.decipher(&result), expected);
        }
    }

    #[test]
    fn test_equal_exhaustive() {
        let circuit = compiled_equal();
        for (a, b) in iproduct!(0..16u8, 0..16u8) {
            assert_eq!(eval(&circuit, &[a, b]), u16::from(a == b), "equal({a}, {b})");
        }
    }

    #[test]
    fn test_select_exhaustive() {
        let mut builder = CircuitBuilder::new(2);
        let predicate = builder.input(0);
        let value = builder.input(1);
        let selected = select(&mut builder, predicate, value);
        let circuit = builder
            .finish(&[selected])
            .compile(&sample_grid(2, SAMPLE_POINTS))
            .unwrap();

        for (p, v) in iproduct!(0..2u8, 0..16u8) {
            let expected = if p == 1 { u16::from(v) } else { 0 };
            assert_eq!(eval(&circuit, &[p, v]), expected, "select({p}, {v})");
        }
    }

    #[test]
    fn test_blend_exhaustive() {
        let mut builder = CircuitBuilder::new(3);
        let predicate = builder.input(0);
        let on_match = builder.input(1);
        let otherwise = builder.input(2);
        let blended = blend(&mut builder, predicate, on_match, otherwise);
        let circuit = builder
            .finish(&[blended])
            .compile(&sample_grid(3, SAMPLE_POINTS))
            .unwrap();

        for (p, a, b) in iproduct!(0..2u8, 0..16u8, 0..16u8) {
            let expected = u16::from(if p == 1 { a } else { b });
            assert_eq!(eval(&circuit, &[p, a, b]), expected, "blend({p}, {a}, {b})");
        }
    }

    #[test]
    fn test_equal_cost_is_fixed() {
        // The evaluation graph has the same shape whatever the inputs; a
        // matching pair and a differing pair run the very same circuit.
        let circuit = compiled_equal();
        assert_eq!(eval(&circuit, &[9, 9]), 1);
        assert_eq!(eval(&circuit, &[9, 6]), 0);
        assert_eq!(circuit.arity(), 2);
    }

    #[test]
    fn test_board_shapes() {
        let board = CircuitBoard::new().unwrap();
        assert_eq!(board.retrieve().arity(), 3);
        assert_eq!(board.update().arity(), 4);
        assert_eq!(board.delete().arity(), 5);
    }
}
