//! Error types surfaced by database operations and the execution engine.

use thiserror::Error;

/// Failures a database operation can surface to its caller.
///
/// No failure is retried internally: engine failures are deterministic, so
/// every error reaches the caller of the operation that triggered it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// An input value does not fit in the 4-bit domain.
    ///
    /// The circuits assume exactly 4 significant bits and would silently wrap
    /// a wider value, so out-of-domain inputs are rejected before any circuit
    /// evaluation takes place.
    #[error("value {0} is outside the nibble domain [0, 15]")]
    DomainViolation(u16),

    /// The execution engine failed to compile or evaluate a circuit.
    #[error("execution engine failure: {0}")]
    EngineFailure(#[from] EngineError),

    /// `delete` was called on an empty store, leaving nothing to pop.
    #[error("cannot delete from an empty store")]
    EmptyStoreUnderflow,
}

/// Failures internal to the execution engine, wrapped by
/// [`Error::EngineFailure`] when they reach a caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A circuit was invoked with the wrong number of arguments.
    #[error("expected {expected} circuit arguments, got {got}")]
    ArityMismatch { expected: usize, got: usize },

    /// A lookup was driven past the end of its table.
    #[error("lookup index {index} is out of range for a {len}-entry table")]
    LookupOutOfRange { index: u16, len: usize },

    /// A circuit was compiled against an empty representative sample.
    #[error("representative input sample is empty")]
    EmptySample,

    /// A sample tuple does not match the circuit's argument count.
    #[error("sample tuple has {got} values but the circuit takes {expected}")]
    SampleArity { expected: usize, got: usize },

    /// A sample value falls outside the input domain.
    #[error("sample value {0} is outside the nibble domain [0, 15]")]
    SampleOutOfDomain(u16),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_wraps() {
        let error = Error::from(EngineError::EmptySample);
        assert_eq!(error, Error::EngineFailure(EngineError::EmptySample));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Error::DomainViolation(42).to_string(),
            "value 42 is outside the nibble domain [0, 15]"
        );
        assert_eq!(
            EngineError::LookupOutOfRange { index: 9, len: 4 }.to_string(),
            "lookup index 9 is out of range for a 4-entry table"
        );
    }
}
