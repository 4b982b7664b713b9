//! Usage: `use nibbledb::prelude::*;`

pub use crate::{Database, Error, Nibble, Record, RecordStore};
