//! Commonly used utilities like hashers and pre-hashed keys.

pub mod hash;
pub mod hash_value;

pub use self::hash::{FastHashMap, FastHashSet};
pub use self::hash_value::HashValue;
