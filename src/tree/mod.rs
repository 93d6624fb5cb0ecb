//! Tree structures
//!
//! - [`PathTrie`] indexes separator-delimited paths with wildcard support
//! - [`RadixTree`] indexes literal keys for prefix lookup

mod error;
mod path;
mod radix;

pub use error::{Limit, TreeError};
pub use path::{
    PathTrie, TrieLimits, Wildcards, DEFAULT_MAX_MEMBERS_AT_LEVEL, DEFAULT_MAX_PATH_SEGMENTS,
    DEFAULT_MAX_PATH_SIZE,
};
pub use radix::RadixTree;
