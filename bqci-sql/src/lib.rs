//! bqci SQL - text-level SQL handling
//!
//! Neither module parses SQL. Both work on characters only:
//!
//! ```text
//! file contents
//!     ↓
//! split_statements   (on ';')
//!     ↓
//! Template::parse    ($ref / ${ref} markers)
//!     ↓
//! substitute_with_fallback(translation map)
//!     ↓
//! runnable statement
//! ```

pub mod splitter;
pub mod template;

pub use splitter::{split_statements, STATEMENT_SEPARATOR};
pub use template::{rewrite, MissingKey, Rewrite, Segment, Template, MARKER_PREFIX};
