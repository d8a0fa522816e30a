//! Import path rewriting
//!
//! Maps each fetched file to its place in the consumer's project and
//! replays the placeholder templates recorded at build time as relative or
//! alias specifiers.

mod paths;
mod rewriter;

pub use paths::{InstallPaths, WILDCARD};
pub use rewriter::{RewrittenFile, Rewriter};
