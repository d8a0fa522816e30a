//! Registry resolution
//!
//! Turns registry URLs into [`ResolvedRegistry`] values: a provider state
//! (cached by locator) plus the published manifest. Token lookup and the
//! state cache are explicit seams rather than globals.

mod cache;
mod resolver;
mod tokens;

pub use cache::{FileStateCache, MemoryStateCache, StateCache};
pub use resolver::{RegistryResolver, ResolvedRegistry};
pub use tokens::{EnvTokenStore, MemoryTokenStore, TokenStore};
