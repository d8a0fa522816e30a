//! Project configuration (`ferry.toml`)

pub mod parser;
pub mod schema;

pub use parser::{parse_ferry_toml, parse_ferry_toml_str, to_toml};
pub use schema::FerryConfig;

/// File name looked up in the project directory.
pub const CONFIG_FILE: &str = "ferry.toml";
