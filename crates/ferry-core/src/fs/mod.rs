//! Filesystem primitives shared across features.

pub mod path;

pub use path::{
    SOURCE_EXTENSIONS, is_path_specifier, normalize, relative_specifier, split_source_extension,
    to_slash,
};
