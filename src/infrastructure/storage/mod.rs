//! Local storage adapters: the filesystem and the catalog cache

mod json_cache;
mod local_fs;

pub use json_cache::JsonCatalogCache;
pub use local_fs::LocalFileSystem;
