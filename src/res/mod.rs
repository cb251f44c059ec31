//! Path resolution of resources.
//!
//! An asset is addressed by a logical path, like `"config.json"` or `"patch/update.bin"`,
//! relative to the bundles directory. Before anything is read, a `ResourceManager`
//! classifies the path:
//!
//! - `PathType::InApp`, the asset only exists in the read-only storage bundled with the
//! application.
//! - `PathType::External`, a patched or downloaded copy exists in the writable storage and
//! takes precedence over the bundled one.
//! - `PathType::Invalid`, the path could not be resolved at all.
//!
//! When the resolution is requested for network-capable fetching, the location carries a
//! scheme prefix (`file://`) so it could be handed to a `StreamFetch` as is.

pub mod layout;

pub mod prelude {
    pub use super::layout::DirectoryLayout;
    pub use super::{PathType, ResourceManager, FILE_PROTOCOL};
}

use std::path::Path;

use crate::errors::*;

/// Scheme prefix of locations on the local filesystem.
pub const FILE_PROTOCOL: &str = "file://";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathType {
    Invalid,
    InApp,
    External,
}

/// The asset-directory manager consumed by loaders.
pub trait ResourceManager: Send + Sync {
    /// Classifies `path` and returns its fully-qualified location. The location is prefixed
    /// with `FILE_PROTOCOL` if `allow_network` is set.
    fn full_path(&self, path: &str, allow_network: bool) -> (PathType, String);

    /// Reads a file from the bundled read-only storage, `relative` to its root.
    fn load_sync_from_streaming_assets(&self, relative: &str) -> Result<Vec<u8>>;

    /// Bundles directory relative to the root of the bundled storage.
    fn bundles_path_relative(&self) -> &str;

    /// Absolute bundles directory that in-package assets are read from.
    fn bundles_path_without_file_protocol(&self) -> &Path;

    /// `bundles_path_without_file_protocol` with the `file://` scheme prefix.
    fn bundles_path(&self) -> String {
        format!(
            "{}{}",
            FILE_PROTOCOL,
            self.bundles_path_without_file_protocol().display()
        )
    }
}
