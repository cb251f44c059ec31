//! Functions for loading loader settings.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::errors::*;

/// A structure containing configuration data for the resource loaders, which are
/// used to specify the storage layout and the runtime environment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub env: EnvParams,
    pub layout: LayoutParams,
    pub loader: LoaderParams,
}

impl Settings {
    /// Loads settings from a JSON file. Missing fields take their default values.
    pub fn load_from<T: AsRef<Path>>(path: T) -> Result<Self> {
        let path = path.as_ref();
        info!("Loads settings from {:?}.", path);

        let file = fs::File::open(path).map_err(|err| Error::storage(path.display(), err))?;
        let settings = serde_json::from_reader(file)?;
        Ok(settings)
    }

    pub fn from_json<T: AsRef<str>>(json: T) -> Result<Self> {
        Ok(serde_json::from_str(json.as_ref())?)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EnvParams {
    /// Running inside the development environment. In-package assets are read from
    /// `LayoutParams::editor_dir` instead of the bundled storage.
    pub editor: bool,
    /// Enables debug logging of unresolvable paths.
    pub debug: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LayoutParams {
    /// Read-only storage bundled with the application.
    pub app_dir: PathBuf,
    /// Writable storage where patched or downloaded assets are placed.
    pub persistent_dir: PathBuf,
    /// Product directory used in place of `app_dir` by the development environment.
    pub editor_dir: PathBuf,
    /// Sub-directory holding bundles inside the storages above. Must be empty or end with '/'.
    pub bundles_dir: String,
}

impl Default for LayoutParams {
    fn default() -> Self {
        LayoutParams {
            app_dir: "StreamingAssets".into(),
            persistent_dir: "Persistent".into(),
            editor_dir: "Product".into(),
            bundles_dir: "Bundles/".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoaderParams {
    /// How long a released loader is kept alive for reuse before it gets disposed.
    pub gc_interval_ms: u64,
    /// Maximum bytes read by a file fetch per tick.
    pub fetch_chunk_size: usize,
}

impl Default for LoaderParams {
    fn default() -> Self {
        LoaderParams {
            gc_interval_ms: 1000,
            fetch_chunk_size: 64 * 1024,
        }
    }
}

impl LoaderParams {
    #[inline]
    pub fn gc_interval(&self) -> Duration {
        Duration::from_millis(self.gc_interval_ms)
    }
}
