//! # What is This?
//!
//! `hotbytes` resolves a logical asset path into a physical location, which lives either in
//! the read-only storage bundled with the application or in the writable storage where patched
//! and downloaded assets are placed, and then loads the raw bytes behind it.
//!
//! Bytes could be retrieved in two ways:
//!
//! 1. `LoaderMode::Sync` reads the file on the calling thread and finishes before `load`
//! returns. It is reserved for small in-package assets.
//! 2. `LoaderMode::Async` begins a stream fetch and polls it once per tick, copying its progress
//! into the loader until the fetch completes.
//!
//! Either way the finished buffer is published exactly once through the completion callbacks
//! of the loader, and a `None` result always means "no usable bytes".
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use hotbytes::prelude::*;
//!
//! let settings = Settings::load_from("settings.json")?;
//! let lifecycle = Arc::new(LifecycleSystem::new());
//!
//! let layout: Arc<dyn ResourceManager> =
//!     Arc::new(DirectoryLayout::new(&settings.layout, settings.env)?);
//! let fetch = Arc::new(SchemaFetch::with_defaults(&settings.loader));
//! let ctx = LoaderContext::new(&layout, fetch, settings.env);
//!
//! let bytes = BytesSystem::new(lifecycle.clone(), ctx, &settings.loader);
//! let handle = bytes.load("patch/update.bin", LoaderMode::Async)?;
//! bytes.on_finish(handle, |rsp| println!("{:?}", rsp.map(|v| v.len())));
//!
//! while !bytes.is_finished(handle) {
//!     lifecycle.advance()?;
//! }
//! ```

#[macro_use]
pub extern crate failure;
#[macro_use]
pub extern crate log;

#[macro_use]
pub mod utils;
pub mod application;
pub mod bytes;
pub mod errors;
pub mod fetch;
pub mod loader;
pub mod res;
pub mod settings;

pub mod prelude {
    pub use crate::application::prelude::*;
    pub use crate::bytes::{Bytes, BytesHandle, BytesSystem};
    pub use crate::errors::{Error, Result};
    pub use crate::fetch::prelude::*;
    pub use crate::loader::prelude::*;
    pub use crate::res::prelude::*;
    pub use crate::settings::{EnvParams, LayoutParams, LoaderParams, Settings};
}
