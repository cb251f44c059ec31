use std::fs;

use crate::errors::*;
use crate::fetch::StreamFetcher;
use crate::loader::prelude::{LoadFailure, Loader, LoaderContext, LoaderMode, LoaderState};
use crate::res::{PathType, ResourceManager};

use super::Bytes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Created,
    Fetching,
    Finished,
    Aborted,
}

/// Loads the raw bytes behind a logical path.
pub struct BytesLoader {
    state: LoaderState<Bytes>,
    mode: LoaderMode,
    ctx: LoaderContext,
    stage: Stage,
    fetcher: Option<StreamFetcher>,
}

impl BytesLoader {
    pub fn new<T: Into<String>>(path: T, mode: LoaderMode, ctx: LoaderContext) -> Self {
        BytesLoader {
            state: LoaderState::new(path),
            mode,
            ctx,
            stage: Stage::Created,
            fetcher: None,
        }
    }

    #[inline]
    pub fn mode(&self) -> LoaderMode {
        self.mode
    }

    /// Returns true if a fetch has been started and not released yet.
    #[inline]
    pub fn is_fetching(&self) -> bool {
        self.fetcher.as_ref().map(|v| !v.is_released()).unwrap_or(false)
    }

    fn read(&self, res: &dyn ResourceManager, kind: PathType, location: &str) -> Result<Vec<u8>> {
        let path = self.state.path();

        if kind == PathType::InApp {
            if self.ctx.env().editor {
                let file = res.bundles_path_without_file_protocol().join(path);
                return fs::read(&file).map_err(|err| Error::storage(file.display(), err));
            }

            let relative = format!("{}{}", res.bundles_path_relative(), path);
            return res.load_sync_from_streaming_assets(&relative);
        }

        fs::read(location).map_err(|err| Error::storage(location, err))
    }
}

impl Loader for BytesLoader {
    type Output = Bytes;

    #[inline]
    fn state(&self) -> &LoaderState<Bytes> {
        &self.state
    }

    #[inline]
    fn state_mut(&mut self) -> &mut LoaderState<Bytes> {
        &mut self.state
    }

    fn start(&mut self) -> Result<()> {
        if self.stage != Stage::Created || self.state.is_disposed() {
            return Ok(());
        }

        // The host is shutting down if the resource manager is gone.
        let res = match self.ctx.resources() {
            Some(res) => res,
            None => {
                debug!(
                    "[BytesLoader] Aborts {} without resource manager.",
                    self.state.path()
                );
                self.stage = Stage::Aborted;
                return Ok(());
            }
        };

        let (kind, location) = res.full_path(self.state.path(), self.mode == LoaderMode::Async);

        if kind == PathType::Invalid {
            if self.ctx.env().debug {
                debug!("[BytesLoader] Could not find {}.", self.state.path());
            }

            self.stage = Stage::Finished;
            self.state.fail(LoadFailure::NotFound);
            return Ok(());
        }

        match self.mode {
            LoaderMode::Sync => {
                let bytes = self.read(&*res, kind, &location)?;
                self.stage = Stage::Finished;
                self.state.finish(Some(bytes.into()));
            }

            LoaderMode::Async => {
                self.fetcher = Some(StreamFetcher::begin(self.ctx.fetch(), &location));
                self.stage = Stage::Fetching;
            }
        }

        Ok(())
    }

    fn advance(&mut self) -> Result<()> {
        if self.state.is_disposed() || self.stage != Stage::Fetching {
            return Ok(());
        }

        let fetcher = match self.fetcher.as_mut() {
            Some(fetcher) => fetcher,
            None => return Ok(()),
        };

        fetcher.poll();

        if !fetcher.is_completed() {
            let progress = fetcher.progress();
            self.state.set_progress(progress);
            return Ok(());
        }

        self.stage = Stage::Finished;

        if !fetcher.is_success() {
            error!(
                "[BytesLoader] Failed to fetch {} from {}.",
                self.state.path(),
                fetcher.location()
            );

            self.state.fail(LoadFailure::FetchFailed);
            return Ok(());
        }

        match fetcher.take_bytes() {
            Some(bytes) => {
                self.state.finish(Some(bytes.into()));
            }
            None => {
                error!(
                    "[BytesLoader] Fetch of {} succeeded with no bytes.",
                    fetcher.location()
                );
                self.state.fail(LoadFailure::FetchFailed);
            }
        }

        Ok(())
    }

    fn dispose(&mut self, teardown: bool) {
        if self.state.dispose() {
            if let Some(mut fetcher) = self.fetcher.take() {
                fetcher.release(teardown);
            }
        }
    }
}
