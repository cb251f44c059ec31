use std::fs;
use std::io::Read;
use std::path::PathBuf;

use crate::res::FILE_PROTOCOL;

use super::{FetchRequest, FetchState, StreamFetch};

/// Fetches files on the local host filesystem cooperatively: every poll reads at most
/// `chunk_size` bytes, so a large file never stalls a tick.
#[derive(Debug, Clone, Copy)]
pub struct FileFetch {
    chunk_size: usize,
}

impl FileFetch {
    pub fn new(chunk_size: usize) -> Self {
        FileFetch {
            chunk_size: chunk_size.max(1),
        }
    }
}

impl StreamFetch for FileFetch {
    fn begin(&self, location: &str) -> Box<dyn FetchRequest> {
        let path = if location.starts_with(FILE_PROTOCOL) {
            &location[FILE_PROTOCOL.len()..]
        } else {
            location
        };

        Box::new(FileRequest {
            path: path.into(),
            chunk_size: self.chunk_size as u64,
            file: None,
            len: 0,
            buf: Vec::new(),
            state: FetchState::Pending(0.0),
        })
    }
}

struct FileRequest {
    path: PathBuf,
    chunk_size: u64,
    file: Option<fs::File>,
    len: u64,
    buf: Vec<u8>,
    state: FetchState,
}

impl FileRequest {
    fn open(&mut self) -> ::std::io::Result<()> {
        let file = fs::File::open(&self.path)?;
        self.len = file.metadata()?.len();
        self.buf.reserve(self.len as usize);
        self.file = Some(file);
        Ok(())
    }

    fn read_chunk(&mut self) -> ::std::io::Result<FetchState> {
        if self.file.is_none() {
            self.open()?;
        }

        let n = match self.file.as_mut() {
            Some(file) => file.take(self.chunk_size).read_to_end(&mut self.buf)?,
            None => 0,
        };

        if self.buf.len() as u64 >= self.len {
            self.file = None;
            Ok(FetchState::Succeeded)
        } else if n == 0 {
            Err(::std::io::Error::new(
                ::std::io::ErrorKind::UnexpectedEof,
                format!("read {} of {} bytes", self.buf.len(), self.len),
            ))
        } else {
            Ok(FetchState::Pending(self.buf.len() as f32 / self.len as f32))
        }
    }
}

impl FetchRequest for FileRequest {
    fn poll(&mut self) -> FetchState {
        if let FetchState::Pending(_) = self.state {
            self.state = match self.read_chunk() {
                Ok(state) => state,
                Err(err) => {
                    self.file = None;
                    self.buf = Vec::new();
                    FetchState::Failed(format!("{:?}: {}", self.path, err))
                }
            };
        }

        self.state.clone()
    }

    fn take_bytes(&mut self) -> Option<Vec<u8>> {
        if let FetchState::Succeeded = self.state {
            Some(::std::mem::replace(&mut self.buf, Vec::new()))
        } else {
            None
        }
    }

    fn release(&mut self, _: bool) {
        self.file = None;
        self.buf = Vec::new();
    }
}
