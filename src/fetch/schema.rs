use std::collections::HashMap;
use std::sync::Arc;

use crate::settings::LoaderParams;

use super::file::FileFetch;
use super::{FetchRequest, FetchState, StreamFetch};

/// Routes locations to the `StreamFetch` attached for their schema, e.g. `file` for
/// `file:///tmp/a.bin`. Locations with an unknown or missing schema fail on first poll.
#[derive(Default, Clone)]
pub struct SchemaFetch {
    schemas: HashMap<String, Arc<dyn StreamFetch>>,
}

impl SchemaFetch {
    pub fn new() -> Self {
        SchemaFetch {
            schemas: HashMap::new(),
        }
    }

    /// Creates a `SchemaFetch` with a `FileFetch` attached to `file`.
    pub fn with_defaults(params: &LoaderParams) -> Self {
        let mut fetch = SchemaFetch::new();
        fetch
            .schemas
            .insert("file".into(), Arc::new(FileFetch::new(params.fetch_chunk_size)));
        fetch
    }

    /// Attaches or replaces the fetch of `schema`.
    pub fn attach<T1, T2>(&mut self, schema: T1, fetch: T2) -> Result<(), failure::Error>
    where
        T1: Into<String>,
        T2: StreamFetch + 'static,
    {
        let schema = schema.into();

        if schema.is_empty() {
            bail!("Schema could not be empty.");
        }

        if !schema
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
        {
            bail!("Schema {} contains invalid characters.", schema);
        }

        info!("Attaches stream fetch with schema {}.", schema);
        self.schemas.insert(schema, Arc::new(fetch));
        Ok(())
    }

    #[inline]
    pub fn has<T: AsRef<str>>(&self, schema: T) -> bool {
        self.schemas.contains_key(schema.as_ref())
    }
}

impl StreamFetch for SchemaFetch {
    fn begin(&self, location: &str) -> Box<dyn FetchRequest> {
        let schema = match location.find("://") {
            Some(index) => &location[..index],
            None => {
                return Box::new(FailedRequest(format!(
                    "Location {} must have a schema!",
                    location
                )));
            }
        };

        match self.schemas.get(schema) {
            Some(fetch) => fetch.begin(location),
            None => Box::new(FailedRequest(format!(
                "The schema of location {} has not been supported yet!",
                location
            ))),
        }
    }
}

struct FailedRequest(String);

impl FetchRequest for FailedRequest {
    fn poll(&mut self) -> FetchState {
        FetchState::Failed(self.0.clone())
    }

    fn take_bytes(&mut self) -> Option<Vec<u8>> {
        None
    }

    fn release(&mut self, _: bool) {}
}
