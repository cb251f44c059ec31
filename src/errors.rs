use std::fmt::Display;
use std::io;

use failure::Fail;

#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "{}", _0)]
    IO(#[cause] io::Error),
    #[fail(display = "Failed to read {}: {}", location, cause)]
    Storage {
        location: String,
        #[cause]
        cause: io::Error,
    },
    #[fail(display = "{}", _0)]
    Json(#[cause] serde_json::Error),
    #[fail(display = "{}", _0)]
    Malformed(String),
}

pub type Result<T, E = Error> = ::std::result::Result<T, E>;

impl Error {
    /// Wraps an I/O failure that happened while reading bytes from `location`.
    pub fn storage<T: Display>(location: T, cause: io::Error) -> Self {
        Error::Storage {
            location: location.to_string(),
            cause,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::IO(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}
