use std::io;

#[derive(Debug, Fail)]
pub enum Error {
    /// A definition element is malformed or misses a required attribute.
    #[fail(display = "{}", _0)]
    BadParam(String),
    /// A referenced group, resource or dependency is absent.
    #[fail(display = "{} could not be found.", _0)]
    NotFound(String),
    /// A duplicated load request, mount point or resource name.
    #[fail(display = "{} already exists.", _0)]
    AlreadyExists(String),
    #[fail(display = "{}", _0)]
    Io(#[cause] io::Error),
    /// Allocation of a payload buffer failed.
    #[fail(display = "Out of memory while {}.", _0)]
    NoMemory(String),
    /// Backend/driver failure, e.g. hardware resource creation.
    #[fail(display = "{}", _0)]
    Other(String),
}

pub type Result<T> = ::std::result::Result<T, Error>;

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<::serde_json::Error> for Error {
    fn from(err: ::serde_json::Error) -> Self {
        Error::BadParam(format!("{}", err))
    }
}

impl From<::bincode::Error> for Error {
    fn from(err: ::bincode::Error) -> Self {
        Error::BadParam(format!("{}", err))
    }
}
