use std::fmt;

#[derive(Debug)]
pub enum ErrorKind {
    EmptyCatalog,
    Catalog(serde_json::Error),
    Io(std::io::Error),
    Http(reqwest::Error),
    BadEndpoint(String),
}

pub fn io_err(e: std::io::Error) -> ErrorKind {
    ErrorKind::Io(e)
}

pub fn json_err(e: serde_json::Error) -> ErrorKind {
    ErrorKind::Catalog(e)
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::EmptyCatalog => write!(f, "puzzle catalog is empty"),
            ErrorKind::Catalog(e) => write!(f, "malformed catalog: {}", e),
            ErrorKind::Io(e) => write!(f, "io: {}", e),
            ErrorKind::Http(e) => write!(f, "http client: {}", e),
            ErrorKind::BadEndpoint(url) => write!(f, "bad gif endpoint {:?}", url),
        }
    }
}

pub type GameResult<T> = Result<T, ErrorKind>;
