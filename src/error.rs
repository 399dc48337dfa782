use std::fmt;

#[derive(Debug)]
pub enum Error {
    Http(reqwest::Error),
    Api { status: u16, body: String },
    AuthExpired,
    AuthFailed,
    MissingCredentials(&'static str),
    MissingField { device_id: String, field: String },
    InvalidDevice(usize),
    Protocol(String),
    Json(serde_json::Error),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Http(e) => write!(f, "HTTP error: {e}"),
            Error::Api { status, body } => write!(f, "API error {status}: {body}"),
            Error::AuthExpired => write!(f, "authorization expired after token refresh"),
            Error::AuthFailed => write!(f, "token refresh failed"),
            Error::MissingCredentials(what) => write!(f, "missing credentials: {what}"),
            Error::MissingField { device_id, field } => {
                write!(f, "device {device_id} has no field {field}")
            }
            Error::InvalidDevice(index) => write!(f, "invalid device index: {index}"),
            Error::Protocol(msg) => write!(f, "protocol error: {msg}"),
            Error::Json(e) => write!(f, "JSON error: {e}"),
            Error::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(e) => Some(e),
            Error::Json(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
