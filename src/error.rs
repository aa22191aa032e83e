use std::error::Error;
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum CaptionError {
    ParseError(String),
    InvalidInput(String),
    WriteFailure(io::Error),
}

impl Error for CaptionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CaptionError::WriteFailure(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for CaptionError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CaptionError::ParseError(msg) => write!(fmt, "{}", msg),
            CaptionError::InvalidInput(msg) => write!(fmt, "Invalid input: {}", msg),
            CaptionError::WriteFailure(err) => write!(fmt, "Failed to write subtitles: {}", err),
        }
    }
}

impl From<io::Error> for CaptionError {
    fn from(err: io::Error) -> Self {
        CaptionError::WriteFailure(err)
    }
}
