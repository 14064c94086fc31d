use std::fmt::{Display, Formatter};
use std::str::FromStr;

use thiserror::Error;

/// The category of a report. Used for filtering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorKey {
    Config,
    ReadError,
    ParseError,
    BraceError,
    BracePlacement,
    Encoding,
}

// This has to be kept up to date with ErrorKey and with its Display impl
impl FromStr for ErrorKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = match s {
            "config" => ErrorKey::Config,
            "read-error" => ErrorKey::ReadError,
            "parse-error" => ErrorKey::ParseError,
            "brace-error" => ErrorKey::BraceError,
            "brace-placement" => ErrorKey::BracePlacement,
            "encoding" => ErrorKey::Encoding,
            _ => {
                return Err(ParseKeyError::new("unknown error key"));
            }
        };
        Ok(key)
    }
}

impl Display for ErrorKey {
    fn fmt(&self, fmt: &mut Formatter) -> Result<(), std::fmt::Error> {
        match self {
            ErrorKey::Config => write!(fmt, "config"),
            ErrorKey::ReadError => write!(fmt, "read-error"),
            ErrorKey::ParseError => write!(fmt, "parse-error"),
            ErrorKey::BraceError => write!(fmt, "brace-error"),
            ErrorKey::BracePlacement => write!(fmt, "brace-placement"),
            ErrorKey::Encoding => write!(fmt, "encoding"),
        }
    }
}

#[derive(Debug, Error)]
#[error("{msg}")]
pub struct ParseKeyError {
    msg: String,
}

impl ParseKeyError {
    fn new(msg: &str) -> Self {
        ParseKeyError { msg: msg.to_owned() }
    }
}
