use thiserror::Error;

use std::io;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{operation} for the format {format} is not supported")]
    UnsupportedFormat {
        operation: &'static str,
        format: String,
    },

    #[error("you must register at least one normalizer to be able to {operation} objects")]
    NoNormalizerRegistered { operation: &'static str },

    #[error("could not {operation} object of type {type_name}, no supporting normalizer found")]
    UnsupportedType {
        operation: &'static str,
        type_name: String,
    },

    #[error("an unexpected value could not be normalized: {rendering}")]
    Unnormalizable { rendering: String },

    #[error("the method {method} is not implemented")]
    NotImplemented { method: &'static str },

    #[error("expected a value of type {expected}, got {found}")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("serde_json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("xml error: {0}")]
    Xml(String),

    #[error("{0}")]
    Message(String),
}

impl Error {
    /// Free-form failure raised by a normalizer or codec implementation.
    pub fn custom<T: core::fmt::Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

pub type Result<T> = core::result::Result<T, Error>;
