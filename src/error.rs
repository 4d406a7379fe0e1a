use std::io;
use thiserror::Error;

//===========================================================================//

/// The result type used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;

//===========================================================================//

/// An error encountered while building, writing or reading an ICO file.
#[derive(Debug, Error)]
pub enum Error {
    /// The caller supplied a bad value (an empty file reference, a malformed
    /// size, an RGBA buffer of the wrong length, and so on).
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// An image was too small or too large to be stored in an ICO file.
    #[error(
        "Invalid dimensions {width}x{height} \
         (width and height must each be between 1 and 256)"
    )]
    InvalidDimensions {
        /// The offending width, in pixels.
        width: u32,
        /// The offending height, in pixels.
        height: u32,
    },
    /// A source image could not be decoded.
    #[error("Image source not readable: {0}")]
    Unreadable(String),
    /// Serialization was attempted on a document with no entries.
    #[error("Cannot serialize an ICO document with no images")]
    EmptyDocument,
    /// Existing ICO data was malformed or uses unsupported features.
    #[error("Invalid ICO data: {0}")]
    InvalidData(String),
    /// Reading or writing a file failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Returns the broad category of this error.
    pub fn kind(&self) -> ErrorKind {
        match *self {
            Error::InvalidInput(_)
            | Error::InvalidDimensions { .. }
            | Error::Unreadable(_) => ErrorKind::InvalidInput,
            Error::EmptyDocument => ErrorKind::EmptyDocument,
            Error::InvalidData(_) => ErrorKind::InvalidData,
            Error::Io(_) => ErrorKind::Io,
        }
    }
}

//===========================================================================//

/// The broad category of an [`Error`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    /// Bad data or arguments from the caller; never worth retrying.
    InvalidInput,
    /// Serialization of a document with no entries.
    EmptyDocument,
    /// Malformed ICO data encountered while reading.
    InvalidData,
    /// An underlying I/O failure.
    Io,
}

//===========================================================================//


//===========================================================================//
