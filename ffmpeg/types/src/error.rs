/*!
    Error types for the frame processing pipeline.
*/

use thiserror::Error;

/**
    Error type for the frame processing pipeline.

    Every variant carries the diagnostic text reported by the underlying
    collaborator (container, codec, converter or filter graph).
*/
#[derive(Debug, Error)]
pub enum Error {
    /// Container or file could not be opened or probed.
    #[error("open error: {message}")]
    Open { message: String },
    /// No decoder/encoder available, or context allocation/open failed.
    #[error("codec error: {message}")]
    Codec { message: String },
    /// Pixel-format scale/convert failure.
    #[error("conversion error: {message}")]
    Conversion { message: String },
    /// Filter graph allocation, parse or configure failure.
    #[error("filter graph error: {message}")]
    FilterGraph { message: String },
    /// Byte-sink open/write/trailer failure reported by a collaborator.
    #[error("I/O error: {message}")]
    Io { message: String },
    /// Operating system I/O failure.
    #[error("I/O error: {0}")]
    IoSource(#[from] std::io::Error),
    /// Operation invoked outside its valid session state.
    #[error("state error: {message}")]
    State { message: String },
    /// Malformed input (bad dimensions, short buffers, unknown formats).
    #[error("invalid data: {message}")]
    InvalidData { message: String },
}

impl Error {
    /**
        Create an open error with the given message.
    */
    pub fn open(message: impl Into<String>) -> Self {
        Self::Open {
            message: message.into(),
        }
    }

    /**
        Create a codec error with the given message.
    */
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }

    /**
        Create a conversion error with the given message.
    */
    pub fn conversion(message: impl Into<String>) -> Self {
        Self::Conversion {
            message: message.into(),
        }
    }

    /**
        Create a filter graph error with the given message.
    */
    pub fn filter_graph(message: impl Into<String>) -> Self {
        Self::FilterGraph {
            message: message.into(),
        }
    }

    /**
        Create an I/O error with the given message.
    */
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /**
        Create a state error with the given message.
    */
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /**
        Create an invalid data error with the given message.
    */
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /**
        Returns true if this error was caused by an operation invoked in
        the wrong session state.
    */
    pub fn is_state(&self) -> bool {
        matches!(self, Self::State { .. })
    }

    /**
        Returns true if this is an I/O error of either flavour.
    */
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::IoSource(_))
    }
}

/**
    Result type alias for the frame processing pipeline.
*/
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn error_display() {
        let e = Error::codec("decoder not found");
        assert_eq!(format!("{e}"), "codec error: decoder not found");

        let e = Error::filter_graph("no such filter: 'foo'");
        assert_eq!(format!("{e}"), "filter graph error: no such filter: 'foo'");

        let e = Error::state("write after finalize");
        assert_eq!(format!("{e}"), "state error: write after finalize");

        let e = Error::open("No such file or directory");
        assert_eq!(format!("{e}"), "open error: No such file or directory");
    }

    #[test]
    fn error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let e: Error = io_err.into();
        assert!(e.is_io());
        assert!(format!("{e}").contains("file not found"));
    }

    #[test]
    fn error_kind_checks() {
        assert!(Error::state("closed").is_state());
        assert!(!Error::codec("x").is_state());
        assert!(Error::io("trailer").is_io());
        assert!(!Error::conversion("x").is_io());
    }

    #[test]
    fn error_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let e = Error::IoSource(io_err);
        assert!(StdError::source(&e).is_some());

        let e = Error::codec("test");
        assert!(StdError::source(&e).is_none());
    }
}
