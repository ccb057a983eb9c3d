//! Error type and status-code mapping for all public operations.

use thiserror::Error;

/// Result type alias for steganographic operations.
pub type Result<T> = std::result::Result<T, StegError>;

/// Errors that can surface from the encode / decode / estimate pipelines.
///
/// Every variant maps to a small numeric status code (see [`StegError::code`])
/// kept stable for interface compatibility with older front-ends.
#[derive(Error, Debug)]
pub enum StegError {
    /// The input image could not be opened for reading.
    #[error("failed to open input file")]
    InputOpen(#[source] std::io::Error),

    /// The JPEG codec rejected the input (malformed or unsupported stream).
    #[error("JPEG codec failed: {reason}")]
    Codec { reason: String },

    /// The OS random source could not be opened or ran dry.
    #[error("cannot read from the OS random source")]
    EntropySource,

    /// The payload does not fit the image, or a length computation overflowed.
    #[error("data too long")]
    DataTooLong,

    /// An allocation request could not be satisfied.
    #[error("out of memory")]
    OutOfMemory,

    /// The stego image could not be written.
    #[error("error writing output image")]
    WriteImage(#[source] std::io::Error),

    /// Authenticated decode failed. Deliberately covers both a wrong
    /// passphrase and an image that never carried a message; the two are
    /// indistinguishable without the key.
    #[error("only garbage found")]
    Garbage,
}

impl StegError {
    /// Numeric status code of this error, from the stable code set
    /// (1, 2, 3, 10, 20, 30, 40; 0 is success).
    pub fn code(&self) -> u8 {
        match self {
            StegError::InputOpen(_) => 1,
            StegError::Codec { .. } => 2,
            StegError::EntropySource => 3,
            StegError::DataTooLong => 10,
            StegError::OutOfMemory => 20,
            StegError::WriteImage(_) => 30,
            StegError::Garbage => 40,
        }
    }
}

/// Fixed human-readable description for a numeric status code.
pub fn describe(code: u8) -> &'static str {
    match code {
        0 => "OK",
        1 => "Failed to open file",
        2 => "JPEG codec failed",
        3 => "Can't read data from the OS random source",
        10 => "Data too long",
        20 => "Out of memory",
        30 => "Error writing output image",
        40 => "Only garbage found",
        _ => "Unknown error",
    }
}

/// Shorthand for codec failures carrying a reason string.
pub(crate) fn codec(reason: impl Into<String>) -> StegError {
    StegError::Codec {
        reason: reason.into(),
    }
}
