//! Error types for archive operations

use thiserror::Error;

/// Errors that can occur while reading an NFC-e archive
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// IO error during archive operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid ZIP archive format
    #[error("Invalid ZIP archive: {0}")]
    InvalidZip(#[from] zip::result::ZipError),

    /// A member of the archive is password-protected
    #[error("Archive member '{0}' is password-protected")]
    PasswordProtected(String),

    /// The archive holds no member that could be an XML document
    #[error("Archive contains no XML documents")]
    NoXmlMembers,
}

/// Result type for archive operations
pub type Result<T> = std::result::Result<T, ArchiveError>;
