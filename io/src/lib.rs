//! Image file I/O
//!
//! Reads and writes still images (PNG, JPEG, BMP, TIFF, GIF, ...):
//! - [`imread`] with a [`ReadMode`] selecting color, grayscale or unchanged decoding
//! - [`imwrite`] / [`imwrite_with_params`] with per-format [`WriteParam`]s
//! - [`imencode`] / [`imdecode`] for in-memory buffers

pub mod read;
pub mod write;

pub use read::{imdecode, imread, imread_color, imread_gray, ReadMode};
pub use write::{imencode, imwrite, imwrite_with_params, WriteParam};

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, IoError>;

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
