pub mod image;
pub mod roi;
pub mod runtime;
pub mod scalar;
pub mod timing;

pub use self::image::*;
pub use self::roi::*;
pub use self::runtime::*;
pub use self::scalar::*;
pub use self::timing::*;

pub use ::image::{GrayImage, ImageBuffer, Luma, Pixel, Rgb, RgbImage, Rgba, RgbaImage};

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("Out of bounds: {0}")]
    OutOfBounds(String),

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Channel mismatch: expected {expected} channels, got {actual}")]
    ChannelMismatch { expected: usize, actual: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
