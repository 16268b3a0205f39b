pub mod arithmetic;
pub mod bilateral;
pub mod border;
pub mod color;
pub mod convolve;
pub mod drawing;
pub mod font;
pub mod geometry;
pub mod resize;
pub mod simd;
pub mod threshold;

pub use arithmetic::*;
pub use bilateral::*;
pub use border::*;
pub use color::*;
pub use convolve::*;
pub use drawing::*;
pub use font::{get_text_size, FontFace, TextSize};
pub use geometry::*;
pub use resize::*;
pub use threshold::*;

pub type Result<T> = std::result::Result<T, ImgprocError>;

#[derive(Debug, thiserror::Error)]
pub enum ImgprocError {
    #[error("Image error: {0}")]
    ImageError(String),

    #[error("Algorithm error: {0}")]
    AlgorithmError(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl From<cv_core::CoreError> for ImgprocError {
    fn from(e: cv_core::CoreError) -> Self {
        match e {
            cv_core::CoreError::DimensionMismatch(msg) => ImgprocError::DimensionMismatch(msg),
            other => ImgprocError::ImageError(other.to_string()),
        }
    }
}

pub fn validate_image_size(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(ImgprocError::DimensionMismatch(
            "Image dimensions must be non-zero".into(),
        ));
    }
    Ok(())
}

pub(crate) fn ensure_same_size(a: (u32, u32), b: (u32, u32)) -> Result<()> {
    if a != b {
        return Err(ImgprocError::DimensionMismatch(format!(
            "{}x{} vs {}x{}",
            a.0, a.1, b.0, b.1
        )));
    }
    Ok(())
}
