use crate::image::U8Pixel;

/// A per-channel constant, used for constant borders and fills.
///
/// Channel `c` of a pixel receives `self.0[c]`; images with fewer than four
/// channels ignore the trailing entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Scalar(pub [u8; 4]);

impl Scalar {
    pub const BLACK: Scalar = Scalar([0, 0, 0, 0]);

    pub fn new(c0: u8, c1: u8, c2: u8, c3: u8) -> Self {
        Self([c0, c1, c2, c3])
    }

    pub fn all(v: u8) -> Self {
        Self([v; 4])
    }

    pub fn channel(&self, c: usize) -> u8 {
        self.0.get(c).copied().unwrap_or(0)
    }

    pub fn to_pixel<P: U8Pixel>(&self) -> P {
        let channels = P::CHANNEL_COUNT as usize;
        *P::from_slice(&self.0[..channels])
    }
}

impl From<u8> for Scalar {
    fn from(v: u8) -> Self {
        Scalar::all(v)
    }
}

impl From<[u8; 3]> for Scalar {
    fn from(v: [u8; 3]) -> Self {
        Scalar([v[0], v[1], v[2], 0])
    }
}

impl From<[u8; 4]> for Scalar {
    fn from(v: [u8; 4]) -> Self {
        Scalar(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    #[test]
    fn scalar_converts_to_pixels() {
        let s = Scalar::from([255, 0, 10]);
        assert_eq!(s.to_pixel::<Rgb<u8>>(), Rgb([255, 0, 10]));
        assert_eq!(s.to_pixel::<Luma<u8>>(), Luma([255]));
        assert_eq!(s.channel(7), 0);
    }
}
