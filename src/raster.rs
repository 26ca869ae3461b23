//! Decoded RGBA pixel grid

use crate::error::{RecolorError, Result};
use image::{DynamicImage, RgbaImage};

/// Bytes per pixel (R, G, B, A)
pub const CHANNELS: usize = 4;

/// Row-major RGBA raster with 8 bits per channel
///
/// Invariant: `data.len() == width * height * 4` and both dimensions are
/// non-zero. Every constructor enforces this, so the recolor passes can
/// rely on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Raster {
    /// Wrap an existing RGBA buffer
    ///
    /// # Errors
    /// - `InvalidDimensions` if either dimension is zero
    /// - `BufferSizeMismatch` if the buffer length is not `width * height * 4`
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = Self::buffer_len(width, height)?;
        if data.len() != expected {
            return Err(RecolorError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Raster filled with a single RGBA value
    pub fn filled(width: u32, height: u32, pixel: [u8; 4]) -> Result<Self> {
        let len = Self::buffer_len(width, height)?;
        let mut data = try_alloc(len, "raster buffer")?;
        for _ in 0..len / CHANNELS {
            data.extend_from_slice(&pixel);
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build a raster by evaluating `f(x, y)` for every pixel
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Result<Self>
    where
        F: FnMut(u32, u32) -> [u8; 4],
    {
        let len = Self::buffer_len(width, height)?;
        let mut data = try_alloc(len, "raster buffer")?;
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Required buffer length, validating the dimensions
    pub fn buffer_len(width: u32, height: u32) -> Result<usize> {
        if width == 0 || height == 0 {
            return Err(RecolorError::InvalidDimensions { width, height });
        }
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(CHANNELS))
            .ok_or(RecolorError::InvalidDimensions { width, height })
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.data.len() / CHANNELS
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// RGBA value at `(x, y)`, or `None` outside the raster
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * CHANNELS;
        self.data
            .get(offset..offset + CHANNELS)
            .and_then(|px| px.try_into().ok())
    }

    /// Overwrite the pixel at `(x, y)`; returns `false` outside the raster
    pub fn set_pixel(&mut self, x: u32, y: u32, value: [u8; 4]) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let offset = (y as usize * self.width as usize + x as usize) * CHANNELS;
        match self.data.get_mut(offset..offset + CHANNELS) {
            Some(px) => {
                px.copy_from_slice(&value);
                true
            },
            None => false,
        }
    }

    /// Convert a decoded image of any color type
    pub fn from_image(image: &DynamicImage) -> Result<Self> {
        Self::from_rgba_image(image.to_rgba8())
    }

    pub fn from_rgba_image(image: RgbaImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        Self::from_rgba(width, height, image.into_raw())
    }

    #[must_use]
    pub fn into_rgba_image(self) -> RgbaImage {
        // Length invariant guarantees the conversion succeeds
        RgbaImage::from_raw(self.width, self.height, self.data)
            .unwrap_or_else(|| RgbaImage::new(0, 0))
    }

    #[must_use]
    pub fn to_dynamic_image(&self) -> DynamicImage {
        DynamicImage::ImageRgba8(self.clone().into_rgba_image())
    }
}

/// Allocate an empty buffer with capacity for exactly `len` elements, reporting
/// failure instead of aborting
pub(crate) fn try_alloc<T>(len: usize, purpose: &'static str) -> Result<Vec<T>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| RecolorError::Allocation {
            bytes: len.saturating_mul(std::mem::size_of::<T>()),
            purpose,
        })?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use image::Rgba;

    #[test]
    fn test_try_alloc_reports_resource_error() {
        let err = try_alloc::<u64>(usize::MAX, "class map").unwrap_err();
        assert!(matches!(
            err,
            RecolorError::Allocation {
                purpose: "class map",
                ..
            }
        ));
        assert_eq!(err.kind(), ErrorKind::Resource);

        let buffer = try_alloc::<u8>(64, "raster buffer").unwrap();
        assert!(buffer.is_empty());
        assert!(buffer.capacity() >= 64);
    }

    #[test]
    fn test_from_rgba_validates_length() {
        assert!(Raster::from_rgba(2, 2, vec![0; 16]).is_ok());

        let err = Raster::from_rgba(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(
            err,
            RecolorError::BufferSizeMismatch {
                expected: 16,
                actual: 15
            }
        ));
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        for (w, h) in [(0, 4), (4, 0), (0, 0)] {
            let err = Raster::from_rgba(w, h, Vec::new()).unwrap_err();
            assert!(matches!(err, RecolorError::InvalidDimensions { .. }));
            assert!(Raster::filled(w, h, [0; 4]).is_err());
        }
    }

    #[test]
    fn test_pixel_access() {
        let mut raster = Raster::from_fn(3, 2, |x, y| [x as u8, y as u8, 7, 255]).unwrap();
        assert_eq!(raster.pixel_count(), 6);
        assert_eq!(raster.pixel(2, 1), Some([2, 1, 7, 255]));
        assert_eq!(raster.pixel(3, 0), None);
        assert_eq!(raster.pixel(0, 2), None);

        assert!(raster.set_pixel(1, 1, [9, 9, 9, 9]));
        assert_eq!(raster.pixel(1, 1), Some([9, 9, 9, 9]));
        assert!(!raster.set_pixel(5, 5, [0; 4]));
    }

    #[test]
    fn test_image_conversion() {
        let image = RgbaImage::from_pixel(4, 3, Rgba([10, 20, 30, 40]));
        let raster = Raster::from_rgba_image(image.clone()).unwrap();
        assert_eq!(raster.dimensions(), (4, 3));
        assert_eq!(raster.pixel(3, 2), Some([10, 20, 30, 40]));
        assert_eq!(raster.into_rgba_image(), image);

        let rgb = DynamicImage::new_rgb8(2, 2);
        let raster = Raster::from_image(&rgb).unwrap();
        assert_eq!(raster.pixel(0, 0), Some([0, 0, 0, 255]));
    }
}
