//! Background color estimation from corner samples

use crate::{color::Color, raster::Raster};

/// Estimate the background color as the rounded mean of the four corner pixels
///
/// Alpha is ignored. This assumes a uniform backdrop that reaches every
/// corner; gradients, vignettes or a subject touching a corner skew the
/// estimate, and nothing here tries to detect that.
#[must_use]
pub fn sample_background(raster: &Raster) -> Color {
    let (right, bottom) = (raster.width() - 1, raster.height() - 1);
    let corners = [(0, 0), (right, 0), (0, bottom), (right, bottom)];

    let mut sums = [0u32; 3];
    for (x, y) in corners {
        if let Some([r, g, b, _]) = raster.pixel(x, y) {
            sums[0] += u32::from(r);
            sums[1] += u32::from(g);
            sums[2] += u32::from(b);
        }
    }

    // Round half up: (sum + 2) / 4
    let [r, g, b] = sums.map(|sum| ((sum + 2) / 4) as u8);
    Color::new(r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_background() {
        let raster = Raster::filled(8, 5, [12, 200, 99, 255]).unwrap();
        assert_eq!(sample_background(&raster), Color::new(12, 200, 99));
    }

    #[test]
    fn test_two_by_two_is_exact_average() {
        let raster = Raster::from_rgba(
            2,
            2,
            vec![
                0, 0, 0, 255, //
                40, 80, 120, 255, //
                80, 160, 240, 0, //
                120, 240, 200, 10,
            ],
        )
        .unwrap();
        assert_eq!(sample_background(&raster), Color::new(60, 120, 140));
    }

    #[test]
    fn test_rounds_to_nearest() {
        // Channel sums 1, 2, 3 average to 0.25, 0.5, 0.75
        let raster = Raster::from_fn(2, 2, |x, y| {
            let r = u8::from(x == 0 && y == 0);
            let g = u8::from(y == 0);
            let b = u8::from(!(x == 1 && y == 1));
            [r, g, b, 255]
        })
        .unwrap();
        assert_eq!(sample_background(&raster), Color::new(0, 1, 1));
    }

    #[test]
    fn test_interior_pixels_ignored() {
        let raster = Raster::from_fn(5, 5, |x, y| {
            if x == 0 || y == 0 || x == 4 || y == 4 {
                [250, 250, 250, 255]
            } else {
                [0, 0, 0, 255]
            }
        })
        .unwrap();
        assert_eq!(sample_background(&raster), Color::new(250, 250, 250));
    }

    #[test]
    fn test_single_pixel() {
        let raster = Raster::filled(1, 1, [7, 8, 9, 255]).unwrap();
        assert_eq!(sample_background(&raster), Color::new(7, 8, 9));
    }
}
