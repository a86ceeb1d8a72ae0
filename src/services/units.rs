// src/services/units.rs
use crate::errors::ImgDropError;
use crate::models::Unit;

pub const DEFAULT_DPI: u32 = 96;

const CM_PER_INCH: f64 = 2.54;
const MM_PER_INCH: f64 = 25.4;

/// Converts a length in `unit` to pixels at `dpi`.
///
/// Pixel input is truncated; physical units are rounded to the nearest pixel.
pub fn to_pixels(value: f64, unit: Unit, dpi: u32, max_dimension: u32) -> Result<u32, ImgDropError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ImgDropError::Validation(format!(
            "Dimensions must be positive, got {}",
            value
        )));
    }
    if dpi == 0 {
        return Err(ImgDropError::Validation("DPI must be positive".to_string()));
    }

    let dpi = dpi as f64;
    let pixels = match unit {
        Unit::Px => value.trunc(),
        Unit::Cm => (value / CM_PER_INCH * dpi).round(),
        Unit::Mm => (value / MM_PER_INCH * dpi).round(),
        Unit::In => (value * dpi).round(),
    };

    if pixels < 1.0 {
        return Err(ImgDropError::Validation(format!(
            "{} {:?} is less than one pixel at {} DPI",
            value, unit, dpi
        )));
    }
    if pixels > max_dimension as f64 {
        return Err(ImgDropError::Validation(format!(
            "Requested size of {} px exceeds the {} px limit",
            pixels, max_dimension
        )));
    }

    Ok(pixels as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixels_truncate() {
        assert_eq!(to_pixels(640.9, Unit::Px, DEFAULT_DPI, 10_000).unwrap(), 640);
    }

    #[test]
    fn test_centimetres() {
        // 2.54 cm is one inch
        assert_eq!(to_pixels(2.54, Unit::Cm, 96, 10_000).unwrap(), 96);
        assert_eq!(to_pixels(10.0, Unit::Cm, 300, 10_000).unwrap(), 1181);
    }

    #[test]
    fn test_millimetres() {
        assert_eq!(to_pixels(25.4, Unit::Mm, 96, 10_000).unwrap(), 96);
        assert_eq!(to_pixels(35.0, Unit::Mm, 300, 10_000).unwrap(), 413);
    }

    #[test]
    fn test_inches() {
        assert_eq!(to_pixels(2.0, Unit::In, 150, 10_000).unwrap(), 300);
    }

    #[test]
    fn test_rejects_non_positive() {
        assert!(to_pixels(0.0, Unit::Px, 96, 10_000).is_err());
        assert!(to_pixels(-3.0, Unit::Cm, 96, 10_000).is_err());
        assert!(to_pixels(f64::NAN, Unit::Mm, 96, 10_000).is_err());
    }

    #[test]
    fn test_rejects_sub_pixel_and_oversize() {
        assert!(to_pixels(0.1, Unit::Mm, 72, 10_000).is_err());
        assert!(to_pixels(200.0, Unit::Cm, 600, 10_000).is_err());
        assert!(to_pixels(10.0, Unit::Px, 0, 10_000).is_err());
    }
}
