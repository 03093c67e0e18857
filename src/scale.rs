use std::fmt;
use std::path::Path;

use crate::errors::{Result, VanceError};

/// A discrete magnification factor from the fixed server-supported set.
///
/// Scale-based operations accept only these values; anything else is
/// rejected before a request is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EnlargeScale {
    X2,
    X4,
    X6,
    X8,
}

impl EnlargeScale {
    /// Every supported scale, in ascending order.
    pub const ALL: [EnlargeScale; 4] = [
        EnlargeScale::X2,
        EnlargeScale::X4,
        EnlargeScale::X6,
        EnlargeScale::X8,
    ];

    /// The numeric magnification factor.
    pub fn factor(self) -> u32 {
        match self {
            EnlargeScale::X2 => 2,
            EnlargeScale::X4 => 4,
            EnlargeScale::X6 => 6,
            EnlargeScale::X8 => 8,
        }
    }

    /// The encoding expected in `config.module_params.scale`.
    pub fn as_wire(self) -> &'static str {
        match self {
            EnlargeScale::X2 => "2x",
            EnlargeScale::X4 => "4x",
            EnlargeScale::X6 => "6x",
            EnlargeScale::X8 => "8x",
        }
    }

    /// Parse a numeric factor, rejecting anything outside the supported set.
    pub fn from_factor(factor: u32) -> Result<EnlargeScale> {
        Self::ALL
            .into_iter()
            .find(|s| s.factor() == factor)
            .ok_or_else(|| {
                VanceError::Validation(format!(
                    "scale {factor} not available, use one of 2, 4, 6, 8"
                ))
            })
    }

    pub(crate) fn from_wire(s: &str) -> Option<EnlargeScale> {
        Self::ALL.into_iter().find(|scale| scale.as_wire() == s)
    }
}

impl fmt::Display for EnlargeScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Pick the smallest supported scale that carries either source dimension
/// past its minimum.
///
/// Reads only the image header, so this is cheap even for large files.
/// Width is measured against `min_width` and height against `min_height`;
/// crossing either bound is sufficient.
///
/// # Errors
///
/// - [`VanceError::Image`] if the file cannot be decoded or reports a zero
///   dimension.
/// - [`VanceError::Validation`] if even the largest scale stays below both
///   minimums.
pub fn scale_for_dimensions(
    path: impl AsRef<Path>,
    min_width: u32,
    min_height: u32,
) -> Result<EnlargeScale> {
    let path = path.as_ref();

    let (width, height) =
        image::image_dimensions(path).map_err(|e| VanceError::image(path, e.to_string()))?;
    if width == 0 || height == 0 {
        return Err(VanceError::image(path, "image reports zero dimensions"));
    }

    EnlargeScale::ALL
        .into_iter()
        .find(|scale| {
            let factor = u64::from(scale.factor());
            u64::from(width) * factor > u64::from(min_width)
                || u64::from(height) * factor > u64::from(min_height)
        })
        .ok_or_else(|| {
            VanceError::Validation(format!(
                "{} is too small, the maximum scale cannot reach {}x{}",
                path.display(),
                min_width,
                min_height
            ))
        })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use image::{ImageEncoder, RgbImage};

    use super::*;

    /// Write a small valid JPEG with the given dimensions.
    fn create_test_jpeg(path: &Path, width: u32, height: u32) {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let file = std::fs::File::create(path).unwrap();
        let writer = std::io::BufWriter::new(file);
        image::codecs::jpeg::JpegEncoder::new(writer)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
    }

    #[test]
    fn picks_first_scale_crossing_a_minimum() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("src.jpg");
        create_test_jpeg(&path, 100, 100);

        // 100*2=200 and 100*4=400 stay at or below 500; 100*6=600 crosses.
        let scale = scale_for_dimensions(&path, 500, 500).unwrap();
        assert_eq!(scale, EnlargeScale::X6);
    }

    #[test]
    fn either_dimension_crossing_is_sufficient() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("wide.jpg");
        create_test_jpeg(&path, 200, 50);

        // Width can never reach 100000, but 50*2=100 crosses min_height=90.
        let scale = scale_for_dimensions(&path, 100_000, 90).unwrap();
        assert_eq!(scale, EnlargeScale::X2);
    }

    #[test]
    fn result_is_always_a_member_of_the_supported_set() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("src.jpg");
        create_test_jpeg(&path, 120, 80);

        for min in [0, 100, 300, 500, 900] {
            let scale = scale_for_dimensions(&path, min, min).unwrap();
            assert!(EnlargeScale::ALL.contains(&scale));
        }
    }

    #[test]
    fn resolved_scale_grows_monotonically_with_the_minimums() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("src.jpg");
        create_test_jpeg(&path, 100, 100);

        let mut last = EnlargeScale::X2;
        for min in (0u32..800).step_by(50) {
            let scale = scale_for_dimensions(&path, min, min).unwrap();
            assert!(scale >= last, "scale shrank as minimums grew");
            last = scale;
        }
    }

    #[test]
    fn unreachable_minimums_fail_validation() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("tiny.jpg");
        create_test_jpeg(&path, 100, 100);

        // 100*8=800 is far below 10000 in both dimensions.
        let err = scale_for_dimensions(&path, 10_000, 10_000).unwrap_err();
        assert!(matches!(err, VanceError::Validation(_)));
    }

    #[test]
    fn unreadable_file_is_an_image_error() {
        let err = scale_for_dimensions("/nonexistent/image.jpg", 100, 100).unwrap_err();
        assert!(matches!(err, VanceError::Image { .. }));
    }

    #[test]
    fn factors_outside_the_set_are_rejected() {
        assert!(EnlargeScale::from_factor(3).is_err());
        assert_eq!(EnlargeScale::from_factor(4).unwrap(), EnlargeScale::X4);
    }

    #[test]
    fn wire_encoding_round_trips() {
        for scale in EnlargeScale::ALL {
            assert_eq!(EnlargeScale::from_wire(scale.as_wire()), Some(scale));
        }
        assert_eq!(EnlargeScale::from_wire("3x"), None);
    }
}
