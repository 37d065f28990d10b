use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Aspect-ratio class of a video stream, derived from pixel geometry.
///
/// Selects the storage subdirectory for the published artifact; never
/// persisted as its own field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectClass {
    Landscape,
    Portrait,
    Other,
}

impl AspectClass {
    /// Classify stream geometry.
    ///
    /// The ratio is truncated to two decimal digits by flooring, not
    /// rounding: `ratio = floor((width/height) * 100) / 100`. Portrait for
    /// ratios in (0.54, 0.58), landscape for (1.74, 1.78), both bounds
    /// exclusive. The bands are wider than exact 9:16 (0.5625) and 16:9
    /// (1.7778) to tolerate integer-rounding noise in real-world encodes.
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        let ratio = ((width as f64 / height as f64) * 100.0).floor() / 100.0;
        if ratio > 0.54 && ratio < 0.58 {
            AspectClass::Portrait
        } else if ratio > 1.74 && ratio < 1.78 {
            AspectClass::Landscape
        } else {
            AspectClass::Other
        }
    }

    /// Storage subdirectory for this class.
    pub fn dir_name(&self) -> &'static str {
        match self {
            AspectClass::Landscape => "landscape",
            AspectClass::Portrait => "portrait",
            AspectClass::Other => "other",
        }
    }

    /// Inverse of [`dir_name`](Self::dir_name), for parsing stored keys.
    pub fn from_dir_name(name: &str) -> Option<Self> {
        match name {
            "landscape" => Some(AspectClass::Landscape),
            "portrait" => Some(AspectClass::Portrait),
            "other" => Some(AspectClass::Other),
            _ => None,
        }
    }
}

impl Display for AspectClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.dir_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_standard_portrait_geometries() {
        assert_eq!(AspectClass::from_dimensions(1080, 1920), AspectClass::Portrait);
        assert_eq!(AspectClass::from_dimensions(720, 1280), AspectClass::Portrait);
        assert_eq!(AspectClass::from_dimensions(9, 16), AspectClass::Portrait);
        // 0.56, inside the band
        assert_eq!(AspectClass::from_dimensions(14, 25), AspectClass::Portrait);
    }

    #[test]
    fn test_classifies_standard_landscape_geometries() {
        assert_eq!(AspectClass::from_dimensions(1920, 1080), AspectClass::Landscape);
        assert_eq!(AspectClass::from_dimensions(1280, 720), AspectClass::Landscape);
        assert_eq!(AspectClass::from_dimensions(16, 9), AspectClass::Landscape);
        // 1.76, inside the band
        assert_eq!(AspectClass::from_dimensions(44, 25), AspectClass::Landscape);
    }

    #[test]
    fn test_classifies_everything_else_as_other() {
        assert_eq!(AspectClass::from_dimensions(1000, 1000), AspectClass::Other);
        assert_eq!(AspectClass::from_dimensions(640, 480), AspectClass::Other);
        assert_eq!(AspectClass::from_dimensions(480, 640), AspectClass::Other);
        assert_eq!(AspectClass::from_dimensions(2560, 1080), AspectClass::Other);
    }

    #[test]
    fn test_band_bounds_are_exclusive() {
        // floor((w/h)*100) lands exactly on a bound; the comparison is
        // strict, so these fall out of the band.
        assert_eq!(AspectClass::from_dimensions(27, 50), AspectClass::Other); // 0.54
        assert_eq!(AspectClass::from_dimensions(117, 200), AspectClass::Other); // 0.58
        assert_eq!(AspectClass::from_dimensions(87, 50), AspectClass::Other); // 1.74
        assert_eq!(AspectClass::from_dimensions(357, 200), AspectClass::Other); // 1.78
    }

    #[test]
    fn test_truncation_floors_instead_of_rounding() {
        // 0.5789... floors to 0.57, staying inside the portrait band where
        // rounding to 0.58 would have fallen out.
        assert_eq!(AspectClass::from_dimensions(579, 1000), AspectClass::Portrait);
    }

    #[test]
    fn test_degenerate_geometry_is_other() {
        assert_eq!(AspectClass::from_dimensions(0, 1080), AspectClass::Other);
        assert_eq!(AspectClass::from_dimensions(1920, 0), AspectClass::Other);
    }

    #[test]
    fn test_dir_name_round_trips() {
        for class in [
            AspectClass::Landscape,
            AspectClass::Portrait,
            AspectClass::Other,
        ] {
            assert_eq!(AspectClass::from_dir_name(class.dir_name()), Some(class));
        }
        assert_eq!(AspectClass::from_dir_name("diagonal"), None);
    }
}
