//! Saturation/brightness enhancement in an 8-bit HSV space.
//!
//! [`Hsv8`] fixes the convention used by the renderer:
//!
//! - `H` stores degrees / 2, so hue spans `0..180` (180 wraps to 0);
//! - `S = round(255 * (max - min) / max)` (0 for black), `V = max`;
//! - the inverse uses the six-sector formula on `h = 2 * H` degrees and rounds
//!   each channel to the nearest byte.
//!
//! Round trip at factor 1.0 is exact for greys, primaries and secondaries, off
//! by at most 1 per channel when `max - min <= 60`, and at most 4 elsewhere
//! (hue is quantised to 2 degree steps).

use crate::numeric::{clamp_to_byte, truncate_to_byte};

pub const HUE_RANGE: u8 = 180;

/// RGB <-> HSV capability. Implementations must be total over all byte
/// triplets.
pub trait ColorSpaceConverter {
    fn rgb_to_hsv(&self, rgb: [u8; 3]) -> [u8; 3];
    fn hsv_to_rgb(&self, hsv: [u8; 3]) -> [u8; 3];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hsv8;

impl ColorSpaceConverter for Hsv8 {
    fn rgb_to_hsv(&self, rgb: [u8; 3]) -> [u8; 3] {
        let [r, g, b] = rgb.map(f64::from);
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let saturation = if max == 0.0 {
            0
        } else {
            clamp_to_byte(255.0 * delta / max)
        };

        let degrees = if delta == 0.0 {
            0.0
        } else if max == r {
            60.0 * (g - b) / delta
        } else if max == g {
            120.0 + 60.0 * (b - r) / delta
        } else {
            240.0 + 60.0 * (r - g) / delta
        };
        let degrees = if degrees < 0.0 { degrees + 360.0 } else { degrees };
        let mut hue = clamp_to_byte(degrees / 2.0);
        if hue >= HUE_RANGE {
            hue -= HUE_RANGE;
        }

        [hue, saturation, max as u8]
    }

    fn hsv_to_rgb(&self, hsv: [u8; 3]) -> [u8; 3] {
        let [hue, saturation, value] = hsv;
        let s = f64::from(saturation) / 255.0;
        let v = f64::from(value) / 255.0;

        let h = f64::from(hue % HUE_RANGE) * 2.0 / 60.0;
        let sector = h.floor();
        let fraction = h - sector;
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * fraction);
        let t = v * (1.0 - s * (1.0 - fraction));

        let (r, g, b) = match sector as u8 % 6 {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        };

        [r, g, b].map(|channel| clamp_to_byte(channel * 255.0))
    }
}

/// Multiplies HSV saturation and value by fixed factors (1.0 = unchanged).
#[derive(Debug, Clone, Copy)]
pub struct ColorEnhancer<C = Hsv8> {
    converter: C,
    saturation: f64,
    brightness: f64,
}

impl ColorEnhancer<Hsv8> {
    pub fn new(saturation: f64, brightness: f64) -> Self {
        Self::with_converter(Hsv8, saturation, brightness)
    }
}

impl<C: ColorSpaceConverter> ColorEnhancer<C> {
    pub fn with_converter(converter: C, saturation: f64, brightness: f64) -> Self {
        Self {
            converter,
            saturation,
            brightness,
        }
    }

    /// Scaled channels are clamped and truncated back to bytes before the
    /// inverse conversion.
    pub fn enhance(&self, rgb: [u8; 3]) -> [u8; 3] {
        let [hue, saturation, value] = self.converter.rgb_to_hsv(rgb);
        let saturation = truncate_to_byte(f64::from(saturation) * self.saturation);
        let value = truncate_to_byte(f64::from(value) * self.brightness);
        self.converter.hsv_to_rgb([hue, saturation, value])
    }
}

pub fn enhance_color(rgb: [u8; 3], saturation: f64, brightness: f64) -> [u8; 3] {
    ColorEnhancer::new(saturation, brightness).enhance(rgb)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn max_channel_error(a: [u8; 3], b: [u8; 3]) -> u8 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| x.abs_diff(*y))
            .max()
            .unwrap_or(0)
    }

    #[test]
    fn primaries_secondaries_and_greys_round_trip_exactly() {
        let hsv = Hsv8;
        for rgb in [
            [255, 0, 0],
            [0, 255, 0],
            [0, 0, 255],
            [255, 255, 0],
            [0, 255, 255],
            [255, 0, 255],
            [0, 0, 0],
            [128, 128, 128],
            [255, 255, 255],
        ] {
            assert_eq!(hsv.hsv_to_rgb(hsv.rgb_to_hsv(rgb)), rgb, "rgb {rgb:?}");
        }
        assert_eq!(hsv.rgb_to_hsv([0, 0, 255]), [120, 255, 255]);
        assert_eq!(hsv.rgb_to_hsv([255, 0, 255]), [150, 255, 255]);
    }

    #[test]
    fn unit_factors_round_trip_within_documented_tolerance() {
        let enhancer = ColorEnhancer::new(1.0, 1.0);
        for r in (0..=255_u16).step_by(5) {
            for g in (0..=255_u16).step_by(5) {
                for b in (0..=255_u16).step_by(5) {
                    let rgb = [r as u8, g as u8, b as u8];
                    let out = enhancer.enhance(rgb);
                    let chroma = rgb.iter().max().unwrap() - rgb.iter().min().unwrap();
                    let tolerance = if chroma <= 60 { 2 } else { 4 };
                    assert!(
                        max_channel_error(out, rgb) <= tolerance,
                        "{rgb:?} -> {out:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn factors_scale_saturation_and_value() {
        // (100, 50, 50) is H=0 S=128 V=100; x1.5 gives S=192 V=150.
        assert_eq!(enhance_color([100, 50, 50], 1.5, 1.5), [150, 37, 37]);
        assert_eq!(enhance_color([200, 40, 40], 0.0, 1.0), [200, 200, 200]);
        assert_eq!(enhance_color([10, 20, 30], 1.0, 0.0), [0, 0, 0]);
    }

    #[test]
    fn large_factors_saturate_instead_of_wrapping() {
        assert_eq!(enhance_color([255, 255, 255], 4.0, 4.0), [255, 255, 255]);
        let out = enhance_color([120, 60, 30], 10.0, 10.0);
        assert_eq!(out[0], 255);
        assert_eq!(out[2], 0);
    }

    /// Treats the three channels as already being H, S and V.
    struct Passthrough;

    impl ColorSpaceConverter for Passthrough {
        fn rgb_to_hsv(&self, rgb: [u8; 3]) -> [u8; 3] {
            rgb
        }

        fn hsv_to_rgb(&self, hsv: [u8; 3]) -> [u8; 3] {
            hsv
        }
    }

    #[test]
    fn enhancer_scales_through_any_converter() {
        let enhancer = ColorEnhancer::with_converter(Passthrough, 2.0, 0.5);
        // Hue untouched, S doubled and clamped, V halved and truncated.
        assert_eq!(enhancer.enhance([17, 100, 201]), [17, 200, 100]);
        assert_eq!(enhancer.enhance([17, 200, 3]), [17, 255, 1]);
    }

    #[test]
    fn hue_wraps_at_range_end() {
        // Just below 360 degrees rounds up to H=180 and wraps to red.
        let hsv = Hsv8.rgb_to_hsv([255, 0, 1]);
        assert_eq!(hsv[0], 0);
    }
}
