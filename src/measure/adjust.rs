//! Preview adjustment pipeline
//!
//! Blur → contrast → brightness, always in that order. The preview and the
//! measurement both run it on calibrated-image pixels, before any resize.
use image::{imageops, GrayImage, Luma};

use super::histogram::Histogram;
use crate::state::edit::AdjustmentSettings;

/// Apply the adjustments to a copy of `img`
pub fn apply_adjustments(img: &GrayImage, settings: &AdjustmentSettings) -> GrayImage {
    let mut out = if settings.blur_radius > 0.0 {
        gaussian_blur(img, settings.blur_radius)
    } else {
        img.clone()
    };
    if settings.contrast != 1.0 {
        out = enhance_contrast(&out, settings.contrast);
    }
    if settings.brightness != 1.0 {
        out = enhance_brightness(&out, settings.brightness);
    }
    out
}

/// Gaussian blur with `sigma = radius`
pub fn gaussian_blur(img: &GrayImage, radius: f64) -> GrayImage {
    if img.width() == 0 || img.height() == 0 {
        return img.clone();
    }
    imageops::blur(img, radius as f32)
}

/// Scale distances from the rounded mean intensity by `factor`
pub fn enhance_contrast(img: &GrayImage, factor: f64) -> GrayImage {
    let mean = Histogram::from_samples(img.as_raw()).mean().round();
    map_pixels(img, |v| mean + factor * (v - mean))
}

/// Scale every intensity by `factor`
pub fn enhance_brightness(img: &GrayImage, factor: f64) -> GrayImage {
    map_pixels(img, |v| factor * v)
}

/// Apply `f` per pixel, truncating toward zero and clipping to 8 bits
fn map_pixels(img: &GrayImage, f: impl Fn(f64) -> f64) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let v = f(f64::from(img.get_pixel(x, y)[0]));
        Luma([v.clamp(0.0, 255.0) as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tone() -> GrayImage {
        GrayImage::from_fn(4, 1, |x, _| Luma([if x < 2 { 100 } else { 200 }]))
    }

    #[test]
    fn test_neutral_settings_are_identity() {
        let img = two_tone();
        assert_eq!(apply_adjustments(&img, &AdjustmentSettings::default()), img);
    }

    #[test]
    fn test_neutral_settings_survive_json_round_trip() {
        let img = two_tone();
        let json = AdjustmentSettings::new(1.0, 1.0, 0.0).to_json().unwrap();
        let settings = AdjustmentSettings::from_json(&json).unwrap();
        assert!(settings.is_unedited());
        assert_eq!(apply_adjustments(&img, &settings), img);
    }

    #[test]
    fn test_contrast_around_mean() {
        let out = enhance_contrast(&two_tone(), 2.0);
        // mean 150: 150 + 2*(100-150) = 50, 150 + 2*(200-150) = 250
        assert_eq!(out.as_raw(), &vec![50, 50, 250, 250]);
    }

    #[test]
    fn test_brightness_clips() {
        let out = enhance_brightness(&two_tone(), 1.5);
        assert_eq!(out.as_raw(), &vec![150, 150, 255, 255]);
    }

    #[test]
    fn test_brightness_truncates() {
        let img = GrayImage::from_pixel(1, 1, Luma([3]));
        assert_eq!(enhance_brightness(&img, 0.5).get_pixel(0, 0)[0], 1);
    }

    #[test]
    fn test_blur_runs_before_contrast() {
        let img = GrayImage::from_fn(9, 9, |x, y| Luma([if x == 4 && y == 4 { 255 } else { 0 }]));
        let settings = AdjustmentSettings::new(3.0, 1.0, 1.0);
        let expected = enhance_contrast(&gaussian_blur(&img, 1.0), 3.0);
        assert_eq!(apply_adjustments(&img, &settings), expected);
    }

    #[test]
    fn test_blur_spreads_a_spike() {
        let img = GrayImage::from_fn(9, 9, |x, y| Luma([if x == 4 && y == 4 { 255 } else { 0 }]));
        let out = gaussian_blur(&img, 1.0);
        assert!(out.get_pixel(4, 4)[0] < 255);
        assert!(out.get_pixel(5, 4)[0] > 0);
    }
}
