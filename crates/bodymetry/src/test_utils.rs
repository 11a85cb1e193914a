//! Shared test utilities: synthetic standing-body silhouette renderers.
//!
//! A body is described by a piecewise-linear half-width profile over the
//! normalized head-to-foot axis; frames render it dark on a light
//! background, vertically centered between 10% and 95% of the image.

use image::{DynamicImage, GrayImage, Luma};

const BODY_PIX: u8 = 40;
const BG_PIX: u8 = 230;

/// (t, half_width) control points; t in [0, 1] head→feet, half width as a
/// fraction of the image width.
pub(crate) type BodyProfile = Vec<(f64, f64)>;

/// A roughly front-view body: head, shoulders, waist pinch, hips, legs.
pub(crate) fn standard_body() -> BodyProfile {
    vec![
        (0.00, 0.020),
        (0.04, 0.045),
        (0.10, 0.040),
        (0.18, 0.160),
        (0.30, 0.170),
        (0.42, 0.135),
        (0.52, 0.165),
        (0.62, 0.120),
        (0.75, 0.080),
        (0.85, 0.060),
        (1.00, 0.050),
    ]
}

/// A side-view-like body: same span, smaller widths.
pub(crate) fn narrow_body() -> BodyProfile {
    standard_body()
        .into_iter()
        .map(|(t, hw)| (t, (hw * 0.62).max(0.018)))
        .collect()
}

fn half_width_at(profile: &[(f64, f64)], t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    for pair in profile.windows(2) {
        let (t0, w0) = pair[0];
        let (t1, w1) = pair[1];
        if t <= t1 {
            let f = if t1 > t0 { (t - t0) / (t1 - t0) } else { 0.0 };
            return w0 + f * (w1 - w0);
        }
    }
    profile.last().map(|&(_, w)| w).unwrap_or(0.0)
}

/// Render one synthetic body frame with the half-width profile scaled by
/// `width_scale`.
pub(crate) fn draw_body_image_scaled(
    w: u32,
    h: u32,
    profile: &[(f64, f64)],
    width_scale: f64,
) -> GrayImage {
    let mut img = GrayImage::from_pixel(w, h, Luma([BG_PIX]));
    let y_head = 0.10 * h as f64;
    let y_feet = 0.95 * h as f64;
    let cx = w as f64 / 2.0;
    for y in 0..h {
        let yf = y as f64;
        if yf < y_head || yf > y_feet {
            continue;
        }
        let t = (yf - y_head) / (y_feet - y_head);
        let half = half_width_at(profile, t) * w as f64 * width_scale;
        for x in 0..w {
            if (x as f64 - cx).abs() <= half {
                img.put_pixel(x, y, Luma([BODY_PIX]));
            }
        }
    }
    img
}

pub(crate) fn draw_body_image(w: u32, h: u32, profile: &[(f64, f64)]) -> GrayImage {
    draw_body_image_scaled(w, h, profile, 1.0)
}

/// A batch of `n` standard-body frames with small per-frame width jitter.
pub(crate) fn body_frames(n: usize, w: u32, h: u32) -> Vec<DynamicImage> {
    body_frames_scaled(n, w, h, &standard_body(), 1.0)
}

/// A jittered batch over an arbitrary profile and overall width scale.
pub(crate) fn body_frames_scaled(
    n: usize,
    w: u32,
    h: u32,
    profile: &[(f64, f64)],
    width_scale: f64,
) -> Vec<DynamicImage> {
    (0..n)
        .map(|i| {
            let jitter = 1.0 + 0.005 * ((i % 3) as f64 - 1.0);
            DynamicImage::ImageLuma8(draw_body_image_scaled(
                w,
                h,
                profile,
                width_scale * jitter,
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn half_width_interpolates_between_control_points() {
        let profile = vec![(0.0, 0.1), (1.0, 0.3)];
        assert_relative_eq!(half_width_at(&profile, 0.5), 0.2);
        assert_relative_eq!(half_width_at(&profile, -1.0), 0.1);
        assert_relative_eq!(half_width_at(&profile, 2.0), 0.3);
    }

    #[test]
    fn rendered_body_is_dark_on_light() {
        let img = draw_body_image(100, 200, &standard_body());
        assert_eq!(img.get_pixel(50, 100)[0], BODY_PIX); // torso center
        assert_eq!(img.get_pixel(2, 2)[0], BG_PIX); // background corner
    }
}
