use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use thiserror::Error;

// Pixels as rendered in a (possibly scaled) view of the image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DisplaySpace;

// Pixels of the original, undecoded image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NaturalSpace;

/// Axis-aligned box tagged with the coordinate space it lives in.
///
/// The tag never goes over the wire; a box received from a client is natural
/// space by contract.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rectangle<S = NaturalSpace> {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    #[serde(skip)]
    space: PhantomData<S>,
}

pub type DisplayRect = Rectangle<DisplaySpace>;
pub type NaturalRect = Rectangle<NaturalSpace>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub w: f64,
    pub h: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SelectionError {
    #[error("Malformed selection: {0}")]
    Malformed(String),

    #[error("Selection too small: {w}x{h} (minimum {min}x{min})")]
    TooSmall { w: f64, h: f64, min: f64 },

    #[error("Degenerate dimensions: {w}x{h}")]
    DegenerateDimensions { w: f64, h: f64 },
}

impl<S> Rectangle<S> {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            x,
            y,
            w,
            h,
            space: PhantomData,
        }
    }

    pub fn is_well_formed(&self) -> bool {
        [self.x, self.y, self.w, self.h].iter().all(|v| v.is_finite()) && self.w >= 0.0 && self.h >= 0.0
    }
}

impl NaturalRect {
    // Integer pixel region for the cropper. Only meaningful on a clamped box.
    pub fn to_pixel_region(&self) -> (u32, u32, u32, u32) {
        (
            self.x.max(0.0) as u32,
            self.y.max(0.0) as u32,
            self.w.max(0.0) as u32,
            self.h.max(0.0) as u32,
        )
    }
}

impl Dimensions {
    pub fn new(w: f64, h: f64) -> Self {
        Self { w, h }
    }

    pub fn ensure_positive(&self) -> Result<(), SelectionError> {
        if self.w.is_finite() && self.h.is_finite() && self.w > 0.0 && self.h > 0.0 {
            Ok(())
        } else {
            Err(SelectionError::DegenerateDimensions { w: self.w, h: self.h })
        }
    }
}

impl From<(u32, u32)> for Dimensions {
    fn from((w, h): (u32, u32)) -> Self {
        Self::new(w as f64, h as f64)
    }
}

/// Map a box drawn on the rendered element onto the source image.
///
/// Scale factors are computed per axis, so letterboxed or stretched renders
/// map correctly. No clamping happens here; see [`clamp_box`].
pub fn display_to_natural_coords(
    display_box: &DisplayRect,
    display_dims: Dimensions,
    natural_dims: Dimensions,
) -> Result<NaturalRect, SelectionError> {
    display_dims.ensure_positive()?;

    let scale_x = natural_dims.w / display_dims.w;
    let scale_y = natural_dims.h / display_dims.h;

    Ok(NaturalRect::new(
        (display_box.x * scale_x).round(),
        (display_box.y * scale_y).round(),
        (display_box.w * scale_x).round(),
        (display_box.h * scale_y).round(),
    ))
}

/// Clamp a natural-space box into `[0, w) x [0, h)`.
///
/// Position is fixed first, then width and height are only ever shrunk.
pub fn clamp_box(b: &NaturalRect, image_dims: Dimensions) -> Result<NaturalRect, SelectionError> {
    // an image narrower than one pixel has no valid origin
    if !(image_dims.w >= 1.0 && image_dims.h >= 1.0) || !image_dims.w.is_finite() || !image_dims.h.is_finite() {
        return Err(SelectionError::DegenerateDimensions {
            w: image_dims.w,
            h: image_dims.h,
        });
    }

    let x = b.x.clamp(0.0, image_dims.w - 1.0);
    let y = b.y.clamp(0.0, image_dims.h - 1.0);
    let w = b.w.min(image_dims.w - x);
    let h = b.h.min(image_dims.h - y);

    Ok(NaturalRect::new(x, y, w, h))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_display_box_to_natural() {
        let display = DisplayRect::new(10.0, 10.0, 20.0, 20.0);
        let natural = display_to_natural_coords(
            &display,
            Dimensions::new(100.0, 100.0),
            Dimensions::new(1000.0, 1000.0),
        )
        .unwrap();

        assert_eq!(natural, NaturalRect::new(100.0, 100.0, 200.0, 200.0));
    }

    #[test]
    fn keeps_non_uniform_scale() {
        let display = DisplayRect::new(10.0, 10.0, 50.0, 50.0);
        let natural = display_to_natural_coords(
            &display,
            Dimensions::new(100.0, 200.0),
            Dimensions::new(400.0, 400.0),
        )
        .unwrap();

        assert_eq!(natural, NaturalRect::new(40.0, 20.0, 200.0, 100.0));
    }

    #[test]
    fn rounds_to_nearest_pixel() {
        let display = DisplayRect::new(1.0, 1.0, 3.0, 3.0);
        let natural = display_to_natural_coords(
            &display,
            Dimensions::new(3.0, 3.0),
            Dimensions::new(10.0, 10.0),
        )
        .unwrap();

        // 3.33 -> 3, 10.0 -> 10
        assert_eq!(natural, NaturalRect::new(3.0, 3.0, 10.0, 10.0));
    }

    #[test]
    fn rejects_zero_sized_display() {
        let display = DisplayRect::new(0.0, 0.0, 10.0, 10.0);
        let err = display_to_natural_coords(
            &display,
            Dimensions::new(0.0, 100.0),
            Dimensions::new(1000.0, 1000.0),
        )
        .unwrap_err();

        assert!(matches!(err, SelectionError::DegenerateDimensions { .. }));
    }

    #[test]
    fn clamp_shrinks_width_past_right_edge() {
        let clamped = clamp_box(
            &NaturalRect::new(990.0, 10.0, 50.0, 50.0),
            Dimensions::new(1000.0, 1000.0),
        )
        .unwrap();

        assert_eq!(clamped, NaturalRect::new(990.0, 10.0, 10.0, 50.0));
    }

    #[test]
    fn clamp_moves_position_before_size() {
        let clamped = clamp_box(
            &NaturalRect::new(-20.0, 1200.0, 300.0, 300.0),
            Dimensions::new(1000.0, 800.0),
        )
        .unwrap();

        assert_eq!(clamped, NaturalRect::new(0.0, 799.0, 300.0, 1.0));
    }

    #[test]
    fn clamp_rejects_zero_sized_image() {
        let err = clamp_box(&NaturalRect::new(0.0, 0.0, 10.0, 10.0), Dimensions::new(100.0, 0.0)).unwrap_err();
        assert_eq!(err, SelectionError::DegenerateDimensions { w: 100.0, h: 0.0 });
    }

    #[test]
    fn clamp_on_single_pixel_image() {
        let clamped = clamp_box(&NaturalRect::new(5.0, 5.0, 10.0, 10.0), Dimensions::new(1.0, 1.0)).unwrap();
        assert_eq!(clamped, NaturalRect::new(0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn clamp_is_idempotent_and_stays_in_bounds() {
        let dims = [
            Dimensions::new(1.0, 1.0),
            Dimensions::new(37.0, 512.0),
            Dimensions::new(1000.0, 1000.0),
            Dimensions::new(4032.0, 3024.0),
        ];
        let boxes = [
            NaturalRect::new(0.0, 0.0, 0.0, 0.0),
            NaturalRect::new(-50.0, -50.0, 5000.0, 5000.0),
            NaturalRect::new(990.0, 10.0, 50.0, 50.0),
            NaturalRect::new(4000.0, 3000.0, 100.0, 100.0),
            NaturalRect::new(12.0, 700.0, 32.0, 32.0),
        ];

        for d in dims {
            for b in boxes {
                let once = clamp_box(&b, d).unwrap();
                let twice = clamp_box(&once, d).unwrap();
                assert_eq!(once, twice);

                assert!(once.x >= 0.0 && once.x < d.w);
                assert!(once.y >= 0.0 && once.y < d.h);
                assert!(once.x + once.w <= d.w);
                assert!(once.y + once.h <= d.h);
            }
        }
    }

    #[test]
    fn normalized_then_clamped_never_exceeds_natural() {
        let display_dims = [Dimensions::new(100.0, 100.0), Dimensions::new(333.0, 187.0)];
        let natural_dims = [Dimensions::new(1000.0, 1000.0), Dimensions::new(640.0, 480.0)];
        let display_boxes = [
            DisplayRect::new(0.0, 0.0, 100.0, 100.0),
            DisplayRect::new(90.0, 90.0, 60.0, 60.0),
            DisplayRect::new(300.0, 150.0, 33.3, 37.1),
        ];

        for dd in display_dims {
            for nd in natural_dims {
                for b in &display_boxes {
                    let natural = display_to_natural_coords(b, dd, nd).unwrap();
                    let clamped = clamp_box(&natural, nd).unwrap();
                    assert!(clamped.x + clamped.w <= nd.w);
                    assert!(clamped.y + clamped.h <= nd.h);
                }
            }
        }
    }

    #[test]
    fn well_formedness() {
        assert!(NaturalRect::new(0.0, 0.0, 32.0, 32.0).is_well_formed());
        assert!(!NaturalRect::new(0.0, 0.0, -1.0, 32.0).is_well_formed());
        assert!(!NaturalRect::new(f64::NAN, 0.0, 32.0, 32.0).is_well_formed());
    }

    #[test]
    fn deserializes_plain_json_box() {
        let b: NaturalRect = serde_json::from_str(r#"{"x":1,"y":2,"w":40,"h":50.5}"#).unwrap();
        assert_eq!(b, NaturalRect::new(1.0, 2.0, 40.0, 50.5));

        let missing: Result<NaturalRect, _> = serde_json::from_str(r#"{"x":1,"y":2,"w":40}"#);
        assert!(missing.is_err());

        let not_numeric: Result<NaturalRect, _> = serde_json::from_str(r#"{"x":"1","y":2,"w":40,"h":40}"#);
        assert!(not_numeric.is_err());
    }
}
