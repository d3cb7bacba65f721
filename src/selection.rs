use crate::geometry::{
    Dimensions, DisplayRect, NaturalRect, Rectangle, SelectionError, clamp_box, display_to_natural_coords,
};

// Smallest selection (natural pixels, per side) worth sending to the model.
// Shared by the producer check and the server check so they cannot drift.
pub const MIN_BOX_SIZE: f64 = 32.0;

pub fn is_valid_box<S>(b: Option<&Rectangle<S>>, min_size: f64) -> bool {
    match b {
        Some(b) => b.w >= min_size && b.h >= min_size,
        None => false,
    }
}

fn ensure_min_size(b: &NaturalRect) -> Result<(), SelectionError> {
    if is_valid_box(Some(b), MIN_BOX_SIZE) {
        Ok(())
    } else {
        Err(SelectionError::TooSmall {
            w: b.w,
            h: b.h,
            min: MIN_BOX_SIZE,
        })
    }
}

/// Producer side: turn a box drawn on screen into a natural-space selection
/// that is safe to submit.
///
/// Passing this check does not guarantee acceptance; the server repeats it
/// against the decoded image and its answer wins.
pub fn prepare_selection(
    display_box: &DisplayRect,
    display_dims: Dimensions,
    natural_dims: Dimensions,
) -> Result<NaturalRect, SelectionError> {
    if !display_box.is_well_formed() {
        return Err(SelectionError::Malformed(format!("{:?}", display_box)));
    }
    let natural = display_to_natural_coords(display_box, display_dims, natural_dims)?;
    let clamped = clamp_box(&natural, natural_dims)?;
    ensure_min_size(&clamped)?;
    Ok(clamped)
}

/// Consumer side: the authoritative check on a received selection.
pub fn validate_selection(b: &NaturalRect, image_dims: Dimensions) -> Result<NaturalRect, SelectionError> {
    if !b.is_well_formed() {
        return Err(SelectionError::Malformed(format!(
            "box must have finite coordinates and non-negative size, got x={} y={} w={} h={}",
            b.x, b.y, b.w, b.h
        )));
    }

    // fractional pixels from the client are snapped before clamping
    let snapped = NaturalRect::new(b.x.round(), b.y.round(), b.w.round(), b.h.round());
    let clamped = clamp_box(&snapped, image_dims)?;
    ensure_min_size(&clamped)?;
    Ok(clamped)
}
