//! Unit-size and shape inference over the six decoded faces.

use std::collections::BTreeMap;

use image::RgbaImage;

use crate::error::StitchError;
use crate::face::FaceId;

/// Faces smaller than this on either side are treated as placeholders.
pub const MIN_SIZE: u32 = 64;

const DOME_RATIO: (f64, f64) = (1.9, 2.1);
const SQUARE_RATIO: (f64, f64) = (0.9, 1.1);

/// Aspect class of the input set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    /// Square faces.
    Square,
    /// Horizontal faces twice as wide as tall.
    Dome2to1,
}

/// Canonical cell size and input shape for one run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Topology {
    /// Side length of one atlas cell in pixels.
    pub unit_size: u32,
    /// Input aspect class.
    pub shape: Shape,
    /// Face whose dimensions set the reference size.
    pub reference: FaceId,
}

impl Topology {
    /// Atlas canvas size `(4 × unit, 3 × unit)`.
    #[must_use]
    pub fn atlas_dimensions(&self) -> (u32, u32) {
        (self.unit_size * 4, self.unit_size * 3)
    }
}

/// Whether an image is too small to carry real content.
#[must_use]
pub fn is_placeholder(image: &RgbaImage, min_size: u32) -> bool {
    image.width() < min_size || image.height() < min_size
}

/// Classify an aspect ratio. `None` means neither square nor 2:1.
#[must_use]
pub fn classify_ratio(width: u32, height: u32) -> Option<Shape> {
    let ratio = f64::from(width) / f64::from(height);
    if ratio > DOME_RATIO.0 && ratio < DOME_RATIO.1 {
        Some(Shape::Dome2to1)
    } else if ratio > SQUARE_RATIO.0 && ratio < SQUARE_RATIO.1 {
        Some(Shape::Square)
    } else {
        None
    }
}

/// Infer the unit size and shape from the decoded faces.
///
/// The front face sets the reference size unless it is a placeholder, in
/// which case the largest remaining face does (ties go to the earlier face in
/// [`FaceId::ALL`]).
///
/// # Errors
///
/// Returns [`StitchError::NoValidFaceSize`] when every face is a placeholder.
pub fn infer_topology(
    rasters: &BTreeMap<FaceId, RgbaImage>,
    min_size: u32,
) -> Result<Topology, StitchError> {
    let valid = |face: &FaceId| {
        rasters
            .get(face)
            .is_some_and(|img| !is_placeholder(img, min_size))
    };

    let reference = if valid(&FaceId::Front) {
        FaceId::Front
    } else {
        let mut best: Option<(FaceId, u64)> = None;
        for face in FaceId::ALL.into_iter().filter(valid) {
            let img = &rasters[&face];
            let area = u64::from(img.width()) * u64::from(img.height());
            if best.is_none_or(|(_, best_area)| area > best_area) {
                best = Some((face, area));
            }
        }
        let (face, _) = best.ok_or(StitchError::NoValidFaceSize { min_size })?;
        log::warn!("front face is missing or below {min_size}px, using '{face}' as size reference");
        face
    };

    let img = &rasters[&reference];
    let (width, height) = img.dimensions();
    let shape = match classify_ratio(width, height) {
        Some(shape) => shape,
        None => {
            log::warn!(
                "reference face '{reference}' is {width}x{height}, neither square nor 2:1; treating as square"
            );
            Shape::Square
        }
    };
    let unit_size = match shape {
        Shape::Dome2to1 => height,
        Shape::Square => width,
    };

    log::info!("detected face size {width}x{height} -> unit {unit_size}px, {shape:?}");
    Ok(Topology {
        unit_size,
        shape,
        reference,
    })
}
