//! Cross-layout atlas assembly.
//!
//! The atlas is a 4×3 grid of square cells. Six cells hold faces:
//!
//! ```text
//!        +----+
//!        | up |
//! +------+----+-------+------+
//! | left |front| right | back |
//! +------+----+-------+------+
//!        |down|
//!        +----+
//! ```
//!
//! The other six stay fully transparent.

use std::collections::BTreeMap;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::face::FaceId;
use crate::topology::{Shape, Topology, is_placeholder};
use crate::transform::{TransformRule, TransformTable, apply_transform};

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Builds the atlas one slot at a time.
pub struct AtlasCompositor {
    topology: Topology,
    min_face_size: u32,
    canvas: RgbaImage,
}

impl AtlasCompositor {
    /// Creates a transparent canvas sized for `topology`.
    pub fn new(topology: Topology, min_face_size: u32) -> Self {
        let (width, height) = topology.atlas_dimensions();
        Self {
            topology,
            min_face_size,
            canvas: RgbaImage::new(width, height),
        }
    }

    /// Scale a source face to one unit cell.
    ///
    /// Placeholders (and absent faces) become opaque black. In dome layouts
    /// horizontal faces fill the top half of the cell over black.
    #[must_use]
    pub fn prepare_cell(&self, face: FaceId, image: Option<&RgbaImage>) -> RgbaImage {
        let unit = self.topology.unit_size;
        let Some(image) = image.filter(|img| !is_placeholder(img, self.min_face_size)) else {
            log::warn!("'{face}' face is a placeholder, substituting black {unit}x{unit}");
            return RgbaImage::from_pixel(unit, unit, BLACK);
        };

        if self.topology.shape == Shape::Dome2to1 && face.is_horizontal() {
            let half = (unit / 2).max(1);
            let squashed = resize_to(image, unit, half);
            let mut cell = RgbaImage::from_pixel(unit, unit, BLACK);
            imageops::replace(&mut cell, &squashed, 0, 0);
            cell
        } else {
            resize_to(image, unit, unit)
        }
    }

    /// Transform `cell` per `rule` and paste it into the rule's slot.
    pub fn place(&mut self, rule: &TransformRule, cell: &RgbaImage) {
        let transformed = apply_transform(cell, rule.rotation, rule.flip);
        let (col, row) = rule.slot.atlas_cell();
        let unit = i64::from(self.topology.unit_size);
        log::info!(
            "pasting '{}' into '{}' slot at ({}, {}) [rotation {}°, flip {:?}]",
            rule.source,
            rule.slot,
            i64::from(col) * unit,
            i64::from(row) * unit,
            rule.rotation.degrees(),
            rule.flip
        );
        imageops::replace(
            &mut self.canvas,
            &transformed,
            i64::from(col) * unit,
            i64::from(row) * unit,
        );
    }

    /// Returns the finished atlas.
    pub fn finish(self) -> RgbaImage {
        self.canvas
    }
}

/// Composite all six slots.
///
/// `rules` is consulted once per slot; slots it lacks are filled by their own
/// face, untouched.
#[must_use]
pub fn composite(
    rasters: &BTreeMap<FaceId, RgbaImage>,
    rules: &TransformTable,
    topology: Topology,
    min_face_size: u32,
) -> RgbaImage {
    let mut compositor = AtlasCompositor::new(topology, min_face_size);
    for slot in FaceId::SLOT_ORDER {
        let rule = rules.rule_for(slot);
        let cell = compositor.prepare_cell(rule.source, rasters.get(&rule.source));
        compositor.place(&rule, &cell);
    }
    compositor.finish()
}

fn resize_to(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if image.dimensions() == (width, height) {
        image.clone()
    } else {
        imageops::resize(image, width, height, FilterType::Lanczos3)
    }
}
