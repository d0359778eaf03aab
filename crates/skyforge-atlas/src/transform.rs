//! Per-slot transform tables: which source face lands in each atlas slot, and
//! how it is rotated and flipped on the way.
//!
//! The numbers in the built-in tables are tuned against the target renderer's
//! texture-axis conventions. They are plain data and can be replaced from the
//! config file.

use image::RgbaImage;
use image::imageops;
use serde::{Deserialize, Serialize};

use crate::face::{FaceId, SourceKind};
use crate::topology::Shape;

// ---------------------------------------------------------------------------
// Rotation / Flip
// ---------------------------------------------------------------------------

/// Quarter-turn rotation. Positive is counter-clockwise.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Rotation {
    /// No rotation.
    #[default]
    None,
    /// 90° counter-clockwise.
    Ccw90,
    /// 90° clockwise (`-90`).
    Cw90,
    /// Half turn.
    Half,
}

impl Rotation {
    /// Signed degrees, counter-clockwise positive.
    #[must_use]
    pub fn degrees(self) -> i32 {
        match self {
            Rotation::None => 0,
            Rotation::Ccw90 => 90,
            Rotation::Cw90 => -90,
            Rotation::Half => 180,
        }
    }
}

impl TryFrom<i32> for Rotation {
    type Error = String;

    fn try_from(degrees: i32) -> Result<Self, Self::Error> {
        match degrees {
            0 => Ok(Rotation::None),
            90 | -270 => Ok(Rotation::Ccw90),
            -90 | 270 => Ok(Rotation::Cw90),
            180 | -180 => Ok(Rotation::Half),
            other => Err(format!(
                "rotation must be one of 0, 90, -90, 180 degrees, got {other}"
            )),
        }
    }
}

impl From<Rotation> for i32 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

/// Mirror operation applied after rotation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flip {
    /// Leave the image as is.
    #[default]
    None,
    /// Mirror left-right.
    Horizontal,
    /// Mirror top-bottom.
    Vertical,
    /// Both mirrors at once, equivalent to a half turn.
    Rotate180,
}

/// Rotate then flip a face image.
#[must_use]
pub fn apply_transform(image: &RgbaImage, rotation: Rotation, flip: Flip) -> RgbaImage {
    let rotated = match rotation {
        Rotation::None => image.clone(),
        Rotation::Ccw90 => imageops::rotate270(image),
        Rotation::Cw90 => imageops::rotate90(image),
        Rotation::Half => imageops::rotate180(image),
    };

    match flip {
        Flip::None => rotated,
        Flip::Horizontal => imageops::flip_horizontal(&rotated),
        Flip::Vertical => imageops::flip_vertical(&rotated),
        Flip::Rotate180 => imageops::rotate180(&rotated),
    }
}

// ---------------------------------------------------------------------------
// TransformRule / TransformTable
// ---------------------------------------------------------------------------

/// Where one atlas slot takes its pixels from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformRule {
    /// Atlas slot being filled.
    pub slot: FaceId,
    /// Face whose image is pasted into the slot.
    pub source: FaceId,
    /// Rotation applied first.
    #[serde(default)]
    pub rotation: Rotation,
    /// Flip applied after rotation.
    #[serde(default)]
    pub flip: Flip,
}

impl TransformRule {
    /// Slot filled by its own face, untouched.
    #[must_use]
    pub fn identity(slot: FaceId) -> Self {
        Self::new(slot, slot, Rotation::None, Flip::None)
    }

    /// Shorthand constructor.
    #[must_use]
    pub const fn new(slot: FaceId, source: FaceId, rotation: Rotation, flip: Flip) -> Self {
        Self {
            slot,
            source,
            rotation,
            flip,
        }
    }
}

/// A set of rules, at most one per slot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransformTable {
    rules: Vec<TransformRule>,
}

impl TransformTable {
    /// Build a table from rules. Later rules for the same slot are ignored.
    #[must_use]
    pub fn new(rules: Vec<TransformRule>) -> Self {
        Self { rules }
    }

    /// Rule for `slot`, or identity if the table has none.
    #[must_use]
    pub fn rule_for(&self, slot: FaceId) -> TransformRule {
        self.rules
            .iter()
            .find(|rule| rule.slot == slot)
            .copied()
            .unwrap_or_else(|| TransformRule::identity(slot))
    }

    /// Rules as written.
    #[must_use]
    pub fn rules(&self) -> &[TransformRule] {
        &self.rules
    }

    /// Layout used for ordinary square faces.
    #[must_use]
    pub fn default_square() -> Self {
        use FaceId::*;
        let r = |slot, source| TransformRule::new(slot, source, Rotation::None, Flip::None);
        Self::new(vec![
            r(Up, Up),
            r(Down, Down),
            r(Left, Back),
            r(Right, Front),
            r(Front, Right),
            r(Back, Left),
        ])
    }

    /// Layout used for 2:1 dome faces.
    #[must_use]
    pub fn default_dome() -> Self {
        Self::default_square()
    }

    /// Layout used for faces decoded from floating-point sources.
    #[must_use]
    pub fn default_hdr() -> Self {
        use FaceId::*;
        let r = |slot, source, rotation| TransformRule::new(slot, source, rotation, Flip::None);
        Self::new(vec![
            r(Up, Up, Rotation::Cw90),
            r(Down, Down, Rotation::Cw90),
            r(Left, Back, Rotation::None),
            r(Right, Left, Rotation::Half),
            r(Front, Right, Rotation::Half),
            r(Back, Front, Rotation::Cw90),
        ])
    }
}

/// Which of the three tables a slot's rule came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableKind {
    /// Ordinary square faces.
    Default,
    /// 2:1 dome faces.
    Dome,
    /// Floating-point sources.
    Hdr,
}

/// The three tables the pipeline chooses between.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformTables {
    /// Square, non-HDR faces.
    pub default: TransformTable,
    /// 2:1 dome faces.
    pub dome: TransformTable,
    /// Faces whose slot was sourced from an HDR file.
    pub hdr: TransformTable,
}

impl Default for TransformTables {
    fn default() -> Self {
        Self {
            default: TransformTable::default_square(),
            dome: TransformTable::default_dome(),
            hdr: TransformTable::default_hdr(),
        }
    }
}

impl TransformTables {
    /// Pick the table for `slot` and return its rule.
    ///
    /// `nominal_kind` is the source kind of the face named like the slot.
    /// HDR wins over dome, dome over default.
    #[must_use]
    pub fn select(
        &self,
        slot: FaceId,
        nominal_kind: SourceKind,
        shape: Shape,
    ) -> (TableKind, TransformRule) {
        let kind = if nominal_kind == SourceKind::Hdr {
            TableKind::Hdr
        } else if shape == Shape::Dome2to1 {
            TableKind::Dome
        } else {
            TableKind::Default
        };
        (kind, self.table(kind).rule_for(slot))
    }

    /// Table for `kind`.
    #[must_use]
    pub fn table(&self, kind: TableKind) -> &TransformTable {
        match kind {
            TableKind::Default => &self.default,
            TableKind::Dome => &self.dome,
            TableKind::Hdr => &self.hdr,
        }
    }
}
