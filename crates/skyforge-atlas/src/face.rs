//! The six skybox faces and the source files they are resolved from.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One of the six faces of a skybox cube.
///
/// Also used to name the six populated cells of the output atlas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum FaceId {
    /// Sky-facing face.
    Up = 0,
    /// Ground-facing face.
    Down = 1,
    /// Left horizontal face.
    Left = 2,
    /// Right horizontal face.
    Right = 3,
    /// Front horizontal face.
    Front = 4,
    /// Back horizontal face.
    Back = 5,
}

impl FaceId {
    /// All six faces in canonical order.
    pub const ALL: [FaceId; 6] = [
        FaceId::Up,
        FaceId::Down,
        FaceId::Left,
        FaceId::Right,
        FaceId::Front,
        FaceId::Back,
    ];

    /// Order in which atlas slots are filled.
    pub const SLOT_ORDER: [FaceId; 6] = [
        FaceId::Up,
        FaceId::Left,
        FaceId::Front,
        FaceId::Right,
        FaceId::Back,
        FaceId::Down,
    ];

    /// Lowercase name, as used in logs and config files.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            FaceId::Up => "up",
            FaceId::Down => "down",
            FaceId::Left => "left",
            FaceId::Right => "right",
            FaceId::Front => "front",
            FaceId::Back => "back",
        }
    }

    /// Whether this face sits on the horizon ring (not up or down).
    #[must_use]
    pub fn is_horizontal(self) -> bool {
        !matches!(self, FaceId::Up | FaceId::Down)
    }

    /// Cell position `(column, row)` of this face's slot in the 4×3 atlas grid.
    #[must_use]
    pub fn atlas_cell(self) -> (u32, u32) {
        match self {
            FaceId::Up => (1, 0),
            FaceId::Left => (0, 1),
            FaceId::Front => (1, 1),
            FaceId::Right => (2, 1),
            FaceId::Back => (3, 1),
            FaceId::Down => (1, 2),
        }
    }

    /// Default filename keywords for this face.
    #[must_use]
    pub fn default_keywords(self) -> &'static [&'static str] {
        match self {
            FaceId::Up => &["up", "top"],
            FaceId::Down => &["down", "dn"],
            FaceId::Left => &["left", "lf"],
            FaceId::Right => &["right", "rt"],
            FaceId::Front => &["front", "ft"],
            FaceId::Back => &["back", "bk"],
        }
    }
}

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Container family of a face source file, decided by its extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Block-compressed Valve texture (`.vtf`).
    CompressedTexture,
    /// Floating-point image (`.hdr`, `.exr`).
    Hdr,
    /// Anything the general-purpose image decoder reads directly.
    StandardRaster,
}

impl SourceKind {
    /// Classify a lowercase file extension (without the dot).
    #[must_use]
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "vtf" => SourceKind::CompressedTexture,
            "hdr" | "exr" => SourceKind::Hdr,
            _ => SourceKind::StandardRaster,
        }
    }
}

/// A face that has been matched to a file on disk.
///
/// The file is not read until it is decoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaceSource {
    /// Which face this file provides.
    pub face: FaceId,
    /// Path to the source file.
    pub path: PathBuf,
    /// Container family, from the file extension.
    pub kind: SourceKind,
}

impl FaceSource {
    /// Build a source, classifying its kind from the path's extension.
    pub fn new(face: FaceId, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let kind = lowercase_extension(&path)
            .map(|ext| SourceKind::from_extension(&ext))
            .unwrap_or(SourceKind::StandardRaster);
        Self { face, path, kind }
    }

    /// File name for log messages.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Lowercase extension of `path`, if any.
pub(crate) fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}
