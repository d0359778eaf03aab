//! Skybox face stitching: resolves six face images from a directory, decodes
//! VTF, HDR and ordinary raster sources to RGBA, and composites them into a
//! single 4×3 cross-layout atlas.

mod compositor;
mod config;
pub mod decode;
mod error;
mod face;
mod pipeline;
mod resolver;
mod topology;
mod transform;

pub use compositor::{AtlasCompositor, composite};
pub use config::{FaceKeywords, StitchConfig};
pub use decode::{DecodeError, FaceDecoder};
pub use error::StitchError;
pub use face::{FaceId, FaceSource, SourceKind};
pub use pipeline::{ComposedAtlas, StitchReport, Stitcher};
pub use resolver::{IMAGE_EXTENSIONS, MATERIAL_EXTENSION, Resolution, resolve_faces};
pub use topology::{MIN_SIZE, Shape, Topology, classify_ratio, infer_topology, is_placeholder};
pub use transform::{
    Flip, Rotation, TableKind, TransformRule, TransformTable, TransformTables, apply_transform,
};
