//! Companion files around the atlas: engine material descriptors and cleanup
//! of the original source textures.

mod cleanup;
mod material;

pub use cleanup::{CleanupSummary, cleanup_candidates, delete_files};
pub use material::{MaterialError, MaterialKind, write_material};
