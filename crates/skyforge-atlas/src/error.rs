//! Pipeline error types.

use std::path::PathBuf;

use crate::decode::DecodeError;
use crate::face::FaceId;

/// Errors that abort a stitching run.
#[derive(Debug, thiserror::Error)]
pub enum StitchError {
    /// The input directory could not be listed.
    #[error("failed to read input directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// One or more faces matched no image file.
    #[error("required skybox faces not found: {}", face_list(.missing))]
    FaceNotFound { missing: Vec<FaceId> },

    /// A face could not be decoded to RGBA.
    #[error("failed to decode '{face}' face from {path}: {source}")]
    Decode {
        face: FaceId,
        path: PathBuf,
        #[source]
        source: DecodeError,
    },

    /// Every face was smaller than the minimum usable size.
    #[error("no face is at least {min_size}x{min_size} pixels")]
    NoValidFaceSize { min_size: u32 },

    /// The atlas could not be written.
    #[error("failed to write atlas to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl StitchError {
    /// Whether the caller can fix the input and retry, as opposed to a
    /// failure in the middle of the pipeline.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, StitchError::FaceNotFound { .. })
    }
}

fn face_list(faces: &[FaceId]) -> String {
    faces
        .iter()
        .map(|f| f.name())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_not_found_lists_faces() {
        let err = StitchError::FaceNotFound {
            missing: vec![FaceId::Down, FaceId::Back],
        };
        assert_eq!(err.to_string(), "required skybox faces not found: down, back");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_decode_failure_is_fatal() {
        let err = StitchError::Decode {
            face: FaceId::Up,
            path: PathBuf::from("sky_up.vtf"),
            source: DecodeError::UnsupportedChannelCount { channels: 2 },
        };
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("'up'"));
    }
}
