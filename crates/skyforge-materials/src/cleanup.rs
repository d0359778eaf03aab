//! Optional removal of the original VTF sources after a successful run.

use std::collections::BTreeSet;
use std::path::PathBuf;

use skyforge_atlas::{FaceSource, MATERIAL_EXTENSION, SourceKind};

/// Outcome of [`delete_files`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CleanupSummary {
    /// Files removed.
    pub deleted: Vec<PathBuf>,
    /// Files that could not be removed.
    pub failed: Vec<PathBuf>,
}

/// Source files that may be deleted: every VTF used as a face, plus the
/// sibling `.vmt` with the same stem when it exists. Sorted, no duplicates.
pub fn cleanup_candidates<'a>(sources: impl IntoIterator<Item = &'a FaceSource>) -> Vec<PathBuf> {
    let mut files = BTreeSet::new();
    for source in sources {
        if source.kind != SourceKind::CompressedTexture {
            continue;
        }
        let vmt = source.path.with_extension(MATERIAL_EXTENSION);
        if vmt.is_file() {
            files.insert(vmt);
        }
        files.insert(source.path.clone());
    }
    files.into_iter().collect()
}

/// Delete `paths`, logging each failure as a warning.
pub fn delete_files(paths: &[PathBuf]) -> CleanupSummary {
    let mut summary = CleanupSummary::default();
    for path in paths {
        match std::fs::remove_file(path) {
            Ok(()) => {
                log::info!("deleted {}", path.display());
                summary.deleted.push(path.clone());
            }
            Err(e) => {
                log::warn!("could not delete {}: {e}", path.display());
                summary.failed.push(path.clone());
            }
        }
    }
    log::info!("cleanup complete, {} file(s) deleted", summary.deleted.len());
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyforge_atlas::FaceId;

    #[test]
    fn test_candidates_include_vtf_and_sibling_vmt() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["sky_up.vtf", "sky_up.vmt", "sky_dn.vtf", "sky_ft.png", "sky_ft.vmt"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let sources = [
            FaceSource::new(FaceId::Up, dir.path().join("sky_up.vtf")),
            FaceSource::new(FaceId::Down, dir.path().join("sky_dn.vtf")),
            FaceSource::new(FaceId::Front, dir.path().join("sky_ft.png")),
        ];
        let names: Vec<String> = cleanup_candidates(&sources)
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["sky_dn.vtf", "sky_up.vmt", "sky_up.vtf"]);
    }

    #[test]
    fn test_no_vtf_sources_means_nothing_to_clean() {
        let sources = [FaceSource::new(FaceId::Up, "sky_up.png")];
        assert!(cleanup_candidates(&sources).is_empty());
    }

    #[test]
    fn test_delete_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("sky_up.vtf");
        std::fs::write(&present, b"").unwrap();
        let absent = dir.path().join("sky_dn.vtf");

        let summary = delete_files(&[present.clone(), absent.clone()]);
        assert_eq!(summary.deleted, vec![present.clone()]);
        assert_eq!(summary.failed, vec![absent]);
        assert!(!present.exists());
    }
}
