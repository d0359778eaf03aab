//! Finds the six face images in a directory by fuzzy filename matching.
//!
//! A file belongs to the face owning the longest keyword that ends its stem
//! (`sky_left` is `left`, even though it also ends in `ft`). Files whose stem
//! ends in no keyword are only considered, by substring, for faces that found
//! nothing otherwise. Within a tier, extension priority wins first, then
//! lexicographic file name order.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::config::FaceKeywords;
use crate::error::StitchError;
use crate::face::{FaceId, FaceSource, lowercase_extension};

/// Image extensions in priority order.
pub const IMAGE_EXTENSIONS: [&str; 7] = ["vtf", "png", "jpg", "jpeg", "tga", "hdr", "exr"];

/// Material text files, recognised only to report them.
pub const MATERIAL_EXTENSION: &str = "vmt";

/// Result of scanning a directory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Faces that matched an image file.
    pub faces: BTreeMap<FaceId, FaceSource>,
    /// Unresolved faces whose keyword matched a `.vmt` file instead.
    pub material_matches: Vec<(FaceId, PathBuf)>,
}

impl Resolution {
    /// Faces with no image, in canonical order.
    #[must_use]
    pub fn missing(&self) -> Vec<FaceId> {
        FaceId::ALL
            .into_iter()
            .filter(|f| !self.faces.contains_key(f))
            .collect()
    }

    /// The six sources, or [`StitchError::FaceNotFound`] naming the gaps.
    ///
    /// # Errors
    ///
    /// When any face is unresolved.
    pub fn into_complete(self) -> Result<BTreeMap<FaceId, FaceSource>, StitchError> {
        let missing = self.missing();
        if missing.is_empty() {
            Ok(self.faces)
        } else {
            Err(StitchError::FaceNotFound { missing })
        }
    }
}

#[derive(Debug)]
struct Candidate {
    path: PathBuf,
    stem: String,
    ext: String,
}

/// Scan `dir` and match files to faces.
///
/// # Errors
///
/// [`StitchError::ReadDir`] if the directory cannot be listed. Missing faces
/// are not an error here; see [`Resolution::into_complete`].
pub fn resolve_faces(dir: &Path, keywords: &FaceKeywords) -> Result<Resolution, StitchError> {
    let read_err = |source| StitchError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = lowercase_extension(&path) else {
            continue;
        };
        if ext != MATERIAL_EXTENSION && !IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            continue;
        }
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        files.push(Candidate { path, stem, ext });
    }
    files.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));

    let (materials, images): (Vec<Candidate>, Vec<Candidate>) =
        files.into_iter().partition(|c| c.ext == MATERIAL_EXTENSION);
    log::info!(
        "found {} candidate image file(s) in {}",
        images.len(),
        dir.display()
    );

    let table: Vec<(FaceId, Vec<String>)> = FaceId::ALL
        .into_iter()
        .map(|face| (face, keywords.for_face(face)))
        .collect();
    let suffix_owner: Vec<Option<FaceId>> =
        images.iter().map(|c| suffix_match(&c.stem, &table)).collect();

    let mut resolution = Resolution::default();
    let mut claimed = BTreeSet::new();

    for (face, words) in &table {
        let anchored = pick(&images, |i, _| suffix_owner[i] == Some(*face), &claimed);
        let chosen = anchored.or_else(|| {
            pick(
                &images,
                |i, c| suffix_owner[i].is_none() && words.iter().any(|w| c.stem.contains(w.as_str())),
                &claimed,
            )
        });

        match chosen {
            Some(i) => {
                claimed.insert(i);
                let source = FaceSource::new(*face, images[i].path.clone());
                log::info!("found file for '{face}': {}", source.file_name());
                resolution.faces.insert(*face, source);
            }
            None => {
                if let Some(vmt) = materials
                    .iter()
                    .find(|c| words.iter().any(|w| c.stem.contains(w.as_str())))
                {
                    log::error!(
                        "found file for '{face}' but it is a material file: {}; an image file (.vtf/.png/etc.) is required",
                        vmt.path.display()
                    );
                    resolution.material_matches.push((*face, vmt.path.clone()));
                }
            }
        }
    }

    let missing = resolution.missing();
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(|f| f.name()).collect();
        log::warn!(
            "required skybox faces are missing: {}; stitching will fail unless all 6 are found",
            names.join(", ")
        );
    }

    Ok(resolution)
}

/// Face owning the longest keyword that ends `stem`.
fn suffix_match(stem: &str, table: &[(FaceId, Vec<String>)]) -> Option<FaceId> {
    let mut best: Option<(FaceId, usize)> = None;
    for (face, words) in table {
        for word in words {
            if !word.is_empty()
                && stem.ends_with(word.as_str())
                && best.is_none_or(|(_, len)| word.len() > len)
            {
                best = Some((*face, word.len()));
            }
        }
    }
    best.map(|(face, _)| face)
}

/// First unclaimed candidate accepted by `accept`, by extension priority then name.
fn pick(
    images: &[Candidate],
    accept: impl Fn(usize, &Candidate) -> bool,
    claimed: &BTreeSet<usize>,
) -> Option<usize> {
    IMAGE_EXTENSIONS.iter().find_map(|ext| {
        images
            .iter()
            .enumerate()
            .find(|(i, c)| c.ext == *ext && !claimed.contains(i) && accept(*i, c))
            .map(|(i, _)| i)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, names: &[&str]) {
        for name in names {
            std::fs::write(dir.join(name), b"").unwrap();
        }
    }

    fn resolved_name(res: &Resolution, face: FaceId) -> Option<String> {
        res.faces.get(&face).map(|s| s.file_name())
    }

    #[test]
    fn test_resolves_short_keywords() {
        let dir = tempfile::tempdir().unwrap();
        touch(
            dir.path(),
            &["sky_up.png", "sky_dn.png", "sky_bk.png", "sky_ft.png", "sky_lf.png", "sky_rt.png"],
        );
        let res = resolve_faces(dir.path(), &FaceKeywords::default()).unwrap();
        assert!(res.missing().is_empty());
        assert_eq!(resolved_name(&res, FaceId::Front).as_deref(), Some("sky_ft.png"));
        assert_eq!(resolved_name(&res, FaceId::Down).as_deref(), Some("sky_dn.png"));
    }

    #[test]
    fn test_longest_suffix_wins() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["sky_left.png", "sky_front.png"]);
        let res = resolve_faces(dir.path(), &FaceKeywords::default()).unwrap();
        assert_eq!(resolved_name(&res, FaceId::Left).as_deref(), Some("sky_left.png"));
        assert_eq!(resolved_name(&res, FaceId::Front).as_deref(), Some("sky_front.png"));
    }

    #[test]
    fn test_embedded_keyword_does_not_steal_face() {
        // "sky_left" contains "ft" but must not resolve front.
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["sky_left.png"]);
        let res = resolve_faces(dir.path(), &FaceKeywords::default()).unwrap();
        assert!(!res.faces.contains_key(&FaceId::Front));
    }

    #[test]
    fn test_source_style_names_without_separator() {
        let dir = tempfile::tempdir().unwrap();
        touch(
            dir.path(),
            &["cityup.vtf", "citydn.vtf", "citylf.vtf", "cityrt.vtf", "cityft.vtf", "citybk.vtf"],
        );
        let res = resolve_faces(dir.path(), &FaceKeywords::default()).unwrap();
        assert!(res.missing().is_empty());
        assert_eq!(resolved_name(&res, FaceId::Right).as_deref(), Some("cityrt.vtf"));
    }

    #[test]
    fn test_extension_priority() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["a_up.png", "b_up.vtf", "c_up.exr"]);
        let res = resolve_faces(dir.path(), &FaceKeywords::default()).unwrap();
        assert_eq!(resolved_name(&res, FaceId::Up).as_deref(), Some("b_up.vtf"));
    }

    #[test]
    fn test_same_extension_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["z_up.png", "a_up.png", "m_up.png"]);
        let res = resolve_faces(dir.path(), &FaceKeywords::default()).unwrap();
        assert_eq!(resolved_name(&res, FaceId::Up).as_deref(), Some("a_up.png"));
    }

    #[test]
    fn test_substring_fallback() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["top_of_sky.png", "sky_dn.png"]);
        let res = resolve_faces(dir.path(), &FaceKeywords::default()).unwrap();
        assert_eq!(resolved_name(&res, FaceId::Up).as_deref(), Some("top_of_sky.png"));
        assert_eq!(resolved_name(&res, FaceId::Down).as_deref(), Some("sky_dn.png"));
    }

    #[test]
    fn test_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["SKY_UP.PNG"]);
        let res = resolve_faces(dir.path(), &FaceKeywords::default()).unwrap();
        assert_eq!(resolved_name(&res, FaceId::Up).as_deref(), Some("SKY_UP.PNG"));
    }

    #[test]
    fn test_case_folding_matches_keywords_for_non_ascii_names() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["SKY_ÜBER.png"]);
        let mut keywords = FaceKeywords::default();
        keywords.set(FaceId::Up, vec!["ÜBER".to_string()]);
        let res = resolve_faces(dir.path(), &keywords).unwrap();
        assert_eq!(resolved_name(&res, FaceId::Up).as_deref(), Some("SKY_ÜBER.png"));
    }

    #[test]
    fn test_unrelated_extensions_ignored() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["sky_up.txt", "sky_up.psd"]);
        let res = resolve_faces(dir.path(), &FaceKeywords::default()).unwrap();
        assert!(res.faces.is_empty());
    }

    #[test]
    fn test_material_file_reported_not_resolved() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["sky_up.vmt", "sky_dn.png"]);
        let res = resolve_faces(dir.path(), &FaceKeywords::default()).unwrap();
        assert!(!res.faces.contains_key(&FaceId::Up));
        assert_eq!(res.material_matches.len(), 1);
        assert_eq!(res.material_matches[0].0, FaceId::Up);
    }

    #[test]
    fn test_missing_faces_reported() {
        let dir = tempfile::tempdir().unwrap();
        touch(
            dir.path(),
            &["sky_up.png", "sky_dn.png", "sky_bk.png", "sky_ft.png", "sky_lf.png"],
        );
        let res = resolve_faces(dir.path(), &FaceKeywords::default()).unwrap();
        assert_eq!(res.missing(), vec![FaceId::Right]);
        match res.into_complete() {
            Err(StitchError::FaceNotFound { missing }) => assert_eq!(missing, vec![FaceId::Right]),
            other => panic!("expected FaceNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_custom_keywords() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["sky_zenith.png"]);
        let mut keywords = FaceKeywords::default();
        keywords.set(FaceId::Up, vec!["zenith".to_string()]);
        let res = resolve_faces(dir.path(), &keywords).unwrap();
        assert_eq!(resolved_name(&res, FaceId::Up).as_deref(), Some("sky_zenith.png"));
    }

    #[test]
    fn test_missing_directory_is_error() {
        let result = resolve_faces(Path::new("/nonexistent/skyforge"), &FaceKeywords::default());
        assert!(matches!(result, Err(StitchError::ReadDir { .. })));
    }
}
