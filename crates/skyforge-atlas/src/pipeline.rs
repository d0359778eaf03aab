//! End-to-end run: resolve, decode, infer, select, composite, save.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};

use crate::compositor::composite;
use crate::config::StitchConfig;
use crate::decode::decode;
use crate::error::StitchError;
use crate::face::{FaceId, FaceSource, SourceKind};
use crate::resolver::{Resolution, resolve_faces};
use crate::topology::{Topology, infer_topology};
use crate::transform::{TableKind, TransformRule, TransformTable};

/// Summary of a successful run.
#[derive(Clone, Debug)]
pub struct StitchReport {
    /// Where the atlas was written.
    pub output_path: PathBuf,
    /// Atlas size in pixels.
    pub dimensions: (u32, u32),
    /// Inferred unit size and shape.
    pub topology: Topology,
    /// The six resolved source files.
    pub sources: BTreeMap<FaceId, FaceSource>,
    /// Rule used for each slot and the table it came from.
    pub rules: Vec<(TableKind, TransformRule)>,
}

/// In-memory result of [`Stitcher::compose`].
pub struct ComposedAtlas {
    /// The finished atlas image.
    pub image: RgbaImage,
    /// Inferred unit size and shape.
    pub topology: Topology,
    /// Rule used for each slot and the table it came from.
    pub rules: Vec<(TableKind, TransformRule)>,
}

/// Runs the conversion pipeline with a fixed configuration.
#[derive(Clone, Debug, Default)]
pub struct Stitcher {
    config: StitchConfig,
}

impl Stitcher {
    /// Creates a stitcher.
    pub fn new(config: StitchConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &StitchConfig {
        &self.config
    }

    /// Scan `input_dir` for face images.
    ///
    /// # Errors
    ///
    /// [`StitchError::ReadDir`] if the directory cannot be listed.
    pub fn resolve(&self, input_dir: &Path) -> Result<Resolution, StitchError> {
        resolve_faces(input_dir, &self.config.keywords)
    }

    /// Decode the six sources and build the atlas in memory.
    ///
    /// # Errors
    ///
    /// [`StitchError::FaceNotFound`] if a face is absent from `sources`, a
    /// decode error for the first face that fails, or
    /// [`StitchError::NoValidFaceSize`].
    pub fn compose(
        &self,
        sources: &BTreeMap<FaceId, FaceSource>,
    ) -> Result<ComposedAtlas, StitchError> {
        let missing: Vec<FaceId> = FaceId::ALL
            .into_iter()
            .filter(|f| !sources.contains_key(f))
            .collect();
        if !missing.is_empty() {
            return Err(StitchError::FaceNotFound { missing });
        }

        let mut rasters = BTreeMap::new();
        for (face, source) in sources {
            let image = decode(source).map_err(|e| StitchError::Decode {
                face: *face,
                path: source.path.clone(),
                source: e,
            })?;
            log::info!(
                "decoded '{face}' from {} ({}x{})",
                source.file_name(),
                image.width(),
                image.height()
            );
            rasters.insert(*face, image);
        }

        let topology = infer_topology(&rasters, self.config.min_face_size)?;

        let rules: Vec<(TableKind, TransformRule)> = FaceId::SLOT_ORDER
            .into_iter()
            .map(|slot| {
                let kind = sources
                    .get(&slot)
                    .map_or(SourceKind::StandardRaster, |s| s.kind);
                self.config.tables.select(slot, kind, topology.shape)
            })
            .collect();
        for (table, rule) in &rules {
            log::debug!("slot '{}' uses {table:?} table: {rule:?}", rule.slot);
        }

        let resolved = TransformTable::new(rules.iter().map(|(_, rule)| *rule).collect());
        let image = composite(&rasters, &resolved, topology, self.config.min_face_size);
        Ok(ComposedAtlas {
            image,
            topology,
            rules,
        })
    }

    /// Full run: resolve faces in `input_dir` and write the atlas to
    /// `output_path` as PNG. Nothing is written unless every stage succeeds.
    ///
    /// # Errors
    ///
    /// Any [`StitchError`]; see [`StitchError::is_recoverable`].
    pub fn run(&self, input_dir: &Path, output_path: &Path) -> Result<StitchReport, StitchError> {
        let sources = self.resolve(input_dir)?.into_complete()?;
        let composed = self.compose(&sources)?;

        let write_err = |source| StitchError::Write {
            path: output_path.to_path_buf(),
            source,
        };
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| write_err(image::ImageError::IoError(e)))?;
        }
        composed
            .image
            .save_with_format(output_path, ImageFormat::Png)
            .map_err(write_err)?;

        let dimensions = composed.image.dimensions();
        log::info!(
            "stitched cubemap saved to {} ({}x{})",
            output_path.display(),
            dimensions.0,
            dimensions.1
        );

        Ok(StitchReport {
            output_path: output_path.to_path_buf(),
            dimensions,
            topology: composed.topology,
            sources,
            rules: composed.rules,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::build_vtf;
    use crate::topology::Shape;
    use crate::transform::Rotation;
    use image::{DynamicImage, Rgba, Rgba32FImage};

    const NAMES: [(&str, FaceId); 6] = [
        ("sky_up", FaceId::Up),
        ("sky_dn", FaceId::Down),
        ("sky_bk", FaceId::Back),
        ("sky_ft", FaceId::Front),
        ("sky_lf", FaceId::Left),
        ("sky_rt", FaceId::Right),
    ];

    fn color_of(face: FaceId) -> Rgba<u8> {
        Rgba([face as u8 * 40 + 5, 200 - face as u8 * 20, 90, 255])
    }

    fn write_pngs(dir: &Path, size: (u32, u32)) {
        for (name, face) in NAMES {
            RgbaImage::from_pixel(size.0, size.1, color_of(face))
                .save(dir.join(format!("{name}.png")))
                .unwrap();
        }
    }

    fn cell(atlas: &RgbaImage, slot: FaceId, unit: u32, dx: u32, dy: u32) -> Rgba<u8> {
        let (col, row) = slot.atlas_cell();
        *atlas.get_pixel(col * unit + dx, row * unit + dy)
    }

    #[test]
    fn test_end_to_end_square_pngs() {
        let dir = tempfile::tempdir().unwrap();
        write_pngs(dir.path(), (512, 512));
        let out = dir.path().join("skybox").join("atlas.png");

        let report = Stitcher::default().run(dir.path(), &out).unwrap();
        assert_eq!(report.dimensions, (2048, 1536));
        assert_eq!(report.topology.unit_size, 512);
        assert_eq!(report.topology.shape, Shape::Square);

        let atlas = image::open(&out).unwrap().to_rgba8();
        assert_eq!(atlas.dimensions(), (2048, 1536));
        assert_eq!(cell(&atlas, FaceId::Front, 512, 100, 100), color_of(FaceId::Right));
        assert_eq!(cell(&atlas, FaceId::Back, 512, 100, 100), color_of(FaceId::Left));
        assert_eq!(*atlas.get_pixel(0, 0), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_missing_face_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        write_pngs(dir.path(), (64, 64));
        std::fs::remove_file(dir.path().join("sky_rt.png")).unwrap();
        let out = dir.path().join("out").join("atlas.png");

        let err = Stitcher::default().run(dir.path(), &out).unwrap_err();
        match &err {
            StitchError::FaceNotFound { missing } => assert_eq!(missing, &vec![FaceId::Right]),
            other => panic!("expected FaceNotFound, got {other:?}"),
        }
        assert!(err.is_recoverable());
        assert!(!out.exists());
    }

    #[test]
    fn test_decode_failure_aborts_without_output() {
        let dir = tempfile::tempdir().unwrap();
        write_pngs(dir.path(), (64, 64));
        std::fs::remove_file(dir.path().join("sky_up.png")).unwrap();
        // RGBA16161616F is not decoded.
        std::fs::write(
            dir.path().join("sky_up.vtf"),
            build_vtf(2, 1, 1, 24, &[vec![0; 8]]),
        )
        .unwrap();
        let out = dir.path().join("atlas.png");

        let err = Stitcher::default().run(dir.path(), &out).unwrap_err();
        assert!(matches!(
            err,
            StitchError::Decode {
                face: FaceId::Up,
                ..
            }
        ));
        assert!(!err.is_recoverable());
        assert!(!out.exists());
    }

    #[test]
    fn test_placeholder_face_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        write_pngs(dir.path(), (96, 96));
        RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]))
            .save(dir.path().join("sky_dn.png"))
            .unwrap();
        let out = dir.path().join("atlas.png");

        let report = Stitcher::default().run(dir.path(), &out).unwrap();
        assert_eq!(report.topology.unit_size, 96);
        let atlas = image::open(&out).unwrap().to_rgba8();
        assert_eq!(cell(&atlas, FaceId::Down, 96, 50, 50).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_all_placeholders_fail() {
        let dir = tempfile::tempdir().unwrap();
        write_pngs(dir.path(), (8, 8));
        let err = Stitcher::default()
            .run(dir.path(), &dir.path().join("atlas.png"))
            .unwrap_err();
        assert!(matches!(err, StitchError::NoValidFaceSize { .. }));
    }

    #[test]
    fn test_mixed_sizes_normalized_to_front() {
        let dir = tempfile::tempdir().unwrap();
        write_pngs(dir.path(), (128, 128));
        RgbaImage::from_pixel(256, 256, color_of(FaceId::Up))
            .save(dir.path().join("sky_up.png"))
            .unwrap();
        let report = Stitcher::default()
            .run(dir.path(), &dir.path().join("atlas.png"))
            .unwrap();
        assert_eq!(report.dimensions, (512, 384));
    }

    #[test]
    fn test_dome_inputs() {
        let dir = tempfile::tempdir().unwrap();
        write_pngs(dir.path(), (256, 128));
        for name in ["sky_up", "sky_dn"] {
            RgbaImage::from_pixel(128, 128, Rgba([1, 2, 3, 255]))
                .save(dir.path().join(format!("{name}.png")))
                .unwrap();
        }
        let out = dir.path().join("atlas.png");
        let report = Stitcher::default().run(dir.path(), &out).unwrap();
        assert_eq!(report.topology.shape, Shape::Dome2to1);
        assert_eq!(report.topology.unit_size, 128);
        assert!(report.rules.iter().all(|(t, _)| *t == TableKind::Dome));

        let atlas = image::open(&out).unwrap().to_rgba8();
        for slot in [FaceId::Left, FaceId::Front, FaceId::Right, FaceId::Back] {
            assert_eq!(cell(&atlas, slot, 128, 64, 100).0, [0, 0, 0, 255]);
        }
    }

    #[test]
    fn test_hdr_slots_use_hdr_table() {
        let dir = tempfile::tempdir().unwrap();
        write_pngs(dir.path(), (64, 64));
        std::fs::remove_file(dir.path().join("sky_ft.png")).unwrap();
        DynamicImage::ImageRgba32F(Rgba32FImage::from_pixel(64, 64, Rgba([1.0, 0.0, 0.0, 1.0])))
            .save(dir.path().join("sky_ft.exr"))
            .unwrap();

        let report = Stitcher::default()
            .run(dir.path(), &dir.path().join("atlas.png"))
            .unwrap();
        let front = report
            .rules
            .iter()
            .find(|(_, r)| r.slot == FaceId::Front)
            .unwrap();
        assert_eq!(front.0, TableKind::Hdr);
        assert_eq!(front.1.rotation, Rotation::Half);
        let up = report.rules.iter().find(|(_, r)| r.slot == FaceId::Up).unwrap();
        assert_eq!(up.0, TableKind::Default);
    }

    #[test]
    fn test_vtf_face_in_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        write_pngs(dir.path(), (64, 64));
        std::fs::remove_file(dir.path().join("sky_rt.png")).unwrap();
        let texels = [7u8, 8, 9, 255].repeat(64 * 64);
        std::fs::write(dir.path().join("sky_rt.vtf"), build_vtf(4, 64, 64, 0, &[texels])).unwrap();
        let out = dir.path().join("atlas.png");

        let report = Stitcher::default().run(dir.path(), &out).unwrap();
        assert_eq!(report.sources[&FaceId::Right].kind, SourceKind::CompressedTexture);
        let atlas = image::open(&out).unwrap().to_rgba8();
        // Default table: right face lands in the front slot.
        assert_eq!(cell(&atlas, FaceId::Front, 64, 3, 3).0, [7, 8, 9, 255]);
    }
}
