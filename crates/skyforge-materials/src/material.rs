//! `.vmat` material descriptors referencing the stitched atlas.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors returned while writing a material file.
#[derive(Debug, Error)]
pub enum MaterialError {
    /// The file or its directory could not be written.
    #[error("could not write material file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The material descriptors that can be generated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaterialKind {
    /// Standard LDR sky material.
    Skybox,
    /// Moondome material sampling the atlas as a cube map.
    Moondome,
}

impl MaterialKind {
    /// Every kind, in the order the user is asked about them.
    pub const ALL: [MaterialKind; 2] = [MaterialKind::Skybox, MaterialKind::Moondome];

    /// Human-readable name.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            MaterialKind::Skybox => "Skybox",
            MaterialKind::Moondome => "Moondome",
        }
    }

    /// Material text pointing at `texture_path` (engine-relative).
    #[must_use]
    pub fn render(self, texture_path: &str) -> String {
        match self {
            MaterialKind::Skybox => skybox_template(texture_path),
            MaterialKind::Moondome => moondome_template(texture_path),
        }
    }
}

fn skybox_template(texture_path: &str) -> String {
    format!(
        r#"// THIS FILE IS AUTO-GENERATED (STANDARD SKYBOX)

Layer0
{{
	shader "sky.vfx"

	//---- Format ----
	F_TEXTURE_FORMAT2 1 // Dxt1 (LDR)

	//---- Texture ----
	g_flBrightnessExposureBias "0.000"
	g_flRenderOnlyExposureBias "0.000"
	SkyTexture "{texture_path}"


	VariableState
	{{
		"Texture"
		{{
		}}
	}}
}}"#
    )
}

fn moondome_template(texture_path: &str) -> String {
    format!(
        r#"// THIS FILE IS AUTO-GENERATED (MOONDOME)

Layer0
{{
	shader "csgo_moondome.vfx"

	//---- Color ----
	g_flTexCoordRotation "0.000"
	g_nScaleTexCoordUByModelScaleAxis "0" // None
	g_nScaleTexCoordVByModelScaleAxis "0" // None
	g_vColorTint "[1.000000 1.000000 1.000000 0.000000]"
	g_vTexCoordCenter "[0.500 0.500]"
	g_vTexCoordOffset "[0.000 0.000]"
	g_vTexCoordScale "[1.000 1.000]"
	g_vTexCoordScrollSpeed "[0.000 0.000]"
	TextureColor "[1.000000 1.000000 1.000000 0.000000]"

	//---- CubeParallax ----
	g_flCubeParallax "0.000"

	//---- Fog ----
	g_bFogEnabled "1"

	//---- Texture ----
	TextureCubeMap "{texture_path}"

	//---- Texture Address Mode ----
	g_nTextureAddressModeU "0" // Wrap
	g_nTextureAddressModeV "0" // Wrap


	VariableState
	{{
		"Color"
		{{
		}}
		"CubeParallax"
		{{
		}}
		"Fog"
		{{
		}}
		"Texture"
		{{
		}}
		"Texture Address Mode"
		{{
		}}
	}}
}}"#
    )
}

/// Render `kind` and write it to `path`, creating the parent directory.
///
/// # Errors
///
/// [`MaterialError::Write`] on any I/O failure.
pub fn write_material(
    kind: MaterialKind,
    path: &Path,
    texture_path: &str,
) -> Result<(), MaterialError> {
    let write_err = |source| MaterialError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    std::fs::write(path, kind.render(texture_path)).map_err(write_err)?;
    log::info!("{} material created at {}", kind.label(), path.display());
    Ok(())
}
