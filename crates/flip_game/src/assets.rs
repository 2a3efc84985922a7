//! Card image provider: resolves the back/face naming scheme to paths and
//! loads every image into a GPU texture at startup.
//!
//! There is no fallback image. A card set with any missing or undecodable
//! file cannot be played, so the first failure aborts startup.

use std::path::{Path, PathBuf};

use flip_core::config::AssetSection;
use flip_render::{SpritePipeline, Texture};

use crate::board_mesh::TextureSlot;
use crate::error::StartupError;

/// Paths for one back image and `pair_count` face images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardAssetPaths {
    pub back: PathBuf,
    pub faces: Vec<PathBuf>,
}

impl CardAssetPaths {
    pub fn resolve(assets: &AssetSection, pair_count: usize) -> Self {
        Self {
            back: assets.back_path(),
            faces: (0..pair_count).map(|id| assets.face_path(id)).collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        std::iter::once(&self.back).chain(self.faces.iter())
    }

    /// Fail fast on a missing file before any window or GPU resource exists.
    pub fn check_present(&self) -> Result<(), StartupError> {
        match self.iter().find(|path| !path.is_file()) {
            Some(path) => Err(StartupError::Asset {
                path: path.clone(),
                reason: "file not found".to_string(),
            }),
            None => Ok(()),
        }
    }
}

pub struct GpuCardTexture {
    pub texture: Texture,
    pub bind_group: wgpu::BindGroup,
}

pub struct CardTextures {
    back: GpuCardTexture,
    faces: Vec<GpuCardTexture>,
}

impl CardTextures {
    pub fn get(&self, slot: TextureSlot) -> Option<&GpuCardTexture> {
        match slot {
            TextureSlot::Back => Some(&self.back),
            TextureSlot::Face(identity) => self.faces.get(identity),
        }
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn estimate_memory_mb(&self) -> f32 {
        let bytes: usize = std::iter::once(&self.back)
            .chain(self.faces.iter())
            .map(|tex| {
                let (w, h) = tex.texture.size;
                (w as usize) * (h as usize) * 4
            })
            .sum();
        bytes as f32 / (1024.0 * 1024.0)
    }
}

fn load_card_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    pipeline: &SpritePipeline,
    path: &Path,
) -> Result<GpuCardTexture, StartupError> {
    let texture =
        Texture::from_path(device, queue, path).map_err(|reason| StartupError::Asset {
            path: path.to_path_buf(),
            reason,
        })?;
    let bind_group = pipeline.create_texture_bind_group(device, &texture);
    Ok(GpuCardTexture {
        texture,
        bind_group,
    })
}

/// Load the back image, then every face in identity order. Textures loaded
/// before a failure are dropped on the way out.
pub fn load_card_textures(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    pipeline: &SpritePipeline,
    paths: &CardAssetPaths,
) -> Result<CardTextures, StartupError> {
    let back = load_card_texture(device, queue, pipeline, &paths.back)?;
    let faces = paths
        .faces
        .iter()
        .map(|path| load_card_texture(device, queue, pipeline, path))
        .collect::<Result<Vec<_>, _>>()?;

    let textures = CardTextures { back, faces };
    log::info!(
        "Loaded {} card faces + back ({:.2} MB)",
        textures.face_count(),
        textures.estimate_memory_mb()
    );
    Ok(textures)
}
