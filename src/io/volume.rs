//! Raw volume reader.
//!
//! Headerless little-endian voxel data, slice-major (`z`, then `y`, then
//! `x`). Shape, voxel type and spacing come from the caller.

use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::{Spacing, Volume};
use crate::error::{AppError, PanoError};

/// Voxel encoding of a raw file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum VoxelType {
    I16,
    F32,
}

impl VoxelType {
    pub fn size(&self) -> usize {
        match self {
            VoxelType::I16 => 2,
            VoxelType::F32 => 4,
        }
    }
}

/// Layout of a raw volume file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawLayout {
    pub depth: usize,
    pub height: usize,
    pub width: usize,
    pub voxel: VoxelType,
    pub spacing: Spacing,
}

/// Decode raw bytes into a volume.
pub fn decode_raw_volume(bytes: &[u8], layout: &RawLayout) -> Result<Volume, PanoError> {
    let voxels = layout
        .depth
        .checked_mul(layout.height)
        .and_then(|v| v.checked_mul(layout.width))
        .ok_or_else(|| PanoError::invalid("Volume size overflow."))?;
    let expected = voxels
        .checked_mul(layout.voxel.size())
        .ok_or_else(|| PanoError::invalid("Volume size overflow."))?;
    if bytes.len() != expected {
        return Err(PanoError::invalid(format!(
            "Raw volume has {} bytes, shape {}x{}x{} of {:?} needs {expected}.",
            bytes.len(),
            layout.depth,
            layout.height,
            layout.width,
            layout.voxel
        )));
    }

    let data: Vec<f32> = match layout.voxel {
        VoxelType::I16 => bytes
            .chunks_exact(2)
            .map(|b| f32::from(i16::from_le_bytes([b[0], b[1]])))
            .collect(),
        VoxelType::F32 => bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect(),
    };

    Volume::from_vec(layout.depth, layout.height, layout.width, data, layout.spacing)
}

/// Read a raw volume file.
pub fn read_raw_volume(path: &Path, layout: &RawLayout) -> Result<Volume, AppError> {
    let bytes = std::fs::read(path)
        .map_err(|e| AppError::new(2, format!("Failed to read volume '{}': {e}", path.display())))?;
    let volume = decode_raw_volume(&bytes, layout)?;
    log::info!(
        "loaded volume '{}': {:?} ({:?})",
        path.display(),
        volume.shape(),
        layout.voxel
    );
    Ok(volume)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(voxel: VoxelType) -> RawLayout {
        RawLayout {
            depth: 1,
            height: 2,
            width: 2,
            voxel,
            spacing: Spacing::default(),
        }
    }

    #[test]
    fn decodes_little_endian_i16() {
        let raw: Vec<u8> = [-3i16, 0, 1500, i16::MAX]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let volume = decode_raw_volume(&raw, &layout(VoxelType::I16)).unwrap();
        assert_eq!(volume.data(), &[-3.0, 0.0, 1500.0, 32767.0]);
    }

    #[test]
    fn decodes_little_endian_f32() {
        let raw: Vec<u8> = [0.5f32, -1.25, 2.0, 3.0]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let volume = decode_raw_volume(&raw, &layout(VoxelType::F32)).unwrap();
        assert_eq!(volume.data(), &[0.5, -1.25, 2.0, 3.0]);
    }

    #[test]
    fn size_mismatch_is_rejected() {
        let err = decode_raw_volume(&[0u8; 7], &layout(VoxelType::I16)).unwrap_err();
        assert!(matches!(err, PanoError::InvalidInput(_)));
    }
}
