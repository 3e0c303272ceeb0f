//! Arcade skeleton extraction.
//!
//! Pipeline (one binary slice in, one ordered pixel chain out):
//!
//! 1. square dilation to merge nearby tooth/bone fragments
//! 2. Gaussian smoothing + re-binarization
//! 3. 8-connected labeling and selection of the largest component
//! 4. everything outside that component is dropped
//! 5. topology-preserving thinning
//! 6. ordered neighbor walk from the first raster pixel

use crate::domain::{BinaryMask, PointChain, SkeletonParams};
use crate::error::PanoError;
use crate::skeleton::components::label_components;
use crate::skeleton::morphology::{dilate_square, smooth_rebinarize};
use crate::skeleton::thinning::thin;
use crate::skeleton::walk::walk_skeleton;

/// Everything produced while extracting the arcade centerline.
#[derive(Debug, Clone)]
pub struct SkeletonExtraction {
    /// Largest component after dilation and smoothing.
    pub component: BinaryMask,
    /// One-pixel-wide skeleton of `component`.
    pub skeleton: BinaryMask,
    /// Ordered walk along `skeleton`.
    pub chain: PointChain,
    /// Number of components found before selection.
    pub n_components: usize,
}

/// Steps 1–5: the thinned largest component of `mask`.
pub fn arcade_skeleton(
    mask: &BinaryMask,
    params: &SkeletonParams,
) -> Result<(BinaryMask, BinaryMask, usize), PanoError> {
    if mask.count() == 0 {
        return Err(PanoError::EmptyArcade);
    }

    let dilated = dilate_square(mask, params.dilation_size);
    let smoothed = smooth_rebinarize(&dilated, params.blur_sigma);

    let labels = label_components(&smoothed);
    let label = labels.largest().ok_or(PanoError::EmptyArcade)?;
    log::debug!(
        "arcade components: {} found, keeping label {label} ({} px)",
        labels.count(),
        labels.size_of(label)
    );

    let component = labels.mask_of(label);
    if component.count() == 0 {
        return Err(PanoError::EmptyArcade);
    }

    // Thinning never removes a component's last pixel.
    let skeleton = thin(&component);
    Ok((component, skeleton, labels.count()))
}

/// Full extraction: skeleton plus its ordered pixel chain.
pub fn extract_skeleton(
    mask: &BinaryMask,
    params: &SkeletonParams,
) -> Result<SkeletonExtraction, PanoError> {
    let (component, skeleton, n_components) = arcade_skeleton(mask, params)?;
    let chain = walk_skeleton(&skeleton)?;

    if chain.len() < skeleton.count() {
        log::warn!(
            "skeleton walk stopped early: {} of {} pixels (branch or loop in skeleton)",
            chain.len(),
            skeleton.count()
        );
    }

    Ok(SkeletonExtraction {
        component,
        skeleton,
        chain,
        n_components,
    })
}
