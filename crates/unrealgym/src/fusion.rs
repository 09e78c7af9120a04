//! Compose raw sensor payloads into observation tensors.
//!
//! The engine returns one frame per agent and channel. Depending on the
//! observation mode those frames are stacked along a new agent axis and,
//! for fused modes, concatenated along the channel axis.

use crate::config::ObservationMode;
use crate::geometry::Pose;
use crate::spaces::POSE_DIM;
use crate::{Result, UnrealError};
use ndarray::{concatenate, stack, Array2, Array3, Array4, ArrayD, ArrayView3, Axis, IxDyn, Slice};

/// Which sensor channels `read_batch` should compute: `(cam_pose, color, mask, depth)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CameraFlags {
    pub cam_pose: bool,
    pub color: bool,
    pub mask: bool,
    pub depth: bool,
}

impl CameraFlags {
    /// Exactly the channels `mode` needs to compose its observation.
    pub fn for_mode(mode: ObservationMode) -> Self {
        use ObservationMode::*;
        Self {
            cam_pose: false,
            color: matches!(mode, Color | Cg | Rgbd | ColorMask),
            mask: matches!(mode, Mask | MaskDepth | ColorMask),
            depth: matches!(mode, Depth | Rgbd | MaskDepth),
        }
    }

    pub fn with_cam_pose(mut self, enabled: bool) -> Self {
        self.cam_pose |= enabled;
        self
    }

    pub fn with_color(mut self, enabled: bool) -> Self {
        self.color |= enabled;
        self
    }

    pub fn with_mask(mut self, enabled: bool) -> Self {
        self.mask |= enabled;
        self
    }

    pub fn with_depth(mut self, enabled: bool) -> Self {
        self.depth |= enabled;
        self
    }

    pub fn as_tuple(&self) -> (bool, bool, bool, bool) {
        (self.cam_pose, self.color, self.mask, self.depth)
    }
}

/// Raw payload of one `read_batch` round trip, aligned to the roster.
///
/// Channels that were not requested are left empty.
#[derive(Clone, Debug, Default)]
pub struct SensorBatch {
    pub object_poses: Vec<Pose>,
    pub camera_poses: Vec<Pose>,
    /// `(height, width, 3)` per agent
    pub images: Vec<Array3<f32>>,
    /// `(height, width, 3)` per agent
    pub masks: Vec<Array3<f32>>,
    /// `(height, width, 1)` per agent
    pub depths: Vec<Array3<f32>>,
}

impl SensorBatch {
    pub fn len(&self) -> usize {
        self.object_poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.object_poses.is_empty()
    }
}

fn stack_frames(frames: &[Array3<f32>], agents: usize, channel: &str) -> Result<Array4<f32>> {
    if frames.len() != agents {
        tracing::error!(channel, expected = agents, got = frames.len(), "sensor batch is misaligned");
        return Err(UnrealError::ShapeMismatch {
            expected: vec![agents],
            actual: vec![frames.len()],
        });
    }
    if let Some(first) = frames.first() {
        if let Some(bad) = frames.iter().find(|f| f.shape() != first.shape()) {
            return Err(UnrealError::ShapeMismatch {
                expected: first.shape().to_vec(),
                actual: bad.shape().to_vec(),
            });
        }
    }
    let views: Vec<ArrayView3<f32>> = frames.iter().map(|f| f.view()).collect();
    Ok(stack(Axis(0), &views)?)
}

fn fuse_channels(a: Array4<f32>, b: Array4<f32>) -> Result<ArrayD<f32>> {
    let (lhs, rhs) = (a.shape(), b.shape());
    if lhs[..3] != rhs[..3] {
        return Err(UnrealError::ShapeMismatch {
            expected: lhs.to_vec(),
            actual: rhs.to_vec(),
        });
    }
    Ok(concatenate(Axis(3), &[a.view(), b.view()])?.into_dyn())
}

fn stack_poses(poses: &[Pose]) -> Result<Array2<f32>> {
    let flat: Vec<f32> = poses.iter().flat_map(|p| p.to_array()).collect();
    Ok(Array2::from_shape_vec((poses.len(), POSE_DIM), flat)?)
}

/// Compose the observation tensor for `mode`.
///
/// Image modes yield `(N, height, width, channels)`, `Pose` yields `(N, 6)`.
/// `resolution` is `(width, height)` and only shapes the empty tensor of an
/// empty roster, which keeps the rank of its mode.
pub fn compose_observation(
    mode: ObservationMode,
    resolution: (usize, usize),
    batch: &SensorBatch,
) -> Result<ArrayD<f32>> {
    let n = batch.len();
    if n == 0 {
        let (width, height) = resolution;
        let shape = match mode.channels() {
            Some(channels) => vec![0, height, width, channels],
            None => vec![0, POSE_DIM],
        };
        return Ok(ArrayD::zeros(IxDyn(&shape)));
    }

    let observation = match mode {
        ObservationMode::Color | ObservationMode::Cg => stack_frames(&batch.images, n, "color")?.into_dyn(),
        ObservationMode::Depth => stack_frames(&batch.depths, n, "depth")?.into_dyn(),
        ObservationMode::Mask => stack_frames(&batch.masks, n, "mask")?.into_dyn(),
        ObservationMode::Rgbd => fuse_channels(
            stack_frames(&batch.images, n, "color")?,
            stack_frames(&batch.depths, n, "depth")?,
        )?,
        ObservationMode::MaskDepth => fuse_channels(
            stack_frames(&batch.masks, n, "mask")?,
            stack_frames(&batch.depths, n, "depth")?,
        )?,
        ObservationMode::ColorMask => fuse_channels(
            stack_frames(&batch.images, n, "color")?,
            stack_frames(&batch.masks, n, "mask")?,
        )?,
        ObservationMode::Pose => stack_poses(&batch.object_poses)?.into_dyn(),
    };
    Ok(observation)
}

/// Human-viewable frame of one agent, or `None` when the mode has no image
/// to show.
pub fn project_for_display(
    mode: ObservationMode,
    protagonist: usize,
    observation: &ArrayD<f32>,
) -> Option<ArrayD<f32>> {
    if observation.ndim() != 4 || protagonist >= observation.shape()[0] {
        return None;
    }
    let frame = observation.index_axis(Axis(0), protagonist);

    match mode {
        ObservationMode::Rgbd => Some(frame.slice_axis(Axis(2), Slice::from(0..3)).to_owned()),
        ObservationMode::Color | ObservationMode::Cg | ObservationMode::Mask => Some(frame.to_owned()),
        ObservationMode::Depth => {
            let max = frame.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
            if max > 0.0 {
                Some(frame.mapv(|v| v / max))
            } else {
                Some(frame.to_owned())
            }
        }
        ObservationMode::MaskDepth | ObservationMode::ColorMask | ObservationMode::Pose => None,
    }
}
