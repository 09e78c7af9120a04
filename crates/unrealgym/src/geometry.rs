//! Pairwise relative geometry between agents.
//!
//! Everything here is recomputed from scratch each step from the poses the
//! engine reported, so it can never go stale when the roster changes.

use crate::{Result, UnrealError};
use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};

/// Features per ordered agent pair in `pose_obs`.
pub const RELATIVE_FEATURES: usize = 10;
/// Pairs closer than this (strictly) may collide.
pub const COLLISION_DISTANCE: f32 = 100.0;
/// Half-angle of the forward cone in which collisions count, degrees.
pub const COLLISION_BEARING: f32 = 45.0;

/// World pose: location in engine units, rotation in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub roll: f32,
    pub yaw: f32,
    pub pitch: f32,
}

impl Pose {
    pub fn new(x: f32, y: f32, z: f32, roll: f32, yaw: f32, pitch: f32) -> Self {
        Self {
            x,
            y,
            z,
            roll,
            yaw,
            pitch,
        }
    }

    /// Location only, rotation zeroed.
    pub fn at(location: [f32; 3]) -> Self {
        Self::new(location[0], location[1], location[2], 0.0, 0.0, 0.0)
    }

    pub fn from_slice(values: &[f32]) -> Result<Self> {
        match values {
            &[x, y, z, roll, yaw, pitch] => Ok(Self::new(x, y, z, roll, yaw, pitch)),
            _ => Err(UnrealError::ShapeMismatch {
                expected: vec![6],
                actual: vec![values.len()],
            }),
        }
    }

    pub fn to_array(&self) -> [f32; 6] {
        [self.x, self.y, self.z, self.roll, self.yaw, self.pitch]
    }

    pub fn location(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

/// Wrap an angle in degrees into [-180, 180).
fn wrap_degrees(angle: f32) -> f32 {
    (angle + 180.0).rem_euclid(360.0) - 180.0
}

/// Angle of `to` as seen from `from`, relative to `from`'s heading, in degrees.
pub fn bearing(from: &Pose, to: &Pose) -> f32 {
    let heading = (to.y - from.y).atan2(to.x - from.x).to_degrees();
    wrap_degrees(heading - from.yaw)
}

/// Euclidean distance over x, y and z.
pub fn distance(a: &Pose, b: &Pose) -> f32 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let dz = a.z - b.z;
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Smallest absolute yaw difference between two headings, in [0, 180].
pub fn yaw_error(expected: f32, current: f32) -> f32 {
    let delta = (expected - current).rem_euclid(360.0);
    if delta > 180.0 {
        360.0 - delta
    } else {
        delta
    }
}

/// Feature vector describing `to` from `from`'s point of view:
/// `[sin dyaw, cos dyaw, sin bearing, cos bearing, distance, x, y, z, cos yaw, sin yaw]`
/// where the location is `to`'s and the trailing yaw terms are `from`'s.
pub fn relative_features(from: &Pose, to: &Pose) -> [f32; RELATIVE_FEATURES] {
    let delta_yaw = (to.yaw - from.yaw).to_radians();
    let angle = bearing(from, to).to_radians();
    let own_yaw = from.yaw.to_radians();
    [
        delta_yaw.sin(),
        delta_yaw.cos(),
        angle.sin(),
        angle.cos(),
        distance(to, from),
        to.x,
        to.y,
        to.z,
        own_yaw.cos(),
        own_yaw.sin(),
    ]
}

pub fn is_collision(distance: f32, bearing: f32) -> bool {
    distance < COLLISION_DISTANCE && bearing.abs() <= COLLISION_BEARING
}

/// Relative pose tensors for one step.
#[derive(Clone, Debug, PartialEq)]
pub struct RelativeGeometry {
    /// `[j, i, :]` describes agent i as observed by agent j. Shape (N, N, 10).
    pub pose_obs: Array3<f32>,
    /// `[j, i] = (distance, bearing)`. Shape (N, N, 2).
    pub relative_pose: Array3<f32>,
}

impl RelativeGeometry {
    /// Compute every ordered pair, self-pairs included.
    pub fn compute(poses: &[Pose]) -> Self {
        let n = poses.len();
        let mut pose_obs = Array3::zeros((n, n, RELATIVE_FEATURES));
        let mut relative_pose = Array3::zeros((n, n, 2));

        for (j, from) in poses.iter().enumerate() {
            for (i, to) in poses.iter().enumerate() {
                let features = relative_features(from, to);
                for (k, value) in features.iter().enumerate() {
                    pose_obs[[j, i, k]] = *value;
                }
                relative_pose[[j, i, 0]] = features[4];
                relative_pose[[j, i, 1]] = bearing(from, to);
            }
        }

        Self {
            pose_obs,
            relative_pose,
        }
    }

    pub fn num_agents(&self) -> usize {
        self.relative_pose.shape()[0]
    }

    pub fn distance(&self, j: usize, i: usize) -> f32 {
        self.relative_pose[[j, i, 0]]
    }

    pub fn bearing(&self, j: usize, i: usize) -> f32 {
        self.relative_pose[[j, i, 1]]
    }

    pub fn metrics(&self) -> RelativeMetrics {
        relative_metrics(&self.relative_pose)
    }
}

/// Collision matrix and crowding of one step.
#[derive(Clone, Debug, PartialEq)]
pub struct RelativeMetrics {
    /// 1.0 where `[j, i]` collides, else 0.0
    pub collision: Array2<f32>,
    /// Mean over all N*N pair distances
    pub mean_distance: f32,
}

impl RelativeMetrics {
    /// Colliding pairs, self-pairs excluded.
    pub fn collision_count(&self) -> usize {
        self.collision
            .indexed_iter()
            .filter(|((j, i), v)| j != i && **v > 0.0)
            .count()
    }
}

/// Derive collisions and the mean pair distance from a (N, N, 2) tensor.
pub fn relative_metrics(relative_pose: &Array3<f32>) -> RelativeMetrics {
    let (rows, cols, _) = relative_pose.dim();
    let collision = Array2::from_shape_fn((rows, cols), |(j, i)| {
        let hit = is_collision(relative_pose[[j, i, 0]], relative_pose[[j, i, 1]]);
        if hit {
            1.0
        } else {
            0.0
        }
    });
    let pairs = rows * cols;
    let mean_distance = if pairs == 0 {
        0.0
    } else {
        (0..rows)
            .flat_map(|j| (0..cols).map(move |i| (j, i)))
            .map(|(j, i)| relative_pose[[j, i, 0]])
            .sum::<f32>()
            / pairs as f32
    };
    RelativeMetrics {
        collision,
        mean_distance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-3, "{a} != {b}");
    }

    #[test]
    fn test_distance_symmetric_bearing_not() {
        let a = Pose::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let b = Pose::new(300.0, 400.0, 0.0, 0.0, 90.0, 0.0);
        let geometry = RelativeGeometry::compute(&[a, b]);

        assert_close(geometry.distance(0, 1), 500.0);
        assert_eq!(geometry.distance(0, 1), geometry.distance(1, 0));
        assert!((geometry.bearing(0, 1) - geometry.bearing(1, 0)).abs() > 1.0);
    }

    #[test]
    fn test_coincident_poses_share_bearing() {
        let p = Pose::new(10.0, 10.0, 0.0, 0.0, 30.0, 0.0);
        assert_close(bearing(&p, &p), -30.0);
        assert_eq!(distance(&p, &p), 0.0);
    }

    #[test]
    fn test_bearing_relative_to_heading() {
        let origin = Pose::new(0.0, 0.0, 0.0, 0.0, 90.0, 0.0);
        // Straight ahead when facing +y
        assert_close(bearing(&origin, &Pose::at([0.0, 50.0, 0.0])), 0.0);
        // Behind wraps into [-180, 180)
        assert_close(bearing(&origin, &Pose::at([0.0, -50.0, 0.0])).abs(), 180.0);
        assert_close(bearing(&origin, &Pose::at([50.0, 0.0, 0.0])), -90.0);
    }

    #[test]
    fn test_feature_layout() {
        let from = Pose::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let to = Pose::new(100.0, 0.0, 20.0, 0.0, 90.0, 0.0);
        let f = relative_features(&from, &to);
        assert_close(f[0], 1.0); // sin 90
        assert_close(f[1], 0.0);
        assert_close(f[2], 0.0); // dead ahead
        assert_close(f[3], 1.0);
        assert_close(f[4], (100.0f32 * 100.0 + 20.0 * 20.0).sqrt());
        assert_eq!(&f[5..8], &[100.0, 0.0, 20.0]);
        assert_close(f[8], 1.0);
        assert_close(f[9], 0.0);
    }

    #[test]
    fn test_tensor_shapes() {
        let poses = vec![Pose::default(); 3];
        let geometry = RelativeGeometry::compute(&poses);
        assert_eq!(geometry.pose_obs.shape(), &[3, 3, RELATIVE_FEATURES]);
        assert_eq!(geometry.relative_pose.shape(), &[3, 3, 2]);
        assert_eq!(geometry.num_agents(), 3);

        let empty = RelativeGeometry::compute(&[]);
        assert_eq!(empty.metrics().mean_distance, 0.0);
    }

    #[test]
    fn test_collision_boundary() {
        assert!(!is_collision(100.0, 0.0));
        assert!(is_collision(99.0, 44.0));
        assert!(!is_collision(99.0, 46.0));
        assert!(is_collision(99.0, -45.0));
    }

    #[test]
    fn test_collision_matrix_from_poses() {
        let origin = Pose::default();
        let angle = 44.0f32.to_radians();
        let near = Pose::at([99.0 * angle.cos(), 99.0 * angle.sin(), 0.0]);
        let wide_angle = 46.0f32.to_radians();
        let wide = Pose::at([99.0 * wide_angle.cos(), 99.0 * wide_angle.sin(), 0.0]);
        let far = Pose::at([100.0, 0.0, 0.0]);

        let metrics = RelativeGeometry::compute(&[origin, near, wide, far]).metrics();
        assert_eq!(metrics.collision[[0, 1]], 1.0);
        assert_eq!(metrics.collision[[0, 2]], 0.0);
        assert_eq!(metrics.collision[[0, 3]], 0.0);
    }

    #[test]
    fn test_mean_distance() {
        let poses = [Pose::default(), Pose::at([200.0, 0.0, 0.0])];
        let metrics = RelativeGeometry::compute(&poses).metrics();
        // Two self pairs at 0 and two cross pairs at 200
        assert_close(metrics.mean_distance, 100.0);
        assert_eq!(metrics.collision_count(), 0);
    }

    #[test]
    fn test_yaw_error() {
        assert_close(yaw_error(10.0, 350.0), 20.0);
        assert_close(yaw_error(-170.0, 170.0), 20.0);
        assert_close(yaw_error(90.0, 90.0), 0.0);
    }

    #[test]
    fn test_pose_from_slice() {
        let pose = Pose::from_slice(&[1.0, 2.0, 3.0, 0.0, 45.0, 0.0]).unwrap();
        assert_eq!(pose.yaw, 45.0);
        assert!(Pose::from_slice(&[1.0, 2.0]).is_err());
    }
}
