//! Initial placement of agents.

use rand::seq::SliceRandom;
use rand::Rng;

/// Half-width of the obstacle-free square around the first safe start.
pub const START_AREA_RANGE: f32 = 500.0;
/// Attempts made by [`find_start_point`] before giving up.
const START_POINT_TRIES: usize = 5;

/// Axis-aligned box `[x_min, x_max, y_min, y_max, z_min, z_max]` agents may
/// be reset into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResetArea {
    pub x: (i32, i32),
    pub y: (i32, i32),
    pub z: (i32, i32),
}

impl From<[i32; 6]> for ResetArea {
    fn from(a: [i32; 6]) -> Self {
        Self {
            x: (a[0], a[1]),
            y: (a[2], a[3]),
            z: (a[4], a[5]),
        }
    }
}

impl ResetArea {
    /// Strictly inside on the horizontal plane.
    pub fn contains_xy(&self, x: f32, y: f32) -> bool {
        (self.x.0 as f32) < x && x < (self.x.1 as f32) && (self.y.0 as f32) < y && y < (self.y.1 as f32)
    }
}

/// Integer in `[low, high)`, or `low` when the range is empty.
fn randint<R: Rng + ?Sized>(rng: &mut R, (low, high): (i32, i32)) -> f32 {
    if high > low {
        rng.gen_range(low..high) as f32
    } else {
        low as f32
    }
}

/// Draw `num` integer-valued locations uniformly from `area`.
pub fn sample_from_area<R: Rng + ?Sized>(area: &ResetArea, num: usize, rng: &mut R) -> Vec<[f32; 3]> {
    (0..num)
        .map(|_| [randint(rng, area.x), randint(rng, area.y), randint(rng, area.z)])
        .collect()
}

/// One initial location per agent.
///
/// Picks distinct safe-start points unless `use_reset_area` is set or there
/// are more agents than safe starts, in which case it samples the reset area.
pub fn sample_init_poses<R: Rng + ?Sized>(
    safe_start: &[[f32; 3]],
    area: &ResetArea,
    use_reset_area: bool,
    num_agents: usize,
    rng: &mut R,
) -> Vec<[f32; 3]> {
    let use_reset_area = if !use_reset_area && num_agents > safe_start.len() {
        tracing::warn!(
            agents = num_agents,
            safe_starts = safe_start.len(),
            "more agents than safe start points, sampling the reset area"
        );
        true
    } else {
        use_reset_area
    };

    if use_reset_area {
        sample_from_area(area, num_agents, rng)
    } else {
        safe_start.choose_multiple(rng, num_agents).copied().collect()
    }
}

/// `[x_min, x_max, y_min, y_max]` square of half-width `range` around `safe_start`.
pub fn start_area(safe_start: [f32; 3], range: f32) -> [f32; 4] {
    [
        safe_start[0] - range,
        safe_start[0] + range,
        safe_start[1] - range,
        safe_start[1] + range,
    ]
}

/// Search for a camera position at `height` inside `area`.
///
/// With `distance` set, candidates lie on a circle of that radius around
/// `target`; otherwise they are drawn uniformly from the area. The heading is
/// drawn once when not given. Returns `None` when every attempt lands outside.
pub fn find_start_point<R: Rng + ?Sized>(
    target: [f32; 3],
    distance: Option<f32>,
    area: &ResetArea,
    height: f32,
    direction: Option<f32>,
    rng: &mut R,
) -> Option<[f32; 3]> {
    let direction = match direction {
        Some(d) => d.rem_euclid(std::f32::consts::TAU),
        None => rng.gen::<f32>() * std::f32::consts::TAU,
    };

    for _ in 0..START_POINT_TRIES {
        let (x, y) = match distance {
            Some(d) => (target[0] + d * direction.cos(), target[1] + d * direction.sin()),
            None => (randint(rng, area.x), randint(rng, area.y)),
        };
        if area.contains_xy(x, y) {
            return Some([x, y, height]);
        }
    }
    None
}
