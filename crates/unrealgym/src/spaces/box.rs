//! Box (continuous) observation/action space

use super::Space;
use crate::{Result, UnrealError};
use ndarray::{ArrayD, IxDyn};
use rand::Rng;
use rand_distr::{Distribution, Uniform};

/// Box space for continuous values with elementwise bounds
#[derive(Clone, Debug, PartialEq)]
pub struct Box {
    /// Lower bound for each element
    pub low: ArrayD<f32>,
    /// Upper bound for each element
    pub high: ArrayD<f32>,
    /// Shape of the space
    shape: Vec<usize>,
}

impl Box {
    /// Create a new box space with given bounds
    pub fn new(low: ArrayD<f32>, high: ArrayD<f32>) -> Self {
        assert_eq!(low.shape(), high.shape(), "Low and high must have same shape");
        let shape = low.shape().to_vec();
        Self { low, high, shape }
    }

    /// Create a box space with uniform bounds
    pub fn uniform(shape: &[usize], low: f32, high: f32) -> Self {
        let low_arr = ArrayD::from_elem(IxDyn(shape), low);
        let high_arr = ArrayD::from_elem(IxDyn(shape), high);
        Self::new(low_arr, high_arr)
    }

    /// Build a 1-D box from configured bounds, rejecting malformed ones
    pub fn from_bounds(low: &[f32], high: &[f32]) -> Result<Self> {
        if low.len() != high.len() {
            return Err(UnrealError::Config(format!(
                "continuous bounds disagree in length: low has {}, high has {}",
                low.len(),
                high.len()
            )));
        }
        if low.is_empty() {
            return Err(UnrealError::Config("continuous bounds are empty".into()));
        }
        if let Some((l, h)) = low.iter().zip(high).find(|(l, h)| l > h) {
            return Err(UnrealError::Config(format!(
                "continuous bound low {l} exceeds high {h}"
            )));
        }
        let low_arr = ArrayD::from_shape_vec(IxDyn(&[low.len()]), low.to_vec())?;
        let high_arr = ArrayD::from_shape_vec(IxDyn(&[high.len()]), high.to_vec())?;
        Ok(Self::new(low_arr, high_arr))
    }

    /// Check a flat vector against a 1-D box
    pub fn contains_slice(&self, value: &[f32]) -> bool {
        value.len() == self.low.len()
            && value
                .iter()
                .zip(self.low.iter())
                .zip(self.high.iter())
                .all(|((&v, &l), &h)| v >= l && v <= h)
    }
}

impl Space for Box {
    type Sample = ArrayD<f32>;

    fn sample<R: Rng>(&self, rng: &mut R) -> Self::Sample {
        let mut result = ArrayD::zeros(IxDyn(&self.shape));
        for ((&l, &h), r) in self.low.iter().zip(self.high.iter()).zip(result.iter_mut()) {
            *r = Uniform::new_inclusive(l, h).sample(rng);
        }
        result
    }

    fn contains(&self, value: &Self::Sample) -> bool {
        if value.shape() != self.low.shape() {
            return false;
        }
        value
            .iter()
            .zip(self.low.iter())
            .zip(self.high.iter())
            .all(|((&v, &l), &h)| v >= l && v <= h)
    }

    fn shape(&self) -> &[usize] {
        &self.shape
    }
}
