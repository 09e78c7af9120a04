//! Image observation space with per-channel bounds

use ndarray::ArrayD;

/// Element type the engine delivers for a channel group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dtype {
    U8,
    F16,
}

/// `(height, width, channels)` frame with inclusive bounds per channel.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageSpace {
    pub height: usize,
    pub width: usize,
    pub dtype: Dtype,
    /// One entry per channel
    pub low: Vec<f32>,
    /// One entry per channel
    pub high: Vec<f32>,
    shape: [usize; 3],
}

impl ImageSpace {
    pub fn new(height: usize, width: usize, dtype: Dtype, low: Vec<f32>, high: Vec<f32>) -> Self {
        assert_eq!(low.len(), high.len(), "Channel bounds must have same length");
        let shape = [height, width, low.len()];
        Self {
            height,
            width,
            dtype,
            low,
            high,
            shape,
        }
    }

    /// Every channel shares the same bounds
    pub fn uniform(height: usize, width: usize, channels: usize, dtype: Dtype, low: f32, high: f32) -> Self {
        Self::new(height, width, dtype, vec![low; channels], vec![high; channels])
    }

    pub fn channels(&self) -> usize {
        self.low.len()
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn contains(&self, value: &ArrayD<f32>) -> bool {
        if value.shape() != &self.shape[..] {
            return false;
        }
        let channels = self.channels();
        value.iter().enumerate().all(|(k, &v)| {
            let c = k % channels;
            v >= self.low[c] && v <= self.high[c]
        })
    }
}
