//! Mutable per-run state: counters, protagonist and the random source.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Episode bookkeeping owned by one environment.
#[derive(Clone, Debug)]
pub struct Session {
    episode: u32,
    steps: u32,
    protagonist: usize,
    rng: StdRng,
}

impl Session {
    /// Fresh session. Without a seed the RNG is seeded from entropy.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            episode: 0,
            steps: 0,
            protagonist: 0,
            rng,
        }
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Start the next episode and return its number (1-based).
    pub fn begin_episode(&mut self) -> u32 {
        self.episode += 1;
        self.steps = 0;
        self.episode
    }

    /// Count one step and return the total for this episode.
    pub fn tick(&mut self) -> u32 {
        self.steps += 1;
        self.steps
    }

    pub fn episode(&self) -> u32 {
        self.episode
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn started(&self) -> bool {
        self.episode > 0
    }

    pub fn protagonist(&self) -> usize {
        self.protagonist
    }

    pub fn set_protagonist(&mut self, index: usize) {
        self.protagonist = index;
    }

    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_counters() {
        let mut session = Session::new(Some(0));
        assert!(!session.started());
        assert_eq!(session.begin_episode(), 1);
        session.tick();
        assert_eq!(session.tick(), 2);
        assert_eq!(session.begin_episode(), 2);
        assert_eq!(session.steps(), 0);
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let mut a = Session::new(Some(7));
        let mut b = Session::new(Some(7));
        let x: u64 = a.rng_mut().gen();
        let y: u64 = b.rng_mut().gen();
        assert_eq!(x, y);
    }
}
