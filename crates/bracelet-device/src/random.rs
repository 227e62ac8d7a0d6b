//! 운영용 난수 소스.

use bracelet_core::ports::random::RandomSource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// `StdRng` 기반 `RandomSource` 구현
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    /// OS 엔트로피로 초기화
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// 고정 시드
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn range_u32(&mut self, low: u32, high: u32) -> u32 {
        if low >= high {
            return low;
        }
        self.rng.random_range(low..=high)
    }

    fn range_f64(&mut self, low: f64, high: f64) -> f64 {
        if low >= high {
            return low;
        }
        self.rng.random_range(low..=high)
    }

    fn chance(&mut self, probability: f64) -> bool {
        self.rng.random_bool(probability.clamp(0.0, 1.0))
    }
}
