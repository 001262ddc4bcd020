//! Simulated typing delays

use std::time::Duration;

use rand::Rng;

use crate::config::KeyConfig;

/// Delay range between simulated key presses
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyTiming {
    pub min_delay: f64,
    pub max_delay: f64,
    pub speed: f64,
}

impl Default for KeyTiming {
    fn default() -> Self {
        Self::from(&KeyConfig::default())
    }
}

impl From<&KeyConfig> for KeyTiming {
    fn from(config: &KeyConfig) -> Self {
        Self {
            min_delay: config.min_delay,
            max_delay: config.max_delay,
            speed: config.speed,
        }
    }
}

impl KeyTiming {
    /// How long to wait before the next key
    ///
    /// Uniform in `[min, max]` when both bounds are positive, otherwise just
    /// `min`. The result is scaled by `speed`; a non-positive delay means no
    /// wait at all.
    pub fn delay<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        speed: Option<f64>,
        min: Option<f64>,
        max: Option<f64>,
    ) -> Option<Duration> {
        let min = min.unwrap_or(self.min_delay);
        let max = max.unwrap_or(self.max_delay);
        let base = if min > 0.0 && max > 0.0 {
            let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
            rng.gen_range(lo..=hi)
        } else {
            min
        };
        if !(base > 0.0) {
            return None;
        }
        let seconds = base * speed.unwrap_or(self.speed);
        if !(seconds > 0.0) {
            return None;
        }
        Duration::try_from_secs_f64(seconds).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_delay_within_range() {
        let timing = KeyTiming::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let d = timing.delay(&mut rng, None, None, None).unwrap().as_secs_f64();
            assert!((0.02..=0.175).contains(&d), "{} out of range", d);
        }
    }

    #[test]
    fn test_speed_scales_delay() {
        let timing = KeyTiming {
            min_delay: 0.1,
            max_delay: 0.0,
            speed: 1.0,
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(timing.delay(&mut rng, None, None, None), Some(Duration::from_millis(100)));
        assert_eq!(timing.delay(&mut rng, Some(3.0), None, None), Some(Duration::from_millis(300)));
    }

    #[test]
    fn test_non_positive_means_no_wait() {
        let timing = KeyTiming::default();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(timing.delay(&mut rng, None, Some(0.0), None), None);
        assert_eq!(timing.delay(&mut rng, None, Some(-1.0), Some(0.5)), None);
        assert_eq!(timing.delay(&mut rng, Some(0.0), None, None), None);
    }

    #[test]
    fn test_reversed_bounds() {
        let timing = KeyTiming::default();
        let mut rng = StdRng::seed_from_u64(3);
        let d = timing.delay(&mut rng, None, Some(0.5), Some(0.25)).unwrap().as_secs_f64();
        assert!((0.25..=0.5).contains(&d));
    }
}
