//! Market health gauge: a 0-100 dial that random-walks a few points per step.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const MAX_STEP: i32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GaugeLabel {
    Strong,
    Neutral,
    Weak,
}

impl GaugeLabel {
    pub fn from_score(score: u8) -> Self {
        match score {
            70.. => Self::Strong,
            40..=69 => Self::Neutral,
            _ => Self::Weak,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GaugeReading {
    pub score: u8,
    pub label: GaugeLabel,
    /// Last change applied, after clamping
    pub trend: i8,
}

pub struct MarketHealthGauge {
    score: u8,
    trend: i8,
    rng: StdRng,
}

impl Default for MarketHealthGauge {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketHealthGauge {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(mut rng: StdRng) -> Self {
        let start = rng.gen_range(55_i32..=75);
        Self {
            score: clamp_score(start),
            trend: 0,
            rng,
        }
    }

    pub fn reading(&self) -> GaugeReading {
        GaugeReading {
            score: self.score,
            label: GaugeLabel::from_score(self.score),
            trend: self.trend,
        }
    }

    pub fn step(&mut self) -> GaugeReading {
        let delta = self.rng.gen_range(-MAX_STEP..=MAX_STEP);
        let prev = i32::from(self.score);
        let next = clamp_score(prev + delta);
        self.trend = i8::try_from(i32::from(next) - prev).unwrap_or(0);
        self.score = next;
        self.reading()
    }
}

fn clamp_score(value: i32) -> u8 {
    u8::try_from(value.clamp(0, 100)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_range() {
        for seed in 0..50 {
            let gauge = MarketHealthGauge::with_seed(seed);
            let r = gauge.reading();
            assert!((55..=75).contains(&r.score));
            assert_eq!(r.trend, 0);
        }
    }

    #[test]
    fn test_steps_are_bounded() {
        let mut gauge = MarketHealthGauge::with_seed(9);
        let mut prev = gauge.reading().score;
        for _ in 0..500 {
            let r = gauge.step();
            assert!(r.score <= 100);
            assert!(r.trend.abs() <= 3);
            assert_eq!(i32::from(r.score) - i32::from(prev), i32::from(r.trend));
            assert_eq!(r.label, GaugeLabel::from_score(r.score));
            prev = r.score;
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(GaugeLabel::from_score(70), GaugeLabel::Strong);
        assert_eq!(GaugeLabel::from_score(69), GaugeLabel::Neutral);
        assert_eq!(GaugeLabel::from_score(40), GaugeLabel::Neutral);
        assert_eq!(GaugeLabel::from_score(39), GaugeLabel::Weak);
    }
}
