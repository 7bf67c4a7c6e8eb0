// src/generator.rs
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::graph::DataKey;

const MIN_INTERVAL_SECS: f32 = 0.001;
const MAX_RICHNESS: u32 = 10;

/// Shape of the random signal.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorParams {
    /// Seconds between emitted values.
    pub interval: f32,
    pub min: f32,
    pub max: f32,
    /// Number of uniform draws averaged per value, 1..=10. Higher values pull
    /// the output toward the middle of the range.
    pub richness: u32,
    /// Random walk: each draw is a step added to the previous value.
    pub continuity: bool,
    pub step_min: f32,
    pub step_max: f32,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            interval: 1.0,
            min: -100.0,
            max: 100.0,
            richness: 1,
            continuity: false,
            step_min: -100.0,
            step_max: 100.0,
        }
    }
}

impl GeneratorParams {
    pub fn sanitized(self) -> Self {
        Self {
            interval: self.interval.max(MIN_INTERVAL_SECS),
            min: self.min.min(self.max),
            richness: self.richness.clamp(1, MAX_RICHNESS),
            step_min: self.step_min.min(self.step_max),
            ..self
        }
    }
}

/// A generator bound to the channel it feeds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub key: DataKey,
    #[serde(flatten)]
    pub params: GeneratorParams,
    /// Fixed seed for reproducible runs.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl GeneratorConfig {
    pub fn build(&self) -> RandomValueGenerator {
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        RandomValueGenerator::new(self.params, rng)
    }
}

/// Emits random test values on a fixed interval.
pub struct RandomValueGenerator {
    params: GeneratorParams,
    value: f32,
    next_due: Option<f32>,
    rng: StdRng,
}

impl RandomValueGenerator {
    pub fn new(params: GeneratorParams, rng: StdRng) -> Self {
        Self {
            params: params.sanitized(),
            value: 0.0,
            next_due: None,
            rng,
        }
    }

    pub fn params(&self) -> GeneratorParams {
        self.params
    }

    pub fn set_params(&mut self, params: GeneratorParams) {
        self.params = params.sanitized();
    }

    /// Produces the next value regardless of timing.
    pub fn next_value(&mut self) -> f32 {
        let p = self.params;
        let draw = if p.max - p.min > 0.0 {
            let (lo, hi) = if p.continuity {
                (p.step_min, p.step_max)
            } else {
                (p.min, p.max)
            };
            let sum: f32 = (0..p.richness).map(|_| uniform(&mut self.rng, lo, hi)).sum();
            sum / p.richness as f32
        } else {
            (p.max + p.min) / 2.0
        };
        self.value = if p.continuity {
            (self.value + draw).clamp(p.min, p.max)
        } else {
            draw
        };
        self.value
    }

    /// Returns a value when the interval has elapsed at `now_secs`, at most one
    /// per call. The first poll always emits.
    pub fn poll(&mut self, now_secs: f32) -> Option<f32> {
        match self.next_due {
            Some(due) if now_secs < due => None,
            Some(due) => {
                let next = due + self.params.interval;
                // Skip missed slots instead of bursting to catch up.
                self.next_due = Some(if next <= now_secs {
                    now_secs + self.params.interval
                } else {
                    next
                });
                Some(self.next_value())
            }
            None => {
                self.next_due = Some(now_secs + self.params.interval);
                Some(self.next_value())
            }
        }
    }
}

fn uniform(rng: &mut StdRng, lo: f32, hi: f32) -> f32 {
    if hi > lo {
        rng.gen_range(lo..hi)
    } else {
        lo
    }
}
