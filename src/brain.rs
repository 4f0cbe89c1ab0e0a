use rand::Rng;

use crate::sensors::{INPUTS, Observation};

/// Activations above this make the bird flap.
pub const FLAP_THRESHOLD: f64 = 0.995;

/// A decision source for one bird. Evolved networks plug in here.
pub trait Brain {
    fn name(&self) -> &str;

    /// Decision signal for this frame.
    fn activate(&mut self, obs: &Observation) -> f64;

    fn wants_flap(&mut self, obs: &Observation) -> bool {
        self.activate(obs) > FLAP_THRESHOLD
    }
}

/// Never flaps. Bounces off the floor and into the next tube.
pub struct IdleBrain;

impl Brain for IdleBrain {
    fn name(&self) -> &str {
        "idle"
    }

    fn activate(&mut self, _obs: &Observation) -> f64 {
        0.0
    }
}

/// Flaps when falling with its feet within `margin` of the lower segment.
pub struct GapFollower {
    pub margin: f64,
}

impl Default for GapFollower {
    fn default() -> Self {
        Self { margin: 40.0 }
    }
}

impl Brain for GapFollower {
    fn name(&self) -> &str {
        "gap_follower"
    }

    fn activate(&mut self, obs: &Observation) -> f64 {
        let low = obs.player_bottom > obs.gap_bottom - self.margin;
        if low && obs.velocity_y >= 0.0 { 1.0 } else { 0.0 }
    }
}

/// Single sigmoid unit over the raw inputs. Stands in for an evolved
/// network when no learner is attached.
#[derive(Debug, Clone)]
pub struct LinearBrain {
    pub weights: [f64; INPUTS],
    pub bias: f64,
}

impl LinearBrain {
    pub fn new(weights: [f64; INPUTS], bias: f64) -> Self {
        Self { weights, bias }
    }

    pub fn random(rng: &mut impl Rng) -> Self {
        let mut weights = [0.0; INPUTS];
        for w in &mut weights {
            *w = rng.gen_range(-1.0..1.0);
        }
        Self {
            weights,
            bias: rng.gen_range(-1.0..1.0),
        }
    }
}

impl Brain for LinearBrain {
    fn name(&self) -> &str {
        "linear"
    }

    fn activate(&mut self, obs: &Observation) -> f64 {
        let sum: f64 = self
            .weights
            .iter()
            .zip(obs.inputs())
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.bias;
        1.0 / (1.0 + (-sum).exp())
    }
}
