use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Viewport and tube stream geometry. All lengths are world pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub width: f64,
    pub height: f64,
    /// A new tube is spawned once the newest one has scrolled left of this x.
    pub spawn_trigger_x: f64,
    pub tube_width: f64,
    /// Inclusive bound of the random vertical gap offset, `-max..=max`.
    pub gap_offset_max: i32,
    pub base_tube_velocity: f64,
    /// Largest time step a single frame may integrate.
    pub max_frame_dt: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 576.0,
            height: 512.0,
            spawn_trigger_x: 400.0,
            tube_width: 52.0,
            gap_offset_max: 180,
            base_tube_velocity: 15.0,
            max_frame_dt: 1.0,
        }
    }
}

impl WorldConfig {
    /// Height of one tube segment. Half the viewport, so that the opening
    /// between the two segments is exactly twice the gap baseline.
    pub fn tube_height(&self) -> f64 {
        self.height / 2.0
    }

    /// Horizontal distance between consecutive tubes.
    pub fn tube_spacing(&self) -> f64 {
        self.width - self.spawn_trigger_x
    }
}

/// Flap fatigue: rapid repeated flaps weaken the jump.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FatigueConfig {
    /// Seconds. Flaps closer together than this are tiring.
    pub flap_interval: f64,
    /// Added to the (negative) jump strength per tiring flap.
    pub decrement: f64,
    /// Weakest jump a tired bird can still do.
    pub cap: f64,
}

impl Default for FatigueConfig {
    fn default() -> Self {
        Self {
            flap_interval: 0.25,
            decrement: 5.0,
            cap: -15.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub width: f64,
    pub height: f64,
    pub initial_velocity: f64,
    pub jump_strength: f64,
    pub gravity: f64,
    pub fatigue: Option<FatigueConfig>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self::classic()
    }
}

impl PlayerConfig {
    /// Flaps always apply the full jump.
    pub fn classic() -> Self {
        Self {
            width: 34.0,
            height: 24.0,
            initial_velocity: 5.0,
            jump_strength: -40.0,
            gravity: 15.0,
            fatigue: None,
        }
    }

    /// The "tired bird": spamming flap weakens the jump.
    pub fn tired() -> Self {
        Self {
            fatigue: Some(FatigueConfig::default()),
            ..Self::classic()
        }
    }
}

/// Limits and steps of the score-driven difficulty ramp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyConfig {
    pub enabled: bool,
    /// Escalate when `score % period == remainder`.
    pub period: u32,
    pub remainder: u32,
    pub tube_velocity_ceiling: f64,
    pub tube_velocity_step: f64,
    pub gap_step: f64,
    pub gap_floor: f64,
    pub jump_step: f64,
    pub jump_ceiling: f64,
    pub gravity_floor: f64,
    pub gravity_decay: f64,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            period: 4,
            remainder: 1,
            tube_velocity_ceiling: 20.0,
            tube_velocity_step: 5.0,
            gap_step: 5.0,
            gap_floor: 110.0,
            jump_step: 2.0,
            jump_ceiling: -30.0,
            gravity_floor: 20.0,
            gravity_decay: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessConfig {
    pub survival: f64,
    pub pass: f64,
    pub death: f64,
}

impl Default for FitnessConfig {
    fn default() -> Self {
        Self {
            survival: 0.1,
            pass: 1.0,
            death: -3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub world: WorldConfig,
    pub player: PlayerConfig,
    pub difficulty: DifficultyConfig,
    pub fitness: FitnessConfig,
    pub initial_gap_baseline: f64,
    pub initial_horizontal_velocity: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::human()
    }
}

impl GameConfig {
    pub fn human() -> Self {
        Self {
            world: WorldConfig::default(),
            player: PlayerConfig::classic(),
            difficulty: DifficultyConfig {
                enabled: false,
                ..DifficultyConfig::default()
            },
            fitness: FitnessConfig::default(),
            initial_gap_baseline: 200.0,
            initial_horizontal_velocity: 0.0,
        }
    }

    pub fn population() -> Self {
        Self {
            difficulty: DifficultyConfig::default(),
            initial_gap_baseline: 160.0,
            ..Self::human()
        }
    }

    /// Overlay a JSON file on top of `self`. Fields the file leaves out keep
    /// their value in `self`.
    pub fn load(self, path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let overlay: Value = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        let mut merged = serde_json::to_value(self)?;
        merge(&mut merged, overlay);
        let config: Self = serde_json::from_value(merged)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Reject settings the simulation cannot run with.
    pub fn validate(&self) -> Result<()> {
        let w = &self.world;
        ensure!(w.width > 0.0 && w.height > 0.0, "world size must be positive");
        ensure!(
            w.tube_spacing() > 0.0,
            "spawn_trigger_x ({}) must be left of the world width ({})",
            w.spawn_trigger_x,
            w.width
        );
        ensure!(w.tube_width > 0.0, "tube_width must be positive");
        ensure!(w.gap_offset_max >= 0, "gap_offset_max must not be negative");
        ensure!(w.max_frame_dt > 0.0, "max_frame_dt must be positive");
        let p = &self.player;
        ensure!(p.width > 0.0 && p.height > 0.0, "player size must be positive");
        ensure!(p.height < w.height, "player must fit in the world");
        ensure!(self.difficulty.period > 0, "difficulty period must be positive");
        if let Some(f) = p.fatigue {
            ensure!(f.flap_interval >= 0.0, "fatigue flap_interval must not be negative");
        }
        Ok(())
    }
}

/// Recursive object merge; anything else in `overlay` replaces `base`.
fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                merge(base.entry(key).or_insert(Value::Null), value);
            }
        }
        (base, overlay) => *base = overlay,
    }
}
