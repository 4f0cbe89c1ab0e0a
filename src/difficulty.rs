use crate::config::DifficultyConfig;
use crate::player::Player;
use crate::stream::TubeStream;

/// Episode-wide parameters applied to newly spawned tubes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Difficulty {
    /// Half the vertical opening of a new tube.
    pub gap_baseline: f64,
    /// Added to the base tube velocity of a new tube.
    pub horizontal_velocity: f64,
}

impl Difficulty {
    pub fn new(gap_baseline: f64, horizontal_velocity: f64) -> Self {
        Self {
            gap_baseline,
            horizontal_velocity,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DifficultyController {
    config: DifficultyConfig,
    base_tube_velocity: f64,
}

impl DifficultyController {
    pub fn new(config: DifficultyConfig, base_tube_velocity: f64) -> Self {
        Self {
            config,
            base_tube_velocity,
        }
    }

    pub fn triggers_at(&self, score: usize) -> bool {
        self.config.enabled
            && self.config.period > 0
            && score % self.config.period as usize == self.config.remainder as usize
    }

    /// Ramp up difficulty if `score` is a trigger score. Returns whether it did.
    pub fn maybe_escalate(
        &self,
        score: usize,
        difficulty: &mut Difficulty,
        player: &mut Player,
        stream: &mut TubeStream,
    ) -> bool {
        if !self.triggers_at(score) {
            return false;
        }
        let c = &self.config;

        for tube in stream.iter_mut() {
            if tube.velocity_x > c.tube_velocity_ceiling {
                tube.velocity_x += c.tube_velocity_step;
            }
        }
        if let Some(lead) = stream.lead() {
            difficulty.horizontal_velocity = lead.velocity_x - self.base_tube_velocity;
        }
        difficulty.gap_baseline = (difficulty.gap_baseline - c.gap_step).max(c.gap_floor);

        player.base_jump_strength = (player.base_jump_strength + c.jump_step).min(c.jump_ceiling);
        player.jump_strength = (player.jump_strength + c.jump_step).min(c.jump_ceiling);

        // Pulls gravity toward the floor from either side. A grounded bird
        // has gravity 0, so it snaps to the floor value here even though it
        // is resting; its next bounce restores nominal gravity anyway.
        if player.gravity < c.gravity_floor {
            player.gravity = c.gravity_floor;
        } else {
            player.gravity -= c.gravity_decay;
        }

        tracing::debug!(
            score,
            gravity = player.gravity,
            tube_velocity = stream.lead().map(|t| t.velocity_x),
            gap_baseline = difficulty.gap_baseline,
            jump_strength = player.jump_strength,
            "difficulty escalated"
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GameConfig, PlayerConfig, WorldConfig};

    struct Fixture {
        controller: DifficultyController,
        difficulty: Difficulty,
        player: Player,
        stream: TubeStream,
    }

    fn fixture() -> Fixture {
        let config = GameConfig::population();
        let difficulty = Difficulty::new(config.initial_gap_baseline, 0.0);
        Fixture {
            controller: DifficultyController::new(
                config.difficulty,
                config.world.base_tube_velocity,
            ),
            difficulty,
            player: Player::spawn(&config.player, &config.world, 0.0),
            stream: TubeStream::start(config.world, 1, &difficulty),
        }
    }

    impl Fixture {
        fn escalate(&mut self, score: usize) -> bool {
            self.controller.maybe_escalate(
                score,
                &mut self.difficulty,
                &mut self.player,
                &mut self.stream,
            )
        }
    }

    #[test]
    fn triggers_on_one_mod_four_only() {
        let f = fixture();
        let triggered: Vec<usize> = (0..20).filter(|&s| f.controller.triggers_at(s)).collect();
        assert_eq!(triggered, vec![1, 5, 9, 13, 17]);
    }

    #[test]
    fn disabled_controller_never_triggers() {
        let controller = DifficultyController::new(GameConfig::human().difficulty, 15.0);
        assert!((0..100).all(|s| !controller.triggers_at(s)));
    }

    #[test]
    fn non_trigger_score_changes_nothing() {
        let mut f = fixture();
        assert!(!f.escalate(2));
        assert_eq!(f.difficulty, Difficulty::new(160.0, 0.0));
        assert_eq!(f.player.gravity, 15.0);
        assert_eq!(f.player.jump_strength, -40.0);
    }

    #[test]
    fn first_escalation() {
        let mut f = fixture();
        assert!(f.escalate(1));
        assert_eq!(f.difficulty.gap_baseline, 155.0);
        // Tubes at base speed are below the ratchet threshold.
        assert_eq!(f.stream.lead().unwrap().velocity_x, 15.0);
        assert_eq!(f.difficulty.horizontal_velocity, 0.0);
        assert_eq!(f.player.jump_strength, -38.0);
        assert_eq!(f.player.base_jump_strength, -38.0);
        // Below the floor: snaps up.
        assert_eq!(f.player.gravity, 20.0);
    }

    #[test]
    fn repeated_escalation_respects_limits() {
        let mut f = fixture();
        let mut gravities = Vec::new();
        for score in (1..200).step_by(4) {
            assert!(f.escalate(score));
            assert!(f.difficulty.gap_baseline >= 110.0);
            assert!(f.player.jump_strength <= -30.0);
            gravities.push(f.player.gravity);
        }
        assert_eq!(f.difficulty.gap_baseline, 110.0);
        assert_eq!(f.player.jump_strength, -30.0);
        // 20 -> 19.5 -> snap back to 20 -> ...
        assert_eq!(&gravities[..4], &[20.0, 19.5, 20.0, 19.5]);
    }

    #[test]
    fn fast_tubes_ratchet_and_set_horizontal_velocity() {
        let mut f = fixture();
        f.difficulty.horizontal_velocity = 10.0;
        f.stream.spawn(160.0, 10.0);
        assert!(f.escalate(5));

        let velocities: Vec<f64> = f.stream.iter().map(|(_, t)| t.velocity_x).collect();
        assert_eq!(velocities, vec![15.0, 30.0]);
        assert_eq!(f.difficulty.horizontal_velocity, 15.0);
    }

    #[test]
    fn rested_flap_uses_the_escalated_base() {
        let world = WorldConfig::default();
        let mut f = fixture();
        f.player = Player::spawn(&PlayerConfig::tired(), &world, 0.0);
        f.escalate(1);
        f.player.flap(100.0);
        assert_eq!(f.player.velocity_y, -38.0);
    }

    #[test]
    fn escalating_a_grounded_bird_sets_gravity_until_it_bounces() {
        let mut f = fixture();
        while !f.player.is_grounded() {
            f.player.update(0.5);
        }
        assert_eq!(f.player.gravity, 0.0);

        assert!(f.escalate(1));
        assert!(f.player.is_grounded());
        assert_eq!(f.player.gravity, 20.0);

        f.player.update(0.1);
        assert!(!f.player.is_grounded());
        assert_eq!(f.player.gravity, 15.0);
        assert_eq!(f.player.velocity_y, -38.0 + 15.0 * 0.1);
    }
}
