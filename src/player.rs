use crate::config::{FatigueConfig, PlayerConfig, WorldConfig};
use crate::geometry::Rect;

/// The bird. Only `y` moves; `x` is fixed at spawn.
#[derive(Debug, Clone)]
pub struct Player {
    x: f64,
    y: f64,
    pub velocity_y: f64,
    /// Impulse applied on flap. Negative is upward.
    pub jump_strength: f64,
    /// Jump strength a rested bird flaps with. Fatigue recovers to this.
    pub base_jump_strength: f64,
    pub gravity: f64,
    nominal_gravity: f64,
    width: f64,
    height: f64,
    floor_y: f64,
    grounded: bool,
    fatigue: Option<FatigueConfig>,
    last_flap: Option<f64>,
}

impl Player {
    /// Spawn horizontally centred at a quarter of the viewport height,
    /// shifted down by `y_offset`.
    pub fn spawn(config: &PlayerConfig, world: &WorldConfig, y_offset: f64) -> Self {
        let x = ((world.width - config.width) / 2.0).floor();
        let floor_y = (world.height - config.height).max(0.0);
        let y = ((world.height / 4.0).floor() + y_offset).clamp(0.0, floor_y);
        Self {
            x,
            y,
            velocity_y: config.initial_velocity,
            jump_strength: config.jump_strength,
            base_jump_strength: config.jump_strength,
            gravity: config.gravity,
            nominal_gravity: config.gravity,
            width: config.width,
            height: config.height,
            floor_y,
            grounded: false,
            fatigue: config.fatigue,
            last_flap: None,
        }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn floor_y(&self) -> f64 {
        self.floor_y
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub fn bounding_box(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Flap at time `now` (seconds on the caller's monotonic clock).
    pub fn flap(&mut self, now: f64) {
        if let Some(fatigue) = self.fatigue {
            let tired = self
                .last_flap
                .is_some_and(|last| now - last < fatigue.flap_interval);
            self.jump_strength = if tired {
                (self.jump_strength + fatigue.decrement).min(fatigue.cap)
            } else {
                self.base_jump_strength
            };
            self.last_flap = Some(now);
        }
        self.velocity_y = self.jump_strength;
    }

    /// Advance the bird by `dt`. Non-positive or NaN steps are ignored.
    pub fn update(&mut self, dt: f64) {
        if !(dt > 0.0) {
            return;
        }

        if self.grounded {
            // Landing bounces the bird back up on the next frame.
            self.grounded = false;
            self.velocity_y = self.jump_strength;
            self.gravity = self.nominal_gravity;
            self.integrate(dt);
        } else if self.y < self.floor_y {
            self.integrate(dt);
        }

        if self.y >= self.floor_y {
            self.y = self.floor_y;
            self.velocity_y = 0.0;
            self.gravity = 0.0;
            self.grounded = true;
        }

        if self.y < 0.0 {
            self.y = 0.0;
            self.velocity_y = 0.0;
        }
    }

    // Position before velocity.
    fn integrate(&mut self, dt: f64) {
        self.y += self.velocity_y * dt;
        self.velocity_y += self.gravity * dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn bird() -> Player {
        Player::spawn(&PlayerConfig::classic(), &WorldConfig::default(), 0.0)
    }

    #[test]
    fn spawns_centred_at_quarter_height() {
        let p = bird();
        assert_eq!(p.x(), 271.0);
        assert_eq!(p.y(), 128.0);
        assert_eq!(p.floor_y(), 488.0);
        assert_eq!(p.velocity_y, 5.0);
        assert!(!p.is_grounded());
    }

    #[test]
    fn one_frame_integrates_position_before_velocity() {
        let mut p = bird();
        p.update(0.16);
        assert!((p.y() - 128.8).abs() < EPS, "y = {}", p.y());
        assert!((p.velocity_y - 7.4).abs() < EPS, "v = {}", p.velocity_y);
    }

    #[test]
    fn zero_dt_leaves_player_unchanged() {
        let mut p = bird();
        p.update(0.0);
        assert_eq!(p.y(), 128.0);
        assert_eq!(p.velocity_y, 5.0);

        p.update(-1.0);
        p.update(f64::NAN);
        assert_eq!(p.y(), 128.0);
        assert_eq!(p.velocity_y, 5.0);
    }

    #[test]
    fn zero_dt_does_not_consume_grounded_bounce() {
        let mut p = bird();
        p.velocity_y = 10_000.0;
        p.update(1.0);
        assert!(p.is_grounded());
        p.update(0.0);
        assert!(p.is_grounded());
        assert_eq!(p.y(), p.floor_y());
    }

    #[test]
    fn motion_follows_sign_of_velocity() {
        let mut falling = bird();
        falling.velocity_y = 3.0;
        let y0 = falling.y();
        falling.update(0.1);
        assert!(falling.y() > y0);

        let mut rising = bird();
        rising.velocity_y = -3.0;
        // Upward motion uses the velocity from before gravity is added.
        rising.gravity = 1000.0;
        let y0 = rising.y();
        rising.update(0.1);
        assert!(rising.y() < y0);
    }

    #[test]
    fn landing_grounds_then_bounces() {
        let mut p = bird();
        p.velocity_y = 500.0;
        p.update(1.0);
        assert_eq!(p.y(), p.floor_y());
        assert!(p.is_grounded());
        assert_eq!(p.velocity_y, 0.0);
        assert_eq!(p.gravity, 0.0);

        p.update(0.16);
        assert!(!p.is_grounded());
        assert!(p.y() < p.floor_y());
        assert!((p.y() - (488.0 - 40.0 * 0.16)).abs() < EPS);
        assert!((p.velocity_y - (-40.0 + 15.0 * 0.16)).abs() < EPS);
        assert_eq!(p.gravity, 15.0);
    }

    #[test]
    fn ceiling_clamps_and_stops() {
        let mut p = bird();
        p.velocity_y = -10_000.0;
        p.update(1.0);
        assert_eq!(p.y(), 0.0);
        assert_eq!(p.velocity_y, 0.0);
    }

    #[test]
    fn y_stays_in_bounds_across_many_frames() {
        let mut p = bird();
        for frame in 0..2_000 {
            if frame % 7 == 0 {
                p.flap(frame as f64 * 0.3);
            }
            p.update(0.3 + (frame % 5) as f64 * 0.4);
            assert!(p.y() >= 0.0 && p.y() <= p.floor_y(), "y = {}", p.y());
            if p.is_grounded() {
                assert_eq!(p.velocity_y, 0.0);
                assert_eq!(p.gravity, 0.0);
            }
        }
    }

    #[test]
    fn classic_flap_always_uses_full_jump() {
        let mut p = bird();
        p.flap(0.0);
        p.flap(0.01);
        p.flap(0.02);
        assert_eq!(p.velocity_y, -40.0);
        assert_eq!(p.jump_strength, -40.0);
    }

    #[test]
    fn rapid_flaps_tire_the_bird() {
        let mut p = Player::spawn(&PlayerConfig::tired(), &WorldConfig::default(), 0.0);
        p.flap(0.0);
        assert_eq!(p.velocity_y, -40.0);
        p.flap(0.1);
        assert_eq!(p.velocity_y, -35.0);
        p.flap(0.2);
        assert_eq!(p.velocity_y, -30.0);
        for i in 3..20 {
            p.flap(i as f64 * 0.1);
        }
        assert_eq!(p.jump_strength, -15.0);

        // A rested flap restores the full jump.
        p.flap(10.0);
        assert_eq!(p.velocity_y, -40.0);
    }

    #[test]
    fn spawn_offset_is_clamped_to_bounds() {
        let world = WorldConfig::default();
        let config = PlayerConfig::classic();
        assert_eq!(Player::spawn(&config, &world, -1_000.0).y(), 0.0);
        assert_eq!(Player::spawn(&config, &world, 1_000.0).y(), 488.0);
        assert_eq!(Player::spawn(&config, &world, 20.0).y(), 148.0);
    }
}
