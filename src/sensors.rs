use crate::geometry::{Rect, distance};
use crate::player::Player;
use crate::tube::Tube;

pub const INPUTS: usize = 13;

/// Distances are stretched by this before being fed to a brain.
const DISTANCE_GAIN: f64 = 1.3;

/// What a bird can sense about itself and the tube it has to clear next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub x: f64,
    pub y: f64,
    pub jump_strength: f64,
    pub gravity: f64,
    pub velocity_y: f64,
    /// Corner-to-gap-edge distances, already scaled.
    pub distances: [f64; 8],
    /// Bottom of the upper segment.
    pub gap_top: f64,
    /// Top of the lower segment.
    pub gap_bottom: f64,
    pub player_bottom: f64,
}

/// Segments from the bird's corners to the gap's corners, as
/// `(bird point, tube point)` pairs. Even entries end on the lower
/// segment's top edge, odd entries on the upper segment's bottom edge.
pub fn sight_lines(bird: &Rect, lower: &Rect, upper: &Rect) -> [((f64, f64), (f64, f64)); 8] {
    let (bl, br, bt, bb) = (bird.left(), bird.right(), bird.top(), bird.bottom());
    let lower_top = lower.top();
    let upper_bottom = upper.bottom();
    [
        ((br, bb), (lower.left(), lower_top)),
        ((br, bt), (upper.left(), upper_bottom)),
        ((bl, bb), (lower.right(), lower_top)),
        ((bl, bt), (upper.right(), upper_bottom)),
        ((bl, bb), (lower.left(), lower_top)),
        ((bl, bt), (upper.left(), upper_bottom)),
        ((br, bb), (lower.right(), lower_top)),
        ((br, bt), (upper.right(), upper_bottom)),
    ]
}

impl Observation {
    pub fn capture(player: &Player, tube: &Tube) -> Self {
        let bird = player.bounding_box();
        let lower = tube.lower_rect();
        let upper = tube.upper_rect();
        let distances = sight_lines(&bird, &lower, &upper).map(|(a, b)| distance(a, b) * DISTANCE_GAIN);
        Self {
            x: player.x(),
            y: player.y(),
            jump_strength: player.jump_strength,
            gravity: player.gravity,
            velocity_y: player.velocity_y,
            distances,
            gap_top: upper.bottom(),
            gap_bottom: lower.top(),
            player_bottom: bird.bottom(),
        }
    }

    /// Flat input vector: own state then the eight distances.
    pub fn inputs(&self) -> [f64; INPUTS] {
        let mut data = [0.0; INPUTS];
        data[0] = self.x;
        data[1] = self.y;
        data[2] = self.jump_strength;
        data[3] = self.gravity;
        data[4] = self.velocity_y;
        data[5..].copy_from_slice(&self.distances);
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PlayerConfig, WorldConfig};

    #[test]
    fn captures_state_and_gap_edges() {
        let world = WorldConfig::default();
        let player = Player::spawn(&PlayerConfig::classic(), &world, 0.0);
        let tube = Tube::new(&world, 400.0, 200.0, 0.0, 0);
        let obs = Observation::capture(&player, &tube);

        assert_eq!(obs.gap_top, 56.0);
        assert_eq!(obs.gap_bottom, 456.0);
        assert_eq!(obs.player_bottom, 152.0);

        // Bird's right-bottom (305, 152) to the lower segment's left-top (400, 456).
        let expected = (95.0f64.powi(2) + 304.0f64.powi(2)).sqrt() * 1.3;
        assert!((obs.distances[0] - expected).abs() < 1e-9);

        let inputs = obs.inputs();
        assert_eq!(&inputs[..5], &[271.0, 128.0, -40.0, 15.0, 5.0]);
        assert_eq!(&inputs[5..], &obs.distances);
    }

    #[test]
    fn sight_lines_end_on_gap_edges() {
        let world = WorldConfig::default();
        let player = Player::spawn(&PlayerConfig::classic(), &world, 0.0);
        let tube = Tube::new(&world, 400.0, 160.0, 0.0, 40);
        let lines = sight_lines(
            &player.bounding_box(),
            &tube.lower_rect(),
            &tube.upper_rect(),
        );
        for (i, (_, end)) in lines.iter().enumerate() {
            let edge = if i % 2 == 0 {
                tube.lower_rect().top()
            } else {
                tube.upper_rect().bottom()
            };
            assert_eq!(end.1, edge);
        }
    }
}
