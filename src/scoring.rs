use crate::player::Player;
use crate::stream::TubeStream;

/// Outcome of one frame's collision and passing checks for one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub alive: bool,
    /// Ordinal of the next tube to clear. Equal to the player's score.
    pub target: usize,
    /// The previous target was cleared this frame.
    pub passed: bool,
}

/// Whether the player overlaps the tubes just behind the stream's lead.
///
/// Checks the tube before the lead, and once the lead is past ordinal 2 also
/// the one before that: a tube can still overlap the bird after a newer one
/// has spawned. With only the lead spawned there is nothing to hit.
pub fn collides(player: &Player, stream: &TubeStream) -> bool {
    let Some(lead) = stream.lead_index() else {
        return false;
    };
    let bbox = player.bounding_box();
    let hits = |ordinal: usize| stream.tube(ordinal).is_some_and(|t| t.collides(&bbox));

    let mut hit = lead >= 1 && hits(lead - 1);
    if lead > 2 {
        hit |= hits(lead - 2);
    }
    hit
}

/// Collision and passing checks for a player whose next tube is `target`.
///
/// Passing is counted at most once per call, so a tube straddled across
/// several frames still scores exactly once.
///
/// # Panics
/// If `target` has not been spawned.
pub fn evaluate(player: &Player, stream: &TubeStream, target: usize) -> Evaluation {
    if collides(player, stream) {
        return Evaluation {
            alive: false,
            target,
            passed: false,
        };
    }

    let passed = match stream.tube(target) {
        Some(tube) => player.x() > tube.right(),
        None => true,
    };
    Evaluation {
        alive: true,
        target: if passed { target + 1 } else { target },
        passed,
    }
}
