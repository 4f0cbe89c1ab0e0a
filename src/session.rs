use crate::config::GameConfig;
use crate::episode::{Episode, Event};

/// What a flap key did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Press {
    Flapped,
    /// The round was over; a new one started.
    Restarted,
    /// Swallowed: a restart already happened this frame.
    Ignored,
}

/// A human playing rounds back to back, one bird per round.
pub struct Session {
    config: GameConfig,
    seed: u64,
    tries: usize,
    max_score: usize,
    restarted: bool,
    episode: Episode,
}

impl Session {
    pub fn new(config: GameConfig, seed: u64) -> Self {
        Self {
            config,
            seed,
            tries: 1,
            max_score: 0,
            restarted: false,
            episode: Episode::with_agents(config, seed, 1, 0.0),
        }
    }

    pub fn episode(&self) -> &Episode {
        &self.episode
    }

    /// Rounds started so far, the current one included.
    pub fn tries(&self) -> usize {
        self.tries
    }

    /// Best score of any finished or running round.
    pub fn max_score(&self) -> usize {
        self.max_score.max(self.score())
    }

    /// Score of the current round, alive or not.
    pub fn score(&self) -> usize {
        self.episode
            .agent(0)
            .map(|a| a.score())
            .or_else(|| self.episode.eliminated().first().map(|e| e.score))
            .unwrap_or(0)
    }

    pub fn is_over(&self) -> bool {
        self.episode.is_over()
    }

    /// Flap, or start the next round if this one is over. At most one
    /// restart per frame, so a burst of queued keys after a crash counts as
    /// one try.
    pub fn press(&mut self) -> Press {
        if self.restarted {
            return Press::Ignored;
        }
        if self.episode.is_over() {
            self.tries += 1;
            self.episode =
                Episode::with_agents(self.config, self.seed + self.tries as u64, 1, 0.0);
            self.restarted = true;
            return Press::Restarted;
        }
        self.episode.flap(0);
        Press::Flapped
    }

    /// Advance the current round. A finished round stays frozen.
    pub fn step(&mut self, dt: f64) -> Vec<Event> {
        self.restarted = false;
        if self.episode.is_over() {
            return Vec::new();
        }
        let events = self.episode.step(dt);
        for event in &events {
            if let Event::Died { score, .. } = *event {
                self.max_score = self.max_score.max(score);
                tracing::info!(
                    tries = self.tries,
                    score,
                    max_score = self.max_score,
                    "round over"
                );
            }
        }
        events
    }
}
