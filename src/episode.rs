use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::config::{FitnessConfig, GameConfig};
use crate::difficulty::{Difficulty, DifficultyController};
use crate::player::Player;
use crate::scoring;
use crate::sensors::Observation;
use crate::stream::TubeStream;
use crate::tube::Tube;

/// A bird taking part in an episode.
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: usize,
    pub player: Player,
    /// Ordinal of the next tube to clear; also the score.
    pub target: usize,
    pub frames_alive: u64,
    alive: bool,
}

impl Agent {
    pub fn score(&self) -> usize {
        self.target
    }
}

/// Final record of an eliminated agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elimination {
    pub id: usize,
    pub score: usize,
    pub frames_alive: u64,
    pub frame: u64,
}

/// Things that happened during one frame, in the order they happened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    Spawned { ordinal: usize },
    Survived { agent: usize },
    Passed { agent: usize, score: usize },
    Died { agent: usize, score: usize },
    Escalated { agent: usize, score: usize },
}

impl Event {
    /// Fitness change this event is worth to one agent, if any.
    pub fn fitness_delta(&self, rules: &FitnessConfig) -> Option<(usize, f64)> {
        match *self {
            Event::Survived { agent } => Some((agent, rules.survival)),
            Event::Passed { agent, .. } => Some((agent, rules.pass)),
            Event::Died { agent, .. } => Some((agent, rules.death)),
            Event::Spawned { .. } | Event::Escalated { .. } => None,
        }
    }
}

/// One round of play: a tube stream, its difficulty and the birds still
/// flying. Shared by the human loop (one bird) and the population loop.
#[derive(Debug, Clone)]
pub struct Episode {
    config: GameConfig,
    difficulty: Difficulty,
    controller: DifficultyController,
    stream: TubeStream,
    agents: Vec<Agent>,
    eliminated: Vec<Elimination>,
    rng: ChaCha8Rng,
    clock: f64,
    frame: u64,
    best_score: usize,
}

impl Episode {
    pub fn new(config: GameConfig, seed: u64) -> Self {
        let difficulty = Difficulty::new(
            config.initial_gap_baseline,
            config.initial_horizontal_velocity,
        );
        Self {
            controller: DifficultyController::new(
                config.difficulty,
                config.world.base_tube_velocity,
            ),
            stream: TubeStream::start(config.world, seed, &difficulty),
            rng: ChaCha8Rng::seed_from_u64(seed.wrapping_add(1)),
            config,
            difficulty,
            agents: Vec::new(),
            eliminated: Vec::new(),
            clock: 0.0,
            frame: 0,
            best_score: 0,
        }
    }

    /// Episode with `count` birds, spawn heights jittered by up to
    /// `spread` pixels.
    pub fn with_agents(config: GameConfig, seed: u64, count: usize, spread: f64) -> Self {
        let mut episode = Self::new(config, seed);
        for _ in 0..count {
            let offset = if spread > 0.0 {
                episode.rng.gen_range(-spread..=spread)
            } else {
                0.0
            };
            episode.add_agent(offset);
        }
        episode
    }

    /// Add a bird. Returns its id.
    pub fn add_agent(&mut self, y_offset: f64) -> usize {
        let id = self.agents.len() + self.eliminated.len();
        self.agents.push(Agent {
            id,
            player: Player::spawn(&self.config.player, &self.config.world, y_offset),
            target: 0,
            frames_alive: 0,
            alive: true,
        });
        id
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn difficulty(&self) -> &Difficulty {
        &self.difficulty
    }

    pub fn stream(&self) -> &TubeStream {
        &self.stream
    }

    /// Birds still flying, in spawn order.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, id: usize) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }

    pub fn eliminated(&self) -> &[Elimination] {
        &self.eliminated
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Seconds of simulated time, as seen by flap fatigue.
    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Highest score any bird has reached this episode.
    pub fn best_score(&self) -> usize {
        self.best_score
    }

    pub fn is_over(&self) -> bool {
        self.agents.is_empty()
    }

    /// Flap bird `id`. Unknown or eliminated ids are ignored.
    pub fn flap(&mut self, id: usize) {
        let now = self.clock;
        if let Some(agent) = self.agents.iter_mut().find(|a| a.id == id) {
            agent.player.flap(now);
        }
    }

    /// The tube `agent` has to clear next, or the lead if that one is gone.
    pub fn target_tube(&self, agent: &Agent) -> Option<&Tube> {
        let lead = self.stream.lead_index()?;
        self.stream
            .tube(agent.target.min(lead))
            .or_else(|| self.stream.lead())
    }

    /// What `agent` senses about its next tube.
    pub fn observe(&self, agent: &Agent) -> Option<Observation> {
        let tube = self.target_tube(agent)?;
        Some(Observation::capture(&agent.player, tube))
    }

    /// Advance one frame by `dt` and report what happened.
    ///
    /// `dt` is clamped to `[0, max_frame_dt]`; a NaN step is treated as 0.
    pub fn step(&mut self, dt: f64) -> Vec<Event> {
        let dt = if dt.is_nan() {
            0.0
        } else {
            dt.clamp(0.0, self.config.world.max_frame_dt)
        };
        let mut events = Vec::new();
        self.frame += 1;
        self.clock += dt;

        if self.stream.step(dt, &self.difficulty) {
            if let Some(ordinal) = self.stream.lead_index() {
                events.push(Event::Spawned { ordinal });
            }
        }

        for agent in &mut self.agents {
            agent.player.update(dt);
        }

        for agent in &mut self.agents {
            agent.frames_alive += 1;
            events.push(Event::Survived { agent: agent.id });

            let eval = scoring::evaluate(&agent.player, &self.stream, agent.target);
            if !eval.alive {
                agent.alive = false;
                events.push(Event::Died {
                    agent: agent.id,
                    score: agent.target,
                });
                self.eliminated.push(Elimination {
                    id: agent.id,
                    score: agent.target,
                    frames_alive: agent.frames_alive,
                    frame: self.frame,
                });
                continue;
            }
            if !eval.passed {
                continue;
            }

            agent.target = eval.target;
            events.push(Event::Passed {
                agent: agent.id,
                score: agent.target,
            });
            if agent.target > self.best_score {
                self.best_score = agent.target;
                if self.controller.maybe_escalate(
                    agent.target,
                    &mut self.difficulty,
                    &mut agent.player,
                    &mut self.stream,
                ) {
                    events.push(Event::Escalated {
                        agent: agent.id,
                        score: agent.target,
                    });
                }
            }
        }

        self.agents.retain(|a| a.alive);
        events
    }
}
