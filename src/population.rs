use serde::Serialize;

use crate::brain::Brain;
use crate::config::GameConfig;
use crate::episode::{Episode, Event};

#[derive(Debug, Clone, Copy)]
pub struct GenerationConfig {
    pub seed: u64,
    /// Time step per frame, in the same units as the physics constants.
    pub dt: f64,
    /// Stop after this many frames even if birds are still alive.
    pub max_frames: u64,
    /// Spawn heights are jittered by up to this many pixels.
    pub spawn_spread: f64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            dt: 0.33,
            max_frames: 20_000,
            spawn_spread: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentResult {
    pub id: usize,
    pub brain: String,
    pub score: usize,
    pub fitness: f64,
    pub frames_alive: u64,
    pub survived: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationSummary {
    pub seed: u64,
    pub population: usize,
    pub frames: u64,
    pub best_score: usize,
    pub best_fitness: f64,
    pub agents: Vec<AgentResult>,
}

/// One generation in progress: every brain flies its own bird through a
/// shared episode, and fitness is booked from the episode's events.
pub struct Generation {
    config: GenerationConfig,
    episode: Episode,
    brains: Vec<Box<dyn Brain>>,
    fitness: Vec<f64>,
}

impl Generation {
    pub fn new(game: GameConfig, config: GenerationConfig, brains: Vec<Box<dyn Brain>>) -> Self {
        let episode = Episode::with_agents(game, config.seed, brains.len(), config.spawn_spread);
        Self {
            fitness: vec![0.0; brains.len()],
            config,
            episode,
            brains,
        }
    }

    pub fn episode(&self) -> &Episode {
        &self.episode
    }

    pub fn fitness(&self, id: usize) -> f64 {
        self.fitness[id]
    }

    pub fn is_done(&self) -> bool {
        self.episode.is_over() || self.episode.frame() >= self.config.max_frames
    }

    /// Let every live bird decide, then advance one frame.
    pub fn step(&mut self) -> Vec<Event> {
        let flaps: Vec<usize> = self
            .episode
            .agents()
            .iter()
            .filter_map(|agent| {
                let obs = self.episode.observe(agent)?;
                self.brains[agent.id].wants_flap(&obs).then_some(agent.id)
            })
            .collect();
        for id in flaps {
            self.episode.flap(id);
        }

        let events = self.episode.step(self.config.dt);
        let rules = self.episode.config().fitness;
        for event in &events {
            if let Some((agent, delta)) = event.fitness_delta(&rules) {
                self.fitness[agent] += delta;
            }
            match *event {
                Event::Died { agent, score } => {
                    tracing::debug!(agent, score, fitness = self.fitness[agent], "bird eliminated")
                }
                Event::Escalated { agent, score } => {
                    tracing::debug!(agent, score, "difficulty raised")
                }
                _ => {}
            }
        }
        events
    }

    pub fn run(mut self) -> GenerationSummary {
        while !self.is_done() {
            self.step();
        }
        self.finish()
    }

    pub fn finish(self) -> GenerationSummary {
        let mut agents: Vec<AgentResult> = self
            .episode
            .eliminated()
            .iter()
            .map(|e| (e.id, e.score, e.frames_alive, false))
            .chain(
                self.episode
                    .agents()
                    .iter()
                    .map(|a| (a.id, a.score(), a.frames_alive, true)),
            )
            .map(|(id, score, frames_alive, survived)| AgentResult {
                id,
                brain: self.brains[id].name().to_string(),
                score,
                fitness: self.fitness[id],
                frames_alive,
                survived,
            })
            .collect();
        agents.sort_by_key(|a| a.id);

        let best_fitness = agents
            .iter()
            .map(|a| a.fitness)
            .fold(f64::NEG_INFINITY, f64::max);
        let summary = GenerationSummary {
            seed: self.config.seed,
            population: agents.len(),
            frames: self.episode.frame(),
            best_score: self.episode.best_score(),
            best_fitness: if agents.is_empty() { 0.0 } else { best_fitness },
            agents,
        };
        tracing::info!(
            seed = summary.seed,
            population = summary.population,
            frames = summary.frames,
            best_score = summary.best_score,
            best_fitness = summary.best_fitness,
            "generation finished"
        );
        summary
    }
}

/// Fly `brains` through one episode and report their fitness.
pub fn run_generation(
    game: GameConfig,
    config: GenerationConfig,
    brains: Vec<Box<dyn Brain>>,
) -> GenerationSummary {
    Generation::new(game, config, brains).run()
}
