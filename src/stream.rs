use std::collections::VecDeque;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::config::WorldConfig;
use crate::difficulty::Difficulty;
use crate::tube::Tube;

/// Rolling sequence of tubes in spawn order.
///
/// Tubes are addressed by ordinal, their absolute spawn index. Retiring
/// offscreen tubes never renumbers the ones still active.
#[derive(Debug, Clone)]
pub struct TubeStream {
    world: WorldConfig,
    tubes: VecDeque<Tube>,
    retired: usize,
    rng: ChaCha8Rng,
}

impl TubeStream {
    /// Empty stream. Nothing spawns until the first `spawn` or `step`.
    ///
    /// # Panics
    /// If the spawn trigger is not left of the right edge; spawning would
    /// never catch up.
    pub fn new(world: WorldConfig, seed: u64) -> Self {
        assert!(
            world.tube_spacing() > 0.0,
            "spawn trigger {} must be left of world width {}",
            world.spawn_trigger_x,
            world.width
        );
        Self {
            world,
            tubes: VecDeque::new(),
            retired: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Stream with its first tube already at the right edge.
    pub fn start(world: WorldConfig, seed: u64, difficulty: &Difficulty) -> Self {
        let mut stream = Self::new(world, seed);
        stream.spawn(difficulty.gap_baseline, difficulty.horizontal_velocity);
        stream
    }

    /// Number of tubes ever spawned.
    pub fn spawned(&self) -> usize {
        self.retired + self.tubes.len()
    }

    /// Ordinal of the most recently spawned tube.
    pub fn lead_index(&self) -> Option<usize> {
        self.spawned().checked_sub(1)
    }

    pub fn lead(&self) -> Option<&Tube> {
        self.tubes.back()
    }

    /// Tube by ordinal; `None` once it has been retired.
    ///
    /// # Panics
    /// If `ordinal` has not been spawned yet.
    pub fn tube(&self, ordinal: usize) -> Option<&Tube> {
        assert!(
            ordinal < self.spawned(),
            "tube ordinal {ordinal} requested but only {} spawned",
            self.spawned()
        );
        ordinal
            .checked_sub(self.retired)
            .and_then(|i| self.tubes.get(i))
    }

    /// Active tubes with their ordinals, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Tube)> {
        self.tubes
            .iter()
            .enumerate()
            .map(move |(i, t)| (self.retired + i, t))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Tube> {
        self.tubes.iter_mut()
    }

    /// Append a tube with a fresh random gap offset.
    pub fn spawn(&mut self, gap_baseline: f64, horizontal_velocity: f64) -> &Tube {
        let max = self.world.gap_offset_max.saturating_abs();
        let offset = self.rng.gen_range(-max..=max);
        self.spawn_with_offset(gap_baseline, horizontal_velocity, offset)
    }

    /// Append a tube with a chosen gap offset. The first tube enters at the
    /// right edge; later ones keep a fixed spacing behind the previous one.
    pub fn spawn_with_offset(
        &mut self,
        gap_baseline: f64,
        horizontal_velocity: f64,
        gap_offset: i32,
    ) -> &Tube {
        let x = match self.tubes.back() {
            Some(prev) => prev.x() + self.world.tube_spacing(),
            None => self.world.width,
        };
        self.tubes.push_back(Tube::new(
            &self.world,
            x,
            gap_baseline,
            horizontal_velocity,
            gap_offset,
        ));
        &self.tubes[self.tubes.len() - 1]
    }

    pub fn advance_all(&mut self, dt: f64) {
        for tube in self.tubes.iter_mut().filter(|t| !t.is_offscreen()) {
            tube.advance(dt);
        }
    }

    /// Drop offscreen tubes from the front. Returns how many were dropped.
    pub fn retire_offscreen(&mut self) -> usize {
        let mut dropped = 0;
        while self.tubes.front().is_some_and(Tube::is_offscreen) {
            self.tubes.pop_front();
            dropped += 1;
        }
        self.retired += dropped;
        dropped
    }

    fn spawn_due(&self) -> bool {
        match self.tubes.back() {
            Some(lead) => lead.x() < self.world.spawn_trigger_x,
            None => true,
        }
    }

    /// One frame: move, top up, retire. Returns whether anything spawned.
    pub fn step(&mut self, dt: f64, difficulty: &Difficulty) -> bool {
        self.advance_all(dt);
        let mut spawned = false;
        while self.spawn_due() {
            self.spawn(difficulty.gap_baseline, difficulty.horizontal_velocity);
            spawned = true;
        }
        self.retire_offscreen();
        spawned
    }
}
