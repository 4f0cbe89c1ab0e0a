use flippy::brain::{Brain, GapFollower, IdleBrain, LinearBrain};
use flippy::config::{DifficultyConfig, GameConfig, WorldConfig};
use flippy::population::{GenerationConfig, run_generation};
use flippy::{DifficultyController, Episode, Event, TubeStream};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn centred(mut config: GameConfig) -> GameConfig {
    config.world = WorldConfig {
        gap_offset_max: 0,
        ..config.world
    };
    config
}

#[test]
fn opening_stays_twice_the_baseline_while_scrolling() {
    let world = WorldConfig::default();
    let mut stream = TubeStream::new(world, 0);
    stream.spawn_with_offset(200.0, 0.0, 0);
    for _ in 0..30 {
        let tube = stream.lead().unwrap();
        assert!((tube.gap() - 400.0).abs() < 1e-9);
        assert_eq!(tube.upper_rect().bottom(), 56.0);
        assert_eq!(tube.lower_rect().top(), 456.0);
        assert_eq!(tube.upper_rect().x, tube.lower_rect().x);
        stream.advance_all(0.33);
    }
}

#[test]
fn spacing_survives_uneven_frame_times() {
    let even = [0.5; 60];
    let uneven: Vec<f64> = (0..30).flat_map(|_| [0.1, 0.9]).collect();

    let xs = |dts: &[f64]| {
        let mut episode = Episode::new(GameConfig::human(), 2);
        for &dt in dts {
            episode.step(dt);
        }
        episode
            .stream()
            .iter()
            .map(|(ordinal, tube)| (ordinal, tube.x()))
            .collect::<Vec<_>>()
    };

    let a = xs(&even[..]);
    let b = xs(&uneven[..]);
    assert_eq!(a.len(), b.len());
    for (&(oa, xa), &(ob, xb)) in a.iter().zip(&b) {
        assert_eq!(oa, ob);
        assert!((xa - xb).abs() < 1e-6, "tube {oa}: {xa} vs {xb}");
    }
    for pair in a.windows(2) {
        assert!((pair[1].1 - pair[0].1 - 176.0).abs() < 1e-6);
    }
}

#[test]
fn idle_bird_bounces_into_the_first_tube() {
    let mut episode = Episode::with_agents(centred(GameConfig::population()), 5, 1, 0.0);
    let mut deaths = Vec::new();
    for _ in 0..1_000 {
        for event in episode.step(0.33) {
            if let Event::Died { agent, score } = event {
                deaths.push((agent, score));
            }
        }
        if episode.is_over() {
            break;
        }
    }
    assert_eq!(deaths, vec![(0, 0)]);
    assert_eq!(episode.eliminated().len(), 1);
    assert_eq!(episode.eliminated()[0].score, 0);
}

#[test]
fn gap_follower_scores_each_tube_once() {
    let mut episode = Episode::with_agents(centred(GameConfig::human()), 7, 1, 0.0);
    let mut brain = GapFollower::default();
    let mut passes = Vec::new();
    for _ in 0..2_000 {
        let flap = episode
            .agent(0)
            .and_then(|a| episode.observe(a))
            .is_some_and(|obs| brain.wants_flap(&obs));
        if flap {
            episode.flap(0);
        }
        for event in episode.step(0.33) {
            if let Event::Passed { score, .. } = event {
                passes.push(score);
            }
        }
        if episode.is_over() {
            break;
        }
    }
    assert!(!episode.is_over(), "follower crashed after {passes:?}");
    assert!(passes.len() >= 5);
    let expected: Vec<usize> = (1..=passes.len()).collect();
    assert_eq!(passes, expected);
}

#[test]
fn escalation_scores_follow_the_period() {
    let controller = DifficultyController::new(DifficultyConfig::default(), 15.0);
    let triggers: Vec<usize> = (0..20).filter(|&s| controller.triggers_at(s)).collect();
    assert_eq!(triggers, vec![1, 5, 9, 13, 17]);

    let off = DifficultyController::new(
        DifficultyConfig {
            enabled: false,
            ..DifficultyConfig::default()
        },
        15.0,
    );
    assert!((0..20).all(|s| !off.triggers_at(s)));
}

#[test]
fn flying_through_the_ramp_escalates_at_one_mod_four() {
    let mut episode = Episode::with_agents(centred(GameConfig::population()), 3, 1, 0.0);
    let mut brain = GapFollower::default();
    let mut escalations = Vec::new();
    while episode.best_score() < 9 && !episode.is_over() && episode.frame() < 5_000 {
        let flap = episode
            .agent(0)
            .and_then(|a| episode.observe(a))
            .is_some_and(|obs| brain.wants_flap(&obs));
        if flap {
            episode.flap(0);
        }
        for event in episode.step(0.33) {
            if let Event::Escalated { score, .. } = event {
                escalations.push(score);
            }
        }
    }
    assert_eq!(episode.best_score(), 9);
    assert_eq!(escalations, vec![1, 5, 9]);
    assert_eq!(episode.difficulty().gap_baseline, 145.0);
    assert_eq!(episode.agents()[0].player.jump_strength, -34.0);
}

fn linear_brains(n: usize, seed: u64) -> Vec<Box<dyn Brain>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|_| Box::new(LinearBrain::random(&mut rng)) as Box<dyn Brain>)
        .collect()
}

#[test]
fn generations_are_reproducible() {
    let settings = GenerationConfig {
        seed: 11,
        max_frames: 3_000,
        spawn_spread: 40.0,
        ..GenerationConfig::default()
    };
    let a = run_generation(GameConfig::population(), settings, linear_brains(12, 11));
    let b = run_generation(GameConfig::population(), settings, linear_brains(12, 11));
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
    assert_eq!(a.population, 12);
}

#[test]
fn summary_serializes_per_agent_results() {
    let summary = run_generation(
        GameConfig::population(),
        GenerationConfig {
            max_frames: 5,
            ..GenerationConfig::default()
        },
        vec![Box::new(IdleBrain), Box::new(GapFollower::default())],
    );
    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["population"], 2);
    assert_eq!(json["frames"], 5);
    assert_eq!(json["agents"][0]["brain"], "idle");
    assert_eq!(json["agents"][1]["brain"], "gap_follower");
    assert_eq!(json["agents"][1]["survived"], true);
}
