use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEventKind},
    execute, terminal,
};
use flippy::brain::{Brain, GapFollower, IdleBrain, LinearBrain};
use flippy::config::{GameConfig, PlayerConfig};
use flippy::episode::{self, Episode};
use flippy::session::{Press, Session};
use flippy::population::{Generation, GenerationConfig, run_generation};
use flippy::render::{Overlay, PixelBuf, draw_episode};
use flippy::sound::Sfx;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::fs::{self, File};
use std::io::{self, Stdout, stdout};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// ~30 fps
const FRAME: Duration = Duration::from_millis(33);

#[derive(Parser, Debug)]
#[command(name = "flippy")]
#[command(about = "Flappy bird in the terminal, for humans and for populations of agents")]
struct Cli {
    /// JSON file overriding game constants
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Write logs here (terminal modes log nothing otherwise)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play with the keyboard: space, up or enter to flap, q to quit
    Play {
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Rapid flaps get weaker
        #[arg(long)]
        tired: bool,
    },
    /// Watch generations of agents fly, one after another
    Watch {
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long, default_value_t = 20)]
        size: usize,
        #[arg(long, value_enum, default_value_t = BrainKind::Linear)]
        brain: BrainKind,
        #[arg(long, default_value_t = 40.0)]
        spread: f64,
    },
    /// Run one generation without a terminal and report fitness
    Population {
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long, default_value_t = 50)]
        size: usize,
        #[arg(long, value_enum, default_value_t = BrainKind::Linear)]
        brain: BrainKind,
        #[arg(long, default_value_t = 0.33)]
        dt: f64,
        #[arg(long, default_value_t = 20_000)]
        max_frames: u64,
        #[arg(long, default_value_t = 40.0)]
        spread: f64,
        /// Write the JSON summary here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BrainKind {
    /// Randomly weighted sigmoid unit
    Linear,
    /// Hand-written gap follower
    Follower,
    /// Never flaps
    Idle,
}

fn brains(kind: BrainKind, size: usize, seed: u64) -> Vec<Box<dyn Brain>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..size)
        .map(|_| -> Box<dyn Brain> {
            match kind {
                BrainKind::Linear => Box::new(LinearBrain::random(&mut rng)),
                BrainKind::Follower => Box::new(GapFollower::default()),
                BrainKind::Idle => Box::new(IdleBrain),
            }
        })
        .collect()
}

fn init_tracing(log_file: Option<&Path>, headless: bool) -> Result<()> {
    let filter = tracing_subscriber::filter::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::filter::EnvFilter::new("info"));
    if let Some(path) = log_file {
        let file = File::create(path)
            .with_context(|| format!("creating log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else if headless {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }
    Ok(())
}

fn load_config(path: Option<&Path>, preset: GameConfig) -> Result<GameConfig> {
    match path {
        Some(path) => preset.load(path),
        None => Ok(preset),
    }
}

// ── Terminal ────────────────────────────────────────────────────────────────

struct Screen {
    out: Stdout,
    buf: PixelBuf,
}

impl Screen {
    fn open() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut out = stdout();
        execute!(
            out,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            terminal::DisableLineWrap,
        )?;
        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            buf: PixelBuf::new(cols as usize, rows as usize * 2),
        })
    }

    fn close(&mut self) -> io::Result<()> {
        execute!(
            self.out,
            terminal::LeaveAlternateScreen,
            cursor::Show,
            terminal::EnableLineWrap,
        )?;
        terminal::disable_raw_mode()
    }

    fn draw(&mut self, episode: &Episode, overlay: &Overlay) -> io::Result<()> {
        draw_episode(&mut self.buf, episode, overlay);
        self.buf.render(&mut self.out)
    }
}

enum Input {
    Flap,
    Quit,
}

/// Drain pending terminal events.
fn poll_input(screen: &mut Screen) -> io::Result<Vec<Input>> {
    let mut inputs = Vec::new();
    while event::poll(Duration::ZERO)? {
        match event::read()? {
            Event::Key(key) if key.kind != KeyEventKind::Release => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => inputs.push(Input::Quit),
                KeyCode::Char(' ') | KeyCode::Up | KeyCode::Enter => inputs.push(Input::Flap),
                _ => {}
            },
            Event::Resize(c, r) => screen.buf.resize(c as usize, r as usize * 2),
            _ => {}
        }
    }
    Ok(inputs)
}

/// Sleep out the rest of the frame. Returns the frame's length in physics
/// time units (tenths of a second, i.e. elapsed ms / 100).
fn pace(frame_start: Instant) -> f64 {
    let elapsed = frame_start.elapsed();
    if elapsed < FRAME {
        std::thread::sleep(FRAME - elapsed);
    }
    frame_start.elapsed().as_secs_f64() * 10.0
}

// ── Modes ───────────────────────────────────────────────────────────────────

fn play(config: GameConfig, seed: u64) -> Result<()> {
    let sfx = Sfx::open()?;
    let mut screen = Screen::open()?;
    let result = play_rounds(&mut screen, &sfx, config, seed);
    screen.close()?;
    result
}

fn play_rounds(screen: &mut Screen, sfx: &Sfx, config: GameConfig, seed: u64) -> Result<()> {
    let mut session = Session::new(config, seed);
    let mut dt = 0.0;

    loop {
        let frame_start = Instant::now();

        for input in poll_input(screen)? {
            match input {
                Input::Quit => return Ok(()),
                Input::Flap => {
                    if session.press() == Press::Flapped {
                        sfx.flap();
                    }
                }
            }
        }

        for event in session.step(dt) {
            if let episode::Event::Died { .. } = event {
                sfx.death();
            }
        }

        let overlay = Overlay {
            score: session.score(),
            counter: session.tries(),
            best: session.max_score(),
            sight_lines_of: None,
            game_over: session.is_over(),
        };
        screen.draw(session.episode(), &overlay)?;
        dt = pace(frame_start);
    }
}

fn watch(config: GameConfig, seed: u64, size: usize, kind: BrainKind, spread: f64) -> Result<()> {
    let mut screen = Screen::open()?;
    let result = watch_generations(&mut screen, config, seed, size, kind, spread);
    screen.close()?;
    result
}

fn watch_generations(
    screen: &mut Screen,
    config: GameConfig,
    seed: u64,
    size: usize,
    kind: BrainKind,
    spread: f64,
) -> Result<()> {
    let mut best = 0;
    for generation_seed in seed.. {
        let settings = GenerationConfig {
            seed: generation_seed,
            spawn_spread: spread,
            ..GenerationConfig::default()
        };
        let mut generation = Generation::new(config, settings, brains(kind, size, generation_seed));

        while !generation.is_done() {
            let frame_start = Instant::now();
            if poll_input(screen)?.iter().any(|i| matches!(i, Input::Quit)) {
                return Ok(());
            }
            generation.step();

            let episode = generation.episode();
            best = best.max(episode.best_score());
            let overlay = Overlay {
                score: episode.best_score(),
                counter: episode.agents().len(),
                best,
                sight_lines_of: episode.agents().first().map(|a| a.id),
                game_over: false,
            };
            screen.draw(episode, &overlay)?;
            pace(frame_start);
        }
        generation.finish();
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn population(
    config: GameConfig,
    seed: u64,
    size: usize,
    kind: BrainKind,
    dt: f64,
    max_frames: u64,
    spread: f64,
    output: Option<&Path>,
) -> Result<()> {
    let settings = GenerationConfig {
        seed,
        dt,
        max_frames,
        spawn_spread: spread,
    };
    let summary = run_generation(config, settings, brains(kind, size, seed));
    let json = serde_json::to_string_pretty(&summary)?;
    match output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(path = %path.display(), "summary written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let headless = matches!(cli.command, Commands::Population { .. });
    init_tracing(cli.log_file.as_deref(), headless)?;
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Play { seed, tired } => {
            let mut config = load_config(config_path, GameConfig::human())?;
            if tired {
                config.player = PlayerConfig {
                    fatigue: PlayerConfig::tired().fatigue,
                    ..config.player
                };
            }
            play(config, seed)
        }
        Commands::Watch {
            seed,
            size,
            brain,
            spread,
        } => watch(
            load_config(config_path, GameConfig::population())?,
            seed,
            size,
            brain,
            spread,
        ),
        Commands::Population {
            seed,
            size,
            brain,
            dt,
            max_frames,
            spread,
            output,
        } => population(
            load_config(config_path, GameConfig::population())?,
            seed,
            size,
            brain,
            dt,
            max_frames,
            spread,
            output.as_deref(),
        ),
    }
}
