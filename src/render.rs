use crossterm::{
    cursor, queue,
    style::{self, Color as CColor},
};
use std::io::{self, Write};

use crate::episode::Episode;
use crate::geometry::Rect;
use crate::player::Player;
use crate::sensors::sight_lines;
use crate::tube::Tube;

// ── Colors ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Blend from `a` (t = 0) to `b` (t = 256).
    pub const fn lerp(a: Rgb, b: Rgb, t: u16) -> Rgb {
        const fn mix(a: u8, b: u8, t: u16) -> u8 {
            let (a, b, t) = (a as i32, b as i32, t as i32);
            (a + (b - a) * t / 256) as u8
        }
        Rgb(mix(a.0, b.0, t), mix(a.1, b.1, t), mix(a.2, b.2, t))
    }

    const fn dim(self) -> Rgb {
        Rgb(self.0 >> 1, self.1 >> 1, self.2 >> 1)
    }

    fn to_term(self) -> CColor {
        CColor::Rgb {
            r: self.0,
            g: self.1,
            b: self.2,
        }
    }
}

const SKY: [Rgb; 2] = [Rgb(72, 176, 204), Rgb(196, 234, 246)];
const HILLS: [Rgb; 2] = [Rgb(124, 196, 80), Rgb(92, 172, 58)];
const PIPE_RIM: Rgb = Rgb(58, 98, 22);
/// Horizontal shading across a pipe, as (position out of 256, color) stops.
const PIPE_STOPS: [(u16, Rgb); 5] = [
    (0, Rgb(72, 120, 28)),
    (64, Rgb(102, 168, 42)),
    (100, Rgb(148, 214, 64)),
    (160, Rgb(116, 190, 48)),
    (256, Rgb(72, 120, 28)),
];
const BIRD_CROWN: Rgb = Rgb(255, 226, 104);
const BIRD_WING: Rgb = Rgb(212, 162, 38);
const BIRD_EYE: Rgb = Rgb(255, 255, 255);
const BIRD_PUPIL: Rgb = Rgb(18, 18, 18);
const BIRD_BEAK: Rgb = Rgb(226, 78, 36);
const PANEL: [Rgb; 2] = [Rgb(206, 182, 108), Rgb(222, 198, 124)];
const SHADOW: Rgb = Rgb(28, 28, 28);
pub const WHITE: Rgb = Rgb(255, 255, 255);
pub const GOLD: Rgb = Rgb(244, 198, 64);
pub const LINE_LOWER: Rgb = Rgb(230, 40, 40);
pub const LINE_UPPER: Rgb = Rgb(40, 60, 230);

/// Body colors cycled across a flock so individual birds stay tellable.
const FLOCK: [Rgb; 4] = [
    GOLD,
    Rgb(235, 110, 90),
    Rgb(120, 170, 240),
    Rgb(200, 130, 220),
];

// ── Pixel buffer ────────────────────────────────────────────────────────────

/// Off-screen RGB canvas. Two pixel rows share one terminal row, drawn with
/// the upper half block.
pub struct PixelBuf {
    w: usize,
    h: usize,
    px: Vec<Rgb>,
}

impl PixelBuf {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            px: vec![SKY[0]; w * h],
        }
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    pub fn resize(&mut self, w: usize, h: usize) {
        (self.w, self.h) = (w, h);
        self.px.resize(w * h, SKY[0]);
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let (x, y) = (usize::try_from(x).ok()?, usize::try_from(y).ok()?);
        (x < self.w && y < self.h).then(|| y * self.w + x)
    }

    /// Clipped write.
    pub fn set(&mut self, x: i32, y: i32, c: Rgb) {
        if let Some(i) = self.index(x, y) {
            self.px[i] = c;
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Rgb {
        self.px[y * self.w + x]
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, c: Rgb) {
        for py in y..y + h {
            for px in x..x + w {
                self.set(px, py, c);
            }
        }
    }

    /// Bresenham line, clipped by `set`.
    pub fn line(&mut self, (x0, y0): (i32, i32), (x1, y1): (i32, i32), c: Rgb) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let (mut x, mut y, mut err) = (x0, y0, dx + dy);
        loop {
            self.set(x, y, c);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    pub fn dim(&mut self) {
        self.px.iter_mut().for_each(|p| *p = p.dim());
    }

    /// Write the whole buffer from the top-left corner, emitting color
    /// changes only.
    pub fn render(&self, out: &mut impl Write) -> io::Result<()> {
        queue!(out, cursor::MoveTo(0, 0))?;
        let rows = self.h / 2;
        for row in 0..rows {
            let mut pen = Pen::default();
            for col in 0..self.w {
                let upper = self.get(col, row * 2);
                let lower = self.get(col, row * 2 + 1);
                if upper == lower {
                    pen.background(out, lower)?;
                    queue!(out, style::Print(' '))?;
                } else {
                    pen.foreground(out, upper)?;
                    pen.background(out, lower)?;
                    queue!(out, style::Print('\u{2580}'))?;
                }
            }
            queue!(out, style::ResetColor)?;
            if row + 1 < rows {
                queue!(out, style::Print("\r\n"))?;
            }
        }
        out.flush()
    }
}

/// Terminal colors currently in effect on one output row.
#[derive(Default)]
struct Pen {
    fg: Option<Rgb>,
    bg: Option<Rgb>,
}

impl Pen {
    fn foreground(&mut self, out: &mut impl Write, c: Rgb) -> io::Result<()> {
        if self.fg != Some(c) {
            queue!(out, style::SetForegroundColor(c.to_term()))?;
            self.fg = Some(c);
        }
        Ok(())
    }

    fn background(&mut self, out: &mut impl Write, c: Rgb) -> io::Result<()> {
        if self.bg != Some(c) {
            queue!(out, style::SetBackgroundColor(c.to_term()))?;
            self.bg = Some(c);
        }
        Ok(())
    }
}

// ── Digits ──────────────────────────────────────────────────────────────────

/// 3x5 glyphs, one bit per pixel, top row in the high bits.
const GLYPHS: [u16; 10] = [
    0b111_101_101_101_111,
    0b010_110_010_010_111,
    0b111_001_111_100_111,
    0b111_001_011_001_111,
    0b101_101_111_001_001,
    0b111_100_111_001_111,
    0b111_100_111_101_111,
    0b111_001_010_010_010,
    0b111_101_111_101_111,
    0b111_101_111_001_111,
];
const GLYPH_ADVANCE: i32 = 4;

fn draw_digit(buf: &mut PixelBuf, x: i32, y: i32, digit: u32, fg: Rgb) {
    let glyph = GLYPHS[digit as usize % GLYPHS.len()];
    for bit in 0..15 {
        if glyph & (1 << (14 - bit)) != 0 {
            let (px, py) = (x + bit % 3, y + bit / 3);
            buf.set(px + 1, py + 1, SHADOW);
            buf.set(px, py, fg);
        }
    }
}

fn number_width(n: usize) -> i32 {
    n.to_string().len() as i32 * GLYPH_ADVANCE - 1
}

/// Number starting at `x`.
pub fn draw_number_left(buf: &mut PixelBuf, x: i32, y: i32, n: usize, fg: Rgb) {
    let digits = n.to_string();
    for (i, d) in digits.chars().filter_map(|c| c.to_digit(10)).enumerate() {
        draw_digit(buf, x + i as i32 * GLYPH_ADVANCE, y, d, fg);
    }
}

/// Number centred on `cx`.
pub fn draw_number(buf: &mut PixelBuf, cx: i32, y: i32, n: usize, fg: Rgb) {
    draw_number_left(buf, cx - number_width(n) / 2, y, n, fg);
}

// ── World ───────────────────────────────────────────────────────────────────

/// World-to-pixel mapping.
#[derive(Clone, Copy, Debug)]
pub struct View {
    sx: f64,
    sy: f64,
}

impl View {
    pub fn fit(buf: &PixelBuf, world_w: f64, world_h: f64) -> Self {
        Self {
            sx: buf.w as f64 / world_w,
            sy: buf.h as f64 / world_h,
        }
    }

    pub fn point(&self, (x, y): (f64, f64)) -> (i32, i32) {
        ((x * self.sx).round() as i32, (y * self.sy).round() as i32)
    }

    /// Pixel rectangle `(x, y, w, h)`, at least one pixel in each direction.
    pub fn rect(&self, r: &Rect) -> (i32, i32, i32, i32) {
        let (x0, y0) = self.point((r.left(), r.top()));
        let (x1, y1) = self.point((r.right(), r.bottom()));
        (x0, y0, (x1 - x0).max(1), (y1 - y0).max(1))
    }
}

/// What to draw besides the world itself.
#[derive(Clone, Copy, Debug, Default)]
pub struct Overlay {
    pub score: usize,
    /// Shown in the top-left corner: tries in play mode, birds alive when
    /// watching a generation.
    pub counter: usize,
    pub best: usize,
    /// Draw the sight lines of this agent.
    pub sight_lines_of: Option<usize>,
    pub game_over: bool,
}

pub fn draw_episode(buf: &mut PixelBuf, episode: &Episode, overlay: &Overlay) {
    let world = episode.config().world;
    let view = View::fit(buf, world.width, world.height);
    let scroll = episode.clock() * world.base_tube_velocity * view.sx;

    draw_sky(buf);
    draw_hills(buf, scroll, view.sy);
    for (_, tube) in episode.stream().iter() {
        draw_tube(buf, &view, tube);
    }
    if let Some(agent) = overlay.sight_lines_of.and_then(|id| episode.agent(id)) {
        if let Some(tube) = episode.target_tube(agent) {
            draw_sight_lines(buf, &view, &agent.player, tube);
        }
    }
    for agent in episode.agents() {
        draw_bird(buf, &view, &agent.player, episode.frame(), FLOCK[agent.id % FLOCK.len()]);
    }

    let cx = buf.w as i32 / 2;
    draw_number(buf, cx, 4, overlay.score, WHITE);
    draw_number_left(buf, 2, 2, overlay.counter, WHITE);
    draw_number_left(buf, 2, 9, overlay.best, GOLD);

    if overlay.game_over {
        draw_game_over(buf, overlay.score, overlay.best);
    }
}

fn draw_sky(buf: &mut PixelBuf) {
    let (w, h) = (buf.w as i32, buf.h.max(1));
    for y in 0..buf.h {
        let c = Rgb::lerp(SKY[0], SKY[1], (y * 256 / h) as u16);
        buf.fill_rect(0, y as i32, w, 1, c);
    }
}

/// Two bands of rolling hills scrolling slower than the tubes.
fn draw_hills(buf: &mut PixelBuf, scroll: f64, scale: f64) {
    let base = buf.h as i32;
    let bands = [(0.2, 0.04, 6.0, 4.0), (0.4, 0.06, 4.0, 2.0)];
    for ((parallax, freq, amp, lift), c) in bands.into_iter().zip(HILLS) {
        for x in 0..buf.w as i32 {
            let phase = (f64::from(x) + scroll * parallax) * freq;
            let crest = phase.sin() * amp + (phase * 1.7).sin() * amp / 2.0 + lift;
            let top = base - (crest * scale * 8.0) as i32;
            buf.fill_rect(x, top, 1, base - top, c);
        }
    }
}

/// Color of column `x` of a pipe `w` pixels wide.
fn pipe_shade(x: i32, w: i32) -> Rgb {
    if w <= 1 {
        return PIPE_STOPS[1].1;
    }
    let t = (x.clamp(0, w - 1) * 256 / (w - 1)) as u16;
    PIPE_STOPS
        .windows(2)
        .find(|s| t <= s[1].0)
        .map_or(PIPE_STOPS[0].1, |s| {
            let ((t0, a), (t1, b)) = (s[0], s[1]);
            Rgb::lerp(a, b, (t - t0) * 256 / (t1 - t0))
        })
}

/// Pipe body from `y0` to `y1`, with a wider cap `cap_h` rows tall whose
/// outer edge sits at `rim`.
fn draw_pipe(buf: &mut PixelBuf, x: i32, w: i32, (y0, y1): (i32, i32), rim: i32, cap_h: i32) {
    for col in 0..w {
        let c = pipe_shade(col, w);
        buf.fill_rect(x + col, y0, 1, y1 - y0, c);
    }
    let lip = (w / 8).max(1);
    let cap_w = w + 2 * lip;
    let cap_top = if rim <= y0 { rim } else { rim - cap_h };
    for col in 0..cap_w {
        let c = pipe_shade(col, cap_w);
        buf.fill_rect(x - lip + col, cap_top, 1, cap_h, c);
    }
    buf.fill_rect(x - lip, cap_top, cap_w, 1, PIPE_RIM);
    buf.fill_rect(x - lip, cap_top + cap_h - 1, cap_w, 1, PIPE_RIM);
}

fn draw_tube(buf: &mut PixelBuf, view: &View, tube: &Tube) {
    let (x, upper_y, w, upper_h) = view.rect(&tube.upper_rect());
    let (_, lower_y, _, lower_h) = view.rect(&tube.lower_rect());
    let cap_h = (w / 3).max(2);
    let gap_top = upper_y + upper_h;

    draw_pipe(buf, x, w, (upper_y, gap_top), gap_top, cap_h);
    draw_pipe(buf, x, w, (lower_y, lower_y + lower_h), lower_y, cap_h);
}

fn draw_bird(buf: &mut PixelBuf, view: &View, player: &Player, frame: u64, body: Rgb) {
    let (x, y, w, h) = view.rect(&player.bounding_box());

    buf.fill_rect(x, y, w, h, body);
    buf.fill_rect(x + 1, y, (w - 2).max(1), 1, BIRD_CROWN);

    // Wing flaps every few frames.
    let wing_y = if frame % 8 < 4 { y + h / 3 } else { y + h / 2 };
    buf.fill_rect(x, wing_y, (w / 2).max(1), (h / 3).max(1), BIRD_WING);

    let eye = (w / 5).max(1);
    let ex = x + w - eye * 2;
    buf.fill_rect(ex, y + 1, eye, eye, BIRD_EYE);
    buf.set(ex + eye - 1, y + eye, BIRD_PUPIL);

    let beak_h = (h / 3).max(1);
    buf.fill_rect(x + w, y + h / 2 - beak_h / 2, (w / 4).max(1), beak_h, BIRD_BEAK);
}

fn draw_sight_lines(buf: &mut PixelBuf, view: &View, player: &Player, tube: &Tube) {
    let lines = sight_lines(&player.bounding_box(), &tube.lower_rect(), &tube.upper_rect());
    for (i, (from, to)) in lines.into_iter().enumerate() {
        let c = if i % 2 == 0 { LINE_LOWER } else { LINE_UPPER };
        buf.line(view.point(from), view.point(to), c);
    }
}

/// Dimmed world under a panel with the round's score and the session best.
fn draw_game_over(buf: &mut PixelBuf, score: usize, best: usize) {
    buf.dim();

    let (w, h) = ((buf.w as i32 / 3).max(30), (buf.h as i32 / 4).max(16));
    let (cx, top) = (buf.w as i32 / 2, (buf.h as i32 - h) / 2);
    let left = cx - w / 2;
    buf.fill_rect(left - 1, top - 1, w + 2, h + 2, SHADOW);
    buf.fill_rect(left, top, w, h, PANEL[0]);
    buf.fill_rect(left + 1, top + 1, w - 2, h - 2, PANEL[1]);

    draw_number(buf, cx, top + 4, score, WHITE);
    draw_number(buf, cx, top + 12, best, GOLD);
}
