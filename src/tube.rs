use crate::config::WorldConfig;
use crate::geometry::Rect;

/// A pair of tube segments sharing one x, with a passable opening between
/// them. The opening is fixed at construction.
#[derive(Debug, Clone)]
pub struct Tube {
    x: f64,
    lower_y: f64,
    upper_y: f64,
    pub gap_offset: i32,
    pub velocity_x: f64,
    width: f64,
    height: f64,
}

impl Tube {
    /// Build a tube at `x`. `gap_baseline` is half the opening; `gap_offset`
    /// shifts the opening down (positive) or up (negative).
    pub fn new(
        world: &WorldConfig,
        x: f64,
        gap_baseline: f64,
        horizontal_velocity: f64,
        gap_offset: i32,
    ) -> Self {
        let height = world.tube_height();
        let offset = f64::from(gap_offset);
        let lower_h = gap_baseline + offset;
        let upper_h = gap_baseline - offset;
        Self {
            x,
            lower_y: world.height - height + lower_h,
            upper_y: -upper_h,
            gap_offset,
            velocity_x: world.base_tube_velocity + horizontal_velocity,
            width: world.tube_width,
            height,
        }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn lower_rect(&self) -> Rect {
        Rect::new(self.x, self.lower_y, self.width, self.height)
    }

    pub fn upper_rect(&self) -> Rect {
        Rect::new(self.x, self.upper_y, self.width, self.height)
    }

    /// Vertical opening between the bottom of the upper segment and the top
    /// of the lower one.
    pub fn gap(&self) -> f64 {
        self.lower_y - (self.upper_y + self.height)
    }

    pub fn is_offscreen(&self) -> bool {
        self.right() < 0.0
    }

    pub fn advance(&mut self, dt: f64) {
        self.x -= self.velocity_x * dt;
    }

    pub fn collides(&self, rect: &Rect) -> bool {
        rect.intersects(&self.lower_rect()) || rect.intersects(&self.upper_rect())
    }
}
