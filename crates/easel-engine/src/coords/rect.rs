use super::Vec2;

/// Axis-aligned rectangle in logical pixels (top-left origin).
///
/// Used as the hit area of hoverable and clickable components.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Builds the rectangle spanning two opposite corners, in any order.
    #[inline]
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self::new(a.x.min(b.x), a.y.min(b.y), (a.x - b.x).abs(), (a.y - b.y).abs())
    }

    #[inline]
    pub fn center(self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    #[inline]
    pub fn translated(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Flips negative extents so width/height are non-negative.
    #[inline]
    pub fn normalized(self) -> Self {
        let (x, width) = if self.width < 0.0 { (self.x + self.width, -self.width) } else { (self.x, self.width) };
        let (y, height) = if self.height < 0.0 { (self.y + self.height, -self.height) } else { (self.y, self.height) };
        Self::new(x, y, width, height)
    }

    /// Half-open containment: `[min, max)` on both axes.
    #[inline]
    pub fn contains(self, x: f32, y: f32) -> bool {
        let r = self.normalized();
        x >= r.x && y >= r.y && x < r.x + r.width && y < r.y + r.height
    }

    #[inline]
    pub fn contains_point(self, p: Vec2) -> bool {
        self.contains(p.x, p.y)
    }
}
