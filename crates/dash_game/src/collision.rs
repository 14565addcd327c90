//! Screen-space box geometry shared by the player, entities and spawner.
//!
//! Boxes are stored top-left with y growing downward, the same space the
//! renderer draws in. Overlap tests are strict: boxes that only touch along an
//! edge do not collide, which is what lets the player stand exactly on top of a
//! stair without registering a side hit.

use glam::DVec2;

/// How far below a platform's top edge the player's feet may already be and
/// still count as landing on it.
pub const LANDING_TOLERANCE: f64 = 15.0;
const TUMBLE_MARGIN: f64 = 10.0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Aabb {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Aabb {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn square(x: f64, y: f64, size: f64) -> Self {
        Self::new(x, y, size, size)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> DVec2 {
        DVec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Distance between top-left corners; the spawner spaces entities by it.
    pub fn origin_distance(&self, other: &Aabb) -> f64 {
        DVec2::new(self.x, self.y).distance(DVec2::new(other.x, other.y))
    }
}

pub fn boxes_overlap(a: &Aabb, b: &Aabb) -> bool {
    horizontal_overlap(a, b) && a.y < b.bottom() && a.bottom() > b.y
}

/// Pickup test. `a` (the player) uses the inscribed radius of its shorter
/// side, `b` (the collectible) half its width.
pub fn circular_overlap(a: &Aabb, b: &Aabb) -> bool {
    let radius_a = a.width.min(a.height) / 2.0;
    let radius_b = b.width / 2.0;
    a.center().distance(b.center()) <= radius_a + radius_b
}

pub fn landing_check(player: &Aabb, velocity_y: f64, platform: &Aabb) -> bool {
    let feet = player.bottom();
    horizontal_overlap(player, platform)
        && feet >= platform.y
        && feet <= platform.y + LANDING_TOLERANCE
        && velocity_y > 0.0
}

pub fn side_collision_check(player: &Aabb, velocity_y: f64, platform: &Aabb) -> bool {
    boxes_overlap(player, platform) && !landing_check(player, velocity_y, platform)
}

/// Player has sunk to within a few units of the platform's base while not
/// rising. The session does not dispatch it.
pub fn tumble_check(player: &Aabb, velocity_y: f64, platform: &Aabb) -> bool {
    horizontal_overlap(player, platform)
        && player.bottom() > platform.bottom() - TUMBLE_MARGIN
        && velocity_y >= 0.0
}

fn horizontal_overlap(a: &Aabb, b: &Aabb) -> bool {
    a.x < b.right() && a.right() > b.x
}
