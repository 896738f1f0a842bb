use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in stage space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl Rect {
    pub fn from_center(center_x: f32, bottom_y: f32, width: f32, height: f32) -> Self {
        Self {
            x_min: center_x - width / 2.0,
            y_min: bottom_y,
            x_max: center_x + width / 2.0,
            y_max: bottom_y + height,
        }
    }

    pub fn width(&self) -> f32 {
        self.x_max - self.x_min
    }

    /// Strict overlap; touching edges do not count.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x_max > other.x_min
            && self.x_min < other.x_max
            && self.y_max > other.y_min
            && self.y_min < other.y_max
    }

    /// Center of the intersection of two overlapping rectangles.
    pub fn intersection_midpoint(&self, other: &Rect) -> Vec2 {
        let x1 = self.x_max.min(other.x_max);
        let x2 = self.x_min.max(other.x_min);
        let y1 = self.y_max.min(other.y_max);
        let y2 = self.y_min.max(other.y_min);
        Vec2::new((x1 + x2) / 2.0, (y1 + y2) / 2.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hitbox {
    pub rect: Rect,
    pub attack_id: u32,
    /// Proximity boxes only trigger proximity guard; they never deal damage.
    pub proximity: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hurtbox {
    pub rect: Rect,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_edges_do_not_overlap() {
        let a = Rect::from_center(0.0, 0.0, 1.0, 1.0);
        let b = Rect::from_center(1.0, 0.0, 1.0, 1.0);
        assert!(!a.overlaps(&b));
        let c = Rect::from_center(0.9, 0.0, 1.0, 1.0);
        assert!(a.overlaps(&c));
    }

    #[test]
    fn midpoint_is_center_of_intersection() {
        let a = Rect {
            x_min: 0.0,
            y_min: 0.0,
            x_max: 2.0,
            y_max: 2.0,
        };
        let b = Rect {
            x_min: 1.0,
            y_min: 1.0,
            x_max: 3.0,
            y_max: 4.0,
        };
        assert_eq!(a.intersection_midpoint(&b), Vec2::new(1.5, 1.5));
    }
}
