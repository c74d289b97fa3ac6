use std::ops::{Add, Mul, Sub};

use super::Float;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2 {
    pub x: Float,
    pub y: Float,
}

impl Vector2 {
    pub fn new(x: Float, y: Float) -> Self {
        Vector2 { x, y }
    }

    pub fn dot(self, other: Vector2) -> Float {
        self.x * other.x + self.y * other.y
    }

    pub fn length(self) -> Float {
        self.dot(self).sqrt()
    }
}

impl Add for Vector2 {
    type Output = Vector2;
    fn add(self, o: Vector2) -> Vector2 {
        Vector2::new(self.x + o.x, self.y + o.y)
    }
}

impl Sub for Vector2 {
    type Output = Vector2;
    fn sub(self, o: Vector2) -> Vector2 {
        Vector2::new(self.x - o.x, self.y - o.y)
    }
}

impl Mul<Float> for Vector2 {
    type Output = Vector2;
    fn mul(self, s: Float) -> Vector2 {
        Vector2::new(self.x * s, self.y * s)
    }
}
