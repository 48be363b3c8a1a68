use std::fmt::Write;
use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn dot(self, other: Vec2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn length_squared(self) -> f64 {
        self.dot(self)
    }

    /// Perpendicular rotation, `(y, -x)`.
    pub fn perpendicular(self) -> Vec2 {
        Vec2::new(self.y, -self.x)
    }

    /// Unit vector. A zero vector stays zero instead of turning into NaN.
    pub fn unit(self) -> Vec2 {
        let length = self.length();
        if length == 0.0 {
            return Vec2::default();
        }
        self * (1.0 / length)
    }

    pub fn lerp(self, to: Vec2, t: f64) -> Vec2 {
        self + (to - self) * t
    }

    pub fn rotate_around(self, center: Vec2, radians: f64) -> Vec2 {
        let (sin, cos) = radians.sin_cos();
        let p = self - center;
        Vec2::new(p.x * cos - p.y * sin, p.x * sin + p.y * cos) + center
    }

    /// Angle of the vector in `[0, 2π)`.
    pub fn angle(self) -> f64 {
        self.y.atan2(self.x).rem_euclid(std::f64::consts::TAU)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;

    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

impl From<(f64, f64)> for Vec2 {
    fn from((x, y): (f64, f64)) -> Self {
        Vec2::new(x, y)
    }
}

pub fn normalize_point(point: Vec2) -> Option<Vec2> {
    if !point.is_finite() {
        return None;
    }
    Some(point)
}

pub fn midpoint(a: Vec2, b: Vec2) -> Vec2 {
    Vec2::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

pub fn distance(a: Vec2, b: Vec2) -> f64 {
    (b - a).length()
}

pub fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f64 {
    let d = b - a;
    if d.x.abs() < f64::EPSILON && d.y.abs() < f64::EPSILON {
        return distance(p, a);
    }
    let t = ((p - a).dot(d) / d.length_squared()).clamp(0.0, 1.0);
    distance(p, a + d * t)
}

/// Whether segment `a1-a2` crosses segment `b1-b2`, endpoints included.
///
/// Parallel and collinear segments have a zero denominator and never count as
/// crossing, which matches how eraser gestures are expected to behave: sliding
/// exactly along a stroke does not delete it.
pub fn segments_intersect(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> bool {
    let denominator = (b2.y - b1.y) * (a2.x - a1.x) - (b2.x - b1.x) * (a2.y - a1.y);
    if denominator == 0.0 {
        return false;
    }
    let ua = ((b2.x - b1.x) * (a1.y - b1.y) - (b2.y - b1.y) * (a1.x - b1.x)) / denominator;
    let ub = ((a2.x - a1.x) * (a1.y - b1.y) - (a2.y - a1.y) * (a1.x - b1.x)) / denominator;
    (0.0..=1.0).contains(&ua) && (0.0..=1.0).contains(&ub)
}

pub fn polylines_intersect(a: &[Vec2], b: &[Vec2]) -> bool {
    a.windows(2).any(|first| {
        b.windows(2)
            .any(|second| segments_intersect(first[0], first[1], second[0], second[1]))
    })
}

/// Builds SVG path data for a closed outline, smoothing through the midpoints
/// of consecutive outline points.
pub fn svg_path_from_outline(points: &[Vec2]) -> String {
    let Some(first) = points.first().copied() else {
        return String::new();
    };
    let mut path = String::with_capacity(points.len() * 24);
    path.push_str("M ");
    push_pair(&mut path, first);
    path.push_str(" Q");
    let last = points.len() - 1;
    for (index, point) in points.iter().enumerate() {
        let next = if index == last {
            first
        } else {
            points[index + 1]
        };
        path.push(' ');
        push_pair(&mut path, *point);
        path.push(' ');
        push_pair(&mut path, midpoint(*point, next));
    }
    path.push_str(" L ");
    push_pair(&mut path, first);
    path.push_str(" Z");
    path
}

fn push_pair(path: &mut String, point: Vec2) {
    let _ = write!(
        path,
        "{},{}",
        truncate_decimals(point.x),
        truncate_decimals(point.y)
    );
}

/// Drops everything past the second decimal without rounding.
pub fn truncate_decimals(value: f64) -> f64 {
    let truncated = (value * 100.0).trunc() / 100.0;
    if truncated == 0.0 {
        0.0
    } else {
        truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(points: &[(f64, f64)]) -> Vec<Vec2> {
        points.iter().copied().map(Vec2::from).collect()
    }

    #[test]
    fn crossing_diagonals_intersect() {
        let a = line(&[(0.0, 0.0), (10.0, 10.0)]);
        let b = line(&[(0.0, 10.0), (10.0, 0.0)]);
        assert!(polylines_intersect(&a, &b));
    }

    #[test]
    fn collinear_disjoint_segments_do_not_intersect() {
        let a = line(&[(0.0, 0.0), (10.0, 10.0)]);
        let b = line(&[(20.0, 20.0), (30.0, 30.0)]);
        assert!(!polylines_intersect(&a, &b));
    }

    #[test]
    fn touching_endpoint_counts() {
        assert!(segments_intersect(
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, -5.0),
            Vec2::new(10.0, 5.0),
        ));
    }

    #[test]
    fn single_point_polyline_never_intersects() {
        let a = line(&[(5.0, 5.0)]);
        let b = line(&[(0.0, 10.0), (10.0, 0.0)]);
        assert!(!polylines_intersect(&a, &b));
    }

    #[test]
    fn svg_path_closes_back_to_start() {
        let outline = line(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
        assert_eq!(
            svg_path_from_outline(&outline),
            "M 0,0 Q 0,0 5,0 10,0 10,5 10,10 5,5 L 0,0 Z"
        );
    }

    #[test]
    fn svg_path_truncates_to_two_decimals() {
        let outline = line(&[(1.23456, -7.891), (2.0, 2.0)]);
        let path = svg_path_from_outline(&outline);
        assert!(path.starts_with("M 1.23,-7.89 Q"));
        assert!(!path.contains("1.234"));
    }

    #[test]
    fn empty_outline_has_empty_path() {
        assert_eq!(svg_path_from_outline(&[]), "");
    }

    #[test]
    fn distance_to_degenerate_segment_is_point_distance() {
        let d = distance_to_segment(Vec2::new(3.0, 4.0), Vec2::default(), Vec2::default());
        assert_eq!(d, 5.0);
    }
}
