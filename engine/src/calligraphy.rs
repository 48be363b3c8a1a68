//! Curve-fit calligraphy strokes.
//!
//! Raw samples are split at sharp corners, each piece is fitted with a single
//! cubic Bézier by least squares, and the resulting skeleton is rendered by
//! sweeping a round nib along it. The nib presses in at full weight and lifts
//! off over the final piece.

use std::f64::consts::PI;

use crate::geometry::{distance, Vec2};
use crate::surface::Surface;

/// Turns sharper than this (in degrees, measured between the incoming and
/// outgoing chords) split the stroke into separate curve pieces.
pub const CORNER_ANGLE_THRESHOLD: f64 = 135.0;
const LENGTH_SAMPLES: u32 = 50;

/// Nib width over a segment, as a fraction of the stroke weight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WidthProfile {
    /// Full weight with a slight cosine dip mid-segment.
    Press,
    /// Linear lift-off from full weight down to a fifth.
    Release,
}

impl WidthProfile {
    pub fn width_at(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        let (stops, cosine) = match self {
            WidthProfile::Press => ([1.0, 0.7, 1.0], true),
            WidthProfile::Release => ([1.0, 0.8, 0.2], false),
        };
        let (from, to, local) = if t <= 0.5 {
            (stops[0], stops[1], t * 2.0)
        } else {
            (stops[1], stops[2], (t - 0.5) * 2.0)
        };
        let eased = if cosine {
            (1.0 - (local * PI).cos()) / 2.0
        } else {
            local
        };
        from + (to - from) * eased
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubicBezier {
    pub points: [Vec2; 4],
}

impl CubicBezier {
    pub fn new(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2) -> Self {
        Self {
            points: [p0, p1, p2, p3],
        }
    }

    /// Straight segment with control points at a quarter and three quarters.
    pub fn straight(start: Vec2, end: Vec2) -> Self {
        Self::new(start, start.lerp(end, 0.25), start.lerp(end, 0.75), end)
    }

    pub fn start(&self) -> Vec2 {
        self.points[0]
    }

    pub fn end(&self) -> Vec2 {
        self.points[3]
    }

    pub fn point(&self, t: f64) -> Vec2 {
        let [p0, p1, p2, p3] = self.points;
        let u = 1.0 - t;
        p0 * (u * u * u) + p1 * (3.0 * u * u * t) + p2 * (3.0 * u * t * t) + p3 * (t * t * t)
    }

    pub fn length(&self) -> f64 {
        let mut length = 0.0;
        let mut previous = self.start();
        for step in 1..=LENGTH_SAMPLES {
            let point = self.point(f64::from(step) / f64::from(LENGTH_SAMPLES));
            length += distance(previous, point);
            previous = point;
        }
        length
    }

    pub fn tangent(&self, t: f64) -> Vec2 {
        let [p0, p1, p2, p3] = self.points;
        let u = 1.0 - t;
        let derivative =
            (p1 - p0) * (3.0 * u * u) + (p2 - p1) * (6.0 * u * t) + (p3 - p2) * (3.0 * t * t);
        if derivative.length_squared() > 1e-12 {
            derivative.unit()
        } else {
            (p3 - p0).unit()
        }
    }

    /// Polygon covering the nib swept along the curve, with one cross-section
    /// every `resolution` pixels of curve length.
    pub fn swept_outline(&self, weight: f64, resolution: f64, profile: WidthProfile) -> Vec<Vec2> {
        let steps = (self.length() / resolution.max(0.5)).round().max(1.0) as u32;
        let mut left = Vec::with_capacity(steps as usize + 1);
        let mut right = Vec::with_capacity(steps as usize + 1);
        for step in 0..=steps {
            let t = f64::from(step) / f64::from(steps);
            let center = self.point(t);
            let offset = self.tangent(t).perpendicular() * (profile.width_at(t) * weight / 2.0);
            left.push(center + offset);
            right.push(center - offset);
        }
        right.reverse();
        left.extend(right);
        left
    }
}

fn chord_parameters(chord: &[Vec2]) -> Vec<f64> {
    let mut lengths = Vec::with_capacity(chord.len());
    let mut total = 0.0;
    lengths.push(0.0);
    for pair in chord.windows(2) {
        total += distance(pair[0], pair[1]);
        lengths.push(total);
    }
    if total > 0.0 {
        for length in &mut lengths {
            *length /= total;
        }
    }
    lengths
}

/// Least-squares cubic through `chord` with fixed endpoints.
pub fn least_squares_fit(chord: &[Vec2]) -> Option<CubicBezier> {
    let (&start, &end) = (chord.first()?, chord.last()?);
    if chord.len() < 4 {
        return Some(CubicBezier::straight(start, end));
    }
    let ts = chord_parameters(chord);
    let (mut a00, mut a01, mut a11) = (0.0, 0.0, 0.0);
    let (mut r0, mut r1) = (Vec2::default(), Vec2::default());
    for (&t, &point) in ts.iter().zip(chord) {
        let u = 1.0 - t;
        let b1 = 3.0 * u * u * t;
        let b2 = 3.0 * u * t * t;
        let residual = point - start * (u * u * u) - end * (t * t * t);
        a00 += b1 * b1;
        a01 += b1 * b2;
        a11 += b2 * b2;
        r0 = r0 + residual * b1;
        r1 = r1 + residual * b2;
    }
    let Some([c1, c2]) = solve_two(a00, a01, a11, r0, r1) else {
        return Some(CubicBezier::straight(start, end));
    };
    Some(CubicBezier::new(start, c1, c2, end))
}

/// Gaussian elimination with partial pivoting on the symmetric system
/// `[[a00, a01], [a01, a11]] * [c1, c2] = [r0, r1]`, solved for x and y at once.
fn solve_two(a00: f64, a01: f64, a11: f64, r0: Vec2, r1: Vec2) -> Option<[Vec2; 2]> {
    let mut rows = [(a00, a01, r0), (a01, a11, r1)];
    if rows[1].0.abs() > rows[0].0.abs() {
        rows.swap(0, 1);
    }
    let (p00, p01, pr) = rows[0];
    if p00.abs() < 1e-9 {
        return None;
    }
    let factor = rows[1].0 / p00;
    let q11 = rows[1].1 - p01 * factor;
    let qr = rows[1].2 - pr * factor;
    if q11.abs() < 1e-9 {
        return None;
    }
    let c2 = qr * (1.0 / q11);
    let c1 = (pr - c2 * p01) * (1.0 / p00);
    Some([c1, c2])
}

/// Interior sample indices where the stroke turns sharply.
pub fn detect_corners(chord: &[Vec2]) -> Vec<usize> {
    let threshold = CORNER_ANGLE_THRESHOLD.to_radians();
    (1..chord.len().saturating_sub(1))
        .filter(|&i| {
            let incoming = (chord[i - 1] - chord[i]).unit();
            let outgoing = (chord[i + 1] - chord[i]).unit();
            if incoming == Vec2::default() || outgoing == Vec2::default() {
                return false;
            }
            incoming.dot(outgoing).clamp(-1.0, 1.0).acos() <= threshold
        })
        .collect()
}

pub fn fit_stroke(samples: &[Vec2]) -> Vec<CubicBezier> {
    let mut pieces = Vec::new();
    let mut from = 0;
    for corner in detect_corners(samples) {
        pieces.push(&samples[from..=corner]);
        from = corner;
    }
    pieces.push(&samples[from.min(samples.len())..]);
    pieces.into_iter().filter_map(least_squares_fit).collect()
}

#[derive(Clone, Debug, PartialEq)]
pub struct CalligraphyStroke {
    pub segments: Vec<CubicBezier>,
}

impl CalligraphyStroke {
    pub fn fit(samples: &[Vec2]) -> Self {
        Self {
            segments: fit_stroke(samples),
        }
    }

    fn profile(&self, index: usize) -> WidthProfile {
        if self.segments.len() > 1 && index + 1 == self.segments.len() {
            WidthProfile::Release
        } else {
            WidthProfile::Press
        }
    }

    /// Nib stamps at every segment start and at the stroke tip, with the
    /// radius the sweep has at that point.
    pub fn caps(&self, weight: f64) -> Vec<(Vec2, f64)> {
        let mut caps: Vec<(Vec2, f64)> = self
            .segments
            .iter()
            .enumerate()
            .map(|(index, segment)| (segment.start(), self.profile(index).width_at(0.0) * weight / 2.0))
            .collect();
        if let Some(last) = self.segments.last() {
            let profile = self.profile(self.segments.len() - 1);
            caps.push((last.end(), profile.width_at(1.0) * weight / 2.0));
        }
        caps
    }

    pub fn outline(&self, weight: f64, resolution: f64) -> Vec<Vec<Vec2>> {
        self.segments
            .iter()
            .enumerate()
            .map(|(index, segment)| segment.swept_outline(weight, resolution, self.profile(index)))
            .collect()
    }

    /// Fills the stroke with the surface's current fill style.
    pub fn draw(&self, surface: &mut dyn Surface, weight: f64, resolution: f64) {
        for outline in self.outline(weight, resolution) {
            let Some((first, rest)) = outline.split_first() else {
                continue;
            };
            surface.begin_path();
            surface.move_to(first.x, first.y);
            for point in rest {
                surface.line_to(point.x, point.y);
            }
            surface.close_path();
            surface.fill();
        }
        for (center, radius) in self.caps(weight) {
            surface.begin_path();
            surface.arc(center.x, center.y, radius, 0.0, PI * 2.0);
            surface.fill();
        }
    }
}
