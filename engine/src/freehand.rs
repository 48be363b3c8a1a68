//! Variable-width "perfect freehand" stroke outlines.
//!
//! A stroke is turned into a closed polygon tracing the edge of a brush whose
//! radius follows the (real or simulated) pen pressure. The polygon is meant to
//! be filled, usually after converting it to path data with
//! [`svg_path_from_outline`](crate::geometry::svg_path_from_outline).

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::action::InkPoint;
use crate::geometry::{distance, Vec2};

const RATE_OF_PRESSURE_CHANGE: f64 = 0.275;
// Plain PI leaves a visible seam on browser canvases.
const FIXED_PI: f64 = PI + 0.0001;
const END_NOISE_LENGTH: f64 = 3.0;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Easing {
    #[default]
    Linear,
    EaseOutSine,
    EaseOutQuad,
    EaseOutCubic,
}

impl Easing {
    pub fn apply(self, t: f64) -> f64 {
        match self {
            Easing::Linear => t,
            Easing::EaseOutSine => (t * PI / 2.0).sin(),
            Easing::EaseOutQuad => t * (2.0 - t),
            Easing::EaseOutCubic => {
                let t = t - 1.0;
                t * t * t + 1.0
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TaperOptions {
    pub cap: bool,
    pub taper: f64,
    pub easing: Easing,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeOptions {
    pub size: f64,
    pub thinning: f64,
    pub smoothing: f64,
    pub streamline: f64,
    pub easing: Easing,
    pub simulate_pressure: bool,
    pub start: TaperOptions,
    pub end: TaperOptions,
    /// The stroke is complete: the final input point is used verbatim and the
    /// tip is closed.
    pub last: bool,
    /// Emit a round dot for strokes that never moved.
    pub convert_dot_strokes: bool,
}

impl Default for StrokeOptions {
    fn default() -> Self {
        Self {
            size: 16.0,
            thinning: 0.5,
            smoothing: 0.5,
            streamline: 0.5,
            easing: Easing::Linear,
            simulate_pressure: true,
            start: TaperOptions {
                cap: true,
                taper: 0.0,
                easing: Easing::EaseOutQuad,
            },
            end: TaperOptions {
                cap: true,
                taper: 0.0,
                easing: Easing::EaseOutCubic,
            },
            last: false,
            convert_dot_strokes: false,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct StrokePoint {
    pub point: Vec2,
    pub pressure: f64,
    pub vector: Vec2,
    pub distance: f64,
    pub running_length: f64,
}

pub fn get_stroke(points: &[InkPoint], options: &StrokeOptions) -> Vec<Vec2> {
    stroke_outline(&stroke_points(points, options), options)
}

/// Streamlines raw input into evenly spaced points carrying direction and
/// running length.
pub fn stroke_points(points: &[InkPoint], options: &StrokeOptions) -> Vec<StrokePoint> {
    if points.is_empty() {
        return Vec::new();
    }
    let t = 0.15 + (1.0 - options.streamline) * 0.85;

    let mut pts: Vec<(Vec2, f64)> = points
        .iter()
        .map(|point| (point.position(), point.pressure))
        .collect();
    // Pad short inputs so tapers and caps have something to work with.
    if pts.len() == 2 {
        let (first, first_pressure) = pts[0];
        let (last, last_pressure) = pts[1];
        pts.truncate(1);
        for i in 1..5u32 {
            let mix = f64::from(i) / 4.0;
            pts.push((
                first.lerp(last, mix),
                first_pressure + (last_pressure - first_pressure) * mix,
            ));
        }
    }
    if pts.len() == 1 {
        let (point, pressure) = pts[0];
        pts.push((point + Vec2::new(1.0, 1.0), pressure));
    }

    let mut result = vec![StrokePoint {
        point: pts[0].0,
        pressure: if pts[0].1 >= 0.0 { pts[0].1 } else { 0.25 },
        vector: Vec2::new(1.0, 1.0),
        distance: 0.0,
        running_length: 0.0,
    }];
    let mut reached_minimum_length = false;
    let mut running_length = 0.0;
    let mut prev = result[0];
    let max = pts.len() - 1;

    for (i, &(input, pressure)) in pts.iter().enumerate().skip(1) {
        let point = if options.last && i == max {
            input
        } else {
            prev.point.lerp(input, t)
        };
        if point == prev.point {
            continue;
        }
        let step = distance(point, prev.point);
        running_length += step;
        if i < max && !reached_minimum_length {
            if running_length < options.size {
                continue;
            }
            reached_minimum_length = true;
        }
        prev = StrokePoint {
            point,
            pressure: if pressure >= 0.0 { pressure } else { 0.5 },
            vector: (prev.point - point).unit(),
            distance: step,
            running_length,
        };
        result.push(prev);
    }

    result[0].vector = result.get(1).map(|second| second.vector).unwrap_or_default();
    result
}

fn stroke_radius(size: f64, thinning: f64, pressure: f64, easing: Easing) -> f64 {
    size * easing.apply(0.5 - thinning * (0.5 - pressure))
}

fn simulated_pressure(previous: f64, step: f64, size: f64) -> f64 {
    let speed = (step / size).min(1.0);
    let rate = (1.0 - speed).min(1.0);
    (previous + (rate - previous) * (speed * RATE_OF_PRESSURE_CHANGE)).min(1.0)
}

/// Traces the left and right edges of the brush along `points` and closes
/// them with caps, in drawing order: left side, end cap, right side reversed,
/// start cap.
pub fn stroke_outline(points: &[StrokePoint], options: &StrokeOptions) -> Vec<Vec2> {
    let size = options.size;
    if points.is_empty() || size <= 0.0 {
        return Vec::new();
    }
    let first = points[0];
    let last = points[points.len() - 1];
    let total_length = last.running_length;
    let min_distance = (size * options.smoothing).powi(2);
    let taper_start = options.start.taper;
    let taper_end = options.end.taper;

    let mut left: Vec<Vec2> = Vec::new();
    let mut right: Vec<Vec2> = Vec::new();

    // Averaging the first few pressures keeps strokes from starting fat.
    let mut prev_pressure = points.iter().take(10).fold(first.pressure, |acc, current| {
        let pressure = if options.simulate_pressure {
            simulated_pressure(acc, current.distance, size)
        } else {
            current.pressure
        };
        (acc + pressure) / 2.0
    });

    let mut radius = stroke_radius(size, options.thinning, last.pressure, options.easing);
    let mut first_radius: Option<f64> = None;
    let mut prev_vector = first.vector;
    let mut pl = first.point;
    let mut pr = pl;
    let mut tl = pl;
    let mut tr = pr;

    for (i, current) in points.iter().enumerate() {
        let is_last = i == points.len() - 1;
        if !is_last && total_length - current.running_length < END_NOISE_LENGTH {
            continue;
        }

        let mut pressure = current.pressure;
        if options.thinning != 0.0 {
            if options.simulate_pressure {
                pressure = simulated_pressure(prev_pressure, current.distance, size);
            }
            radius = stroke_radius(size, options.thinning, pressure, options.easing);
        } else {
            radius = size / 2.0;
        }
        if first_radius.is_none() {
            first_radius = Some(radius);
        }

        let start_strength = if current.running_length < taper_start {
            options
                .start
                .easing
                .apply(current.running_length / taper_start)
        } else {
            1.0
        };
        let end_strength = if total_length - current.running_length < taper_end {
            options
                .end
                .easing
                .apply((total_length - current.running_length) / taper_end)
        } else {
            1.0
        };
        radius = (radius * start_strength.min(end_strength)).max(0.01);

        if is_last {
            let offset = current.vector.perpendicular() * radius;
            left.push(current.point - offset);
            right.push(current.point + offset);
            continue;
        }

        let next_vector = points[i + 1].vector;
        let next_dot = current.vector.dot(next_vector);

        if next_dot < 0.0 {
            // Sharp turn: sweep a round cap around the corner point.
            let offset = prev_vector.perpendicular() * radius;
            for step in 0..=13u32 {
                let t = f64::from(step) / 13.0;
                tl = (current.point - offset).rotate_around(current.point, FIXED_PI * t);
                left.push(tl);
                tr = (current.point + offset).rotate_around(current.point, FIXED_PI * -t);
                right.push(tr);
            }
            pl = tl;
            pr = tr;
            continue;
        }

        let offset = next_vector.lerp(current.vector, next_dot).perpendicular() * radius;
        tl = current.point - offset;
        if i <= 1 || (pl - tl).length_squared() > min_distance {
            left.push(tl);
            pl = tl;
        }
        tr = current.point + offset;
        if i <= 1 || (pr - tr).length_squared() > min_distance {
            right.push(tr);
            pr = tr;
        }

        prev_pressure = pressure;
        prev_vector = current.vector;
    }

    let first_point = first.point;
    let last_point = if points.len() > 1 {
        last.point
    } else {
        first.point + Vec2::new(1.0, 1.0)
    };

    if options.convert_dot_strokes && points.len() == 1 {
        if (taper_start == 0.0 && taper_end == 0.0) || options.last {
            let start = first_point
                + (first_point - last_point).perpendicular().unit()
                    * -first_radius.unwrap_or(radius);
            return (1..=13u32)
                .map(|step| {
                    let t = f64::from(step) / 13.0;
                    start.rotate_around(first_point, FIXED_PI * 2.0 * t)
                })
                .collect();
        }
    }

    let mut start_cap = Vec::new();
    if taper_start != 0.0 || (taper_end != 0.0 && points.len() == 1) {
        // Tapered start, no cap.
    } else if options.start.cap {
        if let Some(&anchor) = right.first() {
            for step in 1..=13u32 {
                let t = f64::from(step) / 13.0;
                start_cap.push(anchor.rotate_around(first_point, FIXED_PI * t));
            }
        }
    } else if let (Some(&l), Some(&r)) = (left.first(), right.first()) {
        let corners = l - r;
        let offset_a = corners * 0.5;
        let offset_b = corners * 0.51;
        start_cap.extend([
            first_point - offset_a,
            first_point - offset_b,
            first_point + offset_b,
            first_point + offset_a,
        ]);
    }

    let mut end_cap = Vec::new();
    let direction = (-last.vector).perpendicular();
    if taper_end != 0.0 || (taper_start != 0.0 && points.len() == 1) {
        end_cap.push(last_point);
    } else if options.end.cap {
        // One and a half turns so sharp final hooks still get a full cap.
        let start = last_point + direction * radius;
        for step in 1..29u32 {
            let t = f64::from(step) / 29.0;
            end_cap.push(start.rotate_around(last_point, FIXED_PI * 3.0 * t));
        }
    } else {
        end_cap.extend([
            last_point + direction * radius,
            last_point + direction * (radius * 0.99),
            last_point - direction * (radius * 0.99),
            last_point - direction * radius,
        ]);
    }

    right.reverse();
    left.extend(end_cap);
    left.extend(right);
    left.extend(start_cap);
    left
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(coords: &[(f64, f64)], pressure: f64) -> Vec<InkPoint> {
        coords
            .iter()
            .map(|&(x, y)| InkPoint::new(x, y, pressure, 4.0))
            .collect()
    }

    #[test]
    fn empty_input_gives_empty_outline() {
        assert!(get_stroke(&[], &StrokeOptions::default()).is_empty());
    }

    #[test]
    fn zero_size_gives_empty_outline() {
        let options = StrokeOptions {
            size: 0.0,
            ..StrokeOptions::default()
        };
        assert!(get_stroke(&samples(&[(0.0, 0.0), (10.0, 0.0)], 0.5), &options).is_empty());
    }

    #[test]
    fn single_point_is_padded() {
        let points = stroke_points(&samples(&[(5.0, 5.0)], 0.5), &StrokeOptions::default());
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].point, Vec2::new(5.0, 5.0));
    }

    #[test]
    fn dot_conversion_emits_circle() {
        let options = StrokeOptions {
            convert_dot_strokes: true,
            last: true,
            size: 8.0,
            ..StrokeOptions::default()
        };
        // Every later point collapses onto the first so only one stroke point survives.
        let mut points = stroke_points(&samples(&[(5.0, 5.0)], 0.5), &options);
        points.truncate(1);
        let outline = stroke_outline(&points, &options);
        assert_eq!(outline.len(), 13);
        let center = Vec2::new(5.0, 5.0);
        let first = distance(outline[0], center);
        for point in &outline {
            assert!((distance(*point, center) - first).abs() < 1e-6);
        }
    }

    #[test]
    fn outline_surrounds_straight_stroke() {
        let coords: Vec<(f64, f64)> = (0..20).map(|i| (f64::from(i) * 5.0, 50.0)).collect();
        let options = StrokeOptions {
            size: 8.0,
            last: true,
            simulate_pressure: false,
            ..StrokeOptions::default()
        };
        let outline = get_stroke(&samples(&coords, 0.5), &options);
        assert!(outline.len() > 4);
        let above = outline.iter().any(|p| p.y < 50.0 - 1.0);
        let below = outline.iter().any(|p| p.y > 50.0 + 1.0);
        assert!(above && below);
        for point in &outline {
            assert!((point.y - 50.0).abs() <= 8.0 + 1e-6);
        }
    }

    #[test]
    fn complete_stroke_ends_on_final_input() {
        let coords = [(0.0, 0.0), (30.0, 0.0), (60.0, 0.0), (90.0, 0.0)];
        let options = StrokeOptions {
            size: 4.0,
            last: true,
            ..StrokeOptions::default()
        };
        let points = stroke_points(&samples(&coords, 0.5), &options);
        assert_eq!(points.last().map(|p| p.point), Some(Vec2::new(90.0, 0.0)));
        let live = stroke_points(
            &samples(&coords, 0.5),
            &StrokeOptions {
                last: false,
                ..options
            },
        );
        assert!(live.last().map(|p| p.point.x).unwrap_or_default() < 90.0);
    }

    #[test]
    fn easings_hit_endpoints() {
        for easing in [
            Easing::Linear,
            Easing::EaseOutSine,
            Easing::EaseOutQuad,
            Easing::EaseOutCubic,
        ] {
            assert!(easing.apply(0.0).abs() < 1e-12);
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-12);
        }
    }
}
