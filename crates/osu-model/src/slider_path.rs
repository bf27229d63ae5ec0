use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::math::Vector2;

/// Samples per Catmull span
const CURVE_SAMPLES: usize = 50;
/// Max distance between an arc and its chords, in osu!pixels
const CIRCULAR_ARC_TOLERANCE: f64 = 0.1;
/// Arcs needing this many points are approximated as Bezier instead
const MAX_CIRCULAR_ARC_POINTS: usize = 1000;
/// Max second difference of a flat Bezier piece, in osu!pixels
const BEZIER_TOLERANCE: f32 = 0.25;
const MAX_BEZIER_SUBDIVISIONS: usize = 1024;
/// Control-point lerps a single Bezier segment may spend on subdivision
const BEZIER_WORK_BUDGET: usize = 1 << 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathType {
    Linear,
    PerfectCurve,
    Bezier,
    Catmull,
}

impl PathType {
    /// Curve type letter from the slider's curve field. Unknown letters are Bezier.
    pub fn from_char(c: char) -> Self {
        match c {
            'L' => Self::Linear,
            'P' => Self::PerfectCurve,
            'C' => Self::Catmull,
            _ => Self::Bezier,
        }
    }
}

/// Approximated slider body, relative to the slider head.
///
/// The polyline is truncated or extended so its length equals the
/// expected distance written in the chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliderPath {
    pub path_type: PathType,
    pub control_points: Vec<Vector2>,
    pub expected_distance: f64,
    #[serde(skip)]
    path: Vec<Vector2>,
    #[serde(skip)]
    cumulative_length: Vec<f64>,
}

impl SliderPath {
    pub fn new(path_type: PathType, control_points: Vec<Vector2>, expected_distance: f64) -> Self {
        let mut path = match path_type {
            PathType::Linear => control_points.clone(),
            PathType::PerfectCurve => approximate_circular_arc(&control_points)
                .unwrap_or_else(|| approximate_bezier(&control_points)),
            PathType::Bezier => approximate_bezier(&control_points),
            PathType::Catmull => approximate_catmull(&control_points),
        };
        path.dedup();

        let cumulative_length = fit_to_distance(&mut path, &control_points, expected_distance);

        Self {
            path_type,
            control_points,
            expected_distance,
            path,
            cumulative_length,
        }
    }

    /// Length of the fitted path
    pub fn distance(&self) -> f64 {
        self.cumulative_length.last().copied().unwrap_or(0.0)
    }

    /// Approximated vertices after fitting
    pub fn vertices(&self) -> &[Vector2] {
        &self.path
    }

    /// Position at `progress` in [0, 1] along the path. Values outside are clamped.
    pub fn position_at(&self, progress: f64) -> Vector2 {
        let d = progress.clamp(0.0, 1.0) * self.distance();
        let index = match self.cumulative_length.binary_search_by(|l| l.total_cmp(&d)) {
            Ok(i) | Err(i) => i,
        };
        self.interpolate(index, d)
    }

    fn interpolate(&self, index: usize, d: f64) -> Vector2 {
        let Some(&last) = self.path.last() else {
            return Vector2::ZERO;
        };
        if index == 0 {
            return self.path[0];
        }
        if index >= self.path.len() {
            return last;
        }

        let p0 = self.path[index - 1];
        let p1 = self.path[index];
        let d0 = self.cumulative_length[index - 1];
        let d1 = self.cumulative_length[index];
        if (d1 - d0).abs() < 1e-7 {
            return p0;
        }
        let w = ((d - d0) / (d1 - d0)) as f32;
        p0 + (p1 - p0) * w
    }
}

/// Trim or extend the last segment so the path length matches `expected`,
/// returning the cumulative length at each remaining vertex.
fn fit_to_distance(path: &mut Vec<Vector2>, control_points: &[Vector2], expected: f64) -> Vec<f64> {
    let mut cumulative = Vec::with_capacity(path.len());
    let mut calculated = 0.0;
    if !path.is_empty() {
        cumulative.push(0.0);
    }
    for pair in path.windows(2) {
        calculated += pair[0].distance(pair[1]) as f64;
        cumulative.push(calculated);
    }

    if path.is_empty() || calculated == expected {
        return cumulative;
    }

    // Stable never extends a path whose last two control points coincide
    if let [.., a, b] = control_points
        && a == b
        && expected > calculated
    {
        return cumulative;
    }

    cumulative.pop();
    let mut end = path.len() - 1;

    if calculated > expected {
        while cumulative.last().is_some_and(|&l| l >= expected) {
            cumulative.pop();
            path.pop();
            end -= 1;
        }
    }

    if end == 0 {
        path.truncate(1);
        return vec![0.0];
    }

    let last_length = cumulative.last().copied().unwrap_or(0.0);
    let dir = (path[end] - path[end - 1]).normalize();
    path[end] = path[end - 1] + dir * (expected - last_length) as f32;
    cumulative.push(expected);
    cumulative
}

/// Bezier segments are split where a control point repeats.
fn approximate_bezier(points: &[Vector2]) -> Vec<Vector2> {
    let mut out = Vec::new();
    let mut start = 0;
    for i in 1..=points.len() {
        let split = i == points.len() || (i + 1 < points.len() && points[i] == points[i + 1]);
        if !split {
            continue;
        }
        let segment = &points[start..=i.min(points.len() - 1)];
        match segment.len() {
            0 => {}
            1 | 2 => out.extend_from_slice(segment),
            _ => approximate_bezier_segment(segment, &mut out),
        }
        start = i + 1;
    }
    out
}

/// Adaptive subdivision until every piece is flat within [`BEZIER_TOLERANCE`].
///
/// Each subdivision costs O(n²) in the control point count, so the number of
/// subdivisions is capped by [`BEZIER_WORK_BUDGET`]. Pieces left over when the
/// cap is hit are flattened as they are.
fn approximate_bezier_segment(points: &[Vector2], out: &mut Vec<Vector2>) {
    let count = points.len();
    let max_subdivisions =
        (BEZIER_WORK_BUDGET / count.saturating_mul(count)).min(MAX_BEZIER_SUBDIVISIONS);
    let mut subdivisions = 0;
    let mut pending = vec![points.to_vec()];

    while let Some(piece) = pending.pop() {
        if subdivisions >= max_subdivisions || is_flat(&piece) {
            flatten(&piece, out);
            continue;
        }
        let (left, right) = subdivide(&piece);
        subdivisions += 1;
        pending.push(right);
        pending.push(left);
    }
    out.extend(points.last().copied());
}

fn is_flat(points: &[Vector2]) -> bool {
    let limit = BEZIER_TOLERANCE * BEZIER_TOLERANCE * 4.0;
    points
        .windows(3)
        .all(|w| (w[0] - w[1] * 2.0 + w[2]).length_squared() <= limit)
}

/// Split at t = 0.5 into two curves of the same degree.
fn subdivide(points: &[Vector2]) -> (Vec<Vector2>, Vec<Vector2>) {
    let count = points.len();
    let mut mid = points.to_vec();
    let mut left = Vec::with_capacity(count);
    let mut right = vec![Vector2::ZERO; count];
    for i in 0..count {
        left.push(mid[0]);
        right[count - i - 1] = mid[count - i - 1];
        for j in 0..count - i - 1 {
            mid[j] = (mid[j] + mid[j + 1]) * 0.5;
        }
    }
    (left, right)
}

/// Emit a flat piece without its end point, which the next piece starts on.
fn flatten(points: &[Vector2], out: &mut Vec<Vector2>) {
    let count = points.len();
    let (mut joined, right) = subdivide(points);
    joined.extend_from_slice(&right[1..]);

    out.push(points[0]);
    for i in 1..count - 1 {
        let index = 2 * i;
        out.push((joined[index - 1] + joined[index] * 2.0 + joined[index + 1]) * 0.25);
    }
}

/// Circle arc through three points, `None` when they are degenerate.
fn approximate_circular_arc(points: &[Vector2]) -> Option<Vec<Vector2>> {
    let [a, b, c] = points else {
        return None;
    };
    let (ax, ay) = (a.x as f64, a.y as f64);
    let (bx, by) = (b.x as f64, b.y as f64);
    let (cx, cy) = (c.x as f64, c.y as f64);

    let d = 2.0 * (ax * (by - cy) + bx * (cy - ay) + cx * (ay - by));
    if d.abs() < 1e-3 {
        return None;
    }

    let a_sq = ax * ax + ay * ay;
    let b_sq = bx * bx + by * by;
    let c_sq = cx * cx + cy * cy;
    let centre_x = (a_sq * (by - cy) + b_sq * (cy - ay) + c_sq * (ay - by)) / d;
    let centre_y = (a_sq * (cx - bx) + b_sq * (ax - cx) + c_sq * (bx - ax)) / d;
    let radius = ((ax - centre_x).powi(2) + (ay - centre_y).powi(2)).sqrt();

    let theta_start = (ay - centre_y).atan2(ax - centre_x);
    let mut theta_end = (cy - centre_y).atan2(cx - centre_x);
    while theta_end < theta_start {
        theta_end += 2.0 * PI;
    }

    let mut direction = 1.0;
    let mut theta_range = theta_end - theta_start;

    // Go the other way round when b lies on the far side of a->c
    let ortho_x = cy - ay;
    let ortho_y = -(cx - ax);
    if ortho_x * (bx - ax) + ortho_y * (by - ay) < 0.0 {
        direction = -1.0;
        theta_range = 2.0 * PI - theta_range;
    }

    let amount = if 2.0 * radius <= CIRCULAR_ARC_TOLERANCE {
        2
    } else {
        let step = 2.0 * (1.0 - CIRCULAR_ARC_TOLERANCE / radius).acos();
        // Radius so large the tolerance vanishes
        if !(step.is_finite() && step > 0.0) {
            return None;
        }
        let amount = (theta_range / step).ceil();
        if amount >= MAX_CIRCULAR_ARC_POINTS as f64 {
            return None;
        }
        (amount as usize).max(2)
    };

    let arc = (0..amount)
        .map(|i| {
            let fract = i as f64 / (amount - 1) as f64;
            let theta = theta_start + direction * fract * theta_range;
            Vector2::new(
                (centre_x + radius * theta.cos()) as f32,
                (centre_y + radius * theta.sin()) as f32,
            )
        })
        .collect();
    Some(arc)
}

fn approximate_catmull(points: &[Vector2]) -> Vec<Vector2> {
    if points.len() < 2 {
        return points.to_vec();
    }

    let mut out = Vec::with_capacity((points.len() - 1) * CURVE_SAMPLES + 1);
    for i in 0..points.len() - 1 {
        let v1 = if i > 0 { points[i - 1] } else { points[i] };
        let v2 = points[i];
        let v3 = points[i + 1];
        let v4 = if i + 2 < points.len() {
            points[i + 2]
        } else {
            v3 + v3 - v2
        };

        for s in 0..CURVE_SAMPLES {
            out.push(catmull_point(v1, v2, v3, v4, s as f32 / CURVE_SAMPLES as f32));
        }
    }
    out.extend(points.last().copied());
    out
}

fn catmull_point(v1: Vector2, v2: Vector2, v3: Vector2, v4: Vector2, t: f32) -> Vector2 {
    let t2 = t * t;
    let t3 = t2 * t;
    let axis = |p1: f32, p2: f32, p3: f32, p4: f32| {
        0.5 * (2.0 * p2
            + (-p1 + p3) * t
            + (2.0 * p1 - 5.0 * p2 + 4.0 * p3 - p4) * t2
            + (-p1 + 3.0 * p2 - 3.0 * p3 + p4) * t3)
    };
    Vector2::new(
        axis(v1.x, v2.x, v3.x, v4.x),
        axis(v1.y, v2.y, v3.y, v4.y),
    )
}
