//! Tolerant linear overlay on polylines.
//!
//! Border geometry is compared with an XY tolerance: two lines share a
//! stretch when they run within the tolerance of each other, not only when
//! they are bit-identical. All operations here work on the segments of the
//! first operand and describe their result as parameter intervals along
//! those segments, so a result is always made of (sub-segments of) the
//! first operand's coordinates:
//!
//! ```text
//!   a:  o-----------o-----------o
//!   b:        o===========o
//!   a ∩ b:    |-----o-----|          intervals [0.5,1] and [0,0.5]
//!   a − b:  |-|           |-|        complement intervals
//! ```
//!
//! Pieces no longer than the tolerance are dropped.

use crate::geometry::{shape_lines, Envelope};
use geo::{Contains, Euclidean, Length};
use geo_types::{Coord, Geometry, LineString, MultiLineString, Point};

const EPS: f64 = 1e-12;

/// Empty line geometry.
pub fn empty() -> MultiLineString<f64> {
    MultiLineString::new(Vec::new())
}

/// `true` when there is no piece of positive length.
pub fn is_empty(lines: &MultiLineString<f64>) -> bool {
    lines.0.iter().all(|l| l.0.len() < 2)
}

/// Total length.
pub fn length(lines: &MultiLineString<f64>) -> f64 {
    lines.length::<Euclidean>()
}

/// Envelope of the lines. `None` when empty.
pub fn envelope(lines: &MultiLineString<f64>) -> Option<Envelope> {
    if is_empty(lines) {
        None
    } else {
        Envelope::of_lines(lines)
    }
}

/// Portions of `a` running along `b` within `tolerance`.
pub fn intersection(
    a: &MultiLineString<f64>,
    b: &MultiLineString<f64>,
    tolerance: f64,
) -> MultiLineString<f64> {
    if !envelopes_meet(a, b, tolerance) {
        return empty();
    }
    overlay(a, tolerance, |s0, s1| coincident_intervals(s0, s1, b, tolerance))
}

/// Portions of `a` not running along `b` within `tolerance`.
pub fn difference(
    a: &MultiLineString<f64>,
    b: &MultiLineString<f64>,
    tolerance: f64,
) -> MultiLineString<f64> {
    if !envelopes_meet(a, b, tolerance) {
        return drop_short(a.clone(), tolerance);
    }
    overlay(a, tolerance, |s0, s1| {
        complement(&coincident_intervals(s0, s1, b, tolerance))
    })
}

/// `a` plus the portions of `b` not already in `a`, with touching parts
/// chained together.
pub fn union(
    a: &MultiLineString<f64>,
    b: &MultiLineString<f64>,
    tolerance: f64,
) -> MultiLineString<f64> {
    let mut parts = a.0.clone();
    parts.extend(difference(b, a, tolerance).0);
    merge_parts(parts, tolerance)
}

/// Union of many line geometries.
pub fn union_all<'a>(
    lines: impl IntoIterator<Item = &'a MultiLineString<f64>>,
    tolerance: f64,
) -> MultiLineString<f64> {
    lines
        .into_iter()
        .fold(empty(), |acc, next| union(&acc, next, tolerance))
}

/// Portions of `line` within `distance` of `to_buffer`.
///
/// The buffer has flat ends: it is the union of one rectangle per segment
/// of `to_buffer` plus a disc at each interior vertex.
pub fn near_part(
    to_buffer: &MultiLineString<f64>,
    line: &MultiLineString<f64>,
    distance: f64,
) -> MultiLineString<f64> {
    if is_empty(to_buffer) || !envelopes_meet(to_buffer, line, distance) {
        return empty();
    }
    overlay(line, 0.0, |s0, s1| {
        let mut intervals = Vec::new();
        for part in &to_buffer.0 {
            let coords = &part.0;
            for w in coords.windows(2) {
                if let Some(iv) = clip_to_segment_band(s0, s1, w[0], w[1], distance) {
                    intervals.push(iv);
                }
            }
            if coords.len() > 2 {
                for v in &coords[1..coords.len() - 1] {
                    if let Some(iv) = clip_to_disc(s0, s1, *v, distance) {
                        intervals.push(iv);
                    }
                }
            }
        }
        merge_intervals(intervals)
    })
}

/// Minimum distance between two line geometries. Infinite if either is
/// empty.
pub fn distance(a: &MultiLineString<f64>, b: &MultiLineString<f64>) -> f64 {
    let mut best = f64::INFINITY;
    for la in &a.0 {
        for sa in la.0.windows(2) {
            for lb in &b.0 {
                for sb in lb.0.windows(2) {
                    best = best.min(segment_distance(sa[0], sa[1], sb[0], sb[1]));
                    if best == 0.0 {
                        return 0.0;
                    }
                }
            }
        }
    }
    best
}

/// No point of `a` lies within `tolerance` of `b`.
pub fn is_disjoint(a: &MultiLineString<f64>, b: &MultiLineString<f64>, tolerance: f64) -> bool {
    !envelopes_meet(a, b, tolerance) || distance(a, b) > tolerance
}

/// Distance from `lines` to a shape. Zero where the lines run inside an
/// area. Infinite for empty lines and point shapes.
pub fn shape_distance(lines: &MultiLineString<f64>, shape: &Geometry<f64>) -> f64 {
    let Some(outline) = shape_lines(shape) else {
        return f64::INFINITY;
    };
    let inside = lines
        .0
        .iter()
        .filter_map(|l| l.0.first())
        .any(|c| area_contains(shape, Point::from(*c)));
    if inside {
        0.0
    } else {
        distance(lines, &outline)
    }
}

fn area_contains(shape: &Geometry<f64>, p: Point<f64>) -> bool {
    match shape {
        Geometry::Polygon(poly) => poly.contains(&p),
        Geometry::MultiPolygon(mp) => mp.0.iter().any(|poly| poly.contains(&p)),
        Geometry::Rect(rect) => rect.to_polygon().contains(&p),
        Geometry::Triangle(tri) => tri.to_polygon().contains(&p),
        _ => false,
    }
}

/// Distance from a point to the nearest segment of `lines`.
pub fn point_distance(lines: &MultiLineString<f64>, p: Coord<f64>) -> f64 {
    lines
        .0
        .iter()
        .flat_map(|l| l.0.windows(2))
        .map(|s| point_segment_distance(p, s[0], s[1]))
        .fold(f64::INFINITY, f64::min)
}

/// Location on `lines` nearest to `p`. `None` without segments.
pub fn closest_point(lines: &MultiLineString<f64>, p: Coord<f64>) -> Option<Coord<f64>> {
    lines
        .0
        .iter()
        .flat_map(|l| l.0.windows(2))
        .map(|s| project(p, s[0], s[1]))
        .min_by(|a, b| dist(*a, p).total_cmp(&dist(*b, p)))
}

/// `p` lies on `lines` but not at the start or end of any part.
pub fn contains_in_interior(lines: &MultiLineString<f64>, p: Coord<f64>, tolerance: f64) -> bool {
    if point_distance(lines, p) > tolerance {
        return false;
    }
    !lines
        .0
        .iter()
        .filter(|l| l.0.len() >= 2 && !l.is_closed())
        .flat_map(|l| [l.0[0], l.0[l.0.len() - 1]])
        .any(|end| dist(end, p) <= tolerance)
}

/// Split into single-part geometries.
pub fn parts(lines: &MultiLineString<f64>) -> impl Iterator<Item = MultiLineString<f64>> + '_ {
    lines
        .0
        .iter()
        .filter(|l| l.0.len() >= 2)
        .map(|l| MultiLineString::new(vec![l.clone()]))
}

// ============================================================================
// Interval overlay
// ============================================================================

/// Closed parameter interval along a segment, `0.0 <= t0 <= t1 <= 1.0`.
type Interval = (f64, f64);

/// Walk the segments of `a`, keep the intervals produced by `select` and
/// chain them into lines.
fn overlay<F>(a: &MultiLineString<f64>, tolerance: f64, mut select: F) -> MultiLineString<f64>
where
    F: FnMut(Coord<f64>, Coord<f64>) -> Vec<Interval>,
{
    let mut out: Vec<LineString<f64>> = Vec::new();
    for part in &a.0 {
        let part_start = out.len();
        let mut current: Vec<Coord<f64>> = Vec::new();
        for w in part.0.windows(2) {
            let (s0, s1) = (w[0], w[1]);
            let len = dist(s0, s1);
            if len <= EPS {
                continue;
            }
            // snap to the segment ends within the tolerance
            let snap = (tolerance / len).min(0.5);
            let mut continues = true;
            for (mut t0, mut t1) in select(s0, s1) {
                if t0 <= snap {
                    t0 = 0.0;
                }
                if t1 >= 1.0 - snap {
                    t1 = 1.0;
                }
                if t1 - t0 <= EPS {
                    continue;
                }
                if !(continues && t0 == 0.0 && !current.is_empty()) {
                    flush(&mut current, &mut out);
                    current.push(lerp(s0, s1, t0));
                }
                current.push(lerp(s0, s1, t1));
                continues = false;
            }
            // the chain only continues into the next segment if it reached
            // this segment's end
            let reached_end = current.last().is_some_and(|c| dist(*c, s1) <= EPS);
            if !reached_end {
                flush(&mut current, &mut out);
            }
        }
        flush(&mut current, &mut out);
        close_ring(part, part_start, &mut out);
    }
    drop_short(MultiLineString::new(out), tolerance)
}

/// Join the last and the first piece of a closed ring when the result runs
/// through the ring's start vertex.
fn close_ring(part: &LineString<f64>, part_start: usize, out: &mut Vec<LineString<f64>>) {
    if !part.is_closed() || out.len() < part_start + 2 {
        return;
    }
    let (Some(ring_start), Some(ring_end)) = (part.0.first(), part.0.last()) else {
        return;
    };
    let first_at_start = out[part_start].0.first() == Some(ring_start);
    let last_at_end = out.last().and_then(|l| l.0.last()) == Some(ring_end);
    if first_at_start && last_at_end {
        if let Some(mut last) = out.pop() {
            last.0.extend(out[part_start].0.iter().skip(1).copied());
            out[part_start] = last;
        }
    }
}

fn flush(current: &mut Vec<Coord<f64>>, out: &mut Vec<LineString<f64>>) {
    if current.len() >= 2 {
        out.push(LineString::new(std::mem::take(current)));
    } else {
        current.clear();
    }
}

fn drop_short(lines: MultiLineString<f64>, tolerance: f64) -> MultiLineString<f64> {
    MultiLineString::new(
        lines
            .0
            .into_iter()
            .filter(|l| l.0.len() >= 2 && l.length::<Euclidean>() > tolerance.max(EPS))
            .collect(),
    )
}

/// Intervals of segment `s0 -> s1` lying along any segment of `b`.
///
/// Two segments are coincident when both end points of one lie within the
/// tolerance of the other's carrier line; the shared stretch is the
/// projection of the other segment onto this one.
fn coincident_intervals(
    s0: Coord<f64>,
    s1: Coord<f64>,
    b: &MultiLineString<f64>,
    tolerance: f64,
) -> Vec<Interval> {
    let d = sub(s1, s0);
    let len2 = dot(d, d);
    let mut intervals = Vec::new();
    for part in &b.0 {
        for w in part.0.windows(2) {
            let (q0, q1) = (w[0], w[1]);
            if dist(q0, q1) <= EPS {
                continue;
            }
            let collinear = (line_distance(q0, s0, s1) <= tolerance
                && line_distance(q1, s0, s1) <= tolerance)
                || (line_distance(s0, q0, q1) <= tolerance
                    && line_distance(s1, q0, q1) <= tolerance);
            if !collinear {
                continue;
            }
            let ta = dot(sub(q0, s0), d) / len2;
            let tb = dot(sub(q1, s0), d) / len2;
            let (lo, hi) = (ta.min(tb).max(0.0), ta.max(tb).min(1.0));
            if hi > lo {
                intervals.push((lo, hi));
            }
        }
    }
    merge_intervals(intervals)
}

fn merge_intervals(mut intervals: Vec<Interval>) -> Vec<Interval> {
    intervals.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
    for (lo, hi) in intervals {
        match merged.last_mut() {
            Some(last) if lo <= last.1 + EPS => last.1 = last.1.max(hi),
            _ => merged.push((lo, hi)),
        }
    }
    merged
}

fn complement(intervals: &[Interval]) -> Vec<Interval> {
    let mut out = Vec::new();
    let mut start = 0.0;
    for &(lo, hi) in intervals {
        if lo > start {
            out.push((start, lo));
        }
        start = start.max(hi);
    }
    if start < 1.0 {
        out.push((start, 1.0));
    }
    out
}

/// Interval of `s0 -> s1` inside the rectangle of half-width `r` around
/// `q0 -> q1` (Cyrus-Beck clipping).
fn clip_to_segment_band(
    s0: Coord<f64>,
    s1: Coord<f64>,
    q0: Coord<f64>,
    q1: Coord<f64>,
    r: f64,
) -> Option<Interval> {
    let len = dist(q0, q1);
    if len <= EPS {
        return None;
    }
    let u = scale(sub(q1, q0), 1.0 / len);
    let n = Coord { x: -u.y, y: u.x };
    let d = sub(s1, s0);
    let rel = sub(s0, q0);

    // each slab: lo <= dot(axis, rel + t d) <= hi
    let slabs = [(u, 0.0, len), (n, -r, r)];
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    for (axis, lo, hi) in slabs {
        let p = dot(axis, rel);
        let v = dot(axis, d);
        if v.abs() <= EPS {
            if p < lo - EPS || p > hi + EPS {
                return None;
            }
            continue;
        }
        let (a, b) = ((lo - p) / v, (hi - p) / v);
        t0 = t0.max(a.min(b));
        t1 = t1.min(a.max(b));
        if t0 > t1 {
            return None;
        }
    }
    Some((t0, t1))
}

/// Interval of `s0 -> s1` inside the disc of radius `r` around `c`.
fn clip_to_disc(s0: Coord<f64>, s1: Coord<f64>, c: Coord<f64>, r: f64) -> Option<Interval> {
    let d = sub(s1, s0);
    let f = sub(s0, c);
    let a = dot(d, d);
    if a <= EPS {
        return None;
    }
    let b = 2.0 * dot(f, d);
    let cc = dot(f, f) - r * r;
    let disc = b * b - 4.0 * a * cc;
    if disc < 0.0 {
        return None;
    }
    let root = disc.sqrt();
    let t0 = ((-b - root) / (2.0 * a)).max(0.0);
    let t1 = ((-b + root) / (2.0 * a)).min(1.0);
    (t1 > t0).then_some((t0, t1))
}

/// Chain parts whose ends meet within `tolerance`.
fn merge_parts(parts: Vec<LineString<f64>>, tolerance: f64) -> MultiLineString<f64> {
    let mut pending: Vec<Vec<Coord<f64>>> = parts
        .into_iter()
        .filter(|l| l.0.len() >= 2)
        .map(|l| l.0)
        .collect();
    let mut out: Vec<LineString<f64>> = Vec::new();

    while let Some(mut chain) = pending.pop() {
        loop {
            let mut extended = false;
            let mut i = 0;
            while i < pending.len() {
                let (first, last) = (chain[0], chain[chain.len() - 1]);
                if first == last && chain.len() > 2 {
                    break;
                }
                let cand = &pending[i];
                let (cf, cl) = (cand[0], cand[cand.len() - 1]);
                if dist(last, cf) <= tolerance {
                    let cand = pending.swap_remove(i);
                    chain.extend(cand.into_iter().skip(1));
                    extended = true;
                } else if dist(last, cl) <= tolerance {
                    let mut cand = pending.swap_remove(i);
                    cand.reverse();
                    chain.extend(cand.into_iter().skip(1));
                    extended = true;
                } else if dist(first, cl) <= tolerance {
                    let mut cand = pending.swap_remove(i);
                    cand.pop();
                    cand.extend(chain);
                    chain = cand;
                    extended = true;
                } else if dist(first, cf) <= tolerance {
                    let mut cand = pending.swap_remove(i);
                    cand.reverse();
                    cand.pop();
                    cand.extend(chain);
                    chain = cand;
                    extended = true;
                } else {
                    i += 1;
                }
            }
            if !extended {
                break;
            }
        }
        out.push(LineString::new(chain));
    }

    // deterministic part order
    out.sort_by(|a, b| {
        let (ca, cb) = (a.0[0], b.0[0]);
        ca.x.total_cmp(&cb.x).then(ca.y.total_cmp(&cb.y))
    });
    MultiLineString::new(out)
}

// ============================================================================
// Vector helpers
// ============================================================================

fn sub(a: Coord<f64>, b: Coord<f64>) -> Coord<f64> {
    Coord {
        x: a.x - b.x,
        y: a.y - b.y,
    }
}

fn scale(a: Coord<f64>, k: f64) -> Coord<f64> {
    Coord {
        x: a.x * k,
        y: a.y * k,
    }
}

fn dot(a: Coord<f64>, b: Coord<f64>) -> f64 {
    a.x * b.x + a.y * b.y
}

fn cross(a: Coord<f64>, b: Coord<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

fn dist(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

fn lerp(a: Coord<f64>, b: Coord<f64>, t: f64) -> Coord<f64> {
    if t <= 0.0 {
        a
    } else if t >= 1.0 {
        b
    } else {
        Coord {
            x: a.x + (b.x - a.x) * t,
            y: a.y + (b.y - a.y) * t,
        }
    }
}

/// Distance from `p` to the infinite line through `a` and `b`.
fn line_distance(p: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> f64 {
    let d = sub(b, a);
    let len = dot(d, d).sqrt();
    if len <= EPS {
        return dist(p, a);
    }
    cross(d, sub(p, a)).abs() / len
}

/// Foot of `p` on the segment `a`-`b`.
fn project(p: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> Coord<f64> {
    let d = sub(b, a);
    let len2 = dot(d, d);
    if len2 <= EPS {
        return a;
    }
    let t = (dot(sub(p, a), d) / len2).clamp(0.0, 1.0);
    lerp(a, b, t)
}

fn point_segment_distance(p: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> f64 {
    dist(p, project(p, a, b))
}

fn segment_distance(a0: Coord<f64>, a1: Coord<f64>, b0: Coord<f64>, b1: Coord<f64>) -> f64 {
    if segments_cross(a0, a1, b0, b1) {
        return 0.0;
    }
    point_segment_distance(a0, b0, b1)
        .min(point_segment_distance(a1, b0, b1))
        .min(point_segment_distance(b0, a0, a1))
        .min(point_segment_distance(b1, a0, a1))
}

fn segments_cross(a0: Coord<f64>, a1: Coord<f64>, b0: Coord<f64>, b1: Coord<f64>) -> bool {
    let d1 = cross(sub(a1, a0), sub(b0, a0));
    let d2 = cross(sub(a1, a0), sub(b1, a0));
    let d3 = cross(sub(b1, b0), sub(a0, b0));
    let d4 = cross(sub(b1, b0), sub(a1, b0));
    ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
}

fn envelopes_meet(a: &MultiLineString<f64>, b: &MultiLineString<f64>, tolerance: f64) -> bool {
    match (Envelope::of_lines(a), Envelope::of_lines(b)) {
        (Some(ea), Some(eb)) => ea.expand(tolerance).intersects(&eb),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{line_string, polygon};

    const TOL: f64 = 0.001;

    fn mls(lines: Vec<LineString<f64>>) -> MultiLineString<f64> {
        MultiLineString::new(lines)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_intersection_partial_overlap() {
        let a = mls(vec![line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)]]);
        let b = mls(vec![line_string![(x: 4.0, y: 0.0), (x: 12.0, y: 0.0)]]);
        let common = intersection(&a, &b, TOL);
        assert_eq!(common.0.len(), 1);
        assert!(approx(length(&common), 6.0));
        assert_eq!(common.0[0].0[0], Coord { x: 4.0, y: 0.0 });
    }

    #[test]
    fn test_intersection_within_tolerance() {
        let a = mls(vec![line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)]]);
        let b = mls(vec![line_string![(x: 0.0, y: 0.0005), (x: 10.0, y: 0.0005)]]);
        assert!(approx(length(&intersection(&a, &b, TOL)), 10.0));

        let far = mls(vec![line_string![(x: 0.0, y: 0.1), (x: 10.0, y: 0.1)]]);
        assert!(is_empty(&intersection(&a, &far, TOL)));
    }

    #[test]
    fn test_crossing_lines_have_no_linear_intersection() {
        let a = mls(vec![line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)]]);
        let b = mls(vec![line_string![(x: 5.0, y: -5.0), (x: 5.0, y: 5.0)]]);
        assert!(is_empty(&intersection(&a, &b, TOL)));
        assert!(!is_disjoint(&a, &b, TOL));
    }

    #[test]
    fn test_intersection_chains_across_vertices() {
        let a = mls(vec![
            line_string![(x: 0.0, y: 0.0), (x: 5.0, y: 0.0), (x: 10.0, y: 0.0)],
        ]);
        let b = mls(vec![line_string![(x: 2.0, y: 0.0), (x: 8.0, y: 0.0)]]);
        let common = intersection(&a, &b, TOL);
        assert_eq!(common.0.len(), 1);
        assert_eq!(common.0[0].0.len(), 3);
        assert!(approx(length(&common), 6.0));
    }

    #[test]
    fn test_shape_distance() {
        let area = Geometry::Polygon(polygon![
            (x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)
        ]);
        let inside = mls(vec![line_string![(x: 2.0, y: 2.0), (x: 3.0, y: 2.0)]]);
        let outside = mls(vec![line_string![(x: 12.0, y: 2.0), (x: 13.0, y: 2.0)]]);
        assert_eq!(shape_distance(&inside, &area), 0.0);
        assert!(approx(shape_distance(&outside, &area), 2.0));
    }

    #[test]
    fn test_intersection_joins_ring_start() {
        let ring = mls(vec![line_string![
            (x: 5.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0),
            (x: 0.0, y: 10.0), (x: 0.0, y: 0.0), (x: 5.0, y: 0.0)
        ]]);
        let border = mls(vec![line_string![(x: -5.0, y: 0.0), (x: 15.0, y: 0.0)]]);
        let along = intersection(&ring, &border, TOL);
        assert_eq!(along.0.len(), 1);
        assert!(approx(length(&along), 10.0));
    }

    #[test]
    fn test_difference_leaves_both_ends() {
        let a = mls(vec![line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)]]);
        let b = mls(vec![line_string![(x: 2.0, y: 0.0), (x: 8.0, y: 0.0)]]);
        let rest = difference(&a, &b, TOL);
        assert_eq!(rest.0.len(), 2);
        assert!(approx(length(&rest), 4.0));
    }

    #[test]
    fn test_difference_drops_slivers() {
        let a = mls(vec![line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)]]);
        let b = mls(vec![line_string![(x: 0.0, y: 0.0), (x: 9.9995, y: 0.0)]]);
        assert!(is_empty(&difference(&a, &b, TOL)));
    }

    #[test]
    fn test_union_merges_touching_parts() {
        let a = mls(vec![line_string![(x: 0.0, y: 0.0), (x: 5.0, y: 0.0)]]);
        let b = mls(vec![line_string![(x: 3.0, y: 0.0), (x: 10.0, y: 0.0)]]);
        let all = union(&a, &b, TOL);
        assert_eq!(all.0.len(), 1);
        assert!(approx(length(&all), 10.0));
    }

    #[test]
    fn test_near_part_flat_ends() {
        let to_buffer = mls(vec![line_string![(x: 0.0, y: 0.2), (x: 4.0, y: 0.2)]]);
        let line = mls(vec![line_string![(x: -5.0, y: 0.0), (x: 10.0, y: 0.0)]]);
        let near = near_part(&to_buffer, &line, 0.3);
        assert_eq!(near.0.len(), 1);
        assert!(approx(length(&near), 4.0));

        assert!(is_empty(&near_part(&to_buffer, &line, 0.1)));
    }

    #[test]
    fn test_near_part_round_joins() {
        let to_buffer = mls(vec![
            line_string![(x: 0.0, y: 1.0), (x: 5.0, y: 1.0), (x: 5.0, y: 6.0)],
        ]);
        let line = mls(vec![line_string![(x: 5.0, y: 0.0), (x: 7.0, y: 0.0)]]);
        // only the disc around the corner reaches down to y = 0
        let near = near_part(&to_buffer, &line, 1.0);
        assert!(is_empty(&near));
        let near = near_part(&to_buffer, &line, 1.5);
        assert!(length(&near) > 1.0);
    }

    #[test]
    fn test_contains_in_interior() {
        let line = mls(vec![line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)]]);
        assert!(contains_in_interior(&line, Coord { x: 4.0, y: 0.0 }, TOL));
        assert!(!contains_in_interior(&line, Coord { x: 10.0, y: 0.0 }, TOL));
        assert!(!contains_in_interior(&line, Coord { x: 4.0, y: 1.0 }, TOL));
    }

    #[test]
    fn test_closest_point() {
        let line = mls(vec![line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 5.0)]]);
        assert_eq!(
            closest_point(&line, Coord { x: 4.0, y: -2.0 }),
            Some(Coord { x: 4.0, y: 0.0 })
        );
        assert_eq!(
            closest_point(&line, Coord { x: 12.0, y: 3.0 }),
            Some(Coord { x: 10.0, y: 3.0 })
        );
        assert_eq!(closest_point(&empty(), Coord { x: 0.0, y: 0.0 }), None);
    }

    #[test]
    fn test_distance() {
        let a = mls(vec![line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)]]);
        let b = mls(vec![line_string![(x: 12.0, y: 0.0), (x: 14.0, y: 0.0)]]);
        assert!(approx(distance(&a, &b), 2.0));
        assert!(is_disjoint(&a, &b, TOL));
        assert_eq!(distance(&a, &empty()), f64::INFINITY);
    }
}
