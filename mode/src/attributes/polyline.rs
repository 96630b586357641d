//! Planar polygon helpers: boundary tracing, convex hull, distances.
//!
//! Grid cell `(x, y)` covers the unit square centered on `(x, y)`, so cell
//! corners sit at half-integer coordinates.

use glam::{DMat3, DVec2, DVec3};
use hashbrown::{HashMap, HashSet};

type Vertex = (i64, i64);
type Dir = (i64, i64);

/// Outer boundary of a set of cells as a counterclockwise polygon.
///
/// Cell edges not shared with another member cell are chained into loops
/// with the object on the left. Where two cells touch only at a corner the
/// trace turns right, so diagonal neighbours end up on one loop. The loop
/// enclosing the largest area is returned, with collinear vertices removed.
pub fn outer_boundary(cells: &[(usize, usize)]) -> Vec<DVec2> {
    let members: HashSet<Vertex> = cells.iter().map(|&(x, y)| (x as i64, y as i64)).collect();
    let mut sorted: Vec<Vertex> = members.iter().copied().collect();
    sorted.sort_unstable_by_key(|&(x, y)| (y, x));

    let mut edges: Vec<(Vertex, Dir)> = Vec::new();
    for &(x, y) in &sorted {
        if !members.contains(&(x, y - 1)) {
            edges.push(((x, y), (1, 0)));
        }
        if !members.contains(&(x + 1, y)) {
            edges.push(((x + 1, y), (0, 1)));
        }
        if !members.contains(&(x, y + 1)) {
            edges.push(((x + 1, y + 1), (-1, 0)));
        }
        if !members.contains(&(x - 1, y)) {
            edges.push(((x, y + 1), (0, -1)));
        }
    }

    let mut outgoing: HashMap<Vertex, Vec<usize>> = HashMap::new();
    for (k, &(from, _)) in edges.iter().enumerate() {
        outgoing.entry(from).or_default().push(k);
    }

    let successor = |k: usize| -> Option<usize> {
        let (from, dir) = edges[k];
        let to = (from.0 + dir.0, from.1 + dir.1);
        let candidates = outgoing.get(&to)?;
        let right = (dir.1, -dir.0);
        let left = (-dir.1, dir.0);
        [right, dir, left]
            .into_iter()
            .find_map(|d| candidates.iter().copied().find(|&c| edges[c].1 == d))
    };

    let mut used = vec![false; edges.len()];
    let mut best: Option<(f64, Vec<Vertex>)> = None;
    for start in 0..edges.len() {
        if used[start] {
            continue;
        }
        let mut vertices = Vec::new();
        let mut k = start;
        loop {
            used[k] = true;
            vertices.push(edges[k].0);
            match successor(k) {
                Some(next) if next != start && !used[next] => k = next,
                _ => break,
            }
        }
        let area = signed_area_int(&vertices);
        if best.as_ref().is_none_or(|(a, _)| area > *a) {
            best = Some((area, vertices));
        }
    }

    best.map(|(_, vertices)| {
        remove_collinear(&vertices)
            .into_iter()
            .map(|(x, y)| DVec2::new(x as f64 - 0.5, y as f64 - 0.5))
            .collect()
    })
    .unwrap_or_default()
}

fn signed_area_int(vertices: &[Vertex]) -> f64 {
    let n = vertices.len();
    let twice: i64 = (0..n)
        .map(|i| {
            let (x0, y0) = vertices[i];
            let (x1, y1) = vertices[(i + 1) % n];
            x0 * y1 - x1 * y0
        })
        .sum();
    twice as f64 * 0.5
}

fn remove_collinear(vertices: &[Vertex]) -> Vec<Vertex> {
    let n = vertices.len();
    if n < 3 {
        return vertices.to_vec();
    }
    (0..n)
        .filter(|&i| {
            let p = vertices[(i + n - 1) % n];
            let v = vertices[i];
            let q = vertices[(i + 1) % n];
            (v.0 - p.0) * (q.1 - v.1) - (v.1 - p.1) * (q.0 - v.0) != 0
        })
        .map(|i| vertices[i])
        .collect()
}

/// Signed shoelace area; positive for counterclockwise polygons.
pub fn polygon_area(poly: &[DVec2]) -> f64 {
    let n = poly.len();
    if n < 3 {
        return 0.0;
    }
    0.5 * (0..n).map(|i| poly[i].perp_dot(poly[(i + 1) % n])).sum::<f64>()
}

/// Convex hull by monotone chain, counterclockwise, no repeated end point.
pub fn convex_hull(points: &[DVec2]) -> Vec<DVec2> {
    let mut pts = points.to_vec();
    pts.sort_unstable_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let cross = |o: DVec2, a: DVec2, b: DVec2| (a - o).perp_dot(b - o);
    let mut hull: Vec<DVec2> = Vec::with_capacity(2 * pts.len());
    for &p in &pts {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    let lower_len = hull.len() + 1;
    for &p in pts.iter().rev().skip(1) {
        while hull.len() >= lower_len && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(p);
    }
    hull.pop();
    hull
}

/// Even-odd ray casting test.
pub fn point_in_polygon(p: DVec2, poly: &[DVec2]) -> bool {
    let n = poly.len();
    let mut inside = false;
    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let (a, b) = (poly[i], poly[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn point_segment_distance(p: DVec2, a: DVec2, b: DVec2) -> f64 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

fn segments_intersect(p1: DVec2, p2: DVec2, q1: DVec2, q2: DVec2) -> bool {
    let d1 = (q2 - q1).perp_dot(p1 - q1);
    let d2 = (q2 - q1).perp_dot(p2 - q1);
    let d3 = (p2 - p1).perp_dot(q1 - p1);
    let d4 = (p2 - p1).perp_dot(q2 - p1);
    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    // Touching or collinear overlap.
    point_segment_distance(p1, q1, q2) == 0.0
        || point_segment_distance(p2, q1, q2) == 0.0
        || point_segment_distance(q1, p1, p2) == 0.0
        || point_segment_distance(q2, p1, p2) == 0.0
}

fn segments<'a>(poly: &'a [DVec2]) -> impl Iterator<Item = (DVec2, DVec2)> + 'a {
    let n = poly.len();
    (0..n).map(move |i| (poly[i], poly[(i + 1) % n]))
}

/// Shortest distance between two closed polygons; zero when they overlap.
pub fn polyline_distance(a: &[DVec2], b: &[DVec2]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return f64::INFINITY;
    }
    if a.iter().any(|&p| point_in_polygon(p, b)) || b.iter().any(|&p| point_in_polygon(p, a)) {
        return 0.0;
    }

    let mut best = f64::INFINITY;
    for (p1, p2) in segments(a) {
        for (q1, q2) in segments(b) {
            if segments_intersect(p1, p2, q1, q2) {
                return 0.0;
            }
            best = best
                .min(point_segment_distance(p1, q1, q2))
                .min(point_segment_distance(p2, q1, q2))
                .min(point_segment_distance(q1, p1, p2))
                .min(point_segment_distance(q2, p1, p2));
        }
    }
    best
}

/// Least-squares circle through `points` (Kasa fit): `(center, radius)`.
///
/// Returns `None` for fewer than three points or collinear input.
pub fn fit_circle(points: &[DVec2]) -> Option<(DVec2, f64)> {
    if points.len() < 3 {
        return None;
    }
    let mean = points.iter().copied().sum::<DVec2>() / points.len() as f64;

    // Normal equations for x^2 + y^2 + D x + E y + F = 0 in centered coordinates.
    let (mut sxx, mut sxy, mut syy, mut sx, mut sy) = (0.0, 0.0, 0.0, 0.0, 0.0);
    let (mut sxz, mut syz, mut sz) = (0.0, 0.0, 0.0);
    for &p in points {
        let d = p - mean;
        let z = d.length_squared();
        sxx += d.x * d.x;
        sxy += d.x * d.y;
        syy += d.y * d.y;
        sx += d.x;
        sy += d.y;
        sxz += d.x * z;
        syz += d.y * z;
        sz += z;
    }
    let n = points.len() as f64;
    let a = DMat3::from_cols(
        DVec3::new(sxx, sxy, sx),
        DVec3::new(sxy, syy, sy),
        DVec3::new(sx, sy, n),
    );
    let scale = sxx.max(syy).max(1.0);
    if a.determinant().abs() < 1e-9 * scale * scale * n {
        return None;
    }
    let sol = a.inverse() * -DVec3::new(sxz, syz, sz);
    let center = DVec2::new(-0.5 * sol.x, -0.5 * sol.y);
    let r2 = center.length_squared() - sol.z;
    (r2 > 0.0).then(|| (center + mean, r2.sqrt()))
}
