//! Delaunay triangulation (Bowyer-Watson) used to draw a landmark mesh.

use std::collections::BTreeSet;

use super::scene::Point2;

#[derive(Debug, Clone, Copy)]
struct Triangle {
    v: [usize; 3],
    cx: f64,
    cy: f64,
    r2: f64,
}

impl Triangle {
    fn new(v: [usize; 3], pts: &[(f64, f64)]) -> Self {
        let (ax, ay) = pts[v[0]];
        let (bx, by) = pts[v[1]];
        let (cx, cy) = pts[v[2]];
        let d = 2.0 * (ax * (by - cy) + bx * (cy - ay) + cx * (ay - by));
        if d.abs() < 1e-12 {
            // Collinear: any later point replaces it.
            return Self {
                v,
                cx: 0.0,
                cy: 0.0,
                r2: f64::INFINITY,
            };
        }
        let a2 = ax * ax + ay * ay;
        let b2 = bx * bx + by * by;
        let c2 = cx * cx + cy * cy;
        let ux = (a2 * (by - cy) + b2 * (cy - ay) + c2 * (ay - by)) / d;
        let uy = (a2 * (cx - bx) + b2 * (ax - cx) + c2 * (bx - ax)) / d;
        Self {
            v,
            cx: ux,
            cy: uy,
            r2: (ax - ux).powi(2) + (ay - uy).powi(2),
        }
    }

    fn circumcircle_contains(&self, (x, y): (f64, f64)) -> bool {
        (x - self.cx).powi(2) + (y - self.cy).powi(2) < self.r2
    }

    fn edges(&self) -> [(usize, usize); 3] {
        let [a, b, c] = self.v;
        [edge(a, b), edge(b, c), edge(c, a)]
    }
}

fn edge(a: usize, b: usize) -> (usize, usize) {
    (a.min(b), a.max(b))
}

/// Unique mesh edges `(i, j)` with `i < j`, in ascending order.
///
/// Fewer than three distinct points, or all points on one line, yield no
/// edges. Repeated points are skipped.
pub fn delaunay_edges(points: &[Point2]) -> Vec<(usize, usize)> {
    let n = points.len();
    if n < 3 {
        return Vec::new();
    }

    let mut pts: Vec<(f64, f64)> = points.iter().map(|p| (p.x as f64, p.y as f64)).collect();
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (pts[0].0, pts[0].1, pts[0].0, pts[0].1);
    for &(x, y) in &pts {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }
    let span = (max_x - min_x).max(max_y - min_y).max(1.0);
    let (mid_x, mid_y) = ((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);
    pts.push((mid_x - 20.0 * span, mid_y - span));
    pts.push((mid_x, mid_y + 20.0 * span));
    pts.push((mid_x + 20.0 * span, mid_y - span));

    let mut triangles = vec![Triangle::new([n, n + 1, n + 2], &pts)];
    let mut inserted: Vec<usize> = Vec::with_capacity(n);

    for i in 0..n {
        let p = pts[i];
        if inserted.iter().any(|&j| pts[j] == p) {
            continue;
        }
        inserted.push(i);

        let (bad, good): (Vec<Triangle>, Vec<Triangle>) =
            triangles.into_iter().partition(|t| t.circumcircle_contains(p));
        triangles = good;

        let bad_edges: Vec<(usize, usize)> = bad.iter().flat_map(|t| t.edges()).collect();
        for &(a, b) in &bad_edges {
            let shared = bad_edges.iter().filter(|&&e| e == (a, b)).count() > 1;
            if !shared {
                triangles.push(Triangle::new([a, b, i], &pts));
            }
        }
    }

    let mut edges = BTreeSet::new();
    for t in triangles.iter().filter(|t| t.v.iter().all(|&v| v < n)) {
        if t.r2.is_infinite() {
            continue;
        }
        edges.extend(t.edges());
    }
    edges.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(f32, f32)]) -> Vec<Point2> {
        coords.iter().map(|&(x, y)| Point2::new(x, y)).collect()
    }

    #[test]
    fn test_single_triangle() {
        let edges = delaunay_edges(&pts(&[(0.0, 0.0), (4.0, 0.0), (2.0, 3.0)]));
        assert_eq!(edges, vec![(0, 1), (0, 2), (1, 2)]);
    }

    #[test]
    fn test_interior_point_connects_to_every_corner() {
        let edges = delaunay_edges(&pts(&[(0.0, 0.0), (4.0, 0.0), (2.0, 3.0), (2.0, 1.0)]));
        assert_eq!(edges, vec![(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
    }

    #[test]
    fn test_convex_quad_has_one_diagonal() {
        let edges = delaunay_edges(&pts(&[(0.0, 0.0), (3.0, 0.0), (3.2, 2.0), (0.0, 2.1)]));
        assert_eq!(edges.len(), 5);
        for side in [(0, 1), (1, 2), (2, 3), (0, 3)] {
            assert!(edges.contains(&side), "missing hull edge {side:?}");
        }
    }

    #[test]
    fn test_too_few_or_collinear_points_give_no_edges() {
        assert!(delaunay_edges(&pts(&[(0.0, 0.0), (1.0, 1.0)])).is_empty());
        assert!(delaunay_edges(&pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)])).is_empty());
    }

    #[test]
    fn test_repeated_point_is_skipped() {
        let edges = delaunay_edges(&pts(&[(0.0, 0.0), (4.0, 0.0), (2.0, 3.0), (4.0, 0.0)]));
        assert_eq!(edges, vec![(0, 1), (0, 2), (1, 2)]);
    }
}
