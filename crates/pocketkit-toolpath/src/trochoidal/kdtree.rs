//! Two-dimensional k-d tree over boundary sample points.
//!
//! Nodes live in one contiguous arena and refer to their children by index.
//! Levels split alternately on X (even depth) and Y (odd depth) at the median.

use pocketkit_core::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

impl Axis {
    fn for_depth(depth: usize) -> Self {
        if depth % 2 == 0 {
            Axis::X
        } else {
            Axis::Y
        }
    }

    fn coord(&self, p: &Point) -> f64 {
        match self {
            Axis::X => p.x,
            Axis::Y => p.y,
        }
    }
}

#[derive(Debug, Clone)]
struct KdNode {
    /// Index of the node's point in `KdTree::points`.
    point: usize,
    axis: Axis,
    left: Option<usize>,
    right: Option<usize>,
}

/// A neighbour returned by a query: point index and distance to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbour {
    pub index: usize,
    pub distance: f64,
}

/// Static k-d tree; point indices in query results refer to the input slice.
#[derive(Debug, Clone)]
pub struct KdTree {
    points: Vec<Point>,
    nodes: Vec<KdNode>,
    root: Option<usize>,
}

impl KdTree {
    pub fn build(points: &[Point]) -> Self {
        let mut order: Vec<usize> = (0..points.len()).collect();
        let mut nodes = Vec::with_capacity(points.len());
        let root = build_range(points, &mut order, 0, &mut nodes);
        Self {
            points: points.to_vec(),
            nodes,
            root,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, index: usize) -> Point {
        self.points[index]
    }

    pub fn nearest(&self, query: Point) -> Option<Neighbour> {
        self.nearest_k(query, 1).into_iter().next()
    }

    /// The `k` points closest to `query`, nearest first.
    ///
    /// Equal distances are ordered by point index.
    pub fn nearest_k(&self, query: Point, k: usize) -> Vec<Neighbour> {
        let mut best: Vec<(f64, usize)> = Vec::with_capacity(k + 1);
        if k > 0 {
            if let Some(root) = self.root {
                self.search(root, query, k, &mut best);
            }
        }
        best.into_iter()
            .map(|(d2, index)| Neighbour {
                index,
                distance: d2.sqrt(),
            })
            .collect()
    }

    fn search(&self, node_id: usize, query: Point, k: usize, best: &mut Vec<(f64, usize)>) {
        let node = &self.nodes[node_id];
        let p = self.points[node.point];
        offer(best, k, (query.distance_squared_to(&p), node.point));

        let diff = node.axis.coord(&query) - node.axis.coord(&p);
        let (near, far) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };
        if let Some(near) = near {
            self.search(near, query, k, best);
        }
        if let Some(far) = far {
            let worst = best.last().map(|b| b.0).unwrap_or(f64::INFINITY);
            if best.len() < k || diff * diff <= worst {
                self.search(far, query, k, best);
            }
        }
    }
}

fn build_range(
    points: &[Point],
    order: &mut [usize],
    depth: usize,
    nodes: &mut Vec<KdNode>,
) -> Option<usize> {
    if order.is_empty() {
        return None;
    }
    let axis = Axis::for_depth(depth);
    order.sort_by(|a, b| {
        axis.coord(&points[*a])
            .total_cmp(&axis.coord(&points[*b]))
            .then(a.cmp(b))
    });
    let mid = order.len() / 2;
    let id = nodes.len();
    nodes.push(KdNode {
        point: order[mid],
        axis,
        left: None,
        right: None,
    });

    let (lower, rest) = order.split_at_mut(mid);
    let upper = &mut rest[1..];
    let left = build_range(points, lower, depth + 1, nodes);
    let right = build_range(points, upper, depth + 1, nodes);
    nodes[id].left = left;
    nodes[id].right = right;
    Some(id)
}

/// Keeps `best` as the `k` smallest `(distance², index)` pairs in ascending order.
fn offer(best: &mut Vec<(f64, usize)>, k: usize, candidate: (f64, usize)) {
    let less = |a: &(f64, usize), b: &(f64, usize)| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1));
    if best.len() == k {
        match best.last() {
            Some(worst) if less(&candidate, worst).is_lt() => {
                best.pop();
            }
            _ => return,
        }
    }
    let at = best
        .iter()
        .position(|b| less(&candidate, b).is_lt())
        .unwrap_or(best.len());
    best.insert(at, candidate);
}
