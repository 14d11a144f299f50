//! Orthogonal link routing with parallel-edge offsetting.
//!
//! Every link is drawn as a 4-point polyline: out of the source
//! horizontally, a vertical run at the (offset) midpoint, then horizontally
//! into the target. Links sharing an unordered endpoint pair are spread
//! apart by shifting that vertical run.

use archie_core::{Bounds, EntityId, Link};
use kurbo::{BezPath, Point, Vec2};
use std::collections::HashMap;

/// Default distance between neighbouring parallel links (document units).
pub const LINK_SPACING: f64 = 24.0;

/// Side length of an arrowhead (document units).
pub const ARROW_SIZE: f64 = 10.0;

// ─── Parallel groups ─────────────────────────────────────────────────────

/// A link's position within its parallel group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParallelSlot {
    pub rank: usize,
    pub count: usize,
}

impl ParallelSlot {
    pub const SINGLE: ParallelSlot = ParallelSlot { rank: 0, count: 1 };

    /// Signed midpoint shift: `(rank − (count−1)/2) · spacing`.
    pub fn offset(&self, spacing: f64) -> f64 {
        (self.rank as f64 - (self.count as f64 - 1.0) / 2.0) * spacing
    }
}

/// `(rank, count)` for every link, computed once per frame.
#[derive(Debug, Default)]
pub struct ParallelIndex {
    slots: HashMap<EntityId, ParallelSlot>,
}

impl ParallelIndex {
    /// Group links by unordered endpoint pair. Inside a group, forward links
    /// (source id < target id) rank before backward ones; each direction
    /// keeps document order.
    pub fn build(links: &[Link]) -> Self {
        let mut groups: HashMap<(EntityId, EntityId), (Vec<EntityId>, Vec<EntityId>)> = HashMap::new();
        for link in links {
            let forward = link.source <= link.target;
            let key = if forward {
                (link.source, link.target)
            } else {
                (link.target, link.source)
            };
            let (fwd, bwd) = groups.entry(key).or_default();
            if forward {
                fwd.push(link.id);
            } else {
                bwd.push(link.id);
            }
        }

        let mut slots = HashMap::with_capacity(links.len());
        for (fwd, bwd) in groups.into_values() {
            let count = fwd.len() + bwd.len();
            for (rank, id) in fwd.into_iter().chain(bwd).enumerate() {
                slots.insert(id, ParallelSlot { rank, count });
            }
        }
        Self { slots }
    }

    pub fn slot(&self, link: EntityId) -> ParallelSlot {
        self.slots.get(&link).copied().unwrap_or(ParallelSlot::SINGLE)
    }
}

// ─── Routes ──────────────────────────────────────────────────────────────

/// Routed geometry of one link, in document space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkRoute {
    pub points: [Point; 4],
    /// Where the label chip is centered.
    pub label_anchor: Point,
}

impl LinkRoute {
    pub fn start(&self) -> Point {
        self.points[0]
    }

    pub fn end(&self) -> Point {
        self.points[3]
    }

    /// X of the vertical run.
    pub fn mid_x(&self) -> f64 {
        self.points[1].x
    }

    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        path.move_to(self.points[0]);
        for p in &self.points[1..] {
            path.line_to(*p);
        }
        path
    }

    /// Closest distance from `p` to any segment of the route.
    pub fn distance_to(&self, p: Point) -> f64 {
        self.points
            .windows(2)
            .map(|seg| segment_distance(p, seg[0], seg[1]))
            .fold(f64::INFINITY, f64::min)
    }

    /// Direction the route arrives at its end: the last point before the
    /// tip that differs from it.
    fn approach_to_end(&self) -> Point {
        let tip = self.end();
        self.points[..3]
            .iter()
            .rev()
            .copied()
            .find(|p| (*p - tip).hypot() > 1e-6)
            .unwrap_or(self.start())
    }

    fn approach_to_start(&self) -> Point {
        let tip = self.start();
        self.points[1..]
            .iter()
            .copied()
            .find(|p| (*p - tip).hypot() > 1e-6)
            .unwrap_or(self.end())
    }

    /// Arrowhead triangle at the target end.
    pub fn end_arrow(&self, size: f64) -> [Point; 3] {
        arrowhead_polygon(self.end(), self.approach_to_end(), size)
    }

    /// Arrowhead triangle at the source end (bidirectional links).
    pub fn start_arrow(&self, size: f64) -> [Point; 3] {
        arrowhead_polygon(self.start(), self.approach_to_start(), size)
    }
}

/// Route a link between two node boxes. Pure: the result depends only on
/// the arguments.
pub fn route_link(source: Bounds, target: Bounds, slot: ParallelSlot, spacing: f64) -> LinkRoute {
    let (scx, scy) = source.center();
    let (tcx, tcy) = target.center();
    let (sx, tx) = if tcx >= scx {
        (source.right(), target.x)
    } else {
        (source.x, target.right())
    };
    let (sx, sy, tx, ty) = (sx as f64, scy as f64, tx as f64, tcy as f64);
    let mid_x = (sx + tx) / 2.0 + slot.offset(spacing);

    LinkRoute {
        points: [
            Point::new(sx, sy),
            Point::new(mid_x, sy),
            Point::new(mid_x, ty),
            Point::new(tx, ty),
        ],
        label_anchor: Point::new(mid_x, (sy + ty) / 2.0),
    }
}

/// Triangle `[tip, left, right]` pointing from `from` toward `tip`.
pub fn arrowhead_polygon(tip: Point, from: Point, size: f64) -> [Point; 3] {
    let d: Vec2 = tip - from;
    let len = d.hypot();
    if len < 1e-6 {
        return [
            tip,
            Point::new(tip.x - size, tip.y - size * 0.4),
            Point::new(tip.x - size, tip.y + size * 0.4),
        ];
    }
    let u = d / len;
    let base = tip - u * size;
    let half = size * 0.4;
    let left = Point::new(base.x - u.y * half, base.y + u.x * half);
    let right = Point::new(base.x + u.y * half, base.y - u.x * half);
    [tip, left, right]
}

fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len2 = ab.hypot2();
    if len2 < 1e-12 {
        return (p - a).hypot();
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    (p - (a + ab * t)).hypot()
}
