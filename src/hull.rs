//! Convex hull of a point set in wrench space (any dimension from 2 up, used with 3 and 6).
//!
//! Quickhull: start from a full-dimensional simplex, give every remaining point to the first
//! facet it lies above, then repeatedly take the furthest point of a facet, remove all facets
//! visible from it and close the hole with new facets spanning the horizon and the point.
//! Facets stay simplicial. Points closer than `tolerance` to a facet plane count as lying on
//! it and never become vertices.
//!
//! Facet adjacency is kept in a `BTreeMap` keyed by ridges (sorted vertex lists), and work is
//! taken from a FIFO queue, so the same input always produces the same facets in the same order.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::cmp::Ordering;
use nalgebra::{DMatrix, DVector};
use tracing::debug;
use crate::grasp_error::{DegeneracyKind, GraspError};

/// Simplicial facet of the hull.
#[derive(Debug, Clone, PartialEq)]
pub struct Facet {
    /// Indices into the point set, sorted ascending, `dimension` of them.
    pub vertices: Vec<usize>,
    /// Outward unit normal.
    pub normal: DVector<f64>,
    /// Plane offset: points `x` of the facet plane satisfy `normal · x = offset`.
    pub offset: f64,
}

impl Facet {
    /// Positive outside the hull, negative inside.
    pub fn signed_distance(&self, point: &DVector<f64>) -> f64 {
        self.normal.dot(point) - self.offset
    }

    /// Euclidean distance from the coordinate origin to the facet plane.
    pub fn origin_distance(&self) -> f64 {
        self.offset.abs()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConvexHull {
    dimension: usize,
    vertices: Vec<usize>,
    facets: Vec<Facet>,
    tolerance: f64,
}

impl ConvexHull {
    /// Build the hull. Fails with [GraspError::DegenerateGeometry] if the points do not span
    /// the space (fewer than `dimension + 1` distinct points, or all in a hyperplane).
    pub fn build(points: &[DVector<f64>], tolerance: f64) -> Result<Self, GraspError> {
        let dimension = match points.first() {
            None => return Err(GraspError::DegenerateGeometry {
                kind: DegeneracyKind::InsufficientPoints, points: 0, rank: 0, spanning: Vec::new(),
            }),
            Some(p) => p.len(),
        };
        if dimension < 2 {
            return Err(GraspError::InvalidInput(format!("hull needs at least 2 dimensions (got {})", dimension)));
        }
        if let Some(i) = points.iter().position(|p| p.len() != dimension) {
            return Err(GraspError::InvalidInput(format!(
                "point {} has {} components, expected {}", i, points[i].len(), dimension
            )));
        }
        if points.iter().any(|p| !p.iter().all(|v| v.is_finite())) {
            return Err(GraspError::InvalidInput("hull points must be finite".to_string()));
        }
        if !(tolerance.is_finite() && tolerance > 0.0) {
            return Err(GraspError::InvalidInput(format!("tolerance must be positive (got {})", tolerance)));
        }

        let simplex = initial_simplex(points, tolerance).map_err(|spanning| {
            let distinct = count_distinct(points);
            let kind = if distinct < dimension + 1 {
                DegeneracyKind::InsufficientPoints
            } else {
                DegeneracyKind::RankDeficient
            };
            GraspError::DegenerateGeometry { kind, points: points.len(), rank: spanning.len() - 1, spanning }
        })?;

        let mut builder = Builder::new(points, dimension, tolerance, &simplex);
        builder.run(&simplex)?;
        let hull = builder.finish();
        debug!("hull of {} points in {}D: {} vertices, {} facets",
               points.len(), dimension, hull.vertices.len(), hull.facets.len());
        Ok(hull)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Indices of the points that are hull vertices, sorted ascending.
    pub fn vertices(&self) -> &[usize] {
        &self.vertices
    }

    /// Facets sorted by their vertex lists.
    pub fn facets(&self) -> &[Facet] {
        &self.facets
    }

    /// True if the point lies strictly inside the hull.
    pub fn contains(&self, point: &DVector<f64>) -> bool {
        point.len() == self.dimension
            && self.facets.iter().all(|f| f.signed_distance(point) < -self.tolerance)
    }

    pub fn contains_origin(&self) -> bool {
        self.facets.iter().all(|f| f.offset > self.tolerance)
    }

    /// Smallest distance from the origin to any facet plane.
    pub fn min_facet_distance(&self) -> f64 {
        self.facets.iter().map(|f| f.origin_distance()).fold(f64::INFINITY, f64::min)
    }

    /// Largest `t` such that `t * direction` is still in the hull, for a hull containing the
    /// origin. `None` if the origin is not inside or the direction is zero.
    pub fn ray_exit(&self, direction: &DVector<f64>) -> Option<f64> {
        if direction.len() != self.dimension || !self.contains_origin() {
            return None;
        }
        self.facets.iter()
            .filter_map(|f| {
                let approach = f.normal.dot(direction);
                if approach > 0.0 { Some(f.offset / approach) } else { None }
            })
            .fold(None, |best: Option<f64>, t| Some(best.map_or(t, |b| b.min(t))))
    }
}

fn lexicographic(a: &DVector<f64>, b: &DVector<f64>) -> Ordering {
    a.iter().zip(b.iter())
        .map(|(x, y)| x.total_cmp(y))
        .find(|o| *o != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

fn count_distinct(points: &[DVector<f64>]) -> usize {
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&a, &b| lexicographic(&points[a], &points[b]));
    order.windows(2).filter(|w| points[w[0]] != points[w[1]]).count() + usize::from(!order.is_empty())
}

/// Greedily pick `dimension + 1` affinely independent points, each the furthest from the
/// affine span of those already picked. On failure returns the points picked so far.
fn initial_simplex(points: &[DVector<f64>], tolerance: f64) -> Result<Vec<usize>, Vec<usize>> {
    let dimension = points[0].len();
    let first = (0..points.len())
        .min_by(|&a, &b| lexicographic(&points[a], &points[b]))
        .ok_or_else(Vec::new)?;
    let origin = &points[first];

    let mut chosen = vec![first];
    let mut basis: Vec<DVector<f64>> = Vec::with_capacity(dimension);
    for _ in 0..dimension {
        let mut best: Option<(usize, f64, DVector<f64>)> = None;
        for (i, p) in points.iter().enumerate() {
            let mut residual = p - origin;
            for b in &basis {
                let projection = residual.dot(b);
                residual.axpy(-projection, b, 1.0);
            }
            let distance = residual.norm();
            if best.as_ref().map_or(true, |(_, d, _)| distance > *d) {
                best = Some((i, distance, residual));
            }
        }
        match best {
            Some((i, distance, residual)) if distance > tolerance => {
                basis.push(residual / distance);
                chosen.push(i);
            }
            _ => return Err(chosen),
        }
    }
    Ok(chosen)
}

/// Facet under construction, with the points assigned to lie above it.
struct WorkFacet {
    facet: Facet,
    outside: Vec<usize>,
}

type Ridge = Vec<usize>;

fn ridges_of(vertices: &[usize]) -> impl Iterator<Item = Ridge> + '_ {
    (0..vertices.len()).map(move |skip| {
        vertices.iter().enumerate().filter(|(i, _)| *i != skip).map(|(_, v)| *v).collect()
    })
}

struct Builder<'a> {
    points: &'a [DVector<f64>],
    dimension: usize,
    tolerance: f64,
    /// Strictly inside the hull at every stage, used to orient new facets.
    interior: DVector<f64>,
    facets: Vec<Option<WorkFacet>>,
    ridges: BTreeMap<Ridge, Vec<usize>>,
    pending: VecDeque<usize>,
}

impl<'a> Builder<'a> {
    fn new(points: &'a [DVector<f64>], dimension: usize, tolerance: f64, simplex: &[usize]) -> Self {
        let mut interior = DVector::zeros(dimension);
        for &i in simplex {
            interior += &points[i];
        }
        interior /= simplex.len() as f64;
        Builder {
            points,
            dimension,
            tolerance,
            interior,
            facets: Vec::new(),
            ridges: BTreeMap::new(),
            pending: VecDeque::new(),
        }
    }

    fn degenerate(&self) -> GraspError {
        GraspError::DegenerateGeometry {
            kind: DegeneracyKind::RankDeficient,
            points: self.points.len(),
            rank: self.dimension,
            spanning: Vec::new(),
        }
    }

    /// Oriented hyperplane through the given points. The normal is the generalized cross
    /// product of the edge vectors (signed maximal minors).
    fn hyperplane(&self, vertices: &[usize]) -> Option<(DVector<f64>, f64)> {
        let d = self.dimension;
        let p0 = &self.points[vertices[0]];
        let edges = DMatrix::from_fn(d - 1, d, |r, c| self.points[vertices[r + 1]][c] - p0[c]);

        let mut normal = DVector::from_fn(d, |j, _| {
            let minor = edges.clone().remove_column(j).determinant();
            if j % 2 == 0 { minor } else { -minor }
        });
        let norm = normal.norm();
        if !(norm.is_finite() && norm > f64::MIN_POSITIVE) {
            return None;
        }
        normal /= norm;
        let mut offset = normal.dot(p0);
        if normal.dot(&self.interior) > offset {
            normal = -normal;
            offset = -offset;
        }
        Some((normal, offset))
    }

    fn add_facet(&mut self, vertices: Vec<usize>) -> Result<usize, GraspError> {
        let (normal, offset) = self.hyperplane(&vertices).ok_or_else(|| self.degenerate())?;
        let id = self.facets.len();
        for ridge in ridges_of(&vertices) {
            self.ridges.entry(ridge).or_default().push(id);
        }
        self.facets.push(Some(WorkFacet { facet: Facet { vertices, normal, offset }, outside: Vec::new() }));
        Ok(id)
    }

    fn remove_facet(&mut self, id: usize) -> Option<WorkFacet> {
        let work = self.facets[id].take()?;
        for ridge in ridges_of(&work.facet.vertices) {
            if let Some(owners) = self.ridges.get_mut(&ridge) {
                owners.retain(|&o| o != id);
                if owners.is_empty() {
                    self.ridges.remove(&ridge);
                }
            }
        }
        Some(work)
    }

    fn neighbor(&self, id: usize, ridge: &Ridge) -> Option<usize> {
        self.ridges.get(ridge).and_then(|owners| owners.iter().copied().find(|&o| o != id))
    }

    fn distance(&self, facet: usize, point: usize) -> f64 {
        match &self.facets[facet] {
            Some(work) => work.facet.signed_distance(&self.points[point]),
            None => f64::NEG_INFINITY,
        }
    }

    /// Give each point to the first facet it lies above. Points above none are inside.
    fn assign(&mut self, candidates: impl IntoIterator<Item = usize>, facets: &[usize]) {
        for p in candidates {
            let above = facets.iter().copied().find(|&f| self.distance(f, p) > self.tolerance);
            if let Some(work) = above.and_then(|f| self.facets[f].as_mut()) {
                work.outside.push(p);
            }
        }
        for &f in facets {
            if self.facets[f].as_ref().map_or(false, |w| !w.outside.is_empty()) {
                self.pending.push_back(f);
            }
        }
    }

    fn run(&mut self, simplex: &[usize]) -> Result<(), GraspError> {
        let mut initial = Vec::with_capacity(simplex.len());
        for skip in 0..simplex.len() {
            let mut vertices: Vec<usize> = simplex.iter().enumerate()
                .filter(|(i, _)| *i != skip).map(|(_, v)| *v).collect();
            vertices.sort_unstable();
            initial.push(self.add_facet(vertices)?);
        }
        let in_simplex: BTreeSet<usize> = simplex.iter().copied().collect();
        let rest: Vec<usize> = (0..self.points.len()).filter(|i| !in_simplex.contains(i)).collect();
        self.assign(rest, &initial);

        while let Some(start) = self.pending.pop_front() {
            let eye = match &self.facets[start] {
                Some(work) if !work.outside.is_empty() => {
                    let mut eye = work.outside[0];
                    let mut furthest = work.facet.signed_distance(&self.points[eye]);
                    for &p in &work.outside[1..] {
                        let d = work.facet.signed_distance(&self.points[p]);
                        if d > furthest {
                            furthest = d;
                            eye = p;
                        }
                    }
                    eye
                }
                _ => continue,
            };

            // Flood the facets visible from the eye point and collect the horizon
            let mut visible = BTreeSet::from([start]);
            let mut queue = VecDeque::from([start]);
            let mut horizon: Vec<Ridge> = Vec::new();
            while let Some(f) = queue.pop_front() {
                let vertices = match &self.facets[f] {
                    Some(work) => work.facet.vertices.clone(),
                    None => continue,
                };
                for ridge in ridges_of(&vertices) {
                    let other = self.neighbor(f, &ridge).ok_or_else(|| self.degenerate())?;
                    if visible.contains(&other) {
                        continue;
                    }
                    if self.distance(other, eye) > self.tolerance {
                        visible.insert(other);
                        queue.push_back(other);
                    } else {
                        horizon.push(ridge);
                    }
                }
            }

            let mut orphans = Vec::new();
            for &f in &visible {
                if let Some(work) = self.remove_facet(f) {
                    orphans.extend(work.outside.into_iter().filter(|&p| p != eye));
                }
            }

            let mut created = Vec::with_capacity(horizon.len());
            for ridge in horizon {
                let mut vertices = ridge;
                vertices.push(eye);
                vertices.sort_unstable();
                created.push(self.add_facet(vertices)?);
            }
            self.assign(orphans, &created);
        }
        Ok(())
    }

    fn finish(self) -> ConvexHull {
        let mut facets: Vec<Facet> = self.facets.into_iter().flatten().map(|w| w.facet).collect();
        facets.sort_by(|a, b| a.vertices.cmp(&b.vertices));
        let vertices: BTreeSet<usize> = facets.iter().flat_map(|f| f.vertices.iter().copied()).collect();
        ConvexHull {
            dimension: self.dimension,
            vertices: vertices.into_iter().collect(),
            facets,
            tolerance: self.tolerance,
        }
    }
}
