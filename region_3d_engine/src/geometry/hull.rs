/// Convex hull construction and the tagged hull shape.
///
/// `HullBuilder` turns an arbitrary point cloud into the minimal convex
/// shape spanning it. Inputs that span fewer than three dimensions do
/// not fail; they collapse to the matching lower-dimensional variant of
/// [`Hull`], and containment on those variants means exact incidence
/// within [`EPSILON`], not volumetric inclusion.

use glam::DVec3;
use rustc_hash::FxHashSet;

use crate::error::{Region3dError, Region3dResult};
use crate::region_warn;
use super::{Aabb, Plane, EPSILON};

/// Input points closer than this (but not EPSILON-identical, those are
/// deduplicated) produce sliver faces and unstable normals. The builder
/// warns and continues.
const MIN_POINT_SEPARATION: f64 = 1e-3;

/// Tolerance for the post-build convexity audit, wider than EPSILON to
/// absorb rounding accumulated across stitch steps.
const CONVEXITY_TOLERANCE: f64 = EPSILON * 16.0;

// ===== FACE =====

/// A triangular hull facet: three vertex indices in counter-clockwise
/// order when viewed from outside, plus the facet plane.
///
/// Convexity invariant: every hull vertex satisfies
/// `plane.signed_distance(v) <= EPSILON`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    /// Indices into the hull's vertex list
    pub vertices: [usize; 3],
    /// Facet plane with outward-pointing normal
    pub plane: Plane,
}

// ===== HULL =====

/// The convex shape spanned by a point set.
///
/// Tagged by dimensionality so that callers handle degenerate inputs
/// exhaustively instead of special-casing a "thin polyhedron".
#[derive(Debug, Clone, PartialEq)]
pub enum Hull {
    /// All input points coincide.
    Point(DVec3),
    /// All input points are collinear; endpoints of the spanned segment.
    Segment([DVec3; 2]),
    /// All input points are coplanar; the outline is the 2D convex hull,
    /// counter-clockwise around the plane normal.
    Polygon {
        /// Outline vertices, ordered counter-clockwise
        vertices: Vec<DVec3>,
        /// Supporting plane
        plane: Plane,
    },
    /// Full-dimensional convex polyhedron.
    Polyhedron {
        /// Hull-extremal vertices (interior input points are discarded)
        vertices: Vec<DVec3>,
        /// Triangular facets, outward-oriented
        faces: Vec<Face>,
    },
}

impl Hull {
    /// The hull's vertices (extremal points only).
    pub fn vertices(&self) -> &[DVec3] {
        match self {
            Hull::Point(p) => std::slice::from_ref(p),
            Hull::Segment(endpoints) => endpoints,
            Hull::Polygon { vertices, .. } => vertices,
            Hull::Polyhedron { vertices, .. } => vertices,
        }
    }

    /// Arithmetic mean of the hull vertices (inside the hull by convexity).
    pub fn centroid(&self) -> DVec3 {
        let verts = self.vertices();
        let sum: DVec3 = verts.iter().copied().sum();
        sum / verts.len() as f64
    }

    /// Number of facets (0 for point/segment hulls, 1 for a polygon).
    pub fn face_count(&self) -> usize {
        match self {
            Hull::Point(_) | Hull::Segment(_) => 0,
            Hull::Polygon { .. } => 1,
            Hull::Polyhedron { faces, .. } => faces.len(),
        }
    }

    /// True for every variant except `Polyhedron`.
    pub fn is_degenerate(&self) -> bool {
        !matches!(self, Hull::Polyhedron { .. })
    }

    /// Variant name for log messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Hull::Point(_) => "point",
            Hull::Segment(_) => "segment",
            Hull::Polygon { .. } => "polygon",
            Hull::Polyhedron { .. } => "polyhedron",
        }
    }

    /// Smallest AABB over the hull vertices.
    pub fn bounding_box(&self) -> Aabb {
        Aabb::from_points(self.vertices().iter().copied())
    }

    /// Exact containment test, boundary inclusive within [`EPSILON`].
    ///
    /// Degenerate variants test incidence with the shape itself: a point
    /// next to a polygon's plane is outside, no matter how close its
    /// projection is to the outline.
    pub fn contains(&self, p: &DVec3) -> bool {
        match self {
            Hull::Point(q) => p.distance(*q) <= EPSILON,
            Hull::Segment([a, b]) => {
                let d = *b - *a;
                let len_sq = d.length_squared();
                let t = if len_sq > 0.0 {
                    ((*p - *a).dot(d) / len_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                p.distance(*a + d * t) <= EPSILON
            }
            Hull::Polygon { vertices, plane } => {
                if plane.signed_distance(p).abs() > EPSILON {
                    return false;
                }
                // Outline is CCW around the normal: p is inside when it
                // is on the left of every edge.
                for i in 0..vertices.len() {
                    let a = vertices[i];
                    let b = vertices[(i + 1) % vertices.len()];
                    if plane.normal.dot((b - a).cross(*p - a)) < -EPSILON {
                        return false;
                    }
                }
                true
            }
            Hull::Polyhedron { faces, .. } => faces
                .iter()
                .all(|f| f.plane.signed_distance(p) <= EPSILON),
        }
    }

    /// Exact convex-convex intersection via separating-axis testing.
    ///
    /// Candidate axes are both hulls' facet normals, pairwise edge
    /// cross products, and the centroid difference (which covers the
    /// axis-free point/point pairing). Touching within EPSILON counts
    /// as intersecting.
    pub fn intersects_hull(&self, other: &Hull) -> bool {
        let mut axes = self.sat_axes();
        axes.extend(other.sat_axes());
        axes.push(other.centroid() - self.centroid());
        for ea in self.edge_dirs() {
            for eb in other.edge_dirs() {
                axes.push(ea.cross(eb));
            }
        }
        !separating_axis_exists(self.vertices(), other.vertices(), &axes)
    }

    /// Exact hull-box intersection via separating-axis testing.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        let corners = aabb.corners();
        let box_axes = [DVec3::X, DVec3::Y, DVec3::Z];
        let mut axes: Vec<DVec3> = box_axes.to_vec();
        axes.extend(self.sat_axes());
        axes.push(aabb.center() - self.centroid());
        for e in self.edge_dirs() {
            for ba in box_axes {
                axes.push(e.cross(ba));
            }
        }
        !separating_axis_exists(self.vertices(), &corners, &axes)
    }

    /// Face-normal axes per variant.
    ///
    /// A polygon contributes its plane normal plus its in-plane edge
    /// normals (the facet normals of the flat Minkowski face that the
    /// edge-cross axes cannot produce for coplanar pairs).
    fn sat_axes(&self) -> Vec<DVec3> {
        match self {
            Hull::Point(_) => Vec::new(),
            Hull::Segment([a, b]) => vec![*b - *a],
            Hull::Polygon { vertices, plane } => {
                let mut axes = vec![plane.normal];
                for i in 0..vertices.len() {
                    let edge = vertices[(i + 1) % vertices.len()] - vertices[i];
                    axes.push(edge.cross(plane.normal));
                }
                axes
            }
            Hull::Polyhedron { faces, .. } => {
                faces.iter().map(|f| f.plane.normal).collect()
            }
        }
    }

    /// Edge direction vectors per variant (for SAT cross-product axes).
    fn edge_dirs(&self) -> Vec<DVec3> {
        match self {
            Hull::Point(_) => Vec::new(),
            Hull::Segment([a, b]) => vec![*b - *a],
            Hull::Polygon { vertices, .. } => (0..vertices.len())
                .map(|i| vertices[(i + 1) % vertices.len()] - vertices[i])
                .collect(),
            Hull::Polyhedron { vertices, faces } => {
                let mut dirs = Vec::with_capacity(faces.len() * 3);
                for f in faces {
                    let [i, j, k] = f.vertices;
                    dirs.push(vertices[j] - vertices[i]);
                    dirs.push(vertices[k] - vertices[j]);
                    dirs.push(vertices[i] - vertices[k]);
                }
                dirs
            }
        }
    }
}

// ===== SEPARATING AXIS HELPERS =====

/// Project a vertex set onto an axis, returning (min, max) extents.
fn project(verts: &[DVec3], axis: DVec3) -> (f64, f64) {
    let mut lo = f64::MAX;
    let mut hi = f64::MIN;
    for v in verts {
        let s = axis.dot(*v);
        lo = lo.min(s);
        hi = hi.max(s);
    }
    (lo, hi)
}

/// True if any candidate axis separates the two vertex sets by more
/// than EPSILON. Near-zero axes (parallel edge crosses) are skipped.
fn separating_axis_exists(a: &[DVec3], b: &[DVec3], axes: &[DVec3]) -> bool {
    for axis in axes {
        let len_sq = axis.length_squared();
        if len_sq <= EPSILON * EPSILON {
            continue;
        }
        let axis = *axis / len_sq.sqrt();
        let (a_lo, a_hi) = project(a, axis);
        let (b_lo, b_hi) = project(b, axis);
        if a_hi < b_lo - EPSILON || b_hi < a_lo - EPSILON {
            return true;
        }
    }
    false
}

// ===== HULL BUILDER =====

/// Computes the convex hull of a 3D point set.
///
/// Incremental construction: an extremal initial tetrahedron, then each
/// remaining point either falls inside the current hull or has its
/// visible faces replaced by a fan of new faces around the horizon
/// edge. Inputs spanning fewer than three dimensions fall out of the
/// cascade early as the matching degenerate [`Hull`] variant.
pub struct HullBuilder;

impl HullBuilder {
    /// Build the convex hull of `points`.
    ///
    /// Duplicates are permitted and discarded. Extremal-point ties are
    /// broken by lexicographic coordinate order, so equal point sets
    /// always build identical hulls.
    ///
    /// # Errors
    ///
    /// * `EmptyInput` - `points` is empty
    /// * `InvariantViolation` - the built polyhedron failed its own
    ///   convexity audit (a geometry bug, not an input error)
    pub fn build(points: &[DVec3]) -> Region3dResult<Hull> {
        if points.is_empty() {
            return Err(Region3dError::EmptyInput);
        }

        warn_on_close_points(points);
        let pts = dedupe_points(points);

        // Dimension cascade: the first extremal pair that fails to
        // materialize tells us the input's true dimensionality.
        let a = 0;
        let b = pts.len() - 1;
        if pts[b].distance(pts[a]) <= EPSILON {
            return Ok(Hull::Point(pts[a]));
        }

        let dir = (pts[b] - pts[a]).normalize();
        let mut c = a;
        let mut c_dist = 0.0;
        for (i, p) in pts.iter().enumerate() {
            let rel = *p - pts[a];
            let off_line = (rel - dir * rel.dot(dir)).length();
            if off_line > c_dist {
                c_dist = off_line;
                c = i;
            }
        }
        if c_dist <= EPSILON {
            return Ok(Hull::Segment([pts[a], pts[b]]));
        }

        let normal = (pts[b] - pts[a]).cross(pts[c] - pts[a]).normalize();
        let base_plane = Plane::new(normal, normal.dot(pts[a]));
        let mut d = a;
        let mut d_dist = 0.0;
        for (i, p) in pts.iter().enumerate() {
            let off_plane = base_plane.signed_distance(p).abs();
            if off_plane > d_dist {
                d_dist = off_plane;
                d = i;
            }
        }
        if d_dist <= EPSILON {
            return Ok(planar_hull(&pts, pts[a], dir, base_plane));
        }

        volumetric_hull(&pts, [a, b, c, d])
    }
}

/// Warn once when two distinct input points sit closer than the
/// stability threshold (the hull still builds, but sliver faces make
/// containment near the boundary unreliable).
fn warn_on_close_points(points: &[DVec3]) {
    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            let dist = points[i].distance(points[j]);
            if dist > EPSILON && dist < MIN_POINT_SEPARATION {
                region_warn!(
                    "region3d::HullBuilder",
                    "input points {:?} and {:?} are only {:.6} apart; hull may be numerically unstable",
                    points[i], points[j], dist
                );
                return;
            }
        }
    }
}

/// Sort lexicographically and drop EPSILON-duplicates. The sorted order
/// makes every later extremal-point tie deterministic.
fn dedupe_points(points: &[DVec3]) -> Vec<DVec3> {
    let mut pts: Vec<DVec3> = points.to_vec();
    pts.sort_by(|a, b| {
        a.x.total_cmp(&b.x)
            .then(a.y.total_cmp(&b.y))
            .then(a.z.total_cmp(&b.z))
    });
    pts.dedup_by(|a, b| a.distance_squared(*b) <= EPSILON * EPSILON);
    pts
}

/// 2D convex hull (Andrew's monotone chain) of coplanar points,
/// returned as a counter-clockwise `Hull::Polygon`.
fn planar_hull(pts: &[DVec3], origin: DVec3, u: DVec3, plane: Plane) -> Hull {
    let v = plane.normal.cross(u);

    // Project into the (u, v) plane basis; (u, v, normal) is
    // right-handed, so CCW in 2D is CCW around the normal.
    let mut projected: Vec<(f64, f64, usize)> = pts
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let rel = *p - origin;
            (rel.dot(u), rel.dot(v), i)
        })
        .collect();
    projected.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));

    let cross2 = |o: &(f64, f64, usize), p: &(f64, f64, usize), q: &(f64, f64, usize)| {
        (p.0 - o.0) * (q.1 - o.1) - (p.1 - o.1) * (q.0 - o.0)
    };

    let mut outline: Vec<(f64, f64, usize)> = Vec::with_capacity(projected.len() * 2);
    // Lower chain, then upper chain; collinear mid-points are dropped.
    for p in &projected {
        while outline.len() >= 2
            && cross2(&outline[outline.len() - 2], &outline[outline.len() - 1], p) <= EPSILON
        {
            outline.pop();
        }
        outline.push(*p);
    }
    let lower_len = outline.len() + 1;
    for p in projected.iter().rev().skip(1) {
        while outline.len() >= lower_len
            && cross2(&outline[outline.len() - 2], &outline[outline.len() - 1], p) <= EPSILON
        {
            outline.pop();
        }
        outline.push(*p);
    }
    outline.pop(); // last point repeats the first

    Hull::Polygon {
        vertices: outline.iter().map(|&(_, _, i)| pts[i]).collect(),
        plane,
    }
}

/// Facet under construction: vertex indices into the working point set
/// plus the outward-oriented plane.
#[derive(Clone, Copy)]
struct BuildFace {
    verts: [usize; 3],
    plane: Plane,
}

/// Build a facet from three point indices, oriented so the interior
/// reference point is behind the plane. `None` if the triangle is a
/// degenerate sliver.
fn oriented_face(pts: &[DVec3], tri: [usize; 3], interior: DVec3) -> Option<BuildFace> {
    let [i, j, k] = tri;
    let plane = Plane::from_points(pts[i], pts[j], pts[k])?;
    if plane.signed_distance(&interior) > 0.0 {
        Some(BuildFace {
            verts: [i, k, j],
            plane: plane.flipped(),
        })
    } else {
        Some(BuildFace {
            verts: [i, j, k],
            plane,
        })
    }
}

/// Full 3D incremental hull from an extremal seed tetrahedron.
fn volumetric_hull(pts: &[DVec3], seed: [usize; 4]) -> Region3dResult<Hull> {
    let [a, b, c, d] = seed;
    let interior = (pts[a] + pts[b] + pts[c] + pts[d]) / 4.0;

    let mut faces: Vec<BuildFace> = Vec::with_capacity(8);
    for tri in [[a, b, c], [a, b, d], [a, c, d], [b, c, d]] {
        // The seed points are pairwise non-degenerate by construction.
        let face = oriented_face(pts, tri, interior).ok_or_else(|| {
            Region3dError::InvariantViolation("degenerate seed tetrahedron".to_string())
        })?;
        faces.push(face);
    }

    let seed_set: FxHashSet<usize> = seed.iter().copied().collect();
    for pi in 0..pts.len() {
        if seed_set.contains(&pi) {
            continue;
        }
        insert_hull_point(&mut faces, pts, pi, interior);
    }

    compact_polyhedron(pts, faces)
}

/// Add one point to the working hull: find the faces it sees, walk the
/// horizon edge between seen and unseen faces, replace the seen faces
/// with a fan from the horizon to the point.
fn insert_hull_point(faces: &mut Vec<BuildFace>, pts: &[DVec3], pi: usize, interior: DVec3) {
    match stitch_attempt(faces, pts, pi, interior) {
        Some((visible, new_faces)) => {
            if visible.is_empty() {
                return; // inside the current hull
            }
            let visible_set: FxHashSet<usize> = visible.iter().copied().collect();
            let mut idx = 0;
            faces.retain(|_| {
                let keep = !visible_set.contains(&idx);
                idx += 1;
                keep
            });
            faces.extend(new_faces);
        }
        None => {
            region_warn!(
                "region3d::HullBuilder",
                "skipping numerically unstable hull point {:?}",
                pts[pi]
            );
        }
    }
}

/// One stitch attempt. Returns the visible face indices and the
/// replacement fan, or `None` when the horizon produces degenerate
/// faces (or the whole hull would vanish).
///
/// A face counts as visible already at `-EPSILON`: a point ON a face
/// plane but outside the face polygon (the last corner completing a
/// box side) sees no face strictly and would be dropped as interior.
/// Treating coplanar faces as visible restitches them into a fan that
/// includes the point; the redundant coplanar facets share one plane
/// and cost nothing in the half-space tests.
fn stitch_attempt(
    faces: &[BuildFace],
    pts: &[DVec3],
    pi: usize,
    interior: DVec3,
) -> Option<(Vec<usize>, Vec<BuildFace>)> {
    let p = pts[pi];
    let visible: Vec<usize> = faces
        .iter()
        .enumerate()
        .filter(|(_, f)| f.plane.signed_distance(&p) > -EPSILON)
        .map(|(i, _)| i)
        .collect();

    if visible.is_empty() {
        return Some((visible, Vec::new()));
    }
    if visible.len() == faces.len() {
        // Every face visible means the interior reference failed;
        // refuse rather than delete the hull.
        return None;
    }

    // Directed edges of all visible faces. A horizon edge is one whose
    // reverse belongs to an unseen face, i.e. the reverse is absent here.
    let mut edges: FxHashSet<(usize, usize)> = FxHashSet::default();
    for &fi in &visible {
        let [v0, v1, v2] = faces[fi].verts;
        edges.insert((v0, v1));
        edges.insert((v1, v2));
        edges.insert((v2, v0));
    }

    let mut new_faces = Vec::new();
    for &fi in &visible {
        let [v0, v1, v2] = faces[fi].verts;
        for (ea, eb) in [(v0, v1), (v1, v2), (v2, v0)] {
            if !edges.contains(&(eb, ea)) {
                new_faces.push(oriented_face(pts, [ea, eb, pi], interior)?);
            }
        }
    }
    Some((visible, new_faces))
}

/// Re-index the finished facets against a compact vertex list (interior
/// points dropped) and audit convexity.
fn compact_polyhedron(pts: &[DVec3], faces: Vec<BuildFace>) -> Region3dResult<Hull> {
    let mut used: Vec<usize> = faces.iter().flat_map(|f| f.verts).collect();
    used.sort_unstable();
    used.dedup();

    let mut remap = vec![usize::MAX; pts.len()];
    for (new_idx, &old_idx) in used.iter().enumerate() {
        remap[old_idx] = new_idx;
    }

    let vertices: Vec<DVec3> = used.iter().map(|&i| pts[i]).collect();
    let faces: Vec<Face> = faces
        .iter()
        .map(|f| Face {
            vertices: [remap[f.verts[0]], remap[f.verts[1]], remap[f.verts[2]]],
            plane: f.plane,
        })
        .collect();

    if faces.len() < 4 {
        return Err(Region3dError::InvariantViolation(format!(
            "polyhedron ended with {} faces",
            faces.len()
        )));
    }
    for face in &faces {
        for v in &vertices {
            if face.plane.signed_distance(v) > CONVEXITY_TOLERANCE {
                return Err(Region3dError::InvariantViolation(format!(
                    "vertex {:?} lies {:.3e} outside a hull face",
                    v,
                    face.plane.signed_distance(v)
                )));
            }
        }
    }

    Ok(Hull::Polyhedron { vertices, faces })
}

#[cfg(test)]
#[path = "hull_tests.rs"]
mod tests;
