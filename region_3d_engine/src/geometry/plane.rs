/// Oriented plane in Hessian normal form.
///
/// A plane is (normal, offset) with `normal · p = offset` for points on
/// the plane and a unit-length normal. Hull faces store one; the signed
/// distance is the half-space test everything else is built on.

use glam::DVec3;

use super::EPSILON;

/// Plane given by a unit normal and signed offset (`normal · p = offset`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit-length plane normal
    pub normal: DVec3,
    /// Signed distance of the plane from the origin along `normal`
    pub offset: f64,
}

impl Plane {
    /// Create a plane from a unit normal and offset.
    pub fn new(normal: DVec3, offset: f64) -> Self {
        Self { normal, offset }
    }

    /// Plane through three points, normal oriented by the right-hand
    /// rule on `(b - a) x (c - a)`.
    ///
    /// Returns `None` if the points are (near-)collinear and span no
    /// usable plane.
    pub fn from_points(a: DVec3, b: DVec3, c: DVec3) -> Option<Self> {
        let cross = (b - a).cross(c - a);
        let len = cross.length();
        if len <= EPSILON {
            return None;
        }
        let normal = cross / len;
        Some(Self {
            normal,
            offset: normal.dot(a),
        })
    }

    /// Signed distance from a point to the plane.
    ///
    /// Positive in front of the plane (the side `normal` points to),
    /// negative behind, zero on the plane.
    pub fn signed_distance(&self, p: &DVec3) -> f64 {
        self.normal.dot(*p) - self.offset
    }

    /// The same plane with its orientation reversed.
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            offset: -self.offset,
        }
    }
}

#[cfg(test)]
#[path = "plane_tests.rs"]
mod tests;
