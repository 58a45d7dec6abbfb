use super::vector::Vector3D;
use crate::error::{Result, ReverbError};

const PARALLEL_EPS: f32 = 1e-9;

/// An oriented plane in Hesse normal form: `normal · p == d` on the plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane3D {
    position: Vector3D,
    dir1: Vector3D,
    dir2: Vector3D,
    normal: Vector3D,
    d: f32,
}

impl Plane3D {
    /// Plane through `position` spanned by `dir1` and `dir2`.
    ///
    /// The normal follows the right-hand rule `dir1 × dir2`.
    pub fn new(position: Vector3D, dir1: Vector3D, dir2: Vector3D) -> Result<Self> {
        let normal = dir1.cross(dir2);
        if normal.length() <= PARALLEL_EPS || !normal.is_finite() {
            return Err(ReverbError::DegeneratePlane);
        }
        let normal = normal.unit();
        Ok(Self {
            position,
            dir1: dir1.unit(),
            dir2: dir2.unit(),
            normal,
            d: normal.dot(position),
        })
    }

    pub fn normal(&self) -> Vector3D {
        self.normal
    }

    pub fn position(&self) -> Vector3D {
        self.position
    }

    pub fn directions(&self) -> (Vector3D, Vector3D) {
        (self.dir1, self.dir2)
    }

    pub fn offset(&self) -> f32 {
        self.d
    }

    /// Signed distance `d − n·p`. Positive on the side the normal points to.
    #[inline]
    pub fn distance(&self, point: Vector3D) -> f32 {
        self.d - self.normal.dot(point)
    }

    /// Mirror image of `point` across the plane.
    #[inline]
    pub fn mirror(&self, point: Vector3D) -> Vector3D {
        point + self.normal * (2.0 * self.distance(point))
    }

    /// Shortest vector from `point` onto the plane.
    #[inline]
    pub fn connection(&self, point: Vector3D) -> Vector3D {
        self.normal * self.distance(point)
    }

    /// Point where the line `from + λ·(to − from)` meets the plane.
    ///
    /// `None` when the line runs parallel to the plane.
    pub fn intersect(&self, from: Vector3D, to: Vector3D) -> Option<Vector3D> {
        let dir = to - from;
        let denom = self.normal.dot(dir);
        if denom.abs() <= PARALLEL_EPS {
            return None;
        }
        let lambda = self.distance(from) / denom;
        Some(from + dir * lambda)
    }
}
