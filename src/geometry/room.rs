//! Shoebox room and its image sources.
//!
//! ```text
//!   Unfolding along one axis (x, room width X, source at s):
//!
//!   rank:   -2        -1        0         +1        +2
//!        |  s-2X  |  -s    |   s    |  2X-s  |  s+2X  |
//!       -2X      -X        0        X        2X       3X
//!
//!   Δ+ = 2·(X - s)   (twice the connection to the far wall)
//!   Δ- = 2·(0 - s)   (twice the connection to the near wall)
//!
//!   rank  s > 0:   Δ+·ceil(s/2) − Δ-·floor(s/2)
//!   rank  s < 0:   Δ-·ceil(|s|/2) − Δ+·floor(|s|/2)
//! ```
//!
//! The three axes unfold independently, so an image source at ranks
//! (z, y, x) is the source plus the three per-axis offsets. Its reflection
//! order is `|z| + |y| + |x|`: the number of wall bounces on the path.

use super::plane::Plane3D;
use super::vector::Vector3D;
use crate::error::{Result, ReverbError};

/// Wall slots in [`Room::walls`].
pub const WALL_RIGHT: usize = 0; // x = X
pub const WALL_BACK: usize = 1; // y = Y
pub const WALL_LEFT: usize = 2; // x = 0
pub const WALL_FRONT: usize = 3; // y = 0
pub const WALL_CEILING: usize = 4; // z = Z
pub const WALL_FLOOR: usize = 5; // z = 0

/// (far wall, near wall) per axis.
const AXIS_WALLS: [(usize, usize); 3] = [
    (WALL_RIGHT, WALL_LEFT),
    (WALL_BACK, WALL_FRONT),
    (WALL_CEILING, WALL_FLOOR),
];

/// Image sources added per z-plane at order `k`: `4·Σ i` for `i` in `1..=k`.
pub fn srcs_per_plane(order: usize) -> usize {
    2 * order * (order + 1)
}

/// Total image sources for orders `1..=order`.
pub fn n_mirror_sources(order: usize) -> usize {
    (1..=order).fold(0, |n, k| n + srcs_per_plane(k) + srcs_per_plane(k - 1) + 2)
}

/// Image sources of exactly order `k`. Order 0 is the source itself.
pub fn shell_size(order: usize) -> usize {
    if order == 0 {
        1
    } else {
        4 * order * order + 2
    }
}

/// Image-source positions indexed by signed (plane, row, column) ranks,
/// which are the z, y and x unfold counts.
///
/// Allocated once for a maximum order and overwritten in place.
#[derive(Debug, Clone)]
pub struct MirrorSourceSet {
    order: usize,
    side: usize,
    cells: Vec<Vector3D>,
}

impl MirrorSourceSet {
    pub fn new(order: usize) -> Self {
        let side = 2 * order + 1;
        Self {
            order,
            side,
            cells: vec![Vector3D::ZERO; side * side * side],
        }
    }

    pub fn order(&self) -> usize {
        self.order
    }

    #[inline]
    fn index(&self, plane: i32, row: i32, col: i32) -> usize {
        let o = self.order as i32;
        debug_assert!(plane.abs() <= o && row.abs() <= o && col.abs() <= o);
        (((plane + o) as usize * self.side) + (row + o) as usize) * self.side + (col + o) as usize
    }

    /// Position at ranks (plane = z, row = y, col = x).
    #[inline]
    pub fn get(&self, plane: i32, row: i32, col: i32) -> Vector3D {
        self.cells[self.index(plane, row, col)]
    }

    #[inline]
    fn set(&mut self, plane: i32, row: i32, col: i32, value: Vector3D) {
        let i = self.index(plane, row, col);
        self.cells[i] = value;
    }
}

/// Rectangular room spanning `[0, X] × [0, Y] × [0, Z]`.
#[derive(Debug, Clone)]
pub struct Room {
    dimensions: [f32; 3],
    walls: [Plane3D; 6],
}

impl Room {
    pub fn new(x: f32, y: f32, z: f32) -> Result<Self> {
        let walls = Self::build_walls(x, y, z)?;
        Ok(Self {
            dimensions: [x, y, z],
            walls,
        })
    }

    /// Resize the room. On error the previous walls stay in place.
    pub fn set_dimensions(&mut self, x: f32, y: f32, z: f32) -> Result<()> {
        self.walls = Self::build_walls(x, y, z)?;
        self.dimensions = [x, y, z];
        Ok(())
    }

    fn build_walls(x: f32, y: f32, z: f32) -> Result<[Plane3D; 6]> {
        if ![x, y, z].iter().all(|e| e.is_finite() && *e > 0.0) {
            return Err(ReverbError::InvalidRoom { x, y, z });
        }
        let ex = Vector3D::new(1.0, 0.0, 0.0);
        let ey = Vector3D::new(0.0, 1.0, 0.0);
        let ez = Vector3D::new(0.0, 0.0, 1.0);
        Ok([
            Plane3D::new(Vector3D::new(x, 0.0, 0.0), ey, ez)?,
            Plane3D::new(Vector3D::new(0.0, y, 0.0), ez, ex)?,
            Plane3D::new(Vector3D::ZERO, ey, ez)?,
            Plane3D::new(Vector3D::ZERO, ez, ex)?,
            Plane3D::new(Vector3D::new(0.0, 0.0, z), ex, ey)?,
            Plane3D::new(Vector3D::ZERO, ex, ey)?,
        ])
    }

    pub fn x_size(&self) -> f32 {
        self.dimensions[0]
    }

    pub fn y_size(&self) -> f32 {
        self.dimensions[1]
    }

    pub fn z_size(&self) -> f32 {
        self.dimensions[2]
    }

    pub fn dimensions(&self) -> [f32; 3] {
        self.dimensions
    }

    pub fn volume(&self) -> f32 {
        let [x, y, z] = self.dimensions;
        x * y * z
    }

    pub fn surface(&self) -> f32 {
        let [x, y, z] = self.dimensions;
        2.0 * (x * y + x * z + y * z)
    }

    pub fn wall(&self, index: usize) -> &Plane3D {
        &self.walls[index]
    }

    pub fn walls(&self) -> &[Plane3D; 6] {
        &self.walls
    }

    /// Strictly inside the floor plan. Height is not checked.
    pub fn contains_horizontal(&self, point: Vector3D) -> bool {
        point.x > 0.0 && point.y > 0.0 && point.x < self.x_size() && point.y < self.y_size()
    }

    /// Fill `set` with every image source of `source` up to `order`.
    ///
    /// Cells whose reflection order exceeds `order` are left untouched. The
    /// order is capped at the capacity of `set`.
    pub fn mirror_point(&self, source: Vector3D, order: usize, set: &mut MirrorSourceSet) {
        debug_assert!(order <= set.order(), "mirror set too small for order {order}");
        let o = order.min(set.order()) as i32;

        let mut deltas = [(Vector3D::ZERO, Vector3D::ZERO); 3];
        for (delta, &(far, near)) in deltas.iter_mut().zip(AXIS_WALLS.iter()) {
            *delta = (
                self.walls[far].connection(source) * 2.0,
                self.walls[near].connection(source) * 2.0,
            );
        }
        let [dx, dy, dz] = deltas;

        for plane in -o..=o {
            let z_off = unfold(dz, plane);
            let rest = o - plane.abs();
            for row in -rest..=rest {
                let y_off = unfold(dy, row);
                let rest = o - plane.abs() - row.abs();
                for col in -rest..=rest {
                    set.set(plane, row, col, source + z_off + y_off + unfold(dx, col));
                }
            }
        }
    }

    /// Copy the image sources of exactly `order` into `out`.
    ///
    /// Sources come plane-major (z rank ascending), then row (y), then column
    /// (x). Returns how many were written, never more than `out.len()`.
    pub fn extract_order(&self, order: usize, set: &MirrorSourceSet, out: &mut [Vector3D]) -> usize {
        if order > set.order() {
            return 0;
        }
        let k = order as i32;
        let mut n = 0;
        for plane in -k..=k {
            let rest = k - plane.abs();
            for row in -rest..=rest {
                let rest = k - plane.abs() - row.abs();
                for col in -rest..=rest {
                    if plane.abs() + row.abs() + col.abs() != k {
                        continue;
                    }
                    let Some(slot) = out.get_mut(n) else {
                        return n;
                    };
                    *slot = set.get(plane, row, col);
                    n += 1;
                }
            }
        }
        n
    }

    /// Distances from `observer` to every image source of orders `1..=order`,
    /// in extraction order.
    ///
    /// Allocates; meant for analysis, not for the audio thread.
    pub fn mirror_distances(&self, point: Vector3D, observer: Vector3D, order: usize) -> Vec<f32> {
        let mut set = MirrorSourceSet::new(order);
        self.mirror_point(point, order, &mut set);

        let mut shell = vec![Vector3D::ZERO; shell_size(order)];
        let mut distances = Vec::with_capacity(n_mirror_sources(order));
        for k in 1..=order {
            let n = self.extract_order(k, &set, &mut shell);
            distances.extend(shell[..n].iter().map(|m| observer.distance_to(*m)));
        }
        distances
    }
}

#[inline]
fn unfold((plus, minus): (Vector3D, Vector3D), rank: i32) -> Vector3D {
    let r = rank.unsigned_abs() as f32;
    let (ceil, floor) = ((r / 2.0).ceil(), (r / 2.0).floor());
    match rank.signum() {
        1 => plus * ceil - minus * floor,
        -1 => minus * ceil - plus * floor,
        _ => Vector3D::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn small_room() -> Room {
        Room::new(4.0, 6.0, 3.0).unwrap()
    }

    #[test]
    fn test_counts_follow_recurrence() {
        assert_eq!(n_mirror_sources(0), 0);
        assert_eq!(n_mirror_sources(1), 6);
        for k in 2..8 {
            assert_eq!(
                n_mirror_sources(k) - n_mirror_sources(k - 1),
                srcs_per_plane(k) + srcs_per_plane(k - 1) + 2,
                "order {k}"
            );
            assert_eq!(n_mirror_sources(k) - n_mirror_sources(k - 1), shell_size(k));
        }
        assert_eq!(srcs_per_plane(3), 4 * (1 + 2 + 3));
    }

    #[test]
    fn test_invalid_dimensions() {
        assert!(Room::new(0.0, 1.0, 1.0).is_err());
        assert!(Room::new(1.0, f32::NAN, 1.0).is_err());

        let mut room = small_room();
        assert!(room.set_dimensions(1.0, -2.0, 1.0).is_err());
        assert_eq!(room.dimensions(), [4.0, 6.0, 3.0]);
    }

    #[test]
    fn test_volume_and_surface() {
        let room = small_room();
        assert_relative_eq!(room.volume(), 72.0);
        assert_relative_eq!(room.surface(), 2.0 * (24.0 + 12.0 + 18.0));
    }

    #[test]
    fn test_walls_rebuilt_on_resize() {
        let mut room = small_room();
        room.set_dimensions(10.0, 6.0, 3.0).unwrap();
        let p = Vector3D::new(1.0, 1.0, 1.0);
        let mirrored = room.wall(WALL_RIGHT).mirror(p);
        assert_relative_eq!(mirrored.x, 19.0);
    }

    #[test]
    fn test_first_order_matches_wall_mirrors() {
        let room = small_room();
        let source = Vector3D::new(2.5, 3.0, 1.5);
        let mut set = MirrorSourceSet::new(1);
        room.mirror_point(source, 1, &mut set);

        let mut shell = [Vector3D::ZERO; 6];
        assert_eq!(room.extract_order(1, &set, &mut shell), 6);

        for wall in room.walls() {
            let expected = wall.mirror(source);
            assert!(
                shell.iter().any(|m| m.distance_to(expected) < 1e-4),
                "missing mirror {expected}"
            );
        }
    }

    #[test]
    fn test_extraction_order_is_plane_row_column() {
        let room = small_room();
        let source = Vector3D::new(2.5, 3.0, 1.5);
        let mut set = MirrorSourceSet::new(1);
        room.mirror_point(source, 1, &mut set);

        let mut shell = [Vector3D::ZERO; 6];
        room.extract_order(1, &set, &mut shell);
        // floor, front, left, right, back, ceiling
        assert_relative_eq!(shell[0].z, -1.5);
        assert_relative_eq!(shell[1].y, -3.0);
        assert_relative_eq!(shell[2].x, -2.5);
        assert_relative_eq!(shell[3].x, 5.5);
        assert_relative_eq!(shell[4].y, 9.0);
        assert_relative_eq!(shell[5].z, 4.5);
    }

    #[test]
    fn test_second_order_unfolds_twice() {
        let room = small_room();
        let source = Vector3D::new(1.0, 2.0, 1.0);
        let mut set = MirrorSourceSet::new(2);
        room.mirror_point(source, 2, &mut set);

        assert_relative_eq!(set.get(0, 0, 2).x, 1.0 + 8.0);
        assert_relative_eq!(set.get(0, 0, -2).x, 1.0 - 8.0);
        assert_relative_eq!(set.get(0, 0, 1).x, 7.0);
        let corner = set.get(1, 1, 0);
        assert_relative_eq!(corner.y, 10.0);
        assert_relative_eq!(corner.z, 5.0);
    }

    #[test]
    fn test_shell_sizes_match_extraction() {
        let room = small_room();
        let mut set = MirrorSourceSet::new(5);
        room.mirror_point(Vector3D::new(1.0, 1.0, 1.0), 5, &mut set);

        let mut shell = vec![Vector3D::ZERO; shell_size(5)];
        for k in 1..=5 {
            assert_eq!(room.extract_order(k, &set, &mut shell), shell_size(k));
        }
        assert_eq!(room.extract_order(6, &set, &mut shell), 0);
    }

    #[test]
    fn test_mirror_distances() {
        let room = small_room();
        let listener = Vector3D::new(2.0, 3.0, 1.5);
        let source = Vector3D::new(2.5, 3.0, 1.5);
        let distances = room.mirror_distances(source, listener, 2);

        assert_eq!(distances.len(), n_mirror_sources(2));
        let first = &distances[..6];
        assert!(first.iter().any(|d| (d - 3.5).abs() < 1e-4));
        assert!(first.iter().any(|d| (d - 4.5).abs() < 1e-4));
    }
}
