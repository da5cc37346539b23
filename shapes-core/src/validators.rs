//! 入库前的几何合法性检查。

const TOLERANCE: f64 = 1e-10;

pub mod point {
    use super::TOLERANCE;
    use crate::geometry::{Point2, Point3};

    #[inline]
    pub fn is_finite(x: f64, y: f64, z: f64) -> bool {
        x.is_finite() && y.is_finite() && z.is_finite()
    }

    #[inline]
    pub fn is_finite_point(point: Point3) -> bool {
        point.as_vec3().is_finite()
    }

    /// 三点构成的三角形面积小于容差即视为共线。
    pub fn are_collinear(a: Point2, b: Point2, c: Point2) -> bool {
        let doubled = a.vector_to(b).cross(a.vector_to(c));
        (doubled / 2.0).abs() < TOLERANCE
    }
}

pub mod rectangle {
    use super::TOLERANCE;
    use crate::entities::Rectangle;
    use crate::geometry::{Axis, Bounds2D, Point2, Vector2};

    fn edges(rectangle: &Rectangle) -> [Vector2; 4] {
        let [p1, p2, p3, p4] = rectangle.corners();
        [
            Vector2::from_points(p1, p2),
            Vector2::from_points(p2, p3),
            Vector2::from_points(p3, p4),
            Vector2::from_points(p4, p1),
        ]
    }

    fn are_parallel(a: Vector2, b: Vector2) -> bool {
        a.cross(b).abs() < TOLERANCE
    }

    fn has_duplicate_corners(corners: &[Point2; 4]) -> bool {
        (0..corners.len())
            .any(|i| (i + 1..corners.len()).any(|j| corners[i] == corners[j]))
    }

    /// 依次取相邻两条边的叉积，符号全部一致即为凸四边形。
    fn is_convex(rectangle: &Rectangle) -> bool {
        let edges = edges(rectangle);
        let turns = [
            edges[0].cross(edges[1]),
            edges[1].cross(edges[2]),
            edges[2].cross(edges[3]),
            edges[3].cross(edges[0]),
        ];
        turns.iter().all(|turn| *turn > 0.0) || turns.iter().all(|turn| *turn < 0.0)
    }

    fn has_parallel_opposite_sides(rectangle: &Rectangle) -> bool {
        let [ab, bc, cd, da] = edges(rectangle);
        are_parallel(ab, cd) && are_parallel(bc, da)
    }

    fn side_lengths(rectangle: &Rectangle) -> [f64; 4] {
        edges(rectangle).map(Vector2::length)
    }

    fn all_equal(values: &[f64]) -> bool {
        values
            .iter()
            .all(|value| (value - values[0]).abs() < TOLERANCE)
    }

    /// 顶点互不重合、凸、对边平行。
    pub fn is_valid(rectangle: &Rectangle) -> bool {
        let corners = rectangle.corners();
        if corners
            .iter()
            .any(|corner| !corner.as_vec2().is_finite())
        {
            return false;
        }
        !has_duplicate_corners(&corners)
            && is_convex(rectangle)
            && has_parallel_opposite_sides(rectangle)
    }

    pub fn is_square(rectangle: &Rectangle) -> bool {
        if !all_equal(&side_lengths(rectangle)) {
            return false;
        }
        let [p1, p2, p3, p4] = rectangle.corners();
        (p1.distance(p3) - p2.distance(p4)).abs() < TOLERANCE
    }

    pub fn is_rhombus(rectangle: &Rectangle) -> bool {
        all_equal(&side_lengths(rectangle))
    }

    /// 至少一组对边平行。
    pub fn is_trapezoid(rectangle: &Rectangle) -> bool {
        let [ab, bc, cd, da] = edges(rectangle);
        are_parallel(ab, cd) || are_parallel(bc, da)
    }

    pub fn is_axis_aligned(rectangle: &Rectangle) -> bool {
        edges(rectangle)
            .iter()
            .all(|edge| edge.x().abs() < TOLERANCE || edge.y().abs() < TOLERANCE)
    }

    /// 矩形是否与给定坐标轴在 `distance` 处相交。
    ///
    /// `Axis::X` 检查直线 y = distance 是否穿过矩形的 y 范围，`Axis::Y` 同理；
    /// 平面矩形没有 z 向范围，`Axis::Z` 恒为 false。
    pub fn intersects_axis_at(rectangle: &Rectangle, axis: Axis, distance: f64) -> bool {
        let bounds = Bounds2D::from_points(rectangle.corners());
        match axis {
            Axis::X => bounds.min().y() <= distance && bounds.max().y() >= distance,
            Axis::Y => bounds.min().x() <= distance && bounds.max().x() >= distance,
            Axis::Z => false,
        }
    }
}

pub mod cube {
    use super::TOLERANCE;
    use crate::entities::Cube;
    use crate::geometry::{Axis, CoordinatePlane};

    pub fn is_valid(cube: &Cube) -> bool {
        let side = cube.side_length();
        side.is_finite() && side > 0.0 && super::point::is_finite_point(cube.base_point())
    }

    pub fn is_base_on_coordinate_plane(cube: &Cube) -> bool {
        CoordinatePlane::ALL
            .into_iter()
            .any(|plane| is_base_on_plane(cube, plane))
    }

    pub fn is_base_on_plane(cube: &Cube, plane: CoordinatePlane) -> bool {
        cube.base_point().coordinate(plane.normal_axis()).abs() < TOLERANCE
    }

    /// 沿 `axis` 方向，立方体是否覆盖坐标 `distance`。
    pub fn intersects_axis_at(cube: &Cube, axis: Axis, distance: f64) -> bool {
        let start = cube.base_point().coordinate(axis);
        start <= distance && start + cube.side_length() >= distance
    }

    /// 立方体模型总是轴对齐的。
    #[inline]
    pub fn is_axis_aligned(_cube: &Cube) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Cube, Rectangle};
    use crate::geometry::{Axis, CoordinatePlane, Point2, Point3};

    fn rect(id: &str, corners: [(f64, f64); 4]) -> Rectangle {
        Rectangle::new(id, corners.map(|(x, y)| Point2::new(x, y)))
    }

    #[test]
    fn accepts_proper_rectangle_and_square() {
        let r = rect("r", [(0.0, 0.0), (4.0, 0.0), (4.0, 3.0), (0.0, 3.0)]);
        assert!(rectangle::is_valid(&r));
        assert!(!rectangle::is_square(&r));
        assert!(rectangle::is_axis_aligned(&r));
        assert!(rectangle::is_trapezoid(&r));

        let s = rect("s", [(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)]);
        assert!(rectangle::is_square(&s));
        assert!(rectangle::is_rhombus(&s));
    }

    #[test]
    fn rejects_duplicate_or_concave_corners() {
        let duplicate = rect("d", [(0.0, 0.0), (0.0, 0.0), (4.0, 3.0), (0.0, 3.0)]);
        assert!(!rectangle::is_valid(&duplicate));

        let bow_tie = rect("b", [(0.0, 0.0), (4.0, 3.0), (4.0, 0.0), (0.0, 3.0)]);
        assert!(!rectangle::is_valid(&bow_tie));

        let kite = rect("k", [(0.0, 0.0), (2.0, -1.0), (4.0, 0.0), (2.0, 3.0)]);
        assert!(!rectangle::is_valid(&kite));
    }

    #[test]
    fn rhombus_is_not_square() {
        let rhombus = rect("rh", [(0.0, 0.0), (2.0, 1.0), (4.0, 0.0), (2.0, -1.0)]);
        assert!(rectangle::is_valid(&rhombus));
        assert!(rectangle::is_rhombus(&rhombus));
        assert!(!rectangle::is_square(&rhombus));
        assert!(!rectangle::is_axis_aligned(&rhombus));
    }

    #[test]
    fn rectangle_axis_intersection() {
        let r = rect("r", [(1.0, 1.0), (5.0, 1.0), (5.0, 4.0), (1.0, 4.0)]);
        assert!(rectangle::intersects_axis_at(&r, Axis::X, 2.0));
        assert!(!rectangle::intersects_axis_at(&r, Axis::X, 0.5));
        assert!(rectangle::intersects_axis_at(&r, Axis::Y, 5.0));
        assert!(!rectangle::intersects_axis_at(&r, Axis::Z, 0.0));
    }

    #[test]
    fn cube_plane_and_axis_checks() {
        let c = Cube::new("c", Point3::new(0.0, 2.0, -1.0), 3.0);
        assert!(cube::is_valid(&c));
        assert!(cube::is_base_on_coordinate_plane(&c));
        assert!(cube::is_base_on_plane(&c, CoordinatePlane::Yz));
        assert!(!cube::is_base_on_plane(&c, CoordinatePlane::Xy));
        assert!(cube::intersects_axis_at(&c, Axis::Z, 1.5));
        assert!(!cube::intersects_axis_at(&c, Axis::Y, 6.0));
        assert!(cube::is_axis_aligned(&c));

        let bad = Cube::new("bad", Point3::new(0.0, 0.0, 0.0), -2.0);
        assert!(!cube::is_valid(&bad));
    }

    #[test]
    fn collinear_points() {
        assert!(point::are_collinear(
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(3.0, 3.0)
        ));
        assert!(!point::are_collinear(
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0)
        ));
        assert!(point::is_finite(1.0, 2.0, 3.0));
        assert!(!point::is_finite(1.0, f64::INFINITY, 3.0));
    }
}
