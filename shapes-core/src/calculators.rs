//! 各形状的几何计算。所有函数都是纯函数，退化输入返回 [`ComputationError`]。

/// 矩形计算：顶点按环绕顺序排列，边长取相邻顶点距离。
pub mod rectangle {
    use crate::entities::Rectangle;
    use crate::errors::ComputationError;

    const MIN_SIDE: f64 = 1e-12;

    fn sides(rectangle: &Rectangle) -> Result<[f64; 4], ComputationError> {
        let [p1, p2, p3, p4] = rectangle.corners();
        let sides = [
            p1.distance(p2),
            p2.distance(p3),
            p3.distance(p4),
            p4.distance(p1),
        ];
        for side in sides {
            if !side.is_finite() {
                return Err(ComputationError::NonFiniteValue {
                    shape: Rectangle::KIND,
                    dimension: "side",
                });
            }
            if side < MIN_SIDE {
                return Err(ComputationError::NonPositiveDimension {
                    shape: Rectangle::KIND,
                    dimension: "side",
                    value: side,
                });
            }
        }
        Ok(sides)
    }

    pub fn area(rectangle: &Rectangle) -> Result<f64, ComputationError> {
        let [first, second, ..] = sides(rectangle)?;
        Ok(first * second)
    }

    pub fn perimeter(rectangle: &Rectangle) -> Result<f64, ComputationError> {
        Ok(sides(rectangle)?.iter().sum())
    }

    /// 第一、第三顶点之间的对角线。
    pub fn diagonal(rectangle: &Rectangle) -> Result<f64, ComputationError> {
        sides(rectangle)?;
        let [p1, _, p3, _] = rectangle.corners();
        Ok(p1.distance(p3))
    }
}

pub mod cube {
    use crate::entities::Cube;
    use crate::errors::ComputationError;
    use crate::geometry::CoordinatePlane;

    fn checked_side(cube: &Cube) -> Result<f64, ComputationError> {
        let side = cube.side_length();
        if !side.is_finite() {
            return Err(ComputationError::NonFiniteValue {
                shape: Cube::KIND,
                dimension: "side length",
            });
        }
        if side <= 0.0 {
            return Err(ComputationError::NonPositiveDimension {
                shape: Cube::KIND,
                dimension: "side length",
                value: side,
            });
        }
        Ok(side)
    }

    pub fn volume(cube: &Cube) -> Result<f64, ComputationError> {
        let side = checked_side(cube)?;
        Ok(side * side * side)
    }

    pub fn surface_area(cube: &Cube) -> Result<f64, ComputationError> {
        let side = checked_side(cube)?;
        Ok(6.0 * side * side)
    }

    pub fn space_diagonal(cube: &Cube) -> Result<f64, ComputationError> {
        Ok(checked_side(cube)? * 3f64.sqrt())
    }

    pub fn face_diagonal(cube: &Cube) -> Result<f64, ComputationError> {
        Ok(checked_side(cube)? * 2f64.sqrt())
    }

    /// 坐标平面切分立方体后，较小部分与较大部分的体积比。
    ///
    /// 以基点到平面的距离 d 作为切分位置：d 为 0 时返回 0，d 不小于边长时返回 1。
    pub fn volume_ratio_by_plane(
        cube: &Cube,
        plane: CoordinatePlane,
    ) -> Result<f64, ComputationError> {
        let side = checked_side(cube)?;
        let distance = cube.base_point().coordinate(plane.normal_axis()).abs();
        if distance <= 0.0 {
            return Ok(0.0);
        }
        if distance >= side {
            return Ok(1.0);
        }
        let near = distance.powi(3);
        let far = (side - distance).powi(3);
        Ok(near.min(far) / near.max(far))
    }
}
