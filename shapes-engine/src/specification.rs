//! 形状查询条件。
//!
//! 叶子条件只描述单个判断，组合通过 [`And`]、[`Or`]、[`Not`] 包装完成。

use std::ops::RangeInclusive;

use shapes_core::shape::{Metric, Shape, ShapeId};
use tracing::debug;

use crate::errors::EngineError;

pub trait Specification {
    fn is_satisfied_by(&self, shape: &dyn Shape) -> bool;
}

impl<S: Specification + ?Sized> Specification for &S {
    fn is_satisfied_by(&self, shape: &dyn Shape) -> bool {
        (**self).is_satisfied_by(shape)
    }
}

impl<S: Specification + ?Sized> Specification for Box<S> {
    fn is_satisfied_by(&self, shape: &dyn Shape) -> bool {
        (**self).is_satisfied_by(shape)
    }
}

/// 组合方法，对所有条件自动可用。
pub trait SpecificationExt: Specification + Sized {
    fn and<O: Specification>(self, other: O) -> And<Self, O> {
        And(self, other)
    }

    fn or<O: Specification>(self, other: O) -> Or<Self, O> {
        Or(self, other)
    }

    fn not(self) -> Not<Self> {
        Not(self)
    }
}

impl<S: Specification> SpecificationExt for S {}

#[derive(Debug, Clone)]
pub struct And<A, B>(pub A, pub B);

impl<A: Specification, B: Specification> Specification for And<A, B> {
    fn is_satisfied_by(&self, shape: &dyn Shape) -> bool {
        self.0.is_satisfied_by(shape) && self.1.is_satisfied_by(shape)
    }
}

#[derive(Debug, Clone)]
pub struct Or<A, B>(pub A, pub B);

impl<A: Specification, B: Specification> Specification for Or<A, B> {
    fn is_satisfied_by(&self, shape: &dyn Shape) -> bool {
        self.0.is_satisfied_by(shape) || self.1.is_satisfied_by(shape)
    }
}

#[derive(Debug, Clone)]
pub struct Not<S>(pub S);

impl<S: Specification> Specification for Not<S> {
    fn is_satisfied_by(&self, shape: &dyn Shape) -> bool {
        !self.0.is_satisfied_by(shape)
    }
}

fn validated_range(
    min: f64,
    max: f64,
    what: &str,
) -> Result<RangeInclusive<f64>, EngineError> {
    // 上界允许为 +inf，表示不设上限
    if min.is_nan() || max.is_nan() || min < 0.0 || max < 0.0 || min > max {
        return Err(EngineError::InvalidArgument(format!(
            "invalid {what} range [{min}, {max}]"
        )));
    }
    Ok(min..=max)
}

#[derive(Debug, Clone)]
pub struct ById {
    id: ShapeId,
}

impl ById {
    pub fn new(id: impl Into<ShapeId>) -> Self {
        Self { id: id.into() }
    }
}

impl Specification for ById {
    fn is_satisfied_by(&self, shape: &dyn Shape) -> bool {
        shape.id() == &self.id
    }
}

#[derive(Debug, Clone)]
pub struct ByKind {
    kind: String,
}

impl ByKind {
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into() }
    }
}

impl Specification for ByKind {
    fn is_satisfied_by(&self, shape: &dyn Shape) -> bool {
        shape.kind() == self.kind
    }
}

/// 按代表点所在象限筛选，坐标轴上的点归入非负一侧。
#[derive(Debug, Clone, Copy)]
pub struct ByQuadrant {
    quadrant: u8,
}

impl ByQuadrant {
    pub fn new(quadrant: i32) -> Result<Self, EngineError> {
        match u8::try_from(quadrant) {
            Ok(quadrant @ 1..=4) => Ok(Self { quadrant }),
            _ => Err(EngineError::InvalidArgument(format!(
                "quadrant must be between 1 and 4, got {quadrant}"
            ))),
        }
    }

    #[inline]
    pub fn quadrant(&self) -> u8 {
        self.quadrant
    }
}

impl Specification for ByQuadrant {
    fn is_satisfied_by(&self, shape: &dyn Shape) -> bool {
        let Some(point) = shape.representative_point() else {
            return false;
        };
        let (x, y) = (point.x(), point.y());
        match self.quadrant {
            1 => x >= 0.0 && y >= 0.0,
            2 => x < 0.0 && y >= 0.0,
            3 => x < 0.0 && y < 0.0,
            4 => x >= 0.0 && y < 0.0,
            _ => false,
        }
    }
}

/// 代表点到原点的欧氏距离落在闭区间内。
#[derive(Debug, Clone)]
pub struct ByDistanceFromOrigin {
    range: RangeInclusive<f64>,
}

impl ByDistanceFromOrigin {
    pub fn new(min: f64, max: f64) -> Result<Self, EngineError> {
        Ok(Self {
            range: validated_range(min, max, "distance")?,
        })
    }
}

impl Specification for ByDistanceFromOrigin {
    fn is_satisfied_by(&self, shape: &dyn Shape) -> bool {
        shape
            .representative_point()
            .is_some_and(|point| self.range.contains(&point.distance_from_origin()))
    }
}

/// 派生量落在闭区间内。
///
/// 形状不具备该派生量时不满足条件；计算失败的形状同样被排除，不会中断扫描。
#[derive(Debug, Clone)]
pub struct ByMetricRange {
    metric: Metric,
    range: RangeInclusive<f64>,
}

impl ByMetricRange {
    pub fn new(metric: Metric, min: f64, max: f64) -> Result<Self, EngineError> {
        Ok(Self {
            metric,
            range: validated_range(min, max, metric.name())?,
        })
    }

    pub fn area(min: f64, max: f64) -> Result<Self, EngineError> {
        Self::new(Metric::Area, min, max)
    }

    pub fn volume(min: f64, max: f64) -> Result<Self, EngineError> {
        Self::new(Metric::Volume, min, max)
    }

    pub fn perimeter(min: f64, max: f64) -> Result<Self, EngineError> {
        Self::new(Metric::Perimeter, min, max)
    }

    pub fn surface_area(min: f64, max: f64) -> Result<Self, EngineError> {
        Self::new(Metric::SurfaceArea, min, max)
    }

    #[inline]
    pub fn metric(&self) -> Metric {
        self.metric
    }
}

impl Specification for ByMetricRange {
    fn is_satisfied_by(&self, shape: &dyn Shape) -> bool {
        match self.metric.compute(shape) {
            None => false,
            Some(Ok(value)) => self.range.contains(&value),
            Some(Err(err)) => {
                debug!(shape_id = %shape.id(), metric = %self.metric, error = %err, "派生量计算失败，跳过该形状");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use shapes_core::entities::{Cube, Rectangle};
    use shapes_core::geometry::{Point2, Point3};

    use super::*;

    fn rect_at(id: &str, x: f64, y: f64, w: f64, h: f64) -> Rectangle {
        Rectangle::new(
            id,
            [
                Point2::new(x, y),
                Point2::new(x + w, y),
                Point2::new(x + w, y + h),
                Point2::new(x, y + h),
            ],
        )
    }

    #[test]
    fn quadrant_validates_and_matches_sign_pattern() {
        assert!(matches!(
            ByQuadrant::new(5),
            Err(EngineError::InvalidArgument(_))
        ));
        assert!(ByQuadrant::new(0).is_err());
        assert!(ByQuadrant::new(-2).is_err());

        let second = ByQuadrant::new(2).expect("valid quadrant");
        assert!(second.is_satisfied_by(&rect_at("a", -1.0, 1.0, 1.0, 1.0)));
        assert!(!second.is_satisfied_by(&rect_at("b", 1.0, 1.0, 1.0, 1.0)));

        let third = ByQuadrant::new(3).unwrap();
        let fourth = ByQuadrant::new(4).unwrap();
        let cube = Cube::new("c", Point3::new(-2.0, -3.0, 9.0), 1.0);
        assert!(third.is_satisfied_by(&cube));
        assert!(!fourth.is_satisfied_by(&cube));

        let origin = rect_at("o", 0.0, 0.0, 1.0, 1.0);
        assert!(ByQuadrant::new(1).unwrap().is_satisfied_by(&origin));
    }

    #[test]
    fn distance_range_validation() {
        assert!(matches!(
            ByDistanceFromOrigin::new(10.0, 5.0),
            Err(EngineError::InvalidArgument(_))
        ));
        assert!(ByDistanceFromOrigin::new(-1.0, 5.0).is_err());
        assert!(ByDistanceFromOrigin::new(0.0, f64::NAN).is_err());
        assert!(ByDistanceFromOrigin::new(5.0, 5.0).is_ok());
    }

    #[test]
    fn infinite_upper_bound_means_unbounded() {
        let far_cube = Cube::new("far", Point3::new(3.0e6, 4.0e6, 0.0), 1.0e4);
        let any_distance = ByDistanceFromOrigin::new(0.0, f64::INFINITY).expect("unbounded distance");
        assert!(any_distance.is_satisfied_by(&far_cube));

        let any_area = ByMetricRange::area(0.0, f64::INFINITY).expect("unbounded area");
        assert!(any_area.is_satisfied_by(&rect_at("huge", 0.0, 0.0, 1.0e8, 1.0e8)));
        assert!(!any_area.is_satisfied_by(&far_cube));

        let large_volume = ByMetricRange::volume(1.0e9, f64::INFINITY).expect("lower bound only");
        assert!(large_volume.is_satisfied_by(&far_cube));
        assert!(!large_volume.is_satisfied_by(&Cube::new("small", Point3::new(0.0, 0.0, 0.0), 1.0)));

        assert!(ByMetricRange::area(f64::NAN, 1.0).is_err());
        assert!(ByMetricRange::area(0.0, f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn distance_uses_three_dimensions_for_solids() {
        let spec = ByDistanceFromOrigin::new(5.0, 5.0).unwrap();
        assert!(spec.is_satisfied_by(&rect_at("r", 3.0, 4.0, 1.0, 1.0)));
        assert!(!spec.is_satisfied_by(&Cube::new("c", Point3::new(3.0, 4.0, 12.0), 1.0)));

        let far = ByDistanceFromOrigin::new(13.0, 13.0).unwrap();
        assert!(far.is_satisfied_by(&Cube::new("c", Point3::new(3.0, 4.0, 12.0), 1.0)));
    }

    #[test]
    fn metric_ranges_ignore_wrong_kind_and_failures() {
        let area = ByMetricRange::area(10.0, 20.0).unwrap();
        let rect = rect_at("r", 0.0, 0.0, 4.0, 3.0);
        let cube = Cube::new("c", Point3::new(0.0, 0.0, 0.0), 2.0);
        assert!(area.is_satisfied_by(&rect));
        assert!(!area.is_satisfied_by(&cube));

        let volume = ByMetricRange::volume(8.0, 8.0).unwrap();
        assert!(volume.is_satisfied_by(&cube));
        assert!(!volume.is_satisfied_by(&rect));

        let perimeter = ByMetricRange::perimeter(0.0, 13.9).unwrap();
        assert!(!perimeter.is_satisfied_by(&rect));

        let degenerate = Cube::new("d", Point3::new(0.0, 0.0, 0.0), 0.0);
        assert!(!ByMetricRange::volume(0.0, 100.0).unwrap().is_satisfied_by(&degenerate));

        assert!(ByMetricRange::area(5.0, 1.0).is_err());
    }

    #[test]
    fn composition_wraps_leaves() {
        let cube_near = Cube::new("near", Point3::new(1.0, 1.0, 0.0), 2.0);
        let cube_far = Cube::new("far", Point3::new(-30.0, 40.0, 0.0), 2.0);
        let rect = rect_at("rect", 1.0, 1.0, 2.0, 2.0);

        let first_quadrant_cube = ByQuadrant::new(1).unwrap().and(ByKind::new(Cube::KIND));
        assert!(first_quadrant_cube.is_satisfied_by(&cube_near));
        assert!(!first_quadrant_cube.is_satisfied_by(&rect));
        assert!(!first_quadrant_cube.is_satisfied_by(&cube_far));

        let either = ById::new("far").or(ById::new("rect"));
        assert!(either.is_satisfied_by(&cube_far));
        assert!(either.is_satisfied_by(&rect));
        assert!(!either.is_satisfied_by(&cube_near));

        let not_near = ById::new("near").not();
        assert!(!not_near.is_satisfied_by(&cube_near));
        assert!(not_near.is_satisfied_by(&rect));

        let boxed: Vec<Box<dyn Specification>> = vec![
            Box::new(ByDistanceFromOrigin::new(0.0, 10.0).unwrap()),
            Box::new(ByKind::new(Rectangle::KIND).not()),
        ];
        assert!(all_of(&boxed, &cube_near));
        assert!(!all_of(&boxed, &rect));
        assert!(!all_of(&boxed, &cube_far));
    }

    fn all_of(specs: &[Box<dyn Specification>], shape: &dyn Shape) -> bool {
        specs.iter().all(|spec| spec.is_satisfied_by(shape))
    }
}
