use std::cell::Cell;

use crate::calculators;
use crate::errors::ComputationError;
use crate::geometry::{Point2, Point3, Vector2};
use crate::observer::ShapeSubject;
use crate::shape::{PlanarMeasure, Shape, ShapeId, SolidMeasure};

/// 由四个顶点（按环绕顺序）描述的矩形。
///
/// 顶点可以整体替换或平移，每次实际变化都会同步通知观察者。
#[derive(Debug)]
pub struct Rectangle {
    id: ShapeId,
    corners: Cell<[Point2; 4]>,
    subject: ShapeSubject,
}

impl Rectangle {
    pub const KIND: &'static str = "Rectangle";

    pub fn new(id: impl Into<ShapeId>, corners: [Point2; 4]) -> Self {
        Self {
            id: id.into(),
            corners: Cell::new(corners),
            subject: ShapeSubject::new(),
        }
    }

    #[inline]
    pub fn corners(&self) -> [Point2; 4] {
        self.corners.get()
    }

    #[inline]
    pub fn first_corner(&self) -> Point2 {
        self.corners.get()[0]
    }

    /// 替换全部顶点；与当前值相同时不通知。
    pub fn set_corners(&self, corners: [Point2; 4]) {
        if self.corners.get() == corners {
            return;
        }
        self.corners.set(corners);
        self.subject.notify(&self.id);
    }

    pub fn translate(&self, offset: Vector2) {
        let moved = self.corners.get().map(|corner| corner.translate(offset));
        self.set_corners(moved);
    }
}

impl Shape for Rectangle {
    fn id(&self) -> &ShapeId {
        &self.id
    }

    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn representative_point(&self) -> Option<Point3> {
        Some(self.first_corner().to_point3())
    }

    fn as_planar(&self) -> Option<&dyn PlanarMeasure> {
        Some(self)
    }

    fn subject(&self) -> &ShapeSubject {
        &self.subject
    }
}

impl PlanarMeasure for Rectangle {
    fn area(&self) -> Result<f64, ComputationError> {
        calculators::rectangle::area(self)
    }

    fn perimeter(&self) -> Result<f64, ComputationError> {
        calculators::rectangle::perimeter(self)
    }
}

/// 轴对齐立方体，以最小角为基点。
#[derive(Debug)]
pub struct Cube {
    id: ShapeId,
    base_point: Cell<Point3>,
    side_length: Cell<f64>,
    subject: ShapeSubject,
}

impl Cube {
    pub const KIND: &'static str = "Cube";

    pub fn new(id: impl Into<ShapeId>, base_point: Point3, side_length: f64) -> Self {
        Self {
            id: id.into(),
            base_point: Cell::new(base_point),
            side_length: Cell::new(side_length),
            subject: ShapeSubject::new(),
        }
    }

    #[inline]
    pub fn base_point(&self) -> Point3 {
        self.base_point.get()
    }

    #[inline]
    pub fn side_length(&self) -> f64 {
        self.side_length.get()
    }

    /// 修改边长。非正或非有限值被拒绝，立方体保持不变。
    pub fn set_side_length(&self, value: f64) -> Result<(), ComputationError> {
        if !value.is_finite() {
            return Err(ComputationError::NonFiniteValue {
                shape: Self::KIND,
                dimension: "side length",
            });
        }
        if value <= 0.0 {
            return Err(ComputationError::NonPositiveDimension {
                shape: Self::KIND,
                dimension: "side length",
                value,
            });
        }
        if self.side_length.get() != value {
            self.side_length.set(value);
            self.subject.notify(&self.id);
        }
        Ok(())
    }

    pub fn set_base_point(&self, point: Point3) {
        if self.base_point.get() != point {
            self.base_point.set(point);
            self.subject.notify(&self.id);
        }
    }
}

impl Shape for Cube {
    fn id(&self) -> &ShapeId {
        &self.id
    }

    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn representative_point(&self) -> Option<Point3> {
        Some(self.base_point())
    }

    fn as_solid(&self) -> Option<&dyn SolidMeasure> {
        Some(self)
    }

    fn subject(&self) -> &ShapeSubject {
        &self.subject
    }
}

impl SolidMeasure for Cube {
    fn volume(&self) -> Result<f64, ComputationError> {
        calculators::cube::volume(self)
    }

    fn surface_area(&self) -> Result<f64, ComputationError> {
        calculators::cube::surface_area(self)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::observer::ShapeObserver;

    #[derive(Default)]
    struct Counter {
        hits: Cell<usize>,
    }

    impl ShapeObserver for Counter {
        fn update(&self, _shape_id: &ShapeId) {
            self.hits.set(self.hits.get() + 1);
        }
    }

    #[test]
    fn cube_notifies_only_on_actual_change() {
        let cube = Cube::new("c1", Point3::new(1.0, 2.0, 3.0), 2.0);
        let counter = Rc::new(Counter::default());
        cube.subject().attach(&counter);

        cube.set_side_length(2.0).expect("same value is accepted");
        assert_eq!(counter.hits.get(), 0);

        cube.set_side_length(3.0).expect("positive side");
        assert_eq!(counter.hits.get(), 1);
        assert_eq!(cube.side_length(), 3.0);

        cube.set_base_point(Point3::new(1.0, 2.0, 3.0));
        assert_eq!(counter.hits.get(), 1);
        cube.set_base_point(Point3::new(0.0, 0.0, 0.0));
        assert_eq!(counter.hits.get(), 2);
    }

    #[test]
    fn cube_rejects_invalid_side_without_notifying() {
        let cube = Cube::new("c1", Point3::new(0.0, 0.0, 0.0), 2.0);
        let counter = Rc::new(Counter::default());
        cube.subject().attach(&counter);

        let err = cube.set_side_length(-1.0).unwrap_err();
        assert!(matches!(
            err,
            ComputationError::NonPositiveDimension { .. }
        ));
        let err = cube.set_side_length(f64::NAN).unwrap_err();
        assert!(matches!(err, ComputationError::NonFiniteValue { .. }));

        assert_eq!(cube.side_length(), 2.0);
        assert_eq!(counter.hits.get(), 0);
    }

    #[test]
    fn rectangle_translate_moves_every_corner() {
        let rect = Rectangle::new(
            "r1",
            [
                Point2::new(0.0, 0.0),
                Point2::new(2.0, 0.0),
                Point2::new(2.0, 1.0),
                Point2::new(0.0, 1.0),
            ],
        );
        let counter = Rc::new(Counter::default());
        rect.subject().attach(&counter);

        rect.translate(Vector2::new(-5.0, 1.0));
        assert_eq!(counter.hits.get(), 1);
        assert_eq!(rect.first_corner(), Point2::new(-5.0, 1.0));
        assert_eq!(rect.corners()[2], Point2::new(-3.0, 2.0));

        let point = rect.representative_point().expect("corner");
        assert_eq!((point.x(), point.y(), point.z()), (-5.0, 1.0, 0.0));

        rect.translate(Vector2::new(0.0, 0.0));
        assert_eq!(counter.hits.get(), 1);
    }
}
