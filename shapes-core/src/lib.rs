pub mod calculators;
pub mod entities;
pub mod validators;

pub mod geometry {
    use glam::{DVec2, DVec3};
    use serde::{Deserialize, Serialize};

    /// 二维点，内部以 `glam::DVec2` 表示。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn translate(self, offset: Vector2) -> Self {
            Self(self.0 + offset.0)
        }

        #[inline]
        pub fn vector_to(self, other: Point2) -> Vector2 {
            Vector2(other.0 - self.0)
        }

        #[inline]
        pub fn distance(self, other: Point2) -> f64 {
            self.0.distance(other.0)
        }

        /// 平面点提升为空间点，z 恒为 0。
        #[inline]
        pub fn to_point3(self) -> Point3 {
            Point3::new(self.0.x, self.0.y, 0.0)
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    impl From<DVec2> for Point2 {
        fn from(value: DVec2) -> Self {
            Self(value)
        }
    }

    /// 二维向量，用于平移与叉积判断。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Vector2(pub DVec2);

    impl Vector2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_points(start: Point2, end: Point2) -> Self {
            Self(end.0 - start.0)
        }

        #[inline]
        pub fn length(self) -> f64 {
            self.0.length()
        }

        /// 二维叉积（z 分量），为 0 表示两向量平行。
        #[inline]
        pub fn cross(self, other: Vector2) -> f64 {
            self.0.perp_dot(other.0)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }
    }

    impl From<DVec2> for Vector2 {
        fn from(value: DVec2) -> Self {
            Self(value)
        }
    }

    /// 三维点，立方体基点与形状代表点都使用该类型。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point3(pub DVec3);

    impl Point3 {
        #[inline]
        pub fn new(x: f64, y: f64, z: f64) -> Self {
            Self(DVec3::new(x, y, z))
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn z(self) -> f64 {
            self.0.z
        }

        #[inline]
        pub fn coordinate(self, axis: Axis) -> f64 {
            match axis {
                Axis::X => self.0.x,
                Axis::Y => self.0.y,
                Axis::Z => self.0.z,
            }
        }

        #[inline]
        pub fn distance_from_origin(self) -> f64 {
            self.0.length()
        }

        #[inline]
        pub fn as_vec3(self) -> DVec3 {
            self.0
        }
    }

    impl From<DVec3> for Point3 {
        fn from(value: DVec3) -> Self {
            Self(value)
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Axis {
        X,
        Y,
        Z,
    }

    /// 坐标平面，`Xy` 即 z = 0 的平面，依此类推。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum CoordinatePlane {
        Xy,
        Xz,
        Yz,
    }

    impl CoordinatePlane {
        pub const ALL: [CoordinatePlane; 3] =
            [CoordinatePlane::Xy, CoordinatePlane::Xz, CoordinatePlane::Yz];

        /// 与该平面正交的坐标轴。
        #[inline]
        pub fn normal_axis(self) -> Axis {
            match self {
                CoordinatePlane::Xy => Axis::Z,
                CoordinatePlane::Xz => Axis::Y,
                CoordinatePlane::Yz => Axis::X,
            }
        }

        pub fn name(self) -> &'static str {
            match self {
                CoordinatePlane::Xy => "xy",
                CoordinatePlane::Xz => "xz",
                CoordinatePlane::Yz => "yz",
            }
        }
    }

    /// 轴对齐边界框。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Bounds2D {
        min: Point2,
        max: Point2,
    }

    impl Bounds2D {
        #[inline]
        pub fn empty() -> Self {
            Self {
                min: Point2::new(f64::INFINITY, f64::INFINITY),
                max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            }
        }

        pub fn from_points(points: impl IntoIterator<Item = Point2>) -> Self {
            let mut bounds = Self::empty();
            for point in points {
                bounds.include_point(point);
            }
            bounds
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.x() > self.max.x() || self.min.y() > self.max.y()
        }

        #[inline]
        pub fn min(&self) -> Point2 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point2 {
            self.max
        }

        pub fn include_point(&mut self, point: Point2) {
            if self.is_empty() {
                self.min = point;
                self.max = point;
                return;
            }
            self.min = Point2(self.min.as_vec2().min(point.as_vec2()));
            self.max = Point2(self.max.as_vec2().max(point.as_vec2()));
        }
    }
}

pub mod errors {
    use thiserror::Error;

    /// 几何计算失败（退化输入等）。
    #[derive(Debug, Clone, PartialEq, Error)]
    pub enum ComputationError {
        #[error("{shape} {dimension} must be positive, got {value}")]
        NonPositiveDimension {
            shape: &'static str,
            dimension: &'static str,
            value: f64,
        },
        #[error("{shape} {dimension} must be finite")]
        NonFiniteValue {
            shape: &'static str,
            dimension: &'static str,
        },
    }
}

pub mod observer {
    use std::cell::RefCell;
    use std::fmt;
    use std::ptr;
    use std::rc::{Rc, Weak};

    use crate::shape::ShapeId;

    /// 形状变更的订阅方。回调在变更方法返回之前同步执行。
    pub trait ShapeObserver {
        fn update(&self, shape_id: &ShapeId);
    }

    /// 形状持有的观察者列表。
    ///
    /// 只保存弱引用：形状不拥有观察者，观察者被释放后会在下一次
    /// 访问列表时被清理。同一观察者最多登记一次，通知按登记顺序进行。
    #[derive(Default)]
    pub struct ShapeSubject {
        observers: RefCell<Vec<Weak<dyn ShapeObserver>>>,
    }

    impl ShapeSubject {
        pub fn new() -> Self {
            Self::default()
        }

        /// 登记观察者，重复登记无效果。
        pub fn attach<O: ShapeObserver + 'static>(&self, observer: &Rc<O>) {
            let weak: Weak<O> = Rc::downgrade(observer);
            self.attach_weak(weak);
        }

        pub fn attach_weak(&self, observer: Weak<dyn ShapeObserver>) {
            let mut observers = self.observers.borrow_mut();
            observers.retain(|existing| existing.strong_count() > 0);
            if observers
                .iter()
                .any(|existing| ptr::addr_eq(existing.as_ptr(), observer.as_ptr()))
            {
                return;
            }
            observers.push(observer);
        }

        /// 注销观察者，返回之前是否已登记。
        pub fn detach<O: ShapeObserver + 'static>(&self, observer: &Rc<O>) -> bool {
            self.detach_ptr(Rc::as_ptr(observer))
        }

        pub fn detach_weak(&self, observer: &Weak<dyn ShapeObserver>) -> bool {
            self.detach_ptr(observer.as_ptr())
        }

        fn detach_ptr<T: ?Sized>(&self, target: *const T) -> bool {
            let mut observers = self.observers.borrow_mut();
            let before = observers.len();
            observers.retain(|existing| !ptr::addr_eq(existing.as_ptr(), target));
            observers.len() != before
        }

        pub fn is_attached<O: ShapeObserver + 'static>(&self, observer: &Rc<O>) -> bool {
            let target = Rc::as_ptr(observer);
            self.observers
                .borrow()
                .iter()
                .any(|existing| existing.strong_count() > 0 && ptr::addr_eq(existing.as_ptr(), target))
        }

        /// 仍然存活的观察者数量。
        pub fn observer_count(&self) -> usize {
            self.observers
                .borrow()
                .iter()
                .filter(|existing| existing.strong_count() > 0)
                .count()
        }

        /// 依登记顺序通知所有存活的观察者。
        ///
        /// 回调期间不持有列表借用，观察者可以在 `update` 中登记或注销。
        pub fn notify(&self, shape_id: &ShapeId) {
            let live: Vec<Rc<dyn ShapeObserver>> = {
                let mut observers = self.observers.borrow_mut();
                observers.retain(|existing| existing.strong_count() > 0);
                observers.iter().filter_map(Weak::upgrade).collect()
            };
            for observer in live {
                observer.update(shape_id);
            }
        }
    }

    impl fmt::Debug for ShapeSubject {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("ShapeSubject")
                .field("observers", &self.observer_count())
                .finish()
        }
    }

}

pub mod shape {
    use std::borrow::Borrow;
    use std::fmt;
    use std::rc::Rc;

    use serde::{Deserialize, Serialize};

    use crate::errors::ComputationError;
    use crate::geometry::Point3;
    use crate::observer::ShapeSubject;

    /// 形状唯一标识，创建后不可修改。
    #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    pub struct ShapeId(String);

    impl ShapeId {
        #[inline]
        pub fn new(raw: impl Into<String>) -> Self {
            Self(raw.into())
        }

        #[inline]
        pub fn as_str(&self) -> &str {
            &self.0
        }
    }

    impl fmt::Display for ShapeId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl Borrow<str> for ShapeId {
        fn borrow(&self) -> &str {
            &self.0
        }
    }

    impl AsRef<str> for ShapeId {
        fn as_ref(&self) -> &str {
            &self.0
        }
    }

    impl From<&str> for ShapeId {
        fn from(value: &str) -> Self {
            Self::new(value)
        }
    }

    impl From<String> for ShapeId {
        fn from(value: String) -> Self {
            Self(value)
        }
    }

    /// 平面形状能力：面积与周长。
    pub trait PlanarMeasure {
        fn area(&self) -> Result<f64, ComputationError>;
        fn perimeter(&self) -> Result<f64, ComputationError>;
    }

    /// 立体形状能力：体积与表面积。
    pub trait SolidMeasure {
        fn volume(&self) -> Result<f64, ComputationError>;
        fn surface_area(&self) -> Result<f64, ComputationError>;
    }

    /// 存储、查询与缓存层面对的形状接口。
    ///
    /// 上层只通过能力查询（`as_planar`、`as_solid`、`representative_point`）
    /// 区分行为，不依赖具体类型。
    pub trait Shape: fmt::Debug {
        fn id(&self) -> &ShapeId;

        /// 形状种类名称，例如 `"Cube"`。
        fn kind(&self) -> &'static str;

        /// 空间谓词使用的代表点；平面形状的 z 为 0。
        fn representative_point(&self) -> Option<Point3> {
            None
        }

        fn as_planar(&self) -> Option<&dyn PlanarMeasure> {
            None
        }

        fn as_solid(&self) -> Option<&dyn SolidMeasure> {
            None
        }

        fn subject(&self) -> &ShapeSubject;
    }

    pub type SharedShape = Rc<dyn Shape>;

    /// 可缓存的派生量。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Metric {
        Area,
        Volume,
        Perimeter,
        SurfaceArea,
    }

    impl Metric {
        pub const ALL: [Metric; 4] = [
            Metric::Area,
            Metric::Volume,
            Metric::Perimeter,
            Metric::SurfaceArea,
        ];

        pub fn name(self) -> &'static str {
            match self {
                Metric::Area => "area",
                Metric::Volume => "volume",
                Metric::Perimeter => "perimeter",
                Metric::SurfaceArea => "surface area",
            }
        }

        /// 通过形状能力计算该派生量；形状不具备相应能力时返回 `None`。
        pub fn compute(self, shape: &dyn Shape) -> Option<Result<f64, ComputationError>> {
            match self {
                Metric::Area => shape.as_planar().map(|planar| planar.area()),
                Metric::Perimeter => shape.as_planar().map(|planar| planar.perimeter()),
                Metric::Volume => shape.as_solid().map(|solid| solid.volume()),
                Metric::SurfaceArea => shape.as_solid().map(|solid| solid.surface_area()),
            }
        }
    }

    impl fmt::Display for Metric {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.name())
        }
    }
}
