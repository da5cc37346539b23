//! 形状排序所用的比较器。

use std::cmp::Ordering;
use std::rc::Rc;

use shapes_core::geometry::Axis;
use shapes_core::shape::{Metric, Shape};

use crate::warehouse::Warehouse;

pub trait ShapeComparator {
    fn compare(&self, a: &dyn Shape, b: &dyn Shape) -> Ordering;
}

impl<C: ShapeComparator + ?Sized> ShapeComparator for &C {
    fn compare(&self, a: &dyn Shape, b: &dyn Shape) -> Ordering {
        (**self).compare(a, b)
    }
}

impl<C: ShapeComparator + ?Sized> ShapeComparator for Box<C> {
    fn compare(&self, a: &dyn Shape, b: &dyn Shape) -> Ordering {
        (**self).compare(a, b)
    }
}

/// 按标识字典序。
#[derive(Debug, Clone, Copy, Default)]
pub struct ById;

impl ShapeComparator for ById {
    fn compare(&self, a: &dyn Shape, b: &dyn Shape) -> Ordering {
        a.id().cmp(b.id())
    }
}

/// 按种类名称字典序。
#[derive(Debug, Clone, Copy, Default)]
pub struct ByKind;

impl ShapeComparator for ByKind {
    fn compare(&self, a: &dyn Shape, b: &dyn Shape) -> Ordering {
        a.kind().cmp(b.kind())
    }
}

/// 按代表点某一坐标升序；没有代表点的形状排在最后。
#[derive(Debug, Clone, Copy)]
pub struct ByCoordinate {
    axis: Axis,
}

impl ByCoordinate {
    pub fn new(axis: Axis) -> Self {
        Self { axis }
    }

    pub fn x() -> Self {
        Self::new(Axis::X)
    }

    pub fn y() -> Self {
        Self::new(Axis::Y)
    }

    pub fn z() -> Self {
        Self::new(Axis::Z)
    }
}

impl ShapeComparator for ByCoordinate {
    fn compare(&self, a: &dyn Shape, b: &dyn Shape) -> Ordering {
        let coordinate = |shape: &dyn Shape| {
            shape
                .representative_point()
                .map(|point| point.coordinate(self.axis))
        };
        match (coordinate(a), coordinate(b)) {
            (Some(left), Some(right)) => left.total_cmp(&right),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

/// 按缓存中的派生量升序。
///
/// 任一方取值失败（形状不具备该派生量或计算出错）时退回到按标识比较。
/// 在混合种类的集合上这种退回不保证全序，排序结果只在同种形状之间有意义。
#[derive(Debug, Clone)]
pub struct ByCachedMetric {
    warehouse: Rc<Warehouse>,
    metric: Metric,
}

impl ByCachedMetric {
    pub fn new(warehouse: Rc<Warehouse>, metric: Metric) -> Self {
        Self { warehouse, metric }
    }

    pub fn area(warehouse: Rc<Warehouse>) -> Self {
        Self::new(warehouse, Metric::Area)
    }

    pub fn volume(warehouse: Rc<Warehouse>) -> Self {
        Self::new(warehouse, Metric::Volume)
    }

    pub fn perimeter(warehouse: Rc<Warehouse>) -> Self {
        Self::new(warehouse, Metric::Perimeter)
    }

    pub fn surface_area(warehouse: Rc<Warehouse>) -> Self {
        Self::new(warehouse, Metric::SurfaceArea)
    }
}

impl ShapeComparator for ByCachedMetric {
    fn compare(&self, a: &dyn Shape, b: &dyn Shape) -> Ordering {
        let left = self.warehouse.get(self.metric, a);
        let right = self.warehouse.get(self.metric, b);
        match (left, right) {
            (Ok(left), Ok(right)) => left.total_cmp(&right),
            _ => a.id().cmp(b.id()),
        }
    }
}

/// 依次应用比较器，返回第一个不相等的结果；全部判等或列表为空时为 `Equal`。
pub(crate) fn compare_in_sequence<'c, I, C>(comparators: I, a: &dyn Shape, b: &dyn Shape) -> Ordering
where
    I: IntoIterator<Item = &'c C>,
    C: ShapeComparator + ?Sized + 'c,
{
    comparators
        .into_iter()
        .map(|comparator| comparator.compare(a, b))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// 依次应用多个比较器，前一个判等时才比较下一个。
#[derive(Default)]
pub struct ComparatorChain {
    keys: Vec<Box<dyn ShapeComparator>>,
}

impl ComparatorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, key: impl ShapeComparator + 'static) -> Self {
        self.keys.push(Box::new(key));
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl ShapeComparator for ComparatorChain {
    fn compare(&self, a: &dyn Shape, b: &dyn Shape) -> Ordering {
        compare_in_sequence(&self.keys, a, b)
    }
}
