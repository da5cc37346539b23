//! 派生量缓存（"仓库"）。
//!
//! 以形状标识为键缓存面积、体积、周长、表面积。仓库作为观察者挂在
//! 它缓存过的每个形状上，形状一旦报告变更，整条缓存记录立即删除，
//! 而不是只删除受影响的字段。
//!
//! 缓存、形状和通知都建立在 `Rc`/`RefCell` 之上，因而只能在单线程内使用：
//! 通知与失效在修改方法返回前同步完成，调用方不会读到修改前的旧值。
//! 移植到多线程时需要保证“通知 → 失效”相对同一标识上的读取是原子的。

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

use shapes_core::observer::ShapeObserver;
use shapes_core::shape::{Metric, Shape, ShapeId};
use tracing::debug;

use crate::errors::EngineError;

#[derive(Debug, Clone, Copy)]
struct CachedMetrics {
    area: Option<f64>,
    volume: Option<f64>,
    perimeter: Option<f64>,
    surface_area: Option<f64>,
    last_updated: Instant,
}

impl CachedMetrics {
    fn new(now: Instant) -> Self {
        Self {
            area: None,
            volume: None,
            perimeter: None,
            surface_area: None,
            last_updated: now,
        }
    }

    fn slot(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Area => self.area,
            Metric::Volume => self.volume,
            Metric::Perimeter => self.perimeter,
            Metric::SurfaceArea => self.surface_area,
        }
    }

    fn slot_mut(&mut self, metric: Metric) -> &mut Option<f64> {
        match metric {
            Metric::Area => &mut self.area,
            Metric::Volume => &mut self.volume,
            Metric::Perimeter => &mut self.perimeter,
            Metric::SurfaceArea => &mut self.surface_area,
        }
    }
}

/// 缓存诊断快照。
///
/// `cache_hits` 并不是命中次数：它统计的是在最近时间窗口内写入过的记录数，
/// 只能作为粗略的活跃度参考，不能用于判断缓存是否正确。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub total_shapes: usize,
    pub cache_hits: usize,
}

/// 派生量缓存。通过 [`Warehouse::new`] 显式创建并以 `Rc` 共享。
pub struct Warehouse {
    entries: RefCell<HashMap<ShapeId, CachedMetrics>>,
    recency_window: Duration,
    self_ref: Weak<Warehouse>,
}

impl Warehouse {
    pub const DEFAULT_RECENCY_WINDOW: Duration = Duration::from_secs(60);

    pub fn new() -> Rc<Self> {
        Self::with_recency_window(Self::DEFAULT_RECENCY_WINDOW)
    }

    /// `recency_window` 决定 [`CacheStats::cache_hits`] 统计的时间范围。
    pub fn with_recency_window(recency_window: Duration) -> Rc<Self> {
        Rc::new_cyclic(|self_ref| Self {
            entries: RefCell::new(HashMap::new()),
            recency_window,
            self_ref: self_ref.clone(),
        })
    }

    fn as_observer(&self) -> Weak<dyn ShapeObserver> {
        self.self_ref.clone()
    }

    /// 订阅形状变更，重复调用无效果。
    pub fn watch(&self, shape: &dyn Shape) {
        shape.subject().attach_weak(self.as_observer());
    }

    /// 取消订阅，返回之前是否已订阅。已缓存的记录保持不变。
    pub fn unwatch(&self, shape: &dyn Shape) -> bool {
        shape.subject().detach_weak(&self.as_observer())
    }

    /// 读取派生量。
    ///
    /// 命中时直接返回缓存值；未命中时经由形状能力计算，成功后写入缓存并
    /// 订阅该形状。形状不支持该派生量时返回 [`EngineError::UnsupportedShape`]，
    /// 计算失败时返回 [`EngineError::Computation`]；失败不会改动任何缓存记录。
    pub fn get(&self, metric: Metric, shape: &dyn Shape) -> Result<f64, EngineError> {
        let id = shape.id();
        if let Some(value) = self.cached_value(id.as_str(), metric) {
            debug!(shape_id = %id, %metric, "缓存命中");
            return Ok(value);
        }

        let value = metric
            .compute(shape)
            .ok_or_else(|| EngineError::UnsupportedShape {
                id: id.clone(),
                kind: shape.kind(),
                property: metric,
            })??;

        self.store(id, metric, value);
        self.watch(shape);
        debug!(shape_id = %id, %metric, value, "派生量已计算并缓存");
        Ok(value)
    }

    pub fn area(&self, shape: &dyn Shape) -> Result<f64, EngineError> {
        self.get(Metric::Area, shape)
    }

    pub fn volume(&self, shape: &dyn Shape) -> Result<f64, EngineError> {
        self.get(Metric::Volume, shape)
    }

    pub fn perimeter(&self, shape: &dyn Shape) -> Result<f64, EngineError> {
        self.get(Metric::Perimeter, shape)
    }

    pub fn surface_area(&self, shape: &dyn Shape) -> Result<f64, EngineError> {
        self.get(Metric::SurfaceArea, shape)
    }

    /// 查看缓存而不触发计算。
    pub fn cached_value(&self, id: &str, metric: Metric) -> Option<f64> {
        self.entries
            .borrow()
            .get(id)
            .and_then(|entry| entry.slot(metric))
    }

    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.borrow().contains_key(id)
    }

    fn store(&self, id: &ShapeId, metric: Metric, value: f64) {
        let now = Instant::now();
        let mut entries = self.entries.borrow_mut();
        let entry = entries
            .entry(id.clone())
            .or_insert_with(|| CachedMetrics::new(now));
        *entry.slot_mut(metric) = Some(value);
        entry.last_updated = now;
    }

    /// 删除指定形状的缓存记录，返回记录是否存在。
    pub fn invalidate(&self, id: &str) -> bool {
        let removed = self.entries.borrow_mut().remove(id).is_some();
        if removed {
            debug!(shape_id = id, "缓存记录已失效");
        }
        removed
    }

    pub fn clear_cache(&self) {
        self.entries.borrow_mut().clear();
        debug!("缓存已清空");
    }

    pub fn cache_stats(&self) -> CacheStats {
        let now = Instant::now();
        let entries = self.entries.borrow();
        let cache_hits = entries
            .values()
            .filter(|entry| now.duration_since(entry.last_updated) < self.recency_window)
            .count();
        CacheStats {
            total_shapes: entries.len(),
            cache_hits,
        }
    }

    #[inline]
    pub fn recency_window(&self) -> Duration {
        self.recency_window
    }
}

impl ShapeObserver for Warehouse {
    fn update(&self, shape_id: &ShapeId) {
        self.invalidate(shape_id.as_str());
    }
}

impl fmt::Debug for Warehouse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Warehouse")
            .field("entries", &self.entries.borrow().len())
            .field("recency_window", &self.recency_window)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use shapes_core::entities::{Cube, Rectangle};
    use shapes_core::errors::ComputationError;
    use shapes_core::geometry::{Point2, Point3};

    use super::*;

    fn rect_4x3() -> Rectangle {
        Rectangle::new(
            "test-rect",
            [
                Point2::new(0.0, 0.0),
                Point2::new(4.0, 0.0),
                Point2::new(4.0, 3.0),
                Point2::new(0.0, 3.0),
            ],
        )
    }

    #[test]
    fn computes_and_caches_each_metric() {
        let warehouse = Warehouse::new();
        let cube = Cube::new("test-cube", Point3::new(0.0, 0.0, 0.0), 3.0);
        let rect = rect_4x3();

        assert_eq!(warehouse.surface_area(&cube).unwrap(), 54.0);
        assert_eq!(warehouse.volume(&cube).unwrap(), 27.0);
        assert_eq!(warehouse.area(&rect).unwrap(), 12.0);
        assert_eq!(warehouse.perimeter(&rect).unwrap(), 14.0);

        assert_eq!(warehouse.cached_value("test-cube", Metric::Volume), Some(27.0));
        assert_eq!(warehouse.cached_value("test-cube", Metric::Area), None);
        assert_eq!(warehouse.cache_stats().total_shapes, 2);
    }

    #[test]
    fn unsupported_metric_is_rejected_without_caching() {
        let warehouse = Warehouse::new();
        let cube = Cube::new("c", Point3::new(0.0, 0.0, 0.0), 2.0);
        let rect = rect_4x3();

        let err = warehouse.area(&cube).unwrap_err();
        assert!(matches!(
            err,
            EngineError::UnsupportedShape { property: Metric::Area, kind: "Cube", .. }
        ));
        assert!(matches!(
            warehouse.volume(&rect),
            Err(EngineError::UnsupportedShape { property: Metric::Volume, .. })
        ));
        assert!(!warehouse.contains("c"));
        assert!(!warehouse.contains("test-rect"));
        assert_eq!(cube.subject().observer_count(), 0);
    }

    #[test]
    fn computation_failure_leaves_entry_untouched() {
        let warehouse = Warehouse::new();
        let cube = Cube::new("c", Point3::new(0.0, 0.0, 0.0), 0.0);
        let err = warehouse.volume(&cube).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Computation(ComputationError::NonPositiveDimension { .. })
        ));
        assert!(!warehouse.contains("c"));

        let rect = rect_4x3();
        warehouse.area(&rect).unwrap();
        rect.set_corners([Point2::new(1.0, 1.0); 4]);
        assert!(!warehouse.contains("test-rect"));
        assert!(warehouse.perimeter(&rect).is_err());
        assert!(!warehouse.contains("test-rect"));
    }

    #[test]
    fn mutation_invalidates_whole_entry() {
        let warehouse = Warehouse::new();
        let cube = Cube::new("c", Point3::new(0.0, 0.0, 0.0), 2.0);

        assert_eq!(warehouse.volume(&cube).unwrap(), 8.0);
        assert_eq!(warehouse.surface_area(&cube).unwrap(), 24.0);
        assert!(cube.subject().is_attached(&warehouse));

        cube.set_side_length(3.0).unwrap();
        assert!(!warehouse.contains("c"));
        assert_eq!(warehouse.volume(&cube).unwrap(), 27.0);
        assert_eq!(warehouse.cached_value("c", Metric::SurfaceArea), None);
    }

    #[test]
    fn unwatched_shape_keeps_stale_entry_until_update() {
        let warehouse = Warehouse::new();
        let cube = Cube::new("c", Point3::new(0.0, 0.0, 0.0), 2.0);
        warehouse.volume(&cube).unwrap();
        assert!(warehouse.unwatch(&cube));
        assert!(!warehouse.unwatch(&cube));

        cube.set_side_length(4.0).unwrap();
        assert_eq!(warehouse.volume(&cube).unwrap(), 8.0);

        warehouse.update(cube.id());
        assert_eq!(warehouse.volume(&cube).unwrap(), 64.0);
    }

    #[test]
    fn watching_is_idempotent_with_explicit_attach() {
        let warehouse = Warehouse::new();
        let cube = Cube::new("c", Point3::new(0.0, 0.0, 0.0), 2.0);
        cube.subject().attach(&warehouse);
        warehouse.watch(&cube);
        warehouse.volume(&cube).unwrap();
        assert_eq!(cube.subject().observer_count(), 1);
    }

    #[test]
    fn stats_count_recent_writes() {
        let warehouse = Warehouse::new();
        let cube = Cube::new("c", Point3::new(0.0, 0.0, 0.0), 2.0);
        warehouse.volume(&cube).unwrap();
        assert_eq!(
            warehouse.cache_stats(),
            CacheStats {
                total_shapes: 1,
                cache_hits: 1
            }
        );

        let stale = Warehouse::with_recency_window(Duration::ZERO);
        stale.volume(&cube).unwrap();
        assert_eq!(stale.cache_stats().total_shapes, 1);
        assert_eq!(stale.cache_stats().cache_hits, 0);

        warehouse.clear_cache();
        assert_eq!(warehouse.cache_stats().total_shapes, 0);
    }

    #[test]
    fn dropped_warehouse_is_not_notified() {
        let cube = Cube::new("c", Point3::new(0.0, 0.0, 0.0), 2.0);
        {
            let warehouse = Warehouse::new();
            warehouse.volume(&cube).unwrap();
            assert_eq!(cube.subject().observer_count(), 1);
        }
        assert_eq!(cube.subject().observer_count(), 0);
        cube.set_side_length(5.0).unwrap();
    }
}
