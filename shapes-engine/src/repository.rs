use std::collections::HashMap;

use shapes_core::shape::{ShapeId, SharedShape};
use tracing::debug;

use crate::errors::EngineError;
use crate::specification::Specification;

/// 形状仓库接口。仓库只负责存取，不触碰缓存与观察者关系。
pub trait ShapeRepository {
    /// 插入形状；标识已存在时返回 [`EngineError::DuplicateKey`]，仓库保持不变。
    fn add(&mut self, shape: SharedShape) -> Result<(), EngineError>;

    /// 删除形状，返回之前是否存在。不发送通知，也不清理缓存。
    fn remove(&mut self, id: &str) -> bool;

    fn find_by_id(&self, id: &str) -> Option<SharedShape>;

    /// 当前内容的快照，之后对仓库的修改不会影响已返回的列表。
    fn find_all(&self) -> Vec<SharedShape>;

    /// 按仓库枚举顺序线性扫描，返回满足条件的形状。
    fn find_by_specification(&self, specification: &dyn Specification) -> Vec<SharedShape>;

    fn count(&self) -> usize;

    fn clear(&mut self);
}

/// 基于内存的仓库：按插入顺序保存形状，并维护标识到下标的索引。
#[derive(Debug, Default)]
pub struct InMemoryShapeRepository {
    shapes: Vec<SharedShape>,
    index: HashMap<ShapeId, usize>,
}

impl InMemoryShapeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &SharedShape> {
        self.shapes.iter()
    }

    /// 返回指定种类（如 `"Cube"`）的全部形状。
    pub fn find_by_kind(&self, kind: &str) -> Vec<SharedShape> {
        self.iter()
            .filter(|shape| shape.kind() == kind)
            .cloned()
            .collect()
    }
}

impl ShapeRepository for InMemoryShapeRepository {
    fn add(&mut self, shape: SharedShape) -> Result<(), EngineError> {
        let id = shape.id().clone();
        if self.index.contains_key(&id) {
            return Err(EngineError::DuplicateKey(id));
        }
        debug!(shape_id = %id, kind = shape.kind(), "形状已入库");
        self.index.insert(id, self.shapes.len());
        self.shapes.push(shape);
        Ok(())
    }

    fn remove(&mut self, id: &str) -> bool {
        let Some(position) = self.index.remove(id) else {
            return false;
        };
        self.shapes.remove(position);
        for (offset, shape) in self.shapes[position..].iter().enumerate() {
            self.index.insert(shape.id().clone(), position + offset);
        }
        debug!(shape_id = id, "形状已移出仓库");
        true
    }

    fn find_by_id(&self, id: &str) -> Option<SharedShape> {
        self.index
            .get(id)
            .map(|&position| self.shapes[position].clone())
    }

    fn find_all(&self) -> Vec<SharedShape> {
        self.shapes.clone()
    }

    fn find_by_specification(&self, specification: &dyn Specification) -> Vec<SharedShape> {
        self.iter()
            .filter(|&shape| specification.is_satisfied_by(shape.as_ref()))
            .cloned()
            .collect()
    }

    #[inline]
    fn count(&self) -> usize {
        self.shapes.len()
    }

    fn clear(&mut self) {
        self.shapes.clear();
        self.index.clear();
    }
}
