//! 形状排序。
//!
//! 排序总是返回新的列表，输入保持不变，比较相等的元素维持原有相对顺序。
//! 比较器不一定构成全序（见 [`ByCachedMetric`](crate::comparator::ByCachedMetric)），
//! 因此这里使用自己的归并排序：对任意比较结果都能结束并给出排列。

use std::cmp::Ordering;

use shapes_core::shape::SharedShape;

use crate::comparator::{ShapeComparator, compare_in_sequence};

pub fn sort_shapes<C>(shapes: &[SharedShape], comparator: &C) -> Vec<SharedShape>
where
    C: ShapeComparator + ?Sized,
{
    merge_sort(shapes.to_vec(), &|a: &SharedShape, b: &SharedShape| {
        comparator.compare(a.as_ref(), b.as_ref())
    })
}

/// 多键排序：按给定顺序逐个比较，前一个键判等时才使用下一个。
pub fn sort_shapes_multi_key(
    shapes: &[SharedShape],
    comparators: &[&dyn ShapeComparator],
) -> Vec<SharedShape> {
    merge_sort(shapes.to_vec(), &|a: &SharedShape, b: &SharedShape| {
        compare_in_sequence(comparators, a.as_ref(), b.as_ref())
    })
}

fn merge_sort<T, F>(mut items: Vec<T>, compare: &F) -> Vec<T>
where
    F: Fn(&T, &T) -> Ordering,
{
    if items.len() <= 1 {
        return items;
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort(items, compare);
    let right = merge_sort(right, compare);

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => compare(r, l) == Ordering::Less,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => break,
        };
        let next = if take_right { right.next() } else { left.next() };
        merged.extend(next);
    }
    merged
}
