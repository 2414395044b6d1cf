use core::cmp::Ordering;
use std::rc::Rc;

/// Stable merge key for registry items.
///
/// Ordering rules:
/// 1) `order`: ascending
/// 2) `seq`: ascending (insertion sequence for equal order)
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub(crate) struct MergeKey {
    pub order: i32,
    pub seq: u64,
}

impl MergeKey {
    #[inline]
    pub const fn new(order: i32, seq: u64) -> Self {
        Self { order, seq }
    }
}

impl Ord for MergeKey {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        match self.order.cmp(&other.order) {
            Ordering::Equal => self.seq.cmp(&other.seq),
            o => o,
        }
    }
}

impl PartialOrd for MergeKey {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A journaled add, waiting for the next merge.
pub(crate) struct AddEntry<T: ?Sized> {
    pub seq: u64,
    pub item: Rc<T>,
}

/// Identity comparison that ignores vtable pointers.
#[inline]
pub(crate) fn same<T: ?Sized>(a: &Rc<T>, b: &Rc<T>) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_dominates_sequence() {
        assert!(MergeKey::new(-1, 9) < MergeKey::new(0, 0));
        assert!(MergeKey::new(3, 1) < MergeKey::new(3, 2));
    }

    #[test]
    fn same_is_identity_not_equality() {
        let a = Rc::new(5);
        let b = Rc::new(5);
        assert!(same(&a, &a.clone()));
        assert!(!same(&a, &b));
    }
}
