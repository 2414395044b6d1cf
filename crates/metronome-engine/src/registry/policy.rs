use super::signal::Signal;

/// Accessors a [`Registry`](super::Registry) uses to filter and order its items.
///
/// Implemented on a marker type rather than on the item itself, so the same
/// item type can live in several registries under different keys (e.g. an
/// object that both updates and draws, with independent orders).
///
/// Contract: whenever `order(item)` changes, `order_changed(item)` must be
/// emitted; whenever `included(item)` changes, `included_changed(item)` must be
/// emitted.
pub trait SortFilter: 'static {
    type Item: ?Sized + 'static;

    /// Whether the item takes part in traversal right now.
    fn included(item: &Self::Item) -> bool;

    /// Sort key; lower runs first.
    fn order(item: &Self::Item) -> i32;

    fn included_changed(item: &Self::Item) -> &Signal;

    fn order_changed(item: &Self::Item) -> &Signal;
}
