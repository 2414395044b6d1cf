use std::cell::Cell;

use anyhow::Result;

use crate::registry::{Signal, SortFilter};

use super::ctx::FrameCtx;

/// Inclusion flag and order key of one participant, with their change signals.
///
/// Setters emit only when the value actually changes.
#[derive(Debug)]
pub struct Slot {
    included: Cell<bool>,
    order: Cell<i32>,
    included_changed: Signal,
    order_changed: Signal,
}

impl Slot {
    pub fn new(included: bool, order: i32) -> Self {
        Self {
            included: Cell::new(included),
            order: Cell::new(order),
            included_changed: Signal::new(),
            order_changed: Signal::new(),
        }
    }

    #[inline]
    pub fn included(&self) -> bool {
        self.included.get()
    }

    #[inline]
    pub fn order(&self) -> i32 {
        self.order.get()
    }

    pub fn set_included(&self, included: bool) {
        if self.included.replace(included) != included {
            self.included_changed.emit();
        }
    }

    pub fn set_order(&self, order: i32) {
        if self.order.replace(order) != order {
            self.order_changed.emit();
        }
    }

    pub fn included_changed(&self) -> &Signal {
        &self.included_changed
    }

    pub fn order_changed(&self) -> &Signal {
        &self.order_changed
    }
}

impl Default for Slot {
    fn default() -> Self {
        Self::new(true, 0)
    }
}

/// Something advanced once per update step.
///
/// The slot's inclusion flag means "enabled" and its order is the update order.
pub trait Updatable {
    fn update_slot(&self) -> &Slot;

    fn update(&self, ctx: &mut FrameCtx<'_>) -> Result<()>;
}

/// Something drawn at most once per tick.
///
/// The slot's inclusion flag means "visible" and its order is the draw order.
pub trait Drawable {
    fn draw_slot(&self) -> &Slot;

    fn draw(&self, ctx: &mut FrameCtx<'_>) -> Result<()>;
}

/// Filters by enabled, sorts by update order.
#[derive(Debug)]
pub struct UpdatePolicy;

impl SortFilter for UpdatePolicy {
    type Item = dyn Updatable;

    fn included(item: &Self::Item) -> bool {
        item.update_slot().included()
    }

    fn order(item: &Self::Item) -> i32 {
        item.update_slot().order()
    }

    fn included_changed(item: &Self::Item) -> &Signal {
        item.update_slot().included_changed()
    }

    fn order_changed(item: &Self::Item) -> &Signal {
        item.update_slot().order_changed()
    }
}

/// Filters by visible, sorts by draw order.
#[derive(Debug)]
pub struct DrawPolicy;

impl SortFilter for DrawPolicy {
    type Item = dyn Drawable;

    fn included(item: &Self::Item) -> bool {
        item.draw_slot().included()
    }

    fn order(item: &Self::Item) -> i32 {
        item.draw_slot().order()
    }

    fn included_changed(item: &Self::Item) -> &Signal {
        item.draw_slot().included_changed()
    }

    fn order_changed(item: &Self::Item) -> &Signal {
        item.draw_slot().order_changed()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;

    #[test]
    fn setters_emit_only_on_change() {
        let slot = Slot::default();
        let hits = Rc::new(Cell::new(0));
        {
            let hits = hits.clone();
            slot.order_changed().connect(move || hits.set(hits.get() + 1));
        }
        {
            let hits = hits.clone();
            slot.included_changed().connect(move || hits.set(hits.get() + 10));
        }

        slot.set_order(0);
        slot.set_included(true);
        assert_eq!(hits.get(), 0);

        slot.set_order(4);
        slot.set_included(false);
        assert_eq!(hits.get(), 11);
        assert_eq!(slot.order(), 4);
        assert!(!slot.included());
    }
}
