use std::cell::RefCell;
use std::fmt;
use std::mem;
use std::rc::{Rc, Weak};

use super::journal::{same, AddEntry, MergeKey};
use super::policy::SortFilter;
use super::signal::SubscriptionId;

/// Ordered, filtered set of shared participants.
///
/// Traversal visits items whose [`SortFilter::included`] is true, ascending by
/// [`SortFilter::order`], ties in insertion order.
///
/// Mutation is journaled: `add`, `remove` and order changes are recorded and
/// only merged into canonical storage at the start of the next traversal. The
/// filtered view is cached between traversals and rebuilt from scratch when
/// anything was journaled or an item's visibility changed. Items may therefore
/// add, remove or reorder themselves (or others) from inside a traversal; the
/// traversal in progress is unaffected and the change shows up in the next one.
///
/// Performance characteristics:
/// - `add` / `remove` are O(pending) / O(n)
/// - a traversal with nothing pending reuses the cached view without allocating
/// - a merge is O(n + k log k) for k pending adds
///
/// `Registry` is a cheap handle; clones share the same storage.
pub struct Registry<P: SortFilter> {
    shared: Rc<Shared<P>>,
}

struct Shared<P: SortFilter> {
    this: Weak<Shared<P>>,
    state: RefCell<State<P>>,
}

struct Subscriptions {
    included: SubscriptionId,
    order: SubscriptionId,
}

struct Entry<T: ?Sized> {
    item: Rc<T>,
    /// `None` once the item is scheduled for removal or reinsertion.
    subs: Option<Subscriptions>,
}

struct State<P: SortFilter> {
    /// Canonical storage, sorted by `(order, insertion)`.
    items: Vec<Entry<P::Item>>,
    add_journal: Vec<AddEntry<P::Item>>,
    /// Canonical indices, as of the last merge.
    remove_journal: Vec<usize>,

    filtered: Vec<Rc<P::Item>>,
    rebuild: bool,
    /// The filtered view is lent to a traversal in progress.
    checked_out: bool,

    scratch: Vec<Entry<P::Item>>,
    /// Entries dropped by the last merge, released once the state borrow ends.
    released: Vec<Entry<P::Item>>,
    next_seq: u64,
}

impl<P: SortFilter> Registry<P> {
    pub fn new() -> Self {
        let shared = Rc::new_cyclic(|this| Shared {
            this: this.clone(),
            state: RefCell::new(State::new()),
        });
        Self { shared }
    }

    /// Schedules `item` for insertion at the next traversal.
    ///
    /// Returns `false` (and records nothing) if the item is already registered
    /// or already pending. An item scheduled for removal may be added back.
    pub fn add(&self, item: Rc<P::Item>) -> bool {
        let mut st = self.shared.state.borrow_mut();

        if st.add_journal.iter().any(|e| same(&e.item, &item)) {
            log::debug!("registry add ignored: item already pending");
            return false;
        }
        if let Some(i) = st.index_of(&item) {
            if !st.remove_journal.contains(&i) {
                log::debug!("registry add ignored: item already registered");
                return false;
            }
        }

        let seq = st.take_seq();
        st.add_journal.push(AddEntry { seq, item });
        st.invalidate();
        true
    }

    /// Removes `item`.
    ///
    /// A still-pending add is simply cancelled. A registered item is
    /// unsubscribed now and dropped from canonical storage at the next
    /// traversal. Returns `false` if the item is neither pending nor registered.
    pub fn remove(&self, item: &Rc<P::Item>) -> bool {
        let mut st = self.shared.state.borrow_mut();

        if let Some(i) = st.add_journal.iter().position(|e| same(&e.item, item)) {
            let cancelled = st.add_journal.swap_remove(i);
            drop(st);
            drop(cancelled);
            return true;
        }

        let Some(i) = st.index_of(item) else {
            return false;
        };
        if st.remove_journal.contains(&i) {
            return false;
        }

        if let Some(subs) = st.items[i].subs.take() {
            unsubscribe::<P>(item, subs);
        }
        st.remove_journal.push(i);
        st.invalidate();
        true
    }

    /// Unsubscribes and forgets every item, pending or registered.
    pub fn clear(&self) {
        let items = {
            let mut st = self.shared.state.borrow_mut();
            st.add_journal.clear();
            st.remove_journal.clear();
            st.invalidate();
            mem::take(&mut st.items)
        };

        // Items are released outside the borrow; their destructors may touch us.
        for entry in items {
            if let Some(subs) = entry.subs {
                unsubscribe::<P>(&entry.item, subs);
            }
        }
    }

    /// Canonical membership. Pending adds are not contained yet.
    pub fn contains(&self, item: &Rc<P::Item>) -> bool {
        self.shared.state.borrow().index_of(item).is_some()
    }

    /// Number of items in canonical storage.
    pub fn len(&self) -> usize {
        self.shared.state.borrow().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Journaled adds plus removals not merged yet.
    pub fn pending(&self) -> usize {
        let st = self.shared.state.borrow();
        st.add_journal.len() + st.remove_journal.len()
    }

    /// Visits every included item in order.
    ///
    /// Stops at the first error and returns it. Mutations made by `visit`
    /// take effect from the next traversal.
    pub fn for_each_filtered<E>(
        &self,
        mut visit: impl FnMut(&Rc<P::Item>) -> Result<(), E>,
    ) -> Result<(), E> {
        let view = self.check_out();
        for item in &view.items {
            visit(item)?;
        }
        Ok(())
    }

    /// Infallible [`for_each_filtered`](Self::for_each_filtered).
    pub fn for_each(&self, mut visit: impl FnMut(&Rc<P::Item>)) {
        let _ = self.for_each_filtered(|item| {
            visit(item);
            Ok::<(), std::convert::Infallible>(())
        });
    }

    fn check_out(&self) -> View<'_, P> {
        let mut st = self.shared.state.borrow_mut();
        let mut stale = Vec::new();

        let view = if st.checked_out {
            // Nested traversal: the cache is on loan, so visit a private snapshot.
            st.apply_journals(&self.shared.this);
            let items = st
                .items
                .iter()
                .filter(|e| P::included(&e.item))
                .map(|e| Rc::clone(&e.item))
                .collect();
            View {
                shared: &self.shared,
                items,
                nested: true,
            }
        } else {
            if st.rebuild {
                stale = mem::take(&mut st.filtered);
                st.apply_journals(&self.shared.this);
                st.rebuild_filtered();
            }
            st.checked_out = true;
            View {
                shared: &self.shared,
                items: mem::take(&mut st.filtered),
                nested: false,
            }
        };

        // Last references may run destructors that call back into us.
        let released = mem::take(&mut st.released);
        drop(st);
        drop(stale);
        drop(released);
        view
    }
}

impl<P: SortFilter> Default for Registry<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: SortFilter> Clone for Registry<P> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<P: SortFilter> fmt::Debug for Registry<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.shared.state.try_borrow() {
            Ok(st) => f
                .debug_struct("Registry")
                .field("len", &st.items.len())
                .field("pending_adds", &st.add_journal.len())
                .field("pending_removals", &st.remove_journal.len())
                .field("stale", &st.rebuild)
                .finish(),
            Err(_) => f.write_str("Registry { <borrowed> }"),
        }
    }
}

/// Filtered view lent to one traversal. Returned to the cache on drop, or
/// discarded if the registry changed while it was out.
struct View<'a, P: SortFilter> {
    shared: &'a Shared<P>,
    items: Vec<Rc<P::Item>>,
    nested: bool,
}

impl<P: SortFilter> Drop for View<'_, P> {
    fn drop(&mut self) {
        if self.nested {
            return;
        }
        let stale = {
            let Ok(mut st) = self.shared.state.try_borrow_mut() else {
                return;
            };
            st.checked_out = false;

            let items = mem::take(&mut self.items);
            if st.rebuild {
                items
            } else {
                st.filtered = items;
                Vec::new()
            }
        };
        drop(stale);
    }
}

impl<P: SortFilter> Shared<P> {
    fn on_included_changed(&self) {
        self.state.borrow_mut().invalidate();
    }

    /// Reorder is remove-then-readd with a fresh insertion sequence.
    fn on_order_changed(&self, item: &Rc<P::Item>) {
        let mut st = self.state.borrow_mut();
        let Some(i) = st.index_of(item) else {
            return;
        };
        // Already removed or reordered since the last merge.
        if st.remove_journal.contains(&i) {
            return;
        }
        let Some(subs) = st.items[i].subs.take() else {
            return;
        };

        unsubscribe::<P>(item, subs);
        st.remove_journal.push(i);
        let seq = st.take_seq();
        st.add_journal.push(AddEntry {
            seq,
            item: Rc::clone(item),
        });
        st.invalidate();
    }
}

impl<P: SortFilter> Drop for Shared<P> {
    fn drop(&mut self) {
        let st = self.state.get_mut();
        for entry in &mut st.items {
            if let Some(subs) = entry.subs.take() {
                unsubscribe::<P>(&entry.item, subs);
            }
        }
    }
}

impl<P: SortFilter> State<P> {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            add_journal: Vec::new(),
            remove_journal: Vec::new(),
            filtered: Vec::new(),
            rebuild: true,
            checked_out: false,
            scratch: Vec::new(),
            released: Vec::new(),
            next_seq: 0,
        }
    }

    #[inline]
    fn invalidate(&mut self) {
        self.rebuild = true;
    }

    #[inline]
    fn take_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn index_of(&self, item: &Rc<P::Item>) -> Option<usize> {
        self.items.iter().position(|e| same(&e.item, item))
    }

    /// Merges both journals into canonical storage.
    fn apply_journals(&mut self, this: &Weak<Shared<P>>) {
        let removed = self.remove_journal.len();
        let added = self.add_journal.len();

        if !self.remove_journal.is_empty() {
            // Descending, so each removal leaves the remaining indices valid.
            self.remove_journal.sort_unstable_by(|a, b| b.cmp(a));
            self.remove_journal.dedup();
            for i in self.remove_journal.drain(..) {
                self.released.push(self.items.remove(i));
            }
        }

        if !self.add_journal.is_empty() {
            self.ensure_sorted();
            self.add_journal
                .sort_by_cached_key(|e| MergeKey::new(P::order(&e.item), e.seq));

            self.scratch.clear();
            self.scratch.reserve(self.items.len() + self.add_journal.len());

            let mut adds = self.add_journal.drain(..).peekable();
            for entry in self.items.drain(..) {
                let order = P::order(&entry.item);
                while let Some(add) = adds.next_if(|a| P::order(&a.item) < order) {
                    self.scratch.push(Entry::subscribed(this, add.item));
                }
                self.scratch.push(entry);
            }
            for add in adds {
                self.scratch.push(Entry::subscribed(this, add.item));
            }

            mem::swap(&mut self.items, &mut self.scratch);
        }

        if removed + added > 0 {
            log::trace!(
                "registry merge: -{removed} +{added} -> {} items",
                self.items.len()
            );
        }
    }

    fn rebuild_filtered(&mut self) {
        self.filtered.clear();
        for entry in &self.items {
            if P::included(&entry.item) {
                self.filtered.push(Rc::clone(&entry.item));
            }
        }
        self.rebuild = false;
    }

    /// Canonical storage must already be sorted for the merge to be stable.
    fn ensure_sorted(&mut self) {
        let sorted = self
            .items
            .windows(2)
            .all(|w| P::order(&w[0].item) <= P::order(&w[1].item));
        if sorted {
            return;
        }

        debug_assert!(sorted, "registry items reordered without an order-changed signal");
        log::error!("registry items reordered without an order-changed signal; re-sorting");
        self.items.sort_by_key(|e| P::order(&e.item));
    }
}

impl<T: ?Sized + 'static> Entry<T> {
    fn subscribed<P>(this: &Weak<Shared<P>>, item: Rc<T>) -> Self
    where
        P: SortFilter<Item = T>,
    {
        let subs = subscribe::<P>(this, &item);
        Self {
            item,
            subs: Some(subs),
        }
    }
}

fn subscribe<P: SortFilter>(this: &Weak<Shared<P>>, item: &Rc<P::Item>) -> Subscriptions {
    let included = {
        let registry = this.clone();
        P::included_changed(item).connect(move || {
            if let Some(shared) = registry.upgrade() {
                shared.on_included_changed();
            }
        })
    };

    let order = {
        let registry = this.clone();
        let weak_item = Rc::downgrade(item);
        P::order_changed(item).connect(move || {
            if let (Some(shared), Some(item)) = (registry.upgrade(), weak_item.upgrade()) {
                shared.on_order_changed(&item);
            }
        })
    };

    Subscriptions { included, order }
}

fn unsubscribe<P: SortFilter>(item: &P::Item, subs: Subscriptions) {
    P::included_changed(item).disconnect(subs.included);
    P::order_changed(item).disconnect(subs.order);
}
