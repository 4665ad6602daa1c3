#![forbid(unsafe_code)]

//! Filterable observable collection.
//!
//! # Design
//!
//! [`FilterableCollection<T>`] keeps two sequences in shared,
//! reference-counted storage (`Rc<RefCell<..>>`):
//!
//! - the **backing set**: every item ever added and not yet removed, in
//!   insertion order, duplicates allowed;
//! - the **visible subset**: the items the current [`Filter`] accepts. This
//!   is what a list widget binds to.
//!
//! Every change to the visible subset is broadcast as a
//! [`CollectionChange`] to the subscribers registered through
//! [`FilterableCollection::subscribe`].
//!
//! ```text
//! all:     [1, 2, 3, 4, 5]      filter: even
//! visible: [2, 4]
//!
//! set_filter(odd)               -> one Reset
//! visible: [1, 3, 5]
//!
//! add(7)                        -> Added { item: 7, index: 3 }
//! visible: [1, 3, 5, 7]
//! ```
//!
//! # Performance
//!
//! | Operation      | Complexity                                   |
//! |----------------|----------------------------------------------|
//! | `add()`        | O(1) amortized + O(S), S = subscribers       |
//! | `remove()`     | O(N)                                         |
//! | `set_filter()` | O(V + N·V), N = backing set, V = visible     |
//! | `clear()`      | O(N)                                         |
//!
//! # Failure Modes
//!
//! - **Construction does not filter**: by default the visible subset of a
//!   collection built with [`FilterableCollection::from_items`] starts empty
//!   even when the filter would accept some of the items. It fills in on the
//!   first [`FilterableCollection::set_filter`] or
//!   [`FilterableCollection::refresh`]. Use [`InitialVisibility::Filtered`] to
//!   populate it up front.
//! - **Mutating predicate**: a [`Filter`] that mutates the collection it is
//!   installed on will panic (RefCell borrow rules) during `set_filter`.
//!   Predicates may read the collection through a cloned handle.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::change::{CollectionChange, Subscribers, Subscription};
use crate::indexed::{CollectionError, CollectionResult, IndexedList, IndexedOp};

/// Shared visibility predicate.
///
/// Cloning a `Filter` clones the handle, not the closure.
pub struct Filter<T> {
    predicate: Rc<dyn Fn(&T) -> bool>,
}

impl<T> Clone for Filter<T> {
    fn clone(&self) -> Self {
        Self {
            predicate: Rc::clone(&self.predicate),
        }
    }
}

impl<T> fmt::Debug for Filter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter").finish_non_exhaustive()
    }
}

impl<T: 'static> Filter<T> {
    /// Wrap a predicate.
    #[must_use]
    pub fn new(predicate: impl Fn(&T) -> bool + 'static) -> Self {
        Self {
            predicate: Rc::new(predicate),
        }
    }

    /// A filter that hides nothing.
    #[must_use]
    pub fn all() -> Self {
        Self::new(|_| true)
    }

    /// Whether `item` is visible under this filter.
    #[inline]
    #[must_use]
    pub fn matches(&self, item: &T) -> bool {
        (self.predicate)(item)
    }
}

impl<T: 'static> Default for Filter<T> {
    fn default() -> Self {
        Self::all()
    }
}

/// How the visible subset is seeded when a collection is built from items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitialVisibility {
    /// Start with an empty visible subset; it is populated by the first
    /// filter replacement or [`FilterableCollection::refresh`].
    #[default]
    Deferred,
    /// Apply the filter to the initial items immediately.
    Filtered,
}

/// Configuration for a [`FilterableCollection`].
#[derive(Debug, Clone, Default)]
pub struct CollectionConfig {
    /// Seeding of the visible subset at construction.
    pub initial_visibility: InitialVisibility,
    /// Capacity reserved up front for both sequences (0 = none).
    pub capacity: usize,
}

impl CollectionConfig {
    /// Create the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how the visible subset is seeded.
    #[must_use]
    pub fn with_initial_visibility(mut self, initial_visibility: InitialVisibility) -> Self {
        self.initial_visibility = initial_visibility;
        self
    }

    /// Reserve capacity for both sequences.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

struct CollectionInner<T> {
    all: Vec<T>,
    visible: Vec<T>,
    filter: Filter<T>,
    version: u64,
}

/// A list of items with a filtered, observable view.
///
/// Cloning a `FilterableCollection` creates a new handle to the **same**
/// collection; both handles share items, filter and subscribers.
///
/// # Invariants
///
/// 1. Every visible item is also in the backing set.
/// 2. `version` increments by exactly 1 per emitted notification.
/// 3. Replacing the filter is the only way the visible subset changes
///    without the backing set changing.
/// 4. Subscribers are notified in registration order, after the internal
///    borrow is released.
pub struct FilterableCollection<T> {
    inner: Rc<RefCell<CollectionInner<T>>>,
    subscribers: Rc<Subscribers<T>>,
}

impl<T> Clone for FilterableCollection<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            subscribers: Rc::clone(&self.subscribers),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for FilterableCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("FilterableCollection")
            .field("visible", &inner.visible)
            .field("total_len", &inner.all.len())
            .field("version", &inner.version)
            .field("subscriber_count", &self.subscribers.len())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Default for FilterableCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + PartialEq + 'static> FilterableCollection<T> {
    /// Create an empty collection whose filter hides nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(CollectionConfig::default())
    }

    /// Create an empty collection with the given configuration.
    #[must_use]
    pub fn with_config(config: CollectionConfig) -> Self {
        Self::from_items_with_config(std::iter::empty(), Filter::all(), config)
    }

    /// Create a collection from initial items and a filter.
    ///
    /// The visible subset starts **empty**; see the module docs.
    #[must_use]
    pub fn from_items(items: impl IntoIterator<Item = T>, filter: Filter<T>) -> Self {
        Self::from_items_with_config(items, filter, CollectionConfig::default())
    }

    /// Create a collection from initial items, a filter and a configuration.
    #[must_use]
    pub fn from_items_with_config(
        items: impl IntoIterator<Item = T>,
        filter: Filter<T>,
        config: CollectionConfig,
    ) -> Self {
        let mut all = Vec::with_capacity(config.capacity);
        all.extend(items);
        let visible = match config.initial_visibility {
            InitialVisibility::Deferred => Vec::with_capacity(config.capacity),
            InitialVisibility::Filtered => {
                all.iter().filter(|item| filter.matches(item)).cloned().collect()
            }
        };
        Self {
            inner: Rc::new(RefCell::new(CollectionInner {
                all,
                visible,
                filter,
                version: 0,
            })),
            subscribers: Rc::new(Subscribers::new()),
        }
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Append `item` to the backing set, and to the visible subset if the
    /// current filter accepts it.
    pub fn add(&self, item: T) {
        // Evaluate outside the borrow so the predicate may read the collection.
        let shown = self.filter().matches(&item);
        let change = {
            let mut inner = self.inner.borrow_mut();
            if shown {
                inner.all.push(item.clone());
                inner.visible.push(item.clone());
                inner.version += 1;
                Some(CollectionChange::Added {
                    item,
                    index: inner.visible.len() - 1,
                })
            } else {
                inner.all.push(item);
                None
            }
        };
        trace!(visible = shown, "item added");
        if let Some(change) = change {
            self.subscribers.notify(&change);
        }
    }

    /// Add each item in order, exactly as repeated [`add`](Self::add) calls.
    ///
    /// Emits one `Added` per item that becomes visible.
    pub fn add_range(&self, items: impl IntoIterator<Item = T>) {
        for item in items {
            self.add(item);
        }
    }

    /// Remove the first occurrence of `item` from the backing set and from
    /// the visible subset.
    ///
    /// Returns `true` if the backing set contained the item. Absent items are
    /// a no-op.
    pub fn remove(&self, item: &T) -> bool {
        let (found, change) = {
            let mut inner = self.inner.borrow_mut();
            let found = inner.all.iter().position(|x| x == item);
            if let Some(pos) = found {
                inner.all.remove(pos);
            }
            let index = inner.visible.iter().position(|x| x == item);
            let change = index.map(|index| {
                let item = inner.visible.remove(index);
                inner.version += 1;
                CollectionChange::Removed { item, index }
            });
            (found.is_some(), change)
        };
        trace!(found, visible = change.is_some(), "item removed");
        if let Some(change) = change {
            self.subscribers.notify(&change);
        }
        found
    }

    /// Empty both the backing set and the visible subset.
    ///
    /// Always emits `Reset`, even when the collection was already empty.
    pub fn clear(&self) {
        let dropped = {
            let mut inner = self.inner.borrow_mut();
            let dropped = inner.all.len();
            inner.all.clear();
            inner.visible.clear();
            inner.version += 1;
            dropped
        };
        debug!(dropped, "collection cleared");
        self.subscribers.notify(&CollectionChange::Reset);
    }

    // ========================================================================
    // Filtering
    // ========================================================================

    /// The current filter.
    #[must_use]
    pub fn filter(&self) -> Filter<T> {
        self.inner.borrow().filter.clone()
    }

    /// Replace the filter and recompute the visible subset.
    ///
    /// Visible items the new filter rejects are removed; items of the backing
    /// set it accepts that are not yet visible are appended, in backing-set
    /// order. Items that stay visible keep their positions. Emits a single
    /// `Reset` if anything was removed or appended, nothing otherwise.
    pub fn set_filter(&self, filter: Filter<T>) {
        let (next, removed, added) = {
            let inner = self.inner.borrow();
            let mut next = Vec::with_capacity(inner.visible.len());
            let mut removed = 0usize;
            for item in &inner.visible {
                if filter.matches(item) {
                    next.push(item.clone());
                } else {
                    removed += 1;
                }
            }
            let mut added = 0usize;
            for item in &inner.all {
                if filter.matches(item) && !inner.visible.contains(item) {
                    next.push(item.clone());
                    added += 1;
                }
            }
            (next, removed, added)
        };

        let changed = removed > 0 || added > 0;
        let visible = next.len();
        {
            let mut inner = self.inner.borrow_mut();
            inner.visible = next;
            inner.filter = filter;
            if changed {
                inner.version += 1;
            }
        }
        debug!(removed, added, visible, "filter replaced");
        if changed {
            self.subscribers.notify(&CollectionChange::Reset);
        }
    }

    /// Replace the filter with a predicate.
    pub fn set_filter_fn(&self, predicate: impl Fn(&T) -> bool + 'static) {
        self.set_filter(Filter::new(predicate));
    }

    /// Re-apply the current filter.
    ///
    /// Use after item state the predicate reads has changed, or to populate
    /// a visible subset left empty at construction.
    pub fn refresh(&self) {
        self.set_filter(self.filter());
    }

    // ========================================================================
    // Observation
    // ========================================================================

    /// Subscribe to changes of the visible subset.
    ///
    /// Dropping the returned [`Subscription`] unsubscribes the callback.
    pub fn subscribe(&self, callback: impl Fn(&CollectionChange<T>) + 'static) -> Subscription {
        self.subscribers.subscribe(callback)
    }

    /// Number of registered subscribers, including dropped ones not yet
    /// pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Increments by 1 on every emitted notification.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    // ========================================================================
    // Read access
    // ========================================================================

    /// Number of visible items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().visible.len()
    }

    /// Whether no item is visible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().visible.is_empty()
    }

    /// Number of items in the backing set.
    #[must_use]
    pub fn total_len(&self) -> usize {
        self.inner.borrow().all.len()
    }

    /// Whether `item` is visible.
    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        self.inner.borrow().visible.contains(item)
    }

    /// A copy of the visible subset.
    #[must_use]
    pub fn visible(&self) -> Vec<T> {
        self.inner.borrow().visible.clone()
    }

    /// A copy of the backing set, hidden items included.
    #[must_use]
    pub fn all_items(&self) -> Vec<T> {
        self.inner.borrow().all.clone()
    }

    /// Borrow the visible subset.
    ///
    /// # Panics
    ///
    /// Panics if `f` mutates the collection: the borrow is held while it runs.
    pub fn with_visible<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.inner.borrow().visible)
    }

    /// Borrow the backing set.
    ///
    /// # Panics
    ///
    /// Panics if `f` mutates the collection: the borrow is held while it runs.
    pub fn with_all_items<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.inner.borrow().all)
    }
}

impl<T: Clone + PartialEq + 'static> Extend<T> for FilterableCollection<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.add_range(iter);
    }
}

impl<T: Clone + PartialEq + 'static> FromIterator<T> for FilterableCollection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let collection = Self::new();
        collection.add_range(iter);
        collection
    }
}

// Positions in the visible subset are a projection of the backing set, so
// none of these can be honored.
impl<T: Clone + PartialEq + 'static> IndexedList<T> for FilterableCollection<T> {
    fn insert(&self, _index: usize, _item: T) -> CollectionResult<()> {
        Err(CollectionError::Unsupported(IndexedOp::Insert))
    }

    fn move_item(&self, _from: usize, _to: usize) -> CollectionResult<()> {
        Err(CollectionError::Unsupported(IndexedOp::Move))
    }

    fn remove_at(&self, _index: usize) -> CollectionResult<T> {
        Err(CollectionError::Unsupported(IndexedOp::RemoveAt))
    }

    fn set(&self, _index: usize, _item: T) -> CollectionResult<T> {
        Err(CollectionError::Unsupported(IndexedOp::Set))
    }

    fn index_of(&self, _item: &T) -> CollectionResult<Option<usize>> {
        Err(CollectionError::Unsupported(IndexedOp::IndexOf))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
