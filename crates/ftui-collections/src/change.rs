#![forbid(unsafe_code)]

//! Change notifications for observable collections.
//!
//! # Design
//!
//! A collection owns a [`Subscribers<T>`] registry. Each registered callback
//! is held strongly by the [`Subscription`] guard returned to the caller and
//! weakly by the registry, so dropping the guard is all it takes to
//! unsubscribe. Dead weak references are pruned lazily on the next
//! [`Subscribers::notify`].
//!
//! # Failure Modes
//!
//! - **Subscriber leak**: guards stored indefinitely keep their callbacks
//!   alive. Nothing is reclaimed until the guard is dropped.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type CallbackRc<T> = Rc<dyn Fn(&CollectionChange<T>)>;
type CallbackWeak<T> = Weak<dyn Fn(&CollectionChange<T>)>;

/// A change to the visible subset of a collection.
///
/// Indices refer to positions in the visible subset, not in the backing set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionChange<T> {
    /// `item` was appended to the visible subset at `index`.
    Added { item: T, index: usize },
    /// `item` was removed from the visible subset; it used to sit at `index`.
    Removed { item: T, index: usize },
    /// The visible subset changed in bulk. Observers should re-read it.
    Reset,
}

impl<T> CollectionChange<T> {
    /// The item carried by an `Added` or `Removed` change.
    #[must_use]
    pub fn item(&self) -> Option<&T> {
        match self {
            Self::Added { item, .. } | Self::Removed { item, .. } => Some(item),
            Self::Reset => None,
        }
    }

    /// Whether this is a bulk reset.
    #[must_use]
    pub fn is_reset(&self) -> bool {
        matches!(self, Self::Reset)
    }
}

/// Ordered registry of change callbacks.
///
/// Callbacks are invoked in registration order.
pub struct Subscribers<T> {
    callbacks: RefCell<Vec<CallbackWeak<T>>>,
}

impl<T> Default for Subscribers<T> {
    fn default() -> Self {
        Self {
            callbacks: RefCell::new(Vec::new()),
        }
    }
}

impl<T> fmt::Debug for Subscribers<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.callbacks.borrow().len())
            .finish()
    }
}

impl<T> Subscribers<T> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered callbacks, including dead ones not yet pruned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.callbacks.borrow().len()
    }

    /// Whether no callbacks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callbacks.borrow().is_empty()
    }
}

impl<T: 'static> Subscribers<T> {
    /// Register a callback. Dropping the returned guard unsubscribes it.
    pub fn subscribe(&self, callback: impl Fn(&CollectionChange<T>) + 'static) -> Subscription {
        let strong: CallbackRc<T> = Rc::new(callback);
        self.callbacks.borrow_mut().push(Rc::downgrade(&strong));
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Deliver `change` to every live callback and prune dead ones.
    ///
    /// Live callbacks are collected before any is invoked, so a callback may
    /// subscribe or drop guards without disturbing the current delivery.
    pub fn notify(&self, change: &CollectionChange<T>) {
        let live: Vec<CallbackRc<T>> = {
            let mut callbacks = self.callbacks.borrow_mut();
            let before = callbacks.len();
            callbacks.retain(|w| w.strong_count() > 0);
            let pruned = before - callbacks.len();
            if pruned > 0 {
                tracing::debug!(pruned, live = callbacks.len(), "pruned dead subscribers");
            }
            callbacks.iter().filter_map(Weak::upgrade).collect()
        };

        for cb in &live {
            cb(change);
        }
    }
}

/// RAII guard for a change callback.
///
/// Holds the only strong reference to the callback; once dropped, the
/// registry's weak reference fails to upgrade and the callback is skipped.
pub struct Subscription {
    _guard: Box<dyn std::any::Any>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn notifies_in_registration_order() {
        let subs = Subscribers::<i32>::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let log1 = Rc::clone(&log);
        let _a = subs.subscribe(move |_| log1.borrow_mut().push('A'));
        let log2 = Rc::clone(&log);
        let _b = subs.subscribe(move |_| log2.borrow_mut().push('B'));
        let log3 = Rc::clone(&log);
        let _c = subs.subscribe(move |_| log3.borrow_mut().push('C'));

        subs.notify(&CollectionChange::Reset);
        assert_eq!(*log.borrow(), vec!['A', 'B', 'C']);
    }

    #[test]
    fn dropped_guard_stops_delivery() {
        let subs = Subscribers::<i32>::new();
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);

        let sub = subs.subscribe(move |_| count_clone.set(count_clone.get() + 1));
        subs.notify(&CollectionChange::Reset);
        assert_eq!(count.get(), 1);

        drop(sub);
        subs.notify(&CollectionChange::Reset);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn dead_entries_pruned_on_notify() {
        let subs = Subscribers::<i32>::new();
        let _live = subs.subscribe(|_| {});
        let dead = subs.subscribe(|_| {});
        assert_eq!(subs.len(), 2);

        drop(dead);
        // Not pruned until the next delivery.
        assert_eq!(subs.len(), 2);

        subs.notify(&CollectionChange::Reset);
        assert_eq!(subs.len(), 1);
        assert!(!subs.is_empty());
    }

    #[test]
    fn callback_receives_payload() {
        let subs = Subscribers::<&'static str>::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let _sub = subs.subscribe(move |change| seen_clone.borrow_mut().push(change.clone()));

        subs.notify(&CollectionChange::Added {
            item: "alpha",
            index: 0,
        });
        subs.notify(&CollectionChange::Removed {
            item: "alpha",
            index: 0,
        });

        let seen = seen.borrow();
        assert_eq!(seen[0].item(), Some(&"alpha"));
        assert!(!seen[1].is_reset());
        assert_eq!(
            seen[1],
            CollectionChange::Removed {
                item: "alpha",
                index: 0
            }
        );
    }

    #[test]
    fn reset_has_no_item() {
        let change = CollectionChange::<u8>::Reset;
        assert!(change.is_reset());
        assert_eq!(change.item(), None);
    }

    #[test]
    fn len_available_without_static_bound() {
        fn count<'a>(subs: &Subscribers<&'a str>) -> usize {
            subs.len()
        }
        let subs = Subscribers::<&str>::new();
        assert_eq!(count(&subs), 0);
        assert!(subs.is_empty());
    }

    #[test]
    fn debug_format() {
        let subs = Subscribers::<i32>::new();
        let sub = subs.subscribe(|_| {});
        assert!(format!("{subs:?}").contains("count"));
        assert!(format!("{sub:?}").contains("Subscription"));
    }
}
