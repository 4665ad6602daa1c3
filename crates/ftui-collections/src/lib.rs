#![forbid(unsafe_code)]

//! Filterable observable collections for FrankenTUI.
//!
//! # Role in FrankenTUI
//! `ftui-collections` backs list and grid widgets that show a filtered view
//! of a larger data set (search boxes, filter toggles). A widget subscribes
//! to one [`FilterableCollection`] and patches its display from the
//! [`CollectionChange`] events it receives.
//!
//! - [`FilterableCollection`]: backing set + visible subset + replaceable
//!   [`Filter`].
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//! - [`IndexedList`]: positional list contract, refused by filtered
//!   collections with [`CollectionError::Unsupported`].
//!
//! # Example
//!
//! ```
//! use ftui_collections::{CollectionChange, Filter, FilterableCollection};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let hosts: FilterableCollection<&str> = FilterableCollection::new();
//! let log = Rc::new(RefCell::new(Vec::new()));
//! let log_clone = Rc::clone(&log);
//! let _sub = hosts.subscribe(move |change| {
//!     log_clone.borrow_mut().push(change.clone());
//! });
//!
//! hosts.add_range(["alpha", "beta", "gamma"]);
//! hosts.set_filter(Filter::new(|h: &&str| h.contains('a')));
//!
//! assert_eq!(hosts.visible(), vec!["alpha", "beta", "gamma"]);
//! hosts.set_filter(Filter::new(|h: &&str| h.starts_with('g')));
//! assert_eq!(hosts.visible(), vec!["gamma"]);
//! assert_eq!(log.borrow().last(), Some(&CollectionChange::Reset));
//! ```
//!
//! # Threading
//! Collections are single-threaded (`Rc<RefCell<..>>`), matching the UI
//! event loop that owns them.

pub mod change;
pub mod filterable;
pub mod indexed;

pub use change::{CollectionChange, Subscribers, Subscription};
pub use filterable::{CollectionConfig, Filter, FilterableCollection, InitialVisibility};
pub use indexed::{CollectionError, CollectionResult, IndexedList, IndexedOp};
