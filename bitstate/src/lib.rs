//! Track a fixed set of named boolean states in a packed bit array.
//!
//! Built for resource-constrained settings where one byte per flag is too much:
//! a [StateStore] packs up to [MAX_STATES] boolean slots into `u8` blocks,
//! caches the lowest-indexed true slot for O(1) access, and optionally enforces
//! radio-button semantics (at most one slot true at a time). A built-in snapshot
//! buffer supports save/restore of the whole pattern, and the store can be
//! rendered as text or carried over a compact wire form.
//!
//! # Example
//!
//! ```
//! use bitstate::StateStore;
//!
//! let mut modes = StateStore::new(5);
//! modes.select(2);
//! assert_eq!(modes.active(), Some(2));
//! assert!(modes.exactly_one_set());
//!
//! modes.save();
//! modes.toggle(4);
//! assert_eq!(modes.active(), Some(4));
//!
//! modes.restore();
//! assert_eq!(modes.active(), Some(2));
//! assert_eq!(modes.describe_active(32), "2 assigned");
//! ```

mod store;
pub use store::{DecodeError, Error, StateIter, StateStore, MAX_STATES};
