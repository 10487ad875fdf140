//! # Mooring
//!
//! > *Tie it off before you leave the dock.*
//!
//! Deterministic, exactly-once cleanup for Rust scopes.
//!
//! ## Philosophy
//!
//! Cleanup belongs next to acquisition, not at every exit:
//! - **Deferred** = one action, run once when the scope ends
//! - **Anchor** = one resource, configured in place, released once when the scope ends
//!
//! Both are ordinary owned values. Moving them moves the obligation; the moved-from
//! binding is gone, so nothing can run twice.
//!
//! ## Quick Example
//!
//! ```rust
//! use std::cell::RefCell;
//! use mooring::{anchor, defer};
//!
//! let log = RefCell::new(Vec::new());
//!
//! fn connect(log: &RefCell<Vec<String>>, fail: bool) -> Result<(), String> {
//!     let _audit = defer(|| log.borrow_mut().push("audit".to_string()));
//!
//!     let conn = anchor(
//!         |name: String| log.borrow_mut().push(format!("close {name}")),
//!         || "db".to_string(),
//!     )
//!     .chain(|name| name.push_str("-primary"))
//!     .try_chain(|_| if fail { Err("handshake".to_string()) } else { Ok(()) })?;
//!
//!     log.borrow_mut().push(format!("use {}", *conn));
//!     Ok(())
//! }
//!
//! assert!(connect(&log, false).is_ok());
//! assert!(connect(&log, true).is_err());
//! assert_eq!(
//!     *log.borrow(),
//!     [
//!         "use db-primary",
//!         "close db-primary",
//!         "audit",
//!         "close db-primary",
//!         "audit",
//!     ]
//! );
//! ```
//!
//! ## Features
//!
//! - `tracing` - emit `trace`-level events when guards and anchors are armed,
//!   chained and fired

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod anchor;
pub mod bind;
pub mod defer;
pub mod size;
pub mod testing;

// Re-exports
pub use anchor::{anchor, anchor_with, try_anchor, Anchor};
pub use bind::{bind, Bound, Callable, CallableOn};
pub use defer::{defer, defer_with, Deferred};
pub use size::ByteSize;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::anchor::{anchor, anchor_with, try_anchor, Anchor};
    pub use crate::bind::{bind, Callable, CallableOn};
    pub use crate::defer::{defer, defer_with, Deferred};
    pub use crate::size::ByteSize;
}
