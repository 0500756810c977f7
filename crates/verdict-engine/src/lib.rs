//! Deadline-driven lifecycle for Verdict collections.
//!
//! [`CollectionLifecycle`] owns the Open→Closed state machine. Closure is
//! triggered both by a [`DeadlineScheduler`] job registered at creation and
//! lazily by any read past the deadline; a per-collection lock makes the two
//! paths converge on one effective close.

pub mod lifecycle;
pub mod locks;
pub mod memory;
pub mod scheduler;

pub use lifecycle::{CollectionLifecycle, LifecycleConfig};
pub use locks::{KeyGuard, KeyedLocks};
pub use memory::MemoryStore;
pub use scheduler::{DeadlineScheduler, ScheduleHandle};
