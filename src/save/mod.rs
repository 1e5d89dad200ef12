//! Debounced persistence: document saves, write-back, and layout.

pub mod clock;
pub mod coordinator;
pub mod layout;
pub mod scheduler;

pub use clock::{Clock, ManualClock, SystemClock};
pub use coordinator::{spawn_driver, DocState, SaveCoordinator, SaveReport, SaveTimings};
pub use layout::LayoutPersister;
pub use scheduler::DebounceScheduler;
