//! Local Filter Core Library
//!
//! This crate provides the engine behind the Local Filter extension: it finds
//! product cards marked with the "Yerel" (local) badge and hides or
//! highlights them.
//!
//! # Architecture
//!
//! Everything host-specific is a trait. The DOM is reached through [`Dom`],
//! deferred work through [`Scheduler`], persistence through
//! [`SettingsStore`] and the floating menu through [`MenuView`]. The
//! [`Scanner`] context ties them together and holds all per-page state, so an
//! engine can run against the in-memory DOM and manual scheduler as easily as
//! against a real page.
//!
//! # Modules
//!
//! - `types`: Constants, selectors, card flags and the effective mode
//! - `dom`: DOM abstraction and the arena-backed in-memory DOM
//! - `classifier`: Badge detection and card resolution
//! - `scheduler`: Deferred jobs and the virtual-time scheduler
//! - `settings`: Persisted toggles, storage diffs and the store trait
//! - `transition`: Per-card removal state machine
//! - `menu`: Floating menu status text and drag state machine
//! - `scanner`: The scan / hide / restore engine

pub mod classifier;
pub mod dom;
pub mod menu;
pub mod scanner;
pub mod scheduler;
pub mod settings;
pub mod transition;
pub mod types;

// Re-export commonly used types
pub use classifier::{CardResolver, GroupAncestorResolver};
pub use dom::{Dom, MemoryDom, NodeId, ScanRoot};
pub use menu::{MenuDrag, MenuStatus, MenuView, Point, PointerTarget};
pub use scanner::{Counters, ScanReport, Scanner};
pub use scheduler::{Deferral, Job, ManualScheduler, Scheduler, TaskId};
pub use settings::{MemoryStore, SettingKey, Settings, SettingsChange, SettingsStore, StoreError};
pub use types::{CardFlags, Mode, Selector};
