//! Host notification channel.
//!
//! The engine is embedded in a larger page; instead of page-global
//! signaling, the host injects a callback and receives typed events. An
//! absent sink simply drops events.

use serde::Serialize;

use crate::taxonomy::ItemKey;

/// Engine-to-host notifications.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    /// A cached draft was restored for this scope.
    DraftHydrated { restored: usize },
    /// The rater changed the selection of one item.
    SelectionChanged { key: ItemKey },
    /// A rank above the server ceiling was coerced down at submit time.
    RankCoerced { key: ItemKey, from: u8, to: u8 },
    ValidationFinished { errors: usize, warnings: usize },
    SubmitStarted { entries: usize },
    SubmitCommitted { applied: usize },
    SubmitFailed { message: String },
}

/// Injected host callback.
pub type EventSink = Box<dyn Fn(&EngineEvent) + Send>;
