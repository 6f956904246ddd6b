//! Step-level progress events emitted while a plan materializes.
//!
//! The orchestrator resolves the full filtered slot list first, so every
//! event carries the final total. Events are strictly monotonic and always
//! precede the materialization call they describe -- an event may fire and
//! its step may still fail (the materializer's fallback absorbs that).

use baba_db::models::TimeSlot;

/// One progress event, emitted immediately before a slot materializes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotProgress {
    /// Day label ("Monday", ...), or empty for daily plans.
    pub day_label: String,
    pub slot_label: TimeSlot,
    pub recipe_name: String,
    /// 1-based position within the whole plan.
    pub running_index: usize,
    /// Total number of slots that will be materialized.
    pub total: usize,
    /// Days already fully materialized when this event fired.
    pub completed_days: usize,
}

/// Optional sink for progress events.
///
/// Object-safe so surfaces can hand the pipeline a `&dyn ProgressSink`
/// (e.g. the CLI's line printer). Implementations must be cheap: the
/// pipeline calls them inline between materializations.
pub trait ProgressSink: Send + Sync {
    fn slot_started(&self, progress: &SlotProgress);
}

// Compile-time assertion: ProgressSink must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn ProgressSink) {}
};
