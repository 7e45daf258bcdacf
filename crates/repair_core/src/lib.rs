//! `repair_core`: deterministic maintenance cycle.
//!
//! No IO, no network. All randomness via the passed-in Rng. Parts live in a
//! single registry and everything else refers to them by id.

mod eligibility;
mod engine;
mod error;
mod id;
mod part_repair;
mod pod_space;
mod registry;
pub mod scheduler;
mod target_roll;
mod targeting;
mod types;
mod work;

#[cfg(any(test, feature = "test-support"))]
pub mod test_fixtures;

pub use eligibility::{classify, Availability};
pub use engine::tick;
pub use error::{IneligibleReason, PartError, RepairError};
pub use id::{generate_technician_id, generate_uuid};
pub use part_repair::PartRepair;
pub use pod_space::{PodSpace, POD_SPACE_BASE_MINUTES, POD_SPACE_DIFFICULTY};
pub use registry::PartRegistry;
pub use scheduler::CheckResult;
pub use target_roll::{Modifier, RollValue, Sentinel, TargetRoll};
pub use targeting::{append_unit_mods, shorthanded_modifier, target_for};
pub use types::*;
pub use work::{Completion, PartWork, RepairTask, WorkState, BASE_SKILL_MIN};

pub(crate) fn emit(counters: &mut Counters, tick: u64, event: Event) -> EventEnvelope {
    let id = EventId(format!("evt_{:06}", counters.next_event_id));
    counters.next_event_id += 1;
    EventEnvelope { id, tick, event }
}

#[cfg(test)]
mod tests;
