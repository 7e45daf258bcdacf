//! Availability of a task for the task board.

use serde::{Deserialize, Serialize};

use crate::targeting::target_for;
use crate::work::PartWork;
use crate::{Constants, Technician, Workshop};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Availability {
    Available,
    /// Replacement stock is not on hand.
    NotAvailable,
    /// Stock is on order. Set by inventory logistics, never derived here.
    InTransit,
    /// The candidate technician cannot succeed.
    Blocked,
    Scheduled,
}

/// Classify `task`, optionally against the technician being considered.
///
/// Rules apply in order and the first match wins: salvage work is always
/// available, then a scheduled task stays scheduled, then missing stock,
/// then the candidate's target roll.
pub fn classify<W: PartWork + ?Sized>(
    task: &W,
    candidate: Option<&Technician>,
    shop: &Workshop<'_>,
    constants: &Constants,
) -> Availability {
    if task.is_salvaging() {
        return Availability::Available;
    }
    if task.team_id().is_some() {
        return Availability::Scheduled;
    }
    if task
        .missing_part(shop.parts)
        .is_some_and(|id| !shop.parts.replacement_available(id))
    {
        return Availability::NotAvailable;
    }
    if let Some(technician) = candidate {
        if target_for(task, technician, shop, constants).is_blocked() {
            return Availability::Blocked;
        }
    }
    Availability::Available
}
