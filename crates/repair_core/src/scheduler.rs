//! Task board and task lifecycle: assignment, time accrual, resolution.
//!
//! Every operation takes the whole `CampaignState` and destructures it so a
//! task can mutate the part registry while reading units and technicians.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use crate::eligibility::{classify, Availability};
use crate::error::{IneligibleReason, PartError, RepairError};
use crate::part_repair::PartRepair;
use crate::pod_space::PodSpace;
use crate::registry::PartRegistry;
use crate::target_roll::{RollValue, Sentinel, TargetRoll};
use crate::targeting::{shorthanded_modifier, target_for};
use crate::work::{PartWork, RepairTask, WorkState};
use crate::{
    CampaignState, Constants, Counters, Event, EventEnvelope, LocationId, PartId, TaskId,
    TaskOutcome, TaskSummary, Technician, TechnicianId, UnitId, UnitState, WorkMode, Workshop,
};

/// Result of the external skill check. `margin` is roll minus target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckResult {
    Passed { margin: i32 },
    Failed { margin: i32 },
}

impl CheckResult {
    /// Compare a 2d6 total against a target. `None` when the target
    /// forbids rolling at all.
    pub fn from_roll(target: RollValue, roll: i32) -> Option<Self> {
        match target {
            RollValue::Fixed(Sentinel::AutomaticSuccess) => Some(CheckResult::Passed { margin: 0 }),
            RollValue::Fixed(_) => None,
            RollValue::Value(target) if roll >= target => Some(CheckResult::Passed {
                margin: roll - target,
            }),
            RollValue::Value(target) => Some(CheckResult::Failed {
                margin: roll - target,
            }),
        }
    }
}

fn workshop<'a>(
    units: &'a BTreeMap<UnitId, UnitState>,
    parts: &'a PartRegistry,
    task: &RepairTask,
) -> Workshop<'a> {
    let unit = task.unit_id(parts).and_then(|id| units.get(&id));
    Workshop::new(unit, parts)
}

fn next_task_id(counters: &mut Counters) -> TaskId {
    let id = TaskId(format!("task_{:04}", counters.next_task_id));
    counters.next_task_id += 1;
    id
}

// ---------------------------------------------------------------------------
// Assignment
// ---------------------------------------------------------------------------

/// Schedule `technician_id` on a task and lock the stock it will consume.
///
/// Refused, with the task left untouched, when the task cannot be worked or
/// the technician's specialisation does not match the unit.
pub fn assign(
    state: &mut CampaignState,
    task_id: &TaskId,
    technician_id: TechnicianId,
    constants: &Constants,
    events: &mut Vec<EventEnvelope>,
) -> Result<(), RepairError> {
    let CampaignState {
        meta,
        units,
        parts,
        technicians,
        tasks,
        counters,
    } = state;

    let task = tasks
        .get_mut(task_id)
        .ok_or_else(|| RepairError::TaskNotFound(task_id.clone()))?;
    let technician = technicians
        .get(&technician_id)
        .ok_or(RepairError::TechnicianNotFound(technician_id))?;

    let shop = workshop(units, parts, task);
    if let Some(reason) = task.check_fixable(&shop) {
        return Err(RepairError::IneligibleAssignment {
            task_id: task_id.clone(),
            reason: IneligibleReason::Blocked(reason),
        });
    }
    if !task.is_right_tech_type(shop.unit, technician.skill) {
        return Err(RepairError::IneligibleAssignment {
            task_id: task_id.clone(),
            reason: IneligibleReason::WrongTechType {
                skill: technician.skill,
            },
        });
    }

    if task.team_id().is_some() {
        task.cancel_reservation(parts);
    }
    let work = task.work_mut();
    work.team_id = Some(technician_id);
    work.shorthanded_mod =
        shorthanded_modifier(technician.assistants, constants.full_team_assistants);

    for err in task.reserve_part(parts) {
        warn!(task = %task_id, %err, "reservation failed");
    }
    debug!(task = %task_id, technician = %technician_id, "task assigned");

    events.push(crate::emit(
        counters,
        meta.tick,
        Event::TaskAssigned {
            task_id: task_id.clone(),
            technician_id,
        },
    ));
    Ok(())
}

/// Take the technician off a task. Time already spent is kept.
pub fn unassign(
    state: &mut CampaignState,
    task_id: &TaskId,
    events: &mut Vec<EventEnvelope>,
) -> Result<TechnicianId, RepairError> {
    let task = state
        .tasks
        .get_mut(task_id)
        .ok_or_else(|| RepairError::TaskNotFound(task_id.clone()))?;
    let technician_id = task
        .work_mut()
        .team_id
        .take()
        .ok_or_else(|| RepairError::Unassigned(task_id.clone()))?;
    task.cancel_reservation(&mut state.parts);

    events.push(crate::emit(
        &mut state.counters,
        state.meta.tick,
        Event::TaskUnassigned {
            task_id: task_id.clone(),
            technician_id,
        },
    ));
    Ok(technician_id)
}

/// Change what a successful attempt will do. Only allowed while unscheduled.
pub fn set_mode(
    state: &mut CampaignState,
    task_id: &TaskId,
    mode: WorkMode,
    events: &mut Vec<EventEnvelope>,
) -> Result<(), RepairError> {
    let task = state
        .tasks
        .get_mut(task_id)
        .ok_or_else(|| RepairError::TaskNotFound(task_id.clone()))?;
    if task.team_id().is_some() {
        return Err(RepairError::Scheduled(task_id.clone()));
    }
    if task.work().mode == mode {
        return Ok(());
    }

    task.work_mut().mode = mode;
    // A mode change can shorten the job.
    let actual = task.actual_time(&state.parts);
    let work = task.work_mut();
    work.time_spent = work.time_spent.min(actual);

    events.push(crate::emit(
        &mut state.counters,
        state.meta.tick,
        Event::ModeChanged {
            task_id: task_id.clone(),
            mode,
        },
    ));
    Ok(())
}

// ---------------------------------------------------------------------------
// Progress and resolution
// ---------------------------------------------------------------------------

/// Add work minutes, clamped to the task's actual time. Returns the new
/// time spent.
pub fn record_time(
    state: &mut CampaignState,
    task_id: &TaskId,
    minutes: u32,
    overtime: bool,
) -> Result<u32, RepairError> {
    let task = state
        .tasks
        .get_mut(task_id)
        .ok_or_else(|| RepairError::TaskNotFound(task_id.clone()))?;
    if overtime {
        task.work_mut().worked_overtime = true;
    }
    Ok(task.add_time_spent(minutes, &state.parts))
}

pub fn is_ready(state: &CampaignState, task_id: &TaskId) -> Result<bool, RepairError> {
    let task = state
        .tasks
        .get(task_id)
        .ok_or_else(|| RepairError::TaskNotFound(task_id.clone()))?;
    Ok(task.time_left(&state.parts) == 0)
}

/// Apply the skill check outcome to a scheduled task whose time is in.
///
/// Success performs the mode's action and clears the task's work state.
/// Failure escalates the minimum tier past the technician who failed,
/// zeroes the time spent and unschedules the task. The board is refreshed
/// afterwards, so a completed part task may no longer be on it.
pub fn resolve(
    state: &mut CampaignState,
    task_id: &TaskId,
    result: CheckResult,
    events: &mut Vec<EventEnvelope>,
) -> Result<TaskOutcome, RepairError> {
    let CampaignState {
        meta,
        units,
        parts,
        technicians,
        tasks,
        counters,
    } = state;

    let task = tasks
        .get_mut(task_id)
        .ok_or_else(|| RepairError::TaskNotFound(task_id.clone()))?;
    let technician_id = task
        .team_id()
        .ok_or_else(|| RepairError::Unassigned(task_id.clone()))?;
    let time_left = task.time_left(parts);
    if time_left > 0 {
        return Err(RepairError::NotReady {
            task_id: task_id.clone(),
            time_left,
        });
    }
    let rating = technicians
        .get(&technician_id)
        .map(|t| t.tier.rank())
        .ok_or(RepairError::TechnicianNotFound(technician_id))?;

    // Named before acting: fixing a pod space rewrites its children.
    let task_name = task.name(&workshop(units, parts, task));
    let mode = task.work().mode;
    let mut unavailable = Vec::new();

    let (outcome, margin) = match result {
        CheckResult::Passed { margin } => {
            let completion = task.succeed(parts);
            for err in completion.child_errors {
                if let PartError::NoReplacement { part_id, kind } = err {
                    unavailable.push((part_id, kind));
                }
            }
            task.cancel_reservation(parts);
            *task.work_mut() = WorkState::default();
            (completion.outcome, margin)
        }
        CheckResult::Failed { margin } => {
            task.fail(rating);
            task.work_mut().team_id = None;
            task.cancel_reservation(parts);
            (TaskOutcome::Failed, margin)
        }
    };

    info!(task = %task_id, name = %task_name, ?outcome, margin, "task resolved");

    for (part_id, kind) in unavailable {
        events.push(crate::emit(
            counters,
            meta.tick,
            Event::ReplacementUnavailable {
                task_id: task_id.clone(),
                part_id,
                kind,
            },
        ));
    }
    events.push(crate::emit(
        counters,
        meta.tick,
        Event::TaskResolved {
            task_id: task_id.clone(),
            task_name,
            technician_id,
            mode,
            outcome,
            margin,
        },
    ));

    refresh_tasks(state);
    Ok(outcome)
}

// ---------------------------------------------------------------------------
// Task board
// ---------------------------------------------------------------------------

/// Bring the task board in line with the part registry.
///
/// Every location of an omni unit gets a pod space. Every other installed
/// part that needs work gets a part task. Part tasks with nothing left to do
/// are dropped, and pod spaces re-derive their children.
pub fn refresh_tasks(state: &mut CampaignState) {
    let CampaignState {
        units,
        parts,
        tasks,
        counters,
        ..
    } = state;

    tasks.retain(|_, task| match task {
        RepairTask::Part(repair) => repair.has_work(parts),
        RepairTask::PodSpace(pod) => units.contains_key(pod.unit_id()),
    });

    let mut pods: BTreeSet<(UnitId, LocationId)> = BTreeSet::new();
    let mut covered: BTreeSet<PartId> = BTreeSet::new();
    for task in tasks.values() {
        match task {
            RepairTask::Part(repair) => {
                covered.insert(repair.part_id());
            }
            RepairTask::PodSpace(pod) => {
                pods.insert((pod.unit_id().clone(), pod.location()));
            }
        }
    }

    for unit in units.values().filter(|u| u.omni) {
        for location in &unit.locations {
            if !pods.contains(&(unit.id.clone(), location.id)) {
                let id = next_task_id(counters);
                debug!(task = %id, unit = %unit.id, location = %location.id, "pod space added");
                tasks.insert(id, RepairTask::PodSpace(PodSpace::new(unit, location.id)));
            }
        }
    }

    let new_parts: Vec<PartId> = parts
        .iter()
        .filter(|p| p.needs_fixing() && !covered.contains(&p.id))
        .filter(|p| {
            // Pod-mounted parts on omni units are worked through their pod space.
            p.unit
                .as_ref()
                .and_then(|id| units.get(id))
                .is_some_and(|unit| !(unit.omni && p.omni_podded))
        })
        .map(|p| p.id)
        .collect();
    for part_id in new_parts {
        let id = next_task_id(counters);
        debug!(task = %id, part = %part_id, "part task added");
        tasks.insert(id, RepairTask::Part(PartRepair::new(part_id)));
    }

    for task in tasks.values_mut() {
        task.update_condition(parts);
    }
}

/// Tasks with work to do, in board order, with their availability for
/// `candidate` (or for nobody in particular).
pub fn actionable_tasks(
    state: &CampaignState,
    candidate: Option<&Technician>,
    constants: &Constants,
) -> Vec<(TaskId, Availability)> {
    state
        .tasks
        .iter()
        .filter(|(_, task)| task.has_work(&state.parts))
        .map(|(id, task)| {
            let shop = workshop(&state.units, &state.parts, task);
            (id.clone(), classify(task, candidate, &shop, constants))
        })
        .collect()
}

pub fn availability(
    state: &CampaignState,
    task_id: &TaskId,
    candidate: Option<&Technician>,
    constants: &Constants,
) -> Result<Availability, RepairError> {
    let task = state
        .tasks
        .get(task_id)
        .ok_or_else(|| RepairError::TaskNotFound(task_id.clone()))?;
    let shop = workshop(&state.units, &state.parts, task);
    Ok(classify(task, candidate, &shop, constants))
}

/// Full target number for a technician on a task.
pub fn target_for_task(
    state: &CampaignState,
    task_id: &TaskId,
    technician_id: TechnicianId,
    constants: &Constants,
) -> Result<TargetRoll, RepairError> {
    let task = state
        .tasks
        .get(task_id)
        .ok_or_else(|| RepairError::TaskNotFound(task_id.clone()))?;
    let technician = state
        .technicians
        .get(&technician_id)
        .ok_or(RepairError::TechnicianNotFound(technician_id))?;
    let shop = workshop(&state.units, &state.parts, task);
    Ok(target_for(task, technician, &shop, constants))
}

pub fn summarize(
    state: &CampaignState,
    task_id: &TaskId,
    constants: &Constants,
) -> Result<TaskSummary, RepairError> {
    let task = state
        .tasks
        .get(task_id)
        .ok_or_else(|| RepairError::TaskNotFound(task_id.clone()))?;
    let shop = workshop(&state.units, &state.parts, task);
    Ok(TaskSummary {
        task_id: task_id.clone(),
        action: task.work().mode,
        name: task.name(&shop),
        time_left: task.time_left(&state.parts),
        skill_min: task.skill_min(),
        show_skill: !constants.destroy_by_margin,
        modifier_total: task.all_mods(&shop).value(),
        technician: task.team_id(),
    })
}

pub fn find_pod_space(
    state: &CampaignState,
    unit: &UnitId,
    location: LocationId,
) -> Option<TaskId> {
    state.tasks.iter().find_map(|(id, task)| {
        task.as_pod_space()
            .filter(|pod| pod.unit_id() == unit && pod.location() == location)
            .map(|_| id.clone())
    })
}

pub fn find_part_task(state: &CampaignState, part_id: PartId) -> Option<TaskId> {
    state.tasks.iter().find_map(|(id, task)| match task {
        RepairTask::Part(repair) if repair.part_id() == part_id => Some(id.clone()),
        _ => None,
    })
}
