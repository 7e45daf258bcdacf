use rand::Rng;
use tracing::{debug, warn};

use crate::scheduler::{
    assign, record_time, refresh_tasks, resolve, set_mode, target_for_task, unassign, CheckResult,
};
use crate::work::PartWork;
use crate::{
    CampaignState, Command, CommandEnvelope, Constants, Event, EventEnvelope, EventLevel, Rules,
    TaskId, TechnicianId,
};

/// Advance the campaign by one maintenance cycle.
///
/// Order of operations:
/// 1. Refresh the task board from the part registry.
/// 2. Apply commands scheduled for this cycle.
/// 3. Technicians work their assigned tasks in task order. A task whose
///    time was already complete when the cycle began is rolled and resolved
///    instead.
/// 4. Increment the cycle counter.
///
/// Returns all events produced this cycle.
pub fn tick(
    state: &mut CampaignState,
    commands: &[CommandEnvelope],
    rules: &Rules,
    rng: &mut impl Rng,
    event_level: EventLevel,
) -> Vec<EventEnvelope> {
    let mut events = Vec::new();

    refresh_tasks(state);
    apply_commands(state, commands, &rules.constants, &mut events);
    work_cycle(state, &rules.constants, rng, event_level, &mut events);

    state.meta.tick += 1;
    events
}

fn apply_commands(
    state: &mut CampaignState,
    commands: &[CommandEnvelope],
    constants: &Constants,
    events: &mut Vec<EventEnvelope>,
) {
    let current_tick = state.meta.tick;

    for envelope in commands {
        if envelope.execute_at_tick != current_tick {
            continue;
        }
        let result = match &envelope.command {
            Command::AssignTechnician {
                task_id,
                technician_id,
            } => assign(state, task_id, *technician_id, constants, events),
            Command::UnassignTechnician { task_id } => {
                unassign(state, task_id, events).map(|_| ())
            }
            Command::SetWorkMode { task_id, mode } => set_mode(state, task_id, *mode, events),
        };
        if let Err(err) = result {
            warn!(command = %envelope.id, %err, "command rejected");
            events.push(crate::emit(
                &mut state.counters,
                current_tick,
                Event::CommandRejected {
                    command_id: envelope.id.clone(),
                    reason: err.to_string(),
                },
            ));
        }
    }
}

fn work_cycle(
    state: &mut CampaignState,
    constants: &Constants,
    rng: &mut impl Rng,
    event_level: EventLevel,
    events: &mut Vec<EventEnvelope>,
) {
    let overtime_pool = if constants.overtime_allowed {
        constants.overtime_minutes_per_cycle
    } else {
        0
    };
    for technician in state.technicians.values_mut() {
        technician.minutes_left = technician.minutes_per_cycle.saturating_add(overtime_pool);
    }

    // Snapshot the schedule; resolution rewrites the board.
    let scheduled: Vec<(TaskId, TechnicianId)> = state
        .tasks
        .iter()
        .filter_map(|(id, task)| task.team_id().map(|tech| (id.clone(), tech)))
        .collect();

    for (task_id, technician_id) in scheduled {
        // An earlier resolution may have retired or unscheduled this task.
        let still_scheduled = state
            .tasks
            .get(&task_id)
            .is_some_and(|t| t.team_id() == Some(technician_id));
        if !still_scheduled {
            continue;
        }
        if !attempt_allowed(state, &task_id, technician_id, constants, events) {
            continue;
        }

        let Some(time_left) = state.tasks.get(&task_id).map(|t| t.time_left(&state.parts)) else {
            continue;
        };
        if time_left > 0 {
            spend_minutes(
                state,
                &task_id,
                technician_id,
                time_left,
                overtime_pool,
                event_level,
                events,
            );
            // Finished work is rolled on the following cycle.
            continue;
        }

        let Ok(target) = target_for_task(state, &task_id, technician_id, constants) else {
            continue;
        };
        let roll = rng.gen_range(1..=6) + rng.gen_range(1..=6);
        let Some(result) = CheckResult::from_roll(target.value(), roll) else {
            block(state, &task_id, technician_id, target.desc(), events);
            continue;
        };
        debug!(task = %task_id, roll, target = %target.value(), "skill check");
        if let Err(err) = resolve(state, &task_id, result, events) {
            warn!(task = %task_id, %err, "resolution failed");
        }
    }
}

/// Put the technician's remaining minutes into the task. Regular hours are
/// spent before the overtime pool.
fn spend_minutes(
    state: &mut CampaignState,
    task_id: &TaskId,
    technician_id: TechnicianId,
    time_left: u32,
    overtime_pool: u32,
    event_level: EventLevel,
    events: &mut Vec<EventEnvelope>,
) {
    let Some(minutes_left) = state.technicians.get(&technician_id).map(|t| t.minutes_left) else {
        return;
    };
    let spend = time_left.min(minutes_left);
    if spend == 0 {
        return;
    }
    let overtime = spend > minutes_left.saturating_sub(overtime_pool);
    if let Some(technician) = state.technicians.get_mut(&technician_id) {
        technician.minutes_left -= spend;
    }
    let Ok(time_spent) = record_time(state, task_id, spend, overtime) else {
        return;
    };
    debug!(task = %task_id, technician = %technician_id, spend, time_spent, overtime, "work recorded");
    if event_level == EventLevel::Debug {
        let actual_time = state
            .tasks
            .get(task_id)
            .map_or(time_spent, |t| t.actual_time(&state.parts));
        events.push(crate::emit(
            &mut state.counters,
            state.meta.tick,
            Event::WorkRecorded {
                task_id: task_id.clone(),
                technician_id,
                minutes: spend,
                time_spent,
                actual_time,
                overtime,
            },
        ));
    }
}

/// Check the target before any time is spent. A task nobody could finish
/// is unscheduled instead of worked.
fn attempt_allowed(
    state: &mut CampaignState,
    task_id: &TaskId,
    technician_id: TechnicianId,
    constants: &Constants,
    events: &mut Vec<EventEnvelope>,
) -> bool {
    match target_for_task(state, task_id, technician_id, constants) {
        Ok(target) if target.is_blocked() => {
            block(state, task_id, technician_id, target.desc(), events);
            false
        }
        Ok(_) => true,
        Err(err) => {
            warn!(task = %task_id, %err, "scheduled task cannot be worked");
            if let Err(err) = unassign(state, task_id, events) {
                warn!(task = %task_id, %err, "unassign failed");
            }
            false
        }
    }
}

fn block(
    state: &mut CampaignState,
    task_id: &TaskId,
    technician_id: TechnicianId,
    reason: String,
    events: &mut Vec<EventEnvelope>,
) {
    debug!(task = %task_id, technician = %technician_id, %reason, "attempt blocked");
    events.push(crate::emit(
        &mut state.counters,
        state.meta.tick,
        Event::AttemptBlocked {
            task_id: task_id.clone(),
            technician_id,
            reason,
        },
    ));
    if let Err(err) = unassign(state, task_id, events) {
        warn!(task = %task_id, %err, "unassign failed");
    }
}
