use super::*;
use crate::scheduler::{
    actionable_tasks, assign, availability, find_part_task, find_pod_space, is_ready,
    record_time, refresh_tasks, resolve, set_mode, summarize, target_for_task, unassign,
};
use crate::test_fixtures::{
    aero_tech_id, base_rules, base_state, make_rng, mech_tech_id, part, task, technician,
    unit_id, LEFT_TORSO, RIGHT_ARM, RIGHT_TORSO,
};

mod scheduler;

// --- Shared test helpers ------------------------------------------------

fn test_constants() -> Constants {
    base_rules().constants
}

/// The damaged left torso pod space of the base state.
fn left_torso_pod() -> TaskId {
    task(3)
}

fn unit_mut(state: &mut CampaignState) -> &mut UnitState {
    state.units.get_mut(&unit_id()).unwrap()
}

fn location_mut(state: &mut CampaignState, location: LocationId) -> &mut LocationState {
    unit_mut(state)
        .locations
        .iter_mut()
        .find(|l| l.id == location)
        .unwrap()
}

fn pod<'a>(state: &'a CampaignState, id: &TaskId) -> &'a PodSpace {
    state.tasks[id].as_pod_space().unwrap()
}

fn work(state: &CampaignState, id: &TaskId) -> WorkState {
    state.tasks[id].work().clone()
}

/// Assign and spend the task's full time without rolling.
fn assign_and_finish(state: &mut CampaignState, id: &TaskId, technician: TechnicianId) {
    let mut events = Vec::new();
    assign(state, id, technician, &test_constants(), &mut events).unwrap();
    record_time(state, id, u32::MAX, false).unwrap();
    assert!(is_ready(state, id).unwrap());
}

fn command(state: &CampaignState, n: u64, command: Command) -> CommandEnvelope {
    CommandEnvelope {
        id: CommandId(format!("cmd_{n:06}")),
        issued_tick: state.meta.tick,
        execute_at_tick: state.meta.tick,
        command,
    }
}
