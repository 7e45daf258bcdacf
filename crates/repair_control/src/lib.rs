use std::collections::BTreeSet;

use repair_core::scheduler::{actionable_tasks, target_for_task};
use repair_core::{
    Availability, CampaignState, Command, CommandEnvelope, CommandId, Constants, PartWork, TaskId,
    TechnicianId,
};

pub trait CommandSource {
    fn generate_commands(
        &mut self,
        state: &CampaignState,
        constants: &Constants,
        next_command_id: &mut u64,
    ) -> Vec<CommandEnvelope>;
}

/// Run `source` for the current cycle, continuing the campaign's command id
/// sequence so ids stay unique across saved and resumed runs.
pub fn commands_for_cycle(
    source: &mut impl CommandSource,
    state: &mut CampaignState,
    constants: &Constants,
) -> Vec<CommandEnvelope> {
    let mut next_command_id = state.counters.next_command_id;
    let commands = source.generate_commands(state, constants, &mut next_command_id);
    state.counters.next_command_id = next_command_id;
    commands
}

/// Keeps the repair bay busy: every idle technician is assigned to the
/// first task on the board that is available to them.
pub struct AutoAssignController;

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Allocates a command ID and builds a `CommandEnvelope`.
fn make_cmd(tick: u64, next_id: &mut u64, command: Command) -> CommandEnvelope {
    let cmd_id = CommandId(format!("cmd_{:06}", *next_id));
    *next_id += 1;
    CommandEnvelope {
        id: cmd_id,
        issued_tick: tick,
        execute_at_tick: tick,
        command,
    }
}

/// Technicians on duty with nothing scheduled, in id order.
fn collect_idle_technicians(state: &CampaignState) -> Vec<TechnicianId> {
    let busy: BTreeSet<TechnicianId> = state
        .tasks
        .values()
        .filter_map(|t| t.team_id())
        .collect();
    state
        .technicians
        .values()
        .filter(|t| !t.deployed && t.minutes_per_cycle > 0 && !busy.contains(&t.id))
        .map(|t| t.id)
        .collect()
}

impl CommandSource for AutoAssignController {
    fn generate_commands(
        &mut self,
        state: &CampaignState,
        constants: &Constants,
        next_command_id: &mut u64,
    ) -> Vec<CommandEnvelope> {
        let mut commands = Vec::new();
        let mut claimed: BTreeSet<TaskId> = BTreeSet::new();

        for technician_id in collect_idle_technicians(state) {
            let technician = &state.technicians[&technician_id];
            // Salvage reads as available to anyone, so the target decides.
            let pick = actionable_tasks(state, Some(technician), constants)
                .into_iter()
                .filter(|(id, availability)| {
                    *availability == Availability::Available && !claimed.contains(id)
                })
                .map(|(id, _)| id)
                .find(|id| {
                    target_for_task(state, id, technician_id, constants)
                        .is_ok_and(|target| !target.is_blocked())
                });

            if let Some(task_id) = pick {
                claimed.insert(task_id.clone());
                commands.push(make_cmd(
                    state.meta.tick,
                    next_command_id,
                    Command::AssignTechnician {
                        task_id,
                        technician_id,
                    },
                ));
            }
        }
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repair_core::test_fixtures::{
        base_rules, base_state, make_rng, mech_tech_id, task, technician,
    };
    use repair_core::{tick, EventLevel, SkillTier, TechSkill};
    use uuid::Uuid;

    fn assigned(commands: &[CommandEnvelope]) -> Vec<(TaskId, TechnicianId)> {
        commands
            .iter()
            .filter_map(|c| match &c.command {
                Command::AssignTechnician {
                    task_id,
                    technician_id,
                } => Some((task_id.clone(), *technician_id)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn idle_technician_takes_first_available_task() {
        let state = base_state();
        let constants = base_rules().constants;
        let mut next_id = 0;

        let commands = AutoAssignController.generate_commands(&state, &constants, &mut next_id);

        // The aero tech has nothing it may work on.
        assert_eq!(assigned(&commands), vec![(task(3), mech_tech_id())]);
        assert_eq!(commands[0].id, CommandId("cmd_000000".to_string()));
        assert_eq!(next_id, 1);
    }

    #[test]
    fn two_technicians_do_not_claim_the_same_task() {
        let mut state = base_state();
        let second = TechnicianId(Uuid::from_u128(3));
        state.technicians.insert(
            second,
            technician(second, TechSkill::MechTech, SkillTier::Veteran),
        );
        let constants = base_rules().constants;

        let commands = AutoAssignController.generate_commands(&state, &constants, &mut 0);

        let picks = assigned(&commands);
        assert_eq!(picks.len(), 2);
        assert_ne!(picks[0].0, picks[1].0);
    }

    #[test]
    fn scheduled_technician_is_not_reassigned() {
        let rules = base_rules();
        let mut state = base_state();
        let mut controller = AutoAssignController;
        let mut next_id = 0;
        state.technicians.get_mut(&mech_tech_id()).unwrap().minutes_per_cycle = 10;

        let commands = controller.generate_commands(&state, &rules.constants, &mut next_id);
        tick(&mut state, &commands, &rules, &mut make_rng(), EventLevel::Normal);

        assert_eq!(
            state.tasks[&task(3)].team_id(),
            Some(mech_tech_id()),
            "assignment should survive a partial cycle"
        );
        let commands = controller.generate_commands(&state, &rules.constants, &mut next_id);
        assert!(commands.is_empty(), "aero tech has no work and mech tech is busy");
    }

    #[test]
    fn deployed_technician_is_skipped() {
        let mut state = base_state();
        state.technicians.get_mut(&mech_tech_id()).unwrap().deployed = true;
        let constants = base_rules().constants;

        let commands = AutoAssignController.generate_commands(&state, &constants, &mut 0);
        assert!(commands.is_empty());
    }

    #[test]
    fn command_ids_continue_from_campaign_counter() {
        let mut state = base_state();
        let constants = base_rules().constants;
        state.counters.next_command_id = 41;

        let commands = commands_for_cycle(&mut AutoAssignController, &mut state, &constants);

        assert_eq!(commands[0].id, CommandId("cmd_000041".to_string()));
        assert_eq!(state.counters.next_command_id, 42);
    }
}
