//! Integration test: damaged omni mech → technicians assigned → cycles run
//! until every task on the board is resolved or impossible.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use repair_core::scheduler::{actionable_tasks, find_pod_space};
use repair_core::test_fixtures::{base_rules, base_state, mech_tech_id, unit_id, LEFT_TORSO};
use repair_core::*;

#[test]
fn full_maintenance_cycle() {
    let rules = base_rules();
    let mut state = base_state();
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut history = Vec::new();

    for _ in 0..30 {
        let technician = &state.technicians[&mech_tech_id()];
        let busy = state.tasks.values().any(|t| t.team_id() == Some(mech_tech_id()));
        let commands: Vec<_> = if busy {
            vec![]
        } else {
            actionable_tasks(&state, Some(technician), &rules.constants)
                .into_iter()
                .find(|(_, availability)| *availability == Availability::Available)
                .map(|(task_id, _)| CommandEnvelope {
                    id: CommandId(format!("cmd_{:06}", state.meta.tick)),
                    issued_tick: state.meta.tick,
                    execute_at_tick: state.meta.tick,
                    command: Command::AssignTechnician {
                        task_id,
                        technician_id: mech_tech_id(),
                    },
                })
                .into_iter()
                .collect()
        };
        history.extend(tick(&mut state, &commands, &rules, &mut rng, EventLevel::Normal));
    }

    assert_eq!(state.meta.tick, 30);
    assert!(history
        .iter()
        .any(|e| matches!(e.event, Event::TaskResolved { .. })));

    // Whatever is left on the board is beyond a regular technician.
    let technician = &state.technicians[&mech_tech_id()];
    for (task_id, availability) in actionable_tasks(&state, Some(technician), &rules.constants) {
        assert_eq!(
            availability,
            Availability::Blocked,
            "{task_id} still workable after 30 cycles"
        );
    }

    // Event ids are stamped in emission order.
    let ids: Vec<_> = history.iter().map(|e| e.id.0.clone()).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);

    let pod = find_pod_space(&state, &unit_id(), LEFT_TORSO).unwrap();
    let summary = scheduler::summarize(&state, &pod, &rules.constants).unwrap();
    assert!(summary.time_left <= POD_SPACE_BASE_MINUTES);
}
