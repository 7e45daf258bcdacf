use super::*;

#[test]
fn assign_records_team_and_emits_event() {
    let mut state = base_state();
    let mut events = Vec::new();

    assign(&mut state, &left_torso_pod(), mech_tech_id(), &test_constants(), &mut events).unwrap();

    assert_eq!(work(&state, &left_torso_pod()).team_id, Some(mech_tech_id()));
    assert!(matches!(
        &events[..],
        [EventEnvelope { event: Event::TaskAssigned { technician_id, .. }, .. }]
            if *technician_id == mech_tech_id()
    ));
}

#[test]
fn assign_reserves_stock_for_missing_part() {
    let mut state = base_state();
    state.parts.get_mut(PartId(4)).unwrap().condition = PartCondition::Missing;
    state.parts.insert(part(
        30,
        "Lower Arm Actuator",
        "lower_arm_actuator",
        None,
        false,
        PartCondition::Intact,
    ));
    refresh_tasks(&mut state);
    let actuator = find_part_task(&state, PartId(4)).unwrap();
    let mut events = Vec::new();

    assign(&mut state, &actuator, mech_tech_id(), &test_constants(), &mut events).unwrap();
    assert_eq!(state.parts.get(PartId(30)).unwrap().reserved_for, Some(PartId(4)));

    unassign(&mut state, &actuator, &mut events).unwrap();
    assert_eq!(state.parts.get(PartId(30)).unwrap().reserved_for, None);
}

#[test]
fn ineligible_assignment_leaves_task_unchanged() {
    let mut state = base_state();
    let before = work(&state, &left_torso_pod());
    let mut events = Vec::new();

    let err = assign(&mut state, &left_torso_pod(), aero_tech_id(), &test_constants(), &mut events)
        .unwrap_err();

    assert!(matches!(
        err,
        RepairError::IneligibleAssignment {
            reason: IneligibleReason::WrongTechType { skill: TechSkill::AeroTech },
            ..
        }
    ));
    assert_eq!(work(&state, &left_torso_pod()), before);
    assert!(events.is_empty());
}

#[test]
fn unknown_task_or_technician_is_reported() {
    let mut state = base_state();
    let mut events = Vec::new();
    let missing_task = TaskId("task_9999".to_string());
    assert_eq!(
        assign(&mut state, &missing_task, mech_tech_id(), &test_constants(), &mut events),
        Err(RepairError::TaskNotFound(missing_task))
    );

    let stranger = TechnicianId(uuid::Uuid::from_u128(99));
    assert_eq!(
        assign(&mut state, &left_torso_pod(), stranger, &test_constants(), &mut events),
        Err(RepairError::TechnicianNotFound(stranger))
    );
}

#[test]
fn shorthanded_modifier_set_on_assign() {
    let mut state = base_state();
    state.technicians.get_mut(&mech_tech_id()).unwrap().assistants = 0;
    let mut events = Vec::new();
    assign(&mut state, &left_torso_pod(), mech_tech_id(), &test_constants(), &mut events).unwrap();
    assert_eq!(work(&state, &left_torso_pod()).shorthanded_mod, 4);
}

#[test]
fn recorded_time_is_clamped_to_actual_time() {
    let mut state = base_state();
    assert_eq!(record_time(&mut state, &left_torso_pod(), 20, false), Ok(20));
    assert_eq!(record_time(&mut state, &left_torso_pod(), 500, false), Ok(30));
    assert!(is_ready(&state, &left_torso_pod()).unwrap());
}

#[test]
fn unassign_preserves_time_spent() {
    let mut state = base_state();
    let mut events = Vec::new();
    assign(&mut state, &left_torso_pod(), mech_tech_id(), &test_constants(), &mut events).unwrap();
    record_time(&mut state, &left_torso_pod(), 20, false).unwrap();

    let technician = unassign(&mut state, &left_torso_pod(), &mut events).unwrap();

    assert_eq!(technician, mech_tech_id());
    let work = work(&state, &left_torso_pod());
    assert_eq!(work.team_id, None);
    assert_eq!(work.time_spent, 20);
    assert_eq!(
        unassign(&mut state, &left_torso_pod(), &mut events),
        Err(RepairError::Unassigned(left_torso_pod()))
    );
}

#[test]
fn failure_resets_time_and_escalates_skill() {
    let mut state = base_state();
    assign_and_finish(&mut state, &left_torso_pod(), mech_tech_id());
    let before = work(&state, &left_torso_pod());
    let mut events = Vec::new();

    let outcome = resolve(
        &mut state,
        &left_torso_pod(),
        CheckResult::Failed { margin: -3 },
        &mut events,
    )
    .unwrap();

    assert_eq!(outcome, TaskOutcome::Failed);
    let after = work(&state, &left_torso_pod());
    assert_eq!(after.time_spent, 0);
    assert_eq!(after.shorthanded_mod, 0);
    assert_eq!(after.team_id, None);
    assert!(after.skill_min > before.skill_min);
    assert_eq!(after.skill_min_tier(), Some(SkillTier::Veteran));
    assert!(pod(&state, &left_torso_pod()).needs_fixing(&state.parts));
}

#[test]
fn repeated_failure_ends_impossible() {
    let mut state = base_state();
    state.technicians.get_mut(&mech_tech_id()).unwrap().tier = SkillTier::Elite;
    assign_and_finish(&mut state, &left_torso_pod(), mech_tech_id());
    let mut events = Vec::new();
    resolve(&mut state, &left_torso_pod(), CheckResult::Failed { margin: -1 }, &mut events)
        .unwrap();

    let summary = summarize(&state, &left_torso_pod(), &test_constants()).unwrap();
    assert_eq!(summary.skill_min, None);
    assert_eq!(
        availability(
            &state,
            &left_torso_pod(),
            state.technicians.get(&mech_tech_id()),
            &test_constants()
        ),
        Ok(Availability::Blocked)
    );
}

#[test]
fn resolve_requires_assignment_and_full_time() {
    let mut state = base_state();
    let mut events = Vec::new();
    let pass = CheckResult::Passed { margin: 0 };
    assert_eq!(
        resolve(&mut state, &left_torso_pod(), pass, &mut events),
        Err(RepairError::Unassigned(left_torso_pod()))
    );

    assign(&mut state, &left_torso_pod(), mech_tech_id(), &test_constants(), &mut events).unwrap();
    record_time(&mut state, &left_torso_pod(), 10, false).unwrap();
    assert_eq!(
        resolve(&mut state, &left_torso_pod(), pass, &mut events),
        Err(RepairError::NotReady {
            task_id: left_torso_pod(),
            time_left: 20
        })
    );
}

#[test]
fn mode_change_only_while_unscheduled() {
    let mut state = base_state();
    let mut events = Vec::new();
    set_mode(&mut state, &left_torso_pod(), WorkMode::Reconfigure, &mut events).unwrap();
    assert!(state.tasks[&left_torso_pod()].is_reconfiguring());

    assign(&mut state, &left_torso_pod(), mech_tech_id(), &test_constants(), &mut events).unwrap();
    assert_eq!(
        set_mode(&mut state, &left_torso_pod(), WorkMode::Remove, &mut events),
        Err(RepairError::Scheduled(left_torso_pod()))
    );
}

#[test]
fn successful_part_repair_leaves_the_board() {
    let mut state = base_state();
    let actuator = task(6);
    assign_and_finish(&mut state, &actuator, mech_tech_id());
    let mut events = Vec::new();

    let outcome = resolve(&mut state, &actuator, CheckResult::Passed { margin: 2 }, &mut events)
        .unwrap();

    assert_eq!(outcome, TaskOutcome::Fixed);
    assert_eq!(state.parts.get(PartId(4)).unwrap().condition, PartCondition::Intact);
    assert!(!state.tasks.contains_key(&actuator));
    assert_eq!(find_part_task(&state, PartId(4)), None);
}

#[test]
fn salvage_success_fixes_the_part_and_reports_removal() {
    let mut state = base_state();
    let actuator = task(6);
    let mut events = Vec::new();
    set_mode(&mut state, &actuator, WorkMode::Remove, &mut events).unwrap();
    assign_and_finish(&mut state, &actuator, mech_tech_id());

    let outcome = resolve(&mut state, &actuator, CheckResult::Passed { margin: 0 }, &mut events)
        .unwrap();

    assert_eq!(outcome, TaskOutcome::Removed);
    let unit = unit_id();
    let installed: Vec<_> = state
        .parts
        .parts_in_location(&unit, RIGHT_ARM)
        .map(|p| (p.id, p.condition))
        .collect();
    assert_eq!(installed, vec![(PartId(4), PartCondition::Intact)]);
    assert!(!state.tasks.contains_key(&actuator));
    assert!(matches!(
        events.last().map(|e| &e.event),
        Some(Event::TaskResolved { mode: WorkMode::Remove, outcome: TaskOutcome::Removed, .. })
    ));
}

#[test]
fn summary_reports_structured_values() {
    let mut state = base_state();
    let summary = summarize(&state, &left_torso_pod(), &test_constants()).unwrap();
    assert_eq!(summary.action, WorkMode::Replace);
    assert_eq!(summary.name, "Left Torso Pod Space");
    assert_eq!(summary.time_left, 30);
    assert_eq!(summary.skill_min, Some(SkillTier::Green));
    assert!(summary.show_skill);
    assert_eq!(summary.modifier_total.to_string(), "-2");
    assert!(!summary.is_scheduled());

    let mut rules = base_rules();
    rules.constants.destroy_by_margin = true;
    let mut events = Vec::new();
    assign(&mut state, &left_torso_pod(), mech_tech_id(), &rules.constants, &mut events).unwrap();
    let summary = summarize(&state, &left_torso_pod(), &rules.constants).unwrap();
    assert!(!summary.show_skill);
    assert_eq!(summary.technician, Some(mech_tech_id()));
}
