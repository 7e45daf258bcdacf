//! Shared test fixtures for repair_core and downstream crates.
//!
//! `base_state()` is one omni mech in a repair bay with a damaged left
//! torso pod space, one damaged arm actuator worked as a single part, an
//! intact right torso pod space, and spare stock for both damaged pod parts.
//! The task board is already refreshed:
//!
//! | task        | work                         |
//! |-------------|------------------------------|
//! | `task_0000`–`task_0005` | pod spaces, locations 0–5 |
//! | `task_0006` | lower arm actuator (part 4)  |

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

use crate::scheduler::refresh_tasks;
use crate::{
    CampaignState, Chassis, Constants, Counters, LocationId, LocationState, MetaState, Part,
    PartCondition, PartId, PartRegistry, RepairSite, Rules, SkillTier, TaskId, TechSkill,
    Technician, TechnicianId, UnitId, UnitState,
};

pub const LEFT_TORSO: LocationId = LocationId(3);
pub const RIGHT_TORSO: LocationId = LocationId(2);
pub const RIGHT_ARM: LocationId = LocationId(4);

pub fn base_rules() -> Rules {
    Rules {
        rules_version: "test".to_string(),
        constants: Constants {
            overtime_allowed: false,
            overtime_minutes_per_cycle: 240,
            overtime_modifier: 3,
            full_team_assistants: 6,
            destroy_by_margin: false,
        },
    }
}

pub fn unit_id() -> UnitId {
    UnitId("unit_0001".to_string())
}

pub fn mech_tech_id() -> TechnicianId {
    TechnicianId(Uuid::from_u128(1))
}

pub fn aero_tech_id() -> TechnicianId {
    TechnicianId(Uuid::from_u128(2))
}

pub fn task(n: u64) -> TaskId {
    TaskId(format!("task_{n:04}"))
}

pub fn omni_mech() -> UnitState {
    let names = [
        "Head",
        "Center Torso",
        "Right Torso",
        "Left Torso",
        "Right Arm",
        "Left Arm",
    ];
    UnitState {
        id: unit_id(),
        name: "Mad Cat Prime".to_string(),
        chassis: Chassis::Mech,
        omni: true,
        site: RepairSite::Bay,
        quirks: vec![],
        locations: names
            .iter()
            .zip(0u8..)
            .map(|(name, id)| LocationState {
                id: LocationId(id),
                name: (*name).to_string(),
                breached: false,
                destroyed: false,
            })
            .collect(),
    }
}

/// A part installed on `unit_0001`, or in stock when `location` is `None`.
pub fn part(
    id: u32,
    name: &str,
    kind: &str,
    location: Option<LocationId>,
    omni_podded: bool,
    condition: PartCondition,
) -> Part {
    Part {
        id: PartId(id),
        name: name.to_string(),
        kind: kind.to_string(),
        unit: location.map(|_| unit_id()),
        location: location.unwrap_or(LocationId(0)),
        omni_podded,
        condition,
        difficulty: 0,
        repair_minutes: 60,
        replace_minutes: 120,
        reserved_for: None,
    }
}

pub fn technician(id: TechnicianId, skill: TechSkill, tier: SkillTier) -> Technician {
    Technician {
        id,
        name: format!("{skill} {tier}"),
        skill,
        tier,
        assistants: 6,
        minutes_per_cycle: 480,
        minutes_left: 0,
        deployed: false,
    }
}

pub fn base_state() -> CampaignState {
    let damaged = PartCondition::Damaged { hits: 1 };
    let mut parts = PartRegistry::new();
    parts.insert(part(1, "Medium Laser", "medium_laser", Some(LEFT_TORSO), true, damaged));
    parts.insert(part(2, "SRM 4", "srm_4", Some(LEFT_TORSO), true, damaged));
    parts.insert(part(
        3,
        "Heat Sink",
        "heat_sink",
        Some(LEFT_TORSO),
        true,
        PartCondition::Intact,
    ));
    parts.insert(Part {
        repair_minutes: 120,
        replace_minutes: 90,
        ..part(4, "Lower Arm Actuator", "lower_arm_actuator", Some(RIGHT_ARM), false, damaged)
    });
    parts.insert(part(
        5,
        "Medium Laser",
        "medium_laser",
        Some(RIGHT_TORSO),
        true,
        PartCondition::Intact,
    ));
    parts.insert(part(6, "Medium Laser", "medium_laser", None, false, PartCondition::Intact));
    parts.insert(part(7, "SRM 4", "srm_4", None, false, PartCondition::Intact));

    let technicians = [
        technician(mech_tech_id(), TechSkill::MechTech, SkillTier::Regular),
        technician(aero_tech_id(), TechSkill::AeroTech, SkillTier::Regular),
    ]
    .into_iter()
    .map(|t| (t.id, t))
    .collect();

    let mut state = CampaignState {
        meta: MetaState {
            tick: 0,
            seed: 42,
            schema_version: 1,
            rules_version: "test".to_string(),
        },
        units: BTreeMap::from([(unit_id(), omni_mech())]),
        parts,
        technicians,
        tasks: BTreeMap::new(),
        counters: Counters::default(),
    };
    refresh_tasks(&mut state);
    state
}

pub fn make_rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(42)
}
