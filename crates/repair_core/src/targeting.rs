//! Target numbers for repair checks.
//!
//! A task's own modifiers start at its difficulty and add the unit's site
//! and quirk modifiers. The full target for a technician starts from the
//! technician's tier and appends those, unless something makes the attempt
//! impossible first.

use crate::target_roll::{Sentinel, TargetRoll};
use crate::work::PartWork;
use crate::{Constants, Quirk, Technician, UnitState, Workshop};

/// Site modifier, then at most one maintenance quirk. A unit flagged with
/// both quirks gets only the easy-to-maintain bonus.
pub fn append_unit_mods(unit: &UnitState, roll: &mut TargetRoll) {
    if let Some((value, desc)) = unit.site.modifier() {
        roll.add_modifier(value, desc);
    }
    if unit.has_quirk(Quirk::EasyMaintain) {
        roll.add_modifier(-1, "easy to maintain");
    } else if unit.has_quirk(Quirk::DifficultMaintain) {
        roll.add_modifier(1, "difficult to maintain");
    }
}

/// Penalty for working without a full team of assistants.
pub fn shorthanded_modifier(assistants: u8, full_team: u8) -> i32 {
    match full_team.saturating_sub(assistants) {
        0 => 0,
        1..=2 => 1,
        3..=4 => 2,
        5 => 3,
        _ => 4,
    }
}

/// The number `technician` must roll to complete `task`.
pub fn target_for<W: PartWork + ?Sized>(
    task: &W,
    technician: &Technician,
    shop: &Workshop<'_>,
    constants: &Constants,
) -> TargetRoll {
    let Some(skill_min) = task.skill_min() else {
        return TargetRoll::impossible("Task is impossible.");
    };
    if !task.is_right_tech_type(shop.unit, technician.skill) {
        return TargetRoll::impossible(format!(
            "{} cannot work on this unit.",
            technician.skill
        ));
    }
    if technician.tier < skill_min {
        return TargetRoll::impossible("Task is beyond this technician's skill level.");
    }
    if let Some(reason) = task.check_fixable(shop) {
        return TargetRoll::impossible(reason);
    }
    if technician.minutes_per_cycle == 0 {
        return TargetRoll::fixed(Sentinel::AutomaticFail, "Technician has no duty hours.");
    }
    if technician.deployed {
        return TargetRoll::fixed(Sentinel::CheckFalse, "Technician is deployed.");
    }

    let mut target = TargetRoll::new(technician.tier.target_number(), technician.tier.name());
    target.append(&task.all_mods(shop));

    let shorthanded = task.work().shorthanded_mod;
    if shorthanded > 0 {
        target.add_modifier(shorthanded, "shorthanded");
    }
    if constants.overtime_allowed && task.work().worked_overtime {
        target.add_modifier(constants.overtime_modifier, "overtime");
    }
    target
}
