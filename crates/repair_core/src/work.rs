//! The repair-work contract shared by single parts and pod spaces.

use serde::{Deserialize, Serialize};

use crate::error::PartError;
use crate::part_repair::PartRepair;
use crate::pod_space::PodSpace;
use crate::registry::PartRegistry;
use crate::target_roll::TargetRoll;
use crate::{
    PartId, SkillTier, TaskOutcome, TechSkill, TechnicianId, UnitId, UnitState, WorkMode,
    Workshop,
};

/// Tier every fresh or freshly fixed task starts at.
pub const BASE_SKILL_MIN: SkillTier = SkillTier::Green;

/// Scheduling and progress state carried by every task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkState {
    pub mode: WorkMode,
    pub team_id: Option<TechnicianId>,
    pub time_spent: u32,
    /// Rank of the lowest tier allowed to attempt the task. A rank above
    /// elite means nobody can.
    pub skill_min: u8,
    pub worked_overtime: bool,
    pub shorthanded_mod: i32,
}

impl Default for WorkState {
    fn default() -> Self {
        Self {
            mode: WorkMode::default(),
            team_id: None,
            time_spent: 0,
            skill_min: BASE_SKILL_MIN.rank(),
            worked_overtime: false,
            shorthanded_mod: 0,
        }
    }
}

impl WorkState {
    pub fn skill_min_tier(&self) -> Option<SkillTier> {
        SkillTier::from_rank(self.skill_min)
    }

    pub fn is_impossible(&self) -> bool {
        self.skill_min_tier().is_none()
    }

    pub fn reset_skill(&mut self) {
        self.skill_min = BASE_SKILL_MIN.rank();
        self.shorthanded_mod = 0;
    }

    /// Failed attempt by a technician of tier rank `rating`: only a better
    /// technician may try next, and time accrual starts over.
    pub fn escalate(&mut self, rating: u8) {
        self.skill_min = rating.max(self.skill_min).saturating_add(1);
        self.time_spent = 0;
        self.shorthanded_mod = 0;
    }
}

/// Result of a successful attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub outcome: TaskOutcome,
    /// Per-part failures that were skipped over.
    pub child_errors: Vec<PartError>,
}

/// Anything a technician can be scheduled to work on.
pub trait PartWork {
    fn work(&self) -> &WorkState;

    fn work_mut(&mut self) -> &mut WorkState;

    fn name(&self, shop: &Workshop<'_>) -> String;

    fn base_time(&self, parts: &PartRegistry) -> u32;

    fn actual_time(&self, parts: &PartRegistry) -> u32 {
        self.base_time(parts)
    }

    /// More negative is easier.
    fn difficulty(&self, parts: &PartRegistry) -> i32;

    /// Why the task cannot be worked right now, if it cannot.
    fn check_fixable(&self, shop: &Workshop<'_>) -> Option<String>;

    fn needs_fixing(&self, parts: &PartRegistry) -> bool;

    /// Whether the task belongs on the task board at all.
    fn has_work(&self, parts: &PartRegistry) -> bool;

    fn is_right_tech_type(&self, unit: Option<&UnitState>, skill: TechSkill) -> bool {
        unit.and_then(|u| u.chassis.required_skill()) == Some(skill)
    }

    /// Difficulty followed by the unit's site and quirk modifiers.
    fn all_mods(&self, shop: &Workshop<'_>) -> TargetRoll {
        let mut roll = TargetRoll::new(self.difficulty(shop.parts), "difficulty");
        shop.unit_mods(&mut roll);
        roll
    }

    /// The missing part this task would fill from stock, if it is a
    /// replacement task.
    fn missing_part(&self, _parts: &PartRegistry) -> Option<PartId> {
        None
    }

    /// Re-derive anything cached from the part registry.
    fn update_condition(&mut self, _parts: &PartRegistry) {}

    fn fix(&mut self, parts: &mut PartRegistry) -> Vec<PartError>;

    fn remove(&mut self, salvage: bool, parts: &mut PartRegistry) -> Vec<PartError>;

    fn reserve_part(&self, parts: &mut PartRegistry) -> Vec<PartError>;

    fn cancel_reservation(&self, parts: &mut PartRegistry);

    fn skill_min(&self) -> Option<SkillTier> {
        self.work().skill_min_tier()
    }

    fn team_id(&self) -> Option<TechnicianId> {
        self.work().team_id
    }

    fn is_salvaging(&self) -> bool {
        self.work().mode == WorkMode::Remove
    }

    fn is_reconfiguring(&self) -> bool {
        self.work().mode == WorkMode::Reconfigure
    }

    fn time_spent(&self) -> u32 {
        self.work().time_spent
    }

    fn time_left(&self, parts: &PartRegistry) -> u32 {
        self.actual_time(parts).saturating_sub(self.time_spent())
    }

    /// Adds work time, clamped so it never exceeds the actual time.
    fn add_time_spent(&mut self, minutes: u32, parts: &PartRegistry) -> u32 {
        let actual = self.actual_time(parts);
        let work = self.work_mut();
        work.time_spent = work.time_spent.saturating_add(minutes).min(actual);
        work.time_spent
    }

    /// Every mode completes by fixing; only the reported outcome differs.
    fn succeed(&mut self, parts: &mut PartRegistry) -> Completion {
        let outcome = match self.work().mode {
            WorkMode::Replace => TaskOutcome::Fixed,
            WorkMode::Remove => TaskOutcome::Removed,
            WorkMode::Reconfigure => TaskOutcome::Reconfigured,
        };
        Completion {
            outcome,
            child_errors: self.fix(parts),
        }
    }

    /// `rating` is the tier rank of the technician who failed.
    fn fail(&mut self, rating: u8) {
        self.work_mut().escalate(rating);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepairTask {
    Part(PartRepair),
    PodSpace(PodSpace),
}

macro_rules! dispatch {
    ($self:ident, $task:ident => $body:expr) => {
        match $self {
            RepairTask::Part($task) => $body,
            RepairTask::PodSpace($task) => $body,
        }
    };
}

impl RepairTask {
    /// Unit the task's parts are mounted on.
    pub fn unit_id(&self, parts: &PartRegistry) -> Option<UnitId> {
        match self {
            RepairTask::Part(task) => parts.get(task.part_id()).and_then(|p| p.unit.clone()),
            RepairTask::PodSpace(pod) => Some(pod.unit_id().clone()),
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            RepairTask::Part(_) => "Part",
            RepairTask::PodSpace(_) => "PodSpace",
        }
    }

    pub fn as_pod_space(&self) -> Option<&PodSpace> {
        match self {
            RepairTask::PodSpace(pod) => Some(pod),
            RepairTask::Part(_) => None,
        }
    }
}

impl PartWork for RepairTask {
    fn work(&self) -> &WorkState {
        dispatch!(self, t => t.work())
    }

    fn work_mut(&mut self) -> &mut WorkState {
        dispatch!(self, t => t.work_mut())
    }

    fn name(&self, shop: &Workshop<'_>) -> String {
        dispatch!(self, t => t.name(shop))
    }

    fn base_time(&self, parts: &PartRegistry) -> u32 {
        dispatch!(self, t => t.base_time(parts))
    }

    fn actual_time(&self, parts: &PartRegistry) -> u32 {
        dispatch!(self, t => t.actual_time(parts))
    }

    fn difficulty(&self, parts: &PartRegistry) -> i32 {
        dispatch!(self, t => t.difficulty(parts))
    }

    fn check_fixable(&self, shop: &Workshop<'_>) -> Option<String> {
        dispatch!(self, t => t.check_fixable(shop))
    }

    fn needs_fixing(&self, parts: &PartRegistry) -> bool {
        dispatch!(self, t => t.needs_fixing(parts))
    }

    fn has_work(&self, parts: &PartRegistry) -> bool {
        dispatch!(self, t => t.has_work(parts))
    }

    fn is_right_tech_type(&self, unit: Option<&UnitState>, skill: TechSkill) -> bool {
        dispatch!(self, t => t.is_right_tech_type(unit, skill))
    }

    fn all_mods(&self, shop: &Workshop<'_>) -> TargetRoll {
        dispatch!(self, t => t.all_mods(shop))
    }

    fn missing_part(&self, parts: &PartRegistry) -> Option<PartId> {
        dispatch!(self, t => t.missing_part(parts))
    }

    fn update_condition(&mut self, parts: &PartRegistry) {
        dispatch!(self, t => t.update_condition(parts));
    }

    fn fix(&mut self, parts: &mut PartRegistry) -> Vec<PartError> {
        dispatch!(self, t => t.fix(parts))
    }

    fn remove(&mut self, salvage: bool, parts: &mut PartRegistry) -> Vec<PartError> {
        dispatch!(self, t => t.remove(salvage, parts))
    }

    fn reserve_part(&self, parts: &mut PartRegistry) -> Vec<PartError> {
        dispatch!(self, t => t.reserve_part(parts))
    }

    fn cancel_reservation(&self, parts: &mut PartRegistry) {
        dispatch!(self, t => t.cancel_reservation(parts));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escalate_moves_one_tier_past_the_failed_technician() {
        let mut work = WorkState {
            time_spent: 30,
            shorthanded_mod: 2,
            ..WorkState::default()
        };
        work.escalate(SkillTier::Regular.rank());
        assert_eq!(work.skill_min_tier(), Some(SkillTier::Veteran));
        assert_eq!(work.time_spent, 0);
        assert_eq!(work.shorthanded_mod, 0);
    }

    #[test]
    fn escalate_always_raises_the_bar() {
        let mut work = WorkState {
            skill_min: SkillTier::Veteran.rank(),
            ..WorkState::default()
        };
        work.escalate(SkillTier::Green.rank());
        assert_eq!(work.skill_min_tier(), Some(SkillTier::Elite));
    }

    #[test]
    fn failing_an_elite_attempt_makes_task_impossible() {
        let mut work = WorkState::default();
        work.escalate(SkillTier::Elite.rank());
        assert!(work.is_impossible());
        assert_eq!(work.skill_min_tier(), None);
    }
}
