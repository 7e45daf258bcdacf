//! Type definitions for `repair_core`.
//!
//! Campaign state, repair entities, commands, and events used by the
//! maintenance cycle.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::registry::PartRegistry;
use crate::target_roll::TargetRoll;
use crate::work::RepairTask;

// ---------------------------------------------------------------------------
// ID newtypes
// ---------------------------------------------------------------------------

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(UnitId);
string_id!(TaskId);
string_id!(CommandId);
string_id!(EventId);

/// Registry key of a part. Parts are referenced by id, never by pointer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct PartId(pub u32);

impl std::fmt::Display for PartId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "part_{:04}", self.0)
    }
}

/// Index of a physical location (arm, torso, wing...) on a unit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct LocationId(pub u8);

impl std::fmt::Display for LocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "loc_{}", self.0)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TechnicianId(pub Uuid);

impl std::fmt::Display for TechnicianId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// Core enums
// ---------------------------------------------------------------------------

/// Experience tiers, lowest first. The discriminant is the tier rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillTier {
    UltraGreen,
    Green,
    Regular,
    Veteran,
    Elite,
}

impl SkillTier {
    pub const ALL: [SkillTier; 5] = [
        SkillTier::UltraGreen,
        SkillTier::Green,
        SkillTier::Regular,
        SkillTier::Veteran,
        SkillTier::Elite,
    ];

    pub fn rank(self) -> u8 {
        self as u8
    }

    /// `None` for ranks above elite.
    pub fn from_rank(rank: u8) -> Option<Self> {
        Self::ALL.get(usize::from(rank)).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            SkillTier::UltraGreen => "Ultra-Green",
            SkillTier::Green => "Green",
            SkillTier::Regular => "Regular",
            SkillTier::Veteran => "Veteran",
            SkillTier::Elite => "Elite",
        }
    }

    /// Base number a technician of this tier must roll on 2d6.
    pub fn target_number(self) -> i32 {
        match self {
            SkillTier::UltraGreen => 9,
            SkillTier::Green => 8,
            SkillTier::Regular => 7,
            SkillTier::Veteran => 6,
            SkillTier::Elite => 5,
        }
    }
}

impl std::fmt::Display for SkillTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Technician specialisations. They are not interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechSkill {
    MechTech,
    AeroTech,
    Mechanic,
}

impl std::fmt::Display for TechSkill {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TechSkill::MechTech => "Tech/Mech",
            TechSkill::AeroTech => "Tech/Aero",
            TechSkill::Mechanic => "Tech/Mechanic",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Chassis {
    Mech,
    Aero,
    Tank,
    Infantry,
}

impl Chassis {
    /// The one technician skill allowed to work on this chassis, if any.
    pub fn required_skill(self) -> Option<TechSkill> {
        match self {
            Chassis::Mech => Some(TechSkill::MechTech),
            Chassis::Aero => Some(TechSkill::AeroTech),
            Chassis::Tank => Some(TechSkill::Mechanic),
            Chassis::Infantry => None,
        }
    }
}

/// Where a unit is being worked on. Better facilities make checks easier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairSite {
    Field,
    MobileBase,
    #[default]
    Bay,
    Facility,
    Factory,
}

impl RepairSite {
    /// The site's roll modifier, or `None` when the site is neutral.
    pub fn modifier(self) -> Option<(i32, &'static str)> {
        match self {
            RepairSite::Field => Some((2, "in the field")),
            RepairSite::MobileBase => Some((1, "mobile base")),
            RepairSite::Bay => None,
            RepairSite::Facility => Some((-1, "maintenance facility")),
            RepairSite::Factory => Some((-2, "factory")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quirk {
    EasyMaintain,
    DifficultMaintain,
}

/// What a successful attempt does to the task's parts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkMode {
    #[default]
    Replace,
    Remove,
    Reconfigure,
}

impl WorkMode {
    pub fn action(self) -> &'static str {
        match self {
            WorkMode::Replace => "Replace",
            WorkMode::Remove => "Salvage",
            WorkMode::Reconfigure => "Reconfigure",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartCondition {
    Intact,
    Damaged { hits: u8 },
    /// Empty slot left behind when a part was pulled.
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventLevel {
    Normal,
    Debug,
}

// ---------------------------------------------------------------------------
// State types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignState {
    pub meta: MetaState,
    pub units: BTreeMap<UnitId, UnitState>,
    pub parts: PartRegistry,
    pub technicians: BTreeMap<TechnicianId, Technician>,
    /// The task board. Rebuilt incrementally by `refresh_tasks`.
    pub tasks: BTreeMap<TaskId, RepairTask>,
    pub counters: Counters,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaState {
    /// Maintenance cycles elapsed. One cycle is one campaign day.
    pub tick: u64,
    pub seed: u64,
    pub schema_version: u32,
    pub rules_version: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Counters {
    pub next_event_id: u64,
    pub next_command_id: u64,
    pub next_task_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitState {
    pub id: UnitId,
    pub name: String,
    pub chassis: Chassis,
    /// Omni units carry pod-mounted equipment grouped into pod spaces.
    pub omni: bool,
    #[serde(default)]
    pub site: RepairSite,
    #[serde(default)]
    pub quirks: Vec<Quirk>,
    pub locations: Vec<LocationState>,
}

impl UnitState {
    pub fn location(&self, location: LocationId) -> Option<&LocationState> {
        self.locations.iter().find(|l| l.id == location)
    }

    pub fn location_name(&self, location: LocationId) -> String {
        self.location(location)
            .map_or_else(|| location.to_string(), |l| l.name.clone())
    }

    pub fn is_location_breached(&self, location: LocationId) -> bool {
        self.location(location).is_some_and(|l| l.breached)
    }

    pub fn is_location_destroyed(&self, location: LocationId) -> bool {
        self.location(location).is_some_and(|l| l.destroyed)
    }

    pub fn has_quirk(&self, quirk: Quirk) -> bool {
        self.quirks.contains(&quirk)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationState {
    pub id: LocationId,
    pub name: String,
    #[serde(default)]
    pub breached: bool,
    #[serde(default)]
    pub destroyed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub id: PartId,
    pub name: String,
    /// Replacement key: a spare can stand in for a missing part of the same kind.
    pub kind: String,
    /// `None` for parts sitting in spare stock.
    pub unit: Option<UnitId>,
    pub location: LocationId,
    pub omni_podded: bool,
    pub condition: PartCondition,
    pub difficulty: i32,
    pub repair_minutes: u32,
    pub replace_minutes: u32,
    /// Set on a spare reserved for a missing part, or on an installed part
    /// locked for scheduled work.
    #[serde(default)]
    pub reserved_for: Option<PartId>,
}

impl Part {
    pub fn needs_fixing(&self) -> bool {
        !matches!(self.condition, PartCondition::Intact)
    }

    pub fn is_missing(&self) -> bool {
        matches!(self.condition, PartCondition::Missing)
    }

    pub fn is_spare(&self) -> bool {
        self.unit.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Technician {
    pub id: TechnicianId,
    pub name: String,
    pub skill: TechSkill,
    pub tier: SkillTier,
    /// Astechs helping this technician. Fewer than a full team adds a penalty.
    pub assistants: u8,
    pub minutes_per_cycle: u32,
    /// Minutes still unspent this cycle, overtime included.
    #[serde(default)]
    pub minutes_left: u32,
    /// Deployed technicians cannot reach the repair bay.
    #[serde(default)]
    pub deployed: bool,
}

// ---------------------------------------------------------------------------
// Command types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub id: CommandId,
    pub issued_tick: u64,
    pub execute_at_tick: u64,
    pub command: Command,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Command {
    AssignTechnician {
        task_id: TaskId,
        technician_id: TechnicianId,
    },
    UnassignTechnician {
        task_id: TaskId,
    },
    SetWorkMode {
        task_id: TaskId,
        mode: WorkMode,
    },
}

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: EventId,
    pub tick: u64,
    pub event: Event,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskOutcome {
    Fixed,
    Removed,
    Reconfigured,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    TaskAssigned {
        task_id: TaskId,
        technician_id: TechnicianId,
    },
    TaskUnassigned {
        task_id: TaskId,
        technician_id: TechnicianId,
    },
    ModeChanged {
        task_id: TaskId,
        mode: WorkMode,
    },
    /// Only emitted at `EventLevel::Debug`.
    WorkRecorded {
        task_id: TaskId,
        technician_id: TechnicianId,
        minutes: u32,
        time_spent: u32,
        actual_time: u32,
        overtime: bool,
    },
    AttemptBlocked {
        task_id: TaskId,
        technician_id: TechnicianId,
        reason: String,
    },
    TaskResolved {
        task_id: TaskId,
        task_name: String,
        technician_id: TechnicianId,
        mode: WorkMode,
        outcome: TaskOutcome,
        margin: i32,
    },
    ReplacementUnavailable {
        task_id: TaskId,
        part_id: PartId,
        kind: String,
    },
    CommandRejected {
        command_id: CommandId,
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rules {
    pub rules_version: String,
    pub constants: Constants,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constants {
    pub overtime_allowed: bool,
    /// Extra minutes a technician may work per cycle when overtime is allowed.
    pub overtime_minutes_per_cycle: u32,
    /// Target penalty for a task that had overtime spent on it.
    pub overtime_modifier: i32,
    /// Assistants needed for a full team; fewer adds a shorthanded penalty.
    pub full_team_assistants: u8,
    /// When set, summaries hide the required skill tier.
    pub destroy_by_margin: bool,
}

// ---------------------------------------------------------------------------
// Display-facing values
// ---------------------------------------------------------------------------

/// Structured values the display layer turns into a task description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub task_id: TaskId,
    pub action: WorkMode,
    pub name: String,
    pub time_left: u32,
    /// `None` when the task has become impossible.
    pub skill_min: Option<SkillTier>,
    /// Hidden when the rules resolve damage by margin.
    pub show_skill: bool,
    pub modifier_total: crate::target_roll::RollValue,
    pub technician: Option<TechnicianId>,
}

impl TaskSummary {
    pub fn is_scheduled(&self) -> bool {
        self.technician.is_some()
    }
}

/// Read-only view of what a task needs to answer questions about itself.
#[derive(Debug, Clone, Copy)]
pub struct Workshop<'a> {
    pub unit: Option<&'a UnitState>,
    pub parts: &'a PartRegistry,
}

impl<'a> Workshop<'a> {
    pub fn new(unit: Option<&'a UnitState>, parts: &'a PartRegistry) -> Self {
        Self { unit, parts }
    }

    /// Site and quirk modifiers of the owning unit, if any.
    pub fn unit_mods(&self, roll: &mut TargetRoll) {
        if let Some(unit) = self.unit {
            crate::targeting::append_unit_mods(unit, roll);
        }
    }
}
