//! Rules and campaign loading shared by the CLI and integration tests.

use std::collections::BTreeMap;
use std::path::Path;

use ahash::AHashSet;
use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};
use rand::Rng;
use repair_core::scheduler::refresh_tasks;
use repair_core::{
    generate_technician_id, CampaignState, Constants, Counters, MetaState, Part, PartRegistry,
    Rules, SkillTier, TechSkill, Technician, TechnicianId, UnitState,
};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
struct ConstantsFile {
    rules_version: String,
    #[serde(flatten)]
    constants: Constants,
}

/// A campaign as authored: units, every part (installed or in stock) and
/// the repair staff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignFile {
    pub start_date: NaiveDate,
    pub units: Vec<UnitState>,
    pub parts: Vec<Part>,
    pub technicians: Vec<TechnicianDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnicianDef {
    /// Minted from the campaign seed when absent.
    #[serde(default)]
    pub id: Option<TechnicianId>,
    pub name: String,
    pub skill: TechSkill,
    pub tier: SkillTier,
    pub assistants: u8,
    pub minutes_per_cycle: u32,
    #[serde(default)]
    pub deployed: bool,
}

/// Validates rule constants, panicking on any authoring error.
pub fn validate_rules(rules: &Rules) {
    assert!(
        !rules.rules_version.is_empty(),
        "rules_version must not be empty"
    );
    assert!(
        rules.constants.full_team_assistants > 0,
        "full_team_assistants must be positive"
    );
    if rules.constants.overtime_allowed {
        assert!(
            rules.constants.overtime_minutes_per_cycle > 0,
            "overtime_allowed requires overtime_minutes_per_cycle > 0"
        );
    }
}

/// Validates cross-references in a campaign, panicking on any authoring error.
///
/// Catches mistakes like: a part mounted on a unit that does not exist, a
/// part in a location the unit does not have, or a pod-mounted part on a
/// unit that cannot carry pods.
pub fn validate_campaign(file: &CampaignFile) {
    let mut unit_ids = AHashSet::new();
    for unit in &file.units {
        assert!(
            unit_ids.insert(&unit.id),
            "duplicate unit id '{}'",
            unit.id
        );
        let mut location_ids = AHashSet::new();
        for location in &unit.locations {
            assert!(
                location_ids.insert(location.id),
                "unit '{}' has duplicate location '{}'",
                unit.id,
                location.id,
            );
        }
    }
    let units: BTreeMap<_, _> = file.units.iter().map(|u| (&u.id, u)).collect();

    let mut part_ids = AHashSet::new();
    for part in &file.parts {
        assert!(part_ids.insert(part.id), "duplicate part id '{}'", part.id);
        assert!(
            !part.kind.is_empty(),
            "part '{}' has an empty kind",
            part.id
        );
        assert!(
            part.replace_minutes > 0 && part.repair_minutes > 0,
            "part '{}' has a zero work time",
            part.id,
        );
        let Some(unit_id) = &part.unit else {
            assert!(
                !part.is_missing(),
                "spare part '{}' cannot be missing",
                part.id
            );
            continue;
        };
        let unit = units.get(unit_id).unwrap_or_else(|| {
            panic!("part '{}' references unknown unit '{unit_id}'", part.id)
        });
        assert!(
            unit.location(part.location).is_some(),
            "part '{}' is in location '{}' which unit '{}' does not have",
            part.id,
            part.location,
            unit.id,
        );
        assert!(
            !part.omni_podded || unit.omni,
            "part '{}' is pod-mounted on non-omni unit '{}'",
            part.id,
            unit.id,
        );
    }

    let mut technician_ids = AHashSet::new();
    for technician in &file.technicians {
        if let Some(id) = technician.id {
            assert!(
                technician_ids.insert(id),
                "duplicate technician id '{id}'"
            );
        }
    }
}

pub fn load_rules(content_dir: &str) -> Result<Rules> {
    let dir = Path::new(content_dir);
    let file: ConstantsFile = serde_json::from_str(
        &std::fs::read_to_string(dir.join("constants.json")).context("reading constants.json")?,
    )
    .context("parsing constants.json")?;
    let rules = Rules {
        rules_version: file.rules_version,
        constants: file.constants,
    };
    validate_rules(&rules);
    Ok(rules)
}

pub fn load_campaign_file(path: impl AsRef<Path>) -> Result<CampaignFile> {
    let path = path.as_ref();
    let file: CampaignFile = serde_json::from_str(
        &std::fs::read_to_string(path)
            .with_context(|| format!("reading campaign file: {}", path.display()))?,
    )
    .with_context(|| format!("parsing campaign file: {}", path.display()))?;
    validate_campaign(&file);
    Ok(file)
}

/// Build the starting campaign state and its task board.
pub fn build_campaign(
    rules: &Rules,
    file: &CampaignFile,
    seed: u64,
    rng: &mut impl Rng,
) -> CampaignState {
    let mut parts = PartRegistry::new();
    for part in &file.parts {
        parts.insert(part.clone());
    }

    let technicians = file
        .technicians
        .iter()
        .map(|def| {
            let id = def.id.unwrap_or_else(|| generate_technician_id(rng));
            let technician = Technician {
                id,
                name: def.name.clone(),
                skill: def.skill,
                tier: def.tier,
                assistants: def.assistants,
                minutes_per_cycle: def.minutes_per_cycle,
                minutes_left: 0,
                deployed: def.deployed,
            };
            (id, technician)
        })
        .collect();

    let mut state = CampaignState {
        meta: MetaState {
            tick: 0,
            seed,
            schema_version: 1,
            rules_version: rules.rules_version.clone(),
        },
        units: file
            .units
            .iter()
            .map(|u| (u.id.clone(), u.clone()))
            .collect(),
        parts,
        technicians,
        tasks: BTreeMap::new(),
        counters: Counters::default(),
    };
    refresh_tasks(&mut state);
    state
}

/// Campaign state written between runs. The calendar start travels with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveFile {
    pub start_date: NaiveDate,
    pub state: CampaignState,
}

pub fn load_save(path: impl AsRef<Path>) -> Result<SaveFile> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading state file: {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parsing state file: {}", path.display()))
}

pub fn write_save(path: impl AsRef<Path>, save: &SaveFile) -> Result<()> {
    let path = path.as_ref();
    let file =
        std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(file, save)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Calendar date of a maintenance cycle. `None` past the end of the calendar.
pub fn cycle_date(start: NaiveDate, tick: u64) -> Option<NaiveDate> {
    start.checked_add_days(Days::new(tick))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use repair_core::test_fixtures::{base_rules, omni_mech, part, unit_id, LEFT_TORSO};
    use repair_core::{LocationId, PartCondition, PartId, PartWork};

    fn minimal_campaign() -> CampaignFile {
        CampaignFile {
            start_date: NaiveDate::from_ymd_opt(3050, 1, 1).unwrap(),
            units: vec![omni_mech()],
            parts: vec![
                part(
                    1,
                    "Medium Laser",
                    "medium_laser",
                    Some(LEFT_TORSO),
                    true,
                    PartCondition::Damaged { hits: 1 },
                ),
                part(2, "Medium Laser", "medium_laser", None, false, PartCondition::Intact),
            ],
            technicians: vec![TechnicianDef {
                id: None,
                name: "Astra Kell".to_string(),
                skill: TechSkill::MechTech,
                tier: SkillTier::Regular,
                assistants: 6,
                minutes_per_cycle: 480,
                deployed: false,
            }],
        }
    }

    #[test]
    fn valid_campaign_passes_validation() {
        validate_campaign(&minimal_campaign()); // should not panic
    }

    #[test]
    #[should_panic(expected = "references unknown unit")]
    fn part_on_unknown_unit_panics() {
        let mut file = minimal_campaign();
        file.parts[0].unit = Some(repair_core::UnitId("unit_ghost".to_string()));
        validate_campaign(&file);
    }

    #[test]
    #[should_panic(expected = "does not have")]
    fn part_in_unknown_location_panics() {
        let mut file = minimal_campaign();
        file.parts[0].location = LocationId(42);
        validate_campaign(&file);
    }

    #[test]
    #[should_panic(expected = "pod-mounted on non-omni unit")]
    fn pod_part_on_standard_unit_panics() {
        let mut file = minimal_campaign();
        file.units[0].omni = false;
        validate_campaign(&file);
    }

    #[test]
    #[should_panic(expected = "duplicate part id")]
    fn duplicate_part_id_panics() {
        let mut file = minimal_campaign();
        file.parts[1].id = PartId(1);
        validate_campaign(&file);
    }

    #[test]
    #[should_panic(expected = "full_team_assistants")]
    fn zero_team_size_panics() {
        let mut rules = base_rules();
        rules.constants.full_team_assistants = 0;
        validate_rules(&rules);
    }

    #[test]
    fn build_mints_technician_ids_deterministically() {
        let rules = base_rules();
        let file = minimal_campaign();
        let a = build_campaign(&rules, &file, 9, &mut ChaCha8Rng::seed_from_u64(9));
        let b = build_campaign(&rules, &file, 9, &mut ChaCha8Rng::seed_from_u64(9));
        let ids_a: Vec<_> = a.technicians.keys().collect();
        let ids_b: Vec<_> = b.technicians.keys().collect();
        assert_eq!(ids_a, ids_b);
        assert_eq!(a.meta.rules_version, "test");
    }

    #[test]
    fn build_populates_task_board() {
        let state = build_campaign(
            &base_rules(),
            &minimal_campaign(),
            1,
            &mut ChaCha8Rng::seed_from_u64(1),
        );
        // One pod space per location of the omni mech.
        assert_eq!(state.tasks.len(), 6);
        let damaged = state
            .tasks
            .values()
            .filter(|t| t.needs_fixing(&state.parts))
            .count();
        assert_eq!(damaged, 1);
        assert!(state.units.contains_key(&unit_id()));
    }

    #[test]
    fn save_file_preserves_board_and_progress() {
        let mut state = build_campaign(
            &base_rules(),
            &minimal_campaign(),
            1,
            &mut ChaCha8Rng::seed_from_u64(1),
        );
        let pod = state.tasks.keys().nth(3).unwrap().clone();
        state.tasks.get_mut(&pod).unwrap().work_mut().time_spent = 12;
        let save = SaveFile {
            start_date: minimal_campaign().start_date,
            state,
        };
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        write_save(&path, &save).unwrap();
        let loaded = load_save(&path).unwrap();

        assert_eq!(loaded.start_date, save.start_date);
        assert_eq!(loaded.state.tasks, save.state.tasks);
        assert_eq!(loaded.state.parts, save.state.parts);
        assert_eq!(loaded.state.tasks[&pod].time_spent(), 12);
    }

    #[test]
    fn cycle_zero_is_start_date() {
        let start = NaiveDate::from_ymd_opt(3050, 12, 30).unwrap();
        assert_eq!(cycle_date(start, 0), Some(start));
        assert_eq!(
            cycle_date(start, 3),
            NaiveDate::from_ymd_opt(3051, 1, 2)
        );
    }
}
