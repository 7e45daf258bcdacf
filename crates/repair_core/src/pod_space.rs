//! Pod space: every pod-mounted part in one location of an omni unit,
//! worked as a single task.
//!
//! The child list is a view over the part registry. It is re-derived by
//! [`PodSpace::update_condition_from_entity`] and must be refreshed after
//! any change to the unit's parts before it is read again.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::error::PartError;
use crate::registry::PartRegistry;
use crate::work::{PartWork, WorkState};
use crate::{LocationId, Part, PartId, UnitId, UnitState, Workshop};

pub const POD_SPACE_BASE_MINUTES: u32 = 30;

/// Grouped pod work is easier than any of its parts alone.
pub const POD_SPACE_DIFFICULTY: i32 = -2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodSpace {
    unit_id: UnitId,
    location: LocationId,
    child_part_ids: SmallVec<[PartId; 8]>,
    work: WorkState,
}

impl PodSpace {
    /// An empty pod space; call `update_condition_from_entity` to populate it.
    pub fn new(unit: &UnitState, location: LocationId) -> Self {
        Self {
            unit_id: unit.id.clone(),
            location,
            child_part_ids: SmallVec::new(),
            work: WorkState::default(),
        }
    }

    pub fn unit_id(&self) -> &UnitId {
        &self.unit_id
    }

    pub fn location(&self) -> LocationId {
        self.location
    }

    pub fn child_part_ids(&self) -> &[PartId] {
        &self.child_part_ids
    }

    /// Rebuild the child list from the unit's current parts.
    pub fn update_condition_from_entity(&mut self, parts: &PartRegistry) {
        self.child_part_ids.clear();
        self.child_part_ids.extend(
            parts
                .parts_in_location(&self.unit_id, self.location)
                .filter(|p| p.omni_podded)
                .map(|p| p.id),
        );
    }

    pub fn location_name(&self, unit: Option<&UnitState>) -> String {
        unit.map_or_else(
            || self.location.to_string(),
            |u| u.location_name(self.location),
        )
    }

    fn children<'a>(&'a self, parts: &'a PartRegistry) -> impl Iterator<Item = &'a Part> {
        self.child_part_ids.iter().filter_map(|id| parts.get(*id))
    }

    /// Children that currently need work, in child order.
    fn children_needing_fixing(&self, parts: &PartRegistry) -> Vec<PartId> {
        self.children(parts)
            .filter(|p| p.needs_fixing())
            .map(|p| p.id)
            .collect()
    }
}

impl PartWork for PodSpace {
    fn work(&self) -> &WorkState {
        &self.work
    }

    fn work_mut(&mut self) -> &mut WorkState {
        &mut self.work
    }

    fn name(&self, shop: &Workshop<'_>) -> String {
        format!("{} Pod Space", self.location_name(shop.unit))
    }

    fn base_time(&self, _parts: &PartRegistry) -> u32 {
        POD_SPACE_BASE_MINUTES
    }

    fn difficulty(&self, _parts: &PartRegistry) -> i32 {
        POD_SPACE_DIFFICULTY
    }

    fn check_fixable(&self, shop: &Workshop<'_>) -> Option<String> {
        if self.is_salvaging() {
            return None;
        }
        let unit = shop.unit?;
        if unit.is_location_breached(self.location) {
            return Some(format!("{} is breached.", unit.location_name(self.location)));
        }
        if unit.is_location_destroyed(self.location) {
            return Some(format!("{} is destroyed.", unit.location_name(self.location)));
        }
        None
    }

    fn needs_fixing(&self, parts: &PartRegistry) -> bool {
        self.children(parts).any(Part::needs_fixing)
    }

    fn has_work(&self, parts: &PartRegistry) -> bool {
        if self.is_salvaging() {
            self.children(parts).any(|p| !p.is_missing())
        } else {
            self.needs_fixing(parts)
        }
    }

    fn update_condition(&mut self, parts: &PartRegistry) {
        self.update_condition_from_entity(parts);
    }

    /// Pull every child that needs work, then fill or repair whatever is
    /// left. Removal runs first so a replaced child is never also repaired.
    fn fix(&mut self, parts: &mut PartRegistry) -> Vec<PartError> {
        self.work.reset_skill();
        let mut errors = Vec::new();

        for id in self.children_needing_fixing(parts) {
            if let Err(err) = parts.remove_part(id, true) {
                warn!(unit = %self.unit_id, location = %self.location, %err, "pod child removal failed");
                errors.push(err);
            }
        }
        self.update_condition_from_entity(parts);

        for id in self.children_needing_fixing(parts) {
            if let Err(err) = parts.fix_part(id) {
                warn!(unit = %self.unit_id, location = %self.location, %err, "pod child fix failed");
                errors.push(err);
            }
        }
        self.update_condition_from_entity(parts);

        debug!(
            unit = %self.unit_id,
            location = %self.location,
            children = self.child_part_ids.len(),
            failures = errors.len(),
            "pod space fixed"
        );
        errors
    }

    fn remove(&mut self, salvage: bool, parts: &mut PartRegistry) -> Vec<PartError> {
        let mut errors = Vec::new();
        for id in self.child_part_ids.clone() {
            if let Err(err) = parts.remove_part(id, salvage) {
                warn!(unit = %self.unit_id, location = %self.location, %err, "pod child removal failed");
                errors.push(err);
            }
        }
        self.update_condition_from_entity(parts);
        errors
    }

    fn reserve_part(&self, parts: &mut PartRegistry) -> Vec<PartError> {
        self.child_part_ids
            .iter()
            .filter_map(|id| parts.reserve_part(*id).err())
            .collect()
    }

    fn cancel_reservation(&self, parts: &mut PartRegistry) {
        for id in &self.child_part_ids {
            parts.cancel_reservation(*id);
        }
    }
}
