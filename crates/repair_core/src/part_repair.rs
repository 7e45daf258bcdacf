//! Work on a single installed part that is not grouped into a pod space.

use serde::{Deserialize, Serialize};

use crate::error::PartError;
use crate::registry::PartRegistry;
use crate::work::{PartWork, WorkState};
use crate::{PartId, Workshop};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartRepair {
    part_id: PartId,
    work: WorkState,
}

impl PartRepair {
    pub fn new(part_id: PartId) -> Self {
        Self {
            part_id,
            work: WorkState::default(),
        }
    }

    pub fn part_id(&self) -> PartId {
        self.part_id
    }
}

impl PartWork for PartRepair {
    fn work(&self) -> &WorkState {
        &self.work
    }

    fn work_mut(&mut self) -> &mut WorkState {
        &mut self.work
    }

    fn name(&self, shop: &Workshop<'_>) -> String {
        shop.parts
            .get(self.part_id)
            .map_or_else(|| self.part_id.to_string(), |p| p.name.clone())
    }

    /// Pulling or replacing a part takes longer than patching it.
    fn base_time(&self, parts: &PartRegistry) -> u32 {
        parts.get(self.part_id).map_or(0, |part| {
            if self.is_salvaging() || part.is_missing() {
                part.replace_minutes
            } else {
                part.repair_minutes
            }
        })
    }

    fn difficulty(&self, parts: &PartRegistry) -> i32 {
        parts.get(self.part_id).map_or(0, |p| p.difficulty)
    }

    fn check_fixable(&self, shop: &Workshop<'_>) -> Option<String> {
        if self.is_salvaging() {
            return None;
        }
        let part = shop.parts.get(self.part_id)?;
        let unit = shop.unit?;
        if unit.is_location_breached(part.location) {
            return Some(format!("{} is breached.", unit.location_name(part.location)));
        }
        if unit.is_location_destroyed(part.location) {
            return Some(format!("{} is destroyed.", unit.location_name(part.location)));
        }
        None
    }

    fn needs_fixing(&self, parts: &PartRegistry) -> bool {
        parts.get(self.part_id).is_some_and(|p| p.needs_fixing())
    }

    fn has_work(&self, parts: &PartRegistry) -> bool {
        let Some(part) = parts.get(self.part_id) else {
            return false;
        };
        if part.is_spare() {
            return false;
        }
        if self.is_salvaging() {
            !part.is_missing()
        } else {
            part.needs_fixing()
        }
    }

    fn missing_part(&self, parts: &PartRegistry) -> Option<PartId> {
        parts
            .get(self.part_id)
            .filter(|p| p.is_missing())
            .map(|p| p.id)
    }

    fn fix(&mut self, parts: &mut PartRegistry) -> Vec<PartError> {
        self.work.reset_skill();
        parts.fix_part(self.part_id).err().into_iter().collect()
    }

    fn remove(&mut self, salvage: bool, parts: &mut PartRegistry) -> Vec<PartError> {
        parts
            .remove_part(self.part_id, salvage)
            .err()
            .into_iter()
            .collect()
    }

    fn reserve_part(&self, parts: &mut PartRegistry) -> Vec<PartError> {
        parts.reserve_part(self.part_id).err().into_iter().collect()
    }

    fn cancel_reservation(&self, parts: &mut PartRegistry) {
        parts.cancel_reservation(self.part_id);
    }
}
