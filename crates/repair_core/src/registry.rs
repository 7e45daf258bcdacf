//! Part registry: sole owner of every part, installed or in spare stock.
//!
//! Units and tasks refer to parts by `PartId` only.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::PartError;
use crate::{LocationId, Part, PartCondition, PartId, UnitId};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartRegistry {
    parts: BTreeMap<PartId, Part>,
    next_part_id: u32,
}

impl PartRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a part under its own id. Placeholder ids are minted above the
    /// highest id seen so far.
    pub fn insert(&mut self, part: Part) {
        self.next_part_id = self.next_part_id.max(part.id.0 + 1);
        self.parts.insert(part.id, part);
    }

    pub fn get(&self, id: PartId) -> Option<&Part> {
        self.parts.get(&id)
    }

    pub fn get_mut(&mut self, id: PartId) -> Option<&mut Part> {
        self.parts.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// All parts in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Part> {
        self.parts.values()
    }

    /// The unit's part list, in id order.
    pub fn parts_on_unit<'a>(&'a self, unit: &'a UnitId) -> impl Iterator<Item = &'a Part> {
        self.parts
            .values()
            .filter(move |p| p.unit.as_ref() == Some(unit))
    }

    pub fn parts_in_location<'a>(
        &'a self,
        unit: &'a UnitId,
        location: LocationId,
    ) -> impl Iterator<Item = &'a Part> {
        self.parts_on_unit(unit)
            .filter(move |p| p.location == location)
    }

    pub fn spares(&self) -> impl Iterator<Item = &Part> {
        self.parts.values().filter(|p| p.is_spare())
    }

    fn mint_id(&mut self) -> PartId {
        let id = PartId(self.next_part_id);
        self.next_part_id += 1;
        id
    }

    /// Intact spare that can fill the missing part `id`. A spare already
    /// reserved for `id` wins over an unreserved one.
    pub fn find_replacement(&self, id: PartId) -> Option<PartId> {
        let placeholder = self.parts.get(&id)?;
        let candidates = || {
            self.spares().filter(|s| {
                s.kind == placeholder.kind && s.condition == PartCondition::Intact
            })
        };
        candidates()
            .find(|s| s.reserved_for == Some(id))
            .or_else(|| candidates().find(|s| s.reserved_for.is_none()))
            .map(|s| s.id)
    }

    pub fn replacement_available(&self, id: PartId) -> bool {
        self.find_replacement(id).is_some()
    }

    /// Pull an installed part off its unit, leaving a missing placeholder in
    /// its slot. Salvaged parts go to spare stock; otherwise they are
    /// scrapped. A missing placeholder has nothing to pull and stays put.
    ///
    /// Returns the id of the new placeholder.
    pub fn remove_part(&mut self, id: PartId, salvage: bool) -> Result<Option<PartId>, PartError> {
        let part = self.parts.get(&id).ok_or(PartError::NotFound(id))?;
        if part.unit.is_none() {
            return Err(PartError::NotInstalled(id));
        }
        if part.is_missing() {
            return Ok(None);
        }

        let mut placeholder = part.clone();
        let placeholder_id = self.mint_id();
        placeholder.id = placeholder_id;
        placeholder.condition = PartCondition::Missing;
        placeholder.reserved_for = None;

        self.release_reservations_for(id);
        if salvage {
            if let Some(removed) = self.parts.get_mut(&id) {
                removed.unit = None;
                removed.reserved_for = None;
            }
        } else {
            self.parts.remove(&id);
        }
        self.parts.insert(placeholder_id, placeholder);
        Ok(Some(placeholder_id))
    }

    /// Repair a damaged part in place, or fill a missing one from spare stock.
    pub fn fix_part(&mut self, id: PartId) -> Result<(), PartError> {
        let part = self.parts.get(&id).ok_or(PartError::NotFound(id))?;
        let kind = part.kind.clone();
        match part.condition {
            PartCondition::Intact => Ok(()),
            PartCondition::Damaged { .. } => {
                if let Some(part) = self.parts.get_mut(&id) {
                    part.condition = PartCondition::Intact;
                }
                Ok(())
            }
            PartCondition::Missing => {
                let spare_id = self
                    .find_replacement(id)
                    .ok_or(PartError::NoReplacement { part_id: id, kind })?;
                self.parts.remove(&spare_id);
                if let Some(part) = self.parts.get_mut(&id) {
                    part.condition = PartCondition::Intact;
                    part.reserved_for = None;
                }
                Ok(())
            }
        }
    }

    /// Lock stock for scheduled work: a spare for a missing part, or the
    /// part itself otherwise.
    pub fn reserve_part(&mut self, id: PartId) -> Result<(), PartError> {
        let part = self.parts.get(&id).ok_or(PartError::NotFound(id))?;
        if part.is_missing() {
            let kind = part.kind.clone();
            let spare_id = self
                .find_replacement(id)
                .ok_or(PartError::NoReplacement { part_id: id, kind })?;
            if let Some(spare) = self.parts.get_mut(&spare_id) {
                spare.reserved_for = Some(id);
            }
        } else if let Some(part) = self.parts.get_mut(&id) {
            part.reserved_for = Some(id);
        }
        Ok(())
    }

    pub fn cancel_reservation(&mut self, id: PartId) {
        self.release_reservations_for(id);
    }

    fn release_reservations_for(&mut self, id: PartId) {
        for part in self.parts.values_mut() {
            if part.reserved_for == Some(id) {
                part.reserved_for = None;
            }
        }
    }
}
