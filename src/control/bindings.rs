// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! The binding table: eight index-stable slots plus a name index.
//!
//! Slot order is presentation order. Renaming only touches the slot's name
//! and the index, so a control keeps its identity and bindings across renames.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::{Control, ControlId, CONTROL_COUNT};
use crate::error::BindingError;
use crate::midi::{MessageSpec, RawMessage};

/// Owner of all eight controls
#[derive(Debug, Clone)]
pub struct BindingTable {
    slots: Vec<Control>,
    index: HashMap<String, usize>,
}

impl BindingTable {
    /// Eight unbound controls named "Button 1" to "Button 8"
    pub fn new() -> Self {
        let slots: Vec<Control> = (0..CONTROL_COUNT)
            .map(|i| Control::new(Control::default_name(i)))
            .collect();
        let mut table = Self {
            slots,
            index: HashMap::new(),
        };
        table.rebuild_index();
        table
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .slots
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();
    }

    /// Look up a control's id by name
    pub fn id(&self, name: &str) -> Option<ControlId> {
        self.index.get(name).and_then(|&i| ControlId::from_index(i))
    }

    /// Look up a control by name
    pub fn get(&self, name: &str) -> Option<&Control> {
        self.index.get(name).map(|&i| &self.slots[i])
    }

    /// The control in slot `id`
    pub fn control(&self, id: ControlId) -> &Control {
        &self.slots[id.index()]
    }

    /// All controls in presentation order
    pub fn iter_in_order(&self) -> impl Iterator<Item = (ControlId, &Control)> {
        ControlId::all().zip(self.slots.iter())
    }

    /// Control names in presentation order
    pub fn names(&self) -> Vec<String> {
        self.slots.iter().map(|c| c.name.clone()).collect()
    }

    fn lookup(&self, name: &str) -> Result<ControlId, BindingError> {
        self.id(name)
            .ok_or_else(|| BindingError::NotFound(name.to_string()))
    }

    /// Rename a control in place. Renaming to the current name is a no-op.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<ControlId, BindingError> {
        let id = self.lookup(old)?;
        let new = new.trim();
        if new.is_empty() {
            return Err(BindingError::InvalidName);
        }
        if old == new {
            return Ok(id);
        }
        if self.index.contains_key(new) {
            return Err(BindingError::NameConflict(new.to_string()));
        }

        self.index.remove(old);
        self.index.insert(new.to_string(), id.index());
        self.slots[id.index()].name = new.to_string();
        debug!("Renamed control '{}' to '{}'", old, new);
        Ok(id)
    }

    /// Replace a control's input spec
    pub fn set_input(&mut self, name: &str, spec: MessageSpec) -> Result<ControlId, BindingError> {
        let id = self.lookup(name)?;
        spec.validate()?;
        self.slots[id.index()].input = spec;
        Ok(id)
    }

    /// Replace a control's output spec
    pub fn set_output(&mut self, name: &str, spec: MessageSpec) -> Result<ControlId, BindingError> {
        let id = self.lookup(name)?;
        spec.validate()?;
        self.slots[id.index()].output = spec;
        Ok(id)
    }

    /// Store a learned input spec together with the raw message it came from
    pub fn set_learned(
        &mut self,
        id: ControlId,
        spec: MessageSpec,
        raw: RawMessage,
    ) -> Result<(), BindingError> {
        spec.validate()?;
        let control = &mut self.slots[id.index()];
        control.input = spec;
        control.last_message = Some(raw);
        Ok(())
    }

    /// Controls whose input matches `inbound`, in presentation order
    pub fn matching(&self, inbound: &MessageSpec) -> Vec<ControlId> {
        self.iter_in_order()
            .filter(|(_, c)| c.input.matches(inbound))
            .map(|(id, _)| id)
            .collect()
    }

    /// Snapshot of all controls in presentation order
    pub fn to_records(&self) -> Vec<Control> {
        self.slots.clone()
    }

    /// Apply loaded controls slot by slot.
    ///
    /// Slots beyond `records` keep their current state and entries past the
    /// eighth are ignored. Out-of-range specs are clamped. A retained name
    /// that collides with a loaded one is replaced by a fresh default name.
    /// Returns the ids of the slots that changed.
    pub fn apply_records(&mut self, records: &[Control]) -> Vec<ControlId> {
        let before = self.slots.clone();
        let loaded = records.len().min(CONTROL_COUNT);
        let mut taken: HashSet<String> = HashSet::new();

        for (i, record) in records.iter().take(CONTROL_COUNT).enumerate() {
            let slot = &mut self.slots[i];
            let name = record.name.trim();
            let name = if name.is_empty() { slot.name.clone() } else { name.to_string() };
            slot.name = unique_name(name, i, &taken);
            slot.input = record.input.clamped();
            slot.output = record.output.clamped();
            slot.last_message = record.last_message.clone();
            taken.insert(slot.name.clone());
        }

        for i in loaded..CONTROL_COUNT {
            let slot = &mut self.slots[i];
            slot.name = unique_name(slot.name.clone(), i, &taken);
            taken.insert(slot.name.clone());
        }

        self.rebuild_index();

        ControlId::all()
            .filter(|id| before[id.index()] != self.slots[id.index()])
            .collect()
    }
}

impl Default for BindingTable {
    fn default() -> Self {
        Self::new()
    }
}

/// `name` if free, else the slot's default name, else a numbered variant
fn unique_name(name: String, index: usize, taken: &HashSet<String>) -> String {
    if !taken.contains(&name) {
        return name;
    }
    let base = Control::default_name(index);
    if !taken.contains(&base) {
        return base;
    }
    (2..)
        .map(|n| format!("{} ({})", base, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let table = BindingTable::new();
        let names = table.names();
        assert_eq!(names.len(), 8);
        assert_eq!(names[0], "Button 1");
        assert_eq!(names[7], "Button 8");
        assert!(table.iter_in_order().all(|(_, c)| !c.input.is_set()));
    }

    #[test]
    fn test_rename_preserves_binding() {
        let mut table = BindingTable::new();
        table.set_input("Button 1", MessageSpec::note(36)).unwrap();
        let prior = table.get("Button 1").unwrap().input;

        let id = table.rename("Button 1", "Kick").unwrap();
        assert_eq!(id.index(), 0);
        assert_eq!(table.get("Kick").unwrap().input, prior);
        assert!(table.get("Button 1").is_none());
        assert_eq!(table.names()[0], "Kick");
    }

    #[test]
    fn test_rename_errors() {
        let mut table = BindingTable::new();
        assert_eq!(
            table.rename("Button 1", "Button 2"),
            Err(BindingError::NameConflict("Button 2".to_string()))
        );
        assert_eq!(
            table.rename("Nope", "Kick"),
            Err(BindingError::NotFound("Nope".to_string()))
        );
        assert_eq!(table.rename("Button 1", "   "), Err(BindingError::InvalidName));
        assert_eq!(table.names()[0], "Button 1");
    }

    #[test]
    fn test_rename_to_same_name_is_idempotent() {
        let mut table = BindingTable::new();
        assert!(table.rename("Button 3", "Button 3").is_ok());
        assert_eq!(table.names()[2], "Button 3");
    }

    #[test]
    fn test_set_input_rejects_invalid_spec() {
        let mut table = BindingTable::new();
        table.set_input("Button 1", MessageSpec::note(40)).unwrap();

        let result = table.set_input("Button 1", MessageSpec::note(200));
        assert!(matches!(result, Err(BindingError::InvalidSpec(_))));
        assert_eq!(table.get("Button 1").unwrap().input, MessageSpec::note(40));

        let result = table.set_output("Button 1", MessageSpec::cc(1, 128));
        assert!(matches!(result, Err(BindingError::InvalidSpec(_))));
        assert!(matches!(
            table.set_output("Ghost", MessageSpec::cc(1, 1)),
            Err(BindingError::NotFound(_))
        ));
    }

    #[test]
    fn test_matching_returns_every_bound_control() {
        let mut table = BindingTable::new();
        table.set_input("Button 1", MessageSpec::note(60)).unwrap();
        table.set_input("Button 2", MessageSpec::note(60)).unwrap();
        table.set_input("Button 3", MessageSpec::cc(10, 127)).unwrap();

        let ids: Vec<_> = table
            .matching(&MessageSpec::note(60))
            .iter()
            .map(|id| id.index())
            .collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn test_apply_short_record_keeps_tail() {
        let mut table = BindingTable::new();
        table.set_input("Button 7", MessageSpec::program(9)).unwrap();

        let records: Vec<Control> = (0..5)
            .map(|i| {
                let mut c = Control::new(format!("Pad {}", i));
                c.output = MessageSpec::note(40 + i as u8);
                c
            })
            .collect();
        let changed = table.apply_records(&records);

        assert_eq!(changed.len(), 5);
        assert_eq!(table.names()[4], "Pad 4");
        assert_eq!(table.names()[5], "Button 6");
        assert_eq!(table.get("Button 7").unwrap().input, MessageSpec::program(9));
    }

    #[test]
    fn test_apply_resolves_name_collisions() {
        let mut table = BindingTable::new();
        // Slot 0 takes the name currently held by slot 2
        let records = vec![Control::new("Button 3")];
        table.apply_records(&records);

        let names = table.names();
        assert_eq!(names[0], "Button 3");
        assert_ne!(names[2], "Button 3");
        let unique: HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), 8);
        assert!(table.get("Button 3").is_some());
    }

    #[test]
    fn test_apply_ignores_entries_past_eighth() {
        let mut table = BindingTable::new();
        let records: Vec<Control> = (0..10).map(|i| Control::new(format!("P{}", i))).collect();
        table.apply_records(&records);
        assert_eq!(table.names().last().map(String::as_str), Some("P7"));
        assert!(table.get("P8").is_none());
    }

    #[test]
    fn test_set_learned_keeps_raw_message() {
        let mut table = BindingTable::new();
        let id = table.id("Button 2").unwrap();
        table
            .set_learned(id, MessageSpec::cc(20, 64), vec![0xB0, 20, 64])
            .unwrap();
        let control = table.control(id);
        assert_eq!(control.input, MessageSpec::cc(20, 64));
        assert_eq!(control.last_message, Some(vec![0xB0, 20, 64]));
    }
}
