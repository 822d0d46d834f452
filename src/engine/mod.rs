// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! The mapping engine.
//!
//! `Engine` lives on the interactive thread and owns every piece of mutable
//! state: the binding table, the learn session, the open ports and the
//! record store. The MIDI transport runs its callback on its own thread and
//! only ever pushes raw messages into a channel, which the interactive
//! thread drains with [`Engine::pump`]. Disk writes therefore never happen
//! on the transport thread, and inbound messages are handled strictly in
//! arrival order.

pub mod events;

pub use events::{ConfigLabel, EngineEvent, ShutdownChoice, ShutdownOutcome};

use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use tracing::{debug, info, trace, warn};

use crate::config::{ConfigRecord, ConfigStore, RecordId};
use crate::control::{
    BindingTable, Control, ControlId, DispatchStats, Dispatcher, LearnController, LearnState,
    Routed,
};
use crate::error::{BindingError, ConfigError, EngineError, Result};
use crate::midi::{Direction, InboundMessage, MessageSpec, MidiBackend, PortSession};

pub struct Engine {
    table: BindingTable,
    learn: LearnController,
    dispatcher: Dispatcher,
    ports: PortSession,
    store: ConfigStore,
    current: RecordId,
    dirty: bool,
    inbound_tx: Sender<InboundMessage>,
    inbound_rx: Receiver<InboundMessage>,
    events: Sender<EngineEvent>,
}

impl Engine {
    /// Create an engine with eight unbound controls and no open ports.
    ///
    /// Returns the receiving end of the event channel for the presentation
    /// layer. Call [`Engine::start`] to load the startup record.
    pub fn new(store: ConfigStore, backend: Box<dyn MidiBackend>) -> (Self, Receiver<EngineEvent>) {
        let (inbound_tx, inbound_rx) = mpsc::channel();
        let (events_tx, events_rx) = mpsc::channel();

        let engine = Self {
            table: BindingTable::new(),
            learn: LearnController::new(),
            dispatcher: Dispatcher::new(),
            ports: PortSession::new(backend, inbound_tx.clone()),
            store,
            current: RecordId::Default,
            dirty: false,
            inbound_tx,
            inbound_rx,
            events: events_tx,
        };
        (engine, events_rx)
    }

    /// Load the scratch record if present, else the default record,
    /// creating it on first run.
    pub fn start(&mut self) -> Result<()> {
        let (id, record) = self.store.resolve_startup()?;
        self.apply_record(id, &record);
        Ok(())
    }

    // ------------------------------------------------------------------
    // State access

    pub fn table(&self) -> &BindingTable {
        &self.table
    }

    pub fn control(&self, name: &str) -> Option<&Control> {
        self.table.get(name)
    }

    pub fn learn_state(&self) -> &LearnState {
        self.learn.state()
    }

    pub fn is_learn_armed(&self) -> bool {
        self.learn.is_armed()
    }

    pub fn current_record(&self) -> &RecordId {
        &self.current
    }

    pub fn label(&self) -> ConfigLabel {
        ConfigLabel::new(&self.current, self.dirty)
    }

    /// Whether there are edits not saved to a named record
    pub fn pending_edits(&self) -> bool {
        self.dirty
    }

    pub fn ports(&self) -> &PortSession {
        &self.ports
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn dispatch_stats(&self) -> DispatchStats {
        self.dispatcher.stats()
    }

    /// Snapshot of the bindings and open ports
    pub fn snapshot(&self) -> ConfigRecord {
        ConfigRecord {
            bindings: self.table.to_records(),
            ports: self.ports.selection(),
        }
    }

    /// Another producer of inbound traffic (the transport already has one)
    pub fn inbound_sender(&self) -> Sender<InboundMessage> {
        self.inbound_tx.clone()
    }

    // ------------------------------------------------------------------
    // Presses and triggers

    /// A press on a control: cancels a live learn session, selects the
    /// control while learn mode is on, and triggers it otherwise.
    pub fn on_press(&mut self, name: &str) -> Result<()> {
        let id = self.lookup(name)?;
        if self.learn.is_active() {
            self.on_outside_interaction();
        } else if self.learn.is_armed() {
            self.select(id);
        } else {
            self.fire(id);
        }
        Ok(())
    }

    /// Trigger a control. Ignored while a learn session is live.
    pub fn on_trigger(&mut self, name: &str) -> Result<()> {
        let id = self.lookup(name)?;
        if self.learn.is_active() {
            debug!("Ignoring trigger of '{}' during learn", name);
            return Ok(());
        }
        self.fire(id);
        Ok(())
    }

    fn fire(&mut self, id: ControlId) {
        let name = self.table.control(id).name.clone();
        self.emit(EngineEvent::TriggerFired {
            id,
            name: name.clone(),
        });

        if !self.ports.is_open(Direction::Output) {
            debug!("'{}' fired with no output port open", name);
            return;
        }

        for message in self.dispatcher.outbound(&self.table, id) {
            if let Err(e) = self.ports.send(&message) {
                warn!("Dropped output of '{}': {}", name, e);
                break;
            }
        }
    }

    // ------------------------------------------------------------------
    // Learn

    /// Turn learn mode on or off. Turning it off cancels any session.
    pub fn on_learn_toggle(&mut self, enabled: bool) {
        if enabled {
            self.learn.arm();
        } else {
            self.learn.disarm();
        }
        self.emit_learn_state();
    }

    /// Start learning for `name`. Returns false if a session was already live.
    pub fn on_learn_select(&mut self, name: &str) -> Result<bool> {
        let id = self.lookup(name)?;
        Ok(self.select(id))
    }

    fn select(&mut self, id: ControlId) -> bool {
        let started = self.learn.select(id);
        if started {
            self.emit_learn_state();
        }
        started
    }

    /// Bind the captured message. Returns false if nothing was captured yet.
    pub fn on_learn_confirm(&mut self) -> Result<bool> {
        let Some(outcome) = self.learn.confirm() else {
            return Ok(false);
        };
        self.table
            .set_learned(outcome.target, outcome.spec, outcome.raw)?;
        self.emit_learn_state();
        self.emit_binding(outcome.target);
        self.persist();
        Ok(true)
    }

    pub fn on_learn_cancel(&mut self) -> bool {
        let cancelled = self.learn.cancel();
        self.emit_learn_state();
        cancelled
    }

    /// Any interaction outside the learn surface cancels a live session
    pub fn on_outside_interaction(&mut self) -> bool {
        let cancelled = self.learn.outside_interaction();
        if cancelled {
            self.emit_learn_state();
        }
        cancelled
    }

    // ------------------------------------------------------------------
    // Binding edits; each one is written through to the scratch record

    pub fn on_rename(&mut self, old: &str, new: &str) -> Result<()> {
        if old.trim() == new.trim() && self.table.id(old).is_some() {
            return Ok(());
        }
        let id = self.table.rename(old, new)?;
        self.emit_binding(id);
        self.persist();
        Ok(())
    }

    pub fn on_set_input(&mut self, name: &str, spec: MessageSpec) -> Result<()> {
        let id = self.table.set_input(name, spec)?;
        self.emit_binding(id);
        self.persist();
        Ok(())
    }

    pub fn on_set_output(&mut self, name: &str, spec: MessageSpec) -> Result<()> {
        let id = self.table.set_output(name, spec)?;
        self.emit_binding(id);
        self.persist();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Ports

    pub fn available_ports(&self, direction: Direction) -> Result<Vec<String>> {
        Ok(self.ports.available(direction)?)
    }

    /// Switch the port for `direction`, or close it with `None`.
    ///
    /// A failed open leaves the direction closed. Either way the new
    /// selection is written through.
    pub fn request_port_change(&mut self, direction: Direction, name: Option<&str>) -> Result<()> {
        let result = match name {
            Some(name) => self.ports.open(direction, name),
            None => {
                self.ports.close(direction);
                Ok(())
            }
        };
        self.persist();
        Ok(result?)
    }

    // ------------------------------------------------------------------
    // Records

    /// Load a record. On error nothing changes.
    pub fn request_load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let id = self.store.classify(path);
        let record = self.store.load(&id)?;
        self.on_outside_interaction();
        if id != RecordId::Scratch {
            if let Err(e) = self.store.discard_scratch() {
                warn!("Could not remove stale scratch record: {}", e);
            }
        }
        self.apply_record(id, &record);
        Ok(())
    }

    /// Save to `path`, or to the current named record when `None`
    pub fn request_save(&mut self, path: Option<&Path>) -> Result<()> {
        let id = match path {
            Some(path) => self.store.classify(path),
            None => match &self.current {
                RecordId::Named(_) => self.current.clone(),
                _ => return Err(ConfigError::NoSaveTarget.into()),
            },
        };
        self.save_to(id)
    }

    pub fn request_save_as<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let id = self.store.classify(path);
        self.save_to(id)
    }

    /// Save to a default or named record. The scratch record only ever
    /// holds write-through state, so it is refused as a target.
    fn save_to(&mut self, id: RecordId) -> Result<()> {
        if id == RecordId::Scratch {
            warn!("Refusing to save over the scratch record");
            return Err(ConfigError::NoSaveTarget.into());
        }
        self.store.save(&id, &self.snapshot())?;
        info!("Saved config to {}", id);
        self.current = id;
        self.dirty = false;
        self.emit_label();
        Ok(())
    }

    /// Resolve pending edits before exit. The scratch record is removed
    /// whenever the outcome is `Exit`.
    pub fn shutdown(&mut self, choice: ShutdownChoice) -> Result<ShutdownOutcome> {
        if !self.pending_edits() {
            self.store.discard_scratch()?;
            return Ok(ShutdownOutcome::Exit);
        }

        match choice {
            ShutdownChoice::Cancel => Ok(ShutdownOutcome::Abort),
            ShutdownChoice::Discard => {
                self.store.discard_scratch()?;
                Ok(ShutdownOutcome::Exit)
            }
            ShutdownChoice::Save(path) => {
                match self.request_save(path.as_deref()) {
                    Ok(()) => {}
                    Err(EngineError::Config(ConfigError::NoSaveTarget)) => {
                        return Ok(ShutdownOutcome::NeedsPath)
                    }
                    Err(e) => return Err(e),
                }
                self.store.discard_scratch()?;
                Ok(ShutdownOutcome::Exit)
            }
        }
    }

    // ------------------------------------------------------------------
    // Inbound traffic

    /// Handle every queued inbound message without blocking
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(message) = self.inbound_rx.try_recv() {
            self.handle_inbound(&message);
            handled += 1;
        }
        handled
    }

    /// Wait up to `timeout` for inbound traffic, then drain the queue
    pub fn pump_timeout(&mut self, timeout: Duration) -> usize {
        match self.inbound_rx.recv_timeout(timeout) {
            Ok(message) => {
                self.handle_inbound(&message);
                1 + self.pump()
            }
            Err(_) => 0,
        }
    }

    fn handle_inbound(&mut self, message: &InboundMessage) {
        trace!("Inbound {:02X?} at {}us", message.bytes, message.timestamp_us);
        match self
            .dispatcher
            .route_inbound(&message.bytes, &mut self.learn, &self.table)
        {
            Routed::Learn { captured: true } => self.emit_learn_state(),
            Routed::Learn { captured: false } | Routed::Discarded => {}
            Routed::Triggers(ids) => {
                for id in ids {
                    self.fire(id);
                }
            }
        }
    }

    // ------------------------------------------------------------------

    fn lookup(&self, name: &str) -> std::result::Result<ControlId, BindingError> {
        self.table
            .id(name)
            .ok_or_else(|| BindingError::NotFound(name.to_string()))
    }

    fn apply_record(&mut self, id: RecordId, record: &ConfigRecord) {
        for changed in self.table.apply_records(&record.bindings) {
            self.emit_binding(changed);
        }
        for (direction, e) in self.ports.apply_selection(&record.ports) {
            self.emit(EngineEvent::PortUnavailable {
                direction,
                name: record.ports.get(direction).unwrap_or_default().to_string(),
                reason: e.to_string(),
            });
        }
        self.dirty = id == RecordId::Scratch;
        self.current = id;
        self.emit_label();
    }

    /// Write the current state to the scratch record
    fn persist(&mut self) {
        match self.store.save(&RecordId::Scratch, &self.snapshot()) {
            Ok(()) => {
                if !self.dirty {
                    self.dirty = true;
                    self.emit_label();
                }
            }
            Err(e) => {
                warn!("Write-through save failed: {}", e);
                self.emit(EngineEvent::PersistFailed(e.to_string()));
            }
        }
    }

    fn emit(&self, event: EngineEvent) {
        // Nobody listening is fine
        let _ = self.events.send(event);
    }

    fn emit_learn_state(&self) {
        self.emit(EngineEvent::LearnStateChanged {
            armed: self.learn.is_armed(),
            state: self.learn.state().clone(),
        });
    }

    fn emit_binding(&self, id: ControlId) {
        self.emit(EngineEvent::BindingChanged {
            id,
            control: self.table.control(id).clone(),
        });
    }

    fn emit_label(&self) {
        self.emit(EngineEvent::ConfigLabelChanged(self.label()));
    }
}
