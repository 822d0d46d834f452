// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Routing of inbound messages and encoding of triggers.

use tracing::trace;

use super::{BindingTable, ControlId, LearnController};
use crate::midi::{MessageSpec, RawMessage};

/// What happened to one inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    /// A learn session was live and took the message
    Learn { captured: bool },
    /// Every control bound to the message, in presentation order
    Triggers(Vec<ControlId>),
    /// Not a message we model, or nothing bound to it
    Discarded,
}

/// Counters for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub inbound: u64,
    pub discarded: u64,
    pub triggers: u64,
}

#[derive(Debug, Default)]
pub struct Dispatcher {
    stats: DispatchStats,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Route one inbound message.
    ///
    /// While a learn session is live the message goes to it exclusively and
    /// is never matched against bindings.
    pub fn route_inbound(
        &mut self,
        raw: &[u8],
        learn: &mut LearnController,
        table: &BindingTable,
    ) -> Routed {
        self.stats.inbound += 1;

        if learn.is_active() {
            return Routed::Learn {
                captured: learn.capture(raw),
            };
        }

        let Some(spec) = MessageSpec::decode(raw) else {
            trace!("Discarding unmodelled message {:02X?}", raw);
            self.stats.discarded += 1;
            return Routed::Discarded;
        };

        let matched = table.matching(&spec);
        if matched.is_empty() {
            self.stats.discarded += 1;
            return Routed::Discarded;
        }

        self.stats.triggers += matched.len() as u64;
        Routed::Triggers(matched)
    }

    /// Raw messages a trigger of `id` sends. Empty while the output is unset.
    pub fn outbound(&self, table: &BindingTable, id: ControlId) -> Vec<RawMessage> {
        table.control(id).output.encode()
    }
}
