use std::collections::HashMap;

use strata_core::error::CodecError;
use strata_core::events::LedgerEvent;
use strata_core::id::Principal;

/// Append-only, in-memory record of emitted ledger events
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    /// Events in emission order
    events: Vec<LedgerEvent>,

    /// Mapping from principal to the positions of events naming it
    by_principal: HashMap<Principal, Vec<usize>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and index it by every principal it names
    pub(crate) fn emit(&mut self, event: LedgerEvent) {
        let position = self.events.len();
        for principal in event.principals() {
            self.by_principal.entry(principal).or_default().push(position);
        }
        log::debug!("Emitted {} event #{}", event.name(), position);
        self.events.push(event);
    }

    /// All events, oldest first
    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    /// The most recent event
    pub fn last(&self) -> Option<&LedgerEvent> {
        self.events.last()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events naming `principal` in any role, oldest first
    pub fn events_for(&self, principal: &Principal) -> Vec<&LedgerEvent> {
        self.by_principal
            .get(principal)
            .map(|positions| positions.iter().map(|i| &self.events[*i]).collect())
            .unwrap_or_default()
    }

    /// Drain every recorded event, leaving the log empty
    pub fn take(&mut self) -> Vec<LedgerEvent> {
        self.by_principal.clear();
        std::mem::take(&mut self.events)
    }

    /// Encode the recorded events for an external consumer
    pub fn export(&self) -> Result<Vec<u8>, CodecError> {
        encode_events(&self.events)
    }
}

/// Encode a batch of events with bincode
pub fn encode_events(events: &[LedgerEvent]) -> Result<Vec<u8>, CodecError> {
    Ok(bincode::serialize(events)?)
}

/// Decode a batch produced by [`encode_events`]
pub fn decode_events(bytes: &[u8]) -> Result<Vec<LedgerEvent>, CodecError> {
    Ok(bincode::deserialize(bytes)?)
}
