//! Events emitted by the keepers.
//!
//! Keepers never publish directly: they write into an [`EventSink`] supplied
//! by the caller. Mutating operations stage their events in a local
//! [`EventLog`] and forward them only after their writes commit, so a failed
//! call emits nothing.

use serde::{Deserialize, Serialize};

use crate::BlockContext;

/// An event with the block it was produced in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_type: EventType,
    pub time: u64,
    pub height: u64,
    pub payload: serde_json::Value,
}

impl Event {
    pub fn new(event_type: EventType, ctx: &BlockContext, payload: serde_json::Value) -> Self {
        Self {
            event_type,
            time: ctx.time,
            height: ctx.height,
            payload,
        }
    }
}

/// All event types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    // Price feed events
    PriceSubmitted,
    CurrentPriceFinalized,
    MarketStatusChanged,

    // Virtual pool events
    PoolCreated,
    Swap,

    // Stablecoin events
    MintStable,
    BurnStable,
    FeesDistributed,
    CollRatioUpdated,
}

/// Destination for emitted events.
pub trait EventSink {
    fn emit(&mut self, event: Event);
}

/// An in-memory, append-only event buffer.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Events of one type, in emission order.
    pub fn of_type(&self, event_type: EventType) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Move every buffered event into `sink`, leaving this log empty.
    pub fn drain_into(&mut self, sink: &mut dyn EventSink) {
        for event in self.events.drain(..) {
            sink.emit(event);
        }
    }

    /// Take the buffered events, leaving this log empty.
    pub fn take(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: Event) {
        self.events.push(event);
    }
}
