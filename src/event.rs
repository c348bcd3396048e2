//! Synchronous change notification for registry mutations.
//!
//! The registry fires exactly one event per successful mutation, strictly
//! after the track's backing arrays are fully consistent. The payload carries
//! everything a subscriber needs to update its own view (the editor's visual
//! timeline, a playback sampler) without re-querying the whole model.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The four kinds of keyframe mutation events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    KeyframeAdded,
    KeyframeRemoved,
    KeyframeUpdated,
    KeyframeMoved,
}

/// Payload of a keyframe mutation event.
///
/// `index` is the keyframe's slot *after* the mutation (for removals, the
/// slot it occupied before). Like every keyframe index it is only valid until
/// the next structural mutation of the same track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyframeEvent {
    pub kind: EventType,
    pub entity: String,
    pub property: String,
    pub index: usize,
    pub time: f64,
    pub value: Value,
    /// Previous time, set for moves
    pub old_time: Option<f64>,
    /// Previous value, set for updates and moves that replaced a record
    pub old_value: Option<Value>,
}

impl KeyframeEvent {
    pub(crate) fn new(
        kind: EventType,
        entity: &str,
        property: &str,
        index: usize,
        time: f64,
        value: Value,
    ) -> Self {
        Self {
            kind,
            entity: entity.to_string(),
            property: property.to_string(),
            index,
            time,
            value,
            old_time: None,
            old_value: None,
        }
    }

    pub(crate) fn with_old_time(mut self, old_time: f64) -> Self {
        self.old_time = Some(old_time);
        self
    }

    pub(crate) fn with_old_value(mut self, old_value: Value) -> Self {
        self.old_value = Some(old_value);
        self
    }
}

/// A subscriber callback.
pub type EventHandler = Box<dyn FnMut(&KeyframeEvent)>;

/// Per-kind subscriber lists with synchronous dispatch.
///
/// Handlers run in subscription order on the mutating call's stack. The
/// borrow rules already prevent a handler from re-entrantly mutating the
/// registry that owns this channel, which is why the payload is complete
/// enough to react without querying back.
#[derive(Default)]
pub struct EventChannel {
    handlers: HashMap<EventType, Vec<EventHandler>>,
}

impl EventChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one event kind
    pub fn subscribe(&mut self, kind: EventType, handler: impl FnMut(&KeyframeEvent) + 'static) {
        self.handlers.entry(kind).or_default().push(Box::new(handler));
    }

    /// Number of handlers registered for `kind`
    #[inline]
    pub fn subscriber_count(&self, kind: EventType) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }

    /// Drop all handlers
    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    pub(crate) fn emit(&mut self, event: &KeyframeEvent) {
        if let Some(list) = self.handlers.get_mut(&event.kind) {
            for handler in list.iter_mut() {
                handler(event);
            }
        }
    }
}

impl std::fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut counts: Vec<(EventType, usize)> = self
            .handlers
            .iter()
            .map(|(kind, list)| (*kind, list.len()))
            .collect();
        counts.sort_by_key(|(kind, _)| format!("{kind:?}"));
        f.debug_struct("EventChannel").field("handlers", &counts).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_dispatch_by_kind() {
        let mut channel = EventChannel::new();
        let added = Rc::new(RefCell::new(0));
        let removed = Rc::new(RefCell::new(0));

        let a = Rc::clone(&added);
        channel.subscribe(EventType::KeyframeAdded, move |_| *a.borrow_mut() += 1);
        let r = Rc::clone(&removed);
        channel.subscribe(EventType::KeyframeRemoved, move |_| *r.borrow_mut() += 1);

        let event = KeyframeEvent::new(
            EventType::KeyframeAdded,
            "cube",
            "position",
            0,
            1.0,
            Value::scalar(1.0),
        );
        channel.emit(&event);
        channel.emit(&event);

        assert_eq!(*added.borrow(), 2);
        assert_eq!(*removed.borrow(), 0);
        assert_eq!(channel.subscriber_count(EventType::KeyframeAdded), 1);
    }

    #[test]
    fn test_payload_builders() {
        let event = KeyframeEvent::new(
            EventType::KeyframeMoved,
            "cube",
            "position",
            2,
            3.0,
            Value::zero(),
        )
        .with_old_time(1.0)
        .with_old_value(Value::scalar(5.0));

        assert_eq!(event.old_time, Some(1.0));
        assert_eq!(event.old_value, Some(Value::scalar(5.0)));
    }
}
