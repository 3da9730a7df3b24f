use std::collections::BTreeMap;
use std::sync::Arc;

use super::controller::{FormController, FormResult, SubmissionStatus, read_lock, write_lock};
use super::schema::FieldName;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SubscriptionId(pub u64);

/// Emitted after each state mutation, once the state lock is released.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FormEvent {
    FieldChanged(FieldName),
    Validated {
        valid: bool,
    },
    StatusChanged {
        from: SubmissionStatus,
        to: SubmissionStatus,
    },
    Reset,
}

pub(super) type Listener = Arc<dyn Fn(&FormEvent) + Send + Sync>;

#[derive(Default)]
pub(super) struct Listeners {
    next_id: u64,
    entries: BTreeMap<SubscriptionId, Listener>,
}

impl FormController {
    pub fn subscribe(
        &self,
        listener: impl Fn(&FormEvent) + Send + Sync + 'static,
    ) -> FormResult<SubscriptionId> {
        let mut listeners = write_lock(&self.listeners, "subscribing listener")?;
        listeners.next_id += 1;
        let id = SubscriptionId(listeners.next_id);
        listeners.entries.insert(id, Arc::new(listener));
        Ok(id)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> FormResult<bool> {
        let mut listeners = write_lock(&self.listeners, "unsubscribing listener")?;
        Ok(listeners.entries.remove(&id).is_some())
    }

    pub(super) fn emit(&self, events: &[FormEvent]) -> FormResult<()> {
        if events.is_empty() {
            return Ok(());
        }
        let listeners = read_lock(&self.listeners, "reading listeners")?
            .entries
            .values()
            .cloned()
            .collect::<Vec<_>>();
        for event in events {
            for listener in &listeners {
                listener(event);
            }
        }
        Ok(())
    }
}
