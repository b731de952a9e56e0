use serde::Serialize;

use crate::sync::TopicStatus;

/// What happened to a topic during an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressKind {
    /// Local content was pushed to the remote
    Committed,
    /// A conflicting topic was left alone by a commit
    ConflictSkipped,
    /// Local file was replaced with the remote content
    UpdatedLocal,
}

impl ProgressKind {
    pub fn as_str(&self) -> &str {
        match self {
            ProgressKind::Committed => "committed",
            ProgressKind::ConflictSkipped => "conflict skipped",
            ProgressKind::UpdatedLocal => "updated",
        }
    }
}

/// A single state transition reported by `update` or `commit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub kind: ProgressKind,
    pub namespace: String,
    pub topic: String,
    pub old_status: TopicStatus,
    pub new_status: TopicStatus,
}

/// Receives progress events in the order topics are processed.
pub trait ProgressObserver {
    fn on_progress(&mut self, event: &ProgressEvent);
}

impl<F> ProgressObserver for F
where
    F: FnMut(&ProgressEvent),
{
    fn on_progress(&mut self, event: &ProgressEvent) {
        self(event)
    }
}

/// Observers registered on a synchronizer.
#[derive(Default)]
pub(crate) struct Observers {
    observers: Vec<Box<dyn ProgressObserver>>,
}

impl Observers {
    pub(crate) fn push(&mut self, observer: Box<dyn ProgressObserver>) {
        self.observers.push(observer);
    }

    pub(crate) fn notify(&mut self, event: &ProgressEvent) {
        log::debug!(
            "{} {}/{}: {} -> {}",
            event.kind.as_str(),
            event.namespace,
            event.topic,
            event.old_status,
            event.new_status
        );
        for observer in &mut self.observers {
            observer.on_progress(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn event(topic: &str) -> ProgressEvent {
        ProgressEvent {
            kind: ProgressKind::UpdatedLocal,
            namespace: "A".to_string(),
            topic: topic.to_string(),
            old_status: TopicStatus::LocallyOutOfDate,
            new_status: TopicStatus::UpToDate,
        }
    }

    #[test]
    fn test_closures_receive_events_in_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut observers = Observers::default();
        observers.push(Box::new(move |e: &ProgressEvent| {
            sink.borrow_mut().push(e.topic.clone())
        }));

        observers.notify(&event("First"));
        observers.notify(&event("Second"));

        assert_eq!(*seen.borrow(), vec!["First", "Second"]);
    }

    #[test]
    fn test_event_serializes_snake_case() {
        let json = serde_json::to_value(event("One")).unwrap();
        assert_eq!(json["kind"], "updated_local");
        assert_eq!(json["old_status"], "locally_out_of_date");
    }
}
