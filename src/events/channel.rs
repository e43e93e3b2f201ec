//! Sender/receiver halves over crossbeam-channel.

use crossbeam_channel::{Receiver, Sender};

use super::Event;

/// Engine side of an event channel.
///
/// Sending never fails: once the receiver is gone, events are dropped and
/// the import carries on unobserved.
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    /// Queue an event; blocks only while a bounded channel is full
    pub fn send(&self, event: Event) {
        let _ = self.inner.send(event);
    }
}

/// Front-end side of an event channel
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Events already queued, oldest first
    pub fn drain(&self) -> Vec<Event> {
        self.inner.try_iter().collect()
    }

    /// Blocking iterator that ends once every sender is dropped
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }
}

/// Constructors for connected [`EventSender`]/[`EventReceiver`] pairs.
pub struct EventChannel;

impl EventChannel {
    /// Unbounded channel; the engine never waits on the listener
    pub fn new() -> (EventSender, EventReceiver) {
        Self::wrap(crossbeam_channel::unbounded())
    }

    /// Channel holding at most `capacity` events, so a slow listener
    /// throttles the engine instead of buffering without limit
    pub fn bounded(capacity: usize) -> (EventSender, EventReceiver) {
        Self::wrap(crossbeam_channel::bounded(capacity))
    }

    fn wrap((inner, receiver): (Sender<Event>, Receiver<Event>)) -> (EventSender, EventReceiver) {
        (EventSender { inner }, EventReceiver { inner: receiver })
    }
}

/// Sender with nobody listening, for runs without a front end
pub fn null_sender() -> EventSender {
    EventChannel::new().0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ImportEvent, ImportProgress, PipelineEvent};
    use std::path::PathBuf;
    use std::thread;

    fn progress(processed: usize) -> Event {
        Event::Import(ImportEvent::Progress(ImportProgress {
            processed,
            total: 3,
            current_path: PathBuf::from(format!("/photos/IMG_{}.JPG", processed)),
        }))
    }

    #[test]
    fn iter_ends_when_the_engine_thread_finishes() {
        let (sender, receiver) = EventChannel::new();

        let engine = thread::spawn(move || {
            for processed in 1..=3 {
                sender.send(progress(processed));
            }
        });

        let seen: Vec<usize> = receiver
            .iter()
            .filter_map(|event| match event {
                Event::Import(ImportEvent::Progress(p)) => Some(p.processed),
                _ => None,
            })
            .collect();

        engine.join().unwrap();
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[test]
    fn sending_without_listener_is_harmless() {
        null_sender().send(Event::Pipeline(PipelineEvent::Started));
    }

    #[test]
    fn drain_empties_the_queue_in_order() {
        let (sender, receiver) = EventChannel::new();
        sender.send(Event::Pipeline(PipelineEvent::Started));
        sender.send(Event::Pipeline(PipelineEvent::NothingToDo));

        let events = receiver.drain();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Event::Pipeline(PipelineEvent::Started)));
        assert!(matches!(events[1], Event::Pipeline(PipelineEvent::NothingToDo)));
        assert!(receiver.drain().is_empty());
    }

    #[test]
    fn bounded_listener_sees_everything_sent() {
        let (sender, receiver) = EventChannel::bounded(1);

        let engine = thread::spawn(move || {
            for processed in 1..=3 {
                sender.send(progress(processed));
            }
        });

        assert_eq!(receiver.iter().count(), 3);
        engine.join().unwrap();
    }
}
