//! Projection queue
//!
//! A named fan-out channel. Each subscriber owns a bounded tokio mpsc
//! receiver plus an overflow backlog. Publishing never blocks the writer and
//! never loses a message for a live subscriber: once the channel is full,
//! messages wait in the backlog and are moved into the channel in publish
//! order as the consumer catches up. The queue is not durable: a message
//! published while nobody is subscribed is dropped.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc::{self, error::TrySendError};

use super::message::ProjectionMessage;

type Backlog = Arc<Mutex<VecDeque<ProjectionMessage>>>;

fn lock_backlog(
    backlog: &Mutex<VecDeque<ProjectionMessage>>,
) -> MutexGuard<'_, VecDeque<ProjectionMessage>> {
    match backlog.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

enum Delivery {
    Sent,
    Deferred,
    Closed,
}

#[derive(Debug)]
struct Subscriber {
    sender: mpsc::Sender<ProjectionMessage>,
    backlog: Backlog,
}

impl Subscriber {
    /// Hands a message over, keeping publish order across channel and backlog.
    fn offer(&self, message: ProjectionMessage) -> Delivery {
        let mut backlog = lock_backlog(&self.backlog);

        while let Some(waiting) = backlog.pop_front() {
            match self.sender.try_send(waiting) {
                Ok(()) => {}
                Err(TrySendError::Full(waiting)) => {
                    backlog.push_front(waiting);
                    backlog.push_back(message);
                    return Delivery::Deferred;
                }
                Err(TrySendError::Closed(_)) => return Delivery::Closed,
            }
        }

        match self.sender.try_send(message) {
            Ok(()) => Delivery::Sent,
            Err(TrySendError::Full(message)) => {
                backlog.push_back(message);
                Delivery::Deferred
            }
            Err(TrySendError::Closed(_)) => Delivery::Closed,
        }
    }
}

/// Receiving half handed to a consumer.
#[derive(Debug)]
pub struct Subscription {
    consumer: String,
    receiver: mpsc::Receiver<ProjectionMessage>,
    backlog: Backlog,
}

impl Subscription {
    pub fn consumer(&self) -> &str {
        &self.consumer
    }

    /// Waits for the next message. `None` once the queue has been closed and
    /// everything published before that has been received.
    pub async fn recv(&mut self) -> Option<ProjectionMessage> {
        if let Some(message) = self.try_recv() {
            return Some(message);
        }
        match self.receiver.recv().await {
            Some(message) => Some(message),
            None => self.try_recv(),
        }
    }

    /// Takes the next pending message without waiting.
    pub fn try_recv(&mut self) -> Option<ProjectionMessage> {
        let mut backlog = lock_backlog(&self.backlog);
        match self.receiver.try_recv() {
            Ok(message) => Some(message),
            Err(_) => backlog.pop_front(),
        }
    }
}

/// Outcome of one publish.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PublishReport {
    /// Subscribers that accepted the message
    pub delivered: usize,
    /// Of those, subscribers whose channel was full so the message waits in
    /// their backlog
    pub deferred: usize,
    /// 1 if there were no live subscribers, otherwise 0
    pub dropped: usize,
}

#[derive(Debug)]
pub struct ProjectionQueue {
    name: String,
    capacity: usize,
    subscribers: Mutex<Vec<Subscriber>>,
}

impl ProjectionQueue {
    /// Creates a queue whose subscriber channels hold `capacity` messages.
    /// A zero capacity is raised to one.
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            capacity: capacity.max(1),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Registers a consumer and returns its receiving half.
    pub fn subscribe(&self, consumer: impl Into<String>) -> Subscription {
        let (sender, receiver) = mpsc::channel(self.capacity);
        let backlog = Backlog::default();
        self.lock().push(Subscriber {
            sender,
            backlog: Arc::clone(&backlog),
        });
        Subscription {
            consumer: consumer.into(),
            receiver,
            backlog,
        }
    }

    /// Live subscriber count. Subscribers whose receiver was dropped are pruned.
    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.lock();
        subscribers.retain(|s| !s.sender.is_closed());
        subscribers.len()
    }

    /// Fans a message out to every live subscriber.
    pub fn publish(&self, message: ProjectionMessage) -> PublishReport {
        let mut report = PublishReport::default();
        let mut subscribers = self.lock();

        subscribers.retain(|subscriber| match subscriber.offer(message.clone()) {
            Delivery::Sent => {
                report.delivered += 1;
                true
            }
            Delivery::Deferred => {
                report.delivered += 1;
                report.deferred += 1;
                true
            }
            Delivery::Closed => false,
        });

        if subscribers.is_empty() {
            report.dropped = 1;
        }
        report
    }

    /// Disconnects every subscriber. Their receivers drain and then end.
    pub fn close(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Subscriber>> {
        match self.subscribers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
