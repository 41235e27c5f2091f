use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

use super::types::{ProbeEvent, ProbeEventKind, ProbeOutcome};
use crate::error::ProbeError;

/// How long closed ids and unclaimed events are remembered
const DEFAULT_RETENTION: Duration = Duration::from_secs(600);

/// Upper bound on ids with buffered but unclaimed events
const MAX_ORPHANS: usize = 1024;

type Completion = Result<Vec<ProbeOutcome>, ProbeError>;

/// What happened to a delivered event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Added to an in-flight measurement that still needs more results
    Accepted,
    /// Last expected result; the waiter was released
    Completed,
    /// The waiter was released with an interruption
    Interrupted,
    /// No waiter yet; kept until one registers
    Buffered,
    /// Measurement already completed, interrupted or timed out
    Dropped,
}

struct InFlight {
    expected: usize,
    outcomes: Vec<ProbeOutcome>,
    waiter: oneshot::Sender<Completion>,
}

struct Orphan {
    outcomes: Vec<ProbeOutcome>,
    interrupted: Option<String>,
    first_seen: Instant,
}

#[derive(Default)]
struct Registry {
    in_flight: HashMap<Uuid, InFlight>,
    orphans: HashMap<Uuid, Orphan>,
    closed: HashMap<Uuid, Instant>,
}

impl Registry {
    fn prune(&mut self, now: Instant, retention: Duration) {
        self.closed.retain(|_, closed_at| now.duration_since(*closed_at) < retention);
        self.orphans.retain(|_, orphan| now.duration_since(orphan.first_seen) < retention);

        // Callers that went away without waiting for their deadline
        let abandoned: Vec<Uuid> = self
            .in_flight
            .iter()
            .filter(|(_, flight)| flight.waiter.is_closed())
            .map(|(id, _)| *id)
            .collect();
        for id in abandoned {
            self.in_flight.remove(&id);
            self.closed.insert(id, now);
        }
    }
}

/// Matches provider events to waiting `ping` calls by measurement process id
///
/// Registering, delivering and evicting all happen under one lock, so for a
/// given id exactly one of completion, interruption or timeout wins. Ids stay
/// closed for the retention period and their late events are dropped.
pub struct ProbeCorrelator {
    registry: Mutex<Registry>,
    retention: Duration,
}

impl Default for ProbeCorrelator {
    fn default() -> Self {
        Self::new()
    }
}

impl ProbeCorrelator {
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }

    pub fn with_retention(retention: Duration) -> Self {
        Self { registry: Mutex::new(Registry::default()), retention }
    }

    /// Wait until `expected` results of `process_id` arrived or `deadline` passes
    ///
    /// A timeout discards whatever partial results were collected.
    pub async fn wait(&self, process_id: Uuid, expected: usize, deadline: Instant) -> Completion {
        let mut receiver = self.register(process_id, expected).await?;

        match timeout_at(deadline, &mut receiver).await {
            Ok(Ok(completion)) => completion,
            Ok(Err(_)) => Err(ProbeError::AlreadyClosed(process_id)),
            Err(_) => match self.evict(process_id).await {
                Some(received) => Err(ProbeError::Timeout { process_id, received, expected }),
                // Completed under the lock right before eviction
                None => receiver.try_recv().unwrap_or(Err(ProbeError::Timeout {
                    process_id,
                    received: 0,
                    expected,
                })),
            },
        }
    }

    /// Feed one provider event
    pub async fn deliver(&self, event: ProbeEvent) -> Delivery {
        let now = Instant::now();
        let mut registry = self.registry.lock().await;
        registry.prune(now, self.retention);

        let process_id = event.process_id;
        if registry.closed.contains_key(&process_id) {
            debug!("Dropping late event of closed measurement {}", process_id);
            return Delivery::Dropped;
        }

        let Some(mut flight) = registry.in_flight.remove(&process_id) else {
            return buffer_orphan(&mut registry, event, now);
        };

        match event.kind {
            ProbeEventKind::Outcome(outcome) => {
                flight.outcomes.push(outcome);
                if flight.outcomes.len() < flight.expected {
                    registry.in_flight.insert(process_id, flight);
                    return Delivery::Accepted;
                }

                registry.closed.insert(process_id, now);
                debug!("Measurement {} completed with {} results", process_id, flight.outcomes.len());
                let _ = flight.waiter.send(Ok(flight.outcomes));
                Delivery::Completed
            }
            ProbeEventKind::Interrupted { reason } => {
                registry.closed.insert(process_id, now);
                warn!("Measurement {} was interrupted by the provider: {}", process_id, reason);
                let _ = flight.waiter.send(Err(ProbeError::Interrupted { process_id, reason }));
                Delivery::Interrupted
            }
        }
    }

    /// Number of measurements currently waiting for results
    pub async fn in_flight(&self) -> usize {
        self.registry.lock().await.in_flight.len()
    }

    async fn register(&self, process_id: Uuid, expected: usize) -> Result<oneshot::Receiver<Completion>, ProbeError> {
        let now = Instant::now();
        let mut registry = self.registry.lock().await;
        registry.prune(now, self.retention);

        if registry.closed.contains_key(&process_id) {
            return Err(ProbeError::AlreadyClosed(process_id));
        }
        if registry.in_flight.contains_key(&process_id) {
            return Err(ProbeError::DuplicateWait(process_id));
        }

        let (waiter, receiver) = oneshot::channel();
        let mut outcomes = Vec::with_capacity(expected);

        if let Some(orphan) = registry.orphans.remove(&process_id) {
            debug!("Claiming {} early results of measurement {}", orphan.outcomes.len(), process_id);
            if let Some(reason) = orphan.interrupted {
                registry.closed.insert(process_id, now);
                let _ = waiter.send(Err(ProbeError::Interrupted { process_id, reason }));
                return Ok(receiver);
            }
            outcomes = orphan.outcomes;
        }

        if outcomes.len() >= expected {
            outcomes.truncate(expected);
            registry.closed.insert(process_id, now);
            let _ = waiter.send(Ok(outcomes));
            return Ok(receiver);
        }

        registry.in_flight.insert(process_id, InFlight { expected, outcomes, waiter });
        Ok(receiver)
    }

    /// Close an in-flight id; returns how many results it had, or `None`
    /// if it was no longer in flight
    async fn evict(&self, process_id: Uuid) -> Option<usize> {
        let mut registry = self.registry.lock().await;
        let flight = registry.in_flight.remove(&process_id)?;
        registry.closed.insert(process_id, Instant::now());
        debug!("Measurement {} timed out with {} of {} results", process_id, flight.outcomes.len(), flight.expected);
        Some(flight.outcomes.len())
    }
}

fn buffer_orphan(registry: &mut Registry, event: ProbeEvent, now: Instant) -> Delivery {
    if !registry.orphans.contains_key(&event.process_id) && registry.orphans.len() >= MAX_ORPHANS {
        warn!("Too many unclaimed measurements; dropping event of {}", event.process_id);
        return Delivery::Dropped;
    }

    let orphan = registry.orphans.entry(event.process_id).or_insert_with(|| Orphan {
        outcomes: Vec::new(),
        interrupted: None,
        first_seen: now,
    });
    match event.kind {
        ProbeEventKind::Outcome(outcome) => orphan.outcomes.push(outcome),
        ProbeEventKind::Interrupted { reason } => orphan.interrupted = Some(reason),
    }
    Delivery::Buffered
}
