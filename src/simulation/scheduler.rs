//! Simulated clock and cooperative scheduler
//!
//! Entities never run on their own: each one is a record in the scheduler
//! with an explicit control state, and the owner of the entity's logic asks
//! the scheduler which entity to resume next. Exactly one entity executes at
//! a time, so cross-entity reads need no synchronisation.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use log::trace;
use ordered_float::OrderedFloat;

use super::types::{EntityId, SimTime};

/// Control state of an entity as seen by the scheduler
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlState {
    /// Will resume at the given time
    RunnableLater(SimTime),
    /// Suspended until some other party calls [`Scheduler::signal`]
    RunnableWhenSignaled,
    /// Inert, never resumed again
    Terminated,
}

/// A pending resumption, ordered by (time, insertion order)
#[derive(Debug, Clone, Copy)]
struct Resumption {
    at: OrderedFloat<SimTime>,
    seq: u64,
    entity: EntityId,
}

impl Resumption {
    fn key(&self) -> (OrderedFloat<SimTime>, u64) {
        (self.at, self.seq)
    }
}

impl PartialEq for Resumption {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Resumption {}

impl PartialOrd for Resumption {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Resumption {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

#[derive(Debug, Clone)]
struct EntityRecord {
    name: String,
    state: ControlState,
    /// Sequence number of the only resumption allowed to run; older heap
    /// entries for this entity are stale and get skipped
    live_seq: Option<u64>,
}

/// Scheduler keeps the current time and the pending resumptions.
#[derive(Debug, Default)]
pub struct Scheduler {
    now: SimTime,
    next_seq: u64,
    pending: BinaryHeap<Reverse<Resumption>>,
    entities: Vec<EntityRecord>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current simulated time
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Register a new entity. It starts out waiting for a signal and does
    /// nothing until scheduled.
    pub fn spawn(&mut self, name: impl Into<String>) -> EntityId {
        let id = EntityId(self.entities.len());
        self.entities.push(EntityRecord {
            name: name.into(),
            state: ControlState::RunnableWhenSignaled,
            live_seq: None,
        });
        id
    }

    pub fn name(&self, entity: EntityId) -> &str {
        &self.record(entity).name
    }

    pub fn state(&self, entity: EntityId) -> ControlState {
        self.record(entity).state
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of entities with a live resumption queued
    pub fn pending_count(&self) -> usize {
        self.entities
            .iter()
            .filter(|e| matches!(e.state, ControlState::RunnableLater(_)))
            .count()
    }

    /// Schedule `entity` to resume at `now + delay`. Any resumption queued
    /// earlier for the same entity is superseded.
    pub fn schedule_after(&mut self, entity: EntityId, delay: SimTime) {
        assert!(
            delay.is_finite() && delay >= 0.0,
            "invalid delay {} for {}",
            delay,
            entity
        );
        let at = self.now + delay;
        let seq = self.next_seq;
        self.next_seq += 1;

        let record = self.record_mut(entity);
        assert!(
            record.state != ControlState::Terminated,
            "cannot schedule terminated entity '{}'",
            record.name
        );
        record.state = ControlState::RunnableLater(at);
        record.live_seq = Some(seq);

        trace!("schedule {} at {:.3} (seq {})", entity, at, seq);
        self.pending.push(Reverse(Resumption {
            at: OrderedFloat(at),
            seq,
            entity,
        }));
    }

    /// Suspend `entity` until it is signaled. Pending resumptions are
    /// cancelled immediately.
    pub fn passivate(&mut self, entity: EntityId) {
        let record = self.record_mut(entity);
        if record.state == ControlState::Terminated {
            return;
        }
        record.state = ControlState::RunnableWhenSignaled;
        record.live_seq = None;
    }

    /// Wake an entity waiting for a signal so that it resumes at the current
    /// time. Returns false if the entity was not waiting.
    pub fn signal(&mut self, entity: EntityId) -> bool {
        if self.state(entity) != ControlState::RunnableWhenSignaled {
            return false;
        }
        self.schedule_after(entity, 0.0);
        true
    }

    /// Make `entity` inert for the rest of the run
    pub fn terminate(&mut self, entity: EntityId) {
        let record = self.record_mut(entity);
        record.state = ControlState::Terminated;
        record.live_seq = None;
    }

    /// Pop the earliest live resumption scheduled at or before `until`,
    /// advance the clock to its time and return the entity to resume.
    ///
    /// Returns `None` when nothing is due by `until`; if work is still
    /// pending beyond that point the clock is moved to `until`.
    pub fn next_due(&mut self, until: SimTime) -> Option<EntityId> {
        while let Some(Reverse(head)) = self.pending.peek().copied() {
            if !self.is_live(&head) {
                self.pending.pop();
                continue;
            }
            if head.at.into_inner() > until {
                if self.now < until {
                    self.now = until;
                }
                return None;
            }

            self.pending.pop();
            let at = head.at.into_inner();
            assert!(
                at >= self.now,
                "clock moved backward from {} to {}",
                self.now,
                at
            );
            self.now = at;
            let record = self.record_mut(head.entity);
            record.live_seq = None;
            // The entity is running; it must reschedule, passivate or
            // terminate itself before its step ends.
            record.state = ControlState::RunnableWhenSignaled;
            return Some(head.entity);
        }
        None
    }

    fn is_live(&self, resumption: &Resumption) -> bool {
        self.record(resumption.entity).live_seq == Some(resumption.seq)
    }

    fn record(&self, entity: EntityId) -> &EntityRecord {
        &self.entities[entity.0]
    }

    fn record_mut(&mut self, entity: EntityId) -> &mut EntityRecord {
        &mut self.entities[entity.0]
    }
}
