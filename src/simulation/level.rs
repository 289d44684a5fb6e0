//! Bounded level with FIFO admission
//!
//! A level holds an amount between zero and its capacity. Entities put units
//! in or take units out; a request that cannot be satisfied right away parks
//! the entity (passivated) at the back of the matching queue, and it is
//! signaled once its request goes through.

use std::collections::VecDeque;

use log::trace;

use super::error::{ConfigError, ConfigResult};
use super::monitor::Monitor;
use super::scheduler::Scheduler;
use super::types::EntityId;

/// Result of a put or get request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Satisfied immediately; the caller keeps running
    Granted,
    /// Parked until the level can satisfy it
    Queued,
}

#[derive(Debug, Clone, Copy)]
struct Request {
    entity: EntityId,
    amount: u32,
}

#[derive(Debug, Clone)]
pub struct Level {
    name: String,
    capacity: u32,
    amount: u32,
    put_queue: VecDeque<Request>,
    get_queue: VecDeque<Request>,
    buffer: Monitor,
}

impl Level {
    /// Create a level holding `initial` units, first observed at the
    /// scheduler's current time
    pub fn new(
        name: impl Into<String>,
        capacity: u32,
        initial: u32,
        scheduler: &Scheduler,
    ) -> ConfigResult<Self> {
        let name = name.into();
        if capacity == 0 || initial > capacity {
            return Err(ConfigError::LevelRequest {
                level: name,
                amount: initial,
                capacity,
            });
        }
        let mut buffer = Monitor::new(format!("{} buffer", name));
        buffer.observe(scheduler.now(), f64::from(initial));
        Ok(Self {
            name,
            capacity,
            amount: initial,
            put_queue: VecDeque::new(),
            get_queue: VecDeque::new(),
            buffer,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }

    pub fn is_full(&self) -> bool {
        self.amount == self.capacity
    }

    /// Entities waiting to put, in admission order
    pub fn waiting_putters(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.put_queue.iter().map(|r| r.entity)
    }

    /// Entities waiting to get, in admission order
    pub fn waiting_getters(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.get_queue.iter().map(|r| r.entity)
    }

    /// Amount held over time
    pub fn buffer_monitor(&self) -> &Monitor {
        &self.buffer
    }

    /// Add `amount` units on behalf of `entity`
    pub fn put(
        &mut self,
        entity: EntityId,
        amount: u32,
        scheduler: &mut Scheduler,
    ) -> ConfigResult<Admission> {
        self.check_request(amount)?;
        if self.put_queue.is_empty() && self.has_room_for(amount) {
            self.amount += amount;
            self.record(scheduler);
            self.service(scheduler);
            return Ok(Admission::Granted);
        }
        trace!("{} waits to put {} into '{}'", entity, amount, self.name);
        self.put_queue.push_back(Request { entity, amount });
        scheduler.passivate(entity);
        Ok(Admission::Queued)
    }

    /// Remove `amount` units on behalf of `entity`
    pub fn get(
        &mut self,
        entity: EntityId,
        amount: u32,
        scheduler: &mut Scheduler,
    ) -> ConfigResult<Admission> {
        self.check_request(amount)?;
        if self.get_queue.is_empty() && self.amount >= amount {
            self.amount -= amount;
            self.record(scheduler);
            self.service(scheduler);
            return Ok(Admission::Granted);
        }
        trace!("{} waits to get {} from '{}'", entity, amount, self.name);
        self.get_queue.push_back(Request { entity, amount });
        scheduler.passivate(entity);
        Ok(Admission::Queued)
    }

    fn has_room_for(&self, amount: u32) -> bool {
        self.amount
            .checked_add(amount)
            .is_some_and(|total| total <= self.capacity)
    }

    fn check_request(&self, amount: u32) -> ConfigResult<()> {
        if amount == 0 || amount > self.capacity {
            return Err(ConfigError::LevelRequest {
                level: self.name.clone(),
                amount,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// Admit queued requests from the head of each queue until neither head
    /// fits any more
    fn service(&mut self, scheduler: &mut Scheduler) {
        loop {
            let mut progressed = false;

            if let Some(head) = self.get_queue.front().copied() {
                if self.amount >= head.amount {
                    self.get_queue.pop_front();
                    self.amount -= head.amount;
                    self.record(scheduler);
                    scheduler.signal(head.entity);
                    progressed = true;
                }
            }

            if let Some(head) = self.put_queue.front().copied() {
                if self.has_room_for(head.amount) {
                    self.put_queue.pop_front();
                    self.amount += head.amount;
                    self.record(scheduler);
                    scheduler.signal(head.entity);
                    progressed = true;
                }
            }

            if !progressed {
                break;
            }
        }
    }

    fn record(&mut self, scheduler: &Scheduler) {
        self.buffer
            .observe(scheduler.now(), f64::from(self.amount));
    }
}
