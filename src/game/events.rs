//! Fire-and-forget simulation notifications
//!
//! The simulation publishes into a bounded crossbeam channel and never blocks:
//! when the outbox is full the event is dropped and counted. Consumers (a
//! renderer, audio, score display) drain their receiver once per frame.

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::Serialize;

use crate::game::state::{Enemy, EnemyId, ProjectileId, Tier};
use crate::game::world_gen::WorldEvent;
use crate::util::vec2::Vec2;

/// Default outbox capacity
pub const DEFAULT_EVENT_CAPACITY: usize = 4096;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    EnemySpawned {
        enemy: Enemy,
    },
    ProjectileFired {
        id: ProjectileId,
        position: Vec2,
        velocity: Vec2,
    },
    MergeStarted {
        a: EnemyId,
        b: EnemyId,
        tier: Tier,
    },
    /// `a` and `b` are the consumed sources
    MergeCompleted {
        a: EnemyId,
        b: EnemyId,
        x: f32,
        y: f32,
        mass1: f32,
        mass2: f32,
        total_mass: f32,
        new_id: EnemyId,
        tier: Tier,
    },
    MergeAborted {
        a: EnemyId,
        b: EnemyId,
    },
    Knockback {
        enemy_id: EnemyId,
        position: Vec2,
        velocity: Vec2,
    },
    EnemyKilled {
        id: EnemyId,
        tier: Tier,
        position: Vec2,
    },
    EnemyDespawned {
        id: EnemyId,
    },
    WorldEventFired {
        event: WorldEvent,
    },
}

/// Bounded outbox owned by the simulation
pub struct EventOutbox {
    sender: Sender<SimEvent>,
    receiver: Receiver<SimEvent>,
    capacity: usize,
    dropped: AtomicU64,
}

impl EventOutbox {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        Self {
            sender,
            receiver,
            capacity: capacity.max(1),
            dropped: AtomicU64::new(0),
        }
    }

    /// Publish without blocking
    ///
    /// Returns false if the event was dropped.
    #[inline]
    pub fn publish(&self, event: SimEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Receiver handle for a consumer
    ///
    /// Handles share one queue: each event goes to exactly one of them.
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.receiver.clone(),
        }
    }

    /// Discard anything still queued
    pub fn clear(&self) {
        while self.receiver.try_recv().is_ok() {}
    }

    #[inline]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventOutbox {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

#[derive(Clone)]
pub struct EventReceiver {
    receiver: Receiver<SimEvent>,
}

impl EventReceiver {
    /// Take everything queued right now
    pub fn drain(&self) -> Vec<SimEvent> {
        self.receiver.try_iter().collect()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}
