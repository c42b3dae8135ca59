#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Keyed object pool that recycles inactive entity instances.
//!
//! Instances live in a dense arena addressed by [`InstanceId`] and are never
//! dropped while the pool exists. Each template key owns a FIFO bucket of
//! inactive instances; acquiring dequeues from the bucket and falls back to a
//! fresh allocation, releasing runs the cleanup hook and queues the instance
//! back into the bucket of the template it was created from.

use std::{
    collections::{HashMap, VecDeque},
    hash::Hash,
};

use fuel_run_core::{InstanceId, Placement};
use log::debug;
use thiserror::Error;

mod lifecycle;

pub use lifecycle::LifecycleObserver;

/// Lifecycle hooks every pooled entity implements.
pub trait Pooled {
    /// Moves the entity to the placement and resets it into a fully active state.
    fn on_spawned(&mut self, placement: Placement);

    /// Tears down the entity's active state before it is queued for reuse.
    fn on_despawned(&mut self);
}

/// Reasons [`Pool::release`] refuses to retire an instance.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ReleaseError {
    /// The identifier was never issued by this pool.
    #[error("instance {0:?} was not issued by this pool")]
    UnknownInstance(InstanceId),
    /// The instance is already inactive.
    #[error("instance {0:?} is not active")]
    NotActive(InstanceId),
    /// The caller named a template the instance was not created from.
    #[error("instance {0:?} does not belong to the requested template")]
    TemplateMismatch(InstanceId),
}

/// Reasons [`Pool::observe`] refuses to arm a lifecycle observer.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ObserveError {
    /// The identifier was never issued by this pool.
    #[error("instance {0:?} was not issued by this pool")]
    UnknownInstance(InstanceId),
    /// Only active instances can be observed.
    #[error("instance {0:?} is not active")]
    NotActive(InstanceId),
    /// A lifecycle observer is already armed for the current activation.
    #[error("instance {0:?} already has an armed lifecycle observer")]
    AlreadyObserved(InstanceId),
}

/// Outcome of [`Pool::acquire`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Acquired {
    /// Instance that is now active.
    pub instance: InstanceId,
    /// Whether the instance was dequeued rather than freshly allocated.
    pub reused: bool,
}

/// Outcome of a successful [`Pool::release`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Released<K, O> {
    /// Template whose bucket received the instance.
    pub template: K,
    /// Token of the lifecycle observer armed for the finished activation.
    pub observer: Option<O>,
}

#[derive(Debug)]
struct Slot<K, T, O> {
    template: K,
    active: bool,
    entity: T,
    observer: LifecycleObserver<O>,
}

/// Arena-backed pool of reusable entities keyed by template.
#[derive(Debug)]
pub struct Pool<K, T, O> {
    slots: Vec<Slot<K, T, O>>,
    buckets: HashMap<K, VecDeque<InstanceId>>,
}

impl<K, T, O> Default for Pool<K, T, O>
where
    K: Clone + Eq + Hash,
    T: Pooled,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, T, O> Pool<K, T, O>
where
    K: Clone + Eq + Hash,
    T: Pooled,
{
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            buckets: HashMap::new(),
        }
    }

    /// Allocates `count` inactive instances and queues them into the template's bucket.
    ///
    /// Calling this repeatedly keeps adding instances. The `create` closure must
    /// produce entities in their inactive state.
    pub fn prewarm<F>(&mut self, template: K, count: usize, mut create: F) -> Vec<InstanceId>
    where
        F: FnMut(&K) -> T,
    {
        let mut created = Vec::with_capacity(count);
        for _ in 0..count {
            let entity = create(&template);
            let instance = self.insert(template.clone(), entity);
            self.buckets
                .entry(template.clone())
                .or_default()
                .push_back(instance);
            created.push(instance);
        }
        created
    }

    /// Hands out an active instance of the template at the placement.
    ///
    /// A queued instance is preferred; an empty bucket falls back to `create`.
    /// Either way the reset hook has run before this returns.
    pub fn acquire<F>(&mut self, template: &K, placement: Placement, create: F) -> Acquired
    where
        F: FnOnce(&K) -> T,
    {
        let queued = self.buckets.get_mut(template).and_then(VecDeque::pop_front);
        let (instance, reused) = match queued {
            Some(instance) => (instance, true),
            None => {
                let instance = self.insert(template.clone(), create(template));
                debug!("bucket empty, allocated fresh instance {instance:?}");
                (instance, false)
            }
        };

        let slot = &mut self.slots[slot_index(instance)];
        debug_assert!(!slot.active, "queued instance {instance:?} was active");
        slot.active = true;
        let _ = slot.observer.disarm();
        slot.entity.on_spawned(placement);

        Acquired { instance, reused }
    }

    /// Runs the cleanup hook, deactivates the instance and queues it for reuse.
    ///
    /// The bucket is always the template the instance was created from. Passing
    /// `Some(template)` asserts that origin and is rejected when it disagrees.
    pub fn release(
        &mut self,
        instance: InstanceId,
        template: Option<&K>,
    ) -> Result<Released<K, O>, ReleaseError> {
        let slot = self
            .slots
            .get_mut(slot_index(instance))
            .ok_or(ReleaseError::UnknownInstance(instance))?;

        if !slot.active {
            return Err(ReleaseError::NotActive(instance));
        }

        if let Some(expected) = template {
            if *expected != slot.template {
                return Err(ReleaseError::TemplateMismatch(instance));
            }
        }

        slot.entity.on_despawned();
        slot.active = false;
        let observer = slot.observer.fire();
        self.buckets
            .entry(slot.template.clone())
            .or_default()
            .push_back(instance);

        Ok(Released {
            template: slot.template.clone(),
            observer,
        })
    }

    /// Arms the lifecycle observer of an active instance with the token.
    pub fn observe(&mut self, instance: InstanceId, token: O) -> Result<(), ObserveError> {
        let slot = self
            .slots
            .get_mut(slot_index(instance))
            .ok_or(ObserveError::UnknownInstance(instance))?;

        if !slot.active {
            return Err(ObserveError::NotActive(instance));
        }

        if slot.observer.is_armed() {
            return Err(ObserveError::AlreadyObserved(instance));
        }

        let _ = slot.observer.arm(token);
        Ok(())
    }

    /// Returns the entity stored for the instance.
    #[must_use]
    pub fn get(&self, instance: InstanceId) -> Option<&T> {
        self.slots.get(slot_index(instance)).map(|slot| &slot.entity)
    }

    /// Returns mutable access to the entity stored for the instance.
    pub fn get_mut(&mut self, instance: InstanceId) -> Option<&mut T> {
        self.slots
            .get_mut(slot_index(instance))
            .map(|slot| &mut slot.entity)
    }

    /// Reports whether the instance is currently active in the world.
    #[must_use]
    pub fn is_active(&self, instance: InstanceId) -> bool {
        self.slots
            .get(slot_index(instance))
            .is_some_and(|slot| slot.active)
    }

    /// Template the instance was created from.
    #[must_use]
    pub fn template_of(&self, instance: InstanceId) -> Option<&K> {
        self.slots
            .get(slot_index(instance))
            .map(|slot| &slot.template)
    }

    /// Number of inactive instances queued for the template.
    #[must_use]
    pub fn idle_count(&self, template: &K) -> usize {
        self.buckets.get(template).map_or(0, VecDeque::len)
    }

    /// Number of instances currently active across all templates.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.active).count()
    }

    /// Total number of instances ever allocated.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Reports whether the pool has never allocated an instance.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterates active instances in allocation order.
    pub fn iter_active(&self) -> impl Iterator<Item = (InstanceId, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.active)
            .map(|(index, slot)| (InstanceId::new(index as u32), &slot.entity))
    }

    /// Iterates active instances mutably in allocation order.
    pub fn iter_active_mut(&mut self) -> impl Iterator<Item = (InstanceId, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter(|(_, slot)| slot.active)
            .map(|(index, slot)| (InstanceId::new(index as u32), &mut slot.entity))
    }

    fn insert(&mut self, template: K, entity: T) -> InstanceId {
        let instance = InstanceId::new(self.slots.len() as u32);
        self.slots.push(Slot {
            template,
            active: false,
            entity,
            observer: LifecycleObserver::new(),
        });
        instance
    }
}

fn slot_index(instance: InstanceId) -> usize {
    instance.get() as usize
}
