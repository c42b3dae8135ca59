#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system that keeps hostile and pickup populations topped up.
//!
//! Each entity category runs its own fixed-interval loop. A loop tick that
//! finds room below the category capacity picks the next anchor point in
//! round-robin order, samples a free position around it, and emits a
//! [`Command::Spawn`] carrying a fresh [`SpawnTicket`]. The ticket is the
//! handle the world hands back through [`Event::ObserverFired`] once the
//! instance retires, which is when the population record is dropped again.

use std::time::Duration;

use fuel_run_core::{
    Command, EntityKind, Event, Placement, SpawnTicket, SurfaceProbe, TemplateId, Vec3,
};
use log::debug;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

mod placement;

/// Spawn parameters of a single entity category.
#[derive(Clone, Debug, PartialEq)]
pub struct CategoryConfig {
    /// Template acquired for every spawn of the category.
    pub template: TemplateId,
    /// Time between two loop ticks.
    pub interval: Duration,
    /// Maximum number of simultaneously active instances.
    pub capacity: usize,
    /// Candidate spawn centers visited in round-robin order.
    pub anchor_points: Vec<Vec3>,
    /// Radius of the horizontal disc sampled around an anchor.
    pub spawn_radius: f32,
    /// Minimum distance kept from every active instance of the category.
    pub min_separation: f32,
    /// Number of candidates sampled before falling back to the anchor itself.
    pub max_attempts: u32,
    /// Instances allocated up front, bounded by `capacity`.
    pub prewarm: usize,
}

impl CategoryConfig {
    /// Default configuration of the hostile loop: every 3 s, at most 10 alive.
    #[must_use]
    pub fn hostile() -> Self {
        Self {
            template: TemplateId::HOSTILE,
            interval: Duration::from_secs(3),
            capacity: 10,
            prewarm: 10,
            ..Self::base()
        }
    }

    /// Default configuration of the pickup loop: every 10 s, at most 5 alive.
    #[must_use]
    pub fn pickup() -> Self {
        Self {
            template: TemplateId::PICKUP,
            interval: Duration::from_secs(10),
            capacity: 5,
            prewarm: 5,
            ..Self::base()
        }
    }

    /// Replaces the anchor points.
    #[must_use]
    pub fn with_anchor_points(mut self, anchor_points: Vec<Vec3>) -> Self {
        self.anchor_points = anchor_points;
        self
    }

    fn base() -> Self {
        Self {
            template: TemplateId::HOSTILE,
            interval: Duration::from_secs(3),
            capacity: 0,
            anchor_points: Vec::new(),
            spawn_radius: 2.0,
            min_separation: 1.5,
            max_attempts: 10,
            prewarm: 0,
        }
    }
}

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    hostile: CategoryConfig,
    pickup: CategoryConfig,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration from both category loops and a seed.
    #[must_use]
    pub const fn new(hostile: CategoryConfig, pickup: CategoryConfig, rng_seed: u64) -> Self {
        Self {
            hostile,
            pickup,
            rng_seed,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct SpawnRecord {
    ticket: SpawnTicket,
    position: Vec3,
}

#[derive(Debug)]
struct CategoryLoop {
    config: CategoryConfig,
    enabled: bool,
    until_next: Duration,
    next_anchor: usize,
    records: Vec<SpawnRecord>,
}

impl CategoryLoop {
    fn new(config: CategoryConfig) -> Self {
        Self {
            config,
            enabled: false,
            until_next: Duration::ZERO,
            next_anchor: 0,
            records: Vec::new(),
        }
    }

    /// Counts the loop ticks that fall within `dt`.
    fn resolve_ticks(&mut self, dt: Duration) -> usize {
        if !self.enabled {
            return 0;
        }

        let mut ticks = 0;
        let mut remaining = dt;
        while remaining >= self.until_next {
            remaining -= self.until_next;
            self.until_next = self.config.interval;
            ticks += 1;
            if self.config.interval.is_zero() {
                break;
            }
        }
        self.until_next = self.until_next.saturating_sub(remaining);
        ticks
    }

    fn has_room(&self) -> bool {
        self.records.len() < self.config.capacity && !self.config.anchor_points.is_empty()
    }

    fn next_anchor(&mut self) -> Vec3 {
        let anchors = &self.config.anchor_points;
        let anchor = anchors[self.next_anchor % anchors.len()];
        self.next_anchor = (self.next_anchor + 1) % anchors.len();
        anchor
    }

    fn positions(&self) -> Vec<Vec3> {
        self.records.iter().map(|record| record.position).collect()
    }

    fn forget(&mut self, ticket: SpawnTicket) -> bool {
        match self.records.iter().position(|record| record.ticket == ticket) {
            Some(index) => {
                let _ = self.records.remove(index);
                true
            }
            None => false,
        }
    }
}

/// Pure system that emits spawn commands for both entity categories.
#[derive(Debug)]
pub struct Spawning {
    hostile: CategoryLoop,
    pickup: CategoryLoop,
    rng: ChaCha8Rng,
    next_ticket: u64,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            hostile: CategoryLoop::new(config.hostile),
            pickup: CategoryLoop::new(config.pickup),
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            next_ticket: 0,
        }
    }

    /// Emits the warm-up requests for both category pools.
    pub fn prewarm_commands(&self, out: &mut Vec<Command>) {
        for category in [&self.hostile, &self.pickup] {
            let count = category.config.prewarm.min(category.config.capacity);
            if count > 0 {
                out.push(Command::Prewarm {
                    template: category.config.template,
                    count,
                });
            }
        }
    }

    /// Consumes events and the terrain view to emit spawn commands.
    pub fn handle<S>(&mut self, events: &[Event], surface: &S, out: &mut Vec<Command>)
    where
        S: SurfaceProbe + ?Sized,
    {
        for event in events {
            match event {
                Event::SpawningStarted => {
                    for kind in [EntityKind::Hostile, EntityKind::Pickup] {
                        self.tick(kind, surface, out);
                        let category = self.category_mut(kind);
                        category.enabled = true;
                        category.until_next = category.config.interval;
                    }
                }
                Event::SpawningStopped => {
                    self.hostile.enabled = false;
                    self.pickup.enabled = false;
                }
                Event::TimeAdvanced { dt } => {
                    for kind in [EntityKind::Hostile, EntityKind::Pickup] {
                        let ticks = self.category_mut(kind).resolve_ticks(*dt);
                        for _ in 0..ticks {
                            self.tick(kind, surface, out);
                        }
                    }
                }
                Event::ObserverFired { ticket, .. } => self.forget(*ticket),
                Event::SpawnRejected {
                    ticket: Some(ticket),
                    ..
                } => self.forget(*ticket),
                _ => {}
            }
        }
    }

    /// Number of instances of the category this system currently accounts for.
    #[must_use]
    pub fn active_count(&self, kind: EntityKind) -> usize {
        self.category(kind).records.len()
    }

    /// Recorded positions of the category's active instances, oldest first.
    #[must_use]
    pub fn active_positions(&self, kind: EntityKind) -> Vec<Vec3> {
        self.category(kind).positions()
    }

    /// Index of the anchor the category's next spawn will use.
    #[must_use]
    pub fn next_anchor_index(&self, kind: EntityKind) -> usize {
        self.category(kind).next_anchor
    }

    fn tick<S>(&mut self, kind: EntityKind, surface: &S, out: &mut Vec<Command>)
    where
        S: SurfaceProbe + ?Sized,
    {
        let category = match kind {
            EntityKind::Hostile => &mut self.hostile,
            EntityKind::Pickup => &mut self.pickup,
        };

        if !category.has_room() {
            debug!("{kind:?} tick skipped with {} active", category.records.len());
            return;
        }

        let anchor = category.next_anchor();
        let position = placement::sample_position(
            &mut self.rng,
            anchor,
            category.config.spawn_radius,
            category.config.min_separation,
            category.config.max_attempts,
            &category.positions(),
        );
        let placement = match kind {
            EntityKind::Hostile => Placement::at(position),
            EntityKind::Pickup => placement::settle_pickup(surface, position),
        };

        let ticket = SpawnTicket::new(self.next_ticket);
        self.next_ticket += 1;
        category.records.push(SpawnRecord {
            ticket,
            position: placement.position,
        });
        debug!("{kind:?} spawn {ticket:?} at {:?}", placement.position);

        out.push(Command::Spawn {
            template: category.config.template,
            placement,
            ticket: Some(ticket),
        });
    }

    fn forget(&mut self, ticket: SpawnTicket) {
        if !self.hostile.forget(ticket) && !self.pickup.forget(ticket) {
            debug!("no population record for {ticket:?}");
        }
    }

    fn category(&self, kind: EntityKind) -> &CategoryLoop {
        match kind {
            EntityKind::Hostile => &self.hostile,
            EntityKind::Pickup => &self.pickup,
        }
    }

    fn category_mut(&mut self, kind: EntityKind) -> &mut CategoryLoop {
        match kind {
            EntityKind::Hostile => &mut self.hostile,
            EntityKind::Pickup => &mut self.pickup,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(interval: Duration) -> CategoryLoop {
        let mut category = CategoryLoop::new(CategoryConfig {
            interval,
            ..CategoryConfig::hostile()
        });
        category.enabled = true;
        category.until_next = interval;
        category
    }

    #[test]
    fn resolves_ticks_across_partial_steps() {
        let mut category = category(Duration::from_secs(3));
        assert_eq!(category.resolve_ticks(Duration::from_secs(2)), 0);
        assert_eq!(category.resolve_ticks(Duration::from_secs(1)), 1);
        assert_eq!(category.resolve_ticks(Duration::from_secs(7)), 2);
        assert_eq!(category.until_next, Duration::from_secs(2));
    }

    #[test]
    fn zero_interval_ticks_once_per_step() {
        let mut category = category(Duration::ZERO);
        assert_eq!(category.resolve_ticks(Duration::from_secs(5)), 1);
    }

    #[test]
    fn disabled_loop_never_ticks() {
        let mut category = category(Duration::from_secs(1));
        category.enabled = false;
        assert_eq!(category.resolve_ticks(Duration::from_secs(10)), 0);
    }

    #[test]
    fn default_categories_bound_prewarm_by_capacity() {
        let hostile = CategoryConfig {
            capacity: 4,
            ..CategoryConfig::hostile()
        };
        let spawning = Spawning::new(Config::new(hostile, CategoryConfig::pickup(), 1));
        let mut commands = Vec::new();
        spawning.prewarm_commands(&mut commands);
        assert_eq!(
            commands,
            vec![
                Command::Prewarm {
                    template: TemplateId::HOSTILE,
                    count: 4,
                },
                Command::Prewarm {
                    template: TemplateId::PICKUP,
                    count: 5,
                },
            ]
        );
    }
}
