#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Fuel Run.

use std::{collections::HashMap, mem, time::Duration};

use fuel_run_core::{
    Blueprint, Command, ConsumerId, EntityKind, Event, InstanceId, Placement, ReleaseRejection,
    SpawnRejection, SpawnTicket, TemplateId, Vec3,
};
use fuel_run_pool::{Pool, Pooled, ReleaseError};
use log::{debug, warn};

mod hostile;
mod pickup;
mod terrain;

pub use hostile::HostileState;
pub use pickup::PickupState;

use hostile::Hostile;
use pickup::Pickup;
use terrain::Terrain;

/// Represents the authoritative Fuel Run world state.
#[derive(Debug, Default)]
pub struct World {
    pool: Pool<TemplateId, Body, SpawnTicket>,
    blueprints: HashMap<TemplateId, Blueprint>,
    terrain: Terrain,
    spawning: bool,
    elapsed: Duration,
    deferred_releases: Vec<InstanceId>,
}

impl World {
    /// Creates an empty world with no templates, terrain, or instances.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.elapsed = self.elapsed.saturating_add(dt);
        out_events.push(Event::TimeAdvanced { dt });

        for instance in mem::take(&mut self.deferred_releases) {
            let awaiting = self.pool.is_active(instance)
                && matches!(self.pool.get(instance), Some(Body::Pickup(pickup)) if pickup.is_consumed());
            if awaiting {
                self.retire(instance, None, out_events);
            }
        }

        let expired: Vec<InstanceId> = self
            .pool
            .iter_active_mut()
            .filter_map(|(instance, body)| match body {
                Body::Hostile(hostile) => hostile.advance(dt).then_some(instance),
                Body::Pickup(pickup) => {
                    pickup.animate(dt);
                    None
                }
            })
            .collect();

        for instance in expired {
            debug!("hostile {instance:?} finished its knockback");
            self.retire(instance, None, out_events);
        }
    }

    fn spawn(
        &mut self,
        template: TemplateId,
        placement: Placement,
        ticket: Option<SpawnTicket>,
        out_events: &mut Vec<Event>,
    ) {
        let Some(blueprint) = self.blueprints.get(&template).copied() else {
            warn!("spawn requested for unregistered template {template:?}");
            out_events.push(Event::SpawnRejected {
                template,
                ticket,
                reason: SpawnRejection::UnknownTemplate,
            });
            return;
        };

        let acquired = self
            .pool
            .acquire(&template, placement, |_| Body::from_blueprint(blueprint));

        if let Some(ticket) = ticket {
            if let Err(error) = self.pool.observe(acquired.instance, ticket) {
                warn!("failed to observe spawned instance: {error}");
            }
        }

        out_events.push(Event::InstanceSpawned {
            instance: acquired.instance,
            template,
            placement,
            reused: acquired.reused,
            ticket,
        });
    }

    fn retire(
        &mut self,
        instance: InstanceId,
        template: Option<TemplateId>,
        out_events: &mut Vec<Event>,
    ) {
        match self.pool.release(instance, template.as_ref()) {
            Ok(released) => {
                out_events.push(Event::InstanceRetired {
                    instance,
                    template: released.template,
                });
                if let Some(ticket) = released.observer {
                    out_events.push(Event::ObserverFired { instance, ticket });
                }
            }
            Err(error) => {
                warn!("release rejected: {error}");
                out_events.push(Event::ReleaseRejected {
                    instance,
                    reason: release_rejection(error),
                });
            }
        }
    }

    fn knock(
        &mut self,
        instance: InstanceId,
        direction: Vec3,
        force_multiplier: f32,
        out_events: &mut Vec<Event>,
    ) {
        let Some(Body::Hostile(hostile)) = self.pool.get_mut(instance) else {
            debug!("knockback ignored for non-hostile {instance:?}");
            return;
        };

        match hostile.apply_knockback(direction, force_multiplier) {
            Some(impulse) => out_events.push(Event::HostileKnocked { instance, impulse }),
            None => debug!("knockback ignored for {instance:?} in state {:?}", hostile.state()),
        }
    }

    fn touch_pickup(
        &mut self,
        instance: InstanceId,
        consumer: ConsumerId,
        out_events: &mut Vec<Event>,
    ) {
        let Some(Body::Pickup(pickup)) = self.pool.get_mut(instance) else {
            debug!("contact ignored for non-pickup {instance:?}");
            return;
        };

        if let Some(amount) = pickup.contact() {
            out_events.push(Event::FuelDelivered {
                instance,
                consumer,
                amount,
            });
            self.deferred_releases.push(instance);
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::RegisterTemplate {
            template,
            blueprint,
        } => {
            let _ = world.blueprints.insert(template, blueprint);
        }
        Command::ConfigureTerrain { surfaces } => {
            world.terrain = Terrain::new(surfaces);
        }
        Command::Prewarm { template, count } => {
            let Some(blueprint) = world.blueprints.get(&template).copied() else {
                warn!("prewarm requested for unregistered template {template:?}");
                return;
            };
            let created = world
                .pool
                .prewarm(template, count, |_| Body::from_blueprint(blueprint));
            out_events.push(Event::PoolPrewarmed {
                template,
                count: created.len(),
            });
        }
        Command::StartSpawning => {
            if !world.spawning {
                world.spawning = true;
                out_events.push(Event::SpawningStarted);
            }
        }
        Command::StopSpawning => {
            if world.spawning {
                world.spawning = false;
                out_events.push(Event::SpawningStopped);
            }
        }
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::Spawn {
            template,
            placement,
            ticket,
        } => world.spawn(template, placement, ticket, out_events),
        Command::Release { instance, template } => world.retire(instance, template, out_events),
        Command::ApplyKnockback {
            instance,
            direction,
            force_multiplier,
        } => world.knock(instance, direction, force_multiplier, out_events),
        Command::PickupContact { instance, consumer } => {
            world.touch_pickup(instance, consumer, out_events);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use fuel_run_core::{InstanceId, SurfaceProbe, TemplateId, Vec3};

    use super::{terrain::Terrain, InstanceSnapshot, World};

    /// Reports whether the spawn loops are currently enabled.
    #[must_use]
    pub fn is_spawning(world: &World) -> bool {
        world.spawning
    }

    /// Total simulated time the world has advanced through.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }

    /// Captures the state of a single instance, active or not.
    #[must_use]
    pub fn instance(world: &World, instance: InstanceId) -> Option<InstanceSnapshot> {
        let body = world.pool.get(instance)?;
        let template = world.pool.template_of(instance).copied()?;
        Some(body.snapshot(instance, template, world.pool.is_active(instance)))
    }

    /// Captures every active instance in allocation order.
    #[must_use]
    pub fn active_instances(world: &World) -> Vec<InstanceSnapshot> {
        world
            .pool
            .iter_active()
            .filter_map(|(instance, body)| {
                let template = world.pool.template_of(instance).copied()?;
                Some(body.snapshot(instance, template, true))
            })
            .collect()
    }

    /// Number of inactive instances queued for the template.
    #[must_use]
    pub fn idle_count(world: &World, template: TemplateId) -> usize {
        world.pool.idle_count(&template)
    }

    /// Total number of instances allocated since the world was created.
    #[must_use]
    pub fn allocated_count(world: &World) -> usize {
        world.pool.len()
    }

    /// Exposes the terrain as a downward probe.
    #[must_use]
    pub fn surface(world: &World) -> SurfaceView<'_> {
        SurfaceView {
            terrain: &world.terrain,
        }
    }

    /// Read-only view of the terrain surfaces.
    #[derive(Clone, Copy, Debug)]
    pub struct SurfaceView<'a> {
        terrain: &'a Terrain,
    }

    impl SurfaceProbe for SurfaceView<'_> {
        fn probe_down(&self, origin: Vec3, max_distance: f32) -> Option<Vec3> {
            self.terrain.probe_down(origin, max_distance)
        }
    }
}

/// Immutable representation of a single instance used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InstanceSnapshot {
    /// Identifier of the instance.
    pub id: InstanceId,
    /// Template the instance was created from.
    pub template: TemplateId,
    /// Whether the instance is currently active in the world.
    pub active: bool,
    /// Current position and orientation.
    pub placement: Placement,
    /// Whether the instance currently takes part in collisions.
    pub collision_enabled: bool,
    /// Category-specific state.
    pub state: InstanceState,
}

impl InstanceSnapshot {
    /// Category of the instance.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self.state {
            InstanceState::Hostile { .. } => EntityKind::Hostile,
            InstanceState::Pickup { .. } => EntityKind::Pickup,
        }
    }
}

/// Category-specific state captured by an [`InstanceSnapshot`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InstanceState {
    /// State of a hostile actor.
    Hostile {
        /// Phase of the knockback state machine.
        state: HostileState,
        /// Velocity imparted by the last knockback.
        velocity: Vec3,
    },
    /// State of a fuel pickup.
    Pickup {
        /// Phase of the pickup state machine.
        state: PickupState,
    },
}

#[derive(Clone, Debug)]
enum Body {
    Hostile(Hostile),
    Pickup(Pickup),
}

impl Body {
    fn from_blueprint(blueprint: Blueprint) -> Self {
        match blueprint {
            Blueprint::Hostile(tuning) => Self::Hostile(Hostile::new(tuning)),
            Blueprint::Pickup(tuning) => Self::Pickup(Pickup::new(tuning)),
        }
    }

    fn snapshot(&self, id: InstanceId, template: TemplateId, active: bool) -> InstanceSnapshot {
        let (placement, collision_enabled, state) = match self {
            Self::Hostile(hostile) => (
                hostile.placement(),
                hostile.collision_enabled(),
                InstanceState::Hostile {
                    state: hostile.state(),
                    velocity: hostile.velocity(),
                },
            ),
            Self::Pickup(pickup) => (
                pickup.placement(),
                pickup.collision_enabled(),
                InstanceState::Pickup {
                    state: pickup.state(),
                },
            ),
        };

        InstanceSnapshot {
            id,
            template,
            active,
            placement,
            collision_enabled,
            state,
        }
    }
}

impl Pooled for Body {
    fn on_spawned(&mut self, placement: Placement) {
        match self {
            Self::Hostile(hostile) => hostile.on_spawned(placement),
            Self::Pickup(pickup) => pickup.on_spawned(placement),
        }
    }

    fn on_despawned(&mut self) {
        match self {
            Self::Hostile(hostile) => hostile.on_despawned(),
            Self::Pickup(pickup) => pickup.on_despawned(),
        }
    }
}

fn release_rejection(error: ReleaseError) -> ReleaseRejection {
    match error {
        ReleaseError::UnknownInstance(_) => ReleaseRejection::UnknownInstance,
        ReleaseError::NotActive(_) => ReleaseRejection::NotActive,
        ReleaseError::TemplateMismatch(_) => ReleaseRejection::TemplateMismatch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fuel_run_core::{HostileTuning, PickupTuning};

    fn world_with_templates() -> World {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::RegisterTemplate {
                template: TemplateId::HOSTILE,
                blueprint: Blueprint::Hostile(HostileTuning::default()),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::RegisterTemplate {
                template: TemplateId::PICKUP,
                blueprint: Blueprint::Pickup(PickupTuning::default()),
            },
            &mut events,
        );
        assert!(events.is_empty());
        world
    }

    #[test]
    fn spawning_toggle_only_reports_changes() {
        let mut world = World::new();
        let mut events = Vec::new();

        apply(&mut world, Command::StartSpawning, &mut events);
        apply(&mut world, Command::StartSpawning, &mut events);
        apply(&mut world, Command::StopSpawning, &mut events);
        apply(&mut world, Command::StopSpawning, &mut events);

        assert_eq!(events, vec![Event::SpawningStarted, Event::SpawningStopped]);
        assert!(!query::is_spawning(&world));
    }

    #[test]
    fn unknown_template_spawn_is_rejected() {
        let mut world = World::new();
        let mut events = Vec::new();
        let ticket = Some(SpawnTicket::new(3));

        apply(
            &mut world,
            Command::Spawn {
                template: TemplateId::new(99),
                placement: Placement::at(Vec3::ZERO),
                ticket,
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::SpawnRejected {
                template: TemplateId::new(99),
                ticket,
                reason: SpawnRejection::UnknownTemplate,
            }]
        );
        assert_eq!(query::allocated_count(&world), 0);
    }

    #[test]
    fn prewarm_of_unregistered_template_is_ignored() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Prewarm {
                template: TemplateId::HOSTILE,
                count: 4,
            },
            &mut events,
        );
        assert!(events.is_empty());
        assert_eq!(query::idle_count(&world, TemplateId::HOSTILE), 0);
    }

    #[test]
    fn release_of_inactive_instance_is_reported() {
        let mut world = world_with_templates();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Prewarm {
                template: TemplateId::PICKUP,
                count: 1,
            },
            &mut events,
        );
        events.clear();

        apply(
            &mut world,
            Command::Release {
                instance: InstanceId::new(0),
                template: None,
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::ReleaseRejected {
                instance: InstanceId::new(0),
                reason: ReleaseRejection::NotActive,
            }]
        );
    }

    #[test]
    fn knockback_against_pickup_is_ignored() {
        let mut world = world_with_templates();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Spawn {
                template: TemplateId::PICKUP,
                placement: Placement::at(Vec3::ZERO),
                ticket: None,
            },
            &mut events,
        );
        events.clear();

        apply(
            &mut world,
            Command::ApplyKnockback {
                instance: InstanceId::new(0),
                direction: Vec3::X,
                force_multiplier: 1.0,
            },
            &mut events,
        );

        assert!(events.is_empty());
    }
}
