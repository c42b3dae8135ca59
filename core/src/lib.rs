#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Fuel Run engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! views, and respond exclusively with new command batches.

use std::time::Duration;

pub use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Registers the blueprint used whenever the template needs a fresh instance.
    RegisterTemplate {
        /// Template identity being registered.
        template: TemplateId,
        /// Description of the entity created for the template.
        blueprint: Blueprint,
    },
    /// Replaces the set of surfaces probed when settling entities onto the ground.
    ConfigureTerrain {
        /// Horizontal patches making up the terrain.
        surfaces: Vec<SurfacePatch>,
    },
    /// Allocates inactive instances up front and queues them for reuse.
    Prewarm {
        /// Template whose bucket receives the instances.
        template: TemplateId,
        /// Number of instances to allocate.
        count: usize,
    },
    /// Enables both spawn loops.
    StartSpawning,
    /// Halts future spawn decisions without retiring active instances.
    StopSpawning,
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Acquires an instance of the template and activates it at the placement.
    Spawn {
        /// Template to acquire an instance of.
        template: TemplateId,
        /// Position and orientation assigned to the instance.
        placement: Placement,
        /// Handle delivered once through [`Event::ObserverFired`] on retirement.
        ticket: Option<SpawnTicket>,
    },
    /// Retires an active instance back into its pool bucket.
    Release {
        /// Instance being retired.
        instance: InstanceId,
        /// Template the caller expects the instance to belong to.
        template: Option<TemplateId>,
    },
    /// Knocks a hostile actor away from a collision.
    ApplyKnockback {
        /// Hostile receiving the knockback.
        instance: InstanceId,
        /// Direction of the impulse; normalised by the world.
        direction: Vec3,
        /// Scale applied on top of the hostile's configured knockback force.
        force_multiplier: f32,
    },
    /// Reports that a fuel receiver touched a pickup.
    PickupContact {
        /// Pickup that was touched.
        instance: InstanceId,
        /// Receiver that should be credited with the pickup's fuel.
        consumer: ConsumerId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that spawning was enabled.
    SpawningStarted,
    /// Announces that spawning was disabled.
    SpawningStopped,
    /// Confirms that inactive instances were queued for the template.
    PoolPrewarmed {
        /// Template whose bucket grew.
        template: TemplateId,
        /// Number of instances that were allocated.
        count: usize,
    },
    /// Confirms that an instance became active in the world.
    InstanceSpawned {
        /// Instance that was activated.
        instance: InstanceId,
        /// Template the instance belongs to.
        template: TemplateId,
        /// Position and orientation assigned to the instance.
        placement: Placement,
        /// Whether the instance was dequeued rather than freshly allocated.
        reused: bool,
        /// Observer handle armed for the activation, if any.
        ticket: Option<SpawnTicket>,
    },
    /// Reports that a spawn request could not be honoured.
    SpawnRejected {
        /// Template requested by the spawn.
        template: TemplateId,
        /// Observer handle carried by the rejected request.
        ticket: Option<SpawnTicket>,
        /// Specific reason the spawn failed.
        reason: SpawnRejection,
    },
    /// Confirms that a hostile actor was knocked back.
    HostileKnocked {
        /// Hostile that was knocked.
        instance: InstanceId,
        /// Impulse applied to the hostile.
        impulse: Vec3,
    },
    /// Confirms that a pickup handed its fuel to a receiver.
    FuelDelivered {
        /// Pickup that was consumed.
        instance: InstanceId,
        /// Receiver credited with the fuel.
        consumer: ConsumerId,
        /// Amount of fuel delivered.
        amount: f32,
    },
    /// Confirms that an instance became inactive and returned to its bucket.
    InstanceRetired {
        /// Instance that was retired.
        instance: InstanceId,
        /// Bucket the instance was queued into.
        template: TemplateId,
    },
    /// Delivers the observer handle armed for an activation that just ended.
    ObserverFired {
        /// Instance that was retired.
        instance: InstanceId,
        /// Handle supplied when the instance was spawned.
        ticket: SpawnTicket,
    },
    /// Reports that a release request was rejected.
    ReleaseRejected {
        /// Instance targeted by the release.
        instance: InstanceId,
        /// Specific reason the release failed.
        reason: ReleaseRejection,
    },
}

/// Opaque identity of a class of spawnable entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemplateId(u32);

impl TemplateId {
    /// Template conventionally used for hostile actors.
    pub const HOSTILE: Self = Self(0);
    /// Template conventionally used for fuel pickups.
    pub const PICKUP: Self = Self(1);

    /// Creates a new template identity with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identity.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Arena index of a pooled instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u32);

impl InstanceId {
    /// Creates a new instance identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Scheduler-side handle associated with a single spawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpawnTicket(u64);

impl SpawnTicket {
    /// Creates a new ticket with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the ticket.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Identifies a receiver able to accept fuel from pickups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConsumerId(u32);

impl ConsumerId {
    /// Creates a new consumer identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Categories of spawnable entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Hostile actor that can be knocked back by the vehicle.
    Hostile,
    /// Floating pickup that refuels the vehicle.
    Pickup,
}

/// Position and orientation of an instance in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    /// World-space position.
    pub position: Vec3,
    /// World-space orientation.
    pub orientation: Quat,
}

impl Placement {
    /// Creates a placement from an explicit position and orientation.
    #[must_use]
    pub const fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Creates a placement at the position with the identity orientation.
    #[must_use]
    pub const fn at(position: Vec3) -> Self {
        Self::new(position, Quat::IDENTITY)
    }
}

/// Describes how a template is instantiated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Blueprint {
    /// Hostile actor with knockback parameters.
    Hostile(HostileTuning),
    /// Fuel pickup with delivery and display parameters.
    Pickup(PickupTuning),
}

impl Blueprint {
    /// Category of entity produced by the blueprint.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Hostile(_) => EntityKind::Hostile,
            Self::Pickup(_) => EntityKind::Pickup,
        }
    }
}

/// Knockback parameters of a hostile actor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HostileTuning {
    /// Impulse magnitude applied at a force multiplier of one.
    pub knockback_force: f32,
    /// Time a knocked hostile stays in the world before retiring.
    pub knockback_duration: Duration,
}

impl Default for HostileTuning {
    fn default() -> Self {
        Self {
            knockback_force: 30.0,
            knockback_duration: Duration::from_secs(2),
        }
    }
}

/// Delivery and display parameters of a fuel pickup.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PickupTuning {
    /// Fuel handed to the receiver on contact.
    pub fuel_amount: f32,
    /// Display spin around the vertical axis, in degrees per second.
    pub rotation_speed: f32,
    /// Height of the display bob.
    pub float_amplitude: f32,
    /// Angular frequency of the display bob.
    pub float_frequency: f32,
}

impl Default for PickupTuning {
    fn default() -> Self {
        Self {
            fuel_amount: 25.0,
            rotation_speed: 50.0,
            float_amplitude: 0.25,
            float_frequency: 2.0,
        }
    }
}

/// Horizontal rectangle of ground that entities can be settled onto.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SurfacePatch {
    /// Lower bound along the x axis.
    pub min_x: f32,
    /// Lower bound along the z axis.
    pub min_z: f32,
    /// Upper bound along the x axis.
    pub max_x: f32,
    /// Upper bound along the z axis.
    pub max_z: f32,
    /// Height of the patch.
    pub height: f32,
}

impl SurfacePatch {
    /// Reports whether the patch covers the horizontal coordinates.
    #[must_use]
    pub fn contains(&self, x: f32, z: f32) -> bool {
        x >= self.min_x && x <= self.max_x && z >= self.min_z && z <= self.max_z
    }
}

/// Read-only access to the ground beneath a point.
pub trait SurfaceProbe {
    /// Casts a ray straight down from `origin` and returns the first hit within
    /// `max_distance`, if any.
    fn probe_down(&self, origin: Vec3, max_distance: f32) -> Option<Vec3>;
}

/// Capability of anything that can be refuelled by a pickup.
pub trait FuelReceiver {
    /// Identifier used to address fuel deliveries to this receiver.
    fn consumer_id(&self) -> ConsumerId;

    /// Credits the receiver with the provided amount of fuel.
    fn add_fuel(&mut self, amount: f32);
}

/// Routes every fuel delivery addressed to the receiver, returning the total.
pub fn deliver_fuel<R>(events: &[Event], receiver: &mut R) -> f32
where
    R: FuelReceiver + ?Sized,
{
    let consumer_id = receiver.consumer_id();
    let mut delivered = 0.0;
    for event in events {
        if let Event::FuelDelivered {
            consumer, amount, ..
        } = event
        {
            if *consumer == consumer_id {
                receiver.add_fuel(*amount);
                delivered += *amount;
            }
        }
    }
    delivered
}

/// Reasons a spawn request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnRejection {
    /// No blueprint has been registered for the requested template.
    UnknownTemplate,
}

/// Reasons a release request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReleaseRejection {
    /// The pool never issued the instance.
    UnknownInstance,
    /// The instance is already inactive.
    NotActive,
    /// The supplied template differs from the instance's own template.
    TemplateMismatch,
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Tank {
        id: ConsumerId,
        fuel: f32,
        deliveries: usize,
    }

    impl FuelReceiver for Tank {
        fn consumer_id(&self) -> ConsumerId {
            self.id
        }

        fn add_fuel(&mut self, amount: f32) {
            self.fuel += amount;
            self.deliveries += 1;
        }
    }

    #[test]
    fn deliver_fuel_only_routes_matching_consumer() {
        let mut tank = Tank {
            id: ConsumerId::new(7),
            fuel: 10.0,
            deliveries: 0,
        };
        let events = vec![
            Event::TimeAdvanced {
                dt: Duration::from_millis(16),
            },
            Event::FuelDelivered {
                instance: InstanceId::new(1),
                consumer: ConsumerId::new(7),
                amount: 25.0,
            },
            Event::FuelDelivered {
                instance: InstanceId::new(2),
                consumer: ConsumerId::new(8),
                amount: 25.0,
            },
        ];

        let delivered = deliver_fuel(&events, &mut tank);

        assert!((delivered - 25.0).abs() < f32::EPSILON);
        assert!((tank.fuel - 35.0).abs() < f32::EPSILON);
        assert_eq!(tank.deliveries, 1);
    }

    #[test]
    fn surface_patch_bounds_are_inclusive() {
        let patch = SurfacePatch {
            min_x: -1.0,
            min_z: -1.0,
            max_x: 1.0,
            max_z: 1.0,
            height: 0.0,
        };
        assert!(patch.contains(1.0, -1.0));
        assert!(!patch.contains(1.5, 0.0));
    }

    #[test]
    fn blueprint_reports_entity_kind() {
        assert_eq!(
            Blueprint::Hostile(HostileTuning::default()).kind(),
            EntityKind::Hostile
        );
        assert_eq!(
            Blueprint::Pickup(PickupTuning::default()).kind(),
            EntityKind::Pickup
        );
    }

    #[test]
    fn default_tunings_match_game_balance() {
        let hostile = HostileTuning::default();
        assert!((hostile.knockback_force - 30.0).abs() < f32::EPSILON);
        assert_eq!(hostile.knockback_duration, Duration::from_secs(2));
        assert!((PickupTuning::default().fuel_amount - 25.0).abs() < f32::EPSILON);
    }
}
