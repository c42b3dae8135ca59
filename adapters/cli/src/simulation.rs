//! Headless game loop that drives the world and spawning system at a fixed step.

use std::{fmt, time::Duration};

use anyhow::{ensure, Result};
use fuel_run_core::{
    deliver_fuel, Blueprint, Command, ConsumerId, EntityKind, Event, FuelReceiver, TemplateId,
    Vec3,
};
use fuel_run_system_spawning::Spawning;
use fuel_run_world::{self as world, query, HostileState, InstanceState, PickupState, World};
use log::{debug, info};

use crate::scenario::{self, Scenario};

const VEHICLE: ConsumerId = ConsumerId::new(0);

/// Vehicle fuel tank that drains over time and accepts pickups until it runs dry.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct FuelTank {
    level: f32,
    capacity: f32,
    drain_per_second: f32,
    empty: bool,
}

impl FuelTank {
    /// Creates a full tank that drains completely in `time_to_empty`.
    pub(crate) fn new(capacity: f32, time_to_empty: Duration) -> Self {
        let secs = time_to_empty.as_secs_f32();
        Self {
            level: capacity,
            capacity,
            drain_per_second: if secs > 0.0 { capacity / secs } else { capacity },
            empty: false,
        }
    }

    /// Burns fuel for `dt`, returning `true` on the step the tank runs dry.
    pub(crate) fn burn(&mut self, dt: Duration) -> bool {
        if self.is_empty() {
            return false;
        }

        let burnt = self.drain_per_second * dt.as_secs_f32();
        self.level = (self.level - burnt).clamp(0.0, self.capacity);
        if self.level <= 0.0 {
            self.empty = true;
            return true;
        }
        false
    }

    pub(crate) fn level(&self) -> f32 {
        self.level
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.empty
    }
}

impl FuelReceiver for FuelTank {
    fn consumer_id(&self) -> ConsumerId {
        VEHICLE
    }

    fn add_fuel(&mut self, amount: f32) {
        if self.empty {
            return;
        }
        self.level = (self.level + amount).clamp(0.0, self.capacity);
    }
}

/// Scripted driver that circles the arena and collides with whatever it passes.
#[derive(Clone, Copy, Debug)]
struct Vehicle {
    route_radius: f32,
    speed: f32,
    contact_radius: f32,
    force_multiplier: f32,
    travelled: f32,
}

impl Vehicle {
    fn position(&self) -> Vec3 {
        if self.route_radius <= 0.0 {
            return Vec3::ZERO;
        }
        let angle = self.travelled / self.route_radius;
        Vec3::new(angle.cos(), 0.0, angle.sin()) * self.route_radius
    }

    fn touches(&self, target: Vec3) -> bool {
        let offset = target - self.position();
        Vec3::new(offset.x, 0.0, offset.z).length() <= self.contact_radius
    }
}

/// Tallies reported at the end of a run.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Summary {
    pub(crate) elapsed: Duration,
    pub(crate) hostiles_spawned: usize,
    pub(crate) pickups_spawned: usize,
    pub(crate) reused_spawns: usize,
    pub(crate) knockbacks: usize,
    pub(crate) pickups_collected: usize,
    pub(crate) fuel_collected: f32,
    pub(crate) retirements: usize,
    pub(crate) rejections: usize,
    pub(crate) peak_hostiles: usize,
    pub(crate) peak_pickups: usize,
    pub(crate) allocated: usize,
    pub(crate) fuel_remaining: f32,
    pub(crate) out_of_fuel_at: Option<Duration>,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "simulated {:.1}s", self.elapsed.as_secs_f32())?;
        writeln!(
            f,
            "hostiles spawned: {} (peak {})",
            self.hostiles_spawned, self.peak_hostiles
        )?;
        writeln!(
            f,
            "pickups spawned: {} (peak {})",
            self.pickups_spawned, self.peak_pickups
        )?;
        writeln!(
            f,
            "instances allocated: {} ({} spawns reused a pooled instance)",
            self.allocated, self.reused_spawns
        )?;
        writeln!(f, "knockbacks: {}", self.knockbacks)?;
        writeln!(
            f,
            "pickups collected: {} ({:.1} fuel)",
            self.pickups_collected, self.fuel_collected
        )?;
        writeln!(f, "retirements: {}", self.retirements)?;
        writeln!(f, "rejections: {}", self.rejections)?;
        match self.out_of_fuel_at {
            Some(at) => write!(f, "out of fuel at {:.1}s", at.as_secs_f32()),
            None => write!(f, "fuel remaining: {:.1}", self.fuel_remaining),
        }
    }
}

/// Owns the world, the spawning system and the scripted vehicle.
#[derive(Debug)]
pub(crate) struct Simulation {
    world: World,
    spawning: Spawning,
    tank: FuelTank,
    vehicle: Vehicle,
    stop_after: Option<Duration>,
    summary: Summary,
}

impl Simulation {
    /// Sets up templates, terrain and pools, then enables spawning.
    pub(crate) fn new(scenario: &Scenario, stop_after: Option<Duration>) -> Result<Self> {
        let config = scenario.spawning_config()?;
        let time_to_empty =
            scenario::seconds(scenario.vehicle.time_to_empty_secs, "time_to_empty_secs")?;
        ensure!(
            scenario.vehicle.contact_radius >= 0.0,
            "vehicle contact_radius must not be negative"
        );

        let mut simulation = Self {
            world: World::new(),
            spawning: Spawning::new(config),
            tank: FuelTank::new(scenario.vehicle.fuel_capacity, time_to_empty),
            vehicle: Vehicle {
                route_radius: scenario.vehicle.route_radius,
                speed: scenario.vehicle.speed,
                contact_radius: scenario.vehicle.contact_radius,
                force_multiplier: scenario.hostile.force_multiplier,
                travelled: 0.0,
            },
            stop_after,
            summary: Summary::default(),
        };

        simulation.submit(Command::RegisterTemplate {
            template: TemplateId::HOSTILE,
            blueprint: Blueprint::Hostile(scenario.hostile_tuning()?),
        });
        simulation.submit(Command::RegisterTemplate {
            template: TemplateId::PICKUP,
            blueprint: Blueprint::Pickup(scenario.pickup_tuning()),
        });
        simulation.submit(Command::ConfigureTerrain {
            surfaces: scenario.terrain.clone(),
        });

        let mut prewarm = Vec::new();
        simulation.spawning.prewarm_commands(&mut prewarm);
        for command in prewarm {
            simulation.submit(command);
        }

        simulation.submit(Command::StartSpawning);
        Ok(simulation)
    }

    /// Runs fixed steps until `duration` of simulated time has elapsed.
    pub(crate) fn run(&mut self, duration: Duration, step: Duration) -> Result<Summary> {
        ensure!(!step.is_zero(), "simulation step must be positive");

        while query::elapsed(&self.world) < duration {
            let remaining = duration - query::elapsed(&self.world);
            self.step(step.min(remaining));
        }

        Ok(self.summary())
    }

    /// Advances the simulation by one step.
    pub(crate) fn step(&mut self, dt: Duration) {
        self.submit(Command::Tick { dt });

        self.vehicle.travelled += self.vehicle.speed * dt.as_secs_f32();
        self.collide();

        if self.tank.burn(dt) {
            let at = query::elapsed(&self.world);
            info!("vehicle ran out of fuel at {:.1}s", at.as_secs_f32());
            self.summary.out_of_fuel_at = Some(at);
            self.submit(Command::StopSpawning);
        }

        if let Some(stop_after) = self.stop_after {
            if query::elapsed(&self.world) >= stop_after && query::is_spawning(&self.world) {
                info!("stopping spawns at {:.1}s", stop_after.as_secs_f32());
                self.submit(Command::StopSpawning);
                self.stop_after = None;
            }
        }
    }

    /// Snapshot of the tallies so far.
    pub(crate) fn summary(&self) -> Summary {
        Summary {
            elapsed: query::elapsed(&self.world),
            allocated: query::allocated_count(&self.world),
            fuel_remaining: self.tank.level(),
            ..self.summary.clone()
        }
    }

    fn collide(&mut self) {
        let vehicle_position = self.vehicle.position();
        let contacts: Vec<Command> = query::active_instances(&self.world)
            .into_iter()
            .filter(|snapshot| {
                snapshot.collision_enabled && self.vehicle.touches(snapshot.placement.position)
            })
            .filter_map(|snapshot| match snapshot.state {
                InstanceState::Hostile {
                    state: HostileState::Idle,
                    ..
                } => Some(Command::ApplyKnockback {
                    instance: snapshot.id,
                    direction: snapshot.placement.position - vehicle_position,
                    force_multiplier: self.vehicle.force_multiplier,
                }),
                InstanceState::Pickup {
                    state: PickupState::Floating,
                } => Some(Command::PickupContact {
                    instance: snapshot.id,
                    consumer: self.tank.consumer_id(),
                }),
                _ => None,
            })
            .collect();

        for command in contacts {
            self.submit(command);
        }
    }

    fn submit(&mut self, command: Command) {
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);

        loop {
            if events.is_empty() {
                break;
            }

            let _ = deliver_fuel(&events, &mut self.tank);
            self.record(&events);

            let mut commands = Vec::new();
            self.spawning
                .handle(&events, &query::surface(&self.world), &mut commands);

            if commands.is_empty() {
                break;
            }

            events.clear();

            for command in commands {
                world::apply(&mut self.world, command, &mut events);
            }
        }

        self.summary.peak_hostiles = self
            .summary
            .peak_hostiles
            .max(self.spawning.active_count(EntityKind::Hostile));
        self.summary.peak_pickups = self
            .summary
            .peak_pickups
            .max(self.spawning.active_count(EntityKind::Pickup));
    }

    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::InstanceSpawned {
                    instance,
                    template,
                    reused,
                    ..
                } => {
                    debug!("{template:?} instance {instance:?} spawned");
                    if *template == TemplateId::HOSTILE {
                        self.summary.hostiles_spawned += 1;
                    } else {
                        self.summary.pickups_spawned += 1;
                    }
                    if *reused {
                        self.summary.reused_spawns += 1;
                    }
                }
                Event::HostileKnocked { .. } => self.summary.knockbacks += 1,
                Event::FuelDelivered {
                    consumer, amount, ..
                } if *consumer == VEHICLE => {
                    self.summary.pickups_collected += 1;
                    self.summary.fuel_collected += *amount;
                }
                Event::InstanceRetired { .. } => self.summary.retirements += 1,
                Event::SpawnRejected { .. } | Event::ReleaseRejected { .. } => {
                    self.summary.rejections += 1;
                }
                _ => {}
            }
        }
    }
}
