//! TOML scenario describing spawn loops, entity tuning, terrain and the scripted vehicle.

use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use fuel_run_core::{HostileTuning, PickupTuning, SurfacePatch, Vec3};
use fuel_run_system_spawning::{CategoryConfig, Config};
use serde::Deserialize;

const HOSTILE_ANCHORS: [[f32; 3]; 4] = [
    [12.0, 0.0, 0.0],
    [0.0, 0.0, 12.0],
    [-12.0, 0.0, 0.0],
    [0.0, 0.0, -12.0],
];
const PICKUP_ANCHORS: [[f32; 3]; 2] = [[8.5, 0.0, 8.5], [-8.5, 0.0, -8.5]];

/// Everything needed to set up one simulation run.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub(crate) struct Scenario {
    pub(crate) seed: u64,
    pub(crate) hostile: HostileSection,
    pub(crate) pickup: PickupSection,
    pub(crate) vehicle: VehicleSection,
    pub(crate) terrain: Vec<SurfacePatch>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            seed: 0x5eed_f0e1,
            hostile: HostileSection::default(),
            pickup: PickupSection::default(),
            vehicle: VehicleSection::default(),
            terrain: vec![SurfacePatch {
                min_x: -50.0,
                min_z: -50.0,
                max_x: 50.0,
                max_z: 50.0,
                height: 0.0,
            }],
        }
    }
}

impl Scenario {
    /// Reads and parses a scenario file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid scenario in {}", path.display()))
    }

    /// Parses scenario contents, filling every missing field with its default.
    pub(crate) fn parse(contents: &str) -> Result<Self> {
        let scenario: Self =
            toml::from_str(contents).context("failed to parse scenario toml contents")?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Builds the spawning system configuration.
    pub(crate) fn spawning_config(&self) -> Result<Config> {
        let hostile = self
            .hostile
            .spawn
            .category(CategoryConfig::hostile(), &HOSTILE_ANCHORS)
            .context("invalid [hostile] section")?;
        let pickup = self
            .pickup
            .spawn
            .category(CategoryConfig::pickup(), &PICKUP_ANCHORS)
            .context("invalid [pickup] section")?;
        Ok(Config::new(hostile, pickup, self.seed))
    }

    /// Knockback parameters applied to every hostile.
    pub(crate) fn hostile_tuning(&self) -> Result<HostileTuning> {
        Ok(HostileTuning {
            knockback_force: self.hostile.knockback_force,
            knockback_duration: seconds(self.hostile.knockback_secs, "knockback_secs")?,
        })
    }

    /// Delivery and display parameters applied to every pickup.
    pub(crate) fn pickup_tuning(&self) -> PickupTuning {
        PickupTuning {
            fuel_amount: self.pickup.fuel_amount,
            rotation_speed: self.pickup.rotation_speed,
            float_amplitude: self.pickup.float_amplitude,
            float_frequency: self.pickup.float_frequency,
        }
    }

    fn validate(&self) -> Result<()> {
        for patch in &self.terrain {
            if patch.min_x > patch.max_x || patch.min_z > patch.max_z {
                bail!("terrain patch {patch:?} has inverted bounds");
            }
        }
        if self.vehicle.fuel_capacity <= 0.0 {
            bail!("vehicle fuel_capacity must be positive");
        }
        if self.vehicle.time_to_empty_secs <= 0.0 {
            bail!("vehicle time_to_empty_secs must be positive");
        }
        Ok(())
    }
}

/// Loop parameters shared by both entity categories.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub(crate) struct SpawnSection {
    pub(crate) interval_secs: Option<f32>,
    pub(crate) capacity: Option<usize>,
    pub(crate) spawn_radius: Option<f32>,
    pub(crate) min_separation: Option<f32>,
    pub(crate) max_attempts: Option<u32>,
    pub(crate) prewarm: Option<usize>,
    pub(crate) anchors: Option<Vec<[f32; 3]>>,
}

impl SpawnSection {
    fn category(
        &self,
        defaults: CategoryConfig,
        default_anchors: &[[f32; 3]],
    ) -> Result<CategoryConfig> {
        let interval = match self.interval_secs {
            Some(secs) => seconds(secs, "interval_secs")?,
            None => defaults.interval,
        };
        let spawn_radius = self.spawn_radius.unwrap_or(defaults.spawn_radius);
        let min_separation = self.min_separation.unwrap_or(defaults.min_separation);
        if spawn_radius < 0.0 || min_separation < 0.0 {
            bail!("spawn_radius and min_separation must not be negative");
        }

        let anchors = self.anchors.as_deref().unwrap_or(default_anchors);

        Ok(CategoryConfig {
            interval,
            capacity: self.capacity.unwrap_or(defaults.capacity),
            spawn_radius,
            min_separation,
            max_attempts: self.max_attempts.unwrap_or(defaults.max_attempts),
            prewarm: self.prewarm.unwrap_or(defaults.prewarm),
            ..defaults
        }
        .with_anchor_points(anchors.iter().copied().map(Vec3::from_array).collect()))
    }
}

/// `[hostile]` table.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub(crate) struct HostileSection {
    #[serde(flatten)]
    pub(crate) spawn: SpawnSection,
    pub(crate) knockback_force: f32,
    pub(crate) knockback_secs: f32,
    pub(crate) force_multiplier: f32,
}

impl Default for HostileSection {
    fn default() -> Self {
        let tuning = HostileTuning::default();
        Self {
            spawn: SpawnSection::default(),
            knockback_force: tuning.knockback_force,
            knockback_secs: tuning.knockback_duration.as_secs_f32(),
            force_multiplier: 1.0,
        }
    }
}

/// `[pickup]` table.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub(crate) struct PickupSection {
    #[serde(flatten)]
    pub(crate) spawn: SpawnSection,
    pub(crate) fuel_amount: f32,
    pub(crate) rotation_speed: f32,
    pub(crate) float_amplitude: f32,
    pub(crate) float_frequency: f32,
}

impl Default for PickupSection {
    fn default() -> Self {
        let tuning = PickupTuning::default();
        Self {
            spawn: SpawnSection::default(),
            fuel_amount: tuning.fuel_amount,
            rotation_speed: tuning.rotation_speed,
            float_amplitude: tuning.float_amplitude,
            float_frequency: tuning.float_frequency,
        }
    }
}

/// `[vehicle]` table: the scripted driver circling the arena.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub(crate) struct VehicleSection {
    pub(crate) route_radius: f32,
    pub(crate) speed: f32,
    pub(crate) contact_radius: f32,
    pub(crate) fuel_capacity: f32,
    pub(crate) time_to_empty_secs: f32,
}

impl Default for VehicleSection {
    fn default() -> Self {
        Self {
            route_radius: 12.0,
            speed: 8.0,
            contact_radius: 2.0,
            fuel_capacity: 100.0,
            time_to_empty_secs: 180.0,
        }
    }
}

/// Converts a configured number of seconds into a [`Duration`].
pub(crate) fn seconds(value: f32, field: &str) -> Result<Duration> {
    Duration::try_from_secs_f32(value)
        .with_context(|| format!("{field} must be a finite, non-negative number of seconds"))
}
