//! Floating fuel pickup state machine.

use std::time::Duration;

use fuel_run_core::{PickupTuning, Placement, Quat, Vec3};
use fuel_run_pool::Pooled;

/// Phases a pickup moves through during one activation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PickupState {
    /// Hovering in place and waiting for a receiver.
    Floating,
    /// Fuel was handed out; the pickup leaves on the next tick.
    Consumed,
}

#[derive(Clone, Debug)]
pub(crate) struct Pickup {
    tuning: PickupTuning,
    state: PickupState,
    placement: Placement,
    anchor: Vec3,
    elapsed: Duration,
    collision_enabled: bool,
}

impl Pickup {
    /// Creates an inactive pickup using the provided tuning.
    pub(crate) fn new(tuning: PickupTuning) -> Self {
        Self {
            tuning,
            state: PickupState::Floating,
            placement: Placement::at(Vec3::ZERO),
            anchor: Vec3::ZERO,
            elapsed: Duration::ZERO,
            collision_enabled: false,
        }
    }

    /// Consumes the pickup, returning the fuel to deliver.
    ///
    /// Contacts while inactive or already consumed deliver nothing.
    pub(crate) fn contact(&mut self) -> Option<f32> {
        if self.state != PickupState::Floating || !self.collision_enabled {
            return None;
        }

        self.state = PickupState::Consumed;
        self.collision_enabled = false;
        Some(self.tuning.fuel_amount)
    }

    /// Spins and bobs the pickup while it floats. Purely cosmetic.
    pub(crate) fn animate(&mut self, dt: Duration) {
        if self.state != PickupState::Floating || !self.collision_enabled {
            return;
        }

        self.elapsed = self.elapsed.saturating_add(dt);
        let spin = Quat::from_rotation_y(self.tuning.rotation_speed.to_radians() * dt.as_secs_f32());
        self.placement.orientation = (spin * self.placement.orientation).normalize();

        let phase = self.elapsed.as_secs_f32() * self.tuning.float_frequency;
        self.placement.position.y = self.anchor.y + phase.sin() * self.tuning.float_amplitude;
    }

    pub(crate) fn is_consumed(&self) -> bool {
        self.state == PickupState::Consumed
    }

    pub(crate) fn state(&self) -> PickupState {
        self.state
    }

    pub(crate) fn placement(&self) -> Placement {
        self.placement
    }

    pub(crate) fn collision_enabled(&self) -> bool {
        self.collision_enabled
    }
}

impl Pooled for Pickup {
    fn on_spawned(&mut self, placement: Placement) {
        self.placement = placement;
        self.anchor = placement.position;
        self.elapsed = Duration::ZERO;
        self.state = PickupState::Floating;
        self.collision_enabled = true;
    }

    fn on_despawned(&mut self) {
        self.collision_enabled = false;
    }
}
