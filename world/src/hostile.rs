//! Hostile actor state machine driven by the world clock.

use std::time::Duration;

use fuel_run_core::{HostileTuning, Placement, Vec3};
use fuel_run_pool::Pooled;

/// Phases a hostile actor moves through during one activation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostileState {
    /// Standing in the world, waiting to be hit.
    Idle,
    /// Flying away from a collision; retires once the knockback timer lapses.
    Knocked,
    /// Knockback finished and the actor is on its way back to the pool.
    Retiring,
}

#[derive(Clone, Debug)]
pub(crate) struct Hostile {
    tuning: HostileTuning,
    state: HostileState,
    placement: Placement,
    velocity: Vec3,
    knockback_remaining: Duration,
    collision_enabled: bool,
}

impl Hostile {
    /// Creates an inactive hostile using the provided tuning.
    pub(crate) fn new(tuning: HostileTuning) -> Self {
        Self {
            tuning,
            state: HostileState::Idle,
            placement: Placement::at(Vec3::ZERO),
            velocity: Vec3::ZERO,
            knockback_remaining: Duration::ZERO,
            collision_enabled: false,
        }
    }

    /// Applies the knockback impulse, returning it when the hit took effect.
    ///
    /// Only an idle hostile reacts; later hits within the same activation are
    /// ignored so the impulse and the retirement happen at most once.
    pub(crate) fn apply_knockback(&mut self, direction: Vec3, force_multiplier: f32) -> Option<Vec3> {
        if self.state != HostileState::Idle || !self.collision_enabled {
            return None;
        }

        let impulse = direction.normalize_or_zero() * self.tuning.knockback_force * force_multiplier;
        self.velocity = impulse;
        self.knockback_remaining = self.tuning.knockback_duration;
        self.state = HostileState::Knocked;
        Some(impulse)
    }

    /// Advances the knockback timer and reports whether the hostile should retire.
    pub(crate) fn advance(&mut self, dt: Duration) -> bool {
        if self.state != HostileState::Knocked {
            return false;
        }

        self.knockback_remaining = self.knockback_remaining.saturating_sub(dt);
        if !self.knockback_remaining.is_zero() {
            return false;
        }

        self.velocity = Vec3::ZERO;
        self.collision_enabled = false;
        self.state = HostileState::Retiring;
        true
    }

    pub(crate) fn state(&self) -> HostileState {
        self.state
    }

    pub(crate) fn placement(&self) -> Placement {
        self.placement
    }

    pub(crate) fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub(crate) fn collision_enabled(&self) -> bool {
        self.collision_enabled
    }
}

impl Pooled for Hostile {
    fn on_spawned(&mut self, placement: Placement) {
        self.placement = placement;
        self.state = HostileState::Idle;
        self.velocity = Vec3::ZERO;
        self.knockback_remaining = Duration::ZERO;
        self.collision_enabled = true;
    }

    fn on_despawned(&mut self) {
        self.velocity = Vec3::ZERO;
        self.collision_enabled = false;
    }
}
