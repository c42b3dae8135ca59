//! Spatial placement helpers used by the category loops.

use fuel_run_core::{Placement, Quat, SurfaceProbe, Vec3};
use rand::Rng;
use rand_distr::{Distribution, UnitDisc};

const PROBE_LIFT: f32 = 10.0;
const PROBE_DISTANCE: f32 = 50.0;
const GROUND_CLEARANCE: f32 = 0.5;

/// Samples a position on the horizontal disc around `center` that keeps
/// `min_separation` from every occupied position.
///
/// Falls back to `center` unchanged once `max_attempts` candidates failed.
pub(crate) fn sample_position<R>(
    rng: &mut R,
    center: Vec3,
    radius: f32,
    min_separation: f32,
    max_attempts: u32,
    occupied: &[Vec3],
) -> Vec3
where
    R: Rng + ?Sized,
{
    for _ in 0..max_attempts {
        let [x, z]: [f32; 2] = UnitDisc.sample(rng);
        let candidate = center + Vec3::new(x * radius, 0.0, z * radius);
        if is_clear(candidate, min_separation, occupied) {
            return candidate;
        }
    }
    center
}

/// Reports whether the candidate keeps `min_separation` from every occupied position.
pub(crate) fn is_clear(candidate: Vec3, min_separation: f32, occupied: &[Vec3]) -> bool {
    occupied
        .iter()
        .all(|position| candidate.distance(*position) >= min_separation)
}

/// Tilts a pickup onto its side and rests it just above the ground below.
pub(crate) fn settle_pickup<S>(surface: &S, position: Vec3) -> Placement
where
    S: SurfaceProbe + ?Sized,
{
    let orientation = Quat::from_rotation_x((-90.0_f32).to_radians());
    let origin = position + Vec3::Y * PROBE_LIFT;
    let ground = surface
        .probe_down(origin, PROBE_DISTANCE)
        .unwrap_or(position);
    Placement::new(ground + Vec3::Y * GROUND_CLEARANCE, orientation)
}
