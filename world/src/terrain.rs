//! Ground surfaces used to settle entities vertically.

use fuel_run_core::{SurfacePatch, Vec3};

#[derive(Clone, Debug, Default)]
pub(crate) struct Terrain {
    patches: Vec<SurfacePatch>,
}

impl Terrain {
    pub(crate) fn new(patches: Vec<SurfacePatch>) -> Self {
        Self { patches }
    }

    /// Casts a ray straight down and returns the highest patch it hits.
    pub(crate) fn probe_down(&self, origin: Vec3, max_distance: f32) -> Option<Vec3> {
        let floor = origin.y - max_distance;
        self.patches
            .iter()
            .filter(|patch| patch.contains(origin.x, origin.z))
            .map(|patch| patch.height)
            .filter(|height| *height <= origin.y && *height >= floor)
            .fold(None, |best: Option<f32>, height| {
                Some(best.map_or(height, |current| current.max(height)))
            })
            .map(|height| Vec3::new(origin.x, height, origin.z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch(height: f32) -> SurfacePatch {
        SurfacePatch {
            min_x: -5.0,
            min_z: -5.0,
            max_x: 5.0,
            max_z: 5.0,
            height,
        }
    }

    #[test]
    fn probe_hits_highest_patch_below_origin() {
        let terrain = Terrain::new(vec![patch(0.0), patch(2.0), patch(20.0)]);
        let hit = terrain.probe_down(Vec3::new(1.0, 10.0, 1.0), 50.0);
        assert_eq!(hit, Some(Vec3::new(1.0, 2.0, 1.0)));
    }

    #[test]
    fn probe_respects_max_distance() {
        let terrain = Terrain::new(vec![patch(-100.0)]);
        assert_eq!(terrain.probe_down(Vec3::new(0.0, 10.0, 0.0), 50.0), None);
    }

    #[test]
    fn probe_misses_outside_patch_bounds() {
        let terrain = Terrain::new(vec![patch(0.0)]);
        assert_eq!(terrain.probe_down(Vec3::new(9.0, 10.0, 0.0), 50.0), None);
    }
}
