use std::collections::HashSet;

use fuel_run_core::{InstanceId, Placement, TemplateId, Vec3};
use fuel_run_pool::{ObserveError, Pool, Pooled, ReleaseError};

#[derive(Debug, Default)]
struct Dummy {
    active: bool,
    collision_enabled: bool,
    position: Vec3,
}

impl Pooled for Dummy {
    fn on_spawned(&mut self, placement: Placement) {
        self.active = true;
        self.collision_enabled = true;
        self.position = placement.position;
    }

    fn on_despawned(&mut self) {
        self.active = false;
        self.collision_enabled = false;
    }
}

type DummyPool = Pool<TemplateId, Dummy, u64>;

fn at(x: f32) -> Placement {
    Placement::at(Vec3::new(x, 0.0, 0.0))
}

#[test]
fn prewarmed_instances_are_reused_before_allocating() {
    let mut pool = DummyPool::new();
    let prewarmed: HashSet<InstanceId> = pool
        .prewarm(TemplateId::HOSTILE, 4, |_| Dummy::default())
        .into_iter()
        .collect();

    let mut handed_out = HashSet::new();
    for index in 0..4 {
        let acquired = pool.acquire(&TemplateId::HOSTILE, at(index as f32), |_| {
            panic!("prewarmed bucket must not allocate")
        });
        assert!(acquired.reused);
        assert!(prewarmed.contains(&acquired.instance));
        assert!(handed_out.insert(acquired.instance), "instance handed out twice");
    }

    let mut allocations = 0;
    let fifth = pool.acquire(&TemplateId::HOSTILE, at(9.0), |_| {
        allocations += 1;
        Dummy::default()
    });
    assert!(!fifth.reused);
    assert_eq!(allocations, 1);
    assert!(!prewarmed.contains(&fifth.instance));
    assert_eq!(pool.len(), 5);
}

#[test]
fn repeated_prewarm_keeps_adding_instances() {
    let mut pool = DummyPool::new();
    let _ = pool.prewarm(TemplateId::PICKUP, 2, |_| Dummy::default());
    let _ = pool.prewarm(TemplateId::PICKUP, 3, |_| Dummy::default());

    assert_eq!(pool.idle_count(&TemplateId::PICKUP), 5);
    assert_eq!(pool.idle_count(&TemplateId::HOSTILE), 0);
}

#[test]
fn observer_fires_once_and_instance_returns_to_bucket() {
    let mut pool = DummyPool::new();
    let acquired = pool.acquire(&TemplateId::HOSTILE, at(0.0), |_| Dummy::default());
    pool.observe(acquired.instance, 11).expect("arm observer");

    let released = pool
        .release(acquired.instance, None)
        .expect("release active instance");
    assert_eq!(released.template, TemplateId::HOSTILE);
    assert_eq!(released.observer, Some(11));
    assert_eq!(pool.idle_count(&TemplateId::HOSTILE), 1);
    assert!(!pool.is_active(acquired.instance));

    let dummy = pool.get(acquired.instance).expect("instance retained");
    assert!(!dummy.active);
    assert!(!dummy.collision_enabled);

    assert_eq!(
        pool.release(acquired.instance, None),
        Err(ReleaseError::NotActive(acquired.instance))
    );
    assert_eq!(pool.idle_count(&TemplateId::HOSTILE), 1);
}

#[test]
fn reactivation_does_not_inherit_previous_observer() {
    let mut pool = DummyPool::new();
    let first = pool.acquire(&TemplateId::PICKUP, at(0.0), |_| Dummy::default());
    pool.observe(first.instance, 1).expect("arm observer");
    let _ = pool.release(first.instance, None).expect("release");

    let second = pool.acquire(&TemplateId::PICKUP, at(1.0), |_| Dummy::default());
    assert_eq!(second.instance, first.instance);
    assert!(second.reused);

    let released = pool.release(second.instance, None).expect("release");
    assert_eq!(released.observer, None);
}

#[test]
fn observer_cannot_be_armed_twice_per_activation() {
    let mut pool = DummyPool::new();
    let acquired = pool.acquire(&TemplateId::HOSTILE, at(0.0), |_| Dummy::default());
    pool.observe(acquired.instance, 1).expect("arm observer");

    assert_eq!(
        pool.observe(acquired.instance, 2),
        Err(ObserveError::AlreadyObserved(acquired.instance))
    );
    let released = pool.release(acquired.instance, None).expect("release");
    assert_eq!(released.observer, Some(1));
}

#[test]
fn mismatched_template_is_rejected_without_side_effects() {
    let mut pool = DummyPool::new();
    let acquired = pool.acquire(&TemplateId::HOSTILE, at(0.0), |_| Dummy::default());

    assert_eq!(
        pool.release(acquired.instance, Some(&TemplateId::PICKUP)),
        Err(ReleaseError::TemplateMismatch(acquired.instance))
    );
    assert!(pool.is_active(acquired.instance));
    assert_eq!(pool.idle_count(&TemplateId::PICKUP), 0);

    let released = pool
        .release(acquired.instance, Some(&TemplateId::HOSTILE))
        .expect("release with matching template");
    assert_eq!(released.template, TemplateId::HOSTILE);
}

#[test]
fn buckets_recycle_in_release_order() {
    let mut pool = DummyPool::new();
    let first = pool.acquire(&TemplateId::HOSTILE, at(0.0), |_| Dummy::default());
    let second = pool.acquire(&TemplateId::HOSTILE, at(1.0), |_| Dummy::default());

    let _ = pool.release(second.instance, None).expect("release second");
    let _ = pool.release(first.instance, None).expect("release first");

    let next = pool.acquire(&TemplateId::HOSTILE, at(2.0), |_| Dummy::default());
    assert_eq!(next.instance, second.instance);
    assert_eq!(
        pool.get(next.instance).map(|dummy| dummy.position),
        Some(Vec3::new(2.0, 0.0, 0.0))
    );
}
