//! Buffer lifecycle under arbitrary destruction orders and racing threads.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use numy_core::Shape;
use numy_registry::{BufferHandle, BufferRegistry, RegistryError, TensorResource};
use proptest::prelude::*;

fn populate(reg: &BufferRegistry, n: usize) -> Vec<BufferHandle> {
    (0..n)
        .map(|i| reg.allocate(Shape::vector(i + 1).unwrap()).unwrap())
        .collect()
}

proptest! {
    #[test]
    fn every_buffer_destroyed_exactly_once(
        order in (1usize..64).prop_flat_map(|n| Just((0..n).collect::<Vec<_>>()).prop_shuffle())
    ) {
        let reg = BufferRegistry::default();
        let handles = populate(&reg, order.len());

        for &i in &order {
            prop_assert!(reg.destroy(handles[i]).is_ok());
            prop_assert_eq!(
                reg.destroy(handles[i]),
                Err(RegistryError::InvalidHandle { handle: handles[i] })
            );
        }

        let stats = reg.stats();
        prop_assert_eq!(stats.allocated, order.len() as u64);
        prop_assert_eq!(stats.destroyed, order.len() as u64);
        prop_assert_eq!(stats.live, 0);
    }

    #[test]
    fn resources_dropped_in_any_order_release_once(
        order in (1usize..32).prop_flat_map(|n| Just((0..n).collect::<Vec<_>>()).prop_shuffle())
    ) {
        let reg = Arc::new(BufferRegistry::default());
        let mut slots: Vec<Option<TensorResource>> = (0..order.len())
            .map(|_| Some(TensorResource::create(&reg, Shape::vector(2).unwrap()).unwrap()))
            .collect();
        // A second reference to every buffer keeps it alive until both drop.
        let mut extra: Vec<Option<TensorResource>> =
            slots.iter().cloned().collect();

        for &i in &order {
            slots[i] = None;
        }
        prop_assert_eq!(reg.stats().destroyed, 0);
        for &i in order.iter().rev() {
            extra[i] = None;
        }
        prop_assert_eq!(reg.stats().destroyed, order.len() as u64);
        prop_assert_eq!(reg.live_count().unwrap(), 0);
    }
}

#[test]
fn racing_destroys_free_each_buffer_once() {
    let reg = BufferRegistry::default();
    let handles = populate(&reg, 256);
    let successes = AtomicUsize::new(0);

    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for &h in &handles {
                    if reg.destroy(h).is_ok() {
                        successes.fetch_add(1, Ordering::Relaxed);
                    }
                }
            });
        }
    });

    assert_eq!(successes.load(Ordering::Relaxed), 256);
    assert_eq!(reg.stats().destroyed, 256);
    assert_eq!(reg.live_count().unwrap(), 0);
}

#[test]
fn reused_slot_does_not_resurrect_old_handle() {
    let reg = BufferRegistry::default();
    let old = reg.allocate(Shape::vector(1).unwrap()).unwrap();
    reg.destroy(old).unwrap();
    let new = reg.allocate(Shape::vector(4).unwrap()).unwrap();
    assert_ne!(old, new);
    assert!(matches!(
        reg.with_tensor(old, |t| t.element_count()),
        Err(RegistryError::InvalidHandle { .. })
    ));
    assert_eq!(reg.with_tensor(new, |t| t.element_count()).unwrap(), 4);
}
