use std::fmt::Display;
use std::num::NonZero;

use crate::{Error, Result};

/// Returns the pool slot that serves iteration `iteration` of a pool with `pool_size` slots.
///
/// Consecutive iterations visit the slots round-robin, so over any span of iterations every
/// slot is used within one visit of every other slot.
///
/// # Errors
///
/// Returns [`Error::Configuration`] if `pool_size` is zero.
///
/// # Examples
///
/// ```
/// use framebench::slot_for;
///
/// let slots = (0..9)
///     .map(|iteration| slot_for(iteration, 3))
///     .collect::<Result<Vec<_>, _>>()
///     .unwrap();
///
/// assert_eq!(slots, [0, 1, 2, 0, 1, 2, 0, 1, 2]);
/// ```
pub fn slot_for(iteration: u64, pool_size: usize) -> Result<usize> {
    let pool_size = NonZero::new(pool_size)
        .ok_or_else(|| Error::configuration("pool size must be at least 1"))?;

    Ok(slot_in(iteration, pool_size))
}

/// Infallible form of [`slot_for()`] for sizes that are already known to be non-zero.
pub(crate) fn slot_in(iteration: u64, pool_size: NonZero<usize>) -> usize {
    // A pool with more slots than `u64::MAX` cannot exist, so the size always fits.
    let size = u64::try_from(pool_size.get()).unwrap_or(u64::MAX);

    let slot = iteration
        .checked_rem(size)
        .expect("guarded by NonZero pool size, so division by zero is impossible");

    usize::try_from(slot).expect("remainder is less than the pool size, which is a usize")
}

/// A fixed-size, round-robin collection of mutable per-call resources.
///
/// Repeated calls to a measured operation rotate through the slots of the pool instead of
/// reusing one shared context (which would measure reuse artifacts) or creating a fresh one on
/// every call (which would measure allocation). All slots are created up front by
/// [`materialize()`][Self::materialize]; nothing is allocated by the pool afterwards.
///
/// # Examples
///
/// ```
/// use framebench::ResourcePool;
///
/// let mut pool =
///     ResourcePool::materialize(2, |slot| Ok::<_, String>(vec![slot; 4])).unwrap();
///
/// assert_eq!(pool.len().get(), 2);
/// assert_eq!(pool.for_iteration(5), &vec![1; 4]);
///
/// pool.for_iteration_mut(6).push(9);
/// assert_eq!(pool.get(0), Some(&vec![0, 0, 0, 0, 9]));
/// ```
#[derive(Debug)]
pub struct ResourcePool<T> {
    // Never empty.
    slots: Box<[T]>,
}

impl<T> ResourcePool<T> {
    /// Creates a pool by calling `factory` exactly `pool_size` times, once for each slot index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `pool_size` is zero.
    ///
    /// Returns [`Error::ResourceInit`] as soon as the factory fails for any slot. Slots created
    /// before the failure are dropped.
    pub fn materialize<E, F>(pool_size: usize, mut factory: F) -> Result<Self>
    where
        E: Display,
        F: FnMut(usize) -> std::result::Result<T, E>,
    {
        if pool_size == 0 {
            return Err(Error::configuration("pool size must be at least 1"));
        }

        let slots = (0..pool_size)
            .map(|slot| {
                factory(slot).map_err(|e| {
                    Error::resource_init(format!("pool slot {slot} of {pool_size}"), e.to_string())
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            slots: slots.into_boxed_slice(),
        })
    }

    /// Number of slots in the pool.
    #[must_use]
    pub fn len(&self) -> NonZero<usize> {
        NonZero::new(self.slots.len()).expect("pools are never empty")
    }

    /// The resource in `slot`, or `None` if the pool has no such slot.
    #[must_use]
    pub fn get(&self, slot: usize) -> Option<&T> {
        self.slots.get(slot)
    }

    /// Exclusive access to the resource in `slot`, or `None` if the pool has no such slot.
    #[must_use]
    pub fn get_mut(&mut self, slot: usize) -> Option<&mut T> {
        self.slots.get_mut(slot)
    }

    /// The resource that serves `iteration`.
    #[must_use]
    pub fn for_iteration(&self, iteration: u64) -> &T {
        let slot = slot_in(iteration, self.len());

        self.slots
            .get(slot)
            .expect("slot_in() always returns an index within the pool")
    }

    /// Exclusive access to the resource that serves `iteration`.
    #[must_use]
    pub fn for_iteration_mut(&mut self, iteration: u64) -> &mut T {
        let slot = slot_in(iteration, self.len());

        self.slots
            .get_mut(slot)
            .expect("slot_in() always returns an index within the pool")
    }

    /// Iterates over the resources in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter()
    }

    /// Iterates mutably over the resources in slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots.iter_mut()
    }
}
