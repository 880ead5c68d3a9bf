//! Fixed-capacity storage whose slots are initialised under caller control.
//!
//! The CSR builder pre-allocates one slot per edge and fills slots out of
//! order while edge records arrive, possibly from several threads at once.
//! Construction and destruction of slots is explicit; the buffer never
//! drops slot contents on its own (element types here are `Copy`, so there
//! is nothing to leak).

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;

/// Uninitialised slot array with explicit placement-construction.
///
/// Writes go through `&self` so that parallel builders can fill disjoint
/// slots concurrently.
pub struct LazyBuffer<T> {
    slots: Vec<UnsafeCell<MaybeUninit<T>>>,
}

// Distinct-slot writes are the caller's contract; the storage itself holds
// no thread affinity.
unsafe impl<T: Send> Send for LazyBuffer<T> {}
unsafe impl<T: Sync + Send> Sync for LazyBuffer<T> {}

impl<T> LazyBuffer<T> {
    /// Allocate `capacity` uninitialised slots.
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || UnsafeCell::new(MaybeUninit::uninit()));
        Self { slots }
    }

    /// Number of slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Placement-construct slot `idx`.
    ///
    /// # Safety
    /// `idx` must not be written concurrently by another thread, and any
    /// previous value in the slot is overwritten without being dropped.
    #[inline]
    pub unsafe fn construct(&self, idx: usize, value: T) {
        (*self.slots[idx].get()).write(value);
    }

    /// Read slot `idx`.
    ///
    /// # Safety
    /// Slot `idx` must have been constructed, and no thread may be writing
    /// it concurrently.
    #[inline]
    pub unsafe fn get(&self, idx: usize) -> &T {
        (*self.slots[idx].get()).assume_init_ref()
    }

    /// Drop the value in slot `idx`, returning it to the uninitialised state.
    ///
    /// # Safety
    /// Slot `idx` must have been constructed and must not be accessed again
    /// until reconstructed.
    #[inline]
    pub unsafe fn destroy(&self, idx: usize) {
        (*self.slots[idx].get()).assume_init_drop();
    }

    /// View the whole buffer as an initialised slice.
    ///
    /// # Safety
    /// Every slot must have been constructed and all writers must be done.
    pub unsafe fn assume_init_slice(&self) -> &[T] {
        std::slice::from_raw_parts(self.slots.as_ptr().cast::<T>(), self.slots.len())
    }
}

impl<T> std::fmt::Debug for LazyBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyBuffer")
            .field("capacity", &self.slots.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construct_and_read() {
        let buf = LazyBuffer::<u64>::new(4);
        unsafe {
            buf.construct(2, 42);
            buf.construct(0, 7);
            assert_eq!(*buf.get(2), 42);
            assert_eq!(*buf.get(0), 7);
        }
    }

    #[test]
    fn full_slice_after_all_constructed() {
        let buf = LazyBuffer::<u32>::new(3);
        unsafe {
            for i in 0..3 {
                buf.construct(i, i as u32 * 10);
            }
            assert_eq!(buf.assume_init_slice(), &[0, 10, 20]);
        }
    }

    #[test]
    fn destroy_runs_drop() {
        let buf = LazyBuffer::<String>::new(1);
        unsafe {
            buf.construct(0, String::from("owned"));
            assert_eq!(buf.get(0), "owned");
            buf.destroy(0);
        }
    }

    #[test]
    fn disjoint_parallel_construct() {
        let buf = LazyBuffer::<usize>::new(256);
        std::thread::scope(|s| {
            for t in 0..4 {
                let buf = &buf;
                s.spawn(move || {
                    for i in (t..256).step_by(4) {
                        unsafe { buf.construct(i, i * 3) };
                    }
                });
            }
        });
        let all = unsafe { buf.assume_init_slice() };
        assert!(all.iter().enumerate().all(|(i, &v)| v == i * 3));
    }
}
