use alloc::rc::Rc;
use core::cell::Cell;

/// Shared count of in-flight background operations. Clones observe the same
/// count; the host shows a loading overlay while it is non-zero.
#[derive(Clone, Debug, Default)]
pub struct BusyCounter {
    count: Rc<Cell<u32>>,
}

impl BusyCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks one operation as started until the guard drops.
    pub fn enter(&self) -> BusyGuard {
        self.count.set(self.count.get().saturating_add(1));
        BusyGuard {
            counter: self.clone(),
        }
    }

    fn leave(&self) {
        self.count.set(self.count.get().saturating_sub(1));
    }

    pub fn count(&self) -> u32 {
        self.count.get()
    }

    pub fn is_busy(&self) -> bool {
        self.count.get() > 0
    }
}

#[derive(Debug)]
pub struct BusyGuard {
    counter: BusyCounter,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.counter.leave();
    }
}
