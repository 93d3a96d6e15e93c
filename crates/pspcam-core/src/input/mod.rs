//! Pointer-movement input: delta accumulation and the collaborator
//! contract for input sources.

mod mice;

pub use mice::MiceSource;

use std::sync::{Arc, Mutex};

use crate::error::Result;

/// Shared accumulator for pointer-movement deltas.
///
/// The input thread accumulates, the polling thread drains. Drain
/// returns and zeroes both fields inside one critical section so a tick
/// never observes a torn (dx, dy) pair.
pub struct DeltaAccumulator {
    inner: Mutex<(f32, f32)>,
}

impl DeltaAccumulator {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new((0.0, 0.0)),
        }
    }

    pub fn accumulate(&self, dx: f32, dy: f32) {
        let mut deltas = self.inner.lock().unwrap();
        deltas.0 += dx;
        deltas.1 += dy;
    }

    /// Take the accumulated deltas and reset them to zero.
    pub fn drain(&self) -> (f32, f32) {
        let mut deltas = self.inner.lock().unwrap();
        std::mem::replace(&mut *deltas, (0.0, 0.0))
    }
}

impl Default for DeltaAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts absolute pointer positions into accumulated deltas.
///
/// Seeded with the pointer position at startup; each notification adds
/// (current − previous) to the accumulator.
pub struct PointerTracker {
    prev: Mutex<(i32, i32)>,
    deltas: Arc<DeltaAccumulator>,
}

impl PointerTracker {
    pub fn new(deltas: Arc<DeltaAccumulator>, initial: (i32, i32)) -> Self {
        Self {
            prev: Mutex::new(initial),
            deltas,
        }
    }

    /// Record a pointer-move notification at absolute (x, y).
    pub fn observe(&self, x: i32, y: i32) {
        let mut prev = self.prev.lock().unwrap();
        let dx = x - prev.0;
        let dy = y - prev.1;
        *prev = (x, y);
        drop(prev);

        if dx != 0 || dy != 0 {
            self.deltas.accumulate(dx as f32, dy as f32);
        }
    }
}

/// External input collaborator contract.
///
/// A source reports the absolute pointer position once at startup, then
/// delivers every pointer move to the tracker asynchronously until
/// stopped.
pub trait PointerSource {
    /// Current absolute pointer position.
    fn position(&self) -> Result<(i32, i32)>;

    /// Begin delivering move notifications to the tracker.
    fn start(&mut self, tracker: Arc<PointerTracker>) -> Result<()>;

    /// Stop delivering notifications and release the device. Must also
    /// undo any host-side changes made by `start` (cursor state etc.).
    fn stop(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulate_then_drain_resets() {
        let acc = DeltaAccumulator::new();
        acc.accumulate(3.0, -2.0);
        acc.accumulate(1.0, 1.0);

        assert_eq!(acc.drain(), (4.0, -1.0));
        assert_eq!(acc.drain(), (0.0, 0.0));
    }

    #[test]
    fn test_tracker_converts_absolute_to_deltas() {
        let acc = Arc::new(DeltaAccumulator::new());
        let tracker = PointerTracker::new(Arc::clone(&acc), (100, 100));

        tracker.observe(110, 95);
        tracker.observe(112, 95);

        assert_eq!(acc.drain(), (12.0, -5.0));
    }

    #[test]
    fn test_tracker_ignores_stationary_notifications() {
        let acc = Arc::new(DeltaAccumulator::new());
        let tracker = PointerTracker::new(Arc::clone(&acc), (0, 0));

        tracker.observe(0, 0);
        assert_eq!(acc.drain(), (0.0, 0.0));
    }

    #[test]
    fn test_concurrent_accumulation() {
        use std::thread;

        let acc = Arc::new(DeltaAccumulator::new());
        let mut handles = Vec::new();
        for _ in 0..4 {
            let acc = Arc::clone(&acc);
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    acc.accumulate(1.0, -1.0);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(acc.drain(), (4000.0, -4000.0));
    }
}
