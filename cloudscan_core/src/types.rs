// cloudscan_core/src/types.rs

use crate::messages::LaserScan;
use nalgebra::Point3;

// --- Core Trait for Point Access ---
// This is so fundamental it belongs here.

/// Anything the projector can read a Cartesian position from.
///
/// Acquisition layers usually carry richer point types (intensity, ring,
/// per-point time). Implementing this trait lets them be projected in place,
/// without copying into the crate's own `Point`.
pub trait ScanPoint {
    /// The point's position in the sensor frame, in meters.
    fn position(&self) -> Point3<f64>;
}

impl ScanPoint for Point3<f64> {
    #[inline]
    fn position(&self) -> Point3<f64> {
        *self
    }
}

impl ScanPoint for [f64; 3] {
    #[inline]
    fn position(&self) -> Point3<f64> {
        Point3::new(self[0], self[1], self[2])
    }
}

impl<T: ScanPoint + ?Sized> ScanPoint for &T {
    #[inline]
    fn position(&self) -> Point3<f64> {
        (**self).position()
    }
}

// --- Sequence Numbering ---

/// A caller-owned header sequence counter.
///
/// Some transports expect a monotonically increasing `seq` in every scan
/// header. The projector never numbers scans itself; whoever publishes them
/// keeps one of these per output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SequenceCounter {
    next: u32,
}

impl SequenceCounter {
    /// Starts counting at `first`.
    pub fn starting_at(first: u32) -> Self {
        Self { next: first }
    }

    /// Returns the current value and advances, wrapping at `u32::MAX`.
    pub fn next(&mut self) -> u32 {
        let seq = self.next;
        self.next = self.next.wrapping_add(1);
        seq
    }

    /// Writes the next sequence number into the scan's header.
    pub fn stamp(&mut self, scan: &mut LaserScan) {
        scan.header.seq = Some(self.next());
    }
}
