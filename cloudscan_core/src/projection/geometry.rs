// cloudscan_core/src/projection/geometry.rs

use crate::config::LaserScanConfig;
use crate::types::ScanPoint;

/// Where a single accepted point lands in the scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Beam {
    /// Bucket index, always below the geometry's bucket count.
    pub index: usize,
    /// Planar distance from the sensor origin, meters.
    pub range: f64,
}

/// The filtering windows and bucket layout for one projection.
///
/// Built once per invocation from a configuration snapshot. Assumes
/// `angle_increment > 0`; that is checked when the configuration is loaded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanGeometry {
    min_height: f64,
    max_height: f64,
    range_min: f64,
    range_max: f64,
    angle_min: f64,
    angle_max: f64,
    angle_increment: f64,
    bucket_count: usize,
}

impl ScanGeometry {
    pub fn new(config: &LaserScanConfig) -> Self {
        Self {
            min_height: config.min_height,
            max_height: config.max_height,
            range_min: config.range_min,
            range_max: config.range_max,
            angle_min: config.angle_min,
            angle_max: config.angle_max,
            angle_increment: config.angle_increment,
            bucket_count: config.bucket_count(),
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    /// Filters a point and maps it to its bucket.
    ///
    /// Returns `None` for NaN coordinates, points outside the height band,
    /// the range window or the bearing window, and for bearings whose bucket
    /// index rounds up to `bucket_count`. All windows are inclusive.
    pub fn project_point<P: ScanPoint + ?Sized>(&self, point: &P) -> Option<Beam> {
        let (range, angle) = self.polar(point)?;
        let index = self.bucket_of(angle)?;
        Some(Beam { index, range })
    }

    /// Whether the point passes the height, range and bearing windows.
    ///
    /// This does not check the bucket index, so a point sitting exactly on
    /// `angle_max` can be accepted here and still be dropped by
    /// `project_point` when the window is a whole number of buckets wide.
    pub fn accepts<P: ScanPoint + ?Sized>(&self, point: &P) -> bool {
        self.polar(point)
            .is_some_and(|(_, angle)| self.in_angle_window(angle))
    }

    /// Bucket index for a bearing, or `None` outside the window.
    ///
    /// The window check comes first, so the dividend is never negative and
    /// flooring matches truncation. An index equal to `bucket_count` is
    /// rejected rather than clamped.
    pub fn bucket_of(&self, angle: f64) -> Option<usize> {
        if !self.in_angle_window(angle) {
            return None;
        }
        let index = ((angle - self.angle_min) / self.angle_increment).floor();
        if index >= 0.0 && index < self.bucket_count as f64 {
            Some(index as usize)
        } else {
            None
        }
    }

    /// Range and bearing of a point that survives the NaN, height and range
    /// checks.
    fn polar<P: ScanPoint + ?Sized>(&self, point: &P) -> Option<(f64, f64)> {
        let p = point.position();
        if p.x.is_nan() || p.y.is_nan() || p.z.is_nan() {
            return None;
        }
        if p.z < self.min_height || p.z > self.max_height {
            return None;
        }

        let range = (p.x * p.x + p.y * p.y).sqrt();
        if range < self.range_min || range > self.range_max {
            return None;
        }

        Some((range, p.y.atan2(p.x)))
    }

    fn in_angle_window(&self, angle: f64) -> bool {
        angle >= self.angle_min && angle <= self.angle_max
    }
}
