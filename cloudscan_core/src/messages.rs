// cloudscan_core/src/messages.rs

use crate::types::ScanPoint;
use nalgebra::Point3;

// =========================================================================
// == Perception-Specific Data Structures ==
// =========================================================================

/// Represents a single return from a 3D LiDAR.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// The 3D position of the point in the SENSOR's local coordinate frame.
    pub position: Point3<f64>,
    /// Reflectivity of the return, as reported by the sensor.
    pub intensity: f32,
    /// Sensor-specific return tag (e.g. noise or multi-return flags).
    pub tag: u8,
    /// The laser line (ring) that produced this point.
    pub line: u8,
    /// Time of this point relative to the start of the frame, in seconds.
    pub offset_time: f64,
}

impl Point {
    /// A point with only a position and zeroed attributes.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            position: Point3::new(x, y, z),
            intensity: 0.0,
            tag: 0,
            line: 0,
            offset_time: 0.0,
        }
    }
}

impl ScanPoint for Point {
    #[inline]
    fn position(&self) -> Point3<f64> {
        self.position
    }
}

/// A 64-bit acquisition timestamp in nanoseconds.
///
/// The projector never interprets it; it is copied into the output header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Stamp(u64);

impl Stamp {
    pub const NANOS_PER_SEC: u64 = 1_000_000_000;

    pub fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    pub fn as_nanos(self) -> u64 {
        self.0
    }

    /// Floating-point seconds, as consumed by `ros::Time`-style clocks.
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / Self::NANOS_PER_SEC as f64
    }

    /// Whole seconds plus the nanosecond remainder.
    pub fn sec_nanosec(self) -> (u64, u32) {
        (
            self.0 / Self::NANOS_PER_SEC,
            (self.0 % Self::NANOS_PER_SEC) as u32,
        )
    }
}

/// A structured representation of one LiDAR frame.
#[derive(Clone, Debug, Default)]
pub struct PointCloud {
    /// The coordinate frame the points are expressed in.
    pub frame_id: String,
    /// The timestamp of when the frame was captured.
    pub stamp: Stamp,
    /// The collection of points that make up the frame.
    pub points: Vec<Point>,
}

// =========================================================================
// == Public API Messages (Topic Data) ==
// =========================================================================

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScanHeader {
    pub frame_id: String,
    pub stamp: Stamp,
    /// Only set when a publisher assigns one with a `SequenceCounter`.
    pub seq: Option<u32>,
}

/// The primary output of the projector: a planar range-bearing scan.
///
/// `ranges[i]` holds the closest accepted return whose bearing fell in
/// `[angle_min + i * angle_increment, angle_min + (i + 1) * angle_increment)`,
/// or the empty-bucket sentinel if none did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LaserScan {
    pub header: ScanHeader,
    pub angle_min: f64,
    pub angle_max: f64,
    pub angle_increment: f64,
    /// Always zero: buckets are not time-ordered.
    pub time_increment: f64,
    pub scan_duration: f64,
    pub range_min: f64,
    pub range_max: f64,
    pub ranges: Vec<f64>,
}

impl LaserScan {
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// The bearing at which bucket `index` starts.
    pub fn bucket_angle(&self, index: usize) -> f64 {
        self.angle_min + index as f64 * self.angle_increment
    }

    /// `(bearing, range)` for every bucket that holds a real return.
    /// Sentinel buckets (infinity or `range_max + epsilon`) are skipped.
    pub fn returns(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.ranges
            .iter()
            .enumerate()
            .filter(|&(_, &r)| r >= self.range_min && r <= self.range_max)
            .map(|(i, &r)| (self.bucket_angle(i), r))
    }

    /// Converts the real returns back to planar Cartesian points (z = 0),
    /// placing each one at the start bearing of its bucket.
    pub fn to_points(&self) -> Vec<Point3<f64>> {
        self.returns()
            .map(|(angle, range)| {
                let (sin, cos) = angle.sin_cos();
                Point3::new(range * cos, range * sin, 0.0)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn four_bucket_scan(ranges: Vec<f64>) -> LaserScan {
        LaserScan {
            angle_min: -PI,
            angle_max: PI,
            angle_increment: FRAC_PI_2,
            range_min: 0.5,
            range_max: 10.0,
            ranges,
            ..Default::default()
        }
    }

    #[test]
    fn test_stamp_conversions() {
        let stamp = Stamp::from_nanos(1_500_000_001);
        assert_eq!(stamp.as_nanos(), 1_500_000_001);
        assert_eq!(stamp.sec_nanosec(), (1, 500_000_001));
        assert_abs_diff_eq!(stamp.as_secs_f64(), 1.500_000_001, epsilon = 1e-12);
    }

    #[test]
    fn test_bucket_angle_steps_from_angle_min() {
        let scan = four_bucket_scan(vec![f64::INFINITY; 4]);
        assert_abs_diff_eq!(scan.bucket_angle(0), -PI);
        assert_abs_diff_eq!(scan.bucket_angle(2), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_returns_skip_sentinels() {
        let scan = four_bucket_scan(vec![f64::INFINITY, 11.0, 2.0, 10.0]);
        let returns: Vec<_> = scan.returns().collect();
        assert_eq!(returns.len(), 2);
        assert_eq!(returns[0].1, 2.0);
        assert_eq!(returns[1].1, 10.0);
    }

    #[test]
    fn test_to_points_places_returns_on_bucket_bearing() {
        let scan = four_bucket_scan(vec![f64::INFINITY, f64::INFINITY, 2.0, f64::INFINITY]);
        let points = scan.to_points();
        assert_eq!(points.len(), 1);
        assert_abs_diff_eq!(points[0].x, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(points[0].y, 0.0, epsilon = 1e-12);
        assert_eq!(points[0].z, 0.0);
    }
}
