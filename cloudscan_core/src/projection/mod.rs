// cloudscan_core/src/projection/mod.rs

//! Flattens a 3D point cloud into a planar `LaserScan`.
//!
//! Every point is filtered against the height, range and bearing windows of
//! the configuration, mapped to an angular bucket, and each bucket keeps the
//! smallest range that landed in it. Buckets nothing landed in hold the
//! configured sentinel. The result does not depend on point order.

mod geometry;

pub use geometry::{Beam, ScanGeometry};

use crate::config::LaserScanConfig;
use crate::messages::{LaserScan, PointCloud, ScanHeader, Stamp};
use crate::types::ScanPoint;
use std::sync::Arc;
use tracing::debug;

/// Projects one frame of points into a scan.
///
/// Returns `None` when the configuration is disabled. Points that are NaN or
/// fall outside any window are skipped; projection itself never fails.
pub fn project<I>(
    points: I,
    stamp: Stamp,
    frame_id: &str,
    config: &LaserScanConfig,
) -> Option<LaserScan>
where
    I: IntoIterator,
    I::Item: ScanPoint,
{
    if !config.enable {
        return None;
    }

    let geometry = ScanGeometry::new(config);
    let mut scan = initialize_scan(config, stamp, frame_id, geometry.bucket_count());

    let mut total = 0usize;
    let mut accepted = 0usize;
    for point in points {
        total += 1;
        if let Some(beam) = geometry.project_point(&point) {
            accepted += 1;
            let slot = &mut scan.ranges[beam.index];
            if beam.range < *slot {
                *slot = beam.range;
            }
        }
    }

    debug!(
        "Projected {}/{} points into {} buckets (frame '{}').",
        accepted,
        total,
        scan.ranges.len(),
        scan.header.frame_id
    );
    Some(scan)
}

/// Builds the scan header and a sentinel-filled range buffer.
fn initialize_scan(
    config: &LaserScanConfig,
    stamp: Stamp,
    frame_id: &str,
    bucket_count: usize,
) -> LaserScan {
    LaserScan {
        header: ScanHeader {
            frame_id: config.output_frame(frame_id).to_owned(),
            stamp,
            seq: None,
        },
        angle_min: config.angle_min,
        angle_max: config.angle_max,
        angle_increment: config.angle_increment,
        time_increment: 0.0,
        scan_duration: config.scan_duration,
        range_min: config.range_min,
        range_max: config.range_max,
        ranges: vec![config.empty_range(); bucket_count],
    }
}

/// A converter bound to one configuration snapshot.
///
/// Swapping the snapshot with `set_config` between frames is the only state
/// change; each conversion allocates its own output.
#[derive(Debug, Clone, Default)]
pub struct PointCloudToLaserScan {
    config: Arc<LaserScanConfig>,
}

impl PointCloudToLaserScan {
    /// Accepts either an owned config or a shared snapshot from a `ConfigStore`.
    pub fn new(config: impl Into<Arc<LaserScanConfig>>) -> Self {
        Self {
            config: config.into(),
        }
    }

    pub fn set_config(&mut self, config: impl Into<Arc<LaserScanConfig>>) {
        self.config = config.into();
    }

    pub fn config(&self) -> &LaserScanConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enable
    }

    pub fn convert<I>(&self, points: I, stamp: Stamp, frame_id: &str) -> Option<LaserScan>
    where
        I: IntoIterator,
        I::Item: ScanPoint,
    {
        project(points, stamp, frame_id, &self.config)
    }

    pub fn convert_cloud(&self, cloud: &PointCloud) -> Option<LaserScan> {
        self.convert(&cloud.points, cloud.stamp, &cloud.frame_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigStore;
    use crate::messages::Point;
    use crate::types::SequenceCounter;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    const FRAME: &str = "livox_frame";

    fn quarter_config() -> LaserScanConfig {
        LaserScanConfig {
            enable: true,
            angle_min: -PI,
            angle_max: PI,
            angle_increment: FRAC_PI_2,
            ..Default::default()
        }
    }

    fn stamp() -> Stamp {
        Stamp::from_nanos(1_700_000_000_123_456_789)
    }

    /// A deterministic spread of points, some of which fall outside the windows.
    fn scattered_points(count: usize) -> Vec<Point> {
        (0..count)
            .map(|i| {
                let t = i as f64;
                let angle = (t * 0.7).sin() * PI;
                let range = 0.2 + (t * 1.3).cos().abs() * 12.0;
                let z = (t * 0.37).sin() * 1.5;
                Point::new(range * angle.cos(), range * angle.sin(), z)
            })
            .collect()
    }

    #[test]
    fn test_empty_cloud_yields_all_infinity() {
        let scan = project(Vec::<Point>::new(), stamp(), FRAME, &quarter_config()).unwrap();
        assert_eq!(scan.ranges, vec![f64::INFINITY; 4]);
    }

    #[test]
    fn test_single_point_fills_its_bucket() {
        let scan = project(&[Point::new(1.0, 0.0, 0.0)], stamp(), FRAME, &quarter_config()).unwrap();
        assert_eq!(
            scan.ranges,
            vec![f64::INFINITY, f64::INFINITY, 1.0, f64::INFINITY]
        );
    }

    #[test]
    fn test_point_above_height_band_is_dropped() {
        let scan = project(&[Point::new(1.0, 0.0, 5.0)], stamp(), FRAME, &quarter_config()).unwrap();
        assert!(scan.ranges.iter().all(|r| *r == f64::INFINITY));
    }

    #[test]
    fn test_finite_sentinel_when_infinity_disabled() {
        let config = LaserScanConfig {
            use_infinity_for_empty: false,
            range_max: 10.0,
            empty_range_epsilon: 2.0,
            ..quarter_config()
        };
        let scan = project(&[Point::new(0.0, 3.0, 0.0)], stamp(), FRAME, &config).unwrap();
        assert_eq!(scan.ranges, vec![12.0, 12.0, 12.0, 3.0]);
    }

    #[test]
    fn test_disabled_config_produces_nothing() {
        let config = LaserScanConfig {
            enable: false,
            ..quarter_config()
        };
        assert!(project(&scattered_points(50), stamp(), FRAME, &config).is_none());
        assert!(project(Vec::<Point>::new(), stamp(), FRAME, &config).is_none());
    }

    #[test]
    fn test_buckets_keep_the_closest_return() {
        let points = [
            Point::new(5.0, 0.1, 0.0),
            Point::new(2.0, 0.0, 0.0),
            Point::new(3.0, 0.2, 0.0),
        ];
        let scan = project(&points, stamp(), FRAME, &quarter_config()).unwrap();
        assert_eq!(scan.ranges[2], 2.0);
    }

    #[test]
    fn test_nan_points_are_skipped() {
        let points = [
            Point::new(f64::NAN, 0.0, 0.0),
            Point::new(1.0, f64::NAN, 0.0),
            Point::new(1.0, 0.0, f64::NAN),
            Point::new(2.0, 0.0, 0.0),
        ];
        let scan = project(&points, stamp(), FRAME, &quarter_config()).unwrap();
        assert_eq!(scan.ranges[2], 2.0);
        assert!(scan.ranges.iter().all(|r| !r.is_nan()));
    }

    #[test]
    fn test_header_fields_come_from_config() {
        let config = LaserScanConfig {
            scan_duration: 0.1,
            range_min: 0.3,
            range_max: 25.0,
            ..quarter_config()
        };
        let scan = project(Vec::<Point>::new(), stamp(), FRAME, &config).unwrap();
        assert_eq!(scan.header.frame_id, FRAME);
        assert_eq!(scan.header.stamp, stamp());
        assert_eq!(scan.header.seq, None);
        assert_eq!(scan.angle_min, -PI);
        assert_eq!(scan.angle_max, PI);
        assert_eq!(scan.angle_increment, FRAC_PI_2);
        assert_eq!(scan.time_increment, 0.0);
        assert_eq!(scan.scan_duration, 0.1);
        assert_eq!(scan.range_min, 0.3);
        assert_eq!(scan.range_max, 25.0);
    }

    #[test]
    fn test_target_frame_overrides_input_frame() {
        let config = LaserScanConfig {
            target_frame_label: "base_scan".to_string(),
            ..quarter_config()
        };
        let scan = project(Vec::<Point>::new(), stamp(), FRAME, &config).unwrap();
        assert_eq!(scan.header.frame_id, "base_scan");
    }

    #[test]
    fn test_points_outside_height_band_never_change_output() {
        let config = quarter_config();
        let base = scattered_points(200);
        let mut with_outliers = base.clone();
        with_outliers.extend([
            Point::new(0.5, 0.0, 1.5),
            Point::new(-0.6, 0.2, -3.0),
            Point::new(0.1, -0.7, 100.0),
        ]);

        assert_eq!(
            project(&base, stamp(), FRAME, &config),
            project(&with_outliers, stamp(), FRAME, &config)
        );
    }

    #[test]
    fn test_projection_is_idempotent() {
        let config = LaserScanConfig {
            enable: true,
            ..Default::default()
        };
        let points = scattered_points(500);
        let first = project(&points, stamp(), FRAME, &config).unwrap();
        let second = project(&points, stamp(), FRAME, &config).unwrap();
        assert_eq!(first, second);
        assert!(first
            .ranges
            .iter()
            .zip(&second.ranges)
            .all(|(a, b)| a.to_bits() == b.to_bits()));
    }

    #[test]
    fn test_projection_is_order_independent() {
        let config = LaserScanConfig {
            enable: true,
            angle_increment: 0.05,
            ..Default::default()
        };
        let points = scattered_points(500);
        let expected = project(&points, stamp(), FRAME, &config).unwrap();

        let mut reversed = points.clone();
        reversed.reverse();
        assert_eq!(project(&reversed, stamp(), FRAME, &config).unwrap(), expected);

        let mut rotated = points.clone();
        rotated.rotate_left(137);
        assert_eq!(project(&rotated, stamp(), FRAME, &config).unwrap(), expected);
    }

    #[test]
    fn test_accepted_ranges_stay_in_window() {
        let config = LaserScanConfig {
            enable: true,
            range_min: 1.0,
            range_max: 8.0,
            use_infinity_for_empty: false,
            empty_range_epsilon: 0.5,
            ..Default::default()
        };
        let scan = project(&scattered_points(500), stamp(), FRAME, &config).unwrap();
        assert_eq!(scan.len(), 360);
        for &r in &scan.ranges {
            assert!((1.0..=8.0).contains(&r) || r == 8.5, "unexpected range {r}");
        }
    }

    #[test]
    fn test_foreign_point_types_project_in_place() {
        let config = quarter_config();
        let arrays: [[f64; 3]; 2] = [[0.0, -2.0, 0.0], [-2.0, -0.5, 0.0]];
        let scan = project(&arrays, stamp(), FRAME, &config).unwrap();
        assert_eq!(scan.ranges[1], 2.0);
        assert_abs_diff_eq!(scan.ranges[0], 4.25_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_converter_follows_its_snapshot() {
        let mut store = ConfigStore::new(quarter_config());
        let mut converter = PointCloudToLaserScan::new(store.snapshot());
        assert!(converter.is_enabled());

        let cloud = PointCloud {
            frame_id: FRAME.to_string(),
            stamp: stamp(),
            points: vec![Point::new(1.0, 0.0, 0.0)],
        };
        let scan = converter.convert_cloud(&cloud).unwrap();
        assert_eq!(scan.ranges[2], 1.0);
        assert_eq!(scan.header.frame_id, FRAME);

        store
            .reload_str(r#"{ "laser_scan_config": { "enable_scan": false } }"#)
            .unwrap();
        // The converter keeps its snapshot until told otherwise.
        assert!(converter.convert_cloud(&cloud).is_some());

        converter.set_config(store.snapshot());
        assert!(!converter.is_enabled());
        assert!(converter.convert_cloud(&cloud).is_none());
    }

    #[test]
    fn test_sequence_numbers_are_assigned_by_the_caller() {
        let converter = PointCloudToLaserScan::new(quarter_config());
        let mut counter = SequenceCounter::default();

        let seqs: Vec<_> = (0..3)
            .filter_map(|_| converter.convert(Vec::<Point>::new(), stamp(), FRAME))
            .map(|mut scan| {
                counter.stamp(&mut scan);
                scan.header.seq
            })
            .collect();
        assert_eq!(seqs, vec![Some(0), Some(1), Some(2)]);
    }
}
