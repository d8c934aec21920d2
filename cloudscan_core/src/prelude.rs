// cloudscan_core/src/prelude.rs

// --- Core Abstractions (The main contracts of the library) ---
pub use crate::error::{ConfigError, SchemaErrorKind};
pub use crate::types::{ScanPoint, SequenceCounter};

// --- Core Data Structures (The "nouns" of the library) ---
pub use crate::config::{ConfigStore, LaserScanConfig};
pub use crate::messages::{LaserScan, Point, PointCloud, ScanHeader, Stamp};

// --- Projection ---
pub use crate::projection::{project, Beam, PointCloudToLaserScan, ScanGeometry};
