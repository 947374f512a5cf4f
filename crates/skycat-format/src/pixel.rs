//! HEALPix tile keys and the paths derived from them
//!
//! Partition files live under Hive-style directories:
//! `{base}/Norder={order}/Dir={dir}/Npix={pixel}.parquet`
//! where `dir` buckets pixels in groups of 10 000.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Highest order a 64-bit nested pixel index can address.
pub const MAX_ORDER: u8 = 29;

/// Pixels per `Dir=` bucket.
pub const DIRECTORY_BUCKET: u64 = 10_000;

/// A tile key: resolution level plus pixel index within that level.
///
/// Ordered by `(order, pixel)` so catalogs iterate deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HealpixPixel {
    pub order: u8,
    pub pixel: u64,
}

impl HealpixPixel {
    pub const fn new(order: u8, pixel: u64) -> Self {
        Self { order, pixel }
    }

    /// Number of pixels covering the sphere at `order` (12 * 4^order), or
    /// `None` past `MAX_ORDER`.
    pub fn npix(order: u8) -> Option<u64> {
        (order <= MAX_ORDER).then(|| 12u64 << (2 * u32::from(order)))
    }

    /// Order within range and pixel index inside the sphere at that order.
    pub fn is_valid(&self) -> bool {
        Self::npix(self.order).is_some_and(|npix| self.pixel < npix)
    }

    /// Directory bucket this pixel is stored under.
    pub fn dir(&self) -> u64 {
        self.pixel / DIRECTORY_BUCKET * DIRECTORY_BUCKET
    }
}

impl fmt::Display for HealpixPixel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Order: {}, Pixel: {}", self.order, self.pixel)
    }
}

/// Directory holding the partition file for `pixel`.
pub fn pixel_directory(base: &str, pixel: HealpixPixel) -> String {
    crate::paths::join_path(
        base,
        &format!("Norder={}/Dir={}", pixel.order, pixel.dir()),
    )
}

/// Partition file path for `pixel` under `base`.
pub fn pixel_catalog_file(base: &str, pixel: HealpixPixel) -> String {
    format!("{}/Npix={}.parquet", pixel_directory(base, pixel), pixel.pixel)
}
