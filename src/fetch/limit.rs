//! Byte ceiling for a single fetch.

use std::fmt;
use std::num::NonZeroU64;

use super::constants::{BYTES_PER_MEGABYTE, MAX_MAX_MEGABYTES, MIN_MAX_MEGABYTES};
use super::error::FetchError;

/// Maximum number of body bytes a fetch may write. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SizeLimit(NonZeroU64);

impl SizeLimit {
    /// Ceiling of exactly `bytes`. `None` for zero.
    #[must_use]
    pub fn from_bytes(bytes: u64) -> Option<Self> {
        NonZeroU64::new(bytes).map(Self)
    }

    /// Ceiling for the inbound `max_megabytes` parameter (`1..=200`, 1 MB = 1 048 576 bytes).
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidSizeLimit`] outside the accepted range.
    pub fn from_megabytes(megabytes: u32) -> Result<Self, FetchError> {
        if !(MIN_MAX_MEGABYTES..=MAX_MAX_MEGABYTES).contains(&megabytes) {
            return Err(FetchError::InvalidSizeLimit {
                megabytes,
                min: MIN_MAX_MEGABYTES,
                max: MAX_MAX_MEGABYTES,
            });
        }
        Self::from_bytes(u64::from(megabytes) * BYTES_PER_MEGABYTE).ok_or(
            FetchError::InvalidSizeLimit {
                megabytes,
                min: MIN_MAX_MEGABYTES,
                max: MAX_MAX_MEGABYTES,
            },
        )
    }

    /// The ceiling in bytes.
    #[must_use]
    pub fn bytes(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for SizeLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bytes", self.bytes())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_megabytes_converts_binary_megabytes() {
        assert_eq!(SizeLimit::from_megabytes(1).unwrap().bytes(), 1_048_576);
        assert_eq!(SizeLimit::from_megabytes(50).unwrap().bytes(), 52_428_800);
        assert_eq!(SizeLimit::from_megabytes(200).unwrap().bytes(), 209_715_200);
    }

    #[test]
    fn test_from_megabytes_rejects_out_of_range() {
        assert!(matches!(
            SizeLimit::from_megabytes(0),
            Err(FetchError::InvalidSizeLimit { megabytes: 0, .. })
        ));
        assert!(matches!(
            SizeLimit::from_megabytes(201),
            Err(FetchError::InvalidSizeLimit { megabytes: 201, .. })
        ));
    }

    #[test]
    fn test_from_bytes_rejects_zero() {
        assert_eq!(SizeLimit::from_bytes(0), None);
        assert_eq!(SizeLimit::from_bytes(7).unwrap().bytes(), 7);
    }
}
