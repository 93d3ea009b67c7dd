//! Maps `Box<dyn Error>` from trait boundaries to typed `DriveError`.
//!
//! The traits in `drive_traits` use `Box<dyn Error + Send + Sync>` for
//! maximum flexibility; this module converts those to our typed error enum,
//! with an optional feature-gated path for `drive_hardware::BusError`
//! downcasting.

use crate::error::DriveError;

/// Map a trait-boundary error to a typed `DriveError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_bus_error(e: &(dyn std::error::Error + 'static)) -> DriveError {
    // Feature-gated: try to downcast to BusError for precise mapping
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(bus) = e.downcast_ref::<drive_hardware::error::BusError>() {
            return match bus {
                drive_hardware::error::BusError::Timeout => DriveError::Timeout,
                other => DriveError::Bus(other.to_string()),
            };
        }
    }

    // Fallback: string-based detection
    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        DriveError::Timeout
    } else {
        DriveError::Bus(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_timeout_maps_to_timeout() {
        let e = std::io::Error::other("read timeout on frame");
        assert!(matches!(map_bus_error(&e), DriveError::Timeout));
    }

    #[test]
    fn other_errors_map_to_bus() {
        let e = std::io::Error::other("port closed");
        match map_bus_error(&e) {
            DriveError::Bus(msg) => assert!(msg.contains("port closed")),
            other => panic!("expected Bus error, got {other:?}"),
        }
    }
}
