use thiserror::Error;

/// Caller contract violations detected before any grid is allocated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("invalid grid dimensions {width}x{height}: width and height must be positive")]
    InvalidDimensions { width: usize, height: usize },

    #[error("grid dimensions {width}x{height} overflow the addressable cell count")]
    GridTooLarge { width: usize, height: usize },

    #[error("elevation grid is {actual_width}x{actual_height}, expected {width}x{height}")]
    DimensionMismatch {
        width: usize,
        height: usize,
        actual_width: usize,
        actual_height: usize,
    },
}

/// Reject zero-sized or overflowing grids.
pub fn validate_dimensions(width: usize, height: usize) -> Result<usize, ConfigurationError> {
    if width == 0 || height == 0 {
        return Err(ConfigurationError::InvalidDimensions { width, height });
    }
    width
        .checked_mul(height)
        .ok_or(ConfigurationError::GridTooLarge { width, height })
}
