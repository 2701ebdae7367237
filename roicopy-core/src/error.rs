// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum RoiCopyError {
    MalformedMaskError {
        bits: usize,
        width: usize,
        height: usize,
    },
    OutOfBoundsError {
        x: i64,
        y: i64,
        width: usize,
        height: usize,
        plane_width: usize,
        plane_height: usize,
    },
    AmbiguousLocatorError(String),
    RemoteOperationError(String),
    ConfigError(String),
    OtherError(String),
}

impl fmt::Display for RoiCopyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RoiCopyError::MalformedMaskError {
                bits,
                width,
                height,
            } => {
                write!(
                    f,
                    "[roicopy::MalformedMaskError] Mask holds {} bits but a {}x{} mask needs {}.",
                    bits,
                    width,
                    height,
                    width.saturating_mul(*height)
                )
            }
            RoiCopyError::OutOfBoundsError {
                x,
                y,
                width,
                height,
                plane_width,
                plane_height,
            } => {
                write!(
                    f,
                    "[roicopy::OutOfBoundsError] Mask at ({}, {}) with size {}x{} does not fit a {}x{} plane.",
                    x, y, width, height, plane_width, plane_height
                )
            }
            RoiCopyError::AmbiguousLocatorError(message) => {
                write!(
                    f,
                    "[roicopy::AmbiguousLocatorError] {}. Expected Image:<id> or Dataset:<id>.",
                    message
                )
            }
            RoiCopyError::RemoteOperationError(message) => {
                write!(
                    f,
                    "[roicopy::RemoteOperationError] Remote call failed. {}",
                    message
                )
            }
            RoiCopyError::ConfigError(message) => {
                write!(f, "[roicopy::ConfigError] {}.", message)
            }
            RoiCopyError::OtherError(message) => {
                write!(f, "[roicopy::OtherError] {}", message)
            }
        }
    }
}

impl std::error::Error for RoiCopyError {}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_malformed_mask_message_with_huge_size() {
        let err = RoiCopyError::MalformedMaskError {
            bits: 8,
            width: usize::MAX,
            height: 2,
        };
        assert!(err.to_string().contains(&usize::MAX.to_string()));
    }
}
