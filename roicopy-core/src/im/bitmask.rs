// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use crate::error::RoiCopyError;

/// A dense binary grid stored in row-major order
///
/// Every value is either 0 or 1. The grid has `height` rows and `width`
/// columns, so the value at row `r` and column `c` lives at `r * width + c`.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryGrid {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl BinaryGrid {
    /// Initialize a grid from row-major 0/1 values
    ///
    /// Any non-zero value is stored as 1.
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self, RoiCopyError> {
        if width.checked_mul(height) != Some(data.len()) {
            return Err(RoiCopyError::MalformedMaskError {
                bits: data.len(),
                width,
                height,
            });
        }

        let data = data.into_iter().map(|v| (v != 0) as u8).collect();

        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// An all-foreground grid
    pub fn ones(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![1; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    /// Value at row `r` and column `c`
    pub fn get(&self, r: usize, c: usize) -> u8 {
        self.data[r * self.width + c]
    }

}

/// Unpack a bit-packed mask into a dense binary grid
///
/// Bits are read most-significant first within each byte. Only the first
/// `width * height` bits are used and any trailing padding is ignored.
///
/// # Arguments
///
/// * `bytes` - Packed mask bytes
/// * `width` - Mask width in pixels
/// * `height` - Mask height in pixels
///
/// # Examples
///
/// ```
/// use roicopy_core::im::decode_bitmask;
///
/// let grid = decode_bitmask(&[0b1010_1100], 4, 2).unwrap();
/// assert_eq!(grid.as_raw(), &[1, 0, 1, 0, 1, 1, 0, 0]);
///
/// assert!(decode_bitmask(&[0xFF], 3, 3).is_err());
/// ```
pub fn decode_bitmask(bytes: &[u8], width: usize, height: usize) -> Result<BinaryGrid, RoiCopyError> {
    let bits = bytes.len().saturating_mul(8);
    let malformed = RoiCopyError::MalformedMaskError {
        bits,
        width,
        height,
    };

    let n = match width.checked_mul(height) {
        Some(n) if n <= bits => n,
        _ => return Err(malformed),
    };

    let data: Vec<u8> = bytes
        .iter()
        .flat_map(|byte| (0..8).rev().map(move |shift| (byte >> shift) & 1))
        .take(n)
        .collect();

    Ok(BinaryGrid {
        width,
        height,
        data,
    })
}

/// Pack a binary grid into bytes, most-significant bit first
///
/// The final byte is padded with zeros when `width * height` is not a
/// multiple of 8.
///
/// # Examples
///
/// ```
/// use roicopy_core::im::{BinaryGrid, encode_bitmask};
///
/// let grid = BinaryGrid::new(3, 3, vec![1, 0, 1, 0, 1, 0, 1, 0, 1]).unwrap();
/// assert_eq!(encode_bitmask(&grid), vec![0b1010_1010, 0b1000_0000]);
/// ```
pub fn encode_bitmask(grid: &BinaryGrid) -> Vec<u8> {
    grid.data
        .chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u8, |byte, (i, &bit)| byte | (bit << (7 - i)))
        })
        .collect()
}
