// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

/// Pack an RGBA color into the signed 32-bit integer OMERO stores
///
/// # Examples
///
/// ```
/// use roicopy_core::ut::color::rgba_to_int;
///
/// assert_eq!(rgba_to_int(255, 255, 255, 255), -1);
/// assert_eq!(rgba_to_int(0, 0, 0, 255), 255);
/// assert_eq!(rgba_to_int(255, 0, 0, 255), -16776961);
/// ```
pub fn rgba_to_int(red: u8, green: u8, blue: u8, alpha: u8) -> i32 {
    i32::from_be_bytes([red, green, blue, alpha])
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_color_roundtrip_white() {
        assert_eq!(rgba_to_int(255, 255, 255, 255).to_be_bytes(), [255; 4]);
    }

    #[test]
    fn test_color_channel_order() {
        assert_eq!(rgba_to_int(0, 0, 255, 0), 0xFF00);
        assert_eq!(rgba_to_int(0, 255, 0, 0), 0xFF0000);
    }
}
