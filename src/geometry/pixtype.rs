pub const UNKNOWN_PIXTYPE: &str = "UNKNOWN";

/// Pixel type label for a FITS `BITPIX` code.
pub fn pixel_type(bitpix: i64) -> &'static str {
    match bitpix {
        8 => "byte",
        16 => "short",
        32 => "int",
        64 => "long",
        -32 => "float",
        -64 => "double",
        _ => UNKNOWN_PIXTYPE,
    }
}
