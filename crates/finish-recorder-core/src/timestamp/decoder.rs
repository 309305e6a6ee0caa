//! Timestamp barcode carried in the first pixel rows of a frame.
//!
//! The capture pipeline writes a 64-bit UTC time in 100ns ticks across a row,
//! two pixels per bit, most significant bit first. A bit is `1` when the two
//! red samples sum above [`BIT_THRESHOLD`].

/// Bits in the encoded value.
pub const TIMESTAMP_BITS: usize = 64;

/// Source pixels per encoded bit.
pub const PIXELS_PER_BIT: usize = 2;

/// Red-sample sum above which a bit reads as `1`.
pub const BIT_THRESHOLD: u32 = 220;

const BYTES_PER_PIXEL: usize = 4;
const TICKS_PER_MILLI: u64 = 10_000;

/// Decode the timestamp in `row` of an RGBA `image` that is `width` pixels wide.
///
/// Returns UTC milliseconds, rounded from 100ns ticks. Returns 0 when the
/// row is narrower than the barcode or lies outside the image.
pub fn extract_timestamp_from_frame(image: &[u8], row: usize, width: usize) -> u64 {
    let Some(row_start) = barcode_row_start(image.len(), row, width) else {
        return 0;
    };

    let ticks = (0..TIMESTAMP_BITS).fold(0u64, |acc, bit| {
        let px = row_start + bit * PIXELS_PER_BIT * BYTES_PER_PIXEL;
        let sum = u32::from(image[px]) + u32::from(image[px + BYTES_PER_PIXEL]);
        (acc << 1) | u64::from(sum > BIT_THRESHOLD)
    });

    ticks_to_millis(ticks)
}

/// Timestamp of a frame: row 0, falling back to row 1.
///
/// `None` when neither row carries a barcode; callers then skip the overlay.
pub fn frame_timestamp(image: &[u8], width: usize) -> Option<u64> {
    [0, 1]
        .into_iter()
        .map(|row| extract_timestamp_from_frame(image, row, width))
        .find(|&ts| ts != 0)
}

/// Write `ticks` as a barcode into `row` of an RGBA `image`.
///
/// The producer side of [`extract_timestamp_from_frame`]. Rows too narrow
/// for the barcode are left untouched.
pub fn encode_timestamp_row(image: &mut [u8], row: usize, width: usize, ticks: u64) {
    let Some(row_start) = barcode_row_start(image.len(), row, width) else {
        return;
    };

    for bit in 0..TIMESTAMP_BITS {
        let on = (ticks >> (TIMESTAMP_BITS - 1 - bit)) & 1 == 1;
        let value = if on { 255 } else { 0 };
        for pixel in 0..PIXELS_PER_BIT {
            let px = row_start + (bit * PIXELS_PER_BIT + pixel) * BYTES_PER_PIXEL;
            image[px..px + 3].fill(value);
            image[px + 3] = 255;
        }
    }
}

/// Round 100ns ticks to milliseconds.
pub fn ticks_to_millis(ticks: u64) -> u64 {
    // Widen so ticks near u64::MAX cannot overflow the rounding add.
    ((u128::from(ticks) + u128::from(TICKS_PER_MILLI / 2)) / u128::from(TICKS_PER_MILLI)) as u64
}

/// Convert UTC milliseconds to 100ns ticks.
pub fn millis_to_ticks(millis: u64) -> u64 {
    millis.saturating_mul(TICKS_PER_MILLI)
}

fn barcode_row_start(len: usize, row: usize, width: usize) -> Option<usize> {
    if width < TIMESTAMP_BITS * PIXELS_PER_BIT {
        return None;
    }
    let row_start = row.checked_mul(width)?.checked_mul(BYTES_PER_PIXEL)?;
    let row_end = row_start.checked_add(TIMESTAMP_BITS * PIXELS_PER_BIT * BYTES_PER_PIXEL)?;
    (row_end <= len).then_some(row_start)
}
