mod decoder;
mod format;

pub use {
    decoder::{
        BIT_THRESHOLD, PIXELS_PER_BIT, TIMESTAMP_BITS, encode_timestamp_row,
        extract_timestamp_from_frame, frame_timestamp, millis_to_ticks, ticks_to_millis,
    },
    format::{convert_timestamp_to_string, local_offset_minutes},
};
