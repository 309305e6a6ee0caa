//! VISCA packet encoding and inquiry decoding.
//!
//! Packets start with `81 01 04` (action) or `81 09 04` (inquiry) and end
//! with the `FF` terminator. Numeric parameters are spread one nibble per
//! byte, most significant nibble first, right before the terminator.

use crate::visca::ViscaCommand;

const ADDRESS: u8 = 0x81;
const ACTION: u8 = 0x01;
const INQUIRY: u8 = 0x09;
const CATEGORY_CAMERA: u8 = 0x04;
const TERMINATOR: u8 = 0xff;

/// Number of nibble-bytes a reply field occupies before the terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViscaWidth {
    /// A single byte, e.g. a mode.
    One = 1,
    /// An 8-bit value as two nibbles.
    Two = 2,
    /// A 16-bit value as four nibbles.
    Four = 4,
}

impl ViscaWidth {
    /// Nibble-bytes in the field.
    pub fn nibbles(self) -> usize {
        self as usize
    }
}

/// Encode `cmd` as a VISCA packet.
pub fn build_packet(cmd: &ViscaCommand) -> Vec<u8> {
    match *cmd {
        ViscaCommand::AutoFocus(on) => action(0x38, &[if on { 0x02 } else { 0x03 }]),

        ViscaCommand::FocusIn => action(0x08, &[0x22]),
        ViscaCommand::FocusOut => action(0x08, &[0x32]),
        ViscaCommand::FocusReset => action(0x08, &[0x00]),
        ViscaCommand::FocusOnce => action(0x18, &[0x01]),
        ViscaCommand::ZoomIn => action(0x07, &[0x22]),
        ViscaCommand::ZoomOut => action(0x07, &[0x32]),
        ViscaCommand::ZoomReset => action(0x07, &[0x00]),

        ViscaCommand::ExposureMode(mode) => action(0x39, &[mode.code()]),

        ViscaCommand::IrisUp => action(0x0b, &[0x02]),
        ViscaCommand::IrisDown => action(0x0b, &[0x03]),
        ViscaCommand::IrisReset => action(0x0b, &[0x00]),
        ViscaCommand::ShutterUp => action(0x0a, &[0x02]),
        ViscaCommand::ShutterDown => action(0x0a, &[0x03]),
        ViscaCommand::ShutterReset => action(0x0a, &[0x00]),
        ViscaCommand::GainUp => action(0x0c, &[0x02]),
        ViscaCommand::GainDown => action(0x0c, &[0x03]),
        ViscaCommand::GainReset => action(0x0c, &[0x00]),

        ViscaCommand::SetIris(v) => action(0x4b, &byte_nibbles(v)),
        ViscaCommand::SetShutter(v) => action(0x4a, &byte_nibbles(v)),
        ViscaCommand::SetGain(v) => action(0x4c, &byte_nibbles(v)),
        ViscaCommand::SetBrightness(v) => action(0x4d, &byte_nibbles(v)),
        ViscaCommand::SetFocus(v) => action(0x48, &word_nibbles(v)),
        ViscaCommand::SetZoom(v) => action(0x47, &word_nibbles(v)),

        ViscaCommand::AutoFocusValue => inquiry(0x38),
        ViscaCommand::FocusValue => inquiry(0x48),
        ViscaCommand::ZoomValue => inquiry(0x47),
        ViscaCommand::ExposureModeValue => inquiry(0x39),
        ViscaCommand::IrisValue => inquiry(0x4b),
        ViscaCommand::ShutterValue => inquiry(0x4a),
        ViscaCommand::GainValue => inquiry(0x4c),
        ViscaCommand::BrightnessValue => inquiry(0x4d),
    }
}

/// Decode a `width`-nibble field that ends right before the terminator.
///
/// Returns `default` when the reply is absent, too short, or would place the
/// field inside the `y0 50` preamble.
pub fn extract_visca_value(response: Option<&[u8]>, width: ViscaWidth, default: u32) -> u32 {
    let Some(data) = response else {
        return default;
    };

    let Some(start) = data.len().checked_sub(1 + width.nibbles()) else {
        return default;
    };
    if start < 2 {
        return default;
    }

    data[start..start + width.nibbles()]
        .iter()
        .fold(0u32, |acc, &b| match width {
            ViscaWidth::One => u32::from(b),
            ViscaWidth::Two | ViscaWidth::Four => (acc << 4) | u32::from(b),
        })
}

fn action(item: u8, params: &[u8]) -> Vec<u8> {
    packet(ACTION, item, params)
}

fn inquiry(item: u8) -> Vec<u8> {
    packet(INQUIRY, item, &[])
}

fn packet(kind: u8, item: u8, params: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(5 + params.len());
    bytes.extend_from_slice(&[ADDRESS, kind, CATEGORY_CAMERA, item]);
    bytes.extend_from_slice(params);
    bytes.push(TERMINATOR);
    bytes
}

// 8-bit values use the 4-byte `00 00 0p 0q` field of the 16-bit commands.
fn byte_nibbles(v: u8) -> [u8; 4] {
    [0x00, 0x00, (v >> 4) & 0x0f, v & 0x0f]
}

fn word_nibbles(v: u16) -> [u8; 4] {
    [
        ((v >> 12) & 0x0f) as u8,
        ((v >> 8) & 0x0f) as u8,
        ((v >> 4) & 0x0f) as u8,
        (v & 0x0f) as u8,
    ]
}
