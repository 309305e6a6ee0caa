use crate::{RecorderError, visca::ViscaWidth};

use std::{fmt, panic::Location, str::FromStr};

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};

/// Camera exposure mode, encoded as its VISCA parameter byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ExposureMode {
    /// Full auto.
    #[default]
    Auto,
    /// Manual iris, shutter and gain.
    Manual,
    /// Shutter priority.
    ShutterPriority,
    /// Iris priority.
    IrisPriority,
    /// Brightness priority.
    Bright,
}

impl ExposureMode {
    /// VISCA parameter byte.
    pub fn code(self) -> u8 {
        match self {
            ExposureMode::Auto => 0x00,
            ExposureMode::Manual => 0x03,
            ExposureMode::ShutterPriority => 0x0a,
            ExposureMode::IrisPriority => 0x0b,
            ExposureMode::Bright => 0x0d,
        }
    }

    /// Mode for a VISCA parameter byte.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(ExposureMode::Auto),
            0x03 => Some(ExposureMode::Manual),
            0x0a => Some(ExposureMode::ShutterPriority),
            0x0b => Some(ExposureMode::IrisPriority),
            0x0d => Some(ExposureMode::Bright),
            _ => None,
        }
    }
}

impl From<ExposureMode> for u8 {
    fn from(mode: ExposureMode) -> Self {
        mode.code()
    }
}

impl TryFrom<u8> for ExposureMode {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        ExposureMode::from_code(code).ok_or_else(|| format!("unknown exposure mode 0x{:02x}", code))
    }
}

/// Camera control commands understood by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViscaCommand {
    /// Enable or disable autofocus.
    AutoFocus(bool),
    /// Drive focus toward near.
    FocusIn,
    /// Drive focus toward far.
    FocusOut,
    /// One-push autofocus.
    FocusOnce,
    /// Stop focus drive.
    FocusReset,
    /// Drive zoom toward tele.
    ZoomIn,
    /// Drive zoom toward wide.
    ZoomOut,
    /// Stop zoom drive.
    ZoomReset,
    /// Select exposure mode.
    ExposureMode(ExposureMode),
    /// Step iris up.
    IrisUp,
    /// Step iris down.
    IrisDown,
    /// Reset iris.
    IrisReset,
    /// Step shutter up.
    ShutterUp,
    /// Step shutter down.
    ShutterDown,
    /// Reset shutter.
    ShutterReset,
    /// Step gain up.
    GainUp,
    /// Step gain down.
    GainDown,
    /// Reset gain.
    GainReset,
    /// Direct iris position.
    SetIris(u8),
    /// Direct shutter position.
    SetShutter(u8),
    /// Direct gain position.
    SetGain(u8),
    /// Direct brightness position.
    SetBrightness(u8),
    /// Direct zoom position.
    SetZoom(u16),
    /// Direct focus position.
    SetFocus(u16),
    /// Inquire autofocus mode.
    AutoFocusValue,
    /// Inquire focus position.
    FocusValue,
    /// Inquire zoom position.
    ZoomValue,
    /// Inquire exposure mode.
    ExposureModeValue,
    /// Inquire iris position.
    IrisValue,
    /// Inquire shutter position.
    ShutterValue,
    /// Inquire gain position.
    GainValue,
    /// Inquire brightness position.
    BrightnessValue,
}

impl ViscaCommand {
    /// Protocol table name, as accepted by [`FromStr`].
    pub fn name(&self) -> &'static str {
        match self {
            ViscaCommand::AutoFocus(_) => "AUTO_FOCUS",
            ViscaCommand::FocusIn => "FOCUS_IN",
            ViscaCommand::FocusOut => "FOCUS_OUT",
            ViscaCommand::FocusOnce => "FOCUS_ONCE",
            ViscaCommand::FocusReset => "FOCUS_RESET",
            ViscaCommand::ZoomIn => "ZOOM_IN",
            ViscaCommand::ZoomOut => "ZOOM_OUT",
            ViscaCommand::ZoomReset => "ZOOM_RESET",
            ViscaCommand::ExposureMode(_) => "EXPOSURE_MODE",
            ViscaCommand::IrisUp => "IRIS_UP",
            ViscaCommand::IrisDown => "IRIS_DOWN",
            ViscaCommand::IrisReset => "IRIS_RESET",
            ViscaCommand::ShutterUp => "SHUTTER_UP",
            ViscaCommand::ShutterDown => "SHUTTER_DOWN",
            ViscaCommand::ShutterReset => "SHUTTER_RESET",
            ViscaCommand::GainUp => "GAIN_UP",
            ViscaCommand::GainDown => "GAIN_DOWN",
            ViscaCommand::GainReset => "GAIN_RESET",
            ViscaCommand::SetIris(_) => "SET_IRIS",
            ViscaCommand::SetShutter(_) => "SET_SHUTTER",
            ViscaCommand::SetGain(_) => "SET_GAIN",
            ViscaCommand::SetBrightness(_) => "SET_BRIGHTNESS",
            ViscaCommand::SetZoom(_) => "SET_ZOOM",
            ViscaCommand::SetFocus(_) => "SET_FOCUS",
            ViscaCommand::AutoFocusValue => "AUTO_FOCUS_VALUE",
            ViscaCommand::FocusValue => "FOCUS_VALUE",
            ViscaCommand::ZoomValue => "ZOOM_VALUE",
            ViscaCommand::ExposureModeValue => "EXPOSURE_MODE_VALUE",
            ViscaCommand::IrisValue => "IRIS_VALUE",
            ViscaCommand::ShutterValue => "SHUTTER_VALUE",
            ViscaCommand::GainValue => "GAIN_VALUE",
            ViscaCommand::BrightnessValue => "BRIGHTNESS_VALUE",
        }
    }

    /// Whether this is an inquiry (`81 09 ..`) rather than an action.
    pub fn is_inquiry(&self) -> bool {
        self.name().ends_with("_VALUE")
    }

    /// Width of the field an inquiry reply carries. `None` for actions.
    pub fn reply_width(&self) -> Option<ViscaWidth> {
        match self {
            ViscaCommand::AutoFocusValue | ViscaCommand::ExposureModeValue => Some(ViscaWidth::One),
            ViscaCommand::IrisValue
            | ViscaCommand::ShutterValue
            | ViscaCommand::GainValue
            | ViscaCommand::BrightnessValue => Some(ViscaWidth::Two),
            ViscaCommand::FocusValue | ViscaCommand::ZoomValue => Some(ViscaWidth::Four),
            _ => None,
        }
    }
}

impl fmt::Display for ViscaCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViscaCommand::AutoFocus(on) => write!(f, "{}={}", self.name(), on),
            ViscaCommand::ExposureMode(mode) => write!(f, "{}={}", self.name(), mode.code()),
            ViscaCommand::SetIris(v)
            | ViscaCommand::SetShutter(v)
            | ViscaCommand::SetGain(v)
            | ViscaCommand::SetBrightness(v) => write!(f, "{}={}", self.name(), v),
            ViscaCommand::SetZoom(v) | ViscaCommand::SetFocus(v) => {
                write!(f, "{}={}", self.name(), v)
            }
            _ => f.write_str(self.name()),
        }
    }
}

impl FromStr for ViscaCommand {
    type Err = RecorderError;

    /// Parse `NAME` or `NAME=value`, e.g. `FOCUS_IN`, `SET_ZOOM=4000`,
    /// `AUTO_FOCUS=on`, `EXPOSURE_MODE=manual`.
    ///
    /// Unknown names and missing or out-of-range values are
    /// [`RecorderError::UnsupportedCommand`].
    #[track_caller]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caller = Location::caller();
        let unsupported = || RecorderError::UnsupportedCommand {
            command: s.to_string(),
            location: ErrorLocation::from(caller),
        };

        let (name, value) = match s.trim().split_once('=') {
            Some((name, value)) => (name.trim(), Some(value.trim())),
            None => (s.trim(), None),
        };
        let name = name.to_ascii_uppercase();

        let byte = || value.and_then(parse_number).and_then(|v| u8::try_from(v).ok());
        let word = || value.and_then(parse_number).and_then(|v| u16::try_from(v).ok());

        let cmd = match (name.as_str(), value) {
            ("AUTO_FOCUS", Some(v)) => ViscaCommand::AutoFocus(parse_switch(v).ok_or_else(unsupported)?),
            ("EXPOSURE_MODE", Some(v)) => {
                ViscaCommand::ExposureMode(parse_exposure_mode(v).ok_or_else(unsupported)?)
            }
            ("SET_IRIS", Some(_)) => ViscaCommand::SetIris(byte().ok_or_else(unsupported)?),
            ("SET_SHUTTER", Some(_)) => ViscaCommand::SetShutter(byte().ok_or_else(unsupported)?),
            ("SET_GAIN", Some(_)) => ViscaCommand::SetGain(byte().ok_or_else(unsupported)?),
            ("SET_BRIGHTNESS", Some(_)) => {
                ViscaCommand::SetBrightness(byte().ok_or_else(unsupported)?)
            }
            ("SET_ZOOM", Some(_)) => ViscaCommand::SetZoom(word().ok_or_else(unsupported)?),
            ("SET_FOCUS", Some(_)) => ViscaCommand::SetFocus(word().ok_or_else(unsupported)?),
            ("FOCUS_IN", None) => ViscaCommand::FocusIn,
            ("FOCUS_OUT", None) => ViscaCommand::FocusOut,
            ("FOCUS_ONCE", None) => ViscaCommand::FocusOnce,
            ("FOCUS_RESET", None) => ViscaCommand::FocusReset,
            ("ZOOM_IN", None) => ViscaCommand::ZoomIn,
            ("ZOOM_OUT", None) => ViscaCommand::ZoomOut,
            ("ZOOM_RESET", None) => ViscaCommand::ZoomReset,
            ("IRIS_UP", None) => ViscaCommand::IrisUp,
            ("IRIS_DOWN", None) => ViscaCommand::IrisDown,
            ("IRIS_RESET", None) => ViscaCommand::IrisReset,
            ("SHUTTER_UP", None) => ViscaCommand::ShutterUp,
            ("SHUTTER_DOWN", None) => ViscaCommand::ShutterDown,
            ("SHUTTER_RESET", None) => ViscaCommand::ShutterReset,
            ("GAIN_UP", None) => ViscaCommand::GainUp,
            ("GAIN_DOWN", None) => ViscaCommand::GainDown,
            ("GAIN_RESET", None) => ViscaCommand::GainReset,
            ("AUTO_FOCUS_VALUE", None) => ViscaCommand::AutoFocusValue,
            ("FOCUS_VALUE", None) => ViscaCommand::FocusValue,
            ("ZOOM_VALUE", None) => ViscaCommand::ZoomValue,
            ("EXPOSURE_MODE_VALUE", None) => ViscaCommand::ExposureModeValue,
            ("IRIS_VALUE", None) => ViscaCommand::IrisValue,
            ("SHUTTER_VALUE", None) => ViscaCommand::ShutterValue,
            ("GAIN_VALUE", None) => ViscaCommand::GainValue,
            ("BRIGHTNESS_VALUE", None) => ViscaCommand::BrightnessValue,
            _ => return Err(unsupported()),
        };

        Ok(cmd)
    }
}

fn parse_number(text: &str) -> Option<u32> {
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

fn parse_switch(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => Some(true),
        "off" | "false" | "0" => Some(false),
        _ => None,
    }
}

fn parse_exposure_mode(text: &str) -> Option<ExposureMode> {
    match text.to_ascii_lowercase().as_str() {
        "auto" => Some(ExposureMode::Auto),
        "manual" => Some(ExposureMode::Manual),
        "shutter" => Some(ExposureMode::ShutterPriority),
        "iris" => Some(ExposureMode::IrisPriority),
        "bright" => Some(ExposureMode::Bright),
        other => parse_number(other)
            .and_then(|v| u8::try_from(v).ok())
            .and_then(ExposureMode::from_code),
    }
}
