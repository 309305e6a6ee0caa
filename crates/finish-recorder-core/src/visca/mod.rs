mod camera_state;
mod codec;
mod command;
mod controller;
mod correlator;

pub use {
    camera_state::{
        COMMAND_SETTLE_DELAY, CameraState, CameraStatePatch, ZOOM_POLL_INTERVAL,
        ZOOM_SETTLE_TIMEOUT, ZOOM_TOLERANCE, ZoomSettle, apply_camera_state, query_camera_state,
    },
    codec::{ViscaWidth, build_packet, extract_visca_value},
    command::{ExposureMode, ViscaCommand},
    controller::{
        DEFAULT_VISCA_IP, DEFAULT_VISCA_PORT, ViscaController, ViscaReply, ViscaTarget,
        ViscaTransport,
    },
    correlator::ViscaCorrelator,
};
