mod backend;
mod client;
mod json_recorder;
mod message;
mod native_message;
mod null_recorder;
mod response;

pub use {
    backend::{
        PushReceiver, PushSender, RECORDER_DESTINATION, RecorderBackend, RecorderBus,
        push_channel, register_recorder,
    },
    client::{DEFAULT_VISCA_REPLY_TIMEOUT, RecorderClient},
    json_recorder::{JsonEndpoint, JsonRecorder},
    message::{
        DEFAULT_RECORDING_DURATION_SECS, Guide, RecorderMessage, RecordingProps, Rect,
        SettingsPatch, StartRecordingProps, ViscaCmdProps,
    },
    native_message::{McastContent, NativeMessage, ViscaResult, ViscaResultStatus},
    null_recorder::NullRecorder,
    response::{
        CameraInfo, FrameGrab, FrameProcessorStatus, RecorderResponse, RecordingLogEntry,
        RecordingStatus, ResponsePayload, Status,
    },
};
