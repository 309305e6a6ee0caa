mod camera_state;
mod recorder;
