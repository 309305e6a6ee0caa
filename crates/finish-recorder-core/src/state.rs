//! Observable application state.
//!
//! Every piece of shared state lives in one [`AppState`] owned by the
//! application and passed by reference to whatever needs it. Each field is an
//! [`Observable`] with read, update and subscribe access.

use crate::{
    recorder::{FrameGrab, Guide, RecordingLogEntry, RecordingProps, RecordingStatus},
    settings::{CameraPreset, FocusArea, StoredSettings},
    visca::{CameraState, ViscaTarget},
};

use std::{cmp::Ordering, sync::Arc};

use tokio::sync::watch;

/// A value with change notification.
#[derive(Debug)]
pub struct Observable<T> {
    tx: watch::Sender<T>,
}

impl<T: Clone> Observable<T> {
    /// Wrap `initial`.
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Clone of the current value.
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Read the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Replace the value and notify subscribers. Returns the old value.
    pub fn set(&self, value: T) -> T {
        self.tx.send_replace(value)
    }

    /// Modify the value in place and notify subscribers.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.tx.send_modify(f);
    }

    /// Receiver that observes every subsequent change.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

impl<T: Clone + Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Process-wide application state.
#[derive(Debug)]
pub struct AppState {
    /// Stored recording configuration.
    pub recording_props: Observable<RecordingProps>,
    /// Recording props edited but not yet applied by a restart.
    pub recording_props_pending: Observable<bool>,
    /// Finish-guide offsets.
    pub guide: Observable<Guide>,
    /// Report every frame gap.
    pub report_all_gaps: Observable<bool>,
    /// Burn a time overlay into recordings.
    pub add_time_overlay: Observable<bool>,
    /// Selected waypoint.
    pub waypoint: Observable<String>,
    /// Waypoints heard on the network, naturally sorted.
    pub waypoint_list: Observable<Vec<String>>,
    /// Focus scoring region.
    pub focus_area: Observable<FocusArea>,
    /// Whether recording was requested.
    pub is_recording: Observable<bool>,
    /// When recording was last started, UTC milliseconds.
    pub recording_start_time: Observable<u64>,
    /// Last recorder status, merged over defaults.
    pub recording_status: Observable<RecordingStatus>,
    /// Most recently grabbed frame.
    pub frame_grab: Observable<Arc<FrameGrab>>,
    /// Recorder events pushed so far.
    pub system_log: Observable<Vec<RecordingLogEntry>>,
    /// Count of unacknowledged error events.
    pub logger_alert: Observable<u32>,
    /// Last known camera configuration.
    pub camera_state: Observable<CameraState>,
    /// Saved camera presets.
    pub presets: Observable<Vec<CameraPreset>>,
    /// VISCA destination.
    pub visca_target: Observable<ViscaTarget>,
    /// Camera connection state reported by the recorder.
    pub visca_state: Observable<String>,
}

impl AppState {
    /// Build state from persisted settings.
    pub fn new(settings: &StoredSettings, visca_target: ViscaTarget) -> Self {
        Self {
            recording_props: Observable::new(settings.recording.clone()),
            recording_props_pending: Observable::new(false),
            guide: Observable::new(settings.guide),
            report_all_gaps: Observable::new(settings.report_all_gaps),
            add_time_overlay: Observable::new(settings.add_time_overlay),
            waypoint: Observable::new(settings.waypoint.clone()),
            waypoint_list: Observable::default(),
            focus_area: Observable::new(settings.focus_area),
            is_recording: Observable::new(false),
            recording_start_time: Observable::new(0),
            recording_status: Observable::default(),
            frame_grab: Observable::new(Arc::new(FrameGrab::test_pattern())),
            system_log: Observable::default(),
            logger_alert: Observable::new(0),
            camera_state: Observable::default(),
            presets: Observable::new(settings.presets.clone()),
            visca_target: Observable::new(visca_target),
            visca_state: Observable::new("Idle".to_string()),
        }
    }

    /// Snapshot of the persisted subset.
    pub fn to_settings(&self) -> StoredSettings {
        StoredSettings {
            recording: self.recording_props.get(),
            guide: self.guide.get(),
            report_all_gaps: self.report_all_gaps.get(),
            add_time_overlay: self.add_time_overlay.get(),
            waypoint: self.waypoint.get(),
            presets: self.presets.get(),
            focus_area: self.focus_area.get(),
        }
    }

    /// Camera state saved in `slot`.
    pub fn preset(&self, slot: u8) -> Option<CameraState> {
        self.presets
            .with(|presets| presets.iter().find(|p| p.slot == slot).map(|p| p.state))
    }

    /// Save `state` into `slot`, replacing what was there.
    pub fn store_preset(&self, slot: u8, state: CameraState) {
        self.presets.update(|presets| {
            match presets.iter_mut().find(|p| p.slot == slot) {
                Some(preset) => preset.state = state,
                None => presets.push(CameraPreset { slot, state }),
            }
            presets.sort_by_key(|p| p.slot);
        });
    }

    /// Add `waypoint` to the known list, keeping numeric-aware order.
    ///
    /// Returns `false` if it was already listed.
    pub fn add_waypoint(&self, waypoint: &str) -> bool {
        let mut added = false;
        self.waypoint_list.update(|list| {
            if !list.iter().any(|w| w == waypoint) {
                list.push(waypoint.to_string());
                list.sort_by(|a, b| natural_cmp(a, b));
                added = true;
            }
        });
        added
    }
}

/// Compare strings with digit runs ordered by value and letters case-insensitively.
///
/// `"Finish2" < "Finish10"`, `"start" == "Start"` for ordering purposes.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a = a.chars().peekable();
    let mut b = b.chars().peekable();

    loop {
        match (a.peek().copied(), b.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let left = take_digits(&mut a);
                let right = take_digits(&mut b);
                let left = left.trim_start_matches('0');
                let right = right.trim_start_matches('0');
                let ord = left.len().cmp(&right.len()).then_with(|| left.cmp(right));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                let ord = x.to_lowercase().cmp(y.to_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                a.next();
                b.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.next_if(|c| c.is_ascii_digit()) {
        digits.push(c);
    }
    digits
}
