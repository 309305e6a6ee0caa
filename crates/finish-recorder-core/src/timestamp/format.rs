use chrono::Local;

const MILLIS_PER_MINUTE: i64 = 60_000;
const MILLIS_PER_DAY: i64 = 86_400_000;

/// Format UTC milliseconds as `HH:MM:SS.mmm`.
///
/// `tz_offset_minutes` is added to the UTC value before formatting; `None`
/// uses the local timezone's current offset.
pub fn convert_timestamp_to_string(utc_millis: i64, tz_offset_minutes: Option<i32>) -> String {
    let offset = tz_offset_minutes.unwrap_or_else(local_offset_minutes);
    let adjusted = utc_millis.saturating_add(i64::from(offset) * MILLIS_PER_MINUTE);
    let of_day = adjusted.rem_euclid(MILLIS_PER_DAY);

    let hours = of_day / 3_600_000;
    let minutes = (of_day / MILLIS_PER_MINUTE) % 60;
    let seconds = (of_day / 1_000) % 60;
    let millis = of_day % 1_000;

    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
}

/// Current local offset from UTC in minutes, east positive.
pub fn local_offset_minutes() -> i32 {
    Local::now().offset().local_minus_utc() / 60
}
