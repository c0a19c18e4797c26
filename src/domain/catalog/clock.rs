//! Elapsed-time formatting

/// `mm:ss`, used for live elapsed/position readouts
pub fn format_clock(millis: u64) -> String {
    let minutes = millis / 60_000;
    let seconds = (millis % 60_000) / 1000;
    format!("{:02}:{:02}", minutes, seconds)
}

/// `m:ss`, used for saved clip durations
pub fn format_duration(millis: u64) -> String {
    let total_seconds = millis / 1000;
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}
