//! Topic names shared by every node on the bus.

/// Broadcast topic carrying the simulation clock.
pub const TICK: &str = "tickgen/tick";

/// Raw measurements produced by the chaos sensor with the given id.
pub fn sensor_data(id: &str) -> String {
    format!("chaossensor/{id}/data")
}

/// Smoothed measurements republished by the sink with the given id.
pub fn sink_data(id: &str) -> String {
    format!("sink/{id}/data")
}

/// Scale factor control topic below a consumer base topic.
pub fn scale(base: &str) -> String {
    format!("{base}/scale")
}

/// Demand output topic below a consumer base topic.
pub fn demand(base: &str) -> String {
    format!("{base}/demand")
}

/// Managed-mode control topic below a scheduler base topic.
pub fn schedule_mode(base: &str) -> String {
    format!("{base}/schedule_mode")
}

/// Returns `true` if `segment` can be embedded in a topic path as one level.
///
/// Rejects empty strings, level separators and MQTT wildcards.
pub fn is_valid_level(segment: &str) -> bool {
    !segment.is_empty() && !segment.contains(['/', '+', '#'])
}

/// Returns `true` if `topic` is a publishable topic name (no wildcards).
pub fn is_valid_name(topic: &str) -> bool {
    !topic.is_empty() && !topic.contains(['+', '#'])
}
