pub type Tick = i64; // absolute position within one MIDI track
pub type Seconds = f64;

pub const VELOCITY_MAX: u8 = 127;

/// Clamps into `[0, 1]`; NaN collapses to 0.
pub fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}
