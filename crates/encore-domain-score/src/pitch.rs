const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Scientific pitch name, sharps only: 60 is `C4`, 0 is `C-1`.
pub fn pitch_name(pitch: u8) -> String {
    let octave = (pitch / 12) as i32 - 1;
    format!("{}{}", NOTE_NAMES[pitch_class(pitch)], octave)
}

pub fn pitch_class(pitch: u8) -> usize {
    (pitch % 12) as usize
}
