//! Note number to frequency conversion.

use crate::engine::NoteNumber;

/// A4 reference frequency in Hz.
pub const A4_FREQ: f32 = 440.0;

/// MIDI note number of A4.
pub const A4_NOTE: NoteNumber = 69;

/// Equal-temperament frequency of a MIDI note.
#[inline]
pub fn note_to_hz(note: NoteNumber) -> f32 {
    A4_FREQ * 2.0_f32.powf((note as f32 - A4_NOTE as f32) / 12.0)
}
