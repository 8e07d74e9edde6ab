//! Pitch math for the note-driven engine.
//!
//! Notes are numbered 0–127 with note 49 anchored at A4 = 440 Hz, so one
//! step is one equal-tempered semitone:
//!
//! ```text
//! f = 440 · 2^((note − 49) / 12)
//! ```
//!
//! Transposition (semitones) and fine detune (cents) are expressed as
//! frequency ratios so they compose by multiplication.

use libm::exp2f;

/// Highest valid note number.
pub const MAX_NOTE: u8 = 127;

/// Note number that sounds at [`A4_FREQUENCY`].
pub const A4_NOTE: u8 = 49;

/// Reference frequency for [`A4_NOTE`] in Hz.
pub const A4_FREQUENCY: f32 = 440.0;

/// Frequency in Hz of a note number.
///
/// # Example
/// ```rust
/// use sonant_core::frequency_from_note;
///
/// assert_eq!(frequency_from_note(49), 440.0);
/// assert!((frequency_from_note(61) - 880.0).abs() < 1e-3);
/// ```
#[inline]
pub fn frequency_from_note(note: u8) -> f32 {
    A4_FREQUENCY * exp2f((f32::from(note) - f32::from(A4_NOTE)) / 12.0)
}

/// Frequency ratio of a transposition in whole semitones.
#[inline]
pub fn semitones_to_ratio(semitones: i32) -> f32 {
    exp2f(semitones as f32 / 12.0)
}

/// Frequency ratio of a detune in cents (1/100 semitone).
#[inline]
pub fn cents_to_ratio(cents: f32) -> f32 {
    exp2f(cents / 1200.0)
}

/// Sounding frequency of `note` transposed by `semitones`.
///
/// Fine detune is not folded in here; backends apply it as a separate
/// cents offset on the oscillator.
#[inline]
pub fn transposed_frequency(note: u8, semitones: i32) -> f32 {
    frequency_from_note(note) * semitones_to_ratio(semitones)
}
