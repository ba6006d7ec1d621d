use once_cell::sync::Lazy;

/// Frequency of MIDI note 0 with A4 tuned to 440 Hz.
pub const MIDI_0_FREQ: f32 = 8.175_799;

const TABLE_SIZE: usize = 512;
const TABLE_CENTER: f32 = 256.0;

static PITCH_TABLE: Lazy<[f32; TABLE_SIZE]> = Lazy::new(|| {
    let mut table = [0.0f32; TABLE_SIZE];
    for (i, entry) in table.iter_mut().enumerate() {
        *entry = ((i as f32 - TABLE_CENTER) / 12.0).exp2();
    }
    table
});

/// Pitch-to-frequency conversion supplied by the host.
///
/// Implementations return the frequency ratio of a (possibly fractional)
/// MIDI note relative to MIDI note 0, so `note_to_pitch(n) * MIDI_0_FREQ`
/// is the note's frequency in Hz. Hosts with scale support provide their
/// own implementation; [`EqualTemperament`] is the engine default.
pub trait Tuning {
    fn note_to_pitch(&self, note: f32) -> f32;
}

/// Twelve-tone equal temperament backed by a lazily built semitone table,
/// linearly interpolated so control-rate coefficient updates avoid a
/// transcendental call.
#[derive(Clone, Copy, Debug, Default)]
pub struct EqualTemperament;

impl Tuning for EqualTemperament {
    #[inline]
    fn note_to_pitch(&self, note: f32) -> f32 {
        let pos = (note + TABLE_CENTER).clamp(0.0, (TABLE_SIZE - 2) as f32);
        let idx = pos as usize;
        let frac = pos - idx as f32;
        PITCH_TABLE[idx] * (1.0 - frac) + PITCH_TABLE[idx + 1] * frac
    }
}
