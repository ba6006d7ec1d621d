#![deny(unsafe_op_in_unsafe_fn)]

pub mod denormal;
pub mod ladder;
pub mod quad;
pub mod saturator;
pub mod tuning;

pub use ladder::{
    clamped_frequency, LadderCoefficients, LadderModel, ParseLadderModelError, ProcessRate,
};
pub use quad::{QuadLadderState, LANES, MAX_COEFF, MAX_REG};
pub use tuning::{EqualTemperament, Tuning, MIDI_0_FREQ};
