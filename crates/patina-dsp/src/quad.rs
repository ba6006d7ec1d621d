use crate::ladder::LadderCoefficients;

/// Number of filter voices packed into one processing call.
pub const LANES: usize = 4;
/// Coefficient slots per lane; the Krajeski model uses all seven.
pub const MAX_COEFF: usize = 7;
/// Register slots per lane; the Huovilainen model uses all thirteen.
pub const MAX_REG: usize = 13;

/// State for a batch of four filter voices processed in lock-step.
///
/// Lanes are stored as parallel fixed-size arrays indexed by lane rather
/// than nested per-voice structs, so batch processing walks flat memory.
/// Lane `i` is only ever read and written with lane `i`'s own
/// coefficients and registers; lanes never observe each other's state.
/// The whole batch is `Copy` and allocation-free, and is owned by exactly
/// one render thread at a time.
#[derive(Clone, Copy, Debug)]
pub struct QuadLadderState {
    /// Lanes with an assigned voice. Inactive lanes are skipped entirely:
    /// their registers are left untouched and their output slot stays 0.
    pub active: [bool; LANES],
    /// Per-lane coefficient block, refreshed at control rate by the host.
    pub coeff: [[f32; LANES]; MAX_COEFF],
    /// Per-lane registers persisted between per-sample calls.
    pub reg: [[f32; LANES]; MAX_REG],
}

impl Default for QuadLadderState {
    fn default() -> Self {
        Self {
            active: [false; LANES],
            coeff: [[0.0; LANES]; MAX_COEFF],
            reg: [[0.0; LANES]; MAX_REG],
        }
    }
}

impl QuadLadderState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Broadcasts a freshly derived coefficient set into one lane.
    #[inline]
    pub fn set_coefficients(&mut self, lane: usize, coeffs: &LadderCoefficients) {
        for (slot, value) in self.coeff.iter_mut().zip(coeffs.c.iter()) {
            slot[lane] = *value;
        }
    }

    /// Zeroes one lane's registers. Called by the host when the lane's
    /// voice is reassigned; registers carry no other resources.
    #[inline]
    pub fn reset_lane(&mut self, lane: usize) {
        for reg in &mut self.reg {
            reg[lane] = 0.0;
        }
    }
}
