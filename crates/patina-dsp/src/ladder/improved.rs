//! Improved ladder model after D'Angelo and Valimaki.
//!
//! Derived from a circuit analysis of the transistor ladder rather than a
//! block-diagram idealization, and validated upstream against an Ngspice
//! simulation; it is notably better at preserving the self-oscillating
//! behaviour of the hardware. Each stage integrates its transistor voltage
//! with a trapezoidal (semi-implicit) rule, carrying the voltage, its
//! previous derivative, and a cached `tanh(V / 2VT)` between samples.

use crate::ladder::{clamped_frequency, LadderCoefficients, ProcessRate};
use crate::quad::{QuadLadderState, LANES};
use crate::tuning::Tuning;

/// Coefficient slot: cutoff in Hz.
pub const C_CUTOFF: usize = 0;
/// Coefficient slot: resonance, scaled by 4.
pub const C_RESO: usize = 1;
/// Coefficient slot: bilinear-transform intermediate `pi * fc / rate`.
pub const C_X: usize = 2;
/// Coefficient slot: frequency-warped transconductance.
pub const C_G: usize = 3;
/// Coefficient slot: input drive.
pub const C_DRIVE: usize = 4;

/// Register offset of the four stage voltages.
pub const R_V: usize = 0;
/// Register offset of the four previous stage derivatives.
pub const R_DV: usize = 4;
/// Register offset of the four cached `tanh(V / 2VT)` values.
pub const R_TV: usize = 8;
/// Registers used per lane.
pub const N_REG: usize = 12;

/// Transistor thermal voltage shared by all four stages.
const VT: f64 = 0.312;

pub fn coefficients(
    pitch: f32,
    resonance: f32,
    rate: ProcessRate,
    tuning: &dyn Tuning,
) -> LadderCoefficients {
    let cutoff = clamped_frequency(pitch, rate, tuning);
    let x = std::f64::consts::PI * f64::from(cutoff) * rate.inv;
    let g = 4.0 * std::f64::consts::PI * VT * f64::from(cutoff) * (1.0 - x) / (1.0 + x);

    let mut out = LadderCoefficients::default();
    out.c[C_CUTOFF] = cutoff;
    out.c[C_RESO] = resonance * 4.0;
    out.c[C_X] = x as f32;
    out.c[C_G] = g as f32;
    out.c[C_DRIVE] = 1.0;
    out
}

fn step(
    input: f64,
    drive: f64,
    resonance: f64,
    g: f64,
    dt: f64,
    v: &mut [f64; 4],
    dv: &mut [f64; 4],
    tv: &mut [f64; 4],
) -> f64 {
    let dv0 = -g * (((drive * input + resonance * v[3]) / (2.0 * VT)).tanh() + tv[0]);
    v[0] += (dv0 + dv[0]) * 0.5 * dt;
    dv[0] = dv0;
    tv[0] = (v[0] / (2.0 * VT)).tanh();

    for i in 1..4 {
        let dvi = g * (tv[i - 1] - tv[i]);
        v[i] += (dvi + dv[i]) * 0.5 * dt;
        dv[i] = dvi;
        tv[i] = (v[i] / (2.0 * VT)).tanh();
    }

    v[3]
}

pub fn process_quad(
    state: &mut QuadLadderState,
    input: [f32; LANES],
    rate: ProcessRate,
) -> [f32; LANES] {
    let mut out = [0.0f32; LANES];
    for lane in 0..LANES {
        if !state.active[lane] {
            continue;
        }

        let drive = f64::from(state.coeff[C_DRIVE][lane]);
        let resonance = f64::from(state.coeff[C_RESO][lane]);
        let g = f64::from(state.coeff[C_G][lane]);

        let mut v = [0.0f64; 4];
        let mut dv = [0.0f64; 4];
        let mut tv = [0.0f64; 4];
        for i in 0..4 {
            v[i] = f64::from(state.reg[R_V + i][lane]);
            dv[i] = f64::from(state.reg[R_DV + i][lane]);
            tv[i] = f64::from(state.reg[R_TV + i][lane]);
        }

        out[lane] = step(
            f64::from(input[lane]),
            drive,
            resonance,
            g,
            rate.inv,
            &mut v,
            &mut dv,
            &mut tv,
        ) as f32;

        for i in 0..4 {
            state.reg[R_V + i][lane] = v[i] as f32;
            state.reg[R_DV + i][lane] = dv[i] as f32;
            state.reg[R_TV + i][lane] = tv[i] as f32;
        }
    }
    out
}
