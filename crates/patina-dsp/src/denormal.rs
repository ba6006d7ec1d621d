//! Denormal-number protection for the render thread.
//!
//! Resonant filter tails decay through the denormal range, where the FPU
//! leaves its fast path. Hosts wrap the render callback in a
//! [`DenormalGuard`] so filter registers flush to zero instead.

/// Permanently enables flush-to-zero / denormals-are-zero on the calling
/// thread. Hosts call this once when a render thread starts; use
/// [`DenormalGuard`] instead when the previous state must come back.
#[inline]
pub fn flush_denormals() {
    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    #[allow(deprecated)]
    unsafe {
        use core::arch::x86_64::{_mm_getcsr, _mm_setcsr};
        _mm_setcsr(_mm_getcsr() | DAZ_FTZ);
    }
}

/// RAII guard enabling flush-to-zero / denormals-are-zero while alive.
///
/// Sets the FTZ and DAZ bits in MXCSR on x86_64 (requires the `simd` and
/// `no-denormals` features) and restores the previous control word on
/// drop. Everywhere else it is a no-op.
#[derive(Debug)]
pub struct DenormalGuard {
    #[cfg(all(feature = "simd", feature = "no-denormals", target_arch = "x86_64"))]
    prev: u32,
}

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
const DAZ_FTZ: u32 = 0x8040;

impl DenormalGuard {
    #[inline]
    pub fn new() -> Self {
        #[cfg(all(feature = "simd", feature = "no-denormals", target_arch = "x86_64"))]
        #[allow(deprecated)]
        unsafe {
            use core::arch::x86_64::{_mm_getcsr, _mm_setcsr};
            let prev = _mm_getcsr();
            _mm_setcsr(prev | DAZ_FTZ);
            return Self { prev };
        }
        #[cfg(not(all(feature = "simd", feature = "no-denormals", target_arch = "x86_64")))]
        {
            Self {}
        }
    }
}

impl Default for DenormalGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DenormalGuard {
    fn drop(&mut self) {
        #[cfg(all(feature = "simd", feature = "no-denormals", target_arch = "x86_64"))]
        #[allow(deprecated)]
        unsafe {
            core::arch::x86_64::_mm_setcsr(self.prev);
        }
    }
}
