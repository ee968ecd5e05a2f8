//! Minimal radix-2 FFT used by the frame analyzer.
//!
//! Fixed operation order and no SIMD dispatch, so results are bit-identical everywhere the crate
//! runs.

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Complex {
    pub(crate) re: f64,
    pub(crate) im: f64,
}

impl Complex {
    fn mul(self, o: Self) -> Self {
        Self {
            re: self.re * o.re - self.im * o.im,
            im: self.re * o.im + self.im * o.re,
        }
    }

    pub(crate) fn norm(self) -> f64 {
        self.re.hypot(self.im)
    }
}

/// Largest power of two `<= n` (0 for 0).
pub(crate) fn floor_pow2(n: usize) -> usize {
    if n == 0 { 0 } else { 1 << (usize::BITS - 1 - n.leading_zeros()) }
}

/// In-place iterative Cooley-Tukey. `buf.len()` must be a power of two.
pub(crate) fn fft_in_place(buf: &mut [Complex]) {
    let n = buf.len();
    if n < 2 {
        return;
    }
    debug_assert!(n.is_power_of_two());

    let bits = n.trailing_zeros();
    for i in 0..n {
        let j = i.reverse_bits() >> (usize::BITS - bits);
        if i < j {
            buf.swap(i, j);
        }
    }

    let mut len = 2;
    while len <= n {
        let ang = -2.0 * std::f64::consts::PI / len as f64;
        for start in (0..n).step_by(len) {
            for k in 0..len / 2 {
                let w = Complex {
                    re: (ang * k as f64).cos(),
                    im: (ang * k as f64).sin(),
                };
                let a = buf[start + k];
                let b = buf[start + k + len / 2].mul(w);
                buf[start + k] = Complex {
                    re: a.re + b.re,
                    im: a.im + b.im,
                };
                buf[start + k + len / 2] = Complex {
                    re: a.re - b.re,
                    im: a.im - b.im,
                };
            }
        }
        len <<= 1;
    }
}

/// Magnitudes of the first half of the spectrum of `samples` (power-of-two length), scaled so a
/// full-scale sine lands near 1.
pub(crate) fn half_spectrum_magnitudes(samples: &[f32]) -> Vec<f64> {
    let n = samples.len();
    if n < 2 {
        return vec![samples.first().map(|s| f64::from(s.abs())).unwrap_or(0.0)];
    }
    let mut buf: Vec<Complex> = samples
        .iter()
        .map(|&s| Complex {
            re: f64::from(s),
            im: 0.0,
        })
        .collect();
    fft_in_place(&mut buf);
    let scale = 2.0 / n as f64;
    buf[..n / 2].iter().map(|c| c.norm() * scale).collect()
}

#[cfg(test)]
#[path = "../../tests/unit/audio/fft.rs"]
mod tests;
