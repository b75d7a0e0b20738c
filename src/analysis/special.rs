//! Distribution tails used to turn statistics into p-values.

use statrs::function::{erf, gamma};

/// Complementary error function.
#[inline]
pub fn erfc(x: f64) -> f64 {
    erf::erfc(x)
}

/// Upper regularized incomplete gamma function `Q(a, x)`, for `a > 0`.
pub fn igamc(a: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 1.0;
    }
    if x.is_infinite() {
        return 0.0;
    }
    gamma::gamma_ur(a, x)
}
