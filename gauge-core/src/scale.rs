//! Iteration Scaling
//!
//! Decides how many iterations the next trial runs, rounding to "nice"
//! counts (1, 2, 5, 10, 20, 50, ...) so reports stay readable.

/// Hard ceiling on iterations per trial
pub const ITERATION_CAP: u64 = 1_000_000_000;

/// Single-step growth limit relative to the previous trial
const MAX_GROWTH: u64 = 100;

/// Largest power of ten `<= n`. Returns 1 for `n <= 1`.
pub fn round_down_pow10(n: u64) -> u64 {
    let mut base = 1;
    let mut rest = n;
    while rest >= 10 {
        rest /= 10;
        base *= 10;
    }
    base
}

/// Smallest of `{b, 2b, 5b, 10b}` that is `>= n`, where `b = round_down_pow10(n)`.
pub fn round_up(n: u64) -> u64 {
    let base = round_down_pow10(n);
    [base, base.saturating_mul(2), base.saturating_mul(5)]
        .into_iter()
        .find(|&candidate| n <= candidate)
        .unwrap_or(base.saturating_mul(10))
}

/// Iteration count for the trial following one that ran `last` iterations in
/// `elapsed_ns`, aiming for `target_ns` per trial.
///
/// `high_resolution` selects between proportional projection and blind
/// 100x growth; a coarse clock cannot support projection.
pub fn next_iterations(last: u64, elapsed_ns: u64, target_ns: u64, high_resolution: bool) -> u64 {
    let last = last.max(1);

    let next = if elapsed_ns == 0 {
        // zero reading: nothing to project from
        if high_resolution {
            ITERATION_CAP
        } else {
            last.saturating_mul(MAX_GROWTH)
        }
    } else if high_resolution {
        // target / (elapsed / last), in integer space
        let projected = (target_ns as u128 * last as u128) / elapsed_ns as u128;
        let grown = projected + projected / 2;
        let clamped = grown
            .min(last as u128 * MAX_GROWTH as u128)
            .max(last as u128 + 1);
        round_up(clamped.min(ITERATION_CAP as u128) as u64)
    } else {
        round_up(last.saturating_mul(MAX_GROWTH).min(ITERATION_CAP))
    };

    next.min(ITERATION_CAP)
}
