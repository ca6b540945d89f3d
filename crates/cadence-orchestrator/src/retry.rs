use std::time::Duration;

const MAX_DELAY_MS: u64 = 60_000;

/// Sleep before re-attempt number `attempt` (1-based).
///
/// `base_ms × 2^(attempt-1)`, capped at 60 s, with ±25 % jitter.
#[must_use]
pub fn backoff_delay(attempt: u32, base_ms: u64) -> Duration {
    let exponent = attempt.saturating_sub(1).min(10);
    let computed = base_ms.saturating_mul(1u64 << exponent);
    let capped = computed.min(MAX_DELAY_MS);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
    Duration::from_millis(delay_ms)
}
