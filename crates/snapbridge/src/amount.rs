use eyre::Context as _;

/// Convert a non-negative decimal amount string into its integer base-unit
/// representation, without using floats.
///
/// Example: `"0.1"` at 18 decimals => `100000000000000000`.
pub fn parse_amount_ui_to_base_u128(s: &str, decimals: u32) -> eyre::Result<u128> {
    let s = s.trim();
    if s.is_empty() {
        eyre::bail!("empty amount");
    }

    let (whole, frac) = match s.split_once('.') {
        Some((a, b)) => (a, b),
        None => (s, ""),
    };

    if whole.starts_with('-') {
        eyre::bail!("amount must be non-negative");
    }

    let whole_v: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().context("parse whole")?
    };

    if frac.len() > decimals as usize {
        eyre::bail!("too many decimal places (decimals={decimals})");
    }

    let mut frac_s = frac.to_owned();
    while frac_s.len() < decimals as usize {
        frac_s.push('0');
    }
    let frac_v: u128 = if frac_s.is_empty() {
        0
    } else {
        frac_s.parse().context("parse fractional")?
    };

    let scale = 10_u128
        .checked_pow(decimals)
        .ok_or_else(|| eyre::eyre!("decimals too large"))?;

    whole_v
        .checked_mul(scale)
        .and_then(|x| x.checked_add(frac_v))
        .ok_or_else(|| eyre::eyre!("amount overflow"))
}

/// Format a milli-unit balance as a whole-unit decimal string with exactly
/// three fractional digits (the snap reports balances in milli-units).
///
/// Example: `1234` => `"1.234"`.
pub fn format_milli_units(milli: u64) -> String {
    format!("{}.{:03}", milli / 1000, milli % 1000)
}
