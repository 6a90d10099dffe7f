//! Fixed-column number formatting for solver decks.

/// Format `value` like C's `%.{precision}E`: the exponent always carries a
/// sign and at least two digits (`9.81E+00`, `1.5E-07`).
pub fn sci(value: f64, precision: usize) -> String {
    let raw = format!("{value:.precision$E}");
    let Some((mantissa, exponent)) = raw.split_once('E') else {
        return raw;
    };
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    format!("{mantissa}E{sign}{digits:0>2}")
}

/// [`sci`] right-aligned in `width` columns.
pub fn sci_field(value: f64, width: usize, precision: usize) -> String {
    format!("{:>width$}", sci(value, precision))
}
