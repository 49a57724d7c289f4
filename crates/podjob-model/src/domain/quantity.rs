//! Syntax check for orchestrator resource quantities (`100m`, `128Mi`, `1.5`, `2e3`).

const SUFFIXES: &[&str] = &[
    "", "m", "k", "M", "G", "T", "P", "E", "Ki", "Mi", "Gi", "Ti", "Pi", "Ei",
];

/// Returns `true` if `value` is a well-formed resource quantity.
///
/// Accepts a non-negative decimal number (optionally `+` signed) followed by either a
/// binary/decimal SI suffix or a decimal exponent (`e3`, `E-2`). Surrounding whitespace
/// is rejected since the value is passed to the orchestrator verbatim.
pub fn is_valid_quantity(value: &str) -> bool {
    let unsigned = value.strip_prefix('+').unwrap_or(value);

    let number_len = unsigned
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(unsigned.len());
    let (number, suffix) = unsigned.split_at(number_len);

    if !is_decimal(number) {
        return false;
    }
    if SUFFIXES.contains(&suffix) {
        return true;
    }
    match suffix.strip_prefix(['e', 'E']) {
        Some(exp) => {
            let digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
            !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

fn is_decimal(number: &str) -> bool {
    let mut parts = number.splitn(2, '.');
    let int = parts.next().unwrap_or_default();
    let frac = parts.next();

    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    match frac {
        None => !int.is_empty() && all_digits(int),
        Some(frac) => (!int.is_empty() || !frac.is_empty()) && all_digits(int) && all_digits(frac),
    }
}
