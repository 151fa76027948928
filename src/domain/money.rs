use super::ValidationError;

/// Money is represented as integer cents to avoid floating-point precision issues.
/// For MZN/EUR/USD, 1 unit = 100 cents, so 50.00 = 5000 cents.
pub type Cents = i64;

/// Largest amount a single entry may carry.
///
/// About 88 billion units. Up to 2^20 entries at this cap still sum inside
/// [`Cents`], so totals computed by the store cannot overflow.
pub const MAX_AMOUNT_CENTS: Cents = Cents::MAX >> 20;

// Exponents beyond this cannot produce an amount under the cap
const MAX_EXPONENT: i64 = 64;

/// Format cents as a human-readable currency string.
/// Example: 5000 -> "50.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.unsigned_abs();
    let units = abs_cents / 100;
    let remainder = abs_cents % 100;
    format!("{}{}.{:02}", sign, units, remainder)
}

/// Parse a user-entered amount into cents, leniently.
///
/// Only the leading numeric part of the input is considered: `"12.5kg"` is
/// 12.50, `" 7"` is 7.00, `"1e3"` is 1000.00 and input with no leading digits
/// (`"abc"`, `""`, `"Infinity"`) is 0. Digits past the second decimal place
/// are truncated. A comma is not a decimal separator.
///
/// Negative values and values above [`MAX_AMOUNT_CENTS`] are rejected.
pub fn parse_amount(input: &str) -> Result<Cents, ValidationError> {
    let input = input.trim();
    let (negative, rest) = match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    };

    let units_len = leading_digits(rest);
    let units_str = &rest[..units_len];
    let (decimal_str, tail) = match rest[units_len..].strip_prefix('.') {
        Some(after_dot) => after_dot.split_at(leading_digits(after_dot)),
        None => ("", &rest[units_len..]),
    };

    if units_str.is_empty() && decimal_str.is_empty() {
        return Ok(0);
    }

    let digits: Vec<u8> = units_str
        .bytes()
        .chain(decimal_str.bytes())
        .map(|b| b - b'0')
        .collect();
    if digits.iter().all(|&d| d == 0) {
        return Ok(0);
    }

    let out_of_range = || ValidationError::AmountOutOfRange(input.to_string());

    let exponent = parse_exponent(tail);
    if exponent > MAX_EXPONENT {
        return Err(out_of_range());
    }

    // Digits that land left of the cents position after shifting by the exponent
    let whole_digits = units_len as i64 + exponent.max(-MAX_EXPONENT) + 2;
    let mut cents: Cents = 0;
    for i in 0..whole_digits.max(0) as usize {
        let digit = digits.get(i).copied().unwrap_or(0);
        cents = cents
            .checked_mul(10)
            .and_then(|c| c.checked_add(Cents::from(digit)))
            .filter(|&c| c <= MAX_AMOUNT_CENTS)
            .ok_or_else(out_of_range)?;
    }

    if negative && cents > 0 {
        return Err(ValidationError::NegativeAmount(input.to_string()));
    }

    Ok(cents)
}

fn leading_digits(s: &str) -> usize {
    s.bytes().take_while(u8::is_ascii_digit).count()
}

/// `e`/`E` with an optional sign and at least one digit, else no exponent.
fn parse_exponent(tail: &str) -> i64 {
    let Some(rest) = tail.strip_prefix(['e', 'E']) else {
        return 0;
    };
    let (sign, rest) = match rest.as_bytes().first() {
        Some(b'-') => (-1, &rest[1..]),
        Some(b'+') => (1, &rest[1..]),
        _ => (1, rest),
    };
    let len = leading_digits(rest);
    if len == 0 {
        return 0;
    }
    // Too many digits to fit means a huge exponent either way
    sign * rest[..len].parse::<i64>().unwrap_or(i64::MAX)
}
