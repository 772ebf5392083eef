//! Money formatting and parsing for amounts shown in and submitted from pages.
//!
//! Format: sign + currency symbol + number with thousands separator.
//! Amounts travel through the category tree as major units (`f64`) and are
//! stored as integer cents.

/// Format an amount in major units without sign prefix.
/// Example: 1234.5 -> "R$ 1.234,50" (BRL, pt-BR)
pub fn format_amount(value: f64, currency: &str, locale: &str) -> String {
    format_cents(amount_to_cents(value), currency, locale, false)
}

/// Like [`format_amount`], but negative values carry a leading minus.
pub fn format_signed_amount(value: f64, currency: &str, locale: &str) -> String {
    format_cents(amount_to_cents(value), currency, locale, true)
}

/// Plain decimal for form inputs: "1234.50".
pub fn format_input_amount(value: f64) -> String {
    let cents = amount_to_cents(value);
    let sign = if cents < 0 { "-" } else { "" };
    format!("{}{}.{:02}", sign, cents.abs() / 100, cents.abs() % 100)
}

/// Tailwind text color for a remaining-budget value.
pub fn remaining_class(value: f64) -> &'static str {
    if value < 0.0 {
        "text-red-600 dark:text-red-400"
    } else {
        "text-gray-900 dark:text-gray-100"
    }
}

/// Largest magnitude accepted for a single amount: one hundred billion in
/// major units. Keeps per-category SQL sums far from `i64` overflow.
pub const MAX_AMOUNT_CENTS: i64 = 10_000_000_000_000;

pub fn amount_to_cents(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

pub fn cents_to_amount(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Parse a user-entered amount into cents.
///
/// Accepts an optional leading minus, digits, and at most one decimal
/// separator (`.` or `,`) followed by up to two digits. Thousands separators
/// are rejected because "1.234" is ambiguous.
pub fn parse_amount_cents(input: &str) -> Result<i64, String> {
    let trimmed = input.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, trimmed),
    };

    if digits.is_empty() {
        return Err("Informe um valor".into());
    }

    let (whole, fraction) = match digits.find(['.', ',']) {
        Some(pos) => (&digits[..pos], &digits[pos + 1..]),
        None => (digits, ""),
    };

    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(whole) || !all_digits(fraction) || (whole.is_empty() && fraction.is_empty()) {
        return Err(format!("Valor inválido: {}", input.trim()));
    }
    if fraction.len() > 2 {
        return Err("Use no máximo duas casas decimais".into());
    }

    let whole_value: i64 = if whole.is_empty() {
        0
    } else {
        whole
            .parse()
            .map_err(|_| format!("Valor muito grande: {}", input.trim()))?
    };
    let fraction_value: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().unwrap_or(0) * 10,
        _ => fraction.parse::<i64>().unwrap_or(0),
    };

    let cents = whole_value
        .checked_mul(100)
        .and_then(|c| c.checked_add(fraction_value))
        .filter(|c| *c <= MAX_AMOUNT_CENTS)
        .ok_or_else(|| format!("Valor muito grande: {}", input.trim()))?;

    Ok(if negative { -cents } else { cents })
}

/// Convert an amount received as a JSON number into cents.
///
/// Applies the same rules as [`parse_amount_cents`]: at most two decimal
/// places and a magnitude within [`MAX_AMOUNT_CENTS`].
pub fn exact_amount_cents(value: f64) -> Result<i64, String> {
    if !value.is_finite() {
        return Err("Valor inválido".into());
    }

    let scaled = value * 100.0;
    if scaled.abs() > MAX_AMOUNT_CENTS as f64 {
        return Err(format!("Valor muito grande: {}", value));
    }

    let cents = scaled.round();
    if (scaled - cents).abs() > 1e-6 {
        return Err("Use no máximo duas casas decimais".into());
    }

    Ok(cents as i64)
}

fn format_cents(cents: i64, currency: &str, locale: &str, signed: bool) -> String {
    let is_negative = cents < 0;
    let abs_cents = cents.abs();
    let whole = abs_cents / 100;
    let fractional = abs_cents % 100;

    let (thousands_sep, decimal_sep) = locale_separators(locale);
    let whole_str = format_with_thousands(whole, thousands_sep);
    let symbol = currency_symbol(currency);

    if signed && is_negative {
        format!("-{}{}{}{:02}", symbol, whole_str, decimal_sep, fractional)
    } else {
        format!("{}{}{}{:02}", symbol, whole_str, decimal_sep, fractional)
    }
}

/// Get thousands and decimal separators based on locale.
fn locale_separators(locale: &str) -> (char, char) {
    match locale {
        "pt-BR" | "pt-PT" | "de-DE" | "de-AT" | "es-ES" | "es-AR" | "it-IT" | "fr-FR"
        | "nl-NL" => ('.', ','),
        _ => (',', '.'),
    }
}

/// Format a number with thousands separators.
fn format_with_thousands(n: i64, sep: char) -> String {
    if n == 0 {
        return "0".to_string();
    }

    let s = n.to_string();
    let chars: Vec<char> = s.chars().rev().collect();
    let mut result = Vec::new();

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(sep);
        }
        result.push(*c);
    }

    result.iter().rev().collect()
}

/// Get currency symbol for a currency code.
fn currency_symbol(currency: &str) -> &'static str {
    match currency.to_uppercase().as_str() {
        "BRL" => "R$\u{00a0}",
        "USD" => "$",
        "EUR" => "\u{20ac}",
        "GBP" => "\u{00a3}",
        "ARS" => "AR$\u{00a0}",
        _ => "",
    }
}
