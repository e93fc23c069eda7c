//! Field checks shared by every inbound record.
//!
//! Each helper reports failures as `"<field>: <reason>"` so the HTTP layer can
//! hand the message back unchanged.

use chrono::NaiveDate;

use crate::errors::ModelError;

pub type Result<T> = std::result::Result<T, ModelError>;

/// Trimmed, non-empty value of a required string field.
pub fn required(field: &str, value: &Option<String>) -> Result<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ModelError::field(field, "is required")),
    }
}

/// Trimmed value of an optional string field, empty when absent.
pub fn optional(value: &Option<String>) -> String {
    value.as_deref().map(str::trim).unwrap_or_default().to_string()
}

pub fn length(field: &str, value: &str, min: usize, max: usize) -> Result<()> {
    let n = value.chars().count();
    if n < min || n > max {
        return Err(if min == max {
            ModelError::field(field, format!("must be exactly {min} characters"))
        } else {
            ModelError::field(field, format!("length must be between {min} and {max}"))
        });
    }
    Ok(())
}

pub fn all_digits(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

pub fn exact_digits(field: &str, value: &str, n: usize) -> Result<()> {
    if value.len() != n || !all_digits(value) {
        return Err(ModelError::field(field, format!("must be exactly {n} digits")));
    }
    Ok(())
}

pub fn one_of<'a>(field: &str, value: &str, allowed: &[&'a str]) -> Result<&'a str> {
    allowed
        .iter()
        .find(|a| **a == value)
        .copied()
        .ok_or_else(|| ModelError::field(field, format!("must be one of {}", allowed.join(", "))))
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// `local@domain.tld` where local and domain use word characters, dots and
/// hyphens and the tld is word characters only.
pub fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else { return false };
    if local.is_empty() || !local.chars().all(|c| is_word(c) || c == '.' || c == '-') {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else { return false };
    !host.is_empty()
        && host.chars().all(|c| is_word(c) || c == '.' || c == '-')
        && !tld.is_empty()
        && tld.chars().all(is_word)
}

pub fn email(field: &str, value: &str) -> Result<String> {
    let lowered = value.trim().to_lowercase();
    if !is_email(&lowered) {
        return Err(ModelError::field(field, "invalid email format"));
    }
    Ok(lowered)
}

pub fn date(field: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ModelError::field(field, "must be a date in YYYY-MM-DD format"))
}

/// Accepts any value starting with `YYYY-MM-DDTHH:MM:SS`.
pub fn datetime_prefix(field: &str, value: &str) -> Result<()> {
    const SHAPE: &[u8] = b"dddd-dd-ddTdd:dd:dd";
    let bytes = value.as_bytes();
    let ok = bytes.len() >= SHAPE.len()
        && SHAPE.iter().zip(bytes).all(|(s, b)| match s {
            b'd' => b.is_ascii_digit(),
            other => other == b,
        });
    if !ok {
        return Err(ModelError::field(field, "must be an ISO-8601 datetime (YYYY-MM-DDTHH:MM:SS)"));
    }
    Ok(())
}

pub fn min_i64(field: &str, value: Option<i64>, min: i64) -> Result<i64> {
    match value {
        None => Err(ModelError::field(field, "is required")),
        Some(v) if v < min => Err(ModelError::field(field, format!("must be at least {min}"))),
        Some(v) => Ok(v),
    }
}

pub fn min_f64(field: &str, value: Option<f64>, min: f64) -> Result<f64> {
    match value {
        None => Err(ModelError::field(field, "is required")),
        Some(v) if !v.is_finite() => Err(ModelError::field(field, "must be a number")),
        Some(v) if v < min => Err(ModelError::field(field, format!("must be at least {min}"))),
        Some(v) => Ok(v),
    }
}

/// Country specific tax id rules: Colombian NIT (9 or 10 digits), Mexican
/// RFC, and a minimum length of 5 elsewhere.
pub fn tax_id_for_country(country: &str, tax_id: &str) -> Result<()> {
    let ok = match country {
        "CO" => all_digits(tax_id) && (9..=10).contains(&tax_id.len()),
        "MX" => is_rfc(tax_id),
        _ => tax_id.chars().count() >= 5,
    };
    if !ok {
        return Err(ModelError::field("tax_id", format!("invalid tax id for country {country}")));
    }
    Ok(())
}

fn is_rfc(tax_id: &str) -> bool {
    let chars: Vec<char> = tax_id.to_uppercase().chars().collect();
    if chars.len() != 12 && chars.len() != 13 {
        return false;
    }
    let prefix = chars.len() - 9;
    let (head, rest) = chars.split_at(prefix);
    let (date, tail) = rest.split_at(6);
    head.iter().all(|c| c.is_ascii_uppercase() || *c == 'Ñ' || *c == '&')
        && date.iter().all(|c| c.is_ascii_digit())
        && tail.iter().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}
