use serde::Deserialize;
use serde::de::Error as DeError;

/// Money-like value returned by carriers as either JSON string or JSON number.
///
/// For numbers, the raw JSON token is preserved so that minor-unit conversion works on the
/// decimal text instead of a binary float (`0.29` stays `29` fen, not `28`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportMoney(String);

impl TransportMoney {
    #[cfg(test)]
    pub fn from_token(token: &str) -> Self {
        Self(token.to_owned())
    }

    /// Amount × 100, truncated toward zero. `None` if the token is not a decimal number.
    pub fn to_minor_units(&self) -> Option<i64> {
        minor_units(&self.0)
    }
}

fn minor_units(token: &str) -> Option<i64> {
    let token = token.trim();
    if token.is_empty() {
        return Some(0);
    }
    let (negative, digits) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    if digits.contains(['e', 'E']) {
        let value: f64 = token.parse().ok()?;
        return Some((value * 100.0).trunc() as i64);
    }

    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }

    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut cents = 0_i64;
    for (idx, b) in fraction.bytes().take(2).enumerate() {
        let digit = i64::from(b - b'0');
        cents += if idx == 0 { digit * 10 } else { digit };
    }
    let total = whole.checked_mul(100)?.checked_add(cents)?;
    Some(if negative { -total } else { total })
}

impl<'de> Deserialize<'de> for TransportMoney {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw: Box<serde_json::value::RawValue> = Deserialize::deserialize(deserializer)?;
        let token = raw.get();

        match token.as_bytes().first().copied() {
            Some(b'"') => {
                let parsed = serde_json::from_str::<String>(token).map_err(D::Error::custom)?;
                Ok(Self(parsed))
            }
            Some(b'-' | b'0'..=b'9') => Ok(Self(token.to_owned())),
            _ => Err(D::Error::custom(
                "expected money field to be JSON string or number",
            )),
        }
    }
}
