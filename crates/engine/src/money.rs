use std::{fmt, str::FromStr};

use crate::EngineError;

/// Signed money amount in **minor units** (two fraction digits).
///
/// Balances and amounts are stored as `i64` minor units; this type is the
/// bridge to decimal text at the edges of the engine (snapshot documents,
/// command line arguments).
///
/// # Examples
///
/// ```rust
/// use engine::MoneyCents;
///
/// let amount = MoneyCents::new(12_34);
/// assert_eq!(amount.cents(), 1234);
/// assert_eq!(amount.to_string(), "12.34");
/// ```
///
/// Parsing accepts `.` or `,` as decimal separator and rejects more than two
/// decimals:
///
/// ```rust
/// use engine::MoneyCents;
///
/// assert_eq!("10".parse::<MoneyCents>().unwrap().cents(), 1000);
/// assert_eq!("-10,5".parse::<MoneyCents>().unwrap().cents(), -1050);
/// assert!("12.345".parse::<MoneyCents>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct MoneyCents(i64);

impl MoneyCents {
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns the raw value in minor units.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }
}

impl fmt::Display for MoneyCents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl FromStr for MoneyCents {
    type Err = EngineError;

    /// Parses a decimal string into minor units.
    ///
    /// An optional leading `+`/`-` is accepted. A trailing fraction made of
    /// zeros beyond the second digit (`10.500`, as emitted by some exporters)
    /// is tolerated; any other third decimal is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidAmount(format!("invalid amount: {s:?}"));
        let overflow = || EngineError::InvalidAmount("amount too large".to_string());

        let trimmed = s.trim();
        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(stripped) => (true, stripped),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        if rest.is_empty() {
            return Err(EngineError::InvalidAmount("empty amount".to_string()));
        }

        let rest = rest.replace(',', ".");
        let (units_str, frac_str) = match rest.split_once('.') {
            Some((units, frac)) => (units, frac),
            None => (rest.as_str(), ""),
        };
        if units_str.is_empty()
            || !units_str.chars().all(|c| c.is_ascii_digit())
            || !frac_str.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let (kept, dropped) = frac_str.split_at(frac_str.len().min(2));
        if dropped.chars().any(|c| c != '0') {
            return Err(EngineError::InvalidAmount("too many decimals".to_string()));
        }

        let units: i64 = units_str.parse().map_err(|_| overflow())?;
        let cents: i64 = match kept.len() {
            0 => 0,
            1 => kept.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => kept.parse::<i64>().map_err(|_| invalid())?,
        };

        let total = units
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .ok_or_else(overflow)?;

        Ok(MoneyCents(if negative { -total } else { total }))
    }
}
