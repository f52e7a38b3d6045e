//! Decimal-aware token amounts.
//!
//! All conversions that lose precision round toward zero. Trimming keeps the
//! amount in its original unit so the trimmed value is what gets burned on
//! the source chain; any dust below the coarser precision stays with the
//! sender.

use std::fmt;

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RouteError};

/// Largest precision any supported token uses.
pub const MAX_DECIMALS: u8 = 36;

fn pow10(exp: u8) -> U256 {
    U256::from(10u64).pow(U256::from(exp))
}

/// An integer amount of base units together with its decimal precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Amount {
    units: U256,
    decimals: u8,
}

impl Amount {
    pub fn from_units(units: U256, decimals: u8) -> Self {
        Self { units, decimals }
    }

    pub fn zero(decimals: u8) -> Self {
        Self::from_units(U256::ZERO, decimals)
    }

    /// Parses a non-negative decimal string such as `"0.01"` or `"1_000"`.
    ///
    /// Fraction digits beyond `decimals` are dropped.
    pub fn parse(display: &str, decimals: u8) -> Result<Self> {
        if decimals > MAX_DECIMALS {
            return Err(RouteError::InvalidAmount(format!(
                "{decimals} decimals exceeds the maximum of {MAX_DECIMALS}"
            )));
        }

        let cleaned: String = display.trim().chars().filter(|c| *c != '_').collect();
        let (whole, fraction) = match cleaned.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (cleaned.as_str(), ""),
        };

        let is_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !is_digits(whole) || !is_digits(fraction)
        {
            return Err(RouteError::InvalidAmount(format!(
                "'{display}' is not a non-negative decimal"
            )));
        }

        let kept = &fraction[..fraction.len().min(decimals as usize)];
        let padded = format!("{kept:0<width$}", width = decimals as usize);
        let digits = format!("{whole}{padded}");
        let digits = digits.trim_start_matches('0');
        let units = if digits.is_empty() {
            U256::ZERO
        } else {
            U256::from_str_radix(digits, 10)
                .map_err(|e| RouteError::InvalidAmount(format!("'{display}': {e}")))?
        };

        Ok(Self { units, decimals })
    }

    pub fn units(&self) -> U256 {
        self.units
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn is_zero(&self) -> bool {
        self.units.is_zero()
    }

    /// Floors the amount to `to_decimals` of precision without changing its unit.
    ///
    /// A no-op when `to_decimals` is at least as precise as the amount.
    pub fn trim(&self, to_decimals: u8) -> Self {
        if to_decimals >= self.decimals {
            return *self;
        }
        let step = pow10(self.decimals - to_decimals);
        Self {
            units: self.units / step * step,
            decimals: self.decimals,
        }
    }

    /// Re-expresses the amount in `to_decimals` units, flooring when scaling down.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidAmount`] if scaling up overflows 256 bits.
    pub fn scale(&self, to_decimals: u8) -> Result<Self> {
        let units = if to_decimals >= self.decimals {
            self.units
                .checked_mul(pow10(to_decimals - self.decimals))
                .ok_or_else(|| {
                    RouteError::InvalidAmount(format!(
                        "{self} does not fit in 256 bits at {to_decimals} decimals"
                    ))
                })?
        } else {
            self.units / pow10(self.decimals - to_decimals)
        };
        Ok(Self {
            units,
            decimals: to_decimals,
        })
    }

    /// Amount lost when trimming to `to_decimals`.
    pub fn dust(&self, to_decimals: u8) -> U256 {
        self.units - self.trim(to_decimals).units
    }

    /// Narrows to `u64`, the width SVM programs use for amounts.
    pub fn to_u64(&self) -> Result<u64> {
        u64::try_from(self.units).map_err(|_| {
            RouteError::InvalidAmount(format!("{} does not fit in 64 bits", self.units))
        })
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.decimals == 0 {
            return write!(f, "{}", self.units);
        }
        let divisor = pow10(self.decimals);
        let whole = self.units / divisor;
        let fraction = (self.units % divisor).to_string();
        let fraction = format!("{fraction:0>width$}", width = self.decimals as usize);
        let fraction = fraction.trim_end_matches('0');
        if fraction.is_empty() {
            write!(f, "{whole}")
        } else {
            write!(f, "{whole}.{fraction}")
        }
    }
}
