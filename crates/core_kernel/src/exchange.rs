//! Currency conversion
//!
//! Claims are submitted in the claimant's currency and reviewed in the
//! company's currency. Conversion sits behind the `CurrencyConverter` trait so
//! a live rate feed can replace the static table used by default.

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::money::{Currency, Money, MoneyError};

/// Converts money between currencies
pub trait CurrencyConverter: Send + Sync {
    /// Converts `money` into `target`, rounded to the target's decimal places
    fn convert(&self, money: &Money, target: Currency) -> Result<Money, MoneyError>;
}

/// Converter backed by a fixed table of rates quoted against USD
#[derive(Debug, Clone)]
pub struct FixedRateConverter {
    rates: HashMap<Currency, Decimal>,
}

impl FixedRateConverter {
    /// Creates a converter with no rates
    pub fn empty() -> Self {
        Self {
            rates: HashMap::new(),
        }
    }

    /// Sets the number of `currency` units per one USD
    pub fn with_rate(mut self, currency: Currency, units_per_usd: Decimal) -> Self {
        self.rates.insert(currency, units_per_usd);
        self
    }

    /// Returns the rate for a currency, if configured
    pub fn rate(&self, currency: Currency) -> Option<Decimal> {
        self.rates.get(&currency).copied()
    }
}

impl Default for FixedRateConverter {
    fn default() -> Self {
        Self::empty()
            .with_rate(Currency::USD, dec!(1))
            .with_rate(Currency::INR, dec!(83))
            .with_rate(Currency::EUR, dec!(0.92))
            .with_rate(Currency::GBP, dec!(0.79))
            .with_rate(Currency::AUD, dec!(1.52))
            .with_rate(Currency::CAD, dec!(1.35))
    }
}

impl CurrencyConverter for FixedRateConverter {
    fn convert(&self, money: &Money, target: Currency) -> Result<Money, MoneyError> {
        if money.currency() == target {
            return Ok(money.round_to_currency());
        }

        let from = self
            .rate(money.currency())
            .ok_or_else(|| MoneyError::UnsupportedCurrency(money.currency().to_string()))?;
        let to = self
            .rate(target)
            .ok_or_else(|| MoneyError::UnsupportedCurrency(target.to_string()))?;

        if from.is_zero() {
            return Err(MoneyError::InvalidAmount(format!(
                "zero rate configured for {}",
                money.currency()
            )));
        }

        let converted = to
            .checked_div(from)
            .and_then(|rate| money.amount().checked_mul(rate))
            .ok_or_else(|| {
                MoneyError::Overflow(format!("converting {money} to {target}"))
            })?;
        Ok(Money::new(converted, target).round_to_currency())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_currency_is_identity() {
        let converter = FixedRateConverter::default();
        let m = Money::new(dec!(42.50), Currency::EUR);
        assert_eq!(converter.convert(&m, Currency::EUR).unwrap(), m);
    }

    #[test]
    fn test_usd_to_inr() {
        let converter = FixedRateConverter::default();
        let m = Money::new(dec!(10), Currency::USD);
        let converted = converter.convert(&m, Currency::INR).unwrap();
        assert_eq!(converted.amount(), dec!(830));
        assert_eq!(converted.currency(), Currency::INR);
    }

    #[test]
    fn test_cross_rate_rounds_to_cents() {
        let converter = FixedRateConverter::default();
        let m = Money::new(dec!(100), Currency::EUR);
        // 100 * 0.79 / 0.92 = 85.869...
        let converted = converter.convert(&m, Currency::GBP).unwrap();
        assert_eq!(converted.amount(), dec!(85.87));
    }

    #[test]
    fn test_conversion_overflow_is_error() {
        let converter = FixedRateConverter::default();
        let m = Money::new(Decimal::MAX / dec!(10), Currency::USD);
        assert!(matches!(
            converter.convert(&m, Currency::INR),
            Err(MoneyError::Overflow(_))
        ));
    }

    #[test]
    fn test_missing_rate_is_error() {
        let converter = FixedRateConverter::empty().with_rate(Currency::USD, dec!(1));
        let m = Money::new(dec!(1), Currency::USD);
        assert!(matches!(
            converter.convert(&m, Currency::CAD),
            Err(MoneyError::UnsupportedCurrency(_))
        ));
    }
}
