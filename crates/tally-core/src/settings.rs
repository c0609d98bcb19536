//! # Engine Settings
//!
//! The per-tenant calculation context: configured VAT tiers and the cash
//! rounding switch. Loading these from files or the environment is the
//! store layer's job (`tally_db::config`); this module only holds the
//! types and their invariants.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

/// One of the three VAT tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VatTier {
    Zero,
    Low,
    High,
}

impl VatTier {
    pub const ALL: [VatTier; 3] = [VatTier::Zero, VatTier::Low, VatTier::High];

    pub const fn as_str(&self) -> &'static str {
        match self {
            VatTier::Zero => "zero",
            VatTier::Low => "low",
            VatTier::High => "high",
        }
    }
}

/// Active VAT-tier percentages. An absent tier is unconfigured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VatTiers {
    pub zero: Option<Decimal>,
    pub low: Option<Decimal>,
    pub high: Option<Decimal>,
}

impl VatTiers {
    /// Percentage configured for a tier.
    pub fn rate(&self, tier: VatTier) -> Option<Decimal> {
        match tier {
            VatTier::Zero => self.zero,
            VatTier::Low => self.low,
            VatTier::High => self.high,
        }
    }

    /// Tier whose percentage equals `vat` exactly.
    ///
    /// Matching is numeric, so `21` and `21.0` are the same tier. When two
    /// tiers share a percentage the first of zero/low/high wins.
    pub fn tier_for(&self, vat: Decimal) -> Option<VatTier> {
        VatTier::ALL
            .into_iter()
            .find(|tier| self.rate(*tier) == Some(vat))
    }

    /// Checks every configured tier is within 0..=100.
    pub fn validate(&self) -> CoreResult<()> {
        for tier in VatTier::ALL {
            if let Some(rate) = self.rate(tier) {
                if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
                    return Err(CoreError::invalid_setting(
                        format!("vat.{}", tier.as_str()),
                        format!("{rate} is not between 0 and 100"),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Everything a calculation needs besides the record itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub vat: VatTiers,

    /// Round cash-only change to `rounding_step`.
    pub cash_rounding: bool,

    /// Cash rounding granularity. Default: 0.05
    pub rounding_step: Money,
}

impl Default for EngineSettings {
    /// 0/9/21 VAT tiers with 0.05 cash rounding.
    fn default() -> Self {
        EngineSettings {
            vat: VatTiers {
                zero: Some(Decimal::ZERO),
                low: Some(Decimal::from(9)),
                high: Some(Decimal::from(21)),
            },
            cash_rounding: true,
            rounding_step: Money::from_cents(5),
        }
    }
}

impl EngineSettings {
    pub fn with_vat(mut self, vat: VatTiers) -> Self {
        self.vat = vat;
        self
    }

    pub fn with_cash_rounding(mut self, enabled: bool) -> Self {
        self.cash_rounding = enabled;
        self
    }

    /// Validates tier ranges and the rounding step.
    pub fn validate(&self) -> CoreResult<()> {
        self.vat.validate()?;
        if self.rounding_step.is_negative() {
            return Err(CoreError::invalid_setting(
                "rounding_step",
                "must not be negative",
            ));
        }
        Ok(())
    }
}
