//! Conversion from a gross donation to the distributable amount

use patron_config::FeeConfig;
use patron_types::Millicents;

const BPS_DENOMINATOR: u128 = 10_000;
const MILLICENTS_PER_CENT: u128 = 1_000;

/// Processing and platform fees taken before distribution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeModel {
    /// Percentage fee in basis points
    pub percent_fee_bps: u32,
    pub flat_fee_cents: u64,
}

impl Default for FeeModel {
    fn default() -> Self {
        Self {
            percent_fee_bps: patron_config::constants::PERCENT_FEE_BPS,
            flat_fee_cents: patron_config::constants::FLAT_FEE_CENTS,
        }
    }
}

impl From<&FeeConfig> for FeeModel {
    fn from(config: &FeeConfig) -> Self {
        Self {
            percent_fee_bps: config.percent_fee_bps,
            flat_fee_cents: config.flat_fee_cents,
        }
    }
}

impl FeeModel {
    /// Net donation in millicents for a gross amount in cents.
    ///
    /// The percentage fee is floored; a donation smaller than the fees
    /// nets zero.
    #[must_use]
    pub fn net_millicents(&self, amount_cents: u64) -> Millicents {
        let keep_bps = BPS_DENOMINATOR.saturating_sub(u128::from(self.percent_fee_bps));
        let after_percent =
            u128::from(amount_cents) * MILLICENTS_PER_CENT * keep_bps / BPS_DENOMINATOR;
        let flat = u128::from(self.flat_fee_cents) * MILLICENTS_PER_CENT;
        let net = after_percent.saturating_sub(flat);
        Millicents::try_from(net).unwrap_or(Millicents::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_fees_on_ten_dollars() {
        assert_eq!(FeeModel::default().net_millicents(1000), 930_000);
    }

    #[test]
    fn fees_exceeding_amount_net_zero() {
        assert_eq!(FeeModel::default().net_millicents(31), 0);
        assert_eq!(FeeModel::default().net_millicents(0), 0);
    }

    #[test]
    fn fractional_percent_is_floored() {
        let fees = FeeModel {
            percent_fee_bps: 400,
            flat_fee_cents: 0,
        };
        // 0.96 * 1 cent = 960 millicents exactly; 3 cents = 2880
        assert_eq!(fees.net_millicents(3), 2_880);

        let odd = FeeModel {
            percent_fee_bps: 333,
            flat_fee_cents: 0,
        };
        // 1 cent * 1000 * 9667 / 10000 = 966.7
        assert_eq!(odd.net_millicents(1), 966);
    }

    #[test]
    fn zero_fees_pass_through() {
        let fees = FeeModel {
            percent_fee_bps: 0,
            flat_fee_cents: 0,
        };
        assert_eq!(fees.net_millicents(1234), 1_234_000);
    }
}
