// In crates/engine/src/sizing.rs

use core_types::SizingRule;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Whether resolving this rule needs the account's available funds.
///
/// Lets the caller skip the broker funds call for rules that size without it.
pub fn needs_funds(rule: SizingRule) -> bool {
    matches!(
        rule,
        SizingRule::PercentageOfCapital(_) | SizingRule::DefaultPercent
    )
}

/// Turns a sizing rule into a whole share count at the given price.
///
/// Fractional shares round down. The optional notional cap is applied after
/// the rule, and any positive result is floored at one share so a configured
/// strategy always trades. A non-positive price yields zero: no price, no
/// trade.
pub fn resolve_quantity(
    rule: SizingRule,
    price: Decimal,
    available_funds: Decimal,
    max_position_size: Option<Decimal>,
) -> i64 {
    if price <= Decimal::ZERO {
        return 0;
    }

    let raw = match rule {
        SizingRule::FixedAmount(amount) => whole_shares(amount, price),
        SizingRule::PercentageOfCapital(pct) => {
            whole_shares(available_funds * pct / Decimal::ONE_HUNDRED, price)
        }
        SizingRule::FixedQuantity(quantity) => quantity,
        SizingRule::DefaultPercent => {
            whole_shares(available_funds / Decimal::ONE_HUNDRED, price)
        }
    };

    let capped = match max_position_size {
        Some(cap) => raw.min(whole_shares(cap, price)),
        None => raw,
    };

    capped.max(1)
}

fn whole_shares(notional: Decimal, price: Decimal) -> i64 {
    (notional / price).floor().to_i64().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn fixed_amount_rounds_down() {
        let qty = resolve_quantity(
            SizingRule::FixedAmount(dec!(10000)),
            dec!(2500),
            Decimal::ZERO,
            None,
        );
        assert_eq!(qty, 4);

        let qty = resolve_quantity(
            SizingRule::FixedAmount(dec!(9999)),
            dec!(2500),
            Decimal::ZERO,
            None,
        );
        assert_eq!(qty, 3);
    }

    #[test]
    fn percentage_uses_available_funds() {
        // 5% of 100_000 = 5_000 at 250 = 20 shares.
        let qty = resolve_quantity(
            SizingRule::PercentageOfCapital(dec!(5)),
            dec!(250),
            dec!(100000),
            None,
        );
        assert_eq!(qty, 20);
    }

    #[test]
    fn default_rule_is_one_percent_of_funds() {
        // 1% of 100_000 = 1_000 at 250 = 4 shares.
        let qty = resolve_quantity(SizingRule::DefaultPercent, dec!(250), dec!(100000), None);
        assert_eq!(qty, 4);
    }

    #[test]
    fn fixed_quantity_ignores_funds() {
        let qty = resolve_quantity(SizingRule::FixedQuantity(7), dec!(2500), Decimal::ZERO, None);
        assert_eq!(qty, 7);
    }

    #[test]
    fn tiny_allocations_floor_at_one_share() {
        // 100 / 2500 rounds down to zero shares, floored to one.
        let qty = resolve_quantity(
            SizingRule::FixedAmount(dec!(100)),
            dec!(2500),
            Decimal::ZERO,
            None,
        );
        assert_eq!(qty, 1);
    }

    #[test]
    fn cap_limits_the_share_count() {
        // 50_000 at 100 = 500 shares, capped to 10_000 notional = 100 shares.
        let qty = resolve_quantity(
            SizingRule::FixedAmount(dec!(50000)),
            dec!(100),
            Decimal::ZERO,
            Some(dec!(10000)),
        );
        assert_eq!(qty, 100);
    }

    #[test]
    fn non_positive_price_yields_zero() {
        let qty = resolve_quantity(SizingRule::FixedQuantity(7), Decimal::ZERO, dec!(100000), None);
        assert_eq!(qty, 0);
        let qty = resolve_quantity(SizingRule::FixedQuantity(7), dec!(-1), dec!(100000), None);
        assert_eq!(qty, 0);
    }

    #[test]
    fn funds_requirement_tracks_the_rule() {
        assert!(needs_funds(SizingRule::DefaultPercent));
        assert!(needs_funds(SizingRule::PercentageOfCapital(dec!(5))));
        assert!(!needs_funds(SizingRule::FixedAmount(dec!(10000))));
        assert!(!needs_funds(SizingRule::FixedQuantity(3)));
    }
}
