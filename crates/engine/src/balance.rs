//! Balance adjustment.
//!
//! Every change to a cached account balance goes through this module. The
//! sign table for a positive delta `d`:
//!
//! | kind     | effect                           |
//! |----------|----------------------------------|
//! | income   | `to += d`                        |
//! | expense  | `from -= d`                      |
//! | transfer | `from -= d`, `to += d` (both)    |
//!
//! A negative delta reverses the same legs. A zero delta is still applied so
//! a missing account is reported the same way.

use sea_orm::ConnectionTrait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ResultEngine, TransactionTarget, store};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegSide {
    /// Money leaves the account.
    From,
    /// Money enters the account.
    To,
}

/// One account movement produced by a delta.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BalanceLeg {
    pub account_id: Uuid,
    pub side: LegSide,
    pub delta_minor: i64,
}

/// The legs a delta produces on a target, source leg first.
pub fn balance_legs(target: TransactionTarget, delta_minor: i64) -> Vec<BalanceLeg> {
    let from = target.from_account_id().map(|account_id| BalanceLeg {
        account_id,
        side: LegSide::From,
        delta_minor,
    });
    let to = target.to_account_id().map(|account_id| BalanceLeg {
        account_id,
        side: LegSide::To,
        delta_minor,
    });
    from.into_iter().chain(to).collect()
}

/// Signed effect of a transaction of `amount_minor` on one account.
///
/// Zero when the account is not referenced.
pub fn net_effect(target: TransactionTarget, amount_minor: i64, account_id: Uuid) -> i64 {
    balance_legs(target, amount_minor)
        .into_iter()
        .filter(|leg| leg.account_id == account_id)
        .map(|leg| match leg.side {
            LegSide::From => -leg.delta_minor,
            LegSide::To => leg.delta_minor,
        })
        .sum()
}

/// Applies `delta_minor` to every account of `target`, in leg order.
///
/// The first failing leg aborts; run it inside a DB transaction so earlier
/// legs are rolled back with it.
pub async fn apply_delta<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
    target: TransactionTarget,
    delta_minor: i64,
) -> ResultEngine<()> {
    for leg in balance_legs(target, delta_minor) {
        match leg.side {
            LegSide::From => {
                store::accounts::decrement_balance(db, leg.account_id, user_id, leg.delta_minor)
                    .await?;
            }
            LegSide::To => {
                store::accounts::increment_balance(db, leg.account_id, user_id, leg.delta_minor)
                    .await?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn income_credits_destination() {
        let to = Uuid::new_v4();
        let target = TransactionTarget::Income { to };
        assert_eq!(
            balance_legs(target, 250),
            vec![BalanceLeg {
                account_id: to,
                side: LegSide::To,
                delta_minor: 250
            }]
        );
        assert_eq!(net_effect(target, 250, to), 250);
    }

    #[test]
    fn expense_debits_source() {
        let from = Uuid::new_v4();
        let target = TransactionTarget::Expense { from };
        assert_eq!(net_effect(target, 50, from), -50);
        assert_eq!(net_effect(target, 50, Uuid::new_v4()), 0);
    }

    #[test]
    fn transfer_moves_both_legs_source_first() {
        let from = Uuid::new_v4();
        let to = Uuid::new_v4();
        let target = TransactionTarget::Transfer { from, to };
        let legs = balance_legs(target, 100);
        assert_eq!(legs.len(), 2);
        assert_eq!(legs[0].account_id, from);
        assert_eq!(legs[0].side, LegSide::From);
        assert_eq!(legs[1].account_id, to);
        assert_eq!(net_effect(target, 100, from), -100);
        assert_eq!(net_effect(target, 100, to), 100);
    }

    #[test]
    fn negative_delta_reverses_the_effect() {
        let from = Uuid::new_v4();
        let to = Uuid::new_v4();
        let target = TransactionTarget::Transfer { from, to };
        assert_eq!(
            net_effect(target, 100, from) + net_effect(target, -100, from),
            0
        );
        assert_eq!(net_effect(target, -30, to), -30);
    }
}
