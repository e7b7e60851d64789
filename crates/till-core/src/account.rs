//! # Customer Account Rules
//!
//! How each kind of ledger entry moves a customer's balance, and the
//! running-balance column shown beside the transaction history.
//!
//! ## Balance Effects
//! ```text
//! ┌──────────┬────────────────┬──────────────────────────────────────────┐
//! │ Type     │ balance        │ meaning                                  │
//! ├──────────┼────────────────┼──────────────────────────────────────────┤
//! │ SALE     │ + amount       │ checkout charged to the account          │
//! │ DEBIT    │ + amount       │ manual charge                            │
//! │ PAYMENT  │ − amount       │ customer paid in                         │
//! │ CREDIT   │ − amount       │ store reduced what the customer owes     │
//! └──────────┴────────────────┴──────────────────────────────────────────┘
//! ```
//!
//! The authoritative balance is `Customer::current_balance_cents`. The
//! running column is display-only and only covers the rows fetched.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CustomerTransaction, TransactionType};
use crate::validation::validate_posting_cents;

/// Signed balance change for a posting.
///
/// ## Example
/// ```rust
/// use till_core::account::balance_delta;
/// use till_core::{Money, TransactionType};
///
/// let d = balance_delta(TransactionType::Payment, Money::from_cents(2000)).unwrap();
/// assert_eq!(d.cents(), -2000);
/// ```
pub fn balance_delta(transaction_type: TransactionType, amount: Money) -> CoreResult<Money> {
    validate_posting_cents(amount.cents())
        .map_err(|_| CoreError::invalid_amount(amount, "must be greater than zero"))?;

    Ok(match transaction_type {
        TransactionType::Sale | TransactionType::Debit => amount,
        TransactionType::Payment | TransactionType::Credit => -amount,
    })
}

/// Ledger description for a checkout posting.
pub fn sale_description(line_count: usize) -> String {
    format!("POS Sale - {} items", line_count)
}

/// A history row with its display running balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub transaction: CustomerTransaction,
    pub running_balance: Money,
}

/// Adds a running balance to a newest-first window of transactions.
///
/// Walks the window oldest to newest starting from zero, then hands the
/// rows back newest-first.
pub fn running_history(newest_first: Vec<CustomerTransaction>) -> Vec<HistoryEntry> {
    let mut balance = Money::zero();

    let mut entries: Vec<HistoryEntry> = newest_first
        .into_iter()
        .rev()
        .map(|tx| {
            let amount = tx.amount();
            match tx.transaction_type {
                TransactionType::Sale | TransactionType::Debit => balance += amount,
                TransactionType::Payment | TransactionType::Credit => balance -= amount,
            }
            HistoryEntry {
                transaction: tx,
                running_balance: balance,
            }
        })
        .collect();

    entries.reverse();
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn tx(id: i64, transaction_type: TransactionType, cents: i64) -> CustomerTransaction {
        CustomerTransaction {
            id,
            customer_id: 1,
            transaction_type,
            amount_cents: cents,
            description: None,
            reference_number: None,
            transaction_date: Utc::now() + Duration::minutes(id),
            created_by: "POS User".to_string(),
        }
    }

    #[test]
    fn test_balance_direction() {
        let amount = Money::from_cents(500);
        assert_eq!(balance_delta(TransactionType::Sale, amount).unwrap(), amount);
        assert_eq!(balance_delta(TransactionType::Debit, amount).unwrap(), amount);
        assert_eq!(balance_delta(TransactionType::Payment, amount).unwrap(), -amount);
        assert_eq!(balance_delta(TransactionType::Credit, amount).unwrap(), -amount);
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        assert!(matches!(
            balance_delta(TransactionType::Payment, Money::zero()),
            Err(CoreError::InvalidAmount { .. })
        ));
        assert!(balance_delta(TransactionType::Credit, Money::from_cents(-100)).is_err());
    }

    #[test]
    fn test_running_history_walks_chronologically() {
        // newest first, as the repository returns them
        let rows = vec![
            tx(3, TransactionType::Credit, 500),
            tx(2, TransactionType::Payment, 2000),
            tx(1, TransactionType::Sale, 5000),
        ];

        let history = running_history(rows);

        assert_eq!(history[0].transaction.id, 3);
        assert_eq!(history[0].running_balance.cents(), 2500);
        assert_eq!(history[1].running_balance.cents(), 3000);
        assert_eq!(history[2].running_balance.cents(), 5000);
    }

    #[test]
    fn test_sale_description() {
        assert_eq!(sale_description(3), "POS Sale - 3 items");
    }
}
