//! Sums and groupings of a ledger for the dashboard cards and charts.

use std::collections::HashMap;

use crate::ledger::{Kind, Transaction};

/// The totals shown on the summary cards.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(super) struct LedgerTotals {
    pub expenses: f64,
    pub income: f64,
}

impl LedgerTotals {
    /// Income minus expenses.
    pub fn balance(&self) -> f64 {
        self.income - self.expenses
    }
}

pub(super) fn ledger_totals(transactions: &[Transaction]) -> LedgerTotals {
    transactions
        .iter()
        .fold(LedgerTotals::default(), |mut totals, transaction| {
            match transaction.kind {
                Kind::Expense => totals.expenses += transaction.amount,
                Kind::Income => totals.income += transaction.amount,
            }
            totals
        })
}

/// Sums the amounts of `kind` transactions grouped by `key`.
///
/// Groups are sorted by total, largest first. Ties are sorted by label so the
/// charts do not reorder between page loads.
fn sum_grouped_by<F>(transactions: &[Transaction], kind: Kind, key: F) -> Vec<(String, f64)>
where
    F: Fn(&Transaction) -> &str,
{
    let mut totals: HashMap<&str, f64> = HashMap::new();

    for transaction in transactions.iter().filter(|t| t.kind == kind) {
        *totals.entry(key(transaction)).or_insert(0.0) += transaction.amount;
    }

    let mut groups: Vec<(String, f64)> = totals
        .into_iter()
        .map(|(label, total)| (label.to_owned(), total))
        .collect();
    groups.sort_by(|(label_a, total_a), (label_b, total_b)| {
        total_b.total_cmp(total_a).then_with(|| label_a.cmp(label_b))
    });

    groups
}

pub(super) fn expenses_by_bank_or_source(transactions: &[Transaction]) -> Vec<(String, f64)> {
    sum_grouped_by(transactions, Kind::Expense, |transaction| {
        transaction.bank_or_source.as_str()
    })
}

pub(super) fn income_by_description(transactions: &[Transaction]) -> Vec<(String, f64)> {
    sum_grouped_by(transactions, Kind::Income, |transaction| {
        transaction.description.as_str()
    })
}

/// One bar of the cash flow waterfall, spanning `start` to `end`.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct WaterfallStep {
    pub label: String,
    pub start: f64,
    pub end: f64,
    /// Totals are drawn from zero, the other steps float between the running totals.
    pub is_total: bool,
}

pub(super) const TOTAL_INCOME_LABEL: &str = "Total income";
pub(super) const FINAL_BALANCE_LABEL: &str = "Final balance";

/// Walks from total income down through each expense description to the final balance.
pub(super) fn waterfall_steps(transactions: &[Transaction]) -> Vec<WaterfallStep> {
    let totals = ledger_totals(transactions);
    let expenses = sum_grouped_by(transactions, Kind::Expense, |transaction| {
        transaction.description.as_str()
    });

    let mut steps = Vec::with_capacity(expenses.len() + 2);
    steps.push(WaterfallStep {
        label: TOTAL_INCOME_LABEL.to_owned(),
        start: 0.0,
        end: totals.income,
        is_total: true,
    });

    let mut running = totals.income;

    for (description, amount) in expenses {
        steps.push(WaterfallStep {
            label: description,
            start: running,
            end: running - amount,
            is_total: false,
        });
        running -= amount;
    }

    steps.push(WaterfallStep {
        label: FINAL_BALANCE_LABEL.to_owned(),
        start: 0.0,
        end: totals.balance(),
        is_total: true,
    });

    steps
}
