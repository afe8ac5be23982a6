//! Per-operator daily consolidation.
//!
//! A pure fold over one day's normalized transactions: records are
//! grouped by operator, classified into operation buckets, and totalled
//! into a theoretical closing balance.

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::domain::normalizer::NormalizedTransaction;

/// The four operation buckets the summary tracks.
///
/// Classification is substring-based and case-insensitive, evaluated in
/// this fixed precedence; only the first match counts. A type containing
/// none of the keywords contributes to the commission total only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationCategory {
    Recharge,
    Payment,
    Withdrawal,
    Deposit,
}

impl OperationCategory {
    pub fn classify(operation_type: &str) -> Option<Self> {
        let lowered = operation_type.to_lowercase();
        if lowered.contains("recarga") {
            Some(OperationCategory::Recharge)
        } else if lowered.contains("pago") {
            Some(OperationCategory::Payment)
        } else if lowered.contains("retiro") {
            Some(OperationCategory::Withdrawal)
        } else if lowered.contains("deposito") {
            Some(OperationCategory::Deposit)
        } else {
            None
        }
    }
}

/// One operator's consolidated day; identity is `(operator_id,
/// closure_date)`.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorDailySummary {
    pub operator_id: String,
    pub opening_balance: f64,
    pub total_recharges: f64,
    pub total_payments: f64,
    pub total_withdrawals: f64,
    pub total_deposits: f64,
    pub total_commissions: f64,
    pub theoretical_balance: f64,
    pub reported_balance: f64,
    pub variance: f64,
    pub closure_date: NaiveDate,
    pub active_categories: u32,
}

impl OperatorDailySummary {
    fn empty(operator_id: String, closure_date: NaiveDate) -> Self {
        Self {
            operator_id,
            opening_balance: 0.0,
            total_recharges: 0.0,
            total_payments: 0.0,
            total_withdrawals: 0.0,
            total_deposits: 0.0,
            total_commissions: 0.0,
            theoretical_balance: 0.0,
            reported_balance: 0.0,
            variance: 0.0,
            closure_date,
            active_categories: 0,
        }
    }
}

pub struct DailyAggregator;

impl DailyAggregator {
    /// Fold one day's transactions into per-operator summaries.
    ///
    /// Output order is insertion order of first-seen operator; totals are
    /// independent of input order. Pure function, no I/O.
    pub fn aggregate(
        closure_date: NaiveDate,
        records: &[NormalizedTransaction],
    ) -> Vec<OperatorDailySummary> {
        let mut summaries: Vec<OperatorDailySummary> = Vec::new();
        let mut index_by_operator: HashMap<String, usize> = HashMap::new();

        for record in records {
            let idx = *index_by_operator
                .entry(record.operator_id.clone())
                .or_insert_with(|| {
                    summaries.push(OperatorDailySummary::empty(
                        record.operator_id.clone(),
                        closure_date,
                    ));
                    summaries.len() - 1
                });
            let summary = &mut summaries[idx];

            match OperationCategory::classify(&record.operation_type) {
                Some(OperationCategory::Recharge) => summary.total_recharges += record.amount,
                Some(OperationCategory::Payment) => summary.total_payments += record.amount,
                Some(OperationCategory::Withdrawal) => summary.total_withdrawals += record.amount,
                Some(OperationCategory::Deposit) => summary.total_deposits += record.amount,
                None => {}
            }

            // Commission accumulates for every record, classified or not.
            summary.total_commissions += record.commission;
        }

        for summary in &mut summaries {
            summary.theoretical_balance = summary.total_recharges + summary.total_deposits
                - summary.total_payments
                - summary.total_withdrawals
                - summary.total_commissions;
            summary.active_categories = [
                summary.total_recharges,
                summary.total_payments,
                summary.total_withdrawals,
                summary.total_deposits,
            ]
            .iter()
            .filter(|total| **total > 0.0)
            .count() as u32;
        }

        summaries
    }
}
