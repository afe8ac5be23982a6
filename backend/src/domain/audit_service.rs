//! Read-only audit queries over the ledger store.
//!
//! Every endpoint follows the same shape: validate the date range, then
//! pagination, fetch the entire matching set from the store, slice the
//! requested page locally, and map raw documents to wire rows. The store
//! is not trusted to paginate; correctness only depends on its range
//! filter.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use shared::{
    AdjustmentRow, AdjustmentsMeta, AdjustmentsResponse, CashMovementRow, CashMovementsResponse,
    ClosureRow, ClosuresMeta, ClosuresResponse, DailySummaryMeta, DailySummaryResponse,
    DailySummaryRow, DateRangeDto, PaginationInfo, TransactionRow, TransactionsMeta,
    TransactionsResponse,
};
use tracing::debug;

use crate::config::{AppConfig, CollectionNames};
use crate::domain::aggregator::{DailyAggregator, OperatorDailySummary};
use crate::domain::date_range::{day_window, DateRange, DateRangeValidator};
use crate::domain::normalizer::{
    self, NormalizedTransaction, RecordNormalizer, DEFAULT_OPERATION_TYPE, DEFAULT_OPERATOR,
};
use crate::domain::pagination::{PageRequest, PaginationResolver};
use crate::error::{ApiError, ValidationError};
use crate::storage::{LedgerStore, RawRecord, UpperBound};

const CLOSURE_STATE_BALANCED: &str = "balanceado";
const CLOSURE_STATE_VARIANCE: &str = "descuadre";
const ADJUSTMENT_DEBIT: &str = "debito";
const ADJUSTMENT_CREDIT: &str = "credito";

/// Raw query parameters for the paged range endpoints, exactly as they
/// arrived on the request.
#[derive(Debug, Clone, Default)]
pub struct RangeQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub page: Option<String>,
    pub size: Option<String>,
}

pub struct AuditService {
    store: Arc<dyn LedgerStore>,
    date_ranges: DateRangeValidator,
    pagination: PaginationResolver,
    collections: CollectionNames,
    api_version: String,
}

impl AuditService {
    pub fn new(store: Arc<dyn LedgerStore>, config: &AppConfig) -> Self {
        Self {
            store,
            date_ranges: DateRangeValidator::new(config.pagination.max_historical_days),
            pagination: PaginationResolver::new(
                config.pagination.default_page_size,
                config.pagination.max_page_size,
            ),
            collections: config.collections.clone(),
            api_version: config.api_version.clone(),
        }
    }

    /// Normalized transactions for a date range, newest first.
    pub async fn transactions(&self, query: &RangeQuery) -> Result<TransactionsResponse, ApiError> {
        let (range, page) = self.validate_query(query)?;

        let records = self
            .fetch(
                &self.collections.transactions,
                range,
                UpperBound::Inclusive(range.end_instant()),
                true,
            )
            .await?;

        let (slice, pagination) = paginate(&records, page);
        let data = slice
            .iter()
            .map(|raw| transaction_row(&RecordNormalizer::normalize(raw)))
            .collect();

        Ok(TransactionsResponse {
            success: true,
            api_version: self.api_version.clone(),
            data,
            pagination,
            meta: TransactionsMeta {
                query_date_range: DateRangeDto {
                    from: range.from().format("%Y-%m-%d").to_string(),
                    to: range.to().format("%Y-%m-%d").to_string(),
                },
                query_timestamp: Utc::now().to_rfc3339(),
                days_in_range: range.day_count(),
            },
        })
    }

    /// Per-operator consolidation of one calendar day.
    pub async fn daily_summary(&self, date: Option<&str>) -> Result<DailySummaryResponse, ApiError> {
        let date = date.ok_or(ValidationError::MissingDate)?;
        let date = self.date_ranges.validate_single(date)?;

        let (start, end) = day_window(date);
        let started = Instant::now();
        let records = self
            .store
            .fetch_range(
                &self.collections.transactions,
                start,
                UpperBound::Exclusive(end),
                false,
            )
            .await
            .map_err(ApiError::Store)?;
        debug!(
            collection = %self.collections.transactions,
            elapsed_ms = started.elapsed().as_millis() as u64,
            matched = records.len(),
            "daily summary query"
        );

        let normalized: Vec<NormalizedTransaction> =
            records.iter().map(RecordNormalizer::normalize).collect();
        let summaries = DailyAggregator::aggregate(date, &normalized);

        let meta = DailySummaryMeta {
            total_operators: summaries.len() as u64,
            total_recargas: summaries.iter().map(|s| s.total_recharges).sum(),
            total_pagos: summaries.iter().map(|s| s.total_payments).sum(),
            total_comisiones: summaries.iter().map(|s| s.total_commissions).sum(),
            query_timestamp: Utc::now().to_rfc3339(),
        };

        Ok(DailySummaryResponse {
            success: true,
            api_version: self.api_version.clone(),
            date: date.format("%Y-%m-%d").to_string(),
            data: summaries.iter().map(summary_row).collect(),
            meta,
        })
    }

    /// Cash-desk movements for a date range, newest first.
    pub async fn cash_movements(
        &self,
        query: &RangeQuery,
    ) -> Result<CashMovementsResponse, ApiError> {
        let (range, page) = self.validate_query(query)?;

        let records = self
            .fetch(
                &self.collections.cash_movements,
                range,
                UpperBound::Inclusive(range.end_instant()),
                true,
            )
            .await?;

        let (slice, pagination) = paginate(&records, page);
        let data = slice.iter().map(movement_row).collect();

        Ok(CashMovementsResponse {
            success: true,
            api_version: self.api_version.clone(),
            data,
            pagination,
        })
    }

    /// Cash-desk closures for a date range, newest first.
    pub async fn closures(&self, query: &RangeQuery) -> Result<ClosuresResponse, ApiError> {
        let (range, page) = self.validate_query(query)?;

        let records = self
            .fetch(
                &self.collections.closures,
                range,
                UpperBound::Inclusive(range.end_instant()),
                true,
            )
            .await?;

        let (slice, pagination) = paginate(&records, page);
        let data: Vec<ClosureRow> = slice.iter().map(closure_row).collect();

        let variance_closures = data
            .iter()
            .filter(|c| c.state == CLOSURE_STATE_VARIANCE)
            .count() as u64;
        let meta = ClosuresMeta {
            total_closures: pagination.total_records,
            balanced_closures: pagination.total_records - variance_closures,
            variance_closures,
        };

        Ok(ClosuresResponse {
            success: true,
            api_version: self.api_version.clone(),
            data,
            pagination,
            meta,
        })
    }

    /// Manual balance adjustments for a date range, newest first.
    pub async fn manual_adjustments(
        &self,
        query: &RangeQuery,
    ) -> Result<AdjustmentsResponse, ApiError> {
        let (range, page) = self.validate_query(query)?;

        let records = self
            .fetch(
                &self.collections.adjustments,
                range,
                UpperBound::Inclusive(range.end_instant()),
                true,
            )
            .await?;

        let (slice, pagination) = paginate(&records, page);
        let data: Vec<AdjustmentRow> = slice.iter().map(adjustment_row).collect();

        let total_credits: f64 = data
            .iter()
            .filter(|a| a.adjustment_type == ADJUSTMENT_CREDIT)
            .map(|a| a.amount)
            .sum();
        let total_debits: f64 = data
            .iter()
            .filter(|a| a.adjustment_type == ADJUSTMENT_DEBIT)
            .map(|a| a.amount)
            .sum();
        let meta = AdjustmentsMeta {
            total_adjustments: pagination.total_records,
            total_credits,
            total_debits,
            net: total_credits - total_debits,
        };

        Ok(AdjustmentsResponse {
            success: true,
            api_version: self.api_version.clone(),
            data,
            pagination,
            meta,
        })
    }

    /// Run both validators; the date-range failure wins when both fail.
    fn validate_query(&self, query: &RangeQuery) -> Result<(DateRange, PageRequest), ValidationError> {
        let range = self.date_ranges.validate(
            query.from.as_deref().unwrap_or(""),
            query.to.as_deref().unwrap_or(""),
        );
        let page = self
            .pagination
            .resolve(query.page.as_deref(), query.size.as_deref());

        let range = range?;
        let page = page?;
        Ok((range, page))
    }

    async fn fetch(
        &self,
        collection: &str,
        range: DateRange,
        until: UpperBound,
        newest_first: bool,
    ) -> Result<Vec<RawRecord>, ApiError> {
        let started = Instant::now();
        let records = self
            .store
            .fetch_range(collection, range.start_instant(), until, newest_first)
            .await
            .map_err(ApiError::Store)?;
        debug!(
            collection = %collection,
            elapsed_ms = started.elapsed().as_millis() as u64,
            matched = records.len(),
            "range query"
        );
        Ok(records)
    }
}

/// Slice the full matching set into the requested page and derive the
/// pagination metadata from the clamped size.
fn paginate(records: &[RawRecord], page: PageRequest) -> (&[RawRecord], PaginationInfo) {
    let total = records.len();
    let total_pages = total.div_ceil(page.size as usize) as u32;

    let start = page.offset.min(total);
    let end = (page.offset + page.size as usize).min(total);

    let info = PaginationInfo {
        current_page: page.page,
        page_size: page.size,
        total_records: total as u64,
        total_pages,
        has_more: page.page < total_pages,
    };
    (&records[start..end], info)
}

fn transaction_row(tx: &NormalizedTransaction) -> TransactionRow {
    TransactionRow {
        id: tx.id.clone(),
        timestamp: tx.timestamp.clone(),
        operation_type: tx.operation_type.clone(),
        amount: tx.amount,
        commission: tx.commission,
        net_amount: tx.net_amount,
        operator_id: tx.operator_id.clone(),
        state: tx.state.clone(),
        external_reference: tx.external_reference.clone(),
        created_at: tx.created_at.clone(),
    }
}

fn summary_row(summary: &OperatorDailySummary) -> DailySummaryRow {
    DailySummaryRow {
        operator_id: summary.operator_id.clone(),
        opening_balance: summary.opening_balance,
        total_recharges: summary.total_recharges,
        total_payments: summary.total_payments,
        total_withdrawals: summary.total_withdrawals,
        total_deposits: summary.total_deposits,
        total_commissions: summary.total_commissions,
        theoretical_balance: summary.theoretical_balance,
        reported_balance: summary.reported_balance,
        variance: summary.variance,
        closure_date: summary.closure_date.format("%Y-%m-%d").to_string(),
        active_categories: summary.active_categories,
    }
}

fn movement_row(raw: &RawRecord) -> CashMovementRow {
    CashMovementRow {
        id: raw.id.clone(),
        movement_type: normalizer::text(raw, &["tipo"], DEFAULT_OPERATION_TYPE),
        amount: normalizer::numeric(raw, &["monto"]),
        operator_id: normalizer::text(raw, &["usuario"], DEFAULT_OPERATOR),
        timestamp: normalizer::timestamp_text(raw, &["fecha"]),
        note: normalizer::text(raw, &["observacion"], ""),
    }
}

fn closure_row(raw: &RawRecord) -> ClosureRow {
    let system_balance = normalizer::numeric(raw, &["saldoSistema"]);
    let physical_balance = normalizer::numeric(raw, &["saldoFisico"]);
    let detected_variance = system_balance - physical_balance;

    ClosureRow {
        timestamp: normalizer::timestamp_text(raw, &["fecha"]),
        operator_id: normalizer::text(raw, &["usuario", "usuarioCaja"], DEFAULT_OPERATOR),
        system_balance,
        physical_balance,
        detected_variance,
        state: if detected_variance == 0.0 {
            CLOSURE_STATE_BALANCED.to_string()
        } else {
            CLOSURE_STATE_VARIANCE.to_string()
        },
        notes: normalizer::text(raw, &["observaciones"], ""),
    }
}

fn adjustment_row(raw: &RawRecord) -> AdjustmentRow {
    let amount = normalizer::numeric(raw, &["monto"]);
    let is_debit = normalizer::text(raw, &["tipo"], "") == ADJUSTMENT_DEBIT || amount < 0.0;

    AdjustmentRow {
        id: raw.id.clone(),
        timestamp: normalizer::timestamp_text(raw, &["fecha"]),
        operator_id: normalizer::text(raw, &["usuario"], DEFAULT_OPERATOR),
        reason: normalizer::text(raw, &["motivo"], ""),
        amount: amount.abs(),
        adjustment_type: if is_debit {
            ADJUSTMENT_DEBIT.to_string()
        } else {
            ADJUSTMENT_CREDIT.to_string()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DateField;
    use crate::storage::MemoryLedgerStore;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone};
    use serde_json::json;

    struct FailingStore;

    #[async_trait]
    impl LedgerStore for FailingStore {
        async fn fetch_range(
            &self,
            _collection: &str,
            _from: DateTime<Utc>,
            _until: UpperBound,
            _newest_first: bool,
        ) -> anyhow::Result<Vec<RawRecord>> {
            Err(anyhow!("connection refused"))
        }
    }

    fn raw(id: &str, fields: serde_json::Value) -> RawRecord {
        let serde_json::Value::Object(map) = fields else {
            panic!("test document must be an object")
        };
        RawRecord::new(id, map)
    }

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    async fn seeded_service() -> AuditService {
        let store = MemoryLedgerStore::new();
        for (i, hour) in [9u32, 10, 11, 12, 13].iter().enumerate() {
            store
                .put(
                    "operaciones",
                    at(2026, 1, 15, *hour, 0),
                    raw(
                        &format!("tx-{i}"),
                        json!({
                            "fecha": format!("2026-01-15T{hour:02}:00:00+00:00"),
                            "tipo": "recarga",
                            "monto": 10.0 * (i as f64 + 1.0),
                            "comision": 1.0,
                            "usuarioCaja": "caja_norte",
                        }),
                    ),
                )
                .await;
        }
        AuditService::new(Arc::new(store), &AppConfig::for_tests())
    }

    fn range_query(page: &str, size: &str) -> RangeQuery {
        RangeQuery {
            from: Some("2026-01-15".to_string()),
            to: Some("2026-01-16".to_string()),
            page: Some(page.to_string()),
            size: Some(size.to_string()),
        }
    }

    #[tokio::test]
    async fn transactions_are_paged_newest_first() {
        let service = seeded_service().await;

        let response = service.transactions(&range_query("2", "2")).await.unwrap();
        assert_eq!(response.pagination.total_records, 5);
        assert_eq!(response.pagination.total_pages, 3);
        assert!(response.pagination.has_more);
        assert_eq!(response.data.len(), 2);
        // Newest first: page 2 of size 2 holds the 3rd and 4th newest.
        assert_eq!(response.data[0].id, "tx-2");
        assert_eq!(response.data[1].id, "tx-1");
        assert_eq!(response.meta.days_in_range, 1);
    }

    #[tokio::test]
    async fn last_page_reports_no_more() {
        let service = seeded_service().await;
        let response = service.transactions(&range_query("3", "2")).await.unwrap();
        assert_eq!(response.data.len(), 1);
        assert!(!response.pagination.has_more);
    }

    #[tokio::test]
    async fn page_past_the_end_is_empty_not_an_error() {
        let service = seeded_service().await;
        let response = service.transactions(&range_query("9", "2")).await.unwrap();
        assert!(response.data.is_empty());
        assert_eq!(response.pagination.total_records, 5);
    }

    #[tokio::test]
    async fn date_error_is_reported_before_pagination_error() {
        let service = seeded_service().await;
        let query = RangeQuery {
            from: Some("bad-date".to_string()),
            to: Some("2026-01-16".to_string()),
            page: Some("0".to_string()),
            size: None,
        };

        let err = service.transactions(&query).await.unwrap_err();
        match err {
            ApiError::Validation(ValidationError::InvalidDateFormat { field }) => {
                assert_eq!(field, DateField::From)
            }
            other => panic!("expected date format error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn pagination_error_surfaces_when_dates_are_valid() {
        let service = seeded_service().await;
        let query = RangeQuery {
            from: Some("2026-01-15".to_string()),
            to: Some("2026-01-16".to_string()),
            page: Some("0".to_string()),
            size: None,
        };

        let err = service.transactions(&query).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_PAGE");
    }

    #[tokio::test]
    async fn missing_dates_fail_validation() {
        let service = seeded_service().await;
        let err = service.transactions(&RangeQuery::default()).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_DATE_FORMAT");
    }

    #[tokio::test]
    async fn store_failures_become_opaque_store_errors() {
        let service = AuditService::new(Arc::new(FailingStore), &AppConfig::for_tests());
        let err = service.transactions(&range_query("1", "10")).await.unwrap_err();
        assert_eq!(err.code(), "STORE_ERROR");
    }

    #[tokio::test]
    async fn daily_summary_requires_a_date() {
        let service = seeded_service().await;
        let err = service.daily_summary(None).await.unwrap_err();
        assert_eq!(err.code(), "MISSING_DATE");
    }

    #[tokio::test]
    async fn daily_summary_selects_exactly_one_day() {
        let store = MemoryLedgerStore::new();
        store
            .put(
                "operaciones",
                at(2026, 1, 15, 23, 59),
                raw("in-window", json!({ "tipo": "recarga", "monto": 50.0, "usuarioCaja": "A" })),
            )
            .await;
        store
            .put(
                "operaciones",
                at(2026, 1, 16, 0, 0),
                raw("next-day", json!({ "tipo": "recarga", "monto": 999.0, "usuarioCaja": "A" })),
            )
            .await;

        let service = AuditService::new(Arc::new(store), &AppConfig::for_tests());
        let response = service.daily_summary(Some("2026-01-15")).await.unwrap();

        assert_eq!(response.data.len(), 1);
        assert_eq!(response.data[0].total_recharges, 50.0);
        assert_eq!(response.meta.total_recargas, 50.0);
        assert_eq!(response.date, "2026-01-15");
    }

    #[tokio::test]
    async fn daily_summary_consolidates_per_operator() {
        let store = MemoryLedgerStore::new();
        let docs = [
            ("t1", json!({ "tipo": "recarga", "monto": 100.0, "comision": 2.0, "usuarioCaja": "A" })),
            ("t2", json!({ "tipo": "pago", "monto": 30.0, "comision": 1.0, "usuarioCaja": "A" })),
            ("t3", json!({ "tipo": "transferencia", "monto": 70.0, "comision": 0.5, "usuario": "B" })),
        ];
        for (id, fields) in docs {
            store.put("operaciones", at(2026, 1, 15, 12, 0), raw(id, fields)).await;
        }

        let service = AuditService::new(Arc::new(store), &AppConfig::for_tests());
        let response = service.daily_summary(Some("2026-01-15")).await.unwrap();

        assert_eq!(response.meta.total_operators, 2);
        let a = response.data.iter().find(|s| s.operator_id == "A").unwrap();
        assert_eq!(a.theoretical_balance, 67.0);
        assert_eq!(a.closure_date, "2026-01-15");

        let b = response.data.iter().find(|s| s.operator_id == "B").unwrap();
        assert_eq!(b.total_recharges, 0.0);
        assert_eq!(b.total_commissions, 0.5);
        assert_eq!(b.theoretical_balance, -0.5);
    }

    #[tokio::test]
    async fn closures_classify_balanced_and_variance() {
        let store = MemoryLedgerStore::new();
        store
            .put(
                "cierres_caja",
                at(2026, 1, 15, 20, 0),
                raw("c1", json!({ "saldoSistema": 100.0, "saldoFisico": 100.0, "usuario": "A" })),
            )
            .await;
        store
            .put(
                "cierres_caja",
                at(2026, 1, 15, 21, 0),
                raw("c2", json!({ "saldoSistema": 100.0, "saldoFisico": 90.0, "usuarioCaja": "B" })),
            )
            .await;

        let service = AuditService::new(Arc::new(store), &AppConfig::for_tests());
        let response = service.closures(&range_query("1", "10")).await.unwrap();

        assert_eq!(response.meta.total_closures, 2);
        assert_eq!(response.meta.balanced_closures, 1);
        assert_eq!(response.meta.variance_closures, 1);

        let variance = response.data.iter().find(|c| c.operator_id == "B").unwrap();
        assert_eq!(variance.detected_variance, 10.0);
        assert_eq!(variance.state, "descuadre");
    }

    #[tokio::test]
    async fn adjustments_split_credits_and_debits() {
        let store = MemoryLedgerStore::new();
        let docs = [
            ("a1", json!({ "monto": 25.0, "tipo": "credito", "usuario": "A", "motivo": "ajuste caja" })),
            ("a2", json!({ "monto": -10.0, "usuario": "A" })),
            ("a3", json!({ "monto": 5.0, "tipo": "debito", "usuario": "B" })),
        ];
        for (id, fields) in docs {
            store.put("ajustes_manuales", at(2026, 1, 15, 12, 0), raw(id, fields)).await;
        }

        let service = AuditService::new(Arc::new(store), &AppConfig::for_tests());
        let response = service.manual_adjustments(&range_query("1", "10")).await.unwrap();

        assert_eq!(response.meta.total_credits, 25.0);
        assert_eq!(response.meta.total_debits, 15.0);
        assert_eq!(response.meta.net, 10.0);

        // Negative amounts are reported as absolute debits.
        let negative = response.data.iter().find(|a| a.id == "a2").unwrap();
        assert_eq!(negative.amount, 10.0);
        assert_eq!(negative.adjustment_type, "debito");
    }

    #[tokio::test]
    async fn cash_movements_map_with_fallbacks() {
        let store = MemoryLedgerStore::new();
        store
            .put(
                "movimientos_caja",
                at(2026, 1, 15, 8, 0),
                raw("m1", json!({ "monto": "42.5", "fecha": "2026-01-15T08:00:00+00:00" })),
            )
            .await;

        let service = AuditService::new(Arc::new(store), &AppConfig::for_tests());
        let response = service.cash_movements(&range_query("1", "10")).await.unwrap();

        let movement = &response.data[0];
        assert_eq!(movement.amount, 42.5);
        assert_eq!(movement.movement_type, "unknown");
        assert_eq!(movement.operator_id, "no_operator");
        assert_eq!(movement.note, "");
    }
}
