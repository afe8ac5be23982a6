//! Wire-format types for the ledger audit API.
//!
//! The upstream cash-desk system speaks a Spanish field vocabulary
//! (`usuario_caja`, `saldo_teorico`, ...); the serde renames keep that
//! contract intact while the Rust side stays in English.

use serde::{Deserialize, Serialize};

/// Pagination block attached to every paged response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationInfo {
    pub current_page: u32,
    pub page_size: u32,
    pub total_records: u64,
    pub total_pages: u32,
    pub has_more: bool,
}

/// One normalized ledger transaction as returned by `/agent/transactions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRow {
    #[serde(rename = "id_transaccion")]
    pub id: String,
    #[serde(rename = "fecha")]
    pub timestamp: String,
    #[serde(rename = "tipo_operacion")]
    pub operation_type: String,
    #[serde(rename = "monto")]
    pub amount: f64,
    #[serde(rename = "comision")]
    pub commission: f64,
    #[serde(rename = "monto_neto")]
    pub net_amount: f64,
    #[serde(rename = "usuario_caja")]
    pub operator_id: String,
    #[serde(rename = "estado")]
    pub state: String,
    #[serde(rename = "referencia_externa")]
    pub external_reference: String,
    pub created_at: String,
}

/// Per-operator consolidation for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummaryRow {
    #[serde(rename = "usuario_caja")]
    pub operator_id: String,
    #[serde(rename = "saldo_inicial")]
    pub opening_balance: f64,
    #[serde(rename = "total_recargas")]
    pub total_recharges: f64,
    #[serde(rename = "total_pagos")]
    pub total_payments: f64,
    #[serde(rename = "total_retiros")]
    pub total_withdrawals: f64,
    #[serde(rename = "total_depositos")]
    pub total_deposits: f64,
    #[serde(rename = "total_comisiones")]
    pub total_commissions: f64,
    #[serde(rename = "saldo_teorico")]
    pub theoretical_balance: f64,
    #[serde(rename = "saldo_reportado")]
    pub reported_balance: f64,
    #[serde(rename = "diferencia")]
    pub variance: f64,
    #[serde(rename = "fecha_cierre")]
    pub closure_date: String,
    /// Number of operation categories with activity (0..=4), not a
    /// transaction count.
    #[serde(rename = "total_transacciones")]
    pub active_categories: u32,
}

/// One cash-desk movement as returned by `/agent/cash-movements`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashMovementRow {
    #[serde(rename = "id_movimiento")]
    pub id: String,
    #[serde(rename = "tipo")]
    pub movement_type: String,
    #[serde(rename = "monto")]
    pub amount: f64,
    #[serde(rename = "usuario")]
    pub operator_id: String,
    #[serde(rename = "fecha")]
    pub timestamp: String,
    #[serde(rename = "observacion")]
    pub note: String,
}

/// One cash-desk closure as returned by `/agent/closures`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosureRow {
    #[serde(rename = "fecha")]
    pub timestamp: String,
    #[serde(rename = "usuario")]
    pub operator_id: String,
    #[serde(rename = "saldo_sistema")]
    pub system_balance: f64,
    #[serde(rename = "saldo_fisico")]
    pub physical_balance: f64,
    #[serde(rename = "diferencia_detectada")]
    pub detected_variance: f64,
    #[serde(rename = "estado")]
    pub state: String,
    #[serde(rename = "observaciones")]
    pub notes: String,
}

/// One manual adjustment as returned by `/agent/manual-adjustments`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentRow {
    #[serde(rename = "id_ajuste")]
    pub id: String,
    #[serde(rename = "fecha")]
    pub timestamp: String,
    #[serde(rename = "usuario")]
    pub operator_id: String,
    #[serde(rename = "motivo")]
    pub reason: String,
    #[serde(rename = "monto")]
    pub amount: f64,
    #[serde(rename = "tipo")]
    pub adjustment_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRangeDto {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionsMeta {
    pub query_date_range: DateRangeDto,
    pub query_timestamp: String,
    pub days_in_range: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionsResponse {
    pub success: bool,
    pub api_version: String,
    pub data: Vec<TransactionRow>,
    pub pagination: PaginationInfo,
    pub meta: TransactionsMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummaryMeta {
    #[serde(rename = "total_usuarios_caja")]
    pub total_operators: u64,
    pub total_recargas: f64,
    pub total_pagos: f64,
    pub total_comisiones: f64,
    pub query_timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummaryResponse {
    pub success: bool,
    pub api_version: String,
    pub date: String,
    pub data: Vec<DailySummaryRow>,
    pub meta: DailySummaryMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashMovementsResponse {
    pub success: bool,
    pub api_version: String,
    pub data: Vec<CashMovementRow>,
    pub pagination: PaginationInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosuresMeta {
    #[serde(rename = "total_cierres")]
    pub total_closures: u64,
    #[serde(rename = "cierres_balanceados")]
    pub balanced_closures: u64,
    #[serde(rename = "cierres_con_descuadre")]
    pub variance_closures: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosuresResponse {
    pub success: bool,
    pub api_version: String,
    pub data: Vec<ClosureRow>,
    pub pagination: PaginationInfo,
    pub meta: ClosuresMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentsMeta {
    #[serde(rename = "total_ajustes")]
    pub total_adjustments: u64,
    #[serde(rename = "total_creditos")]
    pub total_credits: f64,
    #[serde(rename = "total_debitos")]
    pub total_debits: f64,
    #[serde(rename = "neto")]
    pub net: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentsResponse {
    pub success: bool,
    pub api_version: String,
    pub data: Vec<AdjustmentRow>,
    pub pagination: PaginationInfo,
    pub meta: AdjustmentsMeta,
}

/// Standard error envelope; `details` only appears outside production.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
