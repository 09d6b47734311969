//! HTTP request handlers for API endpoints

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;

use super::error::ApiError;
use super::state::AppState;
use crate::aggregate::{CategorySummary, GenderSummary, TimeSeries};
use crate::dashboard::{self, DashboardParams, FilterOptions};
use crate::export::{to_csv, ExportTable, TransactionRecord};
use crate::meal::{parse_weekday, Meal};
use crate::student_id::{StudentId, StudentIdError};
use crate::transaction::ServiceTime;

/// Health check endpoint
///
/// Returns a simple status response to verify the server is running
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok"
    }))
}

/// Query parameters shared by the dashboard, filter and export endpoints.
///
/// List parameters are comma separated; an empty list places no restriction.
/// Student ids may themselves contain commas, so each `student` key (which
/// may repeat) carries exactly one id and is never split.
#[derive(Debug, Default)]
pub struct DashboardQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub students: Option<String>,
    pub student: Vec<String>,
    pub meals: Option<String>,
    pub weekdays: Option<String>,
    pub include_rows: bool,
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN)
}

/// Parses a range bound; a bare date covers its whole day.
fn parse_bound(raw: &str, name: &str, is_end: bool) -> Result<NaiveDateTime, ApiError> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let time = if is_end { end_of_day() } else { NaiveTime::MIN };
        return Ok(date.and_time(time));
    }
    ServiceTime::parse(Some(raw))
        .valid()
        .ok_or_else(|| ApiError::InvalidDateRange(format!("Invalid {} date: {}", name, raw)))
}

fn split_list(raw: &Option<String>) -> impl Iterator<Item = &str> {
    raw.as_deref()
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

impl DashboardQuery {
    /// Builds the query from decoded key/value pairs, in request order.
    ///
    /// Unknown keys are ignored; a repeated single-valued key keeps its last value.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Result<Self, ApiError> {
        let mut query = DashboardQuery::default();
        for (key, value) in pairs {
            match key.as_str() {
                "start" => query.start = Some(value),
                "end" => query.end = Some(value),
                "students" => query.students = Some(value),
                "student" => query.student.push(value),
                "meals" => query.meals = Some(value),
                "weekdays" => query.weekdays = Some(value),
                "include_rows" => {
                    query.include_rows = value.trim().parse().map_err(|_| {
                        ApiError::InvalidParameter(format!("Invalid include_rows: {}", value))
                    })?
                }
                _ => {}
            }
        }
        Ok(query)
    }

    /// Validates the raw query into pipeline parameters.
    pub fn to_params(&self) -> Result<DashboardParams, ApiError> {
        let mut params = DashboardParams::new();

        if let Some(start) = &self.start {
            params = params.with_start(parse_bound(start, "start", false)?);
        }
        if let Some(end) = &self.end {
            params = params.with_end(parse_bound(end, "end", true)?);
        }
        if let (Some(start), Some(end)) = (params.start, params.end) {
            if start > end {
                return Err(ApiError::InvalidDateRange(
                    "Start date must be before or equal to end date".to_string(),
                ));
            }
        }

        let students = split_list(&self.students)
            .chain(self.student.iter().map(String::as_str))
            .map(StudentId::new)
            .filter(|id| !matches!(id, Err(StudentIdError::EmptyId)))
            .collect::<Result<Vec<_>, _>>()?;
        let meals = split_list(&self.meals)
            .map(Meal::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        let weekdays = split_list(&self.weekdays)
            .map(|d| {
                parse_weekday(d)
                    .map_err(|_| ApiError::InvalidParameter(format!("Unknown weekday: {}", d)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(params
            .with_students(students)
            .with_meals(meals)
            .with_weekdays(weekdays))
    }
}

/// Response for the dashboard query
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub total_records: usize,
    pub invalid_records: usize,
    pub date_filtered_records: usize,
    pub filtered_records: usize,
    pub category: CategorySummary,
    pub gender: GenderSummary,
    pub time_series: TimeSeries,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transactions: Option<Vec<TransactionRecord>>,
}

/// GET /dashboard - Filtered summaries for the current parameters
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let query = DashboardQuery::from_pairs(pairs)?;
    let params = query.to_params()?;
    let dataset = state.snapshot().await;
    let view = dashboard::run(&dataset, &params);

    let transactions = query
        .include_rows
        .then(|| view.rows.iter().map(|r| TransactionRecord::from(*r)).collect());

    Ok(Json(DashboardResponse {
        start: view.range.map(|r| r.start),
        end: view.range.map(|r| r.end),
        total_records: dataset.len(),
        invalid_records: dataset.invalid_count(),
        date_filtered_records: view.date_filtered_count,
        filtered_records: view.rows.len(),
        category: view.category,
        gender: view.gender,
        time_series: view.time_series,
        transactions,
    }))
}

/// GET /filters - Choices available for each filter
pub async fn get_filters(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<FilterOptions>, ApiError> {
    let params = DashboardQuery::from_pairs(pairs)?.to_params()?;
    let dataset = state.snapshot().await;
    Ok(Json(dashboard::filter_options(&dataset, &params)))
}

/// GET /export/{table} - CSV download of one dashboard table
pub async fn export_csv(
    State(state): State<Arc<AppState>>,
    Path(table): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, ApiError> {
    let table = ExportTable::from_str(&table).map_err(ApiError::InvalidParameter)?;
    let params = DashboardQuery::from_pairs(pairs)?.to_params()?;
    let dataset = state.snapshot().await;
    let view = dashboard::run(&dataset, &params);

    let body = match table {
        ExportTable::Category => to_csv(&view.category)?,
        ExportTable::Gender => to_csv(&view.gender)?,
        ExportTable::TimeSeries => to_csv(&view.time_series)?,
        ExportTable::Transactions => {
            let records: Vec<TransactionRecord> =
                view.rows.iter().map(|r| TransactionRecord::from(*r)).collect();
            to_csv(&records)?
        }
    };

    tracing::info!(file = table.file_name(), bytes = body.len(), "csv export");

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", table.file_name()),
        ),
    ];
    Ok((headers, body).into_response())
}

/// Response for a snapshot reload
#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub total_records: usize,
    pub invalid_records: usize,
}

/// POST /dataset/reload - Re-read the whole table
pub async fn reload_dataset(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReloadResponse>, ApiError> {
    let dataset = state.reload().await?;
    tracing::info!(rows = dataset.len(), "dataset reloaded");
    Ok(Json(ReloadResponse {
        total_records: dataset.len(),
        invalid_records: dataset.invalid_count(),
    }))
}
