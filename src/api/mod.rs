use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::cli::{ParameterArgs, build_parameters};
use crate::config::Config;
use crate::core::{MonthlySample, ProjectionParameters, ProjectionSeries, nearest, project_at};
use crate::format::{age_label, compact_currency, currency};

mod error;

pub use error::ApiError;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectionPayload {
    birth_date: Option<NaiveDate>,
    retirement_age: Option<u32>,
    death_age: Option<u32>,
    annual_income: Option<f64>,
    tax_rate: Option<f64>,
    savings_rate: Option<f64>,
    annual_return: Option<f64>,
    monthly_expenses: Option<f64>,
    initial_savings: Option<f64>,
    as_of: Option<NaiveDate>,
    query_age: Option<f64>,
}

#[derive(Debug)]
struct ApiRequest {
    params: ProjectionParameters,
    as_of: NaiveDate,
    query_age: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectionResponse {
    current_age: f64,
    retirement_age: u32,
    death_age: u32,
    peak_net_worth: f64,
    peak_net_worth_label: String,
    retirement_sample: Option<MonthlySample>,
    depletion_sample: Option<MonthlySample>,
    samples: ProjectionSeries,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NearestResponse {
    query_age: f64,
    sample: MonthlySample,
    age_label: String,
    net_worth_label: String,
}

pub async fn run_http_server(config: &Config) -> std::io::Result<()> {
    let addr = config.addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "net worth projection API listening");

    axum::serve(listener, router())
        .with_graceful_shutdown(shutdown_signal())
        .await
}

pub fn router() -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/projection",
            get(projection_get_handler).post(projection_post_handler),
        )
        .route(
            "/api/nearest",
            get(nearest_get_handler).post(nearest_post_handler),
        )
        .fallback(not_found_handler)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received");
}

async fn health_handler() -> impl IntoResponse {
    with_cache_control((StatusCode::OK, "200 OK"))
}

async fn not_found_handler() -> Response {
    ApiError::NotFound.into_response()
}

async fn projection_get_handler(Query(payload): Query<ProjectionPayload>) -> Response {
    projection_handler_impl(payload)
}

async fn projection_post_handler(Json(payload): Json<ProjectionPayload>) -> Response {
    projection_handler_impl(payload)
}

async fn nearest_get_handler(Query(payload): Query<ProjectionPayload>) -> Response {
    nearest_handler_impl(payload)
}

async fn nearest_post_handler(Json(payload): Json<ProjectionPayload>) -> Response {
    nearest_handler_impl(payload)
}

fn projection_handler_impl(payload: ProjectionPayload) -> Response {
    match run_projection(payload, Local::now().date_naive()) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(e) => e.into_response(),
    }
}

fn nearest_handler_impl(payload: ProjectionPayload) -> Response {
    match run_nearest(payload, Local::now().date_naive()) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(e) => e.into_response(),
    }
}

fn run_projection(
    payload: ProjectionPayload,
    today: NaiveDate,
) -> Result<ProjectionResponse, ApiError> {
    let request = api_request_from_payload(payload, today)?;
    let series = project_at(&request.params, request.as_of)?;
    Ok(build_projection_response(&request, series))
}

fn run_nearest(
    payload: ProjectionPayload,
    today: NaiveDate,
) -> Result<NearestResponse, ApiError> {
    let request = api_request_from_payload(payload, today)?;
    let query_age = request
        .query_age
        .ok_or_else(|| ApiError::BadRequest("queryAge is required".to_string()))?;
    if !query_age.is_finite() {
        return Err(ApiError::BadRequest("queryAge must be finite".to_string()));
    }

    let series = project_at(&request.params, request.as_of)?;
    let sample = *nearest(&series, query_age);
    Ok(NearestResponse {
        query_age,
        sample,
        age_label: age_label(sample.age),
        net_worth_label: currency(sample.net_worth),
    })
}

#[cfg(test)]
fn api_request_from_json(json: &str, today: NaiveDate) -> Result<ApiRequest, ApiError> {
    let payload = serde_json::from_str::<ProjectionPayload>(json)
        .map_err(|e| ApiError::BadRequest(format!("Invalid API JSON payload: {e}")))?;
    api_request_from_payload(payload, today)
}

fn api_request_from_payload(
    payload: ProjectionPayload,
    today: NaiveDate,
) -> Result<ApiRequest, ApiError> {
    let mut args = ParameterArgs::default();

    if let Some(v) = payload.birth_date {
        args.birth_date = v;
    }
    if let Some(v) = payload.retirement_age {
        args.retirement_age = v;
    }
    if let Some(v) = payload.death_age {
        args.death_age = v;
    }
    if let Some(v) = payload.annual_income {
        args.annual_income = v;
    }
    if let Some(v) = payload.tax_rate {
        args.tax_rate = v;
    }
    if let Some(v) = payload.savings_rate {
        args.savings_rate = v;
    }
    if let Some(v) = payload.annual_return {
        args.annual_return = v;
    }
    if let Some(v) = payload.monthly_expenses {
        args.monthly_expenses = v;
    }
    if let Some(v) = payload.initial_savings {
        args.initial_savings = v;
    }

    let params = build_parameters(args)?;
    Ok(ApiRequest {
        params,
        as_of: payload.as_of.unwrap_or(today),
        query_age: payload.query_age,
    })
}

fn build_projection_response(
    request: &ApiRequest,
    series: ProjectionSeries,
) -> ProjectionResponse {
    let peak = series.peak_net_worth();
    ProjectionResponse {
        current_age: series.first().age,
        retirement_age: request.params.retirement_age,
        death_age: request.params.death_age,
        peak_net_worth: peak,
        peak_net_worth_label: compact_currency(peak),
        retirement_sample: series.retirement_sample().copied(),
        depletion_sample: series.depletion_sample().copied(),
        samples: series,
    }
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}
