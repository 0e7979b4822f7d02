use axum::{
    Router,
    extract::{Json, State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::client::{CalcClient, ClientError};
use crate::core::format::format_brl;
use crate::core::{
    ChartLayout, ChartMode, ChartView, Diagnosis, MonthlyRecord, PensionData, ProjectionError,
    ProjectionPayload, SelectedPoint, SimulationRequest, SimulatorInput, Termination, Withdrawal,
    build_chart, diagnose,
};

pub const DEFAULT_SCREEN_WIDTH: f64 = 392.0;

#[derive(Clone)]
pub struct AppState {
    pub client: CalcClient,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartPayload {
    projecao: Vec<MonthlyRecord>,
    #[serde(default)]
    mode: ChartMode,
    screen_width: Option<f64>,
    max_points: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetailPayload {
    projecao: Vec<MonthlyRecord>,
    screen_width: Option<f64>,
    max_points: Option<usize>,
    index: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DetailResponse {
    #[serde(flatten)]
    point: SelectedPoint,
    opening_balance_label: String,
    paid_benefit_label: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiagnosisPayload {
    pension: PensionData,
    projection: ProjectionPayload,
    birth_date: NaiveDate,
    today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SimulatePayload {
    pension: PensionData,
    birth_date: NaiveDate,
    simulator: SimulatorInput,
    #[serde(default)]
    mode: ChartMode,
    screen_width: Option<f64>,
    start_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    request: SimulationRequest,
    withdrawal: Option<Withdrawal>,
    termination: Termination,
    chart: ChartView,
}

fn max_points_for(screen_width: Option<f64>, max_points: Option<usize>) -> usize {
    max_points.unwrap_or_else(|| {
        ChartLayout::new(screen_width.unwrap_or(DEFAULT_SCREEN_WIDTH)).max_points()
    })
}

fn chart_from_payload(payload: &ChartPayload) -> Result<ChartView, ProjectionError> {
    build_chart(
        &payload.projecao,
        payload.mode,
        max_points_for(payload.screen_width, payload.max_points),
    )
}

fn detail_from_payload(payload: &DetailPayload) -> Result<DetailResponse, ProjectionError> {
    let chart = build_chart(
        &payload.projecao,
        ChartMode::default(),
        max_points_for(payload.screen_width, payload.max_points),
    )?;
    let point = chart.detail(payload.index)?;
    Ok(DetailResponse {
        opening_balance_label: format_brl(point.opening_balance),
        paid_benefit_label: format_brl(point.paid_benefit),
        point,
    })
}

fn diagnosis_from_payload(payload: &DiagnosisPayload) -> Diagnosis {
    let today = payload.today.unwrap_or_else(|| Local::now().date_naive());
    diagnose(&payload.pension, &payload.projection, payload.birth_date, today)
}

fn prepare_simulation(
    payload: &SimulatePayload,
) -> Result<(SimulationRequest, Option<Withdrawal>), ProjectionError> {
    let withdrawal = payload.simulator.withdrawal(&payload.pension)?;
    let start = payload.start_date.unwrap_or_else(|| Local::now().date_naive());
    let request = payload
        .simulator
        .clone()
        .into_request(&payload.pension, payload.birth_date, start)?;
    Ok((request, withdrawal))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/chart", post(chart_handler))
        .route("/api/chart/detail", post(detail_handler))
        .route("/api/diagnosis", post(diagnosis_handler))
        .route("/api/simulate", post(simulate_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(port: u16, client: CalcClient) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(AppState { client });

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "pension-view HTTP API listening");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn chart_handler(payload: Result<Json<ChartPayload>, JsonRejection>) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(&rejection),
    };
    match chart_from_payload(&payload) {
        Ok(chart) => json_response(StatusCode::OK, chart),
        Err(err) => projection_error_response(&err),
    }
}

async fn detail_handler(payload: Result<Json<DetailPayload>, JsonRejection>) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(&rejection),
    };
    match detail_from_payload(&payload) {
        Ok(detail) => json_response(StatusCode::OK, detail),
        Err(err) => projection_error_response(&err),
    }
}

async fn diagnosis_handler(payload: Result<Json<DiagnosisPayload>, JsonRejection>) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(&rejection),
    };
    json_response(StatusCode::OK, diagnosis_from_payload(&payload))
}

async fn simulate_handler(
    State(state): State<AppState>,
    payload: Result<Json<SimulatePayload>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(&rejection),
    };
    let (request, withdrawal) = match prepare_simulation(&payload) {
        Ok(prepared) => prepared,
        Err(err) => return projection_error_response(&err),
    };
    let projection = match state.client.simulate(&request).await {
        Ok(projection) => projection,
        Err(err) => return client_error_response(&err),
    };
    let max_points = max_points_for(payload.screen_width, None);
    match build_chart(&projection.records, payload.mode, max_points) {
        Ok(chart) => json_response(
            StatusCode::OK,
            SimulateResponse {
                request,
                withdrawal,
                termination: projection.termination,
                chart,
            },
        ),
        Err(err) => projection_error_response(&err),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

fn projection_error_response(err: &ProjectionError) -> Response {
    error_response(StatusCode::BAD_REQUEST, &err.to_string())
}

fn rejection_response(rejection: &JsonRejection) -> Response {
    debug!(error = %rejection, "request body rejected");
    error_response(rejection.status(), &rejection.body_text())
}

fn client_error_response(err: &ClientError) -> Response {
    warn!(error = %err, "remote projection failed");
    error_response(StatusCode::BAD_GATEWAY, &err.to_string())
}

pub fn describe_change(diagnosis: &Diagnosis) -> Option<(String, Decimal)> {
    diagnosis
        .benefit_change
        .as_ref()
        .map(|change| (change.label.clone(), change.percent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn monthly_json(months: usize) -> serde_json::Value {
        let records: Vec<serde_json::Value> = (0..months)
            .map(|i| {
                json!({
                    "mesAno": format!("{:02}/{}", i % 12 + 1, 2025 + i / 12),
                    "saldoInicial": 1_000_000 - i as i64 * 1_000,
                    "beneficioPago": 1_000,
                })
            })
            .collect();
        serde_json::Value::Array(records)
    }

    fn pension_json() -> serde_json::Value {
        json!({
            "matricula": 12345,
            "modalidade": {"parametro": "1.5", "codigo": 40, "descricao": "Percentual"},
            "regimeTributario": {"codigo": 1, "descricao": "Regressivo"},
            "saldo": {"valor": 250000, "referencia": "05/2025"},
            "beneficio": {"dataInicio": "2020-01-01", "valor": 1875.40}
        })
    }

    #[test]
    fn chart_payload_defaults_to_benefit_on_a_phone_width() {
        let payload: ChartPayload =
            serde_json::from_value(json!({ "projecao": monthly_json(1_200) })).expect("valid payload");
        let chart = chart_from_payload(&payload).expect("valid chart");
        assert_eq!(chart.mode, ChartMode::Benefit);
        assert_eq!(chart.points.len(), 6);
        assert_eq!(chart.labels.last().map(String::as_str), Some("2124"));
    }

    #[test]
    fn explicit_max_points_wins_over_screen_width() {
        let payload: ChartPayload = serde_json::from_value(json!({
            "projecao": monthly_json(1_200),
            "mode": "saldo",
            "screenWidth": 2000.0,
            "maxPoints": 10
        }))
        .expect("valid payload");
        let chart = chart_from_payload(&payload).expect("valid chart");
        assert_eq!(chart.points.len(), 10);
        assert_eq!(chart.title, "Projeção do Saldo");
    }

    #[test]
    fn detail_payload_formats_values() {
        let payload: DetailPayload = serde_json::from_value(json!({
            "projecao": monthly_json(36),
            "index": 1
        }))
        .expect("valid payload");
        let detail = detail_from_payload(&payload).expect("in range");
        assert_eq!(detail.point.year, 2026);
        assert_eq!(detail.opening_balance_label, "R$ 988.000,00");
        assert_eq!(detail.paid_benefit_label, "R$ 1.000,00");

        let json = serde_json::to_value(&detail).expect("serializes");
        assert_eq!(json["year"], 2026);
        assert!(json.get("paidBenefitLabel").is_some());
    }

    #[test]
    fn detail_out_of_range_is_a_bad_request() {
        let payload: DetailPayload = serde_json::from_value(json!({
            "projecao": monthly_json(36),
            "index": -1
        }))
        .expect("valid payload");
        let err = detail_from_payload(&payload).expect_err("negative index");
        let response = projection_error_response(&err);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn diagnosis_payload_uses_given_today() {
        let payload: DiagnosisPayload = serde_json::from_value(json!({
            "pension": pension_json(),
            "projection": {
                "projecao": monthly_json(24),
                "motivoTermino": {"code": "IDADE_MAXIMA", "description": "Idade máxima",
                    "dataTermino": "12/2060", "saldoRemanescente": 1000, "idadeTermino": 100}
            },
            "birthDate": "1960-05-17",
            "today": "2025-06-01"
        }))
        .expect("valid payload");
        let diagnosis = diagnosis_from_payload(&payload);
        assert_eq!(diagnosis.current_age, 65);
        assert_eq!(diagnosis.years_remaining, 35);
        let (label, _) = describe_change(&diagnosis).expect("non-zero base");
        assert_eq!(label, "-46,68%");
    }

    #[test]
    fn simulation_request_is_prepared_before_any_network_call() {
        let payload: SimulatePayload = serde_json::from_value(json!({
            "pension": pension_json(),
            "birthDate": "1960-05-17",
            "startDate": "2025-06-01",
            "simulator": {
                "incomeType": "PERCENTUAL_SALDO_ANUAL",
                "balancePercentage": "6",
                "annualReturn": 5,
                "withdrawalPercentage": 10
            }
        }))
        .expect("valid payload");
        let (request, withdrawal) = prepare_simulation(&payload).expect("complete input");
        assert_eq!(request.saldo_acumulado_inicial, Decimal::from(225_000));
        assert_eq!(request.parametro_pagamento, Decimal::from(6));
        assert_eq!(withdrawal.map(|w| w.withdrawn), Some(Decimal::from(25_000)));
    }

    #[test]
    fn excessive_withdrawal_is_rejected() {
        let payload: SimulatePayload = serde_json::from_value(json!({
            "pension": pension_json(),
            "birthDate": "1960-05-17",
            "simulator": {
                "incomeType": "PRAZO_DEFINIDO",
                "termYears": 15,
                "annualReturn": 5,
                "withdrawalPercentage": 30
            }
        }))
        .expect("valid payload");
        assert!(matches!(
            prepare_simulation(&payload),
            Err(ProjectionError::InvalidArgument(_))
        ));
    }

    #[test]
    fn responses_are_never_cached() {
        let ok = json_response(StatusCode::OK, json!({"ok": true}));
        assert_eq!(
            ok.headers().get(header::CACHE_CONTROL).map(|v| v.as_bytes()),
            Some(&b"no-store"[..])
        );
        let missing = client_error_response(&ClientError::MissingToken);
        assert_eq!(missing.status(), StatusCode::BAD_GATEWAY);
        assert!(missing.headers().contains_key(header::CACHE_CONTROL));
    }

    async fn serve_api() -> String {
        let client = CalcClient::new(Default::default()).expect("client builds");
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind local port");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, router(AppState { client }))
                .await
                .expect("test server");
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn malformed_bodies_get_the_json_error_shape() {
        let base = serve_api().await;
        let http = reqwest::Client::new();
        let cases = [
            ("/api/chart", "{not json"),
            ("/api/chart/detail", r#"{"projecao": []}"#),
            ("/api/diagnosis", "[]"),
            ("/api/simulate", r#"{"birthDate": "17/05/1960"}"#),
        ];
        for (path, body) in cases {
            let response = http
                .post(format!("{base}{path}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(body)
                .send()
                .await
                .expect("request sent");
            assert!(response.status().is_client_error(), "{path}: {}", response.status());
            assert_eq!(
                response.headers().get(header::CACHE_CONTROL).map(|v| v.as_bytes()),
                Some(&b"no-store"[..]),
                "{path}"
            );
            let json: serde_json::Value = response.json().await.expect("json error body");
            assert!(json["error"].as_str().is_some_and(|e| !e.is_empty()), "{path}: {json}");
        }

        let response = http
            .post(format!("{base}/api/chart"))
            .body(r#"{"projecao": []}"#)
            .send()
            .await
            .expect("request sent");
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let json: serde_json::Value = response.json().await.expect("json error body");
        assert!(json.get("error").is_some());
    }

    #[tokio::test]
    async fn unknown_routes_fall_through_to_json_404() {
        let response = not_found_handler().await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
