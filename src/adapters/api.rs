use std::sync::Arc;

use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, Responder, get, post, web};
use serde::{Deserialize, Serialize};

use crate::app::dispatch::{Dispatcher, InvokeError, Operation};
use crate::app::services::SqliteLedgerStore;
use crate::domain::error::LedgerError;
use crate::domain::timestamp::SystemClock;

pub type LedgerDispatcher = Dispatcher<SqliteLedgerStore, SystemClock>;

#[derive(Clone)]
pub struct ApiState {
    pub dispatcher: Arc<LedgerDispatcher>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InvokeRequest {
    pub function: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsDbResponse {
    pub schema_version: u32,
    pub states_count: i64,
    pub history_count: i64,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health)
        .service(invoke_endpoint)
        .service(list_devices_endpoint)
        .service(get_device_endpoint)
        .service(get_device_history_endpoint)
        .service(list_device_events_endpoint)
        .service(list_location_devices_endpoint)
        .service(get_location_device_list_endpoint)
        .service(get_db_diagnostics_endpoint);
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

#[post("/invoke")]
async fn invoke_endpoint(
    state: web::Data<ApiState>,
    request: web::Json<InvokeRequest>,
) -> impl Responder {
    let request = request.into_inner();
    dispatch(&state, &request.function, &request.args)
}

#[get("/devices")]
async fn list_devices_endpoint(state: web::Data<ApiState>) -> impl Responder {
    dispatch(&state, "getAllLatest", &[])
}

#[get("/devices/{device_id}")]
async fn get_device_endpoint(
    state: web::Data<ApiState>,
    path: web::Path<String>,
) -> impl Responder {
    dispatch(&state, "getEvent", &[path.into_inner()])
}

#[get("/devices/{device_id}/history")]
async fn get_device_history_endpoint(
    state: web::Data<ApiState>,
    path: web::Path<String>,
) -> impl Responder {
    dispatch(&state, "getHistoryForDevice", &[path.into_inner()])
}

#[get("/devices/{device_id}/events")]
async fn list_device_events_endpoint(
    state: web::Data<ApiState>,
    path: web::Path<String>,
) -> impl Responder {
    dispatch(&state, "getEventsForDevice", &[path.into_inner()])
}

#[get("/locations/{location_id}/devices")]
async fn list_location_devices_endpoint(
    state: web::Data<ApiState>,
    path: web::Path<String>,
) -> impl Responder {
    dispatch(&state, "queryLocation", &[path.into_inner()])
}

#[get("/locations/{location_id}/device-list")]
async fn get_location_device_list_endpoint(
    state: web::Data<ApiState>,
    path: web::Path<String>,
) -> impl Responder {
    dispatch(&state, "getDeviceList", &[path.into_inner()])
}

#[get("/diagnostics/db")]
async fn get_db_diagnostics_endpoint(state: web::Data<ApiState>) -> impl Responder {
    match state.dispatcher.store().diagnostics() {
        Ok(diagnostics) => HttpResponse::Ok().json(DiagnosticsDbResponse {
            schema_version: diagnostics.schema_version,
            states_count: diagnostics.states_count,
            history_count: diagnostics.history_count,
        }),
        Err(error) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("database query failed: {error}")
        })),
    }
}

fn dispatch(state: &ApiState, function: &str, args: &[String]) -> HttpResponse {
    match state.dispatcher.invoke(function, args) {
        Ok(payload) => {
            let content_type = match Operation::from_name(function) {
                Some(operation) if operation.is_write() => ContentType::plaintext(),
                _ => ContentType::json(),
            };
            HttpResponse::Ok().content_type(content_type).body(payload)
        }
        Err(error) => invoke_error_response(error),
    }
}

fn invoke_error_response(error: InvokeError) -> HttpResponse {
    let body = serde_json::json!({ "error": error.to_string() });
    match error {
        InvokeError::UnknownFunction(_)
        | InvokeError::Ledger(
            LedgerError::Arity { .. } | LedgerError::Argument(_) | LedgerError::Key(_),
        ) => HttpResponse::BadRequest().json(body),
        InvokeError::Ledger(LedgerError::NotFound(_)) => HttpResponse::NotFound().json(body),
        InvokeError::Ledger(LedgerError::Storage(_) | LedgerError::Query(_)) => {
            HttpResponse::InternalServerError().json(body)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, body::to_bytes, http::StatusCode, test, web};

    use crate::app::dispatch::Dispatcher;
    use crate::app::ledger::EventLedgerService;
    use crate::domain::timestamp::SystemClock;
    use crate::test_support::{compact_event_args, full_event_args, open_test_store};

    use super::{ApiState, InvokeRequest, configure_routes};

    fn build_state_with_migrated_db(name: &str) -> ApiState {
        ApiState {
            dispatcher: Arc::new(Dispatcher::new(
                open_test_store(name),
                SystemClock,
                EventLedgerService::default(),
            )),
        }
    }

    fn save_compact(state: &ApiState, device_id: &str, value: &str, time: &str) {
        state
            .dispatcher
            .invoke(
                "saveNewEvent",
                &compact_event_args("Lamp", device_id, "loc1", value, time),
            )
            .expect("save should succeed");
    }

    #[actix_web::test]
    async fn health_endpoint_returns_ok() {
        let state = build_state_with_migrated_db("health");
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn invoke_saves_and_acknowledges() {
        let state = build_state_with_migrated_db("invoke-save-api");
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/invoke")
            .set_json(InvokeRequest {
                function: "saveNewEvent".to_string(),
                args: full_event_args(),
            })
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body())
            .await
            .expect("body should be readable");
        assert_eq!(body.as_ref(), b"hallway switch device");

        let diagnostics = state
            .dispatcher
            .store()
            .diagnostics()
            .expect("diagnostics should succeed");
        assert_eq!(diagnostics.states_count, 2);
    }

    #[actix_web::test]
    async fn invoke_maps_errors_to_status_codes() {
        let state = build_state_with_migrated_db("invoke-errors-api");
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let cases = [
            ("dropTables", vec![], StatusCode::BAD_REQUEST),
            ("saveNewEvent", vec!["a".to_string()], StatusCode::BAD_REQUEST),
            ("queryLocation", vec![], StatusCode::BAD_REQUEST),
            ("getEvent", vec!["ghost".to_string()], StatusCode::NOT_FOUND),
        ];

        for (function, args, expected) in cases {
            let req = test::TestRequest::post()
                .uri("/invoke")
                .set_json(InvokeRequest {
                    function: function.to_string(),
                    args,
                })
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), expected, "status for {function}");
        }
    }

    #[actix_web::test]
    async fn unknown_function_reports_fixed_message() {
        let state = build_state_with_migrated_db("invoke-unknown-api");
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/invoke")
            .set_json(serde_json::json!({ "function": "init" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(resp.into_body())
            .await
            .expect("body should be readable");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("body should be json");
        assert_eq!(json["error"], "Invalid function name for 'invoke'");
    }

    #[actix_web::test]
    async fn devices_returns_empty_array_for_empty_ledger() {
        let state = build_state_with_migrated_db("devices-empty-api");
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/devices").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body())
            .await
            .expect("body should be readable");
        assert_eq!(body.as_ref(), b"[]");
    }

    #[actix_web::test]
    async fn device_routes_return_latest_state_and_history() {
        let state = build_state_with_migrated_db("device-routes-api");
        save_compact(&state, "dev1", "on", "2020-01-02T03:04:05");
        save_compact(&state, "dev1", "off", "2020-01-02T03:05:05");

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/devices/DEV1").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body())
            .await
            .expect("body should be readable");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("body should be json");
        assert_eq!(json["value"], "off");
        assert_eq!(json["docType"], "EventLess");

        let req = test::TestRequest::get()
            .uri("/devices/dev1/history")
            .to_request();
        let resp = test::call_service(&app, req).await;
        let body = to_bytes(resp.into_body())
            .await
            .expect("body should be readable");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("body should be json");
        assert_eq!(json.as_array().map(Vec::len), Some(2));
        assert_eq!(json[0]["Record"]["value"], "on");

        let req = test::TestRequest::get()
            .uri("/devices/dev1/events")
            .to_request();
        let resp = test::call_service(&app, req).await;
        let body = to_bytes(resp.into_body())
            .await
            .expect("body should be readable");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("body should be json");
        assert_eq!(json[0]["Key"], "||combined||dev1||2020-01-02t03:04:05||");
    }

    #[actix_web::test]
    async fn location_routes_query_latest_states_and_device_list() {
        let state = build_state_with_migrated_db("location-routes-api");
        save_compact(&state, "dev1", "on", "2020-01-02T03:04:05");

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/locations/loc1/device-list")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        state
            .dispatcher
            .invoke(
                "saveDevice",
                &["loc1".to_string(), "dev1".to_string(), "Lamp".to_string()],
            )
            .expect("device list should save");

        let req = test::TestRequest::get()
            .uri("/locations/loc1/device-list")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri("/locations/loc1/devices")
            .to_request();
        let resp = test::call_service(&app, req).await;
        let body = to_bytes(resp.into_body())
            .await
            .expect("body should be readable");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("body should be json");
        assert_eq!(
            json,
            serde_json::json!([{
                "Key": "dev1",
                "Record": {"displayName": "lamp", "value": "on", "time": "2020-01-02t03:04:05"}
            }])
        );
    }

    #[actix_web::test]
    async fn db_diagnostics_report_counts() {
        let state = build_state_with_migrated_db("diagnostics-api");
        save_compact(&state, "dev1", "on", "2020-01-02T03:04:05");

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/diagnostics/db").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = to_bytes(resp.into_body())
            .await
            .expect("body should be readable");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("body should be json");
        assert_eq!(json["schemaVersion"], 1);
        assert_eq!(json["statesCount"], 2);
        assert_eq!(json["historyCount"], 2);
    }
}
