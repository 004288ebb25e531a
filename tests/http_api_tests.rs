//! HTTP surface tests: routing, status mapping and JSON bodies, driven
//! through `tower::ServiceExt::oneshot` against the in-memory backend.
#![cfg(feature = "http-server")]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use matriculas_rust::db::repositories::LocalRepository;
use matriculas_rust::db::repository::FullRepository;
use matriculas_rust::http::{create_router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    repo: Arc<LocalRepository>,
}

fn test_app() -> TestApp {
    let repo = Arc::new(LocalRepository::new());
    let state = AppState::new(Arc::clone(&repo) as Arc<dyn FullRepository>);
    TestApp {
        router: create_router(state),
        repo,
    }
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(json_body) => Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(json_body.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app();
    let (status, body) = send(&app.router, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_slot_create_and_conflict_status() {
    let app = test_app();
    let slot = json!({
        "dia": "lunes",
        "hora_inicio": "08:00",
        "hora_salida": "10:00",
        "modalidad": "virtual"
    });

    let (status, body) = send(&app.router, "POST", "/v1/horarios", Some(slot.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["horas_diarias"], 2.0);
    assert_eq!(body["dia"], "lunes");

    let (status, body) = send(&app.router, "POST", "/v1/horarios", Some(slot)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "SCHEDULE_CONFLICT");
}

#[tokio::test]
async fn test_presencial_slot_error_statuses() {
    let app = test_app();

    let no_room = json!({
        "dia": "martes",
        "hora_inicio": "10:00",
        "hora_salida": "12:00",
        "modalidad": "presencial"
    });
    let (status, body) = send(&app.router, "POST", "/v1/horarios", Some(no_room)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "ROOM_REQUIRED");

    let ghost_room = json!({
        "dia": "martes",
        "hora_inicio": "10:00",
        "hora_salida": "12:00",
        "modalidad": "presencial",
        "aula_id": 404
    });
    let (status, body) = send(&app.router, "POST", "/v1/horarios", Some(ghost_room)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "ROOM_NOT_FOUND");
}

#[tokio::test]
async fn test_room_crud() {
    let app = test_app();
    let (status, body) = send(
        &app.router,
        "POST",
        "/v1/aulas",
        Some(json!({"nombre_aula": "A-101", "capacidad": 30, "tipo_aula": "teorica"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let room_id = body["id_aula"].as_i64().unwrap();

    let (status, body) = send(&app.router, "GET", &format!("/v1/aulas/{}", room_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nombre_aula"], "A-101");

    let (status, body) = send(&app.router, "GET", "/v1/aulas", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn test_invalid_modalidad_path_is_bad_request() {
    let app = test_app();
    let (status, body) = send(&app.router, "GET", "/v1/horarios/modalidad/hibrida", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_enrollment_flow_end_to_end() {
    let app = test_app();

    // Catalog entities come from outside this core; seed them directly.
    let student = app.repo.seed_student("Ana", "Mora");
    let teacher = app.repo.seed_teacher("Luis", "luis@academia.ec");
    let subject = app.repo.seed_subject("Matematicas");

    let (_, slot1) = send(
        &app.router,
        "POST",
        "/v1/horarios",
        Some(json!({
            "dia": "lunes", "hora_inicio": "08:00", "hora_salida": "10:00",
            "modalidad": "virtual"
        })),
    )
    .await;
    let (_, slot2) = send(
        &app.router,
        "POST",
        "/v1/horarios",
        Some(json!({
            "dia": "martes", "hora_inicio": "14:00", "hora_salida": "17:00",
            "modalidad": "virtual"
        })),
    )
    .await;

    let enrollment = json!({
        "fecha": "2024-03-01",
        "fecha_inicio": "2024-03-04",
        "fecha_final": "2024-06-28",
        "turno": "mañana",
        "id_estudiante": student.id_estudiante.value(),
        "id_usuario": teacher.id_usuario.value(),
        "id_materias": [subject.id_materia.value()],
        "programacion": {"horario_id": [slot1["id_horario"], slot2["id_horario"]]},
        "precio": 10.0,
        "valor_materiales": 20.0,
        "con_iva": true
    });
    let (status, body) = send(&app.router, "POST", "/v1/matriculas", Some(enrollment)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matricula"]["cantidad"], 5.0);
    assert_eq!(body["matricula"]["valor_horas"], 50.0);
    assert_eq!(body["matricula"]["valor_total"], 80.5);
    let id = body["matricula"]["id_matricula"].as_i64().unwrap();

    // Schedule-only patch reprices everything (scenario: quantity 5 → 2).
    let (status, body) = send(
        &app.router,
        "PATCH",
        &format!("/v1/matriculas/{}", id),
        Some(json!({"programacion": {"horario_id": [slot1["id_horario"]]}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matricula"]["cantidad"], 2.0);
    assert_eq!(body["matricula"]["valor_total"], 46.0);

    let (status, body) = send(
        &app.router,
        "GET",
        &format!("/v1/usuarios/{}/matriculas", teacher.id_usuario.value()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);

    let (status, _) = send(&app.router, "DELETE", &format!("/v1/matriculas/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app.router, "GET", &format!("/v1/matriculas/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_missing_enrollment_is_not_found() {
    let app = test_app();
    let (status, body) = send(&app.router, "GET", "/v1/matriculas/7", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}
