//! Contract tests for ClinicClient against a mock clinic API.

use serde_json::json;
use vetbook_api::{AccessToken, ApiConfig, ApiError, ClinicBackend, ClinicClient, ErrorKind};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(mock_server: &MockServer) -> ClinicClient {
    ClinicClient::new(ApiConfig::local_mock(&mock_server.uri()).unwrap()).unwrap()
}

fn token() -> AccessToken {
    AccessToken::new("test-token")
}

#[tokio::test]
async fn user_appointments_sends_bearer_and_unwraps_envelope() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/api/appointment/user/u-1"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "appointments": [
                {"appointment_id": "77", "pet_name": "Milo", "status": "Confirmed"},
                {"appointment_id": "78", "pet_name": "Luna", "status": "Pending"}
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let records = test_client(&mock_server)
        .user_appointments(&token(), "u-1")
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].text("pet_name"), Some("Milo".into()));
}

#[tokio::test]
async fn doctor_appointments_accepts_bare_array_and_data_envelope() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/api/appointment/doctor/d-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/api/appointment/doctor/d-2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": [{"id": 2}, {"id": 3}]})),
        )
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    assert_eq!(client.doctor_appointments(&token(), "d-1").await.unwrap().len(), 1);
    assert_eq!(client.doctor_appointments(&token(), "d-2").await.unwrap().len(), 2);
}

#[tokio::test]
async fn doctor_appointments_unknown_envelope_is_contract_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/api/appointment/doctor/d-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .mount(&mock_server)
        .await;

    let err = test_client(&mock_server)
        .doctor_appointments(&token(), "d-1")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Contract { .. }), "got {err:?}");
}

#[tokio::test]
async fn appointment_details_maps_status_codes() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/api/appointment/details/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/api/appointment/details/locked"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/api/appointment/details/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let not_found = client.appointment_details(&token(), "missing").await.unwrap_err();
    assert_eq!(not_found.kind(), ErrorKind::NotFound);

    let auth = client.appointment_details(&token(), "locked").await.unwrap_err();
    assert_eq!(auth.kind(), ErrorKind::Auth);

    match client.appointment_details(&token(), "broken").await.unwrap_err() {
        ApiError::Status { status, body, .. } => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected Status, got {other:?}"),
    }
}

#[tokio::test]
async fn pet_and_doctor_detail_unwrap_single_record_envelopes() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/api/pet/detail/p-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"pet_name": "Milo", "species": "Cat", "breed": "Persian", "age": 3}
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/api/doctor/detail/d-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "doctor_id": "d-1", "name": "Dr. Sari", "specialization": "Feline"
        })))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let pet = client.pet_detail(&token(), "p-1").await.unwrap();
    assert_eq!(pet.text("breed"), Some("Persian".into()));
    assert_eq!(pet.text("age"), Some("3".into()));

    let doctor = client.doctor_detail(&token(), "d-1").await.unwrap();
    assert_eq!(doctor.text("name"), Some("Dr. Sari".into()));
}

#[tokio::test]
async fn update_appointment_status_puts_status_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/v1/api/appointment/update/update/77"))
        .and(body_json(json!({"status": "Rejected"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    test_client(&mock_server)
        .update_appointment_status(&token(), "77", "Rejected")
        .await
        .unwrap();
}
