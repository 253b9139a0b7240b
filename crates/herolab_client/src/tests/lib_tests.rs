use axum::{http::StatusCode, routing::post, Json, Router};
use tokio::net::TcpListener;

use super::*;

#[derive(Debug, Clone, Copy)]
enum MockBehavior {
    Ok,
    WrongSeverity,
    WrongResult,
    WrongCallerId,
    ServerError,
}

async fn spawn_mock(behavior: MockBehavior) -> String {
    let app = Router::new().route(
        ACQUIRE_ACCESS_TOKEN_ROUTE,
        post(
            move |Json(request): Json<AcquireAccessTokenRequest>| async move {
                if let MockBehavior::ServerError = behavior {
                    return Err(StatusCode::INTERNAL_SERVER_ERROR);
                }

                let mut response = AcquireAccessTokenResponse {
                    severity: Severity::Success,
                    result: CallResult::Success,
                    caller_id: request.caller_id,
                    access_token: "token-abc".to_string(),
                };
                match behavior {
                    MockBehavior::WrongSeverity => response.severity = Severity::Error,
                    MockBehavior::WrongResult => response.result = CallResult::Failure,
                    MockBehavior::WrongCallerId => response.caller_id = request.caller_id + 17,
                    MockBehavior::Ok | MockBehavior::ServerError => {}
                }
                Ok(Json(response))
            },
        ),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn exchanges_refresh_token_for_access_token() {
    let base_url = spawn_mock(MockBehavior::Ok).await;
    let client = HeroLabClient::new(base_url, "vtt-todo");

    let token = client
        .acquire_access_token("refresh-xyz")
        .await
        .expect("token");
    assert_eq!(token, "token-abc");
}

#[tokio::test]
async fn rejects_non_success_severity() {
    let base_url = spawn_mock(MockBehavior::WrongSeverity).await;
    let client = HeroLabClient::new(base_url, "vtt-todo");

    let err = client
        .acquire_access_token("refresh-xyz")
        .await
        .expect_err("severity violation");
    assert_eq!(
        err.downcast_ref::<ProtocolError>(),
        Some(&ProtocolError::Severity(Severity::Error))
    );
}

#[tokio::test]
async fn rejects_non_success_result() {
    let base_url = spawn_mock(MockBehavior::WrongResult).await;
    let client = HeroLabClient::new(base_url, "vtt-todo");

    let err = client
        .acquire_access_token("refresh-xyz")
        .await
        .expect_err("result violation");
    assert_eq!(
        err.downcast_ref::<ProtocolError>(),
        Some(&ProtocolError::Result(CallResult::Failure))
    );
}

#[tokio::test]
async fn rejects_caller_id_mismatch() {
    let base_url = spawn_mock(MockBehavior::WrongCallerId).await;
    let client = HeroLabClient::new(base_url, "vtt-todo");

    let err = client
        .acquire_access_token("refresh-xyz")
        .await
        .expect_err("caller id violation");
    assert!(matches!(
        err.downcast_ref::<ProtocolError>(),
        Some(ProtocolError::CallerIdMismatch { .. })
    ));
}

#[tokio::test]
async fn propagates_http_level_failures() {
    let base_url = spawn_mock(MockBehavior::ServerError).await;
    let client = HeroLabClient::new(base_url, "vtt-todo");

    let err = client
        .acquire_access_token("refresh-xyz")
        .await
        .expect_err("http failure");
    assert!(err.downcast_ref::<ProtocolError>().is_none());
}

#[tokio::test]
async fn caller_ids_increment_per_call() {
    let base_url = spawn_mock(MockBehavior::Ok).await;
    let client = HeroLabClient::new(base_url, "vtt-todo");

    client.acquire_access_token("r1").await.expect("first");
    client.acquire_access_token("r2").await.expect("second");
    assert_eq!(client.caller_seq.load(Ordering::Relaxed), 3);
}
