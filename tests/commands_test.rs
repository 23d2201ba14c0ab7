//! # 管理命令集成测试

mod common;

use axum::http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;

use common::{TestApp, api, body_json};
use school_portal::commands::{SuperuserOutcome, create_superuser};

#[tokio::test]
async fn test_create_superuser_then_already_exists() {
    let app = TestApp::new().await;
    let db = app.state.database.as_ref();

    let outcome = create_superuser(db, "root@school.test", "r00t-Passw0rd").await.unwrap();
    let SuperuserOutcome::Created(user) = outcome else {
        panic!("expected a new superuser, got {outcome:?}");
    };
    assert_eq!(user.email, "root@school.test");
    assert!(user.is_staff);
    assert!(user.is_superuser);
    assert!(user.is_active);

    let outcome = create_superuser(db, "root@school.test", "another-Passw0rd").await.unwrap();
    match outcome {
        SuperuserOutcome::AlreadyExists(email) => assert_eq!(email, "root@school.test"),
        SuperuserOutcome::Created(_) => panic!("duplicate superuser was created"),
    }

    // 原密码仍然有效
    let response = app
        .send(api(
            Method::POST,
            "/api/auth/jwt/create/",
            None,
            Some(json!({ "email": "root@school.test", "password": "r00t-Passw0rd" })),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["data"]["access"].is_string());
}
