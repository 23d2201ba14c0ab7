//! # REST API 集成测试
//!
//! 通过完整路由（含认证与 Host 中间件）验证 JSON 接口行为。

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use pretty_assertions::assert_eq;
use serde_json::json;

use common::{HOST, PASSWORD, TestApp, api, body_json, get};

#[tokio::test]
async fn test_ping() {
    let app = TestApp::new().await;
    let response = app.send(get("/ping")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_disallowed_host_is_rejected() {
    let app = TestApp::new().await;
    let mut request = get("/ping");
    request
        .headers_mut()
        .insert("host", "evil.example.com".parse().unwrap());

    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "DISALLOWED_HOST");
}

#[tokio::test]
async fn test_register_rejects_mismatched_passwords() {
    let app = TestApp::new().await;
    let response = app
        .send(api(
            Method::POST,
            "/api/auth/users/",
            None,
            Some(json!({
                "email": "new@school.test",
                "password": "Str0ng-pass",
                "confirm_password": "Different-pass",
            })),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["fields"]["confirm_password"][0], "Passwords do not match.");
}

#[tokio::test]
async fn test_register_rejects_weak_passwords() {
    let app = TestApp::new().await;

    for password in ["password", "84736251"] {
        let response = app
            .send(api(
                Method::POST,
                "/api/auth/users/",
                None,
                Some(json!({ "email": "weak@school.test", "password": password })),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "password {password}");
        let body = body_json(response).await;
        assert!(body["error"]["fields"]["password"].is_array(), "password {password}");
    }
}

#[tokio::test]
async fn test_register_then_obtain_tokens() {
    let app = TestApp::new().await;
    let response = app
        .send(api(
            Method::POST,
            "/api/auth/users/",
            None,
            Some(json!({
                "email": "parent@school.test",
                "first_name": "Amina",
                "password": "Str0ng-pass",
            })),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["data"]["email"], "parent@school.test");
    assert_eq!(body["data"]["is_staff"], false);

    let response = app
        .send(api(
            Method::POST,
            "/api/auth/jwt/create/",
            None,
            Some(json!({ "email": "parent@school.test", "password": "Str0ng-pass" })),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let access = body["data"]["access"].as_str().unwrap().to_string();
    let refresh = body["data"]["refresh"].as_str().unwrap().to_string();

    let response = app
        .send(api(Method::GET, "/api/auth/users/me/", Some(&access), None))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["first_name"], "Amina");

    let response = app
        .send(api(
            Method::POST,
            "/api/auth/jwt/refresh/",
            None,
            Some(json!({ "refresh": refresh })),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["data"]["access"].is_string());
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let app = TestApp::new().await;
    app.user("staff@school.test", &[]).await;

    let response = app
        .send(api(
            Method::POST,
            "/api/auth/jwt/create/",
            None,
            Some(json!({ "email": "staff@school.test", "password": "wrong-password" })),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_requires_authentication() {
    let app = TestApp::new().await;
    let response = app
        .send(api(Method::GET, "/api/auth/users/me/", None, None))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_notice_without_permission_is_forbidden() {
    let app = TestApp::new().await;
    let user = app.user("viewer@school.test", &["public.view_notice"]).await;
    let token = app.token(&user);

    let response = app
        .send(api(
            Method::POST,
            "/api/public/notices/",
            Some(&token),
            Some(json!({ "title": "Exam week", "content": "Starts Monday" })),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(
        body["error"]["message"],
        "You do not have permission to perform this action."
    );
}

#[tokio::test]
async fn test_create_notice_with_permission() {
    let app = TestApp::new().await;
    let user = app.user("editor@school.test", &["public.add_notice"]).await;
    let token = app.token(&user);

    let response = app
        .send(api(
            Method::POST,
            "/api/public/notices/",
            Some(&token),
            Some(json!({ "title": "Exam week", "content": "Starts Monday" })),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["data"]["title"], "Exam week");
    assert_eq!(body["data"]["is_active"], true);
}

#[tokio::test]
async fn test_notice_search_matches_content() {
    let app = TestApp::new().await;
    app.notice("Sports day", "Bring your running shoes", true).await;
    app.notice("Library", "New books arrived", true).await;

    let response = app
        .send(get("/api/public/notices/?search=running"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let titles: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Sports day"]);
    assert_eq!(body["pagination"]["total"], 1);
}

#[tokio::test]
async fn test_inactive_notices_hidden_from_anonymous() {
    let app = TestApp::new().await;
    app.notice("Published", "Visible", true).await;
    let draft = app.notice("Draft", "Hidden", false).await;

    let body = body_json(app.send(get("/api/public/notices/")).await).await;
    assert_eq!(body["pagination"]["total"], 1);

    let response = app
        .send(get(&format!("/api/public/notices/{}/", draft.id)))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let viewer = app.user("viewer@school.test", &["public.view_notice"]).await;
    let token = app.token(&viewer);
    let body = body_json(
        app.send(api(Method::GET, "/api/public/notices/", Some(&token), None))
            .await,
    )
    .await;
    assert_eq!(body["pagination"]["total"], 2);
}

#[tokio::test]
async fn test_recent_notices_returns_three_latest() {
    let app = TestApp::new().await;
    for i in 0..5 {
        app.notice(&format!("Notice {i}"), "Body", true).await;
    }

    let body = body_json(app.send(get("/api/public/notices/recent/")).await).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_patch_notice_keeps_other_fields() {
    let app = TestApp::new().await;
    let notice = app.notice("Original", "Keep me", true).await;
    let user = app.user("editor@school.test", &["public.change_notice"]).await;
    let token = app.token(&user);

    let response = app
        .send(api(
            Method::PATCH,
            &format!("/api/public/notices/{}/", notice.id),
            Some(&token),
            Some(json!({ "title": "Renamed" })),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["title"], "Renamed");
    assert_eq!(body["data"]["content"], "Keep me");

    let response = app
        .send(api(
            Method::PUT,
            &format!("/api/public/notices/{}/", notice.id),
            Some(&token),
            Some(json!({ "title": "Only title" })),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"]["fields"]["content"].is_array());
}

#[tokio::test]
async fn test_anonymous_admission_appears_in_staff_list() {
    let app = TestApp::new().await;
    let response = app
        .send(api(
            Method::POST,
            "/api/public/admissions/",
            None,
            Some(json!({
                "first_name": "Omar",
                "last_name": "Haddad",
                "email": "omar@family.test",
                "phone": "0700000000",
                "date_of_birth": "2015-03-14",
                "gender": "M",
                "address": "12 Orchard Lane",
                "grade_applying_for": "Grade 4",
                "parent_name": "Lina Haddad",
                "parent_phone": "0711111111",
                "parent_email": "lina@family.test",
            })),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .send(api(Method::GET, "/api/public/admissions/", None, None))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let staff = app
        .user("office@school.test", &["public.view_admissionapplication"])
        .await;
    let token = app.token(&staff);
    let response = app
        .send(api(
            Method::GET,
            "/api/public/admissions/?grade=Grade%204",
            Some(&token),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["email"], "omar@family.test");
}

#[tokio::test]
async fn test_admission_validation_collects_field_errors() {
    let app = TestApp::new().await;
    let response = app
        .send(api(
            Method::POST,
            "/api/public/admissions/",
            None,
            Some(json!({ "first_name": "Omar", "email": "not-an-email", "date_of_birth": "14/03/2015", "gender": "X" })),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let fields = &body_json(response).await["error"]["fields"];
    assert!(fields["email"].is_array());
    assert!(fields["date_of_birth"].is_array());
    assert!(fields["gender"].is_array());
    assert!(fields["last_name"].is_array());
    assert!(fields.get("first_name").is_none());
}

#[tokio::test]
async fn test_user_cannot_delete_own_account() {
    let app = TestApp::new().await;
    let admin = app.superuser("admin@school.test").await;
    let token = app.token(&admin);

    let response = app
        .send(api(
            Method::DELETE,
            &format!("/api/dashboard/users/{}/", admin.id),
            Some(&token),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_json(response).await["error"]["message"],
        "You cannot delete your own account."
    );
}

#[tokio::test]
async fn test_non_superuser_cannot_delete_superuser() {
    let app = TestApp::new().await;
    let admin = app.superuser("admin@school.test").await;
    let manager = app.user("manager@school.test", &["accounts.delete_user"]).await;
    let token = app.token(&manager);

    let response = app
        .send(api(
            Method::DELETE,
            &format!("/api/dashboard/users/{}/", admin.id),
            Some(&token),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_json(response).await["error"]["message"],
        "You cannot delete a superuser."
    );
}

#[tokio::test]
async fn test_delete_user_with_permission() {
    let app = TestApp::new().await;
    let manager = app.user("manager@school.test", &["accounts.delete_user"]).await;
    let target = app.user("leaver@school.test", &[]).await;
    let token = app.token(&manager);

    let response = app
        .send(api(
            Method::DELETE,
            &format!("/api/dashboard/users/{}/", target.id),
            Some(&token),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_update_roles_replaces_full_set() {
    let app = TestApp::new().await;
    let admin = app.superuser("admin@school.test").await;
    let teacher = app.group("Teacher", &["public.view_notice"]).await;
    let office = app.group("Office", &["public.view_admissionapplication"]).await;
    let librarian = app.group("Librarian", &[]).await;

    let user = app.user("staff@school.test", &[]).await;
    app.assign(&user, &teacher).await;
    app.assign(&user, &office).await;

    let token = app.token(&admin);
    let response = app
        .send(api(
            Method::POST,
            &format!("/api/dashboard/users/{}/update_roles/", user.id),
            Some(&token),
            Some(json!({ "groups": [librarian.id, 9999] })),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Roles updated for staff@school.test");
    assert_eq!(body["data"]["groups"], json!(["Librarian"]));

    assert_eq!(app.group_ids_of(&user).await, vec![librarian.id]);
}

#[tokio::test]
async fn test_group_crud_is_superuser_only() {
    let app = TestApp::new().await;
    let manager = app.user("manager@school.test", &["accounts.change_user"]).await;
    let token = app.token(&manager);

    let response = app
        .send(api(Method::GET, "/api/dashboard/groups/", Some(&token), None))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .send(api(
            Method::POST,
            "/api/dashboard/groups/",
            Some(&token),
            Some(json!({ "name": "Teachers" })),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_json(response).await["error"]["message"],
        "Only superadmins can create roles."
    );
}

#[tokio::test]
async fn test_superuser_creates_and_renames_group() {
    let app = TestApp::new().await;
    let admin = app.superuser("admin@school.test").await;
    let token = app.token(&admin);
    let view_notice = app.permission_id("public.view_notice").await;

    let response = app
        .send(api(
            Method::POST,
            "/api/dashboard/groups/",
            Some(&token),
            Some(json!({ "name": "Teachers", "permissions": [view_notice] })),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Role \"Teachers\" created successfully!");
    assert_eq!(body["data"]["permissions"], json!([view_notice]));
    let id = body["data"]["id"].as_i64().unwrap();

    let response = app
        .send(api(
            Method::POST,
            "/api/dashboard/groups/",
            Some(&token),
            Some(json!({ "name": "Teachers" })),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"]["fields"]["name"][0],
        "A role with this name already exists."
    );

    let response = app
        .send(api(
            Method::PATCH,
            &format!("/api/dashboard/groups/{id}/"),
            Some(&token),
            Some(json!({ "name": "Faculty" })),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["name"], "Faculty");
    assert_eq!(body["data"]["permissions"], json!([view_notice]));
}

#[tokio::test]
async fn test_dashboard_stats_and_capabilities() {
    let app = TestApp::new().await;
    app.notice("One", "Body", true).await;
    app.notice("Two", "Body", false).await;
    let user = app.user("viewer@school.test", &["public.view_notice"]).await;
    let token = app.token(&user);

    let body = body_json(
        app.send(api(Method::GET, "/api/dashboard/stats/", Some(&token), None))
            .await,
    )
    .await;
    assert_eq!(body["data"]["notice_count"], 1);
    assert_eq!(body["data"]["user_groups_count"], 1);
    assert!(body["data"].get("admission_count").is_none());

    let body = body_json(
        app.send(api(Method::GET, "/api/dashboard/permissions/", Some(&token), None))
            .await,
    )
    .await;
    assert_eq!(body["data"]["can_view_notices"], true);
    assert_eq!(body["data"]["can_add_notices"], false);
    assert_eq!(body["data"]["can_manage_users"], false);
}

#[tokio::test]
async fn test_dashboard_api_requires_authentication() {
    let app = TestApp::new().await;
    let response = app
        .send(api(Method::GET, "/api/dashboard/stats/", None, None))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_bearer_token_is_anonymous() {
    let app = TestApp::new().await;
    let response = app
        .send(api(Method::GET, "/api/public/notices/", Some("not-a-jwt"), None))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_permission_catalog_is_sorted_by_content_type() {
    let app = TestApp::new().await;
    let admin = app.superuser("admin@school.test").await;
    let token = app.token(&admin);

    let body = body_json(
        app.send(api(
            Method::GET,
            "/api/dashboard/permissions/catalog/",
            Some(&token),
            None,
        ))
        .await,
    )
    .await;
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["content_type_name"].as_str().unwrap())
        .collect();
    let mut sorted = names.clone();
    sorted.sort_unstable();
    assert_eq!(names, sorted);
    assert!(body["data"]
        .as_array()
        .unwrap()
        .iter()
        .any(|p| p["permission"] == "public.add_notice"));
}

#[tokio::test]
async fn test_user_list_filters_by_role() {
    let app = TestApp::new().await;
    let admin = app.superuser("admin@school.test").await;
    let teachers = app.group("Teachers", &[]).await;
    let member = app.user("teacher@school.test", &[]).await;
    app.assign(&member, &teachers).await;
    app.user("other@school.test", &[]).await;
    let token = app.token(&admin);

    let body = body_json(
        app.send(api(
            Method::GET,
            &format!("/api/dashboard/users/?role={}", teachers.id),
            Some(&token),
            None,
        ))
        .await,
    )
    .await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["email"], "teacher@school.test");

    let response = app
        .send(api(Method::GET, "/api/dashboard/users/?role=abc", Some(&token), None))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_with_seeded_password_constant() {
    let app = TestApp::new().await;
    app.user("staff@school.test", &[]).await;
    let response = app
        .send(api(
            Method::POST,
            "/api/auth/jwt/create/",
            None,
            Some(json!({ "email": "staff@school.test", "password": PASSWORD })),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_huge_page_number_returns_empty_page() {
    let app = TestApp::new().await;
    app.notice("Only", "Body", true).await;

    let response = app
        .send(get("/api/public/notices/?page=18446744073709551615"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"], json!([]));
    assert_eq!(body["pagination"]["total"], 1);

    let admin = app.superuser("admin@school.test").await;
    let token = app.token(&admin);
    let response = app
        .send(api(
            Method::GET,
            "/api/dashboard/users/?page=18446744073709551615&limit=1",
            Some(&token),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"], json!([]));
}

#[tokio::test]
async fn test_mistyped_json_field_is_reported_in_envelope() {
    let app = TestApp::new().await;
    let user = app.user("editor@school.test", &["public.add_notice"]).await;
    let token = app.token(&user);

    let response = app
        .send(api(
            Method::POST,
            "/api/public/notices/",
            Some(&token),
            Some(json!({ "title": "T", "content": "C", "is_active": "maybe" })),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["fields"]["is_active"][0].is_string());
}

#[tokio::test]
async fn test_update_roles_rejects_non_integer_group_ids() {
    let app = TestApp::new().await;
    let admin = app.superuser("admin@school.test").await;
    let user = app.user("staff@school.test", &[]).await;
    let token = app.token(&admin);

    let response = app
        .send(api(
            Method::POST,
            &format!("/api/dashboard/users/{}/update_roles/", user.id),
            Some(&token),
            Some(json!({ "groups": ["x"] })),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"]["fields"]["groups"][0].is_string());
    assert!(app.group_ids_of(&user).await.is_empty());
}

#[tokio::test]
async fn test_malformed_json_body_is_bad_request() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/jwt/create/")
        .header(header::HOST, HOST)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"email\": "))
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["error"]["fields"]["non_field_errors"][0].is_string());
}

#[tokio::test]
async fn test_notice_search_matches_non_ascii_term() {
    let app = TestApp::new().await;
    app.notice("Fermeture", "École fermée lundi", true).await;
    app.notice("Sports day", "Bring your running shoes", true).await;

    let body = body_json(
        app.send(get("/api/public/notices/?search=%C3%89cole"))
            .await,
    )
    .await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["title"], "Fermeture");
}

#[tokio::test]
async fn test_anonymous_notice_writes_are_forbidden() {
    let app = TestApp::new().await;
    let notice = app.notice("Original", "Body", true).await;

    let response = app
        .send(api(
            Method::POST,
            "/api/public/notices/",
            None,
            Some(json!({ "title": "Exam week", "content": "Starts Monday" })),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(
        body["error"]["message"],
        "You do not have permission to perform this action."
    );

    let detail = format!("/api/public/notices/{}/", notice.id);
    let response = app
        .send(api(Method::PATCH, &detail, None, Some(json!({ "title": "Hacked" }))))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.send(api(Method::DELETE, &detail, None, None)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = body_json(app.send(get(&detail)).await).await;
    assert_eq!(body["data"]["title"], "Original");
}

#[tokio::test]
async fn test_create_user_reports_default_password() {
    let app = TestApp::new().await;
    let admin = app.superuser("admin@school.test").await;
    let token = app.token(&admin);

    let response = app
        .send(api(
            Method::POST,
            "/api/dashboard/users/",
            Some(&token),
            Some(json!({ "email": "new.teacher@school.test", "first_name": "New" })),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(
        body["message"],
        "User new.teacher@school.test created successfully! Default password: defaultpassword123"
    );
    assert_eq!(body["data"]["email"], "new.teacher@school.test");

    let response = app
        .send(api(
            Method::POST,
            "/api/auth/jwt/create/",
            None,
            Some(json!({ "email": "new.teacher@school.test", "password": "defaultpassword123" })),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}
