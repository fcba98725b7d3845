//! Registration and guardian/minor linking over HTTP.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, build_test_app, create_account, create_guardian, create_minor, get_auth,
    post_auth, post_json, post_json_auth, put_json_auth,
};
use serde_json::json;
use sqlx::PgPool;
use tourdesk_api::engine::linking::resolve_pending_links;
use tourdesk_core::link::LinkStatus;
use tourdesk_core::roles::Role;
use tourdesk_db::models::account::CreateAccount;
use tourdesk_db::models::link::CreateLink;
use tourdesk_db::repositories::{AccountRepo, LinkRepo};

fn invite_token_from(body: &str) -> String {
    let start = body.find("invite=").expect("accept url in body") + "invite=".len();
    body[start..]
        .split_whitespace()
        .next()
        .unwrap()
        .to_string()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn staff_cannot_self_register(pool: PgPool) {
    let app = build_test_app(pool);
    let response = post_json(
        &app,
        "/api/v1/accounts",
        json!({ "name": "Sam Staff", "email": "sam@test.org", "role": "staff" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_email_is_a_friendly_conflict(pool: PgPool) {
    create_account(&pool, Role::Guardian, "Pat Parent", None).await;
    let app = build_test_app(pool);

    let response = post_json(
        &app,
        "/api/v1/accounts",
        json!({ "name": "Pat Again", "email": "PAT.PARENT@test.org", "role": "guardian" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["error"], "An account with this email already exists");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn invitation_signup_links_and_approves(pool: PgPool) {
    let guardian = create_guardian(&pool, "Pat Parent").await;
    let app = build_test_app(pool);
    let token = app.token_for(guardian.id, Role::Guardian);

    let response = post_json_auth(
        &app,
        "/api/v1/links",
        &token,
        json!({ "email": "Kid@Test.org" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"][0]["outcome"], "invited");
    assert_eq!(json["data"][0]["link"]["minor_email"], "kid@test.org");
    assert!(json["data"][0]["link"]["minor_id"].is_null());

    let sent = app.notifier.wait_for(1).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, "link.invitation");
    assert_eq!(sent[0].to, "kid@test.org");
    let invite = invite_token_from(&sent[0].body);

    let response = post_json(
        &app,
        "/api/v1/accounts",
        json!({
            "name": "Kim Kid",
            "email": "kid@test.org",
            "role": "minor",
            "birthdate": common::born_years_ago(15),
            "invite_token": invite,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert!(json["data"]["access_token"].is_string());
    let links = json["data"]["links"].as_array().unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0]["status"], "approved");

    let response = get_auth(&app, "/api/v1/links", &token).await;
    let json = body_json(response).await;
    let linked = json["data"].as_array().unwrap();
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0]["name"], "Kim Kid");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn invitation_for_another_email_is_rejected(pool: PgPool) {
    let guardian = create_guardian(&pool, "Pat Parent").await;
    let app = build_test_app(pool);
    let token = app.token_for(guardian.id, Role::Guardian);

    post_json_auth(&app, "/api/v1/links", &token, json!({ "email": "kid@test.org" })).await;
    let sent = app.notifier.wait_for(1).await;
    let invite = invite_token_from(&sent[0].body);

    let response = post_json(
        &app,
        "/api/v1/accounts",
        json!({
            "name": "Someone Else",
            "email": "else@test.org",
            "role": "minor",
            "invite_token": invite,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn repeated_invite_does_not_duplicate_the_link(pool: PgPool) {
    let guardian = create_guardian(&pool, "Pat Parent").await;
    let app = build_test_app(pool);
    let token = app.token_for(guardian.id, Role::Guardian);

    let first = body_json(
        post_json_auth(&app, "/api/v1/links", &token, json!({ "email": "kid@test.org" })).await,
    )
    .await;
    let second = body_json(
        post_json_auth(&app, "/api/v1/links", &token, json!({ "email": "kid@test.org" })).await,
    )
    .await;

    assert_eq!(second["data"][0]["outcome"], "invited");
    assert_eq!(first["data"][0]["link"]["id"], second["data"][0]["link"]["id"]);
    assert_eq!(app.notifier.wait_for(2).await.len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn existing_accounts_link_then_counterpart_approves(pool: PgPool) {
    let guardian = create_guardian(&pool, "Pat Parent").await;
    let minor = create_minor(&pool, "Kim Kid", 15).await;
    let app = build_test_app(pool);
    let guardian_token = app.token_for(guardian.id, Role::Guardian);
    let minor_token = app.token_for(minor.id, Role::Minor);

    let json = body_json(
        post_json_auth(
            &app,
            "/api/v1/links",
            &guardian_token,
            json!({ "email": minor.email }),
        )
        .await,
    )
    .await;
    assert_eq!(json["data"][0]["outcome"], "linked");
    assert_eq!(json["data"][0]["link"]["status"], "pending");
    let link_id = json["data"][0]["link"]["id"].as_i64().unwrap();

    let sent = app.notifier.wait_for(1).await;
    assert_eq!(sent[0].kind, "link.request");

    // Pending links are hidden unless asked for.
    let json = body_json(get_auth(&app, "/api/v1/links", &guardian_token).await).await;
    assert!(json["data"].as_array().unwrap().is_empty());
    let json = body_json(
        get_auth(&app, "/api/v1/links?include_pending=true", &guardian_token).await,
    )
    .await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    // The initiator cannot approve their own request.
    let response = post_auth(
        &app,
        &format!("/api/v1/links/{link_id}/approve"),
        &guardian_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_auth(&app, &format!("/api/v1/links/{link_id}/approve"), &minor_token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "approved");

    let json = body_json(
        post_json_auth(
            &app,
            "/api/v1/links",
            &guardian_token,
            json!({ "email": minor.email }),
        )
        .await,
    )
    .await;
    assert_eq!(json["data"][0]["outcome"], "already_linked");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn linking_two_guardians_is_a_role_mismatch(pool: PgPool) {
    let guardian = create_guardian(&pool, "Pat Parent").await;
    let other = create_guardian(&pool, "Alex Parent").await;
    let app = build_test_app(pool);
    let token = app.token_for(guardian.id, Role::Guardian);

    let response =
        post_json_auth(&app, "/api/v1/links", &token, json!({ "email": other.email })).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["code"], "ROLE_MISMATCH");
    assert_eq!(json["redirect"], "/links");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn one_request_links_several_addresses(pool: PgPool) {
    let guardian = create_guardian(&pool, "Pat Parent").await;
    let minor = create_minor(&pool, "Kim Kid", 15).await;
    let app = build_test_app(pool);
    let token = app.token_for(guardian.id, Role::Guardian);

    let response = post_json_auth(
        &app,
        "/api/v1/links",
        &token,
        json!({ "emails": [minor.email, "new.kid@test.org", "NEW.KID@test.org"] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let results = json["data"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["email"], minor.email.as_str());
    assert_eq!(results[0]["outcome"], "linked");
    assert_eq!(results[1]["email"], "new.kid@test.org");
    assert_eq!(results[1]["outcome"], "invited");

    let kinds: Vec<String> = app
        .notifier
        .wait_for(2)
        .await
        .into_iter()
        .map(|n| n.kind.to_string())
        .collect();
    assert!(kinds.contains(&"link.request".to_string()));
    assert!(kinds.contains(&"link.invitation".to_string()));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn a_bad_address_rejects_the_whole_request(pool: PgPool) {
    let guardian = create_guardian(&pool, "Pat Parent").await;
    let other = create_guardian(&pool, "Alex Parent").await;
    let app = build_test_app(pool);
    let token = app.token_for(guardian.id, Role::Guardian);

    let response = post_json_auth(
        &app,
        "/api/v1/links",
        &token,
        json!({ "emails": ["kid@test.org", other.email] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let json = body_json(
        get_auth(&app, "/api/v1/links?include_pending=true", &token).await,
    )
    .await;
    assert!(json["data"].as_array().unwrap().is_empty());

    let response =
        post_json_auth(&app, "/api/v1/links", &token, json!({ "emails": [] })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn simultaneous_requests_for_a_pair_store_one_link(pool: PgPool) {
    let guardian = create_guardian(&pool, "Pat Parent").await;
    let minor = create_minor(&pool, "Kim Kid", 15).await;
    let app = build_test_app(pool);
    let token = app.token_for(guardian.id, Role::Guardian);
    let body = json!({ "email": minor.email });

    let (first, second) = tokio::join!(
        post_json_auth(&app, "/api/v1/links", &token, body.clone()),
        post_json_auth(&app, "/api/v1/links", &token, body.clone()),
    );
    assert_eq!(first.status(), StatusCode::CREATED);
    assert_eq!(second.status(), StatusCode::CREATED);

    let first = body_json(first).await;
    let second = body_json(second).await;
    let mut outcomes = vec![
        first["data"][0]["outcome"].as_str().unwrap().to_string(),
        second["data"][0]["outcome"].as_str().unwrap().to_string(),
    ];
    outcomes.sort();
    assert_eq!(outcomes, vec!["already_linked", "linked"]);
    assert_eq!(first["data"][0]["link"]["id"], second["data"][0]["link"]["id"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn guardian_completes_a_linked_student_profile(pool: PgPool) {
    let guardian = create_guardian(&pool, "Pat Parent").await;
    let student = create_account(&pool, Role::Minor, "Kim Kid", None).await;
    let stranger = create_account(&pool, Role::Minor, "Sam Stranger", None).await;
    common::link_approved(&pool, &guardian, &student).await;
    let app = build_test_app(pool);
    let token = app.token_for(guardian.id, Role::Guardian);
    let profile = json!({
        "name": "Kim Kid",
        "birthdate": common::born_years_ago(14),
        "school": "Northside High",
        "grade": "9",
    });

    let response = put_json_auth(
        &app,
        &format!("/api/v1/links/{}/profile", stranger.id),
        &token,
        profile.clone(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = put_json_auth(
        &app,
        &format!("/api/v1/links/{}/profile", student.id),
        &token,
        json!({ "name": "Kim Kid", "birthdate": common::born_years_ago(14), "school": " ", "grade": "9" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "School is required");
    assert_eq!(json["redirect"], format!("/links/{}/profile", student.id));

    let response = put_json_auth(
        &app,
        &format!("/api/v1/links/{}/profile", student.id),
        &token,
        profile,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["school"], "Northside High");
    assert_eq!(json["data"]["profile_completed_by"], guardian.id);

    // Minors cannot use the guardian route.
    let minor_token = app.token_for(student.id, Role::Minor);
    let response = put_json_auth(
        &app,
        &format!("/api/v1/links/{}/profile", student.id),
        &minor_token,
        json!({ "name": "Kim", "birthdate": common::born_years_ago(14), "school": "X", "grade": "9" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn abandoned_registration_leaves_invitations_waiting(pool: PgPool) {
    let guardian = create_guardian(&pool, "Pat Parent").await;
    LinkRepo::create(
        &pool,
        &CreateLink {
            minor_id: None,
            guardian_id: Some(guardian.id),
            minor_email: Some("kid@test.org".into()),
            guardian_email: Some(guardian.email.clone()),
            status: LinkStatus::Pending,
            initiated_by: guardian.id,
        },
    )
    .await
    .unwrap();

    let mut tx = pool.begin().await.unwrap();
    let account = AccountRepo::insert(
        &mut tx,
        &CreateAccount {
            role: Role::Minor,
            name: "Kim Kid".into(),
            email: "kid@test.org".into(),
            birthdate: Some(common::born_years_ago(15)),
        },
    )
    .await
    .unwrap();
    let resolved = resolve_pending_links(&mut tx, &account, None).await.unwrap();
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].minor_id, Some(account.id));
    tx.rollback().await.unwrap();

    assert!(AccountRepo::find_by_email(&pool, "kid@test.org")
        .await
        .unwrap()
        .is_none());
    let waiting = LinkRepo::find_open_invitation(&pool, Role::Guardian, guardian.id, "kid@test.org")
        .await
        .unwrap()
        .expect("invitation still open");
    assert_eq!(waiting.minor_id, None);
}
