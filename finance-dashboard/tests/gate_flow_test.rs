mod common;

use axum::http::StatusCode;
use common::{body_text, location, query_param, session_cookie, TestAppBuilder, AUTHORIZE_URL};
use finance_dashboard::locale::Locale;

#[tokio::test]
async fn anonymous_visitor_is_sent_to_the_provider() {
    let app = TestAppBuilder::new().build();

    let response = app.get("/", None).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let target = location(&response).to_string();
    assert!(target.starts_with(AUTHORIZE_URL));
    assert!(query_param(&target, "state").is_some());
    assert_eq!(query_param(&target, "code_challenge").unwrap().len(), 43);
    assert!(session_cookie(&response).is_some());

    let body = body_text(response).await;
    assert!(!body.contains("Resumo Financeiro"));
}

#[tokio::test]
async fn allowed_user_sees_dashboard_with_greeting() {
    let app = TestAppBuilder::new().build();
    let cookie = app.login("alice").await;

    let response = app.get("/", Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Bem-vindo Alice!"));
    assert!(!body.contains("Você não tem permissão"));
    assert!(body.contains("id=\"invested-value\""));
    assert!(body.contains("id=\"expenses-vs-ideal\""));
    assert!(body.contains("EUR 1.750,50"));
    assert!(body.contains("action=\"/logout\""));
}

#[tokio::test]
async fn greeting_falls_back_to_email_without_a_name() {
    let app = TestAppBuilder::new().build();
    let cookie = app.login("nameless").await;

    let body = body_text(app.get("/", Some(&cookie)).await).await;
    assert!(body.contains("Bem-vindo bob@x.com!"));
}

#[tokio::test]
async fn user_outside_allow_list_is_denied() {
    let app = TestAppBuilder::new().allowed(&["alice@x.com"]).build();
    let cookie = app.login("carol").await;

    let response = app.get("/", Some(&cookie)).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_text(response).await;
    assert!(body.contains("Você não tem permissão para acessar este app."));
    assert!(body.contains("action=\"/logout\""));
    assert!(body.contains("Sair"));
    assert!(!body.contains("Bem-vindo"));
    assert!(!body.contains("invested-value"));
}

#[tokio::test]
async fn sign_out_clears_the_session_identity() {
    let app = TestAppBuilder::new().allowed(&["alice@x.com"]).build();
    let cookie = app.login("carol").await;

    let response = app.post("/logout", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    // The old session is gone, so the same cookie is anonymous again.
    let response = app.get("/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with(AUTHORIZE_URL));
}

#[tokio::test]
async fn email_match_is_case_sensitive() {
    let app = TestAppBuilder::new().build();
    let cookie = app.login("shouty").await;

    let response = app.get("/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn missing_email_claim_is_denied() {
    let app = TestAppBuilder::new().build();
    let cookie = app.login("no-email").await;

    let response = app.get("/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn empty_allow_list_denies_everyone() {
    let app = TestAppBuilder::new().allowed(&[]).build();
    let cookie = app.login("alice").await;

    let response = app.get("/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn english_locale_is_used_when_configured() {
    let app = TestAppBuilder::new().locale(Locale::En).build();

    let cookie = app.login("alice").await;
    let body = body_text(app.get("/", Some(&cookie)).await).await;
    assert!(body.contains("Welcome Alice!"));
    assert!(body.contains("lang=\"en\""));

    let cookie = app.login("carol").await;
    let body = body_text(app.get("/", Some(&cookie)).await).await;
    assert!(body.contains("You do not have permission to access this app."));
}

#[tokio::test]
async fn callback_with_wrong_state_is_rejected() {
    let app = TestAppBuilder::new().build();
    let (cookie, _state) = app.start_login().await;

    let response = app
        .get("/auth/google/callback?code=alice&state=forged", Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The pending login was consumed; the visitor is still anonymous.
    let response = app.get("/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn callback_without_login_in_progress_is_rejected() {
    let app = TestAppBuilder::new().build();

    let response = app
        .get("/auth/google/callback?code=alice&state=whatever", None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn provider_error_is_an_auth_failure() {
    let app = TestAppBuilder::new().build();
    let (cookie, _state) = app.start_login().await;

    let response = app
        .get("/auth/google/callback?error=access_denied", Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn rejected_code_is_an_auth_failure() {
    let app = TestAppBuilder::new().build();
    let (cookie, state) = app.start_login().await;

    let response = app
        .get(
            &format!("/auth/google/callback?code=mallory&state={}", state),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_provider_is_not_found() {
    let app = TestAppBuilder::new().build();

    let response = app.get("/auth/github/login", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn explicit_login_route_redirects_to_provider() {
    let app = TestAppBuilder::new().build();

    let response = app.get("/auth/google/login", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with(AUTHORIZE_URL));
}

#[tokio::test]
async fn anonymous_flood_stays_within_session_cap() {
    let app = TestAppBuilder::new().max_sessions(5).build();
    let cookie = app.login("alice").await;

    for _ in 0..50 {
        let response = app.get("/", None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    assert!(app.sessions.len().await <= 5);
    let response = app.get("/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_data_file_is_reported_on_the_dashboard() {
    let app = TestAppBuilder::new()
        .without_file("investimento.csv")
        .build();
    let cookie = app.login("alice").await;

    let response = app.get("/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Arquivo não encontrado"));
    assert!(body.contains("investimento.csv"));
    assert!(!body.contains("id=\"invested-value\""));
    assert!(body.contains("id=\"income-trend\""));
}
