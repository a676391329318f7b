mod common;

use assert_matches::assert_matches;
use sea_orm::{ActiveModelTrait, Set};

use aromashop_api::{
    auth::{hash_password, AuthService},
    entities::admin_user,
    errors::ServiceError,
};

use common::TestApp;

async fn seed_admin(app: &TestApp, email: &str, password: &str) {
    admin_user::ActiveModel {
        email: Set(email.to_string()),
        password_hash: Set(hash_password(password).unwrap()),
        ..Default::default()
    }
    .insert(&*app.db)
    .await
    .expect("seed admin");
}

fn auth_service(app: &TestApp) -> AuthService {
    AuthService::new(
        app.db.clone(),
        "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef",
        3600,
    )
}

#[tokio::test]
async fn login_issues_a_verifiable_token() {
    let app = TestApp::new().await;
    seed_admin(&app, "admin@example.com", "correct horse").await;

    let auth = auth_service(&app);
    let token = auth
        .login("admin@example.com", "correct horse")
        .await
        .expect("login should succeed");

    let claims = auth.verify_token(&token).expect("token should verify");
    assert_eq!(claims.email, "admin@example.com");
}

#[tokio::test]
async fn wrong_password_and_unknown_email_are_rejected_alike() {
    let app = TestApp::new().await;
    seed_admin(&app, "admin@example.com", "correct horse").await;

    let auth = auth_service(&app);

    let wrong_password = auth.login("admin@example.com", "battery staple").await;
    assert_matches!(wrong_password, Err(ServiceError::AuthError(msg)) if msg == "Invalid email or password");

    let unknown_email = auth.login("ghost@example.com", "correct horse").await;
    assert_matches!(unknown_email, Err(ServiceError::AuthError(msg)) if msg == "Invalid email or password");
}
