use super::*;
use axum::{body::Body, http::Request};
use jsonwebtoken::{EncodingKey, Header, encode};

const SECRET: &str = "supersecretjwtsecretforunittesting123";
const USER_ID: &str = "123e4567-e89b-12d3-a456-426614174000";

fn token(sub: &str, exp: usize, secret: &str) -> String {
    encode(
        &Header::default(),
        &AccessClaims {
            sub: sub.to_string(),
            exp,
        },
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

async fn extract(authorization: Option<String>) -> Result<AuthUser, AppError> {
    let mut request = Request::builder().uri("/");
    if let Some(value) = authorization {
        request = request.header("authorization", value);
    }
    let (mut parts, _) = request.body(Body::empty()).unwrap().into_parts();

    AuthUser::from_request_parts(&mut parts, &JwtSecret::new(SECRET)).await
}

#[test]
fn test_validate_access_token_success() {
    let claims = validate_access_token(
        &token(USER_ID, 9999999999, SECRET),
        &JwtSecret::new(SECRET),
    )
    .expect("Valid token should pass");

    assert_eq!(claims.sub, USER_ID);
}

#[test]
fn test_validate_access_token_expired() {
    let result = validate_access_token(&token(USER_ID, 1, SECRET), &JwtSecret::new(SECRET));

    assert!(result.is_err());
}

#[test]
fn test_validate_access_token_invalid_signature() {
    let result = validate_access_token(
        &token(USER_ID, 9999999999, "wrongsecret"),
        &JwtSecret::new(SECRET),
    );

    assert!(result.is_err());
}

#[tokio::test]
async fn test_extractor_yields_user_id() {
    let user = extract(Some(format!("Bearer {}", token(USER_ID, 9999999999, SECRET))))
        .await
        .unwrap();

    assert_eq!(user.user_id, Uuid::parse_str(USER_ID).unwrap());
}

#[tokio::test]
async fn test_extractor_rejects_missing_or_malformed_header() {
    assert!(matches!(extract(None).await, Err(AppError::Unauthorized)));
    assert!(matches!(
        extract(Some("Basic dXNlcjpwYXNz".to_string())).await,
        Err(AppError::Unauthorized)
    ));
}

#[tokio::test]
async fn test_extractor_rejects_non_uuid_subject() {
    let result = extract(Some(format!(
        "Bearer {}",
        token("not-a-uuid", 9999999999, SECRET)
    )))
    .await;

    assert!(matches!(result, Err(AppError::Unauthorized)));
}
