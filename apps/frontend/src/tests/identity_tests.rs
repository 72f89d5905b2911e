use super::*;
use axum::http::HeaderValue;

fn headers_with(cookie: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(COOKIE, HeaderValue::from_str(cookie).expect("header"));
    headers
}

#[test]
fn minted_token_round_trips_to_user_name() {
    let keys = IdentityKeys::new("s3cret", 60);
    let token = keys.mint("ada").expect("token");
    assert_eq!(keys.verify(&token).as_deref(), Some("ada"));

    let headers = headers_with(&format!("theme=dark; {IDENTITY_COOKIE}={token}"));
    assert_eq!(
        keys.identify(&headers),
        CallerIdentity::Authenticated("ada".into())
    );
}

#[test]
fn token_signed_with_other_secret_is_anonymous() {
    let token = IdentityKeys::new("other", 60).mint("ada").expect("token");
    let keys = IdentityKeys::new("s3cret", 60);
    let headers = headers_with(&format!("{IDENTITY_COOKIE}={token}"));
    assert_eq!(keys.identify(&headers), CallerIdentity::Anonymous);
}

#[test]
fn expired_token_is_anonymous() {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: "ada".into(),
        iat: now - 7200,
        exp: now - 3600,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(b"s3cret"),
    )
    .expect("token");
    assert_eq!(IdentityKeys::new("s3cret", 60).verify(&token), None);
}

#[test]
fn missing_or_garbage_cookie_is_anonymous() {
    let keys = IdentityKeys::new("s3cret", 60);
    assert_eq!(keys.identify(&HeaderMap::new()), CallerIdentity::Anonymous);
    assert_eq!(
        keys.identify(&headers_with(&format!("{IDENTITY_COOKIE}=not-a-jwt"))),
        CallerIdentity::Anonymous
    );
}

#[test]
fn cookies_are_http_only_and_removal_expires() {
    let cookie = session_cookie("token".into()).to_string();
    assert!(cookie.starts_with(&format!("{IDENTITY_COOKIE}=token")));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Path=/"));

    let cleared = cleared_cookie().to_string();
    assert!(cleared.contains("Max-Age=0"));
}
