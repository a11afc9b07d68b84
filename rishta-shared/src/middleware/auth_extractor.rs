use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::errors::{AppError, ErrorCode};
use crate::types::auth::{AuthUser, HasJwtVerifier};

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: HasJwtVerifier + Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)?;
        let claims = state.jwt_verifier().verify(token)?;
        Ok(AuthUser::from(claims))
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| AppError::new(ErrorCode::Unauthorized, "not authorized, no token"))?
        .to_str()
        .map_err(|_| AppError::new(ErrorCode::Unauthorized, "invalid authorization header"))?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::new(ErrorCode::Unauthorized, "authorization header must use Bearer scheme"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn missing_header_is_unauthorized() {
        let err = extract_bearer_token(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::Unauthorized));
    }

    #[test]
    fn strips_bearer_prefix() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_bearer_token(&headers).unwrap(), "abc.def");
    }

    #[test]
    fn rejects_other_schemes() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        assert!(extract_bearer_token(&headers).is_err());
        headers.insert("authorization", HeaderValue::from_static("Bearer   "));
        assert!(extract_bearer_token(&headers).is_err());
    }

    mod routed {
        use std::sync::Arc;

        use axum::body::{to_bytes, Body};
        use axum::http::{Request, StatusCode};
        use axum::routing::get;
        use axum::Router;
        use jsonwebtoken::{encode, EncodingKey, Header};
        use tower::ServiceExt;
        use uuid::Uuid;

        use crate::types::auth::{AuthUser, Claims, HasJwtVerifier, JwtVerifier, UserRole};

        struct TestState {
            jwt: JwtVerifier,
        }

        impl HasJwtVerifier for TestState {
            fn jwt_verifier(&self) -> &JwtVerifier {
                &self.jwt
            }
        }

        fn app() -> Router {
            Router::new()
                .route("/whoami", get(|user: AuthUser| async move { user.id.to_string() }))
                .with_state(Arc::new(TestState { jwt: JwtVerifier::new("s3cret") }))
        }

        #[tokio::test]
        async fn anonymous_request_gets_401() {
            let req = Request::builder().uri("/whoami").body(Body::empty()).unwrap();
            let res = app().oneshot(req).await.unwrap();
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        }

        #[tokio::test]
        async fn signed_request_reaches_handler() {
            let user = Uuid::new_v4();
            let claims = Claims::new(user, UserRole::User, 600);
            let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"s3cret")).unwrap();

            let req = Request::builder()
                .uri("/whoami")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap();
            let res = app().oneshot(req).await.unwrap();
            assert_eq!(res.status(), StatusCode::OK);
            let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
            assert_eq!(body, user.to_string().as_bytes());
        }
    }
}
