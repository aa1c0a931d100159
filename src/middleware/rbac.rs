// src/middleware/rbac.rs

use axum::{extract::Request, middleware::Next, response::Response};

use crate::{common::error::AppError, models::auth::User};

/// Roda depois do `auth_guard`: o papel vem do usuário recarregado do banco,
/// nunca do que o cliente diz ser.
pub async fn admin_guard(request: Request, next: Next) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<User>()
        .ok_or(AppError::InvalidToken)?;

    if !user.is_admin() {
        tracing::warn!("Usuário {} tentou acessar rota administrativa", user.id);
        return Err(AppError::Forbidden);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use chrono::Utc;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::models::auth::UserRole;

    fn user(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            email: "casal@paroquia.org".into(),
            password_hash: String::new(),
            role,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn app() -> Router {
        Router::new()
            .route("/admin", get(|| async { "ok" }))
            .layer(middleware::from_fn(admin_guard))
    }

    async fn status_for(user: Option<User>) -> StatusCode {
        let mut request = HttpRequest::builder().uri("/admin").body(Body::empty()).unwrap();
        if let Some(user) = user {
            request.extensions_mut().insert(user);
        }
        app().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn admin_passes() {
        assert_eq!(status_for(Some(user(UserRole::Admin))).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn regular_user_is_forbidden() {
        assert_eq!(status_for(Some(user(UserRole::User))).await, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn missing_user_is_unauthorized() {
        assert_eq!(status_for(None).await, StatusCode::UNAUTHORIZED);
    }
}
