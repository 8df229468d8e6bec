//! HTTP rendering of [`AppError`].

#[cfg(feature = "axum")]
mod http_response {
    use axum::Json;
    use axum::response::{IntoResponse, Response};
    use http::StatusCode;
    use serde_json::json;

    use crate::AppError;

    /// RFC 7807 problem document. The internal source is dropped here.
    impl IntoResponse for AppError {
        fn into_response(self) -> Response {
            let code = self.status_code();
            let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

            let mut body = json!({
                "type": format!("https://httpstatuses.io/{code}"),
                "title": self.kind().title(),
                "status": code,
                "detail": self.message(),
            });
            if let Some(action) = self.action() {
                body["action"] = action.into();
            }
            (status, Json(body)).into_response()
        }
    }
}
