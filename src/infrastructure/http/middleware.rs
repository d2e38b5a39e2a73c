//! HTTP Middleware

use axum::{
    extract::Request,
    middleware::Next,
    response::Response,
};

/// 记录 4xx / 5xx 响应
///
/// 业务错误（errno != 0）以 200 返回，在 ApiError::into_response 中记录
pub async fn error_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;
    let status = response.status();

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            "HTTP server error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            "HTTP client error"
        );
    }

    response
}
