//! Success envelope shared by every route.

use actix_web::http::StatusCode;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: u16,
    pub data: T,
    pub message: String,
    pub success: bool,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status: StatusCode, data: T, message: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            data,
            message: message.into(),
            success: status.is_success(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let body = ApiResponse::new(StatusCode::CREATED, serde_json::json!({"id": 1}), "created");
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["status"], 201);
        assert_eq!(json["data"]["id"], 1);
        assert_eq!(json["message"], "created");
        assert_eq!(json["success"], true);
    }
}
