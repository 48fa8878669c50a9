use std::any::Any;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::error;

use stockroom_inventory::InventoryError;

pub fn inventory_error_to_response(err: InventoryError) -> axum::response::Response {
    match &err {
        InventoryError::NotFound(_) => {
            json_error(StatusCode::BAD_REQUEST, "item_not_found", err.to_string())
        }
        InventoryError::OutOfStock { .. } => {
            json_error(StatusCode::BAD_REQUEST, "out_of_stock", err.to_string())
        }
        InventoryError::Validation(violations) => {
            let code = violations
                .first()
                .map(|v| violation_code(v.field))
                .unwrap_or("validation_error");
            json_error(StatusCode::BAD_REQUEST, code, err.to_string())
        }
        InventoryError::Persistence(e) => {
            error!(error = %e, "store failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "internal server error",
            )
        }
    }
}

pub fn invalid_body(message: impl Into<String>) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_body", message)
}

/// Response for a handler that panicked; the panic payload is only logged.
pub fn panic_to_response(payload: Box<dyn Any + Send + 'static>) -> axum::response::Response {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    error!(panic = %detail, "handler panicked");
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "internal server error",
    )
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

fn violation_code(field: &str) -> &'static str {
    match field {
        "total_stock_value" => "invalid_total_stock_value",
        "selling_price" => "invalid_selling_price",
        "quantity" => "invalid_quantity",
        "page" => "invalid_page",
        "limit" => "invalid_limit",
        _ => "validation_error",
    }
}
