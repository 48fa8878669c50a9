use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{
        Extension, Path, Query,
        rejection::{BytesRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::de::DeserializeOwned;

use stockroom_core::ItemId;
use stockroom_inventory::{CreateItem, InventoryError};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/items", post(create_item).get(list_items))
        .route("/items/:item_id", post(buy_item))
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body: dto::CreateItemRequest = match decode_body(body) {
        Ok(body) => body,
        Err(res) => return res,
    };

    let new_item = match CreateItem::from(body).validate() {
        Ok(new_item) => new_item,
        Err(violations) => {
            return errors::inventory_error_to_response(InventoryError::Validation(violations));
        }
    };

    match services.create_item(new_item).await {
        Ok(item) => (StatusCode::CREATED, Json(dto::ItemResponse::from(&item))).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Response {
    let Query(pairs) = match query {
        Ok(query) => query,
        Err(rejection) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_page",
                rejection.body_text(),
            );
        }
    };

    let page = match dto::ListItemsQuery::from_pairs(pairs).into_page_request() {
        Ok(page) => page,
        Err(e) => return errors::inventory_error_to_response(e),
    };

    match services.list_items(page).await {
        Ok(items) => {
            let body: Vec<dto::ItemResponse> = items.iter().map(dto::ItemResponse::from).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn buy_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(item_id): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let item_id: ItemId = match item_id.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_item_id",
                "failed to parse item_id",
            );
        }
    };

    let body: dto::BuyItemRequest = match decode_body(body) {
        Ok(body) => body,
        Err(res) => return res,
    };

    match services.buy_item(body.into_purchase(item_id)).await {
        Ok(purchase) => (
            StatusCode::CREATED,
            Json(dto::PurchaseResponse::from(&purchase)),
        )
            .into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

/// Decode a JSON body whatever its `Content-Type`.
fn decode_body<T: DeserializeOwned>(body: Result<Bytes, BytesRejection>) -> Result<T, Response> {
    let bytes = body.map_err(|rejection| errors::invalid_body(rejection.body_text()))?;
    serde_json::from_slice(&bytes).map_err(|e| errors::invalid_body(e.to_string()))
}
