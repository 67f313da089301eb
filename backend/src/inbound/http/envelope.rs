//! Success envelope shared by every 2xx response.

use actix_web::HttpResponse;
use serde::Serialize;
use serde_json::json;

/// 200 with `{"success": true, "data": …}`.
pub fn ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "success": true, "data": data }))
}

/// 201 with `{"success": true, "data": …}`.
pub fn created<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Created().json(json!({ "success": true, "data": data }))
}
