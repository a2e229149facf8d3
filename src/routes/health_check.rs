use actix_web::HttpResponse;

/// `GET /health_check`
///
/// Always 200 with an empty body; does not touch the stores.
pub async fn health_check() -> HttpResponse { HttpResponse::Ok().finish() }
