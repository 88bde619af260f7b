use actix_web::{web, HttpResponse};
use coach_assignment_api_structs::get_service_health::APIResponse;

async fn status() -> HttpResponse {
    HttpResponse::Ok().json(APIResponse::healthy())
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(status));
}
