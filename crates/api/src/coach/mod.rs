mod get_coach_distribution;

use actix_web::web;
use get_coach_distribution::get_coach_distribution_controller;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/coaches/distribution",
        web::get().to(get_coach_distribution_controller),
    );
}
