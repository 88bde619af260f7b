mod get_availability;

use actix_web::web;
use get_availability::get_availability_controller;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/availability", web::get().to(get_availability_controller));
}
