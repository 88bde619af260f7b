mod book_appointment;
mod eligibility;

use actix_web::web;
use book_appointment::book_appointment_controller;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/appointments", web::post().to(book_appointment_controller));
}
