mod appointment;
mod availability;
mod coach;
mod error;
mod shared;
mod status;
mod webhook;

use actix_cors::Cors;
use actix_web::{dev::Server, middleware, web, App, HttpServer};
use coach_assignment_infra::AssignmentContext;
use error::AssignmentError;
use std::net::TcpListener;
use tracing_actix_web::TracingLogger;

/// Advertises the configured per-minute quota on every response
const RATE_LIMIT_HEADER: &str = "X-RateLimit-Limit";

pub fn configure_server_api(cfg: &mut web::ServiceConfig) {
    appointment::configure_routes(cfg);
    availability::configure_routes(cfg);
    coach::configure_routes(cfg);
    status::configure_routes(cfg);
    webhook::configure_routes(cfg);
}

pub struct Application {
    server: Server,
    port: u16,
}

impl Application {
    pub async fn new(context: AssignmentContext) -> Result<Self, std::io::Error> {
        let (server, port) = Application::configure_server(context).await?;

        Ok(Self { server, port })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    async fn configure_server(
        context: AssignmentContext,
    ) -> Result<(Server, u16), std::io::Error> {
        let port = context.config.port;
        let address = format!("0.0.0.0:{}", port);
        let listener = TcpListener::bind(&address)?;
        let port = listener.local_addr()?.port();
        let rate_limit = context.config.rate_limit_per_minute.to_string();

        let server = HttpServer::new(move || {
            let ctx = context.clone();

            App::new()
                .wrap(Cors::permissive())
                .wrap(middleware::Compress::default())
                .wrap(middleware::DefaultHeaders::new().add((RATE_LIMIT_HEADER, rate_limit.clone())))
                .wrap(TracingLogger::default())
                .app_data(web::Data::new(ctx))
                .app_data(web::JsonConfig::default().error_handler(|err, _| {
                    AssignmentError::Validation(format!("Invalid request body: {}", err)).into()
                }))
                .app_data(web::QueryConfig::default().error_handler(|err, _| {
                    AssignmentError::Validation(format!("Invalid query: {}", err)).into()
                }))
                .service(web::scope("/api/v1").configure(configure_server_api))
        })
        .listen(listener)?
        .workers(4)
        .run();

        Ok((server, port))
    }

    pub async fn start(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}
