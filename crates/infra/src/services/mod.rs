pub mod auth_api;
pub mod calendar_api;
pub mod crm_api;
pub mod delivery;
pub mod inmemory;

use crate::config::Config;
use auth_api::{AuthRestApi, IAuthValidator};
use calendar_api::{CalendarRestApi, ICalendarClient};
use crm_api::{CrmRestApi, ICrmClient};
use delivery::DeliveryClient;
use inmemory::{InMemoryCalendarApi, InMemoryCrmApi, StaticAuthValidator};
use std::sync::Arc;

/// Key accepted by the in-memory auth validator
pub const INMEMORY_API_KEY: &str = "inmemory-api-key";

/// Clients of the external Calendar, CRM and Auth services
#[derive(Clone)]
pub struct Services {
    pub calendar: Arc<dyn ICalendarClient>,
    pub crm: Arc<dyn ICrmClient>,
    pub auth: Arc<dyn IAuthValidator>,
}

impl Services {
    pub fn create_rest(config: &Config) -> Self {
        let delivery = DeliveryClient::new(config.http_timeout, config.delivery.clone());
        Self {
            calendar: Arc::new(CalendarRestApi::new(
                config.calendar_api_url.clone(),
                delivery.clone(),
            )),
            crm: Arc::new(CrmRestApi::new(config.crm_webhook_url.clone(), delivery.clone())),
            auth: Arc::new(AuthRestApi::new(config.auth_service_url.clone(), delivery)),
        }
    }

    pub fn create_inmemory() -> Self {
        Self {
            calendar: Arc::new(InMemoryCalendarApi::new()),
            crm: Arc::new(InMemoryCrmApi::new()),
            auth: Arc::new(StaticAuthValidator::new(vec![INMEMORY_API_KEY.to_string()])),
        }
    }
}

/// Serves `configure` on a random local port and returns its base url
#[cfg(test)]
pub(crate) fn spawn_test_server<F>(configure: F) -> String
where
    F: Fn(&mut actix_web::web::ServiceConfig) + Clone + Send + 'static,
{
    use actix_web::{App, HttpServer};

    let server = HttpServer::new(move || App::new().configure(configure.clone()))
        .bind(("127.0.0.1", 0))
        .unwrap();
    let port = server.addrs()[0].port();
    actix_web::rt::spawn(server.workers(1).run());
    format!("http://127.0.0.1:{}", port)
}
