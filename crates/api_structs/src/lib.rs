mod appointment;
mod availability;
mod coach;
mod error;
mod status;
mod webhook;

pub mod dtos {
    pub use crate::appointment::dtos::*;
    pub use crate::availability::dtos::*;
    pub use crate::coach::dtos::*;
}

pub use crate::appointment::api::*;
pub use crate::availability::api::*;
pub use crate::coach::api::*;
pub use crate::error::api::*;
pub use crate::status::api::*;
pub use crate::webhook::api::*;
