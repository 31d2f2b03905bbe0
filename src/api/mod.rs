//! HTTP handlers for the donation portal API

pub mod campaigns;
pub mod donations;
pub mod webhooks;
