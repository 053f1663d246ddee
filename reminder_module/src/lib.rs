pub mod delivery_log;
pub mod gateway;
pub mod phone;
pub mod pipeline;
pub mod roster;
pub mod service;

pub(crate) mod table;

pub use delivery_log::{DeliveryLog, DeliveryRecord};
pub use gateway::{DisabledGateway, GatewayError, MessagingGateway, WhatsAppGateway};
pub use pipeline::{ChorePipeline, DeliveryStatus, PipelineError, ResultRecord, Shift};
pub use roster::{Roster, RosterError, RosterRow};
