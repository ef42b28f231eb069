pub mod campaigns;
pub mod donations;
pub mod webhooks;
