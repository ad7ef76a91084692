pub mod core;
pub mod exchanges;

pub use core::{config::ExchangeConfig, errors::ExchangeError};
pub use exchanges::delivery::{DeliveryClient, MarketStream, StreamEvent};
