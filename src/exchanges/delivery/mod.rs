// Binance coin-margined delivery futures
pub mod account; // user data and history queries
pub mod client; // DeliveryClient: construction and signing
pub mod endpoints; // hosts and entry points
pub mod events; // serde structs <- stream frames
pub mod stream; // StreamHandler that decodes into events
pub mod trading; // position mode and order placement
pub mod types; // request parameter structs

pub use client::DeliveryClient;
pub use events::*;
pub use stream::{EventReceiver, MarketStream};
pub use types::{NewOrder, OrderRef, QueryFilter};
