//! Orders

mod models;
mod status;
mod store;

pub use models::{DeliveryRecipient, NewDelivery, NewOrder, Order, OrderId, OrderItem};
pub use status::{DeliveryStatus, OrderStatus, PaymentMethod, PaymentStatus};
pub use store::{MockOrderStore, OrderStore};
