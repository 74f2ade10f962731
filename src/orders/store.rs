//! Order persistence

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;

use crate::{
    collaborators::CollaboratorError,
    orders::{NewDelivery, NewOrder, Order, OrderId, OrderItem, OrderStatus},
};

/// Storage for orders, their items and deliveries.
#[automock]
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Stores an order header.
    ///
    /// Fails with [`CollaboratorError::Conflict`] when the order number is already taken.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, CollaboratorError>;

    /// Stores the lines of an order.
    async fn insert_order_items(
        &self,
        order_id: OrderId,
        items: Vec<OrderItem>,
    ) -> Result<(), CollaboratorError>;

    /// Stores the delivery record of an order.
    async fn insert_delivery(&self, delivery: NewDelivery) -> Result<(), CollaboratorError>;

    /// Loads an order with its items.
    async fn get_order(&self, order_id: OrderId) -> Result<Order, CollaboratorError>;

    /// Moves an order from `from` to `to`.
    ///
    /// Fails with [`CollaboratorError::Conflict`] when the stored status is no longer `from`.
    async fn update_order_status(
        &self,
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
        at: Timestamp,
    ) -> Result<Order, CollaboratorError>;
}
