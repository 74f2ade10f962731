//! Carts
//!
//! The cart lives outside the engine. Checkout receives a handle carrying the cart's id and a
//! snapshot of its lines, and asks the cart store to empty it once the order is committed.

use async_trait::async_trait;
use mockall::automock;

use crate::{collaborators::CollaboratorError, ids::TypedUuid, items::LineItem};

/// Shopping cart.
#[derive(Debug)]
pub enum Cart {}

/// Shopping cart identifier.
pub type CartId = TypedUuid<Cart>;

/// A cart's identity and the lines it held when checkout started.
#[derive(Debug, Clone, PartialEq)]
pub struct CartHandle {
    id: CartId,
    items: Vec<LineItem>,
}

impl CartHandle {
    /// Creates a handle.
    pub fn new(id: CartId, items: Vec<LineItem>) -> Self {
        Self { id, items }
    }

    /// Cart identifier
    pub fn id(&self) -> CartId {
        self.id
    }

    /// Lines in the cart
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Whether the cart has no lines
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Cart persistence.
#[automock]
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Removes every line from the cart.
    async fn clear_cart(&self, cart_id: CartId) -> Result<(), CollaboratorError>;
}
