//! Order models

use decimal_percentage::Percentage;
use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};

use crate::{
    customers::CustomerInfo,
    ids::TypedUuid,
    items::ProductId,
    orders::{DeliveryStatus, OrderStatus, PaymentMethod, PaymentStatus},
    pricing::{PricedLineItem, PricingSummary},
    shipping::{Address, DeliveryType},
};

/// Order identifier.
pub type OrderId = TypedUuid<Order>;

/// A placed order.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    /// Identifier
    pub id: OrderId,

    /// Human-readable reference, unique across orders
    pub order_number: String,

    /// Lifecycle status
    pub status: OrderStatus,

    /// Payment status
    pub payment_status: PaymentStatus,

    /// Payment method
    pub payment_method: PaymentMethod,

    /// Buyer
    pub customer: CustomerInfo,

    /// Destination
    pub shipping_address: Address,

    /// Delivery speed
    pub delivery_type: DeliveryType,

    /// Totals at the time of ordering
    pub pricing: PricingSummary,

    /// Lines, in cart order
    pub items: Vec<OrderItem>,

    /// Free-text notes from the customer
    pub notes: Option<String>,

    /// When the order was placed
    pub created_at: Timestamp,

    /// When the order last changed
    pub updated_at: Timestamp,
}

/// Header fields for a new order.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    /// Identifier, generated by the engine
    pub id: OrderId,

    /// Human-readable reference
    pub order_number: String,

    /// Payment status at placement
    pub payment_status: PaymentStatus,

    /// Payment method
    pub payment_method: PaymentMethod,

    /// Buyer
    pub customer: CustomerInfo,

    /// Destination
    pub shipping_address: Address,

    /// Delivery speed
    pub delivery_type: DeliveryType,

    /// Totals
    pub pricing: PricingSummary,

    /// Free-text notes
    pub notes: Option<String>,

    /// Placement time
    pub created_at: Timestamp,
}

impl NewOrder {
    /// The order as it exists once the header is stored, before items are attached.
    pub fn into_order(self) -> Order {
        Order {
            id: self.id,
            order_number: self.order_number,
            status: OrderStatus::Pending,
            payment_status: self.payment_status,
            payment_method: self.payment_method,
            customer: self.customer,
            shipping_address: self.shipping_address,
            delivery_type: self.delivery_type,
            pricing: self.pricing,
            items: Vec::new(),
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// One line of a placed order, with the price that was charged.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    /// Product ordered
    pub product_id: ProductId,

    /// Product name at the time of ordering
    pub product_name: String,

    /// Units ordered
    pub quantity: u32,

    /// Catalogue unit price
    pub unit_price: Money<'static, Currency>,

    /// Quantity discount rate applied
    pub discount_rate: Percentage,

    /// Amount charged for the line
    pub line_total: Money<'static, Currency>,
}

impl From<&PricedLineItem> for OrderItem {
    fn from(line: &PricedLineItem) -> Self {
        Self {
            product_id: line.item().product_id(),
            product_name: line.item().product_name().to_string(),
            quantity: line.item().quantity(),
            unit_price: line.item().unit_price(),
            discount_rate: line.discount_rate(),
            line_total: line.line_total(),
        }
    }
}

/// Delivery record created alongside an order.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDelivery {
    /// Order being delivered
    pub order_id: OrderId,

    /// Delivery speed
    pub delivery_type: DeliveryType,

    /// Initial status
    pub status: DeliveryStatus,

    /// Shipping charged
    pub cost: Money<'static, Currency>,

    /// Destination
    pub address: Address,

    /// Who receives the parcel
    pub recipient: DeliveryRecipient,

    /// Expected arrival
    pub estimated_delivery: Option<Timestamp>,
}

/// Person the courier hands the delivery to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryRecipient {
    /// Full name
    pub name: String,

    /// Contact number for the courier
    pub phone: Option<String>,
}

impl From<&CustomerInfo> for DeliveryRecipient {
    fn from(customer: &CustomerInfo) -> Self {
        Self {
            name: customer.name.trim().to_string(),
            phone: customer
                .phone
                .as_deref()
                .map(str::trim)
                .filter(|phone| !phone.is_empty())
                .map(String::from),
        }
    }
}
