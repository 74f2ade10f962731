//! Woodex prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    carts::{CartHandle, CartId, CartStore},
    collaborators::CollaboratorError,
    config::{EngineConfig, EngineSettings},
    crm::{CrmSync, SyncType},
    customers::CustomerInfo,
    edge::EdgeFunctionsClient,
    fulfillment::{
        CheckoutCollaborators, CheckoutRequest, FulfillmentOrchestrator, OrderAdvanced,
        OrderCreated, OrderError, OrderRejected, PaymentInfo,
    },
    inventory::{InventoryAvailabilityChecker, InventoryProvider, ReservationService},
    items::{Customizations, LineItem, ProductId},
    notifications::Notifier,
    orders::{Order, OrderId, OrderStatus, OrderStore},
    pricing::{CustomerTier, PricedLineItem, PricingError, PricingSummary, TieredPricingEngine},
    quotations::{
        QuotationCalculator, QuotationCollaborators, QuotationEngine, QuotationRequest,
        QuotationStatus, QuotationStore,
    },
    receipt::{Receipt, ReceiptError},
    shipping::{Address, DeliveryCostProvider, DeliveryType, ShippingCostResolver},
};
