//! In-memory collaborators shared by the integration tests.
//!
//! Each fake records what it was asked to do and can be told to fail, so tests can assert on
//! side effects without a database or network.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use jiff::Timestamp;
use rustc_hash::FxHashMap;
use rusty_money::{Money, iso};
use woodex::{
    carts::{CartHandle, CartId, CartStore},
    collaborators::CollaboratorError,
    config::EngineSettings,
    crm::{CrmSync, SyncType},
    customers::CustomerInfo,
    fulfillment::{CheckoutCollaborators, CheckoutRequest, FulfillmentOrchestrator, PaymentInfo},
    inventory::{InventoryProvider, InventoryRecord, ReservationAction, ReservationService},
    items::{LineItem, ProductId},
    notifications::{Notification, Notifier, Recipient},
    orders::{NewDelivery, NewOrder, Order, OrderId, OrderItem, OrderStatus, OrderStore},
    pricing::PricingError,
    quotations::{
        NewQuotation, Quotation, QuotationActivity, QuotationCollaborators, QuotationEngine,
        QuotationId, QuotationItem, QuotationStatus, QuotationStore,
    },
    shipping::{Address, DeliveryCost, DeliveryCostProvider, DeliveryCostRequest, DeliveryType},
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn unavailable(what: &str) -> CollaboratorError {
    CollaboratorError::Unavailable(format!("{what} is down"))
}

pub fn pkr(major: i64) -> Money<'static, iso::Currency> {
    Money::from_major(major, iso::PKR)
}

pub fn customer() -> CustomerInfo {
    CustomerInfo {
        name: "Ayesha Khan".into(),
        email: "ayesha@example.com".into(),
        phone: Some("+92 300 0000000".into()),
        company: None,
    }
}

pub fn lahore() -> Address {
    Address {
        street: "12 Mall Road".into(),
        city: "Lahore".into(),
        state: "Punjab".into(),
        postal_code: "54000".into(),
        country: "Pakistan".into(),
    }
}

pub fn line(name: &str, price: i64, quantity: u32) -> Result<LineItem, PricingError> {
    LineItem::new(ProductId::generate(), name, pkr(price), quantity)
}

/// Settings with a short timeout so slow fakes fail fast.
pub fn settings() -> EngineSettings {
    EngineSettings {
        collaborator_timeout: Duration::from_millis(200),
        ..EngineSettings::default()
    }
}

#[derive(Debug, Default)]
struct OrdersState {
    orders: Vec<Order>,
    deliveries: Vec<NewDelivery>,
    insert_attempts: u32,
    number_conflicts: u32,
    fail_items: bool,
    fail_delivery: bool,
}

/// Order storage.
#[derive(Debug, Default)]
pub struct FakeOrders {
    state: Mutex<OrdersState>,
}

impl FakeOrders {
    /// Rejects the next `count` inserts as number conflicts.
    pub fn conflict_next(&self, count: u32) {
        lock(&self.state).number_conflicts = count;
    }

    pub fn fail_items(&self) {
        lock(&self.state).fail_items = true;
    }

    pub fn fail_delivery(&self) {
        lock(&self.state).fail_delivery = true;
    }

    pub fn orders(&self) -> Vec<Order> {
        lock(&self.state).orders.clone()
    }

    pub fn deliveries(&self) -> Vec<NewDelivery> {
        lock(&self.state).deliveries.clone()
    }

    pub fn insert_attempts(&self) -> u32 {
        lock(&self.state).insert_attempts
    }

    /// Forces an order into `status`, as if another process had moved it.
    pub fn force_status(&self, order_id: OrderId, status: OrderStatus) {
        if let Some(order) = lock(&self.state)
            .orders
            .iter_mut()
            .find(|order| order.id == order_id)
        {
            order.status = status;
        }
    }
}

#[async_trait]
impl OrderStore for FakeOrders {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, CollaboratorError> {
        let mut state = lock(&self.state);

        state.insert_attempts += 1;

        if state.number_conflicts > 0 {
            state.number_conflicts -= 1;
            return Err(CollaboratorError::Conflict(order.order_number));
        }

        if state
            .orders
            .iter()
            .any(|existing| existing.order_number == order.order_number)
        {
            return Err(CollaboratorError::Conflict(order.order_number));
        }

        let order = order.into_order();

        state.orders.push(order.clone());

        Ok(order)
    }

    async fn insert_order_items(
        &self,
        order_id: OrderId,
        items: Vec<OrderItem>,
    ) -> Result<(), CollaboratorError> {
        let mut state = lock(&self.state);

        if state.fail_items {
            return Err(unavailable("order items table"));
        }

        let order = state
            .orders
            .iter_mut()
            .find(|order| order.id == order_id)
            .ok_or(CollaboratorError::NotFound)?;

        order.items = items;

        Ok(())
    }

    async fn insert_delivery(&self, delivery: NewDelivery) -> Result<(), CollaboratorError> {
        let mut state = lock(&self.state);

        if state.fail_delivery {
            return Err(unavailable("deliveries table"));
        }

        state.deliveries.push(delivery);

        Ok(())
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Order, CollaboratorError> {
        lock(&self.state)
            .orders
            .iter()
            .find(|order| order.id == order_id)
            .cloned()
            .ok_or(CollaboratorError::NotFound)
    }

    async fn update_order_status(
        &self,
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
        at: Timestamp,
    ) -> Result<Order, CollaboratorError> {
        let mut state = lock(&self.state);

        let order = state
            .orders
            .iter_mut()
            .find(|order| order.id == order_id)
            .ok_or(CollaboratorError::NotFound)?;

        if order.status != from {
            return Err(CollaboratorError::Conflict(format!(
                "order is {}, not {from}",
                order.status
            )));
        }

        order.status = to;
        order.updated_at = at;

        Ok(order.clone())
    }
}

/// Cart storage.
#[derive(Debug, Default)]
pub struct FakeCarts {
    cleared: Mutex<Vec<CartId>>,
    fail: Mutex<bool>,
}

impl FakeCarts {
    pub fn fail(&self) {
        *lock(&self.fail) = true;
    }

    pub fn cleared(&self) -> Vec<CartId> {
        lock(&self.cleared).clone()
    }
}

#[async_trait]
impl CartStore for FakeCarts {
    async fn clear_cart(&self, cart_id: CartId) -> Result<(), CollaboratorError> {
        if *lock(&self.fail) {
            return Err(unavailable("cart store"));
        }

        lock(&self.cleared).push(cart_id);

        Ok(())
    }
}

/// Stock positions.
#[derive(Debug, Default)]
pub struct FakeInventory {
    records: Mutex<FxHashMap<ProductId, InventoryRecord>>,
    fail: Mutex<bool>,
}

impl FakeInventory {
    pub fn stock(&self, product_id: ProductId, stock_quantity: u32, reserved_quantity: u32) {
        lock(&self.records).insert(
            product_id,
            InventoryRecord {
                stock_quantity,
                reserved_quantity,
            },
        );
    }

    /// Stocks every line of `items` with plenty of units.
    pub fn stock_all(&self, items: &[LineItem]) {
        for item in items {
            self.stock(item.product_id(), 1_000, 0);
        }
    }

    pub fn fail(&self) {
        *lock(&self.fail) = true;
    }
}

#[async_trait]
impl InventoryProvider for FakeInventory {
    async fn inventory(
        &self,
        product_id: ProductId,
    ) -> Result<Option<InventoryRecord>, CollaboratorError> {
        if *lock(&self.fail) {
            return Err(unavailable("inventory"));
        }

        Ok(lock(&self.records).get(&product_id).copied())
    }
}

/// Reservation service.
#[derive(Debug, Default)]
pub struct FakeReservations {
    calls: Mutex<Vec<(OrderId, ReservationAction)>>,
    fail: Mutex<bool>,
}

impl FakeReservations {
    pub fn fail(&self) {
        *lock(&self.fail) = true;
    }

    pub fn calls(&self) -> Vec<(OrderId, ReservationAction)> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl ReservationService for FakeReservations {
    async fn apply(
        &self,
        order_id: OrderId,
        action: ReservationAction,
    ) -> Result<(), CollaboratorError> {
        lock(&self.calls).push((order_id, action));

        if *lock(&self.fail) {
            return Err(unavailable("inventory tracker"));
        }

        Ok(())
    }
}

/// Delivery calculator with a fixed answer.
#[derive(Debug)]
pub struct FakeDelivery {
    answer: Mutex<Result<DeliveryCost, CollaboratorError>>,
    requests: Mutex<Vec<DeliveryCostRequest>>,
}

impl FakeDelivery {
    pub fn charging(major: i64) -> Self {
        Self {
            answer: Mutex::new(Ok(DeliveryCost {
                cost: pkr(major),
                free_delivery: false,
            })),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn fail(&self) {
        *lock(&self.answer) = Err(unavailable("delivery calculator"));
    }

    pub fn requests(&self) -> Vec<DeliveryCostRequest> {
        lock(&self.requests).clone()
    }
}

impl Default for FakeDelivery {
    fn default() -> Self {
        Self::charging(2_000)
    }
}

#[async_trait]
impl DeliveryCostProvider for FakeDelivery {
    async fn delivery_cost(
        &self,
        request: DeliveryCostRequest,
    ) -> Result<DeliveryCost, CollaboratorError> {
        lock(&self.requests).push(request);

        lock(&self.answer).clone()
    }
}

/// Notification sender.
#[derive(Debug, Default)]
pub struct FakeNotifier {
    sent: Mutex<Vec<Notification>>,
    failing: Mutex<Vec<Recipient>>,
}

impl FakeNotifier {
    /// Fails every notification addressed to `recipient`.
    pub fn fail_for(&self, recipient: Recipient) {
        lock(&self.failing).push(recipient);
    }

    pub fn sent(&self) -> Vec<Notification> {
        lock(&self.sent).clone()
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), CollaboratorError> {
        if lock(&self.failing).contains(&notification.recipient) {
            return Err(unavailable("mailer"));
        }

        lock(&self.sent).push(notification);

        Ok(())
    }
}

/// Everything checkout talks to.
#[derive(Debug, Default)]
pub struct CheckoutWorld {
    pub orders: Arc<FakeOrders>,
    pub carts: Arc<FakeCarts>,
    pub inventory: Arc<FakeInventory>,
    pub reservations: Arc<FakeReservations>,
    pub delivery: Arc<FakeDelivery>,
    pub notifier: Arc<FakeNotifier>,
}

impl CheckoutWorld {
    pub fn orchestrator(&self) -> FulfillmentOrchestrator {
        FulfillmentOrchestrator::new(
            CheckoutCollaborators {
                orders: self.orders.clone(),
                carts: self.carts.clone(),
                inventory: self.inventory.clone(),
                reservations: self.reservations.clone(),
                delivery_costs: self.delivery.clone(),
                notifier: self.notifier.clone(),
            },
            settings(),
        )
    }

    /// A cash-on-delivery checkout of `items` to Lahore, with every line in stock.
    pub fn request(&self, items: Vec<LineItem>) -> CheckoutRequest {
        self.inventory.stock_all(&items);

        CheckoutRequest {
            cart: CartHandle::new(CartId::generate(), items),
            customer: customer(),
            shipping_address: lahore(),
            delivery_type: DeliveryType::Standard,
            payment: PaymentInfo::cash_on_delivery(),
            shipping_quote: None,
            notes: None,
        }
    }
}

#[derive(Debug, Default)]
struct QuotationsState {
    quotations: Vec<Quotation>,
    activities: Vec<QuotationActivity>,
    orphaned: Vec<QuotationId>,
    number_conflicts: u32,
    fail_items: bool,
    fail_activity: bool,
}

/// Quotation storage.
#[derive(Debug, Default)]
pub struct FakeQuotations {
    state: Mutex<QuotationsState>,
}

impl FakeQuotations {
    pub fn conflict_next(&self, count: u32) {
        lock(&self.state).number_conflicts = count;
    }

    pub fn fail_items(&self) {
        lock(&self.state).fail_items = true;
    }

    pub fn fail_activity(&self) {
        lock(&self.state).fail_activity = true;
    }

    pub fn quotations(&self) -> Vec<Quotation> {
        lock(&self.state).quotations.clone()
    }

    pub fn activities(&self) -> Vec<QuotationActivity> {
        lock(&self.state).activities.clone()
    }

    pub fn orphaned(&self) -> Vec<QuotationId> {
        lock(&self.state).orphaned.clone()
    }

    /// Forces a quotation into `status`.
    pub fn force_status(&self, quotation_id: QuotationId, status: QuotationStatus) {
        if let Some(quotation) = lock(&self.state)
            .quotations
            .iter_mut()
            .find(|quotation| quotation.id == quotation_id)
        {
            quotation.status = status;
        }
    }
}

#[async_trait]
impl QuotationStore for FakeQuotations {
    async fn insert_quotation(
        &self,
        quotation: NewQuotation,
    ) -> Result<Quotation, CollaboratorError> {
        let mut state = lock(&self.state);

        if state.number_conflicts > 0 {
            state.number_conflicts -= 1;
            return Err(CollaboratorError::Conflict(quotation.quote_number));
        }

        let quotation = quotation.into_quotation();

        state.quotations.push(quotation.clone());

        Ok(quotation)
    }

    async fn insert_quotation_items(
        &self,
        quotation_id: QuotationId,
        items: Vec<QuotationItem>,
    ) -> Result<(), CollaboratorError> {
        let mut state = lock(&self.state);

        if state.fail_items {
            return Err(unavailable("quotation items table"));
        }

        let quotation = state
            .quotations
            .iter_mut()
            .find(|quotation| quotation.id == quotation_id)
            .ok_or(CollaboratorError::NotFound)?;

        quotation.items = items;

        Ok(())
    }

    async fn mark_orphaned(&self, quotation_id: QuotationId) -> Result<(), CollaboratorError> {
        lock(&self.state).orphaned.push(quotation_id);

        Ok(())
    }

    async fn record_activity(&self, activity: QuotationActivity) -> Result<(), CollaboratorError> {
        let mut state = lock(&self.state);

        if state.fail_activity {
            return Err(unavailable("activity log"));
        }

        state.activities.push(activity);

        Ok(())
    }

    async fn get_quotation(
        &self,
        quotation_id: QuotationId,
    ) -> Result<Quotation, CollaboratorError> {
        lock(&self.state)
            .quotations
            .iter()
            .find(|quotation| quotation.id == quotation_id)
            .cloned()
            .ok_or(CollaboratorError::NotFound)
    }

    async fn update_quotation_status(
        &self,
        quotation_id: QuotationId,
        from: QuotationStatus,
        to: QuotationStatus,
        at: Timestamp,
    ) -> Result<Quotation, CollaboratorError> {
        let mut state = lock(&self.state);

        let quotation = state
            .quotations
            .iter_mut()
            .find(|quotation| quotation.id == quotation_id)
            .ok_or(CollaboratorError::NotFound)?;

        if quotation.status != from {
            return Err(CollaboratorError::Conflict(format!(
                "quotation is {}, not {from}",
                quotation.status
            )));
        }

        quotation.status = to;
        quotation.updated_at = at;

        if to == QuotationStatus::Viewed && quotation.viewed_at.is_none() {
            quotation.viewed_at = Some(at);
        }

        Ok(quotation.clone())
    }
}

/// CRM.
#[derive(Debug, Default)]
pub struct FakeCrm {
    syncs: Mutex<Vec<(QuotationId, SyncType)>>,
    fail: Mutex<bool>,
}

impl FakeCrm {
    pub fn fail(&self) {
        *lock(&self.fail) = true;
    }

    pub fn syncs(&self) -> Vec<(QuotationId, SyncType)> {
        lock(&self.syncs).clone()
    }
}

#[async_trait]
impl CrmSync for FakeCrm {
    async fn sync_quotation(
        &self,
        quotation_id: QuotationId,
        sync_type: SyncType,
    ) -> Result<(), CollaboratorError> {
        if *lock(&self.fail) {
            return Err(unavailable("CRM"));
        }

        lock(&self.syncs).push((quotation_id, sync_type));

        Ok(())
    }
}

/// Everything quotations talk to.
#[derive(Debug, Default)]
pub struct QuotationWorld {
    pub quotations: Arc<FakeQuotations>,
    pub crm: Arc<FakeCrm>,
    pub notifier: Arc<FakeNotifier>,
    pub carts: Arc<FakeCarts>,
}

impl QuotationWorld {
    pub fn engine(&self) -> QuotationEngine {
        QuotationEngine::new(
            QuotationCollaborators {
                quotations: self.quotations.clone(),
                crm: self.crm.clone(),
                notifier: self.notifier.clone(),
                carts: self.carts.clone(),
            },
            settings(),
        )
    }
}
