//! Fulfillment orchestrator

use std::{fmt, sync::Arc};

use jiff::{SignedDuration, Timestamp};
use rusty_money::Money;
use tracing::{Span, info, warn};

use crate::{
    carts::CartStore,
    collaborators::within,
    config::EngineSettings,
    fulfillment::{
        CHECKOUT_STEPS, CheckoutRequest, CheckoutStep, OrderAdvanced, OrderCreated, OrderEffect,
        OrderError, OrderRejected,
    },
    inventory::{
        InventoryAvailabilityChecker, InventoryProvider, ReservationAction, ReservationService,
    },
    notifications::{Notification, NotificationEvent, Notifier, Recipient},
    numbers,
    orders::{
        DeliveryRecipient, DeliveryStatus, NewDelivery, NewOrder, Order, OrderId, OrderItem,
        OrderStatus, OrderStore,
    },
    pricing::{TieredPricingEngine, net_total},
    shipping::{DeliveryCostProvider, ShippingCostResolver},
    steps::{Criticality, StepFailure, StepPolicy, best_effort},
};

/// External services checkout depends on.
#[derive(Clone)]
pub struct CheckoutCollaborators {
    /// Order storage
    pub orders: Arc<dyn OrderStore>,

    /// Cart storage
    pub carts: Arc<dyn CartStore>,

    /// Stock positions
    pub inventory: Arc<dyn InventoryProvider>,

    /// Stock reservations
    pub reservations: Arc<dyn ReservationService>,

    /// Delivery cost calculator
    pub delivery_costs: Arc<dyn DeliveryCostProvider>,

    /// Customer notifications
    pub notifier: Arc<dyn Notifier>,
}

impl fmt::Debug for CheckoutCollaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckoutCollaborators").finish_non_exhaustive()
    }
}

/// Turns a cart into a placed order.
///
/// Steps run in a fixed order (see [`crate::fulfillment::CHECKOUT_STEPS`]). A critical failure
/// stops submission; best-effort failures are logged and returned with the order.
pub struct FulfillmentOrchestrator {
    pricing: TieredPricingEngine,
    steps: StepPolicy<CheckoutStep>,
    inventory: InventoryAvailabilityChecker,
    shipping: ShippingCostResolver,
    orders: Arc<dyn OrderStore>,
    carts: Arc<dyn CartStore>,
    reservations: Arc<dyn ReservationService>,
    notifier: Arc<dyn Notifier>,
    settings: EngineSettings,
}

impl fmt::Debug for FulfillmentOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FulfillmentOrchestrator")
            .field("pricing", &self.pricing)
            .field("steps", &self.steps)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl FulfillmentOrchestrator {
    /// Creates an orchestrator using the standard discount schedule.
    pub fn new(collaborators: CheckoutCollaborators, settings: EngineSettings) -> Self {
        let timeout = settings.collaborator_timeout;

        Self {
            pricing: TieredPricingEngine::default(),
            steps: StepPolicy::new(&CHECKOUT_STEPS),
            inventory: InventoryAvailabilityChecker::new(collaborators.inventory, timeout),
            shipping: ShippingCostResolver::new(
                collaborators.delivery_costs,
                settings.fallback_shipping,
                timeout,
            ),
            orders: collaborators.orders,
            carts: collaborators.carts,
            reservations: collaborators.reservations,
            notifier: collaborators.notifier,
            settings,
        }
    }

    /// Replaces the pricing engine.
    #[must_use]
    pub fn with_pricing(mut self, pricing: TieredPricingEngine) -> Self {
        self.pricing = pricing;
        self
    }

    /// Changes how a failure of `step` is treated.
    ///
    /// Inventory verification, shipping resolution and storing the header stay critical; see
    /// [`CheckoutStep::is_prerequisite`].
    #[must_use]
    pub fn with_step_criticality(mut self, step: CheckoutStep, criticality: Criticality) -> Self {
        if step.is_prerequisite() {
            warn!(%step, "prerequisite checkout steps are always critical");
        } else {
            self.steps = self.steps.with(step, criticality);
        }

        self
    }

    /// Places an order for the cart in `request`.
    ///
    /// # Errors
    ///
    /// Returns [`OrderRejected`] when the input is invalid, payment was not collected, stock
    /// is short or unverifiable, or a critical step fails.
    #[tracing::instrument(
        name = "fulfillment.orchestrator.submit_order",
        skip(self, request),
        fields(
            cart_id = %request.cart.id(),
            delivery_type = %request.delivery_type,
            order_id = tracing::field::Empty,
            order_number = tracing::field::Empty
        ),
        err
    )]
    pub async fn submit_order(
        &self,
        request: CheckoutRequest,
    ) -> Result<OrderCreated, OrderRejected> {
        let CheckoutRequest {
            cart,
            customer,
            shipping_address,
            delivery_type,
            payment,
            shipping_quote,
            notes,
        } = request;

        let timeout = self.settings.collaborator_timeout;
        let order_id = OrderId::generate();
        let correlation_id = order_id.into_uuid();
        let span = Span::current();

        span.record("order_id", tracing::field::display(order_id));

        customer.validate()?;

        let payment_status = payment.initial_status()?;
        let lines = self.pricing.price_lines(cart.items())?;

        let availability = self
            .inventory
            .check_all(cart.items())
            .await
            .map_err(OrderRejected::InventoryUnverified)?;

        if !availability.all_available() {
            return Err(OrderRejected::InsufficientStock(
                availability.into_shortages(),
            ));
        }

        let merchandise_total = net_total(&lines)?;

        let shipping = match shipping_quote {
            Some(quote)
                if quote.is_fresh_for(&shipping_address, delivery_type, merchandise_total) =>
            {
                quote
            }
            _ => {
                self.shipping
                    .resolve(&shipping_address, delivery_type, merchandise_total)
                    .await?
            }
        };

        let pricing = self.pricing.summarize(
            &lines,
            Money::from_minor(0, merchandise_total.currency()),
            shipping.cost(),
            &self.settings.tax_rate,
        )?;

        let created_at = Timestamp::now();

        let draft = |order_number: String| NewOrder {
            id: order_id,
            order_number,
            payment_status,
            payment_method: payment.method,
            customer: customer.clone(),
            shipping_address: shipping_address.clone(),
            delivery_type,
            pricing,
            notes: notes.clone(),
            created_at,
        };

        let mut attempt = 0;

        let order = loop {
            attempt += 1;

            let inserted = within(
                timeout,
                self.orders
                    .insert_order(draft(numbers::order_number(created_at))),
            )
            .await;

            match inserted {
                Ok(order) => break order,
                Err(error) if error.is_conflict() && attempt < self.settings.number_attempts => {
                    warn!(attempt, "order number already taken, retrying");
                }
                Err(error) if error.is_conflict() => {
                    return Err(OrderRejected::NumberExhausted(attempt));
                }
                Err(error) => {
                    return Err(OrderRejected::StepFailed {
                        step: CheckoutStep::PersistOrder,
                        error,
                    });
                }
            }
        };

        span.record(
            "order_number",
            tracing::field::display(&order.order_number),
        );

        let items: Vec<OrderItem> = lines.iter().map(OrderItem::from).collect();
        let mut failures = Vec::new();

        let items_stored = self
            .steps
            .run(
                CheckoutStep::PersistOrderItems,
                correlation_id,
                &mut failures,
                within(
                    timeout,
                    self.orders.insert_order_items(order.id, items.clone()),
                ),
            )
            .await
            .map_err(|failure| rejection(&order, failure))?
            .is_some();

        self.steps
            .run(
                CheckoutStep::ReserveInventory,
                correlation_id,
                &mut failures,
                within(
                    timeout,
                    self.reservations.apply(order.id, ReservationAction::Reserve),
                ),
            )
            .await
            .map_err(|failure| rejection(&order, failure))?;

        let delivery = NewDelivery {
            order_id: order.id,
            delivery_type,
            status: DeliveryStatus::Pending,
            cost: shipping.cost(),
            address: shipping_address.clone(),
            recipient: DeliveryRecipient::from(&customer),
            estimated_delivery: created_at
                .checked_add(SignedDuration::from_hours(24 * delivery_type.transit_days()))
                .ok(),
        };

        self.steps
            .run(
                CheckoutStep::PersistDelivery,
                correlation_id,
                &mut failures,
                within(timeout, self.orders.insert_delivery(delivery)),
            )
            .await
            .map_err(|failure| rejection(&order, failure))?;

        self.steps
            .run(
                CheckoutStep::ClearCart,
                correlation_id,
                &mut failures,
                within(timeout, self.carts.clear_cart(cart.id())),
            )
            .await
            .map_err(|failure| rejection(&order, failure))?;

        self.steps
            .run(
                CheckoutStep::SendConfirmation,
                correlation_id,
                &mut failures,
                within(
                    timeout,
                    self.notifier.notify(Notification::new(
                        order.id,
                        NotificationEvent::OrderConfirmation,
                        Recipient::Customer,
                    )),
                ),
            )
            .await
            .map_err(|failure| rejection(&order, failure))?;

        info!(
            order_number = %order.order_number,
            final_total = %pricing.final_total(),
            shipping_degraded = shipping.degraded(),
            best_effort_failures = failures.len(),
            "placed order"
        );

        let mut order = order;

        if items_stored {
            order.items = items;
        }

        Ok(OrderCreated {
            order,
            shipping,
            best_effort_failures: failures,
        })
    }

    /// Moves an order to `to`, notifying the customer and adjusting reservations.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError`] when the order is missing, the transition is not allowed, or the
    /// order changed concurrently.
    #[tracing::instrument(
        name = "fulfillment.orchestrator.advance_order",
        skip(self),
        fields(order_id = %order_id, to = %to),
        err
    )]
    pub async fn advance_order(
        &self,
        order_id: OrderId,
        to: OrderStatus,
    ) -> Result<OrderAdvanced, OrderError> {
        let timeout = self.settings.collaborator_timeout;
        let correlation_id = order_id.into_uuid();

        let current = within(timeout, self.orders.get_order(order_id))
            .await
            .map_err(|error| OrderError::from_store(order_id, error))?;

        if !current.status.can_transition_to(to) {
            return Err(OrderError::InvalidTransition {
                from: current.status,
                to,
            });
        }

        let order = within(
            timeout,
            self.orders
                .update_order_status(order_id, current.status, to, Timestamp::now()),
        )
        .await
        .map_err(|error| OrderError::from_store(order_id, error))?;

        let mut failures = Vec::new();

        let reservation = match to {
            OrderStatus::Delivered => {
                Some((OrderEffect::ConfirmReservation, ReservationAction::Confirm))
            }
            OrderStatus::Cancelled => {
                Some((OrderEffect::ReleaseReservation, ReservationAction::Release))
            }
            _ => None,
        };

        if let Some((effect, action)) = reservation {
            best_effort(
                effect,
                correlation_id,
                &mut failures,
                within(timeout, self.reservations.apply(order_id, action)),
            )
            .await;
        }

        if let Some(event) = to.notification() {
            best_effort(
                OrderEffect::NotifyCustomer,
                correlation_id,
                &mut failures,
                within(
                    timeout,
                    self.notifier
                        .notify(Notification::new(order_id, event, Recipient::Customer)),
                ),
            )
            .await;
        }

        info!(from = %current.status, "advanced order");

        Ok(OrderAdvanced {
            order,
            best_effort_failures: failures,
        })
    }
}

/// Rejection for a critical step that failed once the order header was stored.
fn rejection(order: &Order, failure: StepFailure<CheckoutStep>) -> OrderRejected {
    let StepFailure { step, error } = failure;
    let order_id = order.id;
    let order_number = order.order_number.clone();

    match step {
        CheckoutStep::PersistOrderItems => OrderRejected::ItemsNotPersisted {
            order_id,
            order_number,
            error,
        },
        CheckoutStep::ClearCart => OrderRejected::CartNotCleared {
            order_id,
            order_number,
            error,
        },
        _ => OrderRejected::Incomplete {
            order_id,
            order_number,
            step,
            error,
        },
    }
}
