//! Integration tests for checkout and the order lifecycle.
//!
//! The reference cart is eight office chairs at 10,000 PKR delivered to Lahore:
//!
//! - Line total after the 6-20 unit discount (5% of 80,000): 76,000
//! - Subtotal: 76,000
//! - Tax (17% of 76,000): 12,920
//! - Shipping: 2,000
//! - Total: 90,920

mod common;

use std::{sync::Arc, time::Duration};

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use testresult::TestResult;
use woodex::{
    fulfillment::{CheckoutStep, OrderEffect, OrderError, OrderRejected, PaymentInfo, PaymentSignal},
    inventory::ReservationAction,
    notifications::{NotificationEvent, Recipient},
    orders::{DeliveryRecipient, OrderId, OrderStatus, PaymentMethod, PaymentStatus},
    shipping::{DeliveryType, ShippingCostResolver},
    steps::Criticality,
};

use common::{CheckoutWorld, FakeDelivery, line, pkr};

#[tokio::test]
async fn places_order_with_tiered_discount_tax_and_shipping() -> TestResult {
    let world = CheckoutWorld::default();
    let request = world.request(vec![line("Office Chair", 10_000, 8)?]);
    let cart_id = request.cart.id();

    let created = world.orchestrator().submit_order(request).await?;
    let pricing = created.pricing();

    assert_eq!(pricing.subtotal(), pkr(76_000));
    assert_eq!(pricing.total_discount(), pkr(0));
    assert_eq!(pricing.tax_amount(), pkr(12_920));
    assert_eq!(pricing.shipping_cost(), pkr(2_000));
    assert_eq!(created.final_total(), pkr(90_920));

    assert!(
        created.best_effort_failures.is_empty(),
        "unexpected failures: {:?}",
        created.best_effort_failures
    );
    assert!(
        created.order_number().starts_with("WDX"),
        "order number {}",
        created.order_number()
    );
    assert_eq!(created.order.status, OrderStatus::Pending);
    assert_eq!(created.order.payment_status, PaymentStatus::Pending);

    let item = created.order.items.first().ok_or("order has no items")?;

    assert_eq!(item.quantity, 8);
    assert_eq!(item.discount_rate, Percentage::from(Decimal::new(5, 2)));
    assert_eq!(item.line_total, pkr(76_000));

    let stored = world.orders.orders();

    assert_eq!(stored.len(), 1, "one order stored");
    assert_eq!(
        stored.first().map(|order| order.items.len()),
        Some(1),
        "items stored with the order"
    );

    assert_eq!(
        world.reservations.calls(),
        vec![(created.order_id(), ReservationAction::Reserve)]
    );
    assert_eq!(world.carts.cleared(), vec![cart_id]);

    let delivery = world.orders.deliveries();
    let delivery = delivery.first().ok_or("no delivery record")?;

    assert_eq!(delivery.cost, pkr(2_000));
    assert_eq!(delivery.delivery_type, DeliveryType::Standard);
    assert_eq!(
        delivery.recipient,
        DeliveryRecipient {
            name: "Ayesha Khan".into(),
            phone: Some("+92 300 0000000".into()),
        }
    );
    assert!(
        delivery.estimated_delivery > Some(created.order.created_at),
        "delivery is estimated after placement"
    );

    let sent = world.notifier.sent();

    assert_eq!(sent.len(), 1, "one confirmation sent");
    assert_eq!(
        sent.first().map(|notification| (notification.event, notification.recipient)),
        Some((NotificationEvent::OrderConfirmation, Recipient::Customer))
    );

    Ok(())
}

#[tokio::test]
async fn bulk_lines_earn_the_top_tier() -> TestResult {
    let world = CheckoutWorld::default();
    let request = world.request(vec![line("Stacking Chair", 5_000, 60)?]);

    let created = world.orchestrator().submit_order(request).await?;

    assert_eq!(
        created.order.items.first().map(|item| item.line_total),
        Some(pkr(255_000))
    );

    Ok(())
}

#[tokio::test]
async fn stored_lines_add_up_to_the_subtotal() -> TestResult {
    let world = CheckoutWorld::default();
    let request = world.request(vec![
        line("Office Chair", 10_000, 8)?,
        line("Stacking Chair", 5_000, 60)?,
        line("Desk Lamp", 1_499, 3)?,
        line("Filing Cabinet", 17_999, 25)?,
    ]);

    let created = world.orchestrator().submit_order(request).await?;

    let stored = world.orders.orders();
    let order = stored.first().ok_or("order not stored")?;

    assert_eq!(order.items.len(), 4, "every line stored");

    let items_total: i64 = order
        .items
        .iter()
        .map(|item| item.line_total.to_minor_units())
        .sum();

    assert_eq!(items_total, order.pricing.subtotal().to_minor_units());
    assert_eq!(created.pricing().subtotal(), order.pricing.subtotal());

    Ok(())
}

#[tokio::test]
async fn insufficient_stock_rejects_before_anything_is_stored() -> TestResult {
    let world = CheckoutWorld::default();
    let sofa = line("Sofa", 80_000, 3)?;
    let request = world.request(vec![sofa.clone()]);

    world.inventory.stock(sofa.product_id(), 10, 8);

    let result = world.orchestrator().submit_order(request).await;

    let Err(OrderRejected::InsufficientStock(shortages)) = result else {
        return Err(format!("expected a shortage, got {result:?}").into());
    };

    let shortage = shortages.first().ok_or("no shortage reported")?;

    assert_eq!(shortage.product_id, sofa.product_id());
    assert_eq!(shortage.requested, 3);
    assert_eq!(shortage.available, 2);

    assert!(world.orders.orders().is_empty(), "no order stored");
    assert!(world.carts.cleared().is_empty(), "cart untouched");
    assert!(world.notifier.sent().is_empty(), "nobody notified");

    Ok(())
}

#[tokio::test]
async fn unreadable_inventory_is_not_treated_as_in_stock() -> TestResult {
    let world = CheckoutWorld::default();
    let request = world.request(vec![line("Desk", 30_000, 1)?]);

    world.inventory.fail();

    let result = world.orchestrator().submit_order(request).await;

    assert!(
        matches!(result, Err(OrderRejected::InventoryUnverified(_))),
        "expected unverified inventory, got {result:?}"
    );
    assert!(world.orders.orders().is_empty(), "no order stored");

    Ok(())
}

#[tokio::test]
async fn reservation_failure_does_not_fail_checkout() -> TestResult {
    let world = CheckoutWorld::default();
    let request = world.request(vec![line("Bookshelf", 12_000, 2)?]);

    world.reservations.fail();

    let created = world.orchestrator().submit_order(request).await?;

    let steps: Vec<_> = created
        .best_effort_failures
        .iter()
        .map(|failure| failure.step)
        .collect();

    assert_eq!(steps, vec![CheckoutStep::ReserveInventory]);
    assert_eq!(world.orders.orders().len(), 1, "order still stored");
    assert_eq!(world.notifier.sent().len(), 1, "confirmation still sent");

    Ok(())
}

#[tokio::test]
async fn delivery_record_and_confirmation_are_best_effort() -> TestResult {
    let world = CheckoutWorld::default();
    let request = world.request(vec![line("Bookshelf", 12_000, 2)?]);

    world.orders.fail_delivery();
    world.notifier.fail_for(Recipient::Customer);

    let created = world.orchestrator().submit_order(request).await?;

    let steps: Vec<_> = created
        .best_effort_failures
        .iter()
        .map(|failure| failure.step)
        .collect();

    assert_eq!(
        steps,
        vec![CheckoutStep::PersistDelivery, CheckoutStep::SendConfirmation]
    );

    Ok(())
}

#[tokio::test]
async fn critical_reservation_aborts_checkout() -> TestResult {
    let world = CheckoutWorld::default();
    let request = world.request(vec![line("Bookshelf", 12_000, 2)?]);

    world.reservations.fail();

    let result = world
        .orchestrator()
        .with_step_criticality(CheckoutStep::ReserveInventory, Criticality::Critical)
        .submit_order(request)
        .await;

    let Err(OrderRejected::Incomplete { step, order_id, .. }) = result else {
        return Err(format!("expected an incomplete order, got {result:?}").into());
    };

    assert_eq!(step, CheckoutStep::ReserveInventory);
    assert_eq!(
        world.orders.orders().first().map(|order| order.id),
        Some(order_id),
        "header stays for reconciliation"
    );
    assert!(world.carts.cleared().is_empty(), "later steps skipped");
    assert!(world.notifier.sent().is_empty(), "nobody notified");

    Ok(())
}

#[tokio::test]
async fn relaxed_cart_clearing_is_only_recorded() -> TestResult {
    let world = CheckoutWorld::default();
    let request = world.request(vec![line("Bookshelf", 12_000, 2)?]);

    world.carts.fail();

    let created = world
        .orchestrator()
        .with_step_criticality(CheckoutStep::ClearCart, Criticality::BestEffort)
        .submit_order(request)
        .await?;

    let steps: Vec<_> = created
        .best_effort_failures
        .iter()
        .map(|failure| failure.step)
        .collect();

    assert_eq!(steps, vec![CheckoutStep::ClearCart]);
    assert_eq!(world.notifier.sent().len(), 1, "confirmation still sent");

    Ok(())
}

#[tokio::test]
async fn prerequisite_steps_cannot_be_relaxed() -> TestResult {
    let world = CheckoutWorld::default();
    let request = world.request(vec![line("Desk", 30_000, 1)?]);

    world.inventory.fail();

    let result = world
        .orchestrator()
        .with_step_criticality(CheckoutStep::VerifyInventory, Criticality::BestEffort)
        .submit_order(request)
        .await;

    assert!(
        matches!(result, Err(OrderRejected::InventoryUnverified(_))),
        "expected unverified inventory, got {result:?}"
    );
    assert!(world.orders.orders().is_empty(), "no order stored");

    Ok(())
}

#[tokio::test]
async fn each_order_gets_its_own_number() -> TestResult {
    let world = CheckoutWorld::default();
    let orchestrator = world.orchestrator();

    let first = orchestrator
        .submit_order(world.request(vec![line("Lamp", 1_500, 1)?]))
        .await?;
    let second = orchestrator
        .submit_order(world.request(vec![line("Lamp", 1_500, 1)?]))
        .await?;

    assert_ne!(first.order_number(), second.order_number());
    assert_ne!(first.order_id(), second.order_id());

    Ok(())
}

#[tokio::test]
async fn taken_order_number_is_retried() -> TestResult {
    let world = CheckoutWorld::default();
    let request = world.request(vec![line("Lamp", 1_500, 1)?]);

    world.orders.conflict_next(2);

    let created = world.orchestrator().submit_order(request).await?;

    assert_eq!(world.orders.insert_attempts(), 3);
    assert_eq!(world.orders.orders().len(), 1, "stored once");
    assert_eq!(
        world.orders.orders().first().map(|order| order.id),
        Some(created.order_id())
    );

    Ok(())
}

#[tokio::test]
async fn number_allocation_gives_up_after_configured_attempts() -> TestResult {
    let world = CheckoutWorld::default();
    let request = world.request(vec![line("Lamp", 1_500, 1)?]);

    world.orders.conflict_next(10);

    let result = world.orchestrator().submit_order(request).await;

    assert_eq!(result, Err(OrderRejected::NumberExhausted(3)));
    assert!(world.orders.orders().is_empty(), "nothing stored");
    assert!(world.reservations.calls().is_empty(), "nothing reserved");

    Ok(())
}

#[tokio::test]
async fn items_failure_reports_the_orphaned_order() -> TestResult {
    let world = CheckoutWorld::default();
    let request = world.request(vec![line("Wardrobe", 60_000, 1)?]);

    world.orders.fail_items();

    let result = world.orchestrator().submit_order(request).await;

    let Err(OrderRejected::ItemsNotPersisted {
        order_id,
        order_number,
        ..
    }) = result
    else {
        return Err(format!("expected orphaned order, got {result:?}").into());
    };

    let stored = world.orders.orders();

    assert_eq!(stored.first().map(|order| order.id), Some(order_id));
    assert_eq!(
        stored.first().map(|order| order.order_number.clone()),
        Some(order_number)
    );
    assert!(world.reservations.calls().is_empty(), "nothing reserved");
    assert!(world.carts.cleared().is_empty(), "cart kept");

    Ok(())
}

#[tokio::test]
async fn cart_failure_is_reported_with_the_placed_order() -> TestResult {
    let world = CheckoutWorld::default();
    let request = world.request(vec![line("Wardrobe", 60_000, 1)?]);

    world.carts.fail();

    let result = world.orchestrator().submit_order(request).await;

    assert!(
        matches!(result, Err(OrderRejected::CartNotCleared { .. })),
        "expected cart failure, got {result:?}"
    );
    assert_eq!(
        result.err().and_then(|rejected| rejected.step()),
        Some(CheckoutStep::ClearCart)
    );
    assert_eq!(world.orders.orders().len(), 1, "order stays placed");
    assert!(world.notifier.sent().is_empty(), "no confirmation yet");

    Ok(())
}

#[tokio::test]
async fn fresh_shipping_quote_is_reused() -> TestResult {
    let world = CheckoutWorld::default();
    let mut request = world.request(vec![line("Office Chair", 10_000, 8)?]);

    let resolver = ShippingCostResolver::new(
        Arc::new(FakeDelivery::charging(1_500)),
        Decimal::from(2_000),
        Duration::from_secs(1),
    );

    request.shipping_quote = Some(
        resolver
            .resolve(&request.shipping_address, DeliveryType::Standard, pkr(76_000))
            .await?,
    );

    let created = world.orchestrator().submit_order(request).await?;

    assert_eq!(created.pricing().shipping_cost(), pkr(1_500));
    assert!(
        world.delivery.requests().is_empty(),
        "calculator not called again"
    );

    Ok(())
}

#[tokio::test]
async fn stale_shipping_quote_is_recomputed() -> TestResult {
    let world = CheckoutWorld::default();
    let mut request = world.request(vec![line("Office Chair", 10_000, 8)?]);

    let resolver = ShippingCostResolver::new(
        Arc::new(FakeDelivery::charging(1_500)),
        Decimal::from(2_000),
        Duration::from_secs(1),
    );

    request.shipping_quote = Some(
        resolver
            .resolve(&request.shipping_address, DeliveryType::Express, pkr(76_000))
            .await?,
    );

    let created = world.orchestrator().submit_order(request).await?;

    assert_eq!(created.pricing().shipping_cost(), pkr(2_000));
    assert_eq!(world.delivery.requests().len(), 1, "calculator asked again");

    Ok(())
}

#[tokio::test]
async fn calculator_outage_charges_the_fallback_fee() -> TestResult {
    let world = CheckoutWorld::default();
    let request = world.request(vec![line("Office Chair", 10_000, 8)?]);

    world.delivery.fail();

    let created = world.orchestrator().submit_order(request).await?;

    assert!(created.shipping.degraded(), "fallback fee is flagged");
    assert_eq!(created.pricing().shipping_cost(), pkr(2_000));
    assert_eq!(created.final_total(), pkr(90_920));

    Ok(())
}

#[tokio::test]
async fn invalid_customer_is_rejected_up_front() -> TestResult {
    let world = CheckoutWorld::default();
    let mut request = world.request(vec![line("Lamp", 1_500, 1)?]);

    request.customer.email = "not-an-email".into();

    let result = world.orchestrator().submit_order(request).await;

    assert!(
        matches!(result, Err(OrderRejected::InvalidCustomer(_))),
        "expected invalid customer, got {result:?}"
    );
    assert_eq!(world.orders.insert_attempts(), 0);

    Ok(())
}

#[tokio::test]
async fn card_orders_need_a_captured_payment() -> TestResult {
    let world = CheckoutWorld::default();
    let mut request = world.request(vec![line("Lamp", 1_500, 1)?]);

    request.payment = PaymentInfo {
        method: PaymentMethod::Card,
        signal: PaymentSignal::Pending,
    };

    let result = world.orchestrator().submit_order(request.clone()).await;

    assert!(
        matches!(result, Err(OrderRejected::PaymentDeclined(_))),
        "expected payment declined, got {result:?}"
    );

    request.payment.signal = PaymentSignal::Succeeded {
        reference: "pi_123".into(),
    };

    let created = world.orchestrator().submit_order(request).await?;

    assert_eq!(created.order.payment_status, PaymentStatus::Paid);

    Ok(())
}

#[tokio::test]
async fn orders_advance_one_status_at_a_time() -> TestResult {
    let world = CheckoutWorld::default();
    let orchestrator = world.orchestrator();
    let created = orchestrator
        .submit_order(world.request(vec![line("Desk", 30_000, 1)?]))
        .await?;
    let order_id = created.order_id();

    let skipped = orchestrator
        .advance_order(order_id, OrderStatus::Shipped)
        .await;

    assert_eq!(
        skipped,
        Err(OrderError::InvalidTransition {
            from: OrderStatus::Pending,
            to: OrderStatus::Shipped,
        })
    );

    for status in [
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ] {
        let advanced = orchestrator.advance_order(order_id, status).await?;

        assert_eq!(advanced.order.status, status);
        assert!(
            advanced.best_effort_failures.is_empty(),
            "no failures moving to {status}"
        );
    }

    let events: Vec<_> = world
        .notifier
        .sent()
        .iter()
        .map(|notification| notification.event)
        .collect();

    assert_eq!(
        events,
        vec![
            NotificationEvent::OrderConfirmation,
            NotificationEvent::OrderShipped,
            NotificationEvent::OrderDelivered,
        ]
    );

    assert_eq!(
        world.reservations.calls().last(),
        Some(&(order_id, ReservationAction::Confirm))
    );

    let after_delivery = orchestrator
        .advance_order(order_id, OrderStatus::Cancelled)
        .await;

    assert!(
        matches!(after_delivery, Err(OrderError::InvalidTransition { .. })),
        "delivered orders cannot be cancelled"
    );

    Ok(())
}

#[tokio::test]
async fn cancelling_releases_the_reservation() -> TestResult {
    let world = CheckoutWorld::default();
    let orchestrator = world.orchestrator();
    let created = orchestrator
        .submit_order(world.request(vec![line("Desk", 30_000, 1)?]))
        .await?;

    world.reservations.fail();

    let cancelled = orchestrator
        .advance_order(created.order_id(), OrderStatus::Cancelled)
        .await?;

    assert_eq!(cancelled.order.status, OrderStatus::Cancelled);
    assert_eq!(
        cancelled
            .best_effort_failures
            .iter()
            .map(|failure| failure.step)
            .collect::<Vec<_>>(),
        vec![OrderEffect::ReleaseReservation]
    );
    assert_eq!(
        world.reservations.calls().last(),
        Some(&(created.order_id(), ReservationAction::Release))
    );

    Ok(())
}

#[tokio::test]
async fn transitions_start_from_the_stored_status() -> TestResult {
    let world = CheckoutWorld::default();
    let created = world
        .orchestrator()
        .submit_order(world.request(vec![line("Desk", 30_000, 1)?]))
        .await?;

    world
        .orders
        .force_status(created.order_id(), OrderStatus::Confirmed);

    let result = world
        .orchestrator()
        .advance_order(created.order_id(), OrderStatus::Processing)
        .await?;

    assert_eq!(result.order.status, OrderStatus::Processing);

    Ok(())
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let world = CheckoutWorld::default();
    let order_id = OrderId::generate();

    let result = world
        .orchestrator()
        .advance_order(order_id, OrderStatus::Confirmed)
        .await;

    assert_eq!(result, Err(OrderError::NotFound(order_id)));
}
