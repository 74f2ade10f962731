//! Quotation engine

use std::{fmt, sync::Arc};

use jiff::{SignedDuration, Timestamp};
use tracing::{Span, info, warn};

use crate::{
    carts::CartStore,
    collaborators::within,
    config::EngineSettings,
    crm::{CrmSync, SyncType},
    items::LineItem,
    notifications::{Notification, NotificationEvent, Notifier, Recipient},
    numbers,
    pricing::{CustomerTier, PricingError, TieredPricingEngine, VolumeDiscount},
    quotations::{
        NewQuotation, Quotation, QuotationActivity, QuotationCalculator, QuotationCreated,
        QUOTATION_STEPS, QuotationDraft, QuotationError, QuotationId, QuotationRejected,
        QuotationRequest, QuotationStatus, QuotationStep, QuotationStore, QuotationUpdated,
    },
    shipping::ShippingEstimate,
    steps::{Criticality, StepFailure, StepPolicy},
};

/// External services quotations depend on.
#[derive(Clone)]
pub struct QuotationCollaborators {
    /// Quotation storage
    pub quotations: Arc<dyn QuotationStore>,

    /// CRM
    pub crm: Arc<dyn CrmSync>,

    /// Customer and staff notifications
    pub notifier: Arc<dyn Notifier>,

    /// Cart storage
    pub carts: Arc<dyn CartStore>,
}

impl fmt::Debug for QuotationCollaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuotationCollaborators")
            .finish_non_exhaustive()
    }
}

/// Prices, stores and tracks quotations.
pub struct QuotationEngine {
    calculator: QuotationCalculator,
    steps: StepPolicy<QuotationStep>,
    quotations: Arc<dyn QuotationStore>,
    crm: Arc<dyn CrmSync>,
    notifier: Arc<dyn Notifier>,
    carts: Arc<dyn CartStore>,
    settings: EngineSettings,
}

impl fmt::Debug for QuotationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuotationEngine")
            .field("calculator", &self.calculator)
            .field("steps", &self.steps)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl QuotationEngine {
    /// Creates an engine with the standard schedule, volume discount and shipping bands.
    pub fn new(collaborators: QuotationCollaborators, settings: EngineSettings) -> Self {
        Self {
            calculator: QuotationCalculator::new(settings.tax_rate),
            steps: StepPolicy::new(&QUOTATION_STEPS),
            quotations: collaborators.quotations,
            crm: collaborators.crm,
            notifier: collaborators.notifier,
            carts: collaborators.carts,
            settings,
        }
    }

    /// Replaces the pricing engine.
    #[must_use]
    pub fn with_pricing(mut self, pricing: TieredPricingEngine) -> Self {
        self.calculator = self.calculator.with_pricing(pricing);
        self
    }

    /// Replaces the volume discount rule.
    #[must_use]
    pub fn with_volume_discount(mut self, volume: VolumeDiscount) -> Self {
        self.calculator = self.calculator.with_volume_discount(volume);
        self
    }

    /// Replaces the shipping estimate bands.
    #[must_use]
    pub fn with_shipping_estimate(mut self, shipping: ShippingEstimate) -> Self {
        self.calculator = self.calculator.with_shipping_estimate(shipping);
        self
    }

    /// Changes how a failure of `step` is treated.
    ///
    /// Storing the header stays critical.
    #[must_use]
    pub fn with_step_criticality(mut self, step: QuotationStep, criticality: Criticality) -> Self {
        if step.is_prerequisite() {
            warn!(%step, "prerequisite quotation steps are always critical");
        } else {
            self.steps = self.steps.with(step, criticality);
        }

        self
    }

    /// Prices `items` for a customer on `customer_tier` without storing anything.
    ///
    /// # Errors
    ///
    /// See [`QuotationCalculator::build_quotation`].
    pub fn build_quotation(
        &self,
        items: &[LineItem],
        customer_tier: CustomerTier,
    ) -> Result<QuotationDraft, PricingError> {
        self.calculator.build_quotation(items, customer_tier)
    }

    /// Prices and stores a quotation, then records, syncs and announces it.
    ///
    /// # Errors
    ///
    /// Returns [`QuotationRejected`] when the request is invalid or the quotation could not be
    /// stored. [`QuotationRejected::Orphaned`] means the header exists without its lines.
    #[tracing::instrument(
        name = "quotations.engine.submit_quotation",
        skip(self, request),
        fields(
            customer_tier = %request.customer_tier,
            quotation_id = tracing::field::Empty,
            quote_number = tracing::field::Empty
        ),
        err
    )]
    pub async fn submit_quotation(
        &self,
        request: QuotationRequest,
    ) -> Result<QuotationCreated, QuotationRejected> {
        let QuotationRequest {
            items,
            customer,
            customer_tier,
            notes,
            source_cart,
        } = request;

        let timeout = self.settings.collaborator_timeout;
        let quotation_id = QuotationId::generate();
        let correlation_id = quotation_id.into_uuid();
        let span = Span::current();

        span.record("quotation_id", tracing::field::display(quotation_id));

        customer.validate()?;

        let draft = self.build_quotation(&items, customer_tier)?;
        let pricing = *draft.pricing();
        let created_at = Timestamp::now();
        let valid_until = valid_until(created_at, self.settings.quote_validity_days);

        let header = |quote_number: String| NewQuotation {
            id: quotation_id,
            quote_number,
            customer: customer.clone(),
            customer_tier,
            pricing,
            notes: notes.clone(),
            valid_until,
            created_at,
        };

        let mut attempt = 0;

        let mut quotation = loop {
            attempt += 1;

            let inserted = within(
                timeout,
                self.quotations
                    .insert_quotation(header(numbers::quote_number(created_at))),
            )
            .await;

            match inserted {
                Ok(quotation) => break quotation,
                Err(error) if error.is_conflict() && attempt < self.settings.number_attempts => {
                    warn!(attempt, "quote number already taken, retrying");
                }
                Err(error) if error.is_conflict() => {
                    return Err(QuotationRejected::NumberExhausted(attempt));
                }
                Err(error) => {
                    return Err(QuotationRejected::StepFailed {
                        step: QuotationStep::PersistQuotation,
                        error,
                    });
                }
            }
        };

        span.record(
            "quote_number",
            tracing::field::display(&quotation.quote_number),
        );

        let quotation_items = draft.into_items();
        let mut failures = Vec::new();

        let items_stored = match self
            .steps
            .run(
                QuotationStep::PersistItems,
                correlation_id,
                &mut failures,
                within(
                    timeout,
                    self.quotations
                        .insert_quotation_items(quotation_id, quotation_items.clone()),
                ),
            )
            .await
        {
            Ok(stored) => stored.is_some(),
            Err(StepFailure { error, .. }) => {
                let flagged =
                    match within(timeout, self.quotations.mark_orphaned(quotation_id)).await {
                        Ok(()) => true,
                        Err(flag_error) => {
                            warn!(error = %flag_error, "could not flag orphaned quotation");
                            false
                        }
                    };

                return Err(QuotationRejected::Orphaned {
                    quotation_id,
                    quote_number: quotation.quote_number,
                    flagged,
                    error,
                });
            }
        };

        let incomplete = |failure: StepFailure<QuotationStep>| QuotationRejected::Incomplete {
            quotation_id,
            quote_number: quotation.quote_number.clone(),
            step: failure.step,
            error: failure.error,
        };

        self.steps
            .run(
                QuotationStep::RecordActivity,
                correlation_id,
                &mut failures,
                within(
                    timeout,
                    self.quotations.record_activity(QuotationActivity::created(
                        quotation_id,
                        &quotation.quote_number,
                        created_at,
                    )),
                ),
            )
            .await
            .map_err(incomplete)?;

        self.steps
            .run(
                QuotationStep::SyncCrm,
                correlation_id,
                &mut failures,
                within(timeout, self.crm.sync_quotation(quotation_id, SyncType::Full)),
            )
            .await
            .map_err(incomplete)?;

        let (customer_notice, staff_notice) = tokio::join!(
            within(
                timeout,
                self.notifier.notify(Notification::new(
                    quotation_id,
                    NotificationEvent::QuotationCreated,
                    Recipient::Customer,
                )),
            ),
            within(
                timeout,
                self.notifier.notify(Notification::new(
                    quotation_id,
                    NotificationEvent::QuotationCreated,
                    Recipient::Staff,
                )),
            ),
        );

        self.steps
            .settle(
                QuotationStep::NotifyCustomer,
                correlation_id,
                &mut failures,
                customer_notice,
            )
            .map_err(incomplete)?;

        self.steps
            .settle(
                QuotationStep::NotifyStaff,
                correlation_id,
                &mut failures,
                staff_notice,
            )
            .map_err(incomplete)?;

        if let Some(cart_id) = source_cart {
            self.steps
                .run(
                    QuotationStep::ClearCart,
                    correlation_id,
                    &mut failures,
                    within(timeout, self.carts.clear_cart(cart_id)),
                )
                .await
                .map_err(incomplete)?;
        }

        info!(
            quote_number = %quotation.quote_number,
            final_total = %pricing.final_total(),
            valid_until = %valid_until,
            best_effort_failures = failures.len(),
            "issued quotation"
        );

        if items_stored {
            quotation.items = quotation_items;
        }

        Ok(QuotationCreated {
            quotation,
            best_effort_failures: failures,
        })
    }

    /// Records that the customer opened a sent quotation.
    ///
    /// Only the first view of a `sent` quotation changes anything; later calls return the
    /// stored quotation unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`QuotationError::InvalidTransition`] for a draft that was never sent, or a
    /// storage error.
    #[tracing::instrument(
        name = "quotations.engine.mark_viewed",
        skip(self),
        fields(quotation_id = %quotation_id),
        err
    )]
    pub async fn mark_viewed(
        &self,
        quotation_id: QuotationId,
    ) -> Result<QuotationUpdated, QuotationError> {
        let current = self.load(quotation_id).await?;

        match current.status {
            QuotationStatus::Sent => {}
            QuotationStatus::Draft => {
                return Err(QuotationError::InvalidTransition {
                    from: QuotationStatus::Draft,
                    to: QuotationStatus::Viewed,
                });
            }
            _ => return Ok(QuotationUpdated::unchanged(current)),
        }

        match self.transition(current, QuotationStatus::Viewed).await {
            Err(QuotationError::ConcurrentUpdate(_)) => {
                info!("quotation was viewed concurrently");

                Ok(QuotationUpdated::unchanged(self.load(quotation_id).await?))
            }
            other => other,
        }
    }

    /// Moves a quotation to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`QuotationError`] when the quotation is missing, the move is not allowed, or
    /// the quotation changed concurrently.
    #[tracing::instrument(
        name = "quotations.engine.update_status",
        skip(self),
        fields(quotation_id = %quotation_id, to = %to),
        err
    )]
    pub async fn update_status(
        &self,
        quotation_id: QuotationId,
        to: QuotationStatus,
    ) -> Result<QuotationUpdated, QuotationError> {
        let current = self.load(quotation_id).await?;

        if !current.status.can_transition_to(to) {
            return Err(QuotationError::InvalidTransition {
                from: current.status,
                to,
            });
        }

        self.transition(current, to).await
    }

    /// Expires the quotation if it is still open and `now` is past its validity.
    ///
    /// # Errors
    ///
    /// Returns [`QuotationError`] when the quotation is missing or changed concurrently.
    #[tracing::instrument(
        name = "quotations.engine.expire_if_due",
        skip(self),
        fields(quotation_id = %quotation_id),
        err
    )]
    pub async fn expire_if_due(
        &self,
        quotation_id: QuotationId,
        now: Timestamp,
    ) -> Result<QuotationUpdated, QuotationError> {
        let current = self.load(quotation_id).await?;

        if !current.is_due_to_expire(now) {
            return Ok(QuotationUpdated::unchanged(current));
        }

        self.transition(current, QuotationStatus::Expired).await
    }

    async fn load(&self, quotation_id: QuotationId) -> Result<Quotation, QuotationError> {
        within(
            self.settings.collaborator_timeout,
            self.quotations.get_quotation(quotation_id),
        )
        .await
        .map_err(|error| QuotationError::from_store(quotation_id, error))
    }

    async fn transition(
        &self,
        current: Quotation,
        to: QuotationStatus,
    ) -> Result<QuotationUpdated, QuotationError> {
        let timeout = self.settings.collaborator_timeout;
        let quotation_id = current.id;
        let correlation_id = quotation_id.into_uuid();
        let from = current.status;
        let at = Timestamp::now();

        let quotation = within(
            timeout,
            self.quotations
                .update_quotation_status(quotation_id, from, to, at),
        )
        .await
        .map_err(|error| QuotationError::from_store(quotation_id, error))?;

        let mut failures = Vec::new();
        let side_effect = |failure: StepFailure<QuotationStep>| QuotationError::StepFailed {
            step: failure.step,
            error: failure.error,
        };

        self.steps
            .run(
                QuotationStep::RecordActivity,
                correlation_id,
                &mut failures,
                within(
                    timeout,
                    self.quotations.record_activity(QuotationActivity::status_changed(
                        quotation_id,
                        from,
                        to,
                        at,
                    )),
                ),
            )
            .await
            .map_err(side_effect)?;

        self.steps
            .run(
                QuotationStep::SyncCrm,
                correlation_id,
                &mut failures,
                within(
                    timeout,
                    self.crm.sync_quotation(quotation_id, SyncType::Status),
                ),
            )
            .await
            .map_err(side_effect)?;

        if let Some(event) = to.notification() {
            self.steps
                .run(
                    QuotationStep::NotifyCustomer,
                    correlation_id,
                    &mut failures,
                    within(
                        timeout,
                        self.notifier
                            .notify(Notification::new(quotation_id, event, Recipient::Customer)),
                    ),
                )
                .await
                .map_err(side_effect)?;
        }

        info!(%from, %to, "quotation status changed");

        Ok(QuotationUpdated {
            quotation,
            changed: true,
            best_effort_failures: failures,
        })
    }
}

fn valid_until(created_at: Timestamp, days: u32) -> Timestamp {
    created_at
        .checked_add(SignedDuration::from_hours(24 * i64::from(days)))
        .unwrap_or(Timestamp::MAX)
}
