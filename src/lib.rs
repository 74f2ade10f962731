//! Woodex
//!
//! Pricing, quotation and order fulfilment engine for the Woodex furniture storefront.
//!
//! Cart lines are priced with quantity discount tiers, taxed and shipped. Business customers
//! can ask for quotations, which add customization premiums, volume and account-tier
//! discounts. Checkout verifies stock, stores the order and then reserves inventory, books
//! delivery and notifies the customer, tolerating failures in the steps that can be retried
//! later.

pub mod carts;
pub mod collaborators;
pub mod config;
pub mod crm;
pub mod customers;
pub mod discounts;
pub mod edge;
pub mod fixtures;
pub mod fulfillment;
pub mod ids;
pub mod inventory;
pub mod items;
pub mod notifications;
pub mod numbers;
pub mod observability;
pub mod orders;
pub mod prelude;
pub mod pricing;
pub mod quotations;
pub mod receipt;
pub mod shipping;
pub mod steps;
