use std::{
    io::{self, Write},
    path::PathBuf,
    sync::Arc,
};

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use tracing::info;
use woodex::{
    config::{EdgeConfig, EngineConfig, EngineSettings, LoggingConfig},
    edge::EdgeFunctionsClient,
    fixtures::load_cart,
    pricing::{CustomerTier, TieredPricingEngine, money_from_major, net_total},
    quotations::QuotationCalculator,
    receipt::Receipt,
    shipping::{Address, DeliveryType, ShippingCostResolver},
};

#[derive(Debug, Parser)]
#[command(name = "woodex", about = "Woodex pricing and quotation tools", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) logging: LoggingConfig,

    #[command(flatten)]
    engine: EngineConfig,

    #[command(flatten)]
    edge: EdgeConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Price a cart with quantity tiers, tax and optional delivery
    Price(PriceArgs),

    /// Estimate a quotation for a cart
    Quote(QuoteArgs),

    /// Ask the delivery calculator what shipping would cost
    Shipping(ShippingArgs),
}

#[derive(Debug, Args)]
struct PriceArgs {
    /// YAML cart file
    cart: PathBuf,

    #[command(flatten)]
    destination: DestinationArgs,
}

#[derive(Debug, Args)]
struct QuoteArgs {
    /// YAML cart file
    cart: PathBuf,

    /// Customer account tier
    #[arg(long, value_enum, default_value_t = CustomerTier::Standard)]
    tier: CustomerTier,
}

#[derive(Debug, Args)]
struct ShippingArgs {
    #[command(flatten)]
    destination: DestinationArgs,

    /// Merchandise total in major units
    #[arg(long)]
    cart_total: Decimal,
}

#[derive(Debug, Args)]
struct DestinationArgs {
    /// Destination city
    #[arg(long)]
    city: Option<String>,

    /// Destination postal code
    #[arg(long)]
    postal_code: Option<String>,

    /// Delivery speed
    #[arg(long, value_enum, default_value_t = DeliveryType::Standard)]
    delivery_type: DeliveryType,
}

impl DestinationArgs {
    fn address(&self) -> Option<Address> {
        if self.city.is_none() && self.postal_code.is_none() {
            return None;
        }

        Some(Address {
            city: self.city.clone().unwrap_or_default(),
            postal_code: self.postal_code.clone().unwrap_or_default(),
            ..Address::default()
        })
    }
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        let settings = self
            .engine
            .settings()
            .map_err(|error| format!("invalid configuration: {error}"))?;

        match self.command {
            Commands::Price(args) => price(args, &settings, &self.edge).await,
            Commands::Quote(args) => quote(&args, &settings),
            Commands::Shipping(args) => shipping(args, &settings, &self.edge).await,
        }
    }
}

async fn price(args: PriceArgs, settings: &EngineSettings, edge: &EdgeConfig) -> Result<(), String> {
    let items = load_cart(&args.cart)
        .map_err(|error| format!("failed to load {}: {error}", args.cart.display()))?;

    let engine = TieredPricingEngine::default();

    let lines = engine
        .price_lines(&items)
        .map_err(|error| format!("failed to price cart: {error}"))?;

    let net = net_total(&lines).map_err(|error| format!("failed to price cart: {error}"))?;

    ensure_currency(net.currency(), settings)?;

    let shipping = match args.destination.address() {
        Some(address) => {
            let quote = resolver(edge, settings)?
                .resolve(&address, args.destination.delivery_type, net)
                .await
                .map_err(|error| format!("failed to resolve shipping: {error}"))?;

            if quote.degraded() {
                info!("delivery calculator unavailable, charged the fallback fee");
            }

            quote.cost()
        }
        None => Money::from_minor(0, settings.currency),
    };

    let pricing = engine
        .summarize(
            &lines,
            Money::from_minor(0, settings.currency),
            shipping,
            &settings.tax_rate,
        )
        .map_err(|error| format!("failed to total cart: {error}"))?;

    Receipt::for_cart(&lines, pricing)
        .write_to(io::stdout().lock())
        .map_err(|error| format!("failed to write receipt: {error}"))
}

fn quote(args: &QuoteArgs, settings: &EngineSettings) -> Result<(), String> {
    let items = load_cart(&args.cart)
        .map_err(|error| format!("failed to load {}: {error}", args.cart.display()))?;

    if let Some(item) = items.first() {
        ensure_currency(item.unit_price().currency(), settings)?;
    }

    let draft = QuotationCalculator::new(settings.tax_rate)
        .build_quotation(&items, args.tier)
        .map_err(|error| format!("failed to price quotation: {error}"))?;

    Receipt::for_quotation(&draft)
        .write_to(io::stdout().lock())
        .map_err(|error| format!("failed to write receipt: {error}"))
}

async fn shipping(
    args: ShippingArgs,
    settings: &EngineSettings,
    edge: &EdgeConfig,
) -> Result<(), String> {
    let address = args
        .destination
        .address()
        .ok_or_else(|| String::from("give a --city or a --postal-code"))?;

    let cart_total = money_from_major(args.cart_total, settings.currency);

    let quote = resolver(edge, settings)?
        .resolve(&address, args.destination.delivery_type, cart_total)
        .await
        .map_err(|error| format!("failed to resolve shipping: {error}"))?;

    let mut out = io::stdout().lock();

    let note = if quote.degraded() {
        " (fallback fee, calculator unavailable)"
    } else if quote.free_delivery_applied() {
        " (free delivery)"
    } else {
        ""
    };

    writeln!(
        out,
        "{} delivery: {}{note}",
        quote.delivery_type(),
        quote.cost()
    )
    .map_err(|error| format!("failed to write output: {error}"))
}

fn resolver(edge: &EdgeConfig, settings: &EngineSettings) -> Result<ShippingCostResolver, String> {
    let client = EdgeFunctionsClient::from_config(edge, settings.collaborator_timeout)
        .map_err(|error| format!("delivery calculator unavailable: {error}"))?;

    Ok(ShippingCostResolver::new(
        Arc::new(client),
        settings.fallback_shipping,
        settings.collaborator_timeout,
    ))
}

fn ensure_currency(currency: &'static Currency, settings: &EngineSettings) -> Result<(), String> {
    if currency == settings.currency {
        Ok(())
    } else {
        Err(format!(
            "cart is priced in {} but the storefront sells in {}",
            currency.iso_alpha_code, settings.currency.iso_alpha_code
        ))
    }
}
