//! Receipt
//!
//! Terminal rendering of priced lines and their totals, used by the CLI for carts and
//! quotation estimates.

use std::io;

use rusty_money::{Money, MoneyError, iso::Currency};
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    discounts::percent_points,
    pricing::{OrderAdjustments, PricedLineItem, PricingSummary},
    quotations::QuotationDraft,
};

/// Errors that can occur when rendering a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// Wrapper for money errors.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// IO error
    #[error("IO error")]
    IO,
}

/// One rendered line.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptLine {
    /// Product name
    pub product_name: String,

    /// Units
    pub quantity: u32,

    /// Unit price charged, including any customization premium
    pub unit_price: Money<'static, Currency>,

    /// Quantity discount in percent points
    pub discount_points: rust_decimal::Decimal,

    /// Line total after the quantity discount
    pub line_total: Money<'static, Currency>,
}

impl From<&PricedLineItem> for ReceiptLine {
    fn from(line: &PricedLineItem) -> Self {
        Self {
            product_name: line.item().product_name().to_string(),
            quantity: line.item().quantity(),
            unit_price: line.item().unit_price(),
            discount_points: percent_points(&line.discount_rate()),
            line_total: line.line_total(),
        }
    }
}

/// Priced lines and totals ready to print.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    title: String,
    lines: Vec<ReceiptLine>,
    adjustments: Option<OrderAdjustments>,
    pricing: PricingSummary,
}

impl Receipt {
    /// A receipt for priced cart lines.
    pub fn for_cart(lines: &[PricedLineItem], pricing: PricingSummary) -> Self {
        Self {
            title: String::from("Cart"),
            lines: lines.iter().map(ReceiptLine::from).collect(),
            adjustments: None,
            pricing,
        }
    }

    /// A receipt for a quotation estimate.
    pub fn for_quotation(draft: &QuotationDraft) -> Self {
        let lines = draft
            .items()
            .iter()
            .map(|item| ReceiptLine {
                product_name: item.product_name.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                discount_points: percent_points(&item.discount_rate),
                line_total: item.line_total,
            })
            .collect();

        Self {
            title: format!("Quotation ({} tier)", draft.customer_tier()),
            lines,
            adjustments: Some(*draft.adjustments()),
            pricing: *draft.pricing(),
        }
    }

    /// Rendered lines
    pub fn lines(&self) -> &[ReceiptLine] {
        &self.lines
    }

    /// Totals
    pub fn pricing(&self) -> &PricingSummary {
        &self.pricing
    }

    /// Writes the receipt as a table followed by its totals.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiptError::IO`] if writing fails.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        let mut builder = Builder::default();

        builder.push_record(["", "Item", "Qty", "Unit Price", "Discount", "Line Total"]);

        for (idx, line) in self.lines.iter().enumerate() {
            let discount = if line.discount_points.is_zero() {
                String::new()
            } else {
                format!("{}%", line.discount_points.normalize())
            };

            builder.push_record([
                format!("#{:<3}", idx + 1),
                line.product_name.clone(),
                line.quantity.to_string(),
                format!("{}", line.unit_price),
                discount,
                format!("{}", line.line_total),
            ]);
        }

        let mut table = builder.build();
        let mut theme = Theme::from(Style::modern_rounded());

        theme.remove_horizontal_lines();
        theme.insert_horizontal_line(
            1,
            HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤')),
        );

        table.with(theme);
        table.modify(Columns::new(2..6), Alignment::right());
        table.modify(Rows::first(), Alignment::center());

        writeln!(out, "\n{}\n{table}", self.title).map_err(|_err| ReceiptError::IO)?;

        self.write_summary(&mut out)
    }

    fn write_summary(&self, out: &mut impl io::Write) -> Result<(), ReceiptError> {
        let pricing = &self.pricing;
        let mut rows: Vec<(&str, String)> = vec![
            ("Subtotal:", format!("{}", pricing.subtotal())),
            ("Discount:", format!("-{}", pricing.total_discount())),
        ];

        if let Some(adjustments) = &self.adjustments {
            if !adjustments.volume().is_zero() {
                rows.push(("  volume:", format!("-{}", adjustments.volume())));
            }

            if !adjustments.tier().is_zero() {
                rows.push(("  account tier:", format!("-{}", adjustments.tier())));
            }
        }

        rows.push(("Tax:", format!("{}", pricing.tax_amount())));
        rows.push(("Shipping:", format!("{}", pricing.shipping_cost())));
        rows.push(("Total:", format!("{}", pricing.final_total())));

        let label_width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
        let value_width = rows.iter().map(|(_, value)| value.len()).max().unwrap_or(0);

        for (label, value) in rows {
            writeln!(out, " {label:>label_width$}  {value:>value_width$}")
                .map_err(|_err| ReceiptError::IO)?;
        }

        writeln!(out).map_err(|_err| ReceiptError::IO)
    }
}
