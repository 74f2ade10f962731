//! Customizations
//!
//! Furniture can be quoted with a different material, colour or size. Each choice carries a
//! premium on the unit price; premiums from different choices add up.

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::discounts::sum_percentages;

/// Upholstery or build material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Material {
    /// Premium leather, +25%.
    PremiumLeather,

    /// High grade wood, +20%.
    HighGradeWood,

    /// Fabric upgrade, +10%.
    FabricUpgrade,

    /// Catalogue material.
    #[serde(other)]
    Standard,
}

impl Material {
    /// Premium charged for this material.
    pub fn premium(self) -> Percentage {
        Percentage::from(match self {
            Self::PremiumLeather => Decimal::new(25, 2),
            Self::HighGradeWood => Decimal::new(20, 2),
            Self::FabricUpgrade => Decimal::new(10, 2),
            Self::Standard => Decimal::ZERO,
        })
    }
}

/// Size option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeOption {
    /// Executive size, +30%.
    Executive,

    /// Large, +20%.
    Large,

    /// Made to measure, +25%.
    Custom,

    /// Catalogue size.
    #[serde(other)]
    Standard,
}

impl SizeOption {
    /// Premium charged for this size.
    pub fn premium(self) -> Percentage {
        Percentage::from(match self {
            Self::Executive => Decimal::new(30, 2),
            Self::Large => Decimal::new(20, 2),
            Self::Custom => Decimal::new(25, 2),
            Self::Standard => Decimal::ZERO,
        })
    }
}

/// Customization choices attached to a line item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customizations {
    /// Material choice, if any.
    #[serde(default)]
    pub material: Option<Material>,

    /// Colour name. Anything other than `standard` is a custom colour.
    #[serde(default)]
    pub color: Option<String>,

    /// Size choice, if any.
    #[serde(default)]
    pub size: Option<SizeOption>,
}

impl Customizations {
    /// Returns true when no customization was requested.
    pub fn is_empty(&self) -> bool {
        self.material.is_none() && self.color.is_none() && self.size.is_none()
    }

    /// Returns true when a non-standard colour was requested.
    pub fn has_custom_color(&self) -> bool {
        self.color
            .as_deref()
            .is_some_and(|color| !color.trim().eq_ignore_ascii_case("standard"))
    }

    /// Combined premium rate over the base unit price.
    pub fn premium_rate(&self) -> Percentage {
        let color = Percentage::from(if self.has_custom_color() {
            Decimal::new(10, 2)
        } else {
            Decimal::ZERO
        });

        let material = self.material.unwrap_or(Material::Standard).premium();
        let size = self.size.unwrap_or(SizeOption::Standard).premium();

        sum_percentages(&[material, color, size])
    }
}
