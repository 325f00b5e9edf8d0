//! Per-image pricing for the supported models.
//!
//! Prices are fixed-point [`Decimal`] values keyed by one composite
//! `(model, quality, size)` key. Unknown combinations cost zero; rejecting
//! them is the normalizer's job, not the table's.

use crate::models::{ImageModel, ImageSize, Quality};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

pub type PriceKey = (ImageModel, Quality, ImageSize);

/// Nested `{model: {quality: {size: cost}}}` view, as reported to clients.
pub type PricingSchedule =
    BTreeMap<&'static str, BTreeMap<&'static str, BTreeMap<&'static str, Decimal>>>;

#[derive(Debug, Clone)]
pub struct PricingTable {
    prices: HashMap<PriceKey, Decimal>,
}

impl PricingTable {
    pub fn new(prices: HashMap<PriceKey, Decimal>) -> Self {
        Self { prices }
    }

    /// OpenAI list prices for DALL-E 3 and DALL-E 2 (USD per image).
    pub fn standard() -> Self {
        use ImageModel::{DallE2, DallE3};
        use ImageSize::*;
        use Quality::{Hd, Standard};

        let entries = [
            ((DallE3, Standard, Square1024), Decimal::new(40, 3)),
            ((DallE3, Standard, Portrait1024x1792), Decimal::new(80, 3)),
            ((DallE3, Standard, Landscape1792x1024), Decimal::new(80, 3)),
            ((DallE3, Hd, Square1024), Decimal::new(80, 3)),
            ((DallE3, Hd, Portrait1024x1792), Decimal::new(120, 3)),
            ((DallE3, Hd, Landscape1792x1024), Decimal::new(120, 3)),
            ((DallE2, Standard, Square1024), Decimal::new(20, 3)),
            ((DallE2, Standard, Square512), Decimal::new(18, 3)),
            ((DallE2, Standard, Square256), Decimal::new(16, 3)),
        ];

        Self::new(entries.into_iter().collect())
    }

    /// Cost of one image. The legacy tier has a single quality level, so any
    /// requested quality is priced as `standard`.
    pub fn cost(&self, model: ImageModel, quality: Quality, size: ImageSize) -> Decimal {
        let quality = if model.is_advanced() {
            quality
        } else {
            Quality::Standard
        };

        match self.prices.get(&(model, quality, size)) {
            Some(price) => *price,
            None => Decimal::ZERO,
        }
    }

    pub fn total_cost(
        &self,
        model: ImageModel,
        quality: Quality,
        size: ImageSize,
        count: u32,
    ) -> Decimal {
        self.cost(model, quality, size) * Decimal::from(count)
    }

    pub fn schedule(&self) -> PricingSchedule {
        let mut schedule = PricingSchedule::new();
        for ((model, quality, size), price) in &self.prices {
            schedule
                .entry(model.as_str())
                .or_default()
                .entry(quality.as_str())
                .or_default()
                .insert(size.as_str(), *price);
        }
        schedule
    }
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::standard()
    }
}
