//! Price calculation for a sliced model.
//!
//! [`price_job`] is a pure function from a catalog snapshot and slicer
//! output to an itemized price breakdown. A pricing failure (unknown
//! material or color) is data for the caller to embed in the job result,
//! never a reason to fail the job -- slicing already succeeded by the
//! time pricing runs.

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::duration::parse_print_time;

/// Inputs to a price calculation: the job's selections plus the slicer's
/// filament and time outputs.
#[derive(Debug, Clone)]
pub struct PricingInputs<'a> {
    pub material_id: &'a str,
    pub color_id: &'a str,
    /// Grams of filament reported by the slicer. Non-negative.
    pub filament_used_g: f64,
    /// Compound duration string, e.g. `"5h 30m"`.
    pub estimated_time: &'a str,
    pub enable_supports: bool,
    pub quality_id: Option<&'a str>,
}

/// Itemized price breakdown. All fields are rounded to 2 decimal places.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub material_cost: f64,
    pub time_cost: f64,
    /// `max(material_cost + time_cost, minimum_price)`, pre-markup.
    pub base_price: f64,
    pub base_price_with_markup: f64,
    pub color_addon: f64,
    pub material_modifier: f64,
    pub quality_modifier: f64,
    pub total_price: f64,
}

/// Pricing result as stored on a job: either a breakdown or the error
/// message, serialized as `{ ...breakdown }` or `{ "error": ... }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceOutcome {
    Priced(PriceBreakdown),
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    #[error("Unknown material id '{0}'")]
    UnknownMaterial(String),

    #[error("Unknown color id '{color_id}' for material '{material_id}'")]
    UnknownColor {
        material_id: String,
        color_id: String,
    },
}

/// Round a monetary amount to 2 decimal places for display.
fn round_currency(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Compute the price breakdown for a sliced job.
///
/// Deterministic: identical catalog and inputs always produce an identical
/// breakdown. Intermediate arithmetic is unrounded; only the emitted
/// fields are rounded.
pub fn price_job(catalog: &Catalog, inputs: &PricingInputs) -> Result<PriceBreakdown, PricingError> {
    let material = catalog
        .material(inputs.material_id)
        .ok_or_else(|| PricingError::UnknownMaterial(inputs.material_id.to_string()))?;
    let color = material
        .color(inputs.color_id)
        .ok_or_else(|| PricingError::UnknownColor {
            material_id: inputs.material_id.to_string(),
            color_id: inputs.color_id.to_string(),
        })?;

    let settings = &catalog.global_settings;

    // Support structures consume extra filament; the multiplier applies to
    // material cost only, never to time cost.
    let mut material_cost = inputs.filament_used_g * material.base_cost_per_gram;
    if inputs.enable_supports {
        material_cost *= settings.support_material_multiplier;
    }

    let hours = parse_print_time(inputs.estimated_time);
    let time_cost = hours * material.hourly_rate;

    let base_price = (material_cost + time_cost).max(settings.minimum_price);
    let base_price_with_markup = base_price * (1.0 + settings.markup_fraction());

    let color_addon = color.addon_price;
    let material_modifier = material.price_modifier();
    let quality_modifier = settings.quality_modifier(inputs.quality_id);

    let total_price = base_price_with_markup + color_addon + material_modifier + quality_modifier;

    Ok(PriceBreakdown {
        material_cost: round_currency(material_cost),
        time_cost: round_currency(time_cost),
        base_price: round_currency(base_price),
        base_price_with_markup: round_currency(base_price_with_markup),
        color_addon: round_currency(color_addon),
        material_modifier: round_currency(material_modifier),
        quality_modifier: round_currency(quality_modifier),
        total_price: round_currency(total_price),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
