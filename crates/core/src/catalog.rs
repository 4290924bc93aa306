//! Material/color/quality catalog data model.
//!
//! The catalog is the pricing reference data: an ordered list of materials
//! (each with its colors) plus global settings. It is loaded from a JSON
//! document at startup and replaced wholesale by the admin endpoint; all
//! optional fields have their defaults resolved here, in one place, rather
//! than at each use site.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Markup applied on top of the base price when the catalog does not
/// specify one, in percent.
pub const DEFAULT_MARKUP_PERCENTAGE: f64 = 30.0;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A printable color offered for a material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Color {
    pub id: String,
    pub name: String,
    /// Display color, e.g. `#1a1a1a`.
    pub hex: String,
    /// Flat surcharge for this color. Non-negative by convention.
    pub addon_price: f64,
}

/// A filament material with per-gram and per-hour rates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Marketing bullet points shown in the frontend selector.
    #[serde(default)]
    pub properties: Vec<String>,
    pub base_cost_per_gram: f64,
    pub hourly_rate: f64,
    /// Flat surcharge (or discount) applied after markup. Defaults to 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_modifier: Option<f64>,
    pub colors: Vec<Color>,
}

impl Material {
    /// Look up a color by id within this material.
    pub fn color(&self, color_id: &str) -> Option<&Color> {
        self.colors.iter().find(|c| c.id == color_id)
    }

    /// Flat price modifier with the default applied.
    pub fn price_modifier(&self) -> f64 {
        self.price_modifier.unwrap_or(0.0)
    }
}

/// A print quality level (layer height tier) with a flat price modifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityLevel {
    pub id: String,
    pub name: String,
    pub price_modifier: f64,
}

/// Settings that apply across all materials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalSettings {
    /// Multiplier applied to material cost (only) when supports are enabled.
    /// Expected to be greater than 1.0.
    pub support_material_multiplier: f64,
    /// Floor for the pre-markup base price.
    pub minimum_price: f64,
    /// Infill fraction used when a submission does not specify one.
    pub default_fill_density: f64,
    /// Markup in percent. Absent means [`DEFAULT_MARKUP_PERCENTAGE`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markup_percentage: Option<f64>,
    /// Optional quality tiers. Absent means no quality pricing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_levels: Option<Vec<QualityLevel>>,
}

impl GlobalSettings {
    /// Markup as a fraction, with the default applied.
    pub fn markup_fraction(&self) -> f64 {
        self.markup_percentage
            .unwrap_or(DEFAULT_MARKUP_PERCENTAGE)
            / 100.0
    }

    /// Price modifier for a quality level id.
    ///
    /// Returns 0 when no id was requested, the catalog defines no quality
    /// levels, or the id does not match any level.
    pub fn quality_modifier(&self, quality_id: Option<&str>) -> f64 {
        let (Some(id), Some(levels)) = (quality_id, self.quality_levels.as_ref()) else {
            return 0.0;
        };
        levels
            .iter()
            .find(|q| q.id == id)
            .map(|q| q.price_modifier)
            .unwrap_or(0.0)
    }
}

/// The full pricing catalog document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub materials: Vec<Material>,
    pub global_settings: GlobalSettings,
}

impl Catalog {
    /// Look up a material by id.
    pub fn material(&self, material_id: &str) -> Option<&Material> {
        self.materials.iter().find(|m| m.id == material_id)
    }

    /// Structural sanity checks applied before a replacement catalog is
    /// accepted: at least one material, unique material/color ids, each
    /// material has at least one color, and positive global settings.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.materials.is_empty() {
            return Err(CoreError::Validation(
                "Catalog must contain at least one material".to_string(),
            ));
        }

        let mut material_ids = std::collections::HashSet::new();
        for material in &self.materials {
            if !material_ids.insert(material.id.as_str()) {
                return Err(CoreError::Validation(format!(
                    "Duplicate material id '{}'",
                    material.id
                )));
            }
            if material.colors.is_empty() {
                return Err(CoreError::Validation(format!(
                    "Material '{}' must offer at least one color",
                    material.id
                )));
            }
            let mut color_ids = std::collections::HashSet::new();
            for color in &material.colors {
                if !color_ids.insert(color.id.as_str()) {
                    return Err(CoreError::Validation(format!(
                        "Duplicate color id '{}' in material '{}'",
                        color.id, material.id
                    )));
                }
            }
        }

        let settings = &self.global_settings;
        if settings.support_material_multiplier <= 1.0 {
            return Err(CoreError::Validation(
                "support_material_multiplier must be greater than 1.0".to_string(),
            ));
        }
        if settings.minimum_price < 0.0 {
            return Err(CoreError::Validation(
                "minimum_price must not be negative".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&settings.default_fill_density) {
            return Err(CoreError::Validation(
                "default_fill_density must be a fraction in [0, 1]".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for Catalog {
    /// Compiled-in catalog used on first run and whenever the persisted
    /// document cannot be loaded.
    fn default() -> Self {
        Self {
            materials: vec![
                Material {
                    id: "pla".to_string(),
                    name: "PLA".to_string(),
                    description: "General purpose, easy to print, rigid".to_string(),
                    properties: vec![
                        "Biodegradable".to_string(),
                        "Low warp".to_string(),
                        "Matte finish".to_string(),
                    ],
                    base_cost_per_gram: 0.05,
                    hourly_rate: 2.0,
                    price_modifier: None,
                    colors: vec![
                        Color {
                            id: "black".to_string(),
                            name: "Black".to_string(),
                            hex: "#1a1a1a".to_string(),
                            addon_price: 0.0,
                        },
                        Color {
                            id: "white".to_string(),
                            name: "White".to_string(),
                            hex: "#f5f5f5".to_string(),
                            addon_price: 0.0,
                        },
                        Color {
                            id: "red".to_string(),
                            name: "Red".to_string(),
                            hex: "#d32f2f".to_string(),
                            addon_price: 0.5,
                        },
                    ],
                },
                Material {
                    id: "petg".to_string(),
                    name: "PETG".to_string(),
                    description: "Tough, temperature resistant, slightly flexible".to_string(),
                    properties: vec![
                        "Impact resistant".to_string(),
                        "Food safe variants".to_string(),
                    ],
                    base_cost_per_gram: 0.07,
                    hourly_rate: 2.5,
                    price_modifier: Some(1.0),
                    colors: vec![
                        Color {
                            id: "black".to_string(),
                            name: "Black".to_string(),
                            hex: "#1a1a1a".to_string(),
                            addon_price: 0.0,
                        },
                        Color {
                            id: "clear".to_string(),
                            name: "Clear".to_string(),
                            hex: "#e0f7fa".to_string(),
                            addon_price: 1.0,
                        },
                    ],
                },
            ],
            global_settings: GlobalSettings {
                support_material_multiplier: 1.2,
                minimum_price: 5.0,
                default_fill_density: 0.15,
                markup_percentage: Some(30.0),
                quality_levels: Some(vec![
                    QualityLevel {
                        id: "draft".to_string(),
                        name: "Draft (0.3mm)".to_string(),
                        price_modifier: -1.0,
                    },
                    QualityLevel {
                        id: "standard".to_string(),
                        name: "Standard (0.2mm)".to_string(),
                        price_modifier: 0.0,
                    },
                    QualityLevel {
                        id: "fine".to_string(),
                        name: "Fine (0.1mm)".to_string(),
                        price_modifier: 2.5,
                    },
                ]),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::default()
    }

    // -- lookups --------------------------------------------------------------

    #[test]
    fn material_lookup_by_id() {
        let cat = catalog();
        assert_eq!(cat.material("pla").unwrap().name, "PLA");
        assert!(cat.material("resin").is_none());
    }

    #[test]
    fn color_lookup_within_material() {
        let cat = catalog();
        let pla = cat.material("pla").unwrap();
        assert_eq!(pla.color("red").unwrap().addon_price, 0.5);
        assert!(pla.color("clear").is_none());
    }

    // -- defaults -------------------------------------------------------------

    #[test]
    fn markup_defaults_to_30_percent() {
        let mut settings = catalog().global_settings;
        settings.markup_percentage = None;
        assert!((settings.markup_fraction() - 0.30).abs() < f64::EPSILON);
    }

    #[test]
    fn explicit_markup_overrides_default() {
        let mut settings = catalog().global_settings;
        settings.markup_percentage = Some(10.0);
        assert!((settings.markup_fraction() - 0.10).abs() < f64::EPSILON);
    }

    #[test]
    fn price_modifier_defaults_to_zero() {
        let cat = catalog();
        assert_eq!(cat.material("pla").unwrap().price_modifier(), 0.0);
        assert_eq!(cat.material("petg").unwrap().price_modifier(), 1.0);
    }

    // -- quality modifier -----------------------------------------------------

    #[test]
    fn quality_modifier_matched_level() {
        let settings = catalog().global_settings;
        assert_eq!(settings.quality_modifier(Some("fine")), 2.5);
        assert_eq!(settings.quality_modifier(Some("draft")), -1.0);
    }

    #[test]
    fn quality_modifier_zero_when_unmatched() {
        let settings = catalog().global_settings;
        assert_eq!(settings.quality_modifier(Some("ultra")), 0.0);
    }

    #[test]
    fn quality_modifier_zero_when_not_requested() {
        let settings = catalog().global_settings;
        assert_eq!(settings.quality_modifier(None), 0.0);
    }

    #[test]
    fn quality_modifier_zero_when_no_levels_defined() {
        let mut settings = catalog().global_settings;
        settings.quality_levels = None;
        assert_eq!(settings.quality_modifier(Some("fine")), 0.0);
    }

    // -- validation -----------------------------------------------------------

    #[test]
    fn default_catalog_is_valid() {
        assert!(catalog().validate().is_ok());
    }

    #[test]
    fn empty_materials_rejected() {
        let mut cat = catalog();
        cat.materials.clear();
        assert!(cat.validate().is_err());
    }

    #[test]
    fn duplicate_material_id_rejected() {
        let mut cat = catalog();
        let dup = cat.materials[0].clone();
        cat.materials.push(dup);
        assert!(cat.validate().is_err());
    }

    #[test]
    fn duplicate_color_id_rejected() {
        let mut cat = catalog();
        let dup = cat.materials[0].colors[0].clone();
        cat.materials[0].colors.push(dup);
        assert!(cat.validate().is_err());
    }

    #[test]
    fn material_without_colors_rejected() {
        let mut cat = catalog();
        cat.materials[0].colors.clear();
        assert!(cat.validate().is_err());
    }

    #[test]
    fn support_multiplier_at_or_below_one_rejected() {
        let mut cat = catalog();
        cat.global_settings.support_material_multiplier = 1.0;
        assert!(cat.validate().is_err());
    }

    #[test]
    fn fill_density_above_one_rejected() {
        let mut cat = catalog();
        cat.global_settings.default_fill_density = 1.5;
        assert!(cat.validate().is_err());
    }

    // -- serde ----------------------------------------------------------------

    #[test]
    fn catalog_round_trips_through_json() {
        let cat = catalog();
        let json = serde_json::to_string(&cat).unwrap();
        let back: Catalog = serde_json::from_str(&json).unwrap();
        assert_eq!(back.materials.len(), cat.materials.len());
        assert_eq!(
            back.global_settings.minimum_price,
            cat.global_settings.minimum_price
        );
    }

    #[test]
    fn missing_optional_fields_deserialize_with_defaults() {
        let json = r##"{
            "materials": [{
                "id": "pla", "name": "PLA", "description": "basic",
                "base_cost_per_gram": 0.05, "hourly_rate": 2.0,
                "colors": [{"id": "black", "name": "Black", "hex": "#000", "addon_price": 0.0}]
            }],
            "global_settings": {
                "support_material_multiplier": 1.2,
                "minimum_price": 5.0,
                "default_fill_density": 0.15
            }
        }"##;
        let cat: Catalog = serde_json::from_str(json).unwrap();
        assert!(cat.global_settings.markup_percentage.is_none());
        assert!(cat.global_settings.quality_levels.is_none());
        assert!(cat.materials[0].price_modifier.is_none());
        assert!(cat.materials[0].properties.is_empty());
    }
}
