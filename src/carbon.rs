//! Static emission factors, in kg CO2e per unit of activity.

use async_graphql::SimpleObject;

use crate::AppError;

#[derive(Debug, Clone, PartialEq, SimpleObject)]
pub struct EmissionFactor {
    pub activity_type: String,
    /// kg CO2e per `unit`.
    pub factor: f64,
    pub unit: String,
}

/// (activity type, kg CO2e per unit, unit)
type FactorTable = &'static [(&'static str, f64, &'static str)];

const TRANSPORT: FactorTable = &[
    ("car", 0.192, "km"),
    ("electric_car", 0.053, "km"),
    ("motorbike", 0.114, "km"),
    ("bus", 0.105, "km"),
    ("train", 0.041, "km"),
    ("flight", 0.255, "km"),
    ("bicycle", 0.0, "km"),
    ("walking", 0.0, "km"),
];

const HOUSING: FactorTable = &[
    ("electricity", 0.233, "kWh"),
    ("natural_gas", 0.184, "kWh"),
    ("heating_oil", 2.52, "litre"),
    ("water", 0.000344, "litre"),
];

const FOOD: FactorTable = &[
    ("beef", 27.0, "kg"),
    ("lamb", 39.2, "kg"),
    ("pork", 12.1, "kg"),
    ("chicken", 6.9, "kg"),
    ("fish", 6.1, "kg"),
    ("dairy", 3.2, "kg"),
    ("vegetables", 2.0, "kg"),
    ("plant_based_meal", 0.5, "meal"),
];

const GOODS: FactorTable = &[
    ("clothing", 10.0, "item"),
    ("electronics", 70.0, "item"),
    ("furniture", 90.0, "item"),
    ("books", 1.0, "item"),
];

fn table(category: &str) -> Option<FactorTable> {
    match category {
        "transport" => Some(TRANSPORT),
        "housing" => Some(HOUSING),
        "food" => Some(FOOD),
        "goods" => Some(GOODS),
        _ => None,
    }
}

/// Emission factor and unit for `activity_type` within `category`.
pub fn factor(category: &str, activity_type: &str) -> Option<(f64, &'static str)> {
    table(category)?
        .iter()
        .find(|(name, _, _)| *name == activity_type)
        .map(|(_, factor, unit)| (*factor, *unit))
}

/// Every factor known for `category`; empty for an unknown category.
pub fn factors(category: &str) -> Vec<EmissionFactor> {
    table(category)
        .unwrap_or_default()
        .iter()
        .map(|(name, factor, unit)| EmissionFactor {
            activity_type: name.to_string(),
            factor: *factor,
            unit: unit.to_string(),
        })
        .collect()
}

/// kg CO2e emitted by `quantity` units of `activity_type`.
pub fn estimate(category: &str, activity_type: &str, quantity: f64) -> Result<f64, AppError> {
    if !quantity.is_finite() || quantity < 0.0 {
        return Err(AppError::Validation(format!(
            "quantity must be a non-negative number, got {quantity}"
        )));
    }
    let (per_unit, _) = factor(category, activity_type).ok_or_else(|| {
        AppError::Validation(format!(
            "no emission factor for '{activity_type}' in category '{category}'"
        ))
    })?;
    Ok(per_unit * quantity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimates_multiply_quantity_by_factor() {
        let kg = estimate("transport", "car", 100.0).unwrap();
        assert!((kg - 19.2).abs() < 1e-9);
        assert_eq!(estimate("food", "beef", 2.0).unwrap(), 54.0);
        assert_eq!(estimate("transport", "bicycle", 12.0).unwrap(), 0.0);
    }

    #[test]
    fn unknown_category_or_type_is_rejected() {
        assert!(matches!(
            estimate("space", "rocket", 1.0),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            estimate("food", "rocket", 1.0),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn negative_or_nan_quantity_is_rejected() {
        assert!(estimate("transport", "car", -1.0).is_err());
        assert!(estimate("transport", "car", f64::NAN).is_err());
    }

    #[test]
    fn every_category_lists_its_factors() {
        for category in ["transport", "housing", "food", "goods"] {
            assert!(!factors(category).is_empty(), "{category}");
        }
        assert!(factors("space").is_empty());
        assert_eq!(factor("housing", "electricity"), Some((0.233, "kWh")));
    }
}
