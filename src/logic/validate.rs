use std::collections::HashSet;

use crate::error::ValidationError;
use crate::model::{NewOptionValue, OptionAxis};

/// Lowercase, alphanumeric runs joined by single dashes
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for ch in input.trim().chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Validate a new axis name against the configured axes; returns the trimmed name
pub fn validate_axis_name(name: &str, existing: &[OptionAxis]) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyAxisName);
    }

    let needle = trimmed.to_lowercase();
    if existing
        .iter()
        .any(|axis| axis.axis_name.trim().to_lowercase() == needle)
    {
        return Err(ValidationError::DuplicateAxisName(trimmed.to_string()));
    }

    Ok(trimmed.to_string())
}

/// Validate a batch of new values for an axis.
/// Labels must be non-empty and unique against the axis and within the batch.
pub fn validate_new_values(axis: &OptionAxis, values: &[NewOptionValue]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();

    for value in values {
        let label = value.label.trim();
        if label.is_empty() {
            return Err(ValidationError::EmptyValueLabel);
        }
        if axis.has_label(label) || !seen.insert(label.to_lowercase()) {
            return Err(ValidationError::DuplicateValueLabel {
                axis_id: axis.axis_id,
                label: label.to_string(),
            });
        }
        if let Some(hex) = &value.color_hex {
            validate_color_hex(hex)?;
        }
    }

    Ok(())
}

/// Accepts `#RGB` and `#RRGGBB`
pub fn validate_color_hex(hex: &str) -> Result<(), ValidationError> {
    let digits = hex
        .strip_prefix('#')
        .ok_or_else(|| ValidationError::InvalidColorHex(hex.to_string()))?;

    if !matches!(digits.len(), 3 | 6) || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::InvalidColorHex(hex.to_string()));
    }

    Ok(())
}

pub fn validate_price(price: f64) -> Result<f64, ValidationError> {
    if !price.is_finite() || price < 0.0 {
        return Err(ValidationError::InvalidPrice(price.to_string()));
    }
    Ok(price)
}

pub fn validate_stock(stock: i64) -> Result<i64, ValidationError> {
    if stock < 0 {
        return Err(ValidationError::InvalidStock(stock.to_string()));
    }
    Ok(stock)
}

/// Parse a price typed into a form field
pub fn parse_price(raw: &str) -> Result<f64, ValidationError> {
    let trimmed = raw.trim();
    let price: f64 = trimmed
        .parse()
        .map_err(|_| ValidationError::InvalidPrice(trimmed.to_string()))?;
    validate_price(price).map_err(|_| ValidationError::InvalidPrice(trimmed.to_string()))
}

/// Parse a stock quantity typed into a form field
pub fn parse_stock(raw: &str) -> Result<i64, ValidationError> {
    let trimmed = raw.trim();
    let stock: i64 = trimmed
        .parse()
        .map_err(|_| ValidationError::InvalidStock(trimmed.to_string()))?;
    validate_stock(stock)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OptionValue;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("  Navy  Blue "), "navy-blue");
        assert_eq!(slugify("XL / Tall"), "xl-tall");
        assert_eq!(slugify("Größe"), "größe");
        assert_eq!(slugify("--"), "");
    }

    #[test]
    fn test_axis_name_rules() {
        let existing = vec![OptionAxis::new(1, "Color", 0)];
        assert_eq!(validate_axis_name("   ", &existing), Err(ValidationError::EmptyAxisName));
        assert_eq!(
            validate_axis_name(" color ", &existing),
            Err(ValidationError::DuplicateAxisName("color".to_string()))
        );
        assert_eq!(validate_axis_name(" Size ", &existing), Ok("Size".to_string()));
    }

    #[test]
    fn test_value_batch_rules() {
        let axis = OptionAxis::new(4, "Color", 0).with_values(vec![OptionValue::new(1, "Red", 0)]);

        let empty = vec![NewOptionValue::new(" ")];
        assert_eq!(validate_new_values(&axis, &empty), Err(ValidationError::EmptyValueLabel));

        let clash = vec![NewOptionValue::new("red")];
        assert!(matches!(
            validate_new_values(&axis, &clash),
            Err(ValidationError::DuplicateValueLabel { axis_id: 4, .. })
        ));

        let within_batch = vec![NewOptionValue::new("Green"), NewOptionValue::new("GREEN")];
        assert!(validate_new_values(&axis, &within_batch).is_err());

        let bad_color = vec![NewOptionValue::new("Teal").with_color("008080")];
        assert!(matches!(
            validate_new_values(&axis, &bad_color),
            Err(ValidationError::InvalidColorHex(_))
        ));

        let ok = vec![NewOptionValue::new("Teal").with_color("#008080"), NewOptionValue::new("Sand")];
        assert!(validate_new_values(&axis, &ok).is_ok());
    }

    #[test]
    fn test_price_and_stock_parsing() {
        assert_eq!(parse_price(" 19.99 "), Ok(19.99));
        assert!(parse_price("abc").is_err());
        assert!(parse_price("-1").is_err());
        assert!(parse_price("NaN").is_err());
        assert!(validate_price(f64::INFINITY).is_err());

        assert_eq!(parse_stock("50"), Ok(50));
        assert!(parse_stock("2.5").is_err());
        assert!(parse_stock("-3").is_err());
    }
}
