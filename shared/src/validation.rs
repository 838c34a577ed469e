//! Validation utilities for the SMI Weather Alert Platform
//!
//! Includes Brazil-friendly phone validation for WhatsApp delivery.

use rust_decimal::Decimal;

use crate::models::AlertKind;

// ============================================================================
// Alert Rule Validations
// ============================================================================

/// Validate an hour of day is in `[0, 23]`
pub fn validate_hour(hour: u32) -> Result<(), &'static str> {
    if hour > 23 {
        return Err("Hour must be between 0 and 23");
    }
    Ok(())
}

/// Validate both ends of an alert window
pub fn validate_alert_window(start_hour: u32, end_hour: u32) -> Result<(), &'static str> {
    validate_hour(start_hour)?;
    validate_hour(end_hour)?;
    Ok(())
}

/// Validate a trigger threshold for its metric
///
/// Rain and wind thresholds are magnitudes and cannot be negative;
/// temperature thresholds may be any finite value.
pub fn validate_threshold(kind: AlertKind, threshold: Decimal) -> Result<(), &'static str> {
    match kind {
        AlertKind::Rain | AlertKind::Wind => {
            if threshold < Decimal::ZERO {
                return Err("Threshold cannot be negative for this alert kind");
            }
            Ok(())
        }
        AlertKind::Temperature => Ok(()),
    }
}

// ============================================================================
// Contact Validations
// ============================================================================

/// Validate a phone number can address a WhatsApp recipient
/// Accepts: +5587999990000, 5587999990000, (87) 99999-0000, 87999990000
pub fn validate_phone(phone: &str) -> Result<(), &'static str> {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.is_empty() {
        return Err("Phone number is required");
    }
    if digits.len() < 8 {
        return Err("Phone number is too short");
    }
    if digits.len() > 15 {
        return Err("Phone number is too long");
    }
    let allowed = |c: char| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')');
    if !phone.chars().all(allowed) {
        return Err("Phone number contains invalid characters");
    }
    Ok(())
}

// ============================================================================
// Coordinate Validations
// ============================================================================

/// Validate a latitude is on the globe
pub fn validate_latitude(latitude: Decimal) -> Result<(), &'static str> {
    if latitude < Decimal::from(-90) || latitude > Decimal::from(90) {
        return Err("Latitude must be between -90 and 90");
    }
    Ok(())
}

/// Validate a longitude is on the globe
pub fn validate_longitude(longitude: Decimal) -> Result<(), &'static str> {
    if longitude < Decimal::from(-180) || longitude > Decimal::from(180) {
        return Err("Longitude must be between -180 and 180");
    }
    Ok(())
}
