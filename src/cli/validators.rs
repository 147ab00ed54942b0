//! CLI argument validators.
//!
//! Shared validation functions for CLI argument parsing.

fn parse_number<T: std::str::FromStr>(s: &str) -> Result<T, String> {
    s.parse()
        .map_err(|_| format!("'{s}' is not a valid number"))
}

/// Parse a finite, non-negative number of seconds.
pub fn parse_non_negative_f64(s: &str) -> Result<f64, String> {
    let value: f64 = parse_number(s)?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("value must be non-negative, got {value}"));
    }
    Ok(value)
}

/// Parse a finite, strictly positive number of seconds.
pub fn parse_positive_f64(s: &str) -> Result<f64, String> {
    let value: f64 = parse_number(s)?;
    if !value.is_finite() || value <= 0.0 {
        return Err(format!("value must be greater than 0, got {value}"));
    }
    Ok(value)
}

/// Parse a finite, non-negative weight.
pub fn parse_non_negative_f32(s: &str) -> Result<f32, String> {
    let value: f32 = parse_number(s)?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("value must be non-negative, got {value}"));
    }
    Ok(value)
}

/// Parse a count of at least 1.
pub fn parse_positive_usize(s: &str) -> Result<usize, String> {
    let value: usize = parse_number(s)?;
    if value == 0 {
        return Err("value must be at least 1".to_string());
    }
    Ok(value)
}
