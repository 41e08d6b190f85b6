//! Setting value validation.

/// Validate a setting value. Returns `Ok(())` if valid, or an error message.
pub fn validate_setting(key: &str, value: &str) -> Result<(), String> {
    match key {
        "SERVER_PORT" => validate_int_range(value, 1, 65535)?,
        "LOGO_FETCH_TIMEOUT_SECS" => validate_int_range(value, 1, 60)?,
        "LOGO_MAX_BYTES" => validate_int_range(value, 1024, 50 * 1024 * 1024)?,
        "ANALYTICS_TIMEOUT_MS" => validate_int_range(value, 50, 60_000)?,
        "MAX_BOX_SIZE" => validate_int_range(value, 1, 100)?,
        "QR_SERVICE_DATA_DIR" | "QR_SERVICE_DB_PATH" => {
            if value.trim().is_empty() {
                return Err("path must not be empty".into());
            }
        }
        _ => {}
    }
    Ok(())
}

fn validate_int_range(value: &str, min: i64, max: i64) -> Result<(), String> {
    let v: i64 = value.parse().map_err(|_| "must be an integer")?;
    if v < min || v > max {
        return Err(format!("must be between {min} and {max}"));
    }
    Ok(())
}
