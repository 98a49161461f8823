// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use crate::error::{AppError, Result};
use crate::models::CurrencyTable;

/// Parse the amount field. Only finite values greater than zero are accepted.
pub fn parse_amount(input: &str) -> Result<f64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput("amount empty".to_string()));
    }

    match trimmed.parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount > 0.0 => Ok(amount),
        _ => Err(AppError::InvalidInput(trimmed.to_string())),
    }
}

/// Convert `amount` into units of `code`.
///
/// Returns the unrounded quotient `amount / table[code].value`; rounding to
/// two decimals is left to [`format_result`].
pub fn convert(amount: f64, code: &str, table: &CurrencyTable) -> Result<f64> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(AppError::InvalidInput(amount.to_string()));
    }
    if code.is_empty() {
        return Err(AppError::InvalidInput("currency not selected".to_string()));
    }

    let rate = table
        .get(code)
        .and_then(|record| record.value)
        .filter(|value| value.is_finite() && *value != 0.0)
        .ok_or_else(|| AppError::RateUnavailable(code.to_string()))?;

    Ok(amount / rate)
}

/// Results panel text for a successful conversion.
pub fn format_result(value: f64, currency_name: &str) -> String {
    format!("Valor Convertido: {:.2} {}", value, currency_name)
}
