// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::{Context, Result};
use chrono::Local;
use csv::Writer;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::chart::{ChartData, PointKind};
use crate::models::HistoryResponse;
use crate::rates::RateService;

/// Write one row per series point, flagging the extrema.
pub fn write_history_csv<W: Write>(history: &HistoryResponse, out: W) -> Result<()> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(["Date", "Value", "Extremum"])?;

    if let Some(data) = ChartData::from_series(&history.series) {
        for ((label, value), kind) in data.labels.iter().zip(&data.values).zip(&data.kinds) {
            let extremum = match kind {
                PointKind::Max => "max",
                PointKind::Min => "min",
                PointKind::Default => "",
            };
            let value = value.to_string();
            writer.write_record([label.as_str(), value.as_str(), extremum])?;
        }
    }

    writer.flush()?;
    Ok(())
}

/// Export the historical series of `code` to a timestamped CSV file
pub async fn export_history_csv(
    rates: &mut RateService,
    code: &str,
    output_dir: &Path,
) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)?;

    println!("Fetching historical values for {}...", code);
    let history = rates
        .fetch_history(code)
        .await
        .with_context(|| format!("Failed to fetch history for {}", code))?;
    println!(
        "✅ {} points fetched for {}",
        history.series.len(),
        history.name.as_deref().unwrap_or(code)
    );

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let filename = output_dir.join(format!("history_{}_{}.csv", code, timestamp));
    let file = fs::File::create(&filename)
        .with_context(|| format!("Failed to create {}", filename.display()))?;
    write_history_csv(&history, file)?;

    println!("✅ History written to {}", filename.display());
    Ok(filename)
}
