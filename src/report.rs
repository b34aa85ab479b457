//! Plain-text rendering of a selection for the terminal.

use std::fmt::Write;

use crate::data::model::Identifier;
use crate::forecast::ForecastPoint;
use crate::state::Selection;

/// `$1,234.56`, with a leading minus for negative amounts. Non-finite
/// amounts render as `n/a`.
pub fn format_currency(amount: f64) -> String {
    if !amount.is_finite() {
        return "n/a".to_string();
    }
    let cents = (amount.abs() * 100.0).round() as u128;
    let (whole, frac) = (cents / 100, cents % 100);

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{frac:02}")
}

/// Comma-separated identifier list.
pub fn render_ids(label: &str, ids: &[Identifier]) -> String {
    let joined = ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("{label} ({}): {joined}", ids.len())
}

/// Summary block followed by the forecast table or the reason it is missing.
pub fn render_selection(selection: &Selection) -> String {
    let mut out = String::new();
    let s = &selection.summary;

    let _ = writeln!(out, "Store:            {}", selection.series.store);
    let _ = writeln!(out, "Department:       {}", selection.series.dept);
    let _ = writeln!(out, "Total Sales:      {}", format_currency(s.total_sales));
    let _ = writeln!(
        out,
        "Avg Weekly Sales: {}",
        s.avg_sales.map(format_currency).unwrap_or_else(|| "n/a".into())
    );
    let _ = writeln!(out, "Weeks:            {}", s.num_weeks);
    out.push('\n');

    match &selection.forecast {
        Ok(points) => out.push_str(&render_forecast(points)),
        Err(e) => {
            let _ = writeln!(out, "{}", e.user_message());
        }
    }
    out
}

pub fn render_forecast(points: &[ForecastPoint]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<12} {:>14} {:>14} {:>14}",
        "ds", "yhat_lower", "yhat", "yhat_upper"
    );
    for p in points {
        let _ = writeln!(
            out,
            "{:<12} {:>14.2} {:>14.2} {:>14.2}",
            p.ds.to_string(),
            p.yhat_lower,
            p.yhat,
            p.yhat_upper
        );
    }
    out
}
