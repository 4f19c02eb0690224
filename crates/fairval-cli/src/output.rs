use std::io::{self, Write};

use fairval_core::Envelope;
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::error::CliError;

pub fn render(
    envelope: &Envelope<Value>,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(envelope)?
            } else {
                serde_json::to_string(envelope)?
            };
            writeln!(out, "{payload}")?;
        }
        OutputFormat::Table => write_table(&mut out, envelope)?,
    }

    Ok(())
}

pub fn write_table(out: &mut impl Write, envelope: &Envelope<Value>) -> Result<(), CliError> {
    writeln!(out, "request_id  : {}", envelope.meta.request_id)?;
    writeln!(out, "schema      : {}", envelope.meta.schema_version)?;
    writeln!(out, "generated_at: {}", envelope.meta.generated_at)?;
    writeln!(
        out,
        "sources     : {}",
        envelope
            .meta
            .source_chain
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(",")
    )?;
    writeln!(out, "latency_ms  : {}", envelope.meta.latency_ms)?;

    if !envelope.meta.warnings.is_empty() {
        writeln!(out, "warnings:")?;
        for warning in &envelope.meta.warnings {
            writeln!(out, "  - {warning}")?;
        }
    }

    let data = &envelope.data;
    if let Some(chart) = data.get("chart") {
        write_chart(out, chart)?;
    }
    if let Some(lines) = data.get("fair_values").and_then(Value::as_array) {
        write_fair_values(out, lines)?;
    }
    if let Some(multiple) = data.get("historical_multiple").and_then(Value::as_f64) {
        writeln!(out, "historical multiple: {multiple:.2}")?;
    }
    if let Some(stats) = data.get("pe_stats").filter(|stats| !stats.is_null()) {
        write_pe_stats(out, stats)?;
    }
    if let Some(cagr) = data.get("cagr").filter(|cagr| !cagr.is_null()) {
        write_cagr(out, cagr)?;
    }

    if !envelope.errors.is_empty() {
        writeln!(out, "errors:")?;
        for error in &envelope.errors {
            writeln!(out, "  - {}: {}", error.code, error.message)?;
        }
    }

    Ok(())
}

fn write_chart(out: &mut impl Write, chart: &Value) -> io::Result<()> {
    writeln!(out, "chart       : {}", text(chart, "title"))?;
    if chart.get("log_scale").and_then(Value::as_bool) == Some(true) {
        writeln!(out, "y axis      : log")?;
    }
    if let Some(view) = chart.get("view") {
        writeln!(out, "view        : {} to {}", text(view, "start"), text(view, "end"))?;
    }

    let series = chart.get("series").and_then(Value::as_array);
    for line in series.into_iter().flatten() {
        let points = line.get("points").and_then(Value::as_array);
        writeln!(
            out,
            "  {:<32} {:<6} {:<7} {} points",
            text(line, "label"),
            text(line, "style"),
            text(line, "color"),
            points.map_or(0, Vec::len)
        )?;
    }
    Ok(())
}

fn write_fair_values(out: &mut impl Write, lines: &[Value]) -> io::Result<()> {
    for line in lines {
        let latest = line
            .get("points")
            .and_then(Value::as_array)
            .and_then(|points| points.last());
        match latest {
            Some(point) => writeln!(
                out,
                "  {} ({}): latest {:.2} on {}",
                text(line, "label"),
                text(line, "origin"),
                point.get("value").and_then(Value::as_f64).unwrap_or(f64::NAN),
                text(point, "date")
            )?,
            None => writeln!(out, "  {} ({}): no points", text(line, "label"), text(line, "origin"))?,
        }
    }
    Ok(())
}

fn write_pe_stats(out: &mut impl Write, stats: &Value) -> io::Result<()> {
    writeln!(out, "P/E as of {}:", text(stats, "as_of"))?;
    let windows = stats.get("windows").and_then(Value::as_array);
    for window in windows.into_iter().flatten() {
        let count = window.get("count").and_then(Value::as_u64).unwrap_or(0);
        match window.get("mean").and_then(Value::as_f64) {
            Some(mean) => writeln!(
                out,
                "  {:<14} {:>8.2}  (n={count})",
                window_label(text(window, "window")),
                mean
            )?,
            None => writeln!(
                out,
                "  {:<14} {:>8}",
                window_label(text(window, "window")),
                "no data"
            )?,
        }
    }
    Ok(())
}

fn write_cagr(out: &mut impl Write, cagr: &Value) -> io::Result<()> {
    let number = |key: &str| cagr.get(key).and_then(Value::as_f64).unwrap_or(f64::NAN);
    writeln!(
        out,
        "CAGR {} to {}: {:.2}% ({:.2} -> {:.2} over {:.2} years)",
        text(cagr, "start"),
        text(cagr, "end"),
        number("rate") * 100.0,
        number("start_price"),
        number("end_price"),
        number("years")
    )
}

fn window_label(window: &str) -> &str {
    match window {
        "all_history" => "All history",
        "ten_years" => "Last 10 years",
        "five_years" => "Last 5 years",
        "three_years" => "Last 3 years",
        other => other,
    }
}

fn text<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or("-")
}
