use fairval_core::domain::calendar::parse_date;
use fairval_core::{DashboardReport, DateRange, Multiple};
use serde_json::Value;
use time::Date;

use crate::cli::ChartArgs;
use crate::error::CliError;

use super::{issue_errors, parse_range, pipeline_failure, CommandContext, CommandResult};

pub async fn run(args: &ChartArgs, context: &CommandContext) -> Result<CommandResult, CliError> {
    let mut request = context
        .valuation_request(&args.symbol, &args.valuation)?
        .with_log_scale(args.log_scale);

    if let Some(multiple) = args.multiple {
        request = request.with_multiple(Multiple::new(multiple)?);
    }
    if let Some(multiple) = args.second_multiple {
        request = request.with_second_multiple(Multiple::new(multiple)?);
    }
    if let Some(view) = view_range(args, context.as_of)? {
        request = request.with_view(view);
    }
    if args.pe_stats {
        request = request.with_pe_stats();
    }
    if let (Some(start), Some(end)) = (&args.cagr_start, &args.cagr_end) {
        request = request.with_cagr(parse_range(start, end)?);
    }

    let source_chain = context.pipeline.source_chain(request.include_fundamentals);
    match context.pipeline.run(&request).await {
        Ok(report) => report_result(report),
        Err(error) => pipeline_failure(error, source_chain),
    }
}

/// Open-ended bounds fall back to the widest range; the pipeline clamps it.
fn view_range(args: &ChartArgs, as_of: Date) -> Result<Option<DateRange>, CliError> {
    if args.from.is_none() && args.to.is_none() {
        return Ok(None);
    }
    let start = args.from.as_deref().map(parse_date).transpose()?;
    let end = args.to.as_deref().map(parse_date).transpose()?;
    Ok(Some(DateRange::new(
        start.unwrap_or(Date::MIN),
        end.unwrap_or(as_of),
    )?))
}

fn report_result(mut report: DashboardReport) -> Result<CommandResult, CliError> {
    let warnings = std::mem::take(&mut report.warnings);
    let errors = issue_errors(std::mem::take(&mut report.issues))?;
    let source_chain = report.source_chain.clone();
    let data: Value = serde_json::to_value(report)?;

    Ok(CommandResult::ok(data, source_chain)
        .with_warnings(warnings)
        .with_errors(errors))
}
