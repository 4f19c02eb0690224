use fairval_core::{Multiple, PeStats, ReportingPeriod, Symbol, ValuationMethod};
use serde::Serialize;

use crate::cli::PeArgs;
use crate::error::CliError;

use super::{pipeline_failure, CommandContext, CommandResult};

#[derive(Debug, Serialize)]
struct PeResponseData {
    symbol: Symbol,
    method: ValuationMethod,
    period: ReportingPeriod,
    historical_multiple: Option<Multiple>,
    /// `null` when no fundamental data was available.
    pe_stats: Option<PeStats>,
}

pub async fn run(args: &PeArgs, context: &CommandContext) -> Result<CommandResult, CliError> {
    let request = context
        .valuation_request(&args.symbol, &args.valuation)?
        .with_pe_stats();

    let source_chain = context.pipeline.source_chain(request.include_fundamentals);
    let report = match context.pipeline.run(&request).await {
        Ok(report) => report,
        Err(error) => return pipeline_failure(error, source_chain),
    };

    let data = serde_json::to_value(PeResponseData {
        symbol: report.symbol,
        method: report.method,
        period: report.period,
        historical_multiple: report.historical_multiple,
        pe_stats: report.pe_stats,
    })?;

    Ok(CommandResult::ok(data, report.source_chain).with_warnings(report.warnings))
}
