use fairval_core::{Cagr, DashboardRequest, Symbol};
use serde::Serialize;

use crate::cli::CagrArgs;
use crate::error::CliError;

use super::{issue_errors, parse_range, pipeline_failure, CommandContext, CommandResult};

#[derive(Debug, Serialize)]
struct CagrResponseData {
    symbol: Symbol,
    cagr: Option<Cagr>,
}

pub async fn run(args: &CagrArgs, context: &CommandContext) -> Result<CommandResult, CliError> {
    let symbol = Symbol::parse(&args.symbol)?;
    let range = parse_range(&args.start, &args.end)?;
    let request = DashboardRequest::new(symbol, context.as_of)
        .price_only()
        .with_cagr(range);

    let source_chain = context.pipeline.source_chain(request.include_fundamentals);
    let report = match context.pipeline.run(&request).await {
        Ok(report) => report,
        Err(error) => return pipeline_failure(error, source_chain),
    };

    let errors = issue_errors(report.issues)?;
    let data = serde_json::to_value(CagrResponseData {
        symbol: report.symbol,
        cagr: report.cagr,
    })?;

    Ok(CommandResult::ok(data, report.source_chain)
        .with_warnings(report.warnings)
        .with_errors(errors))
}
