use super::{analyze_project, load_project, terminal_report};
use crate::cli::OutputFormat;
use crate::core::EndpointDescriptor;
use anyhow::Result;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

pub struct RoutesConfig {
    pub path: PathBuf,
    pub config: Option<PathBuf>,
    pub format: OutputFormat,
}

/// One registered endpoint as shown by `routegen routes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteRow {
    pub verb: String,
    pub route: String,
    pub name: String,
    pub handler: String,
    pub status: u16,
    pub payload: String,
    pub location: String,
}

impl From<&EndpointDescriptor> for RouteRow {
    fn from(endpoint: &EndpointDescriptor) -> Self {
        Self {
            verb: endpoint.verb.clone(),
            route: endpoint.route.raw.clone(),
            name: endpoint.effective_name(),
            handler: endpoint.qualified_name(),
            status: endpoint.success_status,
            payload: endpoint.payload_type.clone(),
            location: endpoint.location.to_string(),
        }
    }
}

pub fn route_table(rows: &[RouteRow]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Verb", "Route", "Name", "Handler", "Status", "Payload"]);
    for row in rows {
        table.add_row(vec![
            row.verb.clone(),
            row.route.clone(),
            row.name.clone(),
            row.handler.clone(),
            row.status.to_string(),
            row.payload.clone(),
        ]);
    }
    table
}

/// List the endpoints that survive analysis and duplicate detection.
/// Diagnostics go to stderr; the list itself never fails the command.
pub fn list_routes(config: RoutesConfig) -> Result<ExitCode> {
    let project = load_project(&config.path, config.config.as_deref())?;
    let output = analyze_project(&project)?;
    let rows: Vec<RouteRow> = output.endpoints.iter().map(RouteRow::from).collect();

    match config.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Terminal => {
            println!("{}", route_table(&rows));
            if !output.diagnostics.is_empty() {
                eprint!("{}", terminal_report(&output.diagnostics));
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
