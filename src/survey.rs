use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use survey_charts::*;

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::survey::config_reader::*;
use crate::survey::io_common::*;

mod config_reader;
mod io_common;
mod io_csv;
mod io_msforms;

#[derive(Debug, Snafu)]
pub enum SurveyError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON content"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing file {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Cannot read the modification date of {path}"))]
    ReadingMetadata {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error parsing CSV line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("The file {path} has no header row"))]
    EmptyInput { path: String },
    #[snafu(display("Error opening Excel file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The Excel file has no worksheet or no header row"))]
    EmptyExcel {},
    #[snafu(display("The Excel file has no worksheet named {name}"))]
    MissingWorksheet { name: String },
    #[snafu(display("Unexpected cell at line {lineno}: {content}"))]
    ExcelWrongCellType { lineno: u64, content: String },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("No input file: pass --input or a configuration with an inputSource"))]
    MissingInput {},
    #[snafu(display("Unknown input type {provider}"))]
    UnknownProvider { provider: String },
    #[snafu(display("Cannot read the column reference {value}"))]
    ParsingColumnRef { value: String },
    #[snafu(display("Invalid dashboard: {source}"))]
    InvalidDashboard { source: DashboardErrors },
    #[snafu(display("Difference detected between the computed charts and the reference {path}"))]
    ReferenceMismatch { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

type SurveyResult<T> = Result<T, SurveyError>;
type BSurveyResult<T> = Result<T, Box<SurveyError>>;

/// Where and how to read the answers.
#[derive(Eq, PartialEq, Debug, Clone)]
struct TableSource {
    provider: String,
    path: String,
    delimiter: u8,
    worksheet_name: Option<String>,
}

fn table_source(
    args: &Args,
    config: Option<&SurveyConfig>,
    config_dir: &Path,
) -> SurveyResult<TableSource> {
    let input = config.and_then(|c| c.input_source.as_ref());
    let path: String = match (&args.input, input) {
        (Some(p), _) => p.clone(),
        (None, Some(cfs)) => {
            let p: PathBuf = [config_dir, Path::new(&cfs.file_path)].iter().collect();
            p.as_path().display().to_string()
        }
        (None, None) => return MissingInputSnafu {}.fail(),
    };
    let provider = args
        .input_type
        .clone()
        .or_else(|| input.and_then(|cfs| cfs.provider.clone()))
        .unwrap_or_else(|| "csv".to_string());
    let delimiter_s = args
        .delimiter
        .clone()
        .or_else(|| input.and_then(|cfs| cfs.delimiter.clone()))
        .unwrap_or_else(|| ";".to_string());
    let worksheet_name = args
        .excel_worksheet_name
        .clone()
        .or_else(|| input.and_then(|cfs| cfs.excel_worksheet_name.clone()));
    Ok(TableSource {
        provider,
        path,
        delimiter: read_delimiter(&delimiter_s)?,
        worksheet_name,
    })
}

fn read_table(source: &TableSource) -> BSurveyResult<ResponseTable> {
    info!(
        "Attempting to read {} file {:?}",
        source.provider, source.path
    );
    let table = match source.provider.as_str() {
        "csv" => io_csv::read_csv_table(&source.path, source.delimiter)?,
        "msforms" => io_msforms::read_msforms_table(&source.path, source.worksheet_name.as_deref())?,
        x => UnknownProviderSnafu { provider: x }.fail()?,
    };
    Ok(table)
}

fn output_config(
    config: Option<&SurveyConfig>,
    source: &TableSource,
    dashboard: &Dashboard,
) -> SurveyResult<OutputConfig> {
    let settings = config.and_then(|c| c.output_settings.as_ref());
    let title = match settings.and_then(|s| s.dashboard_title.clone()) {
        Some(t) => t,
        None => simplify_file_name(&source.path),
    };
    let as_of_date = match settings.and_then(|s| s.as_of_date.clone()) {
        Some(d) => d,
        None => modification_date(&source.path)?,
    };
    Ok(OutputConfig {
        title,
        as_of_date,
        respondents: dashboard.respondent_count(),
        questions: dashboard.table().num_columns(),
    })
}

fn chart_to_json(output: &ChartOutput) -> JSValue {
    match output {
        ChartOutput::Chart(spec) => json!({
            "kind": spec.kind.name(),
            "title": spec.title,
            "labels": spec.labels,
            "values": spec.values,
            "colors": spec.colors,
            "orientation": spec.orientation.name(),
        }),
        ChartOutput::Placeholder { title, message } => json!({
            "kind": "placeholder",
            "title": title,
            "message": message,
        }),
    }
}

fn section_to_json(view: &SectionView, table: &ResponseTable) -> JSValue {
    let panels: Vec<JSValue> = view
        .panels
        .iter()
        .map(|panel| {
            let question = panel
                .position
                .and_then(|p| table.question(p))
                .map(|q| q.name.to_string());
            json!({
                "position": panel.position,
                "question": question,
                "answerType": panel.answer_type.as_ref().map(|t| t.name()),
                "chart": chart_to_json(&panel.output),
            })
        })
        .collect();
    json!({
        "name": view.name,
        "subtitle": view.subtitle,
        "panels": panels,
    })
}

/// Renders the requested sections (all of them when none is requested).
fn build_dashboard_js(
    dashboard: &Dashboard,
    output: &OutputConfig,
    requested: &[String],
) -> SurveyResult<JSValue> {
    let names: Vec<String> = if requested.is_empty() {
        dashboard
            .section_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    } else {
        requested.to_vec()
    };
    let mut sections: Vec<JSValue> = Vec::new();
    for name in names.iter() {
        let view = dashboard
            .render_section(name)
            .context(InvalidDashboardSnafu {})?;
        debug!("build_dashboard_js: {:?}: {} panels", name, view.panels.len());
        sections.push(section_to_json(&view, dashboard.table()));
    }
    Ok(json!({
        "config": output,
        "sections": sections,
    }))
}

fn write_output(out: Option<&str>, content: &str) -> SurveyResult<()> {
    match out {
        None | Some("stdout") => {
            println!("{}", content);
        }
        Some(path) => {
            fs::write(path, content).context(WritingOutputSnafu { path })?;
            info!("Charts written to {:?}", path);
        }
    }
    Ok(())
}

fn check_reference(reference_path: &str, pretty_js: &str) -> BSurveyResult<()> {
    let summary_ref = read_summary(reference_path)?;
    let pretty_js_ref = serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_ref != pretty_js {
        warn!("Found differences with the reference file");
        print_diff(pretty_js_ref.as_str(), pretty_js, "\n");
        return ReferenceMismatchSnafu {
            path: reference_path,
        }
        .fail()
        .map_err(Box::new);
    }
    Ok(())
}

/// Loads the answers, builds the dashboard and writes the charts of the
/// requested sections as a single JSON document.
pub fn run_dashboard(args: &Args) -> BSurveyResult<()> {
    let (config, config_dir): (Option<SurveyConfig>, PathBuf) = match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let dir = Path::new(config_path)
                .parent()
                .context(MissingParentDirSnafu {})?
                .to_path_buf();
            (Some(config), dir)
        }
        None => (None, PathBuf::new()),
    };

    let dashboard_config = match &config {
        Some(c) => validate_config(c)?,
        None => DashboardConfig::default(),
    };

    let source = table_source(args, config.as_ref(), &config_dir)?;
    let table = read_table(&source)?;

    let dashboard = Dashboard::new(table, dashboard_config).context(InvalidDashboardSnafu {})?;
    debug!("run_dashboard: requested sections: {:?}", args.section);

    let output = output_config(config.as_ref(), &source, &dashboard)?;
    let result_js = build_dashboard_js(&dashboard, &output, &args.section)?;
    let pretty_js = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;

    write_output(args.out.as_deref(), &pretty_js)?;

    // The reference output, if provided for comparison
    if let Some(reference_path) = &args.reference {
        check_reference(reference_path, &pretty_js)?;
    }

    Ok(())
}
