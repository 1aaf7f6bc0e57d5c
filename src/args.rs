use clap::Parser;

/// This program turns the export of a survey into the charts of a dashboard.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file describing the dashboard: input file, legends, answer types
    /// and sections. Without it, every column is classified from its answers and shown in a single section.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) A reference file containing the expected output in JSON format. If provided, surveydash will
    /// check that the computed charts match the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the charts will be written in JSON format to the given
    /// location. By default, they are printed on the standard output.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) If specified, the survey answers are read from this file. Setting this option
    /// overrides the path that may be specified in the configuration.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default csv) The type of the input: csv or msforms (Excel export).
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (default ;) The field delimiter of a CSV input.
    #[clap(short, long, value_parser)]
    pub delimiter: Option<String>,

    /// (repeatable, default all) The name of a section to render.
    #[clap(short, long, value_parser)]
    pub section: Vec<String>,

    /// When using an Excel file, indicates the name of the worksheet to use (default: the first one).
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
