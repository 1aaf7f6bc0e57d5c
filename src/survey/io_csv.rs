// Primitives for reading CSV files.

use survey_charts::builder::Builder;

use crate::survey::*;

/// Reads a delimited file. The first row holds the questions, every following
/// row the answers of one respondent.
pub fn read_csv_table(path: &str, delimiter: u8) -> BSurveyResult<ResponseTable> {
    let rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let mut records = rdr.into_records();

    let header = records
        .next()
        .context(EmptyInputSnafu { path })?
        .context(CsvLineParseSnafu { lineno: 1_usize })?;
    let headers: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(idx, h)| {
            if idx == 0 {
                h.trim_start_matches('\u{feff}').to_string()
            } else {
                h.to_string()
            }
        })
        .collect();
    debug!("read_csv_table: headers: {:?}", headers);

    let mut builder = Builder::new(&headers).context(InvalidDashboardSnafu {})?;
    for (idx, line_r) in records.enumerate() {
        // The header is the first line.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        let cells: Vec<String> = line.iter().map(|s| s.to_string()).collect();
        debug!("read_csv_table: lineno: {:?} row: {:?}", lineno, &cells);
        builder.add_row(&cells).context(InvalidDashboardSnafu {})?;
    }
    let table = builder.build();
    info!(
        "read_csv_table: {:?}: {} respondents, {} questions",
        path,
        table.respondent_count(),
        table.num_columns()
    );
    Ok(table)
}
