use calamine::{open_workbook, DataType, Reader, Xlsx};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use survey_charts::builder::Builder;

use crate::survey::*;

/// Reads the export of Microsoft Forms (or Google Forms saved as Excel).
///
/// The first row of the worksheet holds the questions.
pub fn read_msforms_table(path: &str, worksheet_name: Option<&str>) -> BSurveyResult<ResponseTable> {
    let wrange = get_range(path, worksheet_name)?;

    let mut rows = wrange.rows();
    let header = rows.next().context(EmptyExcelSnafu {})?;
    let headers: Vec<String> = header
        .iter()
        .map(|cell| read_cell(1, cell).map(|c| c.unwrap_or_default()))
        .collect::<SurveyResult<Vec<String>>>()?;
    debug!("read_msforms_table: header: {:?}", headers);

    let mut builder = Builder::new(&headers).context(InvalidDashboardSnafu {})?;
    for (idx, row) in rows.enumerate() {
        let cells: Vec<Option<String>> = row
            .iter()
            .map(|cell| read_cell(idx + 2, cell))
            .collect::<SurveyResult<Vec<Option<String>>>>()?;
        debug!("read_msforms_table: idx: {:?} row: {:?}", idx, &cells);
        builder.add_row_cells(&cells).context(InvalidDashboardSnafu {})?;
    }
    let table = builder.build();
    info!(
        "read_msforms_table: {:?}: {} respondents, {} questions",
        path,
        table.respondent_count(),
        table.num_columns()
    );
    Ok(table)
}

/// The text of a cell. Integral numbers are written without decimals, dates
/// as `%Y-%m-%d %H:%M`.
fn read_cell(lineno: usize, cell: &DataType) -> SurveyResult<Option<String>> {
    match cell {
        DataType::DateTime(serial) => match excel_datetime(*serial) {
            Some(dt) => Ok(Some(dt.format("%Y-%m-%d %H:%M").to_string())),
            None => ExcelWrongCellTypeSnafu {
                lineno: lineno as u64,
                content: format!("{:?}", cell),
            }
            .fail(),
        },
        DataType::Empty => Ok(None),
        DataType::String(s) => Ok(Some(s.clone())),
        DataType::Int(i) => Ok(Some(i.to_string())),
        DataType::Float(f) if f.fract() == 0.0 && f.is_finite() => {
            Ok(Some(format!("{}", *f as i64)))
        }
        DataType::Float(f) => Ok(Some(f.to_string())),
        DataType::Bool(b) => Ok(Some(b.to_string())),
        _ => ExcelWrongCellTypeSnafu {
            lineno: lineno as u64,
            content: format!("{:?}", cell),
        }
        .fail(),
    }
}

// Excel stores dates as a number of days since 1899-12-30.
fn excel_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let seconds = (serial * 86_400.0).round();
    if seconds > i64::MAX as f64 / 1000.0 {
        return None;
    }
    epoch.checked_add_signed(Duration::seconds(seconds as i64))
}

fn get_range(path: &str, worksheet_name: Option<&str>) -> BSurveyResult<calamine::Range<DataType>> {
    debug!(
        "read_excel_file: path: {:?} worksheet: {:?}",
        path, worksheet_name
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    let wrange = if let Some(name) = worksheet_name {
        workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { name })?
            .context(OpeningExcelSnafu { path })?
    } else {
        workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu {})?
            .context(OpeningExcelSnafu { path })?
    };
    Ok(wrange)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells() {
        assert_eq!(read_cell(1, &DataType::Empty).unwrap(), None);
        assert_eq!(
            read_cell(1, &DataType::Float(4.0)).unwrap().as_deref(),
            Some("4")
        );
        assert_eq!(
            read_cell(1, &DataType::Float(2.5)).unwrap().as_deref(),
            Some("2.5")
        );
        assert_eq!(
            read_cell(1, &DataType::String("Yes".to_string()))
                .unwrap()
                .as_deref(),
            Some("Yes")
        );
        assert!(read_cell(3, &DataType::Error(calamine::CellErrorType::Div0)).is_err());
    }

    #[test]
    fn date_cells() {
        assert_eq!(
            read_cell(2, &DataType::DateTime(45245.5)).unwrap().as_deref(),
            Some("2023-11-15 12:00")
        );
        assert_eq!(
            read_cell(2, &DataType::DateTime(45000.0)).unwrap().as_deref(),
            Some("2023-03-15 00:00")
        );
        assert!(matches!(
            read_cell(4, &DataType::DateTime(-1.0)),
            Err(SurveyError::ExcelWrongCellType { lineno: 4, .. })
        ));
    }

    #[test]
    fn missing_workbook() {
        let res = read_msforms_table("no_such_file.xlsx", None);
        assert!(matches!(
            res.map_err(|e| *e),
            Err(SurveyError::OpeningExcel { .. })
        ));
    }
}
