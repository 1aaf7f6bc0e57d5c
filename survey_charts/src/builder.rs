pub use crate::config::*;
use crate::ResponseTable;

/// A builder for assembling a response table, one respondent at a time.
///
/// Blank cells are recorded as missing answers. Short rows are padded with
/// missing answers.
///
/// ```
/// pub use survey_charts::builder::Builder;
/// # use survey_charts::DashboardErrors;
///
/// let mut builder = Builder::new(&["Id".to_string(), "Do you use the catalogue?".to_string()])?;
///
/// builder.add_row(&["1".to_string(), "Yes".to_string()])?;
/// builder.add_row(&["2".to_string(), "".to_string()])?;
///
/// let table = builder.build();
/// assert_eq!(table.respondent_count(), 2);
///
/// # Ok::<(), DashboardErrors>(())
/// ```
pub struct Builder {
    pub(crate) _headers: Vec<String>,
    pub(crate) _columns: Vec<Vec<Option<String>>>,
    pub(crate) _num_rows: usize,
}

impl Builder {
    pub fn new(headers: &[String]) -> Result<Builder, DashboardErrors> {
        if headers.is_empty() {
            return Err(DashboardErrors::EmptyHeader);
        }
        Ok(Builder {
            _headers: headers.iter().map(|h| h.trim().to_string()).collect(),
            _columns: vec![Vec::new(); headers.len()],
            _num_rows: 0,
        })
    }

    /// Adds the answers of one respondent, given as raw text.
    pub fn add_row(&mut self, cells: &[String]) -> Result<(), DashboardErrors> {
        let parsed: Vec<Option<String>> = cells.iter().map(|c| Some(c.clone())).collect();
        self.add_row_cells(&parsed)
    }

    /// Adds the answers of one respondent. `None` is a missing answer.
    pub fn add_row_cells(&mut self, cells: &[Option<String>]) -> Result<(), DashboardErrors> {
        let num_columns = self._headers.len();
        if cells.len() > num_columns {
            return Err(DashboardErrors::RaggedRow {
                row: self._num_rows + 1,
                num_cells: cells.len(),
                num_columns,
            });
        }
        for (idx, column) in self._columns.iter_mut().enumerate() {
            let cell = match cells.get(idx) {
                Some(Some(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
                _ => None,
            };
            column.push(cell);
        }
        self._num_rows += 1;
        Ok(())
    }

    pub fn build(self) -> ResponseTable {
        ResponseTable {
            headers: self._headers,
            columns: self._columns,
            num_rows: self._num_rows,
        }
    }
}
