use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use crate::core::trace::{Trace, make_scatter};
use crate::error::{FigureError, FigureResult};

/// Either one setting shared by every file or one setting per file.
#[derive(Debug, Clone, PartialEq)]
pub enum PerFile<T> {
    All(T),
    Each(Vec<T>),
}

impl<T: Copy> PerFile<T> {
    fn resolve(&self, file_count: usize, what: &str) -> FigureResult<Vec<T>> {
        match self {
            Self::All(value) => Ok(vec![*value; file_count]),
            Self::Each(values) if values.len() == file_count => Ok(values.clone()),
            Self::Each(values) => Err(FigureError::InvalidData(format!(
                "{what}: expected {file_count} entries, got {}",
                values.len()
            ))),
        }
    }
}

impl<T> From<T> for PerFile<T> {
    fn from(value: T) -> Self {
        Self::All(value)
    }
}

/// Row window and column selection for [`read_plain_text`].
///
/// Rows are 1-based and inclusive on both ends; columns are 0-based.
#[derive(Debug, Clone, PartialEq)]
pub struct PlainTextSelection {
    pub min_row: usize,
    pub max_row: usize,
    pub x_column: PerFile<usize>,
    pub y_column: PerFile<usize>,
    pub x_scale: PerFile<f64>,
    pub y_scale: PerFile<f64>,
}

impl PlainTextSelection {
    #[must_use]
    pub fn new(min_row: usize, max_row: usize, x_column: usize, y_column: usize) -> Self {
        Self {
            min_row,
            max_row,
            x_column: PerFile::All(x_column),
            y_column: PerFile::All(y_column),
            x_scale: PerFile::All(1.0),
            y_scale: PerFile::All(1.0),
        }
    }

    #[must_use]
    pub fn with_columns(mut self, x_column: PerFile<usize>, y_column: PerFile<usize>) -> Self {
        self.x_column = x_column;
        self.y_column = y_column;
        self
    }

    #[must_use]
    pub fn with_scale(mut self, x_scale: PerFile<f64>, y_scale: PerFile<f64>) -> Self {
        self.x_scale = x_scale;
        self.y_scale = y_scale;
        self
    }
}

/// X/Y columns read from a set of files, one series per file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlainTextColumns {
    pub xs: Vec<Vec<f64>>,
    pub ys: Vec<Vec<f64>>,
}

impl PlainTextColumns {
    /// Builds one scatter trace per series; `names` become legend entries.
    pub fn into_scatter_traces(self, names: &[&str]) -> FigureResult<Vec<Trace>> {
        let maps = self
            .xs
            .into_iter()
            .zip(self.ys)
            .enumerate()
            .map(|(index, (x, y))| {
                let mut attrs = Map::new();
                attrs.insert("x".to_owned(), Value::from(x));
                attrs.insert("y".to_owned(), Value::from(y));
                attrs.insert("mode".to_owned(), Value::from("lines"));
                if let Some(name) = names.get(index) {
                    attrs.insert("name".to_owned(), Value::from(*name));
                }
                Value::Object(attrs)
            })
            .collect();
        make_scatter(Value::Array(maps))
    }
}

/// Reads whitespace-delimited numeric columns from each file.
pub fn read_plain_text<P: AsRef<Path>>(
    files: &[P],
    selection: &PlainTextSelection,
) -> FigureResult<PlainTextColumns> {
    if selection.min_row == 0 || selection.max_row < selection.min_row {
        return Err(FigureError::InvalidData(format!(
            "invalid row window: {}..={}",
            selection.min_row, selection.max_row
        )));
    }

    let count = files.len();
    let x_columns = selection.x_column.resolve(count, "x columns")?;
    let y_columns = selection.y_column.resolve(count, "y columns")?;
    let x_scales = selection.x_scale.resolve(count, "x scales")?;
    let y_scales = selection.y_scale.resolve(count, "y scales")?;

    let mut columns = PlainTextColumns::default();
    for (index, file) in files.iter().enumerate() {
        let path = file.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| FigureError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let rows = parse_rows(&raw, selection, path)?;

        columns.xs.push(pick_column(&rows, x_columns[index], x_scales[index], path)?);
        columns.ys.push(pick_column(&rows, y_columns[index], y_scales[index], path)?);
        debug!(file = %path.display(), rows = rows.len(), "read plain text columns");
    }
    Ok(columns)
}

fn parse_rows(
    raw: &str,
    selection: &PlainTextSelection,
    path: &Path,
) -> FigureResult<Vec<Vec<f64>>> {
    raw.lines()
        .enumerate()
        .skip(selection.min_row - 1)
        .take(selection.max_row - selection.min_row + 1)
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(line_index, line)| {
            line.split_whitespace()
                .map(|field| {
                    field.parse::<f64>().map_err(|_| {
                        FigureError::InvalidData(format!(
                            "{}:{}: not a number: `{field}`",
                            path.display(),
                            line_index + 1
                        ))
                    })
                })
                .collect::<FigureResult<Vec<f64>>>()
        })
        .collect()
}

fn pick_column(rows: &[Vec<f64>], column: usize, scale: f64, path: &Path) -> FigureResult<Vec<f64>> {
    rows.iter()
        .map(|row| {
            row.get(column).map(|value| value * scale).ok_or_else(|| {
                FigureError::InvalidData(format!(
                    "{}: row has no column {column}",
                    path.display()
                ))
            })
        })
        .collect()
}
