use crate::error::{ApiError, ApiResult};
use crate::{FlatRecord, Scalar};
use std::fmt;

static NULL: Scalar = Scalar::Null;

/// Rectangular data: rows share the union of every row's columns.
///
/// Column order is first-seen order across rows. A cell a row does not define reads as
/// `Null`. The optional index names one or more columns; duplicate index values are kept
/// as groups of rows in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<FlatRecord>,
    index: Vec<String>,
}

impl Table {
    pub fn from_records(rows: Vec<FlatRecord>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
        Self { columns, rows, index: Vec::new() }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[FlatRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Cell at `row`/`column`; `Null` when either is absent.
    pub fn value(&self, row: usize, column: &str) -> &Scalar {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&NULL)
    }

    pub fn column(&self, name: &str) -> Option<Vec<&Scalar>> {
        if !self.has_column(name) {
            return None;
        }
        Some(
            self.rows
                .iter()
                .map(|r| r.get(name).unwrap_or(&NULL))
                .collect(),
        )
    }

    pub fn index(&self) -> &[String] {
        &self.index
    }

    /// Designates `columns` as the index. Every name must be an existing column.
    pub fn with_index(mut self, columns: &[&str]) -> ApiResult<Self> {
        if let Some(missing) = columns.iter().find(|c| !self.has_column(c)) {
            return Err(ApiError::UnknownColumn((*missing).to_owned()));
        }
        self.index = columns.iter().map(|c| (*c).to_owned()).collect();
        Ok(self)
    }

    /// Index tuple of one row.
    pub fn index_key(&self, row: usize) -> Vec<Scalar> {
        self.index
            .iter()
            .map(|c| self.value(row, c).clone())
            .collect()
    }

    /// Rows grouped by index tuple, groups in order of first appearance.
    pub fn index_groups(&self) -> Vec<(Vec<Scalar>, Vec<usize>)> {
        let mut groups: Vec<(Vec<Scalar>, Vec<usize>)> = Vec::new();
        for i in 0..self.rows.len() {
            let key = self.index_key(i);
            match groups.iter_mut().find(|(k, _)| *k == key) {
                Some((_, members)) => members.push(i),
                None => groups.push((key, vec![i])),
            }
        }
        groups
    }

    pub fn is_index_unique(&self) -> bool {
        self.index_groups().len() == self.rows.len()
    }

    /// All rows whose index tuple equals `key`.
    pub fn lookup(&self, key: &[Scalar]) -> Vec<&FlatRecord> {
        (0..self.rows.len())
            .filter(|&i| self.index_key(i) == key)
            .map(|i| &self.rows[i])
            .collect()
    }

    /// Renames `from` in place. A missing `from` is a no-op; renaming onto another existing
    /// column is rejected.
    pub fn rename_column(&mut self, from: &str, to: &str) -> ApiResult<()> {
        if from != to && self.has_column(to) && self.has_column(from) {
            return Err(ApiError::malformed(format!(
                "cannot rename `{from}` to `{to}`: `{to}` is already a column"
            )));
        }
        for column in self.columns.iter_mut().chain(self.index.iter_mut()) {
            if *column == from {
                *column = to.to_owned();
            }
        }
        for row in &mut self.rows {
            if let Some(idx) = row.get_index_of(from) {
                let value = row.shift_remove(from).unwrap_or_default();
                row.shift_insert(idx, to.to_owned(), value);
            }
        }
        Ok(())
    }

    /// Moves the named columns, where present, to the front in the given order.
    pub fn reorder(mut self, leading: &[&str]) -> Self {
        let mut columns: Vec<String> = leading
            .iter()
            .filter(|c| self.has_column(c))
            .map(|c| (*c).to_owned())
            .collect();
        columns.dedup();
        for column in &self.columns {
            if !columns.contains(column) {
                columns.push(column.clone());
            }
        }
        self.columns = columns;
        self
    }

    /// Replaces every cell of `name` with `f(cell)`, filling rows that lacked the column.
    pub fn map_column(&mut self, name: &str, mut f: impl FnMut(&Scalar) -> Scalar) {
        if !self.has_column(name) {
            return;
        }
        for row in &mut self.rows {
            let next = f(row.get(name).unwrap_or(&NULL));
            row.insert(name.to_owned(), next);
        }
    }

    /// Stacks tables vertically. The index of the first table is kept.
    pub fn concat(tables: impl IntoIterator<Item = Table>) -> Self {
        let mut tables = tables.into_iter();
        let Some(mut out) = tables.next() else {
            return Table::default();
        };
        for table in tables {
            for column in table.columns {
                if !out.columns.contains(&column) {
                    out.columns.push(column);
                }
            }
            out.rows.extend(table.rows);
        }
        out
    }
}

impl fmt::Display for Table {
    /// Aligned plain-text rendering, one line per row.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|r| {
                self.columns
                    .iter()
                    .map(|c| r.get(c).unwrap_or(&NULL).to_string())
                    .collect()
            })
            .collect();

        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| {
                cells
                    .iter()
                    .map(|row| row[i].chars().count())
                    .chain(std::iter::once(c.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        write_aligned(f, self.columns.iter().map(String::as_str), &widths)?;
        for row in &cells {
            write_aligned(f, row.iter().map(String::as_str), &widths)?;
        }
        Ok(())
    }
}

fn write_aligned<'a>(
    f: &mut fmt::Formatter<'_>,
    values: impl Iterator<Item = &'a str>,
    widths: &[usize],
) -> fmt::Result {
    let text: Vec<String> = values
        .zip(widths)
        .map(|(v, &w)| format!("{v:<w$}"))
        .collect();
    writeln!(f, "{}", text.join("  ").trim_end())
}

/// Long-format output of the scalar flattener packaged as one labelled sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    entries: Vec<(String, Scalar)>,
}

impl Series {
    pub fn entries(&self) -> &[(String, Scalar)] {
        &self.entries
    }

    pub fn get(&self, label: &str) -> Option<&Scalar> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .entries
            .iter()
            .map(|(l, _)| l.chars().count())
            .max()
            .unwrap_or(0);
        for (label, value) in &self.entries {
            writeln!(f, "{label:<width$}  {value}")?;
        }
        Ok(())
    }
}

/// Packaging of `(label, value)` pairs produced by the scalar flattener.
pub trait FromScalars: Sized {
    fn from_scalars(pairs: Vec<(String, Scalar)>) -> Self;
}

impl FromScalars for Series {
    fn from_scalars(pairs: Vec<(String, Scalar)>) -> Self {
        Series { entries: pairs }
    }
}

impl FromScalars for Table {
    /// One row per pair with `label` and `value` columns, indexed by `label`.
    fn from_scalars(pairs: Vec<(String, Scalar)>) -> Self {
        let rows = pairs
            .into_iter()
            .map(|(label, value)| {
                FlatRecord::from([
                    ("label".to_owned(), Scalar::String(label)),
                    ("value".to_owned(), value),
                ])
            })
            .collect();
        Table {
            columns: vec!["label".to_owned(), "value".to_owned()],
            rows,
            index: vec!["label".to_owned()],
        }
    }
}
