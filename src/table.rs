use log::debug;

use crate::data::{TableBlock, Tx};

/// Widest table WordprocessingML accepts
pub const MAX_COLUMNS: usize = 63;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum MalformedTable {
    #[error("Table header has no columns")]
    NoColumns,
    #[error("Table has {columns} columns, at most {MAX_COLUMNS} are supported")]
    TooManyColumns { columns: usize },
}

impl MalformedTable {
    /// Checks a column count against what a document table can hold
    pub fn check(columns: usize) -> Result<(), Self> {
        match columns {
            0 => Err(Self::NoColumns),
            columns if columns > MAX_COLUMNS => Err(Self::TooManyColumns { columns }),
            _ => Ok(()),
        }
    }

    /// Text shown in place of the table
    pub fn placeholder(&self) -> String {
        format!("表格無法產生：{self}")
    }
}

/// Collects consecutive table rows during a single pass over a report.
///
/// Rows are fed as they are seen; [`TableAccumulator::flush`] turns whatever was collected into a
/// [`TableBlock`] once the table ends.
#[derive(Debug, Default)]
pub struct TableAccumulator<'source> {
    rows: Vec<Vec<Tx<'source>>>,
}

impl<'source> TableAccumulator<'source> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, cells: Vec<Tx<'source>>) {
        self.rows.push(cells);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Closes the open table, if there is one
    ///
    /// The header row fixes the column count. Shorter rows are padded with empty cells, longer ones
    /// lose their excess cells. The buffer is cleared even when the table turns out malformed.
    pub fn flush(&mut self) -> Option<Result<TableBlock<'source>, MalformedTable>> {
        if self.rows.is_empty() {
            return None;
        }
        let mut rows = std::mem::take(&mut self.rows);
        let columns = rows[0].len();
        if let Err(err) = MalformedTable::check(columns) {
            return Some(Err(err));
        }
        for (ind, row) in rows.iter_mut().enumerate().skip(1) {
            if row.len() != columns {
                debug!(
                    "Table row {ind} has {} cells, resizing to {columns}",
                    row.len()
                );
                row.resize(columns, Tx::Borrowed(""));
            }
        }
        Some(Ok(TableBlock {
            columns,
            rows,
            header_row: true,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! row {
        [$($cell:literal), *] => {
            vec![$(Tx::from($cell)), *]
        };
    }

    macro_rules! test {
        {$name:ident, [$($row:expr), *], e: $expected:expr} => {
            #[test]
            fn $name() {
                // arrange
                let mut accumulator = TableAccumulator::new();
                $(accumulator.feed($row);)*

                // act
                let result = accumulator.flush();

                // assert
                assert_eq!(result, $expected);
                assert!(accumulator.is_empty(), "Flush should clear the buffer");
            }
        };
    }

    test! {empty, [], e: None}
    test! {header_only, [row!["a", "b"]], e: Some(Ok(TableBlock {
        columns: 2,
        rows: vec![row!["a", "b"]],
        header_row: true,
    }))}
    test! {two_rows, [row!["題號", "問題"], row!["1", "ok"]], e: Some(Ok(TableBlock {
        columns: 2,
        rows: vec![row!["題號", "問題"], row!["1", "ok"]],
        header_row: true,
    }))}
    test! {short_row_padded, [row!["a", "b", "c", "d"], row!["1", "2"]], e: Some(Ok(TableBlock {
        columns: 4,
        rows: vec![row!["a", "b", "c", "d"], row!["1", "2", "", ""]],
        header_row: true,
    }))}
    test! {long_row_truncated, [row!["a", "b"], row!["1", "2", "3"]], e: Some(Ok(TableBlock {
        columns: 2,
        rows: vec![row!["a", "b"], row!["1", "2"]],
        header_row: true,
    }))}
    test! {no_columns, [row![], row!["1"]], e: Some(Err(MalformedTable::NoColumns))}

    #[test]
    fn too_many_columns() {
        // arrange
        let mut accumulator = TableAccumulator::new();
        accumulator.feed(vec![Tx::from("x"); MAX_COLUMNS + 1]);

        // act
        let result = accumulator.flush();

        // assert
        assert_eq!(
            result,
            Some(Err(MalformedTable::TooManyColumns {
                columns: MAX_COLUMNS + 1
            }))
        );
    }

    #[test]
    fn reusable_after_flush() {
        // arrange
        let mut accumulator = TableAccumulator::new();
        accumulator.feed(row!["a"]);
        let _ = accumulator.flush();

        // act
        accumulator.feed(row!["b"]);
        let result = accumulator.flush();

        // assert
        assert_eq!(
            result,
            Some(Ok(TableBlock {
                columns: 1,
                rows: vec![row!["b"]],
                header_row: true,
            }))
        );
        assert_eq!(accumulator.flush(), None);
    }
}
