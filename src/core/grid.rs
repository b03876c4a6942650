//! Fixed weekly grid and span ownership.
//!
//! Rows are 30-minute blocks starting at a configurable earliest time; columns
//! are the six weekdays. A placement owns one content-bearing origin cell per
//! meeting day plus the `span - 1` covered cells below it in the same column.

use crate::domain::model::{format_clock, TimeInterval, Weekday, BLOCK_MINUTES, MINUTES_PER_DAY};
use crate::utils::error::{Result, SchedError};
use std::collections::HashMap;

pub const DEFAULT_EARLIEST: u32 = 7 * 60;
pub const DEFAULT_LATEST: u32 = 21 * 60;

/// Maps canonical row start times to row indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridLayout {
    earliest: u32,
    row_count: usize,
    row_by_start: HashMap<u32, usize>,
}

impl GridLayout {
    /// Rows from `earliest` up to `latest`; a trailing partial block is dropped.
    pub fn new(earliest: u32, latest: u32) -> Result<Self> {
        if latest > MINUTES_PER_DAY || earliest + BLOCK_MINUTES > latest {
            return Err(SchedError::InvalidConfigValueError {
                field: "grid".to_string(),
                value: format!("{}-{}", format_clock(earliest), format_clock(latest)),
                reason: format!(
                    "Grid must span at least {} minutes and end by 24:00",
                    BLOCK_MINUTES
                ),
            });
        }

        Ok(Self::with_bounds(earliest, latest))
    }

    fn with_bounds(earliest: u32, latest: u32) -> Self {
        let row_count = ((latest - earliest) / BLOCK_MINUTES) as usize;
        let row_by_start = (0..row_count)
            .map(|row| (earliest + row as u32 * BLOCK_MINUTES, row))
            .collect();

        Self {
            earliest,
            row_count,
            row_by_start,
        }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn earliest(&self) -> u32 {
        self.earliest
    }

    /// Row whose start time is exactly `start_minutes`.
    pub fn row_for_start(&self, start_minutes: u32) -> Option<usize> {
        self.row_by_start.get(&start_minutes).copied()
    }

    pub fn row_start(&self, row: usize) -> u32 {
        self.earliest + row as u32 * BLOCK_MINUTES
    }

    /// "13:00-13:30"
    pub fn row_label(&self, row: usize) -> String {
        let start = self.row_start(row);
        format!(
            "{}-{}",
            format_clock(start),
            format_clock(start + BLOCK_MINUTES)
        )
    }

    /// Per-day runs of rows an interval occupies, in day order.
    ///
    /// Days whose start time has no row are left out, and a run that would
    /// pass the last row is cut at the grid end.
    pub fn spans(&self, interval: &TimeInterval) -> Vec<Span> {
        let blocks = interval.blocks_needed();
        if blocks == 0 {
            return Vec::new();
        }

        let Some(start_row) = self.row_for_start(interval.start_minutes) else {
            return Vec::new();
        };
        let len = blocks.min(self.row_count - start_row);

        interval
            .days
            .iter()
            .map(|&day| Span {
                day,
                start_row,
                len,
            })
            .collect()
    }
}

impl Default for GridLayout {
    fn default() -> Self {
        Self::with_bounds(DEFAULT_EARLIEST, DEFAULT_LATEST)
    }
}

/// A (day-column, time-row) coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellRef {
    pub day: Weekday,
    pub row: usize,
}

/// A run of consecutive rows in one day column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub day: Weekday,
    pub start_row: usize,
    pub len: usize,
}

impl Span {
    pub fn rows(&self) -> std::ops::Range<usize> {
        self.start_row..self.start_row + self.len
    }
}

/// Display content of an origin cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellContent {
    pub subject_code: String,
    pub section: String,
    pub time_label: String,
    pub room: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GridCell {
    #[default]
    Empty,
    /// First row of a span; carries the content and the owning id.
    Origin {
        id: String,
        span: usize,
        content: CellContent,
    },
    /// Merged into the span that starts at `origin_row`.
    Covered { owner: String, origin_row: usize },
}

impl GridCell {
    pub fn is_empty(&self) -> bool {
        matches!(self, GridCell::Empty)
    }

    pub fn owner(&self) -> Option<&str> {
        match self {
            GridCell::Empty => None,
            GridCell::Origin { id, .. } => Some(id.as_str()),
            GridCell::Covered { owner, .. } => Some(owner.as_str()),
        }
    }
}

/// Cell map of the weekly grid, `columns[day][row]`.
#[derive(Debug, Clone)]
pub struct ScheduleGrid {
    layout: GridLayout,
    columns: Vec<Vec<GridCell>>,
}

impl ScheduleGrid {
    pub fn new(layout: GridLayout) -> Self {
        let columns = Weekday::ALL
            .iter()
            .map(|_| vec![GridCell::Empty; layout.row_count()])
            .collect();
        Self { layout, columns }
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn cell(&self, cell: CellRef) -> Option<&GridCell> {
        self.columns.get(cell.day.column())?.get(cell.row)
    }

    pub fn occupant(&self, cell: CellRef) -> Option<&str> {
        self.cell(cell).and_then(GridCell::owner)
    }

    /// 寫入課程區塊，回傳被佔用的格子
    pub fn place(&mut self, interval: &TimeInterval, id: &str, content: &CellContent) -> Vec<CellRef> {
        let spans = self.layout.spans(interval);
        if spans.len() < interval.days.len() {
            tracing::warn!(
                "No grid row starts at {} for {}; skipping its cells",
                format_clock(interval.start_minutes),
                id
            );
        }

        if spans.first().is_some_and(|span| span.len < interval.blocks_needed()) {
            tracing::warn!(
                "{} ({}) truncated at the end of the grid",
                id,
                interval.time_label()
            );
        }

        let mut written = Vec::new();
        for span in spans {
            let column = &mut self.columns[span.day.column()];
            for (offset, row) in span.rows().enumerate() {
                debug_assert!(column[row].is_empty(), "placing over an occupied cell");
                column[row] = if offset == 0 {
                    GridCell::Origin {
                        id: id.to_string(),
                        span: span.len,
                        content: content.clone(),
                    }
                } else {
                    GridCell::Covered {
                        owner: id.to_string(),
                        origin_row: span.start_row,
                    }
                };
                written.push(CellRef { day: span.day, row });
            }
            tracing::debug!(
                "Placed {} on {} rows {}..{}",
                id,
                span.day,
                span.start_row,
                span.start_row + span.len
            );
        }

        written
    }

    /// 移除課程並還原被合併的格子
    pub fn unplace(&mut self, id: &str) -> Vec<CellRef> {
        let mut cleared = Vec::new();

        for (&day, column) in Weekday::ALL.iter().zip(self.columns.iter_mut()) {
            let mut row = 0;
            while row < column.len() {
                let span = match &column[row] {
                    GridCell::Origin { id: owner, span, .. } if owner == id => *span,
                    _ => {
                        row += 1;
                        continue;
                    }
                };

                column[row] = GridCell::Empty;
                cleared.push(CellRef { day, row });
                for follower in row + 1..(row + span).min(column.len()) {
                    if column[follower].owner() == Some(id) {
                        column[follower] = GridCell::Empty;
                        cleared.push(CellRef { day, row: follower });
                    }
                }
                row += span.max(1);
            }
        }

        cleared
    }

    /// Rows in `day` that are not independent (origin or covered).
    pub fn owned_rows(&self, day: Weekday) -> usize {
        self.columns[day.column()]
            .iter()
            .filter(|cell| !cell.is_empty())
            .count()
    }

    pub fn rows(&self) -> impl Iterator<Item = (usize, Vec<&GridCell>)> + '_ {
        (0..self.layout.row_count()).map(move |row| {
            let cells = self.columns.iter().map(|column| &column[row]).collect();
            (row, cells)
        })
    }
}
