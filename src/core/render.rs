use crate::core::grid::{GridCell, ScheduleGrid};
use crate::domain::model::Weekday;

const TIME_WIDTH: usize = 11;
const DAY_WIDTH: usize = 14;

/// Plain-text weekly timetable.
///
/// Origin cells show the section, covered cells a continuation mark, so a
/// span reads as one block down its column.
pub fn render_timetable(grid: &ScheduleGrid) -> String {
    let mut lines = Vec::new();

    let mut header = format!("{:<width$}", "Time", width = TIME_WIDTH);
    for day in Weekday::ALL {
        header.push_str(&format!("|{:^width$}", day.name(), width = DAY_WIDTH));
    }
    lines.push(header);
    lines.push(format!(
        "{}{}",
        "-".repeat(TIME_WIDTH),
        format!("+{}", "-".repeat(DAY_WIDTH)).repeat(Weekday::ALL.len())
    ));

    for (row, cells) in grid.rows() {
        let mut line = format!(
            "{:<width$}",
            grid.layout().row_label(row),
            width = TIME_WIDTH
        );
        for cell in cells {
            let text = match cell {
                GridCell::Empty => String::new(),
                GridCell::Origin { content, .. } => {
                    fit(&format!("{} {}", content.subject_code, content.section))
                }
                GridCell::Covered { .. } => "┆".to_string(),
            };
            line.push_str(&format!("|{:^width$}", text, width = DAY_WIDTH));
        }
        lines.push(line.trim_end().to_string());
    }

    lines.join("\n")
}

fn fit(text: &str) -> String {
    if text.chars().count() <= DAY_WIDTH {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(DAY_WIDTH - 1).collect();
        cut.push('…');
        cut
    }
}
