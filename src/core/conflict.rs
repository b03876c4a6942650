use crate::core::grid::{GridLayout, Span};
use crate::domain::model::{Conflict, PlacedClass, TimeInterval};

/// Block-occupancy conflict check against the fixed grid.
pub struct ConflictDetector<'a> {
    layout: &'a GridLayout,
}

impl<'a> ConflictDetector<'a> {
    pub fn new(layout: &'a GridLayout) -> Self {
        Self { layout }
    }

    /// 檢查候選時段是否與已排課程重疊
    ///
    /// Days are checked in weekday order and rows from the start row down; the
    /// first occupied block decides the reported section. A day whose start
    /// time is not a grid row is never checked.
    pub fn detect(&self, candidate: &TimeInterval, placed: &[PlacedClass]) -> Option<Conflict> {
        let occupied: Vec<(&PlacedClass, Vec<Span>)> = placed
            .iter()
            .map(|class| (class, self.layout.spans(&class.interval)))
            .collect();

        for span in self.layout.spans(candidate) {
            for row in span.rows() {
                let owner = occupied.iter().find(|(_, spans)| {
                    spans
                        .iter()
                        .any(|other| other.day == span.day && other.rows().contains(&row))
                });

                if let Some((class, _)) = owner {
                    let conflict = Conflict {
                        conflicting_id: class.id.clone(),
                        conflicting_label: class.label(),
                        day: span.day,
                        time_range: self.layout.row_label(row),
                    };
                    tracing::debug!("Candidate {} {}", candidate.time_label(), conflict);
                    return Some(conflict);
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time_parser;
    use crate::domain::model::{SectionRecord, Weekday};

    fn placed(subject_code: &str, section: &str, time: &str) -> PlacedClass {
        let record = SectionRecord {
            subject_code: subject_code.to_string(),
            section: section.to_string(),
            time: time.to_string(),
            ..Default::default()
        };
        PlacedClass::new(record, time_parser::parse(time).unwrap())
    }

    #[test]
    fn test_disjoint_days_do_not_conflict() {
        let layout = GridLayout::default();
        let detector = ConflictDetector::new(&layout);
        let existing = vec![placed("ENGL 11", "A", "M-TH 1230-1400")];

        let candidate = time_parser::parse("T-F 1300-1400").unwrap();
        assert_eq!(detector.detect(&candidate, &existing), None);
    }

    #[test]
    fn test_overlap_inside_span_reports_first_block() {
        let layout = GridLayout::default();
        let detector = ConflictDetector::new(&layout);
        let existing = vec![placed("ENGL 11", "A", "M-TH 1230-1400")];

        let candidate = time_parser::parse("M-TH 1300-1400").unwrap();
        let conflict = detector.detect(&candidate, &existing).unwrap();
        assert_eq!(conflict.conflicting_id, "ENGL 11-A");
        assert_eq!(conflict.conflicting_label, "ENGL 11 A");
        assert_eq!(conflict.day, Weekday::Monday);
        assert_eq!(conflict.time_range, "13:00-13:30");
    }

    #[test]
    fn test_back_to_back_sections_do_not_conflict() {
        let layout = GridLayout::default();
        let detector = ConflictDetector::new(&layout);
        let existing = vec![placed("ENGL 11", "A", "W 0800-0930")];

        let candidate = time_parser::parse("W 0930-1100").unwrap();
        assert_eq!(detector.detect(&candidate, &existing), None);
    }

    #[test]
    fn test_first_conflict_in_day_then_row_order() {
        let layout = GridLayout::default();
        let detector = ConflictDetector::new(&layout);
        let existing = vec![
            placed("HIST 1", "X", "TH 1000-1030"),
            placed("PHYS 71", "B", "T 1030-1100"),
        ];

        // Tuesday is checked before Thursday even though HIST 1 is listed first
        let candidate = time_parser::parse("T-TH 1000-1130").unwrap();
        let conflict = detector.detect(&candidate, &existing).unwrap();
        assert_eq!(conflict.conflicting_id, "PHYS 71-B");
        assert_eq!(conflict.day, Weekday::Tuesday);
        assert_eq!(conflict.time_range, "10:30-11:00");
    }

    #[test]
    fn test_off_grid_start_is_not_checked() {
        let layout = GridLayout::default();
        let detector = ConflictDetector::new(&layout);
        let existing = vec![placed("ENGL 11", "A", "M 0800-1000")];

        let candidate = time_parser::parse("M 0815-0900").unwrap();
        assert_eq!(detector.detect(&candidate, &existing), None);
    }
}
