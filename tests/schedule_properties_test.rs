use sched_grid::core::conflict::ConflictDetector;
use sched_grid::core::grid::{CellRef, GridCell};
use sched_grid::core::time_parser;
use sched_grid::domain::model::{SectionRecord, Weekday};
use sched_grid::{GridLayout, Schedule, ScheduleCodec, SchedError};
use std::collections::HashSet;

fn record(subject_code: &str, section: &str, time: &str) -> SectionRecord {
    SectionRecord {
        subject_code: subject_code.to_string(),
        section: section.to_string(),
        course_title: format!("{} lecture", subject_code),
        units: "3".to_string(),
        time: time.to_string(),
        room: "SEC-B301".to_string(),
        instructor: "GARCIA, ANA".to_string(),
    }
}

fn assert_unique_ids(schedule: &Schedule) {
    let ids: HashSet<&str> = schedule.list().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids.len(), schedule.len());
}

/// 測試規格範例：ENGL 11 A 與 MATH 20 B 的衝突判斷
#[test]
fn test_worked_example() {
    let interval = time_parser::parse("M-TH 1230-1400\n(FULLY ONSITE)").unwrap();
    assert_eq!(
        interval.days.iter().copied().collect::<Vec<_>>(),
        vec![Weekday::Monday, Weekday::Thursday]
    );
    assert_eq!((interval.start_minutes, interval.end_minutes), (750, 840));
    assert_eq!(interval.blocks_needed(), 3);

    let mut schedule = Schedule::default();
    schedule
        .add(record("ENGL 11", "A", "M-TH 1230-1400\n(FULLY ONSITE)"))
        .unwrap();

    assert!(schedule.check(&record("MATH 20", "B", "T-F 1300-1400")).is_ok());

    match schedule.check(&record("MATH 20", "B", "M-TH 1300-1400")) {
        Err(SchedError::Conflict(conflict)) => {
            assert_eq!(conflict.conflicting_label, "ENGL 11 A");
            assert_eq!(conflict.conflicting_id, "ENGL 11-A");
        }
        other => panic!("expected a conflict, got {:?}", other),
    }
}

#[test]
fn test_conflict_symmetry() {
    let pairs = [
        ("M-TH 1230-1400", "M-TH 1300-1400"),
        ("W 0800-1100", "W 1000-1030"),
        ("T-F 1500-1630", "F 1600-1700"),
    ];

    for (first, second) in pairs {
        let mut a_first = Schedule::default();
        a_first.add(record("SUBJ A", "1", first)).unwrap();
        let err = a_first.add(record("SUBJ B", "2", second)).unwrap_err();
        assert!(matches!(err, SchedError::Conflict(ref c) if c.conflicting_id == "SUBJ A-1"));

        let mut b_first = Schedule::default();
        b_first.add(record("SUBJ B", "2", second)).unwrap();
        let err = b_first.add(record("SUBJ A", "1", first)).unwrap_err();
        assert!(matches!(err, SchedError::Conflict(ref c) if c.conflicting_id == "SUBJ B-2"));
    }
}

#[test]
fn test_no_self_conflict() {
    let layout = GridLayout::default();
    let mut schedule = Schedule::new(layout.clone());
    let placed = schedule.add(record("PHYS 71", "C", "T-TH 0900-1030")).unwrap();

    let detector = ConflictDetector::new(&layout);
    let conflict = detector.detect(&placed.interval, schedule.list()).unwrap();
    assert_eq!(conflict.conflicting_id, "PHYS 71-C");
    assert_eq!(conflict.day, Weekday::Tuesday);
    assert_eq!(conflict.time_range, "09:00-09:30");
}

#[test]
fn test_uniqueness_across_operations() {
    let mut schedule = Schedule::default();
    let operations = [
        ("ENGL 11", "A", "M-TH 1230-1400"),
        ("ENGL 11", "A", "M-TH 1230-1400"),
        ("MATH 20", "B", "T-F 1300-1400"),
        ("PE 1", "Q", "SAT 0600-0800"),
        ("PE 1", "Q", "SAT 0600-0800"),
        ("HIST 1", "X", "W 0700-0830"),
    ];

    for (code, section, time) in operations {
        let _ = schedule.add(record(code, section, time));
        assert_unique_ids(&schedule);
    }
    assert_eq!(schedule.len(), 4);

    assert!(schedule.remove("ENGL 11-A"));
    assert_unique_ids(&schedule);
    schedule.add(record("ENGL 11", "A", "M-TH 1230-1400")).unwrap();
    assert_unique_ids(&schedule);

    assert_eq!(schedule.clear(), 4);
    assert_unique_ids(&schedule);
}

#[test]
fn test_span_integrity() {
    let mut schedule = Schedule::default();
    // 1230-1400 = 3 blocks starting at row 11
    schedule.add(record("ENGL 11", "A", "M-TH 1230-1400")).unwrap();

    for day in [Weekday::Monday, Weekday::Thursday] {
        let cells: Vec<&GridCell> = (11..14)
            .map(|row| schedule.grid().cell(CellRef { day, row }).unwrap())
            .collect();
        assert!(matches!(cells[0], GridCell::Origin { span: 3, .. }));
        assert!(matches!(cells[1], GridCell::Covered { origin_row: 11, .. }));
        assert!(matches!(cells[2], GridCell::Covered { origin_row: 11, .. }));
        assert_eq!(schedule.grid().owned_rows(day), 3);
        assert!(schedule.grid().cell(CellRef { day, row: 14 }).unwrap().is_empty());
    }

    assert!(schedule.remove("ENGL 11-A"));
    for day in Weekday::ALL {
        for row in 0..schedule.layout().row_count() {
            assert!(schedule.grid().cell(CellRef { day, row }).unwrap().is_empty());
        }
    }
}

#[test]
fn test_save_load_idempotence() {
    let codec = ScheduleCodec::default();
    let mut source = Schedule::default();
    for (code, section, time) in [
        ("ENGL 11", "A", "M-TH 1230-1400\n(FULLY ONSITE)"),
        ("MATH 20", "B", "T-F 1300-1400"),
        ("HIST 1", "X", "W 0700-0830"),
        ("PE 1", "Q", "SAT 0600-0800"),
    ] {
        source.add(record(code, section, time)).unwrap();
    }

    let json = codec.to_json(&codec.save(&source)).unwrap();
    let document = codec.parse(&json).unwrap();

    let mut target = Schedule::default();
    assert!(!codec.would_overwrite(&target));
    let report = codec.load(&document, &mut target);

    assert_eq!(report.success_count, source.len());
    assert_eq!(report.fail_count, 0);
    assert_eq!(target.list(), source.list());
}
