use httpmock::prelude::*;
use sched_grid::domain::model::{SavedClass, ScheduleDocument};
use sched_grid::domain::ports::SectionCatalog;
use sched_grid::{HttpCatalog, Schedule, ScheduleCodec, SchedError, SchedulePlanner};
use serde_json::{json, Value};
use std::time::Duration;

fn section_json(code: &str, section: &str, time: &str) -> Value {
    json!({
        "Subject Code": code,
        "Section": section,
        "Course Title": format!("{} lecture", code),
        "Units": 3,
        "Time": time,
        "Room": "CTC 102",
        "Instructor": "REYES, JOSE"
    })
}

fn catalog(server: &MockServer) -> HttpCatalog {
    HttpCatalog::new(server.base_url(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_all_courses() {
    let server = MockServer::start();
    let courses_mock = server.mock(|when, then| {
        when.method(GET).path("/all_courses");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(json!(["ENGL 11", "MATH 20", "PHYS 71"]));
    });

    let courses = catalog(&server).all_courses().await.unwrap();

    courses_mock.assert();
    assert_eq!(courses, vec!["ENGL 11", "MATH 20", "PHYS 71"]);
}

/// 測試查詢課程節次，數字欄位也應讀成字串
#[tokio::test]
async fn test_fetch_sections() {
    let server = MockServer::start();
    let sections_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/get_schedules")
            .json_body(json!({ "code": "ENGL 11" }));
        then.status(200).json_body(json!({
            "sections": [
                section_json("ENGL 11", "A", "M-TH 1230-1400\n(FULLY ONSITE)"),
                section_json("ENGL 11", "B", "T-F 0830-1000")
            ]
        }));
    });

    let sections = catalog(&server).fetch_sections("ENGL 11").await.unwrap();

    sections_mock.assert();
    assert_eq!(sections.len(), 2);
    assert_eq!(sections[0].id(), "ENGL 11-A");
    assert_eq!(sections[0].units, "3");
    assert_eq!(sections[1].time, "T-F 0830-1000");
}

#[tokio::test]
async fn test_commit_and_release() {
    let server = MockServer::start();
    let select_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/select_section")
            .json_body(json!({ "new_code": "MATH 20", "new_section": "B" }));
        then.status(200).json_body(json!({
            "success": true,
            "section": section_json("MATH 20", "B", "T-F 1300-1400")
        }));
    });
    let remove_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/remove_section")
            .json_body(json!({ "class_id": "MATH 20-B" }));
        then.status(200).json_body(json!({ "success": true }));
    });

    let catalog = catalog(&server);
    let record = catalog.commit_selection("MATH 20", "B").await.unwrap();
    assert_eq!(record.id(), "MATH 20-B");

    catalog.release_selection("MATH 20-B").await.unwrap();

    select_mock.assert();
    remove_mock.assert();
}

#[tokio::test]
async fn test_commit_missing_section() {
    let server = MockServer::start();
    let _select_mock = server.mock(|when, then| {
        when.method(POST).path("/select_section");
        then.status(404)
            .json_body(json!({ "success": false, "error": "Section not found" }));
    });

    let err = catalog(&server)
        .commit_selection("MATH 20", "Z")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SchedError::SectionNotFound { ref subject_code, ref section }
            if subject_code == "MATH 20" && section == "Z"
    ));
}

#[tokio::test]
async fn test_server_error_carries_backend_message() {
    let server = MockServer::start();
    let _mock = server.mock(|when, then| {
        when.method(POST).path("/get_schedules");
        then.status(500).json_body(json!({ "error": "database unavailable" }));
    });

    let err = catalog(&server).fetch_sections("ENGL 11").await.unwrap_err();

    match err {
        SchedError::Catalog { message } => {
            assert!(message.contains("500"));
            assert!(message.contains("database unavailable"));
        }
        other => panic!("expected a catalog error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unconfirmed_selection_is_an_error() {
    let server = MockServer::start();
    let _mock = server.mock(|when, then| {
        when.method(POST).path("/select_section");
        then.status(200)
            .json_body(json!({ "success": false, "error": "Section is full" }));
    });

    let err = catalog(&server)
        .commit_selection("ENGL 11", "A")
        .await
        .unwrap_err();

    assert!(matches!(err, SchedError::Catalog { ref message } if message == "Section is full"));
}

/// 測試從存檔還原：每筆都向後端重新選課，找不到的節次會被略過
#[tokio::test]
async fn test_planner_restore_against_backend() {
    let server = MockServer::start();
    let engl_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/select_section")
            .json_body(json!({ "new_code": "ENGL 11", "new_section": "A" }));
        then.status(200).json_body(json!({
            "success": true,
            "section": section_json("ENGL 11", "A", "M-TH 1230-1400")
        }));
    });
    let math_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/select_section")
            .json_body(json!({ "new_code": "MATH 20", "new_section": "B" }));
        then.status(404).json_body(json!({ "error": "Section not found" }));
    });

    let saved = |code: &str, section: &str, time: &str| SavedClass {
        subject_code: code.to_string(),
        section: section.to_string(),
        time: time.to_string(),
        ..Default::default()
    };
    let document = ScheduleDocument {
        version: "1.0".to_string(),
        saved_date: None,
        semester: "2nd Sem, AY 2025-2026".to_string(),
        classes: vec![
            saved("ENGL 11", "A", "M-TH 1230-1400"),
            saved("MATH 20", "B", "T-F 1300-1400"),
            // 與 ENGL 11 A 衝突，不會送到後端
            saved("HIST 1", "X", "M 1300-1330"),
        ],
        ..Default::default()
    };

    let mut planner =
        SchedulePlanner::new(catalog(&server), Schedule::default(), ScheduleCodec::default());
    let report = planner.restore(&document).await;

    engl_mock.assert_hits(1);
    math_mock.assert_hits(1);
    assert_eq!(report.success_count, 1);
    assert_eq!(report.fail_count, 2);
    assert_eq!(report.failures[0].id, "HIST 1-X");
    assert_eq!(report.failures[1].id, "MATH 20-B");
    assert!(planner.schedule().contains("ENGL 11-A"));
}
