use clap::Parser;
use sched_grid::adapters::catalog_from_config;
use sched_grid::config::Command;
use sched_grid::core::render::render_timetable;
use sched_grid::domain::ports::{ConfigProvider, SectionCatalog, Storage};
use sched_grid::utils::error::{ErrorSeverity, SchedError};
use sched_grid::utils::{logger, validation::Validate};
use sched_grid::{CliConfig, LocalStorage, Schedule, ScheduleCodec, SchedulePlanner};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::debug!("CLI config: {:?}", cli);

    if let Err(e) = run(cli).await {
        // 記錄詳細錯誤信息
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };

        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run(cli: CliConfig) -> sched_grid::Result<()> {
    let config = cli.resolve()?;
    config.validate()?;
    tracing::debug!("Configuration loaded and validated");

    let codec = ScheduleCodec::from_config(&config);
    let storage = LocalStorage::new(config.output_path().to_string());
    let state_file = config.state_file().to_string();

    // 讀取上次的課表
    let mut schedule = Schedule::new(config.grid_layout()?);
    if storage.exists(&state_file).await {
        let document = codec.read(&storage, &state_file).await?;
        let report = codec.load(&document, &mut schedule);
        tracing::debug!(
            "Working schedule {}: {} restored, {} skipped",
            state_file,
            report.success_count,
            report.fail_count
        );
    }

    match &cli.command {
        Command::Show => {
            print_schedule(&schedule);
            return Ok(());
        }
        Command::Save { file } => {
            if schedule.is_empty() {
                println!("No classes to save! Add some classes first.");
                return Ok(());
            }
            let document = codec.save(&schedule);
            let filename = match file {
                Some(path) => {
                    codec.write(&LocalStorage::new(".".to_string()), path, &document).await?;
                    path.clone()
                }
                None => {
                    let name = ScheduleCodec::default_filename(chrono::Local::now().date_naive());
                    codec.write(&storage, &name, &document).await?;
                    name
                }
            };
            tracing::info!("Schedule saved: {}", filename);
            println!("✅ Schedule saved as {}", filename);
            return Ok(());
        }
        _ => {}
    }

    let catalog = catalog_from_config(&config)?;
    let mut planner = SchedulePlanner::new(catalog, schedule, codec.clone());

    match cli.command {
        Command::Courses => {
            for course in planner.courses().await? {
                println!("{}", course);
            }
        }
        Command::Sections { code } => {
            let previews = planner.sections(&code).await?;
            if previews.is_empty() {
                println!("No sections found for {}", code.trim());
            }
            for preview in previews {
                let record = &preview.record;
                let status = match &preview.problem {
                    None => "available".to_string(),
                    Some(SchedError::Conflict(conflict)) => format!("⚠ {}", conflict),
                    Some(problem) => format!("⚠ {}", problem),
                };
                println!(
                    "{} - {} | {} | {} | {} [{}]",
                    record.subject_code,
                    record.section,
                    single_line(&record.time),
                    or_tba(&record.room),
                    or_tba(&record.instructor),
                    status
                );
            }
            return Ok(());
        }
        Command::Add { code, section } => {
            let placed = planner.select(&code, &section).await?;
            println!(
                "✅ Added {} ({} {})",
                placed.label(),
                placed
                    .interval
                    .days
                    .iter()
                    .map(|day| day.name())
                    .collect::<Vec<_>>()
                    .join("/"),
                placed.interval.time_label()
            );
        }
        Command::Remove { id } => {
            if planner.drop_section(&id).await {
                println!("Removed {}", id);
            } else {
                println!("{} is not on the schedule", id);
                return Ok(());
            }
        }
        Command::Clear => {
            if planner.schedule().is_empty() {
                println!("Schedule is already empty.");
                return Ok(());
            }
            let removed = planner.clear().await;
            println!("Schedule cleared ({} class(es) removed).", removed);
        }
        Command::Load { file, yes } => {
            let document = codec.read(&LocalStorage::new(".".to_string()), &file).await?;

            if planner.would_overwrite() && !yes {
                let saved_on = document
                    .saved_date
                    .map(|date| date.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                println!(
                    "Loading this schedule will replace your current schedule with {} class(es).\n\n\
                     Current schedule: {} class(es)\nSaved on: {}\n\n\
                     Re-run with --yes to continue.",
                    document.classes.len(),
                    planner.schedule().len(),
                    saved_on
                );
                return Ok(());
            }

            let report = planner.restore(&document).await;
            println!("{}", report.summary());
            for failure in &report.failures {
                println!("  - {}: {}", failure.id, failure.reason);
            }
        }
        Command::Show | Command::Save { .. } => unreachable!("handled without a catalog"),
    }

    persist(&codec, &storage, &state_file, &planner).await
}

async fn persist<C: SectionCatalog>(
    codec: &ScheduleCodec,
    storage: &LocalStorage,
    state_file: &str,
    planner: &SchedulePlanner<C>,
) -> sched_grid::Result<()> {
    codec.write(storage, state_file, &planner.save()).await?;
    tracing::debug!("Working schedule written to {}", state_file);
    Ok(())
}

fn print_schedule(schedule: &Schedule) {
    println!("{}", render_timetable(schedule.grid()));
    println!();

    if schedule.is_empty() {
        println!("No classes added yet.");
        return;
    }

    for class in schedule.list() {
        println!(
            "{} - {} | {} | {}",
            class.record.subject_code,
            class.record.section,
            single_line(&class.record.time),
            or_tba(&class.record.room)
        );
    }
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn or_tba(text: &str) -> &str {
    if text.trim().is_empty() {
        "TBA"
    } else {
        text
    }
}
