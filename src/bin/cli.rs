use chrono::{Local, NaiveDate};
use polars::prelude::{AnyValue, DataFrame};
use std::io::{self, Write};
use syllabus_planner::{
    EmptyDaysPolicy, FreeDay, HebcalDirectory, HolidaySource, LoadedSyllabus, PlanOutcome,
    PlanSettings, Planner, load_syllabus_from_csv, settings::MAX_FREE_DAY_SPAN, save_outcome_to_json, save_schedule_to_csv,
};
use tracing_subscriber::EnvFilter;

struct Session {
    settings: PlanSettings,
    syllabus: Option<LoadedSyllabus>,
    holiday_dir: Option<HebcalDirectory>,
    outcome: Option<PlanOutcome>,
}

impl Session {
    fn new() -> Self {
        Self {
            settings: PlanSettings::new(Local::now().date_naive()),
            syllabus: None,
            holiday_dir: None,
            outcome: None,
        }
    }

    fn compute(&mut self) -> Result<&PlanOutcome, String> {
        let syllabus = self
            .syllabus
            .as_ref()
            .ok_or_else(|| "No syllabus loaded. Use: load <csv_path>".to_string())?;
        let source = self.holiday_dir.as_ref().map(|dir| dir as &dyn HolidaySource);
        let outcome = Planner::new(self.settings.clone())
            .plan(&syllabus.rows, source)
            .map_err(|e| e.to_string())?;
        Ok(self.outcome.insert(outcome))
    }
}

fn cell_text(value: &AnyValue) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::String(s) => s.to_string(),
        AnyValue::UInt32(v) => v.to_string(),
        other => other.to_string(),
    }
}

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let mut cells: Vec<Vec<String>> = Vec::with_capacity(df.height());
    for row_idx in 0..df.height() {
        let row = columns
            .iter()
            .map(|col| col.get(row_idx).map(|av| cell_text(&av)).unwrap_or_default())
            .collect();
        cells.push(row);
    }

    let mut widths: Vec<usize> = col_names.iter().map(|n| n.chars().count()).collect();
    for row in &cells {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.chars().count());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let render_row = |values: &[String]| {
        let mut line = String::from("|");
        for (ci, value) in values.iter().enumerate() {
            let pad = widths[ci].saturating_sub(value.chars().count());
            line.push(' ');
            line.push_str(value);
            line.push_str(&" ".repeat(pad));
            line.push_str(" |");
        }
        line
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&col_names));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in &cells {
        out.push_str(&render_row(row));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  load <csv_path>                    Load a syllabus (Main Topic, Subtopic, Days)\n  preview                            Show syllabus summary\n  start <YYYY-MM-DD>                 Set course start date\n  break <days>|off                   Add a break of <days> working days after each topic\n  fill <days>|off                    Fill empty Days cells with <days>, or reject them\n  holidays <dir>|off                 Read Hebcal feeds from <dir>/<year>.json\n  free <date>|<start>..<end>         Add a free day or inclusive range\n  keywords <k1,k2,...>               Topic keywords that trigger exam projection\n  settings [load <json_path>]        Show current settings as JSON, or load them\n  compute                            Generate the schedule\n  show                               Show the last generated schedule\n  stats                              Show holiday, weekend, break and exam statistics\n  save <csv|json> <path>             Write the last generated schedule to disk\n  quit|exit                          Exit"
    );
}

fn print_preview(syllabus: &LoadedSyllabus) {
    let overview = syllabus.overview();
    println!("Main topics    : {}", overview.main_topics);
    println!("Total subtopics: {}", overview.subtopics);
    println!("Total days     : {}", overview.total_days);
    println!("Empty values   : {}", overview.empty_values);
}

fn print_stats(outcome: &PlanOutcome) {
    let stats = &outcome.statistics;
    println!("Break days  : {}", stats.break_days);
    println!("Weekend days: {}", stats.weekend_days);
    println!("Holidays    : {}", stats.holiday_days);
    for entry in &stats.holiday_list {
        println!("  {} {}", entry.date, entry.name);
    }
    if stats.exam_projections.is_empty() {
        println!("Exams       : none");
    }
    for projection in &stats.exam_projections {
        println!(
            "Exam        : {} on {} ({})",
            projection.main_topic, projection.exam_date, projection.day_of_week
        );
    }
}

fn print_schedule(outcome: &PlanOutcome) {
    match outcome.schedule.to_dataframe() {
        Ok(df) => println!("{}", render_df_as_text_table(&df)),
        Err(e) => println!("Error rendering schedule: {}", e),
    }
}

fn parse_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d").ok()
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let mut session = Session::new();
    println!("Syllabus Planner (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let (cmd, rest) = match input.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (input, ""),
        };

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "load" => {
                if rest.is_empty() {
                    println!("Usage: load <csv_path>");
                    continue;
                }
                match load_syllabus_from_csv(rest, session.settings.empty_days) {
                    Ok(syllabus) => {
                        println!("Loaded {} rows from {}.", syllabus.rows.len(), rest);
                        if syllabus.filled_empty_days > 0 {
                            println!(
                                "Filled {} empty value(s) in 'Days' column.",
                                syllabus.filled_empty_days
                            );
                        }
                        session.syllabus = Some(syllabus);
                        session.outcome = None;
                    }
                    Err(e) => println!("Error loading syllabus: {}", e),
                }
            }
            "preview" => match &session.syllabus {
                Some(syllabus) => print_preview(syllabus),
                None => println!("No syllabus loaded."),
            },
            "start" => match parse_date(rest) {
                Some(date) => {
                    session.settings.start_date = date;
                    println!("Start date set to {}.", date);
                }
                None => println!("Invalid date (YYYY-MM-DD)"),
            },
            "break" => match rest {
                "off" => {
                    session.settings.add_break = false;
                    println!("Breaks disabled.");
                }
                days => match days.parse::<u32>() {
                    Ok(days) => {
                        session.settings.add_break = true;
                        session.settings.break_days = days;
                        println!("Breaks of {} working day(s) enabled.", days);
                    }
                    Err(_) => println!("Usage: break <days>|off"),
                },
            },
            "fill" => match rest {
                "off" => {
                    session.settings.empty_days = EmptyDaysPolicy::Reject;
                    println!("Empty Days values will be rejected.");
                }
                days => match days.parse::<u32>() {
                    Ok(days) => {
                        session.settings.empty_days = EmptyDaysPolicy::Fill(days);
                        println!("Empty Days values will be filled with {}.", days);
                    }
                    Err(_) => println!("Usage: fill <days>|off"),
                },
            },
            "holidays" => match rest {
                "" => println!("Usage: holidays <dir>|off"),
                "off" => {
                    session.settings.consider_holidays = false;
                    session.holiday_dir = None;
                    println!("Holidays ignored.");
                }
                dir => {
                    session.settings.consider_holidays = true;
                    session.holiday_dir = Some(HebcalDirectory::new(dir));
                    println!("Holidays read from {}.", dir);
                }
            },
            "free" => match rest.parse::<FreeDay>() {
                Ok(free_day) if free_day.span_days() > u64::from(MAX_FREE_DAY_SPAN) => {
                    println!("Free day ranges may cover at most {} days.", MAX_FREE_DAY_SPAN);
                }
                Ok(free_day) => {
                    session.settings.free_days.push(free_day);
                    println!("Free day(s) added: {}.", free_day.span_days());
                }
                Err(e) => println!("Usage: free <date>|<start>..<end> ({})", e),
            },
            "keywords" => {
                session.settings.exam_keywords = rest
                    .split(',')
                    .map(|k| k.trim().to_string())
                    .filter(|k| !k.is_empty())
                    .collect();
                println!("Exam keywords: {}", session.settings.exam_keywords.join(", "));
            }
            "settings" => match rest.split_once(char::is_whitespace) {
                Some(("load", path)) => match PlanSettings::from_json_file(path.trim()) {
                    Ok(settings) => {
                        session.settings = settings;
                        session.outcome = None;
                        println!("Settings loaded from {}.", path.trim());
                    }
                    Err(e) => println!("Error loading settings: {}", e),
                },
                _ if rest.is_empty() => match serde_json::to_string_pretty(&session.settings) {
                    Ok(json) => println!("{}", json),
                    Err(e) => println!("Error: {}", e),
                },
                _ => println!("Usage: settings [load <json_path>]"),
            },
            "compute" => match session.compute() {
                Ok(outcome) => {
                    println!("Schedule generated ({})", outcome.summary.to_cli_summary());
                    print_schedule(outcome);
                }
                Err(e) => println!("Error generating schedule: {}", e),
            },
            "show" => match &session.outcome {
                Some(outcome) => print_schedule(outcome),
                None => println!("No schedule generated yet. Use: compute"),
            },
            "stats" => match &session.outcome {
                Some(outcome) => print_stats(outcome),
                None => println!("No schedule generated yet. Use: compute"),
            },
            "save" => {
                let (format, path) = match rest.split_once(char::is_whitespace) {
                    Some((format, path)) => (format, path.trim()),
                    None => {
                        println!("Usage: save <csv|json> <path>");
                        continue;
                    }
                };
                let Some(outcome) = &session.outcome else {
                    println!("No schedule generated yet. Use: compute");
                    continue;
                };
                let result = match format {
                    "csv" => save_schedule_to_csv(&outcome.schedule, path),
                    "json" => save_outcome_to_json(outcome, path),
                    _ => {
                        println!("Usage: save <csv|json> <path>");
                        continue;
                    }
                };
                match result {
                    Ok(()) => println!("Schedule saved to {}.", path),
                    Err(e) => println!("Error saving schedule: {}", e),
                }
            }
            other => println!("Unknown command '{}'. Type 'help'.", other),
        }
    }
}
