use chrono::NaiveDate;
use duty_roster::{
    AppConfig, AssignmentLedger, AssignmentView, DayKind, DutyScheduler, DutyType, MonthView,
    NewMember, Origin, RosterStore, export_assignments_to_csv, load_snapshot_from_json,
    save_snapshot_to_json, telemetry,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::io::{self, Write};
use std::sync::Arc;

fn render_row<'a>(widths: &[usize], cells: impl Iterator<Item = &'a str>) -> String {
    let mut line = String::from("|");
    for (ci, cell) in cells.enumerate() {
        let pad = widths[ci].saturating_sub(cell.chars().count());
        line.push(' ');
        line.push_str(cell);
        line.push_str(&" ".repeat(pad));
        line.push_str(" |");
    }
    line
}

fn render_text_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (ci, cell) in row.iter().enumerate() {
            if ci < widths.len() && cell.chars().count() > widths[ci] {
                widths[ci] = cell.chars().count();
            }
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&widths, headers.iter().copied()));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in rows {
        out.push_str(&render_row(&widths, row.iter().map(String::as_str)));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn render_month(view: &MonthView) -> String {
    let rows: Vec<Vec<String>> = view
        .days
        .iter()
        .map(|day| {
            let kind = match day.kind {
                DayKind::Eligible => String::new(),
                DayKind::Weekend => "weekend".to_string(),
                DayKind::Holiday => day
                    .holiday_label
                    .clone()
                    .unwrap_or_else(|| "holiday".to_string()),
            };
            let cell = |slot: &Option<AssignmentView>| match slot {
                Some(view) if view.origin == Origin::Algorithmic => view.member_name.clone(),
                Some(view) => format!("{} ({})", view.member_name, view.origin),
                None => String::new(),
            };
            vec![
                day.date.to_string(),
                day.date.format("%a").to_string(),
                kind,
                cell(&day.primary),
                cell(&day.secondary),
            ]
        })
        .collect();
    render_text_table(&["date", "day", "off", "primary", "secondary"], &rows)
}

fn print_help() {
    println!(
        "Commands:\n  help                                       Show this help\n  members                                    List members\n  member add <name> [#RRGGBB] [handle]       Add an active member\n  member toggle <id>                         Flip a member between active and inactive\n  member remove <id>                         Remove a member and their assignments\n  holidays [YYYY-MM]                         List holidays\n  holiday add <YYYY-MM-DD> [label...]        Add or relabel a holiday\n  holiday remove <YYYY-MM-DD>                Remove a holiday\n  holiday toggle <YYYY-MM-DD>                Toggle a holiday\n  generate <YYYY-MM> [seed]                  Generate the month's duties\n  show <YYYY-MM>                             Show the month calendar\n  assign <date> <primary|secondary> <member_id> [manual|wheel]\n                                             Set one slot by hand\n  unassign <date> [primary|secondary|all]    Clear a date\n  today [YYYY-MM-DD]                         Show who is on duty\n  stats [YYYY-MM]                            Per-member totals\n  save json <path>                           Write a JSON snapshot\n  load json <path>                           Replace state with a JSON snapshot\n  export csv <path> [YYYY-MM]                Export assignments as CSV\n  quit|exit                                  Exit"
    );
}

fn parse_date(s: Option<&str>) -> Result<NaiveDate, String> {
    let s = s.ok_or_else(|| "missing date (YYYY-MM-DD)".to_string())?;
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| "Invalid date (YYYY-MM-DD)".to_string())
}

fn parse_id(s: Option<&str>) -> Result<i64, String> {
    s.and_then(|s| s.parse().ok())
        .ok_or_else(|| "Invalid id".to_string())
}

fn run_member(scheduler: &DutyScheduler, parts: &mut std::str::SplitWhitespace<'_>) {
    match parts.next() {
        Some("add") => {
            let Some(name) = parts.next() else {
                println!("Usage: member add <name> [#RRGGBB] [handle]");
                return;
            };
            let mut member = NewMember::new(name);
            if let Some(color) = parts.next() {
                member.color = color.to_string();
            }
            member.contact_handle = parts.next().map(str::to_string);
            match scheduler.add_member(member) {
                Ok(member) => println!("Added member {} ({}).", member.id, member.name),
                Err(e) => println!("Error: {e}"),
            }
        }
        Some("toggle") => match parse_id(parts.next()) {
            Ok(id) => match scheduler.toggle_member(id) {
                Ok(member) => println!(
                    "Member {} is now {}.",
                    member.id,
                    if member.active { "active" } else { "inactive" }
                ),
                Err(e) => println!("Error: {e}"),
            },
            Err(e) => println!("{e}"),
        },
        Some("remove") => match parse_id(parts.next()) {
            Ok(id) => match scheduler.remove_member(id) {
                Ok(()) => println!("Removed member {id}."),
                Err(e) => println!("Error: {e}"),
            },
            Err(e) => println!("{e}"),
        },
        _ => println!("Usage: member <add|toggle|remove> ..."),
    }
}

fn run_holiday(scheduler: &DutyScheduler, parts: &mut std::str::SplitWhitespace<'_>) {
    let action = parts.next();
    let date = match parse_date(parts.next()) {
        Ok(date) => date,
        Err(e) => {
            println!("{e}");
            return;
        }
    };
    match action {
        Some("add") => {
            let label = parts.collect::<Vec<_>>().join(" ");
            match scheduler.add_holiday(date, &label) {
                Ok(holiday) => println!("Holiday {} set ({}).", holiday.date, holiday.label),
                Err(e) => println!("Error: {e}"),
            }
        }
        Some("remove") => match scheduler.remove_holiday(date) {
            Ok(()) => println!("Holiday {date} removed."),
            Err(e) => println!("Error: {e}"),
        },
        Some("toggle") => match scheduler.toggle_holiday(date) {
            Ok(true) => println!("{date} is now a holiday."),
            Ok(false) => println!("{date} is no longer a holiday."),
            Err(e) => println!("Error: {e}"),
        },
        _ => println!("Usage: holiday <add|remove|toggle> <YYYY-MM-DD> [label...]"),
    }
}

fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };
    if let Err(e) = telemetry::init_logging(&config.log_filter) {
        eprintln!("Logging disabled: {e}");
    }
    let store = match config.open_store() {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Could not open store: {e}");
            std::process::exit(2);
        }
    };
    let mut scheduler = DutyScheduler::new(store);

    println!("Duty Roster (CLI) - type 'help' for commands\n");

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

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "members" => match scheduler.list_members() {
                Ok(members) => {
                    let rows: Vec<Vec<String>> = members
                        .iter()
                        .map(|m| {
                            vec![
                                m.id.to_string(),
                                m.name.clone(),
                                m.color.clone(),
                                m.contact_handle.clone().unwrap_or_default(),
                                m.active.to_string(),
                            ]
                        })
                        .collect();
                    println!(
                        "{}",
                        render_text_table(&["id", "name", "color", "handle", "active"], &rows)
                    );
                }
                Err(e) => println!("Error: {e}"),
            },
            "member" => run_member(&scheduler, &mut parts),
            "holidays" => match scheduler.holidays(parts.next()) {
                Ok(holidays) => {
                    let rows: Vec<Vec<String>> = holidays
                        .iter()
                        .map(|h| vec![h.date.to_string(), h.label.clone()])
                        .collect();
                    println!("{}", render_text_table(&["date", "label"], &rows));
                }
                Err(e) => println!("Error: {e}"),
            },
            "holiday" => run_holiday(&scheduler, &mut parts),
            "generate" => {
                let Some(month) = parts.next() else {
                    println!("Usage: generate <YYYY-MM> [seed]");
                    continue;
                };
                let result = match parts.next() {
                    Some(seed) => match seed.parse::<u64>() {
                        Ok(seed) => {
                            scheduler.generate_with_rng(month, &mut StdRng::seed_from_u64(seed))
                        }
                        Err(_) => {
                            println!("Invalid seed");
                            continue;
                        }
                    },
                    None => scheduler.generate(month),
                };
                match result {
                    Ok(result) => {
                        println!("Generated ({})", result.to_cli_summary());
                        for skip in &result.skipped {
                            println!(
                                "Kept {} {} for member {} ({}).",
                                skip.date, skip.duty, skip.occupied_by, skip.origin
                            );
                        }
                    }
                    Err(e) => println!("Generation error: {e}"),
                }
            }
            "show" => match parts.next() {
                Some(month) => match scheduler.month_view(month) {
                    Ok(view) => println!("{}", render_month(&view)),
                    Err(e) => println!("Error: {e}"),
                },
                None => println!("Usage: show <YYYY-MM>"),
            },
            "assign" => {
                let date = match parse_date(parts.next()) {
                    Ok(date) => date,
                    Err(e) => {
                        println!("{e}");
                        continue;
                    }
                };
                let duty = match parts.next().map(str::parse::<DutyType>) {
                    Some(Ok(duty)) => duty,
                    Some(Err(e)) => {
                        println!("Error: {e}");
                        continue;
                    }
                    None => {
                        println!("Usage: assign <date> <primary|secondary> <member_id> [manual|wheel]");
                        continue;
                    }
                };
                let member_id = match parse_id(parts.next()) {
                    Ok(id) => id,
                    Err(e) => {
                        println!("{e}");
                        continue;
                    }
                };
                let origin = match parts.next().map(str::parse::<Origin>) {
                    Some(Ok(origin)) => origin,
                    Some(Err(e)) => {
                        println!("Error: {e}");
                        continue;
                    }
                    None => Origin::Manual,
                };
                match scheduler.assign(date, duty, member_id, origin) {
                    Ok(view) => println!(
                        "Assigned {} {} to {} ({}).",
                        view.date, view.duty, view.member_name, view.origin
                    ),
                    Err(e) => println!("Error: {e}"),
                }
            }
            "unassign" => {
                let date = match parse_date(parts.next()) {
                    Ok(date) => date,
                    Err(e) => {
                        println!("{e}");
                        continue;
                    }
                };
                let duty = match parts.next() {
                    None | Some("all") => None,
                    Some(raw) => match raw.parse::<DutyType>() {
                        Ok(duty) => Some(duty),
                        Err(e) => {
                            println!("Error: {e}");
                            continue;
                        }
                    },
                };
                match scheduler.unassign(date, duty) {
                    Ok(removed) => println!("Removed {removed} assignment(s) on {date}."),
                    Err(e) => println!("Error: {e}"),
                }
            }
            "today" => {
                let date = match parts.next() {
                    Some(raw) => match parse_date(Some(raw)) {
                        Ok(date) => date,
                        Err(e) => {
                            println!("{e}");
                            continue;
                        }
                    },
                    None => chrono::Local::now().date_naive(),
                };
                match scheduler.today(date) {
                    Ok(slice) => {
                        let name = |slot: &Option<AssignmentView>| {
                            slot.as_ref()
                                .map(|v| v.member_name.clone())
                                .unwrap_or_else(|| "-".to_string())
                        };
                        println!("Date      : {}", slice.date);
                        println!("Primary   : {}", name(&slice.primary));
                        println!("Secondary : {}", name(&slice.secondary));
                    }
                    Err(e) => println!("Error: {e}"),
                }
            }
            "stats" => match scheduler.member_stats(parts.next()) {
                Ok(stats) => {
                    let rows: Vec<Vec<String>> = stats
                        .iter()
                        .map(|s| {
                            vec![
                                s.member_id.to_string(),
                                s.name.clone(),
                                s.primary_count.to_string(),
                                s.secondary_count.to_string(),
                                s.total_assignments.to_string(),
                            ]
                        })
                        .collect();
                    println!(
                        "{}",
                        render_text_table(
                            &["id", "name", "primary", "secondary", "total"],
                            &rows
                        )
                    );
                }
                Err(e) => println!("Error: {e}"),
            },
            "save" | "load" => {
                let format = parts.next();
                let path = parts.next();
                match (format, path) {
                    (Some("json"), Some(path)) if cmd == "save" => {
                        match save_snapshot_to_json(scheduler.store().as_ref(), path) {
                            Ok(()) => println!("Snapshot saved to {path}."),
                            Err(e) => println!("Save error: {e}"),
                        }
                    }
                    (Some("json"), Some(path)) => match load_snapshot_from_json(path) {
                        Ok(store) => {
                            scheduler = DutyScheduler::new(Arc::new(store));
                            println!("Snapshot loaded from {path}.");
                            if let Some(db) = &config.db_path {
                                println!(
                                    "Session is now in memory; changes are no longer written to {}.",
                                    db.display()
                                );
                            }
                        }
                        Err(e) => println!("Load error: {e}"),
                    },
                    _ => println!("Usage: {cmd} json <path>"),
                }
            }
            "export" => {
                let format = parts.next();
                let path = parts.next();
                let month = parts.next();
                let (Some("csv"), Some(path)) = (format, path) else {
                    println!("Usage: export csv <path> [YYYY-MM]");
                    continue;
                };
                let store = scheduler.store();
                let assignments = match month {
                    Some(month) => month
                        .parse()
                        .map_err(|e: duty_roster::MonthParseError| e.to_string())
                        .and_then(|m| store.assignments_in(m).map_err(|e| e.to_string())),
                    None => store.all_assignments().map_err(|e| e.to_string()),
                };
                let exported = assignments.and_then(|assignments| {
                    let members = store.list_members().map_err(|e| e.to_string())?;
                    export_assignments_to_csv(&assignments, &members, path)
                        .map_err(|e| e.to_string())
                });
                match exported {
                    Ok(count) => println!("Exported {count} assignment(s) to {path}."),
                    Err(e) => println!("Export error: {e}"),
                }
            }
            _ => println!("Unknown command. Type 'help'."),
        }
    }
}
