use std::io;
use std::sync::Arc;

use tracing::warn;

use crate::combat::{
    calculate, serialize_report_json, write_hits_csv, CalculateOptions, CalculateRequest,
    DEFAULT_TARGET_DEFENSE,
};
use crate::compare::{bulk_entries, default_entries, rank_entries, ComparisonSettings};
use crate::config::AppConfig;
use crate::data::{load_repository, CharacterRepository};
use crate::parallel::WorkerPool;
use crate::server::{self, AppState};

const USAGE: &str = "usage: pitchsim <serve|calculate|leaderboard|list>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Serve,
    Calculate,
    Leaderboard,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Table,
    Csv,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("serve") => Some(Command::Serve),
        Some("calculate") => Some(Command::Calculate),
        Some("leaderboard") => Some(Command::Leaderboard),
        Some("list") => Some(Command::List),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    run_with_config(args, &AppConfig::from_env())
}

pub fn run_with_config(args: &[String], config: &AppConfig) -> i32 {
    let Some(command) = parse_command(args) else {
        eprintln!("{USAGE}");
        return 2;
    };
    let repository = match load_repository(&config.data_path) {
        Ok(repository) => repository,
        Err(err) => {
            eprintln!("failed to load character data: {err}");
            return 1;
        }
    };
    let pool = WorkerPool::with_workers(config.workers);

    match command {
        Command::Serve => handle_serve(repository, pool, &config.bind_addr),
        Command::Calculate => handle_calculate(&repository, args),
        Command::Leaderboard => handle_leaderboard(&repository, pool, args),
        Command::List => handle_list(&repository),
    }
}

fn handle_serve(repository: CharacterRepository, pool: WorkerPool, bind_addr: &str) -> i32 {
    let state = Arc::new(AppState::new(Arc::new(repository), pool));
    match server::run_server(bind_addr, state) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("server error: {err}");
            1
        }
    }
}

fn handle_calculate(repository: &CharacterRepository, args: &[String]) -> i32 {
    let positional = positional_args(&args[2..]);
    let Some(character) = positional.first() else {
        eprintln!(
            "usage: pitchsim calculate <character> [state] [--duration S] [--duration-ms MS] [--def N] [--atk N] [--variant V] [--table|--csv]"
        );
        return 2;
    };
    let state = positional.get(1).cloned().unwrap_or_else(|| "normal".to_string());

    let options = CalculateOptions {
        base_atk: flag_f64(args, "--atk"),
        variant: flag_value(args, "--variant").map(str::to_string),
        duration_ms: flag_f64(args, "--duration-ms"),
        duration: flag_f64(args, "--duration"),
    };
    let request = CalculateRequest::new(character.clone())
        .state(state)
        .target_defense(flag_f64(args, "--def").unwrap_or(DEFAULT_TARGET_DEFENSE))
        .options(options);

    let report = match calculate(repository, &request) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };

    match output_format(args) {
        OutputFormat::Table => {
            println!("time\tdamage\ttype\thit_index\tnote");
            for hit in &report.hits {
                let index = hit.hit_index.map(|i| i.to_string()).unwrap_or_default();
                println!(
                    "{:.3}\t{}\t{}\t{}\t{}",
                    hit.time,
                    hit.damage,
                    hit.kind.as_str(),
                    index,
                    hit.note
                );
            }
            println!(
                "total_damage={}\ttotal_time={:.3}\tdps={:.3}",
                report.total_damage, report.total_time, report.dps
            );
            0
        }
        OutputFormat::Csv => match write_hits_csv(&report, io::stdout().lock()) {
            Ok(()) => 0,
            Err(err) => {
                eprintln!("{err}");
                1
            }
        },
        OutputFormat::Json => match serialize_report_json(&report) {
            Ok(payload) => {
                println!("{payload}");
                0
            }
            Err(err) => {
                eprintln!("failed to serialize damage report: {err}");
                1
            }
        },
    }
}

fn handle_leaderboard(repository: &CharacterRepository, pool: WorkerPool, args: &[String]) -> i32 {
    let defaults = ComparisonSettings::default();
    let settings = ComparisonSettings {
        attack: flag_f64(args, "--atk").unwrap_or(defaults.attack),
        defense: flag_f64(args, "--def").unwrap_or(defaults.defense),
        duration: flag_f64(args, "--duration").unwrap_or(defaults.duration),
    };
    let role = flag_value(args, "--role");
    let include_variants = args.iter().any(|arg| arg == "--variants");
    let entries = if role.is_some() || include_variants {
        bulk_entries(repository, role, include_variants)
    } else {
        default_entries(repository)
    };

    let ranked = rank_entries(repository, &entries, &settings, &pool);
    if output_format(args) == OutputFormat::Table {
        println!("rank\tcharacter\tvariant\tdps\ttotal_damage");
        for entry in &ranked {
            println!(
                "{}\t{}\t{}\t{:.1}\t{}",
                entry.rank, entry.character, entry.variant, entry.dps, entry.total_damage
            );
        }
        return 0;
    }
    match serde_json::to_string_pretty(&ranked) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize leaderboard: {err}");
            1
        }
    }
}

fn handle_list(repository: &CharacterRepository) -> i32 {
    match serde_json::to_string_pretty(&server::api::character_list(repository)) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize character list: {err}");
            1
        }
    }
}

fn output_format(args: &[String]) -> OutputFormat {
    if args.iter().any(|arg| arg == "--table") {
        OutputFormat::Table
    } else if args.iter().any(|arg| arg == "--csv") {
        OutputFormat::Csv
    } else {
        OutputFormat::Json
    }
}

/// Flags that consume the following argument.
const VALUE_FLAGS: &[&str] = &["--duration", "--duration-ms", "--def", "--atk", "--variant", "--role"];

fn positional_args(args: &[String]) -> Vec<String> {
    let mut positional = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if VALUE_FLAGS.contains(&arg.as_str()) {
            iter.next();
        } else if !arg.starts_with("--") {
            positional.push(arg.clone());
        }
    }
    positional
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|index| args.get(index + 1))
        .map(String::as_str)
}

fn flag_f64(args: &[String], flag: &str) -> Option<f64> {
    let raw = flag_value(args, flag)?;
    match raw.parse::<f64>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(flag, value = raw, "ignoring non-numeric flag value");
            eprintln!("invalid {flag} '{raw}', using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn positional_args_skip_flag_values() {
        let raw = args(&["lancer", "--duration", "3", "hs", "--table"]);
        assert_eq!(positional_args(&raw), vec!["lancer", "hs"]);
    }

    #[test]
    fn flag_f64_rejects_garbage() {
        let raw = args(&["calculate", "x", "--def", "abc", "--atk", "1500"]);
        assert_eq!(flag_f64(&raw, "--def"), None);
        assert_eq!(flag_f64(&raw, "--atk"), Some(1500.0));
        assert_eq!(flag_f64(&raw, "--duration"), None);
    }

    #[test]
    fn parse_command_recognizes_subcommands() {
        assert_eq!(parse_command(&args(&["pitchsim", "calculate"])), Some(Command::Calculate));
        assert_eq!(parse_command(&args(&["pitchsim", "bogus"])), None);
        assert_eq!(parse_command(&args(&["pitchsim"])), None);
    }
}
