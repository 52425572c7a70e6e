use crate::{
    app::App,
    config::AppConfig,
    persistence,
    store::{Entry, MountFields, MountStore},
    ui,
};
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "json" => Some(OutputFormat::Json),
            "text" => Some(OutputFormat::Text),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct GlobalOptions {
    format: OutputFormat,
    file: Option<PathBuf>,
}

#[derive(Debug, PartialEq, Eq)]
enum CliAction {
    Ui { file: Option<PathBuf> },
    Command {
        command: CliCommand,
        format: OutputFormat,
        file: Option<PathBuf>,
    },
}

#[derive(Debug, PartialEq, Eq)]
enum CliCommand {
    List,
    Add(MountFields),
    Obtain(usize),
    Remove(usize),
    Reset,
    Path,
    Help,
    Version,
}

pub fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match parse_args(&args)? {
        CliAction::Ui { file } => {
            let mut app = App::initialize(file.as_deref())?;
            ui::run(&mut app)
        }
        CliAction::Command {
            command,
            format,
            file,
        } => match command {
            CliCommand::Help => {
                print_help();
                Ok(())
            }
            CliCommand::Version => {
                println!("Mount Tracker v{}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
            command => {
                let config = AppConfig::load_or_create()?;
                let path = config.mounts_path(file.as_deref());
                run_command(&path, command, format)
            }
        },
    }
}

fn parse_args(args: &[String]) -> Result<CliAction> {
    let (global, tokens) = parse_global_options(args)?;
    let Some(head) = tokens.first() else {
        return Ok(CliAction::Ui { file: global.file });
    };

    let command = match head.as_str() {
        "--help" | "-h" | "help" => CliCommand::Help,
        "--version" | "-V" | "version" => CliCommand::Version,
        "list" | "ls" => CliCommand::List,
        "add" => {
            let fields = &tokens[1..];
            if fields.len() != 4 {
                bail!("add requires <mount> <raid> <difficulty> <size>");
            }
            CliCommand::Add(MountFields::new(
                fields[0].as_str(),
                fields[1].as_str(),
                fields[2].as_str(),
                fields[3].as_str(),
            ))
        }
        "obtain" | "obtained" => CliCommand::Obtain(parse_position(head, tokens.get(1))?),
        "remove" | "rm" => CliCommand::Remove(parse_position(head, tokens.get(1))?),
        "reset" => CliCommand::Reset,
        "path" => CliCommand::Path,
        other => bail!("Unknown command: {other} (see --help)"),
    };

    Ok(CliAction::Command {
        command,
        format: global.format,
        file: global.file,
    })
}

fn parse_global_options(args: &[String]) -> Result<(GlobalOptions, Vec<String>)> {
    let mut format = OutputFormat::Text;
    let mut file = None;
    let mut tokens = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--" {
            tokens.extend(iter.by_ref().cloned());
            break;
        }
        if let Some(value) = arg.strip_prefix("--format=") {
            format = parse_format(value)?;
            continue;
        }
        if arg == "--format" {
            let value = iter.next().context("--format requires a value")?;
            format = parse_format(value)?;
            continue;
        }
        if let Some(value) = arg.strip_prefix("--file=") {
            file = Some(PathBuf::from(value));
            continue;
        }
        if arg == "--file" || arg == "-f" {
            let value = iter.next().context("--file requires a path")?;
            file = Some(PathBuf::from(value));
            continue;
        }
        tokens.push(arg.to_string());
    }

    Ok((GlobalOptions { format, file }, tokens))
}

fn parse_format(value: &str) -> Result<OutputFormat> {
    OutputFormat::parse(value)
        .with_context(|| format!("Unknown format: {value} (use 'json' or 'text')"))
}

/// Positions on the command line are 1-based, matching `list`.
fn parse_position(command: &str, value: Option<&String>) -> Result<usize> {
    let Some(value) = value else {
        bail!("{command} requires a position");
    };
    let position: usize = value
        .parse()
        .with_context(|| format!("Invalid position: {value}"))?;
    if position == 0 {
        bail!("Positions start at 1");
    }
    Ok(position - 1)
}

fn run_command(path: &Path, command: CliCommand, format: OutputFormat) -> Result<()> {
    if command == CliCommand::Path {
        return print_path(path, format);
    }

    let mut store = MountStore::from_entries(persistence::load(path)?);
    let changed = match command {
        CliCommand::List => false,
        CliCommand::Add(fields) => {
            let entry = store.add(&fields)?;
            println!("Added {}", entry.label());
            true
        }
        CliCommand::Obtain(index) => {
            let entry = store.mark_obtained(index)?;
            println!("Obtained {}", entry.base_label());
            true
        }
        CliCommand::Remove(index) => {
            let entry = store.remove(index)?;
            println!("Removed {}", entry.label());
            true
        }
        CliCommand::Reset => {
            let cleared = store.obtained_count();
            store.reset_all();
            println!("Reset {cleared} obtained mount(s)");
            true
        }
        CliCommand::Path | CliCommand::Help | CliCommand::Version => false,
    };

    if changed {
        persistence::save(store.list(), path)?;
    } else {
        print_list(store.list(), format)?;
    }
    Ok(())
}

#[derive(Serialize)]
struct MountListItem<'a> {
    position: usize,
    label: &'a str,
    obtained: bool,
}

fn list_items(entries: &[Entry]) -> Vec<MountListItem<'_>> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| MountListItem {
            position: index + 1,
            label: entry.label(),
            obtained: entry.obtained(),
        })
        .collect()
}

fn print_list(entries: &[Entry], format: OutputFormat) -> Result<()> {
    let items = list_items(entries);
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
        OutputFormat::Text => {
            if items.is_empty() {
                println!("No mounts tracked.");
            }
            for item in items {
                let obtained = if item.obtained { "x" } else { " " };
                println!("{:>3} [{obtained}] {}", item.position, item.label);
            }
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct PathOutput {
    mounts_file: String,
    exists: bool,
}

fn print_path(path: &Path, format: OutputFormat) -> Result<()> {
    let output = PathOutput {
        mounts_file: path.display().to_string(),
        exists: path.exists(),
    };
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
        OutputFormat::Text => {
            println!("Mounts file: {}", output.mounts_file);
            if !output.exists {
                println!("(not created yet)");
            }
        }
    }
    Ok(())
}

fn print_help() {
    println!("Mount Tracker v{}", env!("CARGO_PKG_VERSION"));
    println!("Usage:");
    println!("  mount-tracker                                      Launch TUI");
    println!("  mount-tracker list                                 List tracked mounts");
    println!("  mount-tracker add <mount> <raid> <difficulty> <size>");
    println!("                                                     Track a new mount");
    println!("  mount-tracker obtain <n>                           Mark mount n obtained");
    println!("  mount-tracker remove <n>                           Remove mount n");
    println!("  mount-tracker reset                                Clear every obtained mark");
    println!("  mount-tracker path                                 Show the mounts file path");
    println!();
    println!("Global options:");
    println!("  --format <json|text>                               Output format for list/path");
    println!("  -f, --file <path>                                  Use another mounts file");
    println!("  -h, --help                                         Show help");
    println!("  -V, --version                                      Show version");
    println!("  --                                                 Treat the rest as arguments");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrackerError;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn no_args_launches_ui() {
        assert_eq!(parse_args(&[]).unwrap(), CliAction::Ui { file: None });
        assert_eq!(
            parse_args(&args(&["--file", "alt.json"])).unwrap(),
            CliAction::Ui {
                file: Some(PathBuf::from("alt.json"))
            }
        );
    }

    #[test]
    fn double_dash_keeps_option_like_fields() {
        let action = parse_args(&args(&[
            "-f", "alt.json", "add", "--", "-f", "Raid", "--format", "10-man",
        ]))
        .unwrap();

        assert_eq!(
            action,
            CliAction::Command {
                command: CliCommand::Add(MountFields::new("-f", "Raid", "--format", "10-man")),
                format: OutputFormat::Text,
                file: Some(PathBuf::from("alt.json")),
            }
        );
    }

    #[test]
    fn parses_add_with_global_options() {
        let action = parse_args(&args(&[
            "--format=json",
            "add",
            "Ashes of Al'ar",
            "Kael'thas Sunstrider",
            "Heroic",
            "25-man",
            "-f",
            "list.json",
        ]))
        .unwrap();

        assert_eq!(
            action,
            CliAction::Command {
                command: CliCommand::Add(MountFields::new(
                    "Ashes of Al'ar",
                    "Kael'thas Sunstrider",
                    "Heroic",
                    "25-man"
                )),
                format: OutputFormat::Json,
                file: Some(PathBuf::from("list.json")),
            }
        );
    }

    #[test]
    fn positions_are_one_based() {
        let action = parse_args(&args(&["obtain", "2"])).unwrap();
        assert!(matches!(
            action,
            CliAction::Command {
                command: CliCommand::Obtain(1),
                ..
            }
        ));
        assert!(parse_args(&args(&["remove", "0"])).is_err());
        assert!(parse_args(&args(&["remove", "two"])).is_err());
        assert!(parse_args(&args(&["remove"])).is_err());
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_args(&args(&["add", "only", "three", "fields"])).is_err());
        assert!(parse_args(&args(&["--format", "yaml", "list"])).is_err());
        assert!(parse_args(&args(&["frobnicate"])).is_err());
    }

    #[test]
    fn commands_update_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mounts.json");

        run_command(
            &path,
            CliCommand::Add(MountFields::new("Invincible", "Icecrown Citadel", "Heroic", "25-man")),
            OutputFormat::Text,
        )
        .unwrap();
        run_command(
            &path,
            CliCommand::Add(MountFields::new("Mimiron's Head", "Ulduar", "Normal", "25-man")),
            OutputFormat::Text,
        )
        .unwrap();
        run_command(&path, CliCommand::Obtain(0), OutputFormat::Text).unwrap();
        run_command(&path, CliCommand::Remove(1), OutputFormat::Text).unwrap();

        let entries = persistence::load(&path).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].obtained());
        assert_eq!(
            entries[0].label(),
            "Invincible - Icecrown Citadel - Heroic - 25-man ✅"
        );

        run_command(&path, CliCommand::Reset, OutputFormat::Text).unwrap();
        let entries = persistence::load(&path).unwrap();
        assert!(!entries[0].obtained());
    }

    #[test]
    fn failed_commands_leave_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mounts.json");
        run_command(
            &path,
            CliCommand::Add(MountFields::new("A", "Raid", "Normal", "10-man")),
            OutputFormat::Text,
        )
        .unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        let err = run_command(&path, CliCommand::Remove(5), OutputFormat::Text).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TrackerError>(),
            Some(TrackerError::IndexOutOfRange { index: 5, len: 1 })
        ));
        let err = run_command(
            &path,
            CliCommand::Add(MountFields::new("A", "", "Normal", "10-man")),
            OutputFormat::Text,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TrackerError>(),
            Some(TrackerError::Validation { field: "raid name" })
        ));

        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn list_items_number_from_one() {
        let entries = vec![
            Entry::from(("A - R - Normal - 10-man".to_string(), false)),
            Entry::from(("B - R - Normal - 10-man ✅".to_string(), true)),
        ];
        let items = list_items(&entries);
        assert_eq!(items[1].position, 2);
        assert!(items[1].obtained);
        let raw = serde_json::to_string(&items).unwrap();
        assert!(raw.contains(r#""position":1"#));
    }
}
