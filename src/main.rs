// berri-jump - one keystroke to any project session
//
// This is the main entry point. Parses CLI args and dispatches to handlers.

use anyhow::{anyhow, bail, Context};
use berri_jump_lib::{
    config::expand_home,
    core::{Project, ProjectDetector},
    enrich::{EnrichOptions, EnrichmentPipeline, EnrichmentRecord, LocalFacts},
    mux::Tmux,
    store::{AccessStore, KeyMapStore},
    Config, Input, InteractionController, Outcome, PickerError, Row,
};
use std::env;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Log filter, e.g. `BERRI_JUMP_LOG=berri_jump_lib=debug`
const LOG_ENV: &str = "BERRI_JUMP_LOG";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("pick");

    match command {
        "version" | "-v" | "--version" => {
            println!("berri-jump v{}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        "help" | "-h" | "--help" => {
            print_usage();
            return Ok(());
        }
        _ => {}
    }

    let config = Config::load().map_err(user_error)?;
    let rest = args.get(2..).unwrap_or(&[]);

    match command {
        "pick" => handle_pick(&config).await,
        "list" => handle_list(&config).await,
        "keys" => handle_keys(&config),
        "bind" => handle_bind(&config, rest),
        "release" => handle_release(&config, rest),
        "rename" => handle_rename(&config, rest),
        "open" => handle_open(&config, rest),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            Ok(())
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Errors from the library are shown with their friendly text
fn user_error(e: PickerError) -> anyhow::Error {
    anyhow!(e.user_message())
}

fn history(config: &Config) -> AccessStore {
    AccessStore::load(config.history_path()).unwrap_or_else(|e| {
        // A broken history only costs us the ordering
        tracing::warn!("Could not read access history: {}", e);
        AccessStore::in_memory()
    })
}

fn key_store(config: &Config) -> KeyMapStore {
    KeyMapStore::new(config.keymap_path(), &config.alphabet)
}

fn tmux(config: &Config) -> anyhow::Result<Tmux> {
    let tmux = Tmux::new(config.tmux_binary.clone());
    if !tmux.is_available() {
        bail!("'{}' was not found. Is tmux installed?", config.tmux_binary);
    }
    Ok(tmux)
}

fn pipeline(config: &Config) -> EnrichmentPipeline {
    EnrichmentPipeline::new(Arc::new(LocalFacts::new(config.notes_dir.clone())))
        .with_limits(config.primary_concurrency, config.secondary_concurrency)
}

fn discover(config: &Config) -> Vec<Project> {
    let projects = ProjectDetector::discover(&config.roots, config.max_depth);
    if projects.is_empty() {
        let roots: Vec<String> = config
            .roots
            .iter()
            .map(|root| root.display().to_string())
            .collect();
        println!("No projects found under {}", roots.join(", "));
    }
    projects
}

async fn handle_pick(config: &Config) -> anyhow::Result<()> {
    let tmux = tmux(config)?;
    let projects = discover(config);
    if projects.is_empty() {
        return Ok(());
    }

    // Facts arrive while the user is already looking at the list
    let mut background = {
        let mut projects = projects.clone();
        let pipeline = pipeline(config);
        Some(tokio::spawn(async move {
            pipeline.enrich(&mut projects, &EnrichOptions::default()).await;
            projects
        }))
    };

    let mut controller =
        InteractionController::new(projects, history(config), key_store(config), Arc::new(tmux));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        if background.as_ref().is_some_and(|task| task.is_finished()) {
            if let Some(task) = background.take() {
                match task.await {
                    Ok(projects) => {
                        controller.handle(Input::ProjectsUpdated(projects));
                    }
                    Err(e) => tracing::warn!("Enrichment task failed: {}", e),
                }
            }
        }

        render(&mut controller);

        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };

        let Some(inputs) = parse_line(&line, controller.query()) else {
            println!("Unrecognised input '{}'. Run 'berri-jump help' for the picker keys.", line);
            continue;
        };

        for input in inputs {
            match controller.handle(input) {
                Outcome::Switched(name) => {
                    println!("Switched to {}", name);
                    return Ok(());
                }
                Outcome::Quit => return Ok(()),
                Outcome::BindingsChanged | Outcome::Continue => {}
            }
        }
    }
}

/// Translate one line typed in the picker into controller inputs
///
/// `None` means the line was not understood.
fn parse_line(line: &str, current_query: &str) -> Option<Vec<Input>> {
    let line = line.trim_end_matches(['\r', '\n']);

    let single = |rest: &str| {
        let mut chars = rest.chars();
        match (chars.next(), chars.next()) {
            (Some(key), None) => Some(key),
            _ => None,
        }
    };

    let inputs = match line {
        "" => vec![Input::Select],
        "j" => vec![Input::Down],
        "k" => vec![Input::Up],
        "x" => vec![Input::Kill],
        "q" => vec![Input::Quit],
        _ => {
            if let Some(text) = line.strip_prefix('/') {
                // Replace the whole query
                let mut inputs: Vec<Input> =
                    current_query.chars().map(|_| Input::Backspace).collect();
                inputs.extend(text.chars().map(Input::Char));
                inputs
            } else if let Some(key) = line.strip_prefix('@').and_then(single) {
                vec![Input::Jump(key)]
            } else if let Some(key) = line.strip_prefix('+').and_then(single) {
                vec![Input::Bind(key)]
            } else if let Some(key) = line.strip_prefix('-').and_then(single) {
                vec![Input::Release(key)]
            } else if let Some(pair) = line.strip_prefix('>') {
                let mut chars = pair.chars();
                match (chars.next(), chars.next(), chars.next()) {
                    (Some(old), Some(new), None) => vec![Input::Rename(old, new)],
                    _ => return None,
                }
            } else {
                return None;
            }
        }
    };

    Some(inputs)
}

fn render(controller: &mut InteractionController) {
    let rows = controller.rows();

    println!();
    if !controller.query().is_empty() {
        println!("Query: {}", controller.query());
    }
    if rows.is_empty() {
        println!("  (no matching projects)");
    }
    for row in &rows {
        println!("{}", format_row(row));
    }
    if let Some(status) = controller.status() {
        println!("{}", status);
    }

    print!("> ");
    let _ = std::io::stdout().flush();
}

fn format_row(row: &Row) -> String {
    let cursor = if row.selected { '>' } else { ' ' };
    let key = row
        .key
        .map(|key| format!("[{}]", key))
        .unwrap_or_else(|| "   ".to_string());
    let running = if row.running { '*' } else { ' ' };
    let name = if row.is_worktree {
        format!("  {}", row.name)
    } else {
        row.name.clone()
    };

    format!(
        "{} {} {} {:<28} {}",
        cursor,
        key,
        running,
        name,
        describe_facts(&row.facts)
    )
    .trim_end()
    .to_string()
}

fn describe_facts(facts: &EnrichmentRecord) -> String {
    let mut parts = Vec::new();

    if let Some(vcs) = &facts.vcs {
        let mut text = vcs.branch.clone().unwrap_or_else(|| "(detached)".to_string());
        if vcs.dirty_files > 0 {
            text.push_str(&format!(" ~{}", vcs.dirty_files));
        }
        if vcs.ahead > 0 {
            text.push_str(&format!(" +{}", vcs.ahead));
        }
        if vcs.behind > 0 {
            text.push_str(&format!(" -{}", vcs.behind));
        }
        parts.push(text);
    }

    if let Some(notes) = &facts.notes {
        if notes.open > 0 {
            parts.push(format!("{} open notes", notes.open));
        }
    }

    if let Some(plans) = &facts.plans {
        if plans.total_items > 0 {
            parts.push(format!("plan {}/{}", plans.done_items, plans.total_items));
        }
    }

    parts.join("  ")
}

async fn handle_list(config: &Config) -> anyhow::Result<()> {
    let mut projects = discover(config);
    if projects.is_empty() {
        return Ok(());
    }

    let report = pipeline(config)
        .enrich(&mut projects, &EnrichOptions::default())
        .await;
    tracing::debug!("{:?}", report);

    let mux = Tmux::new(config.tmux_binary.clone());
    let mut controller =
        InteractionController::new(projects, history(config), key_store(config), Arc::new(mux));

    for row in controller.rows() {
        println!("{}", format_row(&Row { selected: false, ..row }));
    }

    Ok(())
}

fn handle_keys(config: &Config) -> anyhow::Result<()> {
    let table = key_store(config).load().map_err(user_error)?;
    let entries = table.entries();

    if entries.is_empty() {
        println!("No keys bound.");
        return Ok(());
    }

    for entry in entries {
        println!("[{}] {:<24} {}", entry.key, entry.repository, entry.description);
    }
    println!("\nFree: {}", table.available_keys().iter().collect::<String>());

    Ok(())
}

fn parse_key(arg: Option<&String>, what: &str) -> anyhow::Result<char> {
    let arg = arg.ok_or_else(|| anyhow!("Missing {}", what))?;
    let mut chars = arg.chars();
    match (chars.next(), chars.next()) {
        (Some(key), None) => Ok(key),
        _ => bail!("{} must be a single character, got '{}'", what, arg),
    }
}

fn parse_path(arg: Option<&String>) -> anyhow::Result<PathBuf> {
    let arg = arg.ok_or_else(|| anyhow!("Missing project path"))?;
    let path = expand_home(&PathBuf::from(arg));
    let path = if path.is_absolute() {
        path
    } else {
        env::current_dir()
            .context("Could not read the current directory")?
            .join(path)
    };

    if !path.is_dir() {
        bail!("{} is not a directory", path.display());
    }
    Ok(path)
}

fn handle_bind(config: &Config, args: &[String]) -> anyhow::Result<()> {
    let key = parse_key(args.first(), "key")?;
    let path = parse_path(args.get(1))?;

    let (_, outcome) = key_store(config).assign(&path, key).map_err(user_error)?;

    println!("Bound '{}' to {}", outcome.key, outcome.path.display());
    if let Some((other, moved)) = outcome.displaced {
        match moved {
            Some(new_key) => println!("{} moved to '{}'", other.display(), new_key),
            None => println!("{} is now unbound", other.display()),
        }
    }
    Ok(())
}

fn handle_release(config: &Config, args: &[String]) -> anyhow::Result<()> {
    let key = parse_key(args.first(), "key")?;
    let (_, path) = key_store(config).release(key).map_err(user_error)?;
    println!("Released '{}' ({})", key, path.display());
    Ok(())
}

fn handle_rename(config: &Config, args: &[String]) -> anyhow::Result<()> {
    let old = parse_key(args.first(), "old key")?;
    let new = parse_key(args.get(1), "new key")?;
    key_store(config).rename(old, new).map_err(user_error)?;
    println!("Moved '{}' to '{}'", old, new);
    Ok(())
}

fn handle_open(config: &Config, args: &[String]) -> anyhow::Result<()> {
    let path = parse_path(args.first())?;
    let tmux = tmux(config)?;

    // Opening from inside a project means the project itself
    let root = ProjectDetector::detect(&path).map_err(user_error)?;
    let project = ProjectDetector::describe(&root);
    let mut controller =
        InteractionController::new(vec![project], history(config), key_store(config), Arc::new(tmux));

    match controller.handle(Input::Select) {
        Outcome::Switched(_) => Ok(()),
        _ => bail!(
            "{}",
            controller.status().unwrap_or("Could not open the session")
        ),
    }
}

fn print_usage() {
    println!(
        r#"berri-jump v{} - one keystroke to any project session

USAGE:
    berri-jump [COMMAND] [ARGS]

COMMANDS:
    pick                   Interactive picker (default)
    list                   List projects with their facts
    keys                   Show key bindings
    bind <key> <path>      Bind a key to a project directory
    release <key>          Remove a key binding
    rename <old> <new>     Move a binding to another key
    open <path>            Open or switch to a project's session
    version                Show version
    help                   Show this help

PICKER:
    /text      filter by text        j / k    move down / up
    <enter>    open selection        @k       open what 'k' is bound to
    +k         bind selection to k   -k       release k
    >ab        move binding a to b   x        kill selection's session
    q          quit

ENVIRONMENT:
    BERRI_JUMP_CONFIG      Path of the config file
    BERRI_JUMP_LOG         Log filter (default: warn)
"#,
        env!("CARGO_PKG_VERSION")
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use berri_jump_lib::enrich::{PlanStats, VcsStatus};

    #[test]
    fn test_parse_line_commands() {
        assert!(matches!(parse_line("", "").unwrap()[..], [Input::Select]));
        assert!(matches!(parse_line("j", "").unwrap()[..], [Input::Down]));
        assert!(matches!(parse_line("@a", "").unwrap()[..], [Input::Jump('a')]));
        assert!(matches!(parse_line("+s", "").unwrap()[..], [Input::Bind('s')]));
        assert!(matches!(parse_line("-s", "").unwrap()[..], [Input::Release('s')]));
        assert!(matches!(
            parse_line(">ab", "").unwrap()[..],
            [Input::Rename('a', 'b')]
        ));
    }

    #[test]
    fn test_parse_line_replaces_query() {
        let inputs = parse_line("/ab", "xyz").unwrap();
        assert_eq!(inputs.len(), 5);
        assert!(matches!(inputs[2], Input::Backspace));
        assert!(matches!(inputs[3], Input::Char('a')));
    }

    #[test]
    fn test_parse_line_rejects_unknown() {
        assert!(parse_line("@ab", "").is_none());
        assert!(parse_line("hello", "").is_none());
        assert!(parse_line(">a", "").is_none());
    }

    #[test]
    fn test_describe_facts() {
        let facts = EnrichmentRecord {
            vcs: Some(VcsStatus {
                branch: Some("main".to_string()),
                dirty_files: 2,
                ahead: 1,
                behind: 0,
            }),
            notes: None,
            plans: Some(PlanStats {
                files: 1,
                total_items: 4,
                done_items: 3,
            }),
        };

        assert_eq!(describe_facts(&facts), "main ~2 +1  plan 3/4");
        assert_eq!(describe_facts(&EnrichmentRecord::default()), "");
    }
}
