//! Command dispatch: load the requested codex and run one query against it

use std::io;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::{discover_sources, load_codex, ApiRequest, CodexSource};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings};
use crate::domain::{Codex, EntryId, EntryKind, Revision};

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let settings = Settings::load()?;

    match &cli.command {
        None => Ok(()),
        Some(Commands::Config { command }) => cmd_config(command, &settings),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        Some(Commands::Releases) => cmd_releases(&settings),
        Some(command) => {
            let codex = open_codex(cli, &settings)?;
            run_query(command, &codex, &settings)
        }
    }
}

/// Source selected by the global flags, falling back to the settings.
pub fn select_source(cli: &Cli, settings: &Settings) -> CliResult<CodexSource> {
    let revision = match &cli.revision {
        Some(raw) => raw.parse::<Revision>()?,
        None => settings.default_revision()?,
    };
    Ok(match &cli.file {
        Some(path) => {
            let release = cli
                .release
                .clone()
                .unwrap_or_else(|| settings.release_for(revision));
            CodexSource::at(revision, release, path)
        }
        None => CodexSource::locate(settings, revision, cli.release.as_deref()),
    })
}

fn open_codex(cli: &Cli, settings: &Settings) -> CliResult<Codex> {
    let source = select_source(cli, settings)?;
    debug!("source: {:?}", source);
    Ok(load_codex(&source, cli.progress || settings.progress)?)
}

/// Entry whose code equals `code`, else the first entry matching it.
pub fn resolve(codex: &Codex, code: &str) -> CliResult<EntryId> {
    let root = codex.root();
    codex
        .entries(root)
        .find(|(_, entry)| entry.code == code)
        .map(|(id, _)| id)
        .or_else(|| codex.search(root, code, None).into_iter().next())
        .ok_or_else(|| CliError::NotFound(code.to_string()))
}

#[instrument(skip(codex, settings))]
fn run_query(command: &Commands, codex: &Codex, settings: &Settings) -> CliResult<()> {
    let root = codex.root();
    match command {
        Commands::Tree { code, depth } => {
            let start = match code {
                Some(code) => resolve(codex, code)?,
                None => root,
            };
            let maxdepth = depth.map(|levels| codex.depth(start) + levels);
            for line in codex.tree(start, maxdepth) {
                output::info(&line);
            }
        }
        Commands::Search { code, maxdepth } => {
            check_maxdepth(*maxdepth)?;
            let hits = codex.search(root, code, *maxdepth);
            if hits.is_empty() {
                output::warning(&format!("no entry matches '{}'", code));
            }
            for id in hits {
                if let Some(entry) = codex.get_entry(id) {
                    output::info(entry);
                }
            }
        }
        Commands::Get { code, kind, maxdepth } => {
            check_maxdepth(*maxdepth)?;
            let kind = kind.parse::<EntryKind>()?;
            let id = codex
                .get(root, code, *maxdepth, kind)
                .ok_or_else(|| CliError::NotFound(code.clone()))?;
            if let Some(entry) = codex.get_entry(id) {
                output::info(entry);
                output::detail(&format!("depth: {}", codex.depth(id)));
                if let Some(parent) = codex.parent_of(id).and_then(|p| codex.get_entry(p)) {
                    output::detail(&format!("parent: {}", parent));
                }
            }
        }
        Commands::Exists { code } => {
            if !codex.exists(root, code, None) {
                return Err(CliError::NotFound(code.clone()));
            }
            output::success(&format!("'{}' exists", code));
        }
        Commands::Ancestry { code } => {
            let id = resolve(codex, code)?;
            print!("{}", codex.ancestry(id));
        }
        Commands::Leaves { code } => {
            let start = match code {
                Some(code) => resolve(codex, code)?,
                None => root,
            };
            for (_, entry) in codex.leaves(start) {
                output::info(entry);
            }
        }
        Commands::Info => cmd_info(codex),
        Commands::Request { code } => {
            let id = resolve(codex, code)?;
            let request = ApiRequest::describe(codex, id, &settings.language)?;
            output::info(&request);
        }
        Commands::Config { .. } | Commands::Completion { .. } | Commands::Releases => {}
    }
    Ok(())
}

/// The root sits at depth 1, so a limit below 2 would exclude every entry.
fn check_maxdepth(maxdepth: Option<usize>) -> CliResult<()> {
    match maxdepth {
        Some(limit) if limit < 2 => Err(CliError::InvalidArgs(format!(
            "--maxdepth {} excludes every entry, use at least 2",
            limit
        ))),
        _ => Ok(()),
    }
}

fn cmd_info(codex: &Codex) {
    let root = codex.root();
    if let Some(entry) = codex.get_entry(root) {
        output::header(&entry.title);
    }
    let revision = codex
        .revision()
        .map(|r| r.to_string())
        .unwrap_or_else(|| "-".to_string());
    output::detail(&format!("revision: {}", revision));
    output::detail(&format!("release:  {}", codex.release()));
    output::detail(&format!("chapters: {}", codex.chapters().len()));
    output::detail(&format!("entries:  {}", codex.len(root)));
    output::detail(&format!("leaves:   {}", codex.leaves(root).count()));
}

fn cmd_releases(settings: &Settings) -> CliResult<()> {
    let sources = discover_sources(&settings.data_dir);
    if sources.is_empty() {
        output::warning(&format!("no source files below {}", settings.data_dir.display()));
        return Ok(());
    }
    output::header(&format!("Sources in {}", settings.data_dir.display()));
    for source in sources {
        output::detail(&format!(
            "ICD-{:<6} {:<8} {}",
            source.revision.as_str(),
            source.release,
            source.path.display()
        ));
    }
    Ok(())
}

fn cmd_config(command: &ConfigCommands, settings: &Settings) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::info(&settings.to_toml()?),
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => {
                    let state = if path.exists() { "exists" } else { "not found" };
                    output::action("global", &format!("{} ({})", path.display(), state));
                }
                None => output::warning("cannot determine config directory"),
            }
            output::action("data", &settings.data_dir.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Entry;
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn test_select_source_prefers_flags_over_settings() {
        let settings = Settings {
            data_dir: PathBuf::from("/data"),
            ..Default::default()
        };

        let cli = Cli::parse_from(["icd", "-r", "11", "info"]);
        let source = select_source(&cli, &settings).unwrap();
        assert_eq!(source.revision, Revision::Rev11);
        assert_eq!(source.path, PathBuf::from("/data/icd-11/simpletabulation_2022-02.csv"));

        let cli = Cli::parse_from(["icd", "-f", "/tmp/x.xml", "--release", "2020", "info"]);
        let source = select_source(&cli, &settings).unwrap();
        assert_eq!(source.revision, Revision::Rev10Cm);
        assert_eq!(source.release, "2020");
        assert_eq!(source.path, PathBuf::from("/tmp/x.xml"));
    }

    #[test]
    fn test_select_source_rejects_unknown_revision() {
        let cli = Cli::parse_from(["icd", "-r", "12", "info"]);
        let err = select_source(&cli, &Settings::default()).unwrap_err();
        assert_eq!(err.exit_code(), crate::exitcode::USAGE);
    }

    #[test]
    fn test_maxdepth_below_two_is_rejected() {
        let codex = Codex::new("root", "test", "1");
        let search = Commands::Search {
            code: "A00".to_string(),
            maxdepth: Some(1),
        };

        let err = run_query(&search, &codex, &Settings::default()).unwrap_err();

        assert!(matches!(err, CliError::InvalidArgs(_)));
        assert_eq!(err.exit_code(), crate::exitcode::USAGE);
        assert!(check_maxdepth(Some(2)).is_ok());
        assert!(check_maxdepth(None).is_ok());
    }

    #[test]
    fn test_resolve_prefers_exact_code() {
        let mut codex = Codex::new("root", "test", "1");
        let root = codex.root();
        let a00 = codex
            .insert_under(Entry::new("A00", "Cholera", EntryKind::Category), root)
            .unwrap();
        let a001 = codex
            .insert_under(Entry::new("A00.1", "Eltor", EntryKind::Category), a00)
            .unwrap();

        assert_eq!(resolve(&codex, "A00.1").unwrap(), a001);
        assert_eq!(resolve(&codex, "A001").unwrap(), a001);
        assert_eq!(resolve(&codex, "A00").unwrap(), a00);
        assert!(matches!(resolve(&codex, "Z99"), Err(CliError::NotFound(_))));
    }
}
