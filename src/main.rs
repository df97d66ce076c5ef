use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::anyhow;
use clap::Parser as ClapParser;
use clap::Subcommand;
use indexmap::IndexMap;
use serde::Serialize;
use sqlscript::name::NameParts;
use sqlscript::scope::{Component, Filter};
use sqlscript::script::Content;
use sqlscript::tag::Attrs;
use sqlscript::{Config, Script, StatementId};

#[derive(clap::Parser)]
#[command(name = "sqlscript")]
#[command(about = "Name, filter and inspect the statements of sql scripts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the statements of one or more SQL files.
    List(ListCommand),
    /// Show the name parts, attributes and sql of one statement.
    Show(ShowCommand),
}

#[derive(clap::Args)]
struct FilterArgs {
    /// Include statements whose keyword matches PATTERN.
    #[arg(long, value_name = "PATTERN")]
    incl_kw: Vec<String>,
    /// Exclude statements whose keyword matches PATTERN.
    #[arg(long, value_name = "PATTERN")]
    excl_kw: Vec<String>,
    #[arg(long, value_name = "PATTERN")]
    incl_obj: Vec<String>,
    #[arg(long, value_name = "PATTERN")]
    excl_obj: Vec<String>,
    #[arg(long, value_name = "PATTERN")]
    incl_desc: Vec<String>,
    #[arg(long, value_name = "PATTERN")]
    excl_desc: Vec<String>,
    #[arg(long, value_name = "PATTERN")]
    incl_anchor: Vec<String>,
    #[arg(long, value_name = "PATTERN")]
    excl_anchor: Vec<String>,
    /// Include statements whose full name matches PATTERN.
    #[arg(long, value_name = "PATTERN")]
    incl_nm: Vec<String>,
    /// Exclude statements whose full name matches PATTERN.
    #[arg(long, value_name = "PATTERN")]
    excl_nm: Vec<String>,
}

impl FilterArgs {
    fn to_filter(&self) -> Filter {
        Filter::new()
            .include(Component::Keyword, &self.incl_kw)
            .exclude(Component::Keyword, &self.excl_kw)
            .include(Component::Object, &self.incl_obj)
            .exclude(Component::Object, &self.excl_obj)
            .include(Component::Description, &self.incl_desc)
            .exclude(Component::Description, &self.excl_desc)
            .include(Component::Anchor, &self.incl_anchor)
            .exclude(Component::Anchor, &self.excl_anchor)
            .include(Component::Full, &self.incl_nm)
            .exclude(Component::Full, &self.excl_nm)
    }
}

#[derive(clap::Args)]
struct ListCommand {
    /// Path to the SQL file or directory containing SQL files.
    #[arg(value_name = "SQL_[FILE|DIR]")]
    sql: PathBuf,
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[command(flatten)]
    filter: FilterArgs,
    /// Interleave markers with statements.
    #[arg(long)]
    markers: bool,
    /// Pretty-print the output.
    #[arg(long)]
    pretty: bool,
}

#[derive(clap::Args)]
struct ShowCommand {
    /// Path to the SQL file.
    #[arg(value_name = "SQL_FILE")]
    sql: PathBuf,
    /// Index (negative counts from the end) or name of the statement.
    id: String,
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Pretty-print the output.
    #[arg(long)]
    pretty: bool,
}

#[derive(Serialize)]
struct OutContent {
    kind: &'static str,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    index: Option<usize>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum OutList {
    Ok(IndexMap<usize, OutContent>),
    ErrList { error: String },
}

#[derive(Serialize)]
struct OutStatement {
    index: usize,
    generated: NameParts,
    provided: NameParts,
    resolved: NameParts,
    attrs: Attrs,
    raw_tag: String,
    is_multiline: bool,
    sql: String,
}

fn load_config(path: &Option<PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::from_path(path).map_err(|err| {
            anyhow!(
                "Failed to load configuration file {} due to error: {}",
                path.display(),
                err
            )
        }),
        None => Ok(Config::default()),
    }
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<String> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(out)
}

fn output_list(list_command: &ListCommand, config: &Config, sql_file_path: &Path) -> OutList {
    let listed = Script::from_path(sql_file_path, config.clone()).and_then(|mut script| {
        script.filtered(list_command.filter.to_filter(), |view| {
            Ok(view
                .contents(list_command.markers)
                .into_iter()
                .map(|(i, content)| {
                    let out = match content {
                        Content::Statement(statement) => OutContent {
                            kind: "statement",
                            name: statement.nm(),
                            index: Some(statement.index()),
                        },
                        Content::Marker(marker) => OutContent {
                            kind: "marker",
                            name: marker.name.clone(),
                            index: None,
                        },
                    };
                    (i, out)
                })
                .collect::<IndexMap<usize, OutContent>>())
        })
    });
    match listed {
        Ok(contents) => OutList::Ok(contents),
        Err(err) => OutList::ErrList {
            error: format!(
                "Could not list statements in file {} due to error: {}",
                sql_file_path.display(),
                err
            ),
        },
    }
}

fn output_statement(show_command: &ShowCommand, config: Config) -> anyhow::Result<OutStatement> {
    let script = Script::from_path(&show_command.sql, config)?;
    let id = match show_command.id.parse::<isize>() {
        Ok(index) => StatementId::Index(index),
        Err(_) => StatementId::Name(show_command.id.clone()),
    };
    let statement = script.statement(id)?;
    let name = statement.name();
    Ok(OutStatement {
        index: statement.index(),
        generated: name.generated(),
        provided: name.provided().clone(),
        resolved: name.resolved(),
        attrs: statement.attrs().clone(),
        raw_tag: statement.raw_tag().to_owned(),
        is_multiline: statement.is_multiline(),
        sql: statement.sql().to_owned(),
    })
}

fn main() -> anyhow::Result<()> {
    let now = Instant::now();

    env_logger::init();
    let cli = Cli::parse();

    let out_str = match &cli.command {
        Commands::List(list_command) => {
            let config = load_config(&list_command.config)?;
            let sql_file_or_dir = &list_command.sql;
            if sql_file_or_dir.is_dir() {
                let mut file_lists: IndexMap<String, OutList> = IndexMap::new();
                let sql_in_dir: Vec<_> = std::fs::read_dir(sql_file_or_dir)?
                    .filter_map(|res| res.ok())
                    .map(|entry| entry.path())
                    .filter(|file| file.extension().is_some_and(|ext| ext == "sql"))
                    .collect();

                for sql_file in sql_in_dir {
                    let out_list = output_list(list_command, &config, &sql_file);
                    file_lists.insert(
                        std::path::absolute(sql_file)?.display().to_string(),
                        out_list,
                    );
                }
                to_json(&file_lists, list_command.pretty)?
            } else {
                to_json(
                    &output_list(list_command, &config, sql_file_or_dir),
                    list_command.pretty,
                )?
            }
        }
        Commands::Show(show_command) => {
            let config = load_config(&show_command.config)?;
            let out_statement = output_statement(show_command, config).map_err(|err| {
                anyhow!(
                    "Could not show statement '{}' of file {} due to error: {}",
                    show_command.id,
                    show_command.sql.display(),
                    err
                )
            })?;
            to_json(&out_statement, show_command.pretty)?
        }
    };
    println!("{}", out_str);

    log::info!("Elapsed: {:.2?}", now.elapsed());
    Ok(())
}
