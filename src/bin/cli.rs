//! arcsql - interactive statement inspector

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context};
use arcsql::catalog::Catalog;
use arcsql::dml::{compute_dml, compute_select_from_update, DmlRequest};
use arcsql::normalize::normalize;
use arcsql::render::{render_json_pretty, render_sql, render_sql_with_params, PlaceholderStyle};
use arcsql::rewrite::{alter_select_for_empty, rewrite_defaults, DefaultMode};
use arcsql::validate::{collect_structure_errors, validate};
use arcsql::{Config, Statement, StatementKind};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Print welcome banner
fn print_banner() {
    println!(
        r#"
 arcsql - SQL statement trees
 Statements end with ';'
 Type '.help' for help, '.quit' to exit
"#
    );
}

/// Print help message
fn print_help() {
    println!(
        r#"
Commands:
  .help                    Show this help message
  .quit                    Exit
  .tables                  List catalog tables
  .schema [table]          Show table schema
  .catalog <file>          Load a catalog file
  .mode <mode>             Output: sql, json, normalize, dml, empty, check
                           (dml on an UPDATE shows the SELECT of its rows)
  .style <style>           Placeholders: spec, long, colon, dollar,
                           question_numbered, question, values
  .pk on|off               Require a primary key for DML synthesis
  .default <param> [omit]  Set a parameter of the last statement to DEFAULT

Examples:
  SELECT id, name FROM customers WHERE id = ##id::int;
  INSERT INTO customers (id, name) VALUES (##id::int, ##name::string);
"#
    );
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Sql,
    Json,
    Normalize,
    Dml,
    Empty,
    Check,
}

impl OutputMode {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "sql" => Some(OutputMode::Sql),
            "json" => Some(OutputMode::Json),
            "normalize" => Some(OutputMode::Normalize),
            "dml" => Some(OutputMode::Dml),
            "empty" => Some(OutputMode::Empty),
            "check" => Some(OutputMode::Check),
            _ => None,
        }
    }
}

struct Session {
    catalog: Catalog,
    config: Config,
    mode: OutputMode,
    last: Option<Statement>,
}

impl Session {
    fn new(config: Config) -> anyhow::Result<Self> {
        let catalog = match &config.catalog_path {
            Some(path) => Catalog::load_from_disk(path)
                .with_context(|| format!("loading catalog {}", path.display()))?,
            None => Catalog::new(),
        };
        Ok(Self {
            catalog,
            config,
            mode: OutputMode::Sql,
            last: None,
        })
    }

    fn sql(&self, stmt: &Statement) -> anyhow::Result<String> {
        Ok(render_sql(stmt, &self.config.render_options())?)
    }

    /// Run every statement of a script through the current mode
    fn execute(&mut self, text: &str) -> anyhow::Result<()> {
        for stmt in arcsql::sql::parse_all(text)? {
            debug!(kind = %stmt.kind(), mode = ?self.mode, "statement");
            self.show(&stmt)?;
            self.last = Some(stmt);
        }
        Ok(())
    }

    fn show(&self, stmt: &Statement) -> anyhow::Result<()> {
        match self.mode {
            OutputMode::Sql => println!("{}", self.sql(stmt)?),
            OutputMode::Json => println!("{}", render_json_pretty(stmt)?),
            OutputMode::Normalize => {
                validate(stmt, self.config.validation)?;
                println!("{}", self.sql(&normalize(stmt, &self.catalog)?)?);
            }
            OutputMode::Dml if stmt.kind() == StatementKind::Update => {
                println!("{}", self.sql(&compute_select_from_update(stmt)?)?);
            }
            OutputMode::Dml => {
                let request = DmlRequest::all().require_pk(self.config.require_pk);
                let dml = compute_dml(stmt, &self.catalog, &request)?;
                for derived in dml.statements() {
                    println!("{}", self.sql(derived)?);
                }
                for (kind, error) in dml.failures() {
                    println!("-- no {}: {}", kind, error);
                }
            }
            OutputMode::Empty => println!("{}", self.sql(&alter_select_for_empty(stmt)?)?),
            OutputMode::Check => {
                let errors = collect_structure_errors(stmt);
                if errors.is_empty() {
                    println!("ok");
                } else {
                    for error in errors {
                        println!("{}", error);
                    }
                }
                let params = stmt.params()?;
                for param in params.iter() {
                    println!(
                        "  param {} type={} nullok={}",
                        param.spec.name,
                        if param.spec.is_typed() {
                            param.spec.declared_type.as_str()
                        } else {
                            "?"
                        },
                        param.spec.nullable
                    );
                }
            }
        }
        Ok(())
    }

    /// Handle special dot commands; returns false to leave the loop
    fn command(&mut self, cmd: &str) -> anyhow::Result<bool> {
        let parts: Vec<&str> = cmd.split_whitespace().collect();

        match parts.first().copied() {
            Some(".help") => print_help(),
            Some(".quit") | Some(".exit") => return Ok(false),
            Some(".tables") => {
                let tables = self.catalog.list_tables();
                if tables.is_empty() {
                    println!("No tables found.");
                } else {
                    println!("Tables:");
                    for table in tables {
                        println!("  {}", table);
                    }
                }
            }
            Some(".schema") => match parts.get(1) {
                Some(table) => println!("{}", self.catalog.get_table_info(table)?),
                None => {
                    for table in self.catalog.list_tables() {
                        println!("{}", self.catalog.get_table_info(&table)?);
                    }
                }
            },
            Some(".catalog") => {
                let Some(path) = parts.get(1) else {
                    bail!("usage: .catalog <file>");
                };
                self.catalog = Catalog::load_from_disk(path)
                    .with_context(|| format!("loading catalog {}", path))?;
                println!("{} table(s) loaded", self.catalog.list_tables().len());
            }
            Some(".mode") => {
                let mode = parts.get(1).and_then(|m| OutputMode::from_name(m));
                match mode {
                    Some(mode) => self.mode = mode,
                    None => bail!("usage: .mode sql|json|normalize|dml|empty|check"),
                }
            }
            Some(".style") => {
                let style = parts.get(1).and_then(|s| PlaceholderStyle::from_name(s));
                match style {
                    Some(style) => self.config.placeholder_style = style,
                    None => bail!("unknown placeholder style"),
                }
            }
            Some(".pk") => match parts.get(1).copied() {
                Some("on") => self.config.require_pk = true,
                Some("off") => self.config.require_pk = false,
                _ => bail!("usage: .pk on|off"),
            },
            Some(".default") => {
                let Some(name) = parts.get(1) else {
                    bail!("usage: .default <param> [omit]");
                };
                let mode = match parts.get(2).copied() {
                    Some("omit") => DefaultMode::Omit,
                    None => DefaultMode::Substitute,
                    Some(other) => bail!("unknown default mode '{}'", other),
                };
                let Some(stmt) = &self.last else {
                    bail!("no statement entered yet");
                };
                let mut params = stmt.params()?;
                params.set_default(name)?;
                let rewritten = rewrite_defaults(stmt, &params, mode)?;
                let options = self.config.render_options();
                println!("{}", render_sql_with_params(&rewritten, &options, &params)?);
            }
            Some(other) => {
                eprintln!("Unknown command: {}", other);
                eprintln!("Type '.help' for available commands.");
            }
            None => {}
        }
        Ok(true)
    }
}

/// Parse `--catalog <file>` and `--config <file>`
fn load_config() -> anyhow::Result<Config> {
    let args: Vec<String> = env::args().skip(1).collect();
    let mut config_path: Option<PathBuf> = None;
    let mut catalog_path: Option<PathBuf> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                let Some(path) = args.get(i + 1) else {
                    bail!("--config needs a file");
                };
                config_path = Some(PathBuf::from(path));
                i += 1;
            }
            "--catalog" => {
                let Some(path) = args.get(i + 1) else {
                    bail!("--catalog needs a file");
                };
                catalog_path = Some(PathBuf::from(path));
                i += 1;
            }
            other => bail!("unknown argument '{}'", other),
        }
        i += 1;
    }

    let mut config = match config_path {
        Some(path) => Config::load_from_file(&path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => Config::new(),
    };
    if let Some(path) = catalog_path {
        config = config.catalog_path(path);
    }
    Ok(config)
}

/// Main REPL loop
fn run_repl(mut session: Session) -> anyhow::Result<()> {
    let mut rl = DefaultEditor::new()?;
    print_banner();

    let mut input_buffer = String::new();
    loop {
        let prompt = if input_buffer.is_empty() {
            "arcsql> "
        } else {
            "   ...> "
        };
        let line = match rl.readline(prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                input_buffer.clear();
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let trimmed = line.trim();

        if input_buffer.is_empty() && trimmed.starts_with('.') {
            let _ = rl.add_history_entry(trimmed);
            match session.command(trimmed) {
                Ok(true) => continue,
                Ok(false) => break,
                Err(e) => {
                    eprintln!("Error: {:#}", e);
                    continue;
                }
            }
        }
        if trimmed.is_empty() {
            continue;
        }

        if !input_buffer.is_empty() {
            input_buffer.push('\n');
        }
        input_buffer.push_str(trimmed);

        // Statements are complete once they end with a semicolon
        if trimmed.ends_with(';') {
            let sql = std::mem::take(&mut input_buffer);
            let _ = rl.add_history_entry(sql.as_str());
            if let Err(e) = session.execute(&sql) {
                eprintln!("Error: {:#}", e);
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = load_config()?;
    let session = Session::new(config)?;
    run_repl(session)
}
