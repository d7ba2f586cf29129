use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use log::debug;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;

use dataselector::catalog::load_json_table;
use dataselector::query::executor::engine::{EngineConfig, ExecutionEngine};
use dataselector::query::executor::result::to_string_table;
use dataselector::Table;

const HISTORY_FILE: &str = ".dsql_history";

#[derive(Parser)]
#[command(author, version, about = "dsql - run SQL selects over JSON tables")]
struct Cli {
    /// Bind a table, as name=path.json (repeatable)
    #[arg(short, long = "table", value_name = "NAME=PATH", value_parser = parse_binding)]
    tables: Vec<(String, PathBuf)>,

    /// Keep the query text as typed instead of lowercasing it
    #[arg(long)]
    preserve_case: bool,

    /// Print results as JSON instead of a text table
    #[arg(long)]
    json: bool,

    /// Command to execute
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive shell
    Shell,

    /// Execute a SQL query directly
    Query {
        /// SQL query to execute
        query: String,
    },
}

fn parse_binding(arg: &str) -> std::result::Result<(String, PathBuf), String> {
    let (name, path) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=PATH, got '{}'", arg))?;

    if name.is_empty() || path.is_empty() {
        return Err(format!("expected NAME=PATH, got '{}'", arg));
    }

    Ok((name.to_string(), PathBuf::from(path)))
}

fn load_engine(cli: &Cli) -> Result<ExecutionEngine> {
    let mut tables = Vec::with_capacity(cli.tables.len());
    for (name, path) in &cli.tables {
        let table = load_json_table(name, path).with_context(|| format!("Failed to load table {}", name))?;
        debug!("loaded {} from {}", name, path.display());
        tables.push((name.clone(), table));
    }

    let config = EngineConfig {
        lowercase_input: !cli.preserve_case,
        ..EngineConfig::default()
    };

    Ok(ExecutionEngine::with_config(tables, config))
}

fn display_result(result: &Table, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&result.to_json())?);
        return Ok(());
    }

    print!("{}", to_string_table(result));
    println!("({} rows)", result.len());
    Ok(())
}

fn run_shell(engine: &mut ExecutionEngine, json: bool) -> Result<()> {
    println!("Welcome to dsql. Type 'help' for assistance or 'exit' to quit.");

    let mut rl = Editor::<(), DefaultHistory>::new()?;
    if let Err(err) = rl.load_history(HISTORY_FILE) {
        if !err.to_string().contains("No such file or directory") {
            println!("Error loading history: {}", err);
        }
    }

    loop {
        match rl.readline("dsql> ") {
            Ok(line) => {
                let _ = rl.add_history_entry(&line);

                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                match line.to_lowercase().as_str() {
                    "exit" | "quit" => {
                        println!("Goodbye!");
                        break;
                    }
                    "help" => println!("{}", help_text()),
                    _ => match engine.execute_query(line) {
                        Ok(result) => display_result(&result, json)?,
                        Err(err) => println!("Error: {}", err),
                    },
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                println!("Error: {}", err);
                break;
            }
        }
    }

    if let Err(err) = rl.save_history(HISTORY_FILE) {
        println!("Error saving history: {}", err);
    }
    Ok(())
}

fn help_text() -> String {
    [
        "Query syntax:",
        "  SELECT expr [AS alias], ... [FROM table [alias] [joins]]",
        "    [WHERE cond] [GROUP BY col, ...] [HAVING cond]",
        "    [ORDER BY col [ASC|DESC], ...] [LIMIT n] [OFFSET n]",
        "",
        "Joins:",
        "  [INNER] JOIN t alias ON cond, LEFT [OUTER] JOIN t alias ON cond,",
        "  CROSS JOIN t alias, or a comma-separated table list",
        "",
        "Functions:",
        "  COUNT(), COUNT(*), COUNT(expr), SUM(expr), AVG(expr)  - aggregates, with GROUP BY",
        "  ROUND(value[, places]), TOINT(value)                  - scalar helpers",
        "",
        "Other commands:",
        "  help                          - Display this help message",
        "  exit                          - Exit the shell",
    ]
    .join("\n")
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut engine = load_engine(&cli)?;

    match &cli.command {
        Some(Commands::Query { query }) => {
            let result = engine
                .execute_query(query)
                .map_err(|err| anyhow!("Error executing query: {}", err))?;
            display_result(&result, cli.json)?;
        }
        Some(Commands::Shell) | None => run_shell(&mut engine, cli.json)?,
    }

    Ok(())
}
