//! flatdb CLI
//!
//! Command-line access to the tables of a flatdb database.

use std::process;

use clap::{Parser, Subcommand};
use flatdb::query::infer_types;
use flatdb::{Comparison, Condition, Config, Database, Entry, FieldValue, FlatDbError, Record};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

/// flatdb CLI
#[derive(Parser, Debug)]
#[command(name = "flatdb-cli")]
#[command(about = "Query and edit the tables of a flatdb database")]
#[command(version)]
struct Args {
    /// Directory holding the manifest
    #[arg(short, long, default_value = "./database")]
    data_dir: String,

    /// Manifest file name
    #[arg(short, long, default_value = "table.info")]
    manifest: String,

    /// Directory relative table folders resolve against
    #[arg(short, long, default_value = ".")]
    base_dir: String,

    /// Write through temp file + rename
    #[arg(long)]
    atomic: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List tables
    Tables,

    /// Get an entry by id
    Get {
        table: String,
        id: u64,
    },

    /// Print every entry of a table
    All {
        table: String,
    },

    /// Create an entry from field=value pairs
    Post {
        table: String,
        /// field=value pairs
        fields: Vec<String>,
    },

    /// Merge field=value pairs into an entry
    Patch {
        table: String,
        id: u64,
        /// field=value pairs
        fields: Vec<String>,
    },

    /// Delete an entry by id
    Delete {
        table: String,
        id: u64,
    },

    /// Entries where <field> <op> <value>
    Where {
        table: String,
        field: String,
        /// eq, ne, gt, lt, ge, le, contains, not-contains, starts-with, ends-with
        op: String,
        value: String,
        /// Compare numbers and booleans by value instead of as text
        #[arg(long)]
        infer: bool,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,flatdb=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tracing::debug!("flatdb CLI v{}", flatdb::VERSION);

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> flatdb::Result<()> {
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .manifest_name(&args.manifest)
        .base_dir(&args.base_dir)
        .atomic_writes(args.atomic)
        .build();

    let db = Database::open(config)?;

    match args.command {
        Commands::Tables => {
            for name in db.table_names()? {
                let table = db.table(&name)?;
                println!("{}\t{}", name, table.schema().fields().join(","));
            }
        }
        Commands::Get { table, id } => match db.get(&table, id)? {
            Some(entry) => print_json(&Record { id, value: entry })?,
            None => {
                return Err(FlatDbError::EntryNotFound { table, id });
            }
        },
        Commands::All { table } => {
            for record in db.table(&table)?.get_all()? {
                print_json(&record)?;
            }
        }
        Commands::Post { table, fields } => {
            let record = db.post(&table, parse_fields(&fields)?)?;
            print_json(&record)?;
        }
        Commands::Patch { table, id, fields } => {
            let entry = db.patch(&table, id, parse_fields(&fields)?)?;
            print_json(&Record { id, value: entry })?;
        }
        Commands::Delete { table, id } => {
            let entry = db.delete(&table, id)?;
            print_json(&Record { id, value: entry })?;
        }
        Commands::Where {
            table,
            field,
            op,
            value,
            infer,
        } => {
            let op = Comparison::parse(&op)
                .ok_or_else(|| FlatDbError::Config(format!("unknown operator: {}", op)))?;

            if infer {
                let condition = Condition::new(field, op, FieldValue::infer(&value));
                for record in db.typed_table(&table, infer_types)?.get_where(&condition)? {
                    print_json(&record)?;
                }
            } else {
                let condition = Condition::new(field, op, value);
                for record in db.get_where(&table, &condition)? {
                    print_json(&record)?;
                }
            }
        }
    }

    Ok(())
}

/// "name=Alice" "age=30" → {name: Alice, age: 30}
fn parse_fields(pairs: &[String]) -> flatdb::Result<Entry> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .ok_or_else(|| FlatDbError::Config(format!("expected field=value, got {}", pair)))
        })
        .collect()
}

fn print_json<T: Serialize>(record: &Record<T>) -> flatdb::Result<()> {
    println!("{}", serde_json::to_string(record)?);
    Ok(())
}
