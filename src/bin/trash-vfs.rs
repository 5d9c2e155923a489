use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use trash_vfs::prelude::*;

#[derive(Debug, Parser)]
#[command(name = "trash-vfs", version, about = "Inspect and watch the trash")]
struct Cli {
    /// Use this directory as the home trash instead of $XDG_DATA_HOME/Trash.
    #[arg(long, global = true)]
    trash_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List trashed files with their restore metadata.
    List,
    /// Show the restore metadata of a trash uri.
    Info { uri: String },
    /// Resolve a trash uri to its location on disk.
    Resolve { uri: String },
    /// Print the trash contents whenever they change, until interrupted.
    Watch,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("trash-vfs: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let manager = match cli.trash_dir {
        Some(dir) => TrashManager::with_config(TrashConfig::from_env()?.with_home_trash(dir))?,
        None => TrashManager::get_default()?,
    };

    match cli.command {
        Command::List => {
            for trash in manager.trashes() {
                print_trash(&trash)?;
            }
        }
        Command::Info { uri } => {
            let resolved = manager.resolve_identifier(&parse_entry_uri(&uri)?)?;
            match resolved.trash.info(&resolved.name) {
                Some(info) => {
                    println!("Path={}", info.original_path());
                    println!("DeletionDate={}", info.deletion_date());
                }
                None => println!("no restore metadata for {}", resolved.name),
            }
        }
        Command::Resolve { uri } => {
            let resolved = manager.resolve_identifier(&parse_entry_uri(&uri)?)?;
            let mut path = resolved.trash.path(&resolved.name)?;
            if !resolved.relative_path.is_empty() {
                path.push(&resolved.relative_path);
            }
            println!("{}", path.display());
        }
        Command::Watch => watch(&manager).await?,
    }

    Ok(())
}

fn parse_entry_uri(uri: &str) -> Result<TrashUri> {
    let uri = TrashUri::parse(uri)?;
    if uri.is_root() {
        return Err(CoreError::MalformedUri(uri.to_string()));
    }
    Ok(uri)
}

fn print_trash(trash: &Trash) -> Result<()> {
    println!("# trash {} at {}", trash.id(), trash.root_directory().display());
    for file in trash.files().iter() {
        let uri = trash.uri(file)?;
        match trash.info(file) {
            Some(info) => println!(
                "{} {} {}",
                info.deletion_date(),
                info.decoded_original_path().display(),
                uri
            ),
            None => println!("????-??-??T??:??:?? {} {}", file, uri),
        }
    }
    Ok(())
}

async fn watch(manager: &Arc<TrashManager>) -> Result<()> {
    let mut subscriptions = Vec::new();
    for trash in manager.trashes() {
        let id = trash.subscribe(|change: &TrashChange| {
            for file in &change.added {
                println!("+ {}-{}", change.trash, file);
            }
            for file in &change.removed {
                println!("- {}-{}", change.trash, file);
            }
        });
        subscriptions.push((trash, id));
    }

    let empty = manager.subscribe_empty(|empty: &bool| {
        println!("trash is {}", if *empty { "empty" } else { "full" });
    });

    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("waiting for interrupt failed: {:?}", err);
    }

    manager.unsubscribe_empty(empty);
    for (trash, id) in subscriptions {
        trash.unsubscribe(id);
    }
    Ok(())
}
