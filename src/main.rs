use clap::Parser;
use school_atlas::server;
use school_atlas::storage::{Backend, FallbackPolicy, SqliteStore};
use std::path::PathBuf;

/// School Atlas — proximity-ranked school directory API.
///
/// Stores schools (name, address, coordinates) and lists them ordered by
/// distance from the caller's location.
///
/// Examples:
///   school-atlas
///   school-atlas --port 8080
///   school-atlas --memory
///   school-atlas --data-dir /var/lib/school-atlas --strict
#[derive(Parser)]
#[command(name = "school-atlas", version, about, long_about = None)]
struct Cli {
    /// Address to bind.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on.
    #[arg(long, short = 'p', default_value_t = 3000)]
    port: u16,

    /// Directory holding the SQLite database. Defaults to ~/.school-atlas.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Volatile in-memory storage only; skip SQLite entirely.
    #[arg(long)]
    memory: bool,

    /// Surface database failures as 500s instead of degrading to
    /// in-memory storage.
    #[arg(long)]
    strict: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let backend = if cli.memory {
        eprintln!("  Storage: in-memory (volatile, lost on restart)");
        Backend::volatile()
    } else {
        let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
        if let Err(e) = std::fs::create_dir_all(&data_dir) {
            eprintln!(
                "Error: Cannot create data directory {}: {}",
                data_dir.display(),
                e
            );
            std::process::exit(1);
        }
        let db_path = data_dir.join("schools.db");
        let policy = if cli.strict {
            FallbackPolicy::Strict
        } else {
            FallbackPolicy::Fallback
        };

        match SqliteStore::open(&db_path).await {
            Ok(store) => {
                eprintln!("  Storage: sqlite at {}", db_path.display());
                Backend::durable(store, policy)
            }
            Err(e) if policy == FallbackPolicy::Fallback => {
                eprintln!(
                    "  Warning: Cannot open database ({}). Serving from in-memory storage.",
                    e
                );
                Backend::volatile_fallback()
            }
            Err(e) => {
                eprintln!("Error: Cannot open database {}: {}", db_path.display(), e);
                std::process::exit(1);
            }
        }
    };

    server::start(&cli.host, cli.port, backend).await;
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".school-atlas")
}
