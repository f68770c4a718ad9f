use anyhow::bail;
use clap::Parser;
use oidbulk::{DEFAULT_MAX_INFLIGHT_BATCHES, OrchestratorConfig};

/// Runtime configuration for the `oidbulk-server` binary.
///
/// All values are parsed from CLI arguments or environment variables (a
/// `.env` file is loaded first if present).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "oidbulk-server",
    version,
    about = "An HTTP service that bulk-generates ObjectId-keyed records"
)]
pub struct CliArgs {
    /// Address to listen on.
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:8080"))]
    pub server_addr: String,

    /// Maximum number of batches executing at the same time.
    ///
    /// Bounds memory (each batch holds its records until written) and the
    /// number of concurrent bulk writes against the store. Submission of
    /// further batches waits for a free slot.
    ///
    /// Environment variable: `MAX_INFLIGHT_BATCHES`
    #[arg(long, env = "MAX_INFLIGHT_BATCHES", default_value_t = DEFAULT_MAX_INFLIGHT_BATCHES)]
    pub max_inflight_batches: usize,

    /// Records generated when a request omits `total`.
    ///
    /// Environment variable: `DEFAULT_TOTAL`
    #[arg(long, env = "DEFAULT_TOTAL", default_value_t = 1_000_000)]
    pub default_total: usize,

    /// Batch size used when a request omits `batchSize`.
    ///
    /// Environment variable: `DEFAULT_BATCH_SIZE`
    #[arg(long, env = "DEFAULT_BATCH_SIZE", default_value_t = 10_000)]
    pub default_batch_size: usize,

    /// Largest `total` a single request may ask for.
    ///
    /// Environment variable: `MAX_ALLOWED_TOTAL`
    #[arg(long, env = "MAX_ALLOWED_TOTAL", default_value_t = 100_000_000)]
    pub max_allowed_total: usize,

    /// MongoDB connection string. Records are kept in process memory when
    /// unset.
    ///
    /// Environment variable: `MONGODB_URI`
    #[arg(long, env = "MONGODB_URI")]
    pub mongodb_uri: Option<String>,

    /// Database holding the `products` collection.
    ///
    /// Environment variable: `MONGODB_DATABASE`
    #[arg(long, env = "MONGODB_DATABASE", default_value_t = String::from("oidbulk"))]
    pub mongodb_database: String,

    /// Most documents the in-memory store keeps. Batches that would exceed
    /// it fail.
    ///
    /// Environment variable: `MEMORY_STORE_CAPACITY`
    #[arg(long, env = "MEMORY_STORE_CAPACITY", default_value_t = 5_000_000)]
    pub memory_store_capacity: usize,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: String,
    pub max_inflight_batches: usize,
    pub default_total: usize,
    pub default_batch_size: usize,
    pub max_allowed_total: usize,
    pub mongodb_uri: Option<String>,
    pub mongodb_database: String,
    pub memory_store_capacity: usize,
}

impl ServerConfig {
    pub const fn orchestrator(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            max_inflight_batches: self.max_inflight_batches,
        }
    }
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.max_inflight_batches == 0 {
            bail!("MAX_INFLIGHT_BATCHES must be greater than 0");
        }
        if args.default_total == 0 {
            bail!("DEFAULT_TOTAL must be greater than 0");
        }
        if args.default_batch_size == 0 {
            bail!("DEFAULT_BATCH_SIZE must be greater than 0");
        }
        if args.max_allowed_total == 0 {
            bail!("MAX_ALLOWED_TOTAL must be greater than 0");
        }
        if args.memory_store_capacity == 0 {
            bail!("MEMORY_STORE_CAPACITY must be greater than 0");
        }
        if args.mongodb_uri.is_some() && !cfg!(feature = "mongodb") {
            bail!("MONGODB_URI is set but the server was built without the `mongodb` feature");
        }
        if args.mongodb_database.is_empty() {
            bail!("MONGODB_DATABASE must not be empty");
        }
        if args.default_total > args.max_allowed_total {
            bail!(
                "DEFAULT_TOTAL ({}) exceeds MAX_ALLOWED_TOTAL ({})",
                args.default_total,
                args.max_allowed_total
            );
        }

        Ok(Self {
            server_addr: args.server_addr,
            max_inflight_batches: args.max_inflight_batches,
            default_total: args.default_total,
            default_batch_size: args.default_batch_size,
            max_allowed_total: args.max_allowed_total,
            mongodb_uri: args.mongodb_uri,
            mongodb_database: args.mongodb_database,
            memory_store_capacity: args.memory_store_capacity,
        })
    }
}
