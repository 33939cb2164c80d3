//! ISA catalog command-line driver.
//!
//! This binary opens the catalog database and exposes the library through subcommands:
//! 1. **Import:** Load an XED source tree or an ARM `Instructions.json` release, with metadata.
//! 2. **Instructions:** Look up, list, search, and group catalog instructions.
//! 3. **Metadata:** Inspect architectures, registers, register families, and addressing modes.
//! 4. **Audit:** Show the import-run log.
//!
//! Query output is JSON on stdout; logs go to stderr.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use isadex_core::config::Config;
use isadex_core::import::{ArmImporter, Importer, XedImporter, import_from_source};
use isadex_core::store::{PageRequest, SortDirection, SortKey, SortOrder};
use isadex_core::Store;

#[derive(Parser, Debug)]
#[command(
    name = "isadex",
    author,
    version,
    about = "ISA instruction catalog",
    long_about = "Import vendor instruction-set descriptions into a SQLite catalog and query it.\n\nExamples:\n  isadex import-xed --source xed/\n  isadex import-arm --source arm-release/ --stats\n  isadex search \"add carry\" --isa x86_64\n  isadex family x86_64 AX"
)]
struct Cli {
    /// JSON configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Database path (overrides the configuration).
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Debug logging.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Errors only.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import x86 instructions from an XED source tree.
    ImportXed {
        /// XED source directory (holding `datafiles/`, or the datafiles themselves).
        #[arg(short, long)]
        source: Option<PathBuf>,

        #[command(flatten)]
        options: ImportOptions,
    },

    /// Import AArch64 instructions from an ARM machine-readable release.
    ImportArm {
        /// Directory holding `Instructions.json`.
        #[arg(short, long)]
        source: Option<PathBuf>,

        #[command(flatten)]
        options: ImportOptions,
    },

    /// List ISA keys present in the catalog with their instruction counts.
    Isas,

    /// Show one instruction.
    Get {
        /// Architecture key.
        isa: String,
        /// Mnemonic (case-insensitive).
        mnemonic: String,
        /// Variant; omit for the variant-less form.
        #[arg(long)]
        variant: Option<String>,
    },

    /// List one ISA's instructions a page at a time.
    List {
        /// Architecture key.
        isa: String,
        #[command(flatten)]
        page: PageArgs,
        /// Sort column: mnemonic, category, extension, isa_set, description.
        #[arg(long, default_value = "mnemonic")]
        sort: String,
        /// Sort descending.
        #[arg(long)]
        desc: bool,
    },

    /// Full-text search over mnemonic, description, category, and extension.
    Search {
        /// Search terms; every term must match.
        query: String,
        /// Restrict to one architecture.
        #[arg(long)]
        isa: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },

    /// Mnemonics grouped by category.
    Groups {
        /// Architecture key.
        isa: String,
    },

    /// Show one architecture, or all of them.
    Arch {
        /// Architecture key.
        isa: Option<String>,
    },

    /// List an architecture's registers.
    Registers {
        /// Architecture key.
        isa: String,
        /// Include calling convention, type, and parent name.
        #[arg(long)]
        views: bool,
    },

    /// Show the family a register belongs to.
    Family {
        /// Architecture key.
        isa: String,
        /// Register name (case-insensitive).
        register: String,
    },

    /// List an architecture's addressing modes.
    Modes {
        /// Architecture key.
        isa: String,
    },

    /// Show the import-run log.
    Runs {
        /// Restrict to one importer ISA name.
        #[arg(long)]
        isa: Option<String>,
    },
}

#[derive(clap::Args, Debug)]
struct ImportOptions {
    /// Skip architecture, register, and addressing-mode import.
    #[arg(long)]
    skip_metadata: bool,

    /// Print a statistics report after the run.
    #[arg(long)]
    stats: bool,
}

#[derive(clap::Args, Debug)]
struct PageArgs {
    /// 1-based page number.
    #[arg(long, default_value_t = 1)]
    page: u32,

    /// Rows per page (clamped to the configured maximum).
    #[arg(long)]
    page_size: Option<u32>,
}

impl PageArgs {
    const fn request(&self) -> PageRequest {
        PageRequest {
            page: self.page,
            page_size: self.page_size,
        }
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(database) = &cli.database {
        config.storage.database_path.clone_from(database);
    }
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_import(
    store: &mut Store,
    config: &Config,
    importer: &dyn Importer,
    source: Option<PathBuf>,
    configured: Option<&Path>,
    options: &ImportOptions,
) -> Result<()> {
    let Some(source) = source.or_else(|| configured.map(Path::to_path_buf)) else {
        bail!(
            "No source directory for {}: pass --source or set it in the config file",
            importer.isa_name()
        );
    };
    let mut import_config = config.import.clone();
    import_config.skip_metadata |= options.skip_metadata;

    let summary = import_from_source(importer, store, &source, &import_config)
        .with_context(|| format!("Import from {} failed", source.display()))?;
    if options.stats {
        summary.stats.print(&summary.isa, summary.duration_seconds);
    }
    print_json(&summary)
}

#[derive(Serialize)]
struct IsaCount {
    isa: String,
    instructions: u64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let config = load_config(&cli)?;
    let db_path = &config.storage.database_path;
    let mut store = Store::open(db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?
        .with_query_config(config.query);
    info!(database = %db_path.display(), "catalog opened");

    match cli.command {
        Commands::ImportXed { source, options } => run_import(
            &mut store,
            &config,
            &XedImporter::new(),
            source,
            config.import.xed_source_dir.as_deref(),
            &options,
        ),
        Commands::ImportArm { source, options } => run_import(
            &mut store,
            &config,
            &ArmImporter::new(),
            source,
            config.import.arm_source_dir.as_deref(),
            &options,
        ),
        Commands::Isas => {
            let mut counts = Vec::new();
            for isa in store.supported_isas()? {
                let instructions = store.instruction_count(Some(&isa))?;
                counts.push(IsaCount { isa, instructions });
            }
            print_json(&counts)
        }
        Commands::Get {
            isa,
            mnemonic,
            variant,
        } => {
            let mnemonic = mnemonic.to_uppercase();
            match store.get_instruction(&isa, &mnemonic, variant.as_deref())? {
                Some(instruction) => print_json(&instruction),
                None => bail!("No instruction {mnemonic} in {isa}"),
            }
        }
        Commands::List {
            isa,
            page,
            sort,
            desc,
        } => {
            let direction = if desc { SortDirection::Desc } else { SortDirection::Asc };
            let order = SortOrder::new(SortKey::parse(&sort), direction);
            print_json(&store.list_instructions(&isa, page.request(), order)?)
        }
        Commands::Search { query, isa, page } => {
            print_json(&store.search(&query, isa.as_deref(), page.request())?)
        }
        Commands::Groups { isa } => print_json(&store.instruction_groups(&isa)?),
        Commands::Arch { isa: Some(isa) } => match store.get_architecture(&isa)? {
            Some(architecture) => print_json(&architecture),
            None => bail!("Unknown architecture {isa}"),
        },
        Commands::Arch { isa: None } => print_json(&store.list_architectures()?),
        Commands::Registers { isa, views } => {
            if views {
                print_json(&store.register_views(&isa)?)
            } else {
                print_json(&store.architecture_registers(&isa)?)
            }
        }
        Commands::Family { isa, register } => {
            let Some(found) = store.register(&isa, &register)? else {
                bail!("Unknown register {register} in {isa}");
            };
            print_json(&store.register_family(found.id)?)
        }
        Commands::Modes { isa } => print_json(&store.addressing_modes(&isa)?),
        Commands::Runs { isa } => print_json(&store.import_runs(isa.as_deref())?),
    }
}
