use clap::{Parser, Subcommand};
use simple_showcase::config::{self, ShowcaseConfig};
use simple_showcase::pipeline::Showcase;
use simple_showcase::{output, server};
use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "simple-showcase")]
#[command(about = "Serve a random image from a folder with an attribution caption")]
#[command(long_about = "\
Serve a random image from a folder with an attribution caption

Every request picks one image, fits it onto a fixed-size transparent canvas,
and draws the artist's credit, taken from the filename, in a corner. Rendered
images are cached on disk; GIFs are served as-is.

Showcase structure:

  showcase/
  ├── settings.toml                # Required, may be empty (see gen-config)
  ├── fallback.png                 # Shown when nothing else can be
  ├── fonts/OpenSans-Regular.ttf   # Caption font (built-in bitmap font if missing)
  ├── images/
  │   ├── alice__cat.png           # Credit: alice
  │   ├── bob__sunset.jpg          # Credit: bob
  │   └── carol__loop.gif          # Served unmodified
  └── cache/                       # Rendered images, created on demand

Logging goes to stderr and is controlled by RUST_LOG (default: info).

Run 'simple-showcase gen-config' to generate a documented settings.toml.")]
#[command(version)]
struct Cli {
    /// Showcase directory (holds settings.toml)
    #[arg(long, default_value = ".", global = true)]
    showcase: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render one showcase image to a file or stdout
    Render {
        /// Output file (default: stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Serve showcase images over HTTP
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: SocketAddr,
    },
    /// Render every image into the cache
    Warm,
    /// Validate settings and list the images that can be shown
    Check,
    /// Print a stock settings.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Command::Render { output: out_path } => {
            let showcase = load_showcase(&cli.showcase)?;
            let served = showcase.serve()?;
            match out_path {
                Some(path) => std::fs::write(&path, &served.body)?,
                None => {
                    let mut stdout = std::io::stdout().lock();
                    stdout.write_all(&served.body)?;
                    stdout.flush()?;
                }
            }
            output::print_served(&served, &cli.showcase);
        }
        Command::Serve { bind } => {
            let showcase = Arc::new(load_showcase(&cli.showcase)?);
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(server::serve(showcase, bind))?;
        }
        Command::Warm => {
            let showcase = load_showcase(&cli.showcase)?;
            init_thread_pool(&showcase.config().processing);
            let stats = showcase.warm();
            println!("Cache: {}", stats);
        }
        Command::Check => {
            println!("==> Checking {}", cli.showcase.display());
            let showcase = load_showcase(&cli.showcase)?;
            let inventory = showcase.inventory();
            let typeface = showcase.typeface();
            output::print_check_output(showcase.config(), &inventory, typeface.as_deref());
            if inventory.is_empty() {
                return Err("no images and no fallback image: nothing to show".into());
            }
            println!("==> Showcase is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn load_showcase(root: &std::path::Path) -> Result<Showcase, config::ConfigError> {
    let config = ShowcaseConfig::load(root)?;
    Ok(Showcase::new(config))
}

/// Log to stderr so image bytes on stdout stay clean.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores: config can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
