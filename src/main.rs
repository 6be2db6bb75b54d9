use appig::config::Configuration;
use appig::generate::{GenerateOptions, Generator};
use appig::imaging::RustBackend;
use appig::output;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "appig")]
#[command(about = "Generate fixed-size image variants from declarative rules")]
#[command(long_about = "\
Generate fixed-size image variants from declarative rules

Rules live in a configuration document (appig.json by default, TOML with a
.toml extension) in the configuration directory:

  {
    \"options\": { \"rootPath\": \"ios\", \"createContentsJson\": true },
    \"rules\": {
      \"ios:icon\": {
        \"sourceFile\": \"icon.png\",
        \"images\": [
          { \"fileName\": \"icon-60@2x.png\",
            \"targetPath\": \"Assets.xcassets/AppIcon.appiconset\",
            \"size\": \"120x120\" }
        ]
      }
    }
  }

Rule selectors:
  ios:icon    the rule with exactly this name
  ios:*       every rule whose name starts with ios:
  all         every rule

Images are center-cropped to the target aspect ratio, then scaled. Set
noCrop to stretch instead. fillColor, colorize and compose are applied
after scaling.")]
#[command(version)]
struct Cli {
    /// Directory containing the configuration file
    #[arg(short = 'd', long, default_value = ".")]
    config_directory: PathBuf,

    /// Configuration file name, default appig.json (.json or .toml is appended when missing)
    #[arg(short = 'c', long)]
    config_file: Option<String>,

    /// Rule selector: a rule name, `<prefix>:*`, or `all`
    #[arg(short, long)]
    rule: Option<String>,

    /// Target directory, relative to the configured root path
    #[arg(short, long)]
    target: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Print the planned images without writing anything
    #[arg(long)]
    dry_run: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = Configuration::load(&cli.config_directory, cli.config_file.as_deref())?;
    let options = GenerateOptions {
        rule: cli.rule.unwrap_or_default(),
        target: cli.target,
        working_dir: std::env::current_dir()?,
    };
    let generator = Generator::new(&config, &options)?;
    let root = generator.target().to_path_buf();

    if cli.dry_run {
        for line in output::format_plan(&generator.plan(), &root) {
            println!("{}", line);
        }
        return Ok(());
    }

    let (tx, rx) = std::sync::mpsc::channel();
    let printer_root = root.clone();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_generate_event(&event, &printer_root) {
                println!("{}", line);
            }
        }
    });
    let result = generator.run(&RustBackend::new(), Some(tx));
    printer.join().ok();

    let report = result?;
    println!();
    println!("{}", output::format_summary(&report));
    Ok(())
}

/// Initialize logging on stderr.
///
/// Uses the `RUST_LOG` env var if set, otherwise falls back to `log_level`.
fn init_logging(log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
