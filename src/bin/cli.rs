use std::net::IpAddr;
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sgaudit::collector::ScanSource;
use sgaudit::config::{Config, StderrPolicy, DEFAULT_CONFIG_FILE};
use sgaudit::error::AuditError;
use sgaudit::output::OutputFormat;
use sgaudit::server::state::AppState;
use sgaudit::ScanOptions;

#[derive(Parser)]
#[command(
    name = "sgaudit",
    about = "Flags security-group ingress rules open to 0.0.0.0/0",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enumerate security groups, classify open rules, write the report
    Scan {
        #[command(flatten)]
        common: CommonArgs,

        /// Output format (console, json, sarif)
        #[arg(long, short = 'f', default_value = "console")]
        format: String,

        /// Exit with status 1 when a HIGH RISK finding exists
        #[arg(long)]
        fail_on_high_risk: bool,

        /// Write rendered output to file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Run the HTTP trigger service
    Serve {
        #[command(flatten)]
        common: CommonArgs,

        /// Address to bind
        #[arg(long)]
        bind: Option<IpAddr>,

        /// Port to listen on
        #[arg(long, short = 'p', env = "SGAUDIT_PORT")]
        port: Option<u16>,

        /// Directory served for non-API paths
        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// Generate a starter .sgaudit.toml config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

/// Options shared by `scan` and `serve`. Flags and environment variables
/// override the config file.
#[derive(Args)]
struct CommonArgs {
    /// Config file path
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Analyze a captured describe-security-groups JSON file instead of
    /// calling the cloud CLI
    #[arg(long, short = 'i')]
    input: Option<PathBuf>,

    /// Directory that receives security_analysis.json
    #[arg(long, env = "SGAUDIT_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Region passed to the cloud CLI
    #[arg(long, env = "SGAUDIT_REGION")]
    region: Option<String>,

    /// Credentials profile passed to the cloud CLI
    #[arg(long, env = "SGAUDIT_PROFILE")]
    profile: Option<String>,

    /// Seconds before the cloud CLI is killed
    #[arg(long, env = "SGAUDIT_TIMEOUT")]
    timeout: Option<u64>,

    /// Failure rule for the cloud CLI (strict, exit-status)
    #[arg(long)]
    stderr_policy: Option<String>,
}

impl CommonArgs {
    fn resolve(&self) -> Result<Config, AuditError> {
        let mut config = match &self.config {
            Some(path) if !path.exists() => {
                return Err(AuditError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            Some(path) => Config::load(path)?,
            None => Config::load(&PathBuf::from(DEFAULT_CONFIG_FILE))?,
        };

        if let Some(dir) = &self.output_dir {
            config.report.output_dir = dir.clone();
        }
        if let Some(region) = &self.region {
            config.collector.region = Some(region.clone());
        }
        if let Some(profile) = &self.profile {
            config.collector.profile = Some(profile.clone());
        }
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err(AuditError::Config("--timeout must be at least 1".into()));
            }
            config.collector.timeout_secs = timeout;
        }
        if let Some(policy) = &self.stderr_policy {
            config.collector.stderr_policy =
                StderrPolicy::from_str_lenient(policy).ok_or_else(|| {
                    AuditError::Config(format!("unknown stderr policy '{policy}'"))
                })?;
        }

        Ok(config)
    }

    fn scan_options(&self, config: &Config) -> ScanOptions {
        let mut options = ScanOptions::from_config(config);
        if let Some(input) = &self.input {
            options.source = ScanSource::File(input.clone());
        }
        options
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Scan {
            common,
            format,
            fail_on_high_risk,
            output,
        } => cmd_scan(common, format, fail_on_high_risk, output),
        Commands::Serve {
            common,
            bind,
            port,
            root,
        } => cmd_serve(common, bind, port, root),
        Commands::Init { force } => cmd_init(force),
    };

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    }
}

fn cmd_scan(
    common: CommonArgs,
    format_str: String,
    fail_on_high_risk: bool,
    output_path: Option<PathBuf>,
) -> Result<i32, AuditError> {
    let format = OutputFormat::from_str_lenient(&format_str).unwrap_or_else(|| {
        eprintln!("Warning: unknown format '{}', using console", format_str);
        OutputFormat::Console
    });

    let mut config = common.resolve()?;
    if fail_on_high_risk {
        config.policy.fail_on_high_risk = true;
    }

    let options = common.scan_options(&config);
    let report = sgaudit::scan(&options)?;
    let rendered = sgaudit::render_report(&report, format)?;

    match output_path {
        Some(out) => std::fs::write(&out, &rendered)?,
        None => print!("{}", rendered),
    }

    // Exit code: 0 = pass, 1 = high-risk findings under a failing policy
    Ok(if report.verdict.pass { 0 } else { 1 })
}

fn cmd_serve(
    common: CommonArgs,
    bind: Option<IpAddr>,
    port: Option<u16>,
    root: Option<PathBuf>,
) -> Result<i32, AuditError> {
    let mut config = common.resolve()?;
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(root) = root {
        config.server.static_root = root;
    }

    let state = AppState::new(
        common.scan_options(&config),
        config.server.static_root.clone(),
    );

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(sgaudit::server::start_server(
        config.server.listen_addr(),
        state,
    ))?;

    Ok(0)
}

fn cmd_init(force: bool) -> Result<i32, AuditError> {
    let path = PathBuf::from(DEFAULT_CONFIG_FILE);

    if path.exists() && !force {
        eprintln!("{} already exists. Use --force to overwrite.", DEFAULT_CONFIG_FILE);
        return Ok(1);
    }

    std::fs::write(&path, Config::starter_toml())?;
    println!("Created {}", DEFAULT_CONFIG_FILE);

    Ok(0)
}
