//! CLI argument definitions using clap derive

use crate::build::{BuildOverrides, BuildType};
use crate::config::Config;
use crate::host::{ExecutionContext, Platform};
use clap::builder::FalseyValueParser;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::{Path, PathBuf};

/// nativepack - build orchestrator for native extension modules
///
/// Validates the shared dependency cache against the host C runtime,
/// configures dependency remotes, then configures, builds and packages the
/// extension together with its interface stubs.
#[derive(Parser, Debug)]
#[command(name = "nativepack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path (defaults to nativepack.toml in the source directory)
    #[arg(short, long, global = true, env = "NATIVEPACK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log format
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full build pipeline
    Build(BuildArgs),

    /// Validate the dependency cache and configure remotes only
    Prepare(PrepareArgs),

    /// Print the detected C runtime identity
    Probe(ProbeArgs),

    /// Inspect or validate the dependency cache
    Cache(CacheArgs),

    /// List requirements declared in the dependency manifest
    Requirements(RequirementsArgs),

    /// Export local dependency recipes into the dependency cache
    Export(ExportArgs),

    /// Show configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

impl Commands {
    /// Source directory the command works on, used for config discovery
    pub fn source_dir(&self) -> Option<&Path> {
        let project = match self {
            Self::Build(args) => &args.project,
            Self::Prepare(args) => &args.project,
            Self::Probe(args) => &args.project,
            Self::Cache(args) => match &args.action {
                CacheAction::Show { project, .. } | CacheAction::Check { project, .. } => project,
            },
            Self::Requirements(args) => &args.project,
            Self::Export(args) => &args.project,
            Self::Config(args) => &args.project,
            Self::Completions(_) => return None,
        };
        Some(&project.source)
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Output format for reporting commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Plain,
    /// JSON output
    Json,
}

/// Project location
#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    /// Source directory of the project
    #[arg(short, long, default_value = ".")]
    pub source: PathBuf,
}

/// Execution environment, mostly read from CI variables
#[derive(Args, Debug, Clone, Default)]
pub struct EnvArgs {
    /// Running inside an isolated CI build container
    #[arg(long, env = "CIBUILDWHEEL", value_parser = FalseyValueParser::new())]
    pub isolated: bool,

    /// Dependency cache home (host path)
    #[arg(long, env = "CONAN_HOME")]
    pub conan_home: Option<PathBuf>,

    /// Runtime identity record file (host path)
    #[arg(long, env = "LIBC_CACHE_ID_FILE")]
    pub record_file: Option<PathBuf>,

    /// Clone of the primary remote registered as the fallback (host path)
    #[arg(long, env = "CONAN_CENTER_CLONE_PATH")]
    pub remote_clone_path: Option<PathBuf>,

    /// Mount point of the host filesystem inside the container
    #[arg(long)]
    pub mount_root: Option<PathBuf>,

    /// Dependency manager command
    #[arg(long)]
    pub conan_cmd: Option<String>,
}

impl EnvArgs {
    /// Resolve the execution context once for this run
    pub fn context(&self, config: &Config) -> ExecutionContext {
        ExecutionContext::resolve(
            self.isolated,
            Platform::detect(),
            self.mount_root
                .clone()
                .unwrap_or_else(|| config.isolation.mount_root.clone()),
            self.conan_home.clone(),
            self.record_file.clone(),
            self.remote_clone_path.clone(),
        )
    }

    /// Dependency manager command, CLI over config
    pub fn manager_cmd(&self, config: &Config) -> String {
        self.conan_cmd
            .clone()
            .unwrap_or_else(|| config.dependencies.manager.clone())
    }
}

/// Arguments for the build command
#[derive(Args, Debug)]
pub struct BuildArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    #[command(flatten)]
    pub env: EnvArgs,

    /// Scratch directory for toolchain state (default: <source>/build)
    #[arg(long)]
    pub build_dir: Option<PathBuf>,

    /// Output directory for the extension (default: <build-dir>/lib)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Build type
    #[arg(long, value_enum)]
    pub build_type: Option<BuildType>,

    /// Debug build when no --build-type is given
    #[arg(long, env = "NATIVEPACK_DEBUG_BUILD", value_parser = FalseyValueParser::new())]
    pub debug: bool,

    /// Configure command
    #[arg(long)]
    pub toolchain_cmd: Option<String>,

    /// Extra arguments passed to the configure command
    #[arg(last = true)]
    pub extra: Vec<String>,
}

impl BuildArgs {
    pub fn overrides(&self) -> BuildOverrides {
        BuildOverrides {
            source_dir: self.project.source.clone(),
            build_dir: self.build_dir.clone(),
            output_dir: self.output_dir.clone(),
            build_type: self.build_type,
            debug: self.debug,
            toolchain_cmd: self.toolchain_cmd.clone(),
            manager_cmd: self.env.conan_cmd.clone(),
            extra_args: self.extra.clone(),
        }
    }
}

/// Arguments for the prepare command
#[derive(Args, Debug)]
pub struct PrepareArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    #[command(flatten)]
    pub env: EnvArgs,
}

/// Arguments for the probe command
#[derive(Args, Debug)]
pub struct ProbeArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Interpreter binary to inspect (default: from config)
    #[arg(long)]
    pub interpreter: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

/// Arguments for the cache command
#[derive(Args, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show the recorded and live runtime identity (read-only)
    Show {
        #[command(flatten)]
        project: ProjectArgs,

        #[command(flatten)]
        env: EnvArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Validate the cache now, purging it when incompatible
    Check {
        #[command(flatten)]
        project: ProjectArgs,

        #[command(flatten)]
        env: EnvArgs,
    },
}

/// Arguments for the requirements command
#[derive(Args, Debug)]
pub struct RequirementsArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Manifest path (default: from config, relative to the source directory)
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    #[command(flatten)]
    pub env: EnvArgs,

    /// Manifest path (default: from config, relative to the source directory)
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,

    /// Recipe directory (default: from config, relative to the source directory)
    #[arg(long)]
    pub recipes_dir: Option<PathBuf>,

    /// Dependencies to export (default: from config, or all)
    pub names: Vec<String>,
}

/// Arguments for the config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug, Clone, Copy)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Show the configuration file path
    Path,
}

/// Arguments for the completions command
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ENV_VARS: &[&str] = &[
        "CIBUILDWHEEL",
        "CONAN_HOME",
        "LIBC_CACHE_ID_FILE",
        "CONAN_CENTER_CLONE_PATH",
        "NATIVEPACK_DEBUG_BUILD",
        "NATIVEPACK_CONFIG",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn cli_verifies() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    #[serial]
    fn cli_parses_build() {
        clear_env();
        let cli = Cli::parse_from([
            "nativepack",
            "build",
            "--source",
            "/src/mimir",
            "--build-type",
            "debug",
            "--toolchain-cmd",
            "./configure.sh",
            "--",
            "-G",
            "Ninja",
        ]);
        match cli.command {
            Commands::Build(args) => {
                assert_eq!(args.project.source, PathBuf::from("/src/mimir"));
                assert_eq!(args.build_type, Some(BuildType::Debug));
                assert!(!args.env.isolated);
                assert_eq!(args.extra, vec!["-G", "Ninja"]);
                let overrides = args.overrides();
                assert_eq!(overrides.toolchain_cmd.as_deref(), Some("./configure.sh"));
            }
            _ => panic!("expected Build command"),
        }
    }

    #[test]
    #[serial]
    fn build_reads_ci_environment() {
        clear_env();
        std::env::set_var("CIBUILDWHEEL", "1");
        std::env::set_var("CONAN_HOME", "/home/ci/.conan2");
        std::env::set_var("NATIVEPACK_DEBUG_BUILD", "1");
        let cli = Cli::parse_from(["nativepack", "build"]);
        clear_env();

        match cli.command {
            Commands::Build(args) => {
                assert!(args.env.isolated);
                assert!(args.debug);
                assert_eq!(args.env.conan_home, Some(PathBuf::from("/home/ci/.conan2")));
                assert_eq!(args.project.source, PathBuf::from("."));
            }
            _ => panic!("expected Build command"),
        }
    }

    #[test]
    #[serial]
    fn falsey_ci_flag_is_not_isolated() {
        clear_env();
        std::env::set_var("CIBUILDWHEEL", "0");
        let cli = Cli::parse_from(["nativepack", "prepare"]);
        clear_env();

        match cli.command {
            Commands::Prepare(args) => assert!(!args.env.isolated),
            _ => panic!("expected Prepare command"),
        }
    }

    #[test]
    #[serial]
    fn cli_parses_cache_show() {
        clear_env();
        let cli = Cli::parse_from(["nativepack", "cache", "show", "--format", "json"]);
        match cli.command {
            Commands::Cache(CacheArgs {
                action: CacheAction::Show { format, .. },
            }) => assert_eq!(format, OutputFormat::Json),
            _ => panic!("expected cache show"),
        }
    }

    #[test]
    fn cli_parses_global_flags() {
        let cli = Cli::parse_from(["nativepack", "-vv", "--log-format", "json", "probe"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_format, Some(LogFormat::Json));
        assert_eq!(cli.command.source_dir(), Some(Path::new(".")));
    }

    #[test]
    fn cli_parses_export_names() {
        let cli = Cli::parse_from(["nativepack", "export", "loki", "nauty"]);
        match cli.command {
            Commands::Export(args) => assert_eq!(args.names, vec!["loki", "nauty"]),
            _ => panic!("expected Export command"),
        }
    }

    #[test]
    fn completions_have_no_source() {
        let cli = Cli::parse_from(["nativepack", "completions", "bash"]);
        assert!(cli.command.source_dir().is_none());
    }
}
