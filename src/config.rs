use crate::report::ReportFormat;
use crate::validators::assets::LARGE_ASSET_THRESHOLD;

use clap::{crate_version, App, Arg, ArgMatches};
use color_eyre::Result;
use eyre::{eyre, WrapErr};
use json_comments::StripComments;
use serde::Deserialize;
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use termcolor::ColorChoice;

/// Represents a unified configuration for a run of wls-lint.
///
/// Compiled from the configuration file and command-line arguments given
pub struct Config {
    /// Story files to validate (`.json`, `.twee` or `.tw`)
    pub inputs: Vec<String>,

    /// Report output format
    pub report_format: ReportFormat,

    /// Where to write the report. Printed to stdout if not given
    pub output_file: Option<String>,

    /// True if the written report should be sent to `opener`
    pub should_open: bool,

    /// Issue codes to drop
    pub allowed: Vec<String>,

    /// Issue codes to treat as errors
    pub denied: Vec<String>,

    /// Whether or not to use color output
    pub use_color: ColorChoice,

    /// Apply every available fix and save the story before reporting
    pub fix: bool,

    /// Size in bytes above which assets are reported as large
    pub large_asset_threshold: u64,
}

impl Config {
    /// Loads the [`ConfigFile`], parses the [`CliConfig`], and produces a
    /// unified `Config`
    ///
    /// [`CliConfig`]: struct.CliConfig.html
    /// [`ConfigFile`]: struct.ConfigFile.html
    pub fn build() -> Result<Self> {
        let config_file = ConfigFile::load()?;
        let cli_config = CliConfig::from_args()?;
        Ok(Config::layer(config_file, cli_config))
    }

    /// Creates a unified `Config` from the given [`ConfigFile`] and
    /// [`CliConfig`]. Command-line lists come first, then the `default`
    /// profile, then the selected profile
    ///
    /// [`CliConfig`]: struct.CliConfig.html
    /// [`ConfigFile`]: struct.ConfigFile.html
    pub fn layer(config_file: ConfigFile, cli_config: CliConfig) -> Self {
        let profiles: Vec<&LintProfile> = std::iter::once("default")
            .chain(cli_config.profile.as_deref())
            .filter_map(|name| config_file.profiles.get(name))
            .collect();

        let mut allowed = cli_config.allowed;
        let mut denied = cli_config.denied;
        for profile in profiles {
            allowed.extend(profile.allow.iter().cloned());
            denied.extend(profile.deny.iter().cloned());
        }

        Config {
            inputs: cli_config.inputs,
            report_format: cli_config.report_format,
            output_file: cli_config.output_file,
            should_open: cli_config.should_open,
            allowed,
            denied,
            use_color: cli_config.use_color,
            fix: cli_config.fix,
            large_asset_threshold: config_file
                .large_asset_threshold
                .unwrap_or(LARGE_ASSET_THRESHOLD),
        }
    }

    /// True unless color output has been turned off
    pub fn color_enabled(&self) -> bool {
        self.use_color != ColorChoice::Never
    }
}

/// Warnings to drop or promote, by issue code
#[derive(Debug, Default, Deserialize)]
pub struct LintProfile {
    #[serde(default)]
    pub allow: Vec<String>,
    #[serde(default)]
    pub deny: Vec<String>,
}

/// Settings parsed from the wlsc config file
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    /// Maps a profile name (or `default`) to the lint settings for it
    #[serde(default)]
    pub profiles: HashMap<String, LintProfile>,

    /// Overrides the large-asset threshold, in bytes
    #[serde(default)]
    pub large_asset_threshold: Option<u64>,
}

const DEFAULT_CONFIG: &str = r#"// This file defines the configuration for wls-lint
// It is mostly standard JSON, but supports //, /**/, and # style comments.
{
  "profiles": {
    // Applied on every run. Profiles selected with --profile are layered
    // over it: their lists are appended to these.
    "default": {
      // Issue codes to ignore ("allow"). Errors cannot be allowed.
      "allow": [],
      // Issue codes to treat as errors ("deny")
      "deny": []
    },
    "release": {
      "deny": [ "missing_ifid", "unreachable_passage", "undefined_variable" ]
    }
  }
  // Assets larger than this many bytes are reported
  // "large_asset_threshold": 5242880
}"#;

impl ConfigFile {
    /// Path of the config file in the user's config directory
    pub fn path() -> Result<PathBuf> {
        Ok(dirs_next::config_dir()
            .ok_or_else(|| eyre!("Error getting config directory"))?
            .join("wlsc/config.json"))
    }

    /// Loads the config file
    ///
    /// If the config file does not exist, it will try to create a default one
    /// in the config directory
    pub fn load() -> Result<Self> {
        let config_path = ConfigFile::path()?;
        if !config_path.exists() {
            if let Some(prefix) = config_path.parent() {
                std::fs::create_dir_all(prefix).wrap_err_with(|| {
                    format!("Error creating config directory: {:?}", prefix)
                })?;
            }
            let mut config_file = File::create(&config_path)
                .wrap_err_with(|| format!("Error creating config file: {:?}", config_path))?;
            config_file.write_all(DEFAULT_CONFIG.as_bytes())?;
            return ConfigFile::parse(DEFAULT_CONFIG);
        }
        ConfigFile::read(&config_path)
    }

    pub fn read(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Error reading config file: {:?}", path))?;
        ConfigFile::parse(&contents).wrap_err_with(|| format!("In config file: {:?}", path))
    }

    /// Parses config file contents, comments included
    pub fn parse(contents: &str) -> Result<Self> {
        // Strip the comments from the input (use `as_bytes()` to get a `Read`).
        let stripped = StripComments::new(contents.as_bytes());
        let config_file = serde_json::from_reader(stripped)?;
        Ok(config_file)
    }
}

fn color_arg() -> Arg<'static, 'static> {
    Arg::with_name("color")
        .help("Controls colored output: always, ansi, auto or never")
        .long("color")
        .takes_value(true)
}

fn color_choice(m: &ArgMatches) -> ColorChoice {
    match m.value_of("color").unwrap_or("auto") {
        "always" => ColorChoice::Always,
        "ansi" => ColorChoice::AlwaysAnsi,
        "auto" => {
            if atty::is(atty::Stream::Stdout) {
                ColorChoice::Auto
            } else {
                ColorChoice::Never
            }
        }
        _ => ColorChoice::Never,
    }
}

/// The command line options supplied to wls-lint
pub struct CliConfig {
    /// Story files to validate
    pub inputs: Vec<String>,

    /// Config file profile to layer over `default`
    pub profile: Option<String>,

    pub report_format: ReportFormat,

    /// The report file to write
    pub output_file: Option<String>,

    /// If true, send the report to `opener` for the user
    pub should_open: bool,

    /// List of allowed (ignored) issue codes
    pub allowed: Vec<String>,

    /// List of denied (treated as errors) issue codes
    pub denied: Vec<String>,

    /// Controls color output
    pub use_color: ColorChoice,

    /// If true, apply fixes before reporting
    pub fix: bool,
}

impl CliConfig {
    fn app() -> App<'static, 'static> {
        App::new("wls-lint")
            .about("Validates WLS stories and reports problems")
            .version(crate_version!())
            .arg(
                Arg::with_name("allow")
                    .help("Specifies issue codes to ignore. Overrides deny.")
                    .short("a")
                    .long("allow")
                    .takes_value(true)
                    .multiple(true)
                    .number_of_values(1),
            )
            .arg(color_arg())
            .arg(
                Arg::with_name("deny")
                    .help("Specifies issue codes to treat as errors")
                    .short("D")
                    .long("deny")
                    .takes_value(true)
                    .multiple(true)
                    .number_of_values(1),
            )
            .arg(
                Arg::with_name("fix")
                    .help("Applies every available fix and saves JSON stories in place")
                    .long("fix"),
            )
            .arg(
                Arg::with_name("open")
                    .help("Opens the written report")
                    .long("open"),
            )
            .arg(
                Arg::with_name("output")
                    .help("Writes the report to a file (a directory for several inputs)")
                    .short("o")
                    .long("output")
                    .takes_value(true),
            )
            .arg(
                Arg::with_name("profile")
                    .help("Selects a profile from the config file")
                    .short("p")
                    .long("profile")
                    .takes_value(true),
            )
            .arg(
                Arg::with_name("report")
                    .help("Sets the report format: console, json, junit or html")
                    .short("r")
                    .long("report")
                    .takes_value(true)
                    .default_value("console"),
            )
            .arg(
                Arg::with_name("INPUT")
                    .help("Sets the story file(s) to validate")
                    .required(true)
                    .multiple(true)
                    .index(1),
            )
    }

    /// Parses the process's command line arguments
    pub fn from_args() -> Result<Self> {
        let m = CliConfig::app().get_matches();
        CliConfig::from_matches(&m)
    }

    /// Parses the given arguments. The first item is the program name
    pub fn from_iter<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let m = CliConfig::app().get_matches_from_safe(args)?;
        CliConfig::from_matches(&m)
    }

    fn from_matches(m: &ArgMatches) -> Result<Self> {
        let values = |name: &str| -> Vec<String> {
            m.values_of(name)
                .map(|vals| vals.map(str::to_string).collect())
                .unwrap_or_default()
        };

        Ok(CliConfig {
            inputs: values("INPUT"),
            profile: m.value_of("profile").map(str::to_string),
            report_format: m.value_of("report").unwrap_or("console").parse()?,
            output_file: m.value_of("output").map(str::to_string),
            should_open: m.is_present("open"),
            allowed: values("allow"),
            denied: values("deny"),
            use_color: color_choice(m),
            fix: m.is_present("fix"),
        })
    }
}

/// The command line options supplied to wls-migrate
pub struct MigrateOptions {
    /// File to migrate
    pub input: Option<String>,

    /// Where to write the migrated file. Derived from the input if not given
    pub output: Option<String>,

    /// Directory whose `.ws` files should all be migrated
    pub batch: Option<String>,

    /// Print the report without writing anything
    pub dry_run: bool,

    /// Print the full report instead of a summary
    pub verbose: bool,

    pub use_color: ColorChoice,
}

impl MigrateOptions {
    fn app() -> App<'static, 'static> {
        App::new("wls-migrate")
            .about("Migrates WLS source files to WLS 2.0")
            .version(crate_version!())
            .arg(
                Arg::with_name("batch")
                    .help("Migrates every .ws file in the directory")
                    .long("batch")
                    .value_name("directory")
                    .takes_value(true),
            )
            .arg(color_arg())
            .arg(
                Arg::with_name("dry-run")
                    .help("Prints the report without writing any files")
                    .long("dry-run"),
            )
            .arg(
                Arg::with_name("verbose")
                    .help("Prints every change and warning")
                    .short("v")
                    .long("verbose"),
            )
            .arg(
                Arg::with_name("INPUT")
                    .help("The .ws file to migrate")
                    .index(1),
            )
            .arg(
                Arg::with_name("OUTPUT")
                    .help("Where to write the result (default: <input>.2x.ws)")
                    .index(2),
            )
    }

    /// Parses the process's command line arguments
    pub fn from_args() -> Self {
        let m = MigrateOptions::app().get_matches();
        MigrateOptions::from_matches(&m)
    }

    /// Parses the given arguments. The first item is the program name
    pub fn from_iter<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let m = MigrateOptions::app().get_matches_from_safe(args)?;
        Ok(MigrateOptions::from_matches(&m))
    }

    fn from_matches(m: &ArgMatches) -> Self {
        MigrateOptions {
            input: m.value_of("INPUT").map(str::to_string),
            output: m.value_of("OUTPUT").map(str::to_string),
            batch: m.value_of("batch").map(str::to_string),
            dry_run: m.is_present("dry-run"),
            verbose: m.is_present("verbose"),
            use_color: color_choice(m),
        }
    }
}
