//! Drives the migration engine over files on disk

use crate::migration::{format_report, MigrationResult, Migrator};
use crate::MigrateOptions;

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFile;
use codespan_reporting::term;
use color_eyre::Result;
use eyre::WrapErr;
use std::io::Write;
use std::path::{Path, PathBuf};
use termcolor::{Color, ColorSpec, StandardStream, WriteColor};
use tracing::info;

const SOURCE_EXT: &str = ".ws";
const MIGRATED_EXT: &str = ".2x.ws";

/// `story.ws` becomes `story.2x.ws`. Inputs without a `.ws` suffix get
/// `.2x.ws` appended so the input is never overwritten
pub fn default_output_path(input: &Path) -> PathBuf {
    let name = input.to_string_lossy();
    match name.strip_suffix(SOURCE_EXT) {
        Some(stem) => PathBuf::from(format!("{}{}", stem, MIGRATED_EXT)),
        None => PathBuf::from(format!("{}{}", name, MIGRATED_EXT)),
    }
}

/// The `.ws` files directly inside `dir`, sorted, skipping already migrated
/// `.2x.ws` files
pub fn batch_inputs(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .wrap_err_with(|| format!("Error while reading directory {}", dir.display()))?;

    let mut inputs = Vec::new();
    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(_) => continue,
        };
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => continue,
        };
        if path.is_file() && name.ends_with(SOURCE_EXT) && !name.ends_with(MIGRATED_EXT) {
            inputs.push(path);
        }
    }
    inputs.sort();
    Ok(inputs)
}

/// Migrates one file, writing the result to `output` unless `dry_run`
pub fn migrate_file(
    migrator: &Migrator,
    input: &Path,
    output: &Path,
    dry_run: bool,
) -> Result<MigrationResult> {
    let source = std::fs::read_to_string(input)
        .wrap_err_with(|| format!("Failed to read {}", input.display()))?;
    let result = migrator.migrate(&source);
    if !dry_run {
        std::fs::write(output, &result.content)
            .wrap_err_with(|| format!("Failed to write {}", output.display()))?;
        info!(input = %input.display(), output = %output.display(), "wrote migrated file");
    }
    Ok(result)
}

/// Renders every warning against the original source
fn emit_warnings(
    stdout: &mut StandardStream,
    input: &Path,
    result: &MigrationResult,
) -> Result<()> {
    let source = std::fs::read_to_string(input)?;
    let file = SimpleFile::new(input.display().to_string(), source);
    let config = term::Config::default();
    for warning in &result.warnings {
        let mut diagnostic = Diagnostic::warning()
            .with_message(warning.message.as_str())
            .with_code(warning.kind.to_string())
            .with_labels(vec![Label::primary((), warning.span.clone())]);
        if let Some(suggestion) = &warning.suggestion {
            diagnostic = diagnostic.with_notes(vec![suggestion.clone()]);
        }
        term::emit(&mut stdout.lock(), &config, &file, &diagnostic)?;
    }
    Ok(())
}

fn report(
    stdout: &mut StandardStream,
    opts: &MigrateOptions,
    input: &Path,
    output: &Path,
    result: &MigrationResult,
) -> Result<()> {
    if opts.verbose {
        writeln!(stdout, "{}", format_report(result))?;
        emit_warnings(stdout, input, result)?;
    }

    let verb = match (opts.dry_run, result.has_changes()) {
        (true, _) => "Would migrate",
        (false, true) => "Migrated",
        (false, false) => "Copied unchanged",
    };
    stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true))?;
    write!(stdout, "{}", verb)?;
    stdout.reset()?;
    writeln!(
        stdout,
        " {} -> {} ({})",
        input.display(),
        output.display(),
        result.summary()
    )?;
    Ok(())
}

/// Runs wls-migrate. Returns the process exit code
pub fn run(opts: &MigrateOptions, stdout: &mut StandardStream) -> Result<i32> {
    let migrator = Migrator::for_version(crate::reserved::TARGET_VERSION)?;

    let jobs: Vec<(PathBuf, PathBuf)> = if let Some(dir) = &opts.batch {
        let dir = Path::new(dir);
        if !dir.is_dir() {
            eprintln!("Error: directory not found: {}", dir.display());
            return Ok(1);
        }
        batch_inputs(dir)?
            .into_iter()
            .map(|input| {
                let output = default_output_path(&input);
                (input, output)
            })
            .collect()
    } else {
        let input = match &opts.input {
            Some(input) => PathBuf::from(input),
            None => {
                eprintln!("Error: no input file given (see --help)");
                return Ok(1);
            }
        };
        if !input.is_file() {
            eprintln!("Error: input file not found: {}", input.display());
            return Ok(1);
        }
        let output = opts
            .output
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| default_output_path(&input));
        vec![(input, output)]
    };

    for (input, output) in &jobs {
        let result = migrate_file(&migrator, input, output, opts.dry_run)?;
        report(stdout, opts, input, output, &result)?;
    }

    if opts.batch.is_some() {
        writeln!(stdout, "{} file(s) processed", jobs.len())?;
    }

    // Force reset of color
    stdout.flush()?;
    Ok(0)
}
