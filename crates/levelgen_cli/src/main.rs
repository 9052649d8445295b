//! levelgen - write the C++ level header for a scene file.
//!
//! Run with: cargo run --bin levelgen -- assets/demo/forest.usda

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use levelgen_core::export::default_output_path;
use levelgen_core::{export_scene, read_scene, render_header, ExportOptions};

const USAGE: &str = "\
Usage: levelgen [OPTIONS] <SCENE>

Arguments:
  <SCENE>  Scene file (.json scene dump, .usda or .usd)

Options:
  -o, --output <PATH>        Header path [default: <scene dir>/<scene name>.h]
                             For JSON dumps <scene dir> is the directory of the
                             recorded host file, or the dump's own directory
                             when that does not exist on this machine
      --include-dir <DIR>    Include directory prefix [default: gen/objects]
      --stdout               Print the header instead of writing it
  -h, --help                 Print help";

/// Parsed command line.
#[derive(Debug, Default, PartialEq)]
struct Args {
    scene: PathBuf,
    output: Option<PathBuf>,
    include_dir: Option<String>,
    stdout: bool,
    help: bool,
}

impl Args {
    /// Parse arguments (without the program name).
    fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self> {
        let mut parsed = Args::default();
        let mut scene = None;
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => parsed.help = true,
                "--stdout" => parsed.stdout = true,
                "-o" | "--output" => {
                    let value = args.next().with_context(|| format!("{} needs a path", arg))?;
                    parsed.output = Some(PathBuf::from(value));
                }
                "--include-dir" => {
                    let value = args.next().context("--include-dir needs a directory")?;
                    parsed.include_dir = Some(value);
                }
                flag if flag.starts_with('-') && flag.len() > 1 => bail!("unknown option '{}'", flag),
                _ if scene.is_some() => bail!("unexpected argument '{}'", arg),
                _ => scene = Some(PathBuf::from(arg)),
            }
        }

        if parsed.help {
            return Ok(parsed);
        }
        parsed.scene = scene.context("missing <SCENE> argument")?;
        Ok(parsed)
    }

    /// Export settings for a scene whose recorded path is `scene_path`.
    fn export_options(&self, scene_path: &str) -> ExportOptions {
        let mut options = ExportOptions {
            output: self.output.clone().or_else(|| self.fallback_output(scene_path)),
            ..Default::default()
        };
        if let Some(dir) = &self.include_dir {
            options.emit.include_dir = dir.trim_end_matches('/').to_string();
        }
        options
    }

    /// Header next to the input file when the recorded scene directory is missing.
    ///
    /// Scene dumps carry the host's absolute path, which may not exist where
    /// the dump is processed.
    fn fallback_output(&self, scene_path: &str) -> Option<PathBuf> {
        let default = default_output_path(scene_path);
        let dir_exists = default
            .parent()
            .map_or(true, |dir| dir.as_os_str().is_empty() || dir.is_dir());
        if dir_exists {
            return None;
        }

        let fallback = self.scene.with_file_name(default.file_name()?);
        log::info!(
            "{} does not exist here, writing {}",
            default.display(),
            fallback.display()
        );
        Some(fallback)
    }
}

/// Export (or print to `out` with `--stdout`) the header for `args.scene`.
fn run<W: Write>(args: &Args, out: &mut W) -> Result<()> {
    let scene = read_scene(&args.scene)?;
    let options = args.export_options(&scene.filepath);

    if args.stdout {
        let text = render_header(&scene, &options.emit)?;
        out.write_all(text.as_bytes())?;
        return Ok(());
    }

    let summary = export_scene(&scene, &options)?;
    writeln!(
        out,
        "Wrote {} ({} nodes, {} includes)",
        summary.output.display(),
        summary.record_count,
        summary.linked_files.len()
    )?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let args = match Args::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}\n\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    if args.help {
        println!("{}", USAGE);
        return Ok(());
    }

    let stdout = std::io::stdout();
    run(&args, &mut stdout.lock()).with_context(|| format!("Failed to export {}", args.scene.display()))
}
