use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use log::{LevelFilter, info};
use simplelog::{Config, WriteLogger};

use pagelight::HeadlessSession;
use pagelight::highlight::{PageTransform, parse_highlights};
use pagelight::iconset::{IconsetOptions, ResizeFilter, generate_iconset};
use pagelight::panic_handler::initialize_panic_handler;
use pagelight::settings;

#[derive(Parser, Debug)]
#[command(
    name = "pagelight",
    version,
    about = "PDF highlight overlays and macOS app icon sets"
)]
struct Cli {
    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Where to write the log
    #[arg(long, global = true, default_value = "pagelight.log")]
    log_file: PathBuf,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resize an image into an Apple .iconset directory
    Iconset {
        /// Source image, ideally 1024x1024
        source: PathBuf,

        /// Output directory (default: <source>.iconset)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Resampling filter (default from settings)
        #[arg(long, value_enum)]
        filter: Option<ResizeFilter>,
    },

    /// Project highlights from a JSON list onto headless pages and print
    /// the resulting overlay boxes as JSON lines
    Project {
        /// Highlight list: array of {page, text, location}
        highlights: PathBuf,

        /// Page size in PDF points
        #[arg(long, default_value = "612x792", value_parser = parse_page_size)]
        page_size: PageSize,

        /// Render scale
        #[arg(long, default_value_t = 1.0)]
        scale: f64,

        /// Page rotation in degrees (multiple of 90)
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        rotation: i32,

        /// Where the highlight y axis is anchored
        #[arg(long, value_enum, default_value_t = Origin::Top)]
        origin: Origin,

        /// Page count (default: highest page in the list)
        #[arg(long)]
        pages: Option<u32>,

        /// Only highlights whose text contains this
        #[arg(long)]
        filter: Option<String>,

        /// Only the N-th visible highlight (0-based)
        #[arg(long)]
        select: Option<usize>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct PageSize {
    width: f64,
    height: f64,
}

fn parse_page_size(s: &str) -> Result<PageSize, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|e| format!("{v:?}: {e}"))
    };
    Ok(PageSize {
        width: parse(w)?,
        height: parse(h)?,
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Origin {
    /// y measured upward from the top edge (exported highlight lists)
    Top,
    /// y measured upward from the bottom edge (plain PDF space)
    Bottom,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    WriteLogger::init(
        level,
        Config::default(),
        File::create(&cli.log_file)
            .with_context(|| format!("creating log file {}", cli.log_file.display()))?,
    )?;
    initialize_panic_handler();

    info!("Starting pagelight {}", env!("CARGO_PKG_VERSION"));
    settings::load_settings(cli.config.as_deref());

    let result = match cli.command {
        Command::Iconset {
            source,
            out,
            filter,
        } => run_iconset(&source, out, filter),
        Command::Project {
            highlights,
            page_size,
            scale,
            rotation,
            origin,
            pages,
            filter,
            select,
        } => {
            let transform = match origin {
                Origin::Top => {
                    PageTransform::top_anchored(page_size.width, page_size.height, scale, rotation)
                }
                Origin::Bottom => {
                    PageTransform::new(page_size.width, page_size.height, scale, rotation)
                }
            }?;
            run_project(&highlights, transform, pages, filter.as_deref(), select)
        }
    };

    info!("Shutting down pagelight");
    result
}

fn run_iconset(source: &Path, out: Option<PathBuf>, filter: Option<ResizeFilter>) -> Result<()> {
    if let Some(filter) = filter {
        settings::set_iconset_filter(filter);
    }
    let options = IconsetOptions {
        out_dir: out,
        filter: settings::get_iconset_filter(),
    };

    let written = generate_iconset(source, &options)?;
    for path in &written {
        println!("{}", path.display());
    }
    Ok(())
}

fn run_project(
    highlights: &Path,
    transform: PageTransform,
    pages: Option<u32>,
    filter: Option<&str>,
    select: Option<usize>,
) -> Result<()> {
    let json = fs::read_to_string(highlights)
        .with_context(|| format!("reading {}", highlights.display()))?;
    let records = parse_highlights(&json)
        .with_context(|| format!("parsing {}", highlights.display()))?;

    let page_count = pages
        .or_else(|| records.iter().map(|r| r.page).max())
        .unwrap_or(0);
    info!(
        "Projecting {} highlights over {page_count} pages, viewport {:?}",
        records.len(),
        transform.viewport_size()
    );

    let mut session = HeadlessSession::new(
        page_count,
        transform,
        settings::get_projector_config(),
        settings::get_filter_debounce(),
    );
    session.panel_mut().load(records);
    if let Some(query) = filter {
        session.apply_filter(query);
    }

    let reports = match select {
        Some(index) => {
            let visible = session.panel().visible_len();
            let Some(report) = session.select(index) else {
                bail!("--select {index} is out of range ({visible} visible highlights)");
            };
            vec![report]
        }
        None => session.select_all(),
    };
    session.clear();

    for report in &reports {
        println!("{}", serde_json::to_string(report)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_parsing() {
        assert_eq!(
            parse_page_size("612x792"),
            Ok(PageSize {
                width: 612.0,
                height: 792.0
            })
        );
        assert_eq!(
            parse_page_size("595.3 X 841.9"),
            Ok(PageSize {
                width: 595.3,
                height: 841.9
            })
        );
        assert!(parse_page_size("612").is_err());
        assert!(parse_page_size("ax792").is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn project_args_parse() {
        let cli = Cli::try_parse_from([
            "pagelight",
            "project",
            "list.json",
            "--rotation",
            "-90",
            "--origin",
            "bottom",
            "--select",
            "2",
        ])
        .unwrap();
        match cli.command {
            Command::Project {
                rotation,
                origin,
                select,
                ..
            } => {
                assert_eq!(rotation, -90);
                assert_eq!(origin, Origin::Bottom);
                assert_eq!(select, Some(2));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
