//! Edwood batch entrypoint: run a sam script over a file, the way Acme's
//! `Edit` command runs one over a window.
use anyhow::{Context, Result};
use clap::Parser;
use core_config::Config;
use core_edit::{ExecReport, Sam};
use core_frame::{Canvas, FixedFont, Font, Frame, FrameColours, Point, Rect};
use core_state::Text;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "edwood", version, about = "Run sam edit scripts over a file")]
struct Args {
    /// File to edit (UTF-8 text).
    pub path: PathBuf,
    /// sam script, as typed after `Edit` in Acme.
    #[arg(short = 'e', long = "script")]
    pub script: String,
    /// Write the result back to the file instead of printing it.
    #[arg(long = "in-place")]
    pub in_place: bool,
    /// Optional configuration file path (overrides discovery of `edwood.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Print the result laid out in a frame of COLSxROWS cells.
    #[arg(long = "render", value_name = "COLSxROWS", value_parser = parse_size)]
    pub render: Option<(u16, u16)>,
}

fn parse_size(s: &str) -> Result<(u16, u16), String> {
    let (c, r) = s
        .split_once('x')
        .ok_or_else(|| format!("expected COLSxROWS, got `{s}`"))?;
    let c: u16 = c.parse().map_err(|e| format!("columns: {e}"))?;
    let r: u16 = r.parse().map_err(|e| format!("rows: {e}"))?;
    if c == 0 || r == 0 {
        return Err("frame must be at least 1x1".to_string());
    }
    Ok((c, r))
}

struct Startup {
    log_guard: Option<WorkerGuard>,
}

impl Startup {
    fn new() -> Self {
        Self { log_guard: None }
    }

    fn configure_logging(&mut self) -> Result<()> {
        let log_dir = Path::new(".");
        let log_path = log_dir.join("edwood.log");
        if log_path.exists() {
            let _ = fs::remove_file(&log_path);
        }

        let file_appender = tracing_appender::rolling::never(log_dir, "edwood.log");
        let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
        if tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(nb_writer)
            .try_init()
            .is_ok()
        {
            self.log_guard = Some(guard);
        }
        Ok(())
    }

    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "runtime.panic", ?info, "panic");
                default_panic(info);
            }));
        });
    }
}

/// Run `script` over `text` with the limits from `config`.
fn edit(text: &mut Text, script: &str, config: &Config) -> Result<ExecReport> {
    let sam = Sam::with_max_loop(config.max_loop());
    let report = sam
        .run(text, script)
        .with_context(|| format!("running `{script}` on {}", text.name()))?;
    for w in &report.warnings {
        warn!(target: "runtime", name = text.name(), %w, "edit_warning");
    }
    Ok(report)
}

/// Lay `s` out in a frame of one-cell runes and read its rows back. Text
/// that does not fit is left out.
fn render(s: &str, (cols, rows): (u16, u16), config: &Config) -> Vec<String> {
    let r = Rect::new(0, 0, i32::from(cols), i32::from(rows));
    let font: Arc<dyn Font> = Arc::new(FixedFont::new(1, 1));
    let zero = u32::try_from(font.str_width("0")).unwrap_or(1);
    let tab = i32::try_from(config.tab_width(zero)).unwrap_or(i32::MAX);
    let colours = FrameColours::from(config.colours());
    let frame = Frame::new(r, font, Canvas::new(r, colours.back), colours);
    frame.set_tab_width(tab);
    frame.insert_str(s, 0);
    let kept = frame.nchars();
    let total = s.chars().count();
    if kept < total {
        info!(target: "runtime", kept, total, "render_truncated");
    }
    frame.with_image(|c| {
        (r.min.y..r.max.y)
            .map(|y| {
                let row: String = (r.min.x..r.max.x)
                    .map(|x| c.glyph(Point::new(x, y)).map_or(' ', |g| g.ch))
                    .collect();
                row.trim_end().to_string()
            })
            .collect()
    })
}

fn run(args: &Args) -> Result<()> {
    let config = core_config::load_from(args.config.clone())?;
    let content = fs::read_to_string(&args.path)
        .with_context(|| format!("reading {}", args.path.display()))?;
    let mut text = Text::new(&content).with_name(args.path.to_string_lossy());
    info!(
        target: "runtime.startup",
        path = %args.path.display(),
        runes = text.nr(),
        config_override = args.config.is_some(),
        max_loop = config.max_loop(),
        "bootstrap_complete"
    );

    let report = edit(&mut text, &args.script, &config)?;
    for w in &report.warnings {
        eprintln!("{w}");
    }
    print!("{}", report.output);
    info!(
        target: "runtime",
        dot0 = report.dot.0,
        dot1 = report.dot.1,
        dirty = text.dirty(),
        "edit_complete"
    );

    if args.in_place {
        if text.dirty() {
            fs::write(&args.path, text.string())
                .with_context(|| format!("writing {}", args.path.display()))?;
            info!(target: "runtime", path = %args.path.display(), "written");
        }
    } else if args.render.is_none() {
        print!("{}", text.string());
    }
    if let Some(size) = args.render {
        for row in render(text.string(), size, &config) {
            println!("{row}");
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let mut startup = Startup::new();
    startup.configure_logging()?;
    Startup::install_panic_hook();
    info!(target: "runtime", "startup");

    let args = Args::parse();
    let res = run(&args);
    if let Err(e) = &res {
        tracing::error!(target: "runtime", error = %format!("{e:#}"), "failed");
    }
    info!(target: "runtime", ok = res.is_ok(), "shutdown");
    drop(startup.log_guard.take());
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn size_parses_cols_by_rows() {
        assert_eq!(parse_size("80x24"), Ok((80, 24)));
        assert!(parse_size("80").is_err());
        assert!(parse_size("0x5").is_err());
        assert!(parse_size("ax5").is_err());
    }

    #[test]
    fn cli_accepts_script_and_flags() {
        let args = Args::try_parse_from([
            "edwood",
            "--in-place",
            "-e",
            ",d",
            "--render",
            "20x4",
            "notes.txt",
        ])
        .unwrap();
        assert!(args.in_place);
        assert_eq!(args.script, ",d");
        assert_eq!(args.render, Some((20, 4)));
        assert_eq!(args.path, PathBuf::from("notes.txt"));
        assert!(Args::try_parse_from(["edwood", "notes.txt"]).is_err());
    }

    #[test]
    fn edit_uses_config_loop_limit() {
        let mut cfg = core_config::ConfigFile::default();
        cfg.edit.max_loop = 2;
        let cfg = Config::from_file(cfg, None);
        let mut t = Text::new("aaaa").with_name("t");
        let err = edit(&mut t, ",x/a/c/b/", &cfg).unwrap_err();
        assert!(format!("{err:#}").contains("loop ran more than 2 times"));
        assert_eq!(t.string(), "aaaa");

        let mut t = Text::new("aaaa").with_name("t");
        edit(&mut t, ",x/a/c/b/", &Config::default()).unwrap();
        assert_eq!(t.string(), "bbbb");
    }

    #[test]
    fn render_expands_tabs_and_lines() {
        let rows = render("a\tb\ncd", (10, 3), &Config::default());
        assert_eq!(rows, vec!["a   b", "cd", ""]);
    }

    #[test]
    fn render_drops_what_does_not_fit() {
        let rows = render("abcdefgh", (4, 1), &Config::default());
        assert_eq!(rows, vec!["abcd"]);
    }
}
