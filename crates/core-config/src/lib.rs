//! Configuration loading and parsing.
//!
//! Parses `edwood.toml` (or an override path provided by the binary):
//!
//! ```toml
//! [frame]
//! tabstop = 4          # in widths of the font's '0' glyph
//! [colours]
//! back = "#ffffeaff"   # RGBA; text, back, high, bord, htext
//! [edit]
//! max_loop = 10000     # cap on x/y loop iterations
//! ```
//!
//! Every key is optional and unknown keys are ignored. A file that fails to
//! parse is reported at `warn` and replaced by defaults. The raw tab stop is
//! kept next to the clamped one actually used.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fmt, fs, path::PathBuf};
use tracing::{info, warn};

pub const MAX_TABSTOP: u32 = 64;

/// Colour as `0xRRGGBBAA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Rgba(pub u32);

impl TryFrom<String> for Rgba {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let hex = s.strip_prefix('#').unwrap_or(&s);
        let value = u32::from_str_radix(hex, 16).map_err(|e| format!("colour {s:?}: {e}"))?;
        match hex.len() {
            8 => Ok(Rgba(value)),
            6 => Ok(Rgba((value << 8) | 0xff)),
            _ => Err(format!("colour {s:?}: expected #rrggbb or #rrggbbaa")),
        }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08x}", self.0)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct FrameConfig {
    #[serde(default = "FrameConfig::default_tabstop")]
    pub tabstop: u32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            tabstop: Self::default_tabstop(),
        }
    }
}

impl FrameConfig {
    const fn default_tabstop() -> u32 {
        4
    }
}

/// Frame palette. Defaults are Acme's pale yellow text window.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ColourConfig {
    #[serde(default = "ColourConfig::black")]
    pub text: Rgba,
    #[serde(default = "ColourConfig::pale_yellow")]
    pub back: Rgba,
    #[serde(default = "ColourConfig::dark_yellow")]
    pub high: Rgba,
    #[serde(default = "ColourConfig::yellow_green")]
    pub bord: Rgba,
    #[serde(default = "ColourConfig::black")]
    pub htext: Rgba,
}

impl Default for ColourConfig {
    fn default() -> Self {
        Self {
            text: Self::black(),
            back: Self::pale_yellow(),
            high: Self::dark_yellow(),
            bord: Self::yellow_green(),
            htext: Self::black(),
        }
    }
}

impl ColourConfig {
    const fn black() -> Rgba {
        Rgba(0x000000ff)
    }
    const fn pale_yellow() -> Rgba {
        Rgba(0xffffeaff)
    }
    const fn dark_yellow() -> Rgba {
        Rgba(0xeeee9eff)
    }
    const fn yellow_green() -> Rgba {
        Rgba(0x99994cff)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct EditConfig {
    #[serde(default = "EditConfig::default_max_loop")]
    pub max_loop: usize,
}

impl Default for EditConfig {
    fn default() -> Self {
        Self {
            max_loop: Self::default_max_loop(),
        }
    }
}

impl EditConfig {
    const fn default_max_loop() -> usize {
        10_000
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    #[serde(default)]
    pub frame: FrameConfig,
    #[serde(default)]
    pub colours: ColourConfig,
    #[serde(default)]
    pub edit: EditConfig,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub raw: Option<String>, // original file string (optional)
    pub file: ConfigFile,    // parsed (or default) data
    pub effective_tabstop: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_file(ConfigFile::default(), None)
    }
}

/// Local `edwood.toml` first, then the platform config directory.
pub fn discover() -> PathBuf {
    let local = PathBuf::from("edwood.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("edwood").join("edwood.toml");
    }
    PathBuf::from("edwood.toml")
}

/// Load `path` (or the discovered file). Missing or malformed files yield
/// defaults; only an unreadable existing file is an error.
pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = fs::read_to_string(&path)
        .with_context(|| format!("reading config {}", path.display()))?;
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => Ok(Config::from_file(file, Some(content))),
        Err(e) => {
            warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed");
            Ok(Config::default())
        }
    }
}

impl Config {
    pub fn from_file(file: ConfigFile, raw: Option<String>) -> Self {
        let requested = file.frame.tabstop;
        let effective = requested.clamp(1, MAX_TABSTOP);
        if effective != requested {
            info!(
                target: "config",
                requested,
                effective,
                max = MAX_TABSTOP,
                "tabstop_clamped"
            );
        }
        Self {
            raw,
            file,
            effective_tabstop: effective,
        }
    }

    /// Tab width in pixels for a font whose '0' glyph is `zero_width` wide.
    pub fn tab_width(&self, zero_width: u32) -> u32 {
        self.effective_tabstop * zero_width.max(1)
    }

    pub fn colours(&self) -> ColourConfig {
        self.file.colours
    }

    pub fn max_loop(&self) -> usize {
        self.file.edit.max_loop.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex, MutexGuard};
    use tracing::Level;
    use tracing::subscriber::with_default;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone)]
    struct BufferWriter {
        inner: Arc<Mutex<Vec<u8>>>,
    }

    impl BufferWriter {
        fn new() -> (Self, Arc<Mutex<Vec<u8>>>) {
            let buf = Arc::new(Mutex::new(Vec::new()));
            (Self { inner: buf.clone() }, buf)
        }
    }

    struct LockedWriter<'a> {
        guard: MutexGuard<'a, Vec<u8>>,
    }

    impl<'a> Write for LockedWriter<'a> {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.guard.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for BufferWriter {
        type Writer = LockedWriter<'a>;

        fn make_writer(&'a self) -> Self::Writer {
            LockedWriter {
                guard: self.inner.lock().expect("log buffer poisoned"),
            }
        }
    }

    fn capture<F: FnOnce()>(level: Level, f: F) -> String {
        let (writer, buffer) = BufferWriter::new();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(true)
            .with_ansi(false)
            .without_time()
            .with_writer(writer)
            .finish();
        with_default(subscriber, f);
        String::from_utf8(buffer.lock().unwrap().clone()).unwrap()
    }

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, "{body}").unwrap();
        tmp
    }

    #[test]
    fn default_config_when_missing_file() {
        let cfg = load_from(Some(PathBuf::from("__nonexistent_hopefully__.toml"))).unwrap();
        assert_eq!(cfg.file, ConfigFile::default());
        assert_eq!(cfg.effective_tabstop, 4);
        assert_eq!(cfg.max_loop(), 10_000);
        assert!(cfg.raw.is_none());
    }

    #[test]
    fn parses_all_sections() {
        let tmp = write_config(
            "[frame]\ntabstop = 8\n[colours]\nback = \"#ffffff\"\nhigh = \"#123456aa\"\n[edit]\nmax_loop = 50\n",
        );
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.effective_tabstop, 8);
        assert_eq!(cfg.tab_width(10), 80);
        assert_eq!(cfg.colours().back, Rgba(0xffffffff));
        assert_eq!(cfg.colours().high, Rgba(0x123456aa));
        // untouched keys keep the Acme palette
        assert_eq!(cfg.colours().bord, Rgba(0x99994cff));
        assert_eq!(cfg.max_loop(), 50);
        assert!(cfg.raw.is_some());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let tmp = write_config("[frame]\ntabstop = 2\nfuture = true\n[other]\nx = 1\n");
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.effective_tabstop, 2);
    }

    #[test]
    fn malformed_file_falls_back_and_warns() {
        let tmp = write_config("[colours]\ntext = \"#zz\"\n");
        let path = tmp.path().to_path_buf();
        let mut cfg = None;
        let log = capture(Level::WARN, || {
            cfg = Some(load_from(Some(path)).unwrap());
        });
        assert_eq!(cfg.unwrap().file, ConfigFile::default());
        assert!(log.contains("WARN config:"), "log: {log}");
        assert!(log.contains("config_parse_failed"), "log: {log}");
    }

    #[test]
    fn oversized_tabstop_is_clamped_and_logged() {
        let tmp = write_config("[frame]\ntabstop = 500\n");
        let path = tmp.path().to_path_buf();
        let mut cfg = None;
        let log = capture(Level::INFO, || {
            cfg = Some(load_from(Some(path)).unwrap());
        });
        let cfg = cfg.unwrap();
        assert_eq!(cfg.file.frame.tabstop, 500);
        assert_eq!(cfg.effective_tabstop, MAX_TABSTOP);
        assert!(log.contains("INFO config:"), "log: {log}");
        assert!(log.contains("tabstop_clamped"), "log: {log}");
        assert!(log.contains("requested=500"), "log: {log}");
    }

    #[test]
    fn zero_tabstop_becomes_one() {
        let cfg = Config::from_file(
            ConfigFile {
                frame: FrameConfig { tabstop: 0 },
                ..ConfigFile::default()
            },
            None,
        );
        assert_eq!(cfg.tab_width(7), 7);
    }

    #[test]
    fn rgba_accepts_short_and_long_forms() {
        assert_eq!(Rgba::try_from("#0a0b0c".to_string()), Ok(Rgba(0x0a0b0cff)));
        assert_eq!(Rgba::try_from("01020304".to_string()), Ok(Rgba(0x01020304)));
        assert!(Rgba::try_from("#123".to_string()).is_err());
        assert_eq!(Rgba(0xffffeaff).to_string(), "#ffffeaff");
    }
}
