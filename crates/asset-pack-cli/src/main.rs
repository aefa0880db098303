use std::collections::{BTreeMap, HashSet};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use anyhow::Context;
use asset_pack_core::{Join, NinePatch, PackerConfig, Sprite, build_atlas};
use clap::{ArgAction, Parser};
use globset::{Glob, GlobSet, GlobSetBuilder};
use image::{ImageFormat, ImageReader};
use serde::Deserialize;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "asset-pack",
    about = "Pack PNG/GIF images into a single atlas PNG plus a JSON manifest",
    version,
    author
)]
struct Cli {
    // Input/Output
    /// Input files or directories
    #[arg(help_heading = "Input/Output")]
    inputs: Vec<PathBuf>,
    /// Atlas image path; the manifest is written next to it as <output>.json
    #[arg(short, long, default_value = "out.png", help_heading = "Input/Output")]
    output: PathBuf,
    /// Descend into sub-directories of directory inputs
    #[arg(short, long, default_value_t = false, help_heading = "Input/Output")]
    recursive: bool,
    /// Include patterns (glob). If set, only files matching any pattern are considered
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude patterns (glob). Files matching any pattern will be ignored
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,
    /// YAML config file path (overrides layout options)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,

    // Layout
    /// Space reserved around every image, on each side
    #[arg(long, default_value_t = 4, help_heading = "Layout")]
    margin: u32,
    /// Maximum atlas edge length
    #[arg(long, default_value_t = 4096, help_heading = "Layout")]
    max_dimension: u32,
    /// Compose the atlas rows in parallel (requires feature `parallel`)
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    parallel: bool,

    // Export
    /// Export packing stats (JSON) to this file
    #[arg(long, help_heading = "Export")]
    export_stats: Option<PathBuf>,
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: pack and report but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,

    // Logging/UX
    /// Show progress bars (disable with --progress false or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(short, long, default_value_t = false, help_heading = "Logging/UX")]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    run_pack(&cli, cli.progress && !cli.quiet)
}

fn run_pack(cli: &Cli, show_progress: bool) -> anyhow::Result<()> {
    let base = PackerConfig {
        margin: cli.margin,
        max_dimension: cli.max_dimension,
        parallel: cli.parallel,
    };
    let cfg = if let Some(path) = &cli.config {
        let file = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)
            .with_context(|| format!("parse config {}", path.display()))?;
        y.into_packer_config(base)
    } else {
        base
    };

    if cli.print_config {
        match cli.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
        }
        return Ok(());
    }
    cfg.validate()?;
    if cfg.parallel && !cfg!(feature = "parallel") {
        warn!("parallel composition requested but the `parallel` feature is off; composing sequentially");
    }

    let mut collector = Collector::new(
        &cli.output,
        cli.recursive,
        build_globset(&cli.include)?,
        build_globset(&cli.exclude)?,
    );
    for input in &cli.inputs {
        collector.visit(input);
    }
    let (paths, mut errors) = collector.finish();
    let sprites = load_sprites_with_progress(&paths, show_progress, &mut errors);
    if !errors.is_empty() {
        for e in &errors {
            error!("{:#}", e);
        }
        anyhow::bail!("{} input error(s); nothing was packed", errors.len());
    }
    info!(count = sprites.len(), "loaded input images");

    if sprites.is_empty() {
        info!("no input images; nothing packed");
        return Ok(());
    }

    let out = build_atlas(sprites, &cfg)?;
    info!(
        width = out.width,
        height = out.height,
        entries = out.manifest.len(),
        "atlas packed"
    );
    info!("{}", out.stats.summary());

    let manifest_path = sidecar_path(&cli.output);
    if !cli.dry_run {
        let mut png = Vec::new();
        out.canvas
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .context("encode atlas png")?;
        let json = out.manifest.to_json_string_pretty()?;
        if let Some(dir) = cli.output.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        }
        write_outputs(&[
            (cli.output.as_path(), png.as_slice()),
            (manifest_path.as_path(), json.as_bytes()),
        ])?;
        info!(png_path = ?cli.output, ?manifest_path, "atlas written");
    }

    if let Some(stats_path) = &cli.export_stats {
        if !cli.dry_run {
            fs::write(stats_path, serde_json::to_string_pretty(&out.stats)?)
                .with_context(|| format!("write {}", stats_path.display()))?;
            info!(?stats_path, "stats exported");
        } else {
            println!(
                "width={} height={} sprites={} joins={} used_area={} canvas_area={} occupancy={:.2}%",
                out.stats.canvas_width,
                out.stats.canvas_height,
                out.stats.num_sprites,
                out.stats.num_joins,
                out.stats.used_area,
                out.stats.canvas_area,
                out.stats.occupancy * 100.0
            );
        }
    }
    Ok(())
}

// ---------------- Collection ----------------

/// Walks the input arguments once, remembering every file and directory it
/// has already seen, and gathers candidate files in visit order.
struct Collector {
    output: PathBuf,
    output_canonical: Option<PathBuf>,
    recursive: bool,
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
    visited: HashSet<PathBuf>,
    found: Vec<PathBuf>,
    errors: Vec<anyhow::Error>,
}

impl Collector {
    fn new(
        output: &Path,
        recursive: bool,
        include: Option<GlobSet>,
        exclude: Option<GlobSet>,
    ) -> Self {
        Self {
            output: output.to_path_buf(),
            output_canonical: fs::canonicalize(output).ok(),
            recursive,
            include,
            exclude,
            visited: HashSet::new(),
            found: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn visit(&mut self, path: &Path) {
        match fs::metadata(path) {
            Ok(meta) if meta.is_dir() => self.visit_dir(path),
            Ok(_) => self.visit_file(path),
            Err(e) => self
                .errors
                .push(anyhow::Error::new(e).context(format!("stat {}", path.display()))),
        }
    }

    fn first_visit(&mut self, path: &Path) -> bool {
        let key = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        self.visited.insert(key)
    }

    fn visit_dir(&mut self, dir: &Path) {
        if !self.first_visit(dir) {
            debug!(?dir, "directory already visited");
            return;
        }
        let mut walker = WalkDir::new(dir).min_depth(1).sort_by_file_name();
        if !self.recursive {
            walker = walker.max_depth(1);
        }
        let mut it = walker.into_iter();
        while let Some(entry) = it.next() {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    self.errors
                        .push(anyhow::Error::new(e).context(format!("walk {}", dir.display())));
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                if self.recursive && !self.first_visit(entry.path()) {
                    it.skip_current_dir();
                }
                continue;
            }
            self.visit_file(entry.path());
        }
    }

    fn visit_file(&mut self, path: &Path) {
        if self.is_output(path) || self.filtered_out(path) || !self.first_visit(path) {
            return;
        }
        self.found.push(path.to_path_buf());
    }

    fn is_output(&self, path: &Path) -> bool {
        if path == self.output.as_path() {
            return true;
        }
        match (&self.output_canonical, fs::canonicalize(path)) {
            (Some(out), Ok(p)) => *out == p,
            _ => false,
        }
    }

    fn filtered_out(&self, p: &Path) -> bool {
        let s = p.to_string_lossy().replace('\\', "/");
        if let Some(ex) = &self.exclude {
            if ex.is_match(&s) {
                return true;
            }
        }
        if let Some(inc) = &self.include {
            if !inc.is_match(&s) {
                return true;
            }
        }
        false
    }

    fn finish(self) -> (Vec<PathBuf>, Vec<anyhow::Error>) {
        (self.found, self.errors)
    }
}

fn build_globset(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut b = GlobSetBuilder::new();
    for pat in patterns {
        b.add(Glob::new(pat).with_context(|| format!("invalid glob '{}'", pat))?);
    }
    Ok(Some(b.build()?))
}

fn load_sprites_with_progress(
    paths: &[PathBuf],
    progress: bool,
    errors: &mut Vec<anyhow::Error>,
) -> Vec<Sprite> {
    use indicatif::{ProgressBar, ProgressStyle};
    let bar = if progress {
        let b = ProgressBar::new(paths.len() as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.green} loading {pos}/{len} [{elapsed_precise}] {wide_msg}",
        ) {
            b.set_style(style);
        }
        Some(b)
    } else {
        None
    };
    let mut list = Vec::with_capacity(paths.len());
    for p in paths {
        if let Some(b) = &bar {
            let msg = p.file_name().and_then(|s| s.to_str()).unwrap_or("");
            b.set_message(msg.to_string());
        }
        match load_sprite(p) {
            Ok(Some(sprite)) => list.push(sprite),
            Ok(None) => debug!(?p, "not a png/gif; skipped"),
            Err(e) => errors.push(e),
        }
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    list
}

/// Format of `p` judged from its leading bytes; `None` unless PNG or GIF.
fn sniff_format(p: &Path) -> anyhow::Result<Option<ImageFormat>> {
    let mut header = Vec::with_capacity(16);
    File::open(p)
        .with_context(|| format!("open {}", p.display()))?
        .take(16)
        .read_to_end(&mut header)
        .with_context(|| format!("read {}", p.display()))?;
    Ok(match image::guess_format(&header) {
        Ok(fmt @ (ImageFormat::Png | ImageFormat::Gif)) => Some(fmt),
        _ => None,
    })
}

fn load_sprite(p: &Path) -> anyhow::Result<Option<Sprite>> {
    let Some(fmt) = sniff_format(p)? else {
        return Ok(None);
    };
    let mut reader = ImageReader::open(p).with_context(|| format!("open {}", p.display()))?;
    reader.set_format(fmt);
    let rgba = reader
        .decode()
        .with_context(|| format!("decode {}", p.display()))?
        .to_rgba8();
    let mut sprite = Sprite::new(sprite_id(p), rgba)?;

    let side = sidecar_path(p);
    let data = match fs::read(&side) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Some(sprite)),
        Err(e) => return Err(anyhow::Error::new(e).context(format!("read {}", side.display()))),
    };
    let (ninepatch, joins) =
        parse_sidecar(&data).with_context(|| format!("parse {}", side.display()))?;
    if let Some(np) = ninepatch {
        sprite = sprite.with_ninepatch(np)?;
    }
    for join in joins {
        sprite = sprite.with_join(join)?;
    }
    Ok(Some(sprite))
}

/// Manifest key for an input file: the path as walked, extension dropped,
/// separators turned into commas (`ui/button.png` -> `ui,button`).
fn sprite_id(p: &Path) -> String {
    p.with_extension("")
        .to_string_lossy()
        .replace(['/', '\\'], ",")
}

/// `<path>.json`, next to `path`.
fn sidecar_path(p: &Path) -> PathBuf {
    let mut s: OsString = p.as_os_str().to_owned();
    s.push(".json");
    PathBuf::from(s)
}

// ---------------- Sidecar ----------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct JoinSpec {
    x: u32,
    y: u32,
    w: u32,
    h: u32,
    #[serde(default)]
    ninepatch: Option<NinePatch>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StructuredSidecar {
    #[serde(default)]
    ninepatch: Option<NinePatch>,
    joins: BTreeMap<String, JoinSpec>,
}

/// Either `{ "ninepatch"?, "joins": {..} }` or a bare `{ name: join }` map.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Sidecar {
    Structured(StructuredSidecar),
    Flat(BTreeMap<String, JoinSpec>),
}

/// Returns the sprite's own nine-patch (structured form only) and its joins, ordered by name.
fn parse_sidecar(data: &[u8]) -> anyhow::Result<(Option<NinePatch>, Vec<Join>)> {
    let parsed: Sidecar = serde_json::from_slice(data)
        .map_err(|_| anyhow::anyhow!("expected a map of joins or {{\"ninepatch\", \"joins\"}}"))?;
    let (ninepatch, specs) = match parsed {
        Sidecar::Structured(s) => (s.ninepatch, s.joins),
        Sidecar::Flat(joins) => (None, joins),
    };
    let joins = specs
        .into_iter()
        .map(|(id, j)| Join {
            id,
            x: j.x,
            y: j.y,
            w: j.w,
            h: j.h,
            ninepatch: j.ninepatch,
        })
        .collect();
    Ok((ninepatch, joins))
}

// ---------------- Output ----------------

fn temp_sibling(path: &Path) -> anyhow::Result<PathBuf> {
    let name = path
        .file_name()
        .with_context(|| format!("{} has no file name", path.display()))?;
    let mut tmp = OsString::from(".");
    tmp.push(name);
    tmp.push(".tmp");
    Ok(path.with_file_name(tmp))
}

/// Writes every `(path, bytes)` pair to a temporary sibling first and renames
/// them into place only once all writes succeeded. Temporaries are removed on failure.
fn write_outputs(files: &[(&Path, &[u8])]) -> anyhow::Result<()> {
    let mut staged: Vec<(PathBuf, &Path)> = Vec::with_capacity(files.len());
    let result = (|| -> anyhow::Result<()> {
        for (path, bytes) in files {
            let tmp = temp_sibling(path)?;
            fs::write(&tmp, *bytes).with_context(|| format!("write {}", tmp.display()))?;
            staged.push((tmp, *path));
        }
        for (tmp, path) in &staged {
            fs::rename(tmp, path).with_context(|| format!("write {}", path.display()))?;
        }
        Ok(())
    })();
    if result.is_err() {
        for (tmp, _) in &staged {
            let _ = fs::remove_file(tmp);
        }
    }
    result
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}

#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    margin: Option<u32>,
    max_dimension: Option<u32>,
    parallel: Option<bool>,
}

impl YamlConfig {
    fn into_packer_config(self, mut cfg: PackerConfig) -> PackerConfig {
        if let Some(v) = self.margin {
            cfg.margin = v;
        }
        if let Some(v) = self.max_dimension {
            cfg.max_dimension = v;
        }
        if let Some(v) = self.parallel {
            cfg.parallel = v;
        }
        cfg
    }
}
