use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};
use rolemine_core::export::{self, ExportFormat};
use rolemine_core::labels::Labels;
use rolemine_core::objects::{ObjectSnapshot, ObjectTable};
use rolemine_core::{
    CallTree, CallTreeExtractor, ClassGraph, Dataset, ExtractorConfig, parsers, preprocess,
};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum Format {
    #[default]
    Csv,
    Json,
}

impl From<Format> for ExportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Csv => ExportFormat::Csv,
            Format::Json => ExportFormat::Json,
        }
    }
}

/// Options shared by every subcommand that reads call trees or object tables.
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// JSON config file; flags below override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Project package prefix, repeatable (e.g. com.eteks.sweethome3d)
    #[arg(short, long = "project")]
    pub project: Vec<String>,
    /// Keep anonymous classes (Outer$1) separate from their outer class
    #[arg(long)]
    pub keep_anonymous: bool,
}

impl ConfigArgs {
    fn load(&self) -> Result<ExtractorConfig> {
        let mut config = match &self.config {
            Some(path) => ExtractorConfig::from_file(path)?,
            None => ExtractorConfig::default(),
        };
        if !self.project.is_empty() {
            config.project_packages = self.project.clone();
        }
        if self.keep_anonymous {
            config.merge_anonymous_classes = false;
        }
        debug!(?config, "configuration loaded");
        Ok(config)
    }
}

#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// Call-tree exports (JProfiler XML or JSON); several files are combined
    #[arg(required = true)]
    pub trees: Vec<PathBuf>,
    /// Output file (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Recorded-objects CSV export of all objects, repeatable
    #[arg(long = "objects-all")]
    pub objects_all: Vec<PathBuf>,
    /// Recorded-objects CSV export of garbage-collected objects, repeatable
    #[arg(long = "objects-gc")]
    pub objects_gc: Vec<PathBuf>,
    /// Ground-truth label CSV; only labelled classes are kept
    #[arg(long)]
    pub labels: Option<PathBuf>,
    /// File with one class name per line; other classes are dropped
    #[arg(long)]
    pub allow_list: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = Format::Csv)]
    pub format: Format,
    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Debug, Args)]
pub struct ObjectsArgs {
    /// Recorded-objects CSV exports of all objects
    #[arg(required = true)]
    pub all: Vec<PathBuf>,
    /// Recorded-objects CSV exports of garbage-collected objects, repeatable
    #[arg(long)]
    pub gc: Vec<PathBuf>,
    /// Output file (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = Format::Csv)]
    pub format: Format,
    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Debug, Args)]
pub struct ClassesArgs {
    /// Call-tree exports (JProfiler XML or JSON)
    #[arg(required = true)]
    pub trees: Vec<PathBuf>,
    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Debug, Args)]
pub struct GraphArgs {
    /// Call-tree exports; each file is one trace, named after the file
    /// (`Editing_CallTree.xml` → `Editing`)
    #[arg(required = true)]
    pub trees: Vec<PathBuf>,
    /// Output file (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    #[command(flatten)]
    pub config: ConfigArgs,
}

pub fn extract(args: &ExtractArgs) -> Result<()> {
    let config = args.config.load()?;
    let tree = read_trees(&args.trees, &config)?;

    let extractor = CallTreeExtractor::new(config.clone());
    let mut table = extractor.extract(&tree).finalize();

    if let Some(path) = &args.allow_list {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let allowed: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect();
        table.retain_classes(&allowed);
        info!(allowed = allowed.len(), kept = table.len(), "applied allow-list");
    }

    let mut dataset = Dataset::new(table);

    if !args.objects_all.is_empty() {
        let all = read_snapshots(&args.objects_all, &config)?;
        let gc = read_snapshots(&args.objects_gc, &config)?;
        dataset = dataset.with_objects(&ObjectTable::build(&all, &gc));
    } else if !args.objects_gc.is_empty() {
        bail!("--objects-gc needs at least one --objects-all export");
    }

    if let Some(path) = &args.labels {
        let data =
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let labels = Labels::from_csv(&data)
            .with_context(|| format!("failed to load labels from {}", path.display()))?;
        dataset = dataset.with_labels(&labels);
    }

    let out = open_output(args.output.as_deref())?;
    export::write_dataset(&dataset, args.format.into(), out).context("failed to write dataset")?;
    info!(
        rows = dataset.len(),
        columns = dataset.columns().len(),
        "dataset written"
    );
    Ok(())
}

pub fn objects(args: &ObjectsArgs) -> Result<()> {
    let config = args.config.load()?;
    let all = read_snapshots(&args.all, &config)?;
    let gc = read_snapshots(&args.gc, &config)?;
    let table = ObjectTable::build(&all, &gc);

    let out = open_output(args.output.as_deref())?;
    export::write_object_table(&table, args.format.into(), out)
        .context("failed to write object features")?;
    info!(rows = table.len(), "object features written");
    Ok(())
}

pub fn classes(args: &ClassesArgs) -> Result<()> {
    let config = args.config.load()?;
    let tree = read_trees(&args.trees, &config)?;

    let mut out = std::io::stdout().lock();
    let mut listed = 0usize;
    for name in tree.class_names() {
        if config.is_project_class(name) {
            writeln!(out, "{name}")?;
            listed += 1;
        }
    }
    info!(classes = listed, nodes = tree.node_count(), "classes listed");
    Ok(())
}

pub fn graph(args: &GraphArgs) -> Result<()> {
    let config = args.config.load()?;

    let mut graph = ClassGraph::new();
    for path in &args.trees {
        let tree = preprocess::prepare([read_tree(path)?], &config);
        graph.add_trace(&trace_name(path), &tree, &config);
    }

    let out = open_output(args.output.as_deref())?;
    export::write_class_graph(&graph, out).context("failed to write class graph")?;
    info!(
        traces = args.trees.len(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "class graph written"
    );
    Ok(())
}

fn read_tree(path: &Path) -> Result<CallTree> {
    let data = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let tree = parsers::parse_auto(&data)
        .with_context(|| format!("failed to parse call tree {}", path.display()))?;
    debug!(path = %path.display(), nodes = tree.node_count(), "call tree parsed");
    Ok(tree)
}

fn read_trees(paths: &[PathBuf], config: &ExtractorConfig) -> Result<CallTree> {
    let trees = paths
        .iter()
        .map(PathBuf::as_path)
        .map(read_tree)
        .collect::<Result<Vec<_>>>()?;
    Ok(preprocess::prepare(trees, config))
}

/// File stem without the exporter's `_CallTree` suffix.
fn trace_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match stem.strip_suffix("_CallTree") {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => stem,
    }
}

fn read_snapshots(paths: &[PathBuf], config: &ExtractorConfig) -> Result<ObjectSnapshot> {
    let mut combined = ObjectSnapshot::default();
    for path in paths {
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        let snapshot = ObjectSnapshot::from_csv_reader(file, config)
            .with_context(|| format!("failed to load recorded objects {}", path.display()))?;
        combined.merge(snapshot);
    }
    Ok(combined)
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(std::io::stdout().lock()),
    })
}
