use anyhow::{bail, Result};
use clap::Parser;
use obsingest::{
    ingest::{discover_files, Ingestor},
    output::{open_sink, OutputFormat},
    Config,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Extract ObsCore metadata records from FITS image headers"
)]
struct Args {
    /// YAML run configuration; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    schema: Option<PathBuf>,
    #[arg(long)]
    aliases: Option<PathBuf>,
    /// Output file; JSON lines go to stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,
    /// Header unit index to read.
    #[arg(long, conflicts_with = "hdu_name")]
    hdu: Option<usize>,
    /// Header unit to read, by EXTNAME.
    #[arg(long)]
    hdu_name: Option<String>,
    /// Inherit primary header cards in the selected extension.
    #[arg(long)]
    merge_primary: bool,
    #[arg(long)]
    access_url_base: Option<String>,
    /// Resolution threads; 1 is sequential, 0 one per core.
    #[arg(short, long)]
    workers: Option<usize>,
    /// FITS files or directories to search.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

impl Args {
    fn into_config(self) -> Result<(Config, Vec<PathBuf>)> {
        let mut config = match &self.config {
            Some(path) => Config::from_yaml_file(path)?,
            None => Config::default(),
        };
        if self.schema.is_some() {
            config.schema = self.schema;
        }
        if self.aliases.is_some() {
            config.aliases = self.aliases;
        }
        if self.output.is_some() {
            config.output = self.output;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if self.hdu.is_some() {
            config.hdu = self.hdu;
            config.hdu_name = None;
        }
        if self.hdu_name.is_some() {
            config.hdu_name = self.hdu_name;
            config.hdu = None;
        }
        config.merge_primary |= self.merge_primary;
        if self.access_url_base.is_some() {
            config.access_url_base = self.access_url_base;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        Ok((config, self.inputs))
    }
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let (config, inputs) = Args::parse().into_config()?;
    info!(?config, "startup");

    let engine = config.engine()?;
    let reader = config.header_reader()?;
    let files = discover_files(&inputs, &config.patterns)?;
    if files.is_empty() {
        bail!("no FITS files found under {:?}", inputs);
    }
    info!("discovered {} files", files.len());

    let mut sink = open_sink(config.format, config.output.as_deref(), engine.schema())?;
    let stats = Ingestor::new(engine, reader)
        .with_workers(config.workers)
        .run(&files, sink.as_mut())?;

    info!(
        processed = stats.processed,
        skipped = stats.skipped,
        aborted = stats.aborted,
        "done"
    );
    Ok(())
}
