use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command, value_parser};

mod annotation;
mod config;
mod error;
mod linear;
mod man; // provides: pub fn render(data: &PlotData, fig: &Figure, output: &Path) -> anyhow::Result<()>
mod score;
mod series;

use annotation::{CoordinateSampler, GeneAnnotationIndex, MidpointSampler, UniformSampler};
use config::{PlotConfig, Sampling};
use linear::{standard_chromosomes, Offsets};
use score::ScoreTable;
use series::PlotData;

fn main() {
    if let Err(e) = real_main() {
        eprintln!("[ERROR] {e:?}");
        std::process::exit(1);
    }
}

pub(crate) fn cli() -> Command {
    Command::new("gene-manhattan")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Creates a genome-wide Manhattan plot of per-gene scores from VAAST/pVAAST or Phevor2 output")
        .arg(
            Arg::new("input")
                .help("Score file: VAAST/pVAAST .simple output, or Phevor2 output with --phevor2")
                .required(true)
                .value_name("INPUT"),
        )
        .arg(
            Arg::new("output")
                .help("Image to write; .svg gives SVG, other extensions (e.g. .png) a bitmap")
                .required(true)
                .value_name("OUTPUT"),
        )
        .arg(
            Arg::new("gff3")
                .help("GFF3 file with the genomic coordinates of genes")
                .required(true)
                .value_name("GFF3"),
        )
        .arg(
            Arg::new("red-genes")
                .help("Comma-separated genes of interest to label in red")
                .long("red-genes")
                .alias("red_genes")
                .required(false)
                .value_name("CSV"),
        )
        .arg(
            Arg::new("blue-genes")
                .help("Comma-separated genes of interest to label in blue")
                .long("blue-genes")
                .alias("blue_genes")
                .required(false)
                .value_name("CSV"),
        )
        .arg(
            Arg::new("phevor2")
                .help("Input is Phevor2 output rather than VAAST/pVAAST")
                .long("phevor2")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("annotation")
                .help("Text to put below the plot instead of the 'Chromosome' axis label")
                .long("annotation")
                .required(false)
                .value_name("TEXT"),
        )
        .arg(
            Arg::new("inch-width")
                .help("Figure width in inches [default: 15]")
                .long("inch-width")
                .alias("inch_width")
                .required(false)
                .conflicts_with("mm-width")
                .value_parser(value_parser!(f64))
                .value_name("FLOAT"),
        )
        .arg(
            Arg::new("mm-width")
                .help("Figure width in millimetres")
                .long("mm-width")
                .alias("mm_width")
                .required(false)
                .value_parser(value_parser!(f64))
                .value_name("FLOAT"),
        )
        .arg(
            Arg::new("inch-height")
                .help("Figure height in inches [default: 10]")
                .long("inch-height")
                .alias("inch_height")
                .required(false)
                .conflicts_with("mm-height")
                .value_parser(value_parser!(f64))
                .value_name("FLOAT"),
        )
        .arg(
            Arg::new("mm-height")
                .help("Figure height in millimetres")
                .long("mm-height")
                .alias("mm_height")
                .required(false)
                .value_parser(value_parser!(f64))
                .value_name("FLOAT"),
        )
        .arg(
            Arg::new("dpi")
                .help("Output resolution in pixels per inch")
                .long("dpi")
                .required(false)
                .value_parser(value_parser!(u32))
                .default_value("300"),
        )
        .arg(
            Arg::new("point-size")
                .help("Marker area of scored genes, in points^2")
                .long("point-size")
                .alias("point_size")
                .required(false)
                .value_parser(value_parser!(f64))
                .default_value("300"),
        )
        .arg(
            Arg::new("seed")
                .help("Seed for drawing gene positions, for reproducible plots")
                .long("seed")
                .required(false)
                .value_parser(value_parser!(u64))
                .value_name("U64"),
        )
        .arg(
            Arg::new("midpoint")
                .help("Place each gene at the middle of its interval instead of a random position")
                .long("midpoint")
                .conflicts_with("seed")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("series")
                .help("Also write the plotted points and labels as TSV")
                .long("series")
                .required(false)
                .value_name("TSV"),
        )
        .arg(
            Arg::new("no-plot")
                .help("Skip drawing the image (only write --series)")
                .long("no-plot")
                .requires("series")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .help("More logging; repeat for trace output")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count),
        )
}

fn init_logger(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();
}

fn real_main() -> Result<()> {
    let matches = cli().get_matches();
    init_logger(matches.get_count("verbose"));

    let config = PlotConfig::from_matches(&matches)?;

    log::info!("Input : {}", config.input.display());
    log::info!("GFF3  : {}", config.gff3.display());
    log::info!("Format: {:?}", config.format);
    match config.sampling {
        Sampling::Uniform(Some(seed)) => log::info!("Seed  : {}", seed),
        Sampling::Uniform(None) => {}
        Sampling::Midpoint => log::info!("Sampling: midpoint"),
    }
    for set in &config.highlights {
        log::info!("Label : {} {}", set.color.as_str(), set.genes.join(","));
    }

    run(&config)
}

fn load_index<S: CoordinateSampler>(
    config: &PlotConfig,
    scores: &ScoreTable,
    sampler: &mut S,
) -> Result<GeneAnnotationIndex> {
    GeneAnnotationIndex::from_path(&config.gff3, scores, sampler)
        .with_context(|| format!("Failed to load gene coordinates: {}", config.gff3.display()))
}

fn run(config: &PlotConfig) -> Result<()> {
    let scores = ScoreTable::from_path(&config.input, config.format)
        .with_context(|| format!("Failed to load scores: {}", config.input.display()))?;
    log::info!(
        "Scores: {} genes, max score {:.3}",
        scores.len(),
        scores.max_score()
    );

    let index = match config.sampling {
        Sampling::Midpoint => load_index(config, &scores, &mut MidpointSampler)?,
        Sampling::Uniform(Some(seed)) => {
            load_index(config, &scores, &mut UniformSampler::seeded(seed))?
        }
        Sampling::Uniform(None) => load_index(config, &scores, &mut UniformSampler::from_entropy())?,
    };
    log::info!("Genes : {} gene features indexed", index.gene_count());

    let unplaced = scores.genes().filter(|g| !index.has_gene(g)).count();
    if unplaced > 0 {
        log::info!("{} scored gene(s) have no gene feature and are not plotted", unplaced);
    }

    let order = standard_chromosomes();
    let offsets = Offsets::compute(&index, &order);
    let data = PlotData::build(&index, &offsets, &order, scores.max_score(), &config.highlights)?;
    log::debug!("Offsets: {:?}", offsets.values());

    if let Some(path) = &config.series {
        let file = File::create(path)
            .with_context(|| format!("Failed to create series file: {}", path.display()))?;
        data.write_tsv(BufWriter::new(file))
            .with_context(|| format!("Failed to write series file: {}", path.display()))?;
        log::info!("Series: {}", path.display());
    }

    if config.no_plot {
        return Ok(());
    }

    log::info!("Output: {}", config.output.display());
    man::render(&data, &config.figure(), &config.output)
        .with_context(|| format!("Failed to draw {}", config.output.display()))?;
    log::info!("Wrote {}", config.output.display());
    Ok(())
}
