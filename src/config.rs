use std::path::PathBuf;

use anyhow::Result;
use clap::ArgMatches;

use crate::man::Figure;
use crate::score::ScoreFormat;
use crate::series::{HighlightColor, HighlightSet};

pub const MM_PER_INCH: f64 = 25.4;
pub const DEFAULT_WIDTH_IN: f64 = 15.0;
pub const DEFAULT_HEIGHT_IN: f64 = 10.0;

/// How representative gene coordinates are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sampling {
    /// Uniform over the gene; seeded when `Some`.
    Uniform(Option<u64>),
    Midpoint,
}

/// Everything one run needs, resolved from the command line.
#[derive(Debug, Clone)]
pub struct PlotConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub gff3: PathBuf,
    pub format: ScoreFormat,
    pub highlights: Vec<HighlightSet>,
    pub annotation: Option<String>,
    pub width_in: f64,
    pub height_in: f64,
    pub dpi: u32,
    pub point_size: f64,
    pub sampling: Sampling,
    pub series: Option<PathBuf>,
    pub no_plot: bool,
}

impl PlotConfig {
    pub fn from_matches(m: &ArgMatches) -> Result<Self> {
        let path = |id: &str| -> Result<PathBuf> {
            m.get_one::<String>(id)
                .map(PathBuf::from)
                .ok_or_else(|| anyhow::anyhow!("missing required argument <{}>", id))
        };

        let format = if m.get_flag("phevor2") {
            ScoreFormat::Phevor2
        } else {
            ScoreFormat::Simple
        };

        let mut highlights = Vec::new();
        for (id, color) in [("red-genes", HighlightColor::Red), ("blue-genes", HighlightColor::Blue)] {
            if let Some(csv) = m.get_one::<String>(id) {
                let genes = split_gene_list(csv);
                if !genes.is_empty() {
                    highlights.push(HighlightSet { color, genes });
                }
            }
        }

        let width_in = length_in(
            m.get_one::<f64>("inch-width").copied(),
            m.get_one::<f64>("mm-width").copied(),
            DEFAULT_WIDTH_IN,
            "width",
        )?;
        let height_in = length_in(
            m.get_one::<f64>("inch-height").copied(),
            m.get_one::<f64>("mm-height").copied(),
            DEFAULT_HEIGHT_IN,
            "height",
        )?;

        let dpi = *m.get_one::<u32>("dpi").expect("default provided by clap");
        if dpi == 0 {
            anyhow::bail!("--dpi must be greater than 0");
        }
        let point_size = *m.get_one::<f64>("point-size").expect("default provided by clap");
        if !(point_size.is_finite() && point_size > 0.0) {
            anyhow::bail!("--point-size must be a positive number, got {}", point_size);
        }

        let sampling = if m.get_flag("midpoint") {
            Sampling::Midpoint
        } else {
            Sampling::Uniform(m.get_one::<u64>("seed").copied())
        };

        Ok(PlotConfig {
            input: path("input")?,
            output: path("output")?,
            gff3: path("gff3")?,
            format,
            highlights,
            annotation: m.get_one::<String>("annotation").cloned(),
            width_in,
            height_in,
            dpi,
            point_size,
            sampling,
            series: m.get_one::<String>("series").map(PathBuf::from),
            no_plot: m.get_flag("no-plot"),
        })
    }

    pub fn figure(&self) -> Figure {
        Figure {
            width_in: self.width_in,
            height_in: self.height_in,
            dpi: self.dpi,
            point_size: self.point_size,
            format: self.format,
            annotation: self.annotation.clone(),
        }
    }
}

/// "BRCA1, TP53,,CFTR" -> ["BRCA1", "TP53", "CFTR"]
pub fn split_gene_list(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Millimetres win over inches when both are present; clap keeps them exclusive anyway.
fn length_in(inches: Option<f64>, mm: Option<f64>, default: f64, what: &str) -> Result<f64> {
    let v = match (mm, inches) {
        (Some(mm), _) => mm / MM_PER_INCH,
        (None, Some(inches)) => inches,
        (None, None) => default,
    };
    if !(v.is_finite() && v > 0.0) {
        anyhow::bail!("figure {} must be positive, got {}", what, v);
    }
    Ok(v)
}
