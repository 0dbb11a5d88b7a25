use std::io::Write;

use crate::annotation::GeneAnnotationIndex;
use crate::error::ParseError;
use crate::linear::Offsets;

/// Lower y bound; keeps zero-score points off the axis line.
pub const Y_FLOOR: f64 = -0.05;
/// Headroom above the highest score.
pub const Y_HEADROOM: f64 = 1.0;

/// Per-chromosome point color, cycled in chromosome order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromosomeColor {
    Blue,
    Green,
    Red,
    Yellow,
}

pub const PALETTE: [ChromosomeColor; 4] = [
    ChromosomeColor::Blue,
    ChromosomeColor::Green,
    ChromosomeColor::Red,
    ChromosomeColor::Yellow,
];

impl ChromosomeColor {
    pub fn for_index(i: usize) -> Self {
        PALETTE[i % PALETTE.len()]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChromosomeColor::Blue => "blue",
            ChromosomeColor::Green => "green",
            ChromosomeColor::Red => "red",
            ChromosomeColor::Yellow => "yellow",
        }
    }
}

/// Color of a highlight label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightColor {
    Red,
    Blue,
}

impl HighlightColor {
    pub fn as_str(self) -> &'static str {
        match self {
            HighlightColor::Red => "red",
            HighlightColor::Blue => "blue",
        }
    }
}

/// Gene names to label in one color.
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightSet {
    pub color: HighlightColor,
    pub genes: Vec<String>,
}

/// Parallel x (global coordinate) and y (score) arrays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    pub names: Vec<String>,
    pub x: Vec<u64>,
    pub y: Vec<f64>,
}

impl Series {
    fn push(&mut self, name: &str, x: u64, y: f64) {
        self.names.push(name.to_string());
        self.x.push(x);
        self.y.push(y);
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = (u64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChromosomeSeries {
    pub id: String,
    pub color: ChromosomeColor,
    /// score <= 0
    pub zero: Series,
    /// score > 0
    pub nonzero: Series,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HighlightLabel {
    pub gene: String,
    pub chromosome: String,
    pub color: HighlightColor,
    pub x: u64,
    pub y: f64,
}

/// Everything the renderer needs, already on the global axis.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotData {
    pub chromosomes: Vec<ChromosomeSeries>,
    pub highlights: Vec<HighlightLabel>,
    pub x_range: (u64, u64),
    pub y_range: (f64, f64),
    pub ticks: Vec<f64>,
    pub labels: Vec<String>,
}

impl PlotData {
    pub fn build(
        index: &GeneAnnotationIndex,
        offsets: &Offsets,
        ordered: &[String],
        max_score: f64,
        highlights: &[HighlightSet],
    ) -> Result<Self, ParseError> {
        let mut chromosomes = Vec::with_capacity(ordered.len());
        let mut x_min = u64::MAX;
        let mut x_max = 0u64;

        for (i, id) in ordered.iter().enumerate() {
            let mut zero = Series::default();
            let mut nonzero = Series::default();
            if let Some(chrom) = index.chromosome(id) {
                for g in chrom.genes() {
                    let x = offsets.global(i, g.coord);
                    x_min = x_min.min(x);
                    x_max = x_max.max(x);
                    if g.score > 0.0 {
                        nonzero.push(&g.name, x, g.score);
                    } else {
                        zero.push(&g.name, x, g.score);
                    }
                }
            }
            chromosomes.push(ChromosomeSeries {
                id: id.clone(),
                color: ChromosomeColor::for_index(i),
                zero,
                nonzero,
            });
        }

        if x_min > x_max {
            return Err(ParseError::NoGenes);
        }

        let labels = resolve_highlights(index, offsets, ordered, highlights);

        Ok(PlotData {
            chromosomes,
            highlights: labels,
            x_range: (x_min, x_max),
            y_range: (Y_FLOOR, max_score + Y_HEADROOM),
            ticks: offsets.tick_centers(),
            labels: ordered.to_vec(),
        })
    }

    pub fn point_count(&self) -> usize {
        self.chromosomes
            .iter()
            .map(|c| c.zero.len() + c.nonzero.len())
            .sum()
    }

    /// Tick position and name of every chromosome that has points.
    ///
    /// An empty chromosome has a zero-width segment whose tick falls on a neighbour's
    /// boundary, so it gets no label.
    pub fn axis_labels(&self) -> Vec<(f64, &str)> {
        self.ticks
            .iter()
            .zip(&self.labels)
            .zip(&self.chromosomes)
            .filter(|(_, c)| !(c.zero.is_empty() && c.nonzero.is_empty()))
            .map(|((&t, l), _)| (t, l.as_str()))
            .collect()
    }

    /// One row per point, then one per highlight label.
    ///
    /// Columns: chrom, gene, x, y, color, subset (`zero`, `nonzero`, or `label`).
    pub fn write_tsv<W: Write>(&self, mut w: W) -> std::io::Result<()> {
        writeln!(w, "#chrom\tgene\tx\ty\tcolor\tsubset")?;
        for c in &self.chromosomes {
            for (subset, series) in [("zero", &c.zero), ("nonzero", &c.nonzero)] {
                for (name, (x, y)) in series.names.iter().zip(series.points()) {
                    writeln!(w, "{}\t{}\t{}\t{}\t{}\t{}", c.id, name, x, y, c.color.as_str(), subset)?;
                }
            }
        }
        for h in &self.highlights {
            writeln!(
                w,
                "{}\t{}\t{}\t{}\t{}\tlabel",
                h.chromosome,
                h.gene,
                h.x,
                h.y,
                h.color.as_str()
            )?;
        }
        w.flush()
    }
}

/// Requested names that are not on any plotted chromosome are dropped with a warning.
/// A name present on several chromosomes takes the last one in plot order.
fn resolve_highlights(
    index: &GeneAnnotationIndex,
    offsets: &Offsets,
    ordered: &[String],
    sets: &[HighlightSet],
) -> Vec<HighlightLabel> {
    let mut out = Vec::new();
    for set in sets {
        for name in &set.genes {
            let hits: Vec<(usize, &String)> = ordered
                .iter()
                .enumerate()
                .filter(|(_, id)| {
                    index
                        .chromosome(id)
                        .is_some_and(|c| c.get(name).is_some())
                })
                .collect();

            let Some(&(i, chrom)) = hits.last() else {
                log::warn!(
                    "{} gene '{}' is not on any plotted chromosome; no label drawn",
                    set.color.as_str(),
                    name
                );
                continue;
            };
            if hits.len() > 1 {
                let found_on: Vec<&str> = hits.iter().map(|(_, c)| c.as_str()).collect();
                log::warn!(
                    "gene '{}' is on {}; labelling the copy on {}",
                    name,
                    found_on.join(", "),
                    chrom
                );
            }

            // present by construction of `hits`
            if let Some(g) = index.chromosome(chrom).and_then(|c| c.get(name)) {
                out.push(HighlightLabel {
                    gene: name.clone(),
                    chromosome: chrom.clone(),
                    color: set.color,
                    x: offsets.global(i, g.coord),
                    y: g.score,
                });
            }
        }
    }
    out
}
