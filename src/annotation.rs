use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;

use crate::error::ParseError;
use crate::score::ScoreTable;

const COMMENT: char = '#';
const FASTA_DIRECTIVE: &str = "##FASTA";
const GENE_FEATURE: &str = "gene";
const NAME_KEY: &str = "Name";

/// Draws the representative coordinate of a gene from `[start, stop]` (inclusive).
pub trait CoordinateSampler {
    fn sample(&mut self, start: u64, stop: u64) -> u64;
}

/// Uniform draw, so genes sharing an interval scale do not stack on one pixel.
pub struct UniformSampler {
    rng: StdRng,
}

impl UniformSampler {
    pub fn seeded(seed: u64) -> Self {
        UniformSampler {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        UniformSampler {
            rng: StdRng::from_entropy(),
        }
    }
}

impl CoordinateSampler for UniformSampler {
    fn sample(&mut self, start: u64, stop: u64) -> u64 {
        self.rng.gen_range(start..=stop)
    }
}

/// Middle of the interval, rounded down.
pub struct MidpointSampler;

impl CoordinateSampler for MidpointSampler {
    fn sample(&mut self, start: u64, stop: u64) -> u64 {
        start + (stop - start) / 2
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneRecord {
    pub name: String,
    pub start: u64,
    pub stop: u64,
    /// Local (per-chromosome) position used on the plot.
    pub coord: u64,
    pub score: f64,
}

/// One chromosome and its genes, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct Chromosome {
    pub id: String,
    genes: IndexMap<String, GeneRecord>,
}

impl Chromosome {
    pub fn new(id: &str) -> Self {
        Chromosome {
            id: id.to_string(),
            genes: IndexMap::new(),
        }
    }

    /// Replaces an existing record of the same name in place.
    pub fn insert(&mut self, gene: GeneRecord) {
        self.genes.insert(gene.name.clone(), gene);
    }

    pub fn get(&self, name: &str) -> Option<&GeneRecord> {
        self.genes.get(name)
    }

    pub fn genes(&self) -> impl Iterator<Item = &GeneRecord> {
        self.genes.values()
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Largest representative coordinate, 0 when there are no genes.
    pub fn max_coord(&self) -> u64 {
        self.genes.values().map(|g| g.coord).max().unwrap_or(0)
    }
}

/// Genes from a GFF3 file grouped by (canonical) chromosome id.
#[derive(Debug, Clone, Default)]
pub struct GeneAnnotationIndex {
    chromosomes: IndexMap<String, Chromosome>,
}

impl GeneAnnotationIndex {
    pub fn from_path<S: CoordinateSampler>(
        path: &Path,
        scores: &ScoreTable,
        sampler: &mut S,
    ) -> Result<Self, ParseError> {
        let file = File::open(path).map_err(|e| ParseError::io(path, e))?;
        Self::from_reader(BufReader::new(file), scores, sampler, path)
    }

    pub fn from_reader<R: BufRead, S: CoordinateSampler>(
        reader: R,
        scores: &ScoreTable,
        sampler: &mut S,
        origin: &Path,
    ) -> Result<Self, ParseError> {
        let chrom_re = chromosome_regex();
        let mut index = GeneAnnotationIndex::default();
        let mut unnamed = 0usize;

        for (i, line) in reader.lines().enumerate() {
            let line_no = i + 1;
            let line = line.map_err(|e| ParseError::io(origin, e))?;
            let line = line.trim_end_matches('\r');
            if line.starts_with(FASTA_DIRECTIVE) {
                break;
            }
            if line.trim().is_empty() {
                continue;
            }

            let cols: Vec<&str> = line.split('\t').collect();
            if cols[0].contains(COMMENT) {
                continue;
            }
            if cols.len() < 3 {
                return Err(ParseError::malformed(
                    origin,
                    line_no,
                    format!("expected 9 tab-separated columns, found {}", cols.len()),
                ));
            }
            if cols[2] != GENE_FEATURE {
                continue;
            }
            if cols.len() < 9 {
                return Err(ParseError::malformed(
                    origin,
                    line_no,
                    format!("gene feature has {} columns, expected 9", cols.len()),
                ));
            }

            let start = parse_bound(cols[3], "start", origin, line_no)?;
            let stop = parse_bound(cols[4], "stop", origin, line_no)?;
            if start > stop {
                return Err(ParseError::malformed(
                    origin,
                    line_no,
                    format!("start {} is after stop {}", start, stop),
                ));
            }

            let name = match attribute(cols[8], NAME_KEY) {
                Some(n) => n,
                None => {
                    unnamed += 1;
                    continue;
                }
            };

            let chrom = canonical_chromosome(&chrom_re, cols[0]);
            let coord = sampler.sample(start, stop);
            let gene = GeneRecord {
                name: name.to_string(),
                start,
                stop,
                coord,
                score: scores.score_of(name),
            };
            index
                .chromosomes
                .entry(chrom.clone())
                .or_insert_with(|| Chromosome::new(&chrom))
                .insert(gene);
        }

        if unnamed > 0 {
            log::debug!(
                "{}: {} gene feature(s) without a Name attribute were dropped",
                origin.display(),
                unnamed
            );
        }

        Ok(index)
    }

    pub fn chromosome(&self, id: &str) -> Option<&Chromosome> {
        self.chromosomes.get(id)
    }

    /// True when `name` is a gene on any chromosome.
    pub fn has_gene(&self, name: &str) -> bool {
        self.chromosomes.values().any(|c| c.get(name).is_some())
    }

    pub fn gene_count(&self) -> usize {
        self.chromosomes.values().map(|c| c.len()).sum()
    }

    #[cfg(test)]
    pub(crate) fn insert(&mut self, chrom: &str, gene: GeneRecord) {
        self.chromosomes
            .entry(chrom.to_string())
            .or_insert_with(|| Chromosome::new(chrom))
            .insert(gene);
    }
}

fn parse_bound(field: &str, what: &str, origin: &Path, line_no: usize) -> Result<u64, ParseError> {
    field.trim().parse::<u64>().map_err(|_| {
        ParseError::malformed(
            origin,
            line_no,
            format!("{} '{}' is not a non-negative integer", what, field),
        )
    })
}

/// Value of `key` in a `k1=v1;k2=v2` attribute column.
/// Segments without '=' are ignored; a repeated key resolves to its last value.
fn attribute<'a>(attrs: &'a str, key: &str) -> Option<&'a str> {
    attrs
        .split(';')
        .filter_map(|seg| seg.trim().split_once('='))
        .filter(|(k, _)| *k == key)
        .map(|(_, v)| v)
        .last()
        .filter(|v| !v.is_empty())
}

fn chromosome_regex() -> Regex {
    Regex::new(r"(?i)^(?:chr)?(?P<chr>[0-9]{1,2}|x|y|m|mt)$").expect("invalid regex")
}

/// `1`, `chr1`, `Chr1` -> `chr1`; `x` -> `chrX`; `MT` -> `chrM`. Other seqids are kept.
fn canonical_chromosome(re: &Regex, seqid: &str) -> String {
    let seqid = seqid.trim();
    match re.captures(seqid).and_then(|c| c.name("chr")) {
        Some(m) => match m.as_str().to_ascii_uppercase().as_str() {
            "M" | "MT" => "chrM".to_string(),
            other if other.starts_with('0') && other.len() > 1 => format!("chr{}", &other[1..]),
            other => format!("chr{}", other),
        },
        None => seqid.to_string(),
    }
}
