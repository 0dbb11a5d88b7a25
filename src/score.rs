use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::ParseError;

/// Header token of VAAST/pVAAST `.simple` output.
const SIMPLE_HEADER: &str = "RANK";
const COMMENT: char = '#';

/// Layout of the score file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreFormat {
    /// VAAST/pVAAST `.simple`: RANK, gene, p-value. Score is -log10(p).
    Simple,
    /// Phevor2: marker, gene, score. Score is taken as-is.
    Phevor2,
}

impl ScoreFormat {
    pub fn y_label(self) -> &'static str {
        match self {
            ScoreFormat::Simple => "-log10 pVAAST p-value",
            ScoreFormat::Phevor2 => "Phevor Score",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ScoreFormat::Simple => "Genes Scored by pVAAST",
            ScoreFormat::Phevor2 => "Genes Re-Ranked by Phevor",
        }
    }

    fn skips(self, first_col: &str) -> bool {
        match self {
            ScoreFormat::Simple => first_col == SIMPLE_HEADER,
            ScoreFormat::Phevor2 => first_col.contains(COMMENT),
        }
    }
}

/// Gene name -> score, plus the highest score accepted.
#[derive(Debug, Clone, Default)]
pub struct ScoreTable {
    scores: HashMap<String, f64>,
    max_score: f64,
}

impl ScoreTable {
    pub fn from_path(path: &Path, format: ScoreFormat) -> Result<Self, ParseError> {
        let file = File::open(path).map_err(|e| ParseError::io(path, e))?;
        Self::from_reader(BufReader::new(file), format, path)
    }

    /// `origin` is only used in error messages.
    pub fn from_reader<R: BufRead>(
        reader: R,
        format: ScoreFormat,
        origin: &Path,
    ) -> Result<Self, ParseError> {
        let mut table = ScoreTable::default();

        for (i, line) in reader.lines().enumerate() {
            let line_no = i + 1;
            let line = line.map_err(|e| ParseError::io(origin, e))?;
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }

            let cols: Vec<&str> = line.split('\t').collect();
            if format.skips(cols[0]) {
                continue;
            }
            if cols.len() < 3 {
                return Err(ParseError::malformed(
                    origin,
                    line_no,
                    format!("expected at least 3 tab-separated columns, found {}", cols.len()),
                ));
            }

            let gene = cols[1].trim();
            let field = cols[2].trim();
            let score = match format {
                ScoreFormat::Simple => {
                    let p = field.parse::<f64>().map_err(|_| {
                        ParseError::malformed(origin, line_no, format!("p-value '{}' is not a number", field))
                    })?;
                    if !(p > 0.0 && p <= 1.0) {
                        return Err(ParseError::malformed(
                            origin,
                            line_no,
                            format!("p-value {} is outside (0, 1]", p),
                        ));
                    }
                    -p.log10()
                }
                ScoreFormat::Phevor2 => {
                    let s = field.parse::<f64>().map_err(|_| {
                        ParseError::malformed(origin, line_no, format!("score '{}' is not a number", field))
                    })?;
                    if !s.is_finite() {
                        return Err(ParseError::malformed(
                            origin,
                            line_no,
                            format!("score {} is not finite", s),
                        ));
                    }
                    s
                }
            };

            table.insert(gene, score);
        }

        Ok(table)
    }

    fn insert(&mut self, gene: &str, score: f64) {
        if score > self.max_score {
            self.max_score = score;
        }
        self.scores.insert(gene.to_string(), score);
    }

    /// Score for `gene`, or exactly 0.0 when the gene was not scored.
    pub fn score_of(&self, gene: &str) -> f64 {
        self.scores.get(gene).copied().unwrap_or(0.0)
    }

    pub fn get(&self, gene: &str) -> Option<f64> {
        self.scores.get(gene).copied()
    }

    pub fn genes(&self) -> impl Iterator<Item = &str> {
        self.scores.keys().map(|k| k.as_str())
    }

    pub fn max_score(&self) -> f64 {
        self.max_score
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Cursor;

    fn parse(text: &str, format: ScoreFormat) -> Result<ScoreTable, ParseError> {
        ScoreTable::from_reader(Cursor::new(text), format, Path::new("test.tsv"))
    }

    #[test]
    fn test_simple_neg_log10() {
        let t = parse("RANK\tGENE\tP\n1\tBRCA1\t0.001\n2\t TP53 \t0.5\n", ScoreFormat::Simple).unwrap();
        assert_eq!(t.len(), 2);
        assert_relative_eq!(t.score_of("BRCA1"), 3.0, epsilon = 1e-12);
        assert_relative_eq!(t.score_of("TP53"), -(0.5f64).log10(), epsilon = 1e-12);
        assert_relative_eq!(t.max_score(), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_simple_score_decreases_with_p() {
        let t = parse("1\tA\t0.0001\n2\tB\t0.01\n3\tC\t1\n", ScoreFormat::Simple).unwrap();
        assert!(t.score_of("A") > t.score_of("B"));
        assert!(t.score_of("B") > t.score_of("C"));
        assert_eq!(t.score_of("C"), 0.0);
    }

    #[test]
    fn test_phevor2_verbatim_and_comments() {
        let text = "#RANK\tGENE\tSCORE\n1\tFOXP2\t2.5\n2\tCFTR\t-0.75\n";
        let t = parse(text, ScoreFormat::Phevor2).unwrap();
        assert_eq!(t.get("FOXP2"), Some(2.5));
        assert_eq!(t.get("CFTR"), Some(-0.75));
        assert_eq!(t.max_score(), 2.5);
    }

    #[test]
    fn test_header_only_applies_to_its_format() {
        // "RANK" is not a comment in Phevor2 files, so it reaches the numeric parse.
        let err = parse("RANK\tGENE\tSCORE\n", ScoreFormat::Phevor2).unwrap_err();
        assert!(matches!(err, ParseError::MalformedRow { line: 1, .. }));

        // and '#' is not a header token in .simple files
        let err = parse("#1\tA\tx\n", ScoreFormat::Simple).unwrap_err();
        assert!(matches!(err, ParseError::MalformedRow { line: 1, .. }));
    }

    #[test]
    fn test_empty_input_max_is_zero() {
        let t = parse("", ScoreFormat::Simple).unwrap();
        assert!(t.is_empty());
        assert_eq!(t.max_score(), 0.0);
    }

    #[test]
    fn test_negative_scores_keep_max_at_zero() {
        let t = parse("1\tA\t-2\n2\tB\t-1\n", ScoreFormat::Phevor2).unwrap();
        assert_eq!(t.max_score(), 0.0);
    }

    #[test]
    fn test_later_duplicate_overwrites() {
        let t = parse("1\tA\t1.0\n2\tA\t4.0\n3\tA\t2.0\n", ScoreFormat::Phevor2).unwrap();
        assert_eq!(t.len(), 1);
        assert_eq!(t.score_of("A"), 2.0);
        // the maximum still reflects every accepted row
        assert_eq!(t.max_score(), 4.0);
    }

    #[test]
    fn test_unscored_gene_defaults_to_zero() {
        let t = parse("1\tA\t0.1\n", ScoreFormat::Simple).unwrap();
        assert_eq!(t.score_of("NOT_THERE"), 0.0);
        assert_eq!(t.get("NOT_THERE"), None);
    }

    #[test]
    fn test_malformed_rows_fail() {
        let err = parse("1\tA\t0.1\n2\tB\n", ScoreFormat::Simple).unwrap_err();
        assert!(matches!(err, ParseError::MalformedRow { line: 2, .. }));

        let err = parse("1\tA\tnot_a_p\n", ScoreFormat::Simple).unwrap_err();
        assert!(err.to_string().contains("not a number"));

        let err = parse("1\tA\t0\n", ScoreFormat::Simple).unwrap_err();
        assert!(err.to_string().contains("outside (0, 1]"));

        let err = parse("1\tA\t1.5\n", ScoreFormat::Simple).unwrap_err();
        assert!(err.to_string().contains("outside (0, 1]"));
    }

    #[test]
    fn test_trailing_columns_and_blank_lines() {
        let t = parse("1\tA\t0.01\textra\tcols\n\n2\tB\t0.1\r\n", ScoreFormat::Simple).unwrap();
        assert_relative_eq!(t.score_of("A"), 2.0, epsilon = 1e-12);
        assert_relative_eq!(t.score_of("B"), 1.0, epsilon = 1e-12);
    }
}
