use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use tempfile::TempDir;

const SIMPLE: &str = "\
RANK\tGene\tp-value
1\tBRCA1\t0.001
2\tFOXP2\t0.01
3\tNOT_IN_GFF\t0.5
";

const PHEVOR2: &str = "\
#RANK\tGene\tScore
1\tFOXP2\t2.5
2\tBRCA1\t0.75
";

const GFF3: &str = "\
##gff-version 3
chr1\tsrc\tgene\t100\t200\t.\t+\t.\tID=gene1;Name=FOXP2
chr1\tsrc\tmRNA\t100\t200\t.\t+\t.\tID=tx1;Parent=gene1;Name=FOXP2-201
chr1\tsrc\tgene\t900\t1000\t.\t-\t.\tID=gene2;Name=QUIET
chr2\tsrc\tgene\t40\t60\t.\t+\t.\tID=gene3;Name=BRCA1
chr2\tsrc\tgene\t500\t500\t.\t+\t.\tID=gene4
";

struct Inputs {
    dir: TempDir,
}

impl Inputs {
    fn new(scores: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        std::fs::write(dir.path().join("scores.tsv"), scores)?;
        std::fs::write(dir.path().join("genes.gff3"), GFF3)?;
        Ok(Inputs { dir })
    }

    fn path(&self, name: &str) -> std::path::PathBuf {
        self.dir.path().join(name)
    }

    fn cmd(&self) -> Result<Command, Box<dyn std::error::Error>> {
        let mut cmd = Command::cargo_bin("gene-manhattan")?;
        cmd.arg(self.path("scores.tsv"))
            .arg(self.path("out.png"))
            .arg(self.path("genes.gff3"));
        Ok(cmd)
    }
}

fn series_rows(text: &str) -> Vec<Vec<String>> {
    text.lines()
        .filter(|l| !l.starts_with('#'))
        .map(|l| l.split('\t').map(|s| s.to_string()).collect())
        .collect()
}

#[test]
fn test_series_midpoint_simple() -> Result<(), Box<dyn std::error::Error>> {
    let inputs = Inputs::new(SIMPLE)?;
    let series = inputs.path("series.tsv");

    inputs
        .cmd()?
        .arg("--midpoint")
        .arg("--no-plot")
        .arg("--series")
        .arg(&series)
        .arg("--red-genes")
        .arg("BRCA1,MISSING")
        .assert()
        .success()
        .stderr(predicate::str::contains("MISSING"));

    assert!(!inputs.path("out.png").exists());

    let rows = series_rows(&std::fs::read_to_string(&series)?);
    // chr1 max = 950 (QUIET midpoint), so chr2 starts at 950
    let find = |gene: &str, subset: &str| {
        rows.iter()
            .find(|r| r[1] == gene && r[5] == subset)
            .cloned()
            .unwrap_or_else(|| panic!("no {} row for {}", subset, gene))
    };

    let foxp2 = find("FOXP2", "nonzero");
    assert_eq!(foxp2[0], "chr1");
    assert_eq!(foxp2[2], "150");
    assert_eq!(foxp2[4], "blue");
    let y: f64 = foxp2[3].parse()?;
    assert!((y - 2.0).abs() < 1e-9);

    let quiet = find("QUIET", "zero");
    assert_eq!(quiet[2], "950");
    assert_eq!(quiet[3], "0");

    let brca1 = find("BRCA1", "nonzero");
    assert_eq!(brca1[0], "chr2");
    assert_eq!(brca1[2], "1000");
    assert_eq!(brca1[4], "green");

    let label = find("BRCA1", "label");
    assert_eq!(label[2], "1000");
    assert_eq!(label[4], "red");

    // genes without Name, mRNA rows and the unscored-only gene never show up
    assert_eq!(rows.len(), 4);
    assert!(!rows.iter().any(|r| r[1] == "NOT_IN_GFF" || r[1] == "FOXP2-201"));

    Ok(())
}

#[test]
fn test_series_phevor2_scores_verbatim() -> Result<(), Box<dyn std::error::Error>> {
    let inputs = Inputs::new(PHEVOR2)?;
    let series = inputs.path("series.tsv");

    inputs
        .cmd()?
        .arg("--phevor2")
        .arg("--midpoint")
        .arg("--no-plot")
        .arg("--series")
        .arg(&series)
        .assert()
        .success();

    let rows = series_rows(&std::fs::read_to_string(&series)?);
    let score = |gene: &str| {
        rows.iter()
            .find(|r| r[1] == gene)
            .map(|r| r[3].clone())
            .unwrap_or_default()
    };
    assert_eq!(score("FOXP2"), "2.5");
    assert_eq!(score("BRCA1"), "0.75");
    assert_eq!(score("QUIET"), "0");

    Ok(())
}

#[test]
fn test_seeded_runs_are_identical() -> Result<(), Box<dyn std::error::Error>> {
    let inputs = Inputs::new(SIMPLE)?;

    for name in ["a.tsv", "b.tsv"] {
        inputs
            .cmd()?
            .arg("--seed")
            .arg("2015")
            .arg("--no-plot")
            .arg("--series")
            .arg(inputs.path(name))
            .assert()
            .success();
    }

    let a = std::fs::read(inputs.path("a.tsv"))?;
    let b = std::fs::read(inputs.path("b.tsv"))?;
    assert!(!a.is_empty());
    assert_eq!(a, b);

    // sampled positions stay inside the gene
    let rows = series_rows(&String::from_utf8(a)?);
    let foxp2 = rows.iter().find(|r| r[1] == "FOXP2").unwrap();
    let x: u64 = foxp2[2].parse()?;
    assert!((100..=200).contains(&x));

    Ok(())
}

#[test]
fn test_draws_svg() -> Result<(), Box<dyn std::error::Error>> {
    let inputs = Inputs::new(SIMPLE)?;
    let out = inputs.path("plot.svg");

    let mut cmd = Command::cargo_bin("gene-manhattan")?;
    cmd.arg(inputs.path("scores.tsv"))
        .arg(&out)
        .arg(inputs.path("genes.gff3"))
        .arg("--midpoint")
        .arg("--dpi")
        .arg("72")
        .arg("--blue-genes")
        .arg("FOXP2")
        .assert()
        .success()
        .stderr(predicate::str::contains("Plot complete"));

    let svg = std::fs::read_to_string(&out)?;
    assert!(svg.contains("<svg"));
    assert!(svg.contains("chr2"));

    Ok(())
}

#[test]
fn test_malformed_score_fails() -> Result<(), Box<dyn std::error::Error>> {
    let inputs = Inputs::new("RANK\tGene\tp\n1\tBRCA1\tnot-a-number\n")?;

    inputs
        .cmd()?
        .arg("--no-plot")
        .arg("--series")
        .arg(inputs.path("series.tsv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("[ERROR]"))
        .stderr(predicate::str::contains("Failed to load scores"))
        .stderr(predicate::str::contains(":2: p-value 'not-a-number' is not a number"));

    assert!(!inputs.path("series.tsv").exists());
    Ok(())
}

#[test]
fn test_malformed_gene_row_fails() -> Result<(), Box<dyn std::error::Error>> {
    let inputs = Inputs::new(SIMPLE)?;
    std::fs::write(
        inputs.path("genes.gff3"),
        "chr1\tsrc\tgene\tone\t200\t.\t+\t.\tName=FOXP2\n",
    )?;

    inputs
        .cmd()?
        .arg("--no-plot")
        .arg("--series")
        .arg(inputs.path("series.tsv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load gene coordinates"))
        .stderr(predicate::str::contains("start 'one'"));

    Ok(())
}

#[test]
fn test_missing_input_file() -> Result<(), Box<dyn std::error::Error>> {
    let inputs = Inputs::new(SIMPLE)?;
    std::fs::remove_file(inputs.path("genes.gff3"))?;

    inputs
        .cmd()?
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));

    Ok(())
}

#[test]
fn test_nothing_on_plotted_chromosomes() -> Result<(), Box<dyn std::error::Error>> {
    let inputs = Inputs::new(SIMPLE)?;
    std::fs::write(
        inputs.path("genes.gff3"),
        "chrUn_gl000220\tsrc\tgene\t1\t10\t.\t+\t.\tName=FOXP2\n",
    )?;

    inputs
        .cmd()?
        .arg("--no-plot")
        .arg("--series")
        .arg(inputs.path("series.tsv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("no genes found"));

    Ok(())
}

#[test]
fn test_argument_conflicts() -> Result<(), Box<dyn std::error::Error>> {
    let inputs = Inputs::new(SIMPLE)?;

    inputs.cmd()?.arg("--no-plot").assert().failure();

    inputs
        .cmd()?
        .arg("--inch-width")
        .arg("4")
        .arg("--mm-width")
        .arg("100")
        .assert()
        .failure();

    inputs
        .cmd()?
        .arg("--midpoint")
        .arg("--seed")
        .arg("1")
        .assert()
        .failure();

    Ok(())
}
