use crate::annotation::GeneAnnotationIndex;

/// chr1..chr22, chrX, chrY: the order chromosomes are laid out along the x axis.
pub fn standard_chromosomes() -> Vec<String> {
    (1..=22)
        .map(|n| format!("chr{}", n))
        .chain(["chrX".to_string(), "chrY".to_string()])
        .collect()
}

/// Cumulative start of each chromosome on the linear axis.
///
/// `values()[i]` is added to every local coordinate on the i-th chromosome;
/// the trailing entry is the end of the last chromosome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offsets {
    values: Vec<u64>,
}

impl Offsets {
    /// A chromosome missing from `index`, or without genes, adds nothing.
    /// The running total saturates at `u64::MAX`.
    pub fn compute(index: &GeneAnnotationIndex, ordered: &[String]) -> Self {
        let mut values = Vec::with_capacity(ordered.len() + 1);
        values.push(0u64);
        let mut running = 0u64;
        for chrom in ordered {
            let span = index.chromosome(chrom).map(|c| c.max_coord()).unwrap_or(0);
            running = running.saturating_add(span);
            values.push(running);
        }
        Offsets { values }
    }

    pub fn values(&self) -> &[u64] {
        &self.values
    }

    /// Global coordinate of `local` on the chromosome at position `i` of the order.
    pub fn global(&self, i: usize, local: u64) -> u64 {
        self.values[i].saturating_add(local)
    }

    /// Midpoint of each chromosome's segment; one per chromosome.
    pub fn tick_centers(&self) -> Vec<f64> {
        self.values
            .windows(2)
            .map(|w| (w[0] as f64 + w[1] as f64) / 2.0)
            .collect()
    }
}
