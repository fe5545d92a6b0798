use std::collections::HashSet;

/// Accepted-score pairing of a source and target caption, by track position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub source: usize,
    pub target: usize,
    pub score: f64,
}

/// Pick a one-to-one subset of candidates, best scores first
///
/// Ties go to the earlier source, then the earlier target. The result is
/// ordered by source position.
pub fn assign_exclusive(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(a.source.cmp(&b.source))
            .then(a.target.cmp(&b.target))
    });

    let mut used_sources = HashSet::new();
    let mut used_targets = HashSet::new();
    let mut assigned = Vec::new();
    for candidate in candidates {
        if used_sources.contains(&candidate.source) || used_targets.contains(&candidate.target) {
            continue;
        }
        used_sources.insert(candidate.source);
        used_targets.insert(candidate.target);
        assigned.push(candidate);
    }

    assigned.sort_by_key(|c| c.source);
    assigned
}
