// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Phylodiff-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Phylodiff and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use crate::model::PhyloTree;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    name: String,
    sequence: String,
}

impl FastaRecord {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FastaError {
    #[error("sequence data on line {line_no} appears before any '>' header")]
    OrphanSequence { line_no: usize },
    #[error("header on line {line_no} has no sequence name")]
    MissingName { line_no: usize },
    #[error("sequence '{name}' appears more than once")]
    DuplicateName { name: String },
    #[error("alignment contains no sequences")]
    Empty,
}

/// Parses FASTA text. The record name is the first whitespace-separated token of the header.
pub fn parse_fasta(src: &str) -> Result<Vec<FastaRecord>, FastaError> {
    let mut records: Vec<FastaRecord> = Vec::new();
    let mut seen = BTreeMap::new();

    for (index, raw) in src.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }

        if let Some(header) = line.strip_prefix('>') {
            let Some(name) = header.split_whitespace().next() else {
                return Err(FastaError::MissingName { line_no });
            };
            if seen.insert(name.to_owned(), line_no).is_some() {
                return Err(FastaError::DuplicateName { name: name.to_owned() });
            }
            records.push(FastaRecord { name: name.to_owned(), sequence: String::new() });
            continue;
        }

        let Some(current) = records.last_mut() else {
            return Err(FastaError::OrphanSequence { line_no });
        };
        current.sequence.extend(line.chars().filter(|c| !c.is_whitespace()));
    }

    if records.is_empty() {
        return Err(FastaError::Empty);
    }
    Ok(records)
}

/// Attaches sequences to the leaves whose names match. Returns how many leaves were linked;
/// records for unknown leaves and leaves without a record are left alone.
pub fn link_alignment(tree: &mut PhyloTree, records: &[FastaRecord]) -> usize {
    let by_name = records
        .iter()
        .map(|record| (record.name(), record.sequence()))
        .collect::<BTreeMap<_, _>>();

    let mut linked = 0;
    for node in tree.nodes_mut() {
        if !node.is_leaf() {
            continue;
        }
        if let Some(sequence) = by_name.get(node.name()) {
            node.set_sequence(Some((*sequence).to_owned()));
            linked += 1;
        }
    }
    linked
}
