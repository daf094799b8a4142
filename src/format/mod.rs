// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Phylodiff-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Phylodiff and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Tree text formats.
//!
//! Parsing is a seam: sessions call a [`TreeParser`] for the primary (support + alignment)
//! format and, if that fails, for the plain-topology format.

use std::fmt;

pub mod fasta;
pub mod newick;

pub use fasta::{link_alignment, parse_fasta, FastaError, FastaRecord};
pub use newick::{parse_newick, InternalLabels, NewickError};

use crate::model::PhyloTree;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrimaryParseError {
    #[error("newick: {0}")]
    Newick(#[from] NewickError),
    #[error("alignment: {0}")]
    Alignment(#[from] FastaError),
}

/// Neither the primary nor the plain-topology parse accepted the input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("tree could not be parsed (primary format: {primary}; topology format: {fallback})")]
pub struct TreeParseError {
    pub primary: PrimaryParseError,
    pub fallback: NewickError,
}

pub trait TreeParser: Send + Sync + fmt::Debug {
    /// Newick with numeric internal labels read as support, plus an optional FASTA alignment
    /// linked to the leaves.
    fn parse_primary(
        &self,
        tree_text: &str,
        alignment: Option<&str>,
    ) -> Result<PhyloTree, PrimaryParseError>;

    /// Newick with internal labels read as names; alignments are not consulted.
    fn parse_topology(&self, tree_text: &str) -> Result<PhyloTree, NewickError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NewickParser;

impl TreeParser for NewickParser {
    fn parse_primary(
        &self,
        tree_text: &str,
        alignment: Option<&str>,
    ) -> Result<PhyloTree, PrimaryParseError> {
        let mut tree = parse_newick(tree_text, InternalLabels::Support)?;
        if let Some(alignment) = alignment.filter(|text| !text.trim().is_empty()) {
            let records = parse_fasta(alignment)?;
            link_alignment(&mut tree, &records);
        }
        Ok(tree)
    }

    fn parse_topology(&self, tree_text: &str) -> Result<PhyloTree, NewickError> {
        parse_newick(tree_text, InternalLabels::Names)
    }
}
