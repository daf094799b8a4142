// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Phylodiff-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Phylodiff and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#![allow(dead_code)]

// Deterministic tree pairs for benches (no RNG).

use std::sync::Arc;

use phylodiff::actions::{register_builtins, ActionRegistry, BuiltinAction};
use phylodiff::diff::MatchRecord;
use phylodiff::format::NewickParser;
use phylodiff::model::{SessionDefaults, SessionId, TreeSession, TreeSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Case {
    Small,
    Medium,
    Large,
}

impl Case {
    pub const ALL: [Self; 3] = [Self::Small, Self::Medium, Self::Large];

    /// Stable case id used in bench names.
    pub fn id(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }

    pub fn leaves(self) -> usize {
        match self {
            Self::Small => 16,
            Self::Medium => 128,
            Self::Large => 1024,
        }
    }
}

fn leaf_name(index: usize) -> String {
    format!("L{index:04}")
}

/// Alternates balanced splits with ladder-like ones so both deep and wide clades appear.
fn write_clade(out: &mut String, leaves: &[String], depth: usize) {
    if let [only] = leaves {
        out.push_str(only);
        out.push_str(":0.1");
        return;
    }
    let split = if depth % 3 == 2 { 1 } else { leaves.len() / 2 };
    out.push('(');
    write_clade(out, &leaves[..split], depth + 1);
    out.push(',');
    write_clade(out, &leaves[split..], depth + 1);
    out.push_str(&format!("){}:0.2", 50 + depth % 50));
}

/// Newick with `case.leaves()` leaves; `shift` rotates every fifth leaf so the two trees of a
/// pair disagree on some clades.
pub fn newick(case: Case, shift: usize) -> String {
    let count = case.leaves();
    let leaves = (0..count)
        .map(|i| if shift > 0 && i % 5 == 0 { leaf_name((i + shift * 5) % count) } else { leaf_name(i) })
        .collect::<Vec<_>>();
    let mut out = String::new();
    write_clade(&mut out, &leaves, 0);
    out.push(';');
    out
}

pub fn defaults() -> SessionDefaults {
    let registry = Arc::new(ActionRegistry::new());
    register_builtins(&registry, &BuiltinAction::ALL);
    SessionDefaults::new(registry)
}

pub fn session(id: &str, newick: &str, defaults: &SessionDefaults) -> TreeSession {
    let session_id = SessionId::new(id).expect("session id");
    TreeSession::create(&TreeSource::new(newick), session_id, defaults, &NewickParser).expect("session")
}

pub fn pair(case: Case) -> (TreeSession, TreeSession) {
    let defaults = defaults();
    (
        session("left", &newick(case, 0), &defaults),
        session("right", &newick(case, 1), &defaults),
    )
}

pub fn checksum_matches(matches: &[MatchRecord]) -> u64 {
    matches.iter().fold(0u64, |acc, record| {
        acc.wrapping_mul(131)
            .wrapping_add(u64::from(record.node_a.get()))
            .wrapping_mul(31)
            .wrapping_add(u64::from(record.node_b.get()))
            .wrapping_add(record.diff.len() as u64)
    })
}
