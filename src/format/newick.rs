// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Phylodiff-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Phylodiff and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use crate::model::tree::{PhyloTree, TreeBuildError, TreeBuilder};

/// How labels on internal nodes are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InternalLabels {
    /// Internal labels must be numeric and are stored as support values.
    Support,
    /// Internal labels are node names.
    Names,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NewickError {
    #[error("newick input is empty")]
    Empty,
    #[error("unexpected '{found}' at byte {offset}")]
    UnexpectedChar { offset: usize, found: char },
    #[error("unbalanced parentheses at byte {offset}")]
    Unbalanced { offset: usize },
    #[error("newick tree must end with ';'")]
    MissingTerminator,
    #[error("unexpected input after ';' at byte {offset}")]
    TrailingInput { offset: usize },
    #[error("invalid branch length '{text}' at byte {offset}")]
    InvalidBranchLength { offset: usize, text: String },
    #[error("internal node label '{label}' at byte {offset} is not a support value")]
    InvalidSupport { offset: usize, label: String },
    #[error("unterminated quoted label starting at byte {offset}")]
    UnterminatedQuote { offset: usize },
    #[error("unterminated comment starting at byte {offset}")]
    UnterminatedComment { offset: usize },
    #[error(transparent)]
    Build(#[from] TreeBuildError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    Child,
    Separator,
}

struct Cursor<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, bytes: src.as_bytes(), pos: 0 }
    }

    fn skip_ws(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn unexpected(&self) -> NewickError {
        let found = self.src[self.pos..].chars().next().unwrap_or('\0');
        NewickError::UnexpectedChar { offset: self.pos, found }
    }
}

fn is_structural(byte: u8) -> bool {
    matches!(byte, b'(' | b')' | b',' | b':' | b';' | b'[') || byte.is_ascii_whitespace()
}

/// Parses a single Newick tree terminated by `;`.
///
/// Supports quoted labels (`'a b'`, with `''` as an escaped quote), branch lengths and NHX
/// comments (`[&&NHX:key=value:...]`); other bracket comments are skipped.
pub fn parse_newick(src: &str, internal: InternalLabels) -> Result<PhyloTree, NewickError> {
    let mut cursor = Cursor::new(src);
    cursor.skip_ws();
    if cursor.peek().is_none() {
        return Err(NewickError::Empty);
    }

    let mut builder = TreeBuilder::new();
    let mut open: Vec<usize> = Vec::new();
    let mut expect = Expect::Child;
    let mut terminated = false;

    while !terminated {
        cursor.skip_ws();
        let Some(byte) = cursor.peek() else {
            break;
        };

        match (expect, byte) {
            (Expect::Child, b'(') => {
                let node = builder.add(open.last().copied());
                open.push(node);
                cursor.pos += 1;
            }
            (Expect::Child, b',' | b')') => {
                // Empty leaf, e.g. `(,A)`.
                let Some(parent) = open.last().copied() else {
                    return Err(cursor.unexpected());
                };
                builder.add(Some(parent));
                expect = Expect::Separator;
            }
            (Expect::Child, b';') => {
                if builder.is_empty() {
                    return Err(NewickError::Empty);
                }
                return Err(NewickError::Unbalanced { offset: cursor.pos });
            }
            (Expect::Child, _) => {
                let leaf = builder.add(open.last().copied());
                read_node_properties(&mut cursor, &mut builder, leaf, true, internal)?;
                expect = Expect::Separator;
            }
            (Expect::Separator, b',') => {
                if open.is_empty() {
                    return Err(cursor.unexpected());
                }
                cursor.pos += 1;
                expect = Expect::Child;
            }
            (Expect::Separator, b')') => {
                let Some(node) = open.pop() else {
                    return Err(NewickError::Unbalanced { offset: cursor.pos });
                };
                cursor.pos += 1;
                read_node_properties(&mut cursor, &mut builder, node, false, internal)?;
            }
            (Expect::Separator, b';') => {
                if !open.is_empty() {
                    return Err(NewickError::Unbalanced { offset: cursor.pos });
                }
                cursor.pos += 1;
                terminated = true;
            }
            (Expect::Separator, _) => return Err(cursor.unexpected()),
        }
    }

    if !terminated {
        if !open.is_empty() {
            return Err(NewickError::Unbalanced { offset: cursor.pos });
        }
        return Err(NewickError::MissingTerminator);
    }

    cursor.skip_ws();
    if cursor.pos < cursor.bytes.len() {
        return Err(NewickError::TrailingInput { offset: cursor.pos });
    }

    Ok(builder.build()?)
}

fn read_node_properties(
    cursor: &mut Cursor<'_>,
    builder: &mut TreeBuilder,
    node: usize,
    is_leaf: bool,
    internal: InternalLabels,
) -> Result<(), NewickError> {
    cursor.skip_ws();
    let label_offset = cursor.pos;
    let label = read_label(cursor)?;

    if !label.is_empty() {
        let draft = builder.draft_mut(node);
        if is_leaf || internal == InternalLabels::Names {
            draft.name = label.into();
        } else {
            let support = label.parse::<f64>().map_err(|_| NewickError::InvalidSupport {
                offset: label_offset,
                label: label.clone(),
            })?;
            draft.support = Some(support);
        }
    }

    loop {
        cursor.skip_ws();
        match cursor.peek() {
            Some(b':') => {
                cursor.pos += 1;
                cursor.skip_ws();
                let start = cursor.pos;
                while cursor.peek().is_some_and(|b| {
                    b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E')
                }) {
                    cursor.pos += 1;
                }
                let text = &cursor.src[start..cursor.pos];
                let dist = text.parse::<f64>().map_err(|_| NewickError::InvalidBranchLength {
                    offset: start,
                    text: text.to_owned(),
                })?;
                builder.draft_mut(node).dist = Some(dist);
            }
            Some(b'[') => {
                let comment = read_comment(cursor)?;
                if let Some(features) = parse_nhx(comment) {
                    builder.draft_mut(node).features.extend(features);
                }
            }
            _ => return Ok(()),
        }
    }
}

fn read_label(cursor: &mut Cursor<'_>) -> Result<String, NewickError> {
    if cursor.peek() == Some(b'\'') {
        let start = cursor.pos;
        cursor.pos += 1;
        let mut label = String::new();
        loop {
            let Some(rest) = cursor.src.get(cursor.pos..) else {
                return Err(NewickError::UnterminatedQuote { offset: start });
            };
            let Some(quote) = rest.find('\'') else {
                return Err(NewickError::UnterminatedQuote { offset: start });
            };
            label.push_str(&rest[..quote]);
            cursor.pos += quote + 1;
            if cursor.peek() == Some(b'\'') {
                label.push('\'');
                cursor.pos += 1;
            } else {
                return Ok(label);
            }
        }
    }

    let start = cursor.pos;
    while cursor.peek().is_some_and(|b| !is_structural(b)) {
        cursor.pos += 1;
    }
    Ok(cursor.src[start..cursor.pos].to_owned())
}

fn read_comment<'a>(cursor: &mut Cursor<'a>) -> Result<&'a str, NewickError> {
    let start = cursor.pos;
    let src = cursor.src;
    let Some(close) = src[start..].find(']') else {
        return Err(NewickError::UnterminatedComment { offset: start });
    };
    cursor.pos = start + close + 1;
    Ok(&src[start + 1..start + close])
}

fn parse_nhx(comment: &str) -> Option<BTreeMap<String, String>> {
    let body = comment.strip_prefix("&&NHX")?;
    let features = body
        .split(':')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            let key = key.trim();
            (!key.is_empty()).then(|| (key.to_owned(), value.trim().to_owned()))
        })
        .collect();
    Some(features)
}
