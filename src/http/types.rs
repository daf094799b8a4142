// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Phylodiff-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Phylodiff and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};

/// A scalar the page may send either as a JSON number or as text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Scalar(pub String);

impl Scalar {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ScalarVisitor;

        impl Visitor<'_> for ScalarVisitor {
            type Value = Scalar;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string or an integer")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Scalar, E> {
                Ok(Scalar(value.to_owned()))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Scalar, E> {
                Ok(Scalar(value.to_string()))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Scalar, E> {
                Ok(Scalar(value.to_string()))
            }
        }

        deserializer.deserialize_any(ScalarVisitor)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoadTreesParams {
    pub newick1: Option<String>,
    pub alg1: Option<String>,
    pub treeid1: Option<Scalar>,
    pub newick2: Option<String>,
    pub alg2: Option<String>,
    pub treeid2: Option<Scalar>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DrawTreeParams {
    pub treeid: Scalar,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeParams {
    pub treeid: Scalar,
    pub nodeid: Scalar,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunActionParams {
    pub treeid: Scalar,
    pub nodeid: Scalar,
    pub aindex: String,
    #[serde(default)]
    pub side: Option<String>,
    /// Sent by the page; actions run against nodes, so it is not consulted.
    #[serde(default)]
    pub faceid: Option<Scalar>,
}
