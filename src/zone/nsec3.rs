// Copyright 2023 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! Implementation of NSEC3 hashing and the closest-encloser search.
//!
//! [`ZoneData::find_nsec3`] serves DNSSEC responders assembling
//! authenticated denial of existence per [RFC 5155 § 7.2]: starting
//! from the query name and stripping the deepest label one name at a
//! time, it hashes each candidate and looks the hash up in the zone's
//! NSEC3 tree. The first hit identifies the closest encloser; the
//! covering entry remembered from the previous (one label longer)
//! candidate is the next-closer proof. When the zone is consistent the
//! search always terminates, because the origin itself is hashed into
//! the tree.
//!
//! Hashes are computed per [RFC 5155 § 5]: the name is down-cased,
//! wire-encoded, and digested with SHA-1 over `name ‖ salt`, then the
//! digest is re-salted and re-digested for the configured number of
//! additional iterations. Owner names in the NSEC3 tree are the
//! base32hex ([RFC 4648 § 7]) form of the digest.
//!
//! [RFC 4648 § 7]: https://datatracker.ietf.org/doc/html/rfc4648#section-7
//! [RFC 5155 § 5]: https://datatracker.ietf.org/doc/html/rfc5155#section-5
//! [RFC 5155 § 7.2]: https://datatracker.ietf.org/doc/html/rfc5155#section-7.2

use std::cmp::Ordering;

use data_encoding::BASE32_DNSSEC;
use log::debug;
use sha1::{Digest, Sha1};

use crate::name::{Label, LabelSeq, Name, NameRelation};
use crate::rr::Type;

use super::lookup::{AnswerRrset, FindOptions};
use super::tree::{LabelTree, NodeId, TreeFindResult, ZoneChain, ROOT};
use super::{Error, ZoneData};

/// The result of [`ZoneData::find_nsec3`].
#[derive(Debug)]
pub struct FindNsec3Result<'a> {
    /// Whether an NSEC3 matching one of the candidate names was found.
    /// Always `true` for a successful recursive search.
    pub matched: bool,

    /// The label count of the deepest candidate name examined: on a
    /// match, the label count of the closest encloser.
    pub closest_labels: usize,

    /// On a match, the matching NSEC3 RRset; otherwise the NSEC3 whose
    /// hash range covers the candidate's hash (if the tree has one).
    pub closest_proof: Option<AnswerRrset<'a>>,

    /// For a recursive search that matched below the query name, the
    /// NSEC3 covering the next-closer name.
    pub next_proof: Option<AnswerRrset<'a>>,
}

/// Computes the NSEC3 hash of `name` under the given parameters and
/// returns its base32hex form.
pub(crate) fn nsec3_hash(name: LabelSeq, iterations: u16, salt: &[u8]) -> String {
    // The canonical form of the name: wire format, down-cased. Label
    // length octets are at most 63 and are unaffected by ASCII
    // down-casing.
    let mut wire = name.wire_octets().to_vec();
    wire.make_ascii_lowercase();

    // The salt is fed to SHA-1 whether or not it is empty; a
    // zero-length salt is a valid, non-omitted input.
    let mut hasher = Sha1::new();
    hasher.update(&wire);
    hasher.update(salt);
    let mut digest = hasher.finalize();
    for _ in 0..iterations {
        let mut hasher = Sha1::new();
        hasher.update(digest.as_slice());
        hasher.update(salt);
        digest = hasher.finalize();
    }

    BASE32_DNSSEC.encode(digest.as_slice())
}

impl ZoneData {
    /// Searches the zone's NSEC3 tree for the closest-encloser proof
    /// of `name`.
    ///
    /// In recursive mode, candidate names from `name` up to the origin
    /// are hashed until one matches; the result carries the matching
    /// NSEC3 and, when the match is above the query name, the NSEC3
    /// covering the next-closer name. In non-recursive mode only
    /// `name` itself is examined, and a non-match returns the covering
    /// NSEC3.
    ///
    /// Fails with [`Error::NotNsec3Signed`] if the zone has no NSEC3
    /// data, with [`Error::OutOfZone`] if `name` is not at or below the
    /// origin, and with [`Error::BrokenNsec3Zone`] if a recursive
    /// search exhausts every candidate (a consistent zone hashes its
    /// origin, so this cannot happen unless the zone data is corrupt).
    pub fn find_nsec3(&self, name: &Name, recursive: bool) -> Result<FindNsec3Result, Error> {
        debug!(
            "find_nsec3 for {} ({})",
            name,
            if recursive { "recursive" } else { "non-recursive" }
        );

        let nsec3 = self.nsec3_data().ok_or(Error::NotNsec3Signed)?;
        let relation = self.origin().seq().compare(name.seq()).relation;
        if relation != NameRelation::Equal && relation != NameRelation::Superdomain {
            return Err(Error::OutOfZone);
        }

        // NSEC3 implies DNSSEC, so the answer RRsets expose RRSIGs.
        let options = FindOptions {
            dnssec: true,
            ..FindOptions::default()
        };
        let olabels = self.origin().len();
        let qlabels = name.len();
        let tree = &nsec3.tree;

        // The candidate next-closer proof accumulated so far.
        let mut covering_node: Option<NodeId> = None;

        // Examine all names from the query name to the origin,
        // stripping the deepest label one by one, until a name with a
        // matching NSEC3 hash is found.
        for labels in (olabels..=qlabels).rev() {
            let candidate = name.seq().split(qlabels - labels, labels);
            let hash = nsec3_hash(candidate, nsec3.iterations, &nsec3.salt);
            debug!("find_nsec3: trying hash {} ({} labels)", hash, labels);

            let hash_label =
                <&Label>::try_from(hash.as_bytes()).or(Err(Error::BrokenNsec3Zone))?;
            let owner = self
                .origin()
                .prepend(hash_label)
                .or(Err(Error::BrokenNsec3Zone))?;

            let mut chain = ZoneChain::new();
            match tree.find(owner.seq(), &mut chain) {
                TreeFindResult::ExactMatch(node) => {
                    debug!("find_nsec3: matched {}", hash);
                    return Ok(FindNsec3Result {
                        matched: true,
                        closest_labels: labels,
                        closest_proof: nsec3_rrset(tree, Some(node), options),
                        next_proof: nsec3_rrset(tree, covering_node, options),
                    });
                }
                _ => {
                    covering_node = covering(tree, &chain);
                    if !recursive {
                        // In non-recursive mode, we are done.
                        return Ok(FindNsec3Result {
                            matched: false,
                            closest_labels: labels,
                            closest_proof: nsec3_rrset(tree, covering_node, options),
                            next_proof: None,
                        });
                    }
                }
            }
        }

        Err(Error::BrokenNsec3Zone)
    }
}

/// Identifies the NSEC3 tree node whose hash range covers the
/// (unmatched) hash the chain's search stopped on.
///
/// Stored hashes partition a circular hash space, so the covering
/// entry is the one canonically preceding the query hash; a hash
/// preceding every stored entry wraps around to the largest one.
fn covering(tree: &LabelTree, chain: &ZoneChain) -> Option<NodeId> {
    let last = chain.last_compared()?;
    let cmp = chain.last_comparison()?;
    debug_assert!(cmp.order != Ordering::Equal);
    if cmp.order == Ordering::Greater {
        // The query hash sorts after the last compared entry, so that
        // entry covers it.
        Some(last)
    } else if let Some(previous) = tree.previous_sibling(last) {
        Some(previous)
    } else {
        // The query hash sorts before the smallest stored hash: wrap
        // around to the largest.
        let largest = tree.largest_in_subtree(ROOT);
        (largest != ROOT).then_some(largest)
    }
}

/// Builds the answer RRset for the NSEC3 RRset at `node`, if any.
fn nsec3_rrset<'a>(
    tree: &'a LabelTree,
    node: Option<NodeId>,
    options: FindOptions,
) -> Option<AnswerRrset<'a>> {
    let node = node?;
    tree.data(node)
        .find(Type::NSEC3)
        .map(|rdset| AnswerRrset::new(tree, node, rdset, options, None))
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
