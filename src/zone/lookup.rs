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

//! Implementation of the name server lookup algorithm over zone data.
//!
//! [`ZoneData::find`] and [`ZoneData::find_all`] resolve a query
//! `(name, type)` into one of the categorical DNS answers of
//! [`ResultCode`], following [RFC 1034 § 4.3.2] with the refinements
//! of [RFC 2672] (DNAME takes precedence over NS, even where the two
//! coexist at the apex), [RFC 4592] (wildcard synthesis and its
//! cancellation by existing names), and [RFC 4035] (NSEC records
//! accompanying negative answers from signed zones).
//!
//! The work happens in two layers, both private to this module:
//!
//! * `find_node` drives a single descent of the zone tree. A cut
//!   callback watches for NS and DNAME RRsets at flagged nodes and
//!   claims the search when authority ends there. The tree's stopping
//!   state then distinguishes empty non-terminals (the search stopped
//!   against a node it is a proper ancestor of) from wildcard
//!   candidates and plain nonexistent names.
//! * `find_internal` interprets an exact match: empty nodes, zone cuts
//!   (except for DS queries and glue searches), ANY queries, the
//!   requested type, CNAME, and finally the no-records case.
//!
//! [RFC 1034 § 4.3.2]: https://datatracker.ietf.org/doc/html/rfc1034#section-4.3.2
//! [RFC 2672]: https://datatracker.ietf.org/doc/html/rfc2672
//! [RFC 4035]: https://datatracker.ietf.org/doc/html/rfc4035
//! [RFC 4592]: https://datatracker.ietf.org/doc/html/rfc4592

use std::fmt;

use log::debug;

use crate::name::{Label, LabelSeq, Name, NameRelation};
use crate::rr::{RdataIterator, RdataSet, Ttl, Type};

use super::tree::{LabelTree, NodeId, TreeFindResult, TreeNode, ZoneChain, ROOT};
use super::{Error, ZoneData};

////////////////////////////////////////////////////////////////////////
// PUBLIC LOOKUP TYPES                                                //
////////////////////////////////////////////////////////////////////////

/// Options controlling [`ZoneData::find`], [`ZoneData::find_all`], and
/// additional-section expansion.
#[derive(Clone, Copy, Debug, Default)]
pub struct FindOptions {
    /// Continues the search below zone cuts (and consequently disables
    /// referral generation). Use this to search for glue records.
    pub glue_ok: bool,

    /// Requests DNSSEC data: negative answers from signed zones carry
    /// the relevant NSEC RRset, and answer RRsets expose their RRSIGs.
    pub dnssec: bool,

    /// Suppresses wildcard matching. Used when proving the
    /// non-existence of a name.
    pub no_wildcard: bool,
}

/// The categorical answers a lookup can produce. These are first-class
/// results, not errors; see [`Error`] for the failure kinds.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResultCode {
    /// The requested RRset was found (or, for [`ZoneData::find_all`],
    /// the name was found).
    Success,

    /// The name is below a zone cut; the NS RRset of the cut is
    /// returned.
    Delegation,

    /// The name does not exist in the zone.
    NxDomain,

    /// The name exists but owns no RRset of the requested type.
    NxRrset,

    /// The name owns a CNAME RRset (and another type was requested).
    Cname,

    /// An ancestor of the name owns a DNAME RRset.
    Dname,
}

/// Supplemental information accompanying a lookup answer.
///
/// The signed-zone flags are set on negative and wildcard answers
/// whether or not DNSSEC data was requested; callers that did not ask
/// for DNSSEC simply ignore them.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ResultFlags {
    /// The answer was synthesized from a wildcard.
    pub wildcard: bool,

    /// The zone is NSEC-signed (set on negative and wildcard answers).
    pub nsec_signed: bool,

    /// The zone is NSEC3-signed (set on negative and wildcard
    /// answers).
    pub nsec3_signed: bool,
}

/// An RRset produced by a lookup: the owner name it is to be presented
/// under, and the underlying record set.
///
/// For wildcard matches the owner is the query name (the synthesized
/// owner), not the wildcard's own name. RRSIGs covering the set are
/// exposed through [`AnswerRrset::sig_rdatas`] when DNSSEC data was
/// requested.
pub struct AnswerRrset<'a> {
    owner: Name,
    rdset: &'a RdataSet,
    dnssec: bool,
}

impl<'a> AnswerRrset<'a> {
    pub(crate) fn new(
        tree: &'a LabelTree,
        node: NodeId,
        rdset: &'a RdataSet,
        options: FindOptions,
        real_name: Option<&Name>,
    ) -> Self {
        let owner = match real_name {
            Some(name) => name.clone(),
            None => tree.name_of(node),
        };
        Self {
            owner,
            rdset,
            dnssec: options.dnssec,
        }
    }

    /// Returns the owner name the RRset is presented under.
    pub fn owner(&self) -> &Name {
        &self.owner
    }

    /// Returns the RR type of the set.
    pub fn rr_type(&self) -> Type {
        self.rdset.rr_type
    }

    /// Returns the TTL of the set.
    pub fn ttl(&self) -> Ttl {
        self.rdset.ttl
    }

    /// Returns an iterator over the record data of the set.
    pub fn rdatas(&self) -> RdataIterator<'a> {
        self.rdset.rdatas()
    }

    /// Returns an iterator over the RRSIG record data covering the
    /// set. Yields nothing unless DNSSEC data was requested.
    pub fn sig_rdatas(&self) -> RdataIterator<'a> {
        if self.dnssec {
            self.rdset.sig_rdatas()
        } else {
            RdataIterator::empty()
        }
    }
}

impl fmt::Debug for AnswerRrset<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\"{} {}\"", self.owner, self.rdset.rr_type)
    }
}

/// The full outcome of a lookup.
///
/// In addition to the categorical [`code`](Context::code), the answer
/// [`rrset`](Context::rrset) (if any), and the
/// [`flags`](Context::flags), a `Context` remembers the matched node so
/// that [`Context::additionals`] can later expand the additional
/// section for the answer.
pub struct Context<'a> {
    pub(super) zone: &'a ZoneData,
    pub(super) options: FindOptions,

    /// The categorical answer.
    pub code: ResultCode,

    /// The answer RRset: the found set for [`ResultCode::Success`] and
    /// [`ResultCode::Cname`], the NS set of the cut for
    /// [`ResultCode::Delegation`], the DNAME set for
    /// [`ResultCode::Dname`], and the proving NSEC set (when available)
    /// for the negative answers.
    pub rrset: Option<AnswerRrset<'a>>,

    /// Supplemental answer flags.
    pub flags: ResultFlags,

    /// Set when the search crossed a zone cut while glue was
    /// permitted. The engine itself does not consume this; it is
    /// carried for response builders.
    pub zone_cut: bool,

    pub(super) found_node: Option<NodeId>,
    pub(super) found_rdset: Option<&'a RdataSet>,
}

////////////////////////////////////////////////////////////////////////
// PUBLIC ENTRY POINTS                                                //
////////////////////////////////////////////////////////////////////////

impl ZoneData {
    /// Looks up records of the given type at the provided domain name.
    ///
    /// Fails with [`Error::OutOfZone`] if `name` is not at or below the
    /// zone origin. For ANY queries use [`ZoneData::find_all`].
    pub fn find<'a>(
        &'a self,
        name: &Name,
        rr_type: Type,
        options: FindOptions,
    ) -> Result<Context<'a>, Error> {
        debug_assert!(rr_type != Type::ANY, "use find_all for ANY queries");
        self.find_internal(name, rr_type, None, options)
    }

    /// Looks up *all* RRsets at the provided domain name. The sets are
    /// collected into the returned list; the [`Context`] carries the
    /// categorical answer (with no single answer RRset on success).
    pub fn find_all<'a>(
        &'a self,
        name: &Name,
        options: FindOptions,
    ) -> Result<(Context<'a>, Vec<AnswerRrset<'a>>), Error> {
        let mut target = Vec::new();
        let context = self.find_internal(name, Type::ANY, Some(&mut target), options)?;
        Ok((context, target))
    }
}

////////////////////////////////////////////////////////////////////////
// THE SEARCH: findNode                                               //
////////////////////////////////////////////////////////////////////////

/// Intermediate search state maintained by the cut callback: a
/// possible zone cut node or DNAME node, and the RRset found there.
struct FindState<'a> {
    zonecut_node: Option<NodeId>,
    dname_node: Option<NodeId>,
    rdset: Option<&'a RdataSet>,
    glue_ok: bool,
}

/// The callback invoked at flagged nodes during tree descent.
fn cut_callback<'a>(id: NodeId, node: &'a TreeNode, state: &mut FindState<'a>) -> bool {
    // We need to look for DNAME first: there's an allowed case where
    // DNAME and NS coexist at the apex. DNAME is the one to notice;
    // the NS is authoritative there, not a delegation (a corner case
    // explicitly allowed by RFC 2672 § 3).
    if let Some(dname) = node.data.find(Type::DNAME) {
        debug!("DNAME encountered during search");
        state.dname_node = Some(id);
        state.rdset = Some(dname);
        return true;
    }

    if let Some(ns) = node.data.find(Type::NS) {
        // Only the highest zone cut matters in the rare case of nested
        // cuts.
        if state.zonecut_node.is_some() {
            return false;
        }
        debug!("NS encountered during search");
        state.zonecut_node = Some(id);
        state.rdset = Some(ns);
        // Unless glue is allowed, the search stops here.
        return !state.glue_ok;
    }

    // The callback flag is only set when one of the RRsets searched for
    // above is added to the node.
    debug_assert!(false, "cut callback at a node with neither NS nor DNAME");
    false
}

/// The result of a `find_node` call: the categorical code so far, the
/// relevant node and RRset, and whether the search matched a wildcard
/// or crossed a zone cut.
pub(super) struct FindNodeResult<'a> {
    pub code: ResultCode,
    pub node: Option<NodeId>,
    pub rdset: Option<&'a RdataSet>,
    pub wildcard: bool,
    pub zonecut: bool,
}

/// Identifies the node that best matches `name` for query handling.
///
/// An exact match is the best outcome. For a partial match, the cut
/// callback state decides first (DNAME, then delegation); otherwise a
/// search that stopped as a proper ancestor of an existing node found
/// an empty non-terminal, and a stop at a wildcard-flagged node
/// triggers wildcard synthesis—unless the stopping comparison shares
/// labels below that node, in which case RFC 1034 § 4.3.3 cancels the
/// wildcard (the shared name is known to exist). Everything else is
/// NXDOMAIN.
pub(super) fn find_node<'a>(
    zone: &'a ZoneData,
    name: LabelSeq<'_>,
    chain: &mut ZoneChain,
    options: FindOptions,
) -> Result<FindNodeResult<'a>, Error> {
    let tree = zone.zone_tree();
    let mut state = FindState {
        zonecut_node: None,
        dname_node: None,
        rdset: None,
        glue_ok: options.glue_ok,
    };
    let result = tree.find_with_callback(name, chain, |id, node| cut_callback(id, node, &mut state));
    let zonecut = state.zonecut_node.is_some();

    let node = match result {
        TreeFindResult::ExactMatch(node) => {
            return Ok(FindNodeResult {
                code: ResultCode::Success,
                node: Some(node),
                rdset: state.rdset,
                wildcard: false,
                zonecut,
            });
        }
        TreeFindResult::PartialMatch(node) => node,
        TreeFindResult::NotFound => return Err(Error::OutOfZone),
    };

    if let Some(dname) = state.dname_node {
        debug!("DNAME found at {}", tree.name_of(dname));
        return Ok(FindNodeResult {
            code: ResultCode::Dname,
            node: Some(dname),
            rdset: state.rdset,
            wildcard: false,
            zonecut: false,
        });
    }
    if let Some(cut) = state.zonecut_node {
        // When the search was allowed below the cut (a glue search),
        // authority questions do not arise: a name that failed to
        // match below the cut is simply treated as nonexistent.
        if !options.glue_ok {
            debug!("delegation found at {}", tree.name_of(cut));
            return Ok(FindNodeResult {
                code: ResultCode::Delegation,
                node: Some(cut),
                rdset: state.rdset,
                wildcard: false,
                zonecut: false,
            });
        }
    }

    if chain.last_comparison().map(|cmp| cmp.relation) == Some(NameRelation::Superdomain) {
        // The search stopped as a proper ancestor of an existing node:
        // an empty non-terminal, so NXRRSET.
        debug!("{} is an empty non-terminal (NXRRSET)", name);
        let (nsec_node, nsec_rdset) = split_nsec(get_closest_nsec(zone, chain, options));
        return Ok(FindNodeResult {
            code: ResultCode::NxRrset,
            node: nsec_node,
            rdset: nsec_rdset,
            wildcard: false,
            zonecut: false,
        });
    }

    // Nothing really matched. May be a wildcard, but check only if not
    // disabled.
    if tree.node(node).wildcard && !options.no_wildcard {
        if chain.last_comparison().map(|cmp| cmp.relation) == Some(NameRelation::CommonAncestor) {
            // E.g. the zone has *.wild.example and b.a.wild.example and
            // we are looking for c.a.wild.example. The common ancestor
            // a.wild.example is known to exist, which cancels the
            // wildcard per RFC 1034 § 4.3.3. Treat it as NXDOMAIN.
            debug!("wildcard match for {} cancelled", name);
            let (nsec_node, nsec_rdset) = split_nsec(get_closest_nsec(zone, chain, options));
            return Ok(FindNodeResult {
                code: ResultCode::NxDomain,
                node: nsec_node,
                rdset: nsec_rdset,
                wildcard: false,
                zonecut: false,
            });
        }

        // Synthesize the wildcard name (take "*" and extend it with the
        // wildcarding node's name) and redo the search from the root.
        match tree.name_of(node).prepend(Label::asterisk()) {
            Ok(wildcard) => {
                let result = tree
                    .find_with_callback(wildcard.seq(), chain, |id, node| {
                        cut_callback(id, node, &mut state)
                    });
                // The wildcard flag guarantees an exact child named *.
                if let TreeFindResult::ExactMatch(wild_node) = result {
                    return Ok(FindNodeResult {
                        code: ResultCode::Success,
                        node: Some(wild_node),
                        rdset: state.rdset,
                        wildcard: true,
                        zonecut,
                    });
                }
                debug_assert!(false, "wildcard node under {} vanished", wildcard);
            }
            Err(_) => debug_assert!(false, "wildcard name synthesis overflowed"),
        }
        // Unreachable for consistent zone data; fall through to
        // NXDOMAIN in release builds.
        return Ok(FindNodeResult {
            code: ResultCode::NxDomain,
            node: None,
            rdset: None,
            wildcard: false,
            zonecut: false,
        });
    }

    debug!("no match for {} (NXDOMAIN)", name);
    let (nsec_node, nsec_rdset) = split_nsec(get_closest_nsec(zone, chain, options));
    Ok(FindNodeResult {
        code: ResultCode::NxDomain,
        node: nsec_node,
        rdset: nsec_rdset,
        wildcard: false,
        zonecut: false,
    })
}

fn split_nsec(found: Option<(NodeId, &RdataSet)>) -> (Option<NodeId>, Option<&RdataSet>) {
    match found {
        Some((node, rdset)) => (Some(node), Some(rdset)),
        None => (None, None),
    }
}

////////////////////////////////////////////////////////////////////////
// NSEC HELPERS                                                       //
////////////////////////////////////////////////////////////////////////

/// Searches the zone for the closest NSEC RRset preceding the search
/// position stored in `chain`.
///
/// The immediate predecessor may not carry an NSEC (it may be an empty
/// non-terminal, or glue under a zone cut), so the walk continues
/// until a name with an NSEC RRset is found. For a consistent
/// NSEC-signed zone this terminates at or before the origin.
///
/// If the zone is not NSEC-signed, or DNSSEC data was not requested,
/// this doesn't bother to search and returns `None`.
fn get_closest_nsec<'a>(
    zone: &'a ZoneData,
    chain: &mut ZoneChain,
    options: FindOptions,
) -> Option<(NodeId, &'a RdataSet)> {
    if !zone.is_signed() || !options.dnssec || zone.is_nsec3_signed() {
        return None;
    }
    let tree = zone.zone_tree();
    while let Some(prev) = tree.previous_node(chain) {
        let data = tree.data(prev);
        if !data.is_empty() {
            if let Some(nsec) = data.find(Type::NSEC) {
                return Some((prev, nsec));
            }
        }
    }
    // The origin of an NSEC-signed zone carries an NSEC record, so the
    // walk cannot be exhausted.
    debug_assert!(false, "closest NSEC walk exhausted");
    None
}

/// For the NXRRSET case: if the zone is NSEC-signed and DNSSEC data
/// was requested, returns the NSEC RRset at the given node, if any.
fn get_nsec_for_nxrrset<'a>(
    zone: &'a ZoneData,
    options: FindOptions,
    node: NodeId,
) -> Option<&'a RdataSet> {
    if zone.is_signed() && !zone.is_nsec3_signed() && options.dnssec {
        zone.zone_tree().data(node).find(Type::NSEC)
    } else {
        None
    }
}

////////////////////////////////////////////////////////////////////////
// THE LOOKUP: find_internal                                          //
////////////////////////////////////////////////////////////////////////

impl ZoneData {
    /// Fills in the final details of a lookup answer: flags (wildcard
    /// and signed-zone signals, set regardless of the DNSSEC option),
    /// and the answer RRset with wildcard owner substitution.
    #[allow(clippy::too_many_arguments)]
    fn create_find_result<'a>(
        &'a self,
        code: ResultCode,
        rdset: Option<&'a RdataSet>,
        node: Option<NodeId>,
        options: FindOptions,
        wild: bool,
        qname: Option<&Name>,
        zone_cut: bool,
    ) -> Context<'a> {
        let mut flags = ResultFlags::default();
        if wild {
            flags.wildcard = true;
        }
        if code == ResultCode::NxRrset || code == ResultCode::NxDomain || wild {
            if self.is_nsec3_signed() {
                flags.nsec3_signed = true;
            } else if self.is_signed() {
                flags.nsec_signed = true;
            }
        }
        // Only substitute the query name for the owner on wildcard
        // matches.
        let rename = if wild { qname } else { None };
        let rrset = match (node, rdset) {
            (Some(node), Some(rdset)) => Some(AnswerRrset::new(
                self.zone_tree(),
                node,
                rdset,
                options,
                rename,
            )),
            _ => None,
        };
        Context {
            zone: self,
            options,
            code,
            rrset,
            flags,
            zone_cut,
            found_node: node,
            found_rdset: rdset,
        }
    }

    /// The core of [`ZoneData::find`] and [`ZoneData::find_all`]. An
    /// ANY query is signalled by `target` being a non-`None` output
    /// list; every RRset at the matched node is pushed into it.
    fn find_internal<'a>(
        &'a self,
        name: &Name,
        rr_type: Type,
        mut target: Option<&mut Vec<AnswerRrset<'a>>>,
        options: FindOptions,
    ) -> Result<Context<'a>, Error> {
        // Get the node. All cases other than an exact match are
        // handled in find_node; we simply build an answer and return.
        let mut chain = ZoneChain::new();
        let node_result = find_node(self, name.seq(), &mut chain, options)?;
        let node = match (node_result.code, node_result.node) {
            (ResultCode::Success, Some(node)) => node,
            _ => {
                return Ok(self.create_find_result(
                    node_result.code,
                    node_result.rdset,
                    node_result.node,
                    options,
                    false,
                    None,
                    false,
                ));
            }
        };

        // We've found an exact match; it may or may not be the result
        // of a wildcard.
        let wild = node_result.wildcard;
        let tree = self.zone_tree();

        // An exact match on an empty node is equivalent to NXRRSET.
        if tree.data(node).is_empty() {
            debug!("{} owns no records (NXRRSET)", name);
            let (nsec_node, nsec_rdset) = split_nsec(get_closest_nsec(self, &mut chain, options));
            return Ok(self.create_find_result(
                ResultCode::NxRrset,
                nsec_rdset,
                nsec_node,
                options,
                wild,
                None,
                node_result.zonecut,
            ));
        }

        // If the callback flag is set, this may be a zone cut. An NS
        // RRset here means a delegation, but not at the apex, not when
        // searching for glue, and not for a DS query (which the parent
        // side answers authoritatively).
        if tree.node(node).callback && !options.glue_ok && node != ROOT && rr_type != Type::DS {
            if let Some(ns) = tree.data(node).find(Type::NS) {
                debug!("{} is an exact-match delegation", name);
                return Ok(self.create_find_result(
                    ResultCode::Delegation,
                    Some(ns),
                    Some(node),
                    options,
                    wild,
                    Some(name),
                    node_result.zonecut,
                ));
            }
        }

        // Handle an ANY query.
        if let Some(ref mut target) = target {
            for rdset in tree.data(node).iter() {
                target.push(AnswerRrset::new(tree, node, rdset, options, Some(name)));
            }
            debug!("found all {} RRsets at {}", target.len(), name);
            return Ok(self.create_find_result(
                ResultCode::Success,
                None,
                Some(node),
                options,
                wild,
                Some(name),
                node_result.zonecut,
            ));
        }

        if let Some(found) = tree.data(node).find(rr_type) {
            // Good, it is here.
            debug!("found {} {}", name, rr_type);
            return Ok(self.create_find_result(
                ResultCode::Success,
                Some(found),
                Some(node),
                options,
                wild,
                Some(name),
                node_result.zonecut,
            ));
        }

        // Next, try CNAME.
        if let Some(found) = tree.data(node).find(Type::CNAME) {
            debug!("found CNAME at {}", name);
            return Ok(self.create_find_result(
                ResultCode::Cname,
                Some(found),
                Some(node),
                options,
                wild,
                Some(name),
                node_result.zonecut,
            ));
        }

        // No matching type and no CNAME. Get NSEC if necessary and
        // return NXRRSET.
        Ok(self.create_find_result(
            ResultCode::NxRrset,
            get_nsec_for_nxrrset(self, options, node),
            Some(node),
            options,
            wild,
            Some(name),
            node_result.zonecut,
        ))
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
