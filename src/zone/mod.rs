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

//! Implementation of DNS zone data structures, for keeping DNS zones
//! loaded in memory.
//!
//! A [`ZoneData`] is built off-line—records are added one by one with
//! [`ZoneData::add`]—and then published to readers, after which it is
//! never mutated. Queries run against it through [`ZoneData::find`],
//! [`ZoneData::find_all`], and [`ZoneData::find_nsec3`]; see the
//! `lookup` and `nsec3` modules for the algorithms.
//!
//! Internally a zone owns one labelled tree of owner names and, when
//! the zone is NSEC3-signed, a second tree of NSEC3 hash names (see
//! [`Nsec3Data`]). Adding records maintains the invariants the lookup
//! algorithms rely on: nodes owning an NS RRset away from the origin,
//! or a DNAME RRset anywhere, carry the callback flag; the parent of
//! every wildcard name carries the wildcard flag; and the signed flags
//! track the presence of NSEC, NSEC3, and RRSIG records.

use crate::class::Class;
use crate::name::{Name, NameRelation};
use crate::rr::{Rdata, Ttl, Type};

mod additional;
mod error;
mod lookup;
mod nsec3;
mod tree;

pub use error::Error;
pub use lookup::{AnswerRrset, Context, FindOptions, ResultCode, ResultFlags};
pub use nsec3::FindNsec3Result;

use tree::{LabelTree, ROOT};

/// A DNS zone loaded into memory.
///
/// See the [module documentation](self) for an overview.
pub struct ZoneData {
    origin: Name,
    class: Class,
    tree: LabelTree,
    signed: bool,
    nsec3: Option<Nsec3Data>,
}

/// The NSEC3 state of an NSEC3-signed zone: the hash parameters and
/// the tree of hashed owner names.
///
/// Nodes of the hash tree are named by the base32hex-encoded SHA-1
/// hash of an owner name under the zone's parameters, as children of
/// the origin ([RFC 5155 § 3]).
///
/// [RFC 5155 § 3]: https://datatracker.ietf.org/doc/html/rfc5155#section-3
pub(crate) struct Nsec3Data {
    pub iterations: u16,
    pub salt: Box<[u8]>,
    pub tree: LabelTree,
}

impl ZoneData {
    /// Creates a new, empty zone with the given origin and class.
    pub fn new(origin: Name, class: Class) -> Self {
        let tree = LabelTree::new(&origin);
        Self {
            origin,
            class,
            tree,
            signed: false,
            nsec3: None,
        }
    }

    /// Returns the zone's origin name.
    pub fn origin(&self) -> &Name {
        &self.origin
    }

    /// Returns the zone's class.
    pub fn class(&self) -> Class {
        self.class
    }

    /// Returns whether the zone is DNSSEC-signed (it contains NSEC,
    /// NSEC3, or RRSIG records).
    pub fn is_signed(&self) -> bool {
        self.signed
    }

    /// Returns whether the zone is NSEC3-signed.
    pub fn is_nsec3_signed(&self) -> bool {
        self.nsec3.is_some()
    }

    pub(crate) fn nsec3_data(&self) -> Option<&Nsec3Data> {
        self.nsec3.as_ref()
    }

    pub(crate) fn zone_tree(&self) -> &LabelTree {
        &self.tree
    }

    /// Adds a record to the zone.
    ///
    /// This is designed with the "zone file" paradigm in mind: records
    /// are added in a "flat" manner, one by one. The implementation
    /// takes care of organizing records into RRsets attached to tree
    /// nodes, and of the bookkeeping the lookup algorithms depend on:
    ///
    /// * NS records away from the origin, and DNAME records anywhere,
    ///   set the owning node's callback flag;
    /// * a wildcard owner name sets the wildcard flag on its parent
    ///   node (creating it if needed);
    /// * NSEC3 records go to the hash tree rather than the main tree,
    ///   establishing the zone's NSEC3 parameters if an NSEC3PARAM
    ///   record has not done so already;
    /// * RRSIG records are attached to the RRset they cover, which
    ///   must already be present.
    ///
    /// This fails if the owner is not within the zone, if the record's
    /// class does not match the zone, if its TTL does not match other
    /// records in its RRset, if an RRSIG covers no existing RRset, or
    /// if NSEC3-related RDATA cannot be parsed or disagrees with the
    /// zone's established NSEC3 parameters.
    ///
    /// **Warning:** this is *not* guaranteed to be an atomic operation;
    /// it is expected that the caller will abort the zone build if an
    /// error occurs.
    pub fn add(
        &mut self,
        owner: &Name,
        rr_type: Type,
        class: Class,
        ttl: Ttl,
        rdata: &Rdata,
    ) -> Result<(), Error> {
        let relation = self.origin.seq().compare(owner.seq()).relation;
        if relation != NameRelation::Equal && relation != NameRelation::Superdomain {
            return Err(Error::OutOfZone);
        }
        if class != self.class {
            return Err(Error::ClassMismatch);
        }

        match rr_type {
            Type::RRSIG => return self.add_rrsig(owner, rdata),
            Type::NSEC3 => return self.add_nsec3(owner, ttl, rdata),
            Type::NSEC3PARAM => {
                if owner == &self.origin {
                    self.establish_nsec3_params(rdata)?;
                }
                self.signed = true;
            }
            Type::NSEC => self.signed = true,
            _ => (),
        }

        let node = self.tree.insert(owner);
        self.tree.data_mut(node).add(rr_type, ttl, rdata)?;
        if (rr_type == Type::NS && node != ROOT) || rr_type == Type::DNAME {
            self.tree.set_callback(node);
        }
        self.mark_wildcards(owner);
        Ok(())
    }

    /// Attaches an RRSIG record to the RRset it covers.
    fn add_rrsig(&mut self, owner: &Name, rdata: &Rdata) -> Result<(), Error> {
        let covered = rdata.rrsig_covered().ok_or(Error::InvalidRdata)?;
        self.signed = true;
        if covered == Type::NSEC3 {
            let nsec3 = self.nsec3.as_mut().ok_or(Error::OrphanedRrsig)?;
            let node = nsec3.tree.insert(owner);
            nsec3.tree.data_mut(node).add_sig(covered, rdata)?;
        } else {
            let node = self.tree.insert(owner);
            self.tree.data_mut(node).add_sig(covered, rdata)?;
        }
        Ok(())
    }

    /// Adds an NSEC3 record to the hash tree.
    fn add_nsec3(&mut self, owner: &Name, ttl: Ttl, rdata: &Rdata) -> Result<(), Error> {
        self.signed = true;
        let nsec3 = self.establish_nsec3_params(rdata)?;
        let node = nsec3.tree.insert(owner);
        nsec3.tree.data_mut(node).add(Type::NSEC3, ttl, rdata)?;
        Ok(())
    }

    /// Records the zone's NSEC3 parameters from NSEC3 or NSEC3PARAM
    /// RDATA, or checks them against parameters already established.
    fn establish_nsec3_params(&mut self, rdata: &Rdata) -> Result<&mut Nsec3Data, Error> {
        let (algorithm, _flags, iterations, salt) =
            rdata.nsec3_params().ok_or(Error::InvalidRdata)?;
        if algorithm != 1 {
            // SHA-1 is the only hash algorithm assigned by RFC 5155.
            return Err(Error::InvalidRdata);
        }
        if let Some(ref nsec3) = self.nsec3 {
            if nsec3.iterations != iterations || nsec3.salt.as_ref() != salt {
                return Err(Error::InvalidRdata);
            }
        }
        let origin = &self.origin;
        Ok(self.nsec3.get_or_insert_with(|| Nsec3Data {
            iterations,
            salt: salt.into(),
            tree: LabelTree::new(origin),
        }))
    }

    /// Sets the wildcard flag on the parent of every wildcard name at
    /// or below `owner`'s position in the zone, creating parent nodes
    /// as needed. This covers both `*.wild.example.` itself and names
    /// like `sub.*.wild.example.` whose ancestor is a wildcard.
    fn mark_wildcards(&mut self, owner: &Name) {
        let above_origin = owner.len() - self.origin.len();
        for i in 0..above_origin {
            if owner.label(i).is_asterisk() {
                let rest = owner.len() - i - 1;
                let parent = Name::from_seq(owner.seq().split(i + 1, rest));
                let node = self.tree.insert(&parent);
                self.tree.set_wildcard(node);
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////


#[cfg(test)]
mod tests {
    use lazy_static::lazy_static;

    use super::*;

    lazy_static! {
        static ref ORIGIN: Name = "example.".parse().unwrap();
        static ref OUTSIDE: Name = "other.test.".parse().unwrap();
    }

    fn localhost() -> &'static Rdata {
        (&[127, 0, 0, 1]).try_into().unwrap()
    }

    fn new_zone() -> ZoneData {
        ZoneData::new(ORIGIN.clone(), Class::IN)
    }

    #[test]
    fn add_rejects_mismatched_class() {
        let mut zone = new_zone();
        assert_eq!(
            zone.add(&ORIGIN, Type::A, Class::CH, Ttl::from(3600), localhost()),
            Err(Error::ClassMismatch)
        );
    }

    #[test]
    fn add_rejects_mismatched_ttl() {
        let mut zone = new_zone();
        zone.add(&ORIGIN, Type::A, Class::IN, Ttl::from(3600), localhost())
            .unwrap();
        assert_eq!(
            zone.add(&ORIGIN, Type::A, Class::IN, Ttl::from(7200), localhost()),
            Err(Error::TtlMismatch)
        );
    }

    #[test]
    fn add_rejects_owner_outside_of_zone() {
        let mut zone = new_zone();
        assert_eq!(
            zone.add(&OUTSIDE, Type::A, Class::IN, Ttl::from(3600), localhost()),
            Err(Error::OutOfZone)
        );
    }

    #[test]
    fn nsec_and_rrsig_mark_the_zone_signed() {
        let mut zone = new_zone();
        assert!(!zone.is_signed());
        let nsec_rdata: &Rdata = b"\x01a\x07example\x00\x00\x01\x40".try_into().unwrap();
        zone.add(&ORIGIN, Type::NSEC, Class::IN, Ttl::from(3600), nsec_rdata)
            .unwrap();
        assert!(zone.is_signed());
        assert!(!zone.is_nsec3_signed());
    }

    #[test]
    fn nsec3_records_establish_parameters_and_the_hash_tree() {
        let mut zone = new_zone();
        let owner: Name = "0p9mhaveqvm6t7vbl5lop2u3t2rp3tom.example.".parse().unwrap();
        let rdata: &Rdata = b"\x01\x00\x00\x0c\x04\xaa\xbb\xcc\xdd\x00"
            .try_into()
            .unwrap();
        zone.add(&owner, Type::NSEC3, Class::IN, Ttl::from(3600), rdata)
            .unwrap();
        assert!(zone.is_signed());
        assert!(zone.is_nsec3_signed());
        let nsec3 = zone.nsec3_data().unwrap();
        assert_eq!(nsec3.iterations, 12);
        assert_eq!(&*nsec3.salt, b"\xaa\xbb\xcc\xdd");
    }

    #[test]
    fn nsec3_records_with_conflicting_parameters_are_rejected() {
        let mut zone = new_zone();
        let owner: Name = "0p9mhaveqvm6t7vbl5lop2u3t2rp3tom.example.".parse().unwrap();
        let rdata: &Rdata = b"\x01\x00\x00\x0c\x04\xaa\xbb\xcc\xdd\x00"
            .try_into()
            .unwrap();
        zone.add(&owner, Type::NSEC3, Class::IN, Ttl::from(3600), rdata)
            .unwrap();
        let conflicting: &Rdata = b"\x01\x00\x00\x0a\x00\x00".try_into().unwrap();
        assert_eq!(
            zone.add(&owner, Type::NSEC3, Class::IN, Ttl::from(3600), conflicting),
            Err(Error::InvalidRdata)
        );
    }

    #[test]
    fn rrsig_requires_a_covered_rrset() {
        let mut zone = new_zone();
        let a_rrsig: &Rdata = b"\x00\x01\x05\x03\x00\x00\x0e\x10sig".try_into().unwrap();
        assert_eq!(
            zone.add(&ORIGIN, Type::RRSIG, Class::IN, Ttl::from(3600), a_rrsig),
            Err(Error::OrphanedRrsig)
        );
        zone.add(&ORIGIN, Type::A, Class::IN, Ttl::from(3600), localhost())
            .unwrap();
        zone.add(&ORIGIN, Type::RRSIG, Class::IN, Ttl::from(3600), a_rrsig)
            .unwrap();
    }
}
