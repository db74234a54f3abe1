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

//! Implementation of the [`RdataSet`] and [`RdataSetList`] structures
//! for storing RRsets in memory.

use std::fmt;
use std::iter::FusedIterator;

use super::{Rdata, Ttl, Type};

////////////////////////////////////////////////////////////////////////
// RDATA SETS                                                         //
////////////////////////////////////////////////////////////////////////

/// One record set of a given type at one owner name.
///
/// [RFC 2181 § 5] defined an RRset as a group of records with the same
/// label, class, and type, and also stipulated that all records in an
/// RRset have the same TTL. DNS records are looked up through RRsets,
/// and DNSSEC approaches DNS data through the concept, so zone data is
/// stored grouped this way. The owner name and class are not stored in
/// the structure itself; they are kept track of by the zone data
/// structure that owns the set.
///
/// The record data—and, for signed zones, the RRSIG record data
/// covering the set—is packed into a single length-prefixed byte
/// buffer. Once a set has been installed in a published zone it is
/// never modified.
///
/// [RFC 2181 § 5]: https://datatracker.ietf.org/doc/html/rfc2181#section-5
#[derive(Clone, Debug)]
pub struct RdataSet {
    pub rr_type: Type,
    pub ttl: Ttl,
    rdata_count: u16,
    sig_count: u16,
    data: Vec<u8>,
}

impl RdataSet {
    /// Creates a new `RdataSet` with the given RR type and TTL. It will
    /// initially contain no record data.
    pub(crate) fn new(rr_type: Type, ttl: Ttl) -> Self {
        Self {
            rr_type,
            ttl,
            rdata_count: 0,
            sig_count: 0,
            data: Vec::new(),
        }
    }

    /// Returns the number of records in the set.
    pub fn rdata_count(&self) -> usize {
        self.rdata_count as usize
    }

    /// Returns the number of RRSIG records covering the set.
    pub fn sig_count(&self) -> usize {
        self.sig_count as usize
    }

    /// Returns an iterator over the [`Rdata`] of the set.
    pub fn rdatas(&self) -> RdataIterator {
        RdataIterator {
            cursor: &self.data,
            remaining: self.rdata_count,
        }
    }

    /// Returns an iterator over the RRSIG [`Rdata`] covering the set.
    pub fn sig_rdatas(&self) -> RdataIterator {
        RdataIterator {
            cursor: &self.data[self.rdata_section_len()..],
            remaining: self.sig_count,
        }
    }

    /// Returns the length in octets of the rdata section of `data`
    /// (the RRSIG section follows it).
    fn rdata_section_len(&self) -> usize {
        let mut cursor = &self.data[..];
        for _ in 0..self.rdata_count {
            let len = u16::from_ne_bytes([cursor[0], cursor[1]]) as usize;
            cursor = &cursor[2 + len..];
        }
        self.data.len() - cursor.len()
    }

    /// Adds an [`Rdata`] to this set. Following the behavior of other
    /// nameservers, [`Rdata`] that is already present is silently
    /// discarded.
    pub(crate) fn push_rdata(&mut self, rdata: &Rdata) {
        for existing in self.rdatas() {
            if existing == rdata {
                return;
            }
        }
        let insert_at = self.rdata_section_len();
        let mut entry = Vec::with_capacity(2 + rdata.len());
        entry.extend_from_slice(&(rdata.len() as u16).to_ne_bytes());
        entry.extend_from_slice(rdata.octets());
        self.data.splice(insert_at..insert_at, entry);
        self.rdata_count += 1;
    }

    /// Adds an RRSIG [`Rdata`] covering this set.
    pub(crate) fn push_sig(&mut self, rdata: &Rdata) {
        for existing in self.sig_rdatas() {
            if existing == rdata {
                return;
            }
        }
        self.data.reserve(2 + rdata.len());
        self.data
            .extend_from_slice(&(rdata.len() as u16).to_ne_bytes());
        self.data.extend_from_slice(rdata.octets());
        self.sig_count += 1;
    }
}

/// An iterator over [`Rdata`] stored in an [`RdataSet`].
pub struct RdataIterator<'a> {
    cursor: &'a [u8],
    remaining: u16,
}

impl RdataIterator<'_> {
    /// Returns an iterator that yields nothing.
    pub(crate) fn empty() -> Self {
        Self {
            cursor: &[],
            remaining: 0,
        }
    }
}

impl<'a> Iterator for RdataIterator<'a> {
    type Item = &'a Rdata;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let len_octets: &[u8; 2] = self.cursor.get(0..2)?.try_into().ok()?;
        let len = u16::from_ne_bytes(*len_octets) as usize;
        let rdata = self.cursor.get(2..len + 2)?;
        self.cursor = &self.cursor[len + 2..];
        self.remaining -= 1;
        Some(Rdata::from_unchecked(rdata))
    }
}

impl FusedIterator for RdataIterator<'_> {}

////////////////////////////////////////////////////////////////////////
// RDATA SET LISTS                                                    //
////////////////////////////////////////////////////////////////////////

/// All of the [`RdataSet`]s at one node of the DNS tree.
///
/// Individual records are added with [`RdataSetList::add`] and
/// [`RdataSetList::add_sig`]; the sets themselves are constructed and
/// managed internally, ordered by RR type.
#[derive(Clone, Debug, Default)]
pub struct RdataSetList {
    sets: Vec<RdataSet>,
}

impl RdataSetList {
    /// Returns a new, empty `RdataSetList`.
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds a resource record to the list.
    ///
    /// This fails if the [`Ttl`] of the new record does not match the
    /// rest of the records in its set. If the target set already
    /// contains the provided [`Rdata`], the new record is silently
    /// ignored.
    pub fn add(&mut self, rr_type: Type, ttl: Ttl, rdata: &Rdata) -> Result<(), RdataSetAddError> {
        match self.sets.binary_search_by_key(&rr_type, |s| s.rr_type) {
            Ok(index) => {
                let set = &mut self.sets[index];
                if set.ttl != ttl {
                    Err(RdataSetAddError::TtlMismatch)
                } else {
                    set.push_rdata(rdata);
                    Ok(())
                }
            }
            Err(index) => {
                let mut set = RdataSet::new(rr_type, ttl);
                set.push_rdata(rdata);
                self.sets.insert(index, set);
                Ok(())
            }
        }
    }

    /// Adds an RRSIG record covering the set of type `covered`.
    ///
    /// The covered set must already be present; signatures presented
    /// before their covered records are rejected.
    pub fn add_sig(&mut self, covered: Type, rdata: &Rdata) -> Result<(), RdataSetAddError> {
        match self.sets.binary_search_by_key(&covered, |s| s.rr_type) {
            Ok(index) => {
                self.sets[index].push_sig(rdata);
                Ok(())
            }
            Err(_) => Err(RdataSetAddError::OrphanedRrsig),
        }
    }

    /// Looks up the [`RdataSet`] of type `rr_type` in the list.
    pub fn find(&self, rr_type: Type) -> Option<&RdataSet> {
        self.sets
            .binary_search_by_key(&rr_type, |s| s.rr_type)
            .map(|index| &self.sets[index])
            .ok()
    }

    /// Returns an iterator over the [`RdataSet`]s of the list.
    pub fn iter(&self) -> std::slice::Iter<RdataSet> {
        self.sets.iter()
    }

    /// Returns the number of [`RdataSet`]s in the list.
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Returns whether the list is empty. A node whose list is empty is
    /// an empty non-terminal.
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

/// An error signaling that a record cannot be added to an
/// [`RdataSetList`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RdataSetAddError {
    /// A record cannot be added because its [`Ttl`] differs from the
    /// rest of the records in its set.
    TtlMismatch,

    /// An RRSIG record cannot be added because the set it covers is not
    /// present.
    OrphanedRrsig,
}

impl fmt::Display for RdataSetAddError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::TtlMismatch => f.write_str("TTL mismatch"),
            Self::OrphanedRrsig => f.write_str("RRSIG covers no existing RRset"),
        }
    }
}

impl std::error::Error for RdataSetAddError {}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rdata_set_works() {
        let loopback1: &Rdata = (&[127, 0, 0, 1]).try_into().unwrap();
        let loopback2: &Rdata = (&[127, 0, 0, 2]).try_into().unwrap();
        let mut set = RdataSet::new(Type::A, Ttl::from(3600));
        set.push_rdata(loopback1);
        set.push_rdata(loopback2);
        assert_eq!(set.rr_type, Type::A);
        assert_eq!(u32::from(set.ttl), 3600);
        assert_eq!(set.rdatas().collect::<Vec<_>>(), [loopback1, loopback2]);
        assert_eq!(set.sig_count(), 0);
    }

    #[test]
    fn rdata_set_ignores_duplicates() {
        let rdata: &Rdata = (&[127, 0, 0, 1]).try_into().unwrap();
        let mut set = RdataSet::new(Type::A, Ttl::from(3600));
        set.push_rdata(rdata);
        set.push_rdata(rdata);
        assert_eq!(set.rdata_count(), 1);
    }

    #[test]
    fn sigs_are_kept_separate_from_rdatas() {
        let a1: &Rdata = (&[127, 0, 0, 1]).try_into().unwrap();
        let sig: &Rdata = b"\x00\x01signature".try_into().unwrap();
        let a2: &Rdata = (&[127, 0, 0, 2]).try_into().unwrap();

        let mut set = RdataSet::new(Type::A, Ttl::from(3600));
        set.push_rdata(a1);
        set.push_sig(sig);
        // Record data added after a signature must still land in the
        // rdata section.
        set.push_rdata(a2);

        assert_eq!(set.rdatas().collect::<Vec<_>>(), [a1, a2]);
        assert_eq!(set.sig_rdatas().collect::<Vec<_>>(), [sig]);
    }

    #[test]
    fn rdata_set_list_works() {
        let loopback: &Rdata = (&[127, 0, 0, 1]).try_into().unwrap();
        let domain: &Rdata = b"\x04test\x00".try_into().unwrap();
        let mut list = RdataSetList::new();
        list.add(Type::A, Ttl::from(3600), loopback).unwrap();
        list.add(Type::CNAME, Ttl::from(7200), domain).unwrap();

        assert_eq!(list.len(), 2);
        let a_set = list.find(Type::A).unwrap();
        assert_eq!(a_set.rdatas().collect::<Vec<_>>(), [loopback]);
        assert!(list.find(Type::AAAA).is_none());
    }

    #[test]
    fn rdata_set_list_rejects_ttl_mismatch() {
        let domain: &Rdata = b"\x04test\x00".try_into().unwrap();
        let mut list = RdataSetList::new();
        list.add(Type::NS, Ttl::from(3600), domain).unwrap();
        assert_eq!(
            list.add(Type::NS, Ttl::from(7200), domain),
            Err(RdataSetAddError::TtlMismatch)
        );
    }

    #[test]
    fn rdata_set_list_rejects_orphaned_rrsigs() {
        let sig: &Rdata = b"\x00\x01signature".try_into().unwrap();
        let mut list = RdataSetList::new();
        assert_eq!(
            list.add_sig(Type::A, sig),
            Err(RdataSetAddError::OrphanedRrsig)
        );
    }
}
