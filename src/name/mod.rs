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

//! Implementation of data structures related to domain names.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use arrayvec::ArrayVec;

mod error;
mod label;
mod seq;
pub use error::Error;
pub use label::Label;
pub use seq::{LabelSeq, NameComparison, NameRelation};

/// The maximum number of labels in a domain name.
const MAX_N_LABELS: usize = 128;

/// The maximum length of the uncompressed on-the-wire representation of
/// a domain name.
const MAX_WIRE_LEN: usize = 255;

/// The maximum length of a label in a domain name (not including the
/// octet that provides the length).
const MAX_LABEL_LEN: usize = 63;

////////////////////////////////////////////////////////////////////////
// NAME STRUCTURE                                                     //
////////////////////////////////////////////////////////////////////////

/// A structure to represent an absolute domain name.
///
/// Internally, a `Name` holds two buffers:
///
/// * the uncompressed on-the-wire representation of the name, as
///   defined in [RFC 1035 § 3.1] (length-prefixed labels, terminated by
///   the null root label); and
/// * a table giving the offset of each label in that representation.
///
/// This follows the representation used by the [NSD] authoritative
/// nameserver. The offset table makes random access to labels cheap,
/// which the zone lookup algorithms exploit heavily through the
/// [`LabelSeq`] view type: [`Name::seq`] borrows the name as a label
/// sequence that can be split and compared without copying.
///
/// Following [RFC 1034 § 3.1] (clarified by [RFC 4343]), comparisons
/// between `Name`s are ASCII-case-insensitive, while the internal
/// representation preserves case.
///
/// [NSD]: https://www.nlnetlabs.nl/projects/nsd/about/
/// [RFC 1034 § 3.1]: https://datatracker.ietf.org/doc/html/rfc1034#section-3.1
/// [RFC 1035 § 3.1]: https://datatracker.ietf.org/doc/html/rfc1035#section-3.1
/// [RFC 4343]: https://datatracker.ietf.org/doc/html/rfc4343
#[derive(Clone)]
pub struct Name {
    offsets: Box<[u8]>,
    wire: Box<[u8]>,
}

impl Name {
    /// Returns the root name (`.`).
    pub fn root() -> Self {
        Self {
            offsets: Box::new([0]),
            wire: Box::new([0]),
        }
    }

    /// Returns the number of labels in the `Name`, including the null
    /// root label. Thus `example.` has three labels and the root name
    /// has one.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Returns whether this is the root name.
    ///
    /// (A `Name` always contains at least the root label, so there is
    /// no `is_empty`.)
    pub fn is_root(&self) -> bool {
        self.offsets.len() == 1
    }

    /// Returns whether the leftmost label is the asterisk label.
    pub fn is_wildcard(&self) -> bool {
        !self.is_root() && self.label(0).is_asterisk()
    }

    /// Returns label `n` of the `Name` (`n = 0` is the leftmost label).
    pub fn label(&self, n: usize) -> &Label {
        self.seq().label(n)
    }

    /// Borrows the `Name` as a [`LabelSeq`] covering all of its labels.
    pub fn seq(&self) -> LabelSeq {
        LabelSeq::new(&self.offsets, &self.wire)
    }

    /// Returns the uncompressed on-the-wire representation of the
    /// `Name`.
    pub fn wire_repr(&self) -> &[u8] {
        &self.wire
    }

    /// Returns a new `Name` with `label` prepended to this one.
    ///
    /// This fails with [`Error::NameTooLong`] if the result would
    /// exceed the limits of RFC 1035.
    pub fn prepend(&self, label: &Label) -> Result<Self, Error> {
        if label.is_null() {
            return Err(Error::EmptyLabel);
        }
        if self.wire.len() + 1 + label.len() > MAX_WIRE_LEN || self.len() + 1 > MAX_N_LABELS {
            return Err(Error::NameTooLong);
        }
        let mut wire = Vec::with_capacity(self.wire.len() + 1 + label.len());
        wire.push(label.len() as u8);
        wire.extend_from_slice(label.octets());
        wire.extend_from_slice(&self.wire);
        Ok(Self::from_wire_unchecked(wire))
    }

    /// Builds a `Name` from an absolute [`LabelSeq`] (one that extends
    /// through the root label).
    pub(crate) fn from_seq(seq: LabelSeq) -> Self {
        debug_assert!(seq.is_absolute());
        Self::from_wire_unchecked(seq.wire_octets().to_vec())
    }

    /// Builds a `Name` from wire octets already known to form a valid
    /// uncompressed name (e.g. the concatenation of label fragments
    /// held in a zone tree). Only the offset table is computed.
    pub(crate) fn from_wire_unchecked(wire: Vec<u8>) -> Self {
        let mut offsets = ArrayVec::<u8, MAX_N_LABELS>::new();
        let mut pos = 0;
        loop {
            offsets.push(pos as u8);
            let len = wire[pos] as usize;
            if len == 0 {
                break;
            }
            pos += 1 + len;
        }
        debug_assert_eq!(pos + 1, wire.len());
        Self {
            offsets: offsets.as_slice().into(),
            wire: wire.into_boxed_slice(),
        }
    }

    /// Reads an uncompressed wire-form name from the start of `octets`.
    /// On success, returns the `Name` and the number of octets it
    /// occupied.
    pub fn try_from_uncompressed(octets: &[u8]) -> Result<(Self, usize), Error> {
        let mut offsets = ArrayVec::<u8, MAX_N_LABELS>::new();
        let mut pos = 0;
        loop {
            let len_octet = *octets.get(pos).ok_or(Error::UnexpectedEnd)? as usize;
            if len_octet & 0xc0 != 0 {
                return Err(Error::BadLabelType);
            }
            if pos >= MAX_WIRE_LEN {
                return Err(Error::NameTooLong);
            }
            offsets.try_push(pos as u8).or(Err(Error::NameTooLong))?;
            if len_octet == 0 {
                pos += 1;
                break;
            }
            pos += 1 + len_octet;
            if pos > octets.len() {
                return Err(Error::UnexpectedEnd);
            }
            if pos > MAX_WIRE_LEN {
                return Err(Error::NameTooLong);
            }
        }
        let name = Self {
            offsets: offsets.as_slice().into(),
            wire: octets[..pos].into(),
        };
        Ok((name, pos))
    }
}

////////////////////////////////////////////////////////////////////////
// TEXTUAL CONVERSIONS                                                //
////////////////////////////////////////////////////////////////////////

/// Parses the presentation format of a domain name ([RFC 1035 § 5.1]).
/// The name must be fully qualified (i.e. end with a dot). The escapes
/// `\.`, `\\`, `\X` (for any other character `X`), and `\DDD` (a
/// three-digit decimal octet value) are recognized.
///
/// [RFC 1035 § 5.1]: https://datatracker.ietf.org/doc/html/rfc1035#section-5.1
impl FromStr for Name {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        if text == "." {
            return Ok(Self::root());
        }
        if text.is_empty() {
            return Err(Error::NotAbsolute);
        }

        let bytes = text.as_bytes();
        let mut wire = Vec::new();
        let mut label = ArrayVec::<u8, MAX_LABEL_LEN>::new();
        let mut n_labels = 0;
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'.' => {
                    if label.is_empty() {
                        return Err(Error::EmptyLabel);
                    }
                    if wire.len() + 1 + label.len() + 1 > MAX_WIRE_LEN {
                        return Err(Error::NameTooLong);
                    }
                    n_labels += 1;
                    if n_labels + 1 > MAX_N_LABELS {
                        return Err(Error::NameTooLong);
                    }
                    wire.push(label.len() as u8);
                    wire.extend_from_slice(&label);
                    label.clear();
                    i += 1;
                }
                b'\\' => {
                    let next = *bytes.get(i + 1).ok_or(Error::BadEscape)?;
                    let (octet, consumed) = if next.is_ascii_digit() {
                        let digits = bytes.get(i + 1..i + 4).ok_or(Error::BadEscape)?;
                        if !digits.iter().all(u8::is_ascii_digit) {
                            return Err(Error::BadEscape);
                        }
                        let value = (digits[0] - b'0') as u16 * 100
                            + (digits[1] - b'0') as u16 * 10
                            + (digits[2] - b'0') as u16;
                        if value > 255 {
                            return Err(Error::BadEscape);
                        }
                        (value as u8, 4)
                    } else {
                        (next, 2)
                    };
                    label.try_push(octet).or(Err(Error::LabelTooLong))?;
                    i += consumed;
                }
                octet => {
                    label.try_push(octet).or(Err(Error::LabelTooLong))?;
                    i += 1;
                }
            }
        }
        if !label.is_empty() {
            // The final label was not terminated by a dot.
            return Err(Error::NotAbsolute);
        }
        wire.push(0);
        Ok(Self::from_wire_unchecked(wire))
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.seq())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\"{}\"", self)
    }
}

////////////////////////////////////////////////////////////////////////
// COMPARISONS                                                        //
////////////////////////////////////////////////////////////////////////

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.seq().compare(other.seq()).relation == NameRelation::Equal
    }
}

impl Eq for Name {}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// `Name`s are ordered canonically per [RFC 4034 § 6.1].
///
/// [RFC 4034 § 6.1]: https://datatracker.ietf.org/doc/html/rfc4034#section-6.1
impl Ord for Name {
    fn cmp(&self, other: &Self) -> Ordering {
        self.seq().compare(other.seq()).order
    }
}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Hashing must be case-insensitive to match Eq. Each label is
        // prefixed with its length so that label boundaries contribute.
        for n in 0..self.len() {
            let label = self.label(n);
            state.write_u8(label.len() as u8);
            label.hash(state);
        }
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
