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

//! Implementation of the [`LabelSeq`] view and name comparison.

use std::cmp::Ordering;
use std::fmt;

use super::Label;

/// A borrowed view of a contiguous run of labels within a domain name.
///
/// A `LabelSeq` references the underlying wire form and label-offset
/// table of a [`Name`](super::Name) (or of a label fragment stored in a
/// zone tree) and selects a consecutive subrange of its labels. Views
/// are cheap to copy and to [`split`](LabelSeq::split), which makes
/// them the working currency of the zone lookup algorithms: a tree
/// descent repeatedly strips matched suffix labels from the query name
/// without copying any octets.
///
/// A view is *absolute* if it extends through the null root label at
/// the end of an absolute name; otherwise it is relative (e.g. the
/// fragment `b.a` of `b.a.wild.example.`).
#[derive(Clone, Copy)]
pub struct LabelSeq<'a> {
    /// Offsets of each label of the underlying name within `wire`.
    offsets: &'a [u8],

    /// The complete underlying wire buffer.
    wire: &'a [u8],

    /// The index (into `offsets`) of the first label of the view.
    first: u8,

    /// The number of labels in the view.
    count: u8,
}

impl<'a> LabelSeq<'a> {
    /// Creates a `LabelSeq` over all labels described by `offsets`.
    pub(crate) fn new(offsets: &'a [u8], wire: &'a [u8]) -> Self {
        Self {
            offsets,
            wire,
            first: 0,
            count: offsets.len() as u8,
        }
    }

    /// Returns the number of labels in the view.
    pub fn len(self) -> usize {
        self.count as usize
    }

    /// Returns whether the view contains no labels.
    pub fn is_empty(self) -> bool {
        self.count == 0
    }

    /// Returns label `n` of the view (`n = 0` is the leftmost, i.e.
    /// least significant, label).
    ///
    /// # Panics
    ///
    /// Panics if `n` is out of range.
    pub fn label(self, n: usize) -> &'a Label {
        assert!(n < self.len());
        let offset = self.offsets[self.first as usize + n] as usize;
        let len = self.wire[offset] as usize;
        Label::from_unchecked(&self.wire[offset + 1..offset + 1 + len])
    }

    /// Returns a subview of `count` labels starting at label `skip`.
    ///
    /// # Panics
    ///
    /// Panics if the requested range is out of bounds.
    pub fn split(self, skip: usize, count: usize) -> Self {
        assert!(skip + count <= self.len());
        Self {
            offsets: self.offsets,
            wire: self.wire,
            first: self.first + skip as u8,
            count: count as u8,
        }
    }

    /// Returns the wire-form octets covered by the view: each label
    /// preceded by its length octet. For an absolute view this is a
    /// valid uncompressed domain name per RFC 1035 § 3.1.
    pub fn wire_octets(self) -> &'a [u8] {
        if self.count == 0 {
            return &[];
        }
        let start = self.offsets[self.first as usize] as usize;
        let after = self.first as usize + self.count as usize;
        let end = if after == self.offsets.len() {
            self.wire.len()
        } else {
            self.offsets[after] as usize
        };
        &self.wire[start..end]
    }

    /// Returns whether the view ends with the null root label.
    pub fn is_absolute(self) -> bool {
        !self.is_empty() && self.label(self.len() - 1).is_null()
    }

    /// Compares two label sequences in canonical DNS order, determining
    /// their hierarchical relationship at the same time.
    ///
    /// Labels are matched pairwise starting from the rightmost (most
    /// significant) label of each sequence. The returned
    /// [`NameComparison`] carries:
    ///
    /// * `order` — the canonical ordering ([RFC 4034 § 6.1]) of the
    ///   two sequences;
    /// * `common_labels` — how many trailing labels matched; and
    /// * `relation` — the hierarchical relationship (see
    ///   [`NameRelation`]).
    ///
    /// [RFC 4034 § 6.1]: https://datatracker.ietf.org/doc/html/rfc4034#section-6.1
    pub fn compare(self, other: LabelSeq) -> NameComparison {
        let len1 = self.len();
        let len2 = other.len();
        let min = len1.min(len2);
        let mut common = 0;
        while common < min {
            let l1 = self.label(len1 - common - 1);
            let l2 = other.label(len2 - common - 1);
            match l1.cmp(l2) {
                Ordering::Equal => common += 1,
                order => {
                    let relation = if common == 0 {
                        NameRelation::None
                    } else {
                        NameRelation::CommonAncestor
                    };
                    return NameComparison {
                        order,
                        common_labels: common,
                        relation,
                    };
                }
            }
        }
        // One sequence is a (possibly improper) suffix of the other. An
        // ancestor sorts before its descendants in canonical order.
        let (order, relation) = match len1.cmp(&len2) {
            Ordering::Equal => (Ordering::Equal, NameRelation::Equal),
            Ordering::Less => (Ordering::Less, NameRelation::Superdomain),
            Ordering::Greater => (Ordering::Greater, NameRelation::Subdomain),
        };
        NameComparison {
            order,
            common_labels: common,
            relation,
        }
    }
}

impl fmt::Display for LabelSeq<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("(empty)");
        }
        for n in 0..self.len() {
            let label = self.label(n);
            if label.is_null() {
                // The root label renders as the trailing dot.
                if self.len() == 1 {
                    f.write_str(".")?;
                }
            } else {
                write!(f, "{}.", label)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for LabelSeq<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\"{}\"", self)
    }
}

/// The outcome of comparing two label sequences with
/// [`LabelSeq::compare`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NameComparison {
    /// The canonical ordering of the sequences.
    pub order: Ordering,

    /// The number of trailing labels the sequences share.
    pub common_labels: usize,

    /// The hierarchical relationship between the sequences.
    pub relation: NameRelation,
}

/// The hierarchical relationship between two label sequences, from the
/// perspective of the first argument of [`LabelSeq::compare`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NameRelation {
    /// The sequences are equal (ignoring ASCII case).
    Equal,

    /// The first sequence is a proper ancestor of the second.
    Superdomain,

    /// The first sequence is a proper descendant of the second.
    Subdomain,

    /// The sequences diverge below one or more shared trailing labels.
    CommonAncestor,

    /// The sequences share no trailing labels.
    None,
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::super::Name;
    use super::*;

    fn name(text: &str) -> Name {
        text.parse().unwrap()
    }

    fn comparison(a: &Name, b: &Name) -> NameComparison {
        a.seq().compare(b.seq())
    }

    #[test]
    fn compare_detects_equality() {
        let cmp = comparison(&name("a.example."), &name("A.EXAMPLE."));
        assert_eq!(cmp.relation, NameRelation::Equal);
        assert_eq!(cmp.order, Ordering::Equal);
        assert_eq!(cmp.common_labels, 3);
    }

    #[test]
    fn compare_detects_superdomain_and_subdomain() {
        let cmp = comparison(&name("example."), &name("a.example."));
        assert_eq!(cmp.relation, NameRelation::Superdomain);
        assert_eq!(cmp.order, Ordering::Less);
        assert_eq!(cmp.common_labels, 2);

        let cmp = comparison(&name("a.example."), &name("example."));
        assert_eq!(cmp.relation, NameRelation::Subdomain);
        assert_eq!(cmp.order, Ordering::Greater);
    }

    #[test]
    fn compare_detects_common_ancestor() {
        let cmp = comparison(&name("c.a.wild.example."), &name("b.a.wild.example."));
        assert_eq!(cmp.relation, NameRelation::CommonAncestor);
        assert_eq!(cmp.order, Ordering::Greater);
        assert_eq!(cmp.common_labels, 4);
    }

    #[test]
    fn absolute_names_always_share_the_root() {
        // Two absolute names can never be wholly disjoint: the null
        // root label is common to both.
        let cmp = comparison(&name("com."), &name("org."));
        assert_eq!(cmp.relation, NameRelation::CommonAncestor);
        assert_eq!(cmp.common_labels, 1);
    }

    #[test]
    fn relative_fragments_may_be_disjoint() {
        let a = name("c.a.example.");
        let b = name("b.example.");
        let cmp = a.seq().split(0, 2).compare(b.seq().split(0, 1));
        assert_eq!(cmp.relation, NameRelation::None);
        assert_eq!(cmp.common_labels, 0);
        // "c.a" vs "b": the rightmost labels ("a" vs "b") decide.
        assert_eq!(cmp.order, Ordering::Less);
    }

    #[test]
    fn split_selects_a_subview() {
        let n = name("b.a.wild.example.");
        let view = n.seq().split(2, 3);
        assert_eq!(view.len(), 3);
        assert_eq!(view.label(0), <&Label>::from(b"wild"));
        assert!(view.is_absolute());
        assert_eq!(view.to_string(), "wild.example.");
    }

    #[test]
    fn wire_octets_cover_the_view() {
        let n = name("b.a.wild.example.");
        assert_eq!(n.seq().split(0, 2).wire_octets(), b"\x01b\x01a");
        assert_eq!(
            n.seq().split(2, 3).wire_octets(),
            b"\x04wild\x07example\x00"
        );
    }

    #[test]
    fn canonical_ordering_follows_rfc_4034() {
        // The example ordering from RFC 4034 § 6.1.
        let ordered = [
            name("example."),
            name("a.example."),
            name("yljkjljk.a.example."),
            name("Z.a.example."),
            name("zABC.a.EXAMPLE."),
            name("z.example."),
            name("\\001.z.example."),
            name("*.z.example."),
            name("\\200.z.example."),
        ];
        for (i, a) in ordered.iter().enumerate() {
            for (j, b) in ordered.iter().enumerate() {
                assert_eq!(
                    comparison(a, b).order,
                    i.cmp(&j),
                    "misordered: {} vs {}",
                    a,
                    b
                );
            }
        }
    }
}
