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

//! Implementation of additional-section expansion.
//!
//! For certain RR types, [RFC 1034 § 4.3.2] and [RFC 1035 § 3.3] call
//! for "additional section processing": when such records appear in a
//! response, address records for the domain names embedded in their
//! RDATA are included in the additional section. NS, MX, and SRV
//! targets are handled here; for NS targets the search is allowed
//! below zone cuts, so that glue is found.
//!
//! [RFC 1034 § 4.3.2]: https://datatracker.ietf.org/doc/html/rfc1034#section-4.3.2
//! [RFC 1035 § 3.3]: https://datatracker.ietf.org/doc/html/rfc1035#section-3.3

use crate::name::{Name, NameRelation};
use crate::rr::{RdataSet, Type};

use super::lookup::{find_node, AnswerRrset, Context, FindOptions, ResultCode};
use super::tree::{ZoneChain, ROOT};

impl<'a> Context<'a> {
    /// Expands the additional section for this answer: for each
    /// additional-processing name embedded in the answer's RDATA,
    /// resolves the name in the zone and collects its RRsets of the
    /// requested types (commonly A and AAAA).
    ///
    /// Targets outside the zone, targets that do not cleanly exist,
    /// and targets at or below zone cuts (unless the answer RRset is
    /// NS, for which glue applies) are skipped.
    pub fn additionals(&self, requested_types: &[Type]) -> Vec<AnswerRrset<'a>> {
        let mut result = Vec::new();
        if let Some(rdset) = self.found_rdset {
            // Normal query with a successful result.
            self.additionals_for_rdataset(rdset, requested_types, &mut result);
        } else if let Some(node) = self.found_node {
            // Successful ANY query: process each RRset of the node.
            for rdset in self.zone.zone_tree().data(node).iter() {
                self.additionals_for_rdataset(rdset, requested_types, &mut result);
            }
        }
        result
    }

    /// Finds, creates, and inserts the additional RRsets for the
    /// target names embedded in one RRset's RDATA.
    fn additionals_for_rdataset(
        &self,
        rdset: &'a RdataSet,
        requested_types: &[Type],
        result: &mut Vec<AnswerRrset<'a>>,
    ) {
        let options = FindOptions {
            dnssec: self.options.dnssec,
            // Glue is what additional processing of NS targets is
            // about, so the search descends below the delegation.
            glue_ok: rdset.rr_type == Type::NS,
            no_wildcard: false,
        };
        for rdata in rdset.rdatas() {
            if let Some(target) = rdata.additional_target(rdset.rr_type) {
                self.find_additional(&target, requested_types, options, result);
            }
        }
    }

    /// Resolves one additional target name and collects the requested
    /// RRsets at it.
    fn find_additional(
        &self,
        target: &Name,
        requested_types: &[Type],
        options: FindOptions,
        result: &mut Vec<AnswerRrset<'a>>,
    ) {
        // Ignore out-of-zone names.
        let relation = self.zone.origin().seq().compare(target.seq()).relation;
        if relation != NameRelation::Equal && relation != NameRelation::Superdomain {
            return;
        }

        // Find the zone node for the additional name. We only need a
        // clean exact match.
        // TODO: consider the case of a DNAME above the target name.
        let mut chain = ZoneChain::new();
        let node_result = match find_node(self.zone, target.seq(), &mut chain, options) {
            Ok(node_result) => node_result,
            Err(_) => return,
        };
        let node = match (node_result.code, node_result.node) {
            (ResultCode::Success, Some(node)) => node,
            _ => return,
        };

        // Ignore data at a zone cut unless glue is allowed.
        let tree = self.zone.zone_tree();
        if !options.glue_ok && tree.node(node).callback && node != ROOT {
            return;
        }

        // If the additional name was subject to wildcard substitution,
        // present its RRsets under the substituted (target) name.
        let real_name = if node_result.wildcard {
            Some(target)
        } else {
            None
        };
        for rdset in tree.data(node).iter() {
            if requested_types.contains(&rdset.rr_type) {
                result.push(AnswerRrset::new(tree, node, rdset, options, real_name));
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::super::testing::{build_zone, NS_CHILD_GLUE};
    use super::super::ZoneData;
    use super::*;
    use crate::class::Class;
    use crate::rr::Ttl;

    fn name(text: &str) -> Name {
        text.parse().unwrap()
    }

    fn add(zone: &mut ZoneData, owner: &str, rr_type: Type, octets: &[u8]) {
        zone.add(
            &name(owner),
            rr_type,
            Class::IN,
            Ttl::from(3600),
            octets.try_into().unwrap(),
        )
        .unwrap();
    }

    /// A zone with MX and SRV records whose targets exercise the
    /// various additional-processing cases.
    fn build_mail_zone() -> ZoneData {
        let mut zone = ZoneData::new(name("example."), Class::IN);
        add(&mut zone, "example.", Type::SOA, b"soa");
        add(&mut zone, "example.", Type::NS, b"\x02ns\x07example\x00");
        add(&mut zone, "ns.example.", Type::A, &[192, 0, 2, 1]);

        // In-zone target with both address types.
        add(
            &mut zone,
            "example.",
            Type::MX,
            b"\x00\x0a\x04mail\x07example\x00",
        );
        // Out-of-zone target.
        add(
            &mut zone,
            "example.",
            Type::MX,
            b"\x00\x14\x04mail\x05other\x00",
        );
        // Nonexistent target.
        add(
            &mut zone,
            "example.",
            Type::MX,
            b"\x00\x1e\x07noexist\x07example\x00",
        );
        add(&mut zone, "mail.example.", Type::A, &[192, 0, 2, 10]);
        add(
            &mut zone,
            "mail.example.",
            Type::AAAA,
            &[0x20, 0x01, 0x0d, 0xb8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x10],
        );

        // An SRV record pointing at a wildcard-covered target.
        add(
            &mut zone,
            "_svc._tcp.example.",
            Type::SRV,
            b"\x00\x01\x00\x02\x00\x50\x03srv\x04dyn\x07example\x00",
        );
        add(&mut zone, "*.dyn.example.", Type::A, &[192, 0, 2, 20]);

        // An MX target sitting at a zone cut.
        add(
            &mut zone,
            "example.",
            Type::MX,
            b"\x00\x28\x04mail\x03sub\x07example\x00",
        );
        add(
            &mut zone,
            "sub.example.",
            Type::NS,
            b"\x02ns\x03sub\x07example\x00",
        );
        add(&mut zone, "mail.sub.example.", Type::A, &[192, 0, 2, 30]);

        zone
    }

    fn addresses(rrsets: &[AnswerRrset]) -> Vec<(String, Type, Vec<u8>)> {
        let mut out = Vec::new();
        for rrset in rrsets {
            for rdata in rrset.rdatas() {
                out.push((
                    rrset.owner().to_string(),
                    rrset.rr_type(),
                    rdata.octets().to_vec(),
                ));
            }
        }
        out.sort();
        out
    }

    #[test]
    fn mx_targets_are_expanded() {
        let zone = build_mail_zone();
        let context = zone
            .find(&name("example."), Type::MX, FindOptions::default())
            .unwrap();
        assert_eq!(context.code, ResultCode::Success);

        let additionals = context.additionals(&[Type::A, Type::AAAA]);
        // Only mail.example. qualifies: mail.other. is out of zone,
        // noexist.example. does not exist, and mail.sub.example. is
        // below a zone cut.
        assert_eq!(
            addresses(&additionals),
            [
                (
                    "mail.example.".to_owned(),
                    Type::A,
                    vec![192, 0, 2, 10],
                ),
                (
                    "mail.example.".to_owned(),
                    Type::AAAA,
                    vec![0x20, 0x01, 0x0d, 0xb8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x10],
                ),
            ]
        );
    }

    #[test]
    fn only_requested_types_are_returned() {
        let zone = build_mail_zone();
        let context = zone
            .find(&name("example."), Type::MX, FindOptions::default())
            .unwrap();
        let additionals = context.additionals(&[Type::AAAA]);
        assert_eq!(additionals.len(), 1);
        assert_eq!(additionals[0].rr_type(), Type::AAAA);
    }

    #[test]
    fn ns_targets_find_glue_below_the_cut() {
        let zone = build_zone();
        let context = zone
            .find(&name("x.child.example."), Type::A, FindOptions::default())
            .unwrap();
        assert_eq!(context.code, ResultCode::Delegation);

        let additionals = context.additionals(&[Type::A, Type::AAAA]);
        assert_eq!(
            addresses(&additionals),
            [(
                "ns.child.example.".to_owned(),
                Type::A,
                NS_CHILD_GLUE.to_vec(),
            )]
        );
    }

    #[test]
    fn wildcard_targets_are_presented_under_the_target_name() {
        let zone = build_mail_zone();
        let context = zone
            .find(&name("_svc._tcp.example."), Type::SRV, FindOptions::default())
            .unwrap();
        assert_eq!(context.code, ResultCode::Success);

        let additionals = context.additionals(&[Type::A]);
        assert_eq!(
            addresses(&additionals),
            [(
                "srv.dyn.example.".to_owned(),
                Type::A,
                vec![192, 0, 2, 20],
            )]
        );
    }

    #[test]
    fn any_answers_expand_every_rrset() {
        let zone = build_mail_zone();
        let (context, _rrsets) = zone
            .find_all(&name("example."), FindOptions::default())
            .unwrap();
        assert_eq!(context.code, ResultCode::Success);

        // Both the NS target (ns.example.) and the MX target
        // (mail.example.) contribute.
        let additionals = context.additionals(&[Type::A]);
        let found = addresses(&additionals);
        assert!(found.contains(&("ns.example.".to_owned(), Type::A, vec![192, 0, 2, 1])));
        assert!(found.contains(&("mail.example.".to_owned(), Type::A, vec![192, 0, 2, 10])));
    }

    #[test]
    fn negative_answers_have_no_additionals() {
        let zone = build_mail_zone();
        let context = zone
            .find(&name("noexist.example."), Type::MX, FindOptions::default())
            .unwrap();
        assert_eq!(context.code, ResultCode::NxDomain);
        assert!(context.additionals(&[Type::A]).is_empty());
    }
}
