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

//! Bailiwick is an in-memory database for authoritative DNS zone data.
//!
//! The heart of the crate is the [`zone::ZoneData`] structure, a DNS
//! zone loaded into an ordered, labelled tree, and its lookup methods
//! [`zone::ZoneData::find`], [`zone::ZoneData::find_all`], and
//! [`zone::ZoneData::find_nsec3`]. These implement the name server
//! lookup algorithm of [RFC 1034 § 4.3.2] as refined by [RFC 2672]
//! (DNAME), [RFC 4035] (NSEC-signed responses), and [RFC 5155] (NSEC3),
//! and produce the categorical answers—success, CNAME, delegation,
//! wildcard match, empty non-terminal, nonexistent domain—together with
//! the supporting records a validating resolver needs.
//!
//! Zones are built once, published, and thereafter never mutated.
//! The [`table::ZoneTable`] collects published zones and finds the
//! nearest enclosing zone for a query name, and the
//! [`manager::ZoneManager`] runs the single builder thread that swaps
//! new zone sets in for readers.
//!
//! Wire-format message handling and the server front end are outside
//! the scope of this crate; callers translate lookup results into
//! response messages themselves.
//!
//! [RFC 1034 § 4.3.2]: https://datatracker.ietf.org/doc/html/rfc1034#section-4.3.2
//! [RFC 2672]: https://datatracker.ietf.org/doc/html/rfc2672
//! [RFC 4035]: https://datatracker.ietf.org/doc/html/rfc4035
//! [RFC 5155]: https://datatracker.ietf.org/doc/html/rfc5155

pub mod class;
pub mod manager;
pub mod name;
pub mod rr;
pub mod table;
pub mod zone;

mod util;
