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

//! Implementation of the [`Error`] type for zone-related errors.

use std::fmt;

use crate::rr::RdataSetAddError;

/// Errors that arise during operations on a
/// [`ZoneData`](super::ZoneData).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Error {
    /// The domain name is not at or below the zone's origin. Returned
    /// both when adding a record with a foreign owner and when looking
    /// up a name outside the zone.
    OutOfZone,

    /// The record's class does not match the zone's class.
    ClassMismatch,

    /// The record's TTL does not match the TTL of existing records in
    /// the same RRset.
    TtlMismatch,

    /// An RRSIG record was presented before the RRset it covers.
    OrphanedRrsig,

    /// The operation required RDATA parsing, and invalid RDATA was
    /// found.
    InvalidRdata,

    /// An NSEC3 lookup was attempted on a zone that is not
    /// NSEC3-signed.
    NotNsec3Signed,

    /// A recursive NSEC3 search ran out of labels without finding a
    /// matching hash. RFC 5155 guarantees a hash for the origin, so
    /// this indicates corrupt zone data.
    BrokenNsec3Zone,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::OutOfZone => f.write_str("the domain name is not within the zone"),
            Self::ClassMismatch => {
                f.write_str("the record's class does not match the zone's class")
            }
            Self::TtlMismatch => f.write_str(
                "the record's TTL does not match the TTL of existing records in the same RRset",
            ),
            Self::OrphanedRrsig => f.write_str("the RRSIG covers no existing RRset"),
            Self::InvalidRdata => {
                f.write_str("the operation required RDATA parsing, and invalid RDATA was found")
            }
            Self::NotNsec3Signed => f.write_str("the zone is not NSEC3-signed"),
            Self::BrokenNsec3Zone => {
                f.write_str("recursive NSEC3 search did not terminate (broken NSEC3 zone)")
            }
        }
    }
}

impl From<RdataSetAddError> for Error {
    fn from(error: RdataSetAddError) -> Self {
        match error {
            RdataSetAddError::TtlMismatch => Self::TtlMismatch,
            RdataSetAddError::OrphanedRrsig => Self::OrphanedRrsig,
        }
    }
}

impl std::error::Error for Error {}
