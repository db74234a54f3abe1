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

//! Implementation of the [`Rdata`] type and RDATA processing.

use std::fmt::{self, Write};

use super::Type;
use crate::name::Name;
use crate::util::nibble_to_ascii_hex_digit;

/// A type for record RDATA.
///
/// The RDATA of a record is limited to 65,535 octets. The `Rdata` type
/// is a wrapper over `[u8]` that can only be constructed if the
/// underlying data has a valid length.
#[repr(transparent)]
pub struct Rdata {
    octets: [u8],
}

impl Rdata {
    /// Converts a `&[u8]` to a `&Rdata`, without checking the length;
    /// for internal use only.
    pub(super) fn from_unchecked(octets: &[u8]) -> &Self {
        unsafe { &*(octets as *const [u8] as *const Self) }
    }

    /// Returns an empty `&Rdata`.
    pub fn empty() -> &'static Self {
        Self::from_unchecked(&[])
    }

    /// Returns whether the [`Rdata`] is empty.
    pub fn is_empty(&self) -> bool {
        self.octets.is_empty()
    }

    /// Returns the length of the [`Rdata`].
    pub fn len(&self) -> usize {
        self.octets.len()
    }

    /// Returns the underlying octet slice.
    pub fn octets(&self) -> &[u8] {
        &self.octets
    }

    /// Extracts the embedded domain name that is subject to additional
    /// section processing ([RFC 1035 § 3.3]), assuming the RDATA is of
    /// type `rr_type`.
    ///
    /// NS, MX, and SRV records carry such a name (the SRV case per
    /// [RFC 2782]). For other types, and for RDATA from which no valid
    /// uncompressed name can be read, this returns `None`.
    ///
    /// [RFC 1035 § 3.3]: https://datatracker.ietf.org/doc/html/rfc1035#section-3.3
    /// [RFC 2782]: https://datatracker.ietf.org/doc/html/rfc2782
    pub fn additional_target(&self, rr_type: Type) -> Option<Name> {
        let offset = match rr_type {
            Type::NS => 0,
            Type::MX => 2,  // skip PREFERENCE
            Type::SRV => 6, // skip priority, weight, and port
            _ => return None,
        };
        let rest = self.octets.get(offset..)?;
        Name::try_from_uncompressed(rest).ok().map(|(name, _)| name)
    }

    /// Returns the type covered by this RDATA, assuming it is RRSIG
    /// RDATA ([RFC 4034 § 3.1]). Returns `None` if the RDATA is too
    /// short.
    ///
    /// [RFC 4034 § 3.1]: https://datatracker.ietf.org/doc/html/rfc4034#section-3.1
    pub fn rrsig_covered(&self) -> Option<Type> {
        let covered: [u8; 2] = self.octets.get(0..2)?.try_into().ok()?;
        Some(Type::from(u16::from_be_bytes(covered)))
    }

    /// Parses the NSEC3 parameter fields shared by NSEC3 and NSEC3PARAM
    /// RDATA ([RFC 5155 §§ 3.2, 4.2]): hash algorithm, flags,
    /// iterations, and salt. Returns `None` if the RDATA is malformed.
    ///
    /// [RFC 5155 §§ 3.2, 4.2]: https://datatracker.ietf.org/doc/html/rfc5155#section-3.2
    pub fn nsec3_params(&self) -> Option<(u8, u8, u16, &[u8])> {
        let algorithm = *self.octets.first()?;
        let flags = *self.octets.get(1)?;
        let iterations: [u8; 2] = self.octets.get(2..4)?.try_into().ok()?;
        let salt_len = *self.octets.get(4)? as usize;
        let salt = self.octets.get(5..5 + salt_len)?;
        Some((algorithm, flags, u16::from_be_bytes(iterations), salt))
    }
}

impl<'a> TryFrom<&'a [u8]> for &'a Rdata {
    type Error = RdataTooLongError;

    fn try_from(octets: &'a [u8]) -> Result<Self, Self::Error> {
        if octets.len() > (u16::MAX as usize) {
            Err(RdataTooLongError)
        } else {
            Ok(Rdata::from_unchecked(octets))
        }
    }
}

impl<'a, const N: usize> TryFrom<&'a [u8; N]> for &'a Rdata {
    type Error = RdataTooLongError;

    fn try_from(octets: &'a [u8; N]) -> Result<Self, Self::Error> {
        octets[..].try_into()
    }
}

impl AsRef<[u8]> for Rdata {
    fn as_ref(&self) -> &[u8] {
        &self.octets
    }
}

impl PartialEq for Rdata {
    fn eq(&self, other: &Self) -> bool {
        self.octets == other.octets
    }
}

impl Eq for Rdata {}

impl fmt::Display for Rdata {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // We output using the RFC 3597 format for RDATA of unknown
        // type.
        write!(f, "\\# {}", self.len())?;
        if !self.is_empty() {
            f.write_char(' ')?;
            for octet in self.octets.iter() {
                f.write_char(char::from(nibble_to_ascii_hex_digit((octet & 0xf0) >> 4)))?;
                f.write_char(char::from(nibble_to_ascii_hex_digit(octet & 0xf)))?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Rdata {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\"{}\"", self)
    }
}

/// An error signaling that a `&[u8]` cannot be converted to an `&Rdata`
/// because it is too long.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct RdataTooLongError;

impl fmt::Display for RdataTooLongError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("RDATA is too long")
    }
}

impl std::error::Error for RdataTooLongError {}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rdata_constructor_accepts_short_slices() {
        let quite_short = &[0, 1, 2, 3];
        let quite_short_rdata: &Rdata = quite_short.try_into().unwrap();
        assert_eq!(quite_short_rdata.octets(), quite_short);

        let almost_too_long = &[0; u16::MAX as usize];
        assert!(<&Rdata>::try_from(almost_too_long).is_ok());
    }

    #[test]
    fn rdata_constructor_rejects_long_slice() {
        let too_long = [0; u16::MAX as usize + 1];
        assert_eq!(<&Rdata>::try_from(&too_long[..]), Err(RdataTooLongError));
    }

    #[test]
    fn additional_target_reads_ns_mx_and_srv() {
        let ns: &Rdata = b"\x02ns\x07example\x00".try_into().unwrap();
        assert_eq!(
            ns.additional_target(Type::NS).unwrap().to_string(),
            "ns.example."
        );

        let mx: &Rdata = b"\x00\x0a\x04mail\x07example\x00".try_into().unwrap();
        assert_eq!(
            mx.additional_target(Type::MX).unwrap().to_string(),
            "mail.example."
        );

        let srv: &Rdata = b"\x00\x01\x00\x02\x00\x50\x03srv\x07example\x00"
            .try_into()
            .unwrap();
        assert_eq!(
            srv.additional_target(Type::SRV).unwrap().to_string(),
            "srv.example."
        );
    }

    #[test]
    fn additional_target_ignores_other_types() {
        let a: &Rdata = (&[192, 0, 2, 1]).try_into().unwrap();
        assert!(a.additional_target(Type::A).is_none());
    }

    #[test]
    fn additional_target_rejects_malformed_names() {
        let truncated: &Rdata = b"\x07exam".try_into().unwrap();
        assert!(truncated.additional_target(Type::NS).is_none());
    }

    #[test]
    fn rrsig_covered_works() {
        let rrsig: &Rdata = b"\x00\x01\x05\x03\x00\x00\x0e\x10".try_into().unwrap();
        assert_eq!(rrsig.rrsig_covered(), Some(Type::A));
        assert_eq!(Rdata::empty().rrsig_covered(), None);
    }

    #[test]
    fn nsec3_params_works() {
        // SHA-1, no flags, 12 iterations, salt aabbccdd.
        let rdata: &Rdata = b"\x01\x00\x00\x0c\x04\xaa\xbb\xcc\xdd\x00"
            .try_into()
            .unwrap();
        let (algorithm, flags, iterations, salt) = rdata.nsec3_params().unwrap();
        assert_eq!(algorithm, 1);
        assert_eq!(flags, 0);
        assert_eq!(iterations, 12);
        assert_eq!(salt, b"\xaa\xbb\xcc\xdd");
    }

    #[test]
    fn nsec3_params_rejects_truncation() {
        let truncated: &Rdata = b"\x01\x00\x00".try_into().unwrap();
        assert!(truncated.nsec3_params().is_none());
    }
}
