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

//! Implementation of the [`Error`] type for domain name processing.

use std::fmt;

/// Errors that may occur when parsing or constructing domain names.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Error {
    /// A label exceeded 63 octets.
    LabelTooLong,

    /// The name's uncompressed wire form exceeded 255 octets.
    NameTooLong,

    /// The name contained an empty label in a position other than the
    /// root.
    EmptyLabel,

    /// A textual name did not end with the root label (a trailing dot).
    NotAbsolute,

    /// A textual name contained an invalid escape sequence.
    BadEscape,

    /// A wire-form name ran past the end of its buffer.
    UnexpectedEnd,

    /// A wire-form name contained an unsupported label type (the two
    /// high bits of a length octet were partially set, or a compression
    /// pointer appeared where none is allowed).
    BadLabelType,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::LabelTooLong => f.write_str("label exceeds 63 octets"),
            Self::NameTooLong => f.write_str("name exceeds 255 octets"),
            Self::EmptyLabel => f.write_str("name contains an empty non-root label"),
            Self::NotAbsolute => f.write_str("name is not fully qualified"),
            Self::BadEscape => f.write_str("invalid escape sequence"),
            Self::UnexpectedEnd => f.write_str("unexpected end of wire-form name"),
            Self::BadLabelType => f.write_str("unsupported label type"),
        }
    }
}

impl std::error::Error for Error {}
