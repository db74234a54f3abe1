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

//! Implementation of the [`ZoneTable`] structure.

use std::sync::Arc;

use crate::class::Class;
use crate::name::{Name, NameRelation};
use crate::zone::ZoneData;

/// The set of zones served at one point in time.
///
/// A `ZoneTable` supports looking up the zone that is the nearest
/// ancestor to a query name (see [`ZoneTable::find_zone`]); this is
/// step 2 of the lookup algorithm given in [RFC 1034 § 4.3.2]. Step 3
/// then proceeds inside the found [`ZoneData`].
///
/// Tables are value types: the [`manager`](crate::manager) builds a
/// new table for every change and publishes it wholesale, so a table
/// handed to readers is never mutated.
///
/// [RFC 1034 § 4.3.2]: https://datatracker.ietf.org/doc/html/rfc1034#section-4.3.2
#[derive(Clone, Default)]
pub struct ZoneTable {
    zones: Vec<Arc<ZoneData>>,
}

impl ZoneTable {
    /// Creates a new, initially empty `ZoneTable`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `zone` to the table, replacing and returning the
    /// preexisting zone of the same origin and class (if any).
    pub fn insert(&mut self, zone: Arc<ZoneData>) -> Option<Arc<ZoneData>> {
        let replaced = self.remove(zone.origin(), zone.class());
        self.zones.push(zone);
        replaced
    }

    /// Removes and returns the zone with the given origin and class.
    pub fn remove(&mut self, origin: &Name, class: Class) -> Option<Arc<ZoneData>> {
        let index = self
            .zones
            .iter()
            .position(|zone| zone.class() == class && zone.origin() == origin)?;
        Some(self.zones.swap_remove(index))
    }

    /// Looks up the zone in the table that is the nearest ancestor to
    /// `name` (i.e., the zone whose origin matches the most
    /// consecutive labels in `name`, starting from the right).
    pub fn find_zone(&self, name: &Name, class: Class) -> Option<&Arc<ZoneData>> {
        self.zones
            .iter()
            .filter(|zone| {
                if zone.class() != class {
                    return false;
                }
                matches!(
                    zone.origin().seq().compare(name.seq()).relation,
                    NameRelation::Equal | NameRelation::Superdomain
                )
            })
            .max_by_key(|zone| zone.origin().len())
    }

    /// Returns an iterator over the zones of the table.
    pub fn iter(&self) -> std::slice::Iter<Arc<ZoneData>> {
        self.zones.iter()
    }

    /// Returns the number of zones in the table.
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Returns whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
