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

//! Implementation of the [`ZoneManager`], the single builder thread
//! that swaps zone sets in and out for readers.
//!
//! Zones are immutable once published, so every change—installing a
//! freshly built [`ZoneData`], or removing one—produces a complete new
//! [`ZoneTable`] that replaces the current one wholesale. Readers call
//! [`ZoneManager::snapshot`] at the start of a query and hold the
//! returned [`Arc`] for the query's duration; a table handed out this
//! way stays valid (and unchanged) no matter what the builder does
//! afterwards.
//!
//! Changes are [`Command`]s pushed onto a queue guarded by one mutex
//! and signalled through one condition variable. The builder thread
//! pops and executes them one at a time. A panic while executing a
//! command is caught and logged, never propagated; shutting the
//! manager down pushes [`Command::Shutdown`], signals the builder, and
//! joins it.

use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

use log::{error, info};

use crate::class::Class;
use crate::name::Name;
use crate::table::ZoneTable;
use crate::zone::ZoneData;

/// A command for the builder thread.
pub enum Command {
    /// Installs a freshly built zone, replacing any zone of the same
    /// origin and class.
    Install(Arc<ZoneData>),

    /// Removes the zone with the given origin and class.
    Remove(Name, Class),

    /// Stops the builder thread. Usually sent through
    /// [`ZoneManager::shut_down`] rather than directly.
    Shutdown,
}

/// The zone-update worker; see the [module documentation](self).
pub struct ZoneManager {
    shared: Arc<Shared>,
    builder: Option<JoinHandle<()>>,
}

/// State shared between the manager handle and the builder thread.
struct Shared {
    /// The command queue. All pushes and pops happen under this mutex.
    queue: Mutex<Queue>,

    /// Signalled whenever a command is pushed.
    wakeup: Condvar,

    /// The currently published table. Replaced, never mutated.
    table: Mutex<Arc<ZoneTable>>,
}

struct Queue {
    commands: VecDeque<Command>,
    shutting_down: bool,
}

impl ZoneManager {
    /// Creates a `ZoneManager` with an empty zone table and starts its
    /// builder thread.
    pub fn new() -> io::Result<Self> {
        let shared = Arc::new(Shared {
            queue: Mutex::new(Queue {
                commands: VecDeque::new(),
                shutting_down: false,
            }),
            wakeup: Condvar::new(),
            table: Mutex::new(Arc::new(ZoneTable::new())),
        });
        let builder_shared = shared.clone();
        let builder = thread::Builder::new()
            .name("zone-builder".to_owned())
            .spawn(move || builder_loop(builder_shared))?;
        Ok(Self {
            shared,
            builder: Some(builder),
        })
    }

    /// Returns the currently published [`ZoneTable`]. The returned
    /// snapshot is immutable; hold it for the duration of a query.
    pub fn snapshot(&self) -> Arc<ZoneTable> {
        self.shared.table.lock().unwrap().clone()
    }

    /// Queues a command for the builder thread.
    pub fn send(&self, command: Command) -> Result<(), Error> {
        let mut queue = self.shared.queue.lock().unwrap();
        if queue.shutting_down {
            return Err(Error::ShuttingDown);
        }
        if let Command::Shutdown = command {
            queue.shutting_down = true;
        }
        queue.commands.push_back(command);
        self.shared.wakeup.notify_one();
        Ok(())
    }

    /// Shuts the builder thread down and waits for it to exit. Safe to
    /// call more than once.
    pub fn shut_down(&mut self) {
        // Ignore the error: if the queue is already shutting down, the
        // join below is all that is left to do.
        let _ = self.send(Command::Shutdown);
        if let Some(builder) = self.builder.take() {
            if builder.join().is_err() {
                // The loop catches command panics, so this should not
                // happen.
                error!("zone builder thread panicked");
            }
        }
    }
}

impl Drop for ZoneManager {
    fn drop(&mut self) {
        self.shut_down();
    }
}

/// The pop-and-execute loop of the builder thread.
fn builder_loop(shared: Arc<Shared>) {
    info!("zone builder thread started");
    loop {
        let command = {
            let mut queue = shared.queue.lock().unwrap();
            loop {
                if let Some(command) = queue.commands.pop_front() {
                    break command;
                }
                queue = shared.wakeup.wait(queue).unwrap();
            }
        };
        if let Command::Shutdown = command {
            break;
        }

        // A failing command must never take the builder down with it;
        // the failure is logged and the loop continues with the next
        // command.
        let result = panic::catch_unwind(AssertUnwindSafe(|| execute(&shared, command)));
        if let Err(payload) = result {
            match panic_message(payload.as_ref()) {
                Some(message) => error!("zone builder command failed: {}", message),
                None => error!("zone builder command failed with a non-string panic"),
            }
        }
    }
    info!("zone builder thread exiting");
}

/// Executes one (non-shutdown) command against the published table.
fn execute(shared: &Shared, command: Command) {
    match command {
        Command::Install(zone) => {
            info!("installing zone {}/{}", zone.origin(), zone.class());
            let mut table = shared.table.lock().unwrap();
            let mut next = (**table).clone();
            next.insert(zone);
            *table = Arc::new(next);
        }
        Command::Remove(origin, class) => {
            info!("removing zone {}/{}", origin, class);
            let mut table = shared.table.lock().unwrap();
            let mut next = (**table).clone();
            next.remove(&origin, class);
            *table = Arc::new(next);
        }
        Command::Shutdown => (), // handled by the loop
    }
}

/// Extracts the message from a panic payload, when it has one.
fn panic_message(payload: &(dyn Any + Send)) -> Option<&str> {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
}

/// An error type for [`ZoneManager`] operations.
#[derive(Debug)]
pub enum Error {
    /// The manager is shutting down and accepts no further commands.
    ShuttingDown,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ShuttingDown => f.write_str("the zone manager is shutting down"),
        }
    }
}

impl std::error::Error for Error {}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn name(text: &str) -> Name {
        text.parse().unwrap()
    }

    fn zone(origin: &str) -> Arc<ZoneData> {
        Arc::new(ZoneData::new(name(origin), Class::IN))
    }

    /// Polls until `predicate` holds for a snapshot, panicking if it
    /// never does.
    fn await_table(manager: &ZoneManager, predicate: impl Fn(&ZoneTable) -> bool) {
        for _ in 0..500 {
            if predicate(&manager.snapshot()) {
                return;
            }
            thread::sleep(Duration::from_millis(2));
        }
        panic!("the zone table never reached the expected state");
    }

    #[test]
    fn install_publishes_a_new_table() {
        let manager = ZoneManager::new().unwrap();
        assert!(manager.snapshot().is_empty());

        manager.send(Command::Install(zone("example."))).unwrap();
        await_table(&manager, |table| {
            table.find_zone(&name("a.example."), Class::IN).is_some()
        });
    }

    #[test]
    fn snapshots_are_unaffected_by_later_changes() {
        let manager = ZoneManager::new().unwrap();
        let before = manager.snapshot();
        manager.send(Command::Install(zone("example."))).unwrap();
        await_table(&manager, |table| !table.is_empty());
        assert!(before.is_empty());
    }

    #[test]
    fn remove_unpublishes_a_zone() {
        let manager = ZoneManager::new().unwrap();
        manager.send(Command::Install(zone("example."))).unwrap();
        await_table(&manager, |table| !table.is_empty());

        manager
            .send(Command::Remove(name("example."), Class::IN))
            .unwrap();
        await_table(&manager, |table| table.is_empty());
    }

    #[test]
    fn shut_down_joins_and_rejects_further_commands() {
        let mut manager = ZoneManager::new().unwrap();
        manager.shut_down();
        assert!(matches!(
            manager.send(Command::Install(zone("example."))),
            Err(Error::ShuttingDown)
        ));
        // Shutting down again is a no-op.
        manager.shut_down();
    }
}
