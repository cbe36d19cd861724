//! Identifier generation for exported project files
//!
//! DAW project formats require a fresh identifier per track, item and
//! source. Identifiers are rendered as upper-case UUIDs in braces:
//! `{XXXXXXXX-XXXX-4XXX-YXXX-XXXXXXXXXXXX}` (version nibble fixed at 4).
//!
//! Serializers take a `&mut dyn IdGenerator` so tests can substitute
//! [`SequentialIds`] for a deterministic sequence.

use std::collections::HashSet;
use std::fmt;

use uuid::Uuid;

/// Opaque identifier emitted into project files
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    /// Braced, upper-case form (`{8-4-4-4-12}`)
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn from_uuid(uuid: Uuid) -> Self {
        Self(format!("{{{}}}", uuid.hyphenated().to_string().to_uppercase()))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of identifiers for one export invocation
pub trait IdGenerator {
    /// Produce the next identifier. Never repeats within one generator.
    fn next(&mut self) -> Identifier;
}

/// UUIDv4-backed generator
///
/// Remembers every identifier it has issued and redraws on collision,
/// so one export never repeats.
#[derive(Debug, Default)]
pub struct RandomIds {
    issued: HashSet<Uuid>,
}

impl RandomIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for RandomIds {
    fn next(&mut self) -> Identifier {
        loop {
            let uuid = Uuid::new_v4();
            if self.issued.insert(uuid) {
                return Identifier::from_uuid(uuid);
            }
        }
    }
}

/// Deterministic generator for tests: `{00000000-0000-4000-8000-000000000001}`, ...
#[derive(Debug, Default)]
pub struct SequentialIds {
    counter: u64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn next(&mut self) -> Identifier {
        self.counter += 1;
        let uuid = Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0000 | self.counter as u128);
        Identifier::from_uuid(uuid)
    }
}
