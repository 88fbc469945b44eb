//! Fixed set of validated fields and the per-field error table.

use serde::Serialize;
use std::fmt;

/// Identifier for every field of a [`MetadataRecord`](crate::MetadataRecord)
/// that carries validation state. The declaration order is the order used
/// for error navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Field {
    PackageName,
    Version,
    PackageRevision,
    Section,
    Priority,
    Maintainer,
    StandardsVersion,
    Summary,
    Description,
    Licence,
    Copyright,
    ItemToPackage,
    InstallTo,
    Depends,
    Recommends,
    Suggests,
    Conflicts,
    Components,
}

impl Field {
    pub const COUNT: usize = 18;

    pub const ALL: [Field; Field::COUNT] = [
        Field::PackageName,
        Field::Version,
        Field::PackageRevision,
        Field::Section,
        Field::Priority,
        Field::Maintainer,
        Field::StandardsVersion,
        Field::Summary,
        Field::Description,
        Field::Licence,
        Field::Copyright,
        Field::ItemToPackage,
        Field::InstallTo,
        Field::Depends,
        Field::Recommends,
        Field::Suggests,
        Field::Conflicts,
        Field::Components,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Human-readable name used when reporting errors.
    pub fn label(self) -> &'static str {
        match self {
            Field::PackageName => "Package name",
            Field::Version => "Version",
            Field::PackageRevision => "Package version",
            Field::Section => "Section",
            Field::Priority => "Priority",
            Field::Maintainer => "Maintainer",
            Field::StandardsVersion => "Standards version",
            Field::Summary => "Summary",
            Field::Description => "Description",
            Field::Licence => "Licence",
            Field::Copyright => "Copyright",
            Field::ItemToPackage => "Item to install",
            Field::InstallTo => "Install to",
            Field::Depends => "Depends",
            Field::Recommends => "Recommends",
            Field::Suggests => "Suggests",
            Field::Conflicts => "Conflicts",
            Field::Components => "Components",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error message slot for every [`Field`], plus a running count of the
/// occupied slots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    slots: [Option<String>; Field::COUNT],
    count: usize,
}

impl FieldErrors {
    pub fn set(&mut self, field: Field, message: impl Into<String>) {
        let slot = &mut self.slots[field.index()];
        if slot.is_none() {
            self.count += 1;
        }
        *slot = Some(message.into());
    }

    pub fn clear(&mut self, field: Field) {
        if self.slots[field.index()].take().is_some() {
            self.count -= 1;
        }
    }

    /// Store `result` as the state of `field`: an `Err` message sets the slot,
    /// `Ok` clears it.
    pub fn apply<E: fmt::Display>(&mut self, field: Field, result: Result<(), E>) {
        match result {
            Ok(()) => self.clear(field),
            Err(e) => self.set(field, e.to_string()),
        }
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.slots[field.index()].as_deref()
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn first(&self) -> Option<Field> {
        self.cycle_from(Field::ALL[0]).next().map(|(f, _)| f)
    }

    /// The next field with an error after `current`, wrapping to the start.
    /// Returns `current` itself when it is the only field in error.
    pub fn next(&self, current: Field) -> Option<Field> {
        if self.count == 0 {
            return None;
        }
        let start = Field::ALL[(current.index() + 1) % Field::COUNT];
        self.cycle_from(start).next().map(|(f, _)| f)
    }

    /// Lazily visit every field in error exactly once, starting at `start`
    /// and wrapping past the last field.
    pub fn cycle_from(&self, start: Field) -> impl Iterator<Item = (Field, &str)> + '_ {
        let offset = start.index();
        (0..Field::COUNT).filter_map(move |i| {
            let field = Field::ALL[(offset + i) % Field::COUNT];
            self.get(field).map(|msg| (field, msg))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> + '_ {
        self.cycle_from(Field::ALL[0])
    }
}
