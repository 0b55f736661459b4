//! Statically declared field tables for record types.
//!
//! A record is a struct whose fields are filled from result columns and read
//! as `#{Field}` parameters. Instead of inspecting the struct at runtime, each
//! record type lists its fields once through [`Record::fields`], usually via
//! the [`record!`](crate::record!) macro:
//!
//! ```
//! use chrono::NaiveDateTime;
//! use sqlx_osm::record;
//!
//! #[derive(Debug, Default)]
//! struct Audit {
//!     created_by: String,
//! }
//!
//! record! {
//!     Audit {
//!         created_by: String => "CreatedBy",
//!     }
//! }
//!
//! #[derive(Debug, Default)]
//! struct User {
//!     id: i64,
//!     email: String,
//!     create_time: Option<NaiveDateTime>,
//!     audit: Audit,
//! }
//!
//! record! {
//!     User {
//!         id: i64 => "ID",
//!         email: String => "Email" ["mail"],
//!         create_time: Option<NaiveDateTime> => "CreateTime",
//!     }
//!     embed {
//!         audit: Audit,
//!     }
//! }
//! ```
//!
//! The string after `=>` is the exported field name, matched against the
//! camel-case form of a column name and used by `#{...}` placeholders. The
//! optional bracketed string is a db tag: a column with exactly that name
//! maps to the field before any name conversion is tried. Fields of embedded
//! records are promoted into the outer record for both directions.

use crate::convert::{convert, ConversionError, FromColumn};
use crate::names::to_field_names;
use crate::value::Value;

/// Describes one declared field of a record.
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    /// Position passed back to [`Record::slot`]
    pub index: usize,
    /// Exported field name
    pub name: &'static str,
    /// Explicit column name override
    pub tag: Option<&'static str>,
    /// Field table of an embedded record whose fields are promoted
    pub embedded: Option<fn() -> Vec<FieldDescriptor>>,
    /// Whether the field type can hold NULL itself
    pub optional: bool,
}

impl FieldDescriptor {
    pub const fn column(
        index: usize,
        name: &'static str,
        tag: Option<&'static str>,
        optional: bool,
    ) -> Self {
        Self {
            index,
            name,
            tag,
            embedded: None,
            optional,
        }
    }

    pub const fn embedded(
        index: usize,
        name: &'static str,
        fields: fn() -> Vec<FieldDescriptor>,
    ) -> Self {
        Self {
            index,
            name,
            tag: None,
            embedded: Some(fields),
            optional: false,
        }
    }
}

/// A mutable handle on one field of a record.
pub enum Slot<'a> {
    Column(&'a mut dyn ColumnSlot),
    Embedded(&'a mut dyn Record),
}

/// A record type whose fields can be filled from result columns.
pub trait Record {
    /// The record's declared fields, in declaration order.
    fn fields() -> Vec<FieldDescriptor>
    where
        Self: Sized;

    /// The field at `index` as given by [`FieldDescriptor::index`].
    fn slot(&mut self, index: usize) -> Option<Slot<'_>>;
}

/// A single field that can receive a scanned value.
pub trait ColumnSlot {
    fn assign(&mut self, value: Value) -> Result<(), ConversionError>;

    /// Stores the zero value.
    fn reset(&mut self);
}

impl<T: FromColumn> ColumnSlot for T {
    fn assign(&mut self, value: Value) -> Result<(), ConversionError> {
        *self = convert(value)?;
        Ok(())
    }

    fn reset(&mut self) {
        *self = T::default();
    }
}

#[derive(Debug, Clone)]
struct FieldEntry {
    path: Vec<usize>,
    name: &'static str,
    tag: Option<&'static str>,
}

/// The flattened field table of a record type.
///
/// Embedded records are expanded depth-first. When two fields share a name,
/// the shallower one wins, and between equally deep fields the first declared.
#[derive(Debug, Clone)]
pub struct FieldTable {
    entries: Vec<FieldEntry>,
}

impl FieldTable {
    pub fn of<R: Record>() -> Self {
        let mut entries = Vec::new();
        flatten(R::fields(), &mut Vec::new(), &mut entries);
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finds the field a column maps to, as a path of slot indexes.
    ///
    /// Tries the db tag first, then the plain camel-case candidate, then the
    /// initialism-aware candidate. `None` means the column is discarded.
    pub fn resolve(&self, column: &str) -> Option<&[usize]> {
        if let Some(entry) = self.best(|e| e.tag == Some(column)) {
            return Some(&entry.path);
        }
        let names = to_field_names(column);
        self.best(|e| e.name == names.plain)
            .or_else(|| self.best(|e| e.name == names.initialism))
            .map(|entry| entry.path.as_slice())
    }

    fn best(&self, matches: impl Fn(&FieldEntry) -> bool) -> Option<&FieldEntry> {
        self.entries
            .iter()
            .filter(|e| matches(e))
            .min_by_key(|e| e.path.len())
    }
}

fn flatten(fields: Vec<FieldDescriptor>, prefix: &mut Vec<usize>, out: &mut Vec<FieldEntry>) {
    for field in fields {
        prefix.push(field.index);
        match field.embedded {
            Some(inner) => flatten(inner(), prefix, out),
            None => out.push(FieldEntry {
                path: prefix.clone(),
                name: field.name,
                tag: field.tag,
            }),
        }
        prefix.pop();
    }
}

/// Follows a slot path produced by [`FieldTable::resolve`] down to a column slot.
pub fn column_at<'r>(record: &'r mut dyn Record, path: &[usize]) -> Option<&'r mut dyn ColumnSlot> {
    let (&first, rest) = path.split_first()?;
    match (record.slot(first)?, rest.is_empty()) {
        (Slot::Column(slot), true) => Some(slot),
        (Slot::Embedded(inner), false) => column_at(inner, rest),
        _ => None,
    }
}

/// Implements [`Record`] and [`ToParams`](crate::params::ToParams) for a struct.
///
/// Each column field needs a type implementing both
/// [`FromColumn`](crate::convert::FromColumn) and [`ToParam`](crate::params::ToParam);
/// each embedded field a type that is itself registered with `record!`.
/// See the [module documentation](crate::record) for the syntax.
#[macro_export]
macro_rules! record {
    (@tag) => {
        ::std::option::Option::None
    };
    (@tag $tag:literal) => {
        ::std::option::Option::Some($tag)
    };
    (
        $ty:ident {
            $( $field:ident : $fty:ty => $name:literal $( [$tag:literal] )? ),* $(,)?
        }
        $( embed { $( $efield:ident : $ety:ty ),* $(,)? } )?
    ) => {
        impl $crate::record::Record for $ty {
            fn fields() -> ::std::vec::Vec<$crate::record::FieldDescriptor> {
                let mut fields = ::std::vec::Vec::new();
                $(
                    fields.push($crate::record::FieldDescriptor::column(
                        fields.len(),
                        $name,
                        $crate::record!(@tag $($tag)?),
                        <$fty as $crate::convert::FromColumn>::NULLABLE,
                    ));
                )*
                $($(
                    fields.push($crate::record::FieldDescriptor::embedded(
                        fields.len(),
                        ::std::stringify!($efield),
                        <$ety as $crate::record::Record>::fields,
                    ));
                )*)?
                fields
            }

            #[allow(unused_mut, unused_assignments)]
            fn slot(&mut self, index: usize) -> ::std::option::Option<$crate::record::Slot<'_>> {
                let mut next = 0usize;
                $(
                    if index == next {
                        return ::std::option::Option::Some($crate::record::Slot::Column(&mut self.$field));
                    }
                    next += 1;
                )*
                $($(
                    if index == next {
                        return ::std::option::Option::Some($crate::record::Slot::Embedded(&mut self.$efield));
                    }
                    next += 1;
                )*)?
                ::std::option::Option::None
            }
        }

        impl $crate::params::ToParams for $ty {
            fn param(&self, name: &str) -> ::std::option::Option<$crate::params::Param> {
                match name {
                    $( $name => ::std::option::Option::Some($crate::params::ToParam::to_param(&self.$field)), )*
                    _ => {
                        $($(
                            if let ::std::option::Option::Some(param) =
                                $crate::params::ToParams::param(&self.$efield, name)
                            {
                                return ::std::option::Option::Some(param);
                            }
                        )*)?
                        ::std::option::Option::None
                    }
                }
            }
        }
    };
}
