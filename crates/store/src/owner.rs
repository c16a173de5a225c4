use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

/// The three-valued ownership lattice over a directory's contributing
/// files: no file has been seen yet, every file seen so far shares one
/// uid/gid, or at least two distinct values have been seen.
///
/// `Unseen < Single(v) < Multiple`. [`Owner::join`] is the lattice join:
/// commutative, associative, and idempotent, so merging partial
/// aggregates in any order yields the same result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Owner {
    #[default]
    Unseen,
    Single(u32),
    Multiple,
}

impl Owner {
    /// Lattice join: `unseen ⊔ x = x`, `v ⊔ v = v`, `v ⊔ w = Multiple`
    /// for `v ≠ w`, `Multiple ⊔ anything = Multiple`.
    #[must_use]
    pub fn join(self, other: Owner) -> Owner {
        match (self, other) {
            (Owner::Unseen, x) | (x, Owner::Unseen) => x,
            (Owner::Multiple, _) | (_, Owner::Multiple) => Owner::Multiple,
            (Owner::Single(a), Owner::Single(b)) if a == b => Owner::Single(a),
            (Owner::Single(_), Owner::Single(_)) => Owner::Multiple,
        }
    }

    /// Folds `Unseen` with every value in `values` via [`Owner::join`].
    pub fn join_all(values: impl IntoIterator<Item = Owner>) -> Owner {
        values.into_iter().fold(Owner::Unseen, Owner::join)
    }

    /// Merges a raw observed uid/gid into the current state.
    #[must_use]
    pub fn observe(self, value: u32) -> Owner {
        self.join(Owner::Single(value))
    }
}

/// Persistent encoding: `-1` for *unseen*, `NULL` for *multiple*,
/// otherwise the single value. One-to-one per spec.md §9's "Lattice
/// encoding" design note.
impl ToSql for Owner {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Owner::Unseen => Ok(ToSqlOutput::from(-1_i64)),
            Owner::Single(v) => Ok(ToSqlOutput::from(i64::from(*v))),
            Owner::Multiple => Ok(ToSqlOutput::from(rusqlite::types::Null)),
        }
    }
}

impl FromSql for Owner {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Null => Ok(Owner::Multiple),
            ValueRef::Integer(-1) => Ok(Owner::Unseen),
            ValueRef::Integer(v) => u32::try_from(v)
                .map(Owner::Single)
                .map_err(|_| FromSqlError::OutOfRange(v)),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}
