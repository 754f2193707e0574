//! # schematic-core
//!
//! The relational schema data model shared by the schematic tools.
//!
//! A schema is described as plain, immutable values: [`Table`]s own their
//! [`Column`]s, keys, [`DatabaseIndex`]es, [`CheckConstraint`]s and
//! [`Trigger`]s, and sit next to [`View`]s, [`Sequence`]s, [`Synonym`]s and
//! [`Routine`]s. Relationships between tables are expressed through
//! [`Identifier`]s rather than references, so cyclic foreign key graphs are
//! representable without ownership cycles.
//!
//! ```rust
//! use schematic_core::{Column, DataType, DatabaseKey, RelationalKey, Table};
//!
//! let users = Table::new("users")
//!     .column(Column::new("id", DataType::new("integer")).not_null())
//!     .column(Column::new("name", DataType::new("text")))
//!     .primary_key(DatabaseKey::primary(["id"]).named("pk_users"));
//!
//! let orders = Table::new("orders")
//!     .column(Column::new("id", DataType::new("integer")).not_null())
//!     .column(Column::new("user_id", DataType::new("integer")))
//!     .foreign_key(RelationalKey::new(
//!         "orders",
//!         DatabaseKey::foreign(["user_id"]).named("fk_orders_users"),
//!         "users",
//!         DatabaseKey::primary(["id"]),
//!     ));
//!
//! assert_eq!(orders.parent_keys[0].parent_table, users.name);
//! ```

mod column;
mod constraint;
mod identifier;
mod index;
mod objects;
mod table;
mod trigger;

pub use column::{AutoIncrement, Column, DataType, NumericPrecision};
pub use constraint::{CheckConstraint, DatabaseKey, KeyType, ReferentialAction, RelationalKey};
pub use identifier::{Identifier, IdentifierDefaults, IdentifierError};
pub use index::{DatabaseIndex, IndexColumn, IndexColumnOrder};
pub use objects::{Routine, Sequence, Synonym, View};
pub use table::Table;
pub use trigger::{Trigger, TriggerEvent, TriggerTiming};
