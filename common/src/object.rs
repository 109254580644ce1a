// Object identifiers
//
// Every record of the chain state is addressed by its type and a sequence
// number assigned by the store. Records never hold references to each
// other, only these ids.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use strum::{Display as StrumDisplay, EnumCount};

/// Kinds of records kept in the chain state
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    StrumDisplay,
    EnumCount,
)]
#[strum(serialize_all = "snake_case")]
pub enum ObjectType {
    Account,
    Asset,
    Balance,
    AccountBalance,
    BitassetData,
    TransactionHistory,
    BlockSummary,
    DynamicGlobalProperty,
}

impl ObjectType {
    // (space, type) pair used in the dotted representation.
    // Space 1 holds protocol objects, space 2 implementation objects.
    pub const fn space_and_type(&self) -> (u8, u8) {
        match self {
            ObjectType::Account => (1, 2),
            ObjectType::Asset => (1, 3),
            ObjectType::Balance => (1, 15),
            ObjectType::DynamicGlobalProperty => (2, 1),
            ObjectType::BitassetData => (2, 4),
            ObjectType::AccountBalance => (2, 5),
            ObjectType::TransactionHistory => (2, 7),
            ObjectType::BlockSummary => (2, 8),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId {
    pub kind: ObjectType,
    pub instance: u64,
}

impl ObjectId {
    pub const fn new(kind: ObjectType, instance: u64) -> Self {
        Self { kind, instance }
    }
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let (space, kind) = self.kind.space_and_type();
        write!(f, "{}.{}.{}", space, kind, self.instance)
    }
}

/// A strongly typed id for one kind of record
pub trait TypedId: Copy + Into<ObjectId> {
    const KIND: ObjectType;

    fn from_instance(instance: u64) -> Self;

    fn instance(&self) -> u64;
}

macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident, $kind:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(instance: u64) -> Self {
                Self(instance)
            }
        }

        impl TypedId for $name {
            const KIND: ObjectType = $kind;

            fn from_instance(instance: u64) -> Self {
                Self(instance)
            }

            fn instance(&self) -> u64 {
                self.0
            }
        }

        impl From<$name> for ObjectId {
            fn from(id: $name) -> Self {
                ObjectId::new($kind, id.0)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", ObjectId::from(*self))
            }
        }
    };
}

typed_id!(AccountId, ObjectType::Account);
typed_id!(AssetId, ObjectType::Asset);
typed_id!(
    /// Genesis or deposited balance owned by an address
    BalanceId,
    ObjectType::Balance
);
typed_id!(
    /// Per (account, asset) balance row
    AccountBalanceId,
    ObjectType::AccountBalance
);
typed_id!(BitassetDataId, ObjectType::BitassetData);
typed_id!(TransactionHistoryId, ObjectType::TransactionHistory);
typed_id!(BlockSummaryId, ObjectType::BlockSummary);
typed_id!(DynamicGlobalPropertyId, ObjectType::DynamicGlobalProperty);
