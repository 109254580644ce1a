use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum::{EnumCount, IntoStaticStr};

use crate::{
    account::is_valid_account_name,
    asset::is_valid_symbol,
    block::BlockId,
    object::{AccountId, AssetId},
    transaction::verify::VerificationError,
};

/// Condition evaluated against the chain state.
///
/// The variant order is consensus relevant: a predicate is only accepted
/// when its opcode is below the `max_predicate_opcode` chain parameter.
/// New kinds must be appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr, EnumCount)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Predicate {
    AccountNameEqualsLiteral { account_id: AccountId, name: String },
    AssetSymbolEqualsLiteral { asset_id: AssetId, symbol: String },
    // Holds as long as the block is one of the last 65536 of the current chain
    BlockIdMatches { id: BlockId },
}

impl Predicate {
    pub fn opcode(&self) -> u8 {
        match self {
            Predicate::AccountNameEqualsLiteral { .. } => 0,
            Predicate::AssetSymbolEqualsLiteral { .. } => 1,
            Predicate::BlockIdMatches { .. } => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        self.into()
    }

    pub fn validate(&self) -> Result<(), VerificationError> {
        match self {
            Predicate::AccountNameEqualsLiteral { name, .. } => {
                if !is_valid_account_name(name) {
                    return Err(VerificationError::InvalidAccountName(name.clone()));
                }
            }
            Predicate::AssetSymbolEqualsLiteral { symbol, .. } => {
                if !is_valid_symbol(symbol) {
                    return Err(VerificationError::InvalidSymbol(symbol.clone()));
                }
            }
            Predicate::BlockIdMatches { .. } => {}
        }
        Ok(())
    }
}

// Makes a transaction conditional on facts of the chain state.
// Applying it never changes anything.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AssertPayload {
    fee_paying_account: AccountId,
    predicates: Vec<Predicate>,
    required_auths: BTreeSet<AccountId>,
}

impl AssertPayload {
    pub fn new(fee_paying_account: AccountId, predicates: Vec<Predicate>) -> Self {
        Self {
            fee_paying_account,
            predicates,
            required_auths: BTreeSet::new(),
        }
    }

    pub fn with_required_auths(mut self, required_auths: BTreeSet<AccountId>) -> Self {
        self.required_auths = required_auths;
        self
    }

    #[inline]
    pub fn get_fee_paying_account(&self) -> AccountId {
        self.fee_paying_account
    }

    #[inline]
    pub fn get_predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    #[inline]
    pub fn get_required_auths(&self) -> &BTreeSet<AccountId> {
        &self.required_auths
    }

    pub fn validate(&self) -> Result<(), VerificationError> {
        if self.predicates.is_empty() {
            return Err(VerificationError::NoPredicates);
        }
        for predicate in &self.predicates {
            predicate.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcodes_follow_declaration_order() {
        let predicates = [
            Predicate::AccountNameEqualsLiteral {
                account_id: AccountId::new(0),
                name: "alice".to_string(),
            },
            Predicate::AssetSymbolEqualsLiteral {
                asset_id: AssetId::new(0),
                symbol: "CORE".to_string(),
            },
            Predicate::BlockIdMatches { id: BlockId::zero() },
        ];
        for (i, p) in predicates.iter().enumerate() {
            assert_eq!(p.opcode() as usize, i);
        }
        assert_eq!(Predicate::COUNT, predicates.len());
        assert_eq!(predicates[2].name(), "block_id_matches");
    }

    #[test]
    fn test_empty_assert_is_invalid() {
        let payload = AssertPayload::new(AccountId::new(5), Vec::new());
        assert_eq!(payload.validate(), Err(VerificationError::NoPredicates));
    }

    #[test]
    fn test_predicate_literals_are_validated() {
        let payload = AssertPayload::new(
            AccountId::new(5),
            vec![Predicate::AssetSymbolEqualsLiteral {
                asset_id: AssetId::new(1),
                symbol: "lower".to_string(),
            }],
        );
        assert!(matches!(payload.validate(), Err(VerificationError::InvalidSymbol(_))));
    }
}
