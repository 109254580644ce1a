// Transaction deduplication
//
// The fingerprint of every accepted transaction is kept until the
// transaction expires, so it cannot be included a second time. The history
// is indexed by expiration: pruning walks it from the oldest entry and stops
// at the first one still valid.

use log::{debug, trace};
use meridian_common::{
    crypto::Hash, object::TransactionHistoryId, time::TimestampSeconds,
    transaction::verify::VerificationError,
};

use super::state::{ObjectStore, TransactionHistoryObject};

pub fn is_known_transaction(store: &ObjectStore, trx_id: &Hash) -> bool {
    store.indexes().find_transaction(trx_id).is_some()
}

pub fn record_transaction(
    store: &mut ObjectStore,
    trx_id: Hash,
    expiration: TimestampSeconds,
) -> TransactionHistoryId {
    store.create(|id| TransactionHistoryObject {
        id,
        trx_id,
        expiration,
    })
}

/// Remove every history entry that expired strictly before `head_time`.
/// Returns how many were removed.
pub fn clear_expired_transactions(
    store: &mut ObjectStore,
    head_time: TimestampSeconds,
) -> Result<usize, VerificationError> {
    let mut removed = 0;
    while let Some((expiration, id)) = store.indexes().first_expiring_transaction() {
        if expiration >= head_time {
            break;
        }
        store.remove::<TransactionHistoryObject>(id)?;
        removed += 1;
    }

    if removed > 0 {
        debug!(
            "pruned {} expired transactions, {} left",
            removed,
            store.indexes().transactions_count()
        );
    } else {
        trace!("no expired transaction at {}", head_time);
    }
    Ok(removed)
}
