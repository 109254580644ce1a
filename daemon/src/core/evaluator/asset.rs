// Asset creation and backing asset changes
//
// Market issued assets form a backing graph: every bitasset points to the
// asset it is collateralized by. Since the backing rules hard fork the graph
// is at most two levels deep, has no cycles, and committee assets are
// ultimately backed by the core asset. Older blocks created configurations
// breaking these rules; they are replayed with a warning.

use log::{debug, warn};
use meridian_common::{
    config::{COMMITTEE_ACCOUNT, CORE_ASSET},
    object::{AssetId, BitassetDataId},
    transaction::{
        verify::VerificationError, AssetCreatePayload, AssetUpdateBitassetPayload,
        OperationResult,
    },
};

use super::{EvalContext, Evaluator};
use crate::core::{
    hard_fork::HardForkFeature,
    state::{AccountObject, AssetObject, BitassetDataObject, ObjectStore},
};

fn rule_violation(message: impl Into<String>) -> VerificationError {
    VerificationError::AssetRuleViolation(message.into())
}

fn get_bitasset_data<'a>(
    store: &'a ObjectStore,
    asset: &AssetObject,
) -> Result<&'a BitassetDataObject, VerificationError> {
    let data_id = asset.bitasset_data_id.ok_or_else(|| {
        rule_violation(format!("asset {} is not market issued", asset.symbol))
    })?;
    store.get(data_id)
}

// Asset backing `asset`, only defined for market issued assets
fn get_backing_asset<'a>(
    store: &'a ObjectStore,
    asset: &AssetObject,
) -> Result<&'a AssetObject, VerificationError> {
    let data = get_bitasset_data(store, asset)?;
    store.get(data.options.short_backing_asset)
}

// Why `child` cannot stay backed by the asset being updated once that asset
// is backed by `new_backing`
fn backing_violation(child: &AssetObject, new_backing: &AssetObject) -> Option<String> {
    if child.id == new_backing.id {
        Some(format!(
            "{} is backed by {}, which cannot be backed by it in turn",
            child.symbol, new_backing.symbol
        ))
    } else if child.issuer == COMMITTEE_ACCOUNT {
        Some(format!(
            "committee asset {} would no longer be backed by the core asset",
            child.symbol
        ))
    } else if new_backing.is_market_issued() {
        Some(format!(
            "{} would be backed by a bitasset backed by the bitasset {}",
            child.symbol, new_backing.symbol
        ))
    } else {
        None
    }
}

/// Check that changing the backing asset of `asset_to_update` to
/// `new_backing` does not break any bitasset currently backed by it.
///
/// Before the backing rules hard fork the same conditions are only logged,
/// the change is accepted as it was on the historical chain. Returns how
/// many children were logged that way.
pub fn check_children_of_bitasset(
    store: &ObjectStore,
    asset_to_update: AssetId,
    new_backing: &AssetObject,
    strict: bool,
    head_block_num: u32,
) -> Result<usize, VerificationError> {
    if new_backing.id == CORE_ASSET {
        return Ok(0);
    }

    let mut tolerated = 0;
    for data_id in store.indexes().bitassets_backed_by(asset_to_update) {
        let data = store.get::<BitassetDataObject>(data_id)?;
        let child = store.get::<AssetObject>(data.asset_id)?;

        let Some(reason) = backing_violation(child, new_backing) else {
            continue;
        };
        if strict {
            return Err(rule_violation(reason));
        }
        warn!(
            "Before the backing rules hard fork, {}, block {}",
            reason, head_block_num
        );
        tolerated += 1;
    }
    Ok(tolerated)
}

#[derive(Default)]
pub struct AssetCreateEvaluator;

impl Evaluator for AssetCreateEvaluator {
    type Payload = AssetCreatePayload;

    fn evaluate(
        &mut self,
        ctx: &EvalContext,
        store: &ObjectStore,
        op: &AssetCreatePayload,
    ) -> Result<(), VerificationError> {
        let options = op.get_common_options();
        let max_authorities = ctx.parameters.maximum_asset_whitelist_authorities as usize;
        if options.whitelist_authorities.len() > max_authorities
            || options.blacklist_authorities.len() > max_authorities
        {
            return Err(rule_violation(format!(
                "at most {} whitelist or blacklist authorities are allowed",
                max_authorities
            )));
        }

        if !ctx.is_active(HardForkFeature::AssetExtensions) && !options.extensions.is_empty() {
            return Err(rule_violation(
                "reward percent and market fee sharing whitelist are not enabled yet",
            ));
        }

        for authority in options
            .whitelist_authorities
            .iter()
            .chain(options.blacklist_authorities.iter())
        {
            store.get::<AccountObject>(*authority)?;
        }

        let symbol = op.get_symbol();
        if store.indexes().find_asset_by_symbol(symbol).is_some() {
            return Err(rule_violation(format!("symbol {} is already taken", symbol)));
        }

        if ctx.is_active(HardForkFeature::AssetNamespace) {
            if let Some(dot) = symbol.rfind('.') {
                let prefix = &symbol[..dot];
                let prefix_id = store.indexes().find_asset_by_symbol(prefix).ok_or_else(|| {
                    rule_violation(format!(
                        "{} may only be created by the issuer of {}, which does not exist",
                        symbol, prefix
                    ))
                })?;
                let prefix_asset = store.get::<AssetObject>(prefix_id)?;
                if prefix_asset.issuer != op.get_issuer() {
                    return Err(rule_violation(format!(
                        "{} may only be created by {}, the issuer of {}",
                        symbol, prefix_asset.issuer, prefix
                    )));
                }
            }
        } else if symbol.contains('.') {
            warn!("Asset {} has a name which requires the namespace hard fork", symbol);
        }

        if let Some(bitasset_opts) = op.get_bitasset_opts() {
            let backing = store.get::<AssetObject>(bitasset_opts.short_backing_asset)?;
            let ultimate_backing = if backing.is_market_issued() {
                let backing_backing = get_backing_asset(store, backing)?;
                if backing_backing.is_market_issued() {
                    return Err(rule_violation(
                        "a bitasset cannot be backed by a bitasset backed by a bitasset",
                    ));
                }
                backing_backing.id
            } else {
                backing.id
            };
            if op.get_issuer() == COMMITTEE_ACCOUNT && ultimate_backing != CORE_ASSET {
                return Err(rule_violation(
                    "a committee market asset must be backed by the core asset",
                ));
            }

            let block_interval = ctx.parameters.block_interval as u32;
            if bitasset_opts.feed_lifetime_sec <= block_interval
                || bitasset_opts.force_settlement_delay_sec <= block_interval
            {
                return Err(rule_violation(
                    "feed lifetime and force settlement delay must exceed the block interval",
                ));
            }

            if op.is_prediction_market() && op.get_precision() != backing.precision {
                return Err(rule_violation(format!(
                    "a prediction market must have the precision of its backing asset ({})",
                    backing.precision
                )));
            }
        } else if op.is_prediction_market() {
            return Err(rule_violation("a prediction market must be market issued"));
        }

        Ok(())
    }

    fn apply(
        &mut self,
        _: &EvalContext,
        store: &mut ObjectStore,
        op: &AssetCreatePayload,
    ) -> Result<OperationResult, VerificationError> {
        let asset_id = store.next_id::<AssetObject>();
        let bitasset_data_id = op.get_bitasset_opts().map(|options| {
            store.create(|id| BitassetDataObject {
                id,
                asset_id,
                options: options.clone(),
                is_prediction_market: op.is_prediction_market(),
            })
        });

        let created = store.create(|id| AssetObject {
            id,
            symbol: op.get_symbol().to_string(),
            issuer: op.get_issuer(),
            precision: op.get_precision(),
            options: op.get_common_options().clone(),
            bitasset_data_id,
        });
        debug!("created asset {} as {}", op.get_symbol(), created);
        Ok(OperationResult::Created(created.into()))
    }
}

#[derive(Default)]
pub struct AssetUpdateBitassetEvaluator {
    bitasset_data_id: Option<BitassetDataId>,
}

impl Evaluator for AssetUpdateBitassetEvaluator {
    type Payload = AssetUpdateBitassetPayload;

    fn evaluate(
        &mut self,
        ctx: &EvalContext,
        store: &ObjectStore,
        op: &AssetUpdateBitassetPayload,
    ) -> Result<(), VerificationError> {
        let asset = store.get::<AssetObject>(op.get_asset_to_update())?;
        let current = get_bitasset_data(store, asset)?;
        if op.get_issuer() != asset.issuer {
            return Err(VerificationError::Unauthorized(op.get_issuer()));
        }

        // Rules are switched at the maintenance following the activation
        let strict = ctx.hard_forks.is_active(
            HardForkFeature::BitassetBackingRules,
            ctx.next_maintenance_time,
        );

        let new_options = op.get_new_options();
        if new_options.short_backing_asset != current.options.short_backing_asset {
            if current.is_prediction_market {
                return Err(rule_violation(
                    "the backing asset of a prediction market cannot be changed",
                ));
            }

            let new_backing = store.get::<AssetObject>(new_options.short_backing_asset)?;
            if strict {
                if new_backing.id == asset.id {
                    return Err(rule_violation(format!(
                        "{} cannot be backed by itself",
                        asset.symbol
                    )));
                }

                if asset.issuer == COMMITTEE_ACCOUNT {
                    if new_backing.is_market_issued() {
                        if get_backing_asset(store, new_backing)?.id != CORE_ASSET {
                            return Err(rule_violation(
                                "a committee market asset must be backed by the core asset",
                            ));
                        }
                    } else if new_backing.id != CORE_ASSET {
                        return Err(rule_violation(
                            "a committee market asset must be backed by the core asset",
                        ));
                    }
                }

                if new_backing.id != CORE_ASSET && new_backing.is_market_issued() {
                    let backing_backing = get_backing_asset(store, new_backing)?;
                    if backing_backing.id != CORE_ASSET && backing_backing.is_market_issued() {
                        return Err(rule_violation(
                            "a bitasset cannot be backed by a bitasset backed by a bitasset",
                        ));
                    }
                }
            }

            check_children_of_bitasset(
                store,
                asset.id,
                new_backing,
                strict,
                ctx.head_block_num,
            )?;
        }

        if strict {
            let block_interval = ctx.parameters.block_interval as u32;
            if new_options.feed_lifetime_sec <= block_interval
                || new_options.force_settlement_delay_sec <= block_interval
            {
                return Err(rule_violation(
                    "feed lifetime and force settlement delay must exceed the block interval",
                ));
            }
        }

        self.bitasset_data_id = Some(current.id);
        Ok(())
    }

    // Margin calls triggered by the new options are processed by the market engine
    fn apply(
        &mut self,
        _: &EvalContext,
        store: &mut ObjectStore,
        op: &AssetUpdateBitassetPayload,
    ) -> Result<OperationResult, VerificationError> {
        let data_id = self
            .bitasset_data_id
            .ok_or_else(|| VerificationError::NotFound(op.get_asset_to_update().into()))?;
        store.modify::<BitassetDataObject>(data_id, |data| {
            data.options = op.get_new_options().clone();
        })?;
        Ok(OperationResult::Void)
    }
}
