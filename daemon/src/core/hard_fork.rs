// Hard fork schedule
//
// Rules that changed over the life of the chain are selected by asking the
// schedule whether a feature is active at a given time, never by comparing
// timestamps inline. Both sides of each fork must keep working for replay.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, IntoEnumIterator, IntoStaticStr};

use meridian_common::{network::Network, time::TimestampSeconds};

use crate::config::get_hard_forks;

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
    Display,
    IntoStaticStr,
    EnumCount,
    EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum HardForkFeature {
    // Dotted symbols may only be created by the issuer of their prefix
    AssetNamespace,
    // Backing asset changes may not create cycles or chains of bitassets
    BitassetBackingRules,
    // Reward percent and market fee sharing asset extensions
    AssetExtensions,
}

/// Activation of one feature on one network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardFork {
    pub feature: HardForkFeature,
    pub activation: TimestampSeconds,
    pub changelog: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HardForkSchedule {
    activations: BTreeMap<HardForkFeature, TimestampSeconds>,
}

impl HardForkSchedule {
    pub fn for_network(network: &Network) -> Self {
        Self::custom(
            get_hard_forks(network)
                .iter()
                .map(|hf| (hf.feature, hf.activation)),
        )
    }

    // Features missing from `activations` never activate
    pub fn custom(activations: impl IntoIterator<Item = (HardForkFeature, TimestampSeconds)>) -> Self {
        Self {
            activations: activations.into_iter().collect(),
        }
    }

    pub fn all_active() -> Self {
        Self::custom(HardForkFeature::iter().map(|feature| (feature, 0)))
    }

    pub fn none_active() -> Self {
        Self::default()
    }

    pub fn with(mut self, feature: HardForkFeature, activation: TimestampSeconds) -> Self {
        self.activations.insert(feature, activation);
        self
    }

    pub fn activation(&self, feature: HardForkFeature) -> Option<TimestampSeconds> {
        self.activations.get(&feature).copied()
    }

    pub fn is_active(&self, feature: HardForkFeature, time: TimestampSeconds) -> bool {
        self.activation(feature)
            .is_some_and(|activation| time >= activation)
    }
}
