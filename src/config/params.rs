use std::convert::TryFrom;

use super::Config;
use crate::compare::{DiffParams, FuzzyPolicy, Params as CompareParams};
use crate::engine::Params as EngineParams;
use crate::error::ConfigError;
use crate::store::Params as StoreParams;

const DEFAULT_CHANNEL_TOLERANCE: u8 = 2;
const DEFAULT_MAX_DIFFERING_PIXELS: u64 = 0;

macro_rules! select_conf {
    ($config:ident, $base:ident, $field:ident) => {
        $config.$base.as_ref().and_then(|c| c.$field.clone())
    };
}

impl<'a> From<&'a Config> for CompareParams {
    fn from(config: &'a Config) -> CompareParams {
        let enabled = select_conf!(config, compare, fuzzy).unwrap_or(false);
        CompareParams {
            fuzzy: enabled.then(|| FuzzyPolicy {
                channel_tolerance: select_conf!(config, compare, channel_tolerance)
                    .unwrap_or(DEFAULT_CHANNEL_TOLERANCE),
                max_differing_pixels: select_conf!(config, compare, max_differing_pixels)
                    .unwrap_or(DEFAULT_MAX_DIFFERING_PIXELS),
            }),
        }
    }
}

impl<'a> From<&'a Config> for DiffParams {
    fn from(config: &'a Config) -> DiffParams {
        let defaults = DiffParams::default();
        DiffParams {
            mismatch_color: select_conf!(config, diff, mismatch_color)
                .unwrap_or(defaults.mismatch_color),
            missing_color: select_conf!(config, diff, missing_color)
                .unwrap_or(defaults.missing_color),
            dim_matching: select_conf!(config, diff, dim_matching).unwrap_or(defaults.dim_matching),
        }
    }
}

impl<'a> TryFrom<&'a Config> for StoreParams {
    type Error = ConfigError;

    fn try_from(config: &'a Config) -> Result<StoreParams, ConfigError> {
        Ok(StoreParams {
            reference_dir: config.reference_dir()?.to_owned(),
            scratch_dir: config.scratch_dir(),
        })
    }
}

impl<'a> TryFrom<&'a Config> for EngineParams {
    type Error = ConfigError;

    fn try_from(config: &'a Config) -> Result<EngineParams, ConfigError> {
        Ok(EngineParams {
            store: StoreParams::try_from(config)?,
            compare: config.param(),
            diff: config.param(),
            settle_timeout: config.settle_timeout()?,
        })
    }
}
