use crate::config::FunderProfile;
use crate::core::notification::EmailTemplate;
use crate::domain::model::Funder;
use crate::domain::ports::GrantRegistry;
use crate::utils::error::{ImportError, Result};
use std::collections::BTreeMap;

/// Everything that differs between funders: registry, ids and email template.
pub struct FunderStrategy {
    pub profile: FunderProfile,
    pub registry: Box<dyn GrantRegistry>,
    pub email: Option<EmailTemplate>,
}

pub struct FunderStrategies {
    default_funder: Funder,
    strategies: BTreeMap<Funder, FunderStrategy>,
}

impl FunderStrategies {
    pub fn new(default_funder: Funder) -> Self {
        Self {
            default_funder,
            strategies: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, funder: Funder, strategy: FunderStrategy) {
        self.strategies.insert(funder, strategy);
    }

    pub fn with(mut self, funder: Funder, strategy: FunderStrategy) -> Self {
        self.insert(funder, strategy);
        self
    }

    pub fn default_funder(&self) -> Funder {
        self.default_funder
    }

    /// 取得某列應使用的策略（列上的 funder 優先於 -f）
    pub fn for_row(&self, row_funder: Option<Funder>) -> Result<&FunderStrategy> {
        let funder = row_funder.unwrap_or(self.default_funder);
        self.strategies
            .get(&funder)
            .ok_or_else(|| ImportError::MissingConfigError {
                field: format!("funders.{}", funder),
            })
    }
}
