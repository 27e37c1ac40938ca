// ── Sync plan ──
//
// What a run replicates. Built once from static configuration and never
// re-evaluated mid-run.

use std::collections::BTreeMap;

use nebula_api::{GravitySelector, ImportSelector};

use crate::filter::{FilterError, FilterSpec};

/// Top-level sections of the appliance configuration document.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::IntoStaticStr,
    strum::EnumIter,
    strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    Dns,
    Dhcp,
    Ntp,
    Resolver,
    Database,
    Misc,
    Debug,
}

impl Category {
    /// Key of this category in the configuration document.
    pub fn key(self) -> &'static str {
        self.into()
    }
}

/// Per-category switch plus an optional field filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySetting {
    pub enabled: bool,
    pub filter: Option<FilterSpec>,
}

impl CategorySetting {
    /// Build from raw include/exclude lists, rejecting both at once.
    pub fn new(
        enabled: bool,
        include: Option<Vec<String>>,
        exclude: Option<Vec<String>>,
    ) -> Result<Self, FilterError> {
        Ok(Self {
            enabled,
            filter: FilterSpec::from_lists(include, exclude)?,
        })
    }

    pub fn enabled() -> Self {
        Self {
            enabled: true,
            filter: None,
        }
    }
}

/// Non-JSON data moved through the teleporter bundle. All-or-nothing per flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GravitySettings {
    pub dhcp_leases: bool,
    pub tables: GravitySelector,
}

impl GravitySettings {
    pub fn any(&self) -> bool {
        self.dhcp_leases || self.tables.any()
    }

    /// Import selector carrying exactly these flags, or `None` if nothing is
    /// selected. JSON config is never part of it.
    pub fn selector(&self) -> Option<ImportSelector> {
        self.any().then_some(ImportSelector {
            config: false,
            dhcp_leases: self.dhcp_leases,
            gravity: self.tables,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display)]
pub enum SyncMode {
    /// Whole teleporter bundle, everything applied.
    #[default]
    Full,
    /// Per-category JSON patch plus selected gravity data.
    Selective,
}

/// Everything the synchronizer needs to know about what to move.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    pub mode: SyncMode,
    /// Trigger a gravity rebuild on each replica after applying changes.
    pub run_gravity: bool,
    pub categories: BTreeMap<Category, CategorySetting>,
    pub gravity: GravitySettings,
}

impl SyncPlan {
    pub fn full() -> Self {
        Self::default()
    }

    pub fn selective() -> Self {
        Self {
            mode: SyncMode::Selective,
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: Category, setting: CategorySetting) -> Self {
        self.categories.insert(category, setting);
        self
    }

    pub fn with_gravity(mut self, gravity: GravitySettings) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_run_gravity(mut self, run_gravity: bool) -> Self {
        self.run_gravity = run_gravity;
        self
    }

    /// Enabled categories in document order.
    pub fn enabled_categories(&self) -> impl Iterator<Item = (Category, &CategorySetting)> {
        self.categories
            .iter()
            .filter(|(_, setting)| setting.enabled)
            .map(|(category, setting)| (*category, setting))
    }
}
