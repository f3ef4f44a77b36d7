//! Outcome of scanning one content source.

use super::template::{LocalizationLocator, TemplateInfo};
use crate::component::{CapabilityId, ComponentInstance};

/// Everything found in one content source.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Mount point the results came from. Empty for [`ScanResult::empty`].
    pub mount_point_uri: String,

    /// Templates, in generator order then discovery order.
    pub templates: Vec<TemplateInfo>,

    /// Localization files, in the same order.
    pub localizations: Vec<LocalizationLocator>,

    /// One entry per capability implemented by each discovered component.
    pub components: Vec<(CapabilityId, ComponentInstance)>,
}

impl ScanResult {
    /// The result of scanning nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the scan found any components.
    pub fn has_components(&self) -> bool {
        !self.components.is_empty()
    }
}
