use hoist_platform::PlatformId;

use crate::release::Asset;

/// Pick the first asset, in feed order, whose name matches the platform rule.
///
/// There is no fallback: a release without a matching asset yields `None`
/// even if other assets exist.
#[must_use]
pub fn select_asset(assets: &[Asset], platform: PlatformId) -> Option<&Asset> {
    assets
        .iter()
        .find(|asset| platform.matches_asset(&asset.name))
}
