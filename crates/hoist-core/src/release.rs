use serde::Deserialize;

const DEFAULT_NOTES: &str = "No release notes available";

/// One downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Asset {
    pub name: String,
    #[serde(rename = "browser_download_url")]
    pub download_url: String,
}

/// Latest release as described by the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    pub tag: String,
    pub assets: Vec<Asset>,
    pub notes: String,
}

#[derive(Deserialize)]
struct RawRelease {
    tag_name: String,
    #[serde(default)]
    assets: Vec<Asset>,
    #[serde(default)]
    body: Option<String>,
}

impl From<RawRelease> for ReleaseInfo {
    fn from(raw: RawRelease) -> Self {
        Self {
            tag: raw.tag_name,
            assets: raw.assets,
            notes: raw.body.unwrap_or_else(|| DEFAULT_NOTES.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for ReleaseInfo {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        RawRelease::deserialize(deserializer).map(Self::from)
    }
}

impl ReleaseInfo {
    /// Tag with one leading `v` removed.
    #[must_use]
    pub fn version_str(&self) -> &str {
        self.tag.strip_prefix('v').unwrap_or(&self.tag)
    }
}
