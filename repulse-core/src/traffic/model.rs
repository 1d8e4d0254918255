//! Resource model and normalization
//!
//! Every tracked metric is a [`ResourceKind`]. Its [`ResourceDescriptor`] says
//! where the data lives, how to decode it and whether the API returns a
//! trailing window of days (historical) or a single current total (snapshot).
//! Decoded responses become a [`Resource`], which normalizes into
//! [`DailyRecord`]s keyed by day.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================
// Resource kinds
// ============================================

/// One tracked metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Clones,
    Views,
    Downloads,
    Stars,
}

impl ResourceKind {
    /// All kinds in collection order
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Clones,
        ResourceKind::Views,
        ResourceKind::Downloads,
        ResourceKind::Stars,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Clones => "clones",
            ResourceKind::Views => "views",
            ResourceKind::Downloads => "downloads",
            ResourceKind::Stars => "stars",
        }
    }

    /// Whether the API returns a window of per-day counts for this kind
    pub fn is_historical(&self) -> bool {
        self.descriptor().historical
    }

    /// Static fetch/decode metadata for this kind
    pub fn descriptor(&self) -> &'static ResourceDescriptor {
        match self {
            ResourceKind::Clones => &DESCRIPTORS[0],
            ResourceKind::Views => &DESCRIPTORS[1],
            ResourceKind::Downloads => &DESCRIPTORS[2],
            ResourceKind::Stars => &DESCRIPTORS[3],
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clones" => Ok(ResourceKind::Clones),
            "views" => Ok(ResourceKind::Views),
            "downloads" => Ok(ResourceKind::Downloads),
            "stars" => Ok(ResourceKind::Stars),
            _ => Err(format!("unknown resource kind: {}", s)),
        }
    }
}

// ============================================
// Descriptors
// ============================================

/// How a kind's response is retrieved and decoded
#[derive(Clone, Copy)]
pub enum FetchStrategy {
    /// One request, one body
    Single {
        decode: fn(&[u8]) -> serde_json::Result<Resource>,
    },
    /// `page=1,2,...` until a page decodes to zero releases
    Paginated {
        decode_page: fn(&[u8]) -> serde_json::Result<Vec<Release>>,
        assemble: fn(Vec<Release>) -> Resource,
    },
}

impl std::fmt::Debug for FetchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchStrategy::Single { .. } => f.write_str("Single"),
            FetchStrategy::Paginated { .. } => f.write_str("Paginated"),
        }
    }
}

/// Static metadata for one resource kind
pub struct ResourceDescriptor {
    pub kind: ResourceKind,
    pub historical: bool,
    pub strategy: FetchStrategy,
    /// `(api_url, owner, repo) -> url`; paginated URLs get `&page=N` appended
    pub build_url: fn(&str, &str, &str) -> String,
}

impl std::fmt::Debug for ResourceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceDescriptor")
            .field("kind", &self.kind)
            .field("historical", &self.historical)
            .field("strategy", &self.strategy)
            .finish()
    }
}

static DESCRIPTORS: [ResourceDescriptor; 4] = [
    ResourceDescriptor {
        kind: ResourceKind::Clones,
        historical: true,
        strategy: FetchStrategy::Single {
            decode: decode_clones,
        },
        build_url: clones_url,
    },
    ResourceDescriptor {
        kind: ResourceKind::Views,
        historical: true,
        strategy: FetchStrategy::Single {
            decode: decode_views,
        },
        build_url: views_url,
    },
    ResourceDescriptor {
        kind: ResourceKind::Downloads,
        historical: false,
        strategy: FetchStrategy::Paginated {
            decode_page: decode_release_page,
            assemble: Resource::Downloads,
        },
        build_url: releases_url,
    },
    ResourceDescriptor {
        kind: ResourceKind::Stars,
        historical: false,
        strategy: FetchStrategy::Single {
            decode: decode_stars,
        },
        build_url: repo_url,
    },
];

/// Releases requested per page
pub const RELEASES_PER_PAGE: u32 = 100;

fn repo_url(api_url: &str, owner: &str, repo: &str) -> String {
    format!("{}/repos/{}/{}", api_url.trim_end_matches('/'), owner, repo)
}

fn clones_url(api_url: &str, owner: &str, repo: &str) -> String {
    format!("{}/traffic/clones", repo_url(api_url, owner, repo))
}

fn views_url(api_url: &str, owner: &str, repo: &str) -> String {
    format!("{}/traffic/views", repo_url(api_url, owner, repo))
}

fn releases_url(api_url: &str, owner: &str, repo: &str) -> String {
    format!(
        "{}/releases?per_page={}",
        repo_url(api_url, owner, repo),
        RELEASES_PER_PAGE
    )
}

// ============================================
// API shapes
// ============================================

/// One day from a traffic endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficDay {
    pub timestamp: String,
    pub count: u64,
    pub uniques: u64,
}

/// Trailing window returned by `traffic/clones` and `traffic/views`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrafficWindow {
    /// Window total
    pub count: u64,
    /// Window unique total
    pub uniques: u64,
    pub days: Vec<TrafficDay>,
}

#[derive(Deserialize)]
struct ClonesBody {
    #[serde(default)]
    count: u64,
    #[serde(default)]
    uniques: u64,
    clones: Vec<TrafficDay>,
}

#[derive(Deserialize)]
struct ViewsBody {
    #[serde(default)]
    count: u64,
    #[serde(default)]
    uniques: u64,
    views: Vec<TrafficDay>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    #[serde(default)]
    pub name: String,
    pub download_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    #[serde(default)]
    pub tag_name: String,
    /// Absent for draft releases
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

impl Release {
    pub fn download_count(&self) -> u64 {
        self.assets.iter().map(|a| a.download_count).sum()
    }
}

/// The slice of the repository object we care about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoInfo {
    pub stargazers_count: u64,
}

fn decode_clones(body: &[u8]) -> serde_json::Result<Resource> {
    let body: ClonesBody = serde_json::from_slice(body)?;
    Ok(Resource::Clones(TrafficWindow {
        count: body.count,
        uniques: body.uniques,
        days: body.clones,
    }))
}

fn decode_views(body: &[u8]) -> serde_json::Result<Resource> {
    let body: ViewsBody = serde_json::from_slice(body)?;
    Ok(Resource::Views(TrafficWindow {
        count: body.count,
        uniques: body.uniques,
        days: body.views,
    }))
}

fn decode_stars(body: &[u8]) -> serde_json::Result<Resource> {
    Ok(Resource::Stars(serde_json::from_slice(body)?))
}

fn decode_release_page(body: &[u8]) -> serde_json::Result<Vec<Release>> {
    serde_json::from_slice(body)
}

// ============================================
// Normalized records
// ============================================

/// One day of one metric, ready for storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyRecord {
    /// Day key, stored verbatim
    pub timestamp: String,
    pub count: u64,
    /// Only set for historical kinds
    pub uniques: Option<u64>,
}

/// A decoded API response for one kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Clones(TrafficWindow),
    Views(TrafficWindow),
    /// Every release across every page
    Downloads(Vec<Release>),
    Stars(RepoInfo),
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Clones(_) => ResourceKind::Clones,
            Resource::Views(_) => ResourceKind::Views,
            Resource::Downloads(_) => ResourceKind::Downloads,
            Resource::Stars(_) => ResourceKind::Stars,
        }
    }

    pub fn is_historical(&self) -> bool {
        self.kind().is_historical()
    }

    /// Normalize into daily records, stamping snapshots with today (UTC)
    pub fn daily_records(&self) -> Vec<DailyRecord> {
        self.daily_records_at(Utc::now())
    }

    /// Normalize into daily records, stamping snapshots with the day of `now`
    pub fn daily_records_at(&self, now: DateTime<Utc>) -> Vec<DailyRecord> {
        match self {
            Resource::Clones(window) | Resource::Views(window) => window
                .days
                .iter()
                .map(|day| DailyRecord {
                    timestamp: day.timestamp.clone(),
                    count: day.count,
                    uniques: Some(day.uniques),
                })
                .collect(),
            Resource::Downloads(releases) => vec![DailyRecord {
                timestamp: midnight_utc(now),
                count: releases.iter().map(Release::download_count).sum(),
                uniques: None,
            }],
            Resource::Stars(info) => vec![DailyRecord {
                timestamp: midnight_utc(now),
                count: info.stargazers_count,
                uniques: None,
            }],
        }
    }
}

/// RFC3339 midnight UTC of the day containing `now`, e.g. `2026-10-17T00:00:00Z`
pub fn midnight_utc(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT00:00:00Z").to_string()
}
