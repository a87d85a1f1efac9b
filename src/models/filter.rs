use super::{CanonicalAsset, Grade};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub const DEFAULT_LIMIT: usize = 50;
pub const MAX_LIMIT: usize = 2000;

/// Listing sort key. Everything sorts descending except `Rank`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Score,
    MarketCap,
    Volume,
    Change24h,
    Rank,
}

impl SortKey {
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "score" | "trust_score" => Ok(SortKey::Score),
            "market_cap" | "mcap" => Ok(SortKey::MarketCap),
            "volume" | "volume_24h" => Ok(SortKey::Volume),
            "change_24h" | "change" => Ok(SortKey::Change24h),
            "rank" => Ok(SortKey::Rank),
            _ => Err(format!(
                "Invalid sort: {}. Valid options: score, market_cap, volume, change_24h, rank",
                s
            )),
        }
    }

    fn compare(&self, a: &CanonicalAsset, b: &CanonicalAsset) -> Ordering {
        let desc = |x: f64, y: f64| y.partial_cmp(&x).unwrap_or(Ordering::Equal);
        match self {
            SortKey::Score => desc(a.trust_score, b.trust_score),
            SortKey::MarketCap => desc(a.market_cap, b.market_cap),
            SortKey::Volume => desc(a.volume_24h, b.volume_24h),
            SortKey::Change24h => desc(a.change_24h, b.change_24h),
            SortKey::Rank => a.rank.cmp(&b.rank),
        }
    }
}

/// Query parameters for asset listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterParams {
    pub min_mcap: Option<f64>,
    pub max_mcap: Option<f64>,
    pub min_score: Option<f64>,
    pub category: Option<String>,
    pub grade: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

/// One page of a filtered listing
#[derive(Debug, Clone)]
pub struct FilteredPage {
    /// Matches before paging
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub data: Vec<CanonicalAsset>,
}

impl FilterParams {
    /// Effective page size: default 50, capped at 2000, never 0
    pub fn limit(&self) -> usize {
        match self.limit {
            Some(0) | None => DEFAULT_LIMIT,
            Some(n) => n.min(MAX_LIMIT),
        }
    }

    /// 1-based page number
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }

    pub fn sort_key(&self) -> Result<SortKey, String> {
        match self.sort.as_deref() {
            Some(s) if !s.trim().is_empty() => SortKey::from_str(s),
            _ => Ok(SortKey::default()),
        }
    }

    pub fn grade(&self) -> Result<Option<Grade>, String> {
        match self.grade.as_deref() {
            Some(g) if !g.trim().is_empty() => Grade::from_str(g).map(Some),
            _ => Ok(None),
        }
    }

    /// Reject inconsistent ranges and unknown enumerations
    pub fn validate(&self) -> Result<(), String> {
        if let (Some(min), Some(max)) = (self.min_mcap, self.max_mcap) {
            if min > max {
                return Err(format!("min_mcap ({}) is greater than max_mcap ({})", min, max));
            }
        }
        self.sort_key()?;
        self.grade()?;
        Ok(())
    }

    fn matches(&self, asset: &CanonicalAsset, grade: Option<Grade>) -> bool {
        if asset.market_cap <= 0.0 {
            return false;
        }
        if self.min_mcap.is_some_and(|min| asset.market_cap < min) {
            return false;
        }
        if self.max_mcap.is_some_and(|max| asset.market_cap > max) {
            return false;
        }
        if self.min_score.is_some_and(|min| asset.trust_score < min) {
            return false;
        }
        if let Some(category) = self.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            if !asset.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }
        if let Some(grade) = grade {
            if asset.score_breakdown.grade != grade {
                return false;
            }
        }
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let needle = search.to_lowercase();
            if !asset.symbol.to_lowercase().contains(&needle)
                && !asset.name.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }

    /// Filter, sort and page a ranked asset list
    pub fn apply(&self, assets: &[CanonicalAsset]) -> Result<FilteredPage, String> {
        self.validate()?;
        let sort = self.sort_key()?;
        let grade = self.grade()?;

        let mut matched: Vec<&CanonicalAsset> =
            assets.iter().filter(|a| self.matches(a, grade)).collect();
        // Stable sort keeps the snapshot order for equal keys
        matched.sort_by(|a, b| sort.compare(a, b));

        let total = matched.len();
        let limit = self.limit();
        let page = self.page();
        let data = matched
            .into_iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .cloned()
            .collect();

        Ok(FilteredPage {
            total,
            page,
            limit,
            data,
        })
    }
}
