//! Source Merge Engine
//!
//! Reconciles per-source payloads into canonical assets keyed by normalized
//! symbol. Sources are merged in the order given by [`MergePolicy`]; each
//! source only fills fields that are still empty, so an earlier source always
//! wins a conflict. Every fill is recorded in the asset's provenance table.
//!
//! After all sources are merged:
//! - `volatility_7d` is derived from the 7-day sparkline
//! - a missing FDV is estimated (`price * total_supply`, else market cap)
//! - an empty 7-day price history is seeded from the sparkline
//! - assets without a positive price are dropped

use crate::constants::CMC_IMAGE_URL_TEMPLATE;
use crate::error::{AppError, Result};
use crate::models::indicators::calculate_volatility;
use crate::models::payloads::{
    CoinGeckoMarket, CoinMarketCapCoin, DefiLlamaProtocol, DexScreenerResponse, MessariAsset,
};
use crate::models::{
    normalize_name, normalize_symbol, AssetField, CanonicalAsset, FieldValue, SourceId,
    SourcePayload, SourceResults,
};
use std::collections::HashMap;
use tracing::debug;

/// Identity rules for one source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourcePolicy {
    pub source: SourceId,
    /// May create a new asset for a symbol not seen yet
    pub may_introduce: bool,
    /// Falls back to a case-insensitive full-name match when the symbol is unknown
    pub name_fallback: bool,
}

/// Ordered merge priority, highest first
#[derive(Debug, Clone, PartialEq)]
pub struct MergePolicy {
    order: Vec<SourcePolicy>,
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self {
            order: vec![
                SourcePolicy {
                    source: SourceId::CoinMarketCap,
                    may_introduce: true,
                    name_fallback: false,
                },
                SourcePolicy {
                    source: SourceId::CoinGecko,
                    may_introduce: true,
                    name_fallback: true,
                },
                SourcePolicy {
                    source: SourceId::DefiLlama,
                    may_introduce: false,
                    name_fallback: true,
                },
                SourcePolicy {
                    source: SourceId::Messari,
                    may_introduce: false,
                    name_fallback: true,
                },
                SourcePolicy {
                    source: SourceId::DexScreener,
                    may_introduce: false,
                    name_fallback: false,
                },
            ],
        }
    }
}

impl MergePolicy {
    pub fn builder() -> MergePolicyBuilder {
        MergePolicyBuilder::default()
    }

    pub fn order(&self) -> &[SourcePolicy] {
        &self.order
    }

    /// The highest-priority source
    pub fn primary(&self) -> Option<SourceId> {
        self.order.first().map(|p| p.source)
    }

    pub fn policy_for(&self, source: SourceId) -> Option<&SourcePolicy> {
        self.order.iter().find(|p| p.source == source)
    }
}

#[derive(Debug, Default)]
pub struct MergePolicyBuilder {
    order: Vec<SourcePolicy>,
}

impl MergePolicyBuilder {
    /// Append a source that may create new assets
    pub fn introducing(mut self, source: SourceId, name_fallback: bool) -> Self {
        self.order.push(SourcePolicy {
            source,
            may_introduce: true,
            name_fallback,
        });
        self
    }

    /// Append an enrichment-only source
    pub fn enriching(mut self, source: SourceId, name_fallback: bool) -> Self {
        self.order.push(SourcePolicy {
            source,
            may_introduce: false,
            name_fallback,
        });
        self
    }

    /// Validate: non-empty, no duplicates, and the primary source may introduce
    pub fn build(self) -> Result<MergePolicy> {
        let first = self
            .order
            .first()
            .ok_or_else(|| AppError::Config("merge policy has no sources".to_string()))?;

        if !first.may_introduce {
            return Err(AppError::Config(format!(
                "primary source {} must be allowed to introduce assets",
                first.source
            )));
        }

        for (i, policy) in self.order.iter().enumerate() {
            if self.order[..i].iter().any(|p| p.source == policy.source) {
                return Err(AppError::Config(format!(
                    "source {} listed twice in merge policy",
                    policy.source
                )));
            }
        }

        Ok(MergePolicy { order: self.order })
    }
}

/// One source record, reduced to its identity and field contributions
struct SourceRecord {
    symbol: String,
    name: String,
    fields: Vec<(AssetField, FieldValue)>,
}

fn number(field: AssetField, value: Option<f64>) -> Option<(AssetField, FieldValue)> {
    value.map(|v| (field, FieldValue::Number(v)))
}

fn text(field: AssetField, value: &str) -> Option<(AssetField, FieldValue)> {
    Some((field, FieldValue::Text(value.to_string())))
}

fn title_case(tag: &str) -> String {
    tag.split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn coinmarketcap_record(coin: &CoinMarketCapCoin) -> SourceRecord {
    let usd = &coin.quote.usd;
    let category = coin.tags.first().map(|t| title_case(t)).unwrap_or_default();
    let image = CMC_IMAGE_URL_TEMPLATE.replace("{id}", &coin.id.to_string());

    let fields = [
        text(AssetField::Id, &coin.slug),
        text(AssetField::Name, &coin.name),
        text(AssetField::Category, &category),
        text(AssetField::Image, &image),
        coin.cmc_rank.map(|r| (AssetField::MarketCapRank, FieldValue::Rank(r))),
        number(AssetField::Price, usd.price),
        number(AssetField::MarketCap, usd.market_cap),
        number(AssetField::Volume24h, usd.volume_24h),
        number(AssetField::Change1h, usd.percent_change_1h),
        number(AssetField::Change24h, usd.percent_change_24h),
        number(AssetField::Change7d, usd.percent_change_7d),
        number(AssetField::Change30d, usd.percent_change_30d),
        number(AssetField::Change90d, usd.percent_change_90d),
        number(AssetField::VolumeChange24h, usd.volume_change_24h),
        number(AssetField::MarketCapDominance, usd.market_cap_dominance),
        number(AssetField::FullyDilutedValue, usd.fully_diluted_market_cap),
        number(AssetField::CirculatingSupply, coin.circulating_supply),
        number(AssetField::TotalSupply, coin.total_supply),
        number(AssetField::MaxSupply, coin.max_supply),
    ];

    SourceRecord {
        symbol: normalize_symbol(&coin.symbol),
        name: coin.name.clone(),
        fields: fields.into_iter().flatten().collect(),
    }
}

/// CoinGecko enriches with a restricted field set, or supplies the full
/// record when it introduces the asset
fn coingecko_record(market: &CoinGeckoMarket, introducing: bool) -> SourceRecord {
    let mut fields: Vec<Option<(AssetField, FieldValue)>> = vec![
        text(AssetField::Id, &market.id),
        market.image.as_deref().and_then(|i| text(AssetField::Image, i)),
        Some((AssetField::Sparkline, FieldValue::Series(market.sparkline().to_vec()))),
        number(AssetField::Ath, market.ath),
        number(AssetField::AthChange, market.ath_change_percentage),
        number(AssetField::Change1h, market.price_change_percentage_1h_in_currency),
        number(AssetField::Change24h, market.price_change_percentage_24h),
        number(AssetField::Change7d, market.price_change_percentage_7d_in_currency),
        number(AssetField::Change30d, market.price_change_percentage_30d_in_currency),
        number(AssetField::CirculatingSupply, market.circulating_supply),
        number(AssetField::TotalSupply, market.total_supply),
        number(AssetField::MaxSupply, market.max_supply),
        number(AssetField::FullyDilutedValue, market.fully_diluted_valuation),
    ];

    if introducing {
        fields.extend([
            text(AssetField::Name, &market.name),
            market
                .market_cap_rank
                .map(|r| (AssetField::MarketCapRank, FieldValue::Rank(r))),
            number(AssetField::Price, market.current_price),
            number(AssetField::MarketCap, market.market_cap),
            number(AssetField::Volume24h, market.total_volume),
        ]);
    }

    SourceRecord {
        symbol: normalize_symbol(&market.symbol),
        name: market.name.clone(),
        fields: fields.into_iter().flatten().collect(),
    }
}

fn defillama_record(protocol: &DefiLlamaProtocol) -> SourceRecord {
    let fields = [
        number(AssetField::Tvl, protocol.tvl),
        number(AssetField::Tvl7dChange, protocol.change_7d),
        protocol
            .category
            .as_deref()
            .and_then(|c| text(AssetField::Category, c)),
    ];

    SourceRecord {
        symbol: normalize_symbol(&protocol.symbol),
        name: protocol.name.clone(),
        fields: fields.into_iter().flatten().collect(),
    }
}

fn messari_record(asset: &MessariAsset) -> SourceRecord {
    let market = asset.market_data.clone().unwrap_or_default();
    let fields = [
        number(AssetField::Price, market.price_usd),
        number(AssetField::MarketCap, market.market_cap_usd),
        number(AssetField::Volume24h, market.volume_last_24_hours),
    ];

    SourceRecord {
        symbol: normalize_symbol(asset.symbol.as_deref().unwrap_or_default()),
        name: asset.name.clone(),
        fields: fields.into_iter().flatten().collect(),
    }
}

fn dexscreener_record(symbol: &str, response: &DexScreenerResponse) -> SourceRecord {
    let fields = [
        Some((AssetField::Liquidity, FieldValue::Number(response.total_liquidity()))),
        number(AssetField::Price, response.first_price()),
        Some((AssetField::Volume24h, FieldValue::Number(response.total_volume_24h()))),
    ];

    SourceRecord {
        symbol: normalize_symbol(symbol),
        name: response.base_name().unwrap_or_default().to_string(),
        fields: fields.into_iter().flatten().collect(),
    }
}

/// Assets under construction plus their identity indexes
#[derive(Default)]
struct AssetTable {
    assets: Vec<CanonicalAsset>,
    by_symbol: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
}

impl AssetTable {
    fn find(&self, symbol: &str, name: &str, name_fallback: bool) -> Option<usize> {
        if let Some(&idx) = self.by_symbol.get(symbol) {
            return Some(idx);
        }
        if !name_fallback {
            return None;
        }
        let key = normalize_name(name);
        if key.is_empty() {
            return None;
        }
        self.by_name.get(&key).copied()
    }

    fn introduce(&mut self, symbol: &str) -> usize {
        let idx = self.assets.len();
        self.assets.push(CanonicalAsset::new(symbol));
        self.by_symbol.insert(symbol.to_string(), idx);
        idx
    }

    /// First asset to claim a name keeps it
    fn index_name(&mut self, idx: usize) {
        let key = normalize_name(&self.assets[idx].name);
        if !key.is_empty() {
            self.by_name.entry(key).or_insert(idx);
        }
    }
}

/// Merges per-source payloads under a fixed [`MergePolicy`]
#[derive(Debug, Clone, Default)]
pub struct MergeEngine {
    policy: MergePolicy,
}

impl MergeEngine {
    pub fn new(policy: MergePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &MergePolicy {
        &self.policy
    }

    /// Merge one cycle's payloads into canonical assets.
    ///
    /// Output order is the order in which identities were introduced.
    /// Sources missing from `payloads` are skipped; sources not named by the
    /// policy are ignored.
    pub fn merge(&self, payloads: &SourceResults) -> Vec<CanonicalAsset> {
        let mut table = AssetTable::default();

        for policy in self.policy.order() {
            let Some(payload) = payloads.get(&policy.source) else {
                continue;
            };
            if payload.source() != policy.source {
                debug!(source = %policy.source, "Payload keyed under wrong source, skipped");
                continue;
            }
            self.merge_source(&mut table, policy, payload);
        }

        let before = table.assets.len();
        let assets: Vec<CanonicalAsset> = table
            .assets
            .into_iter()
            .filter_map(Self::finalize)
            .collect();

        debug!(
            merged = before,
            emitted = assets.len(),
            "Merge complete"
        );
        assets
    }

    fn merge_source(&self, table: &mut AssetTable, policy: &SourcePolicy, payload: &SourcePayload) {
        let source = policy.source;
        let mut matched = 0usize;
        let mut introduced = 0usize;

        let mut apply = |table: &mut AssetTable, record: SourceRecord| {
            if record.symbol.is_empty() {
                return;
            }
            let idx = match table.find(&record.symbol, &record.name, policy.name_fallback) {
                Some(idx) => {
                    matched += 1;
                    idx
                }
                None if policy.may_introduce => {
                    introduced += 1;
                    table.introduce(&record.symbol)
                }
                None => return,
            };
            table.assets[idx].fill_all(record.fields, source);
            table.index_name(idx);
        };

        match payload {
            SourcePayload::CoinMarketCap(coins) => {
                for coin in coins {
                    apply(&mut *table, coinmarketcap_record(coin));
                }
            }
            SourcePayload::CoinGecko(markets) => {
                for market in markets {
                    let symbol = normalize_symbol(&market.symbol);
                    let known = table.find(&symbol, &market.name, policy.name_fallback).is_some();
                    apply(&mut *table, coingecko_record(market, !known));
                }
            }
            SourcePayload::DefiLlama(protocols) => {
                for protocol in protocols {
                    apply(&mut *table, defillama_record(protocol));
                }
            }
            SourcePayload::Messari(assets) => {
                for asset in assets {
                    apply(&mut *table, messari_record(asset));
                }
            }
            SourcePayload::DexScreener(responses) => {
                for (symbol, response) in responses {
                    apply(&mut *table, dexscreener_record(symbol, response));
                }
            }
        }

        debug!(source = %source, matched, introduced, "Source merged");
    }

    /// Compute derived fields; drop assets without a positive price
    fn finalize(mut asset: CanonicalAsset) -> Option<CanonicalAsset> {
        if !(asset.price > 0.0 && asset.price.is_finite()) {
            return None;
        }

        if !asset.sparkline.is_empty() {
            asset.volatility_7d = calculate_volatility(&asset.sparkline);
            if asset.price_history.last_7_days.is_empty() {
                asset.price_history.last_7_days = asset.sparkline.clone();
            }
        }

        if asset.market_cap > 0.0 && asset.fully_diluted_value == 0.0 {
            asset.fully_diluted_value = if asset.circulating_supply > 0.0 && asset.total_supply > 0.0 {
                asset.price * asset.total_supply
            } else {
                asset.market_cap
            };
        }

        Some(asset)
    }
}
