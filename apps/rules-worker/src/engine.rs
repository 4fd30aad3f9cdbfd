//! Deterministic pricing rules engine: `PriceContext` in, `(price, reason,
//! confidence)` out. No wall-clock, no RNG — identical inputs always
//! produce identical outputs.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;

/// Maximum number of past decisions retained per SKU for trend analysis.
const HISTORY_CAPACITY: usize = 500;

/// Full input tuple consumed by the rules engine. Not persisted; built
/// fresh per message from a `RawPrice` event plus the worker's margin
/// configuration.
#[derive(Debug, Clone)]
pub struct PriceContext {
    pub sku: String,
    pub current_price: f64,
    pub cost: f64,
    pub competitor_prices: Vec<f64>,
    pub inventory_level: i64,
    pub days_in_stock: i64,
    pub demand_forecast: f64,
    pub min_margin: f64,
    pub max_margin: f64,
}

/// Tunable thresholds and multipliers for the rules engine. Defaults match
/// the pipeline's standard operating configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub elasticity_factor: f64,
    pub competitive_discount: f64,
    pub default_price: f64,
    pub base_confidence: f64,
    pub high_inventory_threshold: i64,
    pub high_inventory_discount: f64,
    pub critical_inventory_threshold: i64,
    pub critical_inventory_discount: f64,
    pub old_stock_days_threshold: i64,
    pub old_stock_discount: f64,
    pub critical_stock_days_threshold: i64,
    pub critical_stock_discount: f64,
    pub price_increase_threshold_pct: f64,
    pub price_decrease_threshold_pct: f64,
    pub aggressive_positioning_threshold: f64,
    pub premium_positioning_threshold: f64,
    pub confidence_boost_many_competitors: f64,
    pub confidence_boost_few_competitors: f64,
    pub confidence_boost_inventory: f64,
    pub confidence_boost_demand: f64,
    pub min_demand_confidence: f64,
    pub max_demand_confidence: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            elasticity_factor: 1.5,
            competitive_discount: 0.02,
            default_price: 100.0,
            base_confidence: 0.5,
            high_inventory_threshold: 1000,
            high_inventory_discount: 0.05,
            critical_inventory_threshold: 5000,
            critical_inventory_discount: 0.10,
            old_stock_days_threshold: 180,
            old_stock_discount: 0.08,
            critical_stock_days_threshold: 365,
            critical_stock_discount: 0.15,
            price_increase_threshold_pct: 5.0,
            price_decrease_threshold_pct: 5.0,
            aggressive_positioning_threshold: 0.05,
            premium_positioning_threshold: 0.05,
            confidence_boost_many_competitors: 0.2,
            confidence_boost_few_competitors: 0.1,
            confidence_boost_inventory: 0.15,
            confidence_boost_demand: 0.15,
            min_demand_confidence: 0.3,
            max_demand_confidence: 0.7,
        }
    }
}

/// One historical decision, retained for trend analysis only.
#[derive(Debug, Clone)]
struct HistoryEntry {
    recommended_price: f64,
    margin_pct: f64,
    confidence: f64,
}

/// Aggregate trend statistics for a SKU's retained decision history.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTrend {
    pub mean_recommended_price: f64,
    pub mean_margin: f64,
    pub price_volatility: f64,
    pub total_decisions: usize,
    pub avg_confidence: f64,
}

/// Pure pricing calculation plus an optional, non-hot-path decision
/// history used for operator-facing trend queries.
pub struct PricingRulesEngine {
    config: EngineConfig,
    history: Mutex<HashMap<String, VecDeque<HistoryEntry>>>,
}

impl PricingRulesEngine {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            history: Mutex::new(HashMap::new()),
        }
    }

    /// Run the ordered transformation pipeline and return
    /// `(price, reason, confidence)`. Does not touch history.
    #[must_use]
    pub fn calculate_price(&self, context: &PriceContext) -> (f64, String, f64) {
        let min_price = Self::minimum_price(context.cost, context.min_margin);
        let competitive_price = self.analyze_competition(&context.competitor_prices);
        let demand_adjusted = self.apply_demand_elasticity(competitive_price, context.demand_forecast);
        let inventory_adjusted =
            self.adjust_for_inventory(demand_adjusted, context.inventory_level, context.days_in_stock);
        let final_price = Self::enforce_margin_constraints(
            inventory_adjusted,
            context.cost,
            context.max_margin,
            min_price,
        );
        let confidence = self.calculate_confidence(context);
        let reason = self.generate_reason(context, final_price);

        (round_cents(final_price), reason, confidence)
    }

    /// Run [`Self::calculate_price`] over a batch of contexts, appending
    /// each result to the per-SKU decision history. This is the only path
    /// that grows history — single calls via [`Self::calculate_price`] do
    /// not, keeping the hot path allocation-free.
    pub fn calculate_batch_prices(
        &self,
        contexts: &[PriceContext],
    ) -> Vec<(String, f64, f64, f64, String)> {
        let mut results = Vec::with_capacity(contexts.len());
        let mut history = self.history.lock();

        for context in contexts {
            let (price, reason, confidence) = self.calculate_price(context);
            let margin = margin_pct(price, context.cost);

            let entry = history.entry(context.sku.clone()).or_default();
            if entry.len() == HISTORY_CAPACITY {
                entry.pop_front();
            }
            entry.push_back(HistoryEntry {
                recommended_price: price,
                margin_pct: margin,
                confidence,
            });

            results.push((context.sku.clone(), price, margin, confidence, reason));
        }

        results
    }

    /// Mean, standard deviation, and count of retained decisions for a
    /// SKU. `None` if nothing has been recorded for it.
    #[must_use]
    pub fn analyze_price_trends(&self, sku: &str) -> Option<PriceTrend> {
        let history = self.history.lock();
        let entries = history.get(sku)?;
        if entries.is_empty() {
            return None;
        }

        let n = entries.len() as f64;
        let mean_price = entries.iter().map(|e| e.recommended_price).sum::<f64>() / n;
        let mean_margin = entries.iter().map(|e| e.margin_pct).sum::<f64>() / n;
        let avg_confidence = entries.iter().map(|e| e.confidence).sum::<f64>() / n;
        let variance = entries
            .iter()
            .map(|e| (e.recommended_price - mean_price).powi(2))
            .sum::<f64>()
            / n;

        Some(PriceTrend {
            mean_recommended_price: mean_price,
            mean_margin,
            price_volatility: variance.sqrt(),
            total_decisions: entries.len(),
            avg_confidence,
        })
    }

    fn minimum_price(cost: f64, min_margin: f64) -> f64 {
        cost * (1.0 + min_margin)
    }

    fn analyze_competition(&self, competitor_prices: &[f64]) -> f64 {
        if competitor_prices.is_empty() {
            return self.config.default_price;
        }
        median(competitor_prices) * (1.0 - self.config.competitive_discount)
    }

    fn apply_demand_elasticity(&self, base_price: f64, demand_forecast: f64) -> f64 {
        let deviation = (demand_forecast - 0.5) * 2.0;
        let multiplier = 1.0 + (deviation * self.config.elasticity_factor * 0.1);
        base_price * multiplier
    }

    fn adjust_for_inventory(&self, base_price: f64, inventory_level: i64, days_in_stock: i64) -> f64 {
        let mut discount = 1.0;

        if inventory_level > self.config.critical_inventory_threshold {
            discount *= 1.0 - self.config.critical_inventory_discount;
        } else if inventory_level > self.config.high_inventory_threshold {
            discount *= 1.0 - self.config.high_inventory_discount;
        }

        if days_in_stock > self.config.critical_stock_days_threshold {
            discount *= 1.0 - self.config.critical_stock_discount;
        } else if days_in_stock > self.config.old_stock_days_threshold {
            discount *= 1.0 - self.config.old_stock_discount;
        }

        base_price * discount
    }

    fn enforce_margin_constraints(suggested_price: f64, cost: f64, max_margin: f64, min_price: f64) -> f64 {
        let price = suggested_price.max(min_price);
        let max_price = cost * (1.0 + max_margin);
        price.min(max_price)
    }

    fn calculate_confidence(&self, context: &PriceContext) -> f64 {
        let mut confidence = self.config.base_confidence;

        let num_competitors = context.competitor_prices.len();
        if num_competitors >= 3 {
            confidence += self.config.confidence_boost_many_competitors;
        } else if num_competitors >= 1 {
            confidence += self.config.confidence_boost_few_competitors;
        }

        if context.inventory_level > 0 {
            confidence += self.config.confidence_boost_inventory;
        }

        if context.demand_forecast > self.config.min_demand_confidence
            && context.demand_forecast < self.config.max_demand_confidence
        {
            confidence += self.config.confidence_boost_demand;
        }

        confidence.min(1.0)
    }

    fn generate_reason(&self, context: &PriceContext, final_price: f64) -> String {
        let mut reasons = Vec::with_capacity(2);

        let price_delta_pct = if context.current_price > 0.0 {
            (final_price - context.current_price) / context.current_price * 100.0
        } else {
            0.0
        };

        if price_delta_pct > self.config.price_increase_threshold_pct {
            reasons.push("INCREASE: favorable demand or competitive positioning".to_string());
        } else if price_delta_pct < -self.config.price_decrease_threshold_pct {
            reasons.push(format!(
                "DISCOUNT: elevated inventory ({}) or soft demand",
                context.inventory_level
            ));
        } else {
            reasons.push("STABLE: aligned with market".to_string());
        }

        if !context.competitor_prices.is_empty() {
            let avg_comp = mean(&context.competitor_prices);
            if final_price < avg_comp * (1.0 - self.config.aggressive_positioning_threshold) {
                reasons.push("Aggressive positioning".to_string());
            } else if final_price > avg_comp * (1.0 + self.config.premium_positioning_threshold) {
                reasons.push("Premium positioning".to_string());
            }
        }

        reasons.join(" | ")
    }
}

/// `(price - cost) / cost`, defensively `0.0` when `cost <= 0` rather than
/// dividing by zero.
#[must_use]
pub fn margin_pct(price: f64, cost: f64) -> f64 {
    if cost > 0.0 {
        (price - cost) / cost
    } else {
        0.0
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline_context() -> PriceContext {
        PriceContext {
            sku: "SKU001".to_string(),
            current_price: 100.0,
            cost: 50.0,
            competitor_prices: vec![95.0, 98.0, 100.0, 102.0],
            inventory_level: 1000,
            days_in_stock: 30,
            demand_forecast: 0.6,
            min_margin: 0.10,
            max_margin: 0.50,
        }
    }

    #[test]
    fn baseline_scenario_respects_margin_and_reason() {
        let engine = PricingRulesEngine::new(EngineConfig::default());
        let context = baseline_context();
        let (price, reason, confidence) = engine.calculate_price(&context);

        let margin = margin_pct(price, context.cost);
        assert!(margin >= context.min_margin - 1e-9);
        assert!(margin <= context.max_margin + 1e-9);

        let median_competitor = 99.0;
        assert!((price - median_competitor).abs() / median_competitor <= 0.15);
        assert!(reason.contains("STABLE") || reason.contains("positioning"));
        assert!(confidence >= 0.7);
    }

    #[test]
    fn high_inventory_lowers_price() {
        let engine = PricingRulesEngine::new(EngineConfig::default());
        let mut low = baseline_context();
        low.inventory_level = 100;
        let mut high = baseline_context();
        high.inventory_level = 10_000;

        let (price_low, _, _) = engine.calculate_price(&low);
        let (price_high, _, _) = engine.calculate_price(&high);

        assert!(price_high < price_low);
    }

    #[test]
    fn demand_swing_raises_or_lowers_price() {
        let engine = PricingRulesEngine::new(EngineConfig::default());
        let mut low_demand = baseline_context();
        low_demand.demand_forecast = 0.1;
        let mut high_demand = baseline_context();
        high_demand.demand_forecast = 0.9;

        let (price_low, _, _) = engine.calculate_price(&low_demand);
        let (price_high, _, _) = engine.calculate_price(&high_demand);

        assert!(price_high > price_low);
    }

    #[test]
    fn margin_is_always_within_bounds() {
        let engine = PricingRulesEngine::new(EngineConfig::default());
        for inventory in [0, 500, 1500, 6000] {
            for demand in [0.0, 0.25, 0.5, 0.75, 1.0] {
                let mut ctx = baseline_context();
                ctx.inventory_level = inventory;
                ctx.demand_forecast = demand;
                let (price, _, confidence) = engine.calculate_price(&ctx);
                let margin = margin_pct(price, ctx.cost);
                assert!(margin >= ctx.min_margin - 1e-9);
                assert!(margin <= ctx.max_margin + 1e-9);
                assert!((0.0..=1.0).contains(&confidence));
            }
        }
    }

    #[test]
    fn confidence_reflects_competitor_count_and_demand_band() {
        let engine = PricingRulesEngine::new(EngineConfig::default());
        let mut no_competitors = baseline_context();
        no_competitors.competitor_prices = vec![];
        no_competitors.demand_forecast = 0.9;

        let (_, _, confidence) = engine.calculate_price(&no_competitors);
        assert!(confidence < 0.8);

        let (_, _, confidence_full) = engine.calculate_price(&baseline_context());
        assert!(confidence_full >= confidence);
    }

    #[test]
    fn calculate_price_is_deterministic() {
        let engine = PricingRulesEngine::new(EngineConfig::default());
        let context = baseline_context();
        let first = engine.calculate_price(&context);
        let second = engine.calculate_price(&context);
        assert_eq!(first, second);
    }

    #[test]
    fn zero_cost_yields_zero_margin_instead_of_panicking() {
        assert_eq!(margin_pct(120.0, 0.0), 0.0);
    }

    #[test]
    fn batch_calculation_records_history_for_trend_analysis() {
        let engine = PricingRulesEngine::new(EngineConfig::default());
        assert!(engine.analyze_price_trends("SKU001").is_none());

        let contexts = vec![baseline_context(), baseline_context()];
        let results = engine.calculate_batch_prices(&contexts);
        assert_eq!(results.len(), 2);

        let trend = engine.analyze_price_trends("SKU001").expect("history recorded");
        assert_eq!(trend.total_decisions, 2);
        assert!(trend.avg_confidence > 0.0);
    }
}
