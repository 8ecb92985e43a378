//! Keyword scoring classifier.
//!
//! Each category has weighted keywords matched on word boundaries. A keyword
//! found in the title scores double its weight, one found in the summary
//! scores its weight. Confidence is the winning category's share of the
//! total score, halved when the winner rests on a single weak hit.

use anyhow::{Context, Result};
use regex::Regex;

use crate::news::category::NewsCategory;

/// Below this top score the winner is treated as a weak signal.
const WEAK_SCORE: f64 = 2.0;
const TITLE_MULTIPLIER: f64 = 2.0;

const KEYWORDS: &[(NewsCategory, &[(&str, f64)])] = &[
    (
        NewsCategory::OceanFreight,
        &[
            ("ocean freight", 3.0),
            ("sea freight", 3.0),
            ("container ship", 2.5),
            ("container shipping", 2.5),
            ("shipping line", 2.0),
            ("blank sailing", 2.5),
            ("blank sailings", 2.5),
            ("teu", 2.0),
            ("vessel", 1.5),
            ("vessels", 1.5),
            ("carrier alliance", 2.0),
            ("maersk", 2.0),
            ("hapag-lloyd", 2.0),
            ("cma cgm", 2.0),
            ("cosco", 2.0),
            ("bulk carrier", 2.0),
            ("reefer", 1.5),
            ("bunker", 1.5),
        ],
    ),
    (
        NewsCategory::AirFreight,
        &[
            ("air cargo", 3.0),
            ("air freight", 3.0),
            ("airfreight", 3.0),
            ("cargo airline", 2.5),
            ("belly cargo", 2.5),
            ("freighter", 2.0),
            ("freighters", 2.0),
            ("air waybill", 2.5),
            ("iata", 2.0),
            ("aircraft", 1.5),
            ("airport", 1.0),
        ],
    ),
    (
        NewsCategory::RoadRail,
        &[
            ("trucking", 2.5),
            ("truckload", 2.5),
            ("rail freight", 3.0),
            ("intermodal", 2.0),
            ("haulage", 2.0),
            ("haulier", 2.0),
            ("railway", 2.0),
            ("ltl", 2.0),
            ("ftl", 2.0),
            ("truck", 1.5),
            ("trucks", 1.5),
            ("drivers", 1.0),
        ],
    ),
    (
        NewsCategory::PortsLogistics,
        &[
            ("port congestion", 3.0),
            ("container terminal", 2.5),
            ("dwell time", 2.5),
            ("warehouse", 2.0),
            ("warehousing", 2.0),
            ("berth", 2.0),
            ("stevedore", 2.0),
            ("congestion", 2.0),
            ("3pl", 2.0),
            ("port", 1.5),
            ("ports", 1.5),
            ("terminal", 1.5),
            ("supply chain", 1.5),
            ("logistics", 1.0),
        ],
    ),
    (
        NewsCategory::TradePolicy,
        &[
            ("tariff", 3.0),
            ("tariffs", 3.0),
            ("trade war", 3.0),
            ("export controls", 3.0),
            ("import duties", 3.0),
            ("trade agreement", 3.0),
            ("sanctions", 2.5),
            ("embargo", 2.5),
            ("de minimis", 2.5),
            ("customs", 2.0),
            ("wto", 2.0),
        ],
    ),
    (
        NewsCategory::MarketRates,
        &[
            ("freight rates", 3.0),
            ("spot rate", 3.0),
            ("spot rates", 3.0),
            ("scfi", 3.0),
            ("drewry", 2.5),
            ("freightos", 2.5),
            ("surcharge", 2.0),
            ("gri", 2.0),
            ("index", 1.5),
            ("rates", 1.0),
            ("capacity", 1.0),
        ],
    ),
    (
        NewsCategory::Technology,
        &[
            ("artificial intelligence", 2.5),
            ("blockchain", 2.5),
            ("automation", 2.0),
            ("software", 2.0),
            ("digitalisation", 2.0),
            ("digitalization", 2.0),
            ("visibility platform", 2.5),
            ("ai", 1.5),
            ("api", 1.5),
            ("startup", 1.5),
            ("digital", 1.5),
        ],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleVerdict {
    pub category: NewsCategory,
    pub confidence: f32,
}

struct Keyword {
    pattern: Regex,
    weight: f64,
}

pub struct RuleClassifier {
    table: Vec<(NewsCategory, Vec<Keyword>)>,
}

impl RuleClassifier {
    pub fn new() -> Result<Self> {
        let table = KEYWORDS
            .iter()
            .map(|(category, words)| {
                let keywords = words
                    .iter()
                    .map(|(word, weight)| {
                        let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(word)))
                            .with_context(|| format!("invalid keyword pattern: {word}"))?;
                        Ok(Keyword {
                            pattern,
                            weight: *weight,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok((*category, keywords))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { table })
    }

    /// Per-category scores, in table order.
    pub fn scores(&self, title: &str, summary: Option<&str>) -> Vec<(NewsCategory, f64)> {
        let title = title.to_lowercase();
        let summary = summary.map(str::to_lowercase).unwrap_or_default();

        self.table
            .iter()
            .map(|(category, keywords)| {
                let score = keywords
                    .iter()
                    .map(|k| {
                        let mut s = 0.0;
                        if k.pattern.is_match(&title) {
                            s += k.weight * TITLE_MULTIPLIER;
                        }
                        if k.pattern.is_match(&summary) {
                            s += k.weight;
                        }
                        s
                    })
                    .sum();
                (*category, score)
            })
            .collect()
    }

    pub fn classify(&self, title: &str, summary: Option<&str>) -> RuleVerdict {
        let scores = self.scores(title, summary);
        let total: f64 = scores.iter().map(|(_, s)| s).sum();

        // First maximum wins, so ties resolve in table order.
        let (category, top) = scores
            .iter()
            .fold((NewsCategory::General, 0.0_f64), |best, (category, score)| {
                if *score > best.1 {
                    (*category, *score)
                } else {
                    best
                }
            });

        if total <= 0.0 {
            return RuleVerdict {
                category: NewsCategory::General,
                confidence: 0.0,
            };
        }

        let mut confidence = top / total;
        if top < WEAK_SCORE {
            confidence /= 2.0;
        }
        RuleVerdict {
            category,
            confidence: confidence as f32,
        }
    }
}
