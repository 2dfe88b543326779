use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

/// Reputation ladder as shipped: `(level, min_score, name, icon, color)`.
const LADDER: [(u8, i64, &str, &str, &str); 9] = [
    (1, 500, "Rising", "badges/rising.svg", "#9ca3af"),
    (2, 3_000, "Bronze", "badges/bronze.svg", "#b45309"),
    (3, 6_000, "Silver", "badges/silver.svg", "#94a3b8"),
    (4, 10_000, "Gold", "badges/gold.svg", "#eab308"),
    (5, 20_000, "Platinum", "badges/platinum.svg", "#67e8f9"),
    (6, 35_000, "Diamond", "badges/diamond.svg", "#60a5fa"),
    (7, 50_000, "Elite", "badges/elite.svg", "#a855f7"),
    (8, 75_000, "Legend", "badges/legend.svg", "#f43f5e"),
    (9, 150_000, "Icon", "badges/icon.svg", "#f59e0b"),
];

static STANDARD: LazyLock<BadgeTable> = LazyLock::new(|| {
    BadgeTable::new(
        LADDER
            .iter()
            .map(|&(level, min_score, name, icon, color)| Badge {
                level,
                min_score,
                name: name.to_string(),
                icon: icon.to_string(),
                color: color.to_string(),
            })
            .collect(),
    )
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub level: u8,
    pub min_score: i64,
    pub name: String,
    pub icon: String,
    pub color: String,
}

/// Badge thresholds, sorted by `min_score` when built and never touched afterwards.
#[derive(Debug, Clone, Default)]
pub struct BadgeTable {
    badges: Vec<Badge>,
}

impl BadgeTable {
    /// Builds a table from hand-maintained configuration in any order.
    ///
    /// A table whose thresholds repeat, or whose levels don't rise with their thresholds, is
    /// treated as empty: every score then resolves to no badge.
    pub fn new(mut badges: Vec<Badge>) -> Self {
        badges.sort_by_key(|b| b.min_score);

        let monotonic = badges
            .windows(2)
            .all(|w| w[0].min_score < w[1].min_score && w[0].level < w[1].level);

        if !monotonic {
            tracing::warn!(
                badges = badges.len(),
                "badge table is not strictly increasing, disabling badges"
            );
            badges.clear();
        }

        Self { badges }
    }

    pub fn standard() -> &'static BadgeTable {
        &STANDARD
    }

    pub fn badges(&self) -> &[Badge] {
        &self.badges
    }

    pub fn is_empty(&self) -> bool {
        self.badges.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeProgress {
    pub current: Option<Badge>,
    pub next: Option<Badge>,
    /// Always within `0.0..=100.0`.
    pub percent: f64,
}

#[derive(Debug, Clone, Default)]
pub struct BadgeResolver {
    table: BadgeTable,
}

impl BadgeResolver {
    pub fn new(table: BadgeTable) -> Self {
        Self { table }
    }

    pub fn standard() -> Self {
        Self::new(BadgeTable::standard().clone())
    }

    pub fn table(&self) -> &BadgeTable {
        &self.table
    }

    /// Highest badge whose threshold `score` has reached.
    pub fn current_badge(&self, score: i64) -> Option<&Badge> {
        self.table
            .badges
            .iter()
            .rev()
            .find(|b| b.min_score <= score)
    }

    /// Lowest badge whose threshold `score` has not reached yet.
    pub fn next_badge(&self, score: i64) -> Option<&Badge> {
        self.table.badges.iter().find(|b| b.min_score > score)
    }

    pub fn progress(&self, score: i64) -> BadgeProgress {
        if self.table.is_empty() {
            return BadgeProgress {
                current: None,
                next: None,
                percent: 0.0,
            };
        }

        let current = self.current_badge(score);
        let next = self.next_badge(score);

        let percent = match next {
            None => 100.0,
            Some(next) => {
                let floor = current.map_or(0, |b| b.min_score);
                let span = next.min_score - floor;

                if span <= 0 {
                    0.0
                } else {
                    ((score - floor) as f64 / span as f64).clamp(0.0, 1.0) * 100.0
                }
            }
        };

        BadgeProgress {
            current: current.cloned(),
            next: next.cloned(),
            percent,
        }
    }
}
