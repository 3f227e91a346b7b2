#![forbid(unsafe_code)]

//! Navigation targets: where the viewport should start after a
//! today / previous / next / date-search / scroll-to-item request.
//!
//! Resolution is pure; animating towards the result is the animator's job.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::range::{DateRange, add_days};
use crate::viewport::ViewportState;

/// Placement knobs for navigation targets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Where a focused date lands, as a fraction of the viewport width from
    /// the left edge.
    pub lead_fraction: f64,
    /// Days a page turn moves. `None` pages by the viewport length.
    pub page_days: Option<u32>,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            lead_fraction: 1.0 / 3.0,
            page_days: None,
        }
    }
}

/// A navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationTarget {
    /// Bring `today` into view.
    Today(NaiveDate),
    /// One page back.
    PreviousPage,
    /// One page forward.
    NextPage,
    /// A searched date.
    Date(NaiveDate),
    /// Scroll an item's bar into view.
    Item(DateRange),
}

impl NavigationConfig {
    /// Viewport start that satisfies `target`.
    pub fn resolve(&self, viewport: &ViewportState, target: NavigationTarget) -> Result<NaiveDate> {
        match target {
            NavigationTarget::PreviousPage => add_days(viewport.start, -self.page(viewport)),
            NavigationTarget::NextPage => add_days(viewport.start, self.page(viewport)),
            NavigationTarget::Today(day) | NavigationTarget::Date(day) => {
                add_days(day, -self.lead_days(viewport))
            }
            NavigationTarget::Item(item) => {
                let length = i64::from(viewport.length_days.max(1));
                // span_days is end - start; the bar covers one more day.
                let covered = item.span_days() + 1;
                if covered <= length {
                    add_days(item.start, -((length - covered) / 2))
                } else {
                    add_days(item.start, -self.lead_days(viewport))
                }
            }
        }
    }

    fn page(&self, viewport: &ViewportState) -> i64 {
        i64::from(self.page_days.unwrap_or(viewport.length_days).max(1))
    }

    fn lead_days(&self, viewport: &ViewportState) -> i64 {
        let fraction = if self.lead_fraction.is_finite() {
            self.lead_fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        // Nudge before flooring so thirds of round lengths land on whole days.
        let lead = (f64::from(viewport.length_days) * fraction + 1e-9).floor() as i64;
        lead.min(i64::from(viewport.length_days.saturating_sub(1)))
    }
}
