use unicode_width::UnicodeWidthStr;

use statdeck_core::backend::{
    AdvancedCacheStats, AnalyticsSummary, EmbeddingDetails, UserActivity,
};
use statdeck_core::{DashboardSnapshot, Effective, ResourceName, ResourceState, Source};

use crate::color;

const HEADERS: [&str; 5] = ["Resource", "Status", "Fetched", "Summary", "Error"];

/// One printable line per tracked resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRow {
    pub resource: String,
    pub status: String,
    pub fetched: String,
    pub summary: String,
    pub error: String,
}

impl ResourceRow {
    fn cells(&self) -> [&str; 5] {
        [
            &self.resource,
            &self.status,
            &self.fetched,
            &self.summary,
            &self.error,
        ]
    }
}

/// Status label: loading beats error beats stale.
fn status_label(loading: bool, failed: bool, stale: bool, degraded: bool) -> &'static str {
    if loading {
        "loading"
    } else if failed {
        "error"
    } else if stale {
        "stale"
    } else if degraded {
        "degraded"
    } else {
        "fresh"
    }
}

fn fetched_label(at: Option<chrono::DateTime<chrono::Utc>>) -> String {
    at.map_or_else(
        || "-".to_string(),
        |at| at.with_timezone(&chrono::Local).format("%H:%M:%S").to_string(),
    )
}

fn summarize_embeddings(details: &EmbeddingDetails) -> String {
    match &details.model {
        Some(model) => format!("{} embeddings ({})", details.total_embeddings, model),
        None => format!("{} embeddings", details.total_embeddings),
    }
}

fn summarize_advanced(stats: &AdvancedCacheStats) -> String {
    match stats.hit_rate() {
        Some(rate) => format!("{:.1}% hit rate, {} entries", rate * 100.0, stats.entries),
        None => format!("no lookups, {} entries", stats.entries),
    }
}

fn summarize_analytics(summary: &AnalyticsSummary) -> String {
    format!(
        "{} requests, {:.0}ms avg",
        summary.total_requests, summary.avg_latency_ms
    )
}

fn summarize_users(activity: &UserActivity) -> String {
    format!("{}/{} active", activity.active_users, activity.total_users)
}

fn plain_row<T>(
    snapshot: &DashboardSnapshot,
    name: ResourceName,
    state: &ResourceState<T>,
    summarize: fn(&T) -> String,
) -> ResourceRow {
    ResourceRow {
        resource: name.to_string(),
        status: status_label(
            state.is_loading(),
            state.error().is_some(),
            snapshot.stale.contains(&name),
            false,
        )
        .to_string(),
        fetched: fetched_label(state.last_fetched_at()),
        summary: state.data().map_or_else(|| "-".to_string(), summarize),
        error: state.error().map_or_else(String::new, ToString::to_string),
    }
}

fn overview_row(snapshot: &DashboardSnapshot) -> ResourceRow {
    let overview = snapshot.state.overview();
    let name = ResourceName::ComprehensiveStats;
    let summary = match overview.effective() {
        Some(Effective::Rich(stats)) => {
            format!("{} docs, {} chunks", stats.total_documents, stats.total_chunks)
        }
        Some(Effective::Degraded(basic)) => {
            format!("{} docs, {} chunks (basic)", basic.total_documents, basic.total_chunks)
        }
        None => "-".to_string(),
    };
    ResourceRow {
        resource: name.to_string(),
        status: status_label(
            overview.is_loading(),
            overview.error().is_some(),
            snapshot.stale.contains(&name),
            overview.source() == Source::Degraded,
        )
        .to_string(),
        fetched: fetched_label(overview.last_fetched_at()),
        summary,
        error: overview.error().map_or_else(String::new, ToString::to_string),
    }
}

pub fn rows(snapshot: &DashboardSnapshot) -> Vec<ResourceRow> {
    let state = &snapshot.state;
    vec![
        overview_row(snapshot),
        plain_row(
            snapshot,
            ResourceName::EmbeddingDetails,
            state.embedding_details(),
            summarize_embeddings,
        ),
        plain_row(
            snapshot,
            ResourceName::AdvancedStats,
            state.advanced_stats(),
            summarize_advanced,
        ),
        plain_row(
            snapshot,
            ResourceName::Analytics,
            state.analytics(),
            summarize_analytics,
        ),
        plain_row(
            snapshot,
            ResourceName::UserActivity,
            state.user_activity(),
            summarize_users,
        ),
    ]
}

pub struct TableFormatter {
    widths: [usize; 5],
}

impl TableFormatter {
    pub fn new(rows: &[ResourceRow]) -> Self {
        let mut widths = HEADERS.map(display_width);
        for row in rows {
            for (width, cell) in widths.iter_mut().zip(row.cells()) {
                *width = (*width).max(display_width(cell));
            }
        }
        Self { widths }
    }

    pub fn print_table(&self, rows: &[ResourceRow]) {
        println!("{}", self.border('┌', '┬', '┐'));
        println!("{}", self.header_row());
        println!("{}", self.border('├', '┼', '┤'));
        for row in rows {
            println!("{}", self.row(row));
        }
        println!("{}", self.border('└', '┴', '┘'));
    }

    fn border(&self, left: char, mid: char, right: char) -> String {
        let segments: Vec<String> = self.widths.iter().map(|w| "─".repeat(w + 2)).collect();
        color::muted(&format!(
            "{left}{}{right}",
            segments.join(&mid.to_string())
        ))
    }

    fn header_row(&self) -> String {
        let sep = color::muted("│");
        let cells: Vec<String> = HEADERS
            .iter()
            .zip(self.widths)
            .map(|(header, width)| color::bold(&pad(header, width)))
            .collect();
        format!("{sep} {} {sep}", cells.join(&format!(" {sep} ")))
    }

    fn row(&self, row: &ResourceRow) -> String {
        let sep = color::muted("│");
        let [resource, status, fetched, summary, error] = row.cells();
        let [rw, sw, fw, mw, ew] = self.widths;
        format!(
            "{sep} {} {sep} {} {sep} {} {sep} {} {sep} {} {sep}",
            color::accent(&pad(resource, rw)),
            color::status(&pad(status, sw)),
            pad(fetched, fw),
            pad(summary, mw),
            color::failed(&pad(error, ew)),
        )
    }
}

/// Compute the terminal display width of a string.
///
/// Wide characters (CJK, emoji) count as 2 columns.
pub(crate) fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Pad a string to a minimum display width without truncating.
pub(crate) fn pad(s: &str, min_width: usize) -> String {
    let width = display_width(s);
    if width >= min_width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(min_width - width))
    }
}
