//! Offline page audit: run the scanner over a saved page and report
//! what it would hide or highlight.

use lf_core::classifier::group_has_badge;
use lf_core::scanner::density_exceeded;
use lf_core::{Dom, ManualScheduler, MemoryDom, MemoryStore, Mode, Scanner, Selector, Settings};
use serde::Serialize;

use crate::page;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditReport {
    pub mode: String,
    pub groups: usize,
    pub groups_with_badge: usize,
    /// Share of groups carrying a badge, 0.0 to 1.0
    pub density: f64,
    pub auto_disabled: bool,
    pub cards_removed: usize,
    pub cards_highlighted: usize,
    pub jobs_run: usize,
}

fn badge_density(dom: &MemoryDom) -> (usize, usize) {
    let groups = dom.query_document(Selector::Group);
    let with_badge = groups.iter().filter(|group| group_has_badge(dom, group)).count();
    (groups.len(), with_badge)
}

pub fn audit_html(html: &str, highlight: bool) -> AuditReport {
    let dom = page::load(html);
    let (groups, groups_with_badge) = badge_density(&dom);
    log::debug!("Loaded page: groups={groups} with_badge={groups_with_badge}");

    let settings = Settings {
        highlight_enabled: highlight,
        ..Settings::default()
    };
    let mut scanner = Scanner::new(dom, ManualScheduler::new(), settings).with_store(Box::new(MemoryStore::new(settings)));
    let mode = scanner.mode();
    scanner.start();
    let jobs_run = scanner.settle();

    let density = if groups == 0 {
        0.0
    } else {
        groups_with_badge as f64 / groups as f64
    };
    if mode == Mode::Filter && density_exceeded(groups, groups_with_badge) != scanner.is_auto_disabled() {
        log::warn!("Scanner disagrees with page-wide density; badges may sit outside group containers");
    }

    AuditReport {
        mode: format!("{mode:?}").to_lowercase(),
        groups,
        groups_with_badge,
        density,
        auto_disabled: scanner.is_auto_disabled(),
        cards_removed: scanner.tracker().removed_len(),
        cards_highlighted: scanner.dom().query_document(Selector::Highlighted).len(),
        jobs_run,
    }
}

pub fn print_report(report: &AuditReport) {
    println!("Mode:              {}", report.mode);
    println!("Groups:            {}", report.groups);
    println!(
        "Groups with badge: {} ({:.1}%)",
        report.groups_with_badge,
        report.density * 100.0
    );
    println!("Auto-disabled:     {}", if report.auto_disabled { "yes" } else { "no" });
    println!("Cards removed:     {}", report.cards_removed);
    println!("Cards highlighted: {}", report.cards_highlighted);
}
