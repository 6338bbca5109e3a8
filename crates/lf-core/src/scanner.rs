//! The scan / hide / restore engine.
//!
//! [`Scanner`] owns all mutable state of one page: cached settings, counters,
//! the removed-card registry, the debounce queues and the auto-disable
//! cooldown. Hosts feed it events (storage changes, added nodes, menu toggles,
//! fired jobs) from a single thread.

use log::{debug, info, warn};
use serde::Serialize;

use crate::classifier::{group_has_badge, is_badge, is_local_text, CardResolver, GroupAncestorResolver};
use crate::dom::{Dom, ScanRoot};
use crate::menu::{MenuStatus, MenuView};
use crate::scheduler::{Deferral, Job, ManualScheduler, Scheduler, TaskId};
use crate::settings::{SettingKey, Settings, SettingsChange, SettingsStore};
use crate::transition::{decide_removal, RemovalOutcome, Tracker};
use crate::types::*;

/// Running totals shown in the menu. Reset by every restore.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    pub removed: usize,
    pub hidden: usize,
}

/// Outcome of a single [`Scanner::scan`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Scan did not run (cooldown, or root was not an element)
    pub skipped: bool,
    /// Group containers under the root
    pub groups: usize,
    /// Groups holding a badge; only sampled when `groups` reaches the minimum
    pub groups_with_badge: usize,
    /// Badges resolved to a card during this scan
    pub badges_matched: usize,
    pub auto_disabled: bool,
}

/// Whether badge density is high enough to switch filtering off.
pub fn density_exceeded(groups: usize, groups_with_badge: usize) -> bool {
    groups >= AUTO_DISABLE_MIN_GROUPS && groups_with_badge * 10 >= groups * AUTO_DISABLE_DENSITY_TENTHS
}

/// Per-page engine state.
pub struct Scanner<D: Dom, S, R = GroupAncestorResolver> {
    dom: D,
    scheduler: S,
    resolver: R,
    store: Option<Box<dyn SettingsStore>>,
    view: Option<Box<dyn MenuView>>,
    settings: Settings,
    auto_disabled: bool,
    cooldown_until: Option<f64>,
    counters: Counters,
    tracker: Tracker<D::Node>,
    pending_roots: Vec<ScanRoot<D::Node>>,
    document_queued: bool,
    scan_task: Option<TaskId>,
    render_task: Option<TaskId>,
}

impl<D, S> Scanner<D, S>
where
    D: Dom,
    S: Scheduler<D::Node>,
{
    pub fn new(dom: D, scheduler: S, settings: Settings) -> Self {
        Self::with_resolver(dom, scheduler, settings, GroupAncestorResolver::default())
    }
}

impl<D, S, R> Scanner<D, S, R>
where
    D: Dom,
    S: Scheduler<D::Node>,
    R: CardResolver<D>,
{
    pub fn with_resolver(dom: D, scheduler: S, settings: Settings, resolver: R) -> Self {
        Self {
            dom,
            scheduler,
            resolver,
            store: None,
            view: None,
            settings,
            auto_disabled: false,
            cooldown_until: None,
            counters: Counters::default(),
            tracker: Tracker::new(),
            pending_roots: Vec::new(),
            document_queued: false,
            scan_task: None,
            render_task: None,
        }
    }

    pub fn with_store(mut self, store: Box<dyn SettingsStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Attach the floating menu and paint it once.
    pub fn attach_view(&mut self, view: Box<dyn MenuView>) {
        self.view = Some(view);
        self.render();
        self.update_menu_visibility();
    }

    // =============================================================================
    // Accessors
    // =============================================================================

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut D {
        &mut self.dom
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    pub fn tracker(&self) -> &Tracker<D::Node> {
        &self.tracker
    }

    pub fn is_auto_disabled(&self) -> bool {
        self.auto_disabled
    }

    pub fn cooldown_until(&self) -> Option<f64> {
        self.cooldown_until
    }

    pub fn mode(&self) -> Mode {
        Mode::from_toggles(self.settings.filter_enabled, self.settings.highlight_enabled)
    }

    pub fn in_cooldown(&self) -> bool {
        self.cooldown_until
            .is_some_and(|until| self.scheduler.now_ms() < until)
    }

    pub fn status(&self) -> MenuStatus {
        MenuStatus::new(
            self.settings.filter_enabled,
            self.settings.highlight_enabled,
            self.auto_disabled,
            self.counters.hidden,
        )
    }

    // =============================================================================
    // Lifecycle
    // =============================================================================

    /// Apply the loaded settings and queue the first full scan.
    pub fn start(&mut self) {
        info!(
            "Starting: filter={} highlight={} menu={}",
            self.settings.filter_enabled, self.settings.highlight_enabled, self.settings.menu_enabled
        );
        self.set_filter_enabled(self.settings.filter_enabled);
        if self.settings.highlight_enabled {
            self.set_highlight_enabled(true, false);
        }
        self.update_menu_visibility();
        self.schedule_scan(ScanRoot::Document);
    }

    /// Resume deferred work handed out through the scheduler.
    pub fn run_job(&mut self, job: Job<D::Node>) {
        match job {
            Job::FlushScans => self.flush_scans(),
            Job::Render => {
                self.render_task = None;
                self.render();
            }
            Job::CompleteRemoval(card) => self.complete_removal(card),
            Job::RestoreFirstFrame(card) => {
                self.scheduler
                    .schedule(Deferral::AnimationFrame, Job::RestoreSecondFrame(card));
            }
            Job::RestoreSecondFrame(card) => {
                self.dom.remove_class(&card, RESTORING_CLASS);
                self.scheduler
                    .schedule(Deferral::Delay(TRANSITION_MS), Job::RestoreCleanup(card));
            }
            Job::RestoreCleanup(card) => {
                self.dom.remove_class(&card, RESTORE_ANIM_CLASS);
            }
        }
    }

    // =============================================================================
    // Settings
    // =============================================================================

    pub fn set_filter_enabled(&mut self, enabled: bool) {
        info!("Filter {}", if enabled { "enabled" } else { "disabled" });
        self.settings.filter_enabled = enabled;
        self.auto_disabled = false;
        if enabled {
            self.cooldown_until = None;
        }
        self.render();

        if !enabled {
            self.restore_all();
            self.drop_scans_if_inactive();
            return;
        }

        self.schedule_scan(ScanRoot::Document);
        self.scan(&ScanRoot::Document, true);
    }

    pub fn set_highlight_enabled(&mut self, enabled: bool, persist: bool) {
        info!("Highlight {}", if enabled { "enabled" } else { "disabled" });
        self.settings.highlight_enabled = enabled;
        if persist {
            self.persist(SettingsChange::single(SettingKey::HighlightEnabled, enabled));
        }

        if enabled {
            self.restore_all();
            self.schedule_scan(ScanRoot::Document);
            self.scan(&ScanRoot::Document, true);
        } else {
            self.clear_highlights();
            if self.settings.filter_enabled {
                self.schedule_scan(ScanRoot::Document);
                self.scan(&ScanRoot::Document, true);
            } else {
                self.drop_scans_if_inactive();
            }
        }
        self.render();
        self.schedule_render();
    }

    pub fn set_menu_enabled(&mut self, enabled: bool) {
        self.settings.menu_enabled = enabled;
        self.update_menu_visibility();
    }

    /// Filter switch in the floating menu: persist, then apply.
    ///
    /// A failed write still applies the change in memory.
    pub fn toggle_filter_from_menu(&mut self, enabled: bool) {
        self.persist(SettingsChange::single(SettingKey::FilterEnabled, enabled));
        self.set_filter_enabled(enabled);
    }

    /// Highlight switch in the floating menu.
    pub fn toggle_highlight_from_menu(&mut self, enabled: bool) {
        self.set_highlight_enabled(enabled, true);
    }

    /// React to a storage change notification. Values equal to the cached
    /// ones are ignored, which also absorbs the echo of our own writes.
    pub fn apply_change(&mut self, change: &SettingsChange) {
        if let Some(next) = change.filter_enabled {
            if next != self.settings.filter_enabled {
                self.set_filter_enabled(next);
            }
        }
        if let Some(next) = change.highlight_enabled {
            if next != self.settings.highlight_enabled {
                self.set_highlight_enabled(next, false);
            }
        }
        if let Some(next) = change.menu_enabled {
            if next != self.settings.menu_enabled {
                self.set_menu_enabled(next);
            }
        }
    }

    fn persist(&mut self, change: SettingsChange) {
        if let Some(store) = self.store.as_mut() {
            if let Err(e) = store.persist(&change) {
                warn!("Settings not persisted, applying in memory only: {e}");
            }
        }
    }

    // =============================================================================
    // Scanning
    // =============================================================================

    /// Queue `root` for the next debounced flush. Dropped during cooldown.
    pub fn schedule_scan(&mut self, root: ScanRoot<D::Node>) {
        if self.in_cooldown() {
            return;
        }
        let queued = match &root {
            ScanRoot::Document => std::mem::replace(&mut self.document_queued, true),
            ScanRoot::Node(node) => {
                if !self.dom.is_element(node) {
                    return;
                }
                let queued = self.dom.has_flag(node, CardFlags::QUEUED);
                if !queued {
                    self.dom.set_flags(node, CardFlags::QUEUED);
                }
                queued
            }
        };
        if !queued {
            self.pending_roots.push(root);
        }
        if self.scan_task.is_some() {
            return;
        }
        let task = self.scheduler.schedule(
            Deferral::Idle {
                timeout_ms: SCAN_IDLE_TIMEOUT_MS,
                fallback_ms: SCAN_FALLBACK_DELAY_MS,
            },
            Job::FlushScans,
        );
        self.scan_task = Some(task);
    }

    /// Empty the scan queue and clear its membership marks.
    fn take_pending_roots(&mut self) -> Vec<ScanRoot<D::Node>> {
        self.document_queued = false;
        let roots = std::mem::take(&mut self.pending_roots);
        for root in &roots {
            if let ScanRoot::Node(node) = root {
                self.dom.clear_flags(node, CardFlags::QUEUED);
            }
        }
        roots
    }

    fn flush_scans(&mut self) {
        self.scan_task = None;
        let roots = self.take_pending_roots();
        if !self.mode().is_active() {
            return;
        }
        debug!("Flushing {} scan root(s)", roots.len());
        for root in &roots {
            self.scan(root, false);
        }
    }

    fn drop_scans_if_inactive(&mut self) {
        if self.mode().is_active() {
            return;
        }
        self.take_pending_roots();
        if let Some(task) = self.scan_task.take() {
            self.scheduler.cancel(task);
        }
    }

    /// Scan a subtree for badges and hide or highlight their cards.
    ///
    /// Groups marked checked are skipped unless `force` is set.
    pub fn scan(&mut self, root: &ScanRoot<D::Node>, force: bool) -> ScanReport {
        let mut report = ScanReport::default();
        let Some(root) = root.resolve(&self.dom) else {
            report.skipped = true;
            return report;
        };
        if self.in_cooldown() {
            report.skipped = true;
            return report;
        }

        let groups = self.dom.query_all(&root, Selector::Group);
        report.groups = groups.len();
        if groups.len() >= AUTO_DISABLE_MIN_GROUPS {
            report.groups_with_badge = groups
                .iter()
                .filter(|group| group_has_badge(&self.dom, group))
                .count();
        }

        if self.handle_potential_badge(&root) {
            report.badges_matched += 1;
        }

        for span in self.dom.query_all(&root, Selector::BadgeFastPath) {
            if self.hide_card_for_badge(&span) {
                report.badges_matched += 1;
            }
        }

        for group in self.dom.query_all(&root, Selector::Group) {
            if !force && self.dom.has_flag(&group, CardFlags::CHECKED) {
                continue;
            }

            let badge = self
                .dom
                .query_all(&group, Selector::Span)
                .into_iter()
                .find(|span| is_local_text(&self.dom, span));
            let found = badge.is_some();
            if let Some(span) = badge {
                if self.hide_card_for_badge(&span) {
                    report.badges_matched += 1;
                }
            }

            self.dom.set_flags(&group, CardFlags::CHECKED);
            if found {
                self.dom.set_flags(&group, CardFlags::PROCESSED);
            }
        }

        if self.mode() == Mode::Filter && density_exceeded(report.groups, report.groups_with_badge) {
            self.auto_disable(&report);
            report.auto_disabled = true;
        }

        debug!(
            "Scan: groups={} with_badge={} matched={} force={}",
            report.groups, report.groups_with_badge, report.badges_matched, force
        );
        report
    }

    /// Single-node check for a badge inserted on its own.
    pub fn handle_potential_badge(&mut self, node: &D::Node) -> bool {
        is_badge(&self.dom, node) && self.hide_card_for_badge(node)
    }

    fn hide_card_for_badge(&mut self, badge: &D::Node) -> bool {
        let Some(card) = self.resolver.resolve_card(&self.dom, badge) else {
            return false;
        };
        self.dom.set_flags(&card, CardFlags::PROCESSED);
        self.hide_card(&card);
        true
    }

    // =============================================================================
    // Mutations
    // =============================================================================

    /// Mutation observer callback: nodes added anywhere in the document.
    ///
    /// Each added element gets the single-node badge check and a debounced
    /// scan rooted at itself. Groups already marked checked stay skipped.
    pub fn on_nodes_added<I>(&mut self, nodes: I)
    where
        I: IntoIterator<Item = D::Node>,
    {
        if self.in_cooldown() || !self.mode().is_active() {
            return;
        }
        for node in nodes {
            if !self.dom.is_element(&node) {
                continue;
            }
            self.handle_potential_badge(&node);
            self.schedule_scan(ScanRoot::Node(node));
        }
    }

    // =============================================================================
    // Hide / highlight / restore
    // =============================================================================

    pub fn hide_card(&mut self, card: &D::Node) {
        match self.mode() {
            Mode::Highlight => {
                self.highlight_card(card);
                return;
            }
            Mode::Off => return,
            Mode::Filter => {}
        }
        if self.dom.has_flag(card, CardFlags::REMOVED) || self.dom.has_flag(card, CardFlags::HIDDEN) {
            return;
        }

        self.dom.set_flags(card, CardFlags::REMOVED | CardFlags::HIDDEN);
        self.counters.removed += 1;
        self.counters.hidden += 1;
        self.dom.add_class(card, REMOVING_CLASS);

        self.scheduler
            .schedule(Deferral::Delay(TRANSITION_MS), Job::CompleteRemoval(card.clone()));
        self.tracker.begin_removal(card.clone());
    }

    fn complete_removal(&mut self, card: D::Node) {
        if !self.tracker.is_removing(&card) {
            return;
        }
        match decide_removal(self.dom.is_connected(&card), self.mode()) {
            RemovalOutcome::Abandon => {
                self.tracker.end_removal(&card);
            }
            RemovalOutcome::RollBack => {
                self.tracker.end_removal(&card);
                self.dom.remove_class(&card, REMOVING_CLASS);
                self.dom.clear_flags(&card, CardFlags::REMOVED | CardFlags::HIDDEN);
            }
            RemovalOutcome::Commit => {
                let placeholder = self.dom.create_placeholder();
                if self.dom.replace_with(&card, &placeholder) {
                    self.tracker.commit(placeholder, card);
                    self.schedule_render();
                } else {
                    self.tracker.end_removal(&card);
                }
            }
        }
    }

    pub fn highlight_card(&mut self, card: &D::Node) {
        if self.dom.has_flag(card, CardFlags::HIGHLIGHTED) {
            return;
        }
        self.dom.set_flags(card, CardFlags::HIGHLIGHTED);
        self.dom.add_class(card, HIGHLIGHT_CLASS);
    }

    /// Put every removed card back where its placeholder sits.
    pub fn restore_all(&mut self) {
        let entries = self.tracker.drain_removed();
        let mut restored = 0usize;
        for (placeholder, card) in entries {
            if !self.dom.is_connected(&placeholder) {
                continue;
            }
            self.dom.replace_with(&placeholder, &card);
            self.dom.remove_class(&card, REMOVING_CLASS);
            self.dom.add_class(&card, RESTORE_ANIM_CLASS);
            self.dom.add_class(&card, RESTORING_CLASS);
            self.dom.force_reflow(&card);
            self.scheduler
                .schedule(Deferral::AnimationFrame, Job::RestoreFirstFrame(card.clone()));
            self.dom.clear_flags(&card, CardFlags::RESTORE_CLEARED);
            restored += 1;
        }
        if restored > 0 {
            debug!("Restored {restored} card(s)");
        }
        self.counters = Counters::default();
        self.schedule_render();
    }

    pub fn clear_highlights(&mut self) {
        for node in self.dom.query_document(Selector::Highlighted) {
            self.dom.remove_class(&node, HIGHLIGHT_CLASS);
            self.dom.clear_flags(&node, CardFlags::HIGHLIGHTED);
        }
    }

    fn auto_disable(&mut self, report: &ScanReport) {
        if self.auto_disabled {
            return;
        }
        info!(
            "Auto-disabling filter: {}/{} groups carry the badge",
            report.groups_with_badge, report.groups
        );
        self.auto_disabled = true;
        self.settings.filter_enabled = false;
        self.cooldown_until = Some(self.scheduler.now_ms() + AUTO_DISABLE_COOLDOWN_MS);
        self.restore_all();
        self.schedule_render();
    }

    // =============================================================================
    // Rendering
    // =============================================================================

    /// Paint the menu now.
    pub fn render(&mut self) {
        let status = self.status();
        if let Some(view) = self.view.as_mut() {
            view.render(&status);
        }
    }

    fn schedule_render(&mut self) {
        if self.render_task.is_some() {
            return;
        }
        let task = self.scheduler.schedule(
            Deferral::Idle {
                timeout_ms: RENDER_IDLE_TIMEOUT_MS,
                fallback_ms: RENDER_FALLBACK_DELAY_MS,
            },
            Job::Render,
        );
        self.render_task = Some(task);
    }

    fn update_menu_visibility(&mut self) {
        let visible = self.settings.menu_enabled;
        if let Some(view) = self.view.as_mut() {
            view.set_visible(visible);
        }
    }
}

/// Upper bound on jobs run by one [`Scanner::settle`] call.
const SETTLE_LIMIT: usize = 100_000;

impl<D, R> Scanner<D, ManualScheduler<D::Node>, R>
where
    D: Dom,
    R: CardResolver<D>,
{
    /// Run every job due within the next `ms` milliseconds of virtual time.
    pub fn advance(&mut self, ms: f64) {
        let deadline = self.scheduler.now_ms() + ms;
        while let Some(job) = self.scheduler.pop_due(deadline) {
            self.run_job(job);
        }
        self.scheduler.set_now(deadline);
    }

    /// Run jobs until nothing is pending. Returns the number of jobs run.
    pub fn settle(&mut self) -> usize {
        let mut ran = 0;
        while ran < SETTLE_LIMIT {
            let Some(job) = self.scheduler.pop_due(f64::INFINITY) else {
                break;
            };
            self.run_job(job);
            ran += 1;
        }
        ran
    }
}
