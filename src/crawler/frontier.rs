//! Crawl frontier - breadth-first URL discovery
//!
//! The frontier owns the FIFO queue of [`CrawlTarget`]s, the shared
//! [`VisitedSet`] and the page budget. A bounded pool of fetch workers pulls
//! from the queue; every fetched page that passes scope and content checks
//! is handed downstream as a [`CrawlOutcome`], together with failures so the
//! archive can report them.

use crate::convert::ContentCategory;
use crate::crawler::fetcher::{ContentKind, FetchError, FetchedPage, Fetcher};
use crate::crawler::parser::extract_links;
use crate::robots::RobotsCache;
use crate::state::{Admission, PageState, RejectReason, VisitedSet};
use crate::url::{normalize_link, normalize_parsed, ScopeDecision, ScopePolicy};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use url::Url;

/// A URL plus the depth at which it was discovered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    pub url: Url,
    pub depth: u32,
}

impl CrawlTarget {
    pub fn new(url: Url, depth: u32) -> Self {
        Self { url, depth }
    }
}

/// An accepted page ready for conversion
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    /// Final (post-redirect) URL
    pub url: Url,
    pub depth: u32,
    pub category: ContentCategory,
    pub page: FetchedPage,
}

/// What the frontier hands to the conversion stage
#[derive(Debug, Clone)]
pub enum CrawlOutcome {
    /// The page was fetched and accepted
    Fetched(FetchedDocument),
    /// The page could not be fetched
    Failed {
        url: String,
        depth: u32,
        error: FetchError,
    },
}

/// Frontier counters, reported in the archive manifest
#[derive(Debug, Clone, Default)]
pub struct FrontierStats {
    /// Final state of every URL the frontier saw
    pub states: BTreeMap<PageState, usize>,
    /// Rejected URLs by reason
    pub rejected: BTreeMap<RejectReason, usize>,
    /// Accepted pages per depth
    pub depths: BTreeMap<u32, usize>,
    /// URLs admitted against the page budget
    pub visited: usize,
    /// Deepest depth reached by an accepted page
    pub max_depth_reached: u32,
}

impl FrontierStats {
    /// Pages handed to the converter
    pub fn accepted(&self) -> usize {
        self.states.get(&PageState::Accepted).copied().unwrap_or(0)
    }

    /// Pages that could not be fetched
    pub fn failed(&self) -> usize {
        self.states.get(&PageState::Failed).copied().unwrap_or(0)
    }

    /// URLs dropped for any reason
    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }
}

/// Result of one worker visit
#[derive(Debug)]
enum Visit {
    Fetched {
        target: CrawlTarget,
        document: FetchedDocument,
        links: BTreeSet<String>,
    },
    Rejected {
        target: CrawlTarget,
        reason: RejectReason,
    },
    Failed {
        target: CrawlTarget,
        error: FetchError,
    },
}

/// State shared by every fetch worker
#[derive(Clone)]
struct WorkerContext {
    fetcher: Fetcher,
    scope: ScopePolicy,
    visited: VisitedSet,
    robots: Option<RobotsCache>,
}

/// The breadth-first discovery engine
pub struct Frontier {
    ctx: WorkerContext,
    max_depth: u32,
    concurrency: usize,
}

impl Frontier {
    /// Creates a frontier
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Shared HTTP fetcher
    /// * `scope` - Scope policy derived from the root URL
    /// * `max_pages` - Page budget; admission stops once it is spent
    /// * `max_depth` - Deepest link depth followed (root is depth 0)
    /// * `concurrency` - Number of concurrent fetch workers
    /// * `robots` - robots.txt cache, or `None` to ignore robots.txt
    pub fn new(
        fetcher: Fetcher,
        scope: ScopePolicy,
        max_pages: usize,
        max_depth: u32,
        concurrency: usize,
        robots: Option<RobotsCache>,
    ) -> Self {
        Self {
            ctx: WorkerContext {
                fetcher,
                scope,
                visited: VisitedSet::new(max_pages),
                robots,
            },
            max_depth,
            concurrency: concurrency.max(1),
        }
    }

    /// The shared visited set
    pub fn visited(&self) -> &VisitedSet {
        &self.ctx.visited
    }

    /// Crawls from `root` until the queue drains or the budget is spent
    ///
    /// Accepted pages and failures are sent on `tx`. Once the page budget is
    /// reached no new fetches start, but in-flight workers finish and their
    /// results are still delivered.
    pub async fn run(self, root: Url, tx: mpsc::Sender<CrawlOutcome>) -> FrontierStats {
        let start_time = Instant::now();
        let mut run = FrontierRun::new(self.max_depth);

        let root = CrawlTarget::new(root, 0);
        run.discover(root.url.as_str());
        run.queue.push_back(root);

        let mut workers: JoinSet<Visit> = JoinSet::new();
        let mut downstream_open = true;

        loop {
            while downstream_open && workers.len() < self.concurrency {
                let Some(target) = run.queue.pop_front() else {
                    break;
                };
                if let Some(target) = run.admit(target, &self.ctx.visited) {
                    let ctx = self.ctx.clone();
                    workers.spawn(async move { visit(ctx, target).await });
                }
            }

            let Some(joined) = workers.join_next().await else {
                break;
            };

            let visit = match joined {
                Ok(visit) => visit,
                Err(e) => {
                    tracing::error!("Fetch worker failed: {}", e);
                    continue;
                }
            };

            if let Some(outcome) = run.record(visit, &self.ctx) {
                if downstream_open && tx.send(outcome).await.is_err() {
                    tracing::warn!("Conversion stage closed; no further pages will be scheduled");
                    downstream_open = false;
                }
            }

            run.log_progress(&start_time);
        }

        // Anything still queued was never admitted.
        while let Some(target) = run.queue.pop_front() {
            run.reject(target.url.as_str(), RejectReason::BudgetExhausted);
        }

        let stats = run.finish(self.ctx.visited.admitted());
        tracing::info!(
            "Frontier finished: {} accepted, {} failed, {} rejected in {:?}",
            stats.accepted(),
            stats.failed(),
            stats.rejected_total(),
            start_time.elapsed()
        );
        stats
    }
}

/// Bookkeeping owned by the frontier's coordinating loop
struct FrontierRun {
    queue: VecDeque<CrawlTarget>,
    states: HashMap<String, PageState>,
    stats: FrontierStats,
    max_depth: u32,
    processed: usize,
}

impl FrontierRun {
    fn new(max_depth: u32) -> Self {
        Self {
            queue: VecDeque::new(),
            states: HashMap::new(),
            stats: FrontierStats::default(),
            max_depth,
            processed: 0,
        }
    }

    /// Registers a URL; returns false if it was already known
    fn discover(&mut self, url: &str) -> bool {
        if self.states.contains_key(url) {
            return false;
        }
        self.states.insert(url.to_string(), PageState::Discovered);
        true
    }

    fn transition(&mut self, url: &str, next: PageState) {
        let current = self
            .states
            .get(url)
            .copied()
            .unwrap_or(PageState::Discovered);
        debug_assert!(
            current.can_transition_to(next),
            "illegal transition {} -> {} for {}",
            current,
            next,
            url
        );
        tracing::trace!("{}: {} -> {}", url, current, next);
        self.states.insert(url.to_string(), next);
    }

    fn reject(&mut self, url: &str, reason: RejectReason) {
        tracing::debug!("Rejected {}: {}", url, reason);
        self.transition(url, PageState::Rejected);
        *self.stats.rejected.entry(reason).or_insert(0) += 1;
    }

    /// Depth and budget checks, then atomic admission into the visited set
    fn admit(&mut self, target: CrawlTarget, visited: &VisitedSet) -> Option<CrawlTarget> {
        let url = target.url.as_str();

        if target.depth > self.max_depth {
            self.reject(url, RejectReason::DepthExceeded);
            return None;
        }

        match visited.try_admit(url) {
            Admission::Admitted => {
                self.transition(url, PageState::Scheduled);
                Some(target)
            }
            Admission::AlreadySeen => {
                self.reject(url, RejectReason::Duplicate);
                None
            }
            Admission::BudgetExhausted => {
                self.reject(url, RejectReason::BudgetExhausted);
                None
            }
        }
    }

    /// Applies a worker's result; returns what should go downstream
    fn record(&mut self, visit: Visit, ctx: &WorkerContext) -> Option<CrawlOutcome> {
        self.processed += 1;

        match visit {
            Visit::Rejected { target, reason } => {
                self.reject(target.url.as_str(), reason);
                None
            }
            Visit::Failed { target, error } => {
                let url = target.url.to_string();
                tracing::warn!("Failed to fetch {}: {}", url, error);
                self.transition(&url, PageState::Failed);
                Some(CrawlOutcome::Failed {
                    url,
                    depth: target.depth,
                    error,
                })
            }
            Visit::Fetched {
                target,
                document,
                links,
            } => {
                let url = target.url.to_string();
                self.transition(&url, PageState::Fetched);
                self.transition(&url, PageState::Accepted);
                *self.stats.depths.entry(target.depth).or_insert(0) += 1;
                self.stats.max_depth_reached = self.stats.max_depth_reached.max(target.depth);

                self.enqueue_links(&links, target.depth + 1, ctx);
                Some(CrawlOutcome::Fetched(document))
            }
        }
    }

    fn enqueue_links(&mut self, links: &BTreeSet<String>, depth: u32, ctx: &WorkerContext) {
        for link in links {
            let Ok(url) = normalize_link(link) else {
                continue;
            };
            if !self.discover(url.as_str()) {
                continue;
            }

            match ctx.scope.classify(&url) {
                ScopeDecision::OutOfScope => {
                    self.reject(url.as_str(), RejectReason::OutOfScope);
                    continue;
                }
                ScopeDecision::Excluded(reason) => {
                    self.reject(url.as_str(), RejectReason::Excluded(reason));
                    continue;
                }
                _ => {}
            }

            if depth > self.max_depth {
                self.reject(url.as_str(), RejectReason::DepthExceeded);
                continue;
            }

            if ctx.visited.contains(url.as_str()) {
                self.reject(url.as_str(), RejectReason::Duplicate);
                continue;
            }

            if ctx.visited.is_exhausted() {
                self.reject(url.as_str(), RejectReason::BudgetExhausted);
                continue;
            }

            self.queue.push_back(CrawlTarget::new(url, depth));
        }
    }

    fn log_progress(&self, start_time: &Instant) {
        if self.processed > 0 && self.processed % 10 == 0 {
            let rate = self.processed as f64 / start_time.elapsed().as_secs_f64().max(0.001);
            tracing::info!(
                "Progress: {} pages processed, {} queued, {:.2} pages/sec",
                self.processed,
                self.queue.len(),
                rate
            );
        }
    }

    fn finish(mut self, visited: usize) -> FrontierStats {
        self.stats.states.clear();
        for state in self.states.values() {
            *self.stats.states.entry(*state).or_insert(0) += 1;
        }
        self.stats.visited = visited;
        self.stats
    }
}

/// One worker visit: robots check, fetch, post-redirect scope check,
/// content classification and link extraction
async fn visit(ctx: WorkerContext, target: CrawlTarget) -> Visit {
    if let Some(robots) = &ctx.robots {
        if !robots.is_allowed(&target.url).await {
            return Visit::Rejected {
                target,
                reason: RejectReason::RobotsDisallowed,
            };
        }
    }

    tracing::debug!("Fetching {} (depth {})", target.url, target.depth);
    let page = match ctx.fetcher.fetch(&target.url).await {
        Ok(page) => page,
        Err(error) => return Visit::Failed { target, error },
    };

    let final_url = match normalize_parsed(page.final_url.clone()) {
        Ok(url) => url,
        Err(_) => page.final_url.clone(),
    };

    if final_url != target.url {
        if !ctx.scope.accepts(&final_url) {
            tracing::debug!("{} redirected out of scope to {}", target.url, final_url);
            return Visit::Rejected {
                target,
                reason: RejectReason::OutOfScope,
            };
        }
        if !ctx.visited.mark_alias(final_url.as_str()) {
            tracing::debug!("{} redirected to already visited {}", target.url, final_url);
            return Visit::Rejected {
                target,
                reason: RejectReason::Duplicate,
            };
        }
    }

    let Some(category) = ContentCategory::from_kind(page.kind) else {
        tracing::debug!(
            "Unsupported content type '{}' at {}",
            page.content_type,
            final_url
        );
        return Visit::Rejected {
            target,
            reason: RejectReason::UnsupportedContent,
        };
    };

    let links = if page.kind == ContentKind::Html {
        extract_links(&page.text(), &page.final_url)
    } else {
        BTreeSet::new()
    };

    Visit::Fetched {
        document: FetchedDocument {
            url: final_url,
            depth: target.depth,
            category,
            page,
        },
        target,
        links,
    }
}
