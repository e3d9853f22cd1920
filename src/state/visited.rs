use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Result of trying to admit a URL into the visited set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// URL was not seen before and the budget allowed it; it is now scheduled
    Admitted,
    /// URL was already in the set
    AlreadySeen,
    /// Page budget is spent; the URL was not recorded
    BudgetExhausted,
}

#[derive(Debug)]
struct VisitedInner {
    urls: HashSet<String>,
    admitted: usize,
    budget: usize,
}

/// Set of normalized URLs already scheduled, shared across frontier workers
///
/// All mutation goes through a single lock so the membership test, the
/// budget check and the insert happen as one step: two workers can never
/// both be admitted for the same URL, and `admitted` never exceeds the budget.
#[derive(Debug, Clone)]
pub struct VisitedSet {
    inner: Arc<Mutex<VisitedInner>>,
}

impl VisitedSet {
    /// Creates an empty visited set with the given page budget
    pub fn new(budget: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VisitedInner {
                urls: HashSet::new(),
                admitted: 0,
                budget,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VisitedInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Atomically checks membership and budget, then records the URL
    ///
    /// # Arguments
    ///
    /// * `url` - The normalized URL string
    ///
    /// # Returns
    ///
    /// The [`Admission`] decision
    pub fn try_admit(&self, url: &str) -> Admission {
        let mut inner = self.lock();

        if inner.urls.contains(url) {
            return Admission::AlreadySeen;
        }

        if inner.admitted >= inner.budget {
            return Admission::BudgetExhausted;
        }

        inner.urls.insert(url.to_string());
        inner.admitted += 1;
        Admission::Admitted
    }

    /// Records an alias (e.g. a redirect target) of an admitted URL
    ///
    /// Aliases do not count against the page budget.
    ///
    /// # Returns
    ///
    /// `true` if the alias was new, `false` if some page already claimed it
    pub fn mark_alias(&self, url: &str) -> bool {
        self.lock().urls.insert(url.to_string())
    }

    /// Returns true if the URL has been recorded
    pub fn contains(&self, url: &str) -> bool {
        self.lock().urls.contains(url)
    }

    /// Number of URLs admitted against the budget
    pub fn admitted(&self) -> usize {
        self.lock().admitted
    }

    /// Returns true once the budget is spent
    pub fn is_exhausted(&self) -> bool {
        let inner = self.lock();
        inner.admitted >= inner.budget
    }

    /// Snapshot of every recorded URL, sorted
    pub fn urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.lock().urls.iter().cloned().collect();
        urls.sort();
        urls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admit_once() {
        let visited = VisitedSet::new(10);
        assert_eq!(visited.try_admit("https://a.com/"), Admission::Admitted);
        assert_eq!(visited.try_admit("https://a.com/"), Admission::AlreadySeen);
        assert_eq!(visited.admitted(), 1);
    }

    #[test]
    fn test_budget_enforced() {
        let visited = VisitedSet::new(2);
        assert_eq!(visited.try_admit("https://a.com/1"), Admission::Admitted);
        assert_eq!(visited.try_admit("https://a.com/2"), Admission::Admitted);
        assert_eq!(
            visited.try_admit("https://a.com/3"),
            Admission::BudgetExhausted
        );
        assert!(visited.is_exhausted());
        assert!(!visited.contains("https://a.com/3"));
    }

    #[test]
    fn test_seen_url_reported_before_budget() {
        let visited = VisitedSet::new(1);
        visited.try_admit("https://a.com/");
        assert_eq!(visited.try_admit("https://a.com/"), Admission::AlreadySeen);
    }

    #[test]
    fn test_alias_does_not_consume_budget() {
        let visited = VisitedSet::new(1);
        visited.try_admit("https://a.com/old");
        assert!(visited.mark_alias("https://a.com/new"));
        assert!(!visited.mark_alias("https://a.com/new"));
        assert_eq!(visited.admitted(), 1);
        assert_eq!(
            visited.try_admit("https://a.com/new"),
            Admission::AlreadySeen
        );
    }

    #[test]
    fn test_concurrent_admission_is_exclusive() {
        let visited = VisitedSet::new(1000);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let visited = visited.clone();
                std::thread::spawn(move || {
                    (0..100)
                        .filter(|i| {
                            visited.try_admit(&format!("https://a.com/{}", i))
                                == Admission::Admitted
                        })
                        .count()
                })
            })
            .collect();

        let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, 100);
        assert_eq!(visited.admitted(), 100);
    }

    #[test]
    fn test_concurrent_budget_never_exceeded() {
        let visited = VisitedSet::new(25);
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let visited = visited.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        visited.try_admit(&format!("https://a.com/{}/{}", t, i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(visited.admitted(), 25);
        assert_eq!(visited.urls().len(), 25);
    }
}
