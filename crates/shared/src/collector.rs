use std::time::Duration;

use tracing::{info, warn};

use crate::cancel::CancelFlag;
use crate::fetcher::SectionFetcher;
use crate::models::{SectionSpec, Story};

/// How many stories each processed section contributed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionTally {
    pub label: &'static str,
    pub count: usize,
}

#[derive(Debug, Default)]
pub struct CollectionReport {
    /// In section order, then arrival order within a section
    pub stories: Vec<Story>,
    pub tallies: Vec<SectionTally>,
    pub cancelled: bool,
}

impl CollectionReport {
    pub fn empty_sections(&self) -> Vec<&'static str> {
        self.tallies
            .iter()
            .filter(|t| t.count == 0)
            .map(|t| t.label)
            .collect()
    }
}

/// Drives every section through the fetcher, one at a time
pub struct BriefingCollector {
    fetcher: SectionFetcher,
    pacing: Duration,
}

impl BriefingCollector {
    pub fn new(fetcher: SectionFetcher, pacing: Duration) -> Self {
        Self { fetcher, pacing }
    }

    pub async fn collect(
        &self,
        sections: &[SectionSpec],
        date: &str,
        cancel: &CancelFlag,
    ) -> CollectionReport {
        let mut report = CollectionReport::default();

        for (index, spec) in sections.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(
                    skipped = sections.len() - index,
                    "Cancelled; skipping remaining sections"
                );
                report.cancelled = true;
                break;
            }

            let label = spec.section.label();
            println!("  → {} ({}/{})", label, index + 1, sections.len());

            let stories = self.fetcher.fetch_section(spec, date, cancel).await;
            info!(section = label, count = stories.len(), "Section fetched");
            println!("    ✓ {} stories", stories.len());

            report.tallies.push(SectionTally {
                label,
                count: stories.len(),
            });
            report.stories.extend(stories);

            // Spread requests out to stay under the rate limit; a cancelled
            // wait is caught by the check at the top of the loop
            if index + 1 < sections.len() {
                cancel.sleep(self.pacing).await;
            }
        }

        report
    }
}
