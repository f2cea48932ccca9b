use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::cancel::CancelFlag;
use crate::claude::{Message, MessageRequest, MessagesApi, Tool, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
use crate::models::{SectionSpec, Story};
use crate::parser::{extract_stories, Record};

const SYSTEM_PROMPT: &str = "You are a professional news curator. You research current events \
with web search and report them accurately, always answering with a JSON array when asked.";

/// Opening bracket the follow-up call pre-seeds the assistant turn with
const PRIMER: &str = "[";

/// Request parameters and retry timing for section fetches
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    pub model: String,
    pub max_tokens: u32,
    /// Upper bound on searches per request; `None` leaves it to the API
    pub max_searches: Option<u32>,
    pub max_attempts: u32,
    /// Wait after failed attempt `n` is `backoff_step * n`
    pub backoff_step: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            max_searches: None,
            max_attempts: 3,
            backoff_step: Duration::from_secs(10),
        }
    }
}

impl FetchPolicy {
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_step * attempt
    }
}

#[derive(Debug)]
enum FetchState {
    Attempting(u32),
    Succeeded(Vec<Record>),
    Exhausted,
}

/// Fetches one section's stories, absorbing every failure into an empty list
pub struct SectionFetcher {
    api: Arc<dyn MessagesApi>,
    policy: FetchPolicy,
}

impl SectionFetcher {
    pub fn new(api: Arc<dyn MessagesApi>, policy: FetchPolicy) -> Self {
        Self { api, policy }
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    pub async fn fetch_section(
        &self,
        spec: &SectionSpec,
        date: &str,
        cancel: &CancelFlag,
    ) -> Vec<Story> {
        let label = spec.section.label();
        let mut state = FetchState::Attempting(1);

        let records = loop {
            state = match state {
                FetchState::Attempting(attempt) => {
                    if cancel.is_cancelled() {
                        info!(section = label, "Cancelled before request");
                        FetchState::Exhausted
                    } else {
                        self.attempt(spec, date, attempt, cancel).await
                    }
                }
                FetchState::Succeeded(records) => break records,
                FetchState::Exhausted => break Vec::new(),
            };
        };

        records
            .iter()
            .map(|record| Story::from_record(spec.section, record))
            .collect()
    }

    async fn attempt(
        &self,
        spec: &SectionSpec,
        date: &str,
        attempt: u32,
        cancel: &CancelFlag,
    ) -> FetchState {
        let label = spec.section.label();
        let request = self.search_request(spec, date);

        match self.api.create_message(&request).await {
            Err(e) if attempt < self.policy.max_attempts => {
                let delay = self.policy.backoff(attempt);
                warn!(
                    section = label,
                    attempt,
                    max = self.policy.max_attempts,
                    ?delay,
                    error = %e,
                    "Request failed; backing off"
                );
                if !cancel.sleep(delay).await {
                    info!(section = label, "Cancelled during backoff");
                    return FetchState::Exhausted;
                }
                FetchState::Attempting(attempt + 1)
            }
            Err(e) => {
                error!(
                    section = label,
                    attempt,
                    error = %e,
                    "Request failed; giving up on section"
                );
                FetchState::Exhausted
            }
            Ok(response) => {
                if response.stop_reason.as_deref() == Some("max_tokens") {
                    warn!(section = label, "Response hit max_tokens; output may be truncated");
                }

                let text = response.text();
                let records = extract_stories(&text);
                if !records.is_empty() {
                    return FetchState::Succeeded(records);
                }

                debug!(
                    section = label,
                    chars = text.len(),
                    "No parseable stories in response; asking for JSON directly"
                );
                if cancel.is_cancelled() {
                    return FetchState::Exhausted;
                }
                FetchState::Succeeded(self.follow_up(spec, date, &text).await)
            }
        }
    }

    /// One tool-free call with the assistant turn primed to open an array
    async fn follow_up(&self, spec: &SectionSpec, date: &str, notes: &str) -> Vec<Record> {
        let request = self.follow_up_request(spec, date, notes);

        match self.api.create_message(&request).await {
            Ok(response) => {
                let text = response.text();
                if text.trim().is_empty() {
                    warn!(section = spec.section.label(), "Follow-up returned no text");
                    return Vec::new();
                }
                extract_stories(&format!("{}{}", PRIMER, text))
            }
            Err(e) => {
                warn!(section = spec.section.label(), error = %e, "Follow-up request failed");
                Vec::new()
            }
        }
    }

    fn search_request(&self, spec: &SectionSpec, date: &str) -> MessageRequest {
        MessageRequest {
            model: self.policy.model.clone(),
            max_tokens: self.policy.max_tokens,
            system: Some(SYSTEM_PROMPT.to_string()),
            messages: vec![Message::user(search_prompt(spec, date))],
            tools: vec![Tool::web_search(self.policy.max_searches)],
        }
    }

    fn follow_up_request(&self, spec: &SectionSpec, date: &str, notes: &str) -> MessageRequest {
        MessageRequest {
            model: self.policy.model.clone(),
            max_tokens: self.policy.max_tokens,
            system: Some(SYSTEM_PROMPT.to_string()),
            messages: vec![
                Message::user(follow_up_prompt(spec, date, notes)),
                Message::assistant(PRIMER),
            ],
            tools: Vec::new(),
        }
    }
}

fn search_prompt(spec: &SectionSpec, date: &str) -> String {
    format!(
        r#"Today is {date}. Search the web for the latest news on: {query}

Find up to {count} of the most important recent stories for the "{label}" section of a daily briefing.

For EACH story provide:
- headline: a concise headline
- source: the publication name
- date: the publication date
- summary: 2-3 sentences on the key facts and implications
- url: a direct link to the source article

Prefer sources such as Reuters, Bloomberg, The Guardian, The Economist, Wall Street Journal, CNBC,
TechCrunch, Business Insider, Times of India, Mint, Hindustan Times, Economic Times and
Analytics India Magazine.

Format the output as a JSON array where each item is:
{{"headline": "...", "source": "...", "date": "...", "summary": "...", "url": "..."}}

Return ONLY the JSON array, no other text."#,
        date = date,
        query = spec.query,
        count = spec.count,
        label = spec.section.label(),
    )
}

fn follow_up_prompt(spec: &SectionSpec, date: &str, notes: &str) -> String {
    let notes = if notes.trim().is_empty() {
        "(none)"
    } else {
        notes.trim()
    };

    format!(
        r#"Today is {date}. Turn the research notes below into the "{label}" section of a daily briefing: up to {count} stories about {query}

Notes:
{notes}

Respond with a JSON array where each item is:
{{"headline": "...", "source": "...", "date": "...", "summary": "...", "url": "..."}}

Return ONLY the JSON array."#,
        date = date,
        label = spec.section.label(),
        count = spec.count,
        query = spec.query,
        notes = notes,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Section, DEFAULT_SECTIONS};
    use crate::test_support::{ok, transient, ScriptedApi};

    fn instant_policy() -> FetchPolicy {
        FetchPolicy {
            backoff_step: Duration::ZERO,
            ..FetchPolicy::default()
        }
    }

    fn fetcher(api: &Arc<ScriptedApi>) -> SectionFetcher {
        SectionFetcher::new(api.clone(), instant_policy())
    }

    fn wars() -> &'static SectionSpec {
        &DEFAULT_SECTIONS[0]
    }

    #[test]
    fn test_backoff_sequence() {
        let policy = FetchPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_secs(10));
        assert_eq!(policy.backoff(2), Duration::from_secs(20));
        assert_eq!(policy.max_attempts, 3);
    }

    #[tokio::test]
    async fn test_first_attempt_success_stamps_section() {
        let api = Arc::new(ScriptedApi::new(vec![ok(
            r#"[{"headline": "Ceasefire talks resume", "section": "Other", "source": "Reuters"}]"#,
        )]));

        let stories = fetcher(&api)
            .fetch_section(wars(), "Monday, October 19, 2026", &CancelFlag::new())
            .await;

        assert_eq!(stories.len(), 1);
        assert_eq!(stories[0].section, Section::WarsAndConflicts.label());
        assert_eq!(stories[0].headline, "Ceasefire talks resume");
        assert_eq!(api.call_count(), 1);

        let request = &api.requests()[0];
        assert_eq!(request.tools.len(), 1);
        assert_eq!(request.tools[0].name, "web_search");
        assert!(request.messages[0].content.contains("Monday, October 19, 2026"));
        assert!(request.messages[0].content.contains("Wars & Conflicts"));
    }

    #[tokio::test]
    async fn test_three_transient_failures_yield_empty() {
        let api = Arc::new(ScriptedApi::new(vec![transient(), transient(), transient()]));

        let stories = fetcher(&api)
            .fetch_section(wars(), "today", &CancelFlag::new())
            .await;

        assert!(stories.is_empty());
        assert_eq!(api.call_count(), 3);
    }

    #[tokio::test]
    async fn test_recovers_on_third_attempt() {
        let api = Arc::new(ScriptedApi::new(vec![
            transient(),
            transient(),
            ok(r#"[{"headline": "A"}, {"headline": "B"}]"#),
        ]));

        let stories = fetcher(&api)
            .fetch_section(wars(), "today", &CancelFlag::new())
            .await;

        let headlines: Vec<_> = stories.iter().map(|s| s.headline.as_str()).collect();
        assert_eq!(headlines, vec!["A", "B"]);
        assert_eq!(api.call_count(), 3);
    }

    #[tokio::test]
    async fn test_unparseable_text_triggers_primed_follow_up() {
        let api = Arc::new(ScriptedApi::new(vec![
            ok("I found several stories about the conflict but ran out of room."),
            ok(r#"{"headline": "Primed", "url": "https://x.com"}]"#),
        ]));

        let stories = fetcher(&api)
            .fetch_section(wars(), "today", &CancelFlag::new())
            .await;

        assert_eq!(stories.len(), 1);
        assert_eq!(stories[0].headline, "Primed");
        assert_eq!(api.call_count(), 2);

        let follow_up = &api.requests()[1];
        assert!(follow_up.tools.is_empty());
        assert_eq!(follow_up.messages.last(), Some(&Message::assistant("[")));
        assert!(follow_up.messages[0].content.contains("ran out of room"));
    }

    #[tokio::test]
    async fn test_empty_text_follow_up_still_empty() {
        let api = Arc::new(ScriptedApi::new(vec![ok(""), ok("Sorry, nothing found.")]));

        let stories = fetcher(&api)
            .fetch_section(wars(), "today", &CancelFlag::new())
            .await;

        assert!(stories.is_empty());
        // No further retries once a response came back
        assert_eq!(api.call_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_follow_up_yields_empty() {
        let api = Arc::new(ScriptedApi::new(vec![ok("no json here"), transient()]));

        let stories = fetcher(&api)
            .fetch_section(wars(), "today", &CancelFlag::new())
            .await;

        assert!(stories.is_empty());
        assert_eq!(api.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_waits_ten_then_twenty_seconds() {
        let api = Arc::new(ScriptedApi::new(vec![transient(), transient(), transient()]));
        let fetcher = SectionFetcher::new(api.clone(), FetchPolicy::default());
        let start = tokio::time::Instant::now();

        let stories = fetcher
            .fetch_section(wars(), "today", &CancelFlag::new())
            .await;

        assert!(stories.is_empty());
        assert_eq!(api.call_count(), 3);
        // No wait after the final failure
        assert_eq!(start.elapsed(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_failure_waits_ten_seconds() {
        let api = Arc::new(ScriptedApi::new(vec![transient(), ok(r#"[{"headline": "A"}]"#)]));
        let fetcher = SectionFetcher::new(api.clone(), FetchPolicy::default());
        let start = tokio::time::Instant::now();

        let stories = fetcher
            .fetch_section(wars(), "today", &CancelFlag::new())
            .await;

        assert_eq!(stories.len(), 1);
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_cuts_backoff_short() {
        let api = Arc::new(ScriptedApi::new(vec![transient(), ok(r#"[{"headline": "A"}]"#)]));
        let fetcher = SectionFetcher::new(api.clone(), FetchPolicy::default());
        let cancel = CancelFlag::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });
        let start = tokio::time::Instant::now();

        let stories = fetcher.fetch_section(wars(), "today", &cancel).await;

        assert!(stories.is_empty());
        assert_eq!(api.call_count(), 1);
        assert_eq!(start.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_cancelled_flag_skips_request() {
        let api = Arc::new(ScriptedApi::always(r#"[{"headline": "A"}]"#));
        let cancel = CancelFlag::new();
        cancel.cancel();

        let stories = fetcher(&api).fetch_section(wars(), "today", &cancel).await;

        assert!(stories.is_empty());
        assert_eq!(api.call_count(), 0);
    }

    #[tokio::test]
    async fn test_max_searches_passed_to_tool() {
        let api = Arc::new(ScriptedApi::always(r#"[{"headline": "A"}]"#));
        let policy = FetchPolicy {
            max_searches: Some(4),
            ..instant_policy()
        };

        SectionFetcher::new(api.clone(), policy)
            .fetch_section(wars(), "today", &CancelFlag::new())
            .await;

        assert_eq!(api.requests()[0].tools[0].max_uses, Some(4));
    }
}
