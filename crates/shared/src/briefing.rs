use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::models::{Section, Story};

pub const DEFAULT_START_URL: &str = "/daily-briefing/";
pub const CACHE_NAME: &str = "briefing-v1";
const THEME_COLOR: &str = "#0F172A";

const EMPTY_STATE: &str = "No stories available today. Check back after the next update.";

pub struct BriefingGenerator;

impl BriefingGenerator {
    /// Group stories by section, keeping first-seen section order and the
    /// original order within each section
    fn group_by_section(stories: &[Story]) -> Vec<(&str, Vec<&Story>)> {
        let mut groups: Vec<(&str, Vec<&Story>)> = Vec::new();

        for story in stories {
            let section = if story.section.is_empty() {
                "Other"
            } else {
                story.section.as_str()
            };

            match groups.iter_mut().find(|(name, _)| *name == section) {
                Some((_, items)) => items.push(story),
                None => groups.push((section, vec![story])),
            }
        }

        groups
    }

    fn count_label(count: usize) -> String {
        if count == 1 {
            "1 story".to_string()
        } else {
            format!("{} stories", count)
        }
    }

    pub fn generate(stories: &[Story], date_str: &str, generated_at: DateTime<Utc>) -> String {
        let mut html = String::new();
        let date = Self::escape_html(date_str);

        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        html.push_str("<meta charset=\"UTF-8\">\n");
        html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0, user-scalable=no\">\n");
        html.push_str("<meta name=\"apple-mobile-web-app-capable\" content=\"yes\">\n");
        html.push_str("<meta name=\"apple-mobile-web-app-status-bar-style\" content=\"black-translucent\">\n");
        html.push_str(&format!("<meta name=\"theme-color\" content=\"{}\">\n", THEME_COLOR));
        html.push_str("<link rel=\"manifest\" href=\"manifest.json\">\n");
        html.push_str(&format!("<title>Daily Briefing — {}</title>\n", date));
        html.push_str("<link href=\"https://fonts.googleapis.com/css2?family=Inter:wght@400;500;600;700&display=swap\" rel=\"stylesheet\">\n");
        html.push_str("<style>\n");
        html.push_str("* { margin:0; padding:0; box-sizing:border-box; }\n");
        html.push_str("body { font-family:'Inter',sans-serif; background:#0F172A; color:#E2E8F0; overscroll-behavior:none; }\n");
        html.push_str(".top-bar { position:fixed; top:0; left:0; right:0; z-index:100; background:rgba(15,23,42,0.95); backdrop-filter:blur(10px); padding:12px 16px; display:flex; justify-content:space-between; align-items:center; border-bottom:1px solid rgba(255,255,255,0.1); }\n");
        html.push_str(".top-bar h1 { font-size:14px; font-weight:600; color:#F8FAFC; }\n");
        html.push_str(".counter { font-size:12px; color:#94A3B8; }\n");
        html.push_str(".progress { position:fixed; top:52px; left:0; right:0; height:3px; background:rgba(255,255,255,0.1); z-index:100; }\n");
        html.push_str(".progress-fill { height:100%; width:0; background:linear-gradient(90deg,#F59E0B,#EF4444); transition:width 0.3s; }\n");
        html.push_str(".card-container { padding:68px 16px 80px; min-height:100vh; }\n");
        html.push_str(".card { background:#1E293B; border-radius:16px; padding:20px; margin-bottom:12px; border-left:4px solid #666; transition:transform 0.2s; }\n");
        html.push_str(".card:active { transform:scale(0.98); }\n");
        html.push_str(".section-tag { display:inline-block; font-size:11px; font-weight:600; text-transform:uppercase; letter-spacing:0.05em; padding:4px 10px; border-radius:20px; margin-bottom:10px; }\n");
        html.push_str(".headline { font-size:17px; font-weight:700; color:#F8FAFC; line-height:1.35; margin-bottom:8px; }\n");
        html.push_str(".headline a { color:inherit; text-decoration:none; }\n");
        html.push_str(".headline a:hover { text-decoration:underline; }\n");
        html.push_str(".meta { font-size:12px; color:#64748B; margin-bottom:8px; }\n");
        html.push_str(".summary { font-size:14px; color:#CBD5E1; line-height:1.55; }\n");
        html.push_str(".section-header { font-size:13px; font-weight:700; text-transform:uppercase; letter-spacing:0.08em; padding:16px 0 8px; border-bottom:1px solid rgba(255,255,255,0.08); margin-bottom:12px; }\n");
        html.push_str(".empty-state { text-align:center; padding:80px 24px; color:#94A3B8; font-size:15px; }\n");
        html.push_str(".footer { text-align:center; padding:24px; color:#475569; font-size:12px; }\n");
        html.push_str("</style>\n");
        html.push_str("</head>\n<body>\n\n");

        html.push_str("<div class=\"top-bar\">\n");
        html.push_str("  <h1>📰 Daily Briefing</h1>\n");
        html.push_str(&format!(
            "  <span class=\"counter\"><span id=\"date\">{}</span> · <span id=\"storyCount\" data-count=\"{}\">{}</span></span>\n",
            date,
            stories.len(),
            Self::count_label(stories.len())
        ));
        html.push_str("</div>\n");
        html.push_str("<div class=\"progress\"><div class=\"progress-fill\" id=\"progressFill\"></div></div>\n\n");

        html.push_str("<div class=\"card-container\" id=\"cards\">\n");

        if stories.is_empty() {
            html.push_str(&format!("<div class=\"empty-state\">{}</div>\n", EMPTY_STATE));
        }

        for (section, items) in Self::group_by_section(stories) {
            let color = Section::color_for_label(section);
            let section = Self::escape_html(section);

            html.push_str(&format!(
                "<div class=\"section-header\" style=\"color:{}\">{}</div>\n",
                color, section
            ));

            for story in items {
                let url = if story.url.is_empty() {
                    "#".to_string()
                } else {
                    Self::escape_html(&story.url)
                };

                html.push_str(&format!(
                    "<div class=\"card\" style=\"border-left-color:{}\">\n",
                    color
                ));
                html.push_str(&format!(
                    "  <span class=\"section-tag\" style=\"background:{}40;color:{}\">{}</span>\n",
                    color, color, section
                ));
                html.push_str(&format!(
                    "  <div class=\"headline\"><a href=\"{}\" target=\"_blank\" rel=\"noopener\">{}</a></div>\n",
                    url,
                    Self::escape_html(&story.headline)
                ));
                html.push_str(&format!(
                    "  <div class=\"meta\">{} · {}</div>\n",
                    Self::escape_html(&story.source),
                    Self::escape_html(&story.date)
                ));
                html.push_str(&format!(
                    "  <div class=\"summary\">{}</div>\n",
                    Self::escape_html(&story.summary)
                ));
                html.push_str("</div>\n");
            }
        }

        html.push_str("</div>\n");
        html.push_str(&format!(
            "<div class=\"footer\">Generated {} by your AI News Curator</div>\n\n",
            generated_at.format("%Y-%m-%d %H:%M UTC")
        ));

        html.push_str("<script>\n");
        html.push_str("window.addEventListener('scroll', () => {\n");
        html.push_str("  const h = document.documentElement;\n");
        html.push_str("  const max = h.scrollHeight - h.clientHeight;\n");
        html.push_str("  const pct = max > 0 ? (h.scrollTop / max) * 100 : 0;\n");
        html.push_str("  document.getElementById('progressFill').style.width = Math.min(pct, 100) + '%';\n");
        html.push_str("});\n");
        html.push_str("if ('serviceWorker' in navigator) {\n");
        html.push_str("  navigator.serviceWorker.register('sw.js').catch(() => {});\n");
        html.push_str("}\n");
        html.push_str("</script>\n");
        html.push_str("</body>\n</html>\n");

        html
    }

    fn escape_html(text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&#39;")
    }

    pub fn generate_manifest(start_url: &str) -> Result<String> {
        let manifest = serde_json::json!({
            "name": "Daily News Briefing",
            "short_name": "Briefing",
            "description": "Your personalized daily news briefing",
            "start_url": start_url,
            "display": "standalone",
            "background_color": THEME_COLOR,
            "theme_color": THEME_COLOR,
            "icons": [
                {"src": "icon-192.png", "sizes": "192x192", "type": "image/png"},
                {"src": "icon-512.png", "sizes": "512x512", "type": "image/png"}
            ]
        });

        serde_json::to_string_pretty(&manifest).context("Failed to serialize manifest")
    }

    /// Network-first worker that falls back to the cached page when offline
    pub fn generate_service_worker() -> String {
        let mut js = String::new();
        js.push_str(&format!("const CACHE = '{}';\n", CACHE_NAME));
        js.push_str("self.addEventListener('install', e => {\n");
        js.push_str("  e.waitUntil(caches.open(CACHE).then(c => c.addAll(['./', 'index.html'])));\n");
        js.push_str("});\n");
        js.push_str("self.addEventListener('fetch', e => {\n");
        js.push_str("  e.respondWith(fetch(e.request).catch(() => caches.match(e.request)));\n");
        js.push_str("});\n");
        js
    }
}
