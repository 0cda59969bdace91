//! XML sitemap of the public site.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use crate::error::AppResult;
use crate::repositories::PostRepository;

/// One static page of the site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticPage {
    pub path: &'static str,
    pub changefreq: &'static str,
    pub priority: &'static str,
}

pub const STATIC_PAGES: &[StaticPage] = &[
    StaticPage { path: "/", changefreq: "daily", priority: "1.0" },
    StaticPage { path: "/about", changefreq: "monthly", priority: "0.8" },
    StaticPage { path: "/services", changefreq: "monthly", priority: "0.8" },
    StaticPage { path: "/portfolio", changefreq: "weekly", priority: "0.8" },
    StaticPage { path: "/blog", changefreq: "daily", priority: "0.9" },
    StaticPage { path: "/contact", changefreq: "yearly", priority: "0.6" },
];

const POST_CHANGEFREQ: &str = "weekly";
const POST_PRIORITY: &str = "0.7";

#[derive(Clone)]
pub struct SitemapService {
    posts: PostRepository,
    base_url: String,
}

impl SitemapService {
    pub fn new(posts: PostRepository, base_url: impl Into<String>) -> Self {
        Self {
            posts,
            base_url: base_url.into(),
        }
    }

    /// Renders the sitemap from the static pages and every published post.
    pub async fn generate(&self) -> AppResult<String> {
        let posts = self.posts.published_slugs().await?;
        Ok(render_sitemap(&self.base_url, &posts))
    }
}

/// Renders `<urlset>`: the static pages first, then one entry per
/// `(slug, updated_at)` with `lastmod` as a calendar date.
pub fn render_sitemap(base_url: &str, posts: &[(String, DateTime<Utc>)]) -> String {
    let base = base_url.trim_end_matches('/');
    let mut out = String::with_capacity(256 * (STATIC_PAGES.len() + posts.len()));

    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n");

    for page in STATIC_PAGES {
        push_url(&mut out, &format!("{}{}", base, page.path), None, page.changefreq, page.priority);
    }
    for (slug, updated_at) in posts {
        let lastmod = updated_at.format("%Y-%m-%d").to_string();
        push_url(
            &mut out,
            &format!("{}/blog/{}", base, slug),
            Some(&lastmod),
            POST_CHANGEFREQ,
            POST_PRIORITY,
        );
    }

    out.push_str("</urlset>\n");
    out
}

fn push_url(out: &mut String, loc: &str, lastmod: Option<&str>, changefreq: &str, priority: &str) {
    out.push_str("  <url>\n");
    // Writing into a String cannot fail
    let _ = writeln!(out, "    <loc>{}</loc>", escape_xml(loc));
    if let Some(lastmod) = lastmod {
        let _ = writeln!(out, "    <lastmod>{}</lastmod>", lastmod);
    }
    let _ = writeln!(out, "    <changefreq>{}</changefreq>", changefreq);
    let _ = writeln!(out, "    <priority>{}</priority>", priority);
    out.push_str("  </url>\n");
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn updated(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, 17, 45, 0).unwrap()
    }

    #[test]
    fn test_static_pages_only() {
        let xml = render_sitemap("https://agency.test/", &[]);

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert_eq!(xml.matches("<url>").count(), 6);
        assert!(xml.contains("<loc>https://agency.test/</loc>"));
        assert!(xml.contains(
            "<loc>https://agency.test/contact</loc>\n    <changefreq>yearly</changefreq>\n    <priority>0.6</priority>"
        ));
        assert!(!xml.contains("<lastmod>"));
    }

    #[test]
    fn test_post_entries() {
        let posts = vec![
            ("local-seo".to_string(), updated(4)),
            ("ads-101".to_string(), updated(21)),
        ];
        let xml = render_sitemap("https://agency.test", &posts);

        assert_eq!(xml.matches("<url>").count(), 8);
        assert!(xml.contains(
            "<loc>https://agency.test/blog/local-seo</loc>\n    <lastmod>2025-03-04</lastmod>\n    <changefreq>weekly</changefreq>\n    <priority>0.7</priority>"
        ));
        assert!(xml.contains("<lastmod>2025-03-21</lastmod>"));
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a&b<c>"), "a&amp;b&lt;c&gt;");
        assert_eq!(escape_xml("'q\""), "&apos;q&quot;");
    }

    proptest! {
        #[test]
        fn one_url_per_published_post(slugs in prop::collection::vec("[a-z0-9-]{1,20}", 0..30)) {
            let posts: Vec<_> = slugs.iter().map(|s| (s.clone(), updated(1))).collect();
            let xml = render_sitemap("https://agency.test", &posts);

            prop_assert_eq!(xml.matches("<url>").count(), STATIC_PAGES.len() + posts.len());
            prop_assert_eq!(xml.matches("<priority>0.7</priority>").count(), posts.len());
            for page in STATIC_PAGES {
                let expected = format!(
                    "<loc>https://agency.test{}</loc>\n    <changefreq>{}</changefreq>\n    <priority>{}</priority>",
                    page.path, page.changefreq, page.priority
                );
                prop_assert!(xml.contains(&expected));
            }
        }
    }
}
