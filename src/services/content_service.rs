//! AI-assisted content: keyword, audience, post and tag generation, and the
//! daily draft post.

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::external::llm::{LlmChain, Prompt, extract_json, first_line, parse_list};
use crate::models::{BlogPost, NewNotification, NotificationStatus, NotificationType, TARGET_POST};
use crate::services::NotificationService;
use crate::services::post_service::{PostDraft, PostService, normalize_tags};

pub const DEFAULT_KEYWORD_COUNT: usize = 10;
const MAX_TAGS: usize = 8;

const SYSTEM_PROMPT: &str = "You are a senior content strategist at a digital marketing agency. \
Answer with exactly what is asked, without preamble.";

/// Parsed `generate-blog-post` answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GeneratedPost {
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A generated value together with the provider that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated<T> {
    pub value: T,
    pub provider: &'static str,
}

#[derive(Clone)]
pub struct ContentService {
    llm: LlmChain,
    posts: PostService,
    notifications: NotificationService,
}

impl ContentService {
    pub fn new(llm: LlmChain, posts: PostService, notifications: NotificationService) -> Self {
        Self {
            llm,
            posts,
            notifications,
        }
    }

    pub fn configured_providers(&self) -> Vec<&'static str> {
        self.llm.configured()
    }

    pub async fn keywords(
        &self,
        topic: &str,
        count: Option<usize>,
    ) -> AppResult<Generated<Vec<String>>> {
        let count = count.unwrap_or(DEFAULT_KEYWORD_COUNT).max(1);
        let prompt = Prompt::new(format!(
            "List {count} SEO keywords for a blog post about \"{topic}\". \
             Reply with a JSON array of strings only."
        ))
        .with_system(SYSTEM_PROMPT);

        let generation = self.llm.generate(&prompt).await?;
        let mut keywords = parse_list(&generation.text);
        keywords.truncate(count);
        if keywords.is_empty() {
            return Err(unparseable(generation.provider, "keywords"));
        }

        Ok(Generated {
            value: keywords,
            provider: generation.provider,
        })
    }

    pub async fn audience(&self, topic: &str) -> AppResult<Generated<String>> {
        let prompt = Prompt::new(format!(
            "Describe in one sentence the target audience for a blog post about \"{topic}\"."
        ))
        .with_system(SYSTEM_PROMPT);

        let generation = self.llm.generate(&prompt).await?;
        let audience =
            first_line(&generation.text).ok_or_else(|| unparseable(generation.provider, "audience"))?;

        Ok(Generated {
            value: audience,
            provider: generation.provider,
        })
    }

    pub async fn blog_post(
        &self,
        topic: &str,
        keywords: &[String],
        audience: Option<&str>,
    ) -> AppResult<Generated<GeneratedPost>> {
        let mut request = format!("Write a blog post about \"{topic}\".");
        if !keywords.is_empty() {
            request.push_str(&format!(" Work in these keywords: {}.", keywords.join(", ")));
        }
        if let Some(audience) = audience.filter(|a| !a.trim().is_empty()) {
            request.push_str(&format!(" The readers are: {}.", audience.trim()));
        }
        request.push_str(
            " Reply with one JSON object with the fields \"title\", \"excerpt\", \
             \"content\" (markdown) and \"tags\" (array of strings).",
        );

        let generation = self
            .llm
            .generate(&Prompt::new(request).with_system(SYSTEM_PROMPT))
            .await?;
        let post = parse_generated_post(&generation.text)
            .ok_or_else(|| unparseable(generation.provider, "blog post"))?;

        Ok(Generated {
            value: post,
            provider: generation.provider,
        })
    }

    pub async fn tags(&self, title: &str, content: &str) -> AppResult<Generated<Vec<String>>> {
        let excerpt: String = content.chars().take(4_000).collect();
        let prompt = Prompt::new(format!(
            "Suggest up to {MAX_TAGS} short tags for this blog post.\n\
             Title: {title}\n\nContent:\n{excerpt}\n\n\
             Reply with a JSON array of strings only."
        ))
        .with_system(SYSTEM_PROMPT);

        let generation = self.llm.generate(&prompt).await?;
        let mut tags = normalize_tags(parse_list(&generation.text));
        tags.truncate(MAX_TAGS);
        if tags.is_empty() {
            return Err(unparseable(generation.provider, "tags"));
        }

        Ok(Generated {
            value: tags,
            provider: generation.provider,
        })
    }

    /// Generates a post for `topic` (or today's topic from the rotation),
    /// stores it as a draft and asks the admins to review it.
    pub async fn daily_post(&self, topic: Option<String>, topics: &[String]) -> AppResult<BlogPost> {
        let topic = match topic.filter(|t| !t.trim().is_empty()) {
            Some(topic) => topic,
            None => pick_topic(topics, Utc::now().ordinal())
                .ok_or_else(|| AppError::BadRequest {
                    message: "no topic given and no daily topics configured".to_string(),
                })?
                .to_string(),
        };

        let generated = self.blog_post(&topic, &[], None).await?;
        let GeneratedPost {
            title,
            excerpt,
            content,
            tags,
        } = generated.value;

        let post = self
            .posts
            .create(
                PostDraft {
                    title,
                    slug: None,
                    excerpt,
                    content,
                    tags,
                    publish: false,
                },
                None,
            )
            .await?;

        info!(
            post_id = post.id,
            topic = %topic,
            provider = generated.provider,
            "Daily AI post drafted"
        );

        let notice = NewNotification::new(
            NotificationType::AiGenerated,
            NotificationStatus::Pending,
            "AI draft ready for review",
            format!("\"{}\" was generated about {} and awaits review.", post.title, topic),
        )
        .target(TARGET_POST, post.id);
        if let Err(err) = self.notifications.notify(notice).await {
            warn!(post_id = post.id, error = %err, "Failed to announce AI draft");
        }

        Ok(post)
    }
}

/// Round-robin over `topics` by day of year (1-based).
pub fn pick_topic(topics: &[String], day_of_year: u32) -> Option<&str> {
    if topics.is_empty() {
        return None;
    }
    let index = (day_of_year.max(1) as usize - 1) % topics.len();
    Some(topics[index].as_str())
}

fn parse_generated_post(text: &str) -> Option<GeneratedPost> {
    let mut post: GeneratedPost = serde_json::from_str(extract_json(text)?).ok()?;
    post.title = post.title.trim().to_string();
    post.excerpt = post.excerpt.trim().to_string();
    post.tags = normalize_tags(post.tags);
    (!post.title.is_empty() && !post.content.trim().is_empty()).then_some(post)
}

fn unparseable(provider: &str, what: &str) -> AppError {
    AppError::upstream(provider, format!("could not read {} from the response", what))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::lazy_pool;
    use crate::external::llm::LlmProvider;
    use crate::repositories::{NotificationRepository, PostRepository};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Canned(&'static str);

    #[async_trait]
    impl LlmProvider for Canned {
        fn name(&self) -> &'static str {
            "canned"
        }

        fn is_configured(&self) -> bool {
            true
        }

        async fn complete(&self, _prompt: &Prompt) -> AppResult<String> {
            Ok(self.0.to_string())
        }
    }

    fn service(reply: &'static str) -> ContentService {
        let notifications = NotificationService::new(NotificationRepository::new(lazy_pool()), 8);
        let posts = PostService::new(PostRepository::new(lazy_pool()), notifications.clone());
        ContentService::new(
            LlmChain::new(vec![Arc::new(Canned(reply))]),
            posts,
            notifications,
        )
    }

    fn topics() -> Vec<String> {
        vec!["seo".to_string(), "ads".to_string(), "email".to_string()]
    }

    #[test]
    fn test_pick_topic_rotates_by_day() {
        let topics = topics();
        assert_eq!(pick_topic(&topics, 1), Some("seo"));
        assert_eq!(pick_topic(&topics, 2), Some("ads"));
        assert_eq!(pick_topic(&topics, 4), Some("seo"));
        assert_eq!(pick_topic(&topics, 366), Some("email"));
        assert_eq!(pick_topic(&[], 10), None);
    }

    #[test]
    fn test_pick_topic_restarts_at_new_year() {
        let topics = topics();
        // 31 December of a common year, then 1 January
        assert_eq!(pick_topic(&topics, 365), Some("ads"));
        assert_eq!(pick_topic(&topics, 1), Some("seo"));
        // Day numbers below 1 clamp to the first day
        assert_eq!(pick_topic(&topics, 0), Some("seo"));
    }

    #[tokio::test]
    async fn test_keywords_are_truncated_to_count() {
        let generated = service("```json\n[\"local seo\", \"google maps\", \"reviews\"]\n```")
            .keywords("local seo", Some(2))
            .await
            .unwrap();

        assert_eq!(generated.value, vec!["local seo", "google maps"]);
        assert_eq!(generated.provider, "canned");
    }

    #[tokio::test]
    async fn test_audience_takes_first_line() {
        let generated = service("\n\"Owners of small dental practices.\"\nMore text")
            .audience("dentist marketing")
            .await
            .unwrap();
        assert_eq!(generated.value, "Owners of small dental practices.");
    }

    #[tokio::test]
    async fn test_blog_post_reads_json_blob() {
        let reply = r#"Sure! Here it is:
{"title": " Winning Local Search ", "excerpt": "Get found.", "content": "Body text", "tags": ["SEO", "seo", "Local"]}
Hope it helps."#;

        let post = service(reply)
            .blog_post("local search", &["maps".to_string()], Some("shop owners"))
            .await
            .unwrap()
            .value;

        assert_eq!(post.title, "Winning Local Search");
        assert_eq!(post.tags, vec!["seo", "local"]);
    }

    #[tokio::test]
    async fn test_blog_post_without_json_is_upstream_error() {
        match service("I cannot help with that.").blog_post("x", &[], None).await {
            Err(AppError::Upstream { service, .. }) => assert_eq!(service, "canned"),
            other => panic!("Expected Upstream, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_tags_are_normalized_and_capped() {
        let reply = "- Branding\n- #Design\n- branding\n- a\n- b\n- c\n- d\n- e\n- f\n- g";
        let tags = service(reply).tags("t", "c").await.unwrap().value;

        assert_eq!(tags.len(), MAX_TAGS);
        assert_eq!(&tags[..2], &["branding", "design"]);
    }

    #[tokio::test]
    async fn test_daily_post_without_topics_is_rejected() {
        let err = service("{}").daily_post(None, &[]).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest { .. }));
    }
}
