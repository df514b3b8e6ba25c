//! Content items and their engagement counters

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::audit::{AuditLogger, AuditSeverity};
use crate::database::{ContentFilter, Store};
use crate::error::{AppError, AppResult};
use crate::models::{
    AuditAction, AuditLog, Content, ContentStatus, ContentType, Engagement, EngagementType,
    Platform,
};
use crate::rewards::Timeframe;
use crate::services::creators::{CreatorService, CreatorStatsDelta, DEFAULT_TOP_LIMIT, apply_counter};

const ANALYTICS_TOP_LIMIT: usize = 5;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateContent {
    pub creator_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub content_type: ContentType,
    pub platform: Platform,
    pub external_id: Option<String>,
    pub external_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub content_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub duration: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateContent {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<ContentStatus>,
    pub thumbnail_url: Option<String>,
    pub tags: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
}

/// Counter deltas; zero means "no change"
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ContentStatsDelta {
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub likes: i64,
    #[serde(default)]
    pub shares: i64,
    #[serde(default)]
    pub comments: i64,
}

impl ContentStatsDelta {
    fn apply(&self, content: &mut Content) -> AppResult<()> {
        content.views = apply_counter(content.views, self.views, "views")?;
        content.likes = apply_counter(content.likes, self.likes, "likes")?;
        content.shares = apply_counter(content.shares, self.shares, "shares")?;
        content.comments = apply_counter(content.comments, self.comments, "comments")?;
        Ok(())
    }

    fn engagement_kinds(&self) -> impl Iterator<Item = EngagementType> + '_ {
        [
            (self.views, EngagementType::View),
            (self.likes, EngagementType::Like),
            (self.shares, EngagementType::Share),
            (self.comments, EngagementType::Comment),
        ]
        .into_iter()
        .filter(|(delta, _)| *delta != 0)
        .map(|(_, kind)| kind)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentAnalytics {
    pub total_content: usize,
    pub total_views: i64,
    pub total_likes: i64,
    pub total_shares: i64,
    pub total_comments: i64,
    pub avg_engagement_rate: Decimal,
    pub top_content: Vec<Content>,
}

impl ContentAnalytics {
    fn from_items(mut items: Vec<Content>) -> Self {
        let total_content = items.len();
        let avg_engagement_rate = if items.is_empty() {
            Decimal::ZERO
        } else {
            let sum: Decimal = items.iter().map(|c| c.engagement_rate).sum();
            (sum / Decimal::from(total_content as u64)).round_dp(2)
        };
        let total_views = items.iter().map(|c| c.views).sum();
        let total_likes = items.iter().map(|c| c.likes).sum();
        let total_shares = items.iter().map(|c| c.shares).sum();
        let total_comments = items.iter().map(|c| c.comments).sum();

        items.sort_by(|a, b| b.engagement_rate.cmp(&a.engagement_rate));
        items.truncate(ANALYTICS_TOP_LIMIT);

        Self {
            total_content,
            total_views,
            total_likes,
            total_shares,
            total_comments,
            avg_engagement_rate,
            top_content: items,
        }
    }
}

pub struct ContentService {
    store: Arc<dyn Store>,
    creators: Arc<CreatorService>,
    audit: Arc<AuditLogger>,
}

impl ContentService {
    pub fn new(
        store: Arc<dyn Store>,
        creators: Arc<CreatorService>,
        audit: Arc<AuditLogger>,
    ) -> Self {
        Self {
            store,
            creators,
            audit,
        }
    }

    pub async fn create(&self, request: CreateContent) -> AppResult<Content> {
        if request.title.trim().is_empty() {
            return Err(AppError::validation("title is required"));
        }
        if request.duration.is_some_and(|d| d < 0) {
            return Err(AppError::validation("duration cannot be negative"));
        }
        self.creators.find(request.creator_id).await?;

        let mut content = Content::new(
            request.creator_id,
            request.title,
            request.content_type,
            request.platform,
        );
        content.description = request.description;
        content.external_id = request.external_id;
        content.external_url = request.external_url;
        content.thumbnail_url = request.thumbnail_url;
        content.content_url = request.content_url;
        content.tags = request.tags;
        content.categories = request.categories;
        content.duration = request.duration;
        self.store.insert_content(&content).await?;

        self.creators
            .update_stats(
                content.creator_id,
                CreatorStatsDelta {
                    content: 1,
                    ..Default::default()
                },
            )
            .await?;

        info!(
            content_id = %content.id,
            creator_id = %content.creator_id,
            platform = %content.platform,
            "Content created"
        );
        self.audit
            .log(
                AuditLog::new(AuditAction::Create, "content", Some(content.id)),
                AuditSeverity::Debug,
            )
            .await;
        Ok(content)
    }

    pub async fn list(&self, filter: &ContentFilter) -> AppResult<Vec<Content>> {
        self.store.list_content(filter).await
    }

    pub async fn find(&self, id: Uuid) -> AppResult<Content> {
        self.store
            .get_content(id)
            .await?
            .ok_or_else(|| AppError::not_found("Content"))
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Content>> {
        let creator = self.creators.find_by_user(user_id).await?;
        self.list(&ContentFilter {
            creator_id: Some(creator.id),
            ..Default::default()
        })
        .await
    }

    pub async fn list_by_platform(
        &self,
        platform: Platform,
        creator_id: Option<Uuid>,
    ) -> AppResult<Vec<Content>> {
        self.list(&ContentFilter {
            creator_id,
            platform: Some(platform),
            ..Default::default()
        })
        .await
    }

    pub async fn search(&self, query: &str) -> AppResult<Vec<Content>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::validation("search query is required"));
        }
        self.store.search_content(query).await
    }

    pub async fn top(
        &self,
        limit: Option<usize>,
        timeframe: Option<Timeframe>,
    ) -> AppResult<Vec<Content>> {
        let since = timeframe.map(|t| t.since(Utc::now()));
        self.store
            .top_content(limit.unwrap_or(DEFAULT_TOP_LIMIT), since)
            .await
    }

    /// Loads the item and checks that `user_id` owns its creator profile.
    async fn find_owned(&self, id: Uuid, user_id: Uuid) -> AppResult<Content> {
        let content = self.find(id).await?;
        let owner = self.creators.find(content.creator_id).await?;
        if owner.user_id != user_id {
            return Err(AppError::Forbidden(
                "You can only modify your own content".to_string(),
            ));
        }
        Ok(content)
    }

    pub async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        changes: UpdateContent,
    ) -> AppResult<Content> {
        let mut content = self.find_owned(id, user_id).await?;
        if let Some(title) = changes.title {
            content.title = title;
        }
        if let Some(description) = changes.description {
            content.description = Some(description);
        }
        if let Some(thumbnail_url) = changes.thumbnail_url {
            content.thumbnail_url = Some(thumbnail_url);
        }
        if let Some(tags) = changes.tags {
            content.tags = tags;
        }
        if let Some(categories) = changes.categories {
            content.categories = categories;
        }
        if let Some(status) = changes.status {
            set_status(&mut content, status);
        }
        content.updated_at = Utc::now();
        self.store.update_content(&content).await?;
        Ok(content)
    }

    pub async fn update_status(&self, id: Uuid, status: ContentStatus) -> AppResult<Content> {
        let mut content = self.find(id).await?;
        let previous = content.status;
        set_status(&mut content, status);
        content.updated_at = Utc::now();
        self.store.update_content(&content).await?;
        info!(content_id = %id, from = %previous, to = %status, "Content status changed");
        Ok(content)
    }

    pub async fn update_stats(&self, id: Uuid, delta: ContentStatsDelta) -> AppResult<Content> {
        let mut content = self.find(id).await?;
        delta.apply(&mut content)?;

        // creator totals are checked before anything is written
        self.creators
            .update_stats(
                content.creator_id,
                CreatorStatsDelta {
                    views: delta.views,
                    likes: delta.likes,
                    shares: delta.shares,
                    content: 0,
                },
            )
            .await?;

        content.recompute_engagement_rate();
        let now = Utc::now();
        content.last_analyzed_at = Some(now);
        content.updated_at = now;
        self.store.update_content(&content).await?;

        for kind in delta.engagement_kinds() {
            self.store
                .insert_engagement(&Engagement::new(content.id, kind))
                .await?;
        }

        debug!(
            content_id = %id,
            views = content.views,
            likes = content.likes,
            engagement_rate = %content.engagement_rate,
            "Content stats updated"
        );
        Ok(content)
    }

    /// Aggregates a creator's published content, optionally limited to a publish window.
    pub async fn analytics(
        &self,
        creator_id: Uuid,
        timeframe: Option<Timeframe>,
    ) -> AppResult<ContentAnalytics> {
        let since = timeframe.map(|t| t.since(Utc::now()));
        let items: Vec<Content> = self
            .list(&ContentFilter {
                creator_id: Some(creator_id),
                status: Some(ContentStatus::Published),
                ..Default::default()
            })
            .await?
            .into_iter()
            .filter(|c| since.is_none_or(|s| c.published_at.is_some_and(|at| at >= s)))
            .collect();
        Ok(ContentAnalytics::from_items(items))
    }

    pub async fn remove(&self, id: Uuid, user_id: Uuid) -> AppResult<()> {
        let content = self.find_owned(id, user_id).await?;
        if !self.store.delete_content(content.id).await? {
            return Err(AppError::not_found("Content"));
        }
        info!(content_id = %id, "Content removed");
        self.audit
            .log(
                AuditLog::new(AuditAction::Delete, "content", Some(id)).with_user(Some(user_id)),
                AuditSeverity::Warning,
            )
            .await;
        Ok(())
    }

    /// Records one engagement and bumps the matching counter.
    pub async fn record_engagement(
        &self,
        mut engagement: Engagement,
    ) -> AppResult<Engagement> {
        let mut content = self.find(engagement.content_id).await?;
        match engagement.engagement_type {
            EngagementType::View => content.views += 1,
            EngagementType::Like => content.likes += 1,
            EngagementType::Share => content.shares += 1,
            EngagementType::Comment => content.comments += 1,
            EngagementType::Subscribe | EngagementType::Follow => {}
        }
        content.recompute_engagement_rate();
        content.updated_at = Utc::now();
        self.store.update_content(&content).await?;

        engagement.created_at = Utc::now();
        self.store.insert_engagement(&engagement).await?;
        Ok(engagement)
    }

    pub async fn list_engagements(&self, content_id: Uuid) -> AppResult<Vec<Engagement>> {
        self.find(content_id).await?;
        self.store.list_engagements(content_id).await
    }
}

fn set_status(content: &mut Content, status: ContentStatus) {
    if status == ContentStatus::Published && content.published_at.is_none() {
        content.published_at = Some(Utc::now());
    }
    content.status = status;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::services::creators::CreateCreator;
    use crate::services::users::{CreateUser, UserService};

    struct Fixture {
        content: ContentService,
        creators: Arc<CreatorService>,
        owner: Uuid,
        creator_id: Uuid,
    }

    async fn fixture() -> Fixture {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let audit = Arc::new(AuditLogger::new());
        let user = UserService::new(store.clone(), audit.clone())
            .create(CreateUser {
                email: "owner@example.com".to_string(),
                username: "owner".to_string(),
                password: "owner-pass".to_string(),
                first_name: None,
                last_name: None,
                phone_number: None,
                bio: None,
                role: None,
                wallet_address: None,
            })
            .await
            .unwrap();
        let creators = Arc::new(CreatorService::new(store.clone(), audit.clone()));
        let creator = creators
            .create(CreateCreator {
                user_id: user.id,
                content_categories: Vec::new(),
                social_media_links: None,
            })
            .await
            .unwrap();
        Fixture {
            content: ContentService::new(store, creators.clone(), audit),
            creators,
            owner: user.id,
            creator_id: creator.id,
        }
    }

    fn request(creator_id: Uuid, title: &str) -> CreateContent {
        CreateContent {
            creator_id,
            title: title.to_string(),
            description: None,
            content_type: ContentType::Video,
            platform: Platform::Youtube,
            external_id: None,
            external_url: None,
            thumbnail_url: None,
            content_url: None,
            tags: vec!["rust".to_string()],
            categories: Vec::new(),
            duration: Some(120),
        }
    }

    #[tokio::test]
    async fn test_create_counts_toward_creator() {
        let f = fixture().await;
        f.content
            .create(request(f.creator_id, "First"))
            .await
            .unwrap();
        let creator = f.creators.find(f.creator_id).await.unwrap();
        assert_eq!(creator.total_content, 1);

        let err = f
            .content
            .create(request(Uuid::new_v4(), "Orphan"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_stats_record_engagements() {
        let f = fixture().await;
        let item = f
            .content
            .create(request(f.creator_id, "Stats"))
            .await
            .unwrap();
        let updated = f
            .content
            .update_stats(
                item.id,
                ContentStatsDelta {
                    views: 200,
                    likes: 10,
                    shares: 0,
                    comments: 5,
                },
            )
            .await
            .unwrap();
        // (10 + 0 + 10) / 200 * 100
        assert_eq!(updated.engagement_rate, Decimal::from(10));
        assert!(updated.last_analyzed_at.is_some());

        let engagements = f.content.list_engagements(item.id).await.unwrap();
        assert_eq!(engagements.len(), 3);
        assert!(
            !engagements
                .iter()
                .any(|e| e.engagement_type == EngagementType::Share)
        );
    }

    #[tokio::test]
    async fn test_stats_reject_negative_and_overflowing_deltas() {
        let f = fixture().await;
        let item = f
            .content
            .create(request(f.creator_id, "Counters"))
            .await
            .unwrap();

        let err = f
            .content
            .update_stats(
                item.id,
                ContentStatsDelta {
                    views: -5,
                    likes: -3,
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        f.content
            .update_stats(
                item.id,
                ContentStatsDelta {
                    views: 10,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let err = f
            .content
            .update_stats(
                item.id,
                ContentStatsDelta {
                    views: i64::MAX,
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let stored = f.content.find(item.id).await.unwrap();
        assert_eq!((stored.views, stored.likes), (10, 0));
        assert_eq!(f.creators.find(f.creator_id).await.unwrap().total_views, 10);
        assert_eq!(f.content.list_engagements(item.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_only_owner_can_modify() {
        let f = fixture().await;
        let item = f
            .content
            .create(request(f.creator_id, "Mine"))
            .await
            .unwrap();

        let err = f
            .content
            .update(item.id, Uuid::new_v4(), UpdateContent::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let updated = f
            .content
            .update(
                item.id,
                f.owner,
                UpdateContent {
                    status: Some(ContentStatus::Published),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.published_at.is_some());

        f.content.remove(item.id, f.owner).await.unwrap();
        assert!(matches!(
            f.content.find(item.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_analytics_covers_published_only() {
        let f = fixture().await;
        for (title, views, publish) in [("a", 100, true), ("b", 50, true), ("c", 999, false)] {
            let item = f
                .content
                .create(request(f.creator_id, title))
                .await
                .unwrap();
            f.content
                .update_stats(
                    item.id,
                    ContentStatsDelta {
                        views,
                        likes: 10,
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
            if publish {
                f.content
                    .update_status(item.id, ContentStatus::Published)
                    .await
                    .unwrap();
            }
        }

        let analytics = f
            .content
            .analytics(f.creator_id, Some(Timeframe::Week))
            .await
            .unwrap();
        assert_eq!(analytics.total_content, 2);
        assert_eq!(analytics.total_views, 150);
        // rates 10 and 20
        assert_eq!(analytics.avg_engagement_rate, Decimal::from(15));
        assert_eq!(analytics.top_content[0].title, "b");
    }
}
