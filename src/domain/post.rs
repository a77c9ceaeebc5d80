use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::User;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub user_id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub user: User,
    #[serde(default, rename = "comments_count")]
    pub comment_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Post {
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "(Untitled)"
        } else {
            &self.title
        }
    }

    pub fn author_name(&self) -> &str {
        self.user.display_name()
    }

    /// The author id, falling back to the embedded user when `user_id` is absent.
    pub fn author_id(&self) -> i64 {
        if self.user_id != 0 {
            self.user_id
        } else {
            self.user.id
        }
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        parse_datetime(&self.created_at)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    #[serde(default)]
    pub post_id: i64,
    #[serde(default)]
    pub user_id: i64,
    pub content: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub user: User,
}

impl Comment {
    pub fn created(&self) -> Option<DateTime<Utc>> {
        parse_datetime(&self.created_at)
    }
}

/// Body of `POST /posts`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

pub(crate) fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| s.parse::<DateTime<Utc>>().ok())
}

/// The backend serialises empty Go slices as `null`.
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_deserializes_backend_shape() {
        let json = r#"{
            "id": 7,
            "title": "Hello",
            "content": "First post",
            "user_id": 3,
            "tags": null,
            "created_at": "2024-05-01T10:00:00Z",
            "updated_at": "2024-05-01T10:00:00Z",
            "comments": null,
            "user": {"id": 3, "username": "alice", "email": "a@example.com"},
            "comments_count": 4
        }"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.id, 7);
        assert!(post.tags.is_empty());
        assert_eq!(post.comment_count, 4);
        assert_eq!(post.author_name(), "alice");
        assert!(post.created().is_some());
    }

    #[test]
    fn test_display_title_without_title() {
        let post: Post = serde_json::from_str(r#"{"id": 1, "content": "x"}"#).unwrap();
        assert_eq!(post.display_title(), "(Untitled)");
        assert_eq!(post.comment_count, 0);
    }

    #[test]
    fn test_author_id_falls_back_to_user() {
        let post: Post =
            serde_json::from_str(r#"{"id": 1, "content": "x", "user": {"id": 9, "username": "bob"}}"#)
                .unwrap();
        assert_eq!(post.author_id(), 9);
    }

    #[test]
    fn test_new_post_omits_missing_image() {
        let body = serde_json::to_value(NewPost {
            title: "t".into(),
            content: "c".into(),
            tags: vec!["rust".into()],
            image_url: None,
        })
        .unwrap();
        assert!(body.get("image_url").is_none());
        assert_eq!(body["tags"][0], "rust");
    }
}
