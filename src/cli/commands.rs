use std::io::{self, BufRead, Write};

use crate::api::FeedKind;
use crate::app::{AppContext, PlazaError, Result};
use crate::auth;
use crate::domain::{Comment, Post};
use crate::feed::{present, FeedBody, FeedController, Navigator};
use crate::forms::{CommentForm, LoginForm, PostForm, SignupForm};
use crate::query::{encode, FeedQuery};
use crate::tui::render::PostCard;

/// Read one line from stdin after printing `prompt` to stderr.
fn read_line(prompt: &str) -> Result<String> {
    eprint!("{}: ", prompt);
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn require_login(ctx: &AppContext) -> Result<()> {
    match ctx.session.session() {
        Some(_) => Ok(()),
        None => Err(PlazaError::NotLoggedIn),
    }
}

pub async fn login(ctx: &AppContext, email: &str) -> Result<()> {
    let form = LoginForm {
        email: email.to_string(),
        password: read_line("Password")?,
    };
    match auth::login(ctx.backend.as_ref(), ctx.session.as_ref(), &form).await? {
        Some(session) => println!("Logged in as {}", session.username),
        None => println!("Logged in"),
    }
    Ok(())
}

pub async fn signup(ctx: &AppContext, username: &str, email: &str) -> Result<()> {
    let form = SignupForm {
        username: username.to_string(),
        email: email.to_string(),
        password: read_line("Password")?,
        confirm_password: read_line("Confirm password")?,
    };
    let welcome = auth::signup(ctx.backend.as_ref(), &form).await?;
    println!("{}", welcome);
    println!("Check your email to verify the account before logging in.");
    Ok(())
}

pub fn logout(ctx: &AppContext) -> Result<()> {
    auth::logout(ctx.session.as_ref())?;
    println!("Logged out");
    Ok(())
}

pub fn whoami(ctx: &AppContext) {
    match auth::whoami(ctx.session.as_ref()) {
        Some(session) => println!(
            "{} <{}> (id {}, {}), session expires {}",
            session.username,
            session.email,
            session.user_id,
            session.role,
            session.expiry.format("%Y-%m-%d %H:%M")
        ),
        None => println!("Not logged in"),
    }
}

pub(crate) fn format_post(post: &Post) -> String {
    let mut out = format!("#{} {}\n  {}", post.id, post.display_title(), PostCard::byline(post));
    if !post.tags.is_empty() {
        let tags = post.tags.iter().map(|t| format!("#{}", t)).collect::<Vec<_>>();
        out.push_str(&format!("\n  {}", tags.join(" ")));
    }
    out
}

fn format_comment(comment: &Comment) -> String {
    let date = comment
        .created()
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    format!("{} {}\n  {}", comment.user.display_name(), date, comment.content)
}

/// Fetch one feed page through a feed controller mounted at the
/// bookmarkable `query`, and format what the feed screen would show.
pub(crate) async fn feed_lines(ctx: &AppContext, kind: FeedKind, query: &str) -> Result<Vec<String>> {
    let path = match kind {
        FeedKind::Home => "/",
        FeedKind::Explore => "/explore",
    };
    let query = query.trim_start_matches('?');
    let href = if query.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, query)
    };

    let nav = Navigator::new(&href);
    let mut controller: FeedController<Post> = FeedController::new(ctx.sources.feed(kind));
    controller.mount(nav.current());
    controller.settle_all().await;

    let mut lines = Vec::new();
    match present(&controller.view()) {
        FeedBody::Failed { message } => return Err(PlazaError::Other(message)),
        FeedBody::Skeleton => {}
        FeedBody::Empty => lines.push(kind.empty_message().to_string()),
        FeedBody::Items {
            items, load_more, ..
        } => {
            lines.extend(items.iter().map(format_post));
            if load_more {
                lines.push(next_page_hint(kind, controller.committed()));
            }
        }
    }
    Ok(lines)
}

/// The command that prints the page after `query`.
fn next_page_hint(kind: FeedKind, query: &FeedQuery) -> String {
    let flag = match kind {
        FeedKind::Home => "",
        FeedKind::Explore => " --explore",
    };
    format!("More: plaza feed{} --query '{}'", flag, encode(&query.next_page()))
}

pub async fn feed(ctx: &AppContext, kind: FeedKind, query: &str) -> Result<()> {
    for line in feed_lines(ctx, kind, query).await? {
        println!("{}", line);
    }
    Ok(())
}

pub async fn create_post(
    ctx: &AppContext,
    title: &str,
    content: &str,
    tags: Vec<String>,
    image_url: Option<String>,
) -> Result<()> {
    let new_post = PostForm {
        title: title.to_string(),
        content: content.to_string(),
        tags,
        image_url,
    }
    .into_new_post()?;
    require_login(ctx)?;

    let post = ctx.sources.create_post(&new_post).await?;
    println!("Created post #{}", post.id);
    Ok(())
}

pub async fn list_comments(ctx: &AppContext, post_id: i64) -> Result<()> {
    let post = ctx.sources.posts.get(post_id).await?;
    let comments = ctx.sources.comments.list(post_id).await?;

    println!("{}", format_post(&post));
    if comments.is_empty() {
        println!("No comments yet");
        return Ok(());
    }
    for comment in comments.iter() {
        println!("{}", format_comment(comment));
    }
    Ok(())
}

pub async fn add_comment(ctx: &AppContext, post_id: i64, content: &str) -> Result<()> {
    let form = CommentForm::new(content);
    form.check()?;
    require_login(ctx)?;

    let comment = ctx.sources.add_comment(post_id, &form.content).await?;
    println!("Added comment #{} to post #{}", comment.id, post_id);
    Ok(())
}

pub async fn set_following(ctx: &AppContext, user_id: i64, follow: bool) -> Result<()> {
    require_login(ctx)?;
    if follow {
        ctx.sources.follow(user_id).await?;
        println!("Following user {}", user_id);
    } else {
        ctx.sources.unfollow(user_id).await?;
        println!("Unfollowed user {}", user_id);
    }
    Ok(())
}

pub async fn show_profile(ctx: &AppContext, user_id: i64) -> Result<()> {
    let (profile, posts) = tokio::try_join!(
        ctx.sources.profiles.profile(user_id),
        ctx.sources.profiles.posts(user_id)
    )?;
    let own = ctx
        .session
        .session()
        .is_some_and(|s| s.user_id == profile.user.id);

    println!("@{}", profile.user.display_name());
    if let Some(bio) = profile.user.bio.as_deref().filter(|b| !b.is_empty()) {
        println!("{}", bio);
    }
    println!(
        "{} posts, {} followers, {} following{}",
        profile.posts_count,
        profile.followers_count,
        profile.following_count,
        if own {
            ""
        } else if profile.is_followed {
            ", you follow them"
        } else {
            ""
        }
    );
    println!();
    if posts.is_empty() {
        println!("No posts yet");
    }
    for post in posts.iter() {
        println!("{}", format_post(post));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::api::fake::{post, FakeBackend};
    use crate::app::ApiError;
    use crate::config::Config;
    use crate::query::decode;
    use crate::session::testing::token_for;
    use crate::session::MemorySessionStore;

    fn context(backend: &Arc<FakeBackend>, token: Option<&str>) -> AppContext {
        let session = match token {
            Some(t) => MemorySessionStore::with_token(t),
            None => MemorySessionStore::new(),
        };
        AppContext::with_backend(Config::default(), Arc::new(session), backend.clone())
    }

    #[test]
    fn test_format_post() {
        let mut p = post(3);
        p.tags = vec!["art".into(), "music".into()];
        assert_eq!(format_post(&p), "#3 Post 3\n  user3 · 0 comments\n  #art #music");
    }

    #[tokio::test]
    async fn test_feed_lines_with_next_page_hint() {
        let backend = Arc::new(FakeBackend::with_posts(12));
        let ctx = context(&backend, None);

        let lines = feed_lines(&ctx, FeedKind::Explore, "?sort=asc").await.unwrap();
        assert_eq!(lines.len(), 11);
        assert_eq!(
            lines[10],
            "More: plaza feed --explore --query 'offset=10&sort=asc'"
        );
        assert_eq!(backend.calls(), vec!["/users/explore?limit=10&sort=asc"]);

        let lines = feed_lines(&ctx, FeedKind::Explore, "offset=10&sort=asc").await.unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("#12 "));
    }

    #[test]
    fn test_next_page_hint_saturates_offset() {
        let query = FeedQuery::from_patch(&decode("offset=4294967290"));
        assert_eq!(
            next_page_hint(FeedKind::Home, &query),
            "More: plaza feed --query 'offset=4294967295'"
        );
    }

    #[tokio::test]
    async fn test_feed_lines_empty_and_failed() {
        let backend = Arc::new(FakeBackend::default());
        let ctx = context(&backend, None);
        let lines = feed_lines(&ctx, FeedKind::Home, "").await.unwrap();
        assert_eq!(lines, vec!["No posts found."]);

        let backend = Arc::new(FakeBackend::default());
        *backend.fail_with.lock().unwrap() = Some(ApiError::Unauthorized(None));
        let ctx = context(&backend, None);
        let err = feed_lines(&ctx, FeedKind::Home, "").await.unwrap_err();
        assert_eq!(err.to_string(), "You must be logged in");
    }

    #[tokio::test]
    async fn test_mutations_require_login() {
        let backend = Arc::new(FakeBackend::with_posts(1));
        let ctx = context(&backend, None);

        let err = set_following(&ctx, 101, true).await.unwrap_err();
        assert!(matches!(err, PlazaError::NotLoggedIn));
        let err = add_comment(&ctx, 1, "hello").await.unwrap_err();
        assert!(matches!(err, PlazaError::NotLoggedIn));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_comment_is_rejected_before_login_check() {
        let backend = Arc::new(FakeBackend::with_posts(1));
        let ctx = context(&backend, None);
        let err = add_comment(&ctx, 1, "   ").await.unwrap_err();
        assert!(matches!(err, PlazaError::Form(_)));
    }

    #[tokio::test]
    async fn test_follow_with_session() {
        let backend = Arc::new(FakeBackend::with_posts(1));
        let token = token_for(7, "alice", 4_102_444_800);
        let ctx = context(&backend, Some(&token));

        set_following(&ctx, 101, true).await.unwrap();
        assert_eq!(*backend.followed.lock().unwrap(), vec![101]);
        set_following(&ctx, 101, false).await.unwrap();
        assert!(backend.followed.lock().unwrap().is_empty());
    }
}
