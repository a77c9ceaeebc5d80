use std::future::Future;
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::ListState;
use tokio::sync::mpsc;

use crate::api::{ApiResult, FeedKind};
use crate::app::error::LOGIN_REQUIRED;
use crate::app::{ApiError, AppContext};
use crate::config::KeybindingConfig;
use crate::domain::{Comment, Post, Profile, Session};
use crate::feed::{present, FeedBody, FeedController, Navigator, Route};
use crate::forms::CommentForm;

use super::event::Action;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Feed(FeedKind),
    Profile(i64),
    NotFound,
}

impl From<Route> for Screen {
    fn from(route: Route) -> Self {
        match route {
            Route::Home => Screen::Feed(FeedKind::Home),
            Route::Explore => Screen::Feed(FeedKind::Explore),
            Route::Profile(id) => Screen::Profile(id),
            Route::NotFound => Screen::NotFound,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Loadable<T> {
    Loading,
    Failed(ApiError),
    Ready(T),
}

impl<T> Loadable<T> {
    fn from_result(result: ApiResult<T>) -> Self {
        match result {
            Ok(value) => Loadable::Ready(value),
            Err(e) => Loadable::Failed(e),
        }
    }
}

pub struct CommentsPane {
    pub post_id: i64,
    pub post_title: String,
    pub comments: Loadable<Arc<Vec<Comment>>>,
}

pub type ProfileData = (Arc<Profile>, Arc<Vec<Post>>);

pub struct ProfileView {
    pub user_id: i64,
    /// Navigation entry this view was loaded for.
    entry: u64,
    pub data: Loadable<ProfileData>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Search,
    Tag,
    Comment { post_id: i64 },
}

impl InputKind {
    pub fn prompt(self) -> &'static str {
        match self {
            InputKind::Search => "Search",
            InputKind::Tag => "Add tag",
            InputKind::Comment { .. } => "Comment",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Input {
    pub kind: InputKind,
    pub buffer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// Transient message in the status bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

/// Results of background reads and writes, applied on the UI loop.
pub enum Update {
    Comments {
        post_id: i64,
        result: ApiResult<Arc<Vec<Comment>>>,
    },
    CommentAdded {
        post_id: i64,
        result: ApiResult<Comment>,
    },
    Profile {
        user_id: i64,
        result: ApiResult<ProfileData>,
    },
    Follow {
        user_id: i64,
        followed: bool,
        result: ApiResult<()>,
    },
}

pub struct TuiApp {
    ctx: Arc<AppContext>,
    pub nav: Navigator,
    pub home: FeedController<Post>,
    pub explore: FeedController<Post>,
    pub selected: usize,
    pub list_state: ListState,
    pub comments: Option<CommentsPane>,
    pub profile: Option<ProfileView>,
    pub input: Option<Input>,
    pub notice: Option<Notice>,
    pub session: Option<Session>,
    pub should_quit: bool,
    tx: mpsc::UnboundedSender<Update>,
    rx: mpsc::UnboundedReceiver<Update>,
}

impl TuiApp {
    pub fn new(ctx: Arc<AppContext>, location: &str) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut app = Self {
            home: FeedController::new(ctx.sources.feed(FeedKind::Home)),
            explore: FeedController::new(ctx.sources.feed(FeedKind::Explore)),
            session: ctx.session.session(),
            ctx,
            nav: Navigator::new(location),
            selected: 0,
            list_state: ListState::default(),
            comments: None,
            profile: None,
            input: None,
            notice: None,
            should_quit: false,
            tx,
            rx,
        };
        app.sync_route();
        app
    }

    pub fn screen(&self) -> Screen {
        self.nav.current().route().into()
    }

    pub fn feed(&self) -> Option<&FeedController<Post>> {
        match self.screen() {
            Screen::Feed(FeedKind::Home) => Some(&self.home),
            Screen::Feed(FeedKind::Explore) => Some(&self.explore),
            _ => None,
        }
    }

    fn feed_mut(&mut self) -> Option<&mut FeedController<Post>> {
        match self.screen() {
            Screen::Feed(FeedKind::Home) => Some(&mut self.home),
            Screen::Feed(FeedKind::Explore) => Some(&mut self.explore),
            _ => None,
        }
    }

    /// Posts currently listed on screen.
    pub fn posts(&self) -> &[Post] {
        if let Some(feed) = self.feed() {
            return feed.items();
        }
        match &self.profile {
            Some(ProfileView {
                data: Loadable::Ready((_, posts)),
                ..
            }) => posts.as_slice(),
            _ => &[],
        }
    }

    pub fn selected_post(&self) -> Option<&Post> {
        self.posts().get(self.selected)
    }

    pub fn set_notice(&mut self, kind: NoticeKind, text: impl Into<String>) {
        self.notice = Some(Notice {
            kind,
            text: text.into(),
        });
    }

    fn notify_error(&mut self, err: &ApiError) {
        self.set_notice(NoticeKind::Error, err.user_message());
    }

    /// Mount whatever the current location shows.
    fn sync_route(&mut self) {
        let location = self.nav.current().clone();
        let remounted = match self.screen() {
            Screen::Feed(FeedKind::Home) => self.home.mount(&location),
            Screen::Feed(FeedKind::Explore) => self.explore.mount(&location),
            Screen::Profile(user_id) => {
                let fresh = self.profile.as_ref().map(|p| p.entry) != Some(location.id);
                if fresh {
                    self.load_profile(user_id, location.id);
                }
                fresh
            }
            Screen::NotFound => {
                self.set_notice(NoticeKind::Error, format!("Nothing at {}", location));
                false
            }
        };
        self.comments = None;
        if remounted {
            self.selected = 0;
        }
        self.clamp_selection();
    }

    fn go(&mut self, href: &str) {
        self.nav.push(href);
        self.sync_route();
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = Update> + Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(task.await);
        });
    }

    fn load_profile(&mut self, user_id: i64, entry: u64) {
        self.profile = Some(ProfileView {
            user_id,
            entry,
            data: Loadable::Loading,
        });
        let sources = self.ctx.sources.clone();
        self.spawn(async move {
            let (profile, posts) =
                tokio::join!(sources.profiles.profile(user_id), sources.profiles.posts(user_id));
            Update::Profile {
                user_id,
                result: profile.and_then(|p| posts.map(|posts| (p, posts))),
            }
        });
    }

    fn load_comments(&mut self, post_id: i64, reload: bool) {
        if let Some(pane) = self.comments.as_mut() {
            pane.comments = Loadable::Loading;
        }
        let sources = self.ctx.sources.clone();
        self.spawn(async move {
            let result = if reload {
                sources.comments.reload(post_id).await
            } else {
                sources.comments.list(post_id).await
            };
            Update::Comments { post_id, result }
        });
    }

    fn clamp_selection(&mut self) {
        let len = self.posts().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
        self.list_state
            .select(if len == 0 { None } else { Some(self.selected) });
    }

    /// Apply finished fetches. Called once per tick.
    pub fn tick(&mut self) {
        self.home.poll();
        self.explore.poll();
        while let Ok(update) = self.rx.try_recv() {
            self.apply_update(update);
        }
        self.clamp_selection();
    }

    fn apply_update(&mut self, update: Update) {
        match update {
            Update::Comments { post_id, result } => {
                if let Some(pane) = self.comments.as_mut().filter(|p| p.post_id == post_id) {
                    pane.comments = Loadable::from_result(result);
                }
            }
            Update::CommentAdded { post_id, result } => match result {
                Ok(_) => {
                    self.set_notice(NoticeKind::Info, "Comment added");
                    if self.comments.as_ref().is_some_and(|p| p.post_id == post_id) {
                        self.load_comments(post_id, false);
                    }
                }
                Err(e) => self.notify_error(&e),
            },
            Update::Profile { user_id, result } => {
                if let Some(view) = self.profile.as_mut().filter(|v| v.user_id == user_id) {
                    view.data = Loadable::from_result(result);
                }
            }
            Update::Follow {
                user_id,
                followed,
                result,
            } => match result {
                Ok(()) => {
                    let verb = if followed { "Following" } else { "Unfollowed" };
                    self.set_notice(NoticeKind::Info, format!("{} user {}", verb, user_id));
                    if self.screen() == Screen::Profile(user_id) {
                        let entry = self.nav.current().id;
                        self.load_profile(user_id, entry);
                    }
                }
                Err(e) => self.notify_error(&e),
            },
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, keybindings: &KeybindingConfig) {
        if self.input.is_some() {
            self.handle_input_key(key);
            return;
        }
        let action = keybindings.get_action(&key);
        self.handle_action(action);
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        let Some(input) = self.input.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.input = None,
            KeyCode::Enter => {
                if let Some(input) = self.input.take() {
                    self.submit_input(input);
                }
            }
            KeyCode::Backspace => {
                input.buffer.pop();
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input = None;
            }
            KeyCode::Char(c) => input.buffer.push(c),
            _ => {}
        }
    }

    fn submit_input(&mut self, input: Input) {
        match input.kind {
            InputKind::Search => self.with_feed(|feed, nav| {
                feed.set_search(input.buffer.trim());
                feed.submit(nav);
            }),
            InputKind::Tag => {
                let staged = self.feed_mut().is_some_and(|f| f.add_tag(&input.buffer));
                if staged {
                    self.set_notice(NoticeKind::Info, "Tag staged, press s to apply");
                }
            }
            InputKind::Comment { post_id } => {
                let form = CommentForm::new(input.buffer);
                if let Err(errors) = form.check() {
                    let message = errors
                        .for_field("content")
                        .unwrap_or("Invalid comment")
                        .to_string();
                    self.set_notice(NoticeKind::Error, message);
                    return;
                }
                let sources = self.ctx.sources.clone();
                self.spawn(async move {
                    let result = sources.add_comment(post_id, &form.content).await;
                    Update::CommentAdded { post_id, result }
                });
            }
        }
    }

    /// Run `f` on the active feed with the navigator borrowed alongside.
    fn with_feed(&mut self, f: impl FnOnce(&mut FeedController<Post>, &mut Navigator)) {
        let feed = match self.screen() {
            Screen::Feed(FeedKind::Home) => &mut self.home,
            Screen::Feed(FeedKind::Explore) => &mut self.explore,
            _ => return,
        };
        f(feed, &mut self.nav);
    }

    fn require_session(&mut self) -> bool {
        self.session = self.ctx.session.session();
        if self.session.is_none() {
            self.set_notice(NoticeKind::Error, LOGIN_REQUIRED);
            return false;
        }
        true
    }

    pub fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::MoveUp => {
                self.selected = self.selected.saturating_sub(1);
                self.clamp_selection();
            }
            Action::MoveDown => {
                self.selected = self.selected.saturating_add(1);
                self.clamp_selection();
            }
            Action::EditSearch => {
                let current = self
                    .feed()
                    .map(|feed| feed.draft().search().unwrap_or_default().to_string());
                if let Some(buffer) = current {
                    self.input = Some(Input {
                        kind: InputKind::Search,
                        buffer,
                    });
                }
            }
            Action::AddTag => {
                if self.feed().is_some() {
                    self.input = Some(Input {
                        kind: InputKind::Tag,
                        buffer: String::new(),
                    });
                }
            }
            Action::RemoveTag => self.with_feed(|feed, nav| {
                if let Some(last) = feed.draft().tags().last().cloned() {
                    feed.remove_tag(&last, nav);
                }
            }),
            Action::ClearTags => self.with_feed(|feed, nav| feed.clear_tags(nav)),
            Action::ToggleSort => self.with_feed(|feed, nav| {
                let sort = feed.draft().sort.toggled();
                feed.set_sort(sort);
                feed.submit(nav);
            }),
            Action::Submit => self.with_feed(|feed, nav| feed.submit(nav)),
            Action::LoadMore => {
                let available = self.feed().is_some_and(|feed| {
                    matches!(present(&feed.view()), FeedBody::Items { load_more: true, .. })
                });
                if available {
                    self.with_feed(|feed, nav| feed.load_more(nav));
                } else if self.feed().is_some() {
                    self.set_notice(NoticeKind::Info, "No more posts");
                }
            }
            Action::Refresh => self.refresh(),
            Action::OpenComments => {
                if let Some(post) = self.selected_post() {
                    let (post_id, post_title) = (post.id, post.display_title().to_string());
                    self.comments = Some(CommentsPane {
                        post_id,
                        post_title,
                        comments: Loadable::Loading,
                    });
                    self.load_comments(post_id, false);
                }
            }
            Action::WriteComment => {
                let target = self
                    .comments
                    .as_ref()
                    .map(|p| p.post_id)
                    .or_else(|| self.selected_post().map(|p| p.id));
                if let Some(post_id) = target {
                    if self.require_session() {
                        self.input = Some(Input {
                            kind: InputKind::Comment { post_id },
                            buffer: String::new(),
                        });
                    }
                }
            }
            Action::ToggleFollow => self.toggle_follow(),
            Action::OpenProfile => {
                if let Some(user_id) = self.selected_post().map(Post::author_id) {
                    self.go(&Route::Profile(user_id).path());
                }
            }
            Action::SwitchFeed => {
                let target = match self.screen() {
                    Screen::Feed(FeedKind::Home) => Route::Explore,
                    _ => Route::Home,
                };
                self.go(&target.path());
            }
            Action::Back => {
                if self.comments.take().is_none() && self.nav.back() {
                    self.sync_route();
                }
            }
            Action::Forward => {
                if self.nav.forward() {
                    self.sync_route();
                }
            }
            Action::Cancel => {
                if self.comments.take().is_none() {
                    self.notice = None;
                }
            }
            Action::None => {}
        }
    }

    fn refresh(&mut self) {
        if let Some(pane) = &self.comments {
            let post_id = pane.post_id;
            self.load_comments(post_id, true);
            return;
        }
        match self.screen() {
            Screen::Feed(_) => {
                if let Some(feed) = self.feed_mut() {
                    feed.refresh();
                }
            }
            Screen::Profile(user_id) => {
                self.ctx.sources.profiles.invalidate_user(user_id);
                let entry = self.nav.current().id;
                self.load_profile(user_id, entry);
            }
            Screen::NotFound => {}
        }
    }

    fn toggle_follow(&mut self) {
        let target = match self.screen() {
            Screen::Profile(user_id) => Some(user_id),
            _ => self.selected_post().map(Post::author_id),
        };
        let Some(user_id) = target else {
            return;
        };
        if !self.require_session() {
            return;
        }
        if self.session.as_ref().is_some_and(|s| s.user_id == user_id) {
            self.set_notice(NoticeKind::Info, "You can't follow yourself");
            return;
        }

        let sources = self.ctx.sources.clone();
        self.spawn(async move {
            let followed = match sources.profiles.is_followed(user_id).await {
                Ok(followed) => followed,
                Err(e) => {
                    return Update::Follow {
                        user_id,
                        followed: false,
                        result: Err(e),
                    }
                }
            };
            let result = if followed {
                sources.unfollow(user_id).await
            } else {
                sources.follow(user_id).await
            };
            Update::Follow {
                user_id,
                followed: !followed,
                result,
            }
        });
    }

    /// Whether the profile on screen belongs to the logged-in user.
    pub fn is_own_profile(&self) -> bool {
        match (self.screen(), &self.session) {
            (Screen::Profile(user_id), Some(session)) => session.user_id == user_id,
            _ => false,
        }
    }

    #[cfg(test)]
    async fn next_update(&mut self) {
        if let Some(update) = self.rx.recv().await {
            self.apply_update(update);
        }
    }
}
