use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::config::ColorConfig;
use crate::feed::{present, FeedBody};
use crate::tui::app::{Loadable, NoticeKind, Screen, TuiApp};
use crate::tui::render::{CommentLine, ItemRenderer, PostCard, SKELETON_ROWS};

pub fn render(frame: &mut Frame, app: &mut TuiApp, colors: &ColorConfig) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Address bar
            Constraint::Length(3), // Filters or profile header
            Constraint::Min(5),    // Body
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_address_bar(frame, app, chunks[0], colors);
    match app.screen() {
        Screen::Profile(_) => render_profile_header(frame, app, chunks[1], colors),
        _ => render_filter_bar(frame, app, chunks[1], colors),
    }

    if app.comments.is_some() {
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(chunks[2]);
        render_body(frame, app, body[0], colors, false);
        render_comments(frame, app, body[1], colors);
    } else {
        render_body(frame, app, chunks[2], colors, true);
    }

    render_status_bar(frame, app, chunks[3], colors);
}

fn border(active: bool, colors: &ColorConfig) -> Style {
    Style::default().fg(if active {
        colors.active_border
    } else {
        colors.inactive_border
    })
}

fn render_address_bar(frame: &mut Frame, app: &TuiApp, area: Rect, colors: &ColorConfig) {
    let who = match &app.session {
        Some(session) => format!("@{}", session.username),
        None => "not logged in".to_string(),
    };
    let line = Line::from(vec![
        Span::styled(" plaza ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(app.nav.current().href()),
        Span::styled(format!("  {}", who), Style::default().fg(colors.timestamp)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_filter_bar(frame: &mut Frame, app: &TuiApp, area: Rect, colors: &ColorConfig) {
    let Some(feed) = app.feed() else {
        frame.render_widget(Block::default().borders(Borders::ALL), area);
        return;
    };
    let draft = feed.draft();

    let mut spans = vec![
        Span::raw("Search: "),
        Span::styled(
            draft.search().unwrap_or("-").to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  Tags: "),
    ];
    if draft.tags().is_empty() {
        spans.push(Span::raw("-"));
    }
    for tag in draft.tags() {
        spans.push(Span::styled(
            format!("[{}] ", tag),
            Style::default().fg(colors.tag),
        ));
    }
    spans.push(Span::raw(format!("  Sort: {}", draft.sort.label())));
    if draft != feed.committed() {
        spans.push(Span::styled(
            "  (unapplied, s to apply)",
            Style::default().fg(colors.timestamp),
        ));
    }

    let title = match app.screen() {
        Screen::Feed(kind) => format!(" {} ", kind.title()),
        _ => String::new(),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border(false, colors));
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_profile_header(frame: &mut Frame, app: &TuiApp, area: Rect, colors: &ColorConfig) {
    let block = Block::default()
        .title(" Profile ")
        .borders(Borders::ALL)
        .border_style(border(false, colors));
    let line = match app.profile.as_ref().map(|v| &v.data) {
        Some(Loadable::Ready((profile, _))) => {
            let relation = if app.is_own_profile() {
                "(you)"
            } else if profile.is_followed {
                "Following"
            } else {
                "Not following"
            };
            Line::from(vec![
                Span::styled(
                    format!("@{} ", profile.user.display_name()),
                    Style::default()
                        .fg(colors.author)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!(
                    "{} posts · {} followers · {} following · {}",
                    profile.posts_count,
                    profile.followers_count,
                    profile.following_count,
                    relation
                )),
            ])
        }
        Some(Loadable::Failed(e)) => Line::from(Span::styled(
            e.user_message(),
            Style::default().fg(colors.error),
        )),
        _ => Line::from(Span::styled("░".repeat(24), Style::default().fg(colors.skeleton))),
    };
    frame.render_widget(Paragraph::new(line).block(block), area);
}

/// What the body list should contain.
enum Body {
    Rows(Vec<ListItem<'static>>),
    Message(Text<'static>),
}

fn skeleton_rows(colors: &ColorConfig) -> Vec<ListItem<'static>> {
    (0..SKELETON_ROWS).map(|_| PostCard.skeleton(colors)).collect()
}

fn try_again(message: String, colors: &ColorConfig) -> Text<'static> {
    Text::from(vec![
        Line::from(Span::styled(message, Style::default().fg(colors.error))),
        Line::from(""),
        Line::from("Press R to try again"),
    ])
}

fn feed_body(app: &TuiApp, colors: &ColorConfig) -> Body {
    let Some(feed) = app.feed() else {
        return Body::Message(Text::from("Nothing here"));
    };
    match present(&feed.view()) {
        FeedBody::Skeleton => Body::Rows(skeleton_rows(colors)),
        FeedBody::Failed { message } => Body::Message(try_again(message, colors)),
        FeedBody::Empty => {
            let message = match app.screen() {
                Screen::Feed(kind) => kind.empty_message(),
                _ => "No posts found.",
            };
            Body::Message(Text::from(message))
        }
        FeedBody::Items {
            items,
            inline_skeleton,
            load_more,
        } => {
            let mut rows: Vec<ListItem> = items.iter().map(|p| PostCard.render(p, colors)).collect();
            if inline_skeleton {
                rows.extend(skeleton_rows(colors));
            }
            if load_more {
                rows.push(ListItem::new(Line::from(Span::styled(
                    "── Load more (L) ──",
                    Style::default().fg(colors.active_border),
                ))));
            }
            Body::Rows(rows)
        }
    }
}

fn profile_body(app: &TuiApp, colors: &ColorConfig) -> Body {
    match app.profile.as_ref().map(|v| &v.data) {
        Some(Loadable::Ready((_, posts))) if posts.is_empty() => {
            Body::Message(Text::from("No posts yet."))
        }
        Some(Loadable::Ready((_, posts))) => {
            Body::Rows(posts.iter().map(|p| PostCard.render(p, colors)).collect())
        }
        Some(Loadable::Failed(e)) => Body::Message(try_again(e.user_message(), colors)),
        _ => Body::Rows(skeleton_rows(colors)),
    }
}

fn render_body(frame: &mut Frame, app: &mut TuiApp, area: Rect, colors: &ColorConfig, active: bool) {
    let body = match app.screen() {
        Screen::Profile(_) => profile_body(app, colors),
        _ => feed_body(app, colors),
    };
    let block = Block::default()
        .title(format!(" Posts ({}) ", app.posts().len()))
        .borders(Borders::ALL)
        .border_style(border(active, colors));

    match body {
        Body::Rows(rows) => {
            let list = List::new(rows)
                .block(block)
                .highlight_style(
                    Style::default()
                        .bg(colors.selection_bg)
                        .fg(colors.selection_fg),
                )
                .highlight_symbol("> ");
            frame.render_stateful_widget(list, area, &mut app.list_state);
        }
        Body::Message(text) => {
            let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
        }
    }
}

fn render_comments(frame: &mut Frame, app: &TuiApp, area: Rect, colors: &ColorConfig) {
    let Some(pane) = &app.comments else {
        return;
    };
    let block = Block::default()
        .title(format!(" Comments: {} ", pane.post_title))
        .borders(Borders::ALL)
        .border_style(border(true, colors));

    match &pane.comments {
        Loadable::Ready(list) if list.is_empty() => {
            frame.render_widget(Paragraph::new("No comments yet. Press c to write one.").block(block), area);
        }
        Loadable::Ready(list) => {
            let rows: Vec<ListItem> = list.iter().map(|c| CommentLine.render(c, colors)).collect();
            frame.render_widget(List::new(rows).block(block), area);
        }
        Loadable::Failed(e) => {
            let paragraph = Paragraph::new(try_again(e.user_message(), colors))
                .block(block)
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
        }
        Loadable::Loading => {
            let rows: Vec<ListItem> = (0..SKELETON_ROWS).map(|_| CommentLine.skeleton(colors)).collect();
            frame.render_widget(List::new(rows).block(block), area);
        }
    }
}

fn render_status_bar(frame: &mut Frame, app: &TuiApp, area: Rect, colors: &ColorConfig) {
    let style = Style::default().fg(colors.status_fg).bg(colors.status_bg);
    let line = if let Some(input) = &app.input {
        Line::from(format!("{}: {}▏ (Enter to confirm, Esc to cancel)", input.kind.prompt(), input.buffer))
    } else if let Some(notice) = &app.notice {
        let fg = match notice.kind {
            NoticeKind::Error => colors.error,
            NoticeKind::Info => colors.status_fg,
        };
        Line::from(Span::styled(notice.text.clone(), Style::default().fg(fg)))
    } else {
        Line::from("/:Search +/-:Tag X:Clear o:Sort L:More R:Refresh Enter:Comments f:Follow u:Profile e:Explore [/]:Back/Fwd q:Quit")
    };
    frame.render_widget(Paragraph::new(line).style(style), area);
}
