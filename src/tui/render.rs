//! Per-kind list item rendering.

use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::ListItem,
};

use crate::config::ColorConfig;
use crate::domain::{Comment, Post};

/// Placeholder rows shown while a page loads.
pub const SKELETON_ROWS: usize = 3;

/// Turns one item into a list row. Feed views stay generic over the item
/// kind and take a renderer for it.
pub trait ItemRenderer<T> {
    fn render(&self, item: &T, colors: &ColorConfig) -> ListItem<'static>;

    fn skeleton(&self, colors: &ColorConfig) -> ListItem<'static> {
        let style = Style::default().fg(colors.skeleton);
        ListItem::new(vec![
            Line::from(Span::styled("░".repeat(28), style)),
            Line::from(Span::styled("░".repeat(16), style)),
        ])
    }
}

pub struct PostCard;

impl PostCard {
    pub fn byline(post: &Post) -> String {
        let date = post
            .created()
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        let comments = match post.comment_count {
            1 => "1 comment".to_string(),
            n => format!("{} comments", n),
        };
        [post.author_name().to_string(), date, comments]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" · ")
    }
}

impl ItemRenderer<Post> for PostCard {
    fn render(&self, post: &Post, colors: &ColorConfig) -> ListItem<'static> {
        let mut lines = vec![
            Line::from(Span::styled(
                post.display_title().to_string(),
                Style::default()
                    .fg(colors.title)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                Self::byline(post),
                Style::default().fg(colors.author),
            )),
        ];
        let preview: String = post
            .content
            .lines()
            .next()
            .unwrap_or_default()
            .chars()
            .take(120)
            .collect();
        if !preview.is_empty() {
            lines.push(Line::from(preview));
        }
        if !post.tags.is_empty() {
            let tags = post.tags.iter().map(|t| format!("#{}", t)).collect::<Vec<_>>();
            lines.push(Line::from(Span::styled(
                tags.join(" "),
                Style::default().fg(colors.tag),
            )));
        }
        lines.push(Line::from(""));
        ListItem::new(lines)
    }
}

pub struct CommentLine;

impl ItemRenderer<Comment> for CommentLine {
    fn render(&self, comment: &Comment, colors: &ColorConfig) -> ListItem<'static> {
        let date = comment
            .created()
            .map(|d| d.format("%m/%d %H:%M").to_string())
            .unwrap_or_default();
        let mut lines = vec![Line::from(vec![
            Span::styled(
                comment.user.display_name().to_string(),
                Style::default().fg(colors.author),
            ),
            Span::raw(" "),
            Span::styled(date, Style::default().fg(colors.timestamp)),
        ])];
        lines.extend(comment.content.lines().map(|l| Line::from(l.to_string())));
        ListItem::new(lines)
    }
}
