pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "plaza")]
#[command(about = "A terminal client for the plaza social network", long_about = None)]
pub struct Cli {
    /// Backend base URL, overriding `[api].base_url` from the config file
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in; the password is read from stdin
    Login {
        email: String,
    },
    /// Create an account; the password is read from stdin twice
    Signup {
        username: String,
        email: String,
    },
    /// Forget the stored token
    Logout,
    /// Show the logged in user
    Whoami,
    /// Print one page of a feed
    Feed {
        /// Use the explore feed instead of your home feed
        #[arg(long)]
        explore: bool,

        /// Bookmarkable query string, e.g. "tags=art,music&sort=asc"
        #[arg(short, long, default_value = "")]
        query: String,
    },
    /// Publish a post
    Post {
        title: String,
        content: String,

        /// Tag to attach; repeat for more
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        #[arg(long)]
        image_url: Option<String>,
    },
    /// List comments on a post
    Comments {
        post_id: i64,
    },
    /// Comment on a post
    Comment {
        post_id: i64,
        content: String,
    },
    /// Follow a user
    Follow {
        user_id: i64,
    },
    /// Unfollow a user
    Unfollow {
        user_id: i64,
    },
    /// Show a user's profile and posts
    Profile {
        user_id: i64,
    },
    /// Launch the TUI
    Tui {
        /// Start location, e.g. "/explore?tags=art,music&sort=asc"
        #[arg(short, long, default_value = "/")]
        location: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags_and_repeated_tags() {
        let cli = Cli::try_parse_from([
            "plaza", "post", "Hi", "Body", "--tag", "art", "-t", "music", "--api-url",
            "http://example.test/v1",
        ])
        .unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://example.test/v1"));
        match cli.command {
            Commands::Post { tags, image_url, .. } => {
                assert_eq!(tags, vec!["art", "music"]);
                assert!(image_url.is_none());
            }
            _ => panic!("expected post"),
        }
    }

    #[test]
    fn test_feed_defaults() {
        let cli = Cli::try_parse_from(["plaza", "feed", "--explore"]).unwrap();
        match cli.command {
            Commands::Feed { explore, query } => {
                assert!(explore);
                assert!(query.is_empty());
            }
            _ => panic!("expected feed"),
        }
    }

    #[test]
    fn test_tui_location() {
        let cli = Cli::try_parse_from(["plaza", "tui", "-l", "/explore?sort=asc"]).unwrap();
        assert!(matches!(cli.command, Commands::Tui { location } if location == "/explore?sort=asc"));
    }
}
