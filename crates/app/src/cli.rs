use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Home feed: reviews written by the given users.
    Feed {
        /// Users to follow; defaults to the session user.
        #[arg(long = "user", value_delimiter = ',')]
        users: Vec<String>,
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// Reviews of one or more albums.
    AlbumReviews {
        #[arg(long = "album", value_delimiter = ',', required = true)]
        albums: Vec<String>,
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// Notifications about the given users, drained in full.
    Activity {
        #[arg(long = "user", value_delimiter = ',')]
        users: Vec<String>,
    },
    /// Messages of a conversation, newest first.
    Chat {
        #[arg(long)]
        conversation: String,
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// Toggle the session user's like on a review from a loaded feed.
    Like {
        #[arg(long)]
        review: String,
        /// Home feed of these users; defaults to the session user.
        #[arg(long = "user", value_delimiter = ',')]
        users: Vec<String>,
        /// Look the review up among album reviews instead.
        #[arg(long = "album", value_delimiter = ',')]
        albums: Vec<String>,
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// Recent search terms.
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// Poll for new activity and refresh the activity feed when it changes.
    Watch {
        #[arg(long = "user", value_delimiter = ',')]
        users: Vec<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum HistoryAction {
    List,
    Add { term: String },
    Remove { term: String },
    Clear,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command, HistoryAction};

    #[test]
    fn parses_comma_separated_users() {
        let cli = Cli::parse_from(["liner", "feed", "--user", "u1,u2", "--pages", "3"]);
        match cli.command {
            Command::Feed { users, pages } => {
                assert_eq!(users, vec!["u1".to_string(), "u2".to_string()]);
                assert_eq!(pages, 3);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn like_takes_the_feed_to_search() {
        let cli = Cli::parse_from(["liner", "like", "--review", "r1", "--album", "a1,a2"]);
        match cli.command {
            Command::Like {
                review,
                users,
                albums,
                pages,
            } => {
                assert_eq!(review, "r1");
                assert!(users.is_empty());
                assert_eq!(albums, vec!["a1".to_string(), "a2".to_string()]);
                assert_eq!(pages, 1);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn album_reviews_requires_album() {
        assert!(Cli::try_parse_from(["liner", "album-reviews"]).is_err());
    }

    #[test]
    fn parses_history_add() {
        let cli = Cli::parse_from(["liner", "history", "add", "kid a"]);
        assert!(matches!(
            cli.command,
            Command::History { action: HistoryAction::Add { ref term } } if term == "kid a"
        ));
    }
}
