//! The built-in gator commands.
//!
//! Each handler checks its arguments, calls one [`FeedFollowService`]
//! operation and prints the outcome.
//!
//! [`FeedFollowService`]: crate::service::FeedFollowService

use futures::future::LocalBoxFuture;
use futures::FutureExt;

use super::registry::{CommandRegistry, CommandResult, Handler};
use crate::app::App;
use crate::error::CommandError;
use crate::storage::User;

/// Feed fetched by `agg` when no URL is given.
pub const AGG_DEFAULT_URL: &str = "https://www.wagslane.dev/index.xml";

const SEPARATOR: &str = "--------------------";

/// `(name, usage)` for every built-in command, in help order.
pub const COMMANDS: &[(&str, &str)] = &[
    ("register", "register <username>"),
    ("login", "login <username>"),
    ("users", "users"),
    ("reset", "reset"),
    ("addfeed", "addfeed <name> <url>"),
    ("feeds", "feeds"),
    ("follow", "follow <url>"),
    ("following", "following"),
    ("unfollow", "unfollow <url>"),
    ("agg", "agg [url]"),
    ("help", "help"),
];

/// A registry with every built-in command.
pub fn registry() -> CommandRegistry<App> {
    let mut registry = CommandRegistry::new();
    registry.register("login", Handler::Public(handle_login));
    registry.register("register", Handler::Public(handle_register));
    registry.register("reset", Handler::Public(handle_reset));
    registry.register("users", Handler::Public(handle_users));
    registry.register("agg", Handler::Public(handle_agg));
    registry.register("addfeed", Handler::Authenticated(handle_add_feed));
    registry.register("feeds", Handler::Public(handle_feeds));
    registry.register("follow", Handler::Authenticated(handle_follow));
    registry.register("following", Handler::Authenticated(handle_following));
    registry.register("unfollow", Handler::Authenticated(handle_unfollow));
    registry.register("help", Handler::Public(handle_help));
    registry
}

fn required<'a>(
    args: &'a [String],
    index: usize,
    command: &'static str,
    usage: &'static str,
) -> Result<&'a str, CommandError> {
    args.get(index)
        .map(String::as_str)
        .ok_or(CommandError::MissingArgument { command, usage })
}

fn handle_login<'a>(app: &'a mut App, args: &'a [String]) -> LocalBoxFuture<'a, CommandResult> {
    async move {
        let username = required(args, 0, "login", "a username")?;
        let user = app.service.login(username).await?;
        writeln!(app.out(), "User {} has been set", user.name)?;
        Ok(())
    }
    .boxed_local()
}

fn handle_register<'a>(app: &'a mut App, args: &'a [String]) -> LocalBoxFuture<'a, CommandResult> {
    async move {
        let username = required(args, 0, "register", "a username")?;
        let user = app.service.register(username).await?;
        let out = app.out();
        writeln!(out, "User created!")?;
        writeln!(out, "  id:         {}", user.id)?;
        writeln!(out, "  name:       {}", user.name)?;
        writeln!(out, "  created_at: {}", user.created_at.to_rfc3339())?;
        writeln!(out, "User {} has been set", user.name)?;
        Ok(())
    }
    .boxed_local()
}

fn handle_reset<'a>(app: &'a mut App, _args: &'a [String]) -> LocalBoxFuture<'a, CommandResult> {
    async move {
        let removed = app.service.reset_all().await?;
        writeln!(app.out(), "Reset complete: removed {} users", removed)?;
        Ok(())
    }
    .boxed_local()
}

fn handle_users<'a>(app: &'a mut App, _args: &'a [String]) -> LocalBoxFuture<'a, CommandResult> {
    async move {
        let users = app.service.list_users().await?;
        let out = app.out();
        for entry in users {
            if entry.is_current {
                writeln!(out, "* {} (current)", entry.user.name)?;
            } else {
                writeln!(out, "* {}", entry.user.name)?;
            }
        }
        Ok(())
    }
    .boxed_local()
}

fn handle_agg<'a>(app: &'a mut App, args: &'a [String]) -> LocalBoxFuture<'a, CommandResult> {
    async move {
        let url = args.first().map(String::as_str).unwrap_or(AGG_DEFAULT_URL);
        let feed = app.service.fetch_once(url).await?;

        let out = app.out();
        writeln!(out, "Feed: {}", feed.title)?;
        if let Some(link) = &feed.link {
            writeln!(out, "Link: {}", link)?;
        }
        if let Some(description) = &feed.description {
            writeln!(out, "Description: {}", description)?;
        }
        writeln!(out, "Items: {}", feed.items.len())?;
        for item in &feed.items {
            writeln!(out, "{}", SEPARATOR)?;
            writeln!(out, "Title: {}", item.title)?;
            if let Some(link) = &item.link {
                writeln!(out, "Link: {}", link)?;
            }
            if let Some(date) = &item.pub_date {
                writeln!(out, "Published: {}", date)?;
            }
            if let Some(description) = &item.description {
                writeln!(out, "Description: {}", description)?;
            }
        }
        Ok(())
    }
    .boxed_local()
}

fn handle_add_feed<'a>(
    app: &'a mut App,
    args: &'a [String],
    user: User,
) -> LocalBoxFuture<'a, CommandResult> {
    async move {
        let usage = "a name and a url";
        let name = required(args, 0, "addfeed", usage)?;
        let url = required(args, 1, "addfeed", usage)?;

        let (feed, follow) = app.service.create_feed(&user, name, url).await?;
        let out = app.out();
        writeln!(out, "{}", SEPARATOR)?;
        writeln!(out, "Feed name: {}", feed.name)?;
        writeln!(out, "Feed url: {}", feed.url)?;
        writeln!(out, "Feed creator: {}", user.name)?;
        writeln!(out, "Followed by: {}", follow.user_name)?;
        writeln!(out, "{}", SEPARATOR)?;
        Ok(())
    }
    .boxed_local()
}

fn handle_feeds<'a>(app: &'a mut App, _args: &'a [String]) -> LocalBoxFuture<'a, CommandResult> {
    async move {
        let feeds = app.service.list_feeds().await?;
        let out = app.out();
        for feed in feeds {
            writeln!(out, "{}", SEPARATOR)?;
            writeln!(out, "Feed name: {}", feed.name)?;
            writeln!(out, "Feed url: {}", feed.url)?;
            writeln!(out, "Feed creator: {}", feed.creator_name)?;
            writeln!(out, "{}", SEPARATOR)?;
        }
        Ok(())
    }
    .boxed_local()
}

fn handle_follow<'a>(
    app: &'a mut App,
    args: &'a [String],
    user: User,
) -> LocalBoxFuture<'a, CommandResult> {
    async move {
        let url = required(args, 0, "follow", "a url")?;
        let follow = app.service.follow_feed(&user, url).await?;
        let out = app.out();
        writeln!(out, "{}", SEPARATOR)?;
        writeln!(out, "Feed name: {}", follow.feed_name)?;
        writeln!(out, "Followed by: {}", follow.user_name)?;
        writeln!(out, "{}", SEPARATOR)?;
        Ok(())
    }
    .boxed_local()
}

fn handle_following<'a>(
    app: &'a mut App,
    _args: &'a [String],
    user: User,
) -> LocalBoxFuture<'a, CommandResult> {
    async move {
        let follows = app.service.list_following(&user).await?;
        let out = app.out();
        for follow in follows {
            writeln!(out, "{}", SEPARATOR)?;
            writeln!(out, "Feed name: {}", follow.feed_name)?;
            writeln!(out, "Feed url: {}", follow.feed_url)?;
            writeln!(out, "Followed by: {}", follow.user_name)?;
            writeln!(out, "{}", SEPARATOR)?;
        }
        Ok(())
    }
    .boxed_local()
}

fn handle_unfollow<'a>(
    app: &'a mut App,
    args: &'a [String],
    user: User,
) -> LocalBoxFuture<'a, CommandResult> {
    async move {
        let url = required(args, 0, "unfollow", "a url")?;
        let (feed, removed) = app.service.unfollow_feed(&user, url).await?;
        if removed {
            writeln!(app.out(), "Unfollowed {}", feed.name)?;
        } else {
            writeln!(app.out(), "{} was not following {}", user.name, feed.name)?;
        }
        Ok(())
    }
    .boxed_local()
}

fn handle_help<'a>(app: &'a mut App, _args: &'a [String]) -> LocalBoxFuture<'a, CommandResult> {
    async move {
        let out = app.out();
        writeln!(out, "usage: gator <command> [args...]")?;
        writeln!(out)?;
        for (_, usage) in COMMANDS {
            writeln!(out, "  {}", usage)?;
        }
        Ok(())
    }
    .boxed_local()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_listed_command_is_registered() {
        let registry = registry();
        let mut listed: Vec<&str> = COMMANDS.iter().map(|(name, _)| *name).collect();
        listed.sort_unstable();
        assert_eq!(registry.names(), listed);
    }

    #[test]
    fn test_auth_requirements() {
        let registry = registry();
        for name in ["addfeed", "follow", "following", "unfollow"] {
            assert!(registry.get(name).unwrap().requires_auth(), "{name}");
        }
        for name in ["login", "register", "reset", "users", "feeds", "agg", "help"] {
            assert!(!registry.get(name).unwrap().requires_auth(), "{name}");
        }
    }

    #[test]
    fn test_required_argument() {
        let args = vec!["alice".to_string()];
        assert_eq!(required(&args, 0, "login", "a username").unwrap(), "alice");

        let err = required(&args, 1, "addfeed", "a name and a url").unwrap_err();
        assert!(matches!(
            err,
            CommandError::MissingArgument {
                command: "addfeed",
                ..
            }
        ));
    }
}
