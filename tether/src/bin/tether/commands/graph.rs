use anyhow::Result;
use clap::{Args, Subcommand};
use comfy_table::{Cell, Table};
use serde::Serialize;
use tether::{
    Counts, FollowOutcome, FollowState, Page, ProfileAggregator, TetherConfig, http::schema::ConnectionView,
    models::DEFAULT_PAGE_SIZE,
};

use super::{connect, short_date};
use crate::examples::ExampleGroup;
use crate::output::{GlobalOptions, OutputManager, TableDisplay, themed_table};
use crate::theme::ICONS;

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Change Relationships",
        commands: &[
            "tether graph follow <follower-id> <followee-id>",
            "tether graph unfollow <follower-id> <followee-id>",
        ],
    },
    ExampleGroup {
        title: "Inspect Relationships",
        commands: &[
            "tether graph counts <user-id>                      # Follower and following totals",
            "tether graph followers <user-id> --page 2          # Newest followers first",
            "tether graph following <user-id> --viewer <id>     # Annotated for another account",
            "tether graph status <viewer-id> <target-id>        # none, following or mutual",
        ],
    },
];

#[derive(Subcommand)]
pub enum GraphCommands {
    /// Make one account follow another
    #[command(name = "follow")]
    Follow { follower_id: String, followee_id: String },

    /// Remove a follow relationship
    #[command(name = "unfollow")]
    Unfollow { follower_id: String, followee_id: String },

    /// Show follower and following totals
    #[command(name = "counts")]
    Counts { user_id: String },

    /// List who follows an account
    #[command(name = "followers")]
    Followers(ListArgs),

    /// List whom an account follows
    #[command(name = "following")]
    Following(ListArgs),

    /// Show how one account relates to another
    #[command(name = "status")]
    Status { viewer_id: String, target_id: String },
}

#[derive(Args)]
pub struct ListArgs {
    user_id: String,

    /// Annotate each entry with this account's follow state
    #[arg(long)]
    viewer: Option<String>,

    /// 1-based page number; omit to list everything
    #[arg(long)]
    page: Option<u64>,

    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: u64,
}

impl ListArgs {
    fn page(&self) -> Option<Page> {
        self.page.map(|page| Page::new(page, self.page_size))
    }
}

#[derive(Serialize)]
struct ConnectionList {
    connections: Vec<ConnectionView>,
}

impl TableDisplay for ConnectionList {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = themed_table(options, &["Id", "Username", "Since", "State"]);
        for entry in &self.connections {
            table.add_row(vec![
                Cell::new(&entry.user.id),
                Cell::new(format!("@{}", entry.user.username)),
                Cell::new(entry.followed_at.as_ref().map(short_date).unwrap_or_default()),
                Cell::new(match entry.follow_state {
                    Some(FollowState::Mutual) => format!("{} mutual", ICONS.mutual),
                    Some(state) => state_label(state).to_string(),
                    None => String::new(),
                }),
            ]);
        }
        table
    }

    fn to_compact(&self) -> String {
        self.connections
            .iter()
            .map(|entry| entry.user.id.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Serialize)]
struct CountsView {
    user_id: String,
    #[serde(flatten)]
    counts: Counts,
}

impl TableDisplay for CountsView {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = themed_table(options, &["User", "Followers", "Following"]);
        table.add_row(vec![
            Cell::new(&self.user_id),
            Cell::new(self.counts.followers),
            Cell::new(self.counts.following),
        ]);
        table
    }

    fn to_compact(&self) -> String {
        format!("{} {} {}", self.user_id, self.counts.followers, self.counts.following)
    }
}

fn state_label(state: FollowState) -> &'static str {
    match state {
        FollowState::None => "none",
        FollowState::Following => "following",
        FollowState::Mutual => "mutual",
    }
}

pub async fn handle_graph_commands(command: GraphCommands, config: &TetherConfig, output: &OutputManager) -> Result<()> {
    let client = connect(config).await?;
    let relationships = client.relationships();

    match command {
        GraphCommands::Follow {
            follower_id,
            followee_id,
        } => match relationships.follow(&follower_id, &followee_id).await? {
            FollowOutcome::Followed => output.success(&format!("{follower_id} now follows {followee_id}")),
            FollowOutcome::AlreadyFollowing => output.info(&format!("{follower_id} already follows {followee_id}")),
        },
        GraphCommands::Unfollow {
            follower_id,
            followee_id,
        } => {
            if relationships.unfollow(&follower_id, &followee_id).await? {
                output.success(&format!("{follower_id} no longer follows {followee_id}"));
            } else {
                output.warning(&format!("{follower_id} was not following {followee_id}"));
            }
        }
        GraphCommands::Counts { user_id } => {
            if !client.identity().exists(&user_id).await? {
                anyhow::bail!("user {user_id} not found");
            }
            let counts = relationships.counts(&user_id).await?;
            output.display(&CountsView { user_id, counts })?;
        }
        GraphCommands::Followers(args) => {
            let edges = relationships.list_followers(&args.user_id, args.page()).await?;
            display_connections(&client, args.viewer.as_deref(), edges, output).await?;
        }
        GraphCommands::Following(args) => {
            let edges = relationships.list_following(&args.user_id, args.page()).await?;
            display_connections(&client, args.viewer.as_deref(), edges, output).await?;
        }
        GraphCommands::Status { viewer_id, target_id } => {
            let flags = relationships.follow_flags(&viewer_id, std::slice::from_ref(&target_id)).await?;
            let (forward, backward) = flags.first().copied().unwrap_or_default();
            let state = FollowState::derive(forward, backward);
            if output.is_json() {
                println!("{}", serde_json::json!({ "viewerId": viewer_id, "targetId": target_id, "state": state }));
            } else {
                output.key_value("Follows", if forward { "yes" } else { "no" });
                output.key_value("Followed back", if backward { "yes" } else { "no" });
                output.key_value("State", state_label(state));
            }
        }
    }

    Ok(())
}

async fn display_connections(
    client: &tether::Client,
    viewer: Option<&str>,
    edges: Vec<tether::Edge>,
    output: &OutputManager,
) -> Result<()> {
    if edges.is_empty() && !output.is_json() {
        output.info("No connections.");
        return Ok(());
    }
    let profiles = ProfileAggregator::new(client.identity(), client.relationships());
    let entries = profiles.annotate(viewer, edges).await?;
    output.display(&ConnectionList {
        connections: entries.into_iter().map(ConnectionView::from).collect(),
    })
}
