use anyhow::Result;
use clap::{Args, Subcommand};
use comfy_table::{Cell, Table};
use serde::Serialize;
use tether::{NewUser, ProfileAggregator, PublicUser, TetherConfig, http::schema::ProfileView};

use super::{connect, short_date};
use crate::examples::ExampleGroup;
use crate::output::{GlobalOptions, OutputManager, TableDisplay, themed_table};

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Browse Accounts",
        commands: &[
            "tether users list                     # Every registered account",
            "tether users show <user-id>           # Profile with follower counts",
            "tether --output json users show <id>  # Same, as JSON",
        ],
    },
    ExampleGroup {
        title: "Create Accounts",
        commands: &[
            "tether users register --name \"Ada Lovelace\" --username ada --email ada@example.com --password s3cret!",
        ],
    },
];

#[derive(Subcommand)]
pub enum UserCommands {
    /// List registered accounts
    #[command(name = "list")]
    List,

    /// Show one profile with connection counts
    #[command(name = "show")]
    Show {
        /// Account id
        user_id: String,
    },

    /// Register a new account
    #[command(name = "register")]
    Register(RegisterArgs),
}

#[derive(Args)]
pub struct RegisterArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    username: String,
    #[arg(long)]
    email: String,
    #[arg(long, env = "TETHER_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Serialize)]
struct UserList {
    users: Vec<UserRow>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserRow {
    #[serde(flatten)]
    user: PublicUser,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl TableDisplay for UserList {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = themed_table(options, &["Id", "Username", "Name", "Joined"]);
        for row in &self.users {
            table.add_row(vec![
                Cell::new(&row.user.id),
                Cell::new(format!("@{}", row.user.username)),
                Cell::new(&row.user.name),
                Cell::new(short_date(&row.created_at)),
            ]);
        }
        table
    }

    fn to_compact(&self) -> String {
        self.users
            .iter()
            .map(|row| format!("{} @{}", row.user.id, row.user.username))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl TableDisplay for ProfileView {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = themed_table(options, &["Field", "Value"]);
        let rows = [
            ("Id", self.user.id.clone()),
            ("Username", format!("@{}", self.user.username)),
            ("Name", self.user.name.clone()),
            ("Email", self.email.clone()),
            ("Bio", self.bio.clone().unwrap_or_default()),
            ("Current post", self.current_post.clone().unwrap_or_default()),
            ("Followers", self.counts.followers.to_string()),
            ("Following", self.counts.following.to_string()),
            ("Joined", short_date(&self.created_at)),
        ];
        for (field, value) in rows {
            table.add_row(vec![Cell::new(field), Cell::new(value)]);
        }
        table
    }

    fn to_compact(&self) -> String {
        format!(
            "@{} followers={} following={}",
            self.user.username, self.counts.followers, self.counts.following
        )
    }
}

pub async fn handle_user_commands(command: UserCommands, config: &TetherConfig, output: &OutputManager) -> Result<()> {
    let client = connect(config).await?;
    let identity = client.identity();

    match command {
        UserCommands::List => {
            let users = identity.list_all().await?;
            if users.is_empty() && !output.is_json() {
                output.info("No accounts registered yet.");
                return Ok(());
            }
            let list = UserList {
                users: users
                    .iter()
                    .map(|user| UserRow {
                        user: user.public(),
                        created_at: user.created_at,
                    })
                    .collect(),
            };
            output.display(&list)?;
        }
        UserCommands::Show { user_id } => {
            let profiles = ProfileAggregator::new(identity, client.relationships());
            let summary = profiles.summary(&user_id, None).await?;
            output.display(&ProfileView::from(summary))?;
        }
        UserCommands::Register(args) => {
            let user = identity
                .register(NewUser {
                    name: args.name,
                    username: args.username,
                    email: args.email,
                    password: args.password,
                })
                .await?;
            output.success(&format!("Registered @{} ({})", user.username, user.id));
        }
    }

    Ok(())
}
