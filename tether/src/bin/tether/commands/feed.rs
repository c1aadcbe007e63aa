use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Table};
use serde::Serialize;
use tether::{FeedAssembler, Page, TetherConfig, http::schema::PostView};

use super::{connect, short_date};
use crate::examples::ExampleGroup;
use crate::output::{GlobalOptions, OutputManager, TableDisplay, themed_table};
use crate::theme::ICONS;

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Read the Feed",
    commands: &[
        "tether feed <viewer-id>                   # Newest 20 posts as the viewer sees them",
        "tether feed <viewer-id> --limit 50",
        "tether --output json feed <viewer-id>",
    ],
}];

#[derive(Args)]
pub struct FeedArgs {
    /// Account the feed is assembled for
    viewer_id: String,

    /// Number of posts to show
    #[arg(long, default_value_t = 20)]
    limit: u64,
}

#[derive(Serialize)]
struct FeedView {
    posts: Vec<PostView>,
}

impl TableDisplay for FeedView {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = themed_table(options, &["Post", "Author", "Posted", "Body", "Likes", "Comments"]);
        for post in &self.posts {
            let likes = if post.is_liked {
                format!("{} {}", post.likes, ICONS.heart)
            } else {
                post.likes.to_string()
            };
            table.add_row(vec![
                Cell::new(&post.id),
                Cell::new(format!("@{}", post.author.username)),
                Cell::new(short_date(&post.created_at)),
                Cell::new(preview(post)),
                Cell::new(likes),
                Cell::new(post.comments),
            ]);
        }
        table
    }

    fn to_compact(&self) -> String {
        self.posts
            .iter()
            .map(|post| format!("{} @{} {}", post.id, post.author.username, preview(post)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn preview(post: &PostView) -> String {
    const WIDTH: usize = 48;
    let text = match (&post.body, &post.media) {
        (Some(body), _) => body.as_str(),
        (None, Some(media)) => media.reference.as_str(),
        (None, None) => "",
    };
    if text.chars().count() <= WIDTH {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(WIDTH - 1).collect();
    cut.push('…');
    cut
}

pub async fn handle_feed(args: FeedArgs, config: &TetherConfig, output: &OutputManager) -> Result<()> {
    let client = connect(config).await?;
    if !client.identity().exists(&args.viewer_id).await? {
        anyhow::bail!("user {} not found", args.viewer_id);
    }
    let assembler = FeedAssembler::new(client.identity(), client.posts());
    let items = assembler
        .feed(Some(&args.viewer_id), Some(Page::first(args.limit.max(1))))
        .await?;
    if items.is_empty() && !output.is_json() {
        output.info("Nothing posted yet.");
        return Ok(());
    }
    output.display(&FeedView {
        posts: items.into_iter().map(PostView::from).collect(),
    })
}
