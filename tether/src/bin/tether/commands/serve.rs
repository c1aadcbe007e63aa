use anyhow::Result;
use clap::Args;
use tether::TetherConfig;

use crate::examples::ExampleGroup;
use crate::output::OutputManager;

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Run the API",
    commands: &[
        "tether serve                          # Bind the address from tether.toml",
        "tether serve --bind 127.0.0.1:8080    # Override the listen address",
        "tether --config prod.toml serve       # Use another configuration file",
    ],
}];

#[derive(Args)]
pub struct ServeArgs {
    /// Address to listen on, overriding `server.bind`
    #[arg(long)]
    bind: Option<String>,
}

pub async fn handle_serve(args: ServeArgs, mut config: TetherConfig, output: &OutputManager) -> Result<()> {
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    output.info(&format!("Serving on {} (prefix '{}')", config.server.bind, config.redis.prefix));
    tether::http::serve(config).await
}
