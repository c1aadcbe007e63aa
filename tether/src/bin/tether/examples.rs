use crate::commands::{feed, graph, serve, users};

#[derive(Clone, Copy)]
pub struct ExampleGroup {
    pub title: &'static str,
    pub commands: &'static [&'static str],
}

#[derive(Clone, Copy)]
pub struct CommandExample {
    pub name: &'static str,
    pub groups: &'static [ExampleGroup],
}

pub fn command_examples() -> &'static [CommandExample] {
    &[
        CommandExample {
            name: "serve",
            groups: serve::EXAMPLES,
        },
        CommandExample {
            name: "users",
            groups: users::EXAMPLES,
        },
        CommandExample {
            name: "graph",
            groups: graph::EXAMPLES,
        },
        CommandExample {
            name: "feed",
            groups: feed::EXAMPLES,
        },
    ]
}
