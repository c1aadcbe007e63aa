use redis::Script;
use std::sync::LazyLock;

pub const ENTITY_MUTATION_SCRIPT_BODY: &str = include_str!("../../lua/entity_mutation.lua");
pub const EDGE_MUTATION_SCRIPT_BODY: &str = include_str!("../../lua/edge_mutation.lua");
pub const POST_MUTATION_SCRIPT_BODY: &str = include_str!("../../lua/post_mutation.lua");
pub const COMMENT_MUTATION_SCRIPT_BODY: &str = include_str!("../../lua/comment_mutation.lua");

pub static ENTITY_MUTATION_SCRIPT: LazyLock<Script> = LazyLock::new(|| Script::new(ENTITY_MUTATION_SCRIPT_BODY));
pub static EDGE_MUTATION_SCRIPT: LazyLock<Script> = LazyLock::new(|| Script::new(EDGE_MUTATION_SCRIPT_BODY));
pub static POST_MUTATION_SCRIPT: LazyLock<Script> = LazyLock::new(|| Script::new(POST_MUTATION_SCRIPT_BODY));
pub static COMMENT_MUTATION_SCRIPT: LazyLock<Script> = LazyLock::new(|| Script::new(COMMENT_MUTATION_SCRIPT_BODY));
