#[path = "social_graph/support.rs"]
mod support;

#[path = "social_graph/feed_tests.rs"]
mod feed_tests;
#[path = "social_graph/identity_tests.rs"]
mod identity_tests;
#[path = "social_graph/post_tests.rs"]
mod post_tests;
#[path = "social_graph/profile_tests.rs"]
mod profile_tests;
#[path = "social_graph/relationship_tests.rs"]
mod relationship_tests;
