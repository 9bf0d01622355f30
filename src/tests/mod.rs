//! Cross-module tests against an in-memory channel.


mod player_tests;
mod scatter_tests;
