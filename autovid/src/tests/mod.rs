mod resolver_tests;
mod tree_tests;
mod workflow_tests;
