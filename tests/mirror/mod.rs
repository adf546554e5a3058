mod pagination_tests;
mod sync_tests;
