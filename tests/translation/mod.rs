pub mod selector_tests;
