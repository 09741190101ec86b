mod cluster_tests;
mod layout_tests;
mod lifecycle_tests;
mod orchestrator_tests;
