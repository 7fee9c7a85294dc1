//! Scenario tests for check semantics.
//!
//! The tests in `tests/` drive a container-platform authorization model
//! (server, projects, instances and other project resources, with group
//! indirection and public wildcard access) through the `zanzi-server`
//! handlers over the in-memory store.
