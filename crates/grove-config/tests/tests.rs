// Integration-test harness for grove-config.
//
// Keep this the only file at the root of `tests/` so all integration tests
// build into a single binary.

mod suite;
