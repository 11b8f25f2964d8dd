// Integration test harness for the `grove` binary.
//
// Keep CLI tests as submodules here rather than adding top-level
// `tests/*.rs` files, which would each build their own binary.
mod cli;
