pub mod in_memory_forge;
pub mod tree_merge;

#[cfg(test)]
mod in_memory_forge_test;
