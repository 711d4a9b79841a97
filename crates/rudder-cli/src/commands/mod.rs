pub mod diagnostic;
pub mod info;
pub mod list;
pub mod logs;
pub mod rollout;
pub mod scale;

#[cfg(test)]
pub(crate) mod fake;
