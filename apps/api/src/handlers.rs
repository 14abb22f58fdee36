pub mod access;
pub mod evidences;
pub mod health;
pub mod security;

#[cfg(test)]
mod tests;
