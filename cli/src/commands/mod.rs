pub mod genesis;
pub mod node;
pub mod query;
pub mod upgrade;
