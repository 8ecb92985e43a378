pub mod models;

pub use models::contract::{contract_number, Contract, ContractStatus};
