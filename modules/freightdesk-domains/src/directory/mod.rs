pub mod models;

pub use models::company::{Company, CompanyFilters, CompanyUpdate, NewCompany};
pub use models::product::{NewProduct, Product, ProductFilters, ProductUpdate};
