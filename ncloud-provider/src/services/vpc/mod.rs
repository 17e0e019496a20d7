pub mod nat_gateway;
pub mod nat_gateway_data_source;
